//! Knowledge recall: query the knowledge service and pack the fragments
//! into prompt text.

use crate::error::Result;
use crate::services::{KnowledgeService, RetrievalStrategy, RetrieveRequest, RetrievedFragment};
use crate::types::{KnowledgeSettings, Message};

/// Retrieve fragments for `query`, keeping at most `top_k` with a score of
/// at least `min_score`, best first.
pub async fn retrieve(
    service: &dyn KnowledgeService,
    settings: &KnowledgeSettings,
    query: &str,
    history: &[Message],
) -> Result<Vec<RetrievedFragment>> {
    if !settings.is_enabled() || query.trim().is_empty() {
        return Ok(Vec::new());
    }
    let fragments = service
        .retrieve(RetrieveRequest {
            query: query.to_string(),
            history: history.to_vec(),
            knowledge_ids: settings.knowledge_ids.clone(),
            strategy: RetrievalStrategy::from(settings),
        })
        .await?;
    Ok(rank(fragments, settings))
}

/// Filter by score, order best first, cap at `top_k`.
pub fn rank(mut fragments: Vec<RetrievedFragment>, settings: &KnowledgeSettings) -> Vec<RetrievedFragment> {
    fragments.retain(|fragment| fragment.score >= settings.min_score);
    fragments.sort_by(|a, b| b.score.total_cmp(&a.score));
    fragments.truncate(settings.top_k);
    fragments
}

/// Render fragments as numbered recall slices.
pub fn pack(fragments: &[RetrievedFragment]) -> String {
    fragments
        .iter()
        .enumerate()
        .map(|(index, fragment)| format!("---\nrecall slice {}:\n{}\n", index + 1, fragment.content))
        .collect()
}
