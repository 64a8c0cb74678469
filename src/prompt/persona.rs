//! Persona templates with `{{placeholder}}` tokens.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{([^{}]*)\}\}").expect("placeholder regex"))
}

/// Placeholder names in order of first appearance. Names are trimmed;
/// empty ones are ignored.
pub fn extract_placeholders(persona: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in placeholder_regex().captures_iter(persona) {
        let name = caps[1].trim();
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Substitute placeholders. Unknown names render as empty text; empty
/// placeholders are left as written.
pub fn render_persona(persona: &str, values: &BTreeMap<String, String>) -> String {
    placeholder_regex()
        .replace_all(persona, |caps: &Captures<'_>| {
            let name = caps[1].trim();
            if name.is_empty() {
                return caps[0].to_string();
            }
            values.get(name).cloned().unwrap_or_default()
        })
        .into_owned()
}
