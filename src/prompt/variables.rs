//! Variable values visible to the prompt.

use std::collections::BTreeMap;

use crate::types::VariableDecl;

/// Merge variable layers: declared defaults, then stored values, then
/// per-request overrides. Keys that only appear in stored values or
/// overrides are kept too.
pub fn merge_variables(
    declared: &[VariableDecl],
    stored: BTreeMap<String, String>,
    overrides: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut values: BTreeMap<String, String> = declared
        .iter()
        .filter(|decl| decl.enabled)
        .map(|decl| (decl.keyword.clone(), decl.default_value.clone()))
        .collect();
    values.extend(stored);
    values.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    values
}

/// Keywords to fetch from the variable store: declared variables plus any
/// persona placeholder, without duplicates.
pub fn variable_keywords(declared: &[VariableDecl], placeholders: &[String]) -> Vec<String> {
    let mut keywords: Vec<String> = declared
        .iter()
        .filter(|decl| decl.enabled)
        .map(|decl| decl.keyword.clone())
        .collect();
    for name in placeholders {
        if !keywords.contains(name) {
            keywords.push(name.clone());
        }
    }
    keywords
}
