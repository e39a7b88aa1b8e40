// src/hsn/hierarchy.rs
use std::collections::HashMap;

use crate::config::consts::ENRICH_SEPARATOR;
use crate::core::sanitize::is_vague;

/// code → normalized description, for every record seen so far this run.
pub type ParentMap = HashMap<String, String>;

/// Drop the last hierarchy level (two characters) from a code.
fn parent_code(code: &str) -> Option<&str> {
    let (cut, _) = code.char_indices().rev().nth(1)?;
    Some(&code[..cut])
}

/// Nearest ancestor of `code` whose description says something on its own.
///
/// Ancestors are found by repeatedly dropping two characters; the walk stops
/// once the candidate is shorter than a root code. Missing, empty and vague
/// ancestors are skipped, not treated as a dead end.
pub fn find_meaningful_parent<'m>(code: &str, parent_map: &'m ParentMap) -> Option<&'m str> {
    let mut current = parent_code(code)?;
    while current.chars().count() >= 2 {
        if let Some(desc) = parent_map.get(current) {
            if !desc.is_empty() && !is_vague(desc) {
                return Some(desc);
            }
        }
        current = parent_code(current)?;
    }
    None
}

/// `desc`, with the nearest meaningful ancestor appended when `desc` is vague.
/// Nothing is appended if the ancestor text already appears in `desc`.
pub fn enrich(desc: String, code: &str, parent_map: &ParentMap) -> String {
    if !is_vague(&desc) {
        return desc;
    }
    match find_meaningful_parent(code, parent_map) {
        Some(parent) if !desc.contains(parent) => format!("{desc}{ENRICH_SEPARATOR}{parent}"),
        _ => desc,
    }
}
