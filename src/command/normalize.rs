//! Synonym tables for departments, intents and destinations
//!
//! Speech-to-intent output is noisy ("set_course", "shields_up", "the moon"),
//! so every free-form string is folded onto a canonical spelling before it
//! is matched against the closed order types.

use crate::core::types::Department;

/// Where a command is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Handled by the coordinator itself
    Core,
    Department(Department),
}

const DEPARTMENT_SYNONYMS: &[(&str, Route)] = &[
    ("helm", Route::Department(Department::Helm)),
    ("navigation", Route::Department(Department::Helm)),
    ("nav", Route::Department(Department::Helm)),
    ("conn", Route::Department(Department::Helm)),
    ("pilot", Route::Department(Department::Helm)),
    ("tactical", Route::Department(Department::Tactical)),
    ("weapons", Route::Department(Department::Tactical)),
    ("security", Route::Department(Department::Tactical)),
    ("defense", Route::Department(Department::Tactical)),
    ("engineering", Route::Department(Department::Engineering)),
    ("engineer", Route::Department(Department::Engineering)),
    ("power", Route::Department(Department::Engineering)),
    ("damage_control", Route::Department(Department::Engineering)),
    ("ops", Route::Department(Department::Ops)),
    ("operations", Route::Department(Department::Ops)),
    ("sensors", Route::Department(Department::Ops)),
    ("science", Route::Department(Department::Ops)),
    ("bridge", Route::Core),
    ("captain", Route::Core),
    ("ship", Route::Core),
    ("computer", Route::Core),
    ("core", Route::Core),
];

const INTENT_SYNONYMS: &[(&str, &str)] = &[
    ("navigation", "navigate"),
    ("set_course", "navigate"),
    ("course", "navigate"),
    ("go_to", "navigate"),
    ("goto", "navigate"),
    ("head_to", "navigate"),
    ("take_us_to", "navigate"),
    ("engage", "warp"),
    ("adjust_warp", "set_warp_factor"),
    ("change_warp", "set_warp_factor"),
    ("full_stop", "stop"),
    ("all_stop", "stop"),
    ("halt", "stop"),
    ("drop_out", "stop"),
    ("shields_up", "raise_shields"),
    ("shields_down", "lower_shields"),
    ("enter_orbit", "orbit"),
    ("standard_orbit", "orbit"),
    ("report", "status"),
    ("ship_status", "status"),
];

const TARGET_ALIASES: &[(&str, &str)] = &[
    ("sol", "Sun"),
    ("the sun", "Sun"),
    ("terra", "Earth"),
    ("home", "Earth"),
    ("luna", "Moon"),
    ("the moon", "Moon"),
    ("starbase one", "Starbase 1"),
    ("starbase", "Starbase 1"),
    ("spacedock", "Starbase 1"),
    ("space dock", "Starbase 1"),
];

/// Lowercase, trim, and fold spaces/dashes to underscores
pub fn normalize_key(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect()
}

pub fn resolve_route(department: &str) -> Option<Route> {
    let key = normalize_key(department);
    DEPARTMENT_SYNONYMS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, route)| *route)
}

/// Canonical spelling of an intent
pub fn canonical_intent(intent: &str) -> String {
    let key = normalize_key(intent);
    INTENT_SYNONYMS
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(key)
}

/// Canonical destination name: known aliases, otherwise capitalised
pub fn normalize_target(target: &str) -> String {
    let lower = target.trim().to_lowercase();
    if let Some((_, name)) = TARGET_ALIASES.iter().find(|(alias, _)| *alias == lower) {
        return name.to_string();
    }
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_department_synonyms() {
        assert_eq!(resolve_route("Navigation"), Some(Route::Department(Department::Helm)));
        assert_eq!(resolve_route("weapons"), Some(Route::Department(Department::Tactical)));
        assert_eq!(resolve_route("damage control"), Some(Route::Department(Department::Engineering)));
        assert_eq!(resolve_route("science"), Some(Route::Department(Department::Ops)));
        assert_eq!(resolve_route("bridge"), Some(Route::Core));
        assert_eq!(resolve_route("galley"), None);
    }

    #[test]
    fn test_intent_synonyms() {
        assert_eq!(canonical_intent("Set Course"), "navigate");
        assert_eq!(canonical_intent("engage"), "warp");
        assert_eq!(canonical_intent("shields-up"), "raise_shields");
        assert_eq!(canonical_intent("all_stop"), "stop");
        assert_eq!(canonical_intent("fire"), "fire");
    }

    #[test]
    fn test_target_aliases() {
        assert_eq!(normalize_target("the moon"), "Moon");
        assert_eq!(normalize_target("Spacedock"), "Starbase 1");
        assert_eq!(normalize_target("home"), "Earth");
        assert_eq!(normalize_target("jupiter"), "Jupiter");
        assert_eq!(normalize_target("  "), "");
    }
}
