//! Readable feature names for persisted artifacts and reports.
//!
//! Disclosure amounts arrive as dollar-range labels and representatives
//! carry honorifics; both make one-hot column names awkward to read. The
//! mapping below is a fixed lookup on known labels and never changes what
//! a feature means.

use std::collections::HashSet;

/// Dollar-range label → short integer code.
pub const AMOUNT_CODES: [(&str, u8); 8] = [
    ("$1,001 -", 1),
    ("$1,001 - $15,000", 2),
    ("$100,001 - $250,000", 3),
    ("$15,001 - $50,000", 4),
    ("$250,001 - $500,000", 5),
    ("$5,000,001 - $25,000,000", 6),
    ("$50,001 - $100,000", 7),
    ("$500,001 - $1,000,000", 8),
];

/// Prefixes removed from representative names.
pub const HONORIFICS: [&str; 2] = ["Hon. ", "Mr. "];

/// Code for an exact amount label.
pub fn amount_code(label: &str) -> Option<u8> {
    AMOUNT_CODES
        .iter()
        .find(|(known, _)| *known == label)
        .map(|(_, code)| *code)
}

/// Representative name without its honorific, if it had one.
pub fn strip_honorific(name: &str) -> Option<&str> {
    HONORIFICS.iter().find_map(|prefix| name.strip_prefix(prefix))
}

/// Normalized name of the one-hot column for `category` in `column`.
///
/// * `amount` categories become their integer code (`amount_2`).
/// * representatives with an honorific lose both the honorific and the
///   column prefix (`Alan_S_Lowenthal`).
/// * every name then drops `.` and replaces spaces with `_`.
pub fn feature_name(column: &str, category: &str) -> String {
    let raw = match (column, amount_code(category), strip_honorific(category)) {
        ("amount", Some(code), _) => format!("{column}_{code}"),
        ("representative", _, Some(name)) => name.to_string(),
        _ => format!("{column}_{category}"),
    };
    tidy(&raw)
}

/// Plain numeric column names go through the same punctuation cleanup.
pub fn tidy(name: &str) -> String {
    name.replace('.', "").replace(' ', "_")
}

/// Make every name unique, keeping first occurrences as they are.
///
/// Later repeats get the smallest free `_2`, `_3`, ... suffix, so distinct
/// features never share a name in reports.
pub fn unique_names(names: Vec<String>) -> Vec<String> {
    let mut taken: HashSet<String> = names.iter().cloned().collect();
    let mut emitted: HashSet<String> = HashSet::with_capacity(names.len());
    names
        .into_iter()
        .map(|name| {
            if emitted.insert(name.clone()) {
                return name;
            }
            let renamed = (2..)
                .map(|k| format!("{name}_{k}"))
                .find(|candidate| !taken.contains(candidate))
                .unwrap_or_default();
            taken.insert(renamed.clone());
            emitted.insert(renamed.clone());
            renamed
        })
        .collect()
}
