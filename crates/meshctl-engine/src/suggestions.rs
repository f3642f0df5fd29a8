//! Fuzzy matching for template error suggestions

use serde_json::Value as JsonValue;

/// Maximum Levenshtein distance to consider for suggestions
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Filters available to templates
pub const AVAILABLE_FILTERS: &[&str] = &[
    // meshctl filters
    "toyaml",
    "tojson",
    "quote",
    "nindent",
    "indent",
    "required",
    // MiniJinja builtins most useful in manifests
    "default",
    "upper",
    "lower",
    "replace",
    "trim",
    "join",
    "first",
    "last",
    "length",
    "sort",
    "items",
    "int",
    "string",
    "bool",
    "urlencode",
];

/// Top-level names every template can see
pub const CONTEXT_VARIABLES: &[&str] = &["values", "config"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub text: String,
    /// Levenshtein distance (lower = better match)
    pub distance: usize,
}

/// Closest candidates to `input`, best first
pub fn find_closest_matches(input: &str, candidates: &[&str], max_results: usize) -> Vec<Suggestion> {
    let mut suggestions: Vec<Suggestion> = candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = strsim::levenshtein(input, candidate);
            (distance > 0 && distance <= MAX_SUGGESTION_DISTANCE).then(|| Suggestion {
                text: candidate.to_string(),
                distance,
            })
        })
        .collect();

    suggestions.sort_by_key(|s| s.distance);
    suggestions.truncate(max_results);
    suggestions
}

/// Suggest a fix for an undefined expression such as `values.controler_image`
///
/// `context` is the serialized render context (`values` and `config`), used
/// to find where the dotted path stops resolving.
pub fn suggest_undefined_variable(expr: &str, context: Option<&JsonValue>) -> Option<String> {
    let mut parts = expr.split('.');
    let root = parts.next()?;

    if !CONTEXT_VARIABLES.contains(&root) {
        let matches = find_closest_matches(root, CONTEXT_VARIABLES, 1);
        return Some(match matches.first() {
            Some(m) => format!("Did you mean `{}`?", m.text),
            None => format!(
                "Templates can only reference {}",
                CONTEXT_VARIABLES
                    .iter()
                    .map(|v| format!("`{v}`"))
                    .collect::<Vec<_>>()
                    .join(" and ")
            ),
        });
    }

    let mut current = context?.get(root)?;
    let mut resolved = root.to_string();

    for part in parts {
        match current.get(part) {
            Some(next) => {
                current = next;
                resolved = format!("{resolved}.{part}");
            }
            None => {
                let available: Vec<&str> = current
                    .as_object()?
                    .keys()
                    .map(String::as_str)
                    .collect();
                let matches = find_closest_matches(part, &available, 3);

                return Some(if matches.is_empty() {
                    format!(
                        "Key `{part}` not found in `{resolved}`. Available keys: {}",
                        available.join(", ")
                    )
                } else {
                    let options: Vec<String> = matches
                        .iter()
                        .map(|m| format!("`{resolved}.{}`", m.text))
                        .collect();
                    format!("Did you mean {}?", options.join(" or "))
                });
            }
        }
    }

    None
}

/// Suggest corrections for an unknown filter
pub fn suggest_unknown_filter(filter_name: &str) -> String {
    let matches = find_closest_matches(filter_name, AVAILABLE_FILTERS, 3);

    if matches.is_empty() {
        format!(
            "Unknown filter `{filter_name}`. Available filters: {}",
            AVAILABLE_FILTERS.join(", ")
        )
    } else {
        let options: Vec<String> = matches.iter().map(|s| format!("`{}`", s.text)).collect();
        format!("Did you mean {}?", options.join(" or "))
    }
}
