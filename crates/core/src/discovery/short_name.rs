//! Resolves an unprefixed tool name to its unique `QualifiedName`, per
//! §4.6. Used by both `get_tool_schema` and `bridge_tool_request`.

use crate::catalog::{Catalog, QualifiedName};

/// Outcome of resolving a user-supplied tool identifier.
pub enum Resolution {
    /// Exactly one `QualifiedName` matched.
    Found(QualifiedName),
    /// More than one `QualifiedName` ends with `__<short>`.
    Ambiguous(Vec<QualifiedName>),
    /// No exact or short-name match; up to three substring suggestions.
    NotFound(Vec<QualifiedName>),
}

const MAX_AMBIGUOUS_CANDIDATES: usize = 5;
const MAX_NOT_FOUND_SUGGESTIONS: usize = 3;

/// Resolves `input` against the catalog. If `input` is already a known
/// `QualifiedName`, it resolves directly regardless of
/// `allow_short_names`. Otherwise, when `allow_short_names` is set and
/// `input` contains no `__`, exactly one `QualifiedName` ending in
/// `__<input>` resolves; zero or multiple candidates fall back to
/// `NotFound`/`Ambiguous`.
pub async fn resolve(catalog: &Catalog, input: &str, allow_short_names: bool) -> Resolution {
    if catalog.is_invocable(input).await {
        return Resolution::Found(QualifiedName::new(input));
    }

    if !allow_short_names || input.contains("__") {
        return not_found_suggestions(catalog, input).await;
    }

    let suffix = format!("__{input}");
    let mut candidates: Vec<QualifiedName> = catalog
        .all_entries()
        .await
        .into_iter()
        .filter(|entry| entry.name.as_str().ends_with(&suffix))
        .map(|entry| entry.name)
        .collect();
    candidates.sort();

    match candidates.len() {
        0 => not_found_suggestions(catalog, input).await,
        1 => Resolution::Found(candidates.into_iter().next().expect("checked len == 1")),
        _ => {
            candidates.truncate(MAX_AMBIGUOUS_CANDIDATES);
            Resolution::Ambiguous(candidates)
        }
    }
}

async fn not_found_suggestions(catalog: &Catalog, input: &str) -> Resolution {
    let needle = input.to_lowercase();

    let mut suggestions: Vec<QualifiedName> = catalog
        .all_entries()
        .await
        .into_iter()
        .filter(|entry| entry.name.as_str().to_lowercase().contains(&needle))
        .map(|entry| entry.name)
        .collect();

    suggestions.sort();
    suggestions.truncate(MAX_NOT_FOUND_SUGGESTIONS);

    Resolution::NotFound(suggestions)
}

/// Renders a `Resolution::Ambiguous`/`Resolution::NotFound` as the
/// human-readable hint text used in error responses.
pub fn hint_text(input: &str, resolution: &Resolution) -> Option<String> {
    match resolution {
        Resolution::Found(_) => None,
        Resolution::Ambiguous(candidates) => {
            let names = candidates.iter().map(QualifiedName::as_str).collect::<Vec<_>>().join(", ");
            Some(format!("ambiguous short name '{input}', candidates: {names}"))
        }
        Resolution::NotFound(suggestions) if suggestions.is_empty() => Some(format!("tool not found: '{input}'")),
        Resolution::NotFound(suggestions) => {
            let names = suggestions.iter().map(QualifiedName::as_str).collect::<Vec<_>>().join(", ");
            Some(format!("tool not found: '{input}'. Did you mean: {names}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::Map;

    use super::*;
    use crate::catalog::{EntryKind, ToolEntry};

    async fn catalog_with(names: &[&str]) -> Catalog {
        let catalog = Catalog::new();

        for name in names {
            catalog
                .insert(ToolEntry {
                    name: QualifiedName::new(*name),
                    description: "d".into(),
                    input_schema: Arc::new(Map::new()),
                    kind: EntryKind::Remote {
                        server_name: name.split("__").next().unwrap().into(),
                        original_name: name.split("__").nth(1).unwrap_or(name).into(),
                    },
                })
                .await;
        }

        catalog
    }

    #[tokio::test]
    async fn exact_match_wins_even_without_short_names() {
        let catalog = catalog_with(&["gh__create_issue"]).await;
        let resolution = resolve(&catalog, "gh__create_issue", false).await;
        assert!(matches!(resolution, Resolution::Found(name) if name.as_str() == "gh__create_issue"));
    }

    #[tokio::test]
    async fn ambiguous_short_name_lists_candidates() {
        let catalog = catalog_with(&["gh__create_issue", "gl__create_issue"]).await;
        let resolution = resolve(&catalog, "create_issue", true).await;
        assert!(matches!(resolution, Resolution::Ambiguous(candidates) if candidates.len() == 2));
    }

    #[tokio::test]
    async fn unique_short_name_resolves() {
        let catalog = catalog_with(&["gh__create_issue", "gl__merge_request"]).await;
        let resolution = resolve(&catalog, "create_issue", true).await;
        assert!(matches!(resolution, Resolution::Found(name) if name.as_str() == "gh__create_issue"));
    }

    #[tokio::test]
    async fn short_names_disabled_falls_back_to_suggestions() {
        let catalog = catalog_with(&["gh__create_issue"]).await;
        let resolution = resolve(&catalog, "create_issue", false).await;
        assert!(matches!(resolution, Resolution::NotFound(_)));
    }
}
