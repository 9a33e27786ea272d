//! `load_toolset`, per §4.5. Enables every catalog entry matching either a
//! named bundle of patterns from configuration, or a directly-supplied list
//! of patterns. Exactly one of `name`/`tools` must be given.

use std::collections::BTreeMap;

use crate::{catalog::Catalog, pattern};

/// Outcome of a `load_toolset` call.
pub enum Outcome {
    /// Neither or both of `name`/`tools` were supplied.
    InvalidArguments,
    /// `name` did not match any configured toolset.
    UnknownToolset {
        /// Toolset names actually available, for the error message.
        available: Vec<String>,
    },
    /// Patterns were valid but matched nothing; no state change occurred.
    NoMatches,
    /// At least one tool was newly enabled.
    Enabled {
        /// How many tools were newly added to the dynamically-enabled set.
        count: usize,
    },
}

/// Runs `load_toolset` against either a named bundle (`name`) or an
/// explicit pattern list (`tools`).
pub async fn run(catalog: &Catalog, toolsets: &BTreeMap<String, Vec<String>>, name: Option<&str>, tools: Option<&[String]>) -> Outcome {
    let patterns: Vec<String> = match (name, tools) {
        (Some(_), Some(_)) | (None, None) => return Outcome::InvalidArguments,
        (Some(name), None) => match toolsets.get(name) {
            Some(patterns) => patterns.clone(),
            None => {
                return Outcome::UnknownToolset {
                    available: toolsets.keys().cloned().collect(),
                };
            }
        },
        (None, Some(tools)) => tools.to_vec(),
    };

    let matching: Vec<_> = catalog
        .searchable_entries()
        .await
        .into_iter()
        .filter(|entry| pattern::matches_any(&patterns, entry.name.as_str()))
        .map(|entry| entry.name)
        .collect();

    if matching.is_empty() {
        return Outcome::NoMatches;
    }

    let count = matching.len();
    catalog.enable_dynamically(matching).await;

    Outcome::Enabled { count }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::Map;

    use super::*;
    use crate::catalog::{EntryKind, QualifiedName, ToolEntry};

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
                        original_name: "t".into(),
                    },
                })
                .await;
        }

        catalog
    }

    #[tokio::test]
    async fn requires_exactly_one_of_name_or_tools() {
        let catalog = catalog_with(&["gh__create_issue"]).await;
        let toolsets = BTreeMap::new();

        assert!(matches!(run(&catalog, &toolsets, None, None).await, Outcome::InvalidArguments));
        assert!(matches!(
            run(&catalog, &toolsets, Some("x"), Some(&["gh__*".to_string()])).await,
            Outcome::InvalidArguments
        ));
    }

    #[tokio::test]
    async fn unknown_toolset_name_lists_available() {
        let catalog = catalog_with(&["gh__create_issue"]).await;
        let mut toolsets = BTreeMap::new();
        toolsets.insert("vcs".to_string(), vec!["gh__*".to_string()]);

        let Outcome::UnknownToolset { available } = run(&catalog, &toolsets, Some("nope"), None).await else {
            panic!("expected unknown toolset");
        };
        assert_eq!(available, vec!["vcs".to_string()]);
    }

    #[tokio::test]
    async fn matching_patterns_enable_tools() {
        let catalog = catalog_with(&["gh__create_issue", "gh__close_issue", "fs__read_file"]).await;
        let mut toolsets = BTreeMap::new();
        toolsets.insert("vcs".to_string(), vec!["gh__*".to_string()]);

        let Outcome::Enabled { count } = run(&catalog, &toolsets, Some("vcs"), None).await else {
            panic!("expected enabled");
        };
        assert_eq!(count, 2);
        assert!(catalog.is_dynamically_enabled("gh__create_issue").await);
        assert!(!catalog.is_dynamically_enabled("fs__read_file").await);
    }

    #[tokio::test]
    async fn non_matching_patterns_leave_state_unchanged() {
        let catalog = catalog_with(&["gh__create_issue"]).await;
        let toolsets = BTreeMap::new();

        let outcome = run(&catalog, &toolsets, None, Some(&["zz__*".to_string()])).await;
        assert!(matches!(outcome, Outcome::NoMatches));
    }

    #[tokio::test]
    async fn invisible_legacy_aliases_are_never_matched() {
        let catalog = catalog_with(&["gh__create_issue"]).await;
        catalog
            .insert_invisible_alias(
                QualifiedName::new("cmd__gh__create_issue"),
                EntryKind::Command {
                    command_name: "gh".into(),
                    tool_name: "create_issue".into(),
                },
            )
            .await;
        let toolsets = BTreeMap::new();

        let outcome = run(&catalog, &toolsets, None, Some(&["cmd__*".to_string()])).await;
        assert!(matches!(outcome, Outcome::NoMatches));
    }
}
