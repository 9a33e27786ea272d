//! `discover_tools_by_words`, per §4.5. Scores every catalog entry against
//! a set of whitespace/hyphen-separated keywords and, optionally, adds the
//! matches to the dynamically-enabled set.
//!
//! Scoring operates over the full searchable catalog
//! (`Catalog::searchable_entries`), not the currently-listable subset: under
//! `enableDynamicDiscovery`, every server tool starts out hidden, so search
//! must be able to find and enable tools that are not (yet) listable.
//! Invisible legacy aliases are excluded the same way they are excluded from
//! listing (§4.7) — they are invocable but never discoverable. See
//! DESIGN.md for this open-question resolution.

use crate::catalog::{Catalog, EntryKind, QualifiedName, ToolEntry};

/// One scored match.
#[derive(Debug, Clone)]
pub struct Match {
    /// The matched tool.
    pub name: QualifiedName,
    /// Its score; strictly positive for anything returned here.
    pub score: u32,
}

/// Outcome of a `discover_tools_by_words` call.
pub enum Outcome {
    /// No token survived tokenization, or nothing scored above zero.
    NoMatches,
    /// Matches were found and listed, but not enabled.
    Listed(Vec<Match>),
    /// Matches were found and added to the dynamically-enabled set.
    Enabled(Vec<Match>),
}

/// Runs the discovery scan.
pub async fn run(catalog: &Catalog, words: &str, enable: bool) -> Outcome {
    let tokens = tokenize(words);

    if tokens.is_empty() {
        return Outcome::NoMatches;
    }

    let mut matches: Vec<Match> = catalog
        .searchable_entries()
        .await
        .into_iter()
        .filter(|entry| !matches!(entry.kind, EntryKind::Core))
        .filter_map(|entry| {
            let score = score_entry(&tokens, &entry);
            (score > 0).then_some(Match {
                name: entry.name,
                score,
            })
        })
        .collect();

    if matches.is_empty() {
        return Outcome::NoMatches;
    }

    matches.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.name.cmp(&b.name)));

    if enable {
        catalog.enable_dynamically(matches.iter().map(|m| m.name.clone())).await;
        Outcome::Enabled(matches)
    } else {
        Outcome::Listed(matches)
    }
}

fn tokenize(words: &str) -> Vec<String> {
    words
        .split(|c: char| c.is_whitespace() || c == '-')
        .map(|token| token.to_lowercase())
        .filter(|token| !token.is_empty())
        .collect()
}

fn score_entry(tokens: &[String], entry: &ToolEntry) -> u32 {
    let description_lower = entry.description.to_lowercase();
    let name_lower = entry.name.as_str().to_lowercase();

    let server_name_lower = match &entry.kind {
        EntryKind::Remote { server_name, .. } => Some(server_name.to_lowercase()),
        _ => None,
    };

    tokens
        .iter()
        .map(|token| {
            let mut score = word_or_substring_score(token, &description_lower);
            score += piece_or_substring_score(token, &name_lower);

            if let Some(server_name_lower) = &server_name_lower {
                score += piece_or_substring_score(token, server_name_lower);
            }

            score
        })
        .sum()
}

fn word_or_substring_score(token: &str, haystack_lower: &str) -> u32 {
    let whole_word = haystack_lower.split(|c: char| !c.is_alphanumeric()).any(|word| word == token);

    if whole_word {
        2
    } else if haystack_lower.contains(token) {
        1
    } else {
        0
    }
}

fn piece_or_substring_score(token: &str, name_lower: &str) -> u32 {
    let matches_piece = name_lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|piece| !piece.is_empty())
        .any(|piece| piece == token);

    if matches_piece {
        2
    } else if name_lower.contains(token) {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::Map;

    use super::*;
    use crate::catalog::ToolEntry;

    async fn catalog_with(entries: &[(&str, &str, &str)]) -> Catalog {
        let catalog = Catalog::new();

        for (qualified_name, server_name, description) in entries {
            catalog
                .insert(ToolEntry {
                    name: QualifiedName::new(*qualified_name),
                    description: description.to_string(),
                    input_schema: Arc::new(Map::new()),
                    kind: EntryKind::Remote {
                        server_name: server_name.to_string(),
                        original_name: "t".into(),
                    },
                })
                .await;
        }

        catalog
    }

    #[tokio::test]
    async fn empty_words_yield_no_matches() {
        let catalog = catalog_with(&[("s__t1", "s", "does something")]).await;
        assert!(matches!(run(&catalog, "   ", false).await, Outcome::NoMatches));
    }

    #[tokio::test]
    async fn whole_word_beats_substring_match() {
        let catalog = catalog_with(&[
            ("gh__create_issue", "gh", "Create an issue"),
            ("fs__read_tissue", "fs", "Read tissue samples"),
        ])
        .await;

        let Outcome::Listed(matches) = run(&catalog, "issue", false).await else {
            panic!("expected matches");
        };

        assert_eq!(matches[0].name.as_str(), "gh__create_issue");
        assert_eq!(matches[1].name.as_str(), "fs__read_tissue");
        assert!(matches[0].score > matches[1].score);
    }

    #[tokio::test]
    async fn enabling_adds_to_dynamically_enabled_set() {
        let catalog = catalog_with(&[("s__alpha_1", "s", "alpha tool")]).await;

        let Outcome::Enabled(matches) = run(&catalog, "alpha", true).await else {
            panic!("expected enabled matches");
        };

        assert_eq!(matches.len(), 1);
        assert!(catalog.is_dynamically_enabled("s__alpha_1").await);
    }

    #[tokio::test]
    async fn invisible_legacy_aliases_are_never_matched() {
        let catalog = catalog_with(&[("s__alpha_1", "s", "alpha tool")]).await;
        catalog
            .insert_invisible_alias(
                QualifiedName::new("cmd__alpha__alpha_1"),
                EntryKind::Command {
                    command_name: "alpha".into(),
                    tool_name: "alpha_1".into(),
                },
            )
            .await;

        let Outcome::Listed(matches) = run(&catalog, "alpha", false).await else {
            panic!("expected matches");
        };

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name.as_str(), "s__alpha_1");
    }
}
