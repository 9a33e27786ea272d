//! `get_tool_schema`, per §4.6. Resolves a possibly-short tool name and
//! returns its cached input schema and description, along with a short
//! usage hint. Never touches a downstream session.

use crate::{
    catalog::{Catalog, ToolEntry},
    discovery::short_name::{self, Resolution},
};

/// Outcome of a `get_tool_schema` call.
pub enum Outcome {
    /// The tool resolved to exactly one entry.
    Found(ToolEntry),
    /// Resolution failed; `hint` is the human-readable explanation.
    Failed {
        /// Explanation to surface as the `isError=true` text.
        hint: String,
    },
}

/// Looks up the schema for `tool_name`, resolving short names first when
/// `allow_short_names` is set.
pub async fn run(catalog: &Catalog, tool_name: &str, allow_short_names: bool) -> Outcome {
    match short_name::resolve(catalog, tool_name, allow_short_names).await {
        Resolution::Found(name) => match catalog.get(name.as_str()).await {
            Some(entry) => Outcome::Found(entry),
            None => Outcome::Failed {
                hint: format!("tool not found: '{tool_name}'"),
            },
        },
        resolution @ (Resolution::Ambiguous(_) | Resolution::NotFound(_)) => Outcome::Failed {
            hint: short_name::hint_text(tool_name, &resolution).unwrap_or_else(|| format!("tool not found: '{tool_name}'")),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{Map, Value, json};

    use super::*;
    use crate::catalog::{EntryKind, QualifiedName};

    async fn catalog_with_schema() -> Catalog {
        let catalog = Catalog::new();
        let mut schema = Map::new();
        schema.insert("type".into(), Value::String("object".into()));

        catalog
            .insert(ToolEntry {
                name: QualifiedName::new("gh__create_issue"),
                description: "Creates an issue".into(),
                input_schema: Arc::new(schema),
                kind: EntryKind::Remote {
                    server_name: "gh".into(),
                    original_name: "create_issue".into(),
                },
            })
            .await;

        catalog
    }

    #[tokio::test]
    async fn resolves_exact_name() {
        let catalog = catalog_with_schema().await;
        let Outcome::Found(entry) = run(&catalog, "gh__create_issue", false).await else {
            panic!("expected found");
        };
        assert_eq!(entry.input_schema.get("type"), Some(&json!("object")));
    }

    #[tokio::test]
    async fn unknown_name_fails_with_hint() {
        let catalog = catalog_with_schema().await;
        let Outcome::Failed { hint } = run(&catalog, "nope", false).await else {
            panic!("expected failure");
        };
        assert!(hint.contains("nope"));
    }
}
