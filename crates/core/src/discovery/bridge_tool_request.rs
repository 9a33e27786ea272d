//! `bridge_tool_request`, per §4.6. Resolves a possibly-short tool name and
//! dispatches the call to whichever backend owns it. Never propagates an
//! exception to the host: every failure becomes an `isError=true` result.

use rmcp::model::{CallToolResult, Content};
use serde_json::{Map, Value};

use crate::{
    catalog::{Catalog, EntryKind},
    command::{self, CommandRegistry},
    discovery::short_name::{self, Resolution},
    downstream::DownstreamPool,
};

fn error_result(text: impl Into<String>) -> CallToolResult {
    CallToolResult {
        content: vec![Content::text(text.into())],
        structured_content: None,
        is_error: Some(true),
        meta: None,
    }
}

/// Resolves `tool_name` and dispatches `arguments` to its owner.
pub async fn run(
    catalog: &Catalog,
    downstream: &DownstreamPool,
    commands: &CommandRegistry,
    tool_name: &str,
    arguments: Option<Map<String, Value>>,
    allow_short_names: bool,
) -> CallToolResult {
    let resolution = short_name::resolve(catalog, tool_name, allow_short_names).await;

    let name = match resolution {
        Resolution::Found(name) => name,
        other => {
            return error_result(short_name::hint_text(tool_name, &other).unwrap_or_else(|| format!("tool not found: '{tool_name}'")));
        }
    };

    let Some(entry) = catalog.get(name.as_str()).await else {
        return error_result(format!("tool not found: '{tool_name}'"));
    };

    match entry.kind {
        EntryKind::Remote { server_name, original_name } => {
            let Some(session) = downstream.find(&server_name) else {
                return error_result(format!("server '{server_name}' is not connected"));
            };

            match session.call_tool(&original_name, arguments).await {
                Ok(result) => result,
                Err(err) => error_result(err.to_string()),
            }
        }
        EntryKind::Command { command_name, tool_name: local_tool_name } => {
            let Some(command) = commands.get(&command_name) else {
                return error_result(format!("command '{command_name}' is not registered"));
            };

            match command.execute(&local_tool_name, arguments).await {
                Ok(result) => result,
                Err(err) => command::error_to_result(err),
            }
        }
        EntryKind::Core => error_result(format!("'{tool_name}' is a core tool and cannot be bridged")),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::Map;

    use super::*;
    use crate::catalog::{QualifiedName, ToolEntry};

    struct EchoCommand;

    #[async_trait::async_trait]
    impl command::Command for EchoCommand {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "echoes its input"
        }

        fn tool_definitions(&self) -> Vec<rmcp::model::Tool> {
            vec![rmcp::model::Tool {
                name: "echo".into(),
                description: Some("echoes its input".into()),
                input_schema: Arc::new(Map::new()),
                annotations: None,
            }]
        }

        async fn execute(&self, _tool_name: &str, _arguments: Option<Map<String, Value>>) -> anyhow::Result<CallToolResult> {
            Ok(CallToolResult {
                content: vec![Content::text("echoed")],
                structured_content: None,
                is_error: Some(false),
                meta: None,
            })
        }
    }

    #[tokio::test]
    async fn dispatches_to_a_registered_command() {
        let catalog = Catalog::new();
        let commands: Vec<Arc<dyn command::Command>> = vec![Arc::new(EchoCommand)];
        command::register(&catalog, &commands).await;
        let registry = CommandRegistry::new(&commands);
        let downstream = DownstreamPool::connect_all(&[]).await;

        let result = run(&catalog, &downstream, &registry, "echo", None, false).await;
        assert_eq!(result.is_error, Some(false));
    }

    #[tokio::test]
    async fn unknown_tool_returns_error_result_not_panic() {
        let catalog = Catalog::new();
        let registry = CommandRegistry::default();
        let downstream = DownstreamPool::connect_all(&[]).await;

        let result = run(&catalog, &downstream, &registry, "nope", None, false).await;
        assert_eq!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn remote_tool_with_disconnected_server_is_an_error_result() {
        let catalog = Catalog::new();
        catalog
            .insert(ToolEntry {
                name: QualifiedName::new("gh__create_issue"),
                description: "d".into(),
                input_schema: Arc::new(Map::new()),
                kind: EntryKind::Remote {
                    server_name: "gh".into(),
                    original_name: "create_issue".into(),
                },
            })
            .await;
        let registry = CommandRegistry::default();
        let downstream = DownstreamPool::connect_all(&[]).await;

        let result = run(&catalog, &downstream, &registry, "gh__create_issue", None, false).await;
        assert_eq!(result.is_error, Some(true));
    }
}
