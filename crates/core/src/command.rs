//! In-process command plugins, per §4.7. A command exposes one or more MCP
//! tools under its own namespace; unlike downstream sessions, dispatch is a
//! plain function call with no transport involved.

use std::{collections::HashMap, sync::Arc};

use rmcp::model::{CallToolResult, Content, Tool};
use serde_json::{Map, Value};

use crate::catalog::{Catalog, EntryKind, QualifiedName, ToolEntry};

/// An in-process component exposing one or more MCP tools under a command
/// namespace. Holds no reference back to the engine; it receives whatever
/// it needs as plain arguments, keeping it substitutable in tests.
#[async_trait::async_trait]
pub trait Command: Send + Sync {
    /// Unique name of this command.
    fn name(&self) -> &str;

    /// Human-readable description of the command as a whole.
    fn description(&self) -> &str;

    /// The tools this command exposes, in a stable order.
    fn tool_definitions(&self) -> Vec<Tool>;

    /// Executes one of this command's tools by its server-local name.
    async fn execute(&self, tool_name: &str, arguments: Option<Map<String, Value>>) -> anyhow::Result<CallToolResult>;
}

/// Registers every enabled command's tools into the catalog, computing each
/// tool's `QualifiedName` per §4.7: the compact form `<command.name>` when
/// the command exposes exactly one tool named after itself, otherwise
/// `<command.name>_<tool.name>`. Legacy `cmd__<command>__<tool>` aliases
/// (and `cmd__<command>` for the compact form) are also registered, but
/// only as invocable mapping entries, never as listable ones — see the
/// open-question resolution in DESIGN.md.
pub async fn register(catalog: &Catalog, commands: &[Arc<dyn Command>]) {
    for command in commands {
        let definitions = command.tool_definitions();
        let compact_form = definitions.len() == 1 && definitions[0].name.as_ref() == command.name();

        for tool in &definitions {
            let qualified_name = if compact_form {
                QualifiedName::new(command.name())
            } else {
                QualifiedName::new(format!("{}_{}", command.name(), tool.name))
            };

            let entry = ToolEntry {
                name: qualified_name.clone(),
                description: tool.description.as_deref().unwrap_or_default().to_string(),
                input_schema: tool.input_schema.clone(),
                kind: EntryKind::Command {
                    command_name: command.name().to_string(),
                    tool_name: tool.name.to_string(),
                },
            };

            catalog.insert(entry).await;

            let legacy_name = if compact_form {
                QualifiedName::new(format!("cmd__{}", command.name()))
            } else {
                QualifiedName::new(format!("cmd__{}__{}", command.name(), tool.name))
            };

            if legacy_name != qualified_name {
                register_invocable_only_alias(catalog, &legacy_name, command.name(), &tool.name).await;
            }
        }
    }
}

/// Registers a mapping-only alias: invocable, but never folded into the
/// listable view, matching the legacy `cmd__…` forms.
async fn register_invocable_only_alias(catalog: &Catalog, alias: &QualifiedName, command_name: &str, tool_name: &str) {
    catalog
        .insert_invisible_alias(
            alias.clone(),
            EntryKind::Command {
                command_name: command_name.to_string(),
                tool_name: tool_name.to_string(),
            },
        )
        .await;
}

/// Looks up a registered command by name for dispatch. Built alongside
/// catalog registration so the two stay consistent with each other.
#[derive(Clone, Default)]
pub struct CommandRegistry {
    by_name: HashMap<String, Arc<dyn Command>>,
}

impl CommandRegistry {
    /// Builds a registry from the same slice passed to [`register`].
    pub fn new(commands: &[Arc<dyn Command>]) -> Self {
        Self {
            by_name: commands.iter().map(|command| (command.name().to_string(), command.clone())).collect(),
        }
    }

    /// Looks up a command by its own name (not a qualified tool name).
    pub fn get(&self, command_name: &str) -> Option<&Arc<dyn Command>> {
        self.by_name.get(command_name)
    }
}

/// Converts a thrown command error into an `isError=true` result,
/// preserving the exception message, per §4.7's error-conversion rule.
pub fn error_to_result(err: anyhow::Error) -> CallToolResult {
    CallToolResult {
        content: vec![Content::text(err.to_string())],
        structured_content: None,
        is_error: Some(true),
        meta: None,
    }
}
