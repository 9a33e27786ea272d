//! The four built-in discovery tools, per §4.5/§4.6: `discover_tools_by_words`,
//! `get_tool_schema`, `bridge_tool_request`, and `load_toolset`. Each is a
//! plain async function operating on borrowed engine state, rather than a
//! trait object, since there are exactly four of them and they are not
//! user-extensible the way [`crate::command::Command`] plugins are.

pub mod bridge_tool_request;
pub mod discover_tools_by_words;
pub mod get_tool_schema;
pub mod load_toolset;
pub mod short_name;

use std::sync::Arc;

use rmcp::model::Tool;
use serde_json::{Map, Value, json};

/// Name of the `discover_tools_by_words` core tool.
pub const DISCOVER_TOOLS_BY_WORDS: &str = "discover_tools_by_words";
/// Name of the `get_tool_schema` core tool.
pub const GET_TOOL_SCHEMA: &str = "get_tool_schema";
/// Name of the `bridge_tool_request` core tool.
pub const BRIDGE_TOOL_REQUEST: &str = "bridge_tool_request";
/// Name of the `load_toolset` core tool.
pub const LOAD_TOOLSET: &str = "load_toolset";

/// All four core tool names, in the order they should be listed.
pub const ALL: [&str; 4] = [DISCOVER_TOOLS_BY_WORDS, GET_TOOL_SCHEMA, BRIDGE_TOOL_REQUEST, LOAD_TOOLSET];

fn schema(properties: Value, required: &[&str]) -> Arc<Map<String, Value>> {
    let mut schema = Map::new();
    schema.insert("type".into(), json!("object"));
    schema.insert("properties".into(), properties);
    schema.insert("required".into(), json!(required));
    Arc::new(schema)
}

/// Rmcp `Tool` definitions for the four core tools, used both when
/// registering them as catalog entries and when answering `tools/list`.
pub fn tool_definitions() -> Vec<Tool> {
    vec![
        Tool {
            name: DISCOVER_TOOLS_BY_WORDS.into(),
            description: Some("Searches every known tool (including ones not currently listed) by keyword and optionally enables the matches.".into()),
            input_schema: schema(
                json!({
                    "words": {"type": "string", "description": "Whitespace- or hyphen-separated keywords to search for."},
                    "enable": {"type": "boolean", "description": "If true, add the matches to the enabled set."},
                }),
                &["words"],
            ),
            annotations: None,
        },
        Tool {
            name: GET_TOOL_SCHEMA.into(),
            description: Some("Returns the cached input schema and description for a tool by name.".into()),
            input_schema: schema(
                json!({
                    "toolName": {"type": "string", "description": "The qualified or short tool name."},
                }),
                &["toolName"],
            ),
            annotations: None,
        },
        Tool {
            name: BRIDGE_TOOL_REQUEST.into(),
            description: Some("Calls a tool by name, forwarding the call to whichever server or command owns it.".into()),
            input_schema: schema(
                json!({
                    "toolName": {"type": "string", "description": "The qualified or short tool name."},
                    "arguments": {"type": "object", "description": "Arguments to pass through to the tool."},
                }),
                &["toolName"],
            ),
            annotations: None,
        },
        Tool {
            name: LOAD_TOOLSET.into(),
            description: Some("Enables every tool matching a named toolset or an explicit list of glob patterns.".into()),
            input_schema: schema(
                json!({
                    "name": {"type": "string", "description": "Name of a configured toolset. Mutually exclusive with 'tools'."},
                    "tools": {"type": "array", "items": {"type": "string"}, "description": "Glob patterns to enable directly. Mutually exclusive with 'name'."},
                }),
                &[],
            ),
            annotations: None,
        },
    ]
}
