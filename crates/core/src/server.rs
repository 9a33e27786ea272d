//! The upstream MCP endpoint, per §4.8/§6: implements `initialize`,
//! `tools/list`, and `tools/call` over whatever transport the binary wires
//! it to (stdio, per the funnel's own scope).
//!
//! This deliberately diverges from the teacher's `McpServer`, which hides
//! every downstream tool behind a pair of `search`/`execute` functions.
//! Listing real `QualifiedName`s directly is what §4.8's `tools/list`
//! handler and the §8 testable properties require; see DESIGN.md.

use std::sync::Arc;

use indoc::indoc;
use rmcp::{
    RoleServer, ServerHandler,
    model::{
        CallToolRequestMethod, CallToolRequestParam, CallToolResult, ErrorData, Implementation, ListToolsResult, PaginatedRequestParam, ServerCapabilities,
        ServerInfo,
    },
    service::RequestContext,
};

use crate::{engine::Engine, error::FunnelError};

/// The funnel's upstream `ServerHandler`. Cheap to clone: all state lives
/// behind the shared `Engine`.
#[derive(Clone)]
pub struct FunnelServer {
    engine: Arc<Engine>,
}

impl FunnelServer {
    /// Wraps an already-initialized engine for serving over an upstream
    /// transport.
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }
}

impl ServerHandler for FunnelServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().enable_tool_list_changed().build(),
            server_info: Implementation {
                name: "funnel".into(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(instructions().to_string()),
        }
    }

    async fn list_tools(&self, _: Option<PaginatedRequestParam>, _ctx: RequestContext<RoleServer>) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult {
            tools: self.engine.list_tools().await,
            next_cursor: None,
        })
    }

    async fn call_tool(&self, params: CallToolRequestParam, ctx: RequestContext<RoleServer>) -> Result<CallToolResult, ErrorData> {
        let tool_name = params.name.to_string();
        log::debug!("dispatching tool call for '{tool_name}'");

        if let Some(call) = self.engine.call_core_tool(&tool_name, params.arguments.clone()).await {
            if call.notifies_list_changed {
                if let Err(err) = ctx.peer.notify_tool_list_changed().await {
                    log::debug!("failed to emit tools/list_changed: {err}");
                }
            }

            return Ok(call.result);
        }

        self.engine.call_tool(&tool_name, params.arguments).await.map_err(to_error_data)
    }
}

/// Converts a direct-dispatch [`FunnelError`] into the protocol-level
/// `ErrorData` the `ServerHandler::call_tool` trait method requires, per
/// §7/§4.8. `bridge_tool_request` and command dispatch never reach this
/// path: their failures stay wrapped as `isError=true` results.
fn to_error_data(err: FunnelError) -> ErrorData {
    match err {
        FunnelError::ToolNotFound(_) => ErrorData::method_not_found::<CallToolRequestMethod>(),
        FunnelError::AmbiguousShortName { .. } | FunnelError::InvalidArguments(_) => ErrorData::invalid_params(err.to_string(), None),
        FunnelError::ConfigInvalid(_) | FunnelError::Downstream(_) => ErrorData::internal_error(err.to_string(), None),
    }
}

fn instructions() -> &'static str {
    indoc! {r#"
        This server aggregates tools from several downstream MCP servers and
        in-process command plugins under one connection.

        Tools are listed using the `<serverName>__<toolName>` naming convention.
        If a tool you expect is not listed, call `discover_tools_by_words` with a
        few keywords describing what you need: it searches every known tool,
        including ones that are not currently listed, and can enable them.

        Once you know a tool's name, call `bridge_tool_request` with `toolName`
        and `arguments` to invoke it, or `get_tool_schema` to inspect its input
        schema first.
    "#}
}
