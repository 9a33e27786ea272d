//! A single downstream MCP server reached over framed child-process stdio.
//!
//! Line framing and JSON-RPC correlation (§4.1/§4.2 of the funnel's own
//! design) are delegated to `rmcp`'s `transport-child-process` and
//! `transport-io` features rather than hand-rolled: the child's stdout is
//! already split on line feeds and parsed as JSON-RPC messages by
//! [`rmcp::transport::TokioChildProcess`]. What this module adds on top is
//! the stderr diagnostic pipeline and the `initialize` timeout.

use std::{sync::Arc, time::Duration};

use config::ServerSpec;
use rmcp::{
    RoleClient, ServiceExt,
    model::{CallToolRequestParam, CallToolResult, Tool},
    service::RunningService,
    transport::TokioChildProcess,
};
use tokio::{io::AsyncBufReadExt, process::Command};

use crate::error::DownstreamError;

/// Default timeout for the `initialize` handshake, per §4.2/§5.
pub const INIT_TIMEOUT: Duration = Duration::from_secs(30);

/// A connected session to one downstream MCP server.
#[derive(Clone)]
pub struct DownstreamClient {
    inner: Arc<Inner>,
}

struct Inner {
    name: String,
    service: RunningService<RoleClient, ()>,
}

impl DownstreamClient {
    /// Spawns the server's child process, performs the `initialize`
    /// handshake, and begins forwarding its stderr into the funnel's log
    /// prefixed with `[<serverName>] `.
    pub async fn connect(spec: &ServerSpec) -> Result<Self, DownstreamError> {
        let mut command = Command::new(&spec.command);
        command.args(&spec.args);

        for (key, value) in &spec.env {
            command.env(key, value);
        }

        let (transport, stderr) = TokioChildProcess::builder(command)
            .stderr(std::process::Stdio::piped())
            .spawn()
            .map_err(|source| DownstreamError::SpawnFailed {
                server: spec.name.clone(),
                command: spec.command.clone(),
                source,
            })?;

        if let Some(stderr) = stderr {
            forward_stderr(spec.name.clone(), stderr);
        }

        let service = tokio::time::timeout(INIT_TIMEOUT, ().serve(transport))
            .await
            .map_err(|_| DownstreamError::SessionInitFailed {
                server: spec.name.clone(),
                reason: format!("no response within {INIT_TIMEOUT:?}"),
            })?
            .map_err(|source| DownstreamError::SessionInitFailed {
                server: spec.name.clone(),
                reason: source.to_string(),
            })?;

        Ok(Self {
            inner: Arc::new(Inner {
                name: spec.name.clone(),
                service,
            }),
        })
    }

    /// Name of the downstream server this session belongs to.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Lists every tool this session's server advertises.
    pub async fn list_tools(&self) -> Result<Vec<Tool>, DownstreamError> {
        self.inner
            .service
            .list_tools(Default::default())
            .await
            .map(|result| result.tools)
            .map_err(|source| DownstreamError::ToolCallFailed {
                server: self.inner.name.clone(),
                reason: source.to_string(),
            })
    }

    /// Forwards a `tools/call` to this session's server, using the tool's
    /// server-local name.
    pub async fn call_tool(&self, original_name: &str, arguments: Option<serde_json::Map<String, serde_json::Value>>) -> Result<CallToolResult, DownstreamError> {
        let params = CallToolRequestParam {
            name: original_name.to_string().into(),
            arguments,
        };

        self.inner
            .service
            .call_tool(params)
            .await
            .map_err(|source| DownstreamError::ToolCallFailed {
                server: self.inner.name.clone(),
                reason: source.to_string(),
            })
    }
}

/// Reads `stderr` line by line and emits each non-empty line to the log,
/// prefixed with the owning server's name, per §4.1.
fn forward_stderr(server_name: String, stderr: tokio::process::ChildStderr) {
    tokio::spawn(async move {
        let mut lines = tokio::io::BufReader::new(stderr).lines();

        loop {
            match lines.next_line().await {
                Ok(Some(line)) if !line.is_empty() => log::info!("[{server_name}] {line}"),
                Ok(Some(_)) => {}
                Ok(None) => break,
                Err(err) => {
                    log::warn!("error reading stderr from '{server_name}': {err}");
                    break;
                }
            }
        }
    });
}
