//! Error taxonomy for the aggregation engine, by kind rather than by call
//! site. Session-level and tool-call failures are recorded and logged; they
//! never crash the funnel. Configuration errors at startup are the only
//! fatal class.

/// Errors that can occur while connecting to, or invoking tools on, a
/// downstream MCP server.
#[derive(Debug, thiserror::Error)]
pub enum DownstreamError {
    /// The child process could not be started at all.
    #[error("failed to spawn '{command}' for server '{server}': {source}")]
    SpawnFailed {
        /// Name of the server that failed to spawn.
        server: String,
        /// Command that was attempted.
        command: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The `initialize` handshake failed or timed out.
    #[error("session '{server}' failed to initialize: {reason}")]
    SessionInitFailed {
        /// Name of the server.
        server: String,
        /// Human-readable reason.
        reason: String,
    },

    /// The child exited or the transport closed while a request was in
    /// flight on it.
    #[error("session '{server}' disconnected")]
    SessionDisconnected {
        /// Name of the server.
        server: String,
    },

    /// The downstream server returned a protocol error, or the transport
    /// failed mid-call.
    #[error("tool call to '{server}' failed: {reason}")]
    ToolCallFailed {
        /// Name of the server.
        server: String,
        /// Human-readable reason.
        reason: String,
    },
}

/// Errors surfaced by the funnel's own dispatch and discovery logic, not
/// attributable to a specific downstream session.
#[derive(Debug, thiserror::Error)]
pub enum FunnelError {
    /// Configuration was structurally invalid, or referenced something
    /// (such as a toolset) that does not exist. Fatal to startup.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// A `QualifiedName` is unknown at dispatch time.
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// A core tool or command rejected its arguments.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Multiple `QualifiedName`s ended with the same `__<short>` suffix.
    #[error("ambiguous short name '{short}', candidates: {candidates:?}")]
    AmbiguousShortName {
        /// The short name that was ambiguous.
        short: String,
        /// Up to five matching candidates.
        candidates: Vec<String>,
    },

    /// A downstream session error bubbled up through dispatch.
    #[error(transparent)]
    Downstream(#[from] DownstreamError),
}

impl FunnelError {
    /// Render this error as the text of an `isError=true` tool result, the
    /// form used by `bridge_tool_request`, `get_tool_schema`, and command
    /// dispatch, none of which may propagate exceptions to the host.
    pub fn as_user_message(&self) -> String {
        self.to_string()
    }
}
