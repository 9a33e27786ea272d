//! The aggregation engine, per §4.8: owns the catalog, the downstream pool,
//! and the command registry, and implements the funnel's initialization
//! order and its `tools/list`/`tools/call` dispatch logic. The upstream
//! `ServerHandler` in [`crate::server`] is a thin adapter over this.

use std::sync::Arc;

use config::FunnelConfig;
use rmcp::model::{CallToolResult, Content, Tool};

use crate::{
    catalog::{Catalog, EntryKind, ToolEntry},
    command::{self, Command, CommandRegistry},
    discovery::{self, bridge_tool_request, discover_tools_by_words, get_tool_schema, load_toolset, short_name},
    downstream::DownstreamPool,
    error::{DownstreamError, FunnelError},
    filter::FilterConfig,
};

/// The subset of [`FunnelConfig`] the engine needs at runtime, owned so the
/// engine does not have to borrow from a configuration value of unclear
/// lifetime.
pub struct EngineConfig {
    hide_tools: Vec<String>,
    expose_tools: Option<Vec<String>>,
    always_visible_tools: Vec<String>,
    enable_dynamic_discovery: bool,
    expose_core_tools: Option<Vec<String>>,
    allow_short_tool_names: bool,
    toolsets: std::collections::BTreeMap<String, Vec<String>>,
}

impl EngineConfig {
    fn from_config(config: &FunnelConfig) -> Self {
        Self {
            hide_tools: config.hide_tools.clone(),
            expose_tools: config.expose_tools.clone(),
            always_visible_tools: config.always_visible_tools.clone(),
            enable_dynamic_discovery: config.enable_dynamic_discovery,
            expose_core_tools: config.expose_core_tools.clone(),
            allow_short_tool_names: config.allow_short_tool_names,
            toolsets: config.toolsets.clone(),
        }
    }

    /// Builds a borrowed filter view for the current configuration.
    pub fn filter_view(&self) -> FilterConfig<'_> {
        FilterConfig {
            hide_tools: &self.hide_tools,
            expose_tools: self.expose_tools.as_deref(),
            always_visible_tools: &self.always_visible_tools,
            enable_dynamic_discovery: self.enable_dynamic_discovery,
            expose_core_tools: self.expose_core_tools.as_deref(),
        }
    }
}

/// The running aggregation engine.
pub struct Engine {
    catalog: Catalog,
    downstream: DownstreamPool,
    commands: CommandRegistry,
    config: EngineConfig,
}

impl Engine {
    /// Runs the §4.8 initialization order: register core tools, connect to
    /// every configured downstream server concurrently, load and register
    /// command plugins, then populate the catalog from all connected
    /// sessions, folding in the command tools already registered.
    pub async fn initialize(config: &FunnelConfig, commands: Vec<Arc<dyn Command>>) -> anyhow::Result<Self> {
        let catalog = Catalog::new();
        let engine_config = EngineConfig::from_config(config);

        register_core_tools(&catalog).await;

        let downstream = DownstreamPool::connect_all(&config.servers.0).await;

        let enabled_commands: Vec<Arc<dyn Command>> = match &config.commands.list {
            Some(allowed) if config.commands.enabled => commands.into_iter().filter(|c| allowed.iter().any(|name| name == c.name())).collect(),
            None if config.commands.enabled => commands,
            _ => Vec::new(),
        };

        command::register(&catalog, &enabled_commands).await;
        let command_registry = CommandRegistry::new(&enabled_commands);

        populate_from_sessions(&catalog, &downstream).await;

        for (server, error) in downstream.failures() {
            log::warn!("server '{server}' did not connect: {error}");
        }

        Ok(Self {
            catalog,
            downstream,
            commands: command_registry,
            config: engine_config,
        })
    }

    /// Answers `tools/list`: enabled core tools, then listable server tools
    /// (server-prefixed, description bracketed), then listable command
    /// tools, per §4.8's ordering.
    pub async fn list_tools(&self) -> Vec<Tool> {
        let filter = self.config.filter_view();
        let mut entries = self.catalog.listable_entries(&filter).await;
        entries.sort_by(|a, b| rank(&a.kind).cmp(&rank(&b.kind)).then_with(|| a.name.cmp(&b.name)));

        entries.into_iter().map(|entry| to_rmcp_tool(&entry)).collect()
    }

    /// Answers `tools/call` for one of the four core discovery tools.
    /// Returns `None` if `tool_name` does not name a core tool, so the
    /// caller can fall back to [`Engine::call_tool`]. The returned
    /// [`CoreToolCall::notifies_list_changed`] reflects whether this
    /// specific call actually mutated the dynamically-enabled set, not
    /// merely which tool was called.
    pub async fn call_core_tool(&self, tool_name: &str, arguments: Option<serde_json::Map<String, serde_json::Value>>) -> Option<CoreToolCall> {
        let args = arguments.unwrap_or_default();

        match tool_name {
            discovery::DISCOVER_TOOLS_BY_WORDS => {
                let words = args.get("words").and_then(|v| v.as_str()).unwrap_or_default();
                let enable = args.get("enable").and_then(|v| v.as_bool()).unwrap_or(false);
                Some(self.discover_tools_by_words(words, enable).await)
            }
            discovery::GET_TOOL_SCHEMA => {
                let name = args.get("toolName").and_then(|v| v.as_str()).unwrap_or_default();
                Some(CoreToolCall::no_notify(self.get_tool_schema(name).await))
            }
            discovery::BRIDGE_TOOL_REQUEST => {
                let name = args.get("toolName").and_then(|v| v.as_str()).unwrap_or_default().to_string();
                let arguments = args.get("arguments").and_then(|v| v.as_object()).cloned();
                Some(CoreToolCall::no_notify(self.bridge_tool_request(&name, arguments).await))
            }
            discovery::LOAD_TOOLSET => {
                let name = args.get("name").and_then(|v| v.as_str()).map(str::to_string);
                let tools = args.get("tools").and_then(|v| v.as_array()).map(|items| {
                    items.iter().filter_map(|v| v.as_str()).map(str::to_string).collect::<Vec<_>>()
                });
                Some(self.load_toolset(name.as_deref(), tools.as_deref()).await)
            }
            _ => None,
        }
    }

    /// Dispatches `tools/call` for a non-core tool, by exact `QualifiedName`
    /// first and falling back to short-name resolution if enabled. Per
    /// §7/§4.8, this is the direct-dispatch path: failure to resolve or
    /// reach a tool is raised as a protocol error, not wrapped into an
    /// `isError=true` result — that wrapping is reserved for the
    /// `bridge_tool_request` core tool, which calls
    /// [`bridge_tool_request::run`] directly instead of going through this
    /// method. Command errors are still wrapped as `isError=true`
    /// regardless of dispatch path, since a command's own exceptions are
    /// not protocol-level failures.
    pub async fn call_tool(&self, tool_name: &str, arguments: Option<serde_json::Map<String, serde_json::Value>>) -> Result<CallToolResult, FunnelError> {
        let name = match short_name::resolve(&self.catalog, tool_name, self.config.allow_short_tool_names).await {
            short_name::Resolution::Found(name) => name,
            short_name::Resolution::Ambiguous(candidates) => {
                return Err(FunnelError::AmbiguousShortName {
                    short: tool_name.to_string(),
                    candidates: candidates.iter().map(|name| name.as_str().to_string()).collect(),
                });
            }
            short_name::Resolution::NotFound(_) => return Err(FunnelError::ToolNotFound(tool_name.to_string())),
        };

        let entry = self
            .catalog
            .get(name.as_str())
            .await
            .ok_or_else(|| FunnelError::ToolNotFound(tool_name.to_string()))?;

        match entry.kind {
            EntryKind::Remote { server_name, original_name } => {
                let session = self
                    .downstream
                    .find(&server_name)
                    .ok_or(DownstreamError::SessionDisconnected { server: server_name.clone() })?;

                Ok(session.call_tool(&original_name, arguments).await?)
            }
            EntryKind::Command { command_name, tool_name: local_tool_name } => {
                let command = self
                    .commands
                    .get(&command_name)
                    .ok_or_else(|| FunnelError::ToolNotFound(tool_name.to_string()))?;

                match command.execute(&local_tool_name, arguments).await {
                    Ok(result) => Ok(result),
                    Err(err) => Ok(command::error_to_result(err)),
                }
            }
            EntryKind::Core => Err(FunnelError::ToolNotFound(tool_name.to_string())),
        }
    }

    async fn discover_tools_by_words(&self, words: &str, enable: bool) -> CoreToolCall {
        match discover_tools_by_words::run(&self.catalog, words, enable).await {
            discover_tools_by_words::Outcome::NoMatches => CoreToolCall::no_notify(success_text("no matching tools found".to_string())),
            discover_tools_by_words::Outcome::Listed(matches) => CoreToolCall::no_notify(success_text(render_matches("found", &matches))),
            discover_tools_by_words::Outcome::Enabled(matches) => CoreToolCall::notify(success_text(format!(
                "{} use bridge_tool_request to call them.",
                render_matches("enabled", &matches)
            ))),
        }
    }

    async fn get_tool_schema(&self, tool_name: &str) -> CallToolResult {
        match get_tool_schema::run(&self.catalog, tool_name, self.config.allow_short_tool_names).await {
            get_tool_schema::Outcome::Found(entry) => {
                let body = serde_json::json!({
                    "name": entry.name.as_str(),
                    "description": entry.description,
                    "inputSchema": *entry.input_schema,
                    "usage": format!("call bridge_tool_request with toolName '{}' and the arguments this schema describes.", entry.name),
                });
                success_text(body.to_string())
            }
            get_tool_schema::Outcome::Failed { hint } => error_text(hint),
        }
    }

    async fn bridge_tool_request(&self, tool_name: &str, arguments: Option<serde_json::Map<String, serde_json::Value>>) -> CallToolResult {
        bridge_tool_request::run(&self.catalog, &self.downstream, &self.commands, tool_name, arguments, self.config.allow_short_tool_names).await
    }

    async fn load_toolset(&self, name: Option<&str>, tools: Option<&[String]>) -> CoreToolCall {
        match load_toolset::run(&self.catalog, &self.config.toolsets, name, tools).await {
            load_toolset::Outcome::InvalidArguments => {
                CoreToolCall::no_notify(error_text("exactly one of 'name' or 'tools' must be provided".to_string()))
            }
            load_toolset::Outcome::UnknownToolset { available } => {
                CoreToolCall::no_notify(error_text(format!("unknown toolset; available: {}", available.join(", "))))
            }
            load_toolset::Outcome::NoMatches => CoreToolCall::no_notify(success_text("no tools matched; nothing changed".to_string())),
            load_toolset::Outcome::Enabled { count } => CoreToolCall::notify(success_text(format!("enabled {count} tool(s)"))),
        }
    }
}

/// The result of a core tool call, alongside whether it actually mutated
/// the dynamically-enabled set and therefore warrants a
/// `tools/list_changed` notification. Only `discover_tools_by_words` and
/// `load_toolset` can ever notify, and only when their outcome is the
/// `Enabled` variant — a successful call that matched nothing, or that
/// matched but was not asked to enable, must not notify.
pub struct CoreToolCall {
    /// The `CallToolResult` to return to the caller.
    pub result: CallToolResult,
    /// Whether this call mutated catalog state in a way that warrants a
    /// `tools/list_changed` notification.
    pub notifies_list_changed: bool,
}

impl CoreToolCall {
    fn notify(result: CallToolResult) -> Self {
        Self {
            result,
            notifies_list_changed: true,
        }
    }

    fn no_notify(result: CallToolResult) -> Self {
        Self {
            result,
            notifies_list_changed: false,
        }
    }
}

async fn register_core_tools(catalog: &Catalog) {
    for tool in discovery::tool_definitions() {
        catalog
            .insert(ToolEntry {
                name: crate::catalog::QualifiedName::new(tool.name.to_string()),
                description: tool.description.as_deref().unwrap_or_default().to_string(),
                input_schema: tool.input_schema.clone(),
                kind: EntryKind::Core,
            })
            .await;
    }
}

async fn populate_from_sessions(catalog: &Catalog, downstream: &DownstreamPool) {
    for session in downstream.sessions() {
        let tools = match session.list_tools().await {
            Ok(tools) => tools,
            Err(err) => {
                log::warn!("server '{}' failed to list tools: {err}", session.name());
                continue;
            }
        };

        for tool in tools {
            let qualified_name = crate::catalog::QualifiedName::for_remote(session.name(), &tool.name);

            catalog
                .insert(ToolEntry {
                    name: qualified_name,
                    description: tool.description.as_deref().unwrap_or_default().to_string(),
                    input_schema: tool.input_schema.clone(),
                    kind: EntryKind::Remote {
                        server_name: session.name().to_string(),
                        original_name: tool.name.to_string(),
                    },
                })
                .await;
        }
    }
}

fn rank(kind: &EntryKind) -> u8 {
    match kind {
        EntryKind::Core => 0,
        EntryKind::Remote { .. } => 1,
        EntryKind::Command { .. } => 2,
    }
}

fn to_rmcp_tool(entry: &ToolEntry) -> Tool {
    Tool {
        name: entry.name.as_str().to_string().into(),
        description: Some(entry.listing_description().into()),
        input_schema: entry.input_schema.clone(),
        annotations: None,
    }
}

fn success_text(text: String) -> CallToolResult {
    CallToolResult {
        content: vec![Content::text(text)],
        structured_content: None,
        is_error: Some(false),
        meta: None,
    }
}

fn error_text(text: String) -> CallToolResult {
    CallToolResult {
        content: vec![Content::text(text)],
        structured_content: None,
        is_error: Some(true),
        meta: None,
    }
}

fn render_matches(verb: &str, matches: &[discover_tools_by_words::Match]) -> String {
    let names = matches.iter().map(|m| m.name.as_str()).collect::<Vec<_>>().join(", ");
    format!("{verb} {} tool(s): {names}.", matches.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn initializes_with_no_servers_and_no_commands() {
        let config = FunnelConfig::default();
        let engine = Engine::initialize(&config, Vec::new()).await.unwrap();

        let tools = engine.list_tools().await;
        assert_eq!(tools.len(), discovery::ALL.len());
    }

    #[tokio::test]
    async fn unknown_core_tool_returns_none() {
        let config = FunnelConfig::default();
        let engine = Engine::initialize(&config, Vec::new()).await.unwrap();

        assert!(engine.call_core_tool("not_a_core_tool", None).await.is_none());
    }

    #[tokio::test]
    async fn load_toolset_with_bad_arguments_is_an_error_result() {
        let config = FunnelConfig::default();
        let engine = Engine::initialize(&config, Vec::new()).await.unwrap();

        let call = engine.call_core_tool(discovery::LOAD_TOOLSET, None).await.unwrap();
        assert_eq!(call.result.is_error, Some(true));
        assert!(!call.notifies_list_changed);
    }

    #[tokio::test]
    async fn discovering_without_enabling_does_not_notify() {
        let config = FunnelConfig::default();
        let engine = Engine::initialize(&config, Vec::new()).await.unwrap();

        let mut args = serde_json::Map::new();
        args.insert("words".to_string(), serde_json::Value::String("discover".to_string()));
        args.insert("enable".to_string(), serde_json::Value::Bool(false));

        let call = engine.call_core_tool(discovery::DISCOVER_TOOLS_BY_WORDS, Some(args)).await.unwrap();
        assert!(!call.notifies_list_changed);
    }

    #[tokio::test]
    async fn unknown_tool_name_is_a_protocol_error() {
        let config = FunnelConfig::default();
        let engine = Engine::initialize(&config, Vec::new()).await.unwrap();

        let err = engine.call_tool("nope", None).await.unwrap_err();
        assert!(matches!(err, crate::error::FunnelError::ToolNotFound(_)));
    }
}
