//! Configuration structures mapping the funnel's TOML configuration file.

#![deny(missing_docs)]

mod loader;
mod servers;

use std::{collections::BTreeMap, path::Path};

use serde::Deserialize;

pub use servers::{ServerSpec, Servers};

/// Root configuration for the funnel.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FunnelConfig {
    /// Downstream MCP servers to spawn, in list form or map form.
    #[serde(default)]
    pub servers: Servers,

    /// Tools whose `QualifiedName` matches any of these patterns are not
    /// listable, unless overridden by `alwaysVisibleTools` or `exposeTools`.
    #[serde(default)]
    pub hide_tools: Vec<String>,

    /// If present, only tools matching one of these patterns are listable.
    /// Takes precedence over `hideTools`.
    #[serde(default)]
    pub expose_tools: Option<Vec<String>>,

    /// Tools matching any of these patterns are listable regardless of
    /// every other filter, including dynamic-discovery gating.
    #[serde(default)]
    pub always_visible_tools: Vec<String>,

    /// When true, server-sourced tools are hidden from listing until
    /// explicitly enabled through a discovery call.
    #[serde(default)]
    pub enable_dynamic_discovery: bool,

    /// Controls which of the four core discovery tools are enabled.
    /// Absent means all four are enabled; an empty list disables all of
    /// them.
    #[serde(default)]
    pub expose_core_tools: Option<Vec<String>>,

    /// Enables short-name resolution in `bridge_tool_request` and
    /// `get_tool_schema`.
    #[serde(default)]
    pub allow_short_tool_names: bool,

    /// Named bundles of glob patterns for `load_toolset`.
    #[serde(default)]
    pub toolsets: BTreeMap<String, Vec<String>>,

    /// In-process command plugin configuration.
    #[serde(default)]
    pub commands: CommandsConfig,

    /// Legacy field, superseded by `enableDynamicDiscovery`. Accepted but
    /// ignored, with a one-line warning logged at load time.
    #[serde(default, skip_serializing)]
    pub hacky_discovery: Option<toml::Value>,

    /// Legacy nested table that used to carry `enableDynamicDiscovery`
    /// before it was promoted to the top level. Accepted but ignored.
    #[serde(default, skip_serializing)]
    pub discovery: Option<toml::Value>,
}

/// Configuration for the in-process command plugin host.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CommandsConfig {
    /// Enables in-process command plugins at all.
    #[serde(default)]
    pub enabled: bool,

    /// If present, only the named commands are registered; otherwise every
    /// discovered command is registered.
    #[serde(default)]
    pub list: Option<Vec<String>>,
}

impl FunnelConfig {
    /// Load configuration from a file path.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<FunnelConfig> {
        loader::load(path)
    }

    /// Load configuration by merging a base file with an optional override
    /// file, the override taking precedence key-by-key.
    pub fn load_merged<P: AsRef<Path>>(base: P, r#override: Option<P>) -> anyhow::Result<FunnelConfig> {
        loader::load_merged(base, r#override)
    }

    /// Validate the configuration and warn about any deprecated fields it
    /// contains.
    pub fn validate(&self) -> anyhow::Result<()> {
        loader::validate(self)
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_debug_snapshot;

    use crate::FunnelConfig;

    #[test]
    fn defaults() {
        let config: FunnelConfig = toml::from_str("").unwrap();

        assert_debug_snapshot!(&config, @r#"
        FunnelConfig {
            servers: Servers(
                [],
            ),
            hide_tools: [],
            expose_tools: None,
            always_visible_tools: [],
            enable_dynamic_discovery: false,
            expose_core_tools: None,
            allow_short_tool_names: false,
            toolsets: {},
            commands: CommandsConfig {
                enabled: false,
                list: None,
            },
            hacky_discovery: None,
            discovery: None,
        }
        "#);
    }
}
