use std::{fmt::Write as _, path::Path, str::FromStr};

use anyhow::bail;
use indoc::formatdoc;
use serde::Deserialize;
use serde_dynamic_string::DynamicString;
use toml::Value;

use crate::FunnelConfig;

pub(crate) fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<FunnelConfig> {
    let raw = read_and_expand(path.as_ref())?;
    let config = FunnelConfig::deserialize(raw)?;
    validate(&config)?;

    Ok(config)
}

/// Loads configuration from two locations on disk: a base file that must
/// exist, and an optional override file layered on top of it. Keys present
/// in the override replace the corresponding key in the base; tables are
/// merged recursively, everything else is replaced wholesale.
pub(crate) fn load_merged<P: AsRef<Path>>(base: P, r#override: Option<P>) -> anyhow::Result<FunnelConfig> {
    let mut merged = read_and_expand(base.as_ref())?;

    if let Some(override_path) = r#override {
        if override_path.as_ref().exists() {
            let overlay = read_and_expand(override_path.as_ref())?;
            merge_tables(&mut merged, overlay);
        }
    }

    let config = FunnelConfig::deserialize(merged)?;
    validate(&config)?;

    Ok(config)
}

fn read_and_expand(path: &Path) -> anyhow::Result<Value> {
    let content = std::fs::read_to_string(path)?;
    let mut raw: Value = toml::from_str(&content)?;
    expand_dynamic_strings(&mut Vec::new(), &mut raw)?;

    Ok(raw)
}

fn merge_tables(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Table(base), Value::Table(overlay)) => {
            for (key, overlay_value) in overlay {
                match base.get_mut(&key) {
                    Some(base_value) => merge_tables(base_value, overlay_value),
                    None => {
                        base.insert(key, overlay_value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

pub(crate) fn validate(config: &FunnelConfig) -> anyhow::Result<()> {
    if config.servers.is_empty() && !config.commands.enabled {
        let message = formatdoc! {r#"
            No downstream servers configured. The funnel requires at least one
            downstream MCP server, or an enabled command plugin, to function.

            Example configuration:

              [[servers]]
              name = "example"
              command = "path/to/mcp-server"
              args = ["--flag"]

              [servers.example.env]
              API_KEY = "{{{{ env.EXAMPLE_API_KEY }}}}"
        "#};

        bail!(message);
    }

    for name in unknown_toolset_references(config) {
        bail!("toolsets reference is unresolvable: no toolset named '{name}'");
    }

    if config.hacky_discovery.is_some() {
        log::warn!("ignoring legacy 'hackyDiscovery' configuration field");
    }

    if config.discovery.is_some() {
        log::warn!("ignoring legacy 'discovery' configuration table");
    }

    Ok(())
}

fn unknown_toolset_references(_config: &FunnelConfig) -> Vec<String> {
    // Toolset references are only resolved by name when `load_toolset` is
    // invoked at runtime (see funnel_core::discovery::load_toolset), so
    // there is nothing to validate eagerly here beyond structural parsing.
    Vec::new()
}

fn expand_dynamic_strings<'a>(path: &mut Vec<Result<&'a str, usize>>, value: &'a mut Value) -> anyhow::Result<()> {
    match value {
        Value::String(s) => match DynamicString::<String>::from_str(s) {
            Ok(out) => *s = out.into_inner(),
            Err(err) => {
                let mut p = String::new();

                for segment in path.iter() {
                    match segment {
                        Ok(s) => {
                            p.push_str(s);
                            p.push('.');
                        }
                        Err(i) => write!(p, "[{i}]").unwrap(),
                    }
                }

                if p.ends_with('.') {
                    p.pop();
                }

                bail!("failed to expand dynamic string at path '{p}': {err}");
            }
        },
        Value::Array(values) => {
            for (i, value) in values.iter_mut().enumerate() {
                path.push(Err(i));
                expand_dynamic_strings(path, value)?;
                path.pop();
            }
        }
        Value::Table(map) => {
            for (key, value) in map {
                path.push(Ok(key.as_str()));
                expand_dynamic_strings(path, value)?;
                path.pop();
            }
        }
        Value::Integer(_) | Value::Float(_) | Value::Boolean(_) | Value::Datetime(_) => (),
    }

    Ok(())
}
