//! Decides, per §4.4, whether a `QualifiedName` is listable given the
//! funnel's filter configuration and its current dynamic-discovery state.
//! Invocability is a separate, simpler question answered by
//! [`crate::catalog::Catalog::is_invocable`].

use std::collections::HashSet;

use crate::catalog::{EntryKind, QualifiedName};
use crate::pattern;

/// The subset of `FunnelConfig` the filter engine needs, borrowed rather
/// than owned so the engine can be reconstructed cheaply per decision
/// without cloning pattern lists.
pub struct FilterConfig<'a> {
    /// `hideTools` patterns.
    pub hide_tools: &'a [String],
    /// `exposeTools` patterns, if configured.
    pub expose_tools: Option<&'a [String]>,
    /// `alwaysVisibleTools` patterns.
    pub always_visible_tools: &'a [String],
    /// `enableDynamicDiscovery`.
    pub enable_dynamic_discovery: bool,
    /// `exposeCoreTools` patterns, if configured.
    pub expose_core_tools: Option<&'a [String]>,
}

impl<'a> FilterConfig<'a> {
    /// Builds a filter view directly from a loaded configuration.
    pub fn from_config(config: &'a config::FunnelConfig) -> Self {
        Self {
            hide_tools: &config.hide_tools,
            expose_tools: config.expose_tools.as_deref(),
            always_visible_tools: &config.always_visible_tools,
            enable_dynamic_discovery: config.enable_dynamic_discovery,
            expose_core_tools: config.expose_core_tools.as_deref(),
        }
    }
}

/// Computes the listable decision for `name`, given `kind` and the current
/// dynamically-enabled set.
pub fn is_listable(config: &FilterConfig<'_>, dynamically_enabled: &HashSet<QualifiedName>, name: &str, kind: &EntryKind) -> bool {
    if matches!(kind, EntryKind::Core) {
        return core_tool_enabled(config, name);
    }

    if pattern::matches_any(config.always_visible_tools, name) {
        return true;
    }

    if config.enable_dynamic_discovery {
        return dynamically_enabled.contains(name);
    }

    match config.expose_tools {
        Some(expose) => pattern::matches_any(expose, name),
        None if !config.hide_tools.is_empty() => !pattern::matches_any(config.hide_tools, name),
        None => true,
    }
}

/// Whether a core discovery tool named `name` is enabled, per
/// `exposeCoreTools`. Core tools are not subject to expose/hide/dynamic
/// filters; this is the whole decision for them.
pub fn core_tool_enabled(config: &FilterConfig<'_>, name: &str) -> bool {
    match config.expose_core_tools {
        None => true,
        Some(patterns) => pattern::matches_any(patterns, name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote() -> EntryKind {
        EntryKind::Remote {
            server_name: "s".into(),
            original_name: "t".into(),
        }
    }

    #[test]
    fn expose_wins_over_hide_when_both_match() {
        let config = FilterConfig {
            hide_tools: &["s__t1".to_string()],
            expose_tools: Some(&["s__t1".to_string()]),
            always_visible_tools: &[],
            enable_dynamic_discovery: false,
            expose_core_tools: None,
        };

        assert!(is_listable(&config, &HashSet::new(), "s__t1", &remote()));
    }

    #[test]
    fn always_visible_overrides_dynamic_discovery_gating() {
        let config = FilterConfig {
            hide_tools: &[],
            expose_tools: None,
            always_visible_tools: &["s__t1".to_string()],
            enable_dynamic_discovery: true,
            expose_core_tools: None,
        };

        assert!(is_listable(&config, &HashSet::new(), "s__t1", &remote()));
    }

    #[test]
    fn dynamic_discovery_hides_until_enabled() {
        let config = FilterConfig {
            hide_tools: &[],
            expose_tools: None,
            always_visible_tools: &[],
            enable_dynamic_discovery: true,
            expose_core_tools: None,
        };

        assert!(!is_listable(&config, &HashSet::new(), "s__t1", &remote()));

        let mut enabled = HashSet::new();
        enabled.insert(QualifiedName::new("s__t1"));
        assert!(is_listable(&config, &enabled, "s__t1", &remote()));
    }

    #[test]
    fn empty_expose_core_tools_disables_all_core_tools() {
        let config = FilterConfig {
            hide_tools: &[],
            expose_tools: None,
            always_visible_tools: &[],
            enable_dynamic_discovery: false,
            expose_core_tools: Some(&[]),
        };

        assert!(!is_listable(&config, &HashSet::new(), "discover_tools_by_words", &EntryKind::Core));
    }

    #[test]
    fn absent_expose_core_tools_enables_all_core_tools() {
        let config = FilterConfig {
            hide_tools: &[],
            expose_tools: None,
            always_visible_tools: &[],
            enable_dynamic_discovery: false,
            expose_core_tools: None,
        };

        assert!(is_listable(&config, &HashSet::new(), "discover_tools_by_words", &EntryKind::Core));
    }
}
