//! Tool catalog: a single tagged structure per `QualifiedName`, collapsing
//! the description/definition/mapping three-cache design described in the
//! funnel's data model into one map plus derived views, per the steering
//! note to prefer `ToolEntry { kind, data }` over three maps that must be
//! kept in lockstep.

use std::{borrow::Borrow, collections::HashMap, collections::HashSet, fmt, sync::Arc};

use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::filter::{self, FilterConfig};

/// Uniquely identifies a tool within the funnel at any given time: either
/// `<serverName>__<toolName>` for server-sourced tools, or
/// `<commandName>`/`<commandName>_<toolName>` for command-sourced tools.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName(String);

impl QualifiedName {
    /// Builds a `QualifiedName` from an already-computed string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Builds the `<serverName>__<toolName>` form for a server tool.
    pub fn for_remote(server_name: &str, tool_name: &str) -> Self {
        Self(format!("{server_name}__{tool_name}"))
    }

    /// Borrows the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for QualifiedName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// What dispatching a `QualifiedName` actually does.
#[derive(Debug, Clone)]
pub enum EntryKind {
    /// Forwarded verbatim to a connected downstream session.
    Remote {
        /// Name of the owning server.
        server_name: String,
        /// The tool's name as advertised by that server.
        original_name: String,
    },
    /// Executed in-process by a command plugin.
    Command {
        /// Name of the owning command.
        command_name: String,
        /// The tool's name as the command plugin knows it.
        tool_name: String,
    },
    /// Executed by one of the four built-in discovery tools.
    Core,
}

/// One row of the catalog: the mapping entry and the listing metadata
/// derived from it. Present for every invocable tool, whether or not it is
/// currently listable — `bridge_tool_request` must still be able to reach
/// hidden tools.
#[derive(Debug, Clone)]
pub struct ToolEntry {
    /// This entry's identity.
    pub name: QualifiedName,
    /// Tool description as advertised by its owner, before any
    /// `[serverName]` bracket is prepended for listing.
    pub description: String,
    /// The tool's JSON Schema input fragment.
    pub input_schema: Arc<Map<String, Value>>,
    /// How to dispatch a call to this entry.
    pub kind: EntryKind,
}

impl ToolEntry {
    /// The description as it should appear in `tools/list`: server tools
    /// get a `[serverName] ` bracket prepended.
    pub fn listing_description(&self) -> String {
        match &self.kind {
            EntryKind::Remote { server_name, .. } => format!("[{server_name}] {}", self.description),
            EntryKind::Command { .. } | EntryKind::Core => self.description.clone(),
        }
    }
}

/// The full tool catalog: every invocable `QualifiedName`, plus the set of
/// names dynamically enabled through discovery calls.
pub struct Catalog {
    entries: RwLock<HashMap<QualifiedName, ToolEntry>>,
    dynamically_enabled: RwLock<HashSet<QualifiedName>>,
    /// Names with a mapping entry that must never be folded into the
    /// listable view, regardless of filter configuration. Used for the
    /// legacy `cmd__…` command aliases (§4.7), which are invocable-only by
    /// definition.
    invisible: RwLock<HashSet<QualifiedName>>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            dynamically_enabled: RwLock::new(HashSet::new()),
            invisible: RwLock::new(HashSet::new()),
        }
    }

    /// Inserts a mapping entry that is invocable but can never appear in
    /// `listable_entries`, used for legacy command aliases.
    pub async fn insert_invisible_alias(&self, name: QualifiedName, kind: EntryKind) {
        let entry = ToolEntry {
            name: name.clone(),
            description: String::new(),
            input_schema: Arc::new(Map::new()),
            kind,
        };

        self.entries.write().await.entry(name.clone()).or_insert(entry);
        self.invisible.write().await.insert(name);
    }

    /// Inserts or replaces a mapping entry. A server-sourced entry never
    /// overwrites an existing command-sourced entry at the same name: per
    /// §4.7, command tools are registered before server tool listing, so a
    /// later-discovered server tool of the same name loses and a warning
    /// is logged. Every other collision is last-writer-wins.
    pub async fn insert(&self, entry: ToolEntry) {
        let mut entries = self.entries.write().await;

        let command_collision = matches!(entry.kind, EntryKind::Remote { .. })
            && matches!(entries.get(&entry.name).map(|e| &e.kind), Some(EntryKind::Command { .. }));

        if command_collision {
            log::warn!(
                "tool '{}' from server collides with an existing command tool; the command tool wins",
                entry.name
            );
            return;
        }

        entries.insert(entry.name.clone(), entry);
    }

    /// Looks up a single entry by exact `QualifiedName`.
    pub async fn get(&self, name: &str) -> Option<ToolEntry> {
        self.entries.read().await.get(name).cloned()
    }

    /// True if `name` has a mapping entry at all, i.e. it is invocable.
    pub async fn is_invocable(&self, name: &str) -> bool {
        self.entries.read().await.contains_key(name)
    }

    /// Every entry currently in the mapping, invocable or not.
    pub async fn all_entries(&self) -> Vec<ToolEntry> {
        self.entries.read().await.values().cloned().collect()
    }

    /// Every entry except invocable-only invisible aliases. Used by the
    /// discovery tools (`discover_tools_by_words`, `load_toolset`), which
    /// search or enable across the full catalog regardless of listability
    /// but must still honor the invisible-alias invariant (§4.7): legacy
    /// `cmd__…` aliases are invocable but never discoverable.
    pub async fn searchable_entries(&self) -> Vec<ToolEntry> {
        let entries = self.entries.read().await;
        let invisible = self.invisible.read().await;

        entries.values().filter(|entry| !invisible.contains(&entry.name)).cloned().collect()
    }

    /// Entries that are currently listable under `config`, i.e. the
    /// derived description/definition cache view. Keeping this as a filter
    /// over `all_entries` rather than a separately maintained cache is what
    /// guarantees the description and definition views always share the
    /// same key set.
    pub async fn listable_entries(&self, config: &FilterConfig<'_>) -> Vec<ToolEntry> {
        let entries = self.entries.read().await;
        let dynamically_enabled = self.dynamically_enabled.read().await;
        let invisible = self.invisible.read().await;

        entries
            .values()
            .filter(|entry| !invisible.contains(&entry.name))
            .filter(|entry| filter::is_listable(config, &dynamically_enabled, entry.name.as_str(), &entry.kind))
            .cloned()
            .collect()
    }

    /// Adds every name in `names` to the dynamically-enabled set. Returns
    /// true if the set actually changed, so callers can decide whether a
    /// `tools/list_changed` notification is warranted.
    pub async fn enable_dynamically(&self, names: impl IntoIterator<Item = QualifiedName>) -> bool {
        let mut enabled = self.dynamically_enabled.write().await;
        let mut changed = false;

        for name in names {
            changed |= enabled.insert(name);
        }

        changed
    }

    /// True if `name` is in the dynamically-enabled set.
    pub async fn is_dynamically_enabled(&self, name: &str) -> bool {
        self.dynamically_enabled.read().await.contains(name)
    }
}
