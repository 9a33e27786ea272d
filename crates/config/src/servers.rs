//! Downstream server specifications and the list/map normalization described
//! for the `servers` configuration field.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

/// One configured downstream MCP server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSpec {
    /// Unique, non-empty name for this server. Used as the namespace prefix
    /// for every tool it advertises.
    pub name: String,
    /// Executable path or argv0 to spawn.
    pub command: String,
    /// Ordered argv, not including argv0.
    #[serde(default)]
    pub args: Vec<String>,
    /// Environment variables merged onto the funnel's own process
    /// environment when spawning the child. The server's values win on
    /// conflicts.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// The shape of one entry in the map form of `servers`, i.e. without the
/// `name` field since the map key supplies it.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ServerSpecWithoutName {
    command: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    env: BTreeMap<String, String>,
}

/// The `servers` field, accepted either as an ordered list of
/// [`ServerSpec`] or as a map of name to server-without-name. Both forms
/// normalize to the same ordered list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Servers(pub Vec<ServerSpec>);

impl Servers {
    /// Iterate the normalized server specs.
    pub fn iter(&self) -> impl Iterator<Item = &ServerSpec> {
        self.0.iter()
    }

    /// Number of configured servers.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if no server is configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Re-express this list in map form, keyed by server name. Used to
    /// verify that the list/map normalization round-trips.
    pub fn to_map_form(&self) -> BTreeMap<String, (String, Vec<String>, BTreeMap<String, String>)> {
        self.0
            .iter()
            .map(|s| (s.name.clone(), (s.command.clone(), s.args.clone(), s.env.clone())))
            .collect()
    }
}

impl<'de> Deserialize<'de> for Servers {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            List(Vec<ServerSpec>),
            Map(BTreeMap<String, ServerSpecWithoutName>),
        }

        let raw = Raw::deserialize(deserializer)?;

        let servers = match raw {
            Raw::List(list) => list,
            Raw::Map(map) => map
                .into_iter()
                .map(|(name, spec)| ServerSpec {
                    name,
                    command: spec.command,
                    args: spec.args,
                    env: spec.env,
                })
                .collect(),
        };

        Ok(Servers(servers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_form_parses() {
        let toml = r#"
            [[servers]]
            name = "s"
            command = "fake"
            args = ["--flag"]

            [servers.env]
            FOO = "bar"
        "#;

        #[derive(Deserialize)]
        struct Wrapper {
            servers: Servers,
        }

        let wrapper: Wrapper = toml::from_str(toml).unwrap();
        assert_eq!(wrapper.servers.len(), 1);
        assert_eq!(wrapper.servers.0[0].name, "s");
        assert_eq!(wrapper.servers.0[0].command, "fake");
    }

    #[test]
    fn map_form_normalizes_to_list_form() {
        let toml = r#"
            [servers.s]
            command = "fake"
            args = ["--flag"]

            [servers.s.env]
            FOO = "bar"
        "#;

        #[derive(Deserialize)]
        struct Wrapper {
            servers: Servers,
        }

        let wrapper: Wrapper = toml::from_str(toml).unwrap();
        assert_eq!(wrapper.servers.len(), 1);

        let spec = &wrapper.servers.0[0];
        assert_eq!(spec.name, "s");
        assert_eq!(spec.command, "fake");
        assert_eq!(spec.args, vec!["--flag".to_string()]);
        assert_eq!(spec.env.get("FOO"), Some(&"bar".to_string()));
    }

    #[test]
    fn round_trips_through_map_form() {
        let original = Servers(vec![ServerSpec {
            name: "s".into(),
            command: "fake".into(),
            args: vec!["--flag".into()],
            env: BTreeMap::from([("FOO".into(), "bar".into())]),
        }]);

        let as_map = original.to_map_form();
        let back: Vec<ServerSpec> = as_map
            .into_iter()
            .map(|(name, (command, args, env))| ServerSpec { name, command, args, env })
            .collect();

        assert_eq!(Servers(back), original);
    }
}
