//! Join configuration as loaded from the agent config file.
//!
//! Servers accept two generations of join settings: the deprecated flat fields
//! directly under `[server]`, and the structured `[server.server_join]` block.
//! Clients only accept the structured block. [`AgentConfig::join_config`]
//! validates the combination and reduces it to a single immutable
//! [`JoinConfig`].

use std::fmt::{self, Display};
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ConfigError, Result};
use crate::serde_duration;
use crate::validate::validate;

/// Retry interval used when none is configured.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(30);

/// Role of the local agent.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    /// Cluster server, joins other servers through gossip.
    Server,

    /// Client, registers with known servers.
    Client,
}

impl Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Server => write!(f, "server"),
            Self::Client => write!(f, "client"),
        }
    }
}

/// Join related subset of the agent configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Server section.
    #[serde(default)]
    pub server: Option<ServerConfig>,

    /// Client section.
    #[serde(default)]
    pub client: Option<ClientConfig>,
}

/// Server section, including the deprecated flat join fields.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Deprecated: addresses to eagerly join once at startup.
    #[serde(default)]
    pub start_join: Vec<String>,

    /// Deprecated: join specifications to retry until joined.
    #[serde(default)]
    pub retry_join: Vec<String>,

    /// Deprecated: maximum retry passes, 0 for unlimited.
    #[serde(default)]
    pub retry_max: usize,

    /// Deprecated: wait between failed passes.
    #[serde(default, deserialize_with = "serde_duration::deserialize")]
    pub retry_interval: Option<Duration>,

    /// Structured join block.
    #[serde(default)]
    pub server_join: Option<ServerJoin>,
}

/// Client section.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Structured join block.
    #[serde(default)]
    pub server_join: Option<ServerJoin>,
}

/// Structured join block shared by servers and clients.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerJoin {
    /// Addresses to eagerly join once at startup. Servers only; the key being
    /// present at all is an error for clients.
    #[serde(default)]
    pub start_join: Option<Vec<String>>,

    /// Join specifications to retry until joined.
    #[serde(default)]
    pub retry_join: Vec<String>,

    /// Maximum retry passes, 0 for unlimited.
    #[serde(default)]
    pub retry_max: usize,

    /// Wait between failed passes.
    #[serde(default, deserialize_with = "serde_duration::deserialize")]
    pub retry_interval: Option<Duration>,
}

impl ServerJoin {
    pub(crate) fn has_start_join(&self) -> bool {
        self.start_join.as_ref().is_some_and(|targets| !targets.is_empty())
    }
}

impl AgentConfig {
    /// Parses the configuration from TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid TOML or contains unknown keys.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Reads and parses a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&content)
    }

    /// Validates the configuration and returns the retry join settings for `role`.
    ///
    /// Returns `Ok(None)` when the role has no retry targets configured, in which
    /// case the agent does not auto-join.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure.
    pub fn join_config(&self, role: Role) -> Result<Option<JoinConfig>> {
        validate(self)?;

        let block = match role {
            Role::Server => {
                let Some(server) = &self.server else {
                    return Ok(None);
                };

                match &server.server_join {
                    Some(server_join) if !server_join.retry_join.is_empty() => server_join.clone(),
                    _ => ServerJoin {
                        start_join: None,
                        retry_join: server.retry_join.clone(),
                        retry_max: server.retry_max,
                        retry_interval: server.retry_interval,
                    },
                }
            }
            Role::Client => {
                let Some(server_join) = self.client.as_ref().and_then(|c| c.server_join.as_ref())
                else {
                    return Ok(None);
                };

                server_join.clone()
            }
        };

        if block.retry_join.is_empty() {
            return Ok(None);
        }

        JoinConfig::new(
            block.retry_join,
            block.retry_max,
            block.retry_interval.unwrap_or(DEFAULT_RETRY_INTERVAL),
        )
        .map(Some)
    }

    /// Returns the addresses a server eagerly joins once at startup.
    ///
    /// Always empty for clients.
    #[must_use]
    pub fn start_join(&self, role: Role) -> Vec<String> {
        match (role, &self.server) {
            (Role::Server, Some(server)) => server
                .server_join
                .as_ref()
                .and_then(|server_join| server_join.start_join.clone())
                .filter(|targets| !targets.is_empty())
                .unwrap_or_else(|| server.start_join.clone()),
            _ => Vec::new(),
        }
    }
}

/// Validated retry join settings for one role.
///
/// Read-only once constructed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JoinConfig {
    targets: Vec<String>,
    max_attempts: usize,
    retry_interval: Duration,
}

impl JoinConfig {
    /// Creates join settings.
    ///
    /// `max_attempts` of 0 means retry forever.
    ///
    /// # Errors
    ///
    /// Returns an error if `retry_interval` is zero.
    pub fn new(targets: Vec<String>, max_attempts: usize, retry_interval: Duration) -> Result<Self> {
        if retry_interval.is_zero() {
            return Err(ConfigError::ZeroRetryInterval("retry_interval"));
        }

        Ok(Self {
            targets,
            max_attempts,
            retry_interval,
        })
    }

    /// Join specifications, in configuration order.
    #[must_use]
    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// Maximum number of failed passes before giving up, 0 for unlimited.
    #[must_use]
    pub const fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Wait between failed passes.
    #[must_use]
    pub const fn retry_interval(&self) -> Duration {
        self.retry_interval
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn test_parse_flat_server_fields() {
        let config = AgentConfig::from_toml_str(
            r#"
            [server]
            retry_join = ["10.0.0.1", "exec=/usr/local/bin/peers --role server"]
            retry_max = 3
            retry_interval = "15s"
            "#,
        )
        .unwrap();

        let join = config.join_config(Role::Server).unwrap().unwrap();
        assert_eq!(
            join.targets(),
            ["10.0.0.1", "exec=/usr/local/bin/peers --role server"]
        );
        assert_eq!(join.max_attempts(), 3);
        assert_eq!(join.retry_interval(), Duration::from_secs(15));

        assert!(config.join_config(Role::Client).unwrap().is_none());
    }

    #[test]
    fn test_parse_server_join_block() {
        let config = AgentConfig::from_toml_str(
            r#"
            [server.server_join]
            retry_join = ["provider=aws tag_key=role tag_value=server"]
            retry_interval = "1m30s"
            "#,
        )
        .unwrap();

        let join = config.join_config(Role::Server).unwrap().unwrap();
        assert_eq!(join.targets(), ["provider=aws tag_key=role tag_value=server"]);
        assert_eq!(join.max_attempts(), 0);
        assert_eq!(join.retry_interval(), Duration::from_secs(90));
    }

    #[test]
    fn test_client_defaults() {
        let config = AgentConfig::from_toml_str(
            r#"
            [client.server_join]
            retry_join = ["server.service.consul"]
            "#,
        )
        .unwrap();

        let join = config.join_config(Role::Client).unwrap().unwrap();
        assert_eq!(join.targets(), ["server.service.consul"]);
        assert_eq!(join.retry_interval(), DEFAULT_RETRY_INTERVAL);
        assert!(config.start_join(Role::Client).is_empty());
    }

    #[test]
    fn test_no_join_settings() {
        let config = AgentConfig::from_toml_str("").unwrap();

        assert!(config.join_config(Role::Server).unwrap().is_none());
        assert!(config.join_config(Role::Client).unwrap().is_none());

        let config = AgentConfig::from_toml_str("[server]\n[client]\n").unwrap();
        assert!(config.join_config(Role::Server).unwrap().is_none());
        assert!(config.join_config(Role::Client).unwrap().is_none());
    }

    #[test]
    fn test_start_join_prefers_block() {
        let config = AgentConfig::from_toml_str(
            r#"
            [server]
            start_join = ["10.0.0.9"]
            "#,
        )
        .unwrap();
        assert_eq!(config.start_join(Role::Server), vec!["10.0.0.9"]);

        let config = AgentConfig::from_toml_str(
            r#"
            [server.server_join]
            start_join = ["10.0.0.7", "10.0.0.8"]
            "#,
        )
        .unwrap();
        assert_eq!(config.start_join(Role::Server), vec!["10.0.0.7", "10.0.0.8"]);
        assert!(config.join_config(Role::Server).unwrap().is_none());
    }

    #[test]
    fn test_rejects_unknown_keys_and_bad_durations() {
        assert_matches!(
            AgentConfig::from_toml_str("[server]\nretry_joins = []\n"),
            Err(ConfigError::Parse(_))
        );
        assert_matches!(
            AgentConfig::from_toml_str("[server]\nretry_interval = \"soon\"\n"),
            Err(ConfigError::Parse(_))
        );
    }

    #[test]
    fn test_join_config_rejects_zero_interval() {
        assert_matches!(
            JoinConfig::new(vec!["10.0.0.1".to_string()], 0, Duration::ZERO),
            Err(ConfigError::ZeroRetryInterval(_))
        );
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[client.server_join]").unwrap();
        writeln!(file, "retry_join = [\"10.0.0.1\"]").unwrap();
        writeln!(file, "retry_max = 5").unwrap();

        let config = AgentConfig::from_file(file.path()).unwrap();
        let join = config.join_config(Role::Client).unwrap().unwrap();
        assert_eq!(join.max_attempts(), 5);

        assert_matches!(
            AgentConfig::from_file("/nonexistent/rejoin.toml"),
            Err(ConfigError::Read { .. })
        );
    }
}
