//! Cross-field validation of join settings.

use std::time::Duration;

use crate::config::AgentConfig;
use crate::error::{ConfigError, Result};

/// Ensures that the join settings of `config` are not self-contradictory.
///
/// The deprecated flat server fields and the `server_join` block must not both
/// be used, and clients must not configure eager joins. Conflicts are never
/// resolved by precedence. A configuration without any join settings is valid.
///
/// # Errors
///
/// Returns the first conflict found, naming the fields involved.
pub fn validate(config: &AgentConfig) -> Result<()> {
    if let Some(server) = &config.server {
        if let Some(server_join) = &server.server_join {
            if server_join.has_start_join() && !server.start_join.is_empty() {
                return Err(ConfigError::ServerJoinConflict("start_join"));
            }

            let block_retries = !server_join.retry_join.is_empty();

            // Any retry setting in the block claims the retry surface.
            if block_retries || server_join.retry_max != 0 || server_join.retry_interval.is_some()
            {
                if !server.retry_join.is_empty() {
                    return Err(ConfigError::ServerJoinConflict("retry_join"));
                }
                if block_retries && !server.start_join.is_empty() {
                    return Err(ConfigError::ServerJoinConflict("start_join"));
                }
                if server.retry_max != 0 {
                    return Err(ConfigError::ServerJoinConflict("retry_max"));
                }
                if server.retry_interval.is_some() {
                    return Err(ConfigError::ServerJoinConflict("retry_interval"));
                }
            }

            if block_retries && server_join.has_start_join() {
                return Err(ConfigError::RetryAndStartJoin);
            }

            check_interval(server_join.retry_interval, "server.server_join.retry_interval")?;
        }

        check_interval(server.retry_interval, "server.retry_interval")?;
    }

    if let Some(server_join) = config.client.as_ref().and_then(|c| c.server_join.as_ref()) {
        if server_join.start_join.is_some() {
            return Err(ConfigError::ClientStartJoin);
        }

        check_interval(server_join.retry_interval, "client.server_join.retry_interval")?;
    }

    Ok(())
}

fn check_interval(interval: Option<Duration>, field: &'static str) -> Result<()> {
    match interval {
        Some(interval) if interval.is_zero() => Err(ConfigError::ZeroRetryInterval(field)),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::config::{ClientConfig, ServerConfig, ServerJoin};

    fn targets(addrs: &[&str]) -> Vec<String> {
        addrs.iter().map(ToString::to_string).collect()
    }

    fn server(server: ServerConfig) -> AgentConfig {
        AgentConfig {
            server: Some(server),
            client: None,
        }
    }

    fn client(server_join: ServerJoin) -> AgentConfig {
        AgentConfig {
            server: None,
            client: Some(ClientConfig {
                server_join: Some(server_join),
            }),
        }
    }

    fn retry_block() -> ServerJoin {
        ServerJoin {
            retry_join: targets(&["provider=aws tag_key=role tag_value=server"]),
            ..ServerJoin::default()
        }
    }

    #[test]
    fn test_empty_config_is_valid() {
        assert!(validate(&AgentConfig::default()).is_ok());
        assert!(validate(&server(ServerConfig::default())).is_ok());
        assert!(validate(&client(ServerJoin::default())).is_ok());
    }

    #[test]
    fn test_server_block_alone_is_valid() {
        let config = server(ServerConfig {
            server_join: Some(ServerJoin {
                retry_max: 3,
                retry_interval: Some(Duration::from_secs(5)),
                ..retry_block()
            }),
            ..ServerConfig::default()
        });
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_server_flat_fields_alone_are_valid() {
        let config = server(ServerConfig {
            start_join: targets(&["10.0.0.5"]),
            retry_join: targets(&["10.0.0.1"]),
            retry_max: 3,
            retry_interval: Some(Duration::from_secs(5)),
            server_join: None,
        });
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_server_block_and_flat_retry_join() {
        let config = server(ServerConfig {
            retry_join: targets(&["10.0.0.1"]),
            server_join: Some(retry_block()),
            ..ServerConfig::default()
        });

        let err = validate(&config).unwrap_err();
        assert_matches!(err, ConfigError::ServerJoinConflict("retry_join"));
        assert_eq!(
            err.to_string(),
            "server_join and retry_join cannot both be defined; prefer setting the server_join block"
        );
    }

    #[test]
    fn test_server_block_and_identical_flat_retry_join() {
        let block = retry_block();
        let config = server(ServerConfig {
            retry_join: block.retry_join.clone(),
            server_join: Some(block),
            ..ServerConfig::default()
        });

        assert_matches!(
            validate(&config),
            Err(ConfigError::ServerJoinConflict("retry_join"))
        );
    }

    #[test]
    fn test_server_block_and_flat_retry_settings() {
        let config = server(ServerConfig {
            retry_max: 3,
            server_join: Some(retry_block()),
            ..ServerConfig::default()
        });
        assert_matches!(
            validate(&config),
            Err(ConfigError::ServerJoinConflict("retry_max"))
        );

        let config = server(ServerConfig {
            retry_interval: Some(Duration::from_secs(30)),
            server_join: Some(retry_block()),
            ..ServerConfig::default()
        });
        assert_matches!(
            validate(&config),
            Err(ConfigError::ServerJoinConflict("retry_interval"))
        );
    }

    #[test]
    fn test_server_block_retry_settings_without_targets() {
        // Block only tunes the retry loop while the flat fields hold the targets.
        let config = server(ServerConfig {
            retry_join: targets(&["10.0.0.1"]),
            retry_max: 3,
            server_join: Some(ServerJoin {
                retry_max: 5,
                retry_interval: Some(Duration::from_secs(10)),
                ..ServerJoin::default()
            }),
            ..ServerConfig::default()
        });
        assert_matches!(
            validate(&config),
            Err(ConfigError::ServerJoinConflict("retry_join"))
        );

        let config = server(ServerConfig {
            retry_interval: Some(Duration::from_secs(30)),
            server_join: Some(ServerJoin {
                retry_interval: Some(Duration::from_secs(10)),
                ..ServerJoin::default()
            }),
            ..ServerConfig::default()
        });
        assert_matches!(
            validate(&config),
            Err(ConfigError::ServerJoinConflict("retry_interval"))
        );

        let config = server(ServerConfig {
            retry_max: 3,
            server_join: Some(ServerJoin {
                retry_max: 5,
                ..ServerJoin::default()
            }),
            ..ServerConfig::default()
        });
        assert_matches!(
            validate(&config),
            Err(ConfigError::ServerJoinConflict("retry_max"))
        );
    }

    #[test]
    fn test_server_block_retry_settings_with_flat_start_join() {
        // Eager joins and a tuned retry loop do not overlap.
        let config = server(ServerConfig {
            start_join: targets(&["10.0.0.5"]),
            server_join: Some(ServerJoin {
                retry_max: 5,
                ..ServerJoin::default()
            }),
            ..ServerConfig::default()
        });
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_server_block_retry_and_flat_start_join() {
        let config = server(ServerConfig {
            start_join: targets(&["10.0.0.5"]),
            server_join: Some(retry_block()),
            ..ServerConfig::default()
        });
        assert_matches!(
            validate(&config),
            Err(ConfigError::ServerJoinConflict("start_join"))
        );
    }

    #[test]
    fn test_server_block_start_join_and_flat_start_join() {
        let config = server(ServerConfig {
            start_join: targets(&["10.0.0.5"]),
            server_join: Some(ServerJoin {
                start_join: Some(targets(&["10.0.0.6"])),
                ..ServerJoin::default()
            }),
            ..ServerConfig::default()
        });
        assert_matches!(
            validate(&config),
            Err(ConfigError::ServerJoinConflict("start_join"))
        );
    }

    #[test]
    fn test_server_block_retry_and_start_join() {
        let config = server(ServerConfig {
            server_join: Some(ServerJoin {
                start_join: Some(targets(&["10.0.0.6"])),
                ..retry_block()
            }),
            ..ServerConfig::default()
        });

        let err = validate(&config).unwrap_err();
        assert_matches!(err, ConfigError::RetryAndStartJoin);
        assert_eq!(err.to_string(), "retry_join and start_join cannot both be defined");
    }

    #[test]
    fn test_client_start_join_always_rejected() {
        let config = client(ServerJoin {
            start_join: Some(targets(&["10.0.0.6"])),
            ..ServerJoin::default()
        });
        assert_matches!(validate(&config), Err(ConfigError::ClientStartJoin));

        // Presence alone is enough.
        let config = client(ServerJoin {
            start_join: Some(Vec::new()),
            ..retry_block()
        });
        let err = validate(&config).unwrap_err();
        assert_eq!(err.to_string(), "start_join is not supported for clients");
    }

    #[test]
    fn test_zero_retry_interval() {
        let config = client(ServerJoin {
            retry_interval: Some(Duration::ZERO),
            ..retry_block()
        });
        let err = validate(&config).unwrap_err();
        assert_eq!(
            err.to_string(),
            "client.server_join.retry_interval must be greater than zero"
        );

        let config = server(ServerConfig {
            retry_join: targets(&["10.0.0.1"]),
            retry_interval: Some(Duration::ZERO),
            ..ServerConfig::default()
        });
        assert_matches!(
            validate(&config),
            Err(ConfigError::ZeroRetryInterval("server.retry_interval"))
        );
    }
}
