//! Error types for join configuration and address resolution

use std::error::Error;
use std::path::PathBuf;

use rejoin_discovery::DiscoveryErrorKind;
use thiserror::Error as ThisError;

/// Convenience alias for configuration results.
pub type Result<T, E = ConfigError> = std::result::Result<T, E>;

/// Configuration errors. These abort startup and are shown to the operator as-is.
#[derive(Debug, ThisError)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        /// Path of the file.
        path: PathBuf,

        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A deprecated server field is set alongside a populated `server_join` block.
    #[error("server_join and {0} cannot both be defined; prefer setting the server_join block")]
    ServerJoinConflict(&'static str),

    /// The `server_join` block sets both retry and eager join targets.
    #[error("retry_join and start_join cannot both be defined")]
    RetryAndStartJoin,

    /// A client `server_join` block sets eager join targets.
    #[error("start_join is not supported for clients")]
    ClientStartJoin,

    /// A retry interval of zero was configured.
    #[error("{0} must be greater than zero")]
    ZeroRetryInterval(&'static str),
}

/// Failure to resolve a single join specification.
#[derive(Debug, ThisError)]
pub enum ResolveError {
    /// The executable strategy failed.
    #[error("{source}")]
    Exec {
        /// Kind reported by the provider.
        kind: DiscoveryErrorKind,

        /// The provider's error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },

    /// The provider strategy failed.
    #[error("{source}")]
    Provider {
        /// Kind reported by the provider.
        kind: DiscoveryErrorKind,

        /// The provider's error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl ResolveError {
    /// Returns the kind reported by the failing provider.
    #[must_use]
    pub const fn kind(&self) -> &DiscoveryErrorKind {
        match self {
            Self::Exec { kind, .. } | Self::Provider { kind, .. } => kind,
        }
    }
}
