//! Error types for the mock discovery providers.

use rejoin_discovery::{DiscoveryError, DiscoveryErrorKind, ParseAddrError};
use thiserror::Error;

/// Error type for the mock discovery providers.
#[derive(Clone, Debug, Error)]
pub enum Error {
    /// A scripted program failure, carrying its bounded stderr.
    #[error("exec discovery failed: {0}")]
    Exec(String),

    /// Scripted program output contained something other than IP literals.
    #[error(transparent)]
    Parse(#[from] ParseAddrError),

    /// A scripted backend failure.
    #[error("provider discovery failed: {0}")]
    Provider(String),

    /// No response was scripted for the configuration string.
    #[error("no discovery response scripted for {0:?}")]
    UnknownConfig(String),
}

impl DiscoveryError for Error {
    fn kind(&self) -> DiscoveryErrorKind {
        match self {
            Self::Exec(_) => DiscoveryErrorKind::Exec,
            Self::Parse(_) => DiscoveryErrorKind::Parse,
            Self::Provider(_) => DiscoveryErrorKind::Provider,
            Self::UnknownConfig(_) => DiscoveryErrorKind::InvalidConfig,
        }
    }
}
