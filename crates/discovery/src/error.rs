use std::error::Error;
use std::fmt::{self, Debug, Display};

use thiserror::Error as ThisError;

/// The kind of discovery error.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DiscoveryErrorKind {
    /// The external program failed or could not be started
    Exec,

    /// The discovery backend returned an error
    Provider,

    /// The configuration string is malformed or names an unknown provider
    InvalidConfig,

    /// Output could not be parsed into addresses
    Parse,

    /// Other/unknown error
    Other,
}

impl Display for DiscoveryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Marker trait for discovery provider errors
pub trait DiscoveryError: Debug + Error + Send + Sync + 'static {
    /// Returns the kind of this error
    fn kind(&self) -> DiscoveryErrorKind;
}

/// A token in program output that is not a valid IP literal.
#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ParseAddrError {
    /// The token is not an IPv4 or IPv6 literal.
    #[error("invalid IP address: {0:?}")]
    InvalidIp(String),

    /// A zone index was given on an IPv4 address.
    #[error("zone index is only valid for IPv6 addresses: {0:?}")]
    ZoneOnIpv4(String),

    /// The `%` separator was not followed by a zone.
    #[error("empty zone index: {0:?}")]
    EmptyZone(String),

    /// The zone index itself contains a `%`.
    #[error("malformed zone index: {0:?}")]
    InvalidZone(String),
}

impl DiscoveryError for ParseAddrError {
    fn kind(&self) -> DiscoveryErrorKind {
        DiscoveryErrorKind::Parse
    }
}
