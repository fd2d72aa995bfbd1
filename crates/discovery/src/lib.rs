//! Abstract interfaces for discovering cluster peer addresses at join time.
//!
//! Two provider contracts are defined here:
//! - [`ExecDiscovery`] runs an operator-supplied program and parses the IP
//!   literals it prints.
//! - [`ProviderDiscovery`] queries a named cloud or service-registry backend.
//!
//! Implementations live in their own crates.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod addr;
mod error;

pub use addr::{IpAddrRecord, MAX_EXEC_STDERR_BYTES, parse_exec_output, truncate_stderr};
pub use error::{DiscoveryError, DiscoveryErrorKind, ParseAddrError};

use async_trait::async_trait;

/// Prefix selecting executable-based discovery.
pub const EXEC_PREFIX: &str = "exec=";

/// Prefix selecting provider-based discovery.
pub const PROVIDER_PREFIX: &str = "provider=";

/// Discovers addresses by executing an external program.
///
/// The configuration string has the form `exec=<path> [arg ...]`. Arguments
/// are space separated and cannot contain escaped spaces.
///
/// The program must follow these rules:
/// - on success, exit 0 and print whitespace delimited IP addresses to stdout
/// - on failure, exit non-zero and print up to [`MAX_EXEC_STDERR_BYTES`] of
///   diagnostics to stderr, which is surfaced in the returned error
#[async_trait]
pub trait ExecDiscovery
where
    Self: Send + Sync + 'static,
{
    /// The error type for this provider.
    type Error: DiscoveryError;

    /// Run the program named by `cfg` and return the addresses it printed.
    async fn ip_addrs(&self, cfg: &str) -> Result<Vec<IpAddrRecord>, Self::Error>;
}

/// Discovers addresses by querying a named discovery backend.
///
/// The configuration string has the form `provider=<name> key=val key=val ...`
/// where the keys and values are provider specific and URL encoded.
#[async_trait]
pub trait ProviderDiscovery
where
    Self: Send + Sync + 'static,
{
    /// The error type for this provider.
    type Error: DiscoveryError;

    /// Discover addresses of nodes matching the criteria in `cfg`.
    async fn addrs(&self, cfg: &str) -> Result<Vec<String>, Self::Error>;

    /// Describe the configuration grammar and the provider specific options.
    fn help(&self) -> String;

    /// Names of the configured providers.
    fn names(&self) -> Vec<String>;
}
