//! Resolution of join specifications into addresses.

use std::sync::Arc;

use async_trait::async_trait;
use rejoin_discovery::{
    DiscoveryError, EXEC_PREFIX, ExecDiscovery, PROVIDER_PREFIX, ProviderDiscovery,
};
use tracing::{Instrument, debug, debug_span};

use crate::error::ResolveError;

/// A single configured join target, tagged by its prefix.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum JoinSpec<'a> {
    /// `exec=<path> [arg ...]`, resolved by running a program.
    Exec(&'a str),

    /// `provider=<name> key=val ...`, resolved by a discovery backend.
    Provider(&'a str),

    /// Anything else. Left for the join callback or membership protocol to interpret.
    Literal(&'a str),
}

impl<'a> JoinSpec<'a> {
    /// Classifies `spec` by prefix. Each variant keeps the full string.
    #[must_use]
    pub fn parse(spec: &'a str) -> Self {
        if spec.starts_with(EXEC_PREFIX) {
            Self::Exec(spec)
        } else if spec.starts_with(PROVIDER_PREFIX) {
            Self::Provider(spec)
        } else {
            Self::Literal(spec)
        }
    }
}

/// Turns one join specification into zero or more addresses.
#[async_trait]
pub trait Resolve
where
    Self: Send + Sync + 'static,
{
    /// Resolve `spec`.
    ///
    /// An error only concerns this one specification; callers skip it and
    /// carry on with the remaining targets.
    async fn resolve(&self, spec: &str) -> Result<Vec<String>, ResolveError>;
}

/// Resolves join specifications through an exec and a provider strategy.
///
/// Holds no state between calls.
pub struct AddressResolver<E, P>
where
    E: ExecDiscovery,
    P: ProviderDiscovery,
{
    exec: Arc<E>,
    provider: Arc<P>,
}

impl<E, P> AddressResolver<E, P>
where
    E: ExecDiscovery,
    P: ProviderDiscovery,
{
    /// Creates a resolver using the given strategies.
    pub const fn new(exec: Arc<E>, provider: Arc<P>) -> Self {
        Self { exec, provider }
    }

    /// Describes the provider configuration grammar.
    pub fn provider_help(&self) -> String {
        self.provider.help()
    }

    /// Names of the configured discovery providers.
    pub fn provider_names(&self) -> Vec<String> {
        self.provider.names()
    }
}

impl<E, P> Clone for AddressResolver<E, P>
where
    E: ExecDiscovery,
    P: ProviderDiscovery,
{
    fn clone(&self) -> Self {
        Self {
            exec: self.exec.clone(),
            provider: self.provider.clone(),
        }
    }
}

#[async_trait]
impl<E, P> Resolve for AddressResolver<E, P>
where
    E: ExecDiscovery,
    P: ProviderDiscovery,
{
    async fn resolve(&self, spec: &str) -> Result<Vec<String>, ResolveError> {
        let addrs = match JoinSpec::parse(spec) {
            JoinSpec::Exec(cfg) => {
                let records = self
                    .exec
                    .ip_addrs(cfg)
                    .instrument(debug_span!("exec_discovery", join_config = %cfg))
                    .await
                    .map_err(|e| ResolveError::Exec {
                        kind: e.kind(),
                        source: Box::new(e),
                    })?;

                records.iter().map(ToString::to_string).collect()
            }
            JoinSpec::Provider(cfg) => self
                .provider
                .addrs(cfg)
                .instrument(debug_span!("provider_discovery", join_config = %cfg))
                .await
                .map_err(|e| ResolveError::Provider {
                    kind: e.kind(),
                    source: Box::new(e),
                })?,
            JoinSpec::Literal(addr) => return Ok(vec![addr.to_string()]),
        };

        debug!(join_config = %spec, count = addrs.len(), "discovered join addresses");

        Ok(addrs)
    }
}
