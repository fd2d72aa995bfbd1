//! Cluster auto-join for node agents.
//!
//! Resolves configured join specifications (literal addresses, `exec=`
//! programs or `provider=` discovery queries) into peer addresses and keeps
//! retrying the join until it succeeds or the attempt budget is spent.
//!
//! Typical wiring:
//! 1. Load an [`AgentConfig`] and call [`AgentConfig::join_config`], which
//!    validates it. A validation error aborts startup.
//! 2. Build an [`AddressResolver`] from exec and provider discovery
//!    implementations.
//! 3. Create a [`RetryJoiner`] with the agent's [`Joiner`] and
//!    [`spawn`](RetryJoiner::spawn) it.
//! 4. Watch the returned [`ExhaustedSignal`] to learn if joining gave up.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod config;
pub mod coordinator;
pub mod error;
pub mod resolver;
pub mod sleeper;
pub mod validate;

mod serde_duration;

pub use config::{AgentConfig, ClientConfig, JoinConfig, Role, ServerConfig, ServerJoin};
pub use coordinator::{
    ExhaustedSignal, FnJoiner, JoinOutcome, Joiner, RetryJoinHandle, RetryJoiner,
};
pub use error::{ConfigError, ResolveError};
pub use resolver::{AddressResolver, JoinSpec, Resolve};
pub use sleeper::{Sleeper, TokioSleeper};
pub use validate::validate;
