//! Scripted in-memory discovery providers for testing and local development.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::Error;

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use rejoin_discovery::{
    ExecDiscovery, IpAddrRecord, PROVIDER_PREFIX, ProviderDiscovery, parse_exec_output,
    truncate_stderr,
};
use tokio::sync::Mutex;

/// Responses queued per configuration string, plus a call counter.
#[derive(Debug)]
struct Script<T> {
    calls: HashMap<String, usize>,
    responses: HashMap<String, VecDeque<T>>,
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            calls: HashMap::new(),
            responses: HashMap::new(),
        }
    }
}

impl<T: Clone> Script<T> {
    fn push(&mut self, cfg: &str, response: T) {
        self.responses
            .entry(cfg.to_string())
            .or_default()
            .push_back(response);
    }

    /// Returns the next response for `cfg`. The last one repeats forever.
    fn next(&mut self, cfg: &str) -> Option<T> {
        *self.calls.entry(cfg.to_string()).or_default() += 1;

        let queue = self.responses.get_mut(cfg)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }

    fn calls(&self, cfg: &str) -> usize {
        self.calls.get(cfg).copied().unwrap_or_default()
    }
}

#[derive(Clone, Debug)]
enum ExecResponse {
    Stdout(String),
    Failure(Vec<u8>),
}

/// Mock executable discovery.
///
/// Instead of running programs it replays scripted stdout or stderr for each
/// configuration string, going through the same output handling a real
/// program would get.
#[derive(Clone, Debug, Default)]
pub struct MockExecDiscovery {
    script: Arc<Mutex<Script<ExecResponse>>>,
}

impl MockExecDiscovery {
    /// Creates a mock with no scripted responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful run of `cfg` that prints `stdout`.
    pub async fn push_stdout(&self, cfg: &str, stdout: &str) {
        self.script
            .lock()
            .await
            .push(cfg, ExecResponse::Stdout(stdout.to_string()));
    }

    /// Queues a failed run of `cfg` that writes `stderr`.
    pub async fn push_failure(&self, cfg: &str, stderr: &[u8]) {
        self.script
            .lock()
            .await
            .push(cfg, ExecResponse::Failure(stderr.to_vec()));
    }

    /// Number of times `cfg` was resolved.
    pub async fn calls(&self, cfg: &str) -> usize {
        self.script.lock().await.calls(cfg)
    }
}

#[async_trait]
impl ExecDiscovery for MockExecDiscovery {
    type Error = Error;

    async fn ip_addrs(&self, cfg: &str) -> Result<Vec<IpAddrRecord>, Self::Error> {
        let response = self.script.lock().await.next(cfg);

        match response {
            Some(ExecResponse::Stdout(stdout)) => Ok(parse_exec_output(&stdout)?),
            Some(ExecResponse::Failure(stderr)) => Err(Error::Exec(truncate_stderr(&stderr))),
            None => Err(Error::UnknownConfig(cfg.to_string())),
        }
    }
}

/// Mock provider discovery.
#[derive(Clone, Debug, Default)]
pub struct MockProviderDiscovery {
    script: Arc<Mutex<Script<Result<Vec<String>, String>>>>,
}

impl MockProviderDiscovery {
    /// Creates a mock with no scripted responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful lookup of `cfg`.
    pub async fn push_addrs<I, S>(&self, cfg: &str, addrs: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let addrs = addrs.into_iter().map(Into::into).collect();
        self.script.lock().await.push(cfg, Ok(addrs));
    }

    /// Queues a failed lookup of `cfg`.
    pub async fn push_error(&self, cfg: &str, message: &str) {
        self.script
            .lock()
            .await
            .push(cfg, Err(message.to_string()));
    }

    /// Number of times `cfg` was resolved.
    pub async fn calls(&self, cfg: &str) -> usize {
        self.script.lock().await.calls(cfg)
    }
}

#[async_trait]
impl ProviderDiscovery for MockProviderDiscovery {
    type Error = Error;

    async fn addrs(&self, cfg: &str) -> Result<Vec<String>, Self::Error> {
        match self.script.lock().await.next(cfg) {
            Some(Ok(addrs)) => Ok(addrs),
            Some(Err(message)) => Err(Error::Provider(message)),
            None => Err(Error::UnknownConfig(cfg.to_string())),
        }
    }

    fn help(&self) -> String {
        "provider=mock: replays scripted addresses for the exact configuration string".to_string()
    }

    fn names(&self) -> Vec<String> {
        // Only a non-blocking peek is possible from a sync method.
        let Ok(script) = self.script.try_lock() else {
            return Vec::new();
        };

        script
            .responses
            .keys()
            .filter_map(|cfg| provider_name(cfg))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

fn provider_name(cfg: &str) -> Option<String> {
    let rest = cfg.strip_prefix(PROVIDER_PREFIX)?;
    let name = rest.split_whitespace().next()?;
    Some(name.to_string())
}
