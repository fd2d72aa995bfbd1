//! Retrying cluster join until it succeeds or the attempt budget runs out.

use std::error::Error;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error as ThisError;
use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::config::JoinConfig;
use crate::resolver::Resolve;
use crate::sleeper::{Sleeper, TokioSleeper};

/// Performs the actual join once addresses are known.
///
/// For a server this is a gossip join, for a client it registers the servers.
#[async_trait]
pub trait Joiner
where
    Self: Send + Sync + 'static,
{
    /// Join using `addrs`, returning how many peers were joined.
    async fn join(&self, addrs: &[String]) -> Result<usize, Box<dyn Error + Send + Sync>>;
}

/// Adapts a synchronous join routine into a [`Joiner`].
///
/// The routine may block; it runs on tokio's blocking pool.
pub struct FnJoiner<F>(Arc<F>);

impl<F> FnJoiner<F>
where
    F: Fn(&[String]) -> Result<usize, Box<dyn Error + Send + Sync>> + Send + Sync + 'static,
{
    /// Wraps `f`.
    pub fn new(f: F) -> Self {
        Self(Arc::new(f))
    }
}

#[async_trait]
impl<F> Joiner for FnJoiner<F>
where
    F: Fn(&[String]) -> Result<usize, Box<dyn Error + Send + Sync>> + Send + Sync + 'static,
{
    async fn join(&self, addrs: &[String]) -> Result<usize, Box<dyn Error + Send + Sync>> {
        let f = Arc::clone(&self.0);
        let addrs = addrs.to_vec();

        tokio::task::spawn_blocking(move || (*f)(&addrs))
            .await
            .map_err(|e| format!("join routine did not complete: {e}"))?
    }
}

/// How a retry join run ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JoinOutcome {
    /// No targets were configured; nothing was attempted.
    Idle,

    /// A join succeeded.
    Succeeded {
        /// Number of peers joined, as reported by the joiner.
        joined: usize,
    },

    /// The maximum number of attempts was reached without joining.
    Exhausted,

    /// Shutdown was requested before a join succeeded.
    Cancelled,
}

/// Why a single pass did not join.
#[derive(Debug, ThisError)]
enum PassFailure {
    #[error("no join addresses discovered")]
    NoAddresses,

    #[error("no join handler configured")]
    NoJoiner,

    #[error("{0}")]
    Join(Box<dyn Error + Send + Sync>),
}

/// Fires once if the retry joiner gives up.
///
/// Handed to the owning process, which decides how to react (typically by
/// shutting the agent down).
#[derive(Debug)]
pub struct ExhaustedSignal {
    rx: oneshot::Receiver<()>,
}

impl ExhaustedSignal {
    /// Waits for the joiner to finish.
    ///
    /// Returns `true` if retries were exhausted and `false` if the joiner ended
    /// in any other way.
    pub async fn exhausted(self) -> bool {
        self.rx.await.is_ok()
    }

    /// Checks without waiting. `None` while the joiner is still running.
    pub fn try_exhausted(&mut self) -> Option<bool> {
        match self.rx.try_recv() {
            Ok(()) => Some(true),
            Err(oneshot::error::TryRecvError::Closed) => Some(false),
            Err(oneshot::error::TryRecvError::Empty) => None,
        }
    }
}

/// Resolves the configured join targets and retries joining until it
/// succeeds or the attempt budget is spent.
///
/// Single use: [`run`](Self::run) consumes the joiner. Build a new one to
/// join again later.
pub struct RetryJoiner<R>
where
    R: Resolve,
{
    config: JoinConfig,
    exhausted_tx: oneshot::Sender<()>,
    joiner: Option<Arc<dyn Joiner>>,
    resolver: R,
    shutdown: CancellationToken,
    sleeper: Arc<dyn Sleeper>,
}

impl<R> RetryJoiner<R>
where
    R: Resolve,
{
    /// Creates a retry joiner and the signal that reports exhaustion.
    ///
    /// Without a `joiner` every pass counts as failed.
    pub fn new(
        config: JoinConfig,
        resolver: R,
        joiner: Option<Arc<dyn Joiner>>,
    ) -> (Self, ExhaustedSignal) {
        let (exhausted_tx, rx) = oneshot::channel();

        let retry_joiner = Self {
            config,
            exhausted_tx,
            joiner,
            resolver,
            shutdown: CancellationToken::new(),
            sleeper: Arc::new(TokioSleeper),
        };

        (retry_joiner, ExhaustedSignal { rx })
    }

    /// Replaces the clock used between failed passes.
    #[must_use]
    pub fn with_sleeper<S: Sleeper>(mut self, sleeper: S) -> Self {
        self.sleeper = Arc::new(sleeper);
        self
    }

    /// Token that stops the joiner between passes or during the retry wait.
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Runs the joiner on its own task.
    pub fn spawn(self) -> RetryJoinHandle {
        let shutdown = self.shutdown.clone();
        let task = tokio::spawn(self.run());

        RetryJoinHandle { shutdown, task }
    }

    /// Runs join passes until one succeeds, the attempt budget is spent or
    /// shutdown is requested.
    ///
    /// Resolution and join errors are logged, never returned.
    pub async fn run(self) -> JoinOutcome {
        let Self {
            config,
            exhausted_tx,
            joiner,
            resolver,
            shutdown,
            sleeper,
        } = self;

        if config.targets().is_empty() {
            trace!("no retry join targets configured");
            return JoinOutcome::Idle;
        }

        info!(servers = %config.targets().join(" "), "starting retry join");

        let mut attempt: usize = 0;

        loop {
            if shutdown.is_cancelled() {
                info!(attempt, "retry join cancelled");
                return JoinOutcome::Cancelled;
            }

            let addrs = resolve_all(&resolver, config.targets()).await;

            let failure = match &joiner {
                _ if addrs.is_empty() => PassFailure::NoAddresses,
                None => PassFailure::NoJoiner,
                Some(joiner) => match joiner.join(&addrs).await {
                    Ok(joined) => {
                        info!(initial_servers = joined, "retry join completed");
                        return JoinOutcome::Succeeded { joined };
                    }
                    Err(e) => PassFailure::Join(e),
                },
            };

            attempt += 1;
            if config.max_attempts() > 0 && attempt >= config.max_attempts() {
                error!(attempts = attempt, error = %failure, "max join retry exhausted, exiting");
                if exhausted_tx.send(()).is_err() {
                    debug!("exhaustion signal dropped by owner");
                }
                return JoinOutcome::Exhausted;
            }

            warn!(
                attempt,
                error = %failure,
                retry = ?config.retry_interval(),
                "join failed"
            );

            tokio::select! {
                () = sleeper.sleep(config.retry_interval()) => {}
                () = shutdown.cancelled() => {
                    info!(attempt, "retry join cancelled");
                    return JoinOutcome::Cancelled;
                }
            }
        }
    }
}

/// Resolves every target in order, skipping the ones that fail.
async fn resolve_all<R: Resolve>(resolver: &R, targets: &[String]) -> Vec<String> {
    let mut addrs = Vec::new();

    for target in targets {
        match resolver.resolve(target).await {
            Ok(resolved) => addrs.extend(resolved),
            Err(e) => {
                error!(join_config = %target, error = %e, "discovering join addresses failed");
            }
        }
    }

    addrs
}

/// Handle to a retry joiner running on its own task.
#[derive(Debug)]
pub struct RetryJoinHandle {
    shutdown: CancellationToken,
    task: JoinHandle<JoinOutcome>,
}

impl RetryJoinHandle {
    /// Asks the joiner to stop. It returns [`JoinOutcome::Cancelled`] unless
    /// it already finished.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Whether the joiner has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the joiner to finish.
    ///
    /// # Errors
    ///
    /// Returns an error if the task panicked or was aborted.
    pub async fn wait(self) -> Result<JoinOutcome, JoinError> {
        self.task.await
    }
}
