use std::time::Duration;

use async_trait::async_trait;

/// Waits out the retry interval between failed join passes.
#[async_trait]
pub trait Sleeper
where
    Self: Send + Sync + 'static,
{
    /// Suspend for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
