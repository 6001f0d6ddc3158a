use super::Orchestrator;
use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Something the advancement loop can tick.
#[async_trait]
pub trait Advance: Send + Sync + 'static {
    /// Runs one tick. Returns `true` while non-terminal jobs remain.
    async fn advance(&self) -> bool;
}

#[async_trait]
impl<R: Rng + Send + 'static> Advance for Mutex<Orchestrator<R>> {
    async fn advance(&self) -> bool {
        self.lock().await.tick().active_jobs > 0
    }
}

/// A cancellable periodic task that advances migration jobs.
///
/// The loop ends by itself once no job is left to advance. Dropping the handle
/// cancels it.
pub struct AdvancementLoop {
    handle: Option<JoinHandle<()>>,
}

impl AdvancementLoop {
    /// Spawns the loop on the current tokio runtime. The first tick fires one
    /// `period` after spawning.
    pub fn spawn<T: Advance>(target: Arc<T>, period: Duration) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of a tokio interval completes immediately.
            interval.tick().await;

            loop {
                interval.tick().await;
                if !target.advance().await {
                    log::info!("No active migration jobs left; advancement loop stopped");
                    break;
                }
            }
        });
        Self {
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stops the loop. Ticks not yet started never fire.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            log::debug!("Advancement loop cancelled");
        }
    }
}

impl Drop for AdvancementLoop {
    fn drop(&mut self) {
        self.cancel();
    }
}
