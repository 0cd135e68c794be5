//! Background refresh of the pathway stats and live activity panels

use std::sync::Arc;
use std::time::Duration;

use copilot_client::{ApiError, ComplianceApi};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::state::{Event, Store};

/// Counters for background fetches that would otherwise fail silently
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollDiagnostics {
    pub ticks: u64,
    pub failures: u64,
    pub last_error: Option<String>,
}

/// Handle to a running poll loop.
///
/// Dropping the handle cancels the loop; [`LivePoller::stop`] also waits for
/// it to finish.
pub struct LivePoller {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
    diagnostics: watch::Receiver<PollDiagnostics>,
}

impl LivePoller {
    /// Start polling. The first fetch happens immediately.
    pub fn spawn(
        api: Arc<dyn ComplianceApi>,
        store: Store,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        let (tx, rx) = watch::channel(PollDiagnostics::default());
        let handle = tokio::spawn(poll_loop(api, store, interval, cancel.clone(), tx));

        info!(interval_secs = interval.as_secs_f64(), "Live polling started");

        Self {
            cancel,
            handle: Some(handle),
            diagnostics: rx,
        }
    }

    pub fn diagnostics(&self) -> PollDiagnostics {
        self.diagnostics.borrow().clone()
    }

    /// Receiver that is notified after every tick
    pub fn subscribe(&self) -> watch::Receiver<PollDiagnostics> {
        self.diagnostics.clone()
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancel the loop and wait for it to exit
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!("Live polling task ended abnormally: {}", e);
            }
        }
        info!("Live polling stopped");
    }
}

impl Drop for LivePoller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn poll_loop(
    api: Arc<dyn ComplianceApi>,
    store: Store,
    interval: Duration,
    cancel: CancellationToken,
    diagnostics: watch::Sender<PollDiagnostics>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Poll loop cancelled");
                break;
            }
            _ = ticker.tick() => {}
        }

        // Both fetches finish before the next tick is awaited, so ticks never overlap
        let (stats, activity) = tokio::join!(api.pathway_stats(&cancel), api.live_activity(&cancel));

        // A fetch that completed alongside a cancelled one is discarded
        if cancel.is_cancelled() {
            debug!("Poll loop cancelled mid-tick");
            break;
        }

        let mut errors = Vec::new();
        match stats {
            Ok(stats) => {
                store.dispatch(Event::PathwayStatsLoaded(stats));
            }
            Err(e) => errors.push(e),
        }
        match activity {
            Ok(response) => {
                store.dispatch(Event::LiveActivityLoaded(response.activities));
            }
            Err(e) => errors.push(e),
        }

        if errors.iter().any(ApiError::is_cancelled) {
            break;
        }

        diagnostics.send_modify(|d| {
            d.ticks += 1;
            for e in &errors {
                warn!(error = %e, "Live polling fetch failed");
                d.failures += 1;
                d.last_error = Some(e.to_string());
            }
        });
    }
}
