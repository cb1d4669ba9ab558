//! Scheduled analysis runner.
//!
//! One dedicated thread owns the pipeline, so runs are serialized by
//! construction: interval ticks and manual triggers are coalesced onto
//! the same thread and can never interleave two runs. This is the
//! single-flight boundary the engine assumes.

use std::sync::{Arc, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{info, warn};

use stocksense_engine::pipeline::InventoryAnalysis;
use stocksense_engine::store::RunStatus;

/// Config for the analysis runner.
#[derive(Debug, Clone)]
pub struct AnalysisRunner {
    pub interval: Duration,
    pub max_retries: u32,
    pub base_backoff: Duration,
}

impl Default for AnalysisRunner {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(24 * 60 * 60),
            max_retries: 5,
            base_backoff: Duration::from_secs(30),
        }
    }
}

/// Handle for the running analysis thread (shutdown + trigger hook).
#[derive(Debug)]
pub struct AnalysisRunnerHandle {
    shutdown: mpsc::Sender<()>,
    trigger: mpsc::SyncSender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl AnalysisRunnerHandle {
    /// On-demand trigger hook (e.g. after a bulk catalog import).
    ///
    /// Triggers are coalesced through a bounded queue: if a run is
    /// already pending, this becomes a no-op.
    pub fn trigger(&self) {
        let _ = self.trigger.try_send(());
    }

    /// Gracefully stop the runner thread.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }
}

impl AnalysisRunner {
    /// Spawn the runner thread owning `analysis`.
    ///
    /// - Schedule: runs every `interval`, plus once on startup
    /// - On-demand: call `handle.trigger()`
    /// - Failed runs: retried with bounded exponential backoff; the
    ///   pipeline itself already records every outcome, so the runner
    ///   only logs
    pub fn spawn<A>(&self, name: &'static str, analysis: Arc<A>) -> AnalysisRunnerHandle
    where
        A: InventoryAnalysis + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let (trigger_tx, trigger_rx) = mpsc::sync_channel::<()>(1);

        let cfg = self.clone();
        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || runner_loop(name, cfg, shutdown_rx, trigger_rx, analysis))
            .expect("failed to spawn analysis runner thread");

        AnalysisRunnerHandle {
            shutdown: shutdown_tx,
            trigger: trigger_tx,
            join: Some(join),
        }
    }
}

fn runner_loop<A>(
    name: &'static str,
    cfg: AnalysisRunner,
    shutdown_rx: mpsc::Receiver<()>,
    trigger_rx: mpsc::Receiver<()>,
    analysis: Arc<A>,
) where
    A: InventoryAnalysis + 'static,
{
    info!(runner = name, "analysis runner started");

    let mut next_tick = Instant::now() + cfg.interval;
    let mut pending = true; // run once on startup
    let mut failures: u32 = 0;
    let mut backoff_until: Option<Instant> = None;

    loop {
        // Shutdown has priority.
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        let now = Instant::now();
        if now >= next_tick {
            pending = true;
            // Keep a stable cadence even if we were delayed.
            while next_tick <= now {
                next_tick += cfg.interval;
            }
        }

        // Drain triggers non-blockingly so bursts coalesce into one run.
        while trigger_rx.try_recv().is_ok() {
            pending = true;
        }

        // Backoff gate.
        if let Some(until) = backoff_until {
            if Instant::now() < until {
                thread::sleep(Duration::from_millis(50));
                continue;
            }
            backoff_until = None;
        }

        if !pending {
            let sleep_for = next_tick
                .saturating_duration_since(Instant::now())
                .min(Duration::from_millis(250));
            thread::sleep(sleep_for);
            continue;
        }

        pending = false;

        let report = analysis.run(Utc::now());
        match report.status {
            RunStatus::Success => {
                failures = 0;
                info!(
                    runner = name,
                    run = %report.run_id,
                    classifications = report.classification_writes,
                    thresholds = report.threshold_writes,
                    "analysis run completed"
                );
            }
            RunStatus::Error => {
                failures += 1;
                warn!(
                    runner = name,
                    run = %report.run_id,
                    attempt = failures,
                    message = %report.message,
                    "analysis run failed"
                );
                if failures <= cfg.max_retries {
                    pending = true;
                    backoff_until = Some(Instant::now() + backoff(cfg.base_backoff, failures));
                } else {
                    // Give up until the next tick or trigger.
                    failures = 0;
                }
            }
        }
    }

    info!(runner = name, "analysis runner stopped");
}

/// Bounded exponential backoff: base * 2^(attempt-1), capped at 10 min.
fn backoff(base: Duration, attempt: u32) -> Duration {
    let exp = attempt.saturating_sub(1).min(16);
    let scaled = base.saturating_mul(1u32 << exp);
    scaled.min(Duration::from_secs(600))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_caps() {
        let base = Duration::from_millis(250);
        assert_eq!(backoff(base, 1), Duration::from_millis(250));
        assert_eq!(backoff(base, 2), Duration::from_millis(500));
        assert_eq!(backoff(base, 3), Duration::from_secs(1));
        assert_eq!(backoff(base, 60), Duration::from_secs(600));
    }
}
