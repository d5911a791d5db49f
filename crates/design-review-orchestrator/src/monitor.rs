//! Continuous monitoring.
//!
//! A single scheduler loop keeps a monotonic deadline per review frequency.
//! Tiers that fall due together are reviewed in one cycle, cycles never
//! overlap, and missed ticks are coalesced into the next future deadline.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use design_review_core::obs;
use design_review_core::ReviewFrequency;
use tokio::sync::{watch, RwLock};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::OrchestrationConfig;
use crate::orchestrator::{DesignReviewOrchestrator, OrchestrationResult};

/// What a call to [`MonitoringScheduler::run_cycle`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Completed(Box<OrchestrationResult>),

    /// No configured page uses the due frequencies.
    Idle,

    /// Another cycle was still in progress.
    Skipped,
}

/// Tiers whose deadline is at or before `now`, in frequency order.
pub fn due_tiers(next_due: &BTreeMap<ReviewFrequency, Instant>, now: Instant) -> Vec<ReviewFrequency> {
    next_due
        .iter()
        .filter(|(_, due)| **due <= now)
        .map(|(tier, _)| *tier)
        .collect()
}

/// The first deadline after `now` on the grid `next_due + k * interval`.
pub fn advance(next_due: Instant, interval: Duration, now: Instant) -> Instant {
    let interval = interval.max(Duration::from_millis(1));
    if next_due > now {
        return next_due;
    }
    let behind = now.duration_since(next_due).as_nanos();
    let steps = behind / interval.as_nanos() + 1;
    next_due + interval * u32::try_from(steps).unwrap_or(u32::MAX)
}

/// Resets the run-in-progress flag when a cycle ends.
struct CycleGuard<'a>(&'a AtomicBool);

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct MonitoringScheduler {
    orchestrator: Arc<DesignReviewOrchestrator>,
    config: OrchestrationConfig,
    running: AtomicBool,
    cycles: AtomicU64,
    skipped: AtomicU64,
    last_result: RwLock<Option<OrchestrationResult>>,
}

impl MonitoringScheduler {
    pub fn new(orchestrator: Arc<DesignReviewOrchestrator>, config: OrchestrationConfig) -> Self {
        Self {
            orchestrator,
            config,
            running: AtomicBool::new(false),
            cycles: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            last_result: RwLock::new(None),
        }
    }

    pub fn interval(&self, tier: ReviewFrequency) -> Duration {
        self.config.monitoring.interval(tier)
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    pub fn cycles_skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    pub async fn last_result(&self) -> Option<OrchestrationResult> {
        self.last_result.read().await.clone()
    }

    /// Review the pages of the given tiers, unless a cycle is already running.
    pub async fn run_cycle(&self, tiers: &[ReviewFrequency]) -> CycleOutcome {
        let names = tiers.iter().map(|t| t.name()).collect::<Vec<_>>().join(",");

        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.skipped.fetch_add(1, Ordering::Relaxed);
            obs::emit_monitor_cycle(&names, 0, true);
            return CycleOutcome::Skipped;
        }
        let _guard = CycleGuard(&self.running);

        let scoped = self.config.for_frequencies(tiers);
        if scoped.pages.is_empty() {
            debug!(tiers = %names, "no pages due");
            return CycleOutcome::Idle;
        }

        obs::emit_monitor_cycle(&names, scoped.pages.len(), false);
        let result = self.orchestrator.orchestrate_review(&scoped).await;
        self.orchestrator.notify(&result, &scoped.notifications).await;

        self.cycles.fetch_add(1, Ordering::Relaxed);
        *self.last_result.write().await = Some(result.clone());
        CycleOutcome::Completed(Box::new(result))
    }

    /// Run until `shutdown` becomes true or its sender is dropped.
    ///
    /// Each tier first falls due one interval after start. Shutdown is
    /// observed between cycles; a running cycle is allowed to finish.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let start = Instant::now();
        let mut next_due: BTreeMap<ReviewFrequency, Instant> = ReviewFrequency::ALL
            .iter()
            .map(|tier| (*tier, start + self.interval(*tier)))
            .collect();
        info!(pages = self.config.pages.len(), "monitoring started");

        loop {
            if *shutdown.borrow() {
                break;
            }
            let wake = next_due.values().min().copied().unwrap_or(start);

            tokio::select! {
                _ = tokio::time::sleep_until(wake) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }

            let tiers = due_tiers(&next_due, Instant::now());
            if tiers.is_empty() {
                continue;
            }
            self.run_cycle(&tiers).await;

            let now = Instant::now();
            for tier in &tiers {
                if let Some(due) = next_due.get_mut(tier) {
                    *due = advance(*due, self.interval(*tier), now);
                }
            }
        }

        info!(
            cycles = self.cycles_completed(),
            skipped = self.cycles_skipped(),
            "monitoring stopped"
        );
    }
}
