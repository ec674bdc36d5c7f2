//! Rate-controlled publish loop.
//!
//! One run is strictly sequential: synthesize, publish, wait. Counters are
//! owned by the run and every attempted event lands in exactly one of them.

use crate::core::config::RunPlan;
use crate::core::traits::{EventSink, Pacer, PublishError};
use crate::sources::synth::Synthesizer;
use std::future::Future;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Shared flag that asks a run to stop before its next iteration.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How an interrupt watcher finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// The interrupt source failed before anything arrived.
    Unavailable,
    /// The run was asked to stop and no second interrupt followed.
    Graceful,
    /// A second interrupt arrived; the caller should exit without waiting.
    Forced,
}

/// Drives `stop` from a source of interrupts such as `tokio::signal::ctrl_c`.
///
/// The first interrupt triggers `stop` so the run ends after its current
/// event. The second returns `Interrupt::Forced`.
pub async fn watch_interrupts<F, Fut>(stop: &StopSignal, mut next_interrupt: F) -> Interrupt
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    if let Err(err) = next_interrupt().await {
        warn!(error = %err, "cannot listen for interrupts");
        return Interrupt::Unavailable;
    }
    info!("interrupt received, stopping after the current event (interrupt again to exit now)");
    stop.trigger();

    match next_interrupt().await {
        Ok(()) => Interrupt::Forced,
        Err(_) => Interrupt::Graceful,
    }
}

/// Lifecycle of a publisher. `Completed` and `Interrupted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Idle,
    Running,
    Completed,
    Interrupted,
}

/// Snapshot handed to the progress callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub sent: u64,
    pub failed: u64,
    pub total: u64,
    pub elapsed: Duration,
    /// Acknowledged events per second since the run started.
    pub rate: f64,
}

impl Progress {
    pub fn percent(&self) -> u64 {
        if self.total == 0 {
            100
        } else {
            self.sent.saturating_mul(100) / self.total
        }
    }
}

/// Final accounting for a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub status: RunStatus,
    /// Event budget (`rate × duration`).
    pub total: u64,
    pub attempted: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn achieved_rate(&self) -> f64 {
        per_second(self.succeeded, self.elapsed)
    }

    pub fn interrupted(&self) -> bool {
        self.status == RunStatus::Interrupted
    }
}

/// Error for misuse of a publisher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublisherError {
    AlreadyRan(RunStatus),
}

impl std::fmt::Display for PublisherError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PublisherError::AlreadyRan(status) => {
                write!(f, "publisher already ran (status {status:?})")
            }
        }
    }
}

impl std::error::Error for PublisherError {}

/// Drives a synthesizer into a sink at the plan's cadence.
pub struct Publisher<S, P> {
    sink: S,
    synthesizer: Synthesizer,
    pacer: P,
    stop: StopSignal,
    status: RunStatus,
}

impl<S: EventSink, P: Pacer> Publisher<S, P> {
    pub fn new(sink: S, synthesizer: Synthesizer, pacer: P, stop: StopSignal) -> Self {
        Self {
            sink,
            synthesizer,
            pacer,
            stop,
            status: RunStatus::Idle,
        }
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn pacer(&self) -> &P {
        &self.pacer
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn deploy_id(&self) -> &str {
        self.synthesizer.deploy_id()
    }

    /// Runs the plan to completion or until the stop signal is observed.
    ///
    /// Publish failures are counted and never end the run early.
    pub fn run(
        &mut self,
        plan: &RunPlan,
        mut on_progress: impl FnMut(&Progress),
    ) -> Result<RunSummary, PublisherError> {
        if self.status != RunStatus::Idle {
            return Err(PublisherError::AlreadyRan(self.status));
        }
        self.status = RunStatus::Running;

        let total = plan.total_events();
        let report_every = (total / 10).max(100);
        info!(
            profile = %plan.profile,
            rate = plan.events_per_second,
            seconds = plan.seconds,
            total,
            deploy_id = self.synthesizer.deploy_id(),
            sink = self.sink.name(),
            "starting run"
        );

        let start = Instant::now();
        let mut attempted = 0_u64;
        let mut succeeded = 0_u64;
        let mut failed = 0_u64;
        let mut status = RunStatus::Completed;

        for _ in 0..total {
            if self.stop.is_triggered() {
                status = RunStatus::Interrupted;
                break;
            }
            let iteration_start = Instant::now();
            attempted += 1;

            let event = self.synthesizer.synthesize(plan.profile);
            let outcome = event
                .to_payload()
                .map_err(PublishError::from)
                .and_then(|payload| self.sink.publish(&payload));

            match outcome {
                Ok(message_id) => {
                    succeeded += 1;
                    debug!(trace_id = %event.trace_id, message_id = %message_id, "published event");
                    if succeeded % report_every == 0 {
                        let elapsed = start.elapsed();
                        on_progress(&Progress {
                            sent: succeeded,
                            failed,
                            total,
                            elapsed,
                            rate: per_second(succeeded, elapsed),
                        });
                    }
                }
                Err(err) => {
                    failed += 1;
                    warn!(trace_id = %event.trace_id, error = %err, "failed to publish event");
                }
            }

            self.pacer.wait(iteration_start);
        }

        if let Err(err) = self.sink.flush() {
            warn!(error = %err, "failed to flush sink");
        }

        self.status = status;
        let summary = RunSummary {
            status,
            total,
            attempted,
            succeeded,
            failed,
            elapsed: start.elapsed(),
        };
        info!(
            status = ?summary.status,
            attempted,
            succeeded,
            failed,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "run finished"
        );
        Ok(summary)
    }
}

fn per_second(count: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        count as f64 / secs
    } else {
        0.0
    }
}
