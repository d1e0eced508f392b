//! The readiness race: resolving one loading attempt to exactly one outcome.
//!
//! A loading attempt is subject to three independent asynchronous triggers —
//! the metadata-ready signal, the failure signal, and the load timer — which
//! can fire in any order, possibly within the same tick. [`ReadinessRace`]
//! arbitrates them with a first-writer-wins rule: the first trigger to
//! arrive while the race is still `Loading` settles it, and every later
//! trigger is an idempotent no-op. Settlement runs cleanup exactly once and
//! unconditionally — the timer is cancelled, the event channel is no longer
//! polled, and on the failure paths the decoder resource is released — so
//! the underlying decoder can never leak, even when the caller discards the
//! result.
//!
//! On a `Ready` settlement the live handle is handed back to the caller
//! instead of being torn down, because the validator or sampler still needs
//! it; both consumers release it through the idempotent
//! [`MediaHandle::release`], keeping the release-exactly-once invariant on
//! every path.
//!
//! # Example
//!
//! ```no_run
//! use clipcheck::{LoadOutcome, MediaBackend, MediaLocator, ReadinessRace};
//! use clipcheck::ffmpeg::FfmpegBackend;
//!
//! # async fn example() -> Result<(), clipcheck::ClipCheckError> {
//! let backend = FfmpegBackend::new();
//! let handle = backend.open(&MediaLocator::new("clip.mp4"))?;
//! let race = ReadinessRace::new(handle);
//! let (outcome, handle) = race.resolve(10_000).await;
//! match outcome {
//!     LoadOutcome::Ready(metadata) => println!("{}s", metadata.duration_seconds),
//!     LoadOutcome::Failed(reason) => println!("failed: {reason}"),
//!     LoadOutcome::TimedOut { elapsed_ms } => println!("gave up after {elapsed_ms}ms"),
//! }
//! drop(handle); // releases the resource if the attempt succeeded
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use crate::backend::{MediaHandle, ResourceEvent};
use crate::metadata::{FailureReason, MediaErrorCode, ResolvedMetadata, StreamInfo};

/// The single terminal result of one loading attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Metadata arrived before failure or timeout.
    Ready(ResolvedMetadata),
    /// The resource signalled a failure.
    Failed(FailureReason),
    /// No terminal signal arrived within the configured timeout.
    TimedOut {
        /// The timeout that elapsed, in milliseconds.
        elapsed_ms: u64,
    },
}

impl LoadOutcome {
    /// Whether this outcome is `Ready`.
    pub fn is_ready(&self) -> bool {
        matches!(self, LoadOutcome::Ready(_))
    }

    /// The failure reason carried by non-ready outcomes.
    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            LoadOutcome::Ready(_) => None,
            LoadOutcome::Failed(reason) => Some(reason.clone()),
            LoadOutcome::TimedOut { elapsed_ms } => Some(FailureReason::timeout(*elapsed_ms)),
        }
    }
}

/// What woke the resolve loop.
enum RaceTrigger {
    /// A decoder signal (or channel closure) arrived.
    Event(Option<ResourceEvent>),
    /// The load timer expired.
    TimerExpired,
}

/// Where the race currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RaceState {
    /// Created, not yet loading.
    Init,
    /// Waiting for one of the three triggers.
    Loading,
    /// Terminal; no transition leaves this state.
    Settled,
}

/// State machine arbitrating one loading attempt to exactly one outcome.
///
/// The three trigger methods — [`signal_ready`](ReadinessRace::signal_ready),
/// [`signal_failure`](ReadinessRace::signal_failure), and
/// [`signal_timeout`](ReadinessRace::signal_timeout) — each attempt to
/// settle the race and return whether they won. At most one of them ever
/// returns `true`; the rest are no-ops. Most callers never invoke the
/// triggers directly and instead use [`resolve`](ReadinessRace::resolve),
/// which wires them to the resource's event channel and a tokio timer.
pub struct ReadinessRace {
    state: RaceState,
    timeout_ms: u64,
    handle: Option<MediaHandle>,
    outcome: Option<LoadOutcome>,
}

impl ReadinessRace {
    /// Wrap a freshly opened handle. The race starts in `Init`.
    pub fn new(handle: MediaHandle) -> Self {
        Self {
            state: RaceState::Init,
            timeout_ms: 0,
            handle: Some(handle),
            outcome: None,
        }
    }

    /// Transition `Init → Loading`, arming the race with its timeout value.
    ///
    /// A no-op once loading has begun.
    pub fn begin(&mut self, timeout_ms: u64) {
        if self.state == RaceState::Init {
            self.state = RaceState::Loading;
            self.timeout_ms = timeout_ms;
        }
    }

    /// The settled outcome, if any.
    pub fn outcome(&self) -> Option<&LoadOutcome> {
        self.outcome.as_ref()
    }

    /// Whether the race has reached a terminal state.
    pub fn is_settled(&self) -> bool {
        self.state == RaceState::Settled
    }

    /// Trigger: the metadata-ready signal arrived.
    ///
    /// Returns `true` if this trigger settled the race.
    pub fn signal_ready(&mut self, info: StreamInfo) -> bool {
        self.settle(LoadOutcome::Ready(ResolvedMetadata::from_stream_info(info)))
    }

    /// Trigger: the resource reported a failure with its native error code.
    ///
    /// Returns `true` if this trigger settled the race.
    pub fn signal_failure(&mut self, code: MediaErrorCode) -> bool {
        self.settle(LoadOutcome::Failed(FailureReason::from_code(code)))
    }

    /// Trigger: the load timer expired.
    ///
    /// Returns `true` if this trigger settled the race.
    pub fn signal_timeout(&mut self) -> bool {
        self.settle(LoadOutcome::TimedOut {
            elapsed_ms: self.timeout_ms,
        })
    }

    /// First-writer-wins settlement with exactly-once cleanup.
    fn settle(&mut self, outcome: LoadOutcome) -> bool {
        if self.state != RaceState::Loading {
            return false;
        }
        self.state = RaceState::Settled;

        // Cleanup: the failure paths tear the resource down here; the ready
        // path keeps the handle alive for the consumer, which releases it
        // through the same idempotent MediaHandle::release.
        if !outcome.is_ready() {
            if let Some(mut handle) = self.handle.take() {
                handle.release();
            }
        }

        log::debug!("readiness race settled: {outcome:?}");
        self.outcome = Some(outcome);
        true
    }

    /// Drive the race to completion against the resource's event channel.
    ///
    /// Consumes the race, waits for the first of the three triggers, and
    /// returns the outcome together with the live handle when the attempt
    /// succeeded (`None` otherwise — the resource was already released by
    /// settlement). Dropping out of this function cancels the pending timer
    /// and detaches from the event channel on every path.
    pub async fn resolve(mut self, timeout_ms: u64) -> (LoadOutcome, Option<MediaHandle>) {
        self.begin(timeout_ms);
        if !self.is_settled() {
            // The timer armed below is the only one that can fire, so it is
            // the value a timeout must report, even after an earlier begin().
            self.timeout_ms = timeout_ms;
        }

        let deadline = tokio::time::sleep(Duration::from_millis(timeout_ms));
        tokio::pin!(deadline);

        while !self.is_settled() {
            // Scoped so the handle borrow ends before a trigger fires.
            let trigger = {
                // The handle is only absent after settlement, which the
                // loop condition already excludes.
                let Some(handle) = self.handle.as_mut() else {
                    break;
                };
                tokio::select! {
                    event = handle.next_event() => RaceTrigger::Event(event),
                    _ = &mut deadline => RaceTrigger::TimerExpired,
                }
            };

            match trigger {
                RaceTrigger::Event(Some(ResourceEvent::MetadataReady(info))) => {
                    self.signal_ready(info);
                }
                RaceTrigger::Event(Some(ResourceEvent::LoadFailed(code))) => {
                    self.signal_failure(code);
                }
                // A stray seek signal during loading is meaningless.
                RaceTrigger::Event(Some(ResourceEvent::SeekComplete { .. })) => {}
                // Channel closed: the decoder went away without a terminal
                // signal.
                RaceTrigger::Event(None) => {
                    self.signal_failure(MediaErrorCode::ABORTED);
                }
                RaceTrigger::TimerExpired => {
                    self.signal_timeout();
                }
            }
        }

        let outcome = self
            .outcome
            .take()
            .unwrap_or(LoadOutcome::TimedOut { elapsed_ms: timeout_ms });
        let handle = if outcome.is_ready() {
            self.handle.take()
        } else {
            None
        };
        (outcome, handle)
    }
}
