//! # clipcheck
//!
//! Validate video clips and sample evenly-spaced still frames from them.
//!
//! `clipcheck` coordinates a single stateful media resource whose readiness
//! is only ever reported asynchronously — events, a timer, and possible
//! failure signals that can arrive in any order, each meaningful at most
//! once. The crate races those signals to exactly one outcome, checks the
//! resolved metadata against configurable thresholds, and can drive a
//! strictly sequential seek-and-capture loop to produce JPEG frame
//! payloads. Decoding itself is delegated to an external media backend
//! (the bundled [`FfmpegBackend`](ffmpeg::FfmpegBackend) shells out to
//! `ffprobe`/`ffmpeg`); the core is backend-agnostic and fully testable
//! against the deterministic [`MockBackend`](mock::MockBackend).
//!
//! ## Quick Start
//!
//! ### Validate a Clip
//!
//! ```no_run
//! use clipcheck::ffmpeg::FfmpegBackend;
//! use clipcheck::{Thresholds, validate_media};
//!
//! # async fn example() {
//! let backend = FfmpegBackend::new();
//! let outcome = validate_media(&backend, "input.mp4", &Thresholds::new()).await;
//! println!("valid: {}", outcome.valid);
//! # }
//! ```
//!
//! ### Sample Frames
//!
//! ```no_run
//! use clipcheck::ffmpeg::FfmpegBackend;
//! use clipcheck::{SampleOptions, Thresholds, sample_frames};
//!
//! # async fn example() -> Result<(), clipcheck::ClipCheckError> {
//! let backend = FfmpegBackend::new();
//! let frames = sample_frames(
//!     &backend,
//!     "input.mp4",
//!     &Thresholds::new(),
//!     &SampleOptions::new().with_frame_count(6),
//! )
//! .await?;
//! assert!(frames.len() <= 6);
//! # Ok(())
//! # }
//! ```
//!
//! ### Validate a Batch
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use clipcheck::ffmpeg::FfmpegBackend;
//! use clipcheck::{Thresholds, validate_batch};
//!
//! # async fn example() {
//! let backend = Arc::new(FfmpegBackend::new());
//! let inputs = vec!["a.mp4".to_string(), "b.mp4".to_string()];
//! let summary = validate_batch(backend, inputs, Thresholds::new()).await;
//! println!("{:.0}% passed", summary.pass_rate);
//! # }
//! ```
//!
//! ## Features
//!
//! - **Readiness race** — success, failure, and timeout signals arbitrated
//!   to exactly one terminal outcome with exactly-once resource cleanup
//! - **Threshold validation** — duration and resolution limits with a soft
//!   duration ceiling (warning, not error) and accumulated violations
//! - **Frame sampling** — sequential seek/capture loop, two documented
//!   interval policies, base64 or data-URL JPEG payloads, best-effort
//!   per-frame error recovery
//! - **Batch validation** — unbounded concurrent fan-out with
//!   deterministic input-order aggregation
//! - **Backend abstraction** — a small capability interface with a
//!   production ffmpeg implementation and a scripted mock for tests
//! - **Collaborator utilities** — workflow-description shape validation,
//!   stability presets, scoped correlation ids, environment preflight
//!
//! ## Requirements
//!
//! The production backend requires the `ffmpeg` and `ffprobe` executables
//! on the `PATH`. The core library and the mock backend have no external
//! requirements.

pub mod backend;
pub mod batch;
pub mod correlation;
pub mod error;
pub mod ffmpeg;
pub mod flags;
pub mod metadata;
pub mod mock;
pub mod preflight;
pub mod race;
pub mod sampler;
pub mod thresholds;
pub mod validator;
pub mod workflow;

pub use backend::{MediaBackend, MediaHandle, MediaLocator, MediaResource, ResourceEvent};
pub use batch::{BatchSummary, validate_batch};
pub use correlation::CorrelationContext;
pub use error::ClipCheckError;
pub use flags::{ProcessingFlags, StabilityProfile};
pub use metadata::{
    FailureKind, FailureReason, MediaErrorCode, PLAYBACK_READY_LEVEL, ResolvedMetadata, StreamInfo,
};
pub use preflight::{PreflightReport, run_preflight};
pub use race::{LoadOutcome, ReadinessRace};
pub use sampler::{
    FrameEncoding, FrameSampler, FrameSequence, SampleOptions, SamplePolicy, SampledFrame,
    sample_frames,
};
pub use thresholds::Thresholds;
pub use validator::{ValidationOutcome, evaluate, validate_media};
pub use workflow::{WorkflowFormat, WorkflowReport, validate_workflow};
