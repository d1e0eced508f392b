//! Evenly-spaced frame sampling.
//!
//! [`FrameSampler`] drives a strictly sequential seek-and-capture loop over
//! a ready [`MediaHandle`]: one resource supports one active position, so a
//! seek is only issued after the previous one's completion signal arrived.
//! Each captured frame is encoded to a JPEG payload at fixed quality and
//! appended in temporal order. Per-frame capture or encode failures are
//! logged and skipped — the loop is best-effort and never aborts the
//! remaining iterations.
//!
//! Two interval policies and two payload encodings exist in the wild; both
//! are preserved here as named strategies ([`SamplePolicy`],
//! [`FrameEncoding`]) rather than silently picking one.
//!
//! # Example
//!
//! ```no_run
//! use clipcheck::ffmpeg::FfmpegBackend;
//! use clipcheck::{SampleOptions, Thresholds, sample_frames};
//!
//! # async fn example() -> Result<(), clipcheck::ClipCheckError> {
//! let backend = FfmpegBackend::new();
//! let options = SampleOptions::new().with_frame_count(6);
//! let frames = sample_frames(&backend, "clip.mp4", &Thresholds::new(), &options).await?;
//! for payload in frames.payloads() {
//!     println!("{} base64 chars", payload.len());
//! }
//! # Ok(())
//! # }
//! ```

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::codecs::jpeg::JpegEncoder;

use crate::backend::{MediaBackend, MediaHandle, MediaLocator, ResourceEvent};
use crate::error::ClipCheckError;
use crate::metadata::ResolvedMetadata;
use crate::race::{LoadOutcome, ReadinessRace};
use crate::thresholds::Thresholds;

/// How target timestamps are spread across the clip.
///
/// Both policies produce uniform spacing; they differ in which endpoints
/// they exclude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamplePolicy {
    /// Divide `[0, d)` into `n` equal steps and sample at each step start:
    /// `t_i = i·d/n`. Includes `0`, excludes the very end. The default.
    #[default]
    Interior,
    /// Divide `[0, d]` into `n + 1` equal steps and sample one step in:
    /// `t_i = (i+1)·d/(n+1)`. Excludes both endpoints.
    Offset,
}

impl SamplePolicy {
    /// Compute `count` target timestamps across `duration` seconds.
    ///
    /// Timestamps are strictly non-decreasing. Returns an empty vector when
    /// `count` is zero or `duration` is not a positive finite number.
    pub fn timestamps(&self, duration: f64, count: usize) -> Vec<f64> {
        if count == 0 || !duration.is_finite() || duration <= 0.0 {
            return Vec::new();
        }
        match self {
            SamplePolicy::Interior => {
                let step = duration / count as f64;
                (0..count).map(|i| i as f64 * step).collect()
            }
            SamplePolicy::Offset => {
                let step = duration / (count + 1) as f64;
                (1..=count).map(|i| i as f64 * step).collect()
            }
        }
    }
}

/// String form of each sampled frame payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameEncoding {
    /// Raw base64 of the JPEG bytes, no prefix. The default.
    #[default]
    Base64,
    /// `data:image/jpeg;base64,`-prefixed string.
    DataUrl,
}

/// Options for one sampling run.
///
/// The frame count is either fixed ([`with_frame_count`]) or derived from a
/// frame rate ([`with_frames_per_second`]); derived counts are bounded to
/// `[min_frames, max_frames]`.
///
/// [`with_frame_count`]: SampleOptions::with_frame_count
/// [`with_frames_per_second`]: SampleOptions::with_frames_per_second
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct SampleOptions {
    /// Fixed number of frames to sample. Ignored when
    /// `frames_per_second` is set.
    pub frame_count: usize,
    /// Derive the frame count from a sampling rate instead of a fixed
    /// number.
    pub frames_per_second: Option<f64>,
    /// Lower bound when the count is derived from a rate.
    pub min_frames: usize,
    /// Upper bound when the count is derived from a rate.
    pub max_frames: usize,
    /// Timestamp spacing policy.
    pub policy: SamplePolicy,
    /// Output payload encoding.
    pub encoding: FrameEncoding,
    /// JPEG quality (1–100).
    pub jpeg_quality: u8,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            frame_count: 8,
            frames_per_second: None,
            min_frames: 1,
            max_frames: 64,
            policy: SamplePolicy::default(),
            encoding: FrameEncoding::default(),
            jpeg_quality: 80,
        }
    }
}

impl SampleOptions {
    /// Create options with the defaults: 8 frames, interior spacing, raw
    /// base64 payloads, JPEG quality 80.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample a fixed number of frames.
    pub fn with_frame_count(mut self, count: usize) -> Self {
        self.frame_count = count;
        self.frames_per_second = None;
        self
    }

    /// Derive the frame count from a sampling rate (frames per second of
    /// source duration), bounded to `[min_frames, max_frames]`.
    pub fn with_frames_per_second(mut self, rate: f64) -> Self {
        self.frames_per_second = Some(rate);
        self
    }

    /// Set the bounds applied to rate-derived frame counts.
    pub fn with_frame_bounds(mut self, min_frames: usize, max_frames: usize) -> Self {
        self.min_frames = min_frames;
        self.max_frames = max_frames.max(min_frames);
        self
    }

    /// Set the timestamp spacing policy.
    pub fn with_policy(mut self, policy: SamplePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the payload encoding.
    pub fn with_encoding(mut self, encoding: FrameEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Set the JPEG quality (1–100).
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    /// Resolve the number of frames to sample for a clip of `duration`
    /// seconds.
    pub fn resolve_frame_count(&self, duration: f64) -> usize {
        match self.frames_per_second {
            Some(rate) if rate.is_finite() && rate > 0.0 && duration.is_finite() => {
                let derived = (duration * rate).round() as usize;
                derived.clamp(self.min_frames, self.max_frames)
            }
            Some(_) => self.min_frames,
            None => self.frame_count,
        }
    }
}

/// One sampled frame: its target timestamp and the encoded payload.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledFrame {
    /// The (clamped) timestamp this frame was captured at, in seconds.
    pub seconds: f64,
    /// Encoded JPEG payload, per the run's [`FrameEncoding`].
    pub payload: String,
}

/// The ordered output of one sampling run.
///
/// Insertion order is temporal order. The sequence may be shorter than the
/// requested count when the source duration is zero or non-finite (empty
/// result) or when individual captures failed (those frames are omitted).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameSequence {
    frames: Vec<SampledFrame>,
}

impl FrameSequence {
    /// Number of frames captured.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether no frames were captured.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The sampled frames, in temporal order.
    pub fn frames(&self) -> &[SampledFrame] {
        &self.frames
    }

    /// Iterate over the encoded payloads in temporal order.
    pub fn payloads(&self) -> impl Iterator<Item = &str> {
        self.frames.iter().map(|frame| frame.payload.as_str())
    }

    /// Consume the sequence into its payload strings.
    pub fn into_payloads(self) -> Vec<String> {
        self.frames.into_iter().map(|frame| frame.payload).collect()
    }

    /// The capture timestamps, in order.
    pub fn timestamps(&self) -> Vec<f64> {
        self.frames.iter().map(|frame| frame.seconds).collect()
    }
}

/// Sequential seek-and-capture loop over one ready handle.
///
/// The sampler takes ownership of the handle and releases it when the run
/// completes or aborts, whichever comes first.
pub struct FrameSampler {
    handle: MediaHandle,
    metadata: ResolvedMetadata,
    options: SampleOptions,
}

impl FrameSampler {
    /// Wrap a handle whose readiness race resolved to `Ready` with the
    /// given metadata.
    pub fn new(handle: MediaHandle, metadata: ResolvedMetadata, options: SampleOptions) -> Self {
        Self {
            handle,
            metadata,
            options,
        }
    }

    /// Run the sampling loop to completion.
    ///
    /// A zero or non-finite duration yields an empty sequence immediately —
    /// that is not an error. Individual capture or encode failures are
    /// logged and the frame is omitted; the loop continues. If the decoder
    /// goes away mid-run the frames collected so far are returned.
    pub async fn run(mut self) -> FrameSequence {
        let duration = self.metadata.duration_seconds;
        if !duration.is_finite() || duration <= 0.0 {
            log::debug!(
                "skipping frame sampling for {}: duration {duration} is not usable",
                self.handle.locator(),
            );
            self.handle.release();
            return FrameSequence::default();
        }

        let count = self.options.resolve_frame_count(duration);
        let targets = self.options.policy.timestamps(duration, count);
        log::debug!(
            "sampling {count} frames from {} ({duration:.2}s, {:?} policy)",
            self.handle.locator(),
            self.options.policy,
        );

        let mut sequence = FrameSequence::default();
        for (index, target) in targets.into_iter().enumerate() {
            let seconds = target.clamp(0.0, duration);

            if let Err(error) = self.handle.request_seek(seconds) {
                log::warn!("seek request for frame {index} failed: {error}");
                break;
            }
            if !self.await_seek_complete().await {
                log::warn!("decoder went away before seek {index} completed");
                break;
            }

            match self.capture_and_encode(seconds) {
                Ok(frame) => sequence.frames.push(frame),
                Err(error) => {
                    // Best-effort: skip this frame, keep sampling.
                    log::warn!("dropping frame {index} at {seconds:.2}s: {error}");
                }
            }
        }

        self.handle.release();
        sequence
    }

    /// Suspend until the pending seek's completion signal arrives.
    ///
    /// Returns `false` if the event channel closed first.
    async fn await_seek_complete(&mut self) -> bool {
        loop {
            match self.handle.next_event().await {
                Some(ResourceEvent::SeekComplete { .. }) => return true,
                // Late or duplicate load-phase signals are meaningless here.
                Some(_) => continue,
                None => return false,
            }
        }
    }

    /// Capture the displayed frame and encode it per the run's options.
    fn capture_and_encode(&mut self, seconds: f64) -> Result<SampledFrame, ClipCheckError> {
        let surface = self.handle.capture_frame()?;

        let mut jpeg = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, self.options.jpeg_quality);
        encoder.encode_image(&surface)?;

        let encoded = BASE64.encode(&jpeg);
        let payload = match self.options.encoding {
            FrameEncoding::Base64 => encoded,
            FrameEncoding::DataUrl => format!("data:image/jpeg;base64,{encoded}"),
        };

        Ok(SampledFrame { seconds, payload })
    }
}

/// Sample frames from a media locator end to end.
///
/// Opens the locator, races readiness against the thresholds' load timeout,
/// and runs the sequential sampling loop. Unlike validation, load failures
/// here are errors — the caller asked for frames and none can be produced.
///
/// # Errors
///
/// - [`ClipCheckError::EmptyLocator`] for an empty locator.
/// - [`ClipCheckError::Load`] when the resource signals a failure.
/// - [`ClipCheckError::LoadTimeout`] when no terminal signal arrives in time.
pub async fn sample_frames<B: MediaBackend>(
    backend: &B,
    locator: &str,
    thresholds: &Thresholds,
    options: &SampleOptions,
) -> Result<FrameSequence, ClipCheckError> {
    let locator = MediaLocator::new(locator);
    if locator.is_empty() {
        return Err(ClipCheckError::EmptyLocator);
    }

    let handle = backend.open(&locator)?;
    let race = ReadinessRace::new(handle);
    let (outcome, handle) = race.resolve(thresholds.load_timeout_ms).await;

    match (outcome, handle) {
        (LoadOutcome::Ready(metadata), Some(handle)) => {
            let sampler = FrameSampler::new(handle, metadata, options.clone());
            Ok(sampler.run().await)
        }
        (LoadOutcome::Failed(reason), _) => Err(ClipCheckError::Load(reason)),
        (LoadOutcome::TimedOut { elapsed_ms }, _) => Err(ClipCheckError::LoadTimeout { elapsed_ms }),
        // Ready without a handle cannot happen; treat as a vanished decoder.
        (LoadOutcome::Ready(_), None) => Err(ClipCheckError::ResourceReleased),
    }
}
