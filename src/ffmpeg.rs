//! Production media backend over the `ffprobe`/`ffmpeg` executables.
//!
//! Pixel decoding is delegated entirely to the FFmpeg tools: a blocking
//! worker (spawned via `tokio::task::spawn_blocking`) probes the source
//! with `ffprobe`, reports the readiness signal on the event channel, and
//! then services seek commands by extracting a single raw RGB frame per
//! position with `ffmpeg`. The most recent frame is published to a shared
//! capture slot that [`capture_frame`](crate::MediaResource::capture_frame)
//! reads from.
//!
//! Probe and extraction failures are mapped onto the fixed media error-code
//! table: a tool that cannot be spawned behaves like a network failure, a
//! probe that rejects the input like an unsupported format, and a probe
//! whose output cannot be interpreted like a decode failure.

use std::process::Command;
use std::sync::{Arc, Mutex};

use image::RgbImage;
use serde::Deserialize;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::backend::{MediaBackend, MediaHandle, MediaLocator, MediaResource, ResourceEvent};
use crate::error::ClipCheckError;
use crate::metadata::{MediaErrorCode, READINESS_HAVE_ENOUGH, StreamInfo};

/// Commands sent from the resource to its blocking worker.
enum WorkerCommand {
    /// Extract the frame at this position and publish it to the slot.
    Seek(f64),
    /// Reset the source and discard buffered data, then exit.
    Release,
}

/// [`MediaBackend`] implementation backed by the FFmpeg command-line tools.
///
/// Cheap to construct and share; every [`open`](MediaBackend::open) spawns
/// an independent worker. Requires `ffprobe` and `ffmpeg` on the `PATH`
/// (see [`run_preflight`](crate::preflight::run_preflight)).
#[derive(Debug, Clone, Default)]
pub struct FfmpegBackend {
    _private: (),
}

impl FfmpegBackend {
    /// Create the backend.
    pub fn new() -> Self {
        Self::default()
    }
}

impl MediaBackend for FfmpegBackend {
    fn open(&self, locator: &MediaLocator) -> Result<MediaHandle, ClipCheckError> {
        if locator.is_empty() {
            return Err(ClipCheckError::EmptyLocator);
        }

        let (event_sender, event_receiver) = unbounded_channel();
        let (command_sender, command_receiver) = unbounded_channel();
        let capture_slot = Arc::new(Mutex::new(None));

        let worker_locator = locator.as_str().to_string();
        let worker_slot = Arc::clone(&capture_slot);
        tokio::task::spawn_blocking(move || {
            run_worker(worker_locator, event_sender, command_receiver, worker_slot);
        });

        let resource = FfmpegResource {
            events: event_receiver,
            commands: command_sender,
            capture_slot,
        };
        Ok(MediaHandle::new(locator.clone(), Box::new(resource)))
    }
}

/// One live ffmpeg-backed decoder instance.
struct FfmpegResource {
    events: UnboundedReceiver<ResourceEvent>,
    commands: UnboundedSender<WorkerCommand>,
    capture_slot: Arc<Mutex<Option<RgbImage>>>,
}

impl MediaResource for FfmpegResource {
    fn events(&mut self) -> &mut UnboundedReceiver<ResourceEvent> {
        &mut self.events
    }

    fn request_seek(&mut self, seconds: f64) -> Result<(), ClipCheckError> {
        self.commands
            .send(WorkerCommand::Seek(seconds))
            .map_err(|_| ClipCheckError::Seek("decoder worker has exited".to_string()))
    }

    fn capture_frame(&mut self) -> Result<RgbImage, ClipCheckError> {
        let slot = self
            .capture_slot
            .lock()
            .map_err(|_| ClipCheckError::Capture("capture slot poisoned".to_string()))?;
        slot.clone()
            .ok_or_else(|| ClipCheckError::Capture("no frame is currently displayed".to_string()))
    }

    fn release(&mut self) {
        // The worker exits on Release or when the command channel closes,
        // so a failed send means it is already gone.
        let _ = self.commands.send(WorkerCommand::Release);
        self.capture_slot
            .lock()
            .map(|mut slot| *slot = None)
            .unwrap_or(());
    }
}

/// Blocking worker loop: probe once, then service seek commands.
fn run_worker(
    locator: String,
    events: UnboundedSender<ResourceEvent>,
    mut commands: UnboundedReceiver<WorkerCommand>,
    capture_slot: Arc<Mutex<Option<RgbImage>>>,
) {
    let info = match probe_stream(&locator) {
        Ok(info) => {
            // An event send fails only when the handle is gone; nothing
            // left to do for this attempt either way.
            let _ = events.send(ResourceEvent::MetadataReady(info));
            info
        }
        Err(code) => {
            let _ = events.send(ResourceEvent::LoadFailed(code));
            return;
        }
    };

    while let Some(command) = commands.blocking_recv() {
        match command {
            WorkerCommand::Seek(seconds) => {
                match extract_rgb_frame(&locator, seconds, info.width_px, info.height_px) {
                    Ok(frame) => {
                        if let Ok(mut slot) = capture_slot.lock() {
                            *slot = Some(frame);
                        }
                    }
                    Err(error) => {
                        // Leave the slot empty so the capture fails and the
                        // sampler skips this frame.
                        log::warn!("frame extraction at {seconds:.2}s failed: {error}");
                        if let Ok(mut slot) = capture_slot.lock() {
                            *slot = None;
                        }
                    }
                }
                let _ = events.send(ResourceEvent::SeekComplete { seconds });
            }
            WorkerCommand::Release => break,
        }
    }
}

/// Subset of `ffprobe -of json` output this backend consumes.
#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Probe the source's video stream with `ffprobe`.
///
/// Failures map onto the fixed error-code table so the readiness race can
/// treat this backend like any other.
fn probe_stream(locator: &str) -> Result<StreamInfo, MediaErrorCode> {
    log::debug!("probing {locator}");

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,duration",
            "-show_entries",
            "format=duration",
            "-of",
            "json",
            locator,
        ])
        .output()
        .map_err(|error| {
            log::warn!("failed to spawn ffprobe: {error}");
            MediaErrorCode::NETWORK
        })?;

    if !output.status.success() {
        log::debug!("ffprobe rejected {locator}: {:?}", output.status);
        return Err(MediaErrorCode::UNSUPPORTED);
    }

    let probe: ProbeOutput =
        serde_json::from_slice(&output.stdout).map_err(|_| MediaErrorCode::DECODE)?;
    let stream = probe.streams.first().ok_or(MediaErrorCode::UNSUPPORTED)?;

    // Stream-level duration is preferred; container duration covers
    // formats that only report it there.
    let duration_seconds = stream
        .duration
        .as_deref()
        .and_then(|value| value.parse::<f64>().ok())
        .or_else(|| {
            probe
                .format
                .as_ref()
                .and_then(|format| format.duration.as_deref())
                .and_then(|value| value.parse::<f64>().ok())
        })
        .unwrap_or(0.0);

    Ok(StreamInfo {
        duration_seconds,
        width_px: stream.width.unwrap_or(0),
        height_px: stream.height.unwrap_or(0),
        readiness_level: READINESS_HAVE_ENOUGH,
    })
}

/// Extract one raw RGB frame at `seconds` with `ffmpeg`.
fn extract_rgb_frame(
    locator: &str,
    seconds: f64,
    width: u32,
    height: u32,
) -> Result<RgbImage, ClipCheckError> {
    if width == 0 || height == 0 {
        return Err(ClipCheckError::Capture(format!(
            "cannot extract into a {width}×{height} surface"
        )));
    }

    let output = Command::new("ffmpeg")
        .args([
            "-ss",
            &format!("{seconds:.3}"),
            "-i",
            locator,
            "-vframes",
            "1",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
            "pipe:1",
        ])
        .output()
        .map_err(|error| ClipCheckError::Capture(format!("failed to spawn ffmpeg: {error}")))?;

    if !output.status.success() {
        return Err(ClipCheckError::Capture(format!(
            "ffmpeg exited with {:?}",
            output.status,
        )));
    }

    let expected = width as usize * height as usize * 3;
    if output.stdout.len() < expected {
        return Err(ClipCheckError::Capture(format!(
            "short frame read: {} of {expected} bytes",
            output.stdout.len(),
        )));
    }

    let mut pixels = output.stdout;
    pixels.truncate(expected);
    RgbImage::from_raw(width, height, pixels).ok_or_else(|| {
        ClipCheckError::Capture("failed to construct RGB surface from frame data".to_string())
    })
}
