//! Deterministic in-memory backend for tests and examples.
//!
//! [`MockBackend`] replays a scripted loading behaviour instead of touching
//! a real decoder: it can signal readiness with chosen stream properties,
//! signal a failure code, or stay silent forever so the load timer is the
//! only thing that can settle the race. The decoder can be scripted to
//! vanish after a number of completed seeks (closing its event channel),
//! individual captures can be scripted to fail, and every release is
//! counted, which makes the cleanup invariants of the readiness race and
//! the sampler directly assertable.
//!
//! # Example
//!
//! ```
//! use clipcheck::mock::{LoadScript, MockBackend};
//!
//! // A 12-second 1280×720 clip that loads successfully.
//! let backend = MockBackend::ready(12.0, 1280, 720);
//! assert_eq!(backend.release_count(), 0);
//!
//! // A resource that never signals anything.
//! let silent = MockBackend::new(LoadScript::Silent);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use image::{Rgb, RgbImage};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::backend::{MediaBackend, MediaHandle, MediaLocator, MediaResource, ResourceEvent};
use crate::error::ClipCheckError;
use crate::metadata::{MediaErrorCode, READINESS_HAVE_ENOUGH, StreamInfo};

/// Pixel width of the mock capture surface.
const SURFACE_WIDTH: u32 = 32;
/// Pixel height of the mock capture surface.
const SURFACE_HEIGHT: u32 = 18;

/// How a mock resource behaves during the loading phase.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadScript {
    /// Immediately signal metadata-ready with these stream properties.
    Ready(StreamInfo),
    /// Immediately signal a load failure with this native code.
    Fail(MediaErrorCode),
    /// Never signal anything; only the timer can settle the race.
    Silent,
}

/// Scripted behaviour shared by every resource a [`MockBackend`] opens.
#[derive(Debug, Clone)]
pub struct MockScript {
    /// Loading-phase behaviour.
    pub load: LoadScript,
    /// How many seek requests complete before the decoder goes away and
    /// its event channel closes. `None` means every seek completes.
    pub seeks_before_vanish: Option<usize>,
    /// Zero-based seek indices whose capture fails.
    pub failing_captures: Vec<usize>,
}

impl MockScript {
    /// A script that loads successfully with the given stream properties.
    pub fn ready(duration_seconds: f64, width_px: u32, height_px: u32) -> Self {
        Self {
            load: LoadScript::Ready(StreamInfo {
                duration_seconds,
                width_px,
                height_px,
                readiness_level: READINESS_HAVE_ENOUGH,
            }),
            seeks_before_vanish: None,
            failing_captures: Vec::new(),
        }
    }
}

/// Shared observation state for assertions.
#[derive(Debug, Default)]
struct MockState {
    releases: AtomicUsize,
    seeks: Mutex<Vec<f64>>,
}

/// A [`MediaBackend`] that replays a [`MockScript`].
#[derive(Clone)]
pub struct MockBackend {
    script: MockScript,
    state: Arc<MockState>,
}

impl MockBackend {
    /// Create a backend from a loading script with default seek/capture
    /// behaviour (seeks complete, captures succeed).
    pub fn new(load: LoadScript) -> Self {
        Self::with_script(MockScript {
            load,
            seeks_before_vanish: None,
            failing_captures: Vec::new(),
        })
    }

    /// Create a backend that loads successfully with the given properties.
    pub fn ready(duration_seconds: f64, width_px: u32, height_px: u32) -> Self {
        Self::with_script(MockScript::ready(duration_seconds, width_px, height_px))
    }

    /// Create a backend from a full script.
    pub fn with_script(script: MockScript) -> Self {
        Self {
            script,
            state: Arc::new(MockState::default()),
        }
    }

    /// How many times resources opened by this backend have been released.
    pub fn release_count(&self) -> usize {
        self.state.releases.load(Ordering::Acquire)
    }

    /// The seek positions requested so far, in request order.
    pub fn requested_seeks(&self) -> Vec<f64> {
        self.state
            .seeks
            .lock()
            .map(|seeks| seeks.clone())
            .unwrap_or_default()
    }
}

impl MediaBackend for MockBackend {
    fn open(&self, locator: &MediaLocator) -> Result<MediaHandle, ClipCheckError> {
        if locator.is_empty() {
            return Err(ClipCheckError::EmptyLocator);
        }

        let (sender, receiver) = unbounded_channel();
        match self.script.load {
            LoadScript::Ready(info) => {
                // Send failures are impossible here: the receiver is live.
                let _ = sender.send(ResourceEvent::MetadataReady(info));
            }
            LoadScript::Fail(code) => {
                let _ = sender.send(ResourceEvent::LoadFailed(code));
            }
            LoadScript::Silent => {}
        }

        let resource = MockResource {
            events: receiver,
            sender: Some(sender),
            script: self.script.clone(),
            state: Arc::clone(&self.state),
            seek_index: 0,
            last_seek: None,
        };
        Ok(MediaHandle::new(locator.clone(), Box::new(resource)))
    }
}

/// One scripted resource instance.
struct MockResource {
    events: UnboundedReceiver<ResourceEvent>,
    /// Kept so the event channel stays open for the resource's lifetime
    /// and to emit seek completions. Dropped when the script says the
    /// decoder vanishes, which closes the channel.
    sender: Option<UnboundedSender<ResourceEvent>>,
    script: MockScript,
    state: Arc<MockState>,
    seek_index: usize,
    last_seek: Option<usize>,
}

impl MediaResource for MockResource {
    fn events(&mut self) -> &mut UnboundedReceiver<ResourceEvent> {
        &mut self.events
    }

    fn request_seek(&mut self, seconds: f64) -> Result<(), ClipCheckError> {
        if let Ok(mut seeks) = self.state.seeks.lock() {
            seeks.push(seconds);
        }
        self.last_seek = Some(self.seek_index);
        self.seek_index += 1;

        match self.script.seeks_before_vanish {
            Some(limit) if self.seek_index > limit => {
                // The decoder goes away: a closed channel is the only
                // signal a vanished decoder leaves behind.
                self.sender = None;
            }
            _ => {
                if let Some(sender) = &self.sender {
                    let _ = sender.send(ResourceEvent::SeekComplete { seconds });
                }
            }
        }
        Ok(())
    }

    fn capture_frame(&mut self) -> Result<RgbImage, ClipCheckError> {
        let index = self.last_seek.ok_or_else(|| {
            ClipCheckError::Capture("no seek has completed yet".to_string())
        })?;

        if self.script.failing_captures.contains(&index) {
            return Err(ClipCheckError::Capture(format!(
                "scripted capture failure at seek {index}"
            )));
        }

        // A small surface whose colour varies by seek index, so payloads
        // differ frame to frame.
        let shade = (index as u32 * 37 % 256) as u8;
        Ok(RgbImage::from_pixel(
            SURFACE_WIDTH,
            SURFACE_HEIGHT,
            Rgb([shade, 128, 255 - shade]),
        ))
    }

    fn release(&mut self) {
        self.state.releases.fetch_add(1, Ordering::AcqRel);
    }
}
