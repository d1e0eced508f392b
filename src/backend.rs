//! Media backend capability interface.
//!
//! The core of the crate never decodes pixels itself. Instead it drives a
//! small capability surface: a [`MediaBackend`] opens a locator into a
//! [`MediaHandle`], the handle's underlying [`MediaResource`] reports load
//! and seek signals over an event channel, and frames are captured from
//! whatever the decoder currently displays. This keeps the readiness race
//! and the frame sampler fully testable against the deterministic
//! [`MockBackend`](crate::mock::MockBackend) while production use goes
//! through [`FfmpegBackend`](crate::ffmpeg::FfmpegBackend).

use std::fmt::{Display, Formatter, Result as FmtResult};

use image::RgbImage;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::error::ClipCheckError;
use crate::metadata::{MediaErrorCode, StreamInfo};

/// Opaque string identifying a media resource.
///
/// May be a network URL, a local path, a blob reference, or embedded data.
/// The only invariant is non-emptiness for a valid validation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaLocator(String);

impl MediaLocator {
    /// Wrap a locator string.
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    /// The raw locator string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the locator is empty (and therefore never worth loading).
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for MediaLocator {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for MediaLocator {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Display for MediaLocator {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// An asynchronous signal from the underlying decoder.
///
/// Events arrive in any order and each meaningful event arrives at most
/// once per loading attempt; consumers must tolerate duplicates and
/// late arrivals.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceEvent {
    /// Stream properties are known; the resource may be ready to play.
    MetadataReady(StreamInfo),
    /// Loading failed with the backend's native error code.
    LoadFailed(MediaErrorCode),
    /// A previously requested seek has finished.
    SeekComplete {
        /// The position the decoder settled at, in seconds.
        seconds: f64,
    },
}

/// One live decoder instance, exclusively owned by a [`MediaHandle`].
///
/// Implementations push [`ResourceEvent`]s into the channel returned by
/// [`events`](MediaResource::events) from whatever thread or task services
/// the decoder. A resource supports a single active position: callers must
/// never issue a second seek before the first one's
/// [`SeekComplete`](ResourceEvent::SeekComplete) arrives.
pub trait MediaResource: Send {
    /// The channel on which the decoder reports load and seek signals.
    fn events(&mut self) -> &mut UnboundedReceiver<ResourceEvent>;

    /// Begin an asynchronous seek to `seconds`.
    ///
    /// Completion is reported as [`ResourceEvent::SeekComplete`] on the
    /// event channel; there is no guarantee it ever arrives.
    fn request_seek(&mut self, seconds: f64) -> Result<(), ClipCheckError>;

    /// Copy the currently displayed frame into an RGB pixel surface sized
    /// to the resource's native dimensions.
    fn capture_frame(&mut self) -> Result<RgbImage, ClipCheckError>;

    /// Reset the source and discard buffered data.
    ///
    /// Called exactly once per resource, through
    /// [`MediaHandle::release`].
    fn release(&mut self);
}

/// Opens media locators into live handles.
///
/// Implementations are cheap to share; every call to
/// [`open`](MediaBackend::open) produces an independent resource that is
/// never shared or reused across concurrent validations.
pub trait MediaBackend: Send + Sync {
    /// Open `locator` and begin loading it.
    ///
    /// Readiness is reported asynchronously on the handle's event channel —
    /// a successful return only means a loading attempt has started.
    fn open(&self, locator: &MediaLocator) -> Result<MediaHandle, ClipCheckError>;
}

/// Owns exactly one underlying decoder resource for one loading attempt.
///
/// Created when a request starts and released exactly once — on the first
/// terminal transition of its readiness race for failed attempts, or by the
/// consumer (validator or sampler) after a successful one. [`release`]
/// is idempotent and also runs from `Drop`, so the decoder can never leak
/// or be torn down twice.
///
/// [`release`]: MediaHandle::release
pub struct MediaHandle {
    locator: MediaLocator,
    resource: Option<Box<dyn MediaResource>>,
}

impl MediaHandle {
    /// Wrap a freshly opened resource.
    pub fn new(locator: MediaLocator, resource: Box<dyn MediaResource>) -> Self {
        Self {
            locator,
            resource: Some(resource),
        }
    }

    /// The locator this handle was opened from.
    pub fn locator(&self) -> &MediaLocator {
        &self.locator
    }

    /// Whether the underlying resource has already been released.
    pub fn is_released(&self) -> bool {
        self.resource.is_none()
    }

    /// Wait for the next decoder signal.
    ///
    /// Returns `None` when the resource has been released or its event
    /// channel has closed (the decoder went away).
    pub async fn next_event(&mut self) -> Option<ResourceEvent> {
        match self.resource.as_mut() {
            Some(resource) => resource.events().recv().await,
            None => None,
        }
    }

    /// Begin an asynchronous seek on the underlying resource.
    pub fn request_seek(&mut self, seconds: f64) -> Result<(), ClipCheckError> {
        self.resource
            .as_mut()
            .ok_or(ClipCheckError::ResourceReleased)?
            .request_seek(seconds)
    }

    /// Capture the currently displayed frame.
    pub fn capture_frame(&mut self) -> Result<RgbImage, ClipCheckError> {
        self.resource
            .as_mut()
            .ok_or(ClipCheckError::ResourceReleased)?
            .capture_frame()
    }

    /// Release the underlying resource.
    ///
    /// Idempotent: the first call resets the decoder and discards buffered
    /// data; later calls (including the `Drop` guard) are no-ops.
    pub fn release(&mut self) {
        if let Some(mut resource) = self.resource.take() {
            log::debug!("releasing media resource for {}", self.locator);
            resource.release();
        }
    }
}

impl Drop for MediaHandle {
    fn drop(&mut self) {
        self.release();
    }
}
