//! Error types for the `clipcheck` crate.
//!
//! This module defines [`ClipCheckError`], the unified error type returned by
//! all fallible operations in the crate. Errors carry enough context to
//! diagnose a failure without extra logging at the call site.
//!
//! Note that most *load* failures are not surfaced through this type at all:
//! the validation pipeline converts them into structured
//! [`ValidationOutcome`](crate::ValidationOutcome) errors instead, because
//! nothing in the readiness/validation flow is fatal. `ClipCheckError` is used
//! where the caller asked for a value (a frame sequence, an open handle) and
//! none can be produced.

use image::ImageError;
use thiserror::Error;

use crate::metadata::FailureReason;

/// The unified error type for all `clipcheck` operations.
///
/// Every public method that can fail returns `Result<T, ClipCheckError>`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClipCheckError {
    /// An empty media locator was supplied where one is required.
    #[error("No input media locator provided")]
    EmptyLocator,

    /// The resource signalled a load failure before becoming ready.
    #[error("Media resource failed to load: {0}")]
    Load(FailureReason),

    /// The resource produced no terminal signal within the configured timeout.
    #[error("Timeout after {elapsed_ms}ms waiting for media readiness")]
    LoadTimeout {
        /// The configured timeout that elapsed, in milliseconds.
        elapsed_ms: u64,
    },

    /// An operation was attempted on a handle whose resource was already
    /// released.
    #[error("Media resource has been released")]
    ResourceReleased,

    /// A seek request could not be delivered to the decoder.
    #[error("Seek request failed: {0}")]
    Seek(String),

    /// The currently displayed frame could not be captured.
    #[error("Failed to capture frame: {0}")]
    Capture(String),

    /// An error from the `image` crate during frame encoding.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}
