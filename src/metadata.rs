//! Resolved media metadata and load-failure value types.
//!
//! [`ResolvedMetadata`] is produced exactly once per loading attempt, at the
//! moment the readiness race settles, and is immutable from then on. Failed
//! attempts carry a [`FailureReason`] instead of stream properties; the
//! serialized form surfaces it under the `error` key so callers can always
//! check `metadata.error` regardless of how the attempt ended.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

/// Readiness level at which enough data is buffered to begin playback.
///
/// Levels run 0..=4; anything at or above this threshold is considered
/// playable.
pub const PLAYBACK_READY_LEVEL: u8 = 2;

/// Readiness level reported once the decoder has buffered the full stream
/// description.
pub const READINESS_HAVE_ENOUGH: u8 = 4;

/// Raw stream properties reported by a backend's metadata-ready signal.
///
/// This is the payload of
/// [`ResourceEvent::MetadataReady`](crate::backend::ResourceEvent); the
/// readiness race converts it into a [`ResolvedMetadata`] when it settles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamInfo {
    /// Total clip duration in seconds. May be non-finite for broken streams.
    pub duration_seconds: f64,
    /// Native frame width in pixels.
    pub width_px: u32,
    /// Native frame height in pixels.
    pub height_px: u32,
    /// Buffering readiness level (0..=4).
    pub readiness_level: u8,
}

/// Native error code reported by a media backend.
///
/// Codes follow the fixed table shared by all backends: `1` aborted,
/// `2` network, `3` decode, `4` unsupported format. Anything else maps to
/// [`FailureKind::Unknown`] with the code preserved in the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaErrorCode(pub u32);

impl MediaErrorCode {
    /// Loading was aborted before completion.
    pub const ABORTED: MediaErrorCode = MediaErrorCode(1);
    /// A network error interrupted loading.
    pub const NETWORK: MediaErrorCode = MediaErrorCode(2);
    /// The stream could not be decoded.
    pub const DECODE: MediaErrorCode = MediaErrorCode(3);
    /// The source format is not supported by the decoder.
    pub const UNSUPPORTED: MediaErrorCode = MediaErrorCode(4);
}

/// Classification of a load failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureKind {
    /// Loading was aborted.
    Aborted,
    /// A network error occurred while fetching the resource.
    Network,
    /// The resource could not be decoded.
    Decode,
    /// The source format is not supported.
    UnsupportedFormat,
    /// No terminal signal arrived within the configured timeout.
    Timeout,
    /// The backend reported a code outside the fixed table.
    Unknown,
}

/// A structured, human-readable load-failure description.
///
/// Produced from a backend's native [`MediaErrorCode`] via
/// [`FailureReason::from_code`], or from timer expiry via
/// [`FailureReason::timeout`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReason {
    /// What went wrong.
    pub kind: FailureKind,
    /// Message suitable for surfacing directly to a caller.
    pub message: String,
}

impl FailureReason {
    /// Map a backend's native error code through the fixed lookup table.
    pub fn from_code(code: MediaErrorCode) -> Self {
        let (kind, message) = match code {
            MediaErrorCode::ABORTED => (FailureKind::Aborted, "Video loading aborted".to_string()),
            MediaErrorCode::NETWORK => (
                FailureKind::Network,
                "Network error while loading video".to_string(),
            ),
            MediaErrorCode::DECODE => (FailureKind::Decode, "Video decoding failed".to_string()),
            MediaErrorCode::UNSUPPORTED => (
                FailureKind::UnsupportedFormat,
                "Video format not supported".to_string(),
            ),
            MediaErrorCode(other) => (
                FailureKind::Unknown,
                format!("Unknown media error (code {other})"),
            ),
        };
        Self { kind, message }
    }

    /// Build the failure reason for a loading attempt that timed out.
    ///
    /// `elapsed_ms` is the timeout that elapsed, and is embedded in the
    /// message so callers matching on "Timeout" see the configured value.
    pub fn timeout(elapsed_ms: u64) -> Self {
        Self {
            kind: FailureKind::Timeout,
            message: format!("Timeout after {elapsed_ms}ms waiting for video metadata"),
        }
    }
}

impl Display for FailureReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.message)
    }
}

/// Metadata resolved from one loading attempt. Immutable once produced.
///
/// On a successful attempt the stream properties are populated and
/// `failure` is `None`. On a failed or timed-out attempt the properties are
/// zeroed, `playable` is `false`, and `failure` carries the reason; the
/// serialized form exposes it as `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedMetadata {
    /// Clip duration in seconds.
    pub duration_seconds: f64,
    /// Frame width in pixels.
    pub width_px: u32,
    /// Frame height in pixels.
    pub height_px: u32,
    /// Whether enough data is buffered to begin playback
    /// (`readiness_level >= `[`PLAYBACK_READY_LEVEL`]).
    pub playable: bool,
    /// Buffering readiness level (0..=4).
    pub readiness_level: u8,
    /// Why the attempt failed, when it did.
    #[serde(rename = "error")]
    pub failure: Option<FailureReason>,
}

impl ResolvedMetadata {
    /// Capture metadata from a backend's metadata-ready signal.
    pub fn from_stream_info(info: StreamInfo) -> Self {
        Self {
            duration_seconds: info.duration_seconds,
            width_px: info.width_px,
            height_px: info.height_px,
            playable: info.readiness_level >= PLAYBACK_READY_LEVEL,
            readiness_level: info.readiness_level,
            failure: None,
        }
    }

    /// Build the metadata record for an attempt that never became ready.
    pub fn from_failure(reason: FailureReason) -> Self {
        Self {
            duration_seconds: 0.0,
            width_px: 0,
            height_px: 0,
            playable: false,
            readiness_level: 0,
            failure: Some(reason),
        }
    }
}
