//! Frame sampling integration tests.
//!
//! Exercise the timestamp policies, count resolution, payload encodings,
//! and the best-effort seek/capture loop against the scripted mock backend.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use clipcheck::mock::{LoadScript, MockBackend, MockScript};
use clipcheck::{
    ClipCheckError, FrameEncoding, MediaErrorCode, SampleOptions, SamplePolicy, Thresholds,
    sample_frames,
};

#[test]
fn interior_policy_includes_start_excludes_end() {
    let timestamps = SamplePolicy::Interior.timestamps(8.0, 4);
    assert_eq!(timestamps, vec![0.0, 2.0, 4.0, 6.0]);
}

#[test]
fn offset_policy_excludes_both_endpoints() {
    let timestamps = SamplePolicy::Offset.timestamps(8.0, 3);
    assert_eq!(timestamps, vec![2.0, 4.0, 6.0]);
}

#[test]
fn unusable_duration_yields_no_timestamps() {
    assert!(SamplePolicy::Interior.timestamps(0.0, 8).is_empty());
    assert!(SamplePolicy::Interior.timestamps(f64::NAN, 8).is_empty());
    assert!(SamplePolicy::Offset.timestamps(-1.0, 8).is_empty());
    assert!(SamplePolicy::Interior.timestamps(10.0, 0).is_empty());
}

#[test]
fn rate_derived_counts_are_bounded() {
    let options = SampleOptions::new().with_frames_per_second(0.5);
    assert_eq!(options.resolve_frame_count(10.0), 5);

    // 100 fps over 10s would derive 1000; the ceiling applies.
    let options = SampleOptions::new().with_frames_per_second(100.0);
    assert_eq!(options.resolve_frame_count(10.0), 64);

    // A vanishing rate still samples at least the floor.
    let options = SampleOptions::new().with_frames_per_second(0.001);
    assert_eq!(options.resolve_frame_count(10.0), 1);

    let options = SampleOptions::new()
        .with_frames_per_second(100.0)
        .with_frame_bounds(2, 16);
    assert_eq!(options.resolve_frame_count(10.0), 16);
}

#[test]
fn fixed_counts_are_used_verbatim() {
    let options = SampleOptions::new().with_frame_count(200);
    assert_eq!(options.resolve_frame_count(10.0), 200);
}

#[tokio::test]
async fn samples_the_requested_number_of_frames() {
    let backend = MockBackend::ready(10.0, 1280, 720);
    let options = SampleOptions::new().with_frame_count(5);
    let frames = sample_frames(&backend, "clip.mp4", &Thresholds::new(), &options)
        .await
        .expect("sampling should succeed");

    assert_eq!(frames.len(), 5);
    let timestamps = frames.timestamps();
    assert_eq!(timestamps[0], 0.0, "interior spacing starts at zero");
    assert!(timestamps.windows(2).all(|pair| pair[0] <= pair[1]));
    assert!(*timestamps.last().expect("non-empty") < 10.0);

    // One seek per frame, in temporal order, and the handle was released.
    assert_eq!(backend.requested_seeks(), timestamps);
    assert_eq!(backend.release_count(), 1);
}

#[tokio::test]
async fn offset_policy_avoids_first_and_last_instants() {
    let backend = MockBackend::ready(10.0, 1280, 720);
    let options = SampleOptions::new()
        .with_frame_count(4)
        .with_policy(SamplePolicy::Offset);
    let frames = sample_frames(&backend, "clip.mp4", &Thresholds::new(), &options)
        .await
        .expect("sampling should succeed");

    let timestamps = frames.timestamps();
    assert_eq!(timestamps.len(), 4);
    assert!(timestamps[0] > 0.0);
    assert!(*timestamps.last().expect("non-empty") < 10.0);
}

#[tokio::test]
async fn zero_duration_yields_empty_sequence() {
    let backend = MockBackend::ready(0.0, 1280, 720);
    let frames = sample_frames(&backend, "still.mp4", &Thresholds::new(), &SampleOptions::new())
        .await
        .expect("a zero-duration clip is not an error");

    assert!(frames.is_empty());
    assert!(backend.requested_seeks().is_empty());
    assert_eq!(backend.release_count(), 1);
}

#[tokio::test]
async fn non_finite_duration_yields_empty_sequence() {
    let backend = MockBackend::ready(f64::NAN, 1280, 720);
    let frames = sample_frames(&backend, "odd.mp4", &Thresholds::new(), &SampleOptions::new())
        .await
        .expect("an unusable duration is not an error");

    assert!(frames.is_empty());
}

#[tokio::test]
async fn failed_captures_are_skipped_not_fatal() {
    let mut script = MockScript::ready(10.0, 1280, 720);
    script.failing_captures = vec![2];
    let backend = MockBackend::with_script(script);

    let options = SampleOptions::new().with_frame_count(5);
    let frames = sample_frames(&backend, "flaky.mp4", &Thresholds::new(), &options)
        .await
        .expect("sampling should succeed");

    assert_eq!(frames.len(), 4, "the failed frame is omitted");
    // The loop still visited every target position.
    assert_eq!(backend.requested_seeks().len(), 5);
    assert_eq!(backend.release_count(), 1);
}

#[tokio::test]
async fn vanishing_decoder_returns_partial_sequence() {
    let mut script = MockScript::ready(10.0, 1280, 720);
    script.seeks_before_vanish = Some(2);
    let backend = MockBackend::with_script(script);

    let options = SampleOptions::new().with_frame_count(5);
    let frames = sample_frames(&backend, "vanish.mp4", &Thresholds::new(), &options)
        .await
        .expect("a decoder that goes away mid-run is not an error");

    assert_eq!(frames.len(), 2, "frames captured before the decoder vanished");
    // The third seek was issued but never completed; the loop stopped there.
    assert_eq!(backend.requested_seeks().len(), 3);
    assert_eq!(backend.release_count(), 1, "the handle is released on abort");
}

#[tokio::test]
async fn base64_payloads_decode_to_jpeg() {
    let backend = MockBackend::ready(10.0, 1280, 720);
    let options = SampleOptions::new().with_frame_count(1);
    let frames = sample_frames(&backend, "clip.mp4", &Thresholds::new(), &options)
        .await
        .expect("sampling should succeed");

    let payload = frames.payloads().next().expect("one frame expected");
    assert!(!payload.starts_with("data:"));
    let bytes = BASE64.decode(payload).expect("payload should be base64");
    assert_eq!(&bytes[..3], &[0xFF, 0xD8, 0xFF], "JPEG magic expected");
}

#[tokio::test]
async fn data_url_payloads_carry_the_prefix() {
    let backend = MockBackend::ready(10.0, 1280, 720);
    let options = SampleOptions::new()
        .with_frame_count(2)
        .with_encoding(FrameEncoding::DataUrl);
    let frames = sample_frames(&backend, "clip.mp4", &Thresholds::new(), &options)
        .await
        .expect("sampling should succeed");

    for payload in frames.payloads() {
        assert!(payload.starts_with("data:image/jpeg;base64,"));
    }
}

#[tokio::test]
async fn decoded_payloads_are_readable_image_files() {
    let backend = MockBackend::ready(10.0, 1280, 720);
    let options = SampleOptions::new().with_frame_count(2);
    let frames = sample_frames(&backend, "clip.mp4", &Thresholds::new(), &options)
        .await
        .expect("sampling should succeed");

    let directory = tempfile::tempdir().expect("temp dir");
    for (index, payload) in frames.payloads().enumerate() {
        let bytes = BASE64.decode(payload).expect("payload should be base64");
        let path = directory.path().join(format!("frame_{index:03}.jpg"));
        std::fs::write(&path, bytes).expect("frame should be writable");

        let decoded = image::open(&path).expect("file should be a decodable image");
        assert_eq!(decoded.width(), 32);
        assert_eq!(decoded.height(), 18);
    }
}

#[tokio::test]
async fn load_failure_is_an_error_for_sampling() {
    let backend = MockBackend::new(LoadScript::Fail(MediaErrorCode::NETWORK));
    let result =
        sample_frames(&backend, "gone.mp4", &Thresholds::new(), &SampleOptions::new()).await;

    let Err(ClipCheckError::Load(reason)) = result else {
        panic!("expected a load error, got {result:?}");
    };
    assert!(reason.message.contains("Network error"));
    assert_eq!(backend.release_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn load_timeout_is_an_error_for_sampling() {
    let backend = MockBackend::new(LoadScript::Silent);
    let thresholds = Thresholds::new().with_load_timeout_ms(10_000);
    let result = sample_frames(&backend, "stuck.mp4", &thresholds, &SampleOptions::new()).await;

    let Err(ClipCheckError::LoadTimeout { elapsed_ms }) = result else {
        panic!("expected a timeout error, got {result:?}");
    };
    assert_eq!(elapsed_ms, 10_000);
}

#[tokio::test]
async fn empty_locator_is_rejected() {
    let backend = MockBackend::ready(10.0, 1280, 720);
    let result = sample_frames(&backend, "  ", &Thresholds::new(), &SampleOptions::new()).await;

    assert!(matches!(result, Err(ClipCheckError::EmptyLocator)));
    assert_eq!(backend.release_count(), 0);
}
