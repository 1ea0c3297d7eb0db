mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use common::{FakeCaptureBackend, Journal, RecordingObserver, rgba_frame, size, wait_until};
use glcam_pipeline::{
    CaptureContext, CaptureDeviceController, CaptureState, FocusMode, FpsRange, FrameSlot,
    PipelineConfig, PipelineError, PreviewRenderer, Rotation, TextureId,
};

struct Harness {
    backend: Arc<FakeCaptureBackend>,
    observer: Arc<RecordingObserver>,
    slot: Arc<FrameSlot>,
    renderer: PreviewRenderer,
    controller: CaptureDeviceController,
    journal: Journal,
}

fn harness(rotation: Rotation, attach_surface: bool) -> Harness {
    let journal = Journal::default();
    let backend = FakeCaptureBackend::new(&journal);
    let observer = Arc::new(RecordingObserver::default());
    let slot = FrameSlot::new();
    let renderer = PreviewRenderer::new(&PipelineConfig::default(), slot.clone(), observer.clone());
    if attach_surface {
        let preview = renderer.handle();
        slot.attach(
            TextureId::new(3).unwrap(),
            Arc::new(move || preview.on_new_frame_available()),
        );
    }
    let controller = CaptureDeviceController::new(
        CaptureContext {
            backend: common::capture_backend(&backend),
            camera_id: 0,
            slot: slot.clone(),
            preview: renderer.handle(),
            display: Arc::new(rotation),
            observer: observer.clone(),
        },
        "glcam-capture-test",
    );
    Harness {
        backend,
        observer,
        slot,
        renderer,
        controller,
        journal,
    }
}

#[test]
fn start_configures_and_streams_then_stop_releases() {
    let h = harness(Rotation::Deg0, true);
    h.controller.start(size(1200, 700)).unwrap();
    assert!(wait_until(|| h.controller.state() == CaptureState::Previewing));
    assert!(h.controller.is_running());

    let applied = h.backend.applied().unwrap();
    assert_eq!(applied.preview_size, size(1280, 720));
    assert_eq!(applied.picture_size, Some(size(1280, 720)));
    assert_eq!(applied.fps_range, Some(FpsRange::new(30_000, 30_000)));
    assert_eq!(applied.focus_mode, Some(FocusMode::ContinuousVideo));
    assert!(applied.recording_hint);

    // Back camera mounted at 90 degrees on an unrotated display.
    let preview = h.renderer.handle();
    assert_eq!(preview.display_rotation(), 90);
    assert_eq!(preview.source_size(), size(720, 1280));
    assert_eq!(*h.observer.preview_sizes.lock().unwrap(), vec![size(1280, 720)]);
    assert_eq!(h.slot.default_buffer_size(), size(1280, 720));

    h.controller.stop(true);
    assert_eq!(h.controller.state(), CaptureState::Idle);
    assert!(!h.controller.is_running());
    assert_eq!(
        h.journal.entries(),
        vec![
            "device:open",
            "device:configure",
            "device:orientation:90",
            "device:bind",
            "device:start",
            "device:stop",
            "device:release",
        ]
    );
    assert!(h.observer.errors().is_empty());
}

#[test]
fn published_frames_reach_the_slot_until_release() {
    let h = harness(Rotation::Deg90, true);
    h.controller.start(size(640, 480)).unwrap();
    assert!(wait_until(|| h.backend.is_bound()));

    assert!(h.backend.push_frame(rgba_frame(4, 2, 11)));
    assert!(h.backend.push_frame(rgba_frame(4, 2, 12)));
    let latest = h.slot.take_latest().unwrap();
    assert_eq!(latest.timestamp_ns, 12);
    assert!(h.slot.take_latest().is_none());

    h.controller.stop(true);
    assert!(!h.backend.push_frame(rgba_frame(4, 2, 13)));
}

#[test]
fn stop_cuts_off_frames_from_a_retained_producer() {
    let h = harness(Rotation::Deg0, true);
    h.controller.start(size(1280, 720)).unwrap();
    assert!(wait_until(|| h.controller.state() == CaptureState::Previewing));
    let in_flight = h.backend.producer.lock().unwrap().clone().unwrap();
    assert!(in_flight.is_current());

    h.controller.stop(true);
    assert!(!in_flight.is_current());
    assert!(!in_flight.publish(rgba_frame(4, 2, 99)));
    assert!(h.slot.take_latest().is_none());
    // The surface binding itself survives; only the session is gone.
    assert!(h.slot.is_attached());

    // A restarted session binds a fresh producer on the same surface.
    h.controller.start(size(1280, 720)).unwrap();
    assert!(wait_until(|| h.controller.state() == CaptureState::Previewing));
    assert!(!in_flight.publish(rgba_frame(4, 2, 100)));
    assert!(h.backend.push_frame(rgba_frame(4, 2, 101)));
    assert_eq!(h.slot.take_latest().unwrap().timestamp_ns, 101);
    h.controller.stop(true);
}

#[test]
fn stop_without_a_thread_returns_immediately() {
    let h = harness(Rotation::Deg0, true);
    h.controller.stop(true);
    h.controller.stop(false);
    assert_eq!(h.controller.state(), CaptureState::Idle);
    assert!(h.journal.entries().is_empty());
}

#[test]
fn repeated_stop_after_start_does_not_block() {
    let h = harness(Rotation::Deg0, true);
    h.controller.start(size(1280, 720)).unwrap();
    h.controller.stop(true);
    h.controller.stop(true);
    assert_eq!(h.journal.count("device:release"), 1);
}

#[test]
fn open_failure_is_reported_and_leaves_capture_idle() {
    let h = harness(Rotation::Deg0, true);
    h.backend.faults.open.store(true, Ordering::SeqCst);
    h.controller.start(size(1280, 720)).unwrap();

    assert!(wait_until(|| !h.observer.errors().is_empty()));
    assert!(matches!(
        h.observer.errors()[0],
        PipelineError::DeviceUnavailable(_)
    ));
    assert_eq!(h.controller.state(), CaptureState::Idle);

    // A later start retries on the same thread.
    h.backend.faults.open.store(false, Ordering::SeqCst);
    h.controller.start(size(1280, 720)).unwrap();
    assert!(wait_until(|| h.controller.state() == CaptureState::Previewing));
    h.controller.stop(true);
    assert_eq!(h.backend.opened.load(Ordering::SeqCst), 1);
}

#[test]
fn rejected_configuration_releases_the_device() {
    let h = harness(Rotation::Deg0, true);
    h.backend.faults.configure.store(true, Ordering::SeqCst);
    h.controller.start(size(1280, 720)).unwrap();
    h.controller.stop(true);

    let errors = h.observer.errors();
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], PipelineError::DeviceConfigRejected(_)));
    assert_eq!(h.journal.entries(), vec!["device:open", "device:release"]);
}

#[test]
fn streaming_failure_releases_the_device() {
    let h = harness(Rotation::Deg0, true);
    h.backend.faults.start.store(true, Ordering::SeqCst);
    h.controller.start(size(1280, 720)).unwrap();
    h.controller.stop(true);

    assert!(matches!(
        h.observer.errors()[0],
        PipelineError::DeviceConfigRejected(_)
    ));
    assert_eq!(h.journal.count("device:release"), 1);
    assert_eq!(h.journal.count("device:stop"), 0);

    // The output was bound before streaming failed; that binding must not outlive the session.
    let bound = h.backend.last_retained().unwrap();
    assert!(!bound.publish(rgba_frame(4, 2, 7)));
    assert!(h.slot.take_latest().is_none());
}

#[test]
fn missing_preview_surface_rejects_the_session() {
    let h = harness(Rotation::Deg0, false);
    h.controller.start(size(1280, 720)).unwrap();
    h.controller.stop(true);

    let errors = h.observer.errors();
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], PipelineError::DeviceConfigRejected(_)));
    assert_eq!(h.journal.count("device:bind"), 0);
    assert_eq!(h.journal.count("device:release"), 1);
}

#[test]
fn start_while_open_is_ignored() {
    let h = harness(Rotation::Deg0, true);
    h.controller.start(size(1280, 720)).unwrap();
    assert!(wait_until(|| h.controller.state() == CaptureState::Previewing));
    h.controller.start(size(640, 480)).unwrap();
    h.controller.stop(true);

    assert_eq!(h.backend.opened.load(Ordering::SeqCst), 1);
    let applied = h.backend.applied().unwrap();
    assert_eq!(applied.preview_size, size(1280, 720));
}

#[test]
fn restart_after_stop_opens_the_device_again() {
    let h = harness(Rotation::Deg0, true);
    h.controller.start(size(1280, 720)).unwrap();
    h.controller.stop(true);
    assert!(!h.controller.is_running());

    h.controller.start(size(1920, 1080)).unwrap();
    assert!(wait_until(|| h.controller.state() == CaptureState::Previewing));
    assert!(h.controller.is_running());
    h.controller.stop(true);

    assert_eq!(h.backend.opened.load(Ordering::SeqCst), 2);
    assert_eq!(h.journal.count("device:release"), 2);
    let applied = h.backend.applied().unwrap();
    assert_eq!(applied.preview_size, size(1920, 1080));
}

#[test]
fn dropping_the_controller_releases_the_device() {
    let h = harness(Rotation::Deg0, true);
    h.controller.start(size(1280, 720)).unwrap();
    assert!(wait_until(|| h.controller.state() == CaptureState::Previewing));
    let journal = h.journal.clone();
    drop(h);
    assert_eq!(journal.count("device:release"), 1);
}
