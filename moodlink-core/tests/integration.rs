//! Integration tests for end-to-end sensing flows.
//!
//! These tests drive a real sensing thread with in-memory capture devices and
//! models: config → camera manager → sensing loop → history → readers.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use moodlink_core::camera::{CaptureBackend, CaptureDevice};
use moodlink_core::config::{ModelPaths, SensingConfig};
use moodlink_core::lifecycle::{CameraManager, RestartOutcome};
use moodlink_core::sensing::{
    EmotionClassifier, FaceLocator, LoadedModels, SensingResources, SensingState, VerifiedResources,
};
use moodlink_core::{CameraConfig, CaptureSettings, EmotionHistory, EmotionLabel, FaceBox, Frame, MoodError, MoodlinkConfig};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// A device whose frames carry an incrementing brightness, so each frame is
/// distinguishable by the classifier.
struct CountingDevice {
    counter: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
    read_delay: Duration,
}

impl CaptureDevice for CountingDevice {
    fn read_frame(&mut self) -> moodlink_core::error::Result<Frame> {
        std::thread::sleep(self.read_delay);
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(Frame::filled(12, 12, (n % 250) as u8 + 1))
    }

    fn configure(&mut self, _settings: &CaptureSettings) -> moodlink_core::error::Result<()> {
        Ok(())
    }

    fn release(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

struct CountingBackend {
    counter: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
    read_delay: Duration,
}

impl CaptureBackend for CountingBackend {
    fn name(&self) -> &str {
        "counting"
    }

    fn open(&self, _device_index: u32) -> moodlink_core::error::Result<Box<dyn CaptureDevice>> {
        Ok(Box::new(CountingDevice {
            counter: Arc::clone(&self.counter),
            released: Arc::clone(&self.released),
            read_delay: self.read_delay,
        }))
    }
}

struct CentreFace;

impl FaceLocator for CentreFace {
    fn locate(&mut self, _frame: &Frame) -> moodlink_core::error::Result<Vec<FaceBox>> {
        Ok(vec![FaceBox::new(2, 2, 8, 8)])
    }
}

/// Cycles through every label based on pixel brightness.
struct BrightnessClassifier;

impl EmotionClassifier for BrightnessClassifier {
    fn classify(&mut self, face: &Frame) -> moodlink_core::error::Result<EmotionLabel> {
        let value = face.pixels.first().copied().unwrap_or(0) as usize;
        Ok(EmotionLabel::ALL[value % EmotionLabel::ALL.len()])
    }
}

struct InMemoryModels;

impl SensingResources for InMemoryModels {
    fn load(&self) -> moodlink_core::error::Result<LoadedModels> {
        Ok(LoadedModels {
            locator: Box::new(CentreFace),
            classifier: Box::new(BrightnessClassifier),
        })
    }
}

/// Delivers the warm-up frame, then fails every read.
struct FailingAfterWarmUp {
    reads: usize,
}

impl CaptureDevice for FailingAfterWarmUp {
    fn read_frame(&mut self) -> moodlink_core::error::Result<Frame> {
        self.reads += 1;
        if self.reads == 1 {
            Ok(Frame::filled(12, 12, 60))
        } else {
            Err(MoodError::Capture("device unplugged".into()))
        }
    }

    fn configure(&mut self, _settings: &CaptureSettings) -> moodlink_core::error::Result<()> {
        Ok(())
    }

    fn release(&mut self) {}
}

struct FailingBackend;

impl CaptureBackend for FailingBackend {
    fn name(&self) -> &str {
        "failing"
    }

    fn open(&self, _device_index: u32) -> moodlink_core::error::Result<Box<dyn CaptureDevice>> {
        Ok(Box::new(FailingAfterWarmUp { reads: 0 }))
    }
}

struct MissingModels;

impl SensingResources for MissingModels {
    fn load(&self) -> moodlink_core::error::Result<LoadedModels> {
        Err(MoodError::ResourceLoad("ai_materials/emotion_model.pth not found".into()))
    }
}

fn fast_sensing() -> SensingConfig {
    let config = MoodlinkConfig::from_toml(
        r"
        [sensing]
        inference_interval_ms = 5
        frame_interval_ms = 1
        read_retry_backoff_ms = 1
        restart_timeout_ms = 1000
        ",
    )
    .expect("valid config");
    config.sensing
}

fn counting_backend(read_delay: Duration) -> (Arc<dyn CaptureBackend>, Arc<AtomicUsize>) {
    let released = Arc::new(AtomicUsize::new(0));
    let backend = Arc::new(CountingBackend {
        counter: Arc::new(AtomicUsize::new(0)),
        released: Arc::clone(&released),
        read_delay,
    });
    (backend, released)
}

fn wait_until(deadline: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let end = Instant::now() + deadline;
    while Instant::now() < end {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

// ---------------------------------------------------------------------------
// Full sensing lifecycle: start → fill history → stop → release
// ---------------------------------------------------------------------------

#[test]
fn sensing_fills_history_and_releases_camera_on_stop() {
    let (backend, released) = counting_backend(Duration::ZERO);
    let history = EmotionHistory::new(5);
    let reader = history.clone();

    let mut camera = CameraManager::new(
        vec![backend],
        Arc::new(InMemoryModels),
        history,
        fast_sensing(),
        CameraConfig::default(),
    );
    camera.start().expect("start");

    // History fills up and then stays bounded.
    assert!(wait_until(Duration::from_secs(3), || reader.stats().total_pushed >= 12));
    assert_eq!(reader.len(), 5);

    assert!(camera.stop());
    assert_eq!(released.load(Ordering::SeqCst), 1);

    // Nothing is pushed after a clean stop.
    let pushed = reader.stats().total_pushed;
    std::thread::sleep(Duration::from_millis(30));
    assert_eq!(reader.stats().total_pushed, pushed);
}

#[test]
fn missing_models_leave_history_empty() {
    let (backend, released) = counting_backend(Duration::ZERO);
    let history = EmotionHistory::default();
    let mut camera = CameraManager::new(
        vec![backend],
        Arc::new(MissingModels),
        history.clone(),
        fast_sensing(),
        CameraConfig::default(),
    );
    camera.start().expect("spawn");

    assert!(wait_until(Duration::from_secs(2), || camera.state() == SensingState::Stopped));
    assert!(history.is_empty());
    // The camera was never opened.
    assert_eq!(released.load(Ordering::SeqCst), 0);
}

#[test]
fn restart_with_stuck_loop_times_out_and_continues() {
    // Each read blocks longer than the restart timeout.
    let (backend, _released) = counting_backend(Duration::from_millis(300));
    let mut sensing = fast_sensing();
    sensing.restart_timeout_ms = 50;

    let history = EmotionHistory::default();
    let mut camera = CameraManager::new(
        vec![backend],
        Arc::new(InMemoryModels),
        history,
        sensing,
        CameraConfig::device(0),
    );
    camera.start().expect("start");
    assert!(wait_until(Duration::from_secs(2), || camera.state() == SensingState::Running));

    let outcome = camera.restart(CameraConfig::device(1)).expect("restart");
    assert_eq!(outcome, RestartOutcome::TimedOut);
    assert_eq!(camera.config().device_index, 1);
    assert_ne!(camera.state(), SensingState::Idle);
}

#[test]
fn readers_never_block_on_a_slow_camera() {
    let (backend, _released) = counting_backend(Duration::from_millis(50));
    let history = EmotionHistory::default();
    let mut camera = CameraManager::new(
        vec![backend],
        Arc::new(InMemoryModels),
        history.clone(),
        fast_sensing(),
        CameraConfig::default(),
    );
    camera.start().expect("start");

    let started = Instant::now();
    for _ in 0..1_000 {
        let _ = history.snapshot();
    }
    assert!(started.elapsed() < Duration::from_millis(500));
    camera.stop();
}

// ---------------------------------------------------------------------------
// Model files and stop latency
// ---------------------------------------------------------------------------

#[test]
fn missing_model_file_stops_loop_before_camera_opens() {
    let dir = tempfile::tempdir().expect("tempdir");
    let classifier = dir.path().join("emotion_model.pth");
    std::fs::write(&classifier, b"weights").expect("write");
    let paths = ModelPaths {
        classifier,
        face_locator: dir.path().join("haarcascade_frontalface_default.xml"),
    };

    let (backend, released) = counting_backend(Duration::ZERO);
    let history = EmotionHistory::default();
    let mut camera = CameraManager::new(
        vec![backend],
        Arc::new(VerifiedResources::new(paths, Arc::new(InMemoryModels))),
        history.clone(),
        fast_sensing(),
        CameraConfig::default(),
    );
    camera.start().expect("spawn");

    assert!(wait_until(Duration::from_secs(2), || camera.state() == SensingState::Stopped));
    assert!(history.is_empty());
    assert_eq!(released.load(Ordering::SeqCst), 0);
}

#[test]
fn present_model_files_let_loading_through() {
    let dir = tempfile::tempdir().expect("tempdir");
    let paths = ModelPaths {
        classifier: dir.path().join("emotion_model.pth"),
        face_locator: dir.path().join("face.xml"),
    };
    std::fs::write(&paths.classifier, b"weights").expect("write");
    std::fs::write(&paths.face_locator, b"<cascade/>").expect("write");

    let resources = VerifiedResources::new(paths, Arc::new(InMemoryModels));
    assert!(resources.load().is_ok());
}

/// Start with the default cadence, wait for `Running`, and time `stop()`.
fn stop_latency(backend: Arc<dyn CaptureBackend>) -> Duration {
    let mut camera = CameraManager::new(
        vec![backend],
        Arc::new(InMemoryModels),
        EmotionHistory::default(),
        SensingConfig::default(),
        CameraConfig::default(),
    );
    camera.start().expect("start");
    assert!(wait_until(Duration::from_secs(2), || camera.state() == SensingState::Running));
    std::thread::sleep(Duration::from_millis(120));

    let started = Instant::now();
    assert!(camera.stop(), "loop did not report Stopped");
    started.elapsed()
}

#[test]
fn healthy_loop_stops_within_a_frame_or_two() {
    for _ in 0..3 {
        let (backend, _released) = counting_backend(Duration::ZERO);
        let elapsed = stop_latency(backend);
        assert!(elapsed < Duration::from_millis(150), "stop took {elapsed:?}");
    }
}

#[test]
fn loop_in_read_backoff_still_stops_promptly() {
    for _ in 0..3 {
        let elapsed = stop_latency(Arc::new(FailingBackend));
        assert!(elapsed < Duration::from_millis(150), "stop took {elapsed:?}");
    }
}
