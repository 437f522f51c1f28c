//! Sensing loop: the background producer of emotion labels.
//!
//! ```text
//! Idle ──► Initializing ──► Running ──► Stopping ──► Stopped
//!               │                                      ▲
//!               └──────── load / acquire failure ──────┘
//! ```
//!
//! The loop runs on its own OS thread and owns the capture device for its
//! whole lifetime. Frames are read at roughly the device rate to keep the
//! camera alive, while classification is throttled to one call per
//! inference interval. Every per-iteration error is logged and swallowed:
//! the loop always ends in `Stopped`, never in a crash.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, warn};

use crate::camera::{self, CameraHandle, CaptureBackend};
use crate::config::{ModelPaths, SensingConfig};
use crate::error::Result;
use crate::history::EmotionHistory;
use crate::types::{largest_face, CameraConfig, EmotionLabel, FaceBox, Frame};

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Finds faces in a frame.
pub trait FaceLocator: Send {
    /// Bounding boxes of every face found, in detection order.
    ///
    /// # Errors
    /// Returns an error if the frame could not be processed.
    fn locate(&mut self, frame: &Frame) -> Result<Vec<FaceBox>>;
}

/// Opaque `classify(face_image) -> label` function.
pub trait EmotionClassifier: Send {
    /// Classify a cropped face.
    ///
    /// # Errors
    /// Returns an error if inference failed.
    fn classify(&mut self, face: &Frame) -> Result<EmotionLabel>;
}

/// Models produced by [`SensingResources::load`].
pub struct LoadedModels {
    /// Face locator.
    pub locator: Box<dyn FaceLocator>,
    /// Emotion classifier.
    pub classifier: Box<dyn EmotionClassifier>,
}

/// Loads the classifier and face locator when a loop initializes.
pub trait SensingResources: Send + Sync {
    /// Load both models.
    ///
    /// # Errors
    /// Returns [`crate::MoodError::ResourceLoad`] if either asset is missing or corrupt.
    fn load(&self) -> Result<LoadedModels>;
}

/// Checks the configured model files exist before handing off to `inner`.
pub struct VerifiedResources {
    paths: ModelPaths,
    inner: Arc<dyn SensingResources>,
}

impl VerifiedResources {
    /// Wrap `inner` so that loading fails fast when `paths` are missing.
    #[must_use]
    pub fn new(paths: ModelPaths, inner: Arc<dyn SensingResources>) -> Self {
        Self { paths, inner }
    }
}

impl SensingResources for VerifiedResources {
    fn load(&self) -> Result<LoadedModels> {
        self.paths.verify()?;
        self.inner.load()
    }
}

/// What a preview sink wants after seeing a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewControl {
    /// Keep sending frames.
    Continue,
    /// Stop previewing for the rest of this loop.
    Close,
}

/// Debug view of the camera feed, used only when preview is enabled.
pub trait PreviewSink: Send {
    /// Show a frame together with the faces found in it.
    fn present(&mut self, frame: &Frame, faces: &[FaceBox]) -> PreviewControl;
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Lifecycle state of a sensing loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensingState {
    /// Created, thread not yet running.
    Idle,
    /// Loading models and acquiring the camera.
    Initializing,
    /// Reading frames and publishing labels.
    Running,
    /// Stop observed, releasing the camera.
    Stopping,
    /// Finished. Terminal.
    Stopped,
}

/// Shared state cell with change notification.
struct StateCell {
    state: Mutex<SensingState>,
    changed: Condvar,
}

impl StateCell {
    fn new() -> Self {
        Self {
            state: Mutex::new(SensingState::Idle),
            changed: Condvar::new(),
        }
    }

    fn get(&self) -> SensingState {
        *self.state.lock()
    }

    fn set(&self, next: SensingState) {
        let mut state = self.state.lock();
        if *state != next {
            let from = *state;
            debug!(?from, to = ?next, "Sensing state change");
            *state = next;
            self.changed.notify_all();
        }
    }

    /// Block until `Stopped` or the timeout elapses. Returns whether it stopped.
    fn wait_stopped(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while *state != SensingState::Stopped {
            if self.changed.wait_until(&mut state, deadline).timed_out() {
                return *state == SensingState::Stopped;
            }
        }
        true
    }
}

/// Publishes `Stopped` when the loop thread exits, panics included.
struct StoppedGuard(Arc<StateCell>);

impl Drop for StoppedGuard {
    fn drop(&mut self) {
        if thread::panicking() {
            error!("Sensing loop panicked");
        }
        self.0.set(SensingState::Stopped);
    }
}

// ---------------------------------------------------------------------------
// Worker: one Running-state iteration at a time
// ---------------------------------------------------------------------------

/// Result of one [`SensingWorker::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The frame read failed; the caller should back off briefly.
    ReadFailed,
    /// A frame was read; `faces` were located, nothing was classified.
    Observed {
        /// Number of faces found.
        faces: usize,
    },
    /// A label was classified and pushed to the history.
    Classified(EmotionLabel),
}

/// The Running-state body of the sensing loop.
pub struct SensingWorker {
    camera: CameraHandle,
    locator: Box<dyn FaceLocator>,
    classifier: Box<dyn EmotionClassifier>,
    history: EmotionHistory,
    inference_interval: Duration,
    last_inference: Instant,
    preview: Option<Box<dyn PreviewSink>>,
}

impl SensingWorker {
    /// Build a worker. The first classification happens one interval after `started_at`.
    #[must_use]
    pub fn new(
        camera: CameraHandle,
        models: LoadedModels,
        history: EmotionHistory,
        inference_interval: Duration,
        started_at: Instant,
    ) -> Self {
        Self {
            camera,
            locator: models.locator,
            classifier: models.classifier,
            history,
            inference_interval,
            last_inference: started_at,
            preview: None,
        }
    }

    /// Forward frames to a preview sink.
    #[must_use]
    pub fn with_preview(mut self, preview: Box<dyn PreviewSink>) -> Self {
        self.preview = Some(preview);
        self
    }

    /// Read one frame, locate faces, and classify if the interval has elapsed.
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        let frame = match self.camera.read_frame() {
            Ok(frame) if !frame.is_empty() => frame,
            Ok(_) => {
                warn!("Camera delivered an empty frame");
                return TickOutcome::ReadFailed;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read frame from camera");
                return TickOutcome::ReadFailed;
            }
        };

        let faces = self.locator.locate(&frame).unwrap_or_else(|e| {
            warn!(error = %e, "Face location failed");
            Vec::new()
        });

        let mut outcome = TickOutcome::Observed { faces: faces.len() };

        if now.saturating_duration_since(self.last_inference) >= self.inference_interval {
            self.last_inference = now;
            if let Some(label) = self.classify_subject(&frame, &faces) {
                self.history.push(label);
                outcome = TickOutcome::Classified(label);
            }
        }

        if let Some(preview) = self.preview.as_mut() {
            if preview.present(&frame, &faces) == PreviewControl::Close {
                debug!("Camera preview closed");
                self.preview = None;
            }
        }

        outcome
    }

    fn classify_subject(&mut self, frame: &Frame, faces: &[FaceBox]) -> Option<EmotionLabel> {
        let subject = largest_face(faces)?;
        let roi = frame.crop(subject)?;
        match self.classifier.classify(&roi) {
            Ok(label) => {
                debug!(emotion = %label, "Emotion classified");
                Some(label)
            }
            Err(e) => {
                warn!(error = %e, "Emotion classification failed");
                None
            }
        }
    }

    /// Release the camera.
    pub fn shutdown(self) {
        self.camera.release();
    }
}

// ---------------------------------------------------------------------------
// Loop thread
// ---------------------------------------------------------------------------

/// Everything a loop thread needs. Moved into the thread on spawn.
pub struct SensingContext {
    /// Capture backends in priority order.
    pub backends: Vec<Arc<dyn CaptureBackend>>,
    /// Model loader.
    pub resources: Arc<dyn SensingResources>,
    /// Camera to open.
    pub camera: CameraConfig,
    /// Cadence and capture settings.
    pub settings: SensingConfig,
    /// Destination of classified labels.
    pub history: EmotionHistory,
    /// Preview sink, used only if `camera.preview_enabled`.
    pub preview: Option<Box<dyn PreviewSink>>,
}

/// Handle to a running sensing thread.
pub struct SensingLoop {
    state: Arc<StateCell>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SensingLoop {
    /// Spawn the loop thread.
    ///
    /// # Errors
    /// Returns [`crate::MoodError::Io`] if the OS refused to create the thread.
    pub fn spawn(context: SensingContext) -> Result<Self> {
        let state = Arc::new(StateCell::new());
        let stop = Arc::new(AtomicBool::new(false));

        let thread_state = Arc::clone(&state);
        let thread_stop = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("emotion-sensing".to_string())
            .spawn(move || run(context, &thread_state, &thread_stop))?;

        Ok(Self {
            state,
            stop,
            handle: Some(handle),
        })
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SensingState {
        self.state.get()
    }

    /// Ask the loop to stop at its next iteration. Does not block.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Wait up to `timeout` for the loop to reach `Stopped`.
    #[must_use]
    pub fn wait_stopped(&self, timeout: Duration) -> bool {
        self.state.wait_stopped(timeout)
    }

    /// Request a stop and wait up to `timeout` for it.
    ///
    /// A loop that stops in time is joined. A stuck loop is detached and
    /// left to finish on its own.
    pub fn stop(mut self, timeout: Duration) -> bool {
        self.request_stop();
        let stopped = self.wait_stopped(timeout);
        if let Some(handle) = self.handle.take() {
            if stopped {
                if handle.join().is_err() {
                    warn!("Sensing thread ended with a panic");
                }
            } else {
                let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(timeout_ms, "Sensing loop did not stop in time, detaching");
            }
        }
        stopped
    }

    /// Whether the loop has reached `Stopped`.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.state() == SensingState::Stopped
    }
}

impl Drop for SensingLoop {
    fn drop(&mut self) {
        self.request_stop();
    }
}

impl std::fmt::Debug for SensingLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensingLoop")
            .field("state", &self.state())
            .field("stop_requested", &self.stop.load(Ordering::SeqCst))
            .finish()
    }
}

fn run(context: SensingContext, state: &Arc<StateCell>, stop: &AtomicBool) {
    let _guard = StoppedGuard(Arc::clone(state));
    state.set(SensingState::Initializing);

    let SensingContext {
        backends,
        resources,
        camera,
        settings,
        history,
        preview,
    } = context;

    let models = match resources.load() {
        Ok(models) => models,
        Err(e) => {
            error!(error = %e, "Emotion sensing stopping due to loading errors");
            return;
        }
    };

    let handle = match camera::acquire(&backends, &camera, &settings.capture()) {
        Ok(handle) => handle,
        Err(e) => {
            error!(error = %e, "Could not open webcam with any available backend");
            return;
        }
    };

    let mut worker = SensingWorker::new(
        handle,
        models,
        history,
        settings.inference_interval(),
        Instant::now(),
    );
    if camera.preview_enabled {
        if let Some(preview) = preview {
            worker = worker.with_preview(preview);
        }
    }

    info!(device_index = camera.device_index, "Emotion sensing started");
    state.set(SensingState::Running);

    while !stop.load(Ordering::SeqCst) {
        let pause = match worker.tick(Instant::now()) {
            TickOutcome::ReadFailed => settings.read_retry_backoff(),
            _ => settings.frame_interval(),
        };
        thread::sleep(pause);
    }

    state.set(SensingState::Stopping);
    worker.shutdown();
    info!("Emotion sensing stopped");
}
