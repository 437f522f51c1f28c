//! Camera acquisition with backend fallback.
//!
//! Platform capture APIs differ in which devices they can open, so the
//! manager walks a priority-ordered list of [`CaptureBackend`]s. A backend is
//! accepted only if it opens the device *and* delivers a non-empty warm-up
//! frame. The accepted device is wrapped in a [`CameraHandle`], which
//! releases it exactly once on every exit path.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{MoodError, Result};
use crate::types::{CameraConfig, CaptureSettings, Frame};

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// An opened capture device.
pub trait CaptureDevice: Send {
    /// Read the next frame.
    ///
    /// # Errors
    /// Returns [`MoodError::Capture`] if the device did not deliver a frame.
    fn read_frame(&mut self) -> Result<Frame>;

    /// Apply resolution and frame rate. Devices may ignore unsupported values.
    ///
    /// # Errors
    /// Returns [`MoodError::Capture`] if the device rejected the settings.
    fn configure(&mut self, settings: &CaptureSettings) -> Result<()>;

    /// Give the device back to the platform.
    fn release(&mut self);
}

/// A platform capture API able to open devices by index.
pub trait CaptureBackend: Send + Sync {
    /// Human-readable backend name, used in logs.
    fn name(&self) -> &str;

    /// Open the device at `device_index`.
    ///
    /// # Errors
    /// Returns an error if the backend cannot open the device.
    fn open(&self, device_index: u32) -> Result<Box<dyn CaptureDevice>>;
}

// ---------------------------------------------------------------------------
// Scoped handle
// ---------------------------------------------------------------------------

/// An accepted capture device. Released on drop.
pub struct CameraHandle {
    device: Option<Box<dyn CaptureDevice>>,
    backend: String,
    device_index: u32,
}

impl CameraHandle {
    /// Name of the backend that opened the device.
    #[must_use]
    pub fn backend(&self) -> &str {
        &self.backend
    }

    /// Device index this handle was opened with.
    #[must_use]
    pub fn device_index(&self) -> u32 {
        self.device_index
    }

    /// Read the next frame from the device.
    ///
    /// # Errors
    /// Returns [`MoodError::Capture`] if the read fails or the handle was released.
    pub fn read_frame(&mut self) -> Result<Frame> {
        match self.device.as_mut() {
            Some(device) => device.read_frame(),
            None => Err(MoodError::Capture("camera already released".into())),
        }
    }

    /// Release the device now instead of waiting for drop.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if let Some(mut device) = self.device.take() {
            device.release();
            debug!(
                device_index = self.device_index,
                backend = %self.backend,
                "Camera released"
            );
        }
    }
}

impl Drop for CameraHandle {
    fn drop(&mut self) {
        self.release_inner();
    }
}

impl std::fmt::Debug for CameraHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraHandle")
            .field("backend", &self.backend)
            .field("device_index", &self.device_index)
            .field("released", &self.device.is_none())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Acquisition
// ---------------------------------------------------------------------------

/// Open the configured device with the first backend that yields a real frame.
///
/// Backends that open but fail the warm-up read are released before moving
/// on, so a failed acquisition never leaks a device.
///
/// # Errors
/// Returns [`MoodError::DeviceUnavailable`] if every backend fails.
pub fn acquire(
    backends: &[Arc<dyn CaptureBackend>],
    config: &CameraConfig,
    capture: &CaptureSettings,
) -> Result<CameraHandle> {
    let mut attempted = Vec::with_capacity(backends.len());

    for backend in backends {
        attempted.push(backend.name().to_string());
        debug!(backend = backend.name(), device_index = config.device_index, "Trying capture backend");

        let mut device = match backend.open(config.device_index) {
            Ok(device) => device,
            Err(e) => {
                warn!(backend = backend.name(), error = %e, "Capture backend failed to open device");
                continue;
            }
        };

        match device.read_frame() {
            Ok(frame) if !frame.is_empty() => {}
            Ok(_) => {
                warn!(backend = backend.name(), "Warm-up frame was empty");
                device.release();
                continue;
            }
            Err(e) => {
                warn!(backend = backend.name(), error = %e, "Warm-up frame read failed");
                device.release();
                continue;
            }
        }

        if let Err(e) = device.configure(capture) {
            warn!(backend = backend.name(), error = %e, "Camera rejected capture settings, using device defaults");
        }

        info!(
            backend = backend.name(),
            device_index = config.device_index,
            "Camera initialized"
        );
        return Ok(CameraHandle {
            device: Some(device),
            backend: backend.name().to_string(),
            device_index: config.device_index,
        });
    }

    Err(MoodError::DeviceUnavailable {
        device_index: config.device_index,
        attempted,
    })
}

// ---------------------------------------------------------------------------
// Device discovery
// ---------------------------------------------------------------------------

/// A camera found by [`probe_cameras`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraInfo {
    /// Device index.
    pub index: u32,
    /// Display name for settings menus.
    pub name: String,
}

/// Friendly display name for a device index.
#[must_use]
pub fn camera_name(index: u32) -> String {
    match index {
        0 => "Camera 0 (Back)".to_string(),
        1 => "Camera 1 (Front)".to_string(),
        n => format!("Camera {n}"),
    }
}

/// Enumerate working cameras on `backend` among indices `0..max_index`.
///
/// Scanning stops at the first index above 2 that cannot be opened. If
/// nothing works, a single "Default Camera" at index 0 is reported so menus
/// always have something to show.
#[must_use]
pub fn probe_cameras(backend: &dyn CaptureBackend, max_index: u32) -> Vec<CameraInfo> {
    let mut found = Vec::new();

    for index in 0..max_index {
        let mut device = match backend.open(index) {
            Ok(device) => device,
            Err(_) if index > 2 => break,
            Err(_) => continue,
        };
        if matches!(device.read_frame(), Ok(frame) if !frame.is_empty()) {
            found.push(CameraInfo {
                index,
                name: camera_name(index),
            });
        }
        device.release();
    }

    if found.is_empty() {
        found.push(CameraInfo {
            index: 0,
            name: "Default Camera".to_string(),
        });
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counters {
        opened: AtomicUsize,
        released: AtomicUsize,
        configured: AtomicUsize,
    }

    #[derive(Clone, Copy)]
    enum Behaviour {
        FailOpen,
        EmptyFrame,
        ReadError,
        Works,
    }

    struct FakeBackend {
        name: &'static str,
        behaviour: Behaviour,
        counters: Arc<Counters>,
    }

    struct FakeDevice {
        behaviour: Behaviour,
        counters: Arc<Counters>,
    }

    impl CaptureDevice for FakeDevice {
        fn read_frame(&mut self) -> Result<Frame> {
            match self.behaviour {
                Behaviour::Works => Ok(Frame::filled(8, 8, 128)),
                Behaviour::EmptyFrame => Ok(Frame::default()),
                _ => Err(MoodError::Capture("no frame".into())),
            }
        }

        fn configure(&mut self, _settings: &CaptureSettings) -> Result<()> {
            self.counters.configured.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn release(&mut self) {
            self.counters.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl CaptureBackend for FakeBackend {
        fn name(&self) -> &str {
            self.name
        }

        fn open(&self, _device_index: u32) -> Result<Box<dyn CaptureDevice>> {
            if matches!(self.behaviour, Behaviour::FailOpen) {
                return Err(MoodError::Capture("cannot open".into()));
            }
            self.counters.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(FakeDevice {
                behaviour: self.behaviour,
                counters: Arc::clone(&self.counters),
            }))
        }
    }

    fn backends(plan: &[(&'static str, Behaviour)], counters: &Arc<Counters>) -> Vec<Arc<dyn CaptureBackend>> {
        plan.iter()
            .map(|&(name, behaviour)| {
                Arc::new(FakeBackend {
                    name,
                    behaviour,
                    counters: Arc::clone(counters),
                }) as Arc<dyn CaptureBackend>
            })
            .collect()
    }

    #[test]
    fn falls_through_to_first_working_backend() {
        let counters = Arc::new(Counters::default());
        let list = backends(
            &[
                ("directshow", Behaviour::FailOpen),
                ("media-foundation", Behaviour::EmptyFrame),
                ("default", Behaviour::Works),
            ],
            &counters,
        );

        let handle = acquire(&list, &CameraConfig::device(1), &CaptureSettings::default())
            .expect("third backend works");
        assert_eq!(handle.backend(), "default");
        assert_eq!(handle.device_index(), 1);
        assert_eq!(counters.configured.load(Ordering::SeqCst), 1);
        // The empty-frame device was released before moving on.
        assert_eq!(counters.released.load(Ordering::SeqCst), 1);

        drop(handle);
        assert_eq!(counters.released.load(Ordering::SeqCst), 2);
        assert_eq!(counters.opened.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn all_backends_failing_leaks_nothing() {
        let counters = Arc::new(Counters::default());
        let list = backends(
            &[
                ("directshow", Behaviour::ReadError),
                ("media-foundation", Behaviour::EmptyFrame),
                ("default", Behaviour::FailOpen),
            ],
            &counters,
        );

        let err = acquire(&list, &CameraConfig::device(0), &CaptureSettings::default())
            .expect_err("no backend works");
        match err {
            MoodError::DeviceUnavailable { device_index, attempted } => {
                assert_eq!(device_index, 0);
                assert_eq!(attempted, vec!["directshow", "media-foundation", "default"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            counters.opened.load(Ordering::SeqCst),
            counters.released.load(Ordering::SeqCst)
        );
    }

    #[test]
    fn explicit_release_happens_once() {
        let counters = Arc::new(Counters::default());
        let list = backends(&[("default", Behaviour::Works)], &counters);
        let handle = acquire(&list, &CameraConfig::default(), &CaptureSettings::default())
            .expect("works");
        handle.release();
        assert_eq!(counters.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn probe_reports_default_when_nothing_works() {
        let counters = Arc::new(Counters::default());
        let backend = FakeBackend {
            name: "none",
            behaviour: Behaviour::FailOpen,
            counters,
        };
        let cameras = probe_cameras(&backend, 10);
        assert_eq!(
            cameras,
            vec![CameraInfo {
                index: 0,
                name: "Default Camera".into()
            }]
        );
    }

    #[test]
    fn probe_names_working_devices() {
        let counters = Arc::new(Counters::default());
        let backend = FakeBackend {
            name: "default",
            behaviour: Behaviour::Works,
            counters: Arc::clone(&counters),
        };
        let cameras = probe_cameras(&backend, 3);
        let names: Vec<_> = cameras.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Camera 0 (Back)", "Camera 1 (Front)", "Camera 2"]);
        assert_eq!(counters.released.load(Ordering::SeqCst), 3);
    }
}
