//! # Moodlink Core Library
//!
//! Game-agnostic mood sensing for interactive applications.
//!
//! A single background [`sensing::SensingLoop`] owns a capture device, finds
//! faces in each frame, classifies the largest one at a throttled rate and
//! publishes discrete [`EmotionLabel`]s into a bounded [`EmotionHistory`].
//! Everything else in the application only ever reads snapshots of that
//! history.
//!
//! ```text
//! CaptureBackend ──► CameraHandle ──► SensingWorker ──► EmotionHistory ──► readers
//!       ▲                                  ▲
//!       └──────── CameraManager ───────────┘   (start / stop / restart)
//! ```
//!
//! ## Failure Contract
//!
//! The sensing side never crashes the host. Missing model files, an
//! unavailable camera, or a failing frame read all end in a logged message
//! and, at worst, a `Stopped` loop with an empty history.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod camera;
pub mod config;
pub mod error;
pub mod history;
pub mod lifecycle;
pub mod sensing;
pub mod types;

pub use config::MoodlinkConfig;
pub use error::MoodError;
pub use history::EmotionHistory;
pub use lifecycle::CameraManager;
pub use types::*;
