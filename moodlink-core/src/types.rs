//! Core type definitions for the Moodlink sensing system.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::MoodError;

// ---------------------------------------------------------------------------
// Emotion Labels
// ---------------------------------------------------------------------------

/// A discrete emotion detected on the player's face.
///
/// The vocabulary is closed: the classifier's class names are mapped onto
/// these six values and nothing else ever reaches the history buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    /// Cheerful, upbeat.
    Happy,
    /// Down or disappointed.
    Sad,
    /// Frustrated or upset.
    Angry,
    /// Amazed or shocked.
    Surprised,
    /// Worried or anxious.
    Fearful,
    /// Calm and focused. Also the default when nothing has been detected.
    #[default]
    Neutral,
}

impl EmotionLabel {
    /// Every label, in classifier order.
    pub const ALL: [EmotionLabel; 6] = [
        Self::Happy,
        Self::Sad,
        Self::Angry,
        Self::Surprised,
        Self::Fearful,
        Self::Neutral,
    ];

    /// Lowercase wire name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Angry => "angry",
            Self::Surprised => "surprised",
            Self::Fearful => "fearful",
            Self::Neutral => "neutral",
        }
    }

    /// Parse a class name, mapping anything unrecognised to [`EmotionLabel::Neutral`].
    #[must_use]
    pub fn parse_or_neutral(name: &str) -> Self {
        name.parse().unwrap_or(Self::Neutral)
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmotionLabel {
    type Err = MoodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "happy" => Ok(Self::Happy),
            "sad" => Ok(Self::Sad),
            "angry" => Ok(Self::Angry),
            "surprised" | "surprise" => Ok(Self::Surprised),
            "fearful" | "fear" => Ok(Self::Fearful),
            "neutral" => Ok(Self::Neutral),
            other => Err(MoodError::Serialization(format!(
                "unknown emotion label '{other}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Frames & Faces
// ---------------------------------------------------------------------------

/// Axis-aligned bounding box of a located face, in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FaceBox {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FaceBox {
    /// Create a new face box.
    #[must_use]
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Bounding-box area in pixels.
    #[must_use]
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Pick the canonical subject: the largest face by area, first found on ties.
#[must_use]
pub fn largest_face(faces: &[FaceBox]) -> Option<&FaceBox> {
    let mut best: Option<&FaceBox> = None;
    for face in faces {
        match best {
            Some(b) if b.area() >= face.area() => {}
            _ => best = Some(face),
        }
    }
    best
}

/// A single 8-bit grayscale frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major luma samples, `width * height` bytes.
    pub pixels: Vec<u8>,
}

impl Frame {
    /// Create a frame from raw luma samples.
    #[must_use]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        Self { width, height, pixels }
    }

    /// A frame filled with a single value.
    #[must_use]
    pub fn filled(width: u32, height: u32, value: u8) -> Self {
        let len = width as usize * height as usize;
        Self::new(width, height, vec![value; len])
    }

    /// Whether the frame carries no usable image data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }

    /// Copy out the region covered by `face`, clamped to the frame bounds.
    ///
    /// Returns `None` if the clamped region is empty.
    #[must_use]
    pub fn crop(&self, face: &FaceBox) -> Option<Frame> {
        if self.is_empty() || face.x >= self.width || face.y >= self.height {
            return None;
        }
        let right = face.x.saturating_add(face.width).min(self.width);
        let bottom = face.y.saturating_add(face.height).min(self.height);
        let w = right - face.x;
        let h = bottom - face.y;
        if w == 0 || h == 0 {
            return None;
        }

        let stride = self.width as usize;
        let mut pixels = Vec::with_capacity(w as usize * h as usize);
        for row in face.y..bottom {
            let start = row as usize * stride + face.x as usize;
            let end = start + w as usize;
            pixels.extend_from_slice(self.pixels.get(start..end)?);
        }
        Some(Frame::new(w, h, pixels))
    }
}

// ---------------------------------------------------------------------------
// Camera Configuration
// ---------------------------------------------------------------------------

/// Which camera to open and whether to show the debug preview.
///
/// Read by the lifecycle manager at (re)start time only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Platform device index.
    pub device_index: u32,
    /// Whether frames are forwarded to a preview sink.
    pub preview_enabled: bool,
}

impl CameraConfig {
    /// Camera config for a device index with preview disabled.
    #[must_use]
    pub fn device(device_index: u32) -> Self {
        Self {
            device_index,
            preview_enabled: false,
        }
    }
}

/// Resolution and frame rate requested from an accepted device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureSettings {
    /// Requested frame width.
    pub width: u32,
    /// Requested frame height.
    pub height: u32,
    /// Requested frames per second.
    pub fps: u32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fps: 30,
        }
    }
}
