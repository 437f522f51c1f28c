//! Moodlink Benchmark Suite
//!
//! Performance targets:
//!   sensing_tick_with_inference ...... < 50μs (fake models, 64x48 frame)
//!   history_push_and_snapshot_30 ..... < 2μs
//!   fallback_line_lookup ............. < 1μs
//!   paginate_long_line ............... < 20μs

use std::sync::Arc;
use std::time::{Duration, Instant};

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use moodlink_core::camera::{acquire, CaptureBackend, CaptureDevice};
use moodlink_core::error::Result;
use moodlink_core::sensing::{EmotionClassifier, FaceLocator, LoadedModels, SensingWorker};
use moodlink_core::{CameraConfig, CaptureSettings, EmotionHistory, EmotionLabel, FaceBox, Frame};
use moodlink_game::pagination::{paginate, DialogueLayout, Monospace};
use moodlink_llm::fallback::fallback_line;
use moodlink_llm::DialogueRequestContext;

struct StillDevice(Frame);

impl CaptureDevice for StillDevice {
    fn read_frame(&mut self) -> Result<Frame> {
        Ok(self.0.clone())
    }
    fn configure(&mut self, _settings: &CaptureSettings) -> Result<()> {
        Ok(())
    }
    fn release(&mut self) {}
}

struct StillBackend;

impl CaptureBackend for StillBackend {
    fn name(&self) -> &str {
        "still"
    }
    fn open(&self, _device_index: u32) -> Result<Box<dyn CaptureDevice>> {
        Ok(Box::new(StillDevice(Frame::filled(64, 48, 128))))
    }
}

struct CentreFace;

impl FaceLocator for CentreFace {
    fn locate(&mut self, frame: &Frame) -> Result<Vec<FaceBox>> {
        Ok(vec![FaceBox::new(frame.width / 4, frame.height / 4, frame.width / 2, frame.height / 2)])
    }
}

struct MeanBrightness;

impl EmotionClassifier for MeanBrightness {
    fn classify(&mut self, face: &Frame) -> Result<EmotionLabel> {
        let sum: u64 = face.pixels.iter().map(|&p| u64::from(p)).sum();
        let mean = sum / face.pixels.len().max(1) as u64;
        Ok(EmotionLabel::ALL[(mean as usize) % EmotionLabel::ALL.len()])
    }
}

/// Benchmark: one sensing tick that runs inference (target: < 50μs).
fn bench_sensing_tick(c: &mut Criterion) {
    let backends: Vec<Arc<dyn CaptureBackend>> = vec![Arc::new(StillBackend)];
    let camera = acquire(&backends, &CameraConfig::default(), &CaptureSettings::default())
        .expect("still camera always opens");
    let models = LoadedModels {
        locator: Box::new(CentreFace),
        classifier: Box::new(MeanBrightness),
    };
    let history = EmotionHistory::new(30);
    let mut worker = SensingWorker::new(camera, models, history, Duration::ZERO, Instant::now());

    c.bench_function("sensing_tick_with_inference", |b| {
        b.iter(|| black_box(worker.tick(black_box(Instant::now()))));
    });
}

/// Benchmark: push into a full history and snapshot it (target: < 2μs).
fn bench_history(c: &mut Criterion) {
    let history = EmotionHistory::new(30);
    for i in 0..30 {
        history.push(EmotionLabel::ALL[i % EmotionLabel::ALL.len()]);
    }

    c.bench_function("history_push_and_snapshot_30", |b| {
        b.iter(|| {
            history.push(black_box(EmotionLabel::Happy));
            black_box(history.snapshot());
        });
    });
}

/// Benchmark: offline rule lookup that falls through to the last Pete rule (target: < 1μs).
fn bench_fallback(c: &mut Criterion) {
    let ctx = DialogueRequestContext::new(
        "Merchant Pete",
        "friendly trader",
        "player is making steady progress with their farm",
        EmotionLabel::Neutral,
    );

    c.bench_function("fallback_line_lookup", |b| {
        b.iter(|| black_box(fallback_line(black_box(&ctx))));
    });
}

/// Benchmark: wrap and page a long generated line (target: < 20μs).
fn bench_paginate(c: &mut Criterion) {
    let text = "I notice you seem a bit down, friend. Remember, every farmer has tough days, \
                but I've got just the things to brighten your mood! "
        .repeat(4);
    let layout = DialogueLayout::default();
    let measure = Monospace { char_width_px: 14 };

    c.bench_function("paginate_long_line", |b| {
        b.iter(|| black_box(paginate(black_box(&text), &layout, &measure)));
    });
}

criterion_group!(
    benches,
    bench_sensing_tick,
    bench_history,
    bench_fallback,
    bench_paginate,
);
criterion_main!(benches);
