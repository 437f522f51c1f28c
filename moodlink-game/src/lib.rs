//! # moodlink-game: Game Integration for Moodlink
//!
//! This crate provides the integration layer between the game-agnostic
//! `moodlink-core` sensing library, the `moodlink-llm` dialogue client and a
//! host game's foreground loop.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 Host game loop               │
//! │  ┌────────────────────────────────────────┐  │
//! │  │             moodlink-game              │  │
//! │  │  ┌──────────┐ ┌──────────┐ ┌────────┐  │  │
//! │  │  │ Session  │ │ Settings │ │  App   │  │  │
//! │  │  └────┬─────┘ └────┬─────┘ └───┬────┘  │  │
//! │  │       ▼            ▼           ▼       │  │
//! │  │  ┌──────────────┐ ┌─────────────────┐  │  │
//! │  │  │ moodlink-llm │ │  moodlink-core  │  │  │
//! │  │  └──────────────┘ └─────────────────┘  │  │
//! │  └────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `session`: dialogue session state machine driven by game input
//! - `pagination`: width-constrained line wrapping and paging
//! - `generation`: synchronous bridge to the async dialogue generator
//! - `context`: NPC profiles and request context assembly
//! - `settings`: persisted player settings with explicit change observers
//! - `telemetry`: tracing subscriber setup
//! - `app`: wiring of all of the above

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod context;
pub mod generation;
pub mod pagination;
pub mod session;
pub mod settings;
pub mod telemetry;

pub use app::MoodApp;
pub use session::DialogueSession;
