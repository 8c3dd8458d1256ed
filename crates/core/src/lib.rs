//! Core library for the drone alert system.
//!
//! A single polling loop asks a [`Detector`] whether a person is in view and,
//! when one is, plays an alert clip through a [`Player`] before entering a
//! cooldown. Detector, player and the sleep source are traits so the loop can
//! be driven by real hardware or by deterministic test doubles.

pub mod alert;
pub mod audio;
pub mod config;
pub mod detect;
pub mod error;
pub mod timeline;

pub use alert::{AlertLoop, AlertSettings, AlertStats, PollOutcome};
#[cfg(feature = "rodio")]
pub use audio::RodioPlayer;
pub use audio::{CommandPlayer, Player};
pub use config::{AppConfig, DetectionConfig, PlaybackBackend, PlaybackConfig, TimingConfig};
pub use detect::{Detector, RandomDetector, ScriptedDetector};
pub use error::{AlertError, Result};
pub use timeline::{ShutdownSignal, Sleeper, ThreadSleeper};
