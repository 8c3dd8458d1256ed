use std::{fs, path::Path, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{AlertError, Result};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub playback: PlaybackConfig,
    pub detection: DetectionConfig,
    pub timing: TimingConfig,
}

impl AppConfig {
    /// Reads a JSON configuration file. Missing sections and fields fall back
    /// to their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.playback.validate()?;
        self.detection.validate()?;
        self.timing.validate()
    }
}

/// Which audio backend plays the alert clip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackBackend {
    /// Hand the clip to an external player program.
    #[default]
    Command,
    /// Decode and play in-process. Requires the `rodio` feature.
    Rodio,
}

/// Configuration specific to the playback subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub audio_file: PathBuf,
    pub backend: PlaybackBackend,
    /// Program and leading arguments for [`PlaybackBackend::Command`]. The
    /// clip path is appended as the final argument.
    pub command: Vec<String>,
    pub poll_interval_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            audio_file: PathBuf::from("sound.mp3"),
            backend: PlaybackBackend::Command,
            command: vec!["mpg123".to_string(), "-q".to_string()],
            poll_interval_ms: 500,
        }
    }
}

impl PlaybackConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.audio_file.as_os_str().is_empty() {
            return Err(AlertError::config("audio_file must not be empty"));
        }
        if self.poll_interval_ms == 0 {
            return Err(AlertError::config("poll_interval_ms must be positive"));
        }
        if self.backend == PlaybackBackend::Command
            && self.command.first().map_or(true, |program| program.is_empty())
        {
            return Err(AlertError::config(
                "command backend needs a player program",
            ));
        }
        Ok(())
    }
}

/// Configuration for the simulated person detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Chance of a detection on each poll.
    pub probability: f64,
    pub seed: Option<u64>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            probability: 0.25,
            seed: None,
        }
    }
}

impl DetectionConfig {
    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(AlertError::config(format!(
                "probability must lie in [0, 1], got {}",
                self.probability
            )));
        }
        Ok(())
    }
}

/// Delays applied by the alert loop between polls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub cooldown_secs: f64,
    pub idle_interval_secs: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 5.0,
            idle_interval_secs: 2.0,
        }
    }
}

/// Upper bound for any loop delay: one day.
pub const MAX_DELAY_SECS: f64 = 86_400.0;

/// Converts a seconds value into a delay, clamped to `[0, MAX_DELAY_SECS]`.
/// NaN maps to zero.
fn delay_from_secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value.clamp(0.0, MAX_DELAY_SECS)).unwrap_or(Duration::ZERO)
}

impl TimingConfig {
    pub fn cooldown(&self) -> Duration {
        delay_from_secs(self.cooldown_secs)
    }

    pub fn idle_interval(&self) -> Duration {
        delay_from_secs(self.idle_interval_secs)
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("cooldown_secs", self.cooldown_secs),
            ("idle_interval_secs", self.idle_interval_secs),
        ] {
            if Duration::try_from_secs_f64(value).is_err() || value > MAX_DELAY_SECS {
                return Err(AlertError::config(format!(
                    "{name} must be between 0 and {MAX_DELAY_SECS} seconds, got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_field_constants() {
        let config = AppConfig::default();
        assert_eq!(config.playback.audio_file, PathBuf::from("sound.mp3"));
        assert_eq!(config.playback.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.timing.cooldown(), Duration::from_secs(5));
        assert_eq!(config.timing.idle_interval(), Duration::from_secs(2));
        assert_eq!(config.detection.probability, 0.25);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config = AppConfig::from_json(
            r#"{ "timing": { "cooldown_secs": 1.5 }, "playback": { "backend": "rodio" } }"#,
        )
        .unwrap();

        assert_eq!(config.timing.cooldown(), Duration::from_millis(1500));
        assert_eq!(config.timing.idle_interval(), Duration::from_secs(2));
        assert_eq!(config.playback.backend, PlaybackBackend::Rodio);
        assert_eq!(config.playback.audio_file, PathBuf::from("sound.mp3"));
    }

    #[test]
    fn rejects_out_of_range_probability() {
        let err = AppConfig::from_json(r#"{ "detection": { "probability": 1.5 } }"#).unwrap_err();
        assert!(matches!(err, AlertError::Config(_)));
    }

    #[test]
    fn rejects_negative_cooldown() {
        let mut config = AppConfig::default();
        config.timing.cooldown_secs = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_player_command() {
        let mut config = AppConfig::default();
        config.playback.command.clear();
        assert!(config.validate().is_err());

        config.playback.backend = PlaybackBackend::Rodio;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = AppConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, AlertError::Json(_)));
    }

    #[test]
    fn json_output_parses_back() {
        let mut config = AppConfig::default();
        config.detection.seed = Some(42);
        config.timing.idle_interval_secs = 0.75;
        config.playback.backend = PlaybackBackend::Rodio;

        let parsed = AppConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn rejects_zero_poll_interval() {
        let mut config = AppConfig::default();
        config.playback.poll_interval_ms = 0;
        assert!(matches!(config.validate(), Err(AlertError::Config(_))));
    }

    #[test]
    fn rejects_non_finite_delays() {
        for value in [f64::NAN, f64::INFINITY] {
            let mut config = AppConfig::default();
            config.timing.idle_interval_secs = value;
            assert!(config.validate().is_err(), "accepted {value}");
        }
    }

    #[test]
    fn rejects_delays_too_large_for_a_duration() {
        for raw in [
            r#"{ "timing": { "cooldown_secs": 1e20 } }"#,
            r#"{ "timing": { "cooldown_secs": 1e19 } }"#,
            r#"{ "timing": { "idle_interval_secs": 86401 } }"#,
        ] {
            let err = AppConfig::from_json(raw).unwrap_err();
            assert!(matches!(err, AlertError::Config(_)), "accepted {raw}");
        }

        let mut config = AppConfig::default();
        config.timing.cooldown_secs = MAX_DELAY_SECS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unvalidated_delays_convert_without_panicking() {
        let timing = TimingConfig {
            cooldown_secs: 1e20,
            idle_interval_secs: f64::NAN,
        };
        assert_eq!(timing.cooldown(), Duration::from_secs(86_400));
        assert_eq!(timing.idle_interval(), Duration::ZERO);
    }
}
