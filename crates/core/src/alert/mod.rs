use std::{path::PathBuf, time::Duration};

use serde::Serialize;

use crate::{AppConfig, Detector, Player, ShutdownSignal, Sleeper};

/// Parameters the loop needs at run time.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertSettings {
    pub audio_file: PathBuf,
    /// Delay after an alert before polling resumes.
    pub cooldown: Duration,
    /// Delay after a poll that saw nobody.
    pub idle_interval: Duration,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

impl AlertSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            audio_file: config.playback.audio_file.clone(),
            cooldown: config.timing.cooldown(),
            idle_interval: config.timing.idle_interval(),
        }
    }
}

/// Result of a single poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// A person was detected. `played` is false when playback failed.
    Alerted { played: bool },
    Idle,
}

/// Counters accumulated over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AlertStats {
    pub polls: u64,
    pub detections: u64,
    pub playbacks: u64,
    pub playback_failures: u64,
    /// Playbacks that failed because shutdown was requested mid-clip.
    pub interrupted_playbacks: u64,
}

/// The detect → alert → cooldown loop.
pub struct AlertLoop<D, P, S> {
    detector: D,
    player: P,
    sleeper: S,
    settings: AlertSettings,
    stats: AlertStats,
}

impl<D, P, S> AlertLoop<D, P, S>
where
    D: Detector,
    P: Player,
    S: Sleeper,
{
    pub fn new(detector: D, player: P, sleeper: S, settings: AlertSettings) -> Self {
        Self {
            detector,
            player,
            sleeper,
            settings,
            stats: AlertStats::default(),
        }
    }

    pub fn settings(&self) -> &AlertSettings {
        &self.settings
    }

    pub fn stats(&self) -> AlertStats {
        self.stats
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    /// Runs one iteration: detect, then either play and cool down or take a
    /// short idle sleep. Playback errors that the loop can survive are logged
    /// and counted; anything else is logged as well since the loop has no
    /// caller to hand it to.
    pub fn poll_once(&mut self) -> PollOutcome {
        self.poll(None)
    }

    fn poll(&mut self, shutdown: Option<&ShutdownSignal>) -> PollOutcome {
        self.stats.polls += 1;

        if !self.detector.detect() {
            self.sleeper.sleep(self.settings.idle_interval);
            return PollOutcome::Idle;
        }

        self.stats.detections += 1;
        let played = match self.player.play(&self.settings.audio_file) {
            Ok(()) => {
                self.stats.playbacks += 1;
                true
            }
            Err(err) if shutdown.is_some_and(ShutdownSignal::is_triggered) => {
                self.stats.interrupted_playbacks += 1;
                tracing::info!(error = %err, "alert playback interrupted by shutdown");
                false
            }
            Err(err) => {
                self.stats.playback_failures += 1;
                if err.is_recoverable() {
                    tracing::error!(error = %err, "alert playback failed, continuing");
                } else {
                    tracing::error!(error = ?err, "unexpected playback failure, continuing");
                }
                false
            }
        };

        tracing::info!(
            cooldown_secs = self.settings.cooldown.as_secs_f64(),
            "entering cooldown"
        );
        self.sleeper.sleep(self.settings.cooldown);
        PollOutcome::Alerted { played }
    }

    /// Polls until `shutdown` is raised.
    pub fn run(&mut self, shutdown: &ShutdownSignal) -> AlertStats {
        self.run_until(None, shutdown)
    }

    /// Polls until `shutdown` is raised or `max_polls` iterations have run.
    pub fn run_for(&mut self, max_polls: u64, shutdown: &ShutdownSignal) -> AlertStats {
        self.run_until(Some(max_polls), shutdown)
    }

    fn run_until(&mut self, max_polls: Option<u64>, shutdown: &ShutdownSignal) -> AlertStats {
        tracing::info!(
            audio_file = %self.settings.audio_file.display(),
            "drone alert system initialised, starting main loop"
        );

        let mut remaining = max_polls;
        while !shutdown.is_triggered() {
            if let Some(left) = remaining.as_mut() {
                if *left == 0 {
                    break;
                }
                *left -= 1;
            }
            self.poll(Some(shutdown));
        }

        let stats = self.stats;
        tracing::info!(
            polls = stats.polls,
            detections = stats.detections,
            playbacks = stats.playbacks,
            failures = stats.playback_failures,
            interrupted = stats.interrupted_playbacks,
            "alert loop stopped"
        );
        stats
    }
}

impl<D, P, S> std::fmt::Debug for AlertLoop<D, P, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertLoop")
            .field("settings", &self.settings)
            .field("stats", &self.stats)
            .finish()
    }
}
