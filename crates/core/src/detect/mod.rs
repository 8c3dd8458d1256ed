use std::collections::VecDeque;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{AlertError, DetectionConfig, Result};

/// Source of "is there a person in view" answers.
///
/// A real deployment backs this with a vision pipeline reading the drone
/// camera. The loop only needs one boolean per poll.
pub trait Detector {
    fn detect(&mut self) -> bool;
}

impl<D: Detector + ?Sized> Detector for Box<D> {
    fn detect(&mut self) -> bool {
        (**self).detect()
    }
}

/// Simulated detector that reports a person with a fixed probability.
#[derive(Debug)]
pub struct RandomDetector {
    probability: f64,
    rng: StdRng,
}

impl RandomDetector {
    /// Creates a detector seeded from the operating system.
    pub fn new(probability: f64) -> Result<Self> {
        Self::build(probability, StdRng::from_entropy())
    }

    /// Creates a detector whose sequence of answers is reproducible.
    pub fn with_seed(probability: f64, seed: u64) -> Result<Self> {
        Self::build(probability, StdRng::seed_from_u64(seed))
    }

    pub fn from_config(config: &DetectionConfig) -> Result<Self> {
        match config.seed {
            Some(seed) => Self::with_seed(config.probability, seed),
            None => Self::new(config.probability),
        }
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    fn build(probability: f64, rng: StdRng) -> Result<Self> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(AlertError::config(format!(
                "detection probability must lie in [0, 1], got {probability}"
            )));
        }
        Ok(Self { probability, rng })
    }
}

impl Detector for RandomDetector {
    fn detect(&mut self) -> bool {
        tracing::debug!("scanning for people");
        let spotted = self.rng.gen_bool(self.probability);
        if spotted {
            tracing::info!("person detected");
        } else {
            tracing::debug!("nothing seen");
        }
        spotted
    }
}

/// Replays a fixed list of answers, then reports nothing forever.
#[derive(Debug, Default, Clone)]
pub struct ScriptedDetector {
    script: VecDeque<bool>,
    calls: usize,
}

impl ScriptedDetector {
    pub fn new(script: impl IntoIterator<Item = bool>) -> Self {
        Self {
            script: script.into_iter().collect(),
            calls: 0,
        }
    }

    /// Number of times [`Detector::detect`] has been called.
    pub fn calls(&self) -> usize {
        self.calls
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Detector for ScriptedDetector {
    fn detect(&mut self) -> bool {
        self.calls += 1;
        let spotted = self.script.pop_front().unwrap_or(false);
        if spotted {
            tracing::info!(call = self.calls, "person detected");
        }
        spotted
    }
}
