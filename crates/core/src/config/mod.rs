use std::{collections::HashSet, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{Result, TechXError};

/// Top-level configuration structure for the site core.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub intro: IntroConfig,
    pub audio: AudioConfig,
    pub registration: RegistrationConfig,
}

impl AppConfig {
    /// Parses a JSON document. Missing sections and fields fall back to their
    /// defaults.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates the JSON configuration stored at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        self.intro.validate()?;
        self.audio.validate()
    }
}

/// One named stage of the intro with its optional reveal text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSpec {
    pub name: String,
    #[serde(default)]
    pub text: String,
    /// Delay between two revealed characters.
    #[serde(default)]
    pub letter_interval_ms: u64,
    /// Delay after the text is fully shown (or immediately, for phases
    /// without text) before the next phase starts.
    pub hold_ms: u64,
}

impl PhaseSpec {
    pub fn new(
        name: impl Into<String>,
        text: impl Into<String>,
        letter_interval_ms: u64,
        hold_ms: u64,
    ) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            letter_interval_ms,
            hold_ms,
        }
    }

    /// Number of characters the phase reveals one by one.
    pub fn text_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn letter_interval(&self) -> Duration {
        Duration::from_millis(self.letter_interval_ms)
    }

    pub fn hold(&self) -> Duration {
        Duration::from_millis(self.hold_ms)
    }

    /// Time the phase occupies from entry until the next phase starts.
    pub fn duration(&self) -> Duration {
        let letters = u32::try_from(self.text_len()).unwrap_or(u32::MAX);
        self.letter_interval()
            .saturating_mul(letters)
            .saturating_add(self.hold())
    }
}

/// Ordered phase table for the intro. The last phase is the terminal one;
/// completion fires once its hold delay has elapsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntroConfig {
    pub phases: Vec<PhaseSpec>,
}

impl Default for IntroConfig {
    fn default() -> Self {
        Self {
            phases: vec![
                PhaseSpec::new("title", "TECHXPRESSION", 150, 500),
                PhaseSpec::new("subtitle", "TECHSIDE DOWN", 100, 1500),
                PhaseSpec::new("fadeout", "", 0, 1500),
            ],
        }
    }
}

impl IntroConfig {
    pub fn validate(&self) -> Result<()> {
        if self.phases.is_empty() {
            return Err(invalid("intro needs at least one phase"));
        }

        let mut seen = HashSet::new();
        for phase in &self.phases {
            if phase.name.is_empty() {
                return Err(invalid("intro phase names must not be empty"));
            }
            if !seen.insert(phase.name.as_str()) {
                return Err(invalid(format!("duplicate intro phase `{}`", phase.name)));
            }
            if phase.text_len() > 0 && phase.letter_interval_ms == 0 {
                return Err(invalid(format!(
                    "phase `{}` reveals text but has no letter interval",
                    phase.name
                )));
            }
        }

        Ok(())
    }

    /// Total time from `start` until completion fires.
    pub fn total_duration(&self) -> Duration {
        self.phases
            .iter()
            .fold(Duration::ZERO, |total, phase| total.saturating_add(phase.duration()))
    }
}

/// Configuration specific to the background audio player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub source: String,
    pub looped: bool,
    pub initial_volume: f32,
    /// Discrete levels offered by the volume selector.
    pub volume_levels: Vec<f32>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            source: "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-1.mp3".to_string(),
            looped: true,
            initial_volume: 0.3,
            volume_levels: vec![0.25, 0.5, 0.75, 1.0],
        }
    }
}

impl AudioConfig {
    pub fn validate(&self) -> Result<()> {
        if !is_unit(self.initial_volume) {
            return Err(invalid(format!(
                "initial volume {} is outside [0, 1]",
                self.initial_volume
            )));
        }
        if let Some(level) = self.volume_levels.iter().find(|level| !is_unit(**level)) {
            return Err(invalid(format!("volume level {level} is outside [0, 1]")));
        }
        Ok(())
    }
}

/// Settings for the simulated registration submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    pub submit_delay_ms: u64,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            submit_delay_ms: 1500,
        }
    }
}

impl RegistrationConfig {
    pub fn submit_delay(&self) -> Duration {
        Duration::from_millis(self.submit_delay_ms)
    }
}

pub(crate) fn is_unit(value: f32) -> bool {
    (0.0..=1.0).contains(&value)
}

fn invalid(message: impl Into<String>) -> TechXError {
    TechXError::InvalidConfig(message.into())
}
