//! Closed scoring taxonomies.
//!
//! Sleep stages follow the AASM manual (R&K stage 4 folds into N3). Clinical
//! events follow the AASM event classes used by the dataset format.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// AASM sleep stage of one 30 second epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SleepStage {
    /// Wakefulness.
    W,
    /// Stage N1.
    N1,
    /// Stage N2.
    N2,
    /// Stage N3 (slow wave sleep, includes R&K stage 4).
    N3,
    /// REM sleep.
    R,
    /// Epoch the scorer could not stage.
    Unscored,
}

impl SleepStage {
    /// All stages in hypnogram order.
    pub const ALL: [SleepStage; 6] = [
        SleepStage::W,
        SleepStage::N1,
        SleepStage::N2,
        SleepStage::N3,
        SleepStage::R,
        SleepStage::Unscored,
    ];

    /// Returns the serialized name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SleepStage::W => "W",
            SleepStage::N1 => "N1",
            SleepStage::N2 => "N2",
            SleepStage::N3 => "N3",
            SleepStage::R => "R",
            SleepStage::Unscored => "UNSCORED",
        }
    }
}

impl fmt::Display for SleepStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SleepStage {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SleepStage::ALL
            .into_iter()
            .find(|stage| stage.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ModelError::UnknownSleepStage(s.to_string()))
    }
}

/// AASM clinical event class.
///
/// Respiratory, arousal and limb movement variants are kept distinct so that
/// downstream indices (AHI, arousal index, PLM index) can be computed per
/// subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum AasmEvent {
    /// Event the scorer marked as uncertain.
    Unsure,
    /// Signal artifact, any channel.
    Artifact,
    /// Apnea without type.
    Apnea,
    ApneaCentral,
    ApneaObstructive,
    ApneaMixed,
    /// Hypopnea without type.
    Hypopnea,
    HypopneaCentral,
    HypopneaObstructive,
    /// Arousal without cause.
    Arousal,
    /// Respiratory arousal.
    ArousalRes,
    /// Spontaneous arousal.
    ArousalSpont,
    /// Arousal following a limb movement.
    ArousalLm,
    /// Arousal following a periodic limb movement.
    ArousalPlm,
    /// Respiratory effort related arousal.
    Rera,
    /// Oxygen desaturation.
    Spo2Desat,
    Snore,
    /// Periodic limb movement, side unspecified.
    Plm,
    PlmLeft,
    PlmRight,
}

impl AasmEvent {
    pub const ALL: [AasmEvent; 20] = [
        AasmEvent::Unsure,
        AasmEvent::Artifact,
        AasmEvent::Apnea,
        AasmEvent::ApneaCentral,
        AasmEvent::ApneaObstructive,
        AasmEvent::ApneaMixed,
        AasmEvent::Hypopnea,
        AasmEvent::HypopneaCentral,
        AasmEvent::HypopneaObstructive,
        AasmEvent::Arousal,
        AasmEvent::ArousalRes,
        AasmEvent::ArousalSpont,
        AasmEvent::ArousalLm,
        AasmEvent::ArousalPlm,
        AasmEvent::Rera,
        AasmEvent::Spo2Desat,
        AasmEvent::Snore,
        AasmEvent::Plm,
        AasmEvent::PlmLeft,
        AasmEvent::PlmRight,
    ];

    /// Returns the serialized name.
    pub fn as_str(&self) -> &'static str {
        match self {
            AasmEvent::Unsure => "UNSURE",
            AasmEvent::Artifact => "ARTIFACT",
            AasmEvent::Apnea => "APNEA",
            AasmEvent::ApneaCentral => "APNEA_CENTRAL",
            AasmEvent::ApneaObstructive => "APNEA_OBSTRUCTIVE",
            AasmEvent::ApneaMixed => "APNEA_MIXED",
            AasmEvent::Hypopnea => "HYPOPNEA",
            AasmEvent::HypopneaCentral => "HYPOPNEA_CENTRAL",
            AasmEvent::HypopneaObstructive => "HYPOPNEA_OBSTRUCTIVE",
            AasmEvent::Arousal => "AROUSAL",
            AasmEvent::ArousalRes => "AROUSAL_RES",
            AasmEvent::ArousalSpont => "AROUSAL_SPONT",
            AasmEvent::ArousalLm => "AROUSAL_LM",
            AasmEvent::ArousalPlm => "AROUSAL_PLM",
            AasmEvent::Rera => "RERA",
            AasmEvent::Spo2Desat => "SPO2_DESAT",
            AasmEvent::Snore => "SNORE",
            AasmEvent::Plm => "PLM",
            AasmEvent::PlmLeft => "PLM_LEFT",
            AasmEvent::PlmRight => "PLM_RIGHT",
        }
    }

    /// Returns true for apnea and hypopnea classes.
    pub fn is_respiratory(&self) -> bool {
        matches!(
            self,
            AasmEvent::Apnea
                | AasmEvent::ApneaCentral
                | AasmEvent::ApneaObstructive
                | AasmEvent::ApneaMixed
                | AasmEvent::Hypopnea
                | AasmEvent::HypopneaCentral
                | AasmEvent::HypopneaObstructive
        )
    }
}

impl fmt::Display for AasmEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AasmEvent {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AasmEvent::ALL
            .into_iter()
            .find(|event| event.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ModelError::UnknownEvent(s.to_string()))
    }
}
