//! Vendor label to AASM lookup tables.
//!
//! Exact string keys, including leading spaces and accents as exported.
//! Desaturation and snore marks of the Deltamed and RemLogic exports are
//! automatic scoring and are not mapped.

use psg_model::{AasmEvent, SleepStage};

/// Stage labels of all three export dialects.
pub const STAGE_MAPPING: &[(&str, SleepStage)] = &[
    // Deltamed
    ("Veille", SleepStage::W),
    ("Stade 1", SleepStage::N1),
    ("Stade 2", SleepStage::N2),
    ("Stade 3", SleepStage::N3),
    // R&K stage 4 is N3 under AASM rules.
    ("Stade 4", SleepStage::N3),
    ("S. Paradoxal", SleepStage::R),
    ("Indéterminé", SleepStage::Unscored),
    // RemLogic
    ("SLEEP-S0", SleepStage::W),
    ("SLEEP-S1", SleepStage::N1),
    ("SLEEP-S2", SleepStage::N2),
    ("SLEEP-S3", SleepStage::N3),
    ("SLEEP-S4", SleepStage::N3),
    ("SLEEP-REM", SleepStage::R),
    ("SLEEP-UNSCORED", SleepStage::Unscored),
    // BrainRT
    ("Sleep stage W", SleepStage::W),
    ("Sleep stage N1", SleepStage::N1),
    ("Sleep stage N2", SleepStage::N2),
    ("Sleep stage N3", SleepStage::N3),
    ("Sleep stage N4", SleepStage::N3),
    ("Sleep stage R", SleepStage::R),
];

/// Clinical event labels of all three export dialects.
///
/// Deltamed exports channel specific artefacts such as `Artefact (PRES)`;
/// those stay in the original stream only.
pub const AASM_EVENT_MAPPING: &[(&str, AasmEvent)] = &[
    ("SIGNAL-ARTIFACT", AasmEvent::Artifact),
    ("SIGNAL-QUALITY-LOW", AasmEvent::Artifact),
    ("PLM droit", AasmEvent::PlmRight),
    ("PLM Gauce", AasmEvent::PlmLeft),
    ("PLM-LM", AasmEvent::Plm),
    ("PLM", AasmEvent::Plm),
    ("Limb movement : Mouvement de la jambe gauche", AasmEvent::Plm),
    ("Arousal non spécifique", AasmEvent::Arousal),
    ("Arousal cortical", AasmEvent::Arousal),
    ("AROUSAL", AasmEvent::Arousal),
    ("Micro-éveil", AasmEvent::Arousal),
    ("Arousal d'origine respiratoire", AasmEvent::ArousalRes),
    ("AROUSAL-RESP", AasmEvent::ArousalRes),
    ("AROUSAL-SNORE", AasmEvent::ArousalRes),
    ("AROUSAL-HYPOPNEA", AasmEvent::ArousalRes),
    ("AROUSAL-APNEA", AasmEvent::ArousalRes),
    ("AROUSAL-DESAT", AasmEvent::ArousalRes),
    ("AROUSAL-SPONT", AasmEvent::ArousalSpont),
    ("Arousal autonome", AasmEvent::ArousalSpont),
    ("AROUSAL-PLM", AasmEvent::ArousalPlm),
    ("Mouvement + arousal", AasmEvent::ArousalLm),
    ("AROUSAL-LM", AasmEvent::ArousalLm),
    ("AROUSAL-RERA", AasmEvent::Rera),
    ("Apnée", AasmEvent::Apnea),
    ("APNEA", AasmEvent::Apnea),
    ("Apnée Centrale", AasmEvent::ApneaCentral),
    ("APNEA-CENTRAL", AasmEvent::ApneaCentral),
    ("Apnée centrale", AasmEvent::ApneaCentral),
    ("Apnée Obstructive", AasmEvent::ApneaObstructive),
    ("APNEA-OBSTRUCTIVE", AasmEvent::ApneaObstructive),
    ("Apnée obstructive", AasmEvent::ApneaObstructive),
    ("Apnée Mixte", AasmEvent::ApneaMixed),
    ("APNEA-MIXED", AasmEvent::ApneaMixed),
    ("Apnée mixte", AasmEvent::ApneaMixed),
    // RemLogic hypopneas are untyped.
    ("HYPOPNEA", AasmEvent::Hypopnea),
    ("hypopnée", AasmEvent::Hypopnea),
    ("hypopnée Centrale", AasmEvent::HypopneaCentral),
    ("HYPOPNEA-CENTRAL", AasmEvent::HypopneaCentral),
    ("Hypopnée centrale", AasmEvent::HypopneaCentral),
    // Deltamed "Hypopnée" is obstructive unless typed otherwise.
    ("Hypopnée", AasmEvent::HypopneaObstructive),
    ("HYPOPNEA-OBSTRUCTIVE", AasmEvent::HypopneaObstructive),
    ("hypopnée Obstructive", AasmEvent::HypopneaObstructive),
    ("Hypopnée obstructive", AasmEvent::HypopneaObstructive),
    ("Chute de la saturation", AasmEvent::Spo2Desat),
    ("Périodes de ronflement", AasmEvent::Snore),
];

pub fn stage_for_label(label: &str) -> Option<SleepStage> {
    STAGE_MAPPING
        .iter()
        .find(|(key, _)| *key == label)
        .map(|(_, stage)| *stage)
}

pub fn event_for_label(label: &str) -> Option<AasmEvent> {
    AASM_EVENT_MAPPING
        .iter()
        .find(|(key, _)| *key == label)
        .map(|(_, event)| *event)
}
