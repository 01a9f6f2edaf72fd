//! Behavioral snapshot: the upstream engine's classification of a learner.
//!
//! The classifier itself lives outside this system. Its output arrives as
//! three independent labels, each of which may be missing. A missing axis
//! means "no adaptation" and is treated exactly like the neutral value.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Engagement level inferred from activity and idle time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CognitiveState {
    Active,
    ReflectivePause,
    PassiveIdle,
    Disengagement,
}

/// How the learner is iterating on their code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IterationState {
    Normal,
    RapidGuessing,
    DeliberateDebugging,
    MicroIteration,
}

/// Where the code in the editor appears to come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProvenanceState {
    IncrementalEdit,
    SuspectedPaste,
    Spamming,
}

impl CognitiveState {
    pub const ALL: [Self; 4] = [
        Self::Active,
        Self::ReflectivePause,
        Self::PassiveIdle,
        Self::Disengagement,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::ReflectivePause => "REFLECTIVE_PAUSE",
            Self::PassiveIdle => "PASSIVE_IDLE",
            Self::Disengagement => "DISENGAGEMENT",
        }
    }

    pub fn is_neutral(self) -> bool {
        self == Self::Active
    }
}

impl IterationState {
    pub const ALL: [Self; 4] = [
        Self::Normal,
        Self::RapidGuessing,
        Self::DeliberateDebugging,
        Self::MicroIteration,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::RapidGuessing => "RAPID_GUESSING",
            Self::DeliberateDebugging => "DELIBERATE_DEBUGGING",
            Self::MicroIteration => "MICRO_ITERATION",
        }
    }

    pub fn is_neutral(self) -> bool {
        self == Self::Normal
    }
}

impl ProvenanceState {
    pub const ALL: [Self; 3] = [Self::IncrementalEdit, Self::SuspectedPaste, Self::Spamming];

    pub fn label(self) -> &'static str {
        match self {
            Self::IncrementalEdit => "INCREMENTAL_EDIT",
            Self::SuspectedPaste => "SUSPECTED_PASTE",
            Self::Spamming => "SPAMMING",
        }
    }

    pub fn is_neutral(self) -> bool {
        self == Self::IncrementalEdit
    }
}

/// An unrecognised behavioral label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {axis} state '{value}'")]
pub struct UnknownState {
    pub axis: &'static str,
    pub value: String,
}

/// Upper-cases and maps `-`/space to `_` so "passive-idle" parses.
fn normalize_label(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}

impl FromStr for CognitiveState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = normalize_label(s);
        Self::ALL
            .into_iter()
            .find(|state| state.label() == label)
            .ok_or_else(|| UnknownState {
                axis: "cognitive",
                value: s.to_string(),
            })
    }
}

impl FromStr for IterationState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = normalize_label(s);
        Self::ALL
            .into_iter()
            .find(|state| state.label() == label)
            .ok_or_else(|| UnknownState {
                axis: "iteration",
                value: s.to_string(),
            })
    }
}

impl FromStr for ProvenanceState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = normalize_label(s);
        Self::ALL
            .into_iter()
            .find(|state| state.label() == label)
            .ok_or_else(|| UnknownState {
                axis: "provenance",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for CognitiveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for IterationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for ProvenanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The three-axis classification supplied with a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehavioralSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cognitive: Option<CognitiveState>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iteration: Option<IterationState>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<ProvenanceState>,
}

impl BehavioralSnapshot {
    /// Every axis at its neutral value.
    pub fn neutral() -> Self {
        Self {
            cognitive: Some(CognitiveState::Active),
            iteration: Some(IterationState::Normal),
            provenance: Some(ProvenanceState::IncrementalEdit),
        }
    }

    pub fn with_cognitive(mut self, state: CognitiveState) -> Self {
        self.cognitive = Some(state);
        self
    }

    pub fn with_iteration(mut self, state: IterationState) -> Self {
        self.iteration = Some(state);
        self
    }

    pub fn with_provenance(mut self, state: ProvenanceState) -> Self {
        self.provenance = Some(state);
        self
    }

    /// True when no axis carries a signal (missing or neutral everywhere).
    pub fn is_neutral(&self) -> bool {
        self.cognitive.is_none_or(CognitiveState::is_neutral)
            && self.iteration.is_none_or(IterationState::is_neutral)
            && self.provenance.is_none_or(ProvenanceState::is_neutral)
    }
}
