//! Intervention policy: behavioral snapshot to urgency and teaching style.
//!
//! Each axis is a lookup table. The axis results are combined by taking the
//! highest urgency; ties go to the state that actually carries a teaching
//! signal, then to the more specific axis (provenance > iteration >
//! cognitive). Any HIGH result forces a concrete starting point.

use crate::PolicyError;
use std::collections::BTreeMap;
use tutorgate_config::InterventionConfig;
use tutorgate_core::behavior::{
    BehavioralSnapshot, CognitiveState, IterationState, ProvenanceState,
};
use tutorgate_core::tutoring::{InterventionDirective, TeachingStyle, Urgency};

const COGNITIVE_TABLE: [(CognitiveState, Urgency, Option<TeachingStyle>); 4] = [
    (CognitiveState::Active, Urgency::None, None),
    (
        CognitiveState::ReflectivePause,
        Urgency::Low,
        Some(TeachingStyle::SupportiveCheckIn),
    ),
    (
        CognitiveState::PassiveIdle,
        Urgency::Medium,
        Some(TeachingStyle::GentleNudge),
    ),
    (
        CognitiveState::Disengagement,
        Urgency::High,
        Some(TeachingStyle::ConcreteStartingPoint),
    ),
];

// DELIBERATE_DEBUGGING gets a supportive style but no urgency: the learner
// is making progress and should not be interrupted.
const ITERATION_TABLE: [(IterationState, Urgency, Option<TeachingStyle>); 4] = [
    (IterationState::Normal, Urgency::None, None),
    (
        IterationState::RapidGuessing,
        Urgency::Low,
        Some(TeachingStyle::ReflectiveQuestion),
    ),
    (
        IterationState::DeliberateDebugging,
        Urgency::None,
        Some(TeachingStyle::TargetedDebugging),
    ),
    (
        IterationState::MicroIteration,
        Urgency::Low,
        Some(TeachingStyle::BigPicture),
    ),
];

const PROVENANCE_TABLE: [(ProvenanceState, Urgency, Option<TeachingStyle>); 3] = [
    (ProvenanceState::IncrementalEdit, Urgency::None, None),
    (
        ProvenanceState::SuspectedPaste,
        Urgency::Medium,
        Some(TeachingStyle::ExplainYourCode),
    ),
    (
        ProvenanceState::Spamming,
        Urgency::Medium,
        Some(TeachingStyle::ThoughtfulEdits),
    ),
];

/// Axis precedence for tie-breaking. Higher wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Axis {
    Cognitive,
    Iteration,
    Provenance,
}

/// One axis's contribution.
#[derive(Debug, Clone, Copy)]
struct Signal {
    axis: Axis,
    urgency: Urgency,
    style: Option<TeachingStyle>,
}

impl Signal {
    fn rank(&self) -> (Urgency, bool, Axis) {
        (self.urgency, self.style.is_some(), self.axis)
    }
}

fn lookup<S: Copy + PartialEq>(
    table: &[(S, Urgency, Option<TeachingStyle>)],
    state: S,
) -> (Urgency, Option<TeachingStyle>) {
    table
        .iter()
        .find(|(s, _, _)| *s == state)
        .map(|(_, urgency, style)| (*urgency, *style))
        .unwrap_or_default()
}

/// Maps behavioral snapshots to intervention directives.
#[derive(Debug, Clone, Default)]
pub struct InterventionPolicy {
    /// Urgency overrides keyed by canonical state label.
    overrides: BTreeMap<&'static str, Urgency>,
}

impl InterventionPolicy {
    /// The built-in table with no overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `[intervention.urgency]` overrides from configuration.
    pub fn from_config(config: &InterventionConfig) -> Result<Self, PolicyError> {
        let mut overrides = BTreeMap::new();
        for (label, urgency) in &config.urgency {
            let canonical = canonical_label(label)
                .ok_or_else(|| PolicyError::UnknownState(label.clone()))?;
            overrides.insert(canonical, *urgency);
        }
        Ok(Self { overrides })
    }

    fn urgency_for(&self, label: &'static str, table_urgency: Urgency) -> Urgency {
        self.overrides.get(label).copied().unwrap_or(table_urgency)
    }

    fn signals(&self, snapshot: &BehavioralSnapshot) -> Vec<Signal> {
        let mut signals = Vec::with_capacity(3);
        if let Some(state) = snapshot.cognitive {
            let (urgency, style) = lookup(&COGNITIVE_TABLE, state);
            signals.push(Signal {
                axis: Axis::Cognitive,
                urgency: self.urgency_for(state.label(), urgency),
                style,
            });
        }
        if let Some(state) = snapshot.iteration {
            let (urgency, style) = lookup(&ITERATION_TABLE, state);
            signals.push(Signal {
                axis: Axis::Iteration,
                urgency: self.urgency_for(state.label(), urgency),
                style,
            });
        }
        if let Some(state) = snapshot.provenance {
            let (urgency, style) = lookup(&PROVENANCE_TABLE, state);
            signals.push(Signal {
                axis: Axis::Provenance,
                urgency: self.urgency_for(state.label(), urgency),
                style,
            });
        }
        signals
    }

    /// Evaluate a snapshot. `None` is the neutral default.
    pub fn evaluate(&self, snapshot: Option<&BehavioralSnapshot>) -> InterventionDirective {
        let Some(snapshot) = snapshot else {
            return InterventionDirective::default();
        };

        let winner = self.signals(snapshot).into_iter().max_by_key(Signal::rank);
        let (urgency, style) = match winner {
            Some(signal) => (signal.urgency, signal.style.unwrap_or_default()),
            None => (Urgency::None, TeachingStyle::default()),
        };

        let style = if urgency == Urgency::High {
            TeachingStyle::ConcreteStartingPoint
        } else {
            style
        };

        InterventionDirective {
            urgency,
            style,
            behavioral_context: describe(snapshot),
        }
    }

    /// Evaluate for the proactive hint entry point: urgency is at least LOW.
    pub fn evaluate_hint(&self, snapshot: Option<&BehavioralSnapshot>) -> InterventionDirective {
        let mut directive = self.evaluate(snapshot);
        if directive.urgency < Urgency::Low {
            directive.urgency = Urgency::Low;
        }
        if directive.style == TeachingStyle::SubtleHint {
            directive.style = TeachingStyle::ProactiveNudge;
        }
        directive
    }
}

fn canonical_label(label: &str) -> Option<&'static str> {
    if let Ok(state) = label.parse::<CognitiveState>() {
        return Some(state.label());
    }
    if let Ok(state) = label.parse::<IterationState>() {
        return Some(state.label());
    }
    label.parse::<ProvenanceState>().ok().map(ProvenanceState::label)
}

/// "Cognitive: PASSIVE_IDLE, Code Pattern: SUSPECTED_PASTE" or "Normal engagement".
fn describe(snapshot: &BehavioralSnapshot) -> String {
    let mut parts = Vec::new();
    if let Some(state) = snapshot.cognitive {
        parts.push(format!("Cognitive: {state}"));
    }
    if let Some(state) = snapshot.iteration.filter(|s| !s.is_neutral()) {
        parts.push(format!("Iteration: {state}"));
    }
    if let Some(state) = snapshot.provenance.filter(|s| !s.is_neutral()) {
        parts.push(format!("Code Pattern: {state}"));
    }
    if parts.is_empty() {
        "Normal engagement".into()
    } else {
        parts.join(", ")
    }
}
