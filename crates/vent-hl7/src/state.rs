//! Ventilator state accumulation and breath-boundary detection
//!
//! The ventilator reports parameters incrementally across many frames;
//! [`VentilatorState`] keeps the latest value of every parameter seen so
//! far. The "Breath Number" monitored parameter advances at the start of
//! each respiratory cycle, so a merge that changes it to a new non-empty
//! value marks a breath boundary.

use std::collections::HashMap;

use vent_protocol::params::MONITORED_PARAMETERS;
use vent_protocol::Reading;

/// Parameter whose change marks the start of a new breath cycle
pub const BREATH_NUMBER: &str = "Breath Number";

/// Accumulated latest-value-wins parameter state
#[derive(Debug, Default)]
pub struct VentilatorState {
    groups: HashMap<String, HashMap<String, String>>,
}

impl VentilatorState {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge decoded readings into the state.
    ///
    /// Every reading overwrites the previous value of its parameter,
    /// creating group entries as needed. Returns the new breath number
    /// when this merge crossed a breath boundary: the breath number ended
    /// up non-empty and different from its value before the merge (a
    /// previously unseen breath number counts). Capturing the prior value
    /// and re-reading after the merge happen inside this single call, so
    /// no boundary is lost between merges.
    pub fn merge(&mut self, readings: &[Reading]) -> Option<String> {
        let prior_breath = self.get(MONITORED_PARAMETERS, BREATH_NUMBER).map(String::from);

        for reading in readings {
            self.groups
                .entry(reading.group.to_string())
                .or_default()
                .insert(reading.parameter.to_string(), reading.value.clone());
        }

        let new_breath = self.get(MONITORED_PARAMETERS, BREATH_NUMBER)?;
        if !new_breath.is_empty() && Some(new_breath) != prior_breath.as_deref() {
            Some(new_breath.to_string())
        } else {
            None
        }
    }

    /// Look up one parameter value
    pub fn get(&self, group: &str, parameter: &str) -> Option<&str> {
        self.groups.get(group)?.get(parameter).map(String::as_str)
    }

    /// Take an immutable copy of the full state, safe to hand to the
    /// message builder while further frames keep arriving
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            groups: self.groups.clone(),
        }
    }
}

/// Immutable copy of the ventilator state at one instant
#[derive(Debug, Clone, Default)]
pub struct StateSnapshot {
    groups: HashMap<String, HashMap<String, String>>,
}

impl StateSnapshot {
    /// True when no parameter has ever been recorded
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Find a parameter by exact name, searching all groups
    pub fn find(&self, parameter: &str) -> Option<&str> {
        self.groups
            .values()
            .find_map(|params| params.get(parameter))
            .map(String::as_str)
    }
}
