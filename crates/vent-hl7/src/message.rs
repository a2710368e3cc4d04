//! HL7 ORU^R01 observation message assembly
//!
//! A state snapshot projects into one unsolicited observation-result
//! message: fixed MSH/PID/ORC/OBR header segments followed by one OBX
//! segment per mapped parameter present in the snapshot. The message is a
//! value; persisting it belongs to the sink collaborator, which also
//! receives the suggested filename.

use chrono::{DateTime, Local};

use crate::codes::{clinical_identifier, OBSERVATION_CODES};
use crate::error::MessageError;
use crate::state::StateSnapshot;

/// A fully materialized observation message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservationMessage {
    /// Newline-joined segment lines
    pub text: String,
    /// Suggested filename for the sink, `HL7_<date>_<time>_<micros>.hl7`
    pub filename: String,
}

/// Build an observation message from a state snapshot.
///
/// Fails with [`MessageError::EmptySnapshot`] when nothing has been
/// decoded yet. OBX segments follow [`OBSERVATION_CODES`] order; absent
/// parameters and empty values are skipped, and the 1-based OBX index
/// counts emitted segments only, leaving no gaps. Keys without a known
/// clinical identifier fall back to a placeholder carrying just the key.
pub fn build_message(
    snapshot: &StateSnapshot,
    patient_id: &str,
    now: DateTime<Local>,
) -> Result<ObservationMessage, MessageError> {
    if snapshot.is_empty() {
        return Err(MessageError::EmptySnapshot);
    }

    let timestamp = now.format("%Y%m%d%H%M%S");

    let mut lines = vec![
        format!("MSH|^~\\&|HAMILTON_VENT||||{timestamp}||ORU^R01^ORU_R01|{timestamp}|P|2.4|||||||||"),
        format!("PID|||{patient_id}"),
        "ORC|NW|||||||||||||||||Hamilton_Ventilator".to_string(),
        format!("OBR|||||||{timestamp}||||||||||||||||||||||||||||"),
    ];

    let mut obx_index = 1;
    for &(parameter, key) in OBSERVATION_CODES {
        let Some(value) = snapshot.find(parameter) else {
            continue;
        };
        if value.trim().is_empty() {
            continue;
        }

        let identifier = clinical_identifier(key)
            .map(String::from)
            .unwrap_or_else(|| format!("^^^^^{key}"));
        lines.push(format!("OBX|{obx_index}||{identifier}||{value}"));
        obx_index += 1;
    }

    Ok(ObservationMessage {
        text: lines.join("\n"),
        filename: format!(
            "HL7_{}_{:06}.hl7",
            now.format("%Y%m%d_%H%M%S"),
            now.timestamp_subsec_micros()
        ),
    })
}
