//! Observation code tables
//!
//! Two static mappings drive the projection from ventilator parameter
//! names to HL7 observation lines. The order of [`OBSERVATION_CODES`]
//! defines the order of OBX segments in every emitted message.

/// Ventilator parameter name -> HL7 observation key, in emission order
pub const OBSERVATION_CODES: &[(&str, &str)] = &[
    ("P max", "MPAP"),
    ("P mean", "MEAP"),
    ("P min", "MIAP"),
    ("PEEP/CPAP", "PEEP"),
    ("Exp. Volume", "TDLV"),
    ("Vexp/min", "EXPM"),
    ("f total", "RRM"),
    ("I:E ratio", "IER"),
    ("Oxygen", "FIO2"),
    ("SpO2", "SAT"),
    ("Pulse", "HR"),
    ("Mode Name", "VENM"),
];

/// Resolve an HL7 observation key to its `code^description` identifier
pub fn clinical_identifier(key: &str) -> Option<&'static str> {
    match key {
        "MPAP" => Some("3002-3^Maximum Positive Airway Pressure"),
        "MEAP" => Some("3002-6^Mean airway pressure"),
        "MIAP" => Some("3002-2^Minimum Airway Pressure"),
        "PEEP" => Some("3005-4^PEEP"),
        "TDLV" => Some("LP73863-0^Tidal Volume Expired"),
        "EXPM" => Some("76008-2^EXP - Minute Volume"),
        "RRM" => Some("9279-2^Respiratory_Rate"),
        "IER" => Some("3008-1^I:E Ratio"),
        "FIO2" => Some("3008-7^FIO2"),
        "SAT" => Some("59408-5^oxygen_saturation"),
        "HR" => Some("8867-4^HR_Pulse"),
        "VENM" => Some("3008-3^Ventilation Mode"),
        _ => None,
    }
}
