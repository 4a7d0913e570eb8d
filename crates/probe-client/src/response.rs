//! Extraction of transcript statistics from a transcription response body.

use probe_core::TestResult;
use serde_json::Value;
use tracing::{info, warn};

/// Fill `result` from a successful response body.
///
/// A JSON object body is stored as-is and its `text`, `segments` and
/// `speakers` fields are measured; missing fields count as empty. Any other
/// body is kept as raw text with no statistics.
pub fn apply_body(result: &mut TestResult, body: &str) {
    let object = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(object)) => object,
        Ok(other) => {
            warn!(kind = json_kind(&other), "Response body is not a JSON object");
            result.response = Some(Value::String(body.to_string()));
            return;
        }
        Err(e) => {
            warn!(error = %e, "Response parsing error");
            result.response = Some(Value::String(body.to_string()));
            return;
        }
    };

    let transcript_length = text_len(object.get("text"));
    let segments_count = object
        .get("segments")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);

    result.transcript_length = Some(transcript_length);
    result.segments_count = Some(segments_count);
    info!(transcript_length, segments_count, "Transcript received");

    if let Some(speakers) = object.get("speakers").filter(|s| is_truthy(s)) {
        let doctor = text_len(speakers.get("doctorText"));
        let patient = text_len(speakers.get("patientText"));
        info!(doctor, patient, "Speaker text lengths");
        result.doctor_text_length = Some(doctor);
        result.patient_text_length = Some(patient);
    }

    result.response = Some(Value::Object(object));
}

/// Character count of a string field, zero when absent or not a string.
fn text_len(value: Option<&Value>) -> usize {
    value
        .and_then(Value::as_str)
        .map_or(0, |s| s.chars().count())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Object(o) => !o.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::String(s) => !s.is_empty(),
        Value::Number(_) => true,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
