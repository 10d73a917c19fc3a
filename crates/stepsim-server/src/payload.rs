//! Decoding of state submissions posted by simulators.

use serde_json::Value;
use stepsim_core::{ActivityStatus, StepState};

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("Body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Body must be a JSON object")]
    NotAnObject,

    #[error("Invalid status: {0}")]
    Status(String),
}

/// Decode a `{steps?, status?}` submission into a state stamped now.
///
/// An empty body counts as `{}`. Non-numeric or missing `steps` reads as 0,
/// fractions are truncated and negatives clamp to 0. Missing or `null`
/// status reads as IDLE; any other non-status value is rejected.
pub fn parse_submission(body: &[u8]) -> Result<StepState, PayloadError> {
    let value: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Object(Default::default())
    } else {
        serde_json::from_slice(body)?
    };
    let fields = value.as_object().ok_or(PayloadError::NotAnObject)?;

    let steps = match fields.get("steps") {
        Some(Value::Number(n)) => match (n.as_u64(), n.as_f64()) {
            (Some(u), _) => u,
            (None, Some(f)) if f.is_finite() && f > 0.0 => f.trunc() as u64,
            _ => 0,
        },
        _ => 0,
    };

    let status = match fields.get("status") {
        None | Some(Value::Null) => ActivityStatus::Idle,
        Some(Value::String(s)) => s.parse().map_err(PayloadError::Status)?,
        Some(other) => return Err(PayloadError::Status(other.to_string())),
    };

    Ok(StepState::new(steps, status))
}
