use serde_json::Value;

use pizzeria::{stats::GameRunSubmission, GameMode};

use crate::error::ApiError;

fn invalid(msg: impl Into<String>) -> ApiError {
    ApiError::Validation(msg.into())
}

fn is_missing(body: &Value, field: &str) -> bool {
    matches!(body.get(field), None | Some(Value::Null))
}

// Numbers may also come in as numeric strings
fn as_number(value: Option<&Value>) -> Option<f64> {
    let n = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.filter(|n| n.is_finite())
}

fn non_negative(body: &Value, field: &str) -> Result<f64, ApiError> {
    match as_number(body.get(field)) {
        Some(n) if n >= 0.0 => Ok(n),
        _ => Err(invalid(format!("{} must be a valid positive number", field))),
    }
}

/// Checks a `POST /game-results` body. The error message names the first
/// offending field.
pub fn parse_submission(raw: &[u8]) -> Result<GameRunSubmission, ApiError> {
    let body: Value = serde_json::from_slice(raw)
        .map_err(|e| invalid(format!("Request body must be valid JSON: {}", e)))?;
    if !body.is_object() {
        return Err(invalid("Request body must be a JSON object"));
    }

    for field in ["totalTime", "averageTime"] {
        if is_missing(&body, field) {
            return Err(invalid(format!(
                "{} is required and must be a number (in seconds)",
                field
            )));
        }
    }
    let game_type = match body.get("gameType") {
        Some(Value::String(s)) if !s.is_empty() => s,
        _ => {
            return Err(invalid(
                "gameType is required and must be a string (multitask, singletask or wip)",
            ))
        }
    };
    let game_type: GameMode = game_type.parse().map_err(|_| {
        invalid("gameType must be one of \"multitask\", \"singletask\" or \"wip\"")
    })?;

    let total_time = non_negative(&body, "totalTime")?;
    let average_time = non_negative(&body, "averageTime")?;
    let average_wip = if is_missing(&body, "averageWIP") {
        None
    } else {
        match as_number(body.get("averageWIP")) {
            Some(n) if n >= 0.0 => Some(n),
            _ => return Err(invalid("averageWIP must be a valid non-negative number")),
        }
    };

    Ok(GameRunSubmission {
        total_time,
        average_time,
        game_type,
        average_wip,
    })
}
