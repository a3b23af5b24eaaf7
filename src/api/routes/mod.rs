//! API route modules.

pub mod recording;
pub mod token;

use serde::Deserialize;

use crate::api::error::{ApiError, ApiResult};

/// A user id sent either as a JSON string or a JSON number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum UidParam {
    Text(String),
    Number(serde_json::Number),
}

impl UidParam {
    /// Decimal rendering; `None` for numbers with a fractional part.
    pub fn render(&self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text.clone()),
            Self::Number(number) => {
                if let Some(n) = number.as_u64() {
                    Some(n.to_string())
                } else if let Some(n) = number.as_i64() {
                    Some(n.to_string())
                } else {
                    number
                        .as_f64()
                        .filter(|n| n.is_finite() && n.fract() == 0.0)
                        .map(|n| format!("{:.0}", n))
                }
            }
        }
    }
}

/// Unwrap a required body field, rejecting missing and empty values.
pub(crate) fn required(value: Option<String>, field: &str) -> ApiResult<String> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ApiError::bad_request(format!("{} is required", field))),
    }
}

pub(crate) fn required_uid(uid: Option<UidParam>) -> ApiResult<String> {
    let rendered = match uid {
        Some(uid) => Some(
            uid.render()
                .ok_or_else(|| ApiError::bad_request("uid must be a string or a whole number"))?,
        ),
        None => None,
    };
    required(rendered, "uid")
}
