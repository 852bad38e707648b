//! Errors for the host-facing configuration surface.
//!
//! Simulation commands never fail: unknown ids and invalid fields are no-ops.

use std::fmt;

#[derive(Debug)]
pub enum SimError {
    /// Config JSON could not be parsed.
    Json(serde_json::Error),
    /// Config parsed but a field is out of range.
    InvalidConfig(&'static str),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::Json(e) => write!(f, "invalid config json: {e}"),
            SimError::InvalidConfig(field) => write!(f, "invalid config field: {field}"),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::Json(e) => Some(e),
            SimError::InvalidConfig(_) => None,
        }
    }
}

impl From<serde_json::Error> for SimError {
    fn from(e: serde_json::Error) -> Self {
        SimError::Json(e)
    }
}
