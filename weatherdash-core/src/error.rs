use std::fmt;

use thiserror::Error;

/// A single field that failed its declared bound.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Errors surfaced by the dashboard library.
///
/// Payloads are plain strings so the same failure can be handed to every
/// subscriber of a shared request.
#[derive(Debug, Clone, Error)]
pub enum DashboardError {
    /// A response did not match the expected JSON shape.
    #[error("Response did not match the expected schema: {0}")]
    SchemaViolation(String),

    /// The request could not complete, or a read endpoint answered non-2xx.
    #[error("Network request failed: {0}")]
    NetworkFailure(String),

    /// User input lies outside its declared bounds.
    #[error("Invalid input: {}", join_fields(.0))]
    Validation(Vec<FieldError>),

    /// The backend answered a prediction submit with an error status.
    #[error("Prediction rejected with status {status}: {body}")]
    PredictionRejected { status: u16, body: String },

    #[error("Invalid date range: {0}")]
    InvalidDateRange(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A form operation was called outside an open session.
    #[error("Prediction form is not open")]
    FormClosed,

    #[error("{form} form has no field '{field}'")]
    UnknownField { form: String, field: String },

    /// A one-shot action is already in flight.
    #[error("Request already in progress")]
    Busy,
}

impl DashboardError {
    pub fn schema(message: impl fmt::Display) -> Self {
        Self::SchemaViolation(message.to_string())
    }

    pub fn network(message: impl fmt::Display) -> Self {
        Self::NetworkFailure(message.to_string())
    }

    /// Field errors carried by a `Validation` failure, empty otherwise.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::Validation(errors) => errors,
            _ => &[],
        }
    }
}

impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        Self::NetworkFailure(err.to_string())
    }
}

pub type Result<T, E = DashboardError> = std::result::Result<T, E>;

fn join_fields(errors: &[FieldError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let cut = (0..=MAX).rev().find(|i| body.is_char_boundary(*i)).unwrap_or(0);
        format!("{}...", &body[..cut])
    } else {
        body.to_string()
    }
}
