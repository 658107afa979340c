use thiserror::Error;

/// Errors raised while decoding trace records or building replay commands.
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Failed to decode record body: {0}")]
    BodyDecode(#[from] serde_json::Error),

    #[error("Invalid {field} value: {value:?}")]
    InvalidField { field: &'static str, value: String },

    #[error("Record has no method to replay")]
    MissingMethod,
}
