use serde::Deserialize;
use thiserror::Error;

/// Errors returned by the Replicate API or by a prediction it ran
#[derive(Debug, Error)]
pub enum ReplicateError {
    #[error("Authentication error (401): {detail}")]
    Authentication { detail: String },

    #[error("Payment required (402): {detail}")]
    PaymentRequired { detail: String },

    #[error("Not found (404): {detail}")]
    NotFound { detail: String },

    #[error("Invalid input (422): {detail}")]
    InvalidInput { detail: String },

    #[error("Rate limit exceeded (429): {detail}")]
    RateLimit { detail: String },

    /// Catch-all for unexpected status codes
    #[error("Unexpected API error ({status}): {detail}")]
    Unexpected { status: u16, detail: String },

    #[error("Prediction {id} failed: {message}")]
    PredictionFailed { id: String, message: String },

    #[error("Prediction {id} was canceled")]
    PredictionCanceled { id: String },

    #[error("Prediction {id} has no polling URL")]
    MissingPollUrl { id: String },
}

#[derive(Deserialize)]
struct Problem {
    detail: String,
}

impl ReplicateError {
    /// Maps an error response to a variant, using the `detail` of a problem body if there is one.
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<Problem>(body)
            .map(|p| p.detail)
            .unwrap_or_else(|_| body.trim().to_string());

        match status {
            401 => Self::Authentication { detail },
            402 => Self::PaymentRequired { detail },
            404 => Self::NotFound { detail },
            422 => Self::InvalidInput { detail },
            429 => Self::RateLimit { detail },
            status => Self::Unexpected { status, detail },
        }
    }
}
