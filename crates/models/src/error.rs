use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorShape {
    pub error_message: String,
    pub error_type: String,
}

#[derive(Error, Debug)]
pub enum BallastError {
    #[error("Invalid parameter: {reason}")]
    InvalidParameter { reason: String },

    #[error("Reservation too large: {requested_mb} MB (max: {max_mb})")]
    ReservationTooLarge { requested_mb: u64, max_mb: u64 },

    #[error("Allocation failed: {reason}")]
    AllocationFailed { reason: String },

    #[error("Configuration error: {reason}")]
    ConfigError { reason: String },

    #[error("Internal server error: {reason}")]
    InternalError { reason: String },
}

impl BallastError {
    pub fn to_error_shape(&self) -> ErrorShape {
        ErrorShape {
            error_message: self.to_string(),
            error_type: self.error_type().to_string(),
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            BallastError::InvalidParameter { .. } => "InvalidParameterValue",
            BallastError::ReservationTooLarge { .. } => "ReservationTooLarge",
            BallastError::AllocationFailed { .. } => "AllocationFailed",
            BallastError::ConfigError { .. } => "ConfigurationError",
            BallastError::InternalError { .. } => "ServiceError",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            BallastError::InvalidParameter { .. } => 400,
            BallastError::ReservationTooLarge { .. } => 400,
            BallastError::AllocationFailed { .. } => 507,
            BallastError::ConfigError { .. } => 500,
            BallastError::InternalError { .. } => 500,
        }
    }
}
