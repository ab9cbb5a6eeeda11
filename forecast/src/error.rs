use thiserror::Error;

pub type Result<T> = std::result::Result<T, ForecastError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: &'static str },

    #[error("insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("model has not been fitted")]
    NotFitted,

    #[error("unknown model: {0}")]
    UnknownModel(String),
}
