use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The server answered 401; the stored token has been cleared.
    #[error("authentication required")]
    Unauthorized,

    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}
