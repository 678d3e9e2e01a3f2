#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("embedding request failed with status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("empty response from {provider}")]
    EmptyResponse { provider: &'static str },

    #[error("provider returned {got} vectors for {expected} inputs")]
    BatchMismatch { expected: usize, got: usize },

    #[error("{0}")]
    Other(String),
}
