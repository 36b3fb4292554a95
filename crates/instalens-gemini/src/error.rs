use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("GEMINI_API_KEY is not configured")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gemini API returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("image download from {url} failed with status {status}")]
    ImageFetch { url: String, status: u16 },

    #[error("image at {url} exceeds {limit_bytes} bytes")]
    ImageTooLarge { url: String, limit_bytes: usize },

    #[error("gemini response contained no text")]
    EmptyResponse,

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}
