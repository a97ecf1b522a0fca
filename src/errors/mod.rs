use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    // Feed errors
    #[error("Invalid feed URL: {0}")]
    InvalidUrl(String),

    // Network errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    // Parsing errors
    #[error("Feed parsing failed: {0}")]
    FeedParse(String),

    // Provider errors
    #[error("Translation failed: {0}")]
    Translation(String),

    #[error("Summarization failed: {0}")]
    Summarization(String),

    #[error("Connection test failed for {service}: {reason}")]
    ConnectionTest { service: String, reason: String },

    // Notification errors
    #[error("Notification failed: {0}")]
    Notification(String),

    #[error("Threaded delivery unavailable: {0}")]
    ThreadingUnsupported(String),

    // Channel errors from the slack library
    #[error("Slack error: {0}")]
    Channel(String),

    // Storage errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<slack_client::SlackError> for RelayError {
    fn from(err: slack_client::SlackError) -> Self {
        match err {
            slack_client::SlackError::MissingToken => {
                RelayError::ThreadingUnsupported(err.to_string())
            }
            other => RelayError::Channel(other.to_string()),
        }
    }
}

pub type RelayResult<T> = Result<T, RelayError>;
