use thiserror::Error;

/// Centralized error types for the application
///
/// Settings persistence, remote sync and download-API calls all convert into
/// this enum. Uses `thiserror` for automatic conversion and display formatting.
///
/// # Example
///
/// ```no_run
/// use hybridbot::core::error::AppError;
///
/// fn handle_error(err: AppError) {
///     eprintln!("Error: {}", err);
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP/Fetch errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP status code errors
    #[error("HTTP request failed with status: {0}")]
    HttpStatus(reqwest::StatusCode),

    /// URL parsing errors
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// Snapshot could not be written or renamed into place
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Remote config provider call failed
    #[error("Remote sync error: {0}")]
    RemoteSync(String),

    /// No media (or no matching field) in a download API response
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Anyhow errors (for general error handling)
    #[error("Application error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// True for failures a caller may reasonably retry later (timeouts, 5xx).
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Http(e) => e.is_timeout() || e.is_connect(),
            AppError::HttpStatus(status) => status.is_server_error(),
            AppError::RemoteSync(_) => true,
            _ => false,
        }
    }
}
