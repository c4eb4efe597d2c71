use thiserror::Error;

/// Why a request was turned away. A rejected check leaves the limiter
/// untouched.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitError {
    #[error("session token is missing or unknown")]
    InvalidToken,

    #[error("token is still cooling down")]
    UserRateLimited,

    #[error("global request quota exhausted")]
    SystemRateLimited
}

impl RateLimitError {
    /// Text suitable for showing to the end user.
    pub fn user_message(&self) -> &'static str {
        match self {
            RateLimitError::InvalidToken => "Your session has expired. Please refresh the page to continue.",
            RateLimitError::UserRateLimited => "You are sending requests too quickly. Please wait a moment and try again.",
            RateLimitError::SystemRateLimited => "The service is busy right now. Please try again later."
        }
    }
}
