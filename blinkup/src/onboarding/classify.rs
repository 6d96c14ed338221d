//! Classification of the free-text errors reported by the SDK controller.
//!
//! The SDK reports token acquisition failures as a plain message. The only signal that the
//! API key was rejected is the HTTP status embedded in that message, so classification is a
//! substring match. This is fragile and must stay confined to this module.

/// Marker of an authentication failure in a token acquisition error message.
const UNAUTHORIZED_STATUS: &str = "401";

/// Operator message shown when the API key is rejected.
pub const INVALID_API_KEY_MESSAGE: &str = "Error. Invalid BlinkUp API key.";

/// A classified token acquisition error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The remote service rejected the API key
    InvalidApiKey,
    /// Anything else, with the SDK's message
    Other(String),
}

impl TokenError {
    /// Text shown to the operator through the message display.
    #[must_use]
    pub fn operator_message(&self) -> String {
        match self {
            Self::InvalidApiKey => INVALID_API_KEY_MESSAGE.to_string(),
            Self::Other(message) => format!("Error. {message}"),
        }
    }
}

/// Classifies a token acquisition error message.
#[must_use]
pub fn classify_token_error(message: &str) -> TokenError {
    if message.contains(UNAUTHORIZED_STATUS) {
        TokenError::InvalidApiKey
    } else {
        TokenError::Other(message.to_string())
    }
}
