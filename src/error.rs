// Error types shared by the HTTP wrapper, the API modules and the flows

use thiserror::Error;

pub const NETWORK_PROBLEM_MESSAGE: &str = "Network problem, please try again in a moment.";

// Errors surfaced by any call that goes through the HTTP client
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    // Already handled by the client: the session is cleared and the user sent to login.
    #[error("Unauthorized")]
    Unauthorized,

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl ApiError {
    /// Text a UI should show for this failure.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) => NETWORK_PROBLEM_MESSAGE.to_string(),
            ApiError::Unauthorized => "Your session has expired, please log in again.".to_string(),
            ApiError::Api { message, .. } => message.clone(),
            ApiError::Decode(_) => "Unexpected response from the server.".to_string(),
            ApiError::Validation(err) => err.to_string(),
            ApiError::Storage(_) => "Could not access saved data on this device.".to_string(),
        }
    }

    // True when the HTTP wrapper already dealt with the failure globally
    pub fn is_handled(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            ApiError::Unauthorized => Some(401),
            _ => None,
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::Storage(err.to_string())
    }
}

// Client-side checks that block a request before it is sent
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please fill in all required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Password must be at least {0} characters long")]
    PasswordTooShort(usize),

    #[error("Please fill in all credit card details")]
    MissingCardDetails,

    #[error("Invalid card number")]
    InvalidCardNumber,

    #[error("Card expiry must be in MM/YY format")]
    InvalidCardExpiry,

    #[error("Invalid card security code")]
    InvalidCardCvc,

    #[error("Please select a future date")]
    DateInPast,

    #[error("End date must not be before start date")]
    DateRangeInverted,

    #[error("Invalid date or time: {0}")]
    InvalidDateTime(String),

    #[error("At least {min} guests are required")]
    TooFewGuests { min: u32 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Corrupt value under {key}: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialize(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Initialization error: {0}")]
    InitError(String),
}
