#[derive(Debug, thiserror::Error)]
pub enum ConsentError {
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Unknown service: {0}")]
    UnknownService(String),

    #[error("Category {0} is required and cannot be forbidden")]
    RequiredCategory(String),

    #[error("Cookie storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Cookie value could not be decoded: {0}")]
    CookieDecode(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown bridge event: {0}")]
    UnknownBridgeEvent(String),

    #[error("Bridge payload for {event} could not be decoded: {reason}")]
    BridgePayload { event: String, reason: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("No localization present for locale {0}")]
    MissingLocalization(String),

    #[error("Invalid component parameters: {0}")]
    InvalidParameters(String),
}
