use crate::registration::RegistrationField;

/// Result alias that carries the custom [`TechXError`] type.
pub type Result<T> = std::result::Result<T, TechXError>;

/// Common error type for the core crate.
///
/// None of these are fatal: every operation that returns one leaves the
/// originating component usable.
#[derive(Debug, thiserror::Error)]
pub enum TechXError {
    /// An argument fell outside the accepted domain, e.g. a volume above 1.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The operation is not allowed in the component's current state.
    #[error("illegal state: {0}")]
    IllegalState(&'static str),
    /// The host refused to start playback without a user gesture.
    #[error("playback blocked by host policy")]
    PlaybackBlocked,
    /// The audio source cannot be reached or decoded.
    #[error("audio resource unavailable: {0}")]
    ResourceUnavailable(String),
    #[error("missing field `{0}`")]
    MissingField(RegistrationField),
    #[error("invalid email address")]
    InvalidEmail,
    #[error("phone number must be exactly 10 digits")]
    InvalidPhone,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl TechXError {
    /// Returns true for expected outcomes that should be logged but not shown
    /// to the user as a failure.
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::PlaybackBlocked)
    }
}
