/// Result alias that carries the custom [`ShowError`] type.
pub type Result<T> = std::result::Result<T, ShowError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum ShowError {
    /// Free-form message for failures without a dedicated variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// The configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
    /// A playback backend refused to start a cue or clip. Show-time callers
    /// log this and carry on.
    #[error("playback of `{source_path}` was rejected: {reason}")]
    PlaybackRejected { source_path: String, reason: String },
    /// An asset id that the store does not know about.
    #[error("unknown asset `{0}`")]
    UnknownAsset(String),
    /// The component the request was aimed at is not mounted.
    #[error("{0} is not mounted")]
    NotMounted(&'static str),
}

impl ShowError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub fn rejected(source_path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PlaybackRejected {
            source_path: source_path.into(),
            reason: reason.into(),
        }
    }
}

impl From<&str> for ShowError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for ShowError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
