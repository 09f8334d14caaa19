/// Result alias that carries the custom [`PlayLinkError`] type.
pub type Result<T> = std::result::Result<T, PlayLinkError>;

/// Common error type for the core crate.
///
/// Nothing in the controller treats these as fatal: every operation that
/// returns an error leaves the previously published audio, animation data
/// and markers in place.
#[derive(Debug, thiserror::Error)]
pub enum PlayLinkError {
    /// Free-form failure reported by a collaborator or the host.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// The uploaded payload could not be parsed as WAV audio.
    #[error("failed to decode audio payload: {0}")]
    Wav(#[from] hound::Error),
    /// The base64 body of a data URL was malformed.
    #[error("failed to decode upload payload: {0}")]
    Base64(#[from] base64::DecodeError),
    /// Configuration and report documents are JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The upload was not a `data:` URL with a base64 body.
    #[error("malformed data URL: {0}")]
    DataUrl(&'static str),
    /// Decoded audio with a channel layout the frame contract cannot carry.
    #[error("unsupported channel count {0}; expected mono or stereo")]
    UnsupportedChannels(u16),
    /// Input failed a precondition checked by the core.
    #[error("{0}")]
    InvalidInput(&'static str),
}

impl PlayLinkError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for PlayLinkError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for PlayLinkError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
