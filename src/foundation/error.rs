/// Convenience result type used across frameblend.
pub type FrameBlendResult<T> = Result<T, FrameBlendError>;

/// Top-level error taxonomy used by filter APIs.
#[derive(thiserror::Error, Debug)]
pub enum FrameBlendError {
    /// Invalid construction-time parameters (weights, planes, source).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A frame whose sample layout the blend lanes cannot handle.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The upstream frame supplier could not deliver a frame.
    #[error("frame supplier error: {0}")]
    Supplier(String),

    /// Reading or writing image sequences.
    #[error("io error: {0}")]
    Io(String),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FrameBlendError {
    /// Build a [`FrameBlendError::Configuration`] value.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Build a [`FrameBlendError::UnsupportedFormat`] value.
    pub fn unsupported_format(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    /// Build a [`FrameBlendError::Supplier`] value.
    pub fn supplier(msg: impl Into<String>) -> Self {
        Self::Supplier(msg.into())
    }

    /// Build a [`FrameBlendError::Io`] value.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }
}
