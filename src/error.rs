use crate::FrameId;

/// Frame replacement error.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum EvictError {
    /// Frame id is outside the range watched by the replacer.
    #[error("Invalid frame id: {0}")]
    InvalidFrameId(FrameId),

    /// Trying to remove a pinned frame.
    #[error("Trying to remove pinned frame: {0}")]
    PinnedFrameRemoval(FrameId),
}

/// Frame replacement result type.
pub type EvictResult<T> = Result<T, EvictError>;
