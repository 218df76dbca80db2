use crate::foundation::error::{FrameBlendError, FrameBlendResult};

/// Index ceiling used for sources that do not report a length.
///
/// Mirrors the host's signed 32-bit frame numbers: the last addressable index is
/// `DEFAULT_INDEX_CEILING - 1`.
pub const DEFAULT_INDEX_CEILING: u64 = i32::MAX as u64;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameRange {
    pub start: FrameIndex,
    pub end: FrameIndex, // exclusive
}

impl FrameRange {
    pub fn new(start: FrameIndex, end: FrameIndex) -> FrameBlendResult<Self> {
        if start.0 > end.0 {
            return Err(FrameBlendError::configuration(
                "FrameRange start must be <= end",
            ));
        }
        Ok(Self { start, end })
    }

    pub fn len_frames(self) -> u64 {
        self.end.0.saturating_sub(self.start.0)
    }

    pub fn is_empty(self) -> bool {
        self.start.0 == self.end.0
    }

    pub fn contains(self, f: FrameIndex) -> bool {
        self.start.0 <= f.0 && f.0 < self.end.0
    }
}
