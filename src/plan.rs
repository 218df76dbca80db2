use std::ops::RangeInclusive;

use crate::foundation::{
    core::FrameIndex,
    error::{FrameBlendError, FrameBlendResult},
};

/// Source frames needed to produce one output frame.
///
/// `first_needed..=last_needed` is what gets declared upstream before any fetch. `window` is the
/// fetch order, one entry per weight, with out-of-range positions replicated from the nearest
/// valid frame.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct WindowPlan {
    pub requested: FrameIndex,
    pub first_needed: FrameIndex,
    pub last_needed: FrameIndex,
    pub window: Vec<FrameIndex>,
}

impl WindowPlan {
    /// Plan the window for output frame `n`.
    ///
    /// `ceiling` is one past the last index the source can deliver.
    pub fn new(n: FrameIndex, radius: usize, ceiling: u64) -> FrameBlendResult<Self> {
        if ceiling == 0 {
            return Err(FrameBlendError::supplier("source has no frames"));
        }
        let last_valid = ceiling - 1;
        let half = radius as u64;

        let last = n.0.saturating_add(half).min(last_valid);
        let first = n.0.saturating_sub(half).min(last);

        let size = 2 * radius + 1;
        let mut window = Vec::with_capacity(size);
        let mut cursor = i128::from(n.0) - i128::from(half);
        for _ in 0..size {
            let idx = cursor.clamp(0, i128::from(last_valid)) as u64;
            window.push(FrameIndex(idx));
            if cursor < i128::from(last_valid) {
                cursor += 1;
            }
        }

        Ok(Self {
            requested: n,
            first_needed: FrameIndex(first),
            last_needed: FrameIndex(last),
            window,
        })
    }

    /// Inclusive range of indices to declare upstream.
    pub fn declared(&self) -> RangeInclusive<u64> {
        self.first_needed.0..=self.last_needed.0
    }

    pub fn window(&self) -> &[FrameIndex] {
        &self.window
    }

    /// Position of the center frame within [`WindowPlan::window`].
    pub fn center_slot(&self) -> usize {
        self.window.len() / 2
    }

    pub fn center(&self) -> FrameIndex {
        self.window[self.center_slot()]
    }
}
