use std::fmt;

use crate::foundation::error::{FrameBlendError, FrameBlendResult};

/// Normalized blend weights for a sliding window of frames.
///
/// The window is centered on the requested frame, so the weight count is always odd.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightProfile {
    weights: Vec<f32>,
}

impl WeightProfile {
    /// Normalize `raw` so the weights sum to 1.0.
    ///
    /// A zero sum is not rejected: the resulting weights are non-finite and so is the blended
    /// output. A warning is logged instead.
    pub fn new(raw: &[f64]) -> FrameBlendResult<Self> {
        if raw.len() % 2 != 1 {
            return Err(FrameBlendError::configuration(
                "number of weights must be odd",
            ));
        }

        let total = raw.iter().map(|&w| w as f32).sum::<f32>();
        if total == 0.0 || !total.is_finite() {
            tracing::warn!(total, "weights do not have a finite non-zero sum");
        }

        let weights = raw.iter().map(|&w| (w / f64::from(total)) as f32).collect();
        Ok(Self { weights })
    }

    /// Number of frames in the window.
    pub fn size(&self) -> usize {
        self.weights.len()
    }

    /// Frames on each side of the center frame.
    pub fn radius(&self) -> usize {
        self.weights.len() / 2
    }

    pub fn weight(&self, i: usize) -> f32 {
        self.weights[i]
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }
}

impl fmt::Display for WeightProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, w) in self.weights.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{w:.6}")?;
        }
        f.write_str("]")
    }
}
