use std::path::Path;

use crate::{
    foundation::error::{FrameBlendError, FrameBlendResult},
    planes::PlaneSelector,
    weights::WeightProfile,
};

/// Construction-time options of a blend filter.
///
/// ```json
/// { "weights": [1, 2, 1], "planes": [0], "log": true }
/// ```
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlendConfig {
    /// Raw weights, odd count; normalized on construction.
    pub weights: Vec<f64>,
    /// Planes to blend. Empty means all.
    #[serde(default)]
    pub planes: Vec<i64>,
    /// Log the normalized weights when the filter is created.
    #[serde(default)]
    pub log: bool,
}

impl BlendConfig {
    pub fn new(weights: impl Into<Vec<f64>>) -> Self {
        Self {
            weights: weights.into(),
            ..Self::default()
        }
    }

    pub fn with_planes(mut self, planes: impl Into<Vec<i64>>) -> Self {
        self.planes = planes.into();
        self
    }

    pub fn from_json_str(s: &str) -> FrameBlendResult<Self> {
        serde_json::from_str(s).map_err(|e| FrameBlendError::configuration(format!("{e}")))
    }

    pub fn from_path(path: &Path) -> FrameBlendResult<Self> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| FrameBlendError::io(format!("read '{}': {e}", path.display())))?;
        Self::from_json_str(&s)
    }

    /// Build the immutable per-instance state.
    pub fn validate(&self) -> FrameBlendResult<(WeightProfile, PlaneSelector)> {
        if self.weights.iter().any(|w| !w.is_finite()) {
            return Err(FrameBlendError::configuration("weights must be finite"));
        }
        let profile = WeightProfile::new(&self.weights)?;
        let planes = PlaneSelector::from_indices(&self.planes)?;
        Ok((profile, planes))
    }
}
