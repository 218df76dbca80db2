use crate::{
    foundation::error::{FrameBlendError, FrameBlendResult},
    frame::MAX_PLANES,
};

/// Which planes are blended; the rest are passed through from the center frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaneSelector {
    process: [bool; MAX_PLANES],
}

impl PlaneSelector {
    pub fn all() -> Self {
        Self {
            process: [true; MAX_PLANES],
        }
    }

    /// Build from user plane indices. An empty list selects every plane.
    pub fn from_indices(indices: &[i64]) -> FrameBlendResult<Self> {
        if indices.is_empty() {
            return Ok(Self::all());
        }

        let mut process = [false; MAX_PLANES];
        for &i in indices {
            let Some(slot) = usize::try_from(i)
                .ok()
                .and_then(|i| process.get_mut(i))
            else {
                return Err(FrameBlendError::configuration(format!(
                    "plane index out of range: {i}"
                )));
            };
            if *slot {
                return Err(FrameBlendError::configuration(format!(
                    "plane specified twice: {i}"
                )));
            }
            *slot = true;
        }
        Ok(Self { process })
    }

    pub fn is_selected(&self, plane: usize) -> bool {
        self.process.get(plane).copied().unwrap_or(false)
    }

    pub fn mask(&self) -> [bool; MAX_PLANES] {
        self.process
    }

    /// Planes the output frame should alias from the center frame.
    pub fn share_mask(&self) -> [bool; MAX_PLANES] {
        self.process.map(|p| !p)
    }
}

impl Default for PlaneSelector {
    fn default() -> Self {
        Self::all()
    }
}
