//! frameblend is a temporal blending filter for planar video.
//!
//! Each output frame is a weighted average of a window of source frames centered on the
//! requested index, giving a motion-blur-like smoothing over time.
//!
//! # Pipeline overview
//!
//! 1. **Configure**: [`BlendConfig`] -> [`WeightProfile`] + [`PlaneSelector`] (validated once)
//! 2. **Declare**: [`BlendEngine::declare`] plans a [`WindowPlan`] and registers the needed
//!    indices with the [`FrameSupplier`] without waiting
//! 3. **Produce**: [`BlendEngine::produce`] fetches the window, blends the selected planes in an
//!    8- or 16-bit lane, and releases every fetched frame
//!
//! Near the ends of a source the window replicates the first or last frame instead of shrinking.
#![forbid(unsafe_code)]

mod foundation;

pub mod blend;
pub mod config;
pub mod engine;
pub mod frame;
pub mod io;
pub mod plan;
pub mod planes;
pub mod supplier;
pub mod weights;

pub use blend::{SampleLane, blend_frame};
pub use config::BlendConfig;
pub use engine::{BlendEngine, BlendThreading};
pub use foundation::core::{DEFAULT_INDEX_CEILING, FrameIndex, FrameRange};
pub use foundation::error::{FrameBlendError, FrameBlendResult};
pub use frame::{Frame, FrameFormat, MAX_PLANES, Plane};
pub use io::{load_frame, load_sequence, save_frame, save_sequence};
pub use plan::WindowPlan;
pub use planes::PlaneSelector;
pub use supplier::{ClipSupplier, FrameHandle, FrameSupplier, FrameWindow};
pub use weights::WeightProfile;
