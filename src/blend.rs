use crate::{
    foundation::error::{FrameBlendError, FrameBlendResult},
    frame::{Frame, FrameFormat, MAX_PLANES, Plane},
    planes::PlaneSelector,
    weights::WeightProfile,
};

/// Integer sample type a plane is blended in.
pub trait Sample: Copy {
    const BYTES: usize;

    fn read(bytes: &[u8]) -> f32;

    fn write(bytes: &mut [u8], value: u32);
}

impl Sample for u8 {
    const BYTES: usize = 1;

    fn read(bytes: &[u8]) -> f32 {
        f32::from(bytes[0])
    }

    fn write(bytes: &mut [u8], value: u32) {
        bytes[0] = value as u8;
    }
}

impl Sample for u16 {
    const BYTES: usize = 2;

    fn read(bytes: &[u8]) -> f32 {
        f32::from(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn write(bytes: &mut [u8], value: u32) {
        bytes[..2].copy_from_slice(&(value as u16).to_le_bytes());
    }
}

/// Numeric lane picked from a frame's sample width.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleLane {
    U8,
    U16,
}

impl SampleLane {
    pub fn for_format(format: FrameFormat) -> FrameBlendResult<Self> {
        match format.bytes_per_sample {
            1 => Ok(Self::U8),
            2 => Ok(Self::U16),
            other => Err(FrameBlendError::unsupported_format(format!(
                "{other} bytes per sample ({} bits); only 8- and 16-bit integer samples can be blended",
                format.bits_per_sample
            ))),
        }
    }
}

/// Weighted sum of co-located samples across `srcs`, written into `dst`.
///
/// Accumulates in `f32` in window order, truncates toward zero, then clamps into `[0, max]`.
pub fn blend_plane<T: Sample>(srcs: &[&Plane], dst: &mut Plane, weights: &[f32], max: u32) {
    debug_assert_eq!(srcs.len(), weights.len());
    let (width, height, stride) = (dst.width() as usize, dst.height() as usize, dst.stride());
    let out = dst.data_mut();

    for y in 0..height {
        let out_row = &mut out[y * stride * T::BYTES..][..width * T::BYTES];
        for (x, px) in out_row.chunks_exact_mut(T::BYTES).enumerate() {
            let mut acc = 0.0f32;
            for (src, &w) in srcs.iter().zip(weights) {
                let at = (y * src.stride() + x) * T::BYTES;
                acc += T::read(&src.data()[at..at + T::BYTES]) * w;
            }
            let v = (acc as i64).clamp(0, i64::from(max));
            T::write(px, v as u32);
        }
    }
}

/// Blend a full window into a new frame.
///
/// The center entry of `window` supplies format, dimensions and every unselected plane.
/// `allocate` builds the output from the center frame and a per-plane share mask.
pub fn blend_frame(
    window: &[&Frame],
    profile: &WeightProfile,
    planes: &PlaneSelector,
    allocate: impl FnOnce(&Frame, [bool; MAX_PLANES]) -> Frame,
) -> FrameBlendResult<Frame> {
    if window.len() != profile.size() {
        return Err(FrameBlendError::configuration(format!(
            "window holds {} frames but there are {} weights",
            window.len(),
            profile.size()
        )));
    }
    let center = window[window.len() / 2];
    let format = center.format();

    if window.iter().any(|f| !f.same_layout(center)) {
        return Err(FrameBlendError::unsupported_format(
            "window frames differ in format or dimensions",
        ));
    }

    let selected: Vec<usize> = (0..center.num_planes())
        .filter(|&p| planes.is_selected(p))
        .collect();
    if selected.is_empty() {
        return Ok(allocate(center, planes.share_mask()));
    }

    let lane = SampleLane::for_format(format).inspect_err(|e| {
        tracing::error!(
            bytes_per_sample = format.bytes_per_sample,
            bits_per_sample = format.bits_per_sample,
            "{e}"
        );
    })?;
    let max = u32::try_from(format.max_value()).unwrap_or(u32::MAX);

    let mut dst = allocate(center, planes.share_mask());
    for p in selected {
        let srcs: Vec<&Plane> = window.iter().map(|f| f.plane(p)).collect();
        let out = dst.plane_mut(p);
        match lane {
            SampleLane::U8 => blend_plane::<u8>(&srcs, out, profile.weights(), max),
            SampleLane::U16 => blend_plane::<u16>(&srcs, out, profile.weights(), max),
        }
    }
    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(format: FrameFormat, v: u64) -> Frame {
        Frame::filled(format, 4, 2, v).unwrap()
    }

    fn run(window: &[Frame], weights: &[f64], planes: &PlaneSelector) -> FrameBlendResult<Frame> {
        let profile = WeightProfile::new(weights).unwrap();
        let refs: Vec<&Frame> = window.iter().collect();
        blend_frame(&refs, &profile, planes, Frame::new_sharing)
    }

    #[test]
    fn uniform_three_tap_is_the_mean() {
        let f = FrameFormat::gray8();
        let out = run(
            &[gray(f, 10), gray(f, 20), gray(f, 30)],
            &[1.0, 1.0, 1.0],
            &PlaneSelector::all(),
        )
        .unwrap();
        assert!(out.plane(0).data().iter().all(|&b| b == 20));
    }

    #[test]
    fn single_weight_is_identity_for_both_lanes() {
        for (f, v) in [(FrameFormat::rgb8(), 201u64), (FrameFormat::rgb16(), 40_001)] {
            let mut src = Frame::filled(f, 3, 2, v).unwrap();
            src.set_sample(1, 2, 1, 17);
            let out = run(std::slice::from_ref(&src), &[1.0], &PlaneSelector::all()).unwrap();
            for p in 0..3 {
                assert_eq!(out.plane(p).data(), src.plane(p).data());
            }
        }
    }

    #[test]
    fn result_saturates_at_bit_depth_max() {
        let f = FrameFormat::gray8();
        let out = run(
            &[gray(f, 0), gray(f, 250), gray(f, 0)],
            &[-2.0, 5.0, -2.0],
            &PlaneSelector::all(),
        )
        .unwrap();
        assert!(out.plane(0).data().iter().all(|&b| b == 255));

        let f = FrameFormat::yuv420p10();
        let out = run(
            &[
                Frame::filled(f, 4, 2, 1000).unwrap(),
                Frame::filled(f, 4, 2, 1000).unwrap(),
                Frame::filled(f, 4, 2, 0).unwrap(),
            ],
            &[2.0, 2.0, -3.0],
            &PlaneSelector::all(),
        )
        .unwrap();
        assert_eq!(out.sample(0, 0, 0), 1023);
    }

    #[test]
    fn negative_sums_clamp_to_zero() {
        let f = FrameFormat::gray16();
        let out = run(
            &[gray(f, 60_000), gray(f, 0), gray(f, 60_000)],
            &[-2.0, 5.0, -2.0],
            &PlaneSelector::all(),
        )
        .unwrap();
        assert_eq!(out.sample(0, 3, 1), 0);
    }

    #[test]
    fn truncates_toward_zero() {
        let f = FrameFormat::gray8();
        let out = run(
            &[gray(f, 0), gray(f, 1), gray(f, 2)],
            &[1.0, 1.0, 2.0],
            &PlaneSelector::all(),
        )
        .unwrap();
        // 0*0.25 + 1*0.25 + 2*0.5 = 1.25
        assert_eq!(out.sample(0, 0, 0), 1);
    }

    #[test]
    fn unselected_planes_come_from_the_center_frame() {
        let f = FrameFormat::rgb8();
        let window = [gray(f, 10), gray(f, 50), gray(f, 90)];
        let out = run(
            &window,
            &[1.0, 0.0, 1.0],
            &PlaneSelector::from_indices(&[0]).unwrap(),
        )
        .unwrap();
        assert_eq!(out.sample(0, 0, 0), 50);
        assert_eq!(out.sample(1, 0, 0), 50);
        assert!(out.shares_plane_with(&window[1], 1));
        assert!(out.shares_plane_with(&window[1], 2));
        assert!(!out.shares_plane_with(&window[1], 0));
    }

    #[test]
    fn unsupported_width_produces_no_frame() {
        let f = FrameFormat::new(32, 4, 1, 0, 0).unwrap();
        let err = run(&[gray(f, 1)], &[1.0], &PlaneSelector::all()).unwrap_err();
        assert!(matches!(err, FrameBlendError::UnsupportedFormat(_)));
    }

    #[test]
    fn mismatched_window_is_rejected() {
        let a = gray(FrameFormat::gray8(), 1);
        let b = Frame::filled(FrameFormat::gray8(), 2, 2, 1).unwrap();
        let err = run(&[a.clone(), b, a], &[1.0, 1.0, 1.0], &PlaneSelector::all()).unwrap_err();
        assert!(matches!(err, FrameBlendError::UnsupportedFormat(_)));
    }

    #[test]
    fn lane_follows_bytes_per_sample() {
        assert_eq!(
            SampleLane::for_format(FrameFormat::yuv420p10()).unwrap(),
            SampleLane::U16
        );
        assert_eq!(
            SampleLane::for_format(FrameFormat::gray8()).unwrap(),
            SampleLane::U8
        );
    }
}
