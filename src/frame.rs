use std::sync::Arc;

use crate::foundation::error::{FrameBlendError, FrameBlendResult};

/// Maximum number of planes a frame carries.
pub const MAX_PLANES: usize = 3;

/// Sample layout of a planar frame.
///
/// `sub_w`/`sub_h` are log2 subsampling factors applied to planes 1 and 2.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct FrameFormat {
    pub bits_per_sample: u8,
    pub bytes_per_sample: u8,
    pub num_planes: u8,
    pub sub_w: u8,
    pub sub_h: u8,
}

impl FrameFormat {
    pub fn new(
        bits_per_sample: u8,
        bytes_per_sample: u8,
        num_planes: u8,
        sub_w: u8,
        sub_h: u8,
    ) -> FrameBlendResult<Self> {
        if bytes_per_sample == 0 || bytes_per_sample > 8 {
            return Err(FrameBlendError::configuration(
                "bytes_per_sample must be in 1..=8",
            ));
        }
        if bits_per_sample == 0 || u32::from(bits_per_sample) > 8 * u32::from(bytes_per_sample) {
            return Err(FrameBlendError::configuration(
                "bits_per_sample must fit in bytes_per_sample",
            ));
        }
        if num_planes == 0 || usize::from(num_planes) > MAX_PLANES {
            return Err(FrameBlendError::configuration(
                "num_planes must be in 1..=3",
            ));
        }
        if sub_w > 4 || sub_h > 4 {
            return Err(FrameBlendError::configuration(
                "chroma subsampling must be <= 4",
            ));
        }
        Ok(Self {
            bits_per_sample,
            bytes_per_sample,
            num_planes,
            sub_w,
            sub_h,
        })
    }

    pub const fn gray8() -> Self {
        Self::packed(8, 1, 1, 0, 0)
    }

    pub const fn gray16() -> Self {
        Self::packed(16, 2, 1, 0, 0)
    }

    pub const fn rgb8() -> Self {
        Self::packed(8, 1, 3, 0, 0)
    }

    pub const fn rgb16() -> Self {
        Self::packed(16, 2, 3, 0, 0)
    }

    pub const fn yuv420p8() -> Self {
        Self::packed(8, 1, 3, 1, 1)
    }

    pub const fn yuv420p10() -> Self {
        Self::packed(10, 2, 3, 1, 1)
    }

    pub const fn yuv444p16() -> Self {
        Self::packed(16, 2, 3, 0, 0)
    }

    const fn packed(bits: u8, bytes: u8, planes: u8, sub_w: u8, sub_h: u8) -> Self {
        Self {
            bits_per_sample: bits,
            bytes_per_sample: bytes,
            num_planes: planes,
            sub_w,
            sub_h,
        }
    }

    /// Largest representable sample value, `2^bits - 1`.
    pub fn max_value(self) -> u64 {
        (1u64 << self.bits_per_sample.min(63)) - 1
    }

    pub fn planes(self) -> usize {
        usize::from(self.num_planes)
    }

    /// Dimensions of `plane` for a frame of `width` x `height`.
    pub fn plane_dims(self, plane: usize, width: u32, height: u32) -> (u32, u32) {
        if plane == 0 {
            (width, height)
        } else {
            (width >> self.sub_w, height >> self.sub_h)
        }
    }
}

/// One sample buffer of a frame.
///
/// Samples are stored little-endian, `bytes_per_sample` bytes each. Cloning a plane aliases the
/// same buffer; writes go through [`Plane::data_mut`], which detaches a shared buffer first.
#[derive(Clone, Debug)]
pub struct Plane {
    width: u32,
    height: u32,
    stride: usize,
    bytes_per_sample: usize,
    data: Arc<Vec<u8>>,
}

impl Plane {
    fn blank(width: u32, height: u32, bytes_per_sample: usize) -> Self {
        let stride = width as usize;
        Self {
            width,
            height,
            stride,
            bytes_per_sample,
            data: Arc::new(vec![0u8; stride * height as usize * bytes_per_sample]),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row pitch in samples.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn bytes_per_sample(&self) -> usize {
        self.bytes_per_sample
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        Arc::make_mut(&mut self.data).as_mut_slice()
    }

    pub fn sample(&self, x: u32, y: u32) -> u64 {
        let at = self.offset(x, y);
        let mut v = 0u64;
        for (i, &b) in self.data[at..at + self.bytes_per_sample].iter().enumerate() {
            v |= u64::from(b) << (8 * i);
        }
        v
    }

    pub fn set_sample(&mut self, x: u32, y: u32, value: u64) {
        let at = self.offset(x, y);
        let bps = self.bytes_per_sample;
        let data = self.data_mut();
        for (i, b) in data[at..at + bps].iter_mut().enumerate() {
            *b = (value >> (8 * i)) as u8;
        }
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.stride + x as usize) * self.bytes_per_sample
    }
}

/// A planar video frame.
#[derive(Clone, Debug)]
pub struct Frame {
    format: FrameFormat,
    width: u32,
    height: u32,
    planes: Vec<Plane>,
}

impl Frame {
    /// Allocate a zeroed frame.
    pub fn blank(format: FrameFormat, width: u32, height: u32) -> FrameBlendResult<Self> {
        if width == 0 || height == 0 {
            return Err(FrameBlendError::configuration(
                "frame dimensions must be non-zero",
            ));
        }
        if !width.is_multiple_of(1 << format.sub_w) || !height.is_multiple_of(1 << format.sub_h) {
            return Err(FrameBlendError::configuration(
                "frame dimensions must be divisible by the chroma subsampling",
            ));
        }
        let planes = (0..format.planes())
            .map(|p| {
                let (w, h) = format.plane_dims(p, width, height);
                Plane::blank(w, h, usize::from(format.bytes_per_sample))
            })
            .collect();
        Ok(Self {
            format,
            width,
            height,
            planes,
        })
    }

    /// Allocate a frame with every sample of every plane set to `value`.
    pub fn filled(
        format: FrameFormat,
        width: u32,
        height: u32,
        value: u64,
    ) -> FrameBlendResult<Self> {
        let mut frame = Self::blank(format, width, height)?;
        for plane in &mut frame.planes {
            let bps = plane.bytes_per_sample;
            let pattern: Vec<u8> = (0..bps).map(|i| (value >> (8 * i)) as u8).collect();
            for chunk in plane.data_mut().chunks_exact_mut(bps) {
                chunk.copy_from_slice(&pattern);
            }
        }
        Ok(frame)
    }

    /// Build a frame from raw little-endian plane buffers.
    pub fn from_planes(
        format: FrameFormat,
        width: u32,
        height: u32,
        data: Vec<Vec<u8>>,
    ) -> FrameBlendResult<Self> {
        let mut frame = Self::blank(format, width, height)?;
        if data.len() != frame.planes.len() {
            return Err(FrameBlendError::configuration(format!(
                "expected {} plane buffers, got {}",
                frame.planes.len(),
                data.len()
            )));
        }
        for (i, (plane, bytes)) in frame.planes.iter_mut().zip(data).enumerate() {
            if bytes.len() != plane.data.len() {
                return Err(FrameBlendError::configuration(format!(
                    "plane {i} buffer has {} bytes, expected {}",
                    bytes.len(),
                    plane.data.len()
                )));
            }
            plane.data = Arc::new(bytes);
        }
        Ok(frame)
    }

    /// Allocate an output frame shaped like `reference`.
    ///
    /// Planes flagged in `share` alias the reference's buffers; the rest are blank and owned by
    /// the new frame.
    pub fn new_sharing(reference: &Frame, share: [bool; MAX_PLANES]) -> Self {
        let planes = reference
            .planes
            .iter()
            .enumerate()
            .map(|(i, p)| {
                if share[i] {
                    p.clone()
                } else {
                    Plane::blank(p.width, p.height, p.bytes_per_sample)
                }
            })
            .collect();
        Self {
            format: reference.format,
            width: reference.width,
            height: reference.height,
            planes,
        }
    }

    pub fn format(&self) -> FrameFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn num_planes(&self) -> usize {
        self.planes.len()
    }

    pub fn plane(&self, i: usize) -> &Plane {
        &self.planes[i]
    }

    pub fn plane_mut(&mut self, i: usize) -> &mut Plane {
        &mut self.planes[i]
    }

    pub fn sample(&self, plane: usize, x: u32, y: u32) -> u64 {
        self.planes[plane].sample(x, y)
    }

    pub fn set_sample(&mut self, plane: usize, x: u32, y: u32, value: u64) {
        self.planes[plane].set_sample(x, y, value);
    }

    /// Whether `plane` of both frames points at the same buffer.
    pub fn shares_plane_with(&self, other: &Frame, plane: usize) -> bool {
        match (self.planes.get(plane), other.planes.get(plane)) {
            (Some(a), Some(b)) => Arc::ptr_eq(&a.data, &b.data),
            _ => false,
        }
    }

    pub fn same_layout(&self, other: &Frame) -> bool {
        self.format == other.format && self.width == other.width && self.height == other.height
    }
}
