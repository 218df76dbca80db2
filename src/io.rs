use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageBuffer, Luma, Rgb};

use crate::{
    foundation::error::{FrameBlendError, FrameBlendResult},
    frame::{Frame, FrameFormat},
    supplier::ClipSupplier,
};

/// Decode an image file into a planar frame.
///
/// Grayscale images become one plane, everything else three (R, G, B; alpha is dropped).
/// 16-bit sources keep their depth.
pub fn load_frame(path: &Path) -> FrameBlendResult<Frame> {
    let img = image::open(path)
        .map_err(|e| FrameBlendError::io(format!("decode '{}': {e}", path.display())))?;
    let (w, h) = (img.width(), img.height());

    match img {
        DynamicImage::ImageLuma8(buf) => {
            Frame::from_planes(FrameFormat::gray8(), w, h, vec![buf.into_raw()])
        }
        DynamicImage::ImageLumaA8(_) => {
            Frame::from_planes(FrameFormat::gray8(), w, h, vec![img.to_luma8().into_raw()])
        }
        DynamicImage::ImageLuma16(_) | DynamicImage::ImageLumaA16(_) => {
            let raw = img.to_luma16().into_raw();
            Frame::from_planes(FrameFormat::gray16(), w, h, vec![u16_to_le(&raw)])
        }
        DynamicImage::ImageRgb16(_) | DynamicImage::ImageRgba16(_) => {
            let raw = img.to_rgb16().into_raw();
            let planes = deinterleave(&raw, 3).iter().map(|p| u16_to_le(p)).collect();
            Frame::from_planes(FrameFormat::rgb16(), w, h, planes)
        }
        other => {
            let raw = other.to_rgb8().into_raw();
            Frame::from_planes(FrameFormat::rgb8(), w, h, deinterleave(&raw, 3))
        }
    }
}

/// Encode a 1- or 3-plane, 8- or 16-bit frame without subsampling.
pub fn save_frame(frame: &Frame, path: &Path) -> FrameBlendResult<()> {
    let format = frame.format();
    if format.sub_w != 0 || format.sub_h != 0 {
        return Err(FrameBlendError::unsupported_format(
            "subsampled frames cannot be written as images",
        ));
    }
    let (w, h) = (frame.width(), frame.height());
    let planes = frame.num_planes();

    let res = match (planes, format.bytes_per_sample) {
        (1, 1) => ImageBuffer::<Luma<u8>, _>::from_raw(w, h, interleave(frame, |v| v as u8))
            .map(|b| b.save(path)),
        (1, 2) => ImageBuffer::<Luma<u16>, _>::from_raw(w, h, interleave(frame, |v| v as u16))
            .map(|b| b.save(path)),
        (3, 1) => ImageBuffer::<Rgb<u8>, _>::from_raw(w, h, interleave(frame, |v| v as u8))
            .map(|b| b.save(path)),
        (3, 2) => ImageBuffer::<Rgb<u16>, _>::from_raw(w, h, interleave(frame, |v| v as u16))
            .map(|b| b.save(path)),
        _ => {
            return Err(FrameBlendError::unsupported_format(format!(
                "cannot write {planes}-plane frames with {} bytes per sample",
                format.bytes_per_sample
            )));
        }
    };

    match res {
        Some(Ok(())) => Ok(()),
        Some(Err(e)) => Err(FrameBlendError::io(format!(
            "write '{}': {e}",
            path.display()
        ))),
        None => Err(FrameBlendError::io("frame buffer does not match its dimensions")),
    }
}

/// Load every image in `dir`, sorted by file name.
pub fn load_sequence(dir: &Path) -> FrameBlendResult<ClipSupplier> {
    let paths = sequence_paths(dir)?;
    let mut frames = Vec::with_capacity(paths.len());
    for p in &paths {
        frames.push(load_frame(p)?);
    }
    tracing::info!(dir = %dir.display(), frames = frames.len(), "loaded sequence");
    Ok(ClipSupplier::new(frames))
}

/// Write `frames` to `dir` as `frame_000000.png`, `frame_000001.png`, ...
pub fn save_sequence(frames: &[Frame], dir: &Path) -> FrameBlendResult<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .map_err(|e| FrameBlendError::io(format!("create '{}': {e}", dir.display())))?;
    let mut written = Vec::with_capacity(frames.len());
    for (i, frame) in frames.iter().enumerate() {
        let path = dir.join(format!("frame_{i:06}.png"));
        save_frame(frame, &path)?;
        written.push(path);
    }
    Ok(written)
}

fn sequence_paths(dir: &Path) -> FrameBlendResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| FrameBlendError::io(format!("read dir '{}': {e}", dir.display())))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| FrameBlendError::io(format!("read dir '{}': {e}", dir.display())))?
            .path();
        if path.is_file() && image::ImageFormat::from_path(&path).is_ok() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn deinterleave<T: Copy>(raw: &[T], channels: usize) -> Vec<Vec<T>> {
    (0..channels)
        .map(|c| raw.iter().skip(c).step_by(channels).copied().collect())
        .collect()
}

fn interleave<T>(frame: &Frame, cast: impl Fn(u64) -> T) -> Vec<T> {
    let planes = frame.num_planes();
    let mut out = Vec::with_capacity(frame.width() as usize * frame.height() as usize * planes);
    for y in 0..frame.height() {
        for x in 0..frame.width() {
            for p in 0..planes {
                out.push(cast(frame.sample(p, x, y)));
            }
        }
    }
    out
}

fn u16_to_le(raw: &[u16]) -> Vec<u8> {
    raw.iter().flat_map(|v| v.to_le_bytes()).collect()
}
