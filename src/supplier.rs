use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use crate::{
    foundation::{
        core::FrameIndex,
        error::{FrameBlendError, FrameBlendResult},
    },
    frame::{Frame, MAX_PLANES},
};

/// A source frame borrowed from a [`FrameSupplier`].
///
/// Handles are not `Clone`; each one must go back through [`FrameSupplier::release`] exactly once.
/// [`FrameWindow`] does that automatically.
#[derive(Debug)]
pub struct FrameHandle {
    index: FrameIndex,
    frame: Arc<Frame>,
}

impl FrameHandle {
    pub fn new(index: FrameIndex, frame: Arc<Frame>) -> Self {
        Self { index, frame }
    }

    pub fn index(&self) -> FrameIndex {
        self.index
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }
}

/// Upstream provider of source frames.
///
/// Requests run in two phases: [`declare_needed`](FrameSupplier::declare_needed) registers intent
/// without blocking, then [`fetch`](FrameSupplier::fetch) may block until the frame is ready.
pub trait FrameSupplier: Send + Sync {
    /// One past the last index this supplier can deliver.
    fn index_ceiling(&self) -> u64;

    fn declare_needed(&self, index: FrameIndex);

    /// `index` is always below [`index_ceiling`](FrameSupplier::index_ceiling).
    fn fetch(&self, index: FrameIndex) -> FrameBlendResult<FrameHandle>;

    fn release(&self, handle: FrameHandle);

    /// Allocate an output frame shaped like `reference`, aliasing the planes flagged in `share`.
    fn allocate_output(&self, reference: &Frame, share: [bool; MAX_PLANES]) -> Frame {
        Frame::new_sharing(reference, share)
    }
}

/// Scoped set of fetched handles; releases all of them on drop.
pub struct FrameWindow<'a, S: FrameSupplier + ?Sized> {
    supplier: &'a S,
    handles: Vec<FrameHandle>,
}

impl<'a, S: FrameSupplier + ?Sized> FrameWindow<'a, S> {
    pub fn new(supplier: &'a S, capacity: usize) -> Self {
        Self {
            supplier,
            handles: Vec::with_capacity(capacity),
        }
    }

    /// Fetch `index` and hold it until the window is dropped.
    pub fn fetch(&mut self, index: FrameIndex) -> FrameBlendResult<()> {
        let handle = self.supplier.fetch(index)?;
        self.handles.push(handle);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn frames(&self) -> Vec<&Frame> {
        self.handles.iter().map(FrameHandle::frame).collect()
    }
}

impl<S: FrameSupplier + ?Sized> Drop for FrameWindow<'_, S> {
    fn drop(&mut self) {
        for handle in self.handles.drain(..) {
            self.supplier.release(handle);
        }
    }
}

/// In-memory supplier over a fixed list of frames.
///
/// Counts fetched and outstanding handles. Declared indices are only kept when built with
/// [`ClipSupplier::recording`]; the default supplier ignores declarations.
#[derive(Debug, Default)]
pub struct ClipSupplier {
    frames: Vec<Arc<Frame>>,
    declared: Option<Mutex<Vec<FrameIndex>>>,
    outstanding: AtomicUsize,
    fetched: AtomicUsize,
}

impl ClipSupplier {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames: frames.into_iter().map(Arc::new).collect(),
            ..Self::default()
        }
    }

    /// Like [`ClipSupplier::new`], but keeps every declared index until
    /// [`take_declared`](ClipSupplier::take_declared) drains it.
    pub fn recording(frames: Vec<Frame>) -> Self {
        Self {
            declared: Some(Mutex::new(Vec::new())),
            ..Self::new(frames)
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Handles fetched but not yet released.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Total number of successful fetches.
    pub fn fetched(&self) -> usize {
        self.fetched.load(Ordering::SeqCst)
    }

    /// Drain the indices declared since the last call. Always empty unless recording.
    pub fn take_declared(&self) -> Vec<FrameIndex> {
        match self.declared.as_ref().map(Mutex::lock) {
            None => Vec::new(),
            Some(Ok(mut d)) => std::mem::take(&mut *d),
            Some(Err(poisoned)) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl FrameSupplier for ClipSupplier {
    fn index_ceiling(&self) -> u64 {
        self.frames.len() as u64
    }

    fn declare_needed(&self, index: FrameIndex) {
        let Some(declared) = &self.declared else {
            return;
        };
        match declared.lock() {
            Ok(mut d) => d.push(index),
            Err(poisoned) => poisoned.into_inner().push(index),
        }
    }

    fn fetch(&self, index: FrameIndex) -> FrameBlendResult<FrameHandle> {
        let frame = usize::try_from(index.0)
            .ok()
            .and_then(|i| self.frames.get(i))
            .ok_or_else(|| {
                FrameBlendError::supplier(format!(
                    "frame {} out of range (clip has {} frames)",
                    index.0,
                    self.frames.len()
                ))
            })?;
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        self.fetched.fetch_add(1, Ordering::SeqCst);
        Ok(FrameHandle::new(index, Arc::clone(frame)))
    }

    fn release(&self, handle: FrameHandle) {
        drop(handle);
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
    }
}
