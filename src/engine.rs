use rayon::prelude::*;

use crate::{
    blend::blend_frame,
    config::BlendConfig,
    foundation::{
        core::{FrameIndex, FrameRange},
        error::{FrameBlendError, FrameBlendResult},
    },
    frame::Frame,
    plan::WindowPlan,
    planes::PlaneSelector,
    supplier::{FrameSupplier, FrameWindow},
    weights::WeightProfile,
};

/// Sliding-window temporal blend over frames pulled from a [`FrameSupplier`].
///
/// The weights and plane selection are fixed at construction and shared read-only by every
/// request, so `get_frame` can be called from many threads at once.
pub struct BlendEngine<S: FrameSupplier> {
    supplier: S,
    profile: WeightProfile,
    planes: PlaneSelector,
}

impl<S: FrameSupplier> BlendEngine<S> {
    /// Validate `config` and take ownership of `supplier`.
    ///
    /// On error the supplier is dropped along with the partially built instance.
    pub fn new(supplier: S, config: &BlendConfig) -> FrameBlendResult<Self> {
        let (profile, planes) = config.validate()?;
        if supplier.index_ceiling() == 0 {
            return Err(FrameBlendError::configuration("source has no frames"));
        }
        if config.log {
            tracing::debug!(weights = %profile, "frame blending");
        }
        Ok(Self {
            supplier,
            profile,
            planes,
        })
    }

    pub fn profile(&self) -> &WeightProfile {
        &self.profile
    }

    pub fn planes(&self) -> &PlaneSelector {
        &self.planes
    }

    pub fn supplier(&self) -> &S {
        &self.supplier
    }

    pub fn into_supplier(self) -> S {
        self.supplier
    }

    /// First phase: plan the window for `n` and declare every needed index upstream.
    ///
    /// Does not wait for any frame.
    #[tracing::instrument(skip_all, fields(n = n.0))]
    pub fn declare(&self, n: FrameIndex) -> FrameBlendResult<WindowPlan> {
        let plan = WindowPlan::new(n, self.profile.radius(), self.supplier.index_ceiling())?;
        for i in plan.declared() {
            self.supplier.declare_needed(FrameIndex(i));
        }
        Ok(plan)
    }

    /// Second phase: fetch the planned window, blend it, and release every fetched frame.
    #[tracing::instrument(skip_all, fields(n = plan.requested.0))]
    pub fn produce(&self, plan: &WindowPlan) -> FrameBlendResult<Frame> {
        let mut window = FrameWindow::new(&self.supplier, plan.window().len());
        for &idx in plan.window() {
            window.fetch(idx)?;
        }

        let frames = window.frames();
        blend_frame(&frames, &self.profile, &self.planes, |center, share| {
            self.supplier.allocate_output(center, share)
        })
    }

    /// Produce output frame `n`.
    pub fn get_frame(&self, n: FrameIndex) -> FrameBlendResult<Frame> {
        let plan = self.declare(n)?;
        self.produce(&plan)
    }

    /// Produce every frame in `range`, in index order.
    pub fn render_range(
        &self,
        range: FrameRange,
        threading: &BlendThreading,
    ) -> FrameBlendResult<Vec<Frame>> {
        if range.is_empty() {
            return Err(FrameBlendError::configuration(
                "render range must be non-empty",
            ));
        }

        let mut out = Vec::with_capacity(range.len_frames().min(4096) as usize);
        if !threading.parallel {
            for f in range.start.0..range.end.0 {
                out.push(self.get_frame(FrameIndex(f))?);
            }
            return Ok(out);
        }

        let pool = build_thread_pool(threading.threads)?;
        let chunk_size = normalized_chunk_size(threading.chunk_size);
        let mut chunk_start = range.start.0;
        while chunk_start < range.end.0 {
            let chunk_end = (chunk_start + chunk_size).min(range.end.0);
            let rendered = pool.install(|| {
                (chunk_start..chunk_end)
                    .into_par_iter()
                    .map(|f| self.get_frame(FrameIndex(f)))
                    .collect::<Vec<_>>()
            });
            for frame in rendered {
                out.push(frame?);
            }
            tracing::debug!(chunk_start, chunk_end, "rendered chunk");
            chunk_start = chunk_end;
        }
        Ok(out)
    }
}

/// Batch rendering parallelism for [`BlendEngine::render_range`].
#[derive(Clone, Debug)]
pub struct BlendThreading {
    pub parallel: bool,
    pub chunk_size: usize,
    pub threads: Option<usize>,
}

impl Default for BlendThreading {
    fn default() -> Self {
        Self {
            parallel: false,
            chunk_size: 64,
            threads: None,
        }
    }
}

fn build_thread_pool(threads: Option<usize>) -> FrameBlendResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(FrameBlendError::configuration(
            "blend threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder.build().map_err(|e| {
        FrameBlendError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}"))
    })
}

fn normalized_chunk_size(chunk_size: usize) -> u64 {
    if chunk_size == 0 {
        1
    } else {
        chunk_size as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{frame::FrameFormat, supplier::ClipSupplier};

    fn ramp_frames(n: usize) -> Vec<Frame> {
        (0..n)
            .map(|i| Frame::filled(FrameFormat::gray8(), 4, 4, (i * 10) as u64).unwrap())
            .collect()
    }

    fn ramp(n: usize) -> ClipSupplier {
        ClipSupplier::new(ramp_frames(n))
    }

    #[test]
    fn declare_registers_the_inclusive_range() {
        let e = BlendEngine::new(
            ClipSupplier::recording(ramp_frames(10)),
            &BlendConfig::new(vec![1.0; 5]),
        )
        .unwrap();
        let plan = e.declare(FrameIndex(0)).unwrap();
        assert_eq!(
            e.supplier().take_declared(),
            vec![FrameIndex(0), FrameIndex(1), FrameIndex(2)]
        );
        assert_eq!(e.supplier().fetched(), 0);
        assert_eq!(plan.window().len(), 5);
    }

    #[test]
    fn produce_releases_all_handles() {
        let e = BlendEngine::new(ramp(6), &BlendConfig::new(vec![1.0, 2.0, 1.0])).unwrap();
        let out = e.get_frame(FrameIndex(3)).unwrap();
        // (20 + 2*30 + 40) / 4
        assert_eq!(out.sample(0, 0, 0), 30);
        assert_eq!(e.supplier().fetched(), 3);
        assert_eq!(e.supplier().outstanding(), 0);
    }

    #[test]
    fn boundaries_use_replicated_frames() {
        let e = BlendEngine::new(ramp(4), &BlendConfig::new(vec![1.0, 1.0, 1.0])).unwrap();
        // [0, 0, 10] / 3
        assert_eq!(e.get_frame(FrameIndex(0)).unwrap().sample(0, 1, 1), 3);
        // [20, 30, 30] / 3
        assert_eq!(e.get_frame(FrameIndex(3)).unwrap().sample(0, 1, 1), 26);
    }

    #[test]
    fn empty_source_is_rejected() {
        let err = BlendEngine::new(ClipSupplier::new(vec![]), &BlendConfig::new(vec![1.0]))
            .err()
            .unwrap();
        assert!(matches!(err, FrameBlendError::Configuration(_)));
    }

    #[test]
    fn parallel_and_sequential_ranges_match() {
        let e = BlendEngine::new(ramp(9), &BlendConfig::new(vec![1.0, 3.0, 5.0, 3.0, 1.0]))
            .unwrap();
        let range = FrameRange::new(FrameIndex(0), FrameIndex(9)).unwrap();
        let seq = e.render_range(range, &BlendThreading::default()).unwrap();
        let par = e
            .render_range(
                range,
                &BlendThreading {
                    parallel: true,
                    chunk_size: 4,
                    threads: Some(2),
                },
            )
            .unwrap();
        assert_eq!(seq.len(), 9);
        for (a, b) in seq.iter().zip(&par) {
            assert_eq!(a.plane(0).data(), b.plane(0).data());
        }
        assert_eq!(e.supplier().outstanding(), 0);
    }

    #[test]
    fn default_supplier_retains_nothing_across_renders() {
        let e = BlendEngine::new(ramp(200), &BlendConfig::new(vec![1.0; 11])).unwrap();
        let range = FrameRange::new(FrameIndex(0), FrameIndex(200)).unwrap();
        let threading = BlendThreading {
            parallel: true,
            chunk_size: 32,
            threads: Some(4),
        };
        for _ in 0..2 {
            e.render_range(range, &threading).unwrap();
        }
        assert!(e.supplier().take_declared().is_empty());
        assert_eq!(e.supplier().fetched(), 2 * 200 * 11);
        assert_eq!(e.supplier().outstanding(), 0);
    }

    #[derive(Clone, Default)]
    struct CapturedLog(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn construct_with_log(log: bool) -> String {
        let captured = CapturedLog::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let config = BlendConfig {
            log,
            ..BlendConfig::new(vec![1.0, 2.0, 1.0])
        };
        tracing::subscriber::with_default(subscriber, || {
            BlendEngine::new(ramp(3), &config).unwrap();
        });
        let bytes = captured.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn log_option_emits_normalized_weights() {
        let out = construct_with_log(true);
        assert!(out.contains("frame blending"), "{out}");
        assert!(out.contains("[0.250000, 0.500000, 0.250000]"), "{out}");
        assert!(!construct_with_log(false).contains("frame blending"));
    }

    #[test]
    fn zero_threads_is_rejected() {
        let e = BlendEngine::new(ramp(2), &BlendConfig::new(vec![1.0])).unwrap();
        let range = FrameRange::new(FrameIndex(0), FrameIndex(2)).unwrap();
        let threading = BlendThreading {
            parallel: true,
            threads: Some(0),
            ..BlendThreading::default()
        };
        assert!(e.render_range(range, &threading).is_err());
        assert!(
            e.render_range(
                FrameRange::new(FrameIndex(1), FrameIndex(1)).unwrap(),
                &BlendThreading::default()
            )
            .is_err()
        );
    }
}
