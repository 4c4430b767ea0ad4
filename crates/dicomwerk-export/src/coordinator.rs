// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Export coordinator — drives each selected image through
// acquire → decode → display → settle → capture → append → release,
// one image at a time, then saves the assembled document.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dicomwerk_core::error::{DicomwerkError, Result};
use dicomwerk_core::{AppConfig, PaperSize};
use dicomwerk_document::{DocumentAssembler, PageKind};
use dicomwerk_render::{RenderEngine, RenderSignal, ScopedSurface};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::job::{ExportEvent, ExportItem, ExportJob, ExportReport, ImageFailure, ImageStage};

const DOCUMENT_TITLE: &str = "Selected DICOM images";

/// Knobs for one coordinator, usually derived from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub canvas_size: u32,
    pub settle_delay: Duration,
    pub render_timeout: Duration,
    pub paper_size: PaperSize,
    pub output_path: PathBuf,
}

impl From<&AppConfig> for ExportSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            canvas_size: config.canvas_size,
            settle_delay: config.settle_delay(),
            render_timeout: config.render_timeout(),
            paper_size: config.paper_size,
            output_path: config.output_path(),
        }
    }
}

/// Runs exports against a render engine.
///
/// Rendering goes through the engine's own render gate, so exports from any
/// number of coordinators sharing one engine still take turns on its drawing
/// context.
#[derive(Clone)]
pub struct ExportCoordinator {
    engine: Arc<dyn RenderEngine>,
    settings: ExportSettings,
    events: Option<mpsc::UnboundedSender<ExportEvent>>,
}

impl ExportCoordinator {
    pub fn new(engine: Arc<dyn RenderEngine>, settings: ExportSettings) -> Self {
        Self {
            engine,
            settings,
            events: None,
        }
    }

    pub fn from_config(engine: Arc<dyn RenderEngine>, config: &AppConfig) -> Self {
        Self::new(engine, ExportSettings::from(config))
    }

    /// Send progress events to `events` while exporting.
    pub fn with_events(mut self, events: mpsc::UnboundedSender<ExportEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings.output_path = path.into();
        self
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Assemble and save the document for `job`.
    ///
    /// Per-image failures are recorded in the report and the export carries
    /// on with the next image. Only a failure to lay out the filtered page or
    /// to save the document fails the whole export.
    #[instrument(skip_all, fields(job_id = %job.id, images = job.items.len()))]
    pub async fn export(&self, job: ExportJob) -> Result<ExportReport> {
        let started_at = Utc::now();
        info!(indices = ?job.indices(), "export started");

        let mut assembler = DocumentAssembler::new(self.settings.paper_size, DOCUMENT_TITLE);
        let annotation_truncated = assembler.add_annotation_page(&job.annotation);

        let mut failures = Vec::new();
        for item in &job.items {
            self.emit(ExportEvent::ImageStarted { index: item.index });

            let mut stage = ImageStage::Idle;
            if let Err(err) = self.process_item(item, &mut assembler, &mut stage).await {
                warn!(index = item.index, %stage, error = %err, "image skipped");
                let failure = ImageFailure {
                    index: item.index,
                    image: item.image.id,
                    stage,
                    detail: err.to_string(),
                };
                self.advance(item.index, &mut stage, ImageStage::Failed);
                // The guard is already dropped; Idle means none was acquired.
                if failure.stage != ImageStage::Idle {
                    self.advance(item.index, &mut stage, ImageStage::SurfaceReleased);
                }
                self.emit(ExportEvent::ImageSkipped(failure.clone()));
                failures.push(failure);
            }
        }

        if let Some(filtered) = &job.filtered {
            assembler
                .add_image_page(PageKind::Filtered, "Filtered image:", &filtered.bytes)
                .map_err(|err| {
                    DicomwerkError::Assembly(format!("filtered image could not be placed: {err}"))
                })?;
        }

        let output_path = self.settings.output_path.clone();
        let pages = assembler.save(&output_path)?;
        self.emit(ExportEvent::Saved {
            path: output_path.clone(),
            pages: pages.len(),
        });

        if !failures.is_empty() && failures.len() == job.items.len() {
            warn!("no selected image could be rendered");
        }
        info!(
            path = %output_path.display(),
            pages = pages.len(),
            skipped = failures.len(),
            annotation_truncated,
            "export saved"
        );

        Ok(ExportReport {
            job_id: job.id,
            output_path,
            pages,
            attempted: job.items.len(),
            failures,
            dangling: job.dangling,
            annotation_truncated,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Render one image and append its page while the surface is still held.
    ///
    /// `stage` tracks the step in progress so a failure can be attributed.
    async fn process_item(
        &self,
        item: &ExportItem,
        assembler: &mut DocumentAssembler,
        stage: &mut ImageStage,
    ) -> Result<()> {
        let index = item.index;
        let _turn = self.engine.render_gate().lock().await;
        {
            let size = self.settings.canvas_size;
            let surface = ScopedSurface::acquire(Arc::clone(&self.engine), size, size)?;
            self.advance(index, stage, ImageStage::SurfaceAcquired);

            self.advance(index, stage, ImageStage::Decoding);
            let engine = Arc::clone(&self.engine);
            let handle = item.image.handle.clone();
            tokio::task::spawn_blocking(move || engine.decode(&handle))
                .await
                .map_err(|err| DicomwerkError::Render(format!("decode task failed: {err}")))??;

            self.advance(index, stage, ImageStage::Rendering);
            let signal = surface.display(&item.image.handle)?;

            self.advance(index, stage, ImageStage::Settling);
            self.settle(signal).await?;

            self.advance(index, stage, ImageStage::Capturing);
            let frame = surface.capture()?;

            self.advance(index, stage, ImageStage::Appending);
            let label = format!("Image index: {index}");
            assembler.add_frame_page(PageKind::Image { index }, &label, frame)?;
            self.advance(index, stage, ImageStage::PageAppended);
        }
        self.advance(index, stage, ImageStage::SurfaceReleased);
        Ok(())
    }

    fn advance(&self, index: usize, stage: &mut ImageStage, next: ImageStage) {
        *stage = next;
        debug!(index, stage = %next, "image stage");
        self.emit(ExportEvent::Stage { index, stage: next });
    }

    async fn settle(&self, signal: RenderSignal) -> Result<()> {
        match signal {
            RenderSignal::Complete => Ok(()),
            RenderSignal::Pending(done) => {
                match tokio::time::timeout(self.settings.render_timeout, done).await {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(_)) => Err(DicomwerkError::Render(
                        "engine dropped the render-complete signal".into(),
                    )),
                    Err(_) => Err(DicomwerkError::Render(format!(
                        "render did not complete within {} ms",
                        self.settings.render_timeout.as_millis()
                    ))),
                }
            }
            RenderSignal::Unsignalled => {
                tokio::time::sleep(self.settings.settle_delay).await;
                Ok(())
            }
        }
    }

    fn emit(&self, event: ExportEvent) {
        if let Some(events) = &self.events {
            // A receiver that went away just stops listening.
            let _ = events.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    use dicomwerk_catalog::SelectionIndex;
    use dicomwerk_core::{FilteredImage, ImageId, ImageReference, PayloadHandle};
    use dicomwerk_document::{ImageProcessor, PdfReader};
    use dicomwerk_render::{ImageDecoder, PayloadStore, SurfaceHost, SurfaceId};
    use image::{Rgba, RgbaImage};
    use tokio::sync::{Mutex, oneshot};

    #[derive(Clone, Copy)]
    enum SignalMode {
        Complete,
        PendingAfter(Duration),
        Dropped,
        Never,
        Unsignalled,
    }

    /// Engine double that records surface traffic and fails on demand.
    struct MockEngine {
        signal: SignalMode,
        failing: HashSet<String>,
        next_surface: AtomicU64,
        live: AtomicUsize,
        max_live: AtomicUsize,
        acquired: AtomicUsize,
        released: AtomicUsize,
        decoded: StdMutex<Vec<String>>,
        sizes: StdMutex<HashMap<u64, u32>>,
        held_signals: StdMutex<Vec<oneshot::Sender<()>>>,
        empty_frames: bool,
        render_gate: Mutex<()>,
    }

    impl MockEngine {
        fn new(signal: SignalMode) -> Self {
            Self {
                signal,
                failing: HashSet::new(),
                next_surface: AtomicU64::new(1),
                live: AtomicUsize::new(0),
                max_live: AtomicUsize::new(0),
                acquired: AtomicUsize::new(0),
                released: AtomicUsize::new(0),
                decoded: StdMutex::new(Vec::new()),
                sizes: StdMutex::new(HashMap::new()),
                held_signals: StdMutex::new(Vec::new()),
                empty_frames: false,
                render_gate: Mutex::new(()),
            }
        }

        /// Every capture comes back as a 0x0 frame.
        fn with_empty_frames(mut self) -> Self {
            self.empty_frames = true;
            self
        }

        fn failing_on(mut self, handle: &str) -> Self {
            self.failing.insert(handle.to_owned());
            self
        }

        fn decoded(&self) -> Vec<String> {
            self.decoded.lock().expect("decoded").clone()
        }
    }

    impl PayloadStore for MockEngine {
        fn register_payload(&self, payload: Arc<[u8]>) -> Result<PayloadHandle> {
            Ok(PayloadHandle(String::from_utf8_lossy(&payload).into_owned()))
        }

        fn release_payload(&self, _handle: &PayloadHandle) {}
    }

    impl ImageDecoder for MockEngine {
        fn decode(&self, handle: &PayloadHandle) -> Result<()> {
            if self.failing.contains(&handle.0) {
                return Err(DicomwerkError::ImageError(format!("{} is not an image", handle.0)));
            }
            self.decoded.lock().expect("decoded").push(handle.0.clone());
            Ok(())
        }

        fn display(&self, _surface: SurfaceId, _handle: &PayloadHandle) -> Result<RenderSignal> {
            Ok(match self.signal {
                SignalMode::Complete => RenderSignal::Complete,
                SignalMode::Unsignalled => RenderSignal::Unsignalled,
                SignalMode::PendingAfter(delay) => {
                    let (tx, rx) = oneshot::channel();
                    tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = tx.send(());
                    });
                    RenderSignal::Pending(rx)
                }
                SignalMode::Dropped => {
                    let (_tx, rx) = oneshot::channel();
                    RenderSignal::Pending(rx)
                }
                SignalMode::Never => {
                    let (tx, rx) = oneshot::channel();
                    self.held_signals.lock().expect("held").push(tx);
                    RenderSignal::Pending(rx)
                }
            })
        }
    }

    impl SurfaceHost for MockEngine {
        fn acquire_surface(&self, width: u32, _height: u32) -> Result<SurfaceId> {
            let id = self.next_surface.fetch_add(1, Ordering::SeqCst);
            let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_live.fetch_max(live, Ordering::SeqCst);
            self.acquired.fetch_add(1, Ordering::SeqCst);
            self.sizes.lock().expect("sizes").insert(id, width);
            Ok(SurfaceId(id))
        }

        fn capture(&self, surface: SurfaceId) -> Result<RgbaImage> {
            let size = self.sizes.lock().expect("sizes")[&surface.0];
            if self.empty_frames {
                return Ok(RgbaImage::new(0, 0));
            }
            Ok(RgbaImage::from_pixel(size, size, Rgba([200, 200, 200, 255])))
        }

        fn release_surface(&self, surface: SurfaceId) {
            self.sizes.lock().expect("sizes").remove(&surface.0);
            self.live.fetch_sub(1, Ordering::SeqCst);
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl RenderEngine for MockEngine {
        fn engine_name(&self) -> &str {
            "mock"
        }

        fn render_gate(&self) -> &Mutex<()> {
            &self.render_gate
        }
    }

    fn catalog(names: &[&str]) -> Vec<ImageReference> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| ImageReference {
                id: ImageId(i as u64 + 1),
                name: format!("{name}.dcm"),
                handle: PayloadHandle((*name).to_owned()),
                payload: Arc::from(name.as_bytes()),
            })
            .collect()
    }

    fn select(indices: &[usize]) -> SelectionIndex {
        let mut selection = SelectionIndex::new();
        for index in indices {
            selection.toggle(*index);
        }
        selection
    }

    fn settings(output_path: PathBuf) -> ExportSettings {
        ExportSettings {
            canvas_size: 32,
            settle_delay: Duration::from_millis(10),
            render_timeout: Duration::from_millis(200),
            paper_size: PaperSize::A4,
            output_path,
        }
    }

    fn png_bytes() -> Vec<u8> {
        ImageProcessor::from_rgba(RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 255])))
            .to_png_bytes()
            .expect("png")
    }

    #[tokio::test]
    async fn exports_annotation_then_selected_images() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.pdf");
        let engine = Arc::new(MockEngine::new(SignalMode::Complete));
        let coordinator = ExportCoordinator::new(engine.clone(), settings(path.clone()));

        let job = ExportJob::plan(&catalog(&["A", "B", "C"]), &select(&[2, 0]), "note", None);
        let report = coordinator.export(job).await.expect("export");

        assert_eq!(
            report.pages,
            [
                PageKind::Annotation,
                PageKind::Image { index: 0 },
                PageKind::Image { index: 2 },
            ]
        );
        assert_eq!(engine.decoded(), ["A", "C"]);
        assert!(report.failures.is_empty());
        assert_eq!(PdfReader::open(&path).expect("open").page_count(), 3);
        assert_eq!(engine.acquired.load(Ordering::SeqCst), 2);
        assert_eq!(engine.live.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_image_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.pdf");
        let engine = Arc::new(MockEngine::new(SignalMode::Complete).failing_on("B"));
        let coordinator = ExportCoordinator::new(engine.clone(), settings(path.clone()));

        let job = ExportJob::plan(&catalog(&["A", "B", "C"]), &select(&[0, 1, 2]), "", None);
        let report = coordinator.export(job).await.expect("export");

        assert_eq!(report.exported_indices(), [0, 2]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 1);
        assert_eq!(report.failures[0].stage, ImageStage::Decoding);
        assert!(!report.all_images_failed());
        assert_eq!(
            engine.acquired.load(Ordering::SeqCst),
            engine.released.load(Ordering::SeqCst)
        );
        assert_eq!(PdfReader::open(&path).expect("open").page_count(), 3);
    }

    #[tokio::test]
    async fn every_image_failing_still_saves_the_annotation() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.pdf");
        let engine = Arc::new(MockEngine::new(SignalMode::Complete).failing_on("A"));
        let coordinator = ExportCoordinator::new(engine, settings(path.clone()));

        let job = ExportJob::plan(&catalog(&["A"]), &select(&[0]), "only text", None);
        let report = coordinator.export(job).await.expect("export");

        assert_eq!(report.pages, [PageKind::Annotation]);
        assert!(report.all_images_failed());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn empty_selection_gives_annotation_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        let engine = Arc::new(MockEngine::new(SignalMode::Complete));
        let coordinator = ExportCoordinator::new(engine.clone(), settings(dir.path().join("o.pdf")));

        let job = ExportJob::plan(&catalog(&["A", "B"]), &SelectionIndex::new(), "", None);
        let report = coordinator.export(job).await.expect("export");

        assert_eq!(report.pages, [PageKind::Annotation]);
        assert!(!report.all_images_failed());
        assert_eq!(engine.acquired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn pending_signal_is_awaited() {
        let dir = tempfile::tempdir().expect("tempdir");
        let engine = Arc::new(MockEngine::new(SignalMode::PendingAfter(Duration::from_millis(
            20,
        ))));
        let coordinator = ExportCoordinator::new(engine, settings(dir.path().join("o.pdf")));

        let job = ExportJob::plan(&catalog(&["A", "B"]), &select(&[0, 1]), "", None);
        let report = coordinator.export(job).await.expect("export");
        assert_eq!(report.exported_indices(), [0, 1]);
    }

    #[tokio::test]
    async fn dropped_signal_fails_while_settling() {
        let dir = tempfile::tempdir().expect("tempdir");
        let engine = Arc::new(MockEngine::new(SignalMode::Dropped));
        let coordinator = ExportCoordinator::new(engine.clone(), settings(dir.path().join("o.pdf")));

        let job = ExportJob::plan(&catalog(&["A"]), &select(&[0]), "", None);
        let report = coordinator.export(job).await.expect("export");

        assert_eq!(report.failures[0].stage, ImageStage::Settling);
        assert_eq!(engine.live.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn silent_engine_times_out() {
        let dir = tempfile::tempdir().expect("tempdir");
        let engine = Arc::new(MockEngine::new(SignalMode::Never));
        let mut settings = settings(dir.path().join("o.pdf"));
        settings.render_timeout = Duration::from_millis(30);
        let coordinator = ExportCoordinator::new(engine.clone(), settings);

        let job = ExportJob::plan(&catalog(&["A", "B"]), &select(&[0, 1]), "", None);
        let report = coordinator.export(job).await.expect("export");

        assert!(report.all_images_failed());
        assert!(report.failures[0].detail.contains("30 ms"));
        assert_eq!(engine.live.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unsignalled_engine_waits_settle_delay() {
        let dir = tempfile::tempdir().expect("tempdir");
        let engine = Arc::new(MockEngine::new(SignalMode::Unsignalled));
        let coordinator = ExportCoordinator::new(engine, settings(dir.path().join("o.pdf")));

        let job = ExportJob::plan(&catalog(&["A"]), &select(&[0]), "", None);
        let started = std::time::Instant::now();
        let report = coordinator.export(job).await.expect("export");

        assert_eq!(report.exported_indices(), [0]);
        assert!(started.elapsed() >= Duration::from_millis(10));
    }

    #[tokio::test]
    async fn filtered_image_goes_last() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("o.pdf");
        let engine = Arc::new(MockEngine::new(SignalMode::Complete));
        let coordinator = ExportCoordinator::new(engine, settings(path.clone()));

        let filtered = FilteredImage {
            source: ImageId(1),
            bytes: png_bytes(),
            content_type: Some("image/png".into()),
        };
        let job = ExportJob::plan(&catalog(&["A"]), &select(&[0]), "", Some(filtered));
        let report = coordinator.export(job).await.expect("export");

        assert_eq!(
            report.pages,
            [PageKind::Annotation, PageKind::Image { index: 0 }, PageKind::Filtered]
        );
        assert_eq!(PdfReader::open(&path).expect("open").page_count(), 3);
    }

    #[tokio::test]
    async fn unreadable_filtered_image_fails_the_export() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("o.pdf");
        let engine = Arc::new(MockEngine::new(SignalMode::Complete));
        let coordinator = ExportCoordinator::new(engine, settings(path.clone()));

        let filtered = FilteredImage {
            source: ImageId(1),
            bytes: b"not an image".to_vec(),
            content_type: None,
        };
        let job = ExportJob::plan(&catalog(&["A"]), &select(&[0]), "", Some(filtered));
        let err = coordinator.export(job).await.expect_err("must fail");

        assert!(matches!(err, DicomwerkError::Assembly(_)));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn unwritable_destination_is_an_assembly_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing").join("o.pdf");
        let engine = Arc::new(MockEngine::new(SignalMode::Complete));
        let coordinator = ExportCoordinator::new(engine, settings(path));

        let job = ExportJob::plan(&catalog(&["A"]), &select(&[0]), "", None);
        let err = coordinator.export(job).await.expect_err("must fail");
        assert!(matches!(err, DicomwerkError::Assembly(_)));
    }

    #[tokio::test]
    async fn independent_coordinators_take_turns_on_one_engine() {
        let dir = tempfile::tempdir().expect("tempdir");
        let engine = Arc::new(MockEngine::new(SignalMode::PendingAfter(Duration::from_millis(
            5,
        ))));
        let first = ExportCoordinator::new(engine.clone(), settings(dir.path().join("a.pdf")));
        let second = ExportCoordinator::new(engine.clone(), settings(dir.path().join("b.pdf")));

        let names = catalog(&["A", "B", "C"]);
        let job_a = ExportJob::plan(&names, &select(&[0, 1, 2]), "a", None);
        let job_b = ExportJob::plan(&names, &select(&[0, 2]), "b", None);
        let (a, b) = tokio::join!(first.export(job_a), second.export(job_b));

        assert_eq!(a.expect("a").exported_indices(), [0, 1, 2]);
        assert_eq!(b.expect("b").exported_indices(), [0, 2]);
        assert_eq!(engine.max_live.load(Ordering::SeqCst), 1);
        assert_eq!(engine.acquired.load(Ordering::SeqCst), 5);
        assert_eq!(engine.live.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn append_failure_is_attributed_and_releases_surface() {
        let dir = tempfile::tempdir().expect("tempdir");
        let engine = Arc::new(MockEngine::new(SignalMode::Complete).with_empty_frames());
        let coordinator = ExportCoordinator::new(engine.clone(), settings(dir.path().join("o.pdf")));

        let job = ExportJob::plan(&catalog(&["A"]), &select(&[0]), "", None);
        let report = coordinator.export(job).await.expect("export");

        assert_eq!(report.pages, [PageKind::Annotation]);
        assert_eq!(report.failures[0].stage, ImageStage::Appending);
        assert_eq!(engine.live.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn long_annotation_is_flagged_in_report() {
        let dir = tempfile::tempdir().expect("tempdir");
        let engine = Arc::new(MockEngine::new(SignalMode::Complete));
        let coordinator = ExportCoordinator::new(engine, settings(dir.path().join("o.pdf")));

        let job = ExportJob::plan(&catalog(&["A"]), &SelectionIndex::new(), "x\n".repeat(300), None);
        let report = coordinator.export(job).await.expect("export");
        assert!(report.annotation_truncated);

        let job = ExportJob::plan(&catalog(&["A"]), &SelectionIndex::new(), "short", None);
        assert!(!coordinator.export(job).await.expect("export").annotation_truncated);
    }

    #[tokio::test]
    async fn progress_events_follow_the_pipeline() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("o.pdf");
        let engine = Arc::new(MockEngine::new(SignalMode::Complete).failing_on("B"));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let coordinator = ExportCoordinator::new(engine, settings(path.clone())).with_events(tx);

        let job = ExportJob::plan(&catalog(&["A", "B"]), &select(&[0, 1]), "", None);
        coordinator.export(job).await.expect("export");
        drop(coordinator);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        let stages = |wanted: usize| -> Vec<ImageStage> {
            events
                .iter()
                .filter_map(|event| match event {
                    ExportEvent::Stage { index, stage } if *index == wanted => Some(*stage),
                    _ => None,
                })
                .collect()
        };

        assert_eq!(events[0], ExportEvent::ImageStarted { index: 0 });
        assert_eq!(
            stages(0),
            [
                ImageStage::SurfaceAcquired,
                ImageStage::Decoding,
                ImageStage::Rendering,
                ImageStage::Settling,
                ImageStage::Capturing,
                ImageStage::Appending,
                ImageStage::PageAppended,
                ImageStage::SurfaceReleased,
            ]
        );
        assert_eq!(
            stages(1),
            [
                ImageStage::SurfaceAcquired,
                ImageStage::Decoding,
                ImageStage::Failed,
                ImageStage::SurfaceReleased,
            ]
        );
        assert!(events.iter().any(
            |event| matches!(event, ExportEvent::ImageSkipped(f) if f.index == 1 && f.stage == ImageStage::Decoding)
        ));
        assert_eq!(events.last(), Some(&ExportEvent::Saved { path, pages: 2 }));
    }
}
