//! Upload-to-artifacts pipeline.
//!
//! One run takes the raw bytes of an upload through
//! `Received → Normalizing → Quantizing → Mapping → Packing → Emitting → Done`.
//! Any stage failure moves the run to `Failed`, drops the staging directory
//! and leaves the output directory exactly as it was.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use panel_encode::{
    CanvasNormalizer, ColorStatistics, FloydSteinberg, IndexStream, Palette, PanelEncoder,
    PANEL_PIXELS,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use utoipa::ToSchema;

use super::artifacts::{Artifacts, StagingArea, StatsDocument, BINARY_FILE};
use crate::error::{ApiError, PipelineError};
use crate::models::AppConfig;
use crate::rendering::CommandTransform;

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Received,
    Normalizing,
    Quantizing,
    Mapping,
    Packing,
    Emitting,
    Done,
    Failed,
}

impl PipelineStage {
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineStage::Received => "received",
            PipelineStage::Normalizing => "normalizing",
            PipelineStage::Quantizing => "quantizing",
            PipelineStage::Mapping => "mapping",
            PipelineStage::Packing => "packing",
            PipelineStage::Emitting => "emitting",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineStage::Done | PipelineStage::Failed)
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: String,
    pub binary_path: PathBuf,
    pub stats: StatsDocument,
}

/// A failed run: the stage that failed and why
#[derive(Debug, thiserror::Error)]
#[error("{stage} failed: {error}")]
pub struct PipelineFailure {
    pub stage: PipelineStage,
    #[source]
    pub error: PipelineError,
}

impl From<PipelineFailure> for ApiError {
    fn from(failure: PipelineFailure) -> Self {
        ApiError::Pipeline(failure.error)
    }
}

/// Transport-facing outcome of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProcessOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<StatsDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<RunReport> for ProcessOutcome {
    fn from(report: RunReport) -> Self {
        Self {
            success: true,
            run_id: Some(report.run_id),
            binary_path: Some(report.binary_path.display().to_string()),
            stats: Some(report.stats),
            error: None,
        }
    }
}

impl From<PipelineFailure> for ProcessOutcome {
    fn from(failure: PipelineFailure) -> Self {
        Self {
            success: false,
            run_id: None,
            binary_path: None,
            stats: None,
            error: Some(failure.error.to_string()),
        }
    }
}

/// Content-addressed id: first 12 hex digits of the SHA-256 of the upload.
pub fn run_id(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    hex::encode(&digest[..6])
}

/// Tracks the stage of one run and tags failures with it.
struct Run<'a> {
    id: &'a str,
    stage: PipelineStage,
}

impl<'a> Run<'a> {
    fn start(id: &'a str, len: usize) -> Self {
        tracing::info!(run_id = id, stage = %PipelineStage::Received, bytes = len, "Run started");
        Self {
            id,
            stage: PipelineStage::Received,
        }
    }

    fn enter(&mut self, stage: PipelineStage) {
        self.stage = stage;
        tracing::debug!(run_id = self.id, stage = %stage, "Stage entered");
    }

    fn fail(&self, error: impl Into<PipelineError>) -> PipelineFailure {
        let error = error.into();
        tracing::warn!(
            run_id = self.id,
            stage = %self.stage,
            next = %PipelineStage::Failed,
            %error,
            "Run failed"
        );
        PipelineFailure {
            stage: self.stage,
            error,
        }
    }
}

/// The synchronous pipeline. One instance serves every run.
pub struct Pipeline {
    encoder: PanelEncoder,
    save_preview: bool,
}

impl Pipeline {
    pub fn new(encoder: PanelEncoder) -> Self {
        Self {
            encoder,
            save_preview: false,
        }
    }

    /// Build from configuration, wiring external commands where configured.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut encoder = PanelEncoder::new(Palette::panel());

        match config
            .normalize_command
            .clone()
            .and_then(CommandTransform::new)
        {
            Some(command) => {
                tracing::info!(program = command.program(), "Using external normalizer");
                encoder = encoder.normalizer(command.filter(config.resize_filter));
            }
            None => {
                encoder = encoder.normalizer(CanvasNormalizer::panel().filter(config.resize_filter));
            }
        }

        match config
            .quantize_command
            .clone()
            .and_then(CommandTransform::new)
        {
            Some(command) => {
                tracing::info!(program = command.program(), "Using external quantizer");
                encoder = encoder.quantizer(command);
            }
            None => {
                encoder = encoder.quantizer(FloydSteinberg);
            }
        }

        Self::new(encoder).save_preview(config.save_preview)
    }

    pub fn save_preview(mut self, enabled: bool) -> Self {
        self.save_preview = enabled;
        self
    }

    pub fn palette(&self) -> &Palette {
        self.encoder.palette()
    }

    /// Run all stages on `bytes` and publish the artifacts into `output_dir`.
    pub fn process(&self, bytes: &[u8], output_dir: &Path) -> Result<RunReport, PipelineFailure> {
        let id = run_id(bytes);
        let mut run = Run::start(&id, bytes.len());

        let mut staging = StagingArea::create(output_dir).map_err(|e| run.fail(e))?;

        run.enter(PipelineStage::Normalizing);
        let raster = self.encoder.normalize(bytes).map_err(|e| run.fail(e))?;

        run.enter(PipelineStage::Quantizing);
        let quantized = self.encoder.quantize(&raster).map_err(|e| run.fail(e))?;
        drop(raster);

        run.enter(PipelineStage::Mapping);
        let stream = self.encoder.map(&quantized);
        drop(quantized);
        check_length(&stream).map_err(|e| run.fail(e))?;

        run.enter(PipelineStage::Packing);
        let packed = self.encoder.pack(&stream).map_err(|e| run.fail(e))?;

        run.enter(PipelineStage::Emitting);
        let stats = StatsDocument::new(&id, &ColorStatistics::from_stream(&stream, self.palette()));
        Artifacts {
            stream: &stream,
            packed: &packed,
            stats: &stats,
            preview: self.save_preview,
        }
        .stage(&mut staging)
        .map_err(|e| run.fail(e))?;
        staging.commit().map_err(|e| run.fail(e))?;

        run.enter(PipelineStage::Done);
        let binary_path = output_dir.join(BINARY_FILE);
        tracing::info!(
            run_id = %id,
            path = %binary_path.display(),
            bytes = packed.len(),
            "Run complete"
        );

        Ok(RunReport {
            run_id: id,
            binary_path,
            stats,
        })
    }

    /// [`process`](Self::process) folded into the transport-facing shape.
    pub fn process_outcome(&self, bytes: &[u8], output_dir: &Path) -> ProcessOutcome {
        match self.process(bytes, output_dir) {
            Ok(report) => report.into(),
            Err(failure) => failure.into(),
        }
    }
}

fn check_length(stream: &IndexStream) -> Result<(), PipelineError> {
    if stream.len() != PANEL_PIXELS {
        return Err(PipelineError::SizeMismatch {
            expected: PANEL_PIXELS,
            actual: stream.len(),
        });
    }
    Ok(())
}

/// Async front for [`Pipeline`] that serialises runs.
///
/// Uploads may arrive concurrently; runs execute one at a time on the
/// blocking thread pool so decoding and dithering never stall the runtime.
#[derive(Clone)]
pub struct PipelineRunner {
    pipeline: Arc<Pipeline>,
    output_dir: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl PipelineRunner {
    pub fn new(pipeline: Pipeline, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            output_dir: output_dir.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Process one upload once every earlier run has finished.
    ///
    /// The lock is held by the blocking task itself, so a run keeps it until
    /// it returns even if the caller is dropped midway.
    pub async fn run(&self, bytes: Vec<u8>) -> Result<RunReport, ApiError> {
        let guard = self.lock.clone().lock_owned().await;
        let pipeline = self.pipeline.clone();
        let output_dir = self.output_dir.clone();

        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            pipeline.process(&bytes, &output_dir)
        })
            .await
            .map_err(|e| ApiError::Internal(format!("Pipeline task failed: {e}")))?
            .map_err(ApiError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};
    use panel_encode::{EncodeError, Normalize, Quantize, PACKED_LEN};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;
    use std::sync::mpsc;
    use std::time::Duration;

    fn png(img: &RgbImage) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Normalizer producing a canvas one row short.
    struct ShortCanvas;

    impl Normalize for ShortCanvas {
        fn normalize(&self, _encoded: &[u8]) -> Result<RgbImage, EncodeError> {
            Ok(RgbImage::new(800, 479))
        }
    }

    /// Quantizer that drops the last row.
    struct ShortQuantizer;

    impl Quantize for ShortQuantizer {
        fn quantize(&self, raster: &RgbImage, _palette: &Palette) -> Result<RgbImage, EncodeError> {
            Ok(RgbImage::from_fn(raster.width(), raster.height() - 1, |x, y| {
                *raster.get_pixel(x, y)
            }))
        }
    }

    /// Normalizer that reports when it starts and then waits to be released.
    struct Gate {
        entered: std::sync::Mutex<mpsc::Sender<()>>,
        release: std::sync::Mutex<mpsc::Receiver<()>>,
    }

    impl Normalize for Gate {
        fn normalize(&self, _encoded: &[u8]) -> Result<RgbImage, EncodeError> {
            self.entered.lock().unwrap().send(()).unwrap();
            self.release.lock().unwrap().recv().unwrap();
            Ok(RgbImage::from_pixel(800, 480, Rgb([255, 255, 255])))
        }
    }

    #[test]
    fn test_run_id_is_content_hash_prefix() {
        // sha256("") = e3b0c44298fc1c149afbf4c8996fb924...
        assert_eq!(run_id(b""), "e3b0c44298fc");
        assert_eq!(run_id(b"abc"), "ba7816bf8f01");
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(PipelineStage::Normalizing.to_string(), "normalizing");
        assert!(PipelineStage::Done.is_terminal());
        assert!(PipelineStage::Failed.is_terminal());
        assert!(!PipelineStage::Emitting.is_terminal());
        assert_eq!(
            serde_json::to_value(PipelineStage::Quantizing).unwrap(),
            "quantizing"
        );
    }

    #[test]
    fn test_process_writes_artifacts() {
        let out = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(PanelEncoder::default());
        let bytes = png(&RgbImage::from_pixel(800, 480, Rgb([255, 0, 0])));

        let report = pipeline.process(&bytes, out.path()).unwrap();

        assert_eq!(report.run_id, run_id(&bytes));
        assert_eq!(report.binary_path, out.path().join("image.bin"));
        assert_eq!(entries(out.path()), vec!["image.bin", "image.h", "stats.json"]);

        let binary = std::fs::read(&report.binary_path).unwrap();
        assert_eq!(binary.len(), PACKED_LEN);
        assert!(binary.iter().all(|&b| b == 0x33));

        let red = report.stats.colors.iter().find(|c| c.index == 3).unwrap();
        assert_eq!(red.count, PANEL_PIXELS);
        assert_eq!(red.percentage, 100.0);
    }

    #[test]
    fn test_process_with_preview() {
        let out = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(PanelEncoder::default()).save_preview(true);
        let bytes = png(&RgbImage::from_pixel(40, 30, Rgb([0, 0, 255])));

        pipeline.process(&bytes, out.path()).unwrap();

        assert_eq!(
            entries(out.path()),
            vec!["image.bin", "image.h", "preview.png", "stats.json"]
        );
    }

    #[test]
    fn test_corrupt_input_fails_at_normalizing() {
        let out = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(PanelEncoder::default());

        let failure = pipeline.process(b"definitely not an image", out.path()).unwrap_err();

        assert_eq!(failure.stage, PipelineStage::Normalizing);
        assert!(matches!(failure.error, PipelineError::Decode(_)));
        assert!(entries(out.path()).is_empty());
    }

    #[test]
    fn test_empty_input_leaves_no_artifacts() {
        let out = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(PanelEncoder::default());

        let failure = pipeline.process(&[], out.path()).unwrap_err();

        assert!(matches!(failure.error, PipelineError::Decode(_)));
        assert!(entries(out.path()).is_empty());
    }

    #[test]
    fn test_wrong_canvas_size_is_resize_error() {
        let out = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(PanelEncoder::default().normalizer(ShortCanvas));

        let failure = pipeline.process(b"anything", out.path()).unwrap_err();

        assert_eq!(failure.stage, PipelineStage::Normalizing);
        assert!(matches!(failure.error, PipelineError::Resize(_)));
        assert!(entries(out.path()).is_empty());
    }

    #[test]
    fn test_short_quantized_raster_fails_at_mapping() {
        let out = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(PanelEncoder::default().quantizer(ShortQuantizer));
        let bytes = png(&RgbImage::from_pixel(800, 480, Rgb([255, 0, 0])));

        let failure = pipeline.process(&bytes, out.path()).unwrap_err();

        assert_eq!(failure.stage, PipelineStage::Mapping);
        assert!(matches!(
            failure.error,
            PipelineError::SizeMismatch {
                expected: 384000,
                actual: 383200
            }
        ));
        assert!(entries(out.path()).is_empty());
    }

    #[test]
    fn test_check_length() {
        assert!(check_length(&IndexStream::new(vec![1; PANEL_PIXELS], 800, 480)).is_ok());
        let err = check_length(&IndexStream::new(vec![1; 10], 5, 2)).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::SizeMismatch {
                expected: PANEL_PIXELS,
                actual: 10
            }
        ));
    }

    #[test]
    fn test_failed_run_keeps_previous_artifacts() {
        let out = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(PanelEncoder::default());
        let bytes = png(&RgbImage::from_pixel(800, 480, Rgb([255, 255, 255])));
        pipeline.process(&bytes, out.path()).unwrap();
        let before = std::fs::read(out.path().join("image.bin")).unwrap();

        pipeline.process(b"garbage", out.path()).unwrap_err();

        assert_eq!(std::fs::read(out.path().join("image.bin")).unwrap(), before);
        assert_eq!(entries(out.path()), vec!["image.bin", "image.h", "stats.json"]);
    }

    #[test]
    fn test_blocked_artifact_keeps_previous_set() {
        let out = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(PanelEncoder::default());
        let white = png(&RgbImage::from_pixel(800, 480, Rgb([255, 255, 255])));
        pipeline.process(&white, out.path()).unwrap();
        let header_before = std::fs::read(out.path().join("image.h")).unwrap();

        let stats = out.path().join("stats.json");
        std::fs::remove_file(&stats).unwrap();
        std::fs::create_dir(&stats).unwrap();
        std::fs::write(stats.join("occupied"), b"x").unwrap();

        let red = png(&RgbImage::from_pixel(800, 480, Rgb([255, 0, 0])));
        let failure = pipeline.process(&red, out.path()).unwrap_err();

        assert_eq!(failure.stage, PipelineStage::Emitting);
        assert!(matches!(failure.error, PipelineError::Io(_)));
        assert_eq!(std::fs::read(out.path().join("image.h")).unwrap(), header_before);
        let binary = std::fs::read(out.path().join("image.bin")).unwrap();
        assert!(binary.iter().all(|&b| b == 0x11));
        assert_eq!(entries(out.path()), vec!["image.bin", "image.h", "stats.json"]);
    }

    #[test]
    fn test_unwritable_output_is_io_error() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let pipeline = Pipeline::new(PanelEncoder::default());

        let failure = pipeline.process(b"whatever", &blocker.join("out")).unwrap_err();

        assert_eq!(failure.stage, PipelineStage::Received);
        assert!(matches!(failure.error, PipelineError::Io(_)));
    }

    #[test]
    fn test_process_outcome_shapes() {
        let out = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(PanelEncoder::default());

        let failed = serde_json::to_value(pipeline.process_outcome(b"nope", out.path())).unwrap();
        assert_eq!(failed["success"], false);
        assert!(failed["error"].as_str().unwrap().starts_with("Decode error"));
        assert!(failed.get("binary_path").is_none());

        let bytes = png(&RgbImage::from_pixel(8, 8, Rgb([0, 0, 0])));
        let ok = serde_json::to_value(pipeline.process_outcome(&bytes, out.path())).unwrap();
        assert_eq!(ok["success"], true);
        assert!(ok["binary_path"].as_str().unwrap().ends_with("image.bin"));
        assert_eq!(ok["stats"]["total_pixels"], PANEL_PIXELS);
        assert!(ok.get("error").is_none());
    }

    #[test]
    fn test_from_config_defaults() {
        let pipeline = Pipeline::from_config(&AppConfig::default());
        assert_eq!(pipeline.palette().len(), 6);
        assert!(!pipeline.save_preview);
    }

    #[tokio::test]
    async fn test_runner_serialises_runs() {
        let out = tempfile::tempdir().unwrap();
        let runner = PipelineRunner::new(Pipeline::new(PanelEncoder::default()), out.path());
        let a = png(&RgbImage::from_pixel(800, 480, Rgb([255, 255, 0])));
        let b = png(&RgbImage::from_pixel(800, 480, Rgb([0, 255, 0])));

        let (ra, rb) = tokio::join!(runner.run(a), runner.run(b));
        let (ra, rb) = (ra.unwrap(), rb.unwrap());

        assert_ne!(ra.run_id, rb.run_id);
        let binary = std::fs::read(out.path().join("image.bin")).unwrap();
        assert_eq!(binary.len(), PACKED_LEN);
        // Whichever run finished last owns the published binary
        assert!(binary[PACKED_LEN / 2] == 0x22 || binary[PACKED_LEN / 2] == 0x66);
        assert_eq!(entries(out.path()), vec!["image.bin", "image.h", "stats.json"]);
    }

    #[tokio::test]
    async fn test_cancelled_caller_keeps_lock_until_run_finishes() {
        let out = tempfile::tempdir().unwrap();
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let gate = Gate {
            entered: std::sync::Mutex::new(entered_tx),
            release: std::sync::Mutex::new(release_rx),
        };
        let runner = PipelineRunner::new(
            Pipeline::new(PanelEncoder::default().normalizer(gate)),
            out.path(),
        );

        let task = tokio::spawn({
            let runner = runner.clone();
            async move { runner.run(b"upload".to_vec()).await }
        });
        tokio::task::spawn_blocking(move || entered_rx.recv())
            .await
            .unwrap()
            .unwrap();

        // Client went away while the run is still normalizing
        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());
        assert!(runner.lock.try_lock().is_err());

        release_tx.send(()).unwrap();
        let _guard = tokio::time::timeout(Duration::from_secs(10), runner.lock.lock())
            .await
            .unwrap();
        assert_eq!(entries(out.path()), vec!["image.bin", "image.h", "stats.json"]);
    }

    #[tokio::test]
    async fn test_runner_maps_failure_to_api_error() {
        let out = tempfile::tempdir().unwrap();
        let runner = PipelineRunner::new(Pipeline::new(PanelEncoder::default()), out.path());

        let err = runner.run(b"zzz".to_vec()).await.unwrap_err();
        assert!(matches!(err, ApiError::Pipeline(PipelineError::Decode(_))));
    }
}
