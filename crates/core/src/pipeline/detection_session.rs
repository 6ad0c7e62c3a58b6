use std::time::{Duration, Instant};

use log::{debug, info};

use crate::detection::domain::detection_settings::DetectionSettings;
use crate::detection::domain::detection_stats::DetectionStats;
use crate::detection::domain::face_detection::FaceDetection;
use crate::overlay::overlay_renderer::{render_overlay, DisplaySize, OverlayBox};
use crate::pipeline::detect_faces_use_case::DetectionBatch;
use crate::pipeline::detection_loop::{CycleTicket, DetectionLoop};
use crate::shared::constants::DETECTION_INTERVAL;
use crate::shared::frame::Frame;

/// What detection currently runs against.
#[derive(Clone, Debug)]
pub enum SourceMode {
    None,
    Live,
    Still(Frame),
}

/// A cycle the caller should run through the use case and hand back to
/// [`DetectionSession::apply`] along with its ticket.
#[derive(Clone, Debug)]
pub struct CycleRequest {
    pub ticket: CycleTicket,
    pub frame: Frame,
    pub confidence_threshold: f64,
}

/// Progress of the one-off notice for a freshly loaded image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ImageReport {
    Idle,
    Awaiting,
    Ready,
}

/// Application state for detection: settings, the latest batch, the source
/// mode and the scheduling loop.
///
/// Owned by one thread (the GUI update loop or the CLI main loop). Inference
/// itself happens elsewhere; the session only decides when a cycle should run
/// and whether its result is still wanted.
pub struct DetectionSession {
    settings: DetectionSettings,
    batch: DetectionBatch,
    source: SourceMode,
    detection_loop: DetectionLoop,
    model_ready: bool,
    image_report: ImageReport,
}

impl Default for DetectionSession {
    fn default() -> Self {
        Self::new(DetectionSettings::default())
    }
}

impl DetectionSession {
    pub fn new(settings: DetectionSettings) -> Self {
        Self::with_interval(settings, DETECTION_INTERVAL)
    }

    pub fn with_interval(settings: DetectionSettings, interval: Duration) -> Self {
        Self {
            settings: settings.validated(),
            batch: DetectionBatch::default(),
            source: SourceMode::None,
            detection_loop: DetectionLoop::new(interval),
            model_ready: false,
            image_report: ImageReport::Idle,
        }
    }

    pub fn settings(&self) -> &DetectionSettings {
        &self.settings
    }

    pub fn detections(&self) -> &[FaceDetection] {
        &self.batch.detections
    }

    pub fn stats(&self) -> &DetectionStats {
        &self.batch.stats
    }

    pub fn batch(&self) -> &DetectionBatch {
        &self.batch
    }

    pub fn source(&self) -> &SourceMode {
        &self.source
    }

    pub fn is_live(&self) -> bool {
        matches!(self.source, SourceMode::Live)
    }

    pub fn still_frame(&self) -> Option<&Frame> {
        match &self.source {
            SourceMode::Still(frame) => Some(frame),
            _ => None,
        }
    }

    pub fn is_model_ready(&self) -> bool {
        self.model_ready
    }

    pub fn is_detecting(&self) -> bool {
        self.detection_loop.is_in_flight()
    }

    pub fn set_model_ready(&mut self, ready: bool) {
        self.model_ready = ready;
        self.sync_loop();
    }

    /// Switches to the live source. Any still image and the current batch are
    /// dropped.
    pub fn start_live(&mut self) {
        info!("Live detection started");
        self.source = SourceMode::Live;
        self.batch = DetectionBatch::default();
        self.image_report = ImageReport::Idle;
        self.detection_loop.cancel();
        self.sync_loop();
    }

    /// Leaves live mode. The last batch stays visible; nothing arriving after
    /// this point is applied.
    pub fn stop_live(&mut self) {
        if self.is_live() {
            info!("Live detection stopped");
            self.source = SourceMode::None;
        }
        self.detection_loop.stop();
    }

    /// Makes `frame` the current source and requests its single cycle.
    ///
    /// Live mode is left first. Returns `None` while the models are not ready
    /// (the image stays loaded).
    pub fn load_image(&mut self, frame: Frame) -> Option<CycleRequest> {
        self.stop_live();
        self.batch = DetectionBatch::default();
        self.source = SourceMode::Still(frame);
        self.image_report = ImageReport::Awaiting;
        self.still_request()
    }

    /// Replaces the settings. A threshold change while a still image is the
    /// source requests exactly one re-run.
    pub fn update_settings(&mut self, settings: DetectionSettings) -> Option<CycleRequest> {
        let settings = settings.validated();
        let threshold_changed = settings.confidence_threshold != self.settings.confidence_threshold;
        self.settings = settings;
        if threshold_changed {
            debug!("Confidence threshold now {:.2}", settings.confidence_threshold);
            self.still_request()
        } else {
            None
        }
    }

    /// Refresh-signal tick (display frame, CLI clock). `frame` is the newest
    /// frame from the live source, if it has produced one yet.
    pub fn on_refresh(&mut self, now: Instant, frame: Option<&Frame>) -> Option<CycleRequest> {
        if !self.is_live() {
            return None;
        }
        let frame = frame?;
        let ticket = self.detection_loop.on_refresh(now, true)?;
        Some(CycleRequest {
            ticket,
            frame: frame.clone(),
            confidence_threshold: self.settings.confidence_threshold,
        })
    }

    /// Applies a finished cycle. Returns `false` (and changes nothing) when
    /// the cycle was cancelled or superseded in the meantime.
    pub fn apply(&mut self, ticket: CycleTicket, batch: DetectionBatch) -> bool {
        if !self.detection_loop.complete(ticket) {
            return false;
        }
        self.batch = batch;
        if self.image_report == ImageReport::Awaiting && self.still_frame().is_some() {
            self.image_report = ImageReport::Ready;
        }
        true
    }

    /// Stats of the first batch applied after an image was loaded, returned
    /// once. Re-runs that supersede the first cycle still count as first.
    pub fn take_image_report(&mut self) -> Option<&DetectionStats> {
        if self.image_report != ImageReport::Ready {
            return None;
        }
        self.image_report = ImageReport::Idle;
        Some(&self.batch.stats)
    }

    pub fn clear(&mut self) {
        self.batch = DetectionBatch::default();
    }

    pub fn overlay(&self, display: DisplaySize) -> Vec<OverlayBox> {
        render_overlay(&self.batch.detections, &self.settings, display)
    }

    fn still_request(&mut self) -> Option<CycleRequest> {
        if !self.model_ready {
            return None;
        }
        let frame = self.still_frame()?.clone();
        Some(CycleRequest {
            ticket: self.detection_loop.issue_once(),
            frame,
            confidence_threshold: self.settings.confidence_threshold,
        })
    }

    /// Running exactly while live and ready.
    fn sync_loop(&mut self) {
        if self.is_live() && self.model_ready {
            self.detection_loop.start();
        } else {
            self.detection_loop.stop();
        }
    }
}
