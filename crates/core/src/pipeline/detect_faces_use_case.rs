use std::time::Instant;

use log::{error, warn};
use serde::Serialize;

use crate::detection::domain::detection_stats::DetectionStats;
use crate::detection::domain::emotion::EmotionResult;
use crate::detection::domain::face_analyzer::FaceAnalyzer;
use crate::detection::domain::face_detection::FaceDetection;
use crate::detection::domain::mask_classifier::MaskClassifier;
use crate::pipeline::detection_logger::DetectionLogger;
use crate::shared::frame::Frame;

/// Output of one detection cycle. Applied by full replacement.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionBatch {
    pub detections: Vec<FaceDetection>,
    pub stats: DetectionStats,
}

impl DetectionBatch {
    pub fn from_detections(detections: Vec<FaceDetection>) -> Self {
        let stats = DetectionStats::from_detections(&detections);
        Self { detections, stats }
    }

    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}

/// Runs the analyzer on a frame and turns its output into [`FaceDetection`]s.
///
/// The analyzer is optional so the use case can exist before the models have
/// loaded; until one is installed every cycle yields an empty batch.
pub struct DetectFacesUseCase {
    analyzer: Option<Box<dyn FaceAnalyzer>>,
    mask_classifier: Box<dyn MaskClassifier>,
    logger: Box<dyn DetectionLogger>,
}

impl DetectFacesUseCase {
    pub fn new(
        analyzer: Option<Box<dyn FaceAnalyzer>>,
        mask_classifier: Box<dyn MaskClassifier>,
        logger: Box<dyn DetectionLogger>,
    ) -> Self {
        Self {
            analyzer,
            mask_classifier,
            logger,
        }
    }

    pub fn install_analyzer(&mut self, analyzer: Box<dyn FaceAnalyzer>) {
        self.analyzer = Some(analyzer);
    }

    pub fn is_ready(&self) -> bool {
        self.analyzer.is_some()
    }

    /// One detection cycle. Never fails: inference errors are logged and
    /// produce an empty batch, and the next cycle simply tries again.
    pub fn execute(&mut self, frame: &Frame, confidence_threshold: f64) -> DetectionBatch {
        let Some(analyzer) = self.analyzer.as_mut() else {
            warn!("Detection requested before models are ready");
            return DetectionBatch::default();
        };

        let t0 = Instant::now();
        let faces = match analyzer.analyze(frame, confidence_threshold) {
            Ok(faces) => faces,
            Err(e) => {
                error!("Error during face detection: {e}");
                self.logger.cycle(0);
                return DetectionBatch::default();
            }
        };
        self.logger
            .timing("analyze", t0.elapsed().as_secs_f64() * 1000.0);

        let t1 = Instant::now();
        let detections: Vec<FaceDetection> = faces
            .into_iter()
            .map(|face| {
                let mask = self.mask_classifier.classify(
                    frame,
                    &face.bbox,
                    face.landmarks.as_ref(),
                );
                FaceDetection::new(
                    face.bbox,
                    face.score,
                    EmotionResult::from_scores(face.expressions),
                    mask,
                )
            })
            .collect();
        self.logger
            .timing("classify", t1.elapsed().as_secs_f64() * 1000.0);
        self.logger.cycle(detections.len());

        DetectionBatch::from_detections(detections)
    }

    pub fn logger(&self) -> &dyn DetectionLogger {
        self.logger.as_ref()
    }
}
