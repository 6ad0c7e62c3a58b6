use log::debug;

use crate::detection::domain::emotion::EmotionScores;
use crate::detection::domain::face_analyzer::{AnalyzedFace, FaceAnalyzer};
use crate::shared::frame::Frame;

use super::onnx_emotion_classifier::OnnxEmotionClassifier;
use super::onnx_yolo_face_detector::OnnxYoloFaceDetector;

/// Face boxes, landmarks and expressions from the two ONNX models.
///
/// Expressions are classified on the face crop; a face whose crop is empty
/// or fails classification keeps all-zero scores (and so reads as neutral).
pub struct OnnxFaceAnalyzer {
    detector: OnnxYoloFaceDetector,
    emotions: OnnxEmotionClassifier,
}

impl OnnxFaceAnalyzer {
    pub fn new(detector: OnnxYoloFaceDetector, emotions: OnnxEmotionClassifier) -> Self {
        Self { detector, emotions }
    }
}

impl FaceAnalyzer for OnnxFaceAnalyzer {
    fn analyze(
        &mut self,
        frame: &Frame,
        min_confidence: f64,
    ) -> Result<Vec<AnalyzedFace>, Box<dyn std::error::Error>> {
        let faces = self.detector.detect(frame, min_confidence)?;
        let mut analyzed = Vec::with_capacity(faces.len());
        for face in faces {
            let expressions = match frame.crop(&face.bbox) {
                Some(crop) => self.emotions.classify(&crop).unwrap_or_else(|e| {
                    debug!("Expression classification failed: {e}");
                    EmotionScores::default()
                }),
                None => EmotionScores::default(),
            };
            analyzed.push(AnalyzedFace {
                bbox: face.bbox,
                score: face.score,
                landmarks: face.landmarks,
                expressions,
            });
        }
        Ok(analyzed)
    }
}
