use crate::detection::domain::emotion::EmotionScores;
use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

/// One face as reported by the inference backend, before any of our own
/// interpretation (dominant emotion, mask status, identifiers).
#[derive(Clone, Debug, PartialEq)]
pub struct AnalyzedFace {
    pub bbox: FaceBox,
    pub score: f64,
    pub landmarks: Option<FaceLandmarks>,
    pub expressions: EmotionScores,
}

/// Domain interface for the face / landmark / expression inference capability.
///
/// Implementations filter by `min_confidence` themselves, hence the argument.
pub trait FaceAnalyzer: Send {
    fn analyze(
        &mut self,
        frame: &Frame,
        min_confidence: f64,
    ) -> Result<Vec<AnalyzedFace>, Box<dyn std::error::Error>>;
}
