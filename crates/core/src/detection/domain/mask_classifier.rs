use serde::Serialize;

use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

/// Mask status of one face.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MaskAssessment {
    pub has_mask: bool,
    pub confidence: f64,
}

/// Domain interface for mask classification: face box + landmarks in,
/// mask flag + confidence out.
pub trait MaskClassifier: Send {
    fn classify(
        &mut self,
        frame: &Frame,
        bbox: &FaceBox,
        landmarks: Option<&FaceLandmarks>,
    ) -> MaskAssessment;
}
