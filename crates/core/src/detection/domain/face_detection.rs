use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Serialize, Serializer};

use crate::detection::domain::emotion::EmotionResult;
use crate::detection::domain::mask_classifier::MaskAssessment;
use crate::shared::face_box::FaceBox;

static NEXT_FACE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique detection identifier, rendered as `face-N`.
///
/// Identifiers only ever increase; they never correlate faces across cycles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FaceId(u64);

impl FaceId {
    pub fn next() -> Self {
        Self(NEXT_FACE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "face-{}", self.0)
    }
}

impl Serialize for FaceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceDetection {
    pub id: FaceId,
    pub bbox: FaceBox,
    pub emotion: EmotionResult,
    pub has_mask: bool,
    pub mask_confidence: f64,
    pub confidence: f64,
}

impl FaceDetection {
    pub fn new(bbox: FaceBox, confidence: f64, emotion: EmotionResult, mask: MaskAssessment) -> Self {
        Self {
            id: FaceId::next(),
            bbox,
            emotion,
            has_mask: mask.has_mask,
            mask_confidence: mask.confidence,
            confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::emotion::{Emotion, EmotionScores};

    fn detection() -> FaceDetection {
        FaceDetection::new(
            FaceBox::new(1.0, 2.0, 3.0, 4.0),
            0.9,
            EmotionResult::from_scores(EmotionScores::from_pairs(&[(Emotion::Happy, 0.8)])),
            MaskAssessment {
                has_mask: true,
                confidence: 0.8,
            },
        )
    }

    #[test]
    fn test_ids_strictly_increase() {
        let a = FaceId::next();
        let b = FaceId::next();
        let c = FaceId::next();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_id_display() {
        assert_eq!(FaceId(7).to_string(), "face-7");
    }

    #[test]
    fn test_new_copies_mask_assessment() {
        let d = detection();
        assert!(d.has_mask);
        assert_eq!(d.mask_confidence, 0.8);
        assert_eq!(d.emotion.emotion, Emotion::Happy);
    }

    #[test]
    fn test_serializes_with_string_id() {
        let json = serde_json::to_value(detection()).unwrap();
        assert!(json["id"].as_str().unwrap().starts_with("face-"));
        assert_eq!(json["hasMask"], true);
        assert_eq!(json["bbox"]["width"], 3.0);
        assert_eq!(json["emotion"]["emotion"], "happy");
    }
}
