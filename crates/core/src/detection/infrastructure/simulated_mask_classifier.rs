use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::detection::domain::face_landmarks::FaceLandmarks;
use crate::detection::domain::mask_classifier::{MaskAssessment, MaskClassifier};
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

/// Probability cut: a draw above this counts as "mask".
const MASK_DRAW_CUTOFF: f64 = 0.6;

/// Placeholder mask "classifier" that ignores the image entirely.
///
/// Each call draws `u ~ U[0, 1)`; `u > 0.6` means masked. Confidence is drawn
/// from `[0.75, 0.95)` for masked faces and `[0.80, 0.95)` otherwise. Results
/// are random and differ between runs unless built with [`Self::seeded`].
pub struct SimulatedMaskClassifier {
    rng: StdRng,
}

impl SimulatedMaskClassifier {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for SimulatedMaskClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl MaskClassifier for SimulatedMaskClassifier {
    fn classify(
        &mut self,
        _frame: &Frame,
        _bbox: &FaceBox,
        _landmarks: Option<&FaceLandmarks>,
    ) -> MaskAssessment {
        let has_mask = self.rng.gen::<f64>() > MASK_DRAW_CUTOFF;
        let spread: f64 = self.rng.gen();
        let confidence = if has_mask {
            0.75 + spread * 0.2
        } else {
            0.8 + spread * 0.15
        };
        MaskAssessment {
            has_mask,
            confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draw(classifier: &mut SimulatedMaskClassifier) -> MaskAssessment {
        let frame = Frame::new(vec![0u8; 3], 1, 1, 0);
        classifier.classify(&frame, &FaceBox::new(0.0, 0.0, 1.0, 1.0), None)
    }

    #[test]
    fn test_confidence_ranges() {
        let mut classifier = SimulatedMaskClassifier::seeded(42);
        for _ in 0..1000 {
            let a = draw(&mut classifier);
            if a.has_mask {
                assert!((0.75..0.95).contains(&a.confidence));
            } else {
                assert!((0.8..0.95).contains(&a.confidence));
            }
        }
    }

    #[test]
    fn test_mask_rate_is_roughly_forty_percent() {
        let mut classifier = SimulatedMaskClassifier::seeded(7);
        let masked = (0..10_000).filter(|_| draw(&mut classifier).has_mask).count();
        assert!((3_500..4_500).contains(&masked), "masked = {masked}");
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let mut a = SimulatedMaskClassifier::seeded(3);
        let mut b = SimulatedMaskClassifier::seeded(3);
        for _ in 0..20 {
            assert_eq!(draw(&mut a), draw(&mut b));
        }
    }
}
