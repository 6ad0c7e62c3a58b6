//! Maps detections into display space and decides what each box shows.

use serde::Serialize;

use crate::detection::domain::detection_settings::DetectionSettings;
use crate::detection::domain::face_detection::{FaceDetection, FaceId};
use crate::shared::constants::{OVERLAY_BASE_HEIGHT, OVERLAY_BASE_WIDTH};
use crate::shared::face_box::FaceBox;

/// Size of the surface the overlay is drawn on, in logical pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplaySize {
    pub width: f64,
    pub height: f64,
}

impl DisplaySize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Per-axis factors from the 640x480 detection space.
    pub fn scale(&self) -> (f64, f64) {
        (
            self.width / OVERLAY_BASE_WIDTH,
            self.height / OVERLAY_BASE_HEIGHT,
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Success,
    Danger,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MaskLabel {
    pub text: &'static str,
    pub tone: Tone,
}

impl MaskLabel {
    pub const MASK: MaskLabel = MaskLabel {
        text: "✓ Mask",
        tone: Tone::Success,
    };
    pub const NO_MASK: MaskLabel = MaskLabel {
        text: "✗ No Mask",
        tone: Tone::Danger,
    };
}

/// One box to draw, already in display coordinates.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayBox {
    pub id: FaceId,
    pub rect: FaceBox,
    /// Border tone, always derived from mask status.
    pub tone: Tone,
    pub mask_label: Option<MaskLabel>,
    pub emotion_label: Option<String>,
    pub confidence_caption: String,
}

/// Everything the view needs to draw the detection overlay.
///
/// Returns nothing at all when bounding boxes are switched off; otherwise one
/// [`OverlayBox`] per detection at or above the confidence threshold.
pub fn render_overlay(
    detections: &[FaceDetection],
    settings: &DetectionSettings,
    display: DisplaySize,
) -> Vec<OverlayBox> {
    if !settings.show_bounding_boxes {
        return Vec::new();
    }
    let (sx, sy) = display.scale();

    detections
        .iter()
        .filter(|d| d.confidence >= settings.confidence_threshold)
        .map(|d| {
            let mask = if d.has_mask {
                MaskLabel::MASK
            } else {
                MaskLabel::NO_MASK
            };
            OverlayBox {
                id: d.id,
                rect: d.bbox.scaled(sx, sy),
                tone: mask.tone,
                mask_label: settings.show_mask_status.then_some(mask),
                emotion_label: settings.show_emotions.then(|| {
                    let emotion = d.emotion.emotion;
                    format!("{} {}", emotion.emoji(), emotion.label())
                }),
                confidence_caption: confidence_caption(d.confidence),
            }
        })
        .collect()
}

pub fn confidence_caption(confidence: f64) -> String {
    format!("{:.0}% confident", confidence * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::emotion::{Emotion, EmotionResult, EmotionScores};
    use crate::detection::domain::mask_classifier::MaskAssessment;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn detection(bbox: FaceBox, confidence: f64, has_mask: bool) -> FaceDetection {
        FaceDetection::new(
            bbox,
            confidence,
            EmotionResult::from_scores(EmotionScores::from_pairs(&[(Emotion::Surprised, 0.7)])),
            MaskAssessment {
                has_mask,
                confidence: 0.85,
            },
        )
    }

    fn default_box() -> FaceBox {
        FaceBox::new(100.0, 50.0, 40.0, 40.0)
    }

    #[test]
    fn test_threshold_filters_low_confidence() {
        let detections: Vec<_> = [0.3, 0.6, 0.5]
            .iter()
            .map(|&c| detection(default_box(), c, false))
            .collect();
        let settings = DetectionSettings::default();
        let boxes = render_overlay(&detections, &settings, DisplaySize::new(640.0, 480.0));
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0].id, detections[1].id);
        assert_eq!(boxes[1].id, detections[2].id);
    }

    #[test]
    fn test_scales_into_display_space() {
        let detections = vec![detection(default_box(), 0.9, true)];
        let boxes = render_overlay(
            &detections,
            &DetectionSettings::default(),
            DisplaySize::new(1280.0, 960.0),
        );
        let rect = boxes[0].rect;
        assert_relative_eq!(rect.x, 200.0);
        assert_relative_eq!(rect.y, 100.0);
        assert_relative_eq!(rect.width, 80.0);
        assert_relative_eq!(rect.height, 80.0);
    }

    #[test]
    fn test_axes_scale_independently() {
        let detections = vec![detection(default_box(), 0.9, true)];
        let boxes = render_overlay(
            &detections,
            &DetectionSettings::default(),
            DisplaySize::new(320.0, 960.0),
        );
        assert_eq!(boxes[0].rect, FaceBox::new(50.0, 100.0, 20.0, 80.0));
    }

    #[test]
    fn test_boxes_hidden_hides_everything() {
        let detections = vec![detection(default_box(), 0.9, true)];
        let settings = DetectionSettings {
            show_bounding_boxes: false,
            ..Default::default()
        };
        assert!(render_overlay(&detections, &settings, DisplaySize::new(640.0, 480.0)).is_empty());
    }

    #[rstest]
    #[case::masked(true, MaskLabel::MASK, Tone::Success)]
    #[case::unmasked(false, MaskLabel::NO_MASK, Tone::Danger)]
    fn test_mask_label(#[case] has_mask: bool, #[case] label: MaskLabel, #[case] tone: Tone) {
        let detections = vec![detection(default_box(), 0.9, has_mask)];
        let boxes = render_overlay(
            &detections,
            &DetectionSettings::default(),
            DisplaySize::new(640.0, 480.0),
        );
        assert_eq!(boxes[0].mask_label, Some(label));
        assert_eq!(boxes[0].tone, tone);
    }

    #[test]
    fn test_labels_follow_toggles() {
        let detections = vec![detection(default_box(), 0.87, false)];
        let settings = DetectionSettings {
            show_emotions: false,
            show_mask_status: false,
            ..Default::default()
        };
        let boxes = render_overlay(&detections, &settings, DisplaySize::new(640.0, 480.0));
        assert!(boxes[0].mask_label.is_none());
        assert!(boxes[0].emotion_label.is_none());
        assert_eq!(boxes[0].tone, Tone::Danger);
        assert_eq!(boxes[0].confidence_caption, "87% confident");
    }

    #[test]
    fn test_emotion_label_has_emoji_and_name() {
        let detections = vec![detection(default_box(), 0.9, false)];
        let boxes = render_overlay(
            &detections,
            &DetectionSettings::default(),
            DisplaySize::new(640.0, 480.0),
        );
        assert_eq!(boxes[0].emotion_label.as_deref(), Some("\u{1F632} surprised"));
    }

    #[rstest]
    #[case(0.5, "50% confident")]
    #[case(0.996, "100% confident")]
    #[case(0.0, "0% confident")]
    fn test_confidence_caption(#[case] confidence: f64, #[case] expected: &str) {
        assert_eq!(confidence_caption(confidence), expected);
    }
}
