use serde::Serialize;

use crate::shared::constants::{
    CONFIDENCE_SLIDER_MAX, CONFIDENCE_SLIDER_MIN, CONFIDENCE_SLIDER_STEP,
    DEFAULT_CONFIDENCE_THRESHOLD,
};

/// User-adjustable detection and display options.
///
/// Replaced wholesale on every edit; nothing is persisted.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionSettings {
    pub confidence_threshold: f64,
    pub show_bounding_boxes: bool,
    pub show_emotions: bool,
    pub show_mask_status: bool,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            show_bounding_boxes: true,
            show_emotions: true,
            show_mask_status: true,
        }
    }
}

impl DetectionSettings {
    /// Returns a copy with the threshold clamped into `[0, 1]` (NaN becomes the default).
    pub fn validated(self) -> Self {
        let confidence_threshold = if self.confidence_threshold.is_nan() {
            DEFAULT_CONFIDENCE_THRESHOLD
        } else {
            self.confidence_threshold.clamp(0.0, 1.0)
        };
        Self {
            confidence_threshold,
            ..self
        }
    }

    pub fn with_confidence_threshold(self, threshold: f64) -> Self {
        Self {
            confidence_threshold: threshold,
            ..self
        }
        .validated()
    }

    /// Threshold as a slider percentage, snapped to the slider's step.
    pub fn confidence_percent(&self) -> u32 {
        let raw = (self.confidence_threshold * 100.0).round() as u32;
        let snapped = (raw + CONFIDENCE_SLIDER_STEP / 2) / CONFIDENCE_SLIDER_STEP
            * CONFIDENCE_SLIDER_STEP;
        snapped.clamp(CONFIDENCE_SLIDER_MIN, CONFIDENCE_SLIDER_MAX)
    }

    pub fn with_confidence_percent(self, percent: u32) -> Self {
        let percent = percent.clamp(CONFIDENCE_SLIDER_MIN, CONFIDENCE_SLIDER_MAX);
        self.with_confidence_threshold(f64::from(percent) / 100.0)
    }
}
