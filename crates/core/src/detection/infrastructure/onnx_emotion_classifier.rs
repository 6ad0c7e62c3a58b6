/// FER+ facial expression classifier using ONNX Runtime.
///
/// Takes a face crop, feeds a 64x64 grayscale tensor of raw 0-255 intensities
/// and turns the eight output logits into the seven supported labels.
use std::path::Path;

use image::imageops::{self, FilterType};

use crate::detection::domain::emotion::{Emotion, EmotionScores};
use crate::shared::frame::Frame;

use super::execution_provider::build_session;

const INPUT_SIZE: u32 = 64;

/// FER+ output order. `None` marks "contempt", which has no counterpart here.
const OUTPUT_LABELS: [Option<Emotion>; 8] = [
    Some(Emotion::Neutral),
    Some(Emotion::Happy),
    Some(Emotion::Surprised),
    Some(Emotion::Sad),
    Some(Emotion::Angry),
    Some(Emotion::Disgusted),
    Some(Emotion::Fearful),
    None,
];

pub struct OnnxEmotionClassifier {
    session: ort::session::Session,
}

impl OnnxEmotionClassifier {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            session: build_session(model_path)?,
        })
    }

    pub fn classify(&mut self, face: &Frame) -> Result<EmotionScores, Box<dyn std::error::Error>> {
        let tensor = preprocess(face).ok_or("face crop is empty")?;
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("emotion model produced no outputs".into());
        }
        let logits = outputs[0].try_extract_array::<f32>()?;
        let logits = logits.as_slice().ok_or("cannot get emotion logits slice")?;
        if logits.len() < OUTPUT_LABELS.len() {
            return Err(format!("expected {} emotion logits, got {}", OUTPUT_LABELS.len(), logits.len()).into());
        }
        Ok(scores_from_logits(logits))
    }
}

/// Grayscale, resize to 64x64, NCHW with unnormalized intensities.
fn preprocess(face: &Frame) -> Option<ndarray::Array4<f32>> {
    let rgb = image::RgbImage::from_raw(face.width(), face.height(), face.data().to_vec())?;
    if rgb.width() == 0 || rgb.height() == 0 {
        return None;
    }
    let gray = imageops::grayscale(&rgb);
    let resized = imageops::resize(&gray, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);

    let size = INPUT_SIZE as usize;
    let tensor = ndarray::Array4::from_shape_fn((1, 1, size, size), |(_, _, y, x)| {
        resized.get_pixel(x as u32, y as u32).0[0] as f32
    });
    Some(tensor)
}

/// Softmax over the labels we keep; contempt is discarded before normalizing.
fn scores_from_logits(logits: &[f32]) -> EmotionScores {
    let kept: Vec<(Emotion, f64)> = OUTPUT_LABELS
        .iter()
        .zip(logits)
        .filter_map(|(label, &logit)| label.map(|e| (e, logit as f64)))
        .collect();

    let max = kept
        .iter()
        .map(|&(_, l)| l)
        .fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<(Emotion, f64)> = kept.iter().map(|&(e, l)| (e, (l - max).exp())).collect();
    let sum: f64 = exps.iter().map(|&(_, v)| v).sum();
    if !sum.is_finite() || sum <= 0.0 {
        return EmotionScores::default();
    }

    let mut scores = EmotionScores::default();
    for (emotion, v) in exps {
        scores.set(emotion, v / sum);
    }
    scores
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::emotion::EmotionResult;
    use approx::assert_relative_eq;

    #[test]
    fn test_scores_sum_to_one_over_seven_labels() {
        let scores = scores_from_logits(&[1.0, 2.0, 0.5, -1.0, 0.0, 0.3, 0.2, 5.0]);
        let total: f64 = scores.iter().map(|(_, s)| s).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_contempt_is_ignored() {
        // Contempt dominates the raw logits but must not leak into any label
        let scores = scores_from_logits(&[0.0, 3.0, 0.0, 0.0, 0.0, 0.0, 0.0, 10.0]);
        assert_eq!(EmotionResult::from_scores(scores).emotion, Emotion::Happy);
    }

    #[test]
    fn test_output_order_mapping() {
        let scores = scores_from_logits(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 4.0, 0.0]);
        assert_eq!(EmotionResult::from_scores(scores).emotion, Emotion::Fearful);
        let scores = scores_from_logits(&[0.0, 0.0, 4.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(EmotionResult::from_scores(scores).emotion, Emotion::Surprised);
    }

    #[test]
    fn test_non_finite_logits_yield_zero_scores() {
        let scores = scores_from_logits(&[f32::NAN; 8]);
        assert_eq!(scores, EmotionScores::default());
    }

    #[test]
    fn test_preprocess_shape_and_range() {
        let face = Frame::new(vec![200u8; 30 * 20 * 3], 30, 20, 0);
        let tensor = preprocess(&face).unwrap();
        assert_eq!(tensor.shape(), &[1, 1, 64, 64]);
        assert_relative_eq!(tensor[[0, 0, 10, 10]], 200.0, epsilon = 1.0);
    }
}
