/// YOLO face + keypoint detector using ONNX Runtime via `ort`.
///
/// Handles letterbox preprocessing, inference and NMS post-processing. Boxes
/// and keypoints come back in source-frame pixel coordinates.
use std::path::Path;

use crate::detection::domain::face_landmarks::{FaceLandmarks, Point};
use crate::shared::face_box::FaceBox;
use crate::shared::frame::Frame;

use super::execution_provider::build_session;

/// Fallback model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

const NMS_IOU_THRESH: f64 = 0.45;

/// 5 landmarks × (x, y, conf).
const NUM_KEYPOINT_VALUES: usize = 15;

const KEYPOINT_CONF_THRESH: f64 = 0.5;

/// Letterbox padding value (114/255 gray, YOLO convention).
const PAD_VALUE: f32 = 114.0 / 255.0;

/// A face box straight out of the detector, after NMS.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectedFace {
    pub bbox: FaceBox,
    pub score: f64,
    pub landmarks: Option<FaceLandmarks>,
}

pub struct OnnxYoloFaceDetector {
    session: ort::session::Session,
    input_size: u32,
}

impl OnnxYoloFaceDetector {
    /// Loads the model. The input resolution is read from its NCHW input
    /// shape, falling back to 640 when the shape is dynamic.
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = build_session(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| match input.dtype() {
                ort::value::ValueType::Tensor { shape, .. } if shape.len() >= 4 && shape[2] > 0 => {
                    Some(shape[2] as u32)
                }
                _ => None,
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        Ok(Self {
            session,
            input_size,
        })
    }

    pub fn detect(
        &mut self,
        frame: &Frame,
        min_confidence: f64,
    ) -> Result<Vec<DetectedFace>, Box<dyn std::error::Error>> {
        if frame.width() == 0 || frame.height() == 0 {
            return Ok(Vec::new());
        }
        let (input, letterbox) = letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(input)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("face model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        if shape.len() != 3 {
            return Err(format!("unexpected face model output shape: {shape:?}").into());
        }
        // [1, features, detections] is the usual export; [1, detections, features] also occurs.
        let transposed = shape[1] < shape[2];
        let (num_dets, num_feats) = if transposed {
            (shape[2], shape[1])
        } else {
            (shape[1], shape[2])
        };
        let data = tensor.as_slice().ok_or("cannot get face model output slice")?;

        let mut candidates = Vec::new();
        let mut row = vec![0.0f32; num_feats];
        for i in 0..num_dets {
            for (f, value) in row.iter_mut().enumerate() {
                *value = if transposed {
                    data[f * num_dets + i]
                } else {
                    data[i * num_feats + f]
                };
            }
            if let Some(face) = parse_row(&row, &letterbox, min_confidence) {
                candidates.push(face);
            }
        }

        Ok(nms(candidates, NMS_IOU_THRESH))
    }
}

/// Mapping from model-input coordinates back to the source frame.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Letterbox {
    scale: f64,
    pad_x: f64,
    pad_y: f64,
}

impl Letterbox {
    fn to_source(self, x: f64, y: f64) -> Point {
        ((x - self.pad_x) / self.scale, (y - self.pad_y) / self.scale)
    }
}

/// Row layout: `[cx, cy, w, h, conf, kp0_x, kp0_y, kp0_conf, ...]`.
fn parse_row(row: &[f32], letterbox: &Letterbox, min_confidence: f64) -> Option<DetectedFace> {
    if row.len() < 5 {
        return None;
    }
    let score = row[4] as f64;
    if score < min_confidence {
        return None;
    }
    let (cx, cy, w, h) = (row[0] as f64, row[1] as f64, row[2] as f64, row[3] as f64);
    let (x1, y1) = letterbox.to_source(cx - w / 2.0, cy - h / 2.0);
    let (x2, y2) = letterbox.to_source(cx + w / 2.0, cy + h / 2.0);

    let landmarks = (row.len() >= 5 + NUM_KEYPOINT_VALUES).then(|| {
        let mut points = [None; 5];
        for (k, point) in points.iter_mut().enumerate() {
            let base = 5 + k * 3;
            if row[base + 2] as f64 >= KEYPOINT_CONF_THRESH {
                *point = Some(letterbox.to_source(row[base] as f64, row[base + 1] as f64));
            }
        }
        FaceLandmarks::new(points)
    });

    Some(DetectedFace {
        bbox: FaceBox::from_corners(x1, y1, x2, y2),
        score,
        landmarks,
    })
}

/// Resizes `frame` into a gray-padded `target_size` square, keeping aspect ratio.
///
/// Returns the NCHW float32 tensor and the inverse mapping.
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, Letterbox) {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    let size = target_size as usize;
    let mut tensor = ndarray::Array4::<f32>::from_elem((1, 3, size, size), PAD_VALUE);

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    // Nearest-neighbour sampling
    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..Frame::CHANNELS {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    (
        tensor,
        Letterbox {
            scale,
            pad_x: pad_x as f64,
            pad_y: pad_y as f64,
        },
    )
}

/// Greedy NMS: highest score first, drop anything overlapping a kept box.
fn nms(mut faces: Vec<DetectedFace>, iou_thresh: f64) -> Vec<DetectedFace> {
    faces.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<DetectedFace> = Vec::with_capacity(faces.len());
    for face in faces {
        if keep.iter().all(|k| k.bbox.iou(&face.bbox) <= iou_thresh) {
            keep.push(face);
        }
    }
    keep
}
