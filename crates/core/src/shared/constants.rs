use std::time::Duration;

pub const YOLO_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const YOLO_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

pub const EMOTION_MODEL_NAME: &str = "emotion-ferplus-8.onnx";
pub const EMOTION_MODEL_URL: &str =
    "https://github.com/onnx/models/raw/main/validated/vision/body_analysis/emotion_ferplus/model/emotion-ferplus-8.onnx";

/// Minimum spacing between two live detection cycles.
pub const DETECTION_INTERVAL: Duration = Duration::from_millis(100);

/// Source resolution the overlay assumes when scaling boxes into display space.
pub const OVERLAY_BASE_WIDTH: f64 = 640.0;
pub const OVERLAY_BASE_HEIGHT: f64 = 480.0;

/// Resolution requested from capture devices.
pub const PREFERRED_CAPTURE_WIDTH: u32 = 1280;
pub const PREFERRED_CAPTURE_HEIGHT: u32 = 720;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.5;

/// Confidence slider bounds, in percent.
pub const CONFIDENCE_SLIDER_MIN: u32 = 10;
pub const CONFIDENCE_SLIDER_MAX: u32 = 90;
pub const CONFIDENCE_SLIDER_STEP: u32 = 5;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];

pub const MODEL_LOAD_FAILED_MESSAGE: &str =
    "Failed to load face detection models. Please restart the application.";
pub const MODELS_NOT_READY_MESSAGE: &str = "Please wait for AI models to load";
