pub mod execution_provider;
pub mod model_loader;
pub mod model_resolver;
pub mod onnx_emotion_classifier;
pub mod onnx_face_analyzer;
pub mod onnx_yolo_face_detector;
pub mod simulated_mask_classifier;
