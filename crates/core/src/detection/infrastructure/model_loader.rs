use std::path::PathBuf;

use log::info;
use thiserror::Error;

use super::model_resolver::{
    ModelAsset, ModelResolveError, ModelResolver, ProgressFn, EMOTION_MODEL, FACE_MODEL,
};
use super::onnx_emotion_classifier::OnnxEmotionClassifier;
use super::onnx_face_analyzer::OnnxFaceAnalyzer;
use super::onnx_yolo_face_detector::OnnxYoloFaceDetector;

#[derive(Error, Debug)]
pub enum ModelLoadError {
    #[error(transparent)]
    Resolve(#[from] ModelResolveError),
    #[error("failed to open {model}: {message}")]
    Session { model: &'static str, message: String },
}

/// Download progress across both models: `(model_name, downloaded, total)`.
pub type LoadProgressFn = std::sync::Arc<dyn Fn(&'static str, u64, u64) + Send + Sync>;

/// Resolves both model files and opens their inference sessions.
///
/// This is the slow startup step; callers run it off the UI thread.
pub fn load_face_analyzer(
    resolver: &ModelResolver,
    progress: Option<LoadProgressFn>,
) -> Result<OnnxFaceAnalyzer, ModelLoadError> {
    let face_path = resolve_with_progress(resolver, &FACE_MODEL, progress.clone())?;
    let emotion_path = resolve_with_progress(resolver, &EMOTION_MODEL, progress)?;

    let detector = OnnxYoloFaceDetector::new(&face_path).map_err(|e| ModelLoadError::Session {
        model: FACE_MODEL.name,
        message: e.to_string(),
    })?;
    let emotions =
        OnnxEmotionClassifier::new(&emotion_path).map_err(|e| ModelLoadError::Session {
            model: EMOTION_MODEL.name,
            message: e.to_string(),
        })?;

    info!(
        "Loaded models {} and {}",
        face_path.display(),
        emotion_path.display()
    );
    Ok(OnnxFaceAnalyzer::new(detector, emotions))
}

fn resolve_with_progress(
    resolver: &ModelResolver,
    asset: &ModelAsset,
    progress: Option<LoadProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    let name = asset.name;
    let callback = progress.map(|cb| -> ProgressFn {
        Box::new(move |downloaded, total| cb(name, downloaded, total))
    });
    resolver.resolve(asset, callback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_corrupt_model_reports_session_error() {
        let cache = TempDir::new().unwrap();
        std::fs::write(cache.path().join(FACE_MODEL.name), b"not an onnx model").unwrap();
        std::fs::write(cache.path().join(EMOTION_MODEL.name), b"not an onnx model").unwrap();

        let resolver = ModelResolver::new(cache.path().to_path_buf(), None);
        match load_face_analyzer(&resolver, None) {
            Err(ModelLoadError::Session { model, .. }) => assert_eq!(model, FACE_MODEL.name),
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("corrupt model must not load"),
        }
    }
}
