use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, Sender};

use facelens_core::detection::infrastructure::model_loader::{self, LoadProgressFn};
use facelens_core::detection::infrastructure::model_resolver::ModelResolver;
use facelens_core::detection::infrastructure::onnx_face_analyzer::OnnxFaceAnalyzer;

pub enum ModelLoadMessage {
    DownloadProgress {
        model: &'static str,
        downloaded: u64,
        total: u64,
    },
    Loaded(OnnxFaceAnalyzer),
    Failed(String),
}

/// Resolve and load both models on a background thread.
///
/// Exactly one of `Loaded` or `Failed` is sent last. There is no retry.
pub fn spawn(bundled_dir: Option<PathBuf>) -> Receiver<ModelLoadMessage> {
    let (tx, rx) = crossbeam_channel::unbounded();

    thread::spawn(move || {
        let message = match load(&tx, bundled_dir) {
            Ok(analyzer) => ModelLoadMessage::Loaded(analyzer),
            Err(e) => {
                log::error!("Model loading failed: {e}");
                ModelLoadMessage::Failed(e.to_string())
            }
        };
        let _ = tx.send(message);
    });

    rx
}

fn load(
    tx: &Sender<ModelLoadMessage>,
    bundled_dir: Option<PathBuf>,
) -> Result<OnnxFaceAnalyzer, Box<dyn std::error::Error>> {
    let resolver = ModelResolver::platform(bundled_dir)?;
    log::info!("Model cache: {}", resolver.cache_dir().display());

    let tx_progress = tx.clone();
    let progress: LoadProgressFn = Arc::new(move |model, downloaded, total| {
        let _ = tx_progress.send(ModelLoadMessage::DownloadProgress {
            model,
            downloaded,
            total,
        });
    });

    Ok(model_loader::load_face_analyzer(&resolver, Some(progress))?)
}

/// Bundled models shipped next to the executable, if any.
pub fn bundled_models_dir() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let dir = exe.parent()?.join("models");
    dir.is_dir().then_some(dir)
}
