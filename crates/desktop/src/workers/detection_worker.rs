use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};

use facelens_core::detection::domain::face_analyzer::FaceAnalyzer;
use facelens_core::detection::domain::mask_classifier::MaskClassifier;
use facelens_core::pipeline::detect_faces_use_case::{DetectFacesUseCase, DetectionBatch};
use facelens_core::pipeline::detection_logger::StdoutDetectionLogger;
use facelens_core::pipeline::detection_loop::CycleTicket;
use facelens_core::pipeline::detection_session::CycleRequest;

enum Command {
    InstallAnalyzer(Box<dyn FaceAnalyzer>),
    Detect(CycleRequest),
}

pub struct CycleResult {
    pub ticket: CycleTicket,
    pub batch: DetectionBatch,
}

/// Owns the detection use case on its own thread.
///
/// Requests are handled in order, so an analyzer installed before a request
/// is always used for it.
pub struct DetectionWorker {
    commands: Option<Sender<Command>>,
    results: Receiver<CycleResult>,
    handle: Option<JoinHandle<()>>,
}

impl DetectionWorker {
    pub fn spawn(mask_classifier: Box<dyn MaskClassifier>) -> Self {
        let (command_tx, command_rx) = crossbeam_channel::unbounded::<Command>();
        let (result_tx, result_rx) = crossbeam_channel::unbounded();

        let handle = thread::spawn(move || {
            let mut use_case = DetectFacesUseCase::new(
                None,
                mask_classifier,
                Box::new(StdoutDetectionLogger::default()),
            );
            for command in command_rx {
                match command {
                    Command::InstallAnalyzer(analyzer) => use_case.install_analyzer(analyzer),
                    Command::Detect(request) => {
                        let batch =
                            use_case.execute(&request.frame, request.confidence_threshold);
                        let result = CycleResult {
                            ticket: request.ticket,
                            batch,
                        };
                        if result_tx.send(result).is_err() {
                            break;
                        }
                    }
                }
            }
            use_case.logger().summary();
        });

        Self {
            commands: Some(command_tx),
            results: result_rx,
            handle: Some(handle),
        }
    }

    pub fn install_analyzer(&self, analyzer: Box<dyn FaceAnalyzer>) {
        self.send(Command::InstallAnalyzer(analyzer));
    }

    pub fn submit(&self, request: CycleRequest) {
        self.send(Command::Detect(request));
    }

    /// Completed cycles, oldest first, without blocking.
    pub fn drain(&self) -> Vec<CycleResult> {
        self.results.try_iter().collect()
    }

    fn send(&self, command: Command) {
        let sent = self
            .commands
            .as_ref()
            .is_some_and(|tx| tx.send(command).is_ok());
        if !sent {
            log::warn!("Detection worker is gone, dropping command");
        }
    }
}

impl Drop for DetectionWorker {
    fn drop(&mut self) {
        self.commands.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
