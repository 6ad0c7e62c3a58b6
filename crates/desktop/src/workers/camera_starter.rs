use std::thread;

use crossbeam_channel::Receiver;

use facelens_core::capture::domain::capture_source::{CaptureError, CaptureSource};
use facelens_core::capture::domain::webcam::Webcam;

pub enum CameraMessage {
    Started(Webcam),
    Failed(CaptureError),
}

/// Open `source` on a background thread.
///
/// Opening a device can take seconds (mode negotiation, the macOS permission
/// prompt), so the caller polls the receiver instead of waiting. Dropping the
/// receiver before the answer arrives cancels the start: the started webcam
/// is dropped on the worker thread, which releases the device.
pub fn spawn(source: Box<dyn CaptureSource>) -> Receiver<CameraMessage> {
    let (tx, rx) = crossbeam_channel::bounded(1);

    thread::spawn(move || {
        let mut webcam = Webcam::new(source);
        let message = match webcam.start() {
            Ok(()) => CameraMessage::Started(webcam),
            Err(e) => CameraMessage::Failed(e),
        };
        if tx.send(message).is_err() {
            log::debug!("Webcam start cancelled");
        }
    });

    rx
}
