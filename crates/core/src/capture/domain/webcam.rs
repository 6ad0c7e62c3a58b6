use log::{info, warn};

use crate::capture::domain::capture_source::{CaptureError, CaptureSource};
use crate::shared::frame::Frame;

/// Observable state of the webcam controller.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CaptureState {
    pub is_active: bool,
    pub error: Option<CaptureError>,
}

/// Start/stop controller around a [`CaptureSource`].
///
/// Tracks whether the stream is live and the last start failure. The device
/// is released when the controller is dropped.
pub struct Webcam {
    source: Box<dyn CaptureSource>,
    state: CaptureState,
}

impl Webcam {
    pub fn new(source: Box<dyn CaptureSource>) -> Self {
        Self {
            source,
            state: CaptureState::default(),
        }
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active
    }

    /// Starts streaming. A previous error is cleared first; on failure the
    /// new error is kept in the state and also returned.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        self.state.error = None;
        if self.state.is_active {
            return Ok(());
        }
        match self.source.start() {
            Ok(()) => {
                info!("Webcam started");
                self.state.is_active = true;
                Ok(())
            }
            Err(e) => {
                warn!("Webcam failed to start: {e} ({})", e.detail());
                self.source.stop();
                self.state.error = Some(e.clone());
                Err(e)
            }
        }
    }

    pub fn stop(&mut self) {
        self.source.stop();
        if self.state.is_active {
            info!("Webcam stopped");
        }
        self.state.is_active = false;
    }

    pub fn toggle(&mut self) -> Result<(), CaptureError> {
        if self.state.is_active {
            self.stop();
            Ok(())
        } else {
            self.start()
        }
    }

    /// Newest frame since the last poll.
    ///
    /// A source that ended on its own (device unplugged, replay file finished)
    /// flips the controller back to inactive.
    pub fn poll_frame(&mut self) -> Option<Frame> {
        if !self.state.is_active {
            return None;
        }
        let frame = self.source.poll_frame();
        if frame.is_none() && !self.source.is_active() {
            warn!("Capture stream ended");
            self.stop();
        }
        frame
    }
}

impl Drop for Webcam {
    fn drop(&mut self) {
        self.source.stop();
    }
}
