use thiserror::Error;

use crate::shared::frame::Frame;

/// Why a capture device could not be started.
///
/// The display strings are shown to users verbatim; `detail` keeps the
/// underlying cause for logs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Camera permission denied. Please allow camera access in your system settings.")]
    PermissionDenied { detail: String },
    #[error("No camera found. Please connect a camera and try again.")]
    DeviceNotFound { detail: String },
    #[error("Camera is in use by another application. Please close other apps and try again.")]
    DeviceBusy { detail: String },
    #[error("Failed to access webcam")]
    Unknown { detail: String },
}

impl CaptureError {
    pub fn detail(&self) -> &str {
        match self {
            CaptureError::PermissionDenied { detail }
            | CaptureError::DeviceNotFound { detail }
            | CaptureError::DeviceBusy { detail }
            | CaptureError::Unknown { detail } => detail,
        }
    }
}

/// A live source of frames, typically a camera.
///
/// `poll_frame` never blocks: it hands over the newest frame decoded since the
/// previous call, or `None` if nothing new arrived.
pub trait CaptureSource: Send {
    fn start(&mut self) -> Result<(), CaptureError>;

    /// Releases the device. Safe to call when not started.
    fn stop(&mut self);

    /// Whether the stream is still delivering frames.
    fn is_active(&self) -> bool;

    fn poll_frame(&mut self) -> Option<Frame>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::permission(
        CaptureError::PermissionDenied { detail: "EACCES".into() },
        "Camera permission denied. Please allow camera access in your system settings."
    )]
    #[case::not_found(
        CaptureError::DeviceNotFound { detail: "ENOENT".into() },
        "No camera found. Please connect a camera and try again."
    )]
    #[case::busy(
        CaptureError::DeviceBusy { detail: "EBUSY".into() },
        "Camera is in use by another application. Please close other apps and try again."
    )]
    #[case::unknown(CaptureError::Unknown { detail: "EIO".into() }, "Failed to access webcam")]
    fn test_user_facing_messages(#[case] error: CaptureError, #[case] message: &str) {
        assert_eq!(error.to_string(), message);
    }

    #[test]
    fn test_detail_is_kept_out_of_message() {
        let error = CaptureError::Unknown {
            detail: "Input/output error".into(),
        };
        assert_eq!(error.detail(), "Input/output error");
        assert!(!error.to_string().contains("Input/output"));
    }
}
