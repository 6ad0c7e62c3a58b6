//! Face, emotion and mask-status detection for live camera feeds and still images.
//!
//! Layout follows a domain / infrastructure split: `domain` modules hold plain
//! types and traits, `infrastructure` modules bind them to ONNX Runtime, ffmpeg
//! and the filesystem, and `pipeline` wires them into detection cycles.

pub mod shared {
    pub mod constants;
    pub mod face_box;
    pub mod frame;
}

pub mod detection {
    pub mod domain {
        pub mod detection_settings;
        pub mod detection_stats;
        pub mod emotion;
        pub mod face_analyzer;
        pub mod face_detection;
        pub mod face_landmarks;
        pub mod mask_classifier;
    }
    pub mod infrastructure;
}

pub mod capture {
    pub mod domain {
        pub mod capture_source;
        pub mod webcam;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod detect_faces_use_case;
    pub mod detection_logger;
    pub mod detection_loop;
    pub mod detection_session;
}

pub mod overlay {
    pub mod overlay_renderer;
}
