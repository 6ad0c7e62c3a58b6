pub mod camera_starter;
pub mod detection_worker;
pub mod model_loader;
