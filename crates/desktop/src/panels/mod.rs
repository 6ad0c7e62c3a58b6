pub mod control_panel;
pub mod dashboard_panel;
pub mod video_panel;
