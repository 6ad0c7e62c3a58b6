pub mod emotion_chart;
pub mod overlay_canvas;
pub mod primary_button;
pub mod stats_card;
