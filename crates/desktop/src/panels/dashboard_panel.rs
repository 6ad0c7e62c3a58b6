use iced::widget::{column, row};
use iced::{Element, Theme};

use facelens_core::detection::domain::detection_stats::{DetectionStats, EmotionDistribution};

use crate::app::Message;
use crate::widgets::emotion_chart::emotion_chart;
use crate::widgets::stats_card::stats_card;

/// Stats tiles over the emotion chart.
///
/// `cycles_per_second` is the measured live detection rate, if any.
pub fn view<'a>(
    stats: &DetectionStats,
    cycles_per_second: Option<f64>,
    fs: f32,
    theme: &Theme,
) -> Element<'a, Message> {
    let palette = theme.palette();
    let rate = detection_rate_label(stats, cycles_per_second);

    let cards = row![
        stats_card(
            "Total Faces",
            stats.total_faces.to_string(),
            palette.primary,
            fs,
            theme
        ),
        stats_card(
            "With Mask",
            stats.with_mask.to_string(),
            palette.success,
            fs,
            theme
        ),
        stats_card(
            "No Mask",
            stats.without_mask.to_string(),
            palette.danger,
            fs,
            theme
        ),
        stats_card("Detection Rate", rate, palette.warning, fs, theme),
    ]
    .spacing(12);

    column![
        cards,
        emotion_chart(&EmotionDistribution::from_stats(stats), fs, theme),
    ]
    .spacing(16)
    .into()
}

fn detection_rate_label(stats: &DetectionStats, cycles_per_second: Option<f64>) -> String {
    match cycles_per_second {
        Some(hz) if stats.total_faces > 0 => format!("{hz:.0} FPS"),
        _ => "\u{2014}".to_owned(),
    }
}
