use iced::border::Border;
use iced::widget::{column, container, row, text, Space};
use iced::{color, Color, Element, Length, Theme};

use facelens_core::detection::domain::detection_stats::{EmotionBar, EmotionDistribution};
use facelens_core::detection::domain::emotion::Emotion;

use crate::app::scaled;
use crate::theme::{muted_color, surface_color, tertiary_color};

const BAR_HEIGHT: f32 = 8.0;
const BAR_RESOLUTION: f64 = 1000.0;

pub fn emotion_color(emotion: Emotion, theme: &Theme) -> Color {
    let palette = theme.palette();
    match emotion {
        Emotion::Happy => palette.success,
        Emotion::Sad => color!(0x3b, 0x82, 0xf6),
        Emotion::Angry => palette.danger,
        Emotion::Neutral => muted_color(theme),
        Emotion::Surprised => palette.warning,
        Emotion::Fearful => color!(0xa8, 0x55, 0xf7),
        Emotion::Disgusted => color!(0x15, 0x80, 0x3d),
    }
}

/// Horizontal bar per emotion, lengths relative to the most frequent one.
pub fn emotion_chart<'a, Message: 'a>(
    distribution: &EmotionDistribution,
    fs: f32,
    theme: &Theme,
) -> Element<'a, Message> {
    let rows = distribution
        .bars
        .iter()
        .map(|bar| bar_row(bar, fs, theme))
        .collect::<Vec<_>>();

    let surface = surface_color(theme);
    container(
        column![
            text("Emotion Distribution")
                .size(scaled(14.0, fs))
                .color(theme.palette().primary),
            column(rows).spacing(10),
        ]
        .spacing(14),
    )
    .padding(16)
    .width(Length::Fill)
    .style(move |_theme: &Theme| container::Style {
        background: Some(surface.into()),
        border: Border {
            radius: 12.0.into(),
            ..Border::default()
        },
        ..container::Style::default()
    })
    .into()
}

fn bar_row<'a, Message: 'a>(bar: &EmotionBar, fs: f32, theme: &Theme) -> Element<'a, Message> {
    let tertiary = tertiary_color(theme);
    let fill_color = emotion_color(bar.emotion, theme);
    let track_color = Color { a: 0.12, ..theme.palette().text };

    let header = row![
        text(format!("{} {}", bar.emotion.emoji(), bar.emotion)).size(scaled(13.0, fs)),
        Space::new().width(Length::Fill),
        text(format!("{} ({:.0}%)", bar.count, bar.percentage))
            .size(scaled(12.0, fs))
            .color(tertiary),
    ]
    .align_y(iced::Alignment::Center);

    let (filled, empty) = fill_portions(bar.fill);
    let mut track = row![].height(BAR_HEIGHT);
    if filled > 0 {
        track = track.push(segment(fill_color, filled));
    }
    if empty > 0 {
        track = track.push(Space::new().width(Length::FillPortion(empty)));
    }

    let track = container(track)
        .width(Length::Fill)
        .style(move |_theme: &Theme| container::Style {
            background: Some(track_color.into()),
            border: Border {
                radius: (BAR_HEIGHT / 2.0).into(),
                ..Border::default()
            },
            ..container::Style::default()
        });

    column![header, track].spacing(4).into()
}

fn segment<'a, Message: 'a>(fill: Color, portion: u16) -> Element<'a, Message> {
    container(Space::new())
        .width(Length::FillPortion(portion))
        .height(BAR_HEIGHT)
        .style(move |_theme: &Theme| container::Style {
            background: Some(fill.into()),
            border: Border {
                radius: (BAR_HEIGHT / 2.0).into(),
                ..Border::default()
            },
            ..container::Style::default()
        })
        .into()
}

/// Splits a `[0, 1]` fill into filled/empty `FillPortion` weights.
fn fill_portions(fill: f64) -> (u16, u16) {
    let filled = (fill.clamp(0.0, 1.0) * BAR_RESOLUTION).round() as u16;
    (filled, BAR_RESOLUTION as u16 - filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, (0, 1000))]
    #[case(1.0, (1000, 0))]
    #[case(0.5, (500, 500))]
    #[case(1.7, (1000, 0))]
    #[case(-0.2, (0, 1000))]
    fn test_fill_portions(#[case] fill: f64, #[case] expected: (u16, u16)) {
        assert_eq!(fill_portions(fill), expected);
    }
}
