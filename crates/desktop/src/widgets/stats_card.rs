use iced::border::Border;
use iced::widget::{column, container, text};
use iced::{Color, Element, Length, Theme};

use crate::app::scaled;
use crate::theme::{surface_color, tertiary_color};

/// Dashboard tile: small caption over a large value, with an accent edge.
pub fn stats_card<'a, Message: 'a>(
    title: &'a str,
    value: String,
    accent: Color,
    fs: f32,
    theme: &Theme,
) -> Element<'a, Message> {
    let tertiary = tertiary_color(theme);
    let surface = surface_color(theme);

    let content = column![
        text(title.to_uppercase())
            .size(scaled(11.0, fs))
            .color(tertiary),
        text(value)
            .size(scaled(26.0, fs))
            .color(accent)
            .font(iced::Font {
                weight: iced::font::Weight::Bold,
                ..iced::Font::DEFAULT
            }),
    ]
    .spacing(4);

    container(content)
        .padding([14, 16])
        .width(Length::Fill)
        .style(move |_theme: &Theme| container::Style {
            background: Some(surface.into()),
            border: Border {
                color: Color { a: 0.35, ..accent },
                width: 1.0,
                radius: 12.0.into(),
            },
            ..container::Style::default()
        })
        .into()
}
