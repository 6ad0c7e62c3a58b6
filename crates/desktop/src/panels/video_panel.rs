use iced::border::Border;
use iced::widget::{column, container, image, row, stack, text, Space};
use iced::{Color, ContentFit, Element, Length, Theme};

use facelens_core::capture::domain::capture_source::CaptureError;
use facelens_core::detection::domain::detection_settings::DetectionSettings;
use facelens_core::detection::domain::face_detection::FaceDetection;
use facelens_core::shared::constants::MODEL_LOAD_FAILED_MESSAGE;

use crate::app::{scaled, Message, ModelStatus};
use crate::theme::{surface_color, tertiary_color};
use crate::widgets::overlay_canvas::overlay_canvas;

const PANEL_HEIGHT: f32 = 480.0;

pub struct VideoView<'a> {
    pub picture: Option<&'a image::Handle>,
    pub detections: &'a [FaceDetection],
    pub settings: DetectionSettings,
    pub model_status: &'a ModelStatus,
    pub is_live: bool,
    pub is_detecting: bool,
    pub webcam_error: Option<&'a CaptureError>,
}

pub fn view<'a>(video: VideoView<'a>, fs: f32, theme: &Theme) -> Element<'a, Message> {
    let content: Element<'a, Message> = match (video.picture, video.model_status) {
        (Some(handle), _) => picture_with_overlay(&video, handle.clone(), fs, theme),
        (None, ModelStatus::Loading(progress)) => loading_state(*progress, fs, theme),
        (None, _) => empty_state(&video, fs, theme),
    };

    let surface = surface_color(theme);
    container(content)
        .width(Length::Fill)
        .height(PANEL_HEIGHT)
        .clip(true)
        .style(move |theme: &Theme| container::Style {
            background: Some(surface.into()),
            border: Border {
                color: Color {
                    a: 0.25,
                    ..theme.palette().primary
                },
                width: 1.0,
                radius: 14.0.into(),
            },
            ..container::Style::default()
        })
        .into()
}

fn picture_with_overlay<'a>(
    video: &VideoView<'a>,
    handle: image::Handle,
    fs: f32,
    theme: &Theme,
) -> Element<'a, Message> {
    let picture = image(handle)
        .width(Length::Fill)
        .height(Length::Fill)
        .content_fit(ContentFit::Fill);

    let mut badges = row![].padding(12).spacing(8).width(Length::Fill);
    if video.is_live {
        badges = badges.push(badge("\u{25CF} LIVE", theme.palette().danger, fs));
    }
    badges = badges.push(Space::new().width(Length::Fill));
    if video.is_detecting {
        badges = badges.push(badge("Detecting\u{2026}", theme.palette().primary, fs));
    }

    stack![
        picture,
        overlay_canvas(video.detections, video.settings),
        badges,
    ]
    .width(Length::Fill)
    .height(Length::Fill)
    .into()
}

fn badge<'a>(label: &'a str, color: Color, fs: f32) -> Element<'a, Message> {
    container(text(label).size(scaled(11.0, fs)).color(color))
        .padding([3, 8])
        .style(move |_theme: &Theme| container::Style {
            background: Some(Color::from_rgba(0.0, 0.0, 0.0, 0.55).into()),
            border: Border {
                color: Color { a: 0.5, ..color },
                width: 1.0,
                radius: 6.0.into(),
            },
            ..container::Style::default()
        })
        .into()
}

fn loading_state<'a>(
    progress: Option<(&'static str, u64, u64)>,
    fs: f32,
    theme: &Theme,
) -> Element<'a, Message> {
    let tertiary = tertiary_color(theme);
    let detail = match progress {
        Some((model, downloaded, total)) if total > 0 => {
            let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
            format!("Downloading {model}\u{2026} {pct}%")
        }
        Some((model, downloaded, _)) => format!("Downloading {model}\u{2026} {downloaded} bytes"),
        None => "This may take a few seconds".to_owned(),
    };

    centered(
        column![
            text("Loading AI Models...")
                .size(scaled(18.0, fs))
                .color(theme.palette().primary),
            text(detail).size(scaled(13.0, fs)).color(tertiary),
        ]
        .spacing(8)
        .align_x(iced::Alignment::Center)
        .into(),
    )
}

fn empty_state<'a>(video: &VideoView<'a>, fs: f32, theme: &Theme) -> Element<'a, Message> {
    let tertiary = tertiary_color(theme);
    let danger = theme.palette().danger;

    let mut col = column![
        text("No Video Feed").size(scaled(18.0, fs)),
        text("Start the webcam or upload an image")
            .size(scaled(13.0, fs))
            .color(tertiary),
    ]
    .spacing(8)
    .align_x(iced::Alignment::Center);

    if let ModelStatus::Failed = video.model_status {
        col = col.push(
            text(MODEL_LOAD_FAILED_MESSAGE)
                .size(scaled(13.0, fs))
                .color(danger),
        );
    }
    if let Some(error) = video.webcam_error {
        col = col.push(text(error.to_string()).size(scaled(13.0, fs)).color(danger));
    }

    centered(col.into())
}

fn centered(content: Element<'_, Message>) -> Element<'_, Message> {
    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .padding(24)
        .into()
}
