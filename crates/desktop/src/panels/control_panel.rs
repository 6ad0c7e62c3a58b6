use iced::border::Border;
use iced::widget::{button, checkbox, column, container, row, slider, text, Space};
use iced::{Element, Length, Theme};

use facelens_core::detection::domain::detection_settings::DetectionSettings;
use facelens_core::shared::constants::{
    CONFIDENCE_SLIDER_MAX, CONFIDENCE_SLIDER_MIN, CONFIDENCE_SLIDER_STEP,
};

use crate::app::{scaled, Message, ModelStatus};
use crate::theme::{muted_color, surface_color, tertiary_color};
use crate::widgets::primary_button::{primary_button, ButtonAccent};

pub struct ControlView<'a> {
    pub settings: DetectionSettings,
    pub model_status: &'a ModelStatus,
    pub is_live: bool,
    /// The camera is being opened; pressing the button again cancels.
    pub is_camera_starting: bool,
    pub has_detections: bool,
    pub webcam_hovered: bool,
}

pub fn view<'a>(controls: ControlView<'a>, fs: f32, theme: &Theme) -> Element<'a, Message> {
    let muted = muted_color(theme);
    let primary = theme.palette().primary;
    let loading = matches!(controls.model_status, ModelStatus::Loading(_));
    let settings = controls.settings;

    let is_live = controls.is_live;
    let (webcam_label, accent) = if is_live {
        ("\u{25A0}  Stop Webcam", ButtonAccent::Danger)
    } else if controls.is_camera_starting {
        ("Starting Webcam\u{2026}  (cancel)", ButtonAccent::Danger)
    } else {
        ("\u{25B6}  Start Webcam", ButtonAccent::Primary)
    };
    let webcam_button = primary_button(
        move || {
            text(webcam_label)
                .size(scaled(15.0, fs))
                .width(Length::Fill)
                .align_x(iced::Alignment::Center)
                .into()
        },
        (!loading).then_some(Message::ToggleWebcam),
        accent,
        controls.webcam_hovered,
        Message::WebcamButtonHover,
    );

    let upload_button = button(
        text("\u{2B06}  Upload Image")
            .size(scaled(15.0, fs))
            .width(Length::Fill)
            .align_x(iced::Alignment::Center),
    )
    .on_press_maybe((!loading).then_some(Message::UploadImage))
    .padding([12, 20])
    .width(Length::Fill)
    .style(button::secondary);

    let percent = settings.confidence_percent();
    let threshold = column![
        row![
            text("Confidence Threshold")
                .size(scaled(13.0, fs))
                .color(muted),
            Space::new().width(Length::Fill),
            text(format!("{percent}%")).size(scaled(13.0, fs)).color(primary),
        ]
        .align_y(iced::Alignment::Center),
        slider(
            CONFIDENCE_SLIDER_MIN..=CONFIDENCE_SLIDER_MAX,
            percent,
            Message::ConfidenceChanged,
        )
        .step(CONFIDENCE_SLIDER_STEP),
    ]
    .spacing(8);

    let toggles = column![
        checkbox(settings.show_bounding_boxes)
            .label("Bounding Boxes")
            .on_toggle(Message::BoundingBoxesToggled)
            .text_size(scaled(13.0, fs)),
        checkbox(settings.show_emotions)
            .label("\u{1F60A} Show Emotions")
            .on_toggle(Message::EmotionsToggled)
            .text_size(scaled(13.0, fs)),
        checkbox(settings.show_mask_status)
            .label("\u{1F637} Show Mask Status")
            .on_toggle(Message::MaskStatusToggled)
            .text_size(scaled(13.0, fs)),
    ]
    .spacing(12);

    let clear_button = button(text("Clear Detections").size(scaled(13.0, fs)))
        .on_press_maybe(controls.has_detections.then_some(Message::ClearDetections))
        .padding([8, 16])
        .style(button::text);

    card(
        column![
            text("Controls").size(scaled(15.0, fs)).color(primary),
            column![webcam_button, upload_button].spacing(10),
            threshold,
            toggles,
            row![model_status_line(controls.model_status, fs, theme), clear_button]
                .align_y(iced::Alignment::Center),
        ]
        .spacing(20)
        .into(),
        theme,
    )
}

/// Static explainer under the controls.
pub fn about_card<'a>(fs: f32, theme: &Theme) -> Element<'a, Message> {
    let tertiary = tertiary_color(theme);
    card(
        column![
            text("About This App")
                .size(scaled(13.0, fs))
                .color(theme.palette().primary),
            text(
                "Face detection and emotion recognition run locally through ONNX \
                 Runtime. No image data leaves this machine."
            )
            .size(scaled(12.0, fs))
            .color(tertiary),
            text(
                "\u{26A0}\u{FE0F} Note: Mask detection is simulated in this demo. \
                 A production system would use a trained CNN model."
            )
            .size(scaled(12.0, fs))
            .color(theme.palette().warning),
        ]
        .spacing(8)
        .into(),
        theme,
    )
}

fn model_status_line<'a>(status: &ModelStatus, fs: f32, theme: &Theme) -> Element<'a, Message> {
    let (label, color) = match status {
        ModelStatus::Loading(_) => ("Loading models\u{2026}", tertiary_color(theme)),
        ModelStatus::Ready => ("\u{25CF} Models ready", theme.palette().success),
        ModelStatus::Failed => ("\u{25CF} Models unavailable", theme.palette().danger),
    };
    container(text(label).size(scaled(12.0, fs)).color(color))
        .width(Length::Fill)
        .into()
}

fn card<'a>(content: Element<'a, Message>, theme: &Theme) -> Element<'a, Message> {
    let surface = surface_color(theme);
    container(content)
        .padding(18)
        .width(Length::Fill)
        .style(move |_theme: &Theme| container::Style {
            background: Some(surface.into()),
            border: Border {
                radius: 14.0.into(),
                ..Border::default()
            },
            ..container::Style::default()
        })
        .into()
}
