use iced::mouse;
use iced::widget::canvas::{self, Frame, Path, Stroke, Text};
use iced::{Color, Element, Length, Pixels, Point, Rectangle, Renderer, Size, Theme};

use facelens_core::detection::domain::detection_settings::DetectionSettings;
use facelens_core::detection::domain::face_detection::FaceDetection;
use facelens_core::overlay::overlay_renderer::{render_overlay, DisplaySize, OverlayBox};

use crate::theme::{muted_color, tone_color};

const BORDER_WIDTH: f32 = 2.0;
const CORNER_TICK: f32 = 12.0;
const LABEL_SIZE: f32 = 12.0;
const LABEL_HEIGHT: f32 = 20.0;
const LABEL_GAP: f32 = 6.0;
const LABEL_PAD_X: f32 = 6.0;
/// Rough advance per character for sizing label chips.
const CHAR_WIDTH: f32 = LABEL_SIZE * 0.62;

/// Draws detection boxes over the video area.
///
/// Boxes are laid out by `render_overlay` against the canvas bounds at draw
/// time, so they follow the widget size.
struct OverlayCanvas<'a> {
    detections: &'a [FaceDetection],
    settings: DetectionSettings,
}

impl<Message> canvas::Program<Message> for OverlayCanvas<'_> {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        let display = DisplaySize::new(bounds.width as f64, bounds.height as f64);

        for item in render_overlay(self.detections, &self.settings, display) {
            draw_box(&mut frame, theme, &item);
        }

        vec![frame.into_geometry()]
    }
}

fn draw_box(frame: &mut Frame, theme: &Theme, item: &OverlayBox) {
    let color = tone_color(theme, item.tone);
    let origin = Point::new(item.rect.x as f32, item.rect.y as f32);
    let size = Size::new(item.rect.width as f32, item.rect.height as f32);

    frame.fill_rectangle(origin, size, Color { a: 0.06, ..color });
    frame.stroke(
        &Path::rectangle(origin, size),
        Stroke::default().with_color(color).with_width(BORDER_WIDTH),
    );
    draw_corners(frame, origin, size, color);

    let mut x = origin.x;
    let label_y = origin.y - LABEL_GAP - LABEL_HEIGHT;
    if let Some(mask) = item.mask_label {
        x += draw_chip(frame, Point::new(x, label_y), mask.text, color) + LABEL_GAP;
    }
    if let Some(emotion) = &item.emotion_label {
        draw_chip(
            frame,
            Point::new(x, label_y),
            emotion,
            theme.palette().primary,
        );
    }

    frame.fill_text(Text {
        content: item.confidence_caption.clone(),
        position: Point::new(origin.x, origin.y + size.height + LABEL_GAP),
        color: muted_color(theme),
        size: Pixels(LABEL_SIZE),
        ..Text::default()
    });
}

/// Heavier L-shaped ticks just outside each corner.
fn draw_corners(frame: &mut Frame, origin: Point, size: Size, color: Color) {
    let o = BORDER_WIDTH * 2.0;
    let (left, top) = (origin.x - o, origin.y - o);
    let (right, bottom) = (origin.x + size.width + o, origin.y + size.height + o);
    let tick = CORNER_TICK.min(size.width / 2.0).min(size.height / 2.0);

    let corners = Path::new(|p| {
        for (cx, cy, dx, dy) in [
            (left, top, 1.0, 1.0),
            (right, top, -1.0, 1.0),
            (left, bottom, 1.0, -1.0),
            (right, bottom, -1.0, -1.0),
        ] {
            p.move_to(Point::new(cx + dx * tick, cy));
            p.line_to(Point::new(cx, cy));
            p.line_to(Point::new(cx, cy + dy * tick));
        }
    });
    frame.stroke(
        &corners,
        Stroke::default()
            .with_color(color)
            .with_width(BORDER_WIDTH),
    );
}

/// Rounded label chip. Returns its width.
fn draw_chip(frame: &mut Frame, at: Point, label: &str, color: Color) -> f32 {
    let width = label.chars().count() as f32 * CHAR_WIDTH + LABEL_PAD_X * 2.0;
    let chip = Path::rounded_rectangle(at, Size::new(width, LABEL_HEIGHT), 4.0.into());
    frame.fill(&chip, Color { a: 0.2, ..color });
    frame.stroke(
        &chip,
        Stroke::default()
            .with_color(Color { a: 0.5, ..color })
            .with_width(1.0),
    );
    frame.fill_text(Text {
        content: label.to_owned(),
        position: Point::new(at.x + LABEL_PAD_X, at.y + (LABEL_HEIGHT - LABEL_SIZE) / 2.0),
        color,
        size: Pixels(LABEL_SIZE),
        ..Text::default()
    });
    width
}

pub fn overlay_canvas<'a, Message: 'a>(
    detections: &'a [FaceDetection],
    settings: DetectionSettings,
) -> Element<'a, Message> {
    canvas::Canvas::new(OverlayCanvas {
        detections,
        settings,
    })
    .width(Length::Fill)
    .height(Length::Fill)
    .into()
}
