use std::path::PathBuf;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use iced::border::Border;
use iced::widget::{button, column, container, image, row, scrollable, stack, text, Space};
use iced::{Color, Element, Length, Subscription, Task, Theme};

use facelens_core::capture::domain::capture_source::CaptureError;
use facelens_core::capture::domain::webcam::Webcam;
use facelens_core::capture::infrastructure::ffmpeg_camera_source::{
    CaptureInput, FfmpegCameraSource,
};
use facelens_core::capture::infrastructure::image_file_loader::load_image_frame;
use facelens_core::detection::domain::detection_settings::DetectionSettings;
use facelens_core::detection::infrastructure::simulated_mask_classifier::SimulatedMaskClassifier;
use facelens_core::pipeline::detection_session::DetectionSession;
use facelens_core::shared::constants::{
    IMAGE_EXTENSIONS, MODELS_NOT_READY_MESSAGE, MODEL_LOAD_FAILED_MESSAGE,
};
use facelens_core::shared::frame::Frame;

use crate::cycle_rate::CycleRate;
use crate::panels::control_panel::{self, ControlView};
use crate::panels::dashboard_panel;
use crate::panels::video_panel::{self, VideoView};
use crate::theme;
use crate::toasts::{ToastKind, Toasts};
use crate::workers::camera_starter::{self, CameraMessage};
use crate::workers::detection_worker::DetectionWorker;
use crate::workers::model_loader::{self, ModelLoadMessage};

/// Worker channels and toast expiry are checked at this rate.
const POLL_INTERVAL: Duration = Duration::from_millis(50);
const FONT_SCALE: f32 = 1.0;

// ---------------------------------------------------------------------------
// Model status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ModelStatus {
    /// Latest download progress as `(model, downloaded, total)`, if any.
    Loading(Option<(&'static str, u64, u64)>),
    Ready,
    Failed,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Message {
    ToggleWebcam,
    WebcamButtonHover(bool),
    UploadImage,
    ImagePicked(Option<PathBuf>),
    ConfidenceChanged(u32),
    BoundingBoxesToggled(bool),
    EmotionsToggled(bool),
    MaskStatusToggled(bool),
    ClearDetections,
    DismissToast(usize),
    /// A display frame was presented.
    Refresh(Instant),
    Poll,
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    session: DetectionSession,
    /// Present only once the device has actually started.
    webcam: Option<Webcam>,
    /// Pending device open; dropping it cancels the start.
    camera_rx: Option<Receiver<CameraMessage>>,
    webcam_error: Option<CaptureError>,
    worker: DetectionWorker,
    model_rx: Option<Receiver<ModelLoadMessage>>,
    model_status: ModelStatus,
    /// Newest frame from the live source.
    live_frame: Option<Frame>,
    /// What the video panel shows: the live frame or the loaded image.
    picture: Option<image::Handle>,
    cycle_rate: CycleRate,
    toasts: Toasts,
    webcam_hovered: bool,
    theme: Theme,
}

impl App {
    pub fn new() -> (Self, Task<Message>) {
        (
            Self {
                session: DetectionSession::new(DetectionSettings::default()),
                webcam: None,
                camera_rx: None,
                webcam_error: None,
                worker: DetectionWorker::spawn(Box::new(SimulatedMaskClassifier::new())),
                model_rx: Some(model_loader::spawn(model_loader::bundled_models_dir())),
                model_status: ModelStatus::Loading(None),
                live_frame: None,
                picture: None,
                cycle_rate: CycleRate::default(),
                toasts: Toasts::default(),
                webcam_hovered: false,
                theme: theme::resolve_theme(),
            },
            Task::none(),
        )
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::ToggleWebcam => {
                if self.webcam.is_some() {
                    self.stop_webcam();
                } else if self.camera_rx.take().is_some() {
                    log::info!("Webcam start cancelled");
                } else {
                    self.start_webcam();
                }
            }
            Message::WebcamButtonHover(hovered) => {
                self.webcam_hovered = hovered;
            }
            Message::UploadImage => {
                if !self.session.is_model_ready() {
                    self.toasts.error(MODELS_NOT_READY_MESSAGE, Instant::now());
                    return Task::none();
                }
                return Task::perform(
                    async {
                        rfd::AsyncFileDialog::new()
                            .set_title("Select an image")
                            .add_filter("Images", IMAGE_EXTENSIONS)
                            .pick_file()
                            .await
                            .map(|h| h.path().to_path_buf())
                    },
                    Message::ImagePicked,
                );
            }
            Message::ImagePicked(Some(path)) => self.load_image(path),
            Message::ImagePicked(None) => {}
            Message::ConfidenceChanged(percent) => {
                let settings = self.session.settings().with_confidence_percent(percent);
                self.apply_settings(settings);
            }
            Message::BoundingBoxesToggled(show) => {
                self.apply_settings(DetectionSettings {
                    show_bounding_boxes: show,
                    ..*self.session.settings()
                });
            }
            Message::EmotionsToggled(show) => {
                self.apply_settings(DetectionSettings {
                    show_emotions: show,
                    ..*self.session.settings()
                });
            }
            Message::MaskStatusToggled(show) => {
                self.apply_settings(DetectionSettings {
                    show_mask_status: show,
                    ..*self.session.settings()
                });
            }
            Message::ClearDetections => {
                self.session.clear();
            }
            Message::DismissToast(index) => {
                self.toasts.dismiss(index);
            }
            Message::Refresh(now) => self.on_refresh(now),
            Message::Poll => {
                let now = Instant::now();
                self.poll_camera(now);
                self.poll_model_loader(now);
                self.poll_detections(now);
                self.toasts.expire(now);
            }
        }
        Task::none()
    }

    fn start_webcam(&mut self) {
        self.webcam_error = None;
        let source = FfmpegCameraSource::new(CaptureInput::default());
        self.camera_rx = Some(camera_starter::spawn(Box::new(source)));
    }

    /// Goes live once the pending device open reports back.
    fn poll_camera(&mut self, now: Instant) {
        let Some(rx) = &self.camera_rx else {
            return;
        };
        let message = match rx.try_recv() {
            Ok(message) => message,
            Err(crossbeam_channel::TryRecvError::Empty) => return,
            Err(crossbeam_channel::TryRecvError::Disconnected) => {
                CameraMessage::Failed(CaptureError::Unknown {
                    detail: "camera thread exited without an answer".into(),
                })
            }
        };
        self.camera_rx = None;
        match message {
            CameraMessage::Started(webcam) => {
                self.picture = None;
                self.live_frame = None;
                self.cycle_rate.reset();
                self.webcam = Some(webcam);
                self.session.start_live();
            }
            CameraMessage::Failed(e) => {
                log::warn!("Webcam unavailable: {e}");
                self.toasts.error(e.to_string(), now);
                self.webcam_error = Some(e);
            }
        }
    }

    fn stop_webcam(&mut self) {
        if let Some(mut webcam) = self.webcam.take() {
            webcam.stop();
        }
        self.session.stop_live();
        self.live_frame = None;
        self.picture = None;
    }

    fn load_image(&mut self, path: PathBuf) {
        self.camera_rx = None;
        if self.webcam.is_some() {
            self.stop_webcam();
        }
        let frame = match load_image_frame(&path) {
            Ok(frame) => frame,
            Err(e) => {
                log::error!("{e}");
                self.toasts
                    .error(format!("Could not open {}", path.display()), Instant::now());
                return;
            }
        };
        log::info!(
            "Loaded {} ({}x{})",
            path.display(),
            frame.width(),
            frame.height()
        );

        self.picture = Some(to_handle(&frame));
        match self.session.load_image(frame) {
            Some(request) => self.worker.submit(request),
            None => self.toasts.error(MODELS_NOT_READY_MESSAGE, Instant::now()),
        }
    }

    fn apply_settings(&mut self, settings: DetectionSettings) {
        if let Some(request) = self.session.update_settings(settings) {
            self.worker.submit(request);
        }
    }

    fn on_refresh(&mut self, now: Instant) {
        let Some(webcam) = self.webcam.as_mut() else {
            return;
        };
        if let Some(frame) = webcam.poll_frame() {
            self.picture = Some(to_handle(&frame));
            self.live_frame = Some(frame);
        }
        if !webcam.is_active() {
            let error = webcam.state().error.clone();
            self.stop_webcam();
            if let Some(e) = &error {
                self.toasts.error(e.to_string(), now);
            }
            self.webcam_error = error;
            return;
        }
        if let Some(request) = self.session.on_refresh(now, self.live_frame.as_ref()) {
            self.worker.submit(request);
        }
    }

    fn poll_model_loader(&mut self, now: Instant) {
        let Some(rx) = &self.model_rx else {
            return;
        };
        let messages: Vec<_> = rx.try_iter().collect();
        for message in messages {
            match message {
                ModelLoadMessage::DownloadProgress {
                    model,
                    downloaded,
                    total,
                } => {
                    self.model_status = ModelStatus::Loading(Some((model, downloaded, total)));
                }
                ModelLoadMessage::Loaded(analyzer) => {
                    log::info!("Models loaded");
                    self.worker.install_analyzer(Box::new(analyzer));
                    self.session.set_model_ready(true);
                    self.model_status = ModelStatus::Ready;
                    self.model_rx = None;
                }
                ModelLoadMessage::Failed(reason) => {
                    log::error!("{reason}");
                    self.model_status = ModelStatus::Failed;
                    self.toasts.error(MODEL_LOAD_FAILED_MESSAGE, now);
                    self.model_rx = None;
                }
            }
        }
    }

    fn poll_detections(&mut self, now: Instant) {
        for result in self.worker.drain() {
            if !self.session.apply(result.ticket, result.batch) {
                log::debug!("Discarded stale detection cycle");
                continue;
            }
            if self.session.is_live() {
                self.cycle_rate.record(now);
            }
            if let Some(stats) = self.session.take_image_report() {
                let faces = stats.total_faces;
                self.toasts
                    .success(format!("Detected {faces} face(s) in the image"), now);
            }
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let fs = FONT_SCALE;
        let theme = &self.theme;

        let video = video_panel::view(
            VideoView {
                picture: self.picture.as_ref(),
                detections: self.session.detections(),
                settings: *self.session.settings(),
                model_status: &self.model_status,
                is_live: self.session.is_live(),
                is_detecting: self.session.is_detecting(),
                webcam_error: self.webcam_error.as_ref(),
            },
            fs,
            theme,
        );
        let rate = if self.session.is_live() {
            self.cycle_rate.per_second(Instant::now())
        } else {
            None
        };
        let dashboard = dashboard_panel::view(self.session.stats(), rate, fs, theme);
        let controls = control_panel::view(
            ControlView {
                settings: *self.session.settings(),
                model_status: &self.model_status,
                is_live: self.session.is_live(),
                is_camera_starting: self.camera_rx.is_some(),
                has_detections: !self.session.detections().is_empty(),
                webcam_hovered: self.webcam_hovered,
            },
            fs,
            theme,
        );

        let main = row![
            column![video, dashboard]
                .spacing(16)
                .width(Length::FillPortion(2)),
            column![controls, control_panel::about_card(fs, theme)]
                .spacing(16)
                .width(Length::FillPortion(1)),
        ]
        .spacing(20);

        let page = column![header(fs, theme), main].spacing(20).padding(24);
        let body = scrollable(page).height(Length::Fill);

        stack![body, self.toast_layer(fs)]
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn toast_layer(&self, fs: f32) -> Element<'_, Message> {
        let palette = self.theme.palette();
        let items = self
            .toasts
            .iter()
            .enumerate()
            .map(|(i, toast)| {
                let accent = match toast.kind {
                    ToastKind::Success => palette.success,
                    ToastKind::Error => palette.danger,
                };
                let background = palette.background;
                button(text(toast.text.clone()).size(scaled(13.0, fs)))
                    .on_press(Message::DismissToast(i))
                    .padding([10, 14])
                    .style(move |_theme: &Theme, _status: button::Status| button::Style {
                        background: Some(background.into()),
                        text_color: accent,
                        border: Border {
                            color: accent,
                            width: 1.0,
                            radius: 10.0.into(),
                        },
                        ..button::Style::default()
                    })
                    .into()
            })
            .collect::<Vec<Element<'_, Message>>>();

        container(column(items).spacing(8).width(360))
            .width(Length::Fill)
            .height(Length::Fill)
            .align_x(iced::alignment::Horizontal::Right)
            .align_y(iced::alignment::Vertical::Bottom)
            .padding(24)
            .into()
    }

    pub fn theme(&self) -> Theme {
        self.theme.clone()
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let poll = iced::time::every(POLL_INTERVAL).map(|_| Message::Poll);
        if self.session.is_live() {
            Subscription::batch([poll, iced::window::frames().map(Message::Refresh)])
        } else {
            poll
        }
    }
}

fn header<'a>(fs: f32, theme: &Theme) -> Element<'a, Message> {
    let tertiary = crate::theme::tertiary_color(theme);
    let tags = ["Real-time AI", "Mask Detection", "Emotion Recognition"]
        .into_iter()
        .map(|tag| {
            container(text(tag).size(scaled(11.0, fs)).color(tertiary))
                .padding([3, 10])
                .style(|theme: &Theme| container::Style {
                    border: Border {
                        color: Color {
                            a: 0.2,
                            ..theme.palette().text
                        },
                        width: 1.0,
                        radius: 10.0.into(),
                    },
                    ..container::Style::default()
                })
                .into()
        })
        .collect::<Vec<Element<'a, Message>>>();

    row![
        text("FaceLens")
            .size(scaled(26.0, fs))
            .color(theme.palette().primary)
            .font(iced::Font {
                weight: iced::font::Weight::Bold,
                ..iced::Font::DEFAULT
            }),
        Space::new().width(Length::Fill),
        row(tags).spacing(8),
    ]
    .align_y(iced::Alignment::Center)
    .into()
}

fn to_handle(frame: &Frame) -> image::Handle {
    image::Handle::from_rgba(frame.width(), frame.height(), frame.to_rgba())
}

/// Scale a base font size by the font scale.
pub fn scaled(base: f32, font_scale: f32) -> f32 {
    (base * font_scale).round()
}
