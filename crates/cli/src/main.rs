use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use facelens_core::capture::domain::webcam::Webcam;
use facelens_core::capture::infrastructure::ffmpeg_camera_source::{
    CaptureInput, FfmpegCameraSource,
};
use facelens_core::capture::infrastructure::image_file_loader::load_image_frame;
use facelens_core::detection::domain::detection_settings::DetectionSettings;
use facelens_core::detection::domain::detection_stats::{DetectionStats, EmotionDistribution};
use facelens_core::detection::infrastructure::model_loader::{load_face_analyzer, LoadProgressFn};
use facelens_core::detection::infrastructure::model_resolver::ModelResolver;
use facelens_core::detection::infrastructure::simulated_mask_classifier::SimulatedMaskClassifier;
use facelens_core::overlay::overlay_renderer::{DisplaySize, OverlayBox};
use facelens_core::pipeline::detect_faces_use_case::{DetectFacesUseCase, DetectionBatch};
use facelens_core::pipeline::detection_logger::{
    DetectionLogger, NullDetectionLogger, StdoutDetectionLogger,
};
use facelens_core::pipeline::detection_session::DetectionSession;
use facelens_core::shared::constants::MODEL_LOAD_FAILED_MESSAGE;

/// Refresh clock driving the live loop, roughly one display frame.
const REFRESH_PERIOD: Duration = Duration::from_millis(16);

/// Face, emotion and mask-status detection for images and camera feeds.
#[derive(Parser)]
#[command(name = "facelens", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory with pre-downloaded model files.
    #[arg(long, global = true)]
    models_dir: Option<PathBuf>,

    /// Seed the simulated mask classifier for reproducible output.
    #[arg(long, global = true)]
    mask_seed: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a single image file.
    Image(ImageArgs),
    /// Run live detection on a camera (or replay a video file).
    Webcam(WebcamArgs),
}

#[derive(Args)]
struct OverlayArgs {
    /// Detection confidence threshold (0.0-1.0).
    #[arg(long, default_value = "0.5")]
    confidence: f64,

    /// Display size the overlay is scaled to, as WIDTHxHEIGHT.
    #[arg(long, default_value = "640x480", value_parser = parse_display)]
    display: DisplaySize,

    /// Don't report bounding boxes (hides the whole overlay).
    #[arg(long)]
    hide_boxes: bool,

    /// Leave emotion labels off the overlay.
    #[arg(long)]
    hide_emotions: bool,

    /// Leave mask labels off the overlay.
    #[arg(long)]
    hide_mask: bool,
}

impl OverlayArgs {
    fn settings(&self) -> DetectionSettings {
        DetectionSettings {
            confidence_threshold: self.confidence,
            show_bounding_boxes: !self.hide_boxes,
            show_emotions: !self.hide_emotions,
            show_mask_status: !self.hide_mask,
        }
    }
}

#[derive(Args)]
struct ImageArgs {
    /// Image file to analyze.
    path: PathBuf,

    #[command(flatten)]
    overlay: OverlayArgs,

    /// Print detections, stats and overlay as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct WebcamArgs {
    /// Capture device name (platform default when omitted).
    #[arg(long, conflicts_with = "replay")]
    device: Option<String>,

    /// Replay a video file instead of opening a camera.
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Stop after this many seconds (runs until the stream ends otherwise).
    #[arg(long)]
    duration: Option<u64>,

    #[command(flatten)]
    overlay: OverlayArgs,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    match &cli.command {
        Command::Image(args) => {
            validate(&args.overlay)?;
            if !args.path.exists() {
                return Err(format!("Input file not found: {}", args.path.display()).into());
            }
            let use_case = build_use_case(&cli, Box::new(NullDetectionLogger))?;
            run_image(args, use_case)
        }
        Command::Webcam(args) => {
            validate(&args.overlay)?;
            let use_case = build_use_case(&cli, Box::new(StdoutDetectionLogger::default()))?;
            run_webcam(args, use_case)
        }
    }
}

#[derive(Serialize)]
struct ImageReport<'a> {
    #[serde(flatten)]
    batch: &'a DetectionBatch,
    overlay: Vec<OverlayBox>,
    emotions: EmotionDistribution,
}

fn run_image(
    args: &ImageArgs,
    mut use_case: DetectFacesUseCase,
) -> Result<(), Box<dyn std::error::Error>> {
    let frame = load_image_frame(&args.path)?;
    log::info!(
        "Loaded {} ({}x{})",
        args.path.display(),
        frame.width(),
        frame.height()
    );

    let mut session = DetectionSession::new(args.overlay.settings());
    session.set_model_ready(use_case.is_ready());
    let request = session
        .load_image(frame)
        .ok_or("models are not ready")?;
    let batch = use_case.execute(&request.frame, request.confidence_threshold);
    session.apply(request.ticket, batch);

    let overlay = session.overlay(args.overlay.display);
    if args.json {
        let report = ImageReport {
            batch: session.batch(),
            overlay,
            emotions: EmotionDistribution::from_stats(session.stats()),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Detected {} face(s) in the image", session.stats().total_faces);
        for item in &overlay {
            println!("{}", describe_box(item));
        }
        print_stats(session.stats(), None);
    }
    Ok(())
}

fn run_webcam(
    args: &WebcamArgs,
    mut use_case: DetectFacesUseCase,
) -> Result<(), Box<dyn std::error::Error>> {
    let input = match &args.replay {
        Some(path) => CaptureInput::File(path.clone()),
        None => CaptureInput::Device(args.device.clone()),
    };
    let mut webcam = Webcam::new(Box::new(FfmpegCameraSource::new(input)));
    webcam.start()?;

    let mut session = DetectionSession::new(args.overlay.settings());
    session.set_model_ready(use_case.is_ready());
    session.start_live();

    let deadline = args
        .duration
        .map(|secs| Instant::now() + Duration::from_secs(secs));
    let mut latest = None;
    let started = Instant::now();
    let mut applied = 0usize;

    while webcam.is_active() && deadline.map_or(true, |d| Instant::now() < d) {
        if let Some(frame) = webcam.poll_frame() {
            latest = Some(frame);
        }
        let now = Instant::now();
        if let Some(request) = session.on_refresh(now, latest.as_ref()) {
            let batch = use_case.execute(&request.frame, request.confidence_threshold);
            if session.apply(request.ticket, batch) {
                applied += 1;
                let overlay = session.overlay(args.overlay.display);
                println!("{}", describe_cycle(session.stats(), &overlay));
            }
        }
        std::thread::sleep(REFRESH_PERIOD);
    }

    webcam.stop();
    session.stop_live();
    use_case.logger().summary();
    let elapsed_s = started.elapsed().as_secs_f64();
    let rate = (elapsed_s > 0.0).then(|| applied as f64 / elapsed_s);
    print_stats(session.stats(), rate);
    Ok(())
}

fn build_use_case(
    cli: &Cli,
    logger: Box<dyn DetectionLogger>,
) -> Result<DetectFacesUseCase, Box<dyn std::error::Error>> {
    let resolver = ModelResolver::platform(cli.models_dir.clone())?;
    let progress: LoadProgressFn = Arc::new(download_progress);
    let analyzer = load_face_analyzer(&resolver, Some(progress)).map_err(|e| {
        log::error!("{e}");
        MODEL_LOAD_FAILED_MESSAGE
    })?;

    let mask_classifier = match cli.mask_seed {
        Some(seed) => SimulatedMaskClassifier::seeded(seed),
        None => SimulatedMaskClassifier::new(),
    };
    Ok(DetectFacesUseCase::new(
        Some(Box::new(analyzer)),
        Box::new(mask_classifier),
        logger,
    ))
}

fn validate(args: &OverlayArgs) -> Result<(), Box<dyn std::error::Error>> {
    if !(0.0..=1.0).contains(&args.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            args.confidence
        )
        .into());
    }
    Ok(())
}

fn parse_display(s: &str) -> Result<DisplaySize, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let width: u32 = w.trim().parse().map_err(|_| format!("invalid width '{w}'"))?;
    let height: u32 = h.trim().parse().map_err(|_| format!("invalid height '{h}'"))?;
    if width == 0 || height == 0 {
        return Err("display dimensions must be positive".into());
    }
    Ok(DisplaySize::new(width as f64, height as f64))
}

fn describe_box(item: &OverlayBox) -> String {
    let r = &item.rect;
    let mut line = format!(
        "  {} [{:.0}, {:.0}, {:.0}x{:.0}]",
        item.id, r.x, r.y, r.width, r.height
    );
    if let Some(mask) = item.mask_label {
        line.push_str(&format!("  {}", mask.text));
    }
    if let Some(emotion) = &item.emotion_label {
        line.push_str(&format!("  {emotion}"));
    }
    line.push_str(&format!("  {}", item.confidence_caption));
    line
}

fn describe_cycle(stats: &DetectionStats, overlay: &[OverlayBox]) -> String {
    let labels: Vec<String> = overlay.iter().map(describe_box).collect();
    format!(
        "{} face(s), {} masked{}{}",
        stats.total_faces,
        stats.with_mask,
        if labels.is_empty() { "" } else { "\n" },
        labels.join("\n")
    )
}

/// Dashboard figures on one line. `cycles_per_second` is the measured rate of
/// applied cycles for a live run; a single image has none.
fn stats_line(stats: &DetectionStats, cycles_per_second: Option<f64>) -> String {
    let rate = match cycles_per_second {
        Some(rate) => format!("{rate:.1} cycles/s"),
        None => "\u{2014}".to_string(),
    };
    format!(
        "Total faces: {}  With mask: {}  No mask: {}  Mask rate: {:.0}%  Detection rate: {rate}",
        stats.total_faces,
        stats.with_mask,
        stats.without_mask,
        stats.mask_rate()
    )
}

fn print_stats(stats: &DetectionStats, cycles_per_second: Option<f64>) {
    println!("{}", stats_line(stats, cycles_per_second));
    for bar in EmotionDistribution::from_stats(stats).bars {
        if bar.count > 0 {
            println!(
                "  {} {:10} {:3} ({:.0}%)",
                bar.emotion.emoji(),
                bar.emotion.label(),
                bar.count,
                bar.percentage
            );
        }
    }
}

fn download_progress(model: &str, downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading {model}... {pct}%");
        if downloaded >= total {
            eprintln!();
        }
    } else {
        eprint!("\rDownloading {model}... {downloaded} bytes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn two_faces_one_masked() -> DetectionStats {
        DetectionStats {
            total_faces: 2,
            with_mask: 1,
            without_mask: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_stats_line_for_image_has_no_detection_rate() {
        assert_eq!(
            stats_line(&two_faces_one_masked(), None),
            "Total faces: 2  With mask: 1  No mask: 1  Mask rate: 50%  Detection rate: \u{2014}"
        );
    }

    #[test]
    fn test_stats_line_for_webcam_reports_cycles_per_second() {
        let line = stats_line(&two_faces_one_masked(), Some(9.64));
        assert!(line.contains("Mask rate: 50%"));
        assert!(line.ends_with("Detection rate: 9.6 cycles/s"));
    }

    #[test]
    fn test_stats_line_empty_batch() {
        let line = stats_line(&DetectionStats::default(), Some(0.0));
        assert!(line.starts_with("Total faces: 0  With mask: 0  No mask: 0  Mask rate: 0%"));
    }

    #[rstest]
    #[case("640x480", 640.0, 480.0)]
    #[case("1280X960", 1280.0, 960.0)]
    #[case(" 320 x 240 ", 320.0, 240.0)]
    fn test_parse_display(#[case] input: &str, #[case] w: f64, #[case] h: f64) {
        assert_eq!(parse_display(input).unwrap(), DisplaySize::new(w, h));
    }

    #[rstest]
    #[case("640")]
    #[case("0x480")]
    #[case("axb")]
    #[case("-1x5")]
    fn test_parse_display_rejects(#[case] input: &str) {
        assert!(parse_display(input).is_err());
    }

    #[test]
    fn test_overlay_args_map_to_settings() {
        let cli = Cli::parse_from([
            "facelens",
            "image",
            "face.jpg",
            "--confidence",
            "0.7",
            "--hide-mask",
        ]);
        let Command::Image(args) = cli.command else {
            panic!("expected image command");
        };
        let settings = args.overlay.settings();
        assert_eq!(settings.confidence_threshold, 0.7);
        assert!(settings.show_bounding_boxes);
        assert!(settings.show_emotions);
        assert!(!settings.show_mask_status);
    }

    #[rstest]
    #[case(-0.1, false)]
    #[case(0.0, true)]
    #[case(1.0, true)]
    #[case(1.5, false)]
    fn test_validate_confidence(#[case] confidence: f64, #[case] ok: bool) {
        let flag = format!("--confidence={confidence}");
        let cli = Cli::parse_from(["facelens", "webcam", flag.as_str()]);
        let Command::Webcam(args) = cli.command else {
            panic!("expected webcam command");
        };
        assert_eq!(validate(&args.overlay).is_ok(), ok);
    }

    #[test]
    fn test_device_and_replay_conflict() {
        let result = Cli::try_parse_from([
            "facelens", "webcam", "--device", "/dev/video0", "--replay", "clip.mp4",
        ]);
        assert!(result.is_err());
    }
}
