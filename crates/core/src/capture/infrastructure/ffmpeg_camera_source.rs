use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use log::{debug, info, warn};

use crate::capture::domain::capture_source::{CaptureError, CaptureSource};
use crate::shared::constants::{PREFERRED_CAPTURE_HEIGHT, PREFERRED_CAPTURE_WIDTH};
use crate::shared::frame::Frame;

/// What to open: a platform capture device or a media file to replay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureInput {
    /// Device name as the platform backend expects it (`/dev/video0`,
    /// `0`, `video=Integrated Camera`). `None` picks the default device.
    Device(Option<String>),
    File(PathBuf),
}

impl Default for CaptureInput {
    fn default() -> Self {
        CaptureInput::Device(None)
    }
}

/// Camera source backed by ffmpeg's avdevice (v4l2, avfoundation or dshow).
///
/// Decoding runs on a dedicated thread. Only the newest frame is kept; older
/// ones are dropped when the consumer falls behind.
pub struct FfmpegCameraSource {
    input: CaptureInput,
    worker: Option<CaptureWorker>,
}

struct CaptureWorker {
    frames: Receiver<Frame>,
    stop: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl FfmpegCameraSource {
    pub fn new(input: CaptureInput) -> Self {
        Self {
            input,
            worker: None,
        }
    }
}

impl CaptureSource for FfmpegCameraSource {
    fn start(&mut self) -> Result<(), CaptureError> {
        if self.worker.is_some() {
            return Ok(());
        }

        let (frame_tx, frame_rx) = crossbeam_channel::bounded(1);
        let (ready_tx, ready_rx) = crossbeam_channel::bounded(1);
        let stop = Arc::new(AtomicBool::new(false));
        let running = Arc::new(AtomicBool::new(true));

        let input = self.input.clone();
        let stop_flag = stop.clone();
        let running_flag = running.clone();
        let drain = frame_rx.clone();
        let handle = std::thread::spawn(move || {
            run_capture(input, frame_tx, drain, ready_tx, &stop_flag);
            running_flag.store(false, Ordering::SeqCst);
        });

        let opened = ready_rx.recv().unwrap_or_else(|_| {
            Err(CaptureError::Unknown {
                detail: "capture thread exited before opening the device".into(),
            })
        });
        if let Err(e) = opened {
            let _ = handle.join();
            return Err(e);
        }

        self.worker = Some(CaptureWorker {
            frames: frame_rx,
            stop,
            running,
            handle,
        });
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.stop.store(true, Ordering::SeqCst);
            if worker.handle.join().is_err() {
                warn!("Capture thread panicked");
            }
        }
    }

    fn is_active(&self) -> bool {
        self.worker
            .as_ref()
            .map(|w| w.running.load(Ordering::SeqCst) || !w.frames.is_empty())
            .unwrap_or(false)
    }

    fn poll_frame(&mut self) -> Option<Frame> {
        self.worker.as_ref()?.frames.try_recv().ok()
    }
}

impl Drop for FfmpegCameraSource {
    fn drop(&mut self) {
        self.stop();
    }
}

// ---------------------------------------------------------------------------
// Capture thread
// ---------------------------------------------------------------------------

fn run_capture(
    input: CaptureInput,
    frames: Sender<Frame>,
    drain: Receiver<Frame>,
    ready: Sender<Result<(), CaptureError>>,
    stop: &AtomicBool,
) {
    let mut stream = match open_stream(&input) {
        Ok(stream) => {
            let _ = ready.send(Ok(()));
            stream
        }
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };
    info!(
        "Capturing {}x{} from {input:?}",
        stream.width, stream.height
    );

    let pace = match input {
        CaptureInput::File(_) => stream.frame_interval,
        CaptureInput::Device(_) => None,
    };
    let mut sequence = 0u64;
    let mut last_emit = Instant::now();

    while !stop.load(Ordering::SeqCst) {
        let frame = match stream.next_frame(sequence) {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                debug!("Capture stream reached end");
                break;
            }
            Err(e) => {
                warn!("Capture decode failed: {e}");
                break;
            }
        };
        sequence += 1;

        if let Some(interval) = pace {
            let elapsed = last_emit.elapsed();
            if elapsed < interval {
                std::thread::sleep(interval - elapsed);
            }
            last_emit = Instant::now();
        }

        // Keep only the newest frame in the slot
        let _ = drain.try_recv();
        let _ = frames.try_send(frame);
    }
}

struct DecodedStream {
    input: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    stream_index: usize,
    width: u32,
    height: u32,
    frame_interval: Option<Duration>,
    flushing: bool,
}

impl DecodedStream {
    fn next_frame(&mut self, sequence: u64) -> Result<Option<Frame>, ffmpeg_next::Error> {
        loop {
            if let Some(frame) = self.receive(sequence)? {
                return Ok(Some(frame));
            }
            if self.flushing {
                return Ok(None);
            }
            match self.input.packets().next() {
                Some((stream, packet)) => {
                    if stream.index() == self.stream_index {
                        // Corrupt packets are skipped; the next keyframe recovers
                        let _ = self.decoder.send_packet(&packet);
                    }
                }
                None => {
                    let _ = self.decoder.send_eof();
                    self.flushing = true;
                }
            }
        }
    }

    fn receive(&mut self, sequence: u64) -> Result<Option<Frame>, ffmpeg_next::Error> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }
        let mut rgb = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler.run(&decoded, &mut rgb)?;
        let pixels = extract_rgb_pixels(&rgb, self.width, self.height);
        Ok(Some(Frame::new(pixels, self.width, self.height, sequence)))
    }
}

fn open_stream(input: &CaptureInput) -> Result<DecodedStream, CaptureError> {
    ffmpeg_next::init().map_err(|e| CaptureError::Unknown {
        detail: e.to_string(),
    })?;

    let ictx = match input {
        CaptureInput::File(path) => {
            ffmpeg_next::format::input(path).map_err(|e| classify_error(&e))?
        }
        CaptureInput::Device(name) => open_device(name.as_deref())?,
    };

    let stream = ictx
        .streams()
        .best(ffmpeg_next::media::Type::Video)
        .ok_or_else(|| CaptureError::DeviceNotFound {
            detail: "input has no video stream".into(),
        })?;
    let stream_index = stream.index();
    let rate = stream.avg_frame_rate();
    let frame_interval = (rate.numerator() > 0 && rate.denominator() > 0).then(|| {
        Duration::from_secs_f64(rate.denominator() as f64 / rate.numerator() as f64)
    });

    let decoder = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
        .and_then(|ctx| ctx.decoder().video())
        .map_err(|e| classify_error(&e))?;
    let width = decoder.width();
    let height = decoder.height();
    let scaler = ffmpeg_next::software::scaling::Context::get(
        decoder.format(),
        width,
        height,
        ffmpeg_next::format::Pixel::RGB24,
        width,
        height,
        ffmpeg_next::software::scaling::Flags::BILINEAR,
    )
    .map_err(|e| classify_error(&e))?;

    Ok(DecodedStream {
        input: ictx,
        decoder,
        scaler,
        stream_index,
        width,
        height,
        frame_interval,
        flushing: false,
    })
}

#[cfg(target_os = "linux")]
const DEVICE_FORMAT: &str = "video4linux2,v4l2";
#[cfg(target_os = "macos")]
const DEVICE_FORMAT: &str = "avfoundation";
#[cfg(target_os = "windows")]
const DEVICE_FORMAT: &str = "dshow";
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
const DEVICE_FORMAT: &str = "";

/// Default device per backend. avfoundation's `0:none` selects camera 0 with no audio.
fn default_device() -> Option<&'static str> {
    if cfg!(target_os = "linux") {
        Some("/dev/video0")
    } else if cfg!(target_os = "macos") {
        Some("0:none")
    } else {
        None
    }
}

/// Opens the capture device, asking for the preferred resolution first and
/// falling back to the device's own default mode if that is refused.
fn open_device(name: Option<&str>) -> Result<ffmpeg_next::format::context::Input, CaptureError> {
    ffmpeg_next::device::register_all();

    let format = ffmpeg_next::device::input::video()
        .find(|f| f.name() == DEVICE_FORMAT || DEVICE_FORMAT.split(',').any(|n| n == f.name()))
        .ok_or_else(|| CaptureError::DeviceNotFound {
            detail: format!("capture backend '{DEVICE_FORMAT}' not available"),
        })?;
    let device = name
        .or_else(|| default_device())
        .ok_or_else(|| CaptureError::DeviceNotFound {
            detail: "no default capture device on this platform; pass a device name".into(),
        })?;
    let format = ffmpeg_next::format::format::Format::Input(format);

    let mut preferred = ffmpeg_next::Dictionary::new();
    preferred.set(
        "video_size",
        &format!("{PREFERRED_CAPTURE_WIDTH}x{PREFERRED_CAPTURE_HEIGHT}"),
    );
    if cfg!(target_os = "macos") {
        preferred.set("framerate", "30");
    }

    let first = ffmpeg_next::format::open_with(&device, &format, preferred);
    let opened = match first {
        Ok(ctx) => Ok(ctx),
        Err(e) => {
            let classified = classify_error(&e);
            if !matches!(classified, CaptureError::Unknown { .. }) {
                return Err(classified);
            }
            debug!("Preferred capture mode refused ({e}), retrying with device defaults");
            ffmpeg_next::format::open_with(&device, &format, ffmpeg_next::Dictionary::new())
        }
    };

    match opened.map_err(|e| classify_error(&e))? {
        ffmpeg_next::format::context::Context::Input(input) => Ok(input),
        ffmpeg_next::format::context::Context::Output(_) => Err(CaptureError::Unknown {
            detail: "capture backend opened an output context".into(),
        }),
    }
}

/// Maps an ffmpeg failure onto the user-facing capture categories.
fn classify_error(error: &ffmpeg_next::Error) -> CaptureError {
    let detail = error.to_string();
    match error {
        ffmpeg_next::Error::Other { errno } => classify_errno(*errno, detail),
        ffmpeg_next::Error::StreamNotFound | ffmpeg_next::Error::DecoderNotFound => {
            CaptureError::DeviceNotFound { detail }
        }
        _ => CaptureError::Unknown { detail },
    }
}

fn classify_errno(errno: i32, detail: String) -> CaptureError {
    let os_error = std::io::Error::from_raw_os_error(errno);
    match os_error.kind() {
        std::io::ErrorKind::PermissionDenied => CaptureError::PermissionDenied { detail },
        std::io::ErrorKind::NotFound => CaptureError::DeviceNotFound { detail },
        // ErrorKind::ResourceBusy needs a newer toolchain than we target
        _ if os_error.to_string().to_ascii_lowercase().contains("busy") => {
            CaptureError::DeviceBusy { detail }
        }
        _ => CaptureError::Unknown { detail },
    }
}

/// Copies an ffmpeg RGB24 frame into a tightly packed buffer, dropping row padding.
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let row_bytes = width as usize * Frame::CHANNELS;

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in data.chunks(stride).take(height as usize) {
        pixels.extend_from_slice(&row[..row_bytes]);
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    /// Encodes a short grayscale MPEG-4 clip for replay tests.
    fn create_test_video(path: &Path, num_frames: usize, width: u32, height: u32) {
        ffmpeg_next::init().unwrap();
        let fps = 25;

        let mut octx = ffmpeg_next::format::output(path).unwrap();
        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4).unwrap();
        let mut ost = octx.add_stream(Some(codec)).unwrap();
        let mut encoder_ctx = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .unwrap();
        encoder_ctx.set_width(width);
        encoder_ctx.set_height(height);
        encoder_ctx.set_format(ffmpeg_next::format::Pixel::YUV420P);
        encoder_ctx.set_time_base(ffmpeg_next::Rational(1, fps));
        encoder_ctx.set_frame_rate(Some(ffmpeg_next::Rational(fps, 1)));
        if global_header {
            encoder_ctx.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }
        let mut encoder = encoder_ctx
            .open_with(ffmpeg_next::Dictionary::new())
            .unwrap();
        ost.set_parameters(&encoder);
        octx.write_header().unwrap();
        let ost_time_base = octx.stream(0).unwrap().time_base();

        for i in 0..num_frames {
            let mut yuv = ffmpeg_next::util::frame::video::Video::new(
                ffmpeg_next::format::Pixel::YUV420P,
                width,
                height,
            );
            for plane in 0..3 {
                let fill = if plane == 0 { (i * 40 % 256) as u8 } else { 128 };
                yuv.data_mut(plane).fill(fill);
            }
            yuv.set_pts(Some(i as i64));
            encoder.send_frame(&yuv).unwrap();
            let mut encoded = ffmpeg_next::Packet::empty();
            while encoder.receive_packet(&mut encoded).is_ok() {
                encoded.set_stream(0);
                encoded.rescale_ts(ffmpeg_next::Rational(1, fps), ost_time_base);
                encoded.write_interleaved(&mut octx).unwrap();
            }
        }
        encoder.send_eof().unwrap();
        let mut encoded = ffmpeg_next::Packet::empty();
        while encoder.receive_packet(&mut encoded).is_ok() {
            encoded.set_stream(0);
            encoded.rescale_ts(ffmpeg_next::Rational(1, fps), ost_time_base);
            encoded.write_interleaved(&mut octx).unwrap();
        }
        octx.write_trailer().unwrap();
    }

    fn wait_for_frame(source: &mut FfmpegCameraSource) -> Option<Frame> {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if let Some(frame) = source.poll_frame() {
                return Some(frame);
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        None
    }

    #[test]
    fn test_replays_file_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        create_test_video(&path, 10, 160, 120);

        let mut source = FfmpegCameraSource::new(CaptureInput::File(path));
        source.start().unwrap();
        assert!(source.is_active());

        let frame = wait_for_frame(&mut source).expect("no frame decoded");
        assert_eq!((frame.width(), frame.height()), (160, 120));
        assert_eq!(frame.data().len(), 160 * 120 * 3);

        source.stop();
        assert!(!source.is_active());
        assert!(source.poll_frame().is_none());
    }

    #[test]
    fn test_file_replay_ends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        create_test_video(&path, 3, 64, 48);

        let mut source = FfmpegCameraSource::new(CaptureInput::File(path));
        source.start().unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while source.is_active() && Instant::now() < deadline {
            let _ = source.poll_frame();
            std::thread::sleep(Duration::from_millis(20));
        }
        assert!(!source.is_active());
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let mut source =
            FfmpegCameraSource::new(CaptureInput::File(PathBuf::from("/nonexistent/clip.mp4")));
        let err = source.start().unwrap_err();
        assert!(matches!(err, CaptureError::DeviceNotFound { .. }));
        assert!(!source.is_active());
    }

    #[test]
    fn test_stop_without_start_is_noop() {
        let mut source = FfmpegCameraSource::new(CaptureInput::default());
        source.stop();
        assert!(!source.is_active());
    }

    #[cfg(unix)]
    #[test]
    fn test_classify_errno() {
        assert!(matches!(
            classify_errno(13, String::new()),
            CaptureError::PermissionDenied { .. }
        ));
        assert!(matches!(
            classify_errno(2, String::new()),
            CaptureError::DeviceNotFound { .. }
        ));
        assert!(matches!(
            classify_errno(5, String::new()),
            CaptureError::Unknown { .. }
        ));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_classify_errno_busy() {
        // EBUSY
        assert!(matches!(
            classify_errno(16, String::new()),
            CaptureError::DeviceBusy { .. }
        ));
    }
}
