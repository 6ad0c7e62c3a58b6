use ndarray::ArrayView3;

use crate::shared::face_box::FaceBox;

/// A single camera or still-image frame: packed RGB bytes in row-major order.
///
/// Capture sources convert into this layout at their boundary; everything
/// downstream treats the pixels as opaque.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    sequence: u64,
}

impl Frame {
    pub const CHANNELS: usize = 3;

    pub fn new(data: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * Self::CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            sequence,
        }
    }

    pub fn from_rgb_image(image: image::RgbImage, sequence: u64) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height, sequence)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Position of the frame within its source (0 for still images).
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (self.height as usize, self.width as usize, Self::CHANNELS),
            &self.data,
        )
        .expect("Frame data length must match dimensions")
    }

    /// Copies the pixels under `bbox`, clamped to the frame.
    ///
    /// Returns `None` when the clamped box is empty.
    pub fn crop(&self, bbox: &FaceBox) -> Option<Frame> {
        let clamped = bbox.clamp_to(self.width as f64, self.height as f64)?;
        let x0 = clamped.x.floor() as usize;
        let y0 = clamped.y.floor() as usize;
        let w = (clamped.width.ceil() as usize).min(self.width as usize - x0);
        let h = (clamped.height.ceil() as usize).min(self.height as usize - y0);
        if w == 0 || h == 0 {
            return None;
        }

        let stride = self.width as usize * Self::CHANNELS;
        let mut pixels = Vec::with_capacity(w * h * Self::CHANNELS);
        for row in y0..y0 + h {
            let start = row * stride + x0 * Self::CHANNELS;
            pixels.extend_from_slice(&self.data[start..start + w * Self::CHANNELS]);
        }
        Some(Frame::new(pixels, w as u32, h as u32, self.sequence))
    }

    /// Expands to RGBA with an opaque alpha channel, the layout GPU image
    /// handles expect.
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut rgba = Vec::with_capacity(self.data.len() / Self::CHANNELS * 4);
        for px in self.data.chunks_exact(Self::CHANNELS) {
            rgba.extend_from_slice(px);
            rgba.push(u8::MAX);
        }
        rgba
    }
}
