use std::path::Path;

use thiserror::Error;

use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::shared::frame::Frame;

#[derive(Error, Debug)]
pub enum ImageLoadError {
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

/// Decodes a still image into a [`Frame`] (sequence 0).
///
/// Any format the `image` crate understands is accepted; there is no
/// validation beyond a successful decode.
pub fn load_image_frame(path: &Path) -> Result<Frame, ImageLoadError> {
    let img = image::open(path).map_err(|source| ImageLoadError::Decode {
        path: path.display().to_string(),
        source,
    })?;
    Ok(Frame::from_rgb_image(img.to_rgb8(), 0))
}

/// Extension check used by file pickers and drag-and-drop.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[test]
    fn test_load_png() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("face.png");
        image::RgbImage::from_pixel(8, 6, image::Rgb([50, 100, 200]))
            .save(&path)
            .unwrap();

        let frame = load_image_frame(&path).unwrap();
        assert_eq!((frame.width(), frame.height()), (8, 6));
        assert_eq!(&frame.data()[..3], &[50, 100, 200]);
        assert_eq!(frame.sequence(), 0);
    }

    #[test]
    fn test_load_rgba_drops_alpha() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("face.png");
        image::RgbaImage::from_pixel(2, 2, image::Rgba([1, 2, 3, 4]))
            .save(&path)
            .unwrap();

        let frame = load_image_frame(&path).unwrap();
        assert_eq!(frame.data().len(), 2 * 2 * 3);
    }

    #[test]
    fn test_load_garbage_fails() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();
        assert!(matches!(
            load_image_frame(&path),
            Err(ImageLoadError::Decode { .. })
        ));
    }

    #[test]
    fn test_load_missing_file_fails() {
        assert!(load_image_frame(Path::new("/nonexistent/face.png")).is_err());
    }

    #[rstest]
    #[case("photo.jpg", true)]
    #[case("photo.JPEG", true)]
    #[case("scan.webp", true)]
    #[case("clip.mp4", false)]
    #[case("noext", false)]
    fn test_is_image_file(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_image_file(Path::new(name)), expected);
    }
}
