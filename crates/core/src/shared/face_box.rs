use serde::Serialize;

/// Axis-aligned box in source-pixel coordinates (top-left origin).
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FaceBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl FaceBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::new(x1, y1, (x2 - x1).max(0.0), (y2 - y1).max(0.0))
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    pub fn iou(&self, other: &FaceBox) -> f64 {
        let ix1 = self.x.max(other.x);
        let iy1 = self.y.max(other.y);
        let ix2 = self.right().min(other.right());
        let iy2 = self.bottom().min(other.bottom());

        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        if inter == 0.0 {
            return 0.0;
        }
        inter / (self.area() + other.area() - inter)
    }

    /// Intersection with `[0, width] x [0, height]`, or `None` if empty.
    pub fn clamp_to(&self, width: f64, height: f64) -> Option<FaceBox> {
        let x1 = self.x.max(0.0);
        let y1 = self.y.max(0.0);
        let x2 = self.right().min(width);
        let y2 = self.bottom().min(height);
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(FaceBox::from_corners(x1, y1, x2, y2))
    }

    /// Scales position and size independently on each axis.
    pub fn scaled(&self, scale_x: f64, scale_y: f64) -> FaceBox {
        FaceBox::new(
            self.x * scale_x,
            self.y * scale_y,
            self.width * scale_x,
            self.height * scale_y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_from_corners() {
        let b = FaceBox::from_corners(10.0, 20.0, 50.0, 80.0);
        assert_eq!(b, FaceBox::new(10.0, 20.0, 40.0, 60.0));
    }

    #[test]
    fn test_from_corners_inverted_is_empty() {
        let b = FaceBox::from_corners(50.0, 50.0, 10.0, 10.0);
        assert_relative_eq!(b.area(), 0.0);
    }

    #[test]
    fn test_iou_identical() {
        let a = FaceBox::new(10.0, 10.0, 100.0, 100.0);
        assert_relative_eq!(a.iou(&a), 1.0);
    }

    #[test]
    fn test_iou_partial_overlap() {
        // intersection 50*100 = 5000, union 15000
        let a = FaceBox::new(0.0, 0.0, 100.0, 100.0);
        let b = FaceBox::new(50.0, 0.0, 100.0, 100.0);
        assert_relative_eq!(a.iou(&b), 5000.0 / 15000.0);
    }

    #[rstest]
    #[case::disjoint(FaceBox::new(100.0, 100.0, 50.0, 50.0))]
    #[case::touching(FaceBox::new(50.0, 0.0, 50.0, 50.0))]
    #[case::zero_width(FaceBox::new(0.0, 0.0, 0.0, 50.0))]
    fn test_iou_no_overlap(#[case] other: FaceBox) {
        let a = FaceBox::new(0.0, 0.0, 50.0, 50.0);
        assert_relative_eq!(a.iou(&other), 0.0);
    }

    #[test]
    fn test_clamp_to_inside_is_unchanged() {
        let b = FaceBox::new(10.0, 10.0, 20.0, 20.0);
        assert_eq!(b.clamp_to(100.0, 100.0), Some(b));
    }

    #[test]
    fn test_clamp_to_cuts_edges() {
        let b = FaceBox::new(-10.0, 90.0, 30.0, 30.0);
        assert_eq!(
            b.clamp_to(100.0, 100.0),
            Some(FaceBox::new(0.0, 90.0, 20.0, 10.0))
        );
    }

    #[test]
    fn test_clamp_to_outside_is_none() {
        let b = FaceBox::new(200.0, 200.0, 10.0, 10.0);
        assert!(b.clamp_to(100.0, 100.0).is_none());
    }

    #[test]
    fn test_scaled_independent_axes() {
        let b = FaceBox::new(100.0, 50.0, 40.0, 40.0).scaled(2.0, 0.5);
        assert_eq!(b, FaceBox::new(200.0, 25.0, 80.0, 20.0));
    }
}
