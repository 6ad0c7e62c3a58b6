//! 5-point facial landmarks as produced by the face model's keypoint head.

const NOSE: usize = 2;
const LEFT_MOUTH: usize = 3;
const RIGHT_MOUTH: usize = 4;

pub type Point = (f64, f64);

/// Eyes, nose tip and mouth corners in source-pixel coordinates.
///
/// A `None` slot is a keypoint the model was not confident about.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceLandmarks {
    points: [Option<Point>; 5],
}

impl FaceLandmarks {
    pub fn new(points: [Option<Point>; 5]) -> Self {
        Self { points }
    }

    pub fn nose(&self) -> Option<Point> {
        self.points[NOSE]
    }

    pub fn mouth_corners(&self) -> Option<(Point, Point)> {
        Some((self.points[LEFT_MOUTH]?, self.points[RIGHT_MOUTH]?))
    }

    /// Nose and both mouth corners were all located.
    ///
    /// A covered lower face is what a real mask classifier looks for; the
    /// simulated one ignores it.
    pub fn lower_face_visible(&self) -> bool {
        self.nose().is_some() && self.mouth_corners().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const FRONTAL: [Option<Point>; 5] = [
        Some((440.0, 350.0)), // left_eye
        Some((560.0, 350.0)), // right_eye
        Some((500.0, 420.0)), // nose
        Some((460.0, 470.0)), // left_mouth
        Some((540.0, 470.0)), // right_mouth
    ];

    #[test]
    fn test_accessors() {
        let lm = FaceLandmarks::new(FRONTAL);
        assert_eq!(lm.nose(), Some((500.0, 420.0)));
        assert_eq!(
            lm.mouth_corners(),
            Some(((460.0, 470.0), (540.0, 470.0)))
        );
    }

    #[test]
    fn test_lower_face_visible_when_complete() {
        assert!(FaceLandmarks::new(FRONTAL).lower_face_visible());
    }

    #[rstest]
    #[case::nose_missing(NOSE)]
    #[case::left_mouth_missing(LEFT_MOUTH)]
    #[case::right_mouth_missing(RIGHT_MOUTH)]
    fn test_lower_face_hidden(#[case] missing: usize) {
        let mut points = FRONTAL;
        points[missing] = None;
        assert!(!FaceLandmarks::new(points).lower_face_visible());
    }

    #[test]
    fn test_eyes_do_not_affect_lower_face() {
        let mut points = FRONTAL;
        points[0] = None;
        points[1] = None;
        assert!(FaceLandmarks::new(points).lower_face_visible());
    }
}
