use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::detection::domain::emotion::Emotion;
use crate::detection::domain::face_detection::FaceDetection;

/// Count of faces per dominant emotion; every label is always present.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EmotionCounts([usize; 7]);

impl EmotionCounts {
    pub fn get(&self, emotion: Emotion) -> usize {
        self.0[emotion.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Emotion, usize)> + '_ {
        Emotion::ALL.iter().map(move |&e| (e, self.get(e)))
    }

    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    pub fn max(&self) -> usize {
        self.0.iter().copied().max().unwrap_or(0)
    }

    fn increment(&mut self, emotion: Emotion) {
        self.0[emotion.index()] += 1;
    }
}

impl Serialize for EmotionCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Emotion::ALL.len()))?;
        for (emotion, count) in self.iter() {
            map.serialize_entry(emotion.label(), &count)?;
        }
        map.end()
    }
}

/// Aggregate counts over the latest detection batch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionStats {
    pub total_faces: usize,
    pub with_mask: usize,
    pub without_mask: usize,
    pub emotions: EmotionCounts,
}

impl DetectionStats {
    /// Recomputes everything from scratch; there is no incremental state.
    pub fn from_detections(detections: &[FaceDetection]) -> Self {
        let mut emotions = EmotionCounts::default();
        let mut with_mask = 0;
        for d in detections {
            if d.has_mask {
                with_mask += 1;
            }
            emotions.increment(d.emotion.emotion);
        }
        Self {
            total_faces: detections.len(),
            with_mask,
            without_mask: detections.len() - with_mask,
            emotions,
        }
    }

    /// Share of detected faces wearing a mask, in percent (0 when empty).
    pub fn mask_rate(&self) -> f64 {
        percentage(self.with_mask, self.total_faces)
    }
}

/// One row of the emotion chart.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EmotionBar {
    pub emotion: Emotion,
    pub count: usize,
    /// Percentage of all faces.
    pub percentage: f64,
    /// Bar length in `[0, 1]`, relative to the most frequent emotion.
    pub fill: f64,
}

/// Emotion histogram in fixed label order, ready for charting.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EmotionDistribution {
    pub bars: Vec<EmotionBar>,
}

impl EmotionDistribution {
    pub fn from_stats(stats: &DetectionStats) -> Self {
        let max = stats.emotions.max().max(1);
        let bars = stats
            .emotions
            .iter()
            .map(|(emotion, count)| EmotionBar {
                emotion,
                count,
                percentage: percentage(count, stats.total_faces),
                fill: count as f64 / max as f64,
            })
            .collect();
        Self { bars }
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::emotion::{EmotionResult, EmotionScores};
    use crate::detection::domain::mask_classifier::MaskAssessment;
    use crate::shared::face_box::FaceBox;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn face(emotion: Emotion, has_mask: bool) -> FaceDetection {
        FaceDetection::new(
            FaceBox::new(0.0, 0.0, 10.0, 10.0),
            0.9,
            EmotionResult::from_scores(EmotionScores::from_pairs(&[(emotion, 0.9)])),
            MaskAssessment {
                has_mask,
                confidence: 0.8,
            },
        )
    }

    #[test]
    fn test_empty_batch() {
        let stats = DetectionStats::from_detections(&[]);
        assert_eq!(stats, DetectionStats::default());
        assert_eq!(stats.emotions.iter().count(), 7);
        assert_relative_eq!(stats.mask_rate(), 0.0);
    }

    #[test]
    fn test_counts() {
        let faces = vec![
            face(Emotion::Happy, true),
            face(Emotion::Happy, false),
            face(Emotion::Sad, false),
        ];
        let stats = DetectionStats::from_detections(&faces);
        assert_eq!(stats.total_faces, 3);
        assert_eq!(stats.with_mask, 1);
        assert_eq!(stats.without_mask, 2);
        assert_eq!(stats.emotions.get(Emotion::Happy), 2);
        assert_eq!(stats.emotions.get(Emotion::Sad), 1);
        assert_eq!(stats.emotions.get(Emotion::Angry), 0);
    }

    #[rstest]
    #[case(vec![])]
    #[case(vec![(Emotion::Neutral, true)])]
    #[case(vec![(Emotion::Angry, false), (Emotion::Fearful, true), (Emotion::Fearful, true)])]
    #[case(vec![(Emotion::Disgusted, false); 9])]
    fn test_invariants_hold(#[case] faces: Vec<(Emotion, bool)>) {
        let faces: Vec<_> = faces.into_iter().map(|(e, m)| face(e, m)).collect();
        let stats = DetectionStats::from_detections(&faces);
        assert_eq!(stats.with_mask + stats.without_mask, stats.total_faces);
        assert_eq!(stats.emotions.total(), stats.total_faces);
    }

    #[test]
    fn test_distribution_fill_is_relative_to_max() {
        let faces = vec![
            face(Emotion::Happy, false),
            face(Emotion::Happy, false),
            face(Emotion::Sad, false),
            face(Emotion::Happy, false),
        ];
        let dist = EmotionDistribution::from_stats(&DetectionStats::from_detections(&faces));
        assert_eq!(dist.bars.len(), 7);
        assert_eq!(dist.bars[0].emotion, Emotion::Happy);
        assert_relative_eq!(dist.bars[0].fill, 1.0);
        assert_relative_eq!(dist.bars[0].percentage, 75.0);
        assert_relative_eq!(dist.bars[1].fill, 1.0 / 3.0);
        assert_relative_eq!(dist.bars[1].percentage, 25.0);
    }

    #[test]
    fn test_distribution_of_empty_stats_is_all_zero() {
        let dist = EmotionDistribution::from_stats(&DetectionStats::default());
        assert!(dist.bars.iter().all(|b| b.fill == 0.0 && b.percentage == 0.0));
    }

    #[test]
    fn test_stats_serialize_emotion_map() {
        let stats = DetectionStats::from_detections(&[face(Emotion::Surprised, true)]);
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["totalFaces"], 1);
        assert_eq!(json["withMask"], 1);
        assert_eq!(json["emotions"]["surprised"], 1);
        assert_eq!(json["emotions"]["happy"], 0);
    }
}
