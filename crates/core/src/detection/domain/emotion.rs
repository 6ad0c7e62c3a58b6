//! The seven expression labels and per-face expression scores.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Sad,
    Angry,
    Neutral,
    Surprised,
    Fearful,
    Disgusted,
}

impl Emotion {
    /// Fixed enumeration order. Dominant-emotion ties resolve to the earlier entry.
    pub const ALL: [Emotion; 7] = [
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Neutral,
        Emotion::Surprised,
        Emotion::Fearful,
        Emotion::Disgusted,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Neutral => "neutral",
            Emotion::Surprised => "surprised",
            Emotion::Fearful => "fearful",
            Emotion::Disgusted => "disgusted",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Emotion::Happy => "\u{1F60A}",
            Emotion::Sad => "\u{1F622}",
            Emotion::Angry => "\u{1F620}",
            Emotion::Neutral => "\u{1F610}",
            Emotion::Surprised => "\u{1F632}",
            Emotion::Fearful => "\u{1F628}",
            Emotion::Disgusted => "\u{1F922}",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Emotion::Happy => write!(f, "Happy"),
            Emotion::Sad => write!(f, "Sad"),
            Emotion::Angry => write!(f, "Angry"),
            Emotion::Neutral => write!(f, "Neutral"),
            Emotion::Surprised => write!(f, "Surprised"),
            Emotion::Fearful => write!(f, "Fearful"),
            Emotion::Disgusted => write!(f, "Disgusted"),
        }
    }
}

/// Raw expression score for each of the seven labels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EmotionScores([f64; 7]);

impl EmotionScores {
    pub fn new(scores: [f64; 7]) -> Self {
        Self(scores)
    }

    pub fn from_pairs(pairs: &[(Emotion, f64)]) -> Self {
        let mut scores = Self::default();
        for &(emotion, score) in pairs {
            scores.set(emotion, score);
        }
        scores
    }

    pub fn get(&self, emotion: Emotion) -> f64 {
        self.0[emotion.index()]
    }

    pub fn set(&mut self, emotion: Emotion, score: f64) {
        self.0[emotion.index()] = score;
    }

    /// Scores paired with their label, in [`Emotion::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Emotion, f64)> + '_ {
        Emotion::ALL.iter().map(move |&e| (e, self.get(e)))
    }
}

impl Serialize for EmotionScores {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Emotion::ALL.len()))?;
        for (emotion, score) in self.iter() {
            map.serialize_entry(emotion.label(), &score)?;
        }
        map.end()
    }
}

/// Dominant expression of one face, with the full score mapping.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct EmotionResult {
    pub emotion: Emotion,
    pub confidence: f64,
    pub all: EmotionScores,
}

impl EmotionResult {
    /// Picks the argmax label.
    ///
    /// The scan is seeded with `(Neutral, 0.0)` and only replaces the current
    /// maximum on a strictly greater score, so ties keep the earlier label and
    /// all-zero input falls back to neutral.
    pub fn from_scores(all: EmotionScores) -> Self {
        let (emotion, confidence) =
            all.iter()
                .fold((Emotion::Neutral, 0.0), |max, current| {
                    if current.1 > max.1 {
                        current
                    } else {
                        max
                    }
                });
        Self {
            emotion,
            confidence,
            all,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_all_order_matches_index() {
        for (i, e) in Emotion::ALL.iter().enumerate() {
            assert_eq!(e.index(), i);
        }
    }

    #[test]
    fn test_clear_winner() {
        let scores = EmotionScores::from_pairs(&[
            (Emotion::Happy, 0.1),
            (Emotion::Surprised, 0.7),
            (Emotion::Neutral, 0.2),
        ]);
        let result = EmotionResult::from_scores(scores);
        assert_eq!(result.emotion, Emotion::Surprised);
        assert_relative_eq!(result.confidence, 0.7);
    }

    #[test]
    fn test_all_zero_falls_back_to_neutral() {
        let result = EmotionResult::from_scores(EmotionScores::default());
        assert_eq!(result.emotion, Emotion::Neutral);
        assert_relative_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_tie_keeps_first_in_enumeration_order() {
        let scores = EmotionScores::from_pairs(&[(Emotion::Sad, 0.5), (Emotion::Fearful, 0.5)]);
        assert_eq!(EmotionResult::from_scores(scores).emotion, Emotion::Sad);
    }

    #[test]
    fn test_tie_with_neutral_prefers_earlier_label() {
        let scores =
            EmotionScores::from_pairs(&[(Emotion::Angry, 0.4), (Emotion::Neutral, 0.4)]);
        assert_eq!(EmotionResult::from_scores(scores).emotion, Emotion::Angry);
    }

    #[rstest]
    #[case::negative([-0.1; 7])]
    #[case::nan([f64::NAN; 7])]
    fn test_non_positive_scores_fall_back_to_neutral(#[case] raw: [f64; 7]) {
        let result = EmotionResult::from_scores(EmotionScores::new(raw));
        assert_eq!(result.emotion, Emotion::Neutral);
    }

    #[test]
    fn test_selection_is_deterministic() {
        let scores = EmotionScores::new([0.2, 0.1, 0.05, 0.3, 0.25, 0.05, 0.05]);
        let first = EmotionResult::from_scores(scores);
        for _ in 0..10 {
            assert_eq!(EmotionResult::from_scores(scores), first);
        }
        assert_eq!(first.emotion, Emotion::Neutral);
    }

    #[test]
    fn test_scores_serialize_as_label_map() {
        let scores = EmotionScores::from_pairs(&[(Emotion::Happy, 1.0)]);
        let json = serde_json::to_value(scores).unwrap();
        assert_eq!(json["happy"], 1.0);
        assert_eq!(json["disgusted"], 0.0);
        assert_eq!(json.as_object().unwrap().len(), 7);
    }
}
