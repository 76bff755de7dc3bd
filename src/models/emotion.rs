use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Emotions the service recommends for
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Sad,
    Anger,
    Surprise,
    Neutral,
    Fear,
}

impl Emotion {
    /// Parses one of the service's own labels (`happy`, `anger`, ...)
    ///
    /// Matching is exact; `"Sad"` or `" sad"` are not labels.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "happy" => Some(Emotion::Happy),
            "sad" => Some(Emotion::Sad),
            "anger" => Some(Emotion::Anger),
            "surprise" => Some(Emotion::Surprise),
            "neutral" => Some(Emotion::Neutral),
            "fear" => Some(Emotion::Fear),
            _ => None,
        }
    }

    /// Maps a raw classifier label onto the vocabulary, defaulting to neutral
    pub fn from_classifier_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "angry" | "disgust" | "anger" => Emotion::Anger,
            "sadness" | "sad" => Emotion::Sad,
            "happy" => Emotion::Happy,
            "surprise" => Emotion::Surprise,
            "fear" => Emotion::Fear,
            _ => Emotion::Neutral,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Anger => "anger",
            Emotion::Surprise => "surprise",
            Emotion::Neutral => "neutral",
            Emotion::Fear => "fear",
        }
    }

    pub fn genre(&self) -> Genre {
        match self {
            Emotion::Happy => Genre::Comedy,
            Emotion::Sad => Genre::Drama,
            Emotion::Anger => Genre::Action,
            Emotion::Surprise => Genre::Adventure,
            Emotion::Neutral => Genre::Drama,
            Emotion::Fear => Genre::Horror,
        }
    }
}

impl Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Movie genres recommendations are drawn from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Genre {
    Comedy,
    Drama,
    Action,
    Adventure,
    Horror,
}

impl Genre {
    /// Genre for an emotion label; unknown labels get comedy
    pub fn for_emotion_label(label: &str) -> Self {
        Emotion::from_label(label)
            .map(|emotion| emotion.genre())
            .unwrap_or(Genre::Comedy)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Comedy => "Comedy",
            Genre::Drama => "Drama",
            Genre::Action => "Action",
            Genre::Adventure => "Adventure",
            Genre::Horror => "Horror",
        }
    }
}

impl Display for Genre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
