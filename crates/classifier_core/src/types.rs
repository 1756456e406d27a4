//! Result types for the classification pipeline

use serde::{Deserialize, Serialize};

/// Outcome of classifying one uploaded image
///
/// `bird` is `None` when no class reached the confidence threshold or when
/// the image could not be decoded; `message` is always populated with the
/// user-facing text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    /// User-facing message describing the outcome
    pub message: String,
    /// Identified class name, if confidence was sufficient
    pub bird: Option<String>,
    /// Max class probability (0.0-1.0)
    pub confidence: f32,
}

impl Prediction {
    /// A prediction carrying only a message (decode failure or rejection)
    pub fn rejected(message: String, confidence: f32) -> Self {
        Self {
            message,
            bird: None,
            confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_serialization_null_bird() {
        let p = Prediction::rejected("no bird".to_string(), 0.4);
        let json = serde_json::to_string(&p).unwrap();
        assert!(json.contains("\"bird\":null"));
    }

    #[test]
    fn test_prediction_roundtrip() {
        let p = Prediction {
            message: "ok".to_string(),
            bird: Some("Cardinal".to_string()),
            confidence: 0.92,
        };
        let json = serde_json::to_string(&p).unwrap();
        let back: Prediction = serde_json::from_str(&json).unwrap();
        assert_eq!(back.bird.as_deref(), Some("Cardinal"));
    }
}
