//! Specialist model inference and the confidence-threshold decision
//!
//! The ONNX graph is loaded once at startup into an optimized runnable plan
//! and shared read-only afterwards; `SimplePlan::run` takes `&self`, so no
//! locking is needed across concurrent requests.

use crate::classes::ClassList;
use crate::preprocess::{self, INPUT_SIZE};
use crate::types::Prediction;
use anyhow::{Context, Result};
use std::path::Path;
use thiserror::Error;
use tract_onnx::prelude::*;

/// Below this max-probability the classification is rejected as unreliable
pub const CONFIDENCE_THRESHOLD: f32 = 0.80;

/// Optimized, runnable ONNX plan
type OnnxPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Errors from the inference path
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The uploaded bytes could not be decoded as an image
    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),
    /// The forward pass itself failed
    #[error("model inference failed: {0}")]
    Inference(#[from] anyhow::Error),
}

/// The pretrained 200-class bird classifier
pub struct BirdClassifier {
    plan: OnnxPlan,
    classes: ClassList,
}

impl BirdClassifier {
    /// Load the ONNX model and bind it to a class list
    ///
    /// Fails if the model file is missing or malformed. The input is pinned
    /// to a fixed 1x3x224x224 f32 fact so the graph can be fully optimized.
    pub fn load(model_path: impl AsRef<Path>, classes: ClassList) -> Result<Self> {
        let path = model_path.as_ref();
        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .with_context(|| format!("Failed to read model {}", path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, INPUT_SIZE as usize, INPUT_SIZE as usize),
                ),
            )?
            .into_optimized()?
            .into_runnable()?;

        Ok(Self { plan, classes })
    }

    /// Number of categories the classifier can identify
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Classify an uploaded image
    ///
    /// Decode failures are not errors: they produce a `Prediction` carrying
    /// the failure message and no label, matching the endpoint contract.
    pub fn predict(&self, image_bytes: &[u8]) -> Result<Prediction, ClassifyError> {
        let image = match preprocess::decode_image(image_bytes) {
            Ok(image) => image,
            Err(e) => {
                return Ok(Prediction::rejected(
                    format!("Erreur de traitement de l'image : {e}"),
                    0.0,
                ))
            }
        };

        let input = preprocess::to_input_tensor(&image);
        let logits = self.forward(input)?;
        let probabilities = softmax(&logits);
        Ok(decide(&probabilities, &self.classes))
    }

    fn forward(&self, input: Tensor) -> Result<Vec<f32>, ClassifyError> {
        let outputs = self.plan.run(tvec!(input.into()))?;
        let logits = outputs[0].to_array_view::<f32>()?;
        Ok(logits.iter().copied().collect())
    }
}

/// Numerically stable softmax over raw logits
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.iter().map(|e| e / sum).collect()
}

/// Apply the confidence threshold to softmax probabilities
///
/// Returns the arg-max class with its probability formatted as a percentage
/// when the threshold is met, and the rejection message otherwise.
pub fn decide(probabilities: &[f32], classes: &ClassList) -> Prediction {
    let (best_index, best_prob) = probabilities
        .iter()
        .copied()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .unwrap_or((0, 0.0));

    if best_prob < CONFIDENCE_THRESHOLD {
        let message = format!(
            "Je suis désolé, je n'ai identifié aucun oiseau avec une confiance suffisante \
             (seulement {:.2}%). L'image que vous avez soumise n'est probablement pas un oiseau \
             faisant partie des {} classes d'oiseaux que je peux identifier ou est de trop \
             mauvaise qualité.",
            best_prob * 100.0,
            classes.len()
        );
        return Prediction::rejected(message, best_prob);
    }

    match classes.get(best_index) {
        Some(name) => Prediction {
            message: format!(
                "J'ai identifié l'oiseau comme étant : {} avec une confiance de {:.2}%.",
                name,
                best_prob * 100.0
            ),
            bird: Some(name.to_string()),
            confidence: best_prob,
        },
        None => Prediction::rejected(
            format!(
                "Je suis désolé, la classe prédite (index {best_index}) est inconnue de ma liste \
                 de {} classes.",
                classes.len()
            ),
            best_prob,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_classes() -> ClassList {
        ClassList::parse("001.Sooty_Albatross\n017.Cardinal\n")
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0, 4.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_softmax_shift_invariant() {
        let a = softmax(&[1.0, 2.0, 3.0]);
        let b = softmax(&[101.0, 102.0, 103.0]);
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-6);
        }
    }

    #[test]
    fn test_softmax_uniform_logits() {
        let probs = softmax(&[0.5, 0.5, 0.5, 0.5]);
        for p in probs {
            assert!((p - 0.25).abs() < 1e-6);
        }
    }

    #[test]
    fn test_decide_above_threshold_returns_argmax_label() {
        let prediction = decide(&[0.08, 0.92], &two_classes());
        assert_eq!(prediction.bird.as_deref(), Some("Cardinal"));
        assert!(prediction
            .message
            .contains("Cardinal avec une confiance de 92.00%."));
    }

    #[test]
    fn test_decide_at_threshold_accepts() {
        let prediction = decide(&[0.20, 0.80], &two_classes());
        assert_eq!(prediction.bird.as_deref(), Some("Cardinal"));
    }

    #[test]
    fn test_decide_below_threshold_rejects() {
        let prediction = decide(&[0.60, 0.40], &two_classes());
        assert!(prediction.bird.is_none());
        assert!(prediction.message.contains("60.00%"));
        assert!(prediction.message.contains("confiance suffisante"));
    }

    #[test]
    fn test_decide_rejection_names_class_count() {
        let prediction = decide(&[0.5, 0.5], &two_classes());
        assert!(prediction.message.contains("2 classes"));
    }

    #[test]
    fn test_decide_index_outside_class_list() {
        let classes = ClassList::parse("001.Sooty_Albatross\n");
        let prediction = decide(&[0.05, 0.95], &classes);
        assert!(prediction.bird.is_none());
    }

    #[test]
    fn test_load_missing_model_is_error() {
        let result = BirdClassifier::load("/nonexistent/resnet50_cub.onnx", two_classes());
        assert!(result.is_err());
    }
}
