//! Core classification pipeline for BirdBot
//!
//! This crate provides the specialist bird classifier: class-name loading,
//! image preprocessing to the fixed tensor shape the network expects, ONNX
//! forward inference, and the confidence-threshold decision that turns raw
//! probabilities into a user-facing verdict.

pub mod classes;
pub mod classify;
pub mod preprocess;
pub mod types;

pub use classes::ClassList;
pub use classify::{decide, softmax, BirdClassifier, CONFIDENCE_THRESHOLD};
pub use types::Prediction;
