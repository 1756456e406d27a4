//! LLM Bridge for Ollama integration
//!
//! Provides integration with a locally hosted LLM via the Ollama HTTP API,
//! plus the BirdBot conversation layer: persona prompt construction and the
//! gateway policy that converts transport failures into user-facing strings
//! instead of errors.

pub mod chat;
pub mod generator;
pub mod ollama;

pub use chat::BirdBot;
pub use generator::{GenerateError, TextGenerator};
pub use ollama::{OllamaClient, OllamaConfig};
