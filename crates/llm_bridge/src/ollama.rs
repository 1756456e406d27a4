//! Ollama HTTP API client

use crate::generator::{GenerateError, TextGenerator};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Configuration for Ollama client
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Base URL for Ollama API (default: http://localhost:11434)
    pub base_url: String,
    /// Model to generate with (default: llama3.2:1b)
    pub model: String,
    /// Timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2:1b".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Ollama API client
pub struct OllamaClient {
    config: OllamaConfig,
    client: reqwest::Client,
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// Create a client with default configuration
    pub fn default_client() -> Result<Self> {
        Self::new(OllamaConfig::default())
    }

    /// URL of the generate endpoint
    pub fn generate_url(&self) -> String {
        format!("{}/api/generate", self.config.base_url)
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError> {
        let url = self.generate_url();
        tracing::debug!("POST {url} (model {})", self.config.model);

        let request = GenerateRequest {
            model: self.config.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: GenerateOptions::default(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    GenerateError::ConnectionRefused { url: url.clone() }
                } else {
                    GenerateError::Request(e.to_string())
                }
            })?
            .error_for_status()
            .map_err(|e| GenerateError::Request(e.to_string()))?;

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerateError::Request(e.to_string()))?;

        body.response.ok_or(GenerateError::MissingResponse)
    }
}

/// Generate request to Ollama
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    pub options: GenerateOptions,
}

/// Sampling options for a generate request
#[derive(Debug, Clone, Serialize)]
pub struct GenerateOptions {
    pub temperature: f32,
    pub num_predict: u32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            num_predict: 1024,
        }
    }
}

/// Generate response from Ollama
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub response: Option<String>,
}
