//! BirdBot conversation layer
//!
//! Builds the persona prompts for the chat gateway and applies its failure
//! policy: generation never fails, transport errors come back as French
//! `Erreur LLM…` strings in a normal response. Callers detect failure by the
//! string prefix, not by status code.

use crate::generator::{GenerateError, TextGenerator};
use crate::ollama::{OllamaClient, OllamaConfig};
use anyhow::Result;

/// The chat persona in front of the generative-text service
pub struct BirdBot {
    generator: Box<dyn TextGenerator>,
}

impl BirdBot {
    /// Wrap any text generator
    pub fn new(generator: Box<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// BirdBot backed by Ollama
    pub fn with_ollama(config: OllamaConfig) -> Result<Self> {
        Ok(Self::new(Box::new(OllamaClient::new(config)?)))
    }

    /// Answer a general conversational question
    pub async fn general_question(&self, text: &str) -> String {
        self.ask(&general_prompt(text)).await
    }

    /// Enrich a successful identification with a conversational follow-up
    pub async fn enrich_response(&self, bird_name: &str, original_message: &str) -> String {
        self.ask(&enrich_prompt(bird_name, original_message)).await
    }

    async fn ask(&self, prompt: &str) -> String {
        match self.generator.generate(prompt).await {
            Ok(text) => text.trim().to_string(),
            Err(error) => error_message(&error),
        }
    }
}

fn general_prompt(text: &str) -> String {
    format!(
        "Tu es BirdBot, un assistant qui utilise Llama 3.2 (1B). Réponds à la question \
         suivante: '{text}'. Si la question concerne les oiseaux, réponds en tant qu'expert \
         ornithologue. Si elle concerne ton identité, dis que tu es BirdBot. Sois bref. "
    )
}

fn enrich_prompt(bird_name: &str, original_message: &str) -> String {
    format!(
        "Tu es BirdBot, un expert en ornithologie. Le modèle de vision ResNet-50 a identifié \
         l'oiseau comme étant : '{bird_name}'. En utilisant cette information, réponds de \
         manière conversationnelle et engageante en ajoutant un fait intéressant sur cet \
         oiseau. Commence ta réponse par une confirmation de l'identification: \
         {original_message}. Ne dépasse pas 3 phrases. "
    )
}

fn error_message(error: &GenerateError) -> String {
    match error {
        GenerateError::ConnectionRefused { url } => format!(
            "Erreur LLM: Connexion refusée. Vérifiez que le service Ollama est lancé et \
             accessible à {url}."
        ),
        GenerateError::MissingResponse => {
            "Erreur LLM: Réponse non trouvée dans le format Ollama.".to_string()
        }
        GenerateError::Request(detail) => {
            format!("Erreur LLM: Problème lors de l'appel de l'API ({detail}).")
        }
    }
}
