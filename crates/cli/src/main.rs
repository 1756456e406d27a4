//! BirdBot CLI
//!
//! Offline access to the same components the services use: classify an
//! image with the specialist model, or talk to the generative-text service
//! through the BirdBot persona.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use classifier_core::{BirdClassifier, ClassList};
use llm_bridge::{BirdBot, OllamaConfig};

#[derive(Parser)]
#[command(name = "birdbot")]
#[command(about = "Bird identification and chat demo tools", long_about = None)]
#[command(version, long_version = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ", env!("BUILT_GIT_COMMIT_HASH"),
    ", built ", env!("BUILT_TIME_UTC"),
    " on ", env!("BUILT_HOST"), ")"
))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a bird image with the specialist model
    Classify {
        /// Image file to classify
        #[arg(short, long)]
        image: String,

        /// ONNX weights of the specialist model
        #[arg(long, env = "BIRDBOT_MODEL", default_value = "resnet50_cub.onnx")]
        model: String,

        /// Class-name file
        #[arg(long, env = "BIRDBOT_CLASSES", default_value = "classes.txt")]
        classes: String,

        /// Print the full prediction as JSON
        #[arg(long)]
        json: bool,
    },

    /// Ask BirdBot a general question
    Ask {
        /// Question text
        #[arg(short, long)]
        text: String,

        /// Base URL of the Ollama service
        #[arg(long, env = "OLLAMA_URL", default_value = "http://localhost:11434")]
        ollama_url: String,

        /// Ollama model to generate with
        #[arg(long, env = "OLLAMA_MODEL", default_value = "llama3.2:1b")]
        model: String,
    },

    /// Run the enrichment prompt for an identified bird
    Enrich {
        /// Identified bird name
        #[arg(short, long)]
        bird: String,

        /// Original identification message to confirm
        #[arg(short, long)]
        message: String,

        /// Base URL of the Ollama service
        #[arg(long, env = "OLLAMA_URL", default_value = "http://localhost:11434")]
        ollama_url: String,

        /// Ollama model to generate with
        #[arg(long, env = "OLLAMA_MODEL", default_value = "llama3.2:1b")]
        model: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Classify {
            image,
            model,
            classes,
            json,
        } => {
            let class_list = ClassList::from_file(&classes)?;
            tracing::info!("Loaded {} classes from {}", class_list.len(), classes);

            let classifier = BirdClassifier::load(&model, class_list)?;
            let bytes = std::fs::read(&image)
                .with_context(|| format!("Failed to read image {image}"))?;

            let prediction = classifier.predict(&bytes)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&prediction)?);
            } else {
                println!("{}", prediction.message);
                if let Some(bird) = &prediction.bird {
                    println!("Label: {bird}");
                }
            }
            Ok(())
        }
        Commands::Ask {
            text,
            ollama_url,
            model,
        } => {
            let bot = BirdBot::with_ollama(OllamaConfig {
                base_url: ollama_url,
                model,
                ..OllamaConfig::default()
            })?;
            println!("{}", bot.general_question(&text).await);
            Ok(())
        }
        Commands::Enrich {
            bird,
            message,
            ollama_url,
            model,
        } => {
            let bot = BirdBot::with_ollama(OllamaConfig {
                base_url: ollama_url,
                model,
                ..OllamaConfig::default()
            })?;
            println!("{}", bot.enrich_response(&bird, &message).await);
            Ok(())
        }
    }
}
