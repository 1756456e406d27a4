//! BirdBot chat gateway
//!
//! Proxies user text to the local generative-text service (Ollama) behind
//! the BirdBot persona and serves the static chat UI. LLM failures are part
//! of the normal response contract: the body carries an `Erreur LLM…` string
//! with HTTP 200, and callers match on the prefix.

use axum::{extract::State, routing::post, Json, Router};
use clap::Parser;
use llm_bridge::{BirdBot, OllamaConfig};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

#[derive(Parser, Debug)]
#[command(name = "birdbot-chat", about = "BirdBot chat gateway", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "BIRDBOT_CHAT_ADDR", default_value = "127.0.0.1:8000")]
    addr: String,

    /// Base URL of the Ollama service
    #[arg(long, env = "OLLAMA_URL", default_value = "http://localhost:11434")]
    ollama_url: String,

    /// Ollama model to generate with
    #[arg(long, env = "OLLAMA_MODEL", default_value = "llama3.2:1b")]
    model: String,

    /// Directory holding the built chat UI
    #[arg(long, default_value = "crates/yew_frontend/dist")]
    static_dir: String,
}

struct AppState {
    bot: BirdBot,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let bot = BirdBot::with_ollama(OllamaConfig {
        base_url: args.ollama_url.clone(),
        model: args.model.clone(),
        ..OllamaConfig::default()
    })?;

    let app = router(Arc::new(AppState { bot }), &args.static_dir);

    tracing::info!(
        "Chat gateway listening on {} (Ollama at {}, model {})",
        args.addr,
        args.ollama_url,
        args.model
    );

    let listener = tokio::net::TcpListener::bind(&args.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn router(state: Arc<AppState>, static_dir: &str) -> Router {
    Router::new()
        .route("/llm/general", post(general_question))
        .route("/llm/enrich", post(enrich_response))
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Deserialize)]
struct GeneralRequest {
    text: String,
}

#[derive(Serialize)]
struct GeneralResponse {
    response: String,
}

/// General conversational question
async fn general_question(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GeneralRequest>,
) -> Json<GeneralResponse> {
    let response = state.bot.general_question(&request.text).await;
    Json(GeneralResponse { response })
}

#[derive(Deserialize)]
struct EnrichRequest {
    bird_name: String,
    original_message: String,
}

#[derive(Serialize)]
struct EnrichResponse {
    response: String,
    bird: String,
}

/// Enrichment follow-up after a successful identification
///
/// Always echoes the given `bird_name` back in `bird`, whether or not the
/// LLM call succeeded.
async fn enrich_response(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EnrichRequest>,
) -> Json<EnrichResponse> {
    let response = state
        .bot
        .enrich_response(&request.bird_name, &request.original_message)
        .await;
    Json(EnrichResponse {
        response,
        bird: request.bird_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    /// Router wired to a closed port so every LLM call is refused
    fn unreachable_llm_router() -> Router {
        let bot = BirdBot::with_ollama(OllamaConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            ..OllamaConfig::default()
        })
        .unwrap();
        router(Arc::new(AppState { bot }), "static")
    }

    async fn post_json(app: Router, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_general_failure_is_200_with_erreur_llm_string() {
        let (status, body) = post_json(
            unreachable_llm_router(),
            "/llm/general",
            r#"{"text":"Quel est le plus petit oiseau ?"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let text = body["response"].as_str().unwrap();
        assert!(text.starts_with("Erreur LLM"), "got: {text}");
    }

    #[tokio::test]
    async fn test_enrich_echoes_bird_name() {
        let (status, body) = post_json(
            unreachable_llm_router(),
            "/llm/enrich",
            r#"{"bird_name":"Cardinal","original_message":"J'ai identifié l'oiseau comme étant : Cardinal avec une confiance de 92.00%."}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["bird"], "Cardinal");
        assert!(body["response"].as_str().unwrap().starts_with("Erreur LLM"));
    }

    #[tokio::test]
    async fn test_general_rejects_malformed_body() {
        let app = unreachable_llm_router();
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/llm/general")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{\"wrong\":1}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
