//! BirdBot vision endpoint
//!
//! Runs the specialist bird classifier behind a single `/predict` route.
//! The class list and the optimized model plan are loaded once at startup
//! and shared read-only across requests; if either artifact is missing the
//! endpoint starts disabled and every call answers 503.

use axum::extract::{Multipart, State};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::{routing::post, Json, Router};
use classifier_core::{BirdClassifier, ClassList};
use clap::Parser;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Parser, Debug)]
#[command(name = "birdbot-vision", about = "BirdBot specialist bird classifier endpoint", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "BIRDBOT_VISION_ADDR", default_value = "127.0.0.1:8001")]
    addr: String,

    /// Path to the ONNX weights of the specialist model
    #[arg(long, env = "BIRDBOT_MODEL", default_value = "resnet50_cub.onnx")]
    model: String,

    /// Path to the class-name file
    #[arg(long, env = "BIRDBOT_CLASSES", default_value = "classes.txt")]
    classes: String,

    /// Chat UI origins allowed by CORS
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "http://localhost:8000,http://127.0.0.1:8000"
    )]
    allow_origin: Vec<String>,
}

struct AppState {
    /// `None` when the model or class file failed to load at startup
    classifier: Option<BirdClassifier>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let classifier = match load_classifier(&args.model, &args.classes) {
        Ok(classifier) => {
            tracing::info!(
                "Specialist model loaded for {} classes",
                classifier.class_count()
            );
            Some(classifier)
        }
        Err(e) => {
            tracing::warn!("Specialist model unavailable, /predict will return 503: {e:#}");
            None
        }
    };

    let app = router(Arc::new(AppState { classifier }), &args.allow_origin)?;

    tracing::info!("Vision endpoint listening on {}", args.addr);
    let listener = tokio::net::TcpListener::bind(&args.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn load_classifier(model_path: &str, classes_path: &str) -> anyhow::Result<BirdClassifier> {
    let classes = ClassList::from_file(classes_path)?;
    BirdClassifier::load(model_path, classes)
}

fn router(state: Arc<AppState>, allow_origins: &[String]) -> anyhow::Result<Router> {
    let origins = allow_origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()?;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    Ok(Router::new()
        .route("/predict", post(predict))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

#[derive(Serialize)]
struct PredictResponse {
    message: String,
    bird: Option<String>,
}

#[derive(Serialize)]
struct ErrorDetail {
    detail: String,
}

type ErrorResponse = (StatusCode, Json<ErrorDetail>);

fn error_response(status: StatusCode, detail: impl Into<String>) -> ErrorResponse {
    (
        status,
        Json(ErrorDetail {
            detail: detail.into(),
        }),
    )
}

/// Classify an uploaded image (multipart `file` field)
///
/// Inference runs synchronously in the handler; the only failure statuses
/// are 503 (classifier disabled) and 400 (unusable multipart payload).
/// Undecodable images and low-confidence results are normal 200 responses
/// with `bird: null`.
async fn predict(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<PredictResponse>, ErrorResponse> {
    let Some(classifier) = state.classifier.as_ref() else {
        return Err(error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "Le modèle spécialiste n'est pas chargé ou les classes sont manquantes.",
        ));
    };

    let mut file_bytes = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.to_string()))?
    {
        if field.name() == Some("file") {
            file_bytes = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| error_response(StatusCode::BAD_REQUEST, e.to_string()))?,
            );
            break;
        }
    }

    let Some(bytes) = file_bytes else {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "Champ 'file' manquant dans la requête multipart.",
        ));
    };

    let prediction = classifier.predict(&bytes).map_err(|e| {
        tracing::error!("Inference failed: {e}");
        error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    Ok(Json(PredictResponse {
        message: prediction.message,
        bird: prediction.bird,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    const BOUNDARY: &str = "xBirdBotBoundaryx";

    fn disabled_router() -> Router {
        router(
            Arc::new(AppState { classifier: None }),
            &["http://localhost:8000".to_string()],
        )
        .unwrap()
    }

    fn multipart_body(field_name: &str, payload: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field_name}\"; \
                 filename=\"bird.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(payload);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn predict_request(field_name: &str, payload: &[u8]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/predict")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(field_name, payload)))
            .unwrap()
    }

    #[tokio::test]
    async fn test_predict_is_503_when_model_missing() {
        let response = disabled_router()
            .oneshot(predict_request("file", b"anything"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["detail"].as_str().unwrap().contains("modèle spécialiste"));
    }

    #[tokio::test]
    async fn test_predict_503_takes_priority_over_bad_field() {
        // Disabled endpoint answers 503 no matter what was uploaded
        let response = disabled_router()
            .oneshot(predict_request("not_file", b"anything"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_preflight_allows_chat_ui_origin() {
        let response = disabled_router()
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/predict")
                    .header(header::ORIGIN, "http://localhost:8000")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let allow_origin = response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .expect("preflight should carry allow-origin");
        assert_eq!(allow_origin, "http://localhost:8000");
    }

    #[tokio::test]
    async fn test_preflight_rejects_unknown_origin() {
        let response = disabled_router()
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/predict")
                    .header(header::ORIGIN, "http://evil.example")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }

    #[tokio::test]
    async fn test_router_rejects_invalid_origin_value() {
        let result = router(
            Arc::new(AppState { classifier: None }),
            &["not a header value\u{0}".to_string()],
        );
        assert!(result.is_err());
    }
}
