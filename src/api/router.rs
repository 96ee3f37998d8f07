// API Router
// Page form round-trips plus the JSON analysis endpoints

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{Html, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use tracing::info;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::models::{
    AnalysisOutcome, AnalyzeRequest, HealthResponse, PageAction, PageForm, SampleResponse, SpeechAnalysis,
};
use crate::services::analyzer::{is_blank, SpeechAnalyzer, SAMPLE_SPEECH};
use crate::services::page::{render_page, PageView};

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<SpeechAnalyzer>,
}

/// Build the application router around a loaded analyzer.
pub fn app_router(analyzer: Arc<SpeechAnalyzer>) -> Router {
    let state = AppState { analyzer };

    Router::new()
        .route("/", get(show_page).post(submit_page))
        .route("/api/analyze", post(analyze))
        .route("/api/sample", get(sample))
        .route("/health", get(health))
        .with_state(state)
        .layer(axum::middleware::from_fn(log_access))
}

async fn show_page() -> Html<String> {
    Html(render_page(&PageView::default()))
}

async fn submit_page(State(state): State<AppState>, Form(form): Form<PageForm>) -> Html<String> {
    let view = match form.action.parse::<PageAction>().ok() {
        Some(PageAction::Sample) => PageView {
            speech_input: SAMPLE_SPEECH.to_string(),
            outcome: None,
        },
        Some(PageAction::Analyze) => {
            let outcome = state.analyzer.analyze(&form.speech_input).await;
            PageView {
                speech_input: form.speech_input,
                outcome: Some(outcome),
            }
        }
        None => PageView {
            speech_input: form.speech_input,
            outcome: None,
        },
    };
    Html(render_page(&view))
}

async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<SpeechAnalysis>, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    if is_blank(&req.text) {
        return Err(ApiError::EmptyInput);
    }

    match state.analyzer.analyze(&req.text).await {
        AnalysisOutcome::Analyzed(analysis) => Ok(Json(analysis)),
        AnalysisOutcome::Warning { .. } => Err(ApiError::EmptyInput),
    }
}

async fn sample() -> Json<SampleResponse> {
    Json(SampleResponse {
        text: SAMPLE_SPEECH.to_string(),
    })
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Log every request with a generated request id, echoed back as `x-request-id`.
async fn log_access(req: Request<Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let request_id = Uuid::new_v4().to_string();
    let t0 = Instant::now();

    let mut response = next.run(req).await;

    info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = t0.elapsed().as_millis(),
        "http.request"
    );
    if let Ok(val) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", val);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::analyzer::tests::bundled_analyzer;
    use axum::body::to_bytes;
    use axum::http::{header, StatusCode};
    use tower::ServiceExt;

    fn test_app() -> Router {
        app_router(Arc::new(bundled_analyzer()))
    }

    async fn body_string(response: Response) -> String {
        let body = to_bytes(response.into_body(), 1 << 20).await.unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    fn form_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn form_encode(value: &str) -> String {
        let mut out = String::new();
        for b in value.bytes() {
            match b {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'*' => out.push(b as char),
                b' ' => out.push('+'),
                _ => out.push_str(&format!("%{:02X}", b)),
            }
        }
        out
    }

    fn textarea_text(html: &str) -> String {
        let open = "name='speech_input'>";
        let start = html.find(open).unwrap() + open.len();
        let end = start + html[start..].find("</textarea>").unwrap();
        html[start..end].to_string()
    }

    fn json_request(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_initial_page_has_form_and_no_result() {
        let response = test_app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        let html = body_string(response).await;
        assert!(html.contains("name='speech_input'"));
        assert!(!html.contains("analysis-box'>"));
        assert!(!html.contains("class='warning'"));
    }

    #[tokio::test]
    async fn test_sample_action_fills_text_without_analyzing() {
        let response = test_app().oneshot(form_request("speech_input=&action=sample")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("Honorable members of the parliament"));
        assert!(!html.contains("analysis-box'>"));
    }

    #[tokio::test]
    async fn test_fill_sample_then_analyze() {
        let app = test_app();

        let filled = body_string(
            app.clone()
                .oneshot(form_request("speech_input=&action=sample"))
                .await
                .unwrap(),
        )
        .await;
        let text = textarea_text(&filled);
        assert_eq!(text, SAMPLE_SPEECH);

        let body = format!("speech_input={}&action=analyze", form_encode(&text));
        let html = body_string(app.oneshot(form_request(&body)).await.unwrap()).await;
        assert!(html.contains("analysis-box'>"));
        assert!(html.contains("0.30 🔵 Positive"));
        assert!(html.contains("0.48 (Factual)"));
        assert!(html.contains("<b>Named Entities:</b> today"));
        assert_eq!(textarea_text(&html), SAMPLE_SPEECH);
    }

    #[tokio::test]
    async fn test_analyze_action_with_blank_text_warns() {
        let response = test_app()
            .oneshot(form_request("speech_input=+++%0A&action=analyze"))
            .await
            .unwrap();
        let html = body_string(response).await;
        assert!(html.contains("Please enter a speech to analyze."));
        assert!(!html.contains("Sentiment Score:"));
    }

    #[tokio::test]
    async fn test_analyze_action_renders_result() {
        let response = test_app()
            .oneshot(form_request(
                "speech_input=India+has+made+good+progress+today.&action=analyze",
            ))
            .await
            .unwrap();
        let html = body_string(response).await;
        assert!(html.contains("Sentiment Score:"));
        assert!(html.contains("🔵 Positive"));
        assert!(html.contains("India, today"));
        assert!(html.contains("India has made good progress today."));
    }

    #[tokio::test]
    async fn test_unknown_action_keeps_text() {
        let response = test_app()
            .oneshot(form_request("speech_input=hello&action=dance"))
            .await
            .unwrap();
        let html = body_string(response).await;
        assert!(html.contains(">hello</textarea>"));
        assert!(!html.contains("Sentiment Score:"));
    }

    #[tokio::test]
    async fn test_api_analyze_returns_analysis() {
        let response = test_app()
            .oneshot(json_request("/api/analyze", r#"{"text":"This is a terrible and bad plan."}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["sentiment"], "Negative");
        assert_eq!(json["subjectivityLabel"], "Opinionated");
        assert!(json["entities"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_api_analyze_blank_is_empty_input() {
        let response = test_app()
            .oneshot(json_request("/api/analyze", r#"{"text":"   "}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["error"]["code"], "EMPTY_INPUT");
    }

    #[tokio::test]
    async fn test_api_analyze_malformed_json_is_bad_request() {
        let response = test_app()
            .oneshot(json_request("/api/analyze", "{not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_sample_and_health_endpoints() {
        let app = test_app();
        let response = app
            .clone()
            .oneshot(Request::builder().uri("/api/sample").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["text"], SAMPLE_SPEECH);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }
}
