//! Serve command - HTTP relay for slip uploads and chat webhooks.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use clap::Args;
use console::style;
use serde_json::json;
use tokio::signal;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use slipscan_connectors::{LineMessaging, LocalSlipStore, VisionOcr};
use slipscan_core::relay::resolve_secret;
use slipscan_core::{
    ChatEnvelope, RelayError, Relay, RelayResponse, SlipParser, SlipscanConfig, SlipscanError,
    UploadRequest,
};

use super::load_config;

const SECRET_HEADER: &str = "x-worker-secret";

/// Arguments for the serve command.
#[derive(Args)]
pub struct ServeArgs {
    /// Address to listen on (overrides server.bind)
    #[arg(short, long)]
    bind: Option<String>,

    /// Directory to store uploaded slips in (overrides storage.dir)
    #[arg(long)]
    storage_dir: Option<PathBuf>,
}

pub async fn run(args: ServeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(dir) = args.storage_dir {
        config.storage.dir = Some(dir);
    }

    let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());
    let addr: SocketAddr = bind
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address {:?}: {}", bind, e))?;

    let relay = Arc::new(build_relay(&config)?);
    let app = build_router(relay, &config);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    eprintln!(
        "{} Listening on http://{}",
        style("✓").green(),
        listener.local_addr()?
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Wire the relay with every collaborator the configuration enables.
pub fn build_relay(config: &SlipscanConfig) -> anyhow::Result<Relay> {
    let parser = SlipParser::from_config(&config.extraction);
    let mut relay = Relay::new(parser).with_secret(config.server.webhook_secret.clone());

    if config.server.webhook_secret.is_empty() {
        warn!("No webhook secret configured; requests are not authenticated");
    }

    if config.has_ocr_credentials() {
        relay = relay.with_ocr(Arc::new(VisionOcr::from_config(&config.ocr)?));
    } else {
        warn!("No OCR credentials configured; uploads will fail");
    }

    match LocalSlipStore::from_config(&config.storage) {
        Some(store) => {
            info!("Storing slips in {}", store.dir().display());
            relay = relay.with_store(Arc::new(store));
        }
        None => warn!("No storage directory configured; uploads will fail"),
    }

    match LineMessaging::from_config(&config.messaging) {
        Ok(messaging) => relay = relay.with_messaging(Arc::new(messaging)),
        Err(e) => warn!("Chat webhook disabled: {}", e),
    }

    Ok(relay)
}

/// Routes for the relay, plus static serving of stored slips when a storage
/// directory is configured.
pub fn build_router(relay: Arc<Relay>, config: &SlipscanConfig) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/upload", post(upload))
        .route("/webhook/line", post(line_webhook))
        .layer(DefaultBodyLimit::max(config.server.max_body_bytes))
        .with_state(relay);

    let router = match &config.storage.dir {
        Some(dir) => router.nest_service("/slips", ServeDir::new(dir)),
        None => router,
    };

    router.layer(TraceLayer::new_for_http())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn upload(
    State(relay): State<Arc<Relay>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<RelayResponse>, ApiError> {
    let request = UploadRequest {
        body: body.to_vec(),
        content_type: header_value(&headers, header::CONTENT_TYPE.as_str()),
        secret_header: header_value(&headers, SECRET_HEADER),
        params,
    };
    debug!("Upload of {} bytes", request.body.len());

    let response = relay.process_upload(request).await?;
    Ok(Json(response))
}

async fn line_webhook(
    State(relay): State<Arc<Relay>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(envelope): Json<ChatEnvelope>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let header = header_value(&headers, SECRET_HEADER);
    let secret = resolve_secret(header.as_deref(), &params);
    debug!("Chat webhook with {} events", envelope.events.len());

    let handled = relay.handle_chat_envelope(secret, &envelope).await?;
    Ok(Json(json!({ "status": "ok", "handled": handled })))
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Relay failure rendered as `{"status":"error","message":..}`.
pub struct ApiError(SlipscanError);

impl From<SlipscanError> for ApiError {
    fn from(err: SlipscanError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SlipscanError::Relay(RelayError::Unauthorized) => StatusCode::UNAUTHORIZED,
            SlipscanError::Relay(RelayError::EmptyBody) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        } else {
            debug!("Request rejected: {}", self.0);
        }

        let body = json!({ "status": "error", "message": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => debug!("Received Ctrl+C"),
        _ = terminate => debug!("Received terminate signal"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::http::{HeaderName, HeaderValue};
    use axum_test::TestServer;
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use slipscan_core::{
        MessagingApi, MessagingError, OcrError, OcrProvider, OcrText, SlipStore, StorageError,
        StoredSlip,
    };

    const SLIP_TEXT: &str = "โอนเงินสำเร็จ\n2024-03-05 14:30\n123-4-56789-0\n1,234.50 บาท";

    struct FakeOcr;

    #[async_trait]
    impl OcrProvider for FakeOcr {
        async fn recognize(&self, _image: &[u8]) -> Result<OcrText, OcrError> {
            Ok(OcrText {
                text: SLIP_TEXT.to_string(),
                debug: Some("Vision HTTP 200".to_string()),
            })
        }
    }

    struct FakeStore;

    #[async_trait]
    impl SlipStore for FakeStore {
        async fn put(
            &self,
            filename: &str,
            _content_type: &str,
            _bytes: &[u8],
        ) -> Result<StoredSlip, StorageError> {
            Ok(StoredSlip {
                name: filename.to_string(),
                url: format!("https://slips.example/{filename}"),
            })
        }
    }

    #[derive(Default)]
    struct FakeMessenger {
        pushed: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MessagingApi for FakeMessenger {
        async fn fetch_content(&self, _message_id: &str) -> Result<Vec<u8>, MessagingError> {
            Ok(vec![0xFF, 0xD8])
        }

        async fn push_text(&self, to: &str, _text: &str) -> Result<(), MessagingError> {
            self.pushed.lock().unwrap().push(to.to_string());
            Ok(())
        }
    }

    fn server(relay: Relay) -> TestServer {
        let app = build_router(Arc::new(relay), &SlipscanConfig::default());
        TestServer::new(app).expect("Could not create test server.")
    }

    fn full_relay() -> Relay {
        Relay::new(SlipParser::new())
            .with_secret("s3cret")
            .with_ocr(Arc::new(FakeOcr))
            .with_store(Arc::new(FakeStore))
    }

    fn secret_header(value: &'static str) -> (HeaderName, HeaderValue) {
        (
            HeaderName::from_static(SECRET_HEADER),
            HeaderValue::from_static(value),
        )
    }

    #[tokio::test]
    async fn test_health_reports_ok() {
        let response = server(Relay::new(SlipParser::new())).get("/health").await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>(), json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_upload_returns_parsed_slip() {
        let (name, value) = secret_header("s3cret");
        let response = server(full_relay())
            .post("/upload")
            .add_query_param("filename", "my slip.jpg")
            .add_query_param("room", "A1")
            .add_header(name, value)
            .bytes(Bytes::from_static(b"\xFF\xD8\xFF"))
            .await;

        response.assert_status_ok();
        let body = response.json::<Value>();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["amount"], json!(1234.5));
        assert_eq!(body["paidAt"], "2024-03-05T14:30:00+07:00");
        assert_eq!(body["bankAccount"], "123-4-56789-0");
        assert_eq!(body["slipId"], "SCN-20240305-143000");
        assert_eq!(body["slipUrl"], "https://slips.example/my_slip.jpg");
        assert_eq!(body["ocrDebug"], "Vision HTTP 200");
        assert_eq!(body["metadata"], json!({ "room": "A1" }));
    }

    #[tokio::test]
    async fn test_upload_accepts_secret_query_param() {
        let response = server(full_relay())
            .post("/upload")
            .add_query_param("secret", "s3cret")
            .bytes(Bytes::from_static(b"\xFF\xD8\xFF"))
            .await;

        response.assert_status_ok();
    }

    #[tokio::test]
    async fn test_upload_empty_header_falls_back_to_query_secret() {
        let response = server(full_relay())
            .post("/upload")
            .add_header(
                HeaderName::from_static(SECRET_HEADER),
                HeaderValue::from_static(""),
            )
            .add_query_param("secret", "s3cret")
            .bytes(Bytes::from_static(b"\xFF\xD8\xFF"))
            .await;

        response.assert_status_ok();
    }

    #[tokio::test]
    async fn test_upload_rejects_wrong_secret() {
        let (name, value) = secret_header("wrong");
        let response = server(full_relay())
            .post("/upload")
            .add_header(name, value)
            .bytes(Bytes::from_static(b"\xFF\xD8\xFF"))
            .expect_failure()
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.json::<Value>(),
            json!({ "status": "error", "message": "relay error: missing or invalid secret" })
        );
    }

    #[tokio::test]
    async fn test_upload_rejects_empty_body() {
        let (name, value) = secret_header("s3cret");
        let response = server(full_relay())
            .post("/upload")
            .add_header(name, value)
            .expect_failure()
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["message"], "relay error: empty request body");
    }

    #[tokio::test]
    async fn test_upload_without_storage_is_server_error() {
        let relay = Relay::new(SlipParser::new()).with_ocr(Arc::new(FakeOcr));
        let response = server(relay)
            .post("/upload")
            .bytes(Bytes::from_static(b"\xFF\xD8\xFF"))
            .expect_failure()
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.json::<Value>()["message"],
            "relay error: missing storage configuration"
        );
    }

    #[tokio::test]
    async fn test_line_webhook_answers_image_events() {
        let messenger = Arc::new(FakeMessenger::default());
        let relay = Relay::new(SlipParser::new())
            .with_ocr(Arc::new(FakeOcr))
            .with_messaging(messenger.clone());

        let envelope = json!({
            "destination": "U0",
            "events": [
                {
                    "type": "message",
                    "replyToken": "r1",
                    "source": { "type": "user", "userId": "U123" },
                    "message": { "id": "m1", "type": "image" },
                    "timestamp": 1709623800000_i64
                },
                {
                    "type": "message",
                    "source": { "type": "user", "userId": "U123" },
                    "message": { "id": "m2", "type": "text", "text": "hi" }
                }
            ]
        });

        let response = server(relay).post("/webhook/line").json(&envelope).await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>(), json!({ "status": "ok", "handled": 1 }));
        assert_eq!(*messenger.pushed.lock().unwrap(), vec!["U123".to_string()]);
    }

    #[tokio::test]
    async fn test_line_webhook_checks_secret() {
        let relay = Relay::new(SlipParser::new()).with_secret("s3cret");
        let response = server(relay)
            .post("/webhook/line")
            .json(&json!({ "events": [] }))
            .expect_failure()
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_line_webhook_accepts_worker_secret_param() {
        let relay = Relay::new(SlipParser::new()).with_secret("s3cret");
        let response = server(relay)
            .post("/webhook/line")
            .add_query_param("workerSecret", "s3cret")
            .json(&json!({ "events": [] }))
            .await;

        response.assert_status_ok();
        assert_eq!(response.json::<Value>(), json!({ "status": "ok", "handled": 0 }));
    }

    #[test]
    fn test_build_relay_with_defaults() {
        assert!(build_relay(&SlipscanConfig::default()).is_ok());
    }
}
