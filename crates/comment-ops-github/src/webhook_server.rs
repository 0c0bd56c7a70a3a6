use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use comment_ops_commands::{route_comment_event, CommentOpsBackend, RouterOptions};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::webhook_payload::IssueCommentPayload;

pub const WEBHOOK_PATH: &str = "/api/github/webhooks";
const HEALTH_PROBE_BODY: &str = "For webhooks POST to path /api/github/webhooks\n";

#[derive(Debug, Error)]
/// Reasons a webhook delivery is refused before routing.
pub enum WebhookRejection {
    #[error("github webhook signature verification failed")]
    InvalidSignature,
    #[error("missing required header {0}")]
    MissingHeader(&'static str),
    #[error("invalid github webhook payload: {0}")]
    ParseFailed(String),
}

impl WebhookRejection {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidSignature => StatusCode::UNAUTHORIZED,
            Self::MissingHeader(_) | Self::ParseFailed(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidSignature => "invalid_signature",
            Self::MissingHeader(_) => "missing_header",
            Self::ParseFailed(_) => "parse_failed",
        }
    }
}

impl IntoResponse for WebhookRejection {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(json!({"error": {"code": self.code(), "message": self.to_string()}})),
        )
            .into_response()
    }
}

#[derive(Debug, Clone)]
pub struct WebhookServerConfig {
    pub bind: SocketAddr,
    /// When unset, deliveries are accepted without signature verification.
    pub webhook_secret: Option<String>,
    pub router_options: RouterOptions,
}

pub struct WebhookServerState {
    pub webhook_secret: Option<String>,
    pub router_options: RouterOptions,
    pub backend: Arc<dyn CommentOpsBackend>,
}

pub fn build_webhook_router(state: Arc<WebhookServerState>) -> Router {
    Router::new()
        .route(
            WEBHOOK_PATH,
            post(handle_github_webhook).fallback(handle_health_probe),
        )
        .fallback(handle_health_probe)
        .with_state(state)
}

pub async fn run_webhook_server(
    config: WebhookServerConfig,
    backend: Arc<dyn CommentOpsBackend>,
) -> Result<()> {
    if config.webhook_secret.is_none() {
        tracing::warn!("webhook secret not configured; deliveries are not signature-verified");
    }
    let state = Arc::new(WebhookServerState {
        webhook_secret: config.webhook_secret,
        router_options: config.router_options,
        backend,
    });
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind webhook listener on {}", config.bind))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve webhook listener address")?;
    tracing::info!(addr = %local_addr, path = WEBHOOK_PATH, "listening for github webhooks");

    axum::serve(listener, build_webhook_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("webhook server terminated unexpectedly")
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

async fn handle_health_probe() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain")],
        HEALTH_PROBE_BODY,
    )
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

async fn handle_github_webhook(
    State(state): State<Arc<WebhookServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<serde_json::Value>), WebhookRejection> {
    if let Some(secret) = state.webhook_secret.as_deref() {
        let signature = header_value(&headers, "x-hub-signature-256").unwrap_or("");
        if verify_sha256_hmac_signature(&body, signature, secret).is_err() {
            tracing::warn!("rejected github webhook with invalid signature");
            return Err(WebhookRejection::InvalidSignature);
        }
    }

    let event_name = header_value(&headers, "x-github-event")
        .ok_or(WebhookRejection::MissingHeader("x-github-event"))?;
    let delivery_id = header_value(&headers, "x-github-delivery")
        .unwrap_or("unknown-delivery")
        .to_string();
    if event_name != "issue_comment" {
        tracing::debug!(event = event_name, delivery = %delivery_id, "ignoring github webhook event");
        return Ok(ignored());
    }

    let payload = serde_json::from_slice::<IssueCommentPayload>(&body)
        .map_err(|error| WebhookRejection::ParseFailed(error.to_string()))?;
    if !payload.is_created() {
        return Ok(ignored());
    }
    let event = payload
        .into_comment_event(&delivery_id)
        .map_err(|error| WebhookRejection::ParseFailed(error.to_string()))?;

    let task_state = state.clone();
    tokio::spawn(async move {
        match route_comment_event(task_state.backend.as_ref(), &event, task_state.router_options)
            .await
        {
            Ok(report) if !report.outcomes.is_empty() => tracing::info!(
                event_id = %report.event_id,
                executed = report.executed_count(),
                denied = report.denied_count(),
                failed = report.failed_count(),
                "comment event processed"
            ),
            Ok(_) => {}
            Err(error) => tracing::warn!(
                event_id = %event.event_id,
                error = %format!("{error:#}"),
                "comment event aborted"
            ),
        }
    });

    Ok((StatusCode::ACCEPTED, Json(json!({"status": "accepted"}))))
}

fn ignored() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::ACCEPTED, Json(json!({"status": "ignored"})))
}

fn verify_sha256_hmac_signature(payload: &[u8], signature_header: &str, secret: &str) -> Result<()> {
    let digest_hex = signature_header
        .strip_prefix("sha256=")
        .ok_or_else(|| anyhow!("signature must use sha256=<hex> format"))?;
    let signature_bytes = decode_hex(digest_hex)?;
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .context("failed to initialize hmac verifier")?;
    mac.update(payload);
    mac.verify_slice(&signature_bytes)
        .map_err(|_| anyhow!("signature verification failed"))
}

fn decode_hex(raw: &str) -> Result<Vec<u8>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("signature digest cannot be empty");
    }
    if trimmed.len() % 2 != 0 {
        bail!("signature digest must have an even number of hex characters");
    }
    (0..trimmed.len())
        .step_by(2)
        .map(|index| {
            let chunk = trimmed
                .get(index..index + 2)
                .ok_or_else(|| anyhow!("signature digest must be ascii hex"))?;
            u8::from_str_radix(chunk, 16)
                .with_context(|| format!("invalid hex byte '{chunk}' in signature digest"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use comment_ops_commands::{
        CommentOpsBackend, IssueTrackerClient, PolicyConfig, RepoRef, RouterOptions,
    };
    use hmac::{Hmac, Mac};
    use reqwest::{Client, StatusCode};
    use sha2::Sha256;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    use super::{
        build_webhook_router, decode_hex, verify_sha256_hmac_signature, WebhookServerState,
        WEBHOOK_PATH,
    };
    use crate::webhook_payload::sample_issue_comment_payload;

    struct ChannelBackend {
        installations: mpsc::UnboundedSender<u64>,
    }

    #[async_trait]
    impl CommentOpsBackend for ChannelBackend {
        async fn installation_token(&self, installation_id: u64) -> Result<String> {
            let _ = self.installations.send(installation_id);
            bail!("test backend stops after token request")
        }

        async fn policy_config(&self, _token: &str, _repo: &RepoRef) -> Result<PolicyConfig> {
            Ok(PolicyConfig::default())
        }

        fn issue_tracker(&self, _token: &str) -> Result<Arc<dyn IssueTrackerClient>> {
            bail!("unused")
        }
    }

    fn sign(secret: &str, body: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("hmac");
        mac.update(body.as_bytes());
        let signature_bytes = mac.finalize().into_bytes();
        format!(
            "sha256={}",
            signature_bytes
                .iter()
                .map(|byte| format!("{byte:02x}"))
                .collect::<String>()
        )
    }

    async fn spawn_server(
        secret: Option<&str>,
    ) -> (String, mpsc::UnboundedReceiver<u64>, tokio::task::JoinHandle<()>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let state = Arc::new(WebhookServerState {
            webhook_secret: secret.map(ToOwned::to_owned),
            router_options: RouterOptions::default(),
            backend: Arc::new(ChannelBackend {
                installations: sender,
            }),
        });
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let app = build_webhook_router(state);
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        (format!("http://{addr}"), receiver, handle)
    }

    #[test]
    fn unit_verify_signature_accepts_matching_digest() {
        let body = "{\"hello\":true}";
        assert!(verify_sha256_hmac_signature(body.as_bytes(), &sign("s3cret", body), "s3cret").is_ok());
        assert!(verify_sha256_hmac_signature(body.as_bytes(), &sign("other", body), "s3cret").is_err());
        assert!(verify_sha256_hmac_signature(body.as_bytes(), "sha1=abcd", "s3cret").is_err());
    }

    #[test]
    fn regression_decode_hex_rejects_malformed_digests() {
        assert_eq!(decode_hex("0aff").expect("hex"), vec![0x0a, 0xff]);
        assert!(decode_hex("").is_err());
        assert!(decode_hex("abc").is_err());
        assert!(decode_hex("zz").is_err());
        assert!(decode_hex("éa").is_err());
    }

    #[tokio::test]
    async fn integration_signed_issue_comment_is_routed() {
        let (base, mut installations, handle) = spawn_server(Some("secret")).await;
        let body = sample_issue_comment_payload("/reopen").to_string();

        let response = Client::new()
            .post(format!("{base}{WEBHOOK_PATH}"))
            .header("x-github-event", "issue_comment")
            .header("x-github-delivery", "delivery-1")
            .header("x-hub-signature-256", sign("secret", &body))
            .body(body)
            .send()
            .await
            .expect("send webhook");
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let installation = tokio::time::timeout(Duration::from_secs(2), installations.recv())
            .await
            .expect("router invoked")
            .expect("installation id");
        assert_eq!(installation, 42);
        handle.abort();
    }

    #[tokio::test]
    async fn regression_invalid_signature_is_rejected_before_routing() {
        let (base, mut installations, handle) = spawn_server(Some("secret")).await;
        let response = Client::new()
            .post(format!("{base}{WEBHOOK_PATH}"))
            .header("x-github-event", "issue_comment")
            .header("x-hub-signature-256", "sha256=deadbeef")
            .body(sample_issue_comment_payload("/reopen").to_string())
            .send()
            .await
            .expect("send webhook");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let payload: serde_json::Value = response.json().await.expect("json");
        assert_eq!(payload["error"]["code"], "invalid_signature");
        assert!(installations.try_recv().is_err());
        handle.abort();
    }

    #[tokio::test]
    async fn functional_other_events_and_actions_are_ignored() {
        let (base, mut installations, handle) = spawn_server(None).await;
        let client = Client::new();

        let push = client
            .post(format!("{base}{WEBHOOK_PATH}"))
            .header("x-github-event", "push")
            .body("{}")
            .send()
            .await
            .expect("send push");
        assert_eq!(push.status(), StatusCode::ACCEPTED);
        let payload: serde_json::Value = push.json().await.expect("json");
        assert_eq!(payload["status"], "ignored");

        let mut edited = sample_issue_comment_payload("/reopen");
        edited["action"] = serde_json::Value::from("edited");
        let edited = client
            .post(format!("{base}{WEBHOOK_PATH}"))
            .header("x-github-event", "issue_comment")
            .body(edited.to_string())
            .send()
            .await
            .expect("send edited");
        assert_eq!(edited.status(), StatusCode::ACCEPTED);

        tokio::time::sleep(Duration::from_millis(25)).await;
        assert!(installations.try_recv().is_err());
        handle.abort();
    }

    #[tokio::test]
    async fn regression_malformed_payload_and_missing_event_header_are_bad_requests() {
        let (base, _installations, handle) = spawn_server(None).await;
        let client = Client::new();

        let malformed = client
            .post(format!("{base}{WEBHOOK_PATH}"))
            .header("x-github-event", "issue_comment")
            .body("{not json")
            .send()
            .await
            .expect("send malformed");
        assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);

        let missing = client
            .post(format!("{base}{WEBHOOK_PATH}"))
            .body("{}")
            .send()
            .await
            .expect("send without event header");
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
        handle.abort();
    }

    #[tokio::test]
    async fn unit_health_probe_answers_unmatched_requests() {
        let (base, _installations, handle) = spawn_server(Some("secret")).await;
        let client = Client::new();
        for url in [format!("{base}/"), format!("{base}{WEBHOOK_PATH}")] {
            let response = client.get(url).send().await.expect("probe");
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(
                response.text().await.expect("body"),
                "For webhooks POST to path /api/github/webhooks\n"
            );
        }
        handle.abort();
    }
}
