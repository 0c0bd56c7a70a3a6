use std::{sync::Arc, time::Duration};

use comment_ops_commands::{
    route_comment_event, CommandKind, CommandOutcomeStatus, CommentEvent, RepoRef, RouterOptions,
};
use comment_ops_github::{
    build_webhook_router, GithubBackendConfig, GithubCommentOpsBackend, InstallationTokenSource,
    WebhookServerState, WEBHOOK_PATH,
};
use hmac::{Hmac, Mac};
use httpmock::prelude::*;
use serde_json::json;
use sha2::Sha256;
use tokio::net::TcpListener;

const CONFIG_PATH: &str = "/repos/octo/widgets/contents/.github/comment-ops.yml";

fn github_backend(server: &MockServer) -> GithubCommentOpsBackend {
    let mut config = GithubBackendConfig::with_token_source(InstallationTokenSource::Static {
        token: "ghs_integration".to_string(),
    });
    config.api_base = server.base_url();
    config.request_timeout_ms = 3_000;
    GithubCommentOpsBackend::new(config).expect("github backend")
}

fn comment_event(body: &str) -> CommentEvent {
    CommentEvent {
        event_id: "delivery-it".to_string(),
        actor_handle: "alice".to_string(),
        repo: RepoRef::new("octo", "widgets"),
        target_node_id: "I_kw1".to_string(),
        target_url: "https://github.com/octo/widgets/issues/1".to_string(),
        installation_id: 42,
        comment_body: body.to_string(),
    }
}

fn sign(secret: &str, body: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("hmac");
    mac.update(body.as_bytes());
    format!(
        "sha256={}",
        mac.finalize()
            .into_bytes()
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect::<String>()
    )
}

#[tokio::test]
async fn integration_multi_command_comment_is_routed_against_github_api() {
    let server = MockServer::start();
    let config = server.mock(|when, then| {
        when.method(GET)
            .path(CONFIG_PATH)
            .header("authorization", "Bearer ghs_integration");
        then.status(200)
            .body("commands:\n  transfer:\n    enabled: false\n  label:\n    allowedLabels: [bug, missing]\n");
    });
    let transfer_denied = server.mock(|when, then| {
        when.method(POST)
            .path("/graphql")
            .body_includes("addComment")
            .body_includes("The transfer command is not enabled for this repository");
        then.status(200)
            .json_body(json!({"data": {"addComment": {"commentEdge": {"node": {"id": "IC_1"}}}}}));
    });
    let close = server.mock(|when, then| {
        when.method(POST)
            .path("/graphql")
            .body_includes("closeIssue")
            .body_includes("\"stateReason\":\"NOT_PLANNED\"");
        then.status(200)
            .json_body(json!({"data": {"closeIssue": {"issue": {"url": "u"}}}}));
    });
    let bug_label = server.mock(|when, then| {
        when.method(POST)
            .path("/graphql")
            .body_includes("\"labelName\":\"bug\"");
        then.status(200).json_body(json!({
            "data": {"repositoryOwner": {"repository": {"label": {"id": "LA_bug"}}}}
        }));
    });
    let missing_label = server.mock(|when, then| {
        when.method(POST)
            .path("/graphql")
            .body_includes("\"labelName\":\"missing\"");
        then.status(200).json_body(json!({
            "data": {"repositoryOwner": {"repository": {"label": null}}}
        }));
    });
    let add_labels = server.mock(|when, then| {
        when.method(POST)
            .path("/graphql")
            .body_includes("addLabelsToLabelable")
            .body_includes("\"labelIds\":[\"LA_bug\"]");
        then.status(200)
            .json_body(json!({"data": {"addLabelsToLabelable": {"clientMutationId": null}}}));
    });
    let unresolved_comment = server.mock(|when, then| {
        when.method(POST)
            .path("/graphql")
            .body_includes("addComment")
            .body_includes("I wasn't able to add the following labels: missing");
        then.status(200)
            .json_body(json!({"data": {"addComment": {"commentEdge": {"node": {"id": "IC_2"}}}}}));
    });

    let backend = github_backend(&server);
    let report = route_comment_event(
        &backend,
        &comment_event("/label bug, missing\n/transfer elsewhere\n/close not-planned"),
        RouterOptions::default(),
    )
    .await
    .expect("route event");

    let kinds = report
        .outcomes
        .iter()
        .map(|outcome| outcome.kind)
        .collect::<Vec<_>>();
    assert_eq!(
        kinds,
        vec![CommandKind::Transfer, CommandKind::Close, CommandKind::Label]
    );
    assert!(matches!(
        report.outcomes[0].status,
        CommandOutcomeStatus::Denied { .. }
    ));
    assert_eq!(report.outcomes[1].status, CommandOutcomeStatus::Executed);
    assert_eq!(report.outcomes[2].status, CommandOutcomeStatus::Executed);

    config.assert_calls(1);
    transfer_denied.assert_calls(1);
    close.assert_calls(1);
    bug_label.assert_calls(1);
    missing_label.assert_calls(1);
    add_labels.assert_calls(1);
    unresolved_comment.assert_calls(1);
}

#[tokio::test]
async fn integration_failed_mutation_does_not_block_sibling_commands() {
    let server = MockServer::start();
    let _config = server.mock(|when, then| {
        when.method(GET).path(CONFIG_PATH);
        then.status(404).body("{\"message\":\"Not Found\"}");
    });
    let close = server.mock(|when, then| {
        when.method(POST).path("/graphql").body_includes("closeIssue");
        then.status(200).json_body(json!({
            "data": null,
            "errors": [{"type": "FORBIDDEN", "message": "Resource not accessible by integration"}]
        }));
    });
    let reopen = server.mock(|when, then| {
        when.method(POST).path("/graphql").body_includes("reopenIssue");
        then.status(200)
            .json_body(json!({"data": {"reopenIssue": {"issue": {"url": "u"}}}}));
    });

    let backend = github_backend(&server);
    let report = route_comment_event(
        &backend,
        &comment_event("/close\n/reopen"),
        RouterOptions::default(),
    )
    .await
    .expect("route event");

    assert_eq!(report.failed_count(), 1);
    assert_eq!(report.executed_count(), 1);
    match &report.outcomes[0].status {
        CommandOutcomeStatus::Failed { error } => {
            assert!(error.contains("Resource not accessible by integration"))
        }
        other => panic!("unexpected close outcome {other:?}"),
    }
    close.assert_calls(1);
    reopen.assert_calls(1);
}

#[tokio::test]
async fn integration_signed_webhook_delivery_reopens_issue() {
    let server = MockServer::start();
    let _config = server.mock(|when, then| {
        when.method(GET).path(CONFIG_PATH);
        then.status(404);
    });
    let reopen = server.mock(|when, then| {
        when.method(POST)
            .path("/graphql")
            .header("authorization", "Bearer ghs_integration")
            .body_includes("reopenIssue")
            .body_includes("\"issue\":\"I_kw1\"");
        then.status(200)
            .json_body(json!({"data": {"reopenIssue": {"issue": {"url": "u"}}}}));
    });

    let state = Arc::new(WebhookServerState {
        webhook_secret: Some("hook-secret".to_string()),
        router_options: RouterOptions::default(),
        backend: Arc::new(github_backend(&server)),
    });
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = build_webhook_router(state);
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let payload = json!({
        "action": "created",
        "comment": {"id": 7, "body": "thanks!\n/reopen"},
        "issue": {"number": 1, "node_id": "I_kw1", "html_url": "https://github.com/octo/widgets/issues/1"},
        "repository": {"name": "widgets", "owner": {"login": "octo"}},
        "sender": {"login": "alice"},
        "installation": {"id": 42}
    })
    .to_string();
    let response = reqwest::Client::new()
        .post(format!("http://{addr}{WEBHOOK_PATH}"))
        .header("x-github-event", "issue_comment")
        .header("x-github-delivery", "delivery-77")
        .header("x-hub-signature-256", sign("hook-secret", &payload))
        .body(payload)
        .send()
        .await
        .expect("deliver webhook");
    assert_eq!(response.status(), reqwest::StatusCode::ACCEPTED);

    let mut attempts = 0;
    while reopen.calls() == 0 && attempts < 100 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        attempts += 1;
    }
    reopen.assert_calls(1);
    handle.abort();
}
