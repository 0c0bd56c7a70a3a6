use anyhow::{Context, Result};
use comment_ops_commands::{CommentEvent, RepoRef};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookUser {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookComment {
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookIssue {
    pub node_id: String,
    pub html_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookRepository {
    pub name: String,
    pub owner: WebhookUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookInstallation {
    pub id: u64,
}

#[derive(Debug, Clone, Deserialize)]
/// Subset of the `issue_comment` webhook payload the router needs.
pub struct IssueCommentPayload {
    pub action: String,
    pub comment: WebhookComment,
    pub issue: WebhookIssue,
    pub repository: WebhookRepository,
    pub sender: WebhookUser,
    #[serde(default)]
    pub installation: Option<WebhookInstallation>,
}

impl IssueCommentPayload {
    pub fn is_created(&self) -> bool {
        self.action == "created"
    }

    pub fn into_comment_event(self, delivery_id: &str) -> Result<CommentEvent> {
        let installation = self
            .installation
            .context("issue_comment payload is missing installation.id")?;
        Ok(CommentEvent {
            event_id: delivery_id.to_string(),
            actor_handle: self.sender.login,
            repo: RepoRef::new(self.repository.owner.login, self.repository.name),
            target_node_id: self.issue.node_id,
            target_url: self.issue.html_url,
            installation_id: installation.id,
            comment_body: self.comment.body.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
pub(crate) fn sample_issue_comment_payload(body: &str) -> serde_json::Value {
    serde_json::json!({
        "action": "created",
        "comment": {"id": 1, "body": body},
        "issue": {
            "number": 1,
            "node_id": "I_kw1",
            "html_url": "https://github.com/octo/widgets/issues/1"
        },
        "repository": {"name": "widgets", "owner": {"login": "octo"}},
        "sender": {"login": "alice"},
        "installation": {"id": 42}
    })
}
