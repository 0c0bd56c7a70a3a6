use anyhow::Result;
use async_trait::async_trait;

use crate::command_arguments::CloseReason;
use crate::comment_event::IssueTarget;

/// Mutations and lookups against the hosting platform, authenticated for one event.
///
/// Lookups return `Ok(None)` when the name does not resolve and `Err` only for
/// transport or API failures.
#[async_trait]
pub trait IssueTrackerClient: Send + Sync {
    async fn transfer_issue(&self, target: &IssueTarget, target_repository: &str) -> Result<()>;

    async fn close_issue(&self, target: &IssueTarget, reason: CloseReason) -> Result<()>;

    async fn reopen_issue(&self, target: &IssueTarget) -> Result<()>;

    async fn lookup_label_id(&self, target: &IssueTarget, label: &str) -> Result<Option<String>>;

    async fn add_labels(&self, target: &IssueTarget, label_ids: &[String]) -> Result<()>;

    async fn remove_labels(&self, target: &IssueTarget, label_ids: &[String]) -> Result<()>;

    async fn lookup_user_id(&self, login: &str) -> Result<Option<String>>;

    async fn lookup_team_id(&self, organization: &str, slug: &str) -> Result<Option<String>>;

    async fn request_reviews(
        &self,
        target: &IssueTarget,
        user_ids: &[String],
        team_ids: &[String],
    ) -> Result<()>;

    async fn add_comment(&self, target: &IssueTarget, body: &str) -> Result<()>;
}
