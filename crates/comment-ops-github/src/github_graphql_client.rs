use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use comment_ops_commands::{CloseReason, IssueTarget, IssueTrackerClient};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::github_http::truncate_for_error;

const TARGET_REPOSITORY_QUERY: &str = r#"
query ($owner: String!, $targetRepo: String!) {
  target: repository(owner: $owner, name: $targetRepo) {
    id
  }
}
"#;

const TRANSFER_ISSUE_MUTATION: &str = r#"
mutation ($issue: ID!, $repo: ID!) {
  transferIssue(input: { issueId: $issue, repositoryId: $repo }) {
    issue {
      url
    }
  }
}
"#;

const CLOSE_ISSUE_MUTATION: &str = r#"
mutation ($issue: ID!, $stateReason: IssueClosedStateReason) {
  closeIssue(input: { issueId: $issue, stateReason: $stateReason }) {
    issue {
      url
    }
  }
}
"#;

const REOPEN_ISSUE_MUTATION: &str = r#"
mutation ($issue: ID!) {
  reopenIssue(input: { issueId: $issue }) {
    issue {
      url
    }
  }
}
"#;

const LABEL_ID_QUERY: &str = r#"
query ($login: String!, $repository: String!, $labelName: String!) {
  repositoryOwner(login: $login) {
    repository(name: $repository) {
      label(name: $labelName) {
        id
      }
    }
  }
}
"#;

const ADD_LABELS_MUTATION: &str = r#"
mutation ($labelableId: ID!, $labelIds: [ID!]!) {
  addLabelsToLabelable(input: { labelableId: $labelableId, labelIds: $labelIds }) {
    clientMutationId
  }
}
"#;

const REMOVE_LABELS_MUTATION: &str = r#"
mutation ($labelableId: ID!, $labelIds: [ID!]!) {
  removeLabelsFromLabelable(input: { labelableId: $labelableId, labelIds: $labelIds }) {
    clientMutationId
  }
}
"#;

const USER_ID_QUERY: &str = r#"
query ($login: String!) {
  repositoryOwner(login: $login) {
    ... on User {
      id
    }
  }
}
"#;

const TEAM_ID_QUERY: &str = r#"
query ($login: String!, $teamName: String!) {
  organization(login: $login) {
    team(slug: $teamName) {
      id
    }
  }
}
"#;

const REQUEST_REVIEWS_MUTATION: &str = r#"
mutation ($pullRequestId: ID!, $userIds: [ID!]!, $teamIds: [ID!]!) {
  requestReviews(
    input: { pullRequestId: $pullRequestId, userIds: $userIds, teamIds: $teamIds, union: true }
  ) {
    pullRequest {
      url
    }
  }
}
"#;

const ADD_COMMENT_MUTATION: &str = r#"
mutation ($comment: String!, $subjectId: ID!) {
  addComment(input: { subjectId: $subjectId, body: $comment }) {
    commentEdge {
      node {
        id
      }
    }
  }
}
"#;

#[derive(Debug, Deserialize)]
struct GraphqlEnvelope {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

/// GitHub GraphQL client bound to one installation token.
#[derive(Clone)]
pub struct GithubGraphqlClient {
    http: reqwest::Client,
    graphql_url: String,
    token: String,
}

impl GithubGraphqlClient {
    pub fn new(http: reqwest::Client, graphql_url: impl Into<String>, token: &str) -> Self {
        Self {
            http,
            graphql_url: graphql_url.into(),
            token: token.trim().to_string(),
        }
    }

    async fn send(&self, operation: &str, query: &str, variables: Value) -> Result<GraphqlEnvelope> {
        let response = self
            .http
            .post(&self.graphql_url)
            .bearer_auth(&self.token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .with_context(|| format!("github graphql {operation} request failed"))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!(
                "github graphql {operation} failed with status {}: {}",
                status.as_u16(),
                truncate_for_error(&body, 800)
            );
        }
        response
            .json::<GraphqlEnvelope>()
            .await
            .with_context(|| format!("failed to decode github graphql {operation}"))
    }

    /// Run a mutation or query that must succeed without GraphQL errors.
    async fn execute(&self, operation: &str, query: &str, variables: Value) -> Result<Value> {
        let envelope = self.send(operation, query, variables).await?;
        if !envelope.errors.is_empty() {
            bail!(
                "github graphql {operation} returned errors: {}",
                join_error_messages(&envelope.errors)
            );
        }
        Ok(envelope.data.unwrap_or(Value::Null))
    }

    /// Run a lookup, treating `NOT_FOUND` errors as an unresolved name.
    async fn lookup_id(
        &self,
        operation: &str,
        query: &str,
        variables: Value,
        id_pointer: &str,
    ) -> Result<Option<String>> {
        let envelope = self.send(operation, query, variables).await?;
        let not_found_only = envelope
            .errors
            .iter()
            .all(|error| error.kind.as_deref() == Some("NOT_FOUND"));
        if !not_found_only {
            bail!(
                "github graphql {operation} returned errors: {}",
                join_error_messages(&envelope.errors)
            );
        }
        Ok(envelope
            .data
            .as_ref()
            .and_then(|data| data.pointer(id_pointer))
            .and_then(Value::as_str)
            .map(ToOwned::to_owned))
    }
}

fn join_error_messages(errors: &[GraphqlError]) -> String {
    truncate_for_error(
        &errors
            .iter()
            .map(|error| error.message.as_str())
            .collect::<Vec<_>>()
            .join("; "),
        800,
    )
}

#[async_trait]
impl IssueTrackerClient for GithubGraphqlClient {
    async fn transfer_issue(&self, target: &IssueTarget, target_repository: &str) -> Result<()> {
        let repository_id = self
            .lookup_id(
                "resolve transfer target",
                TARGET_REPOSITORY_QUERY,
                json!({ "owner": target.repo.owner, "targetRepo": target_repository }),
                "/target/id",
            )
            .await?;
        let Some(repository_id) = repository_id else {
            bail!(
                "transfer target repository {}/{} not found",
                target.repo.owner,
                target_repository
            );
        };
        self.execute(
            "transfer issue",
            TRANSFER_ISSUE_MUTATION,
            json!({ "issue": target.node_id, "repo": repository_id }),
        )
        .await?;
        Ok(())
    }

    async fn close_issue(&self, target: &IssueTarget, reason: CloseReason) -> Result<()> {
        self.execute(
            "close issue",
            CLOSE_ISSUE_MUTATION,
            json!({ "issue": target.node_id, "stateReason": reason.as_str() }),
        )
        .await?;
        Ok(())
    }

    async fn reopen_issue(&self, target: &IssueTarget) -> Result<()> {
        self.execute(
            "reopen issue",
            REOPEN_ISSUE_MUTATION,
            json!({ "issue": target.node_id }),
        )
        .await?;
        Ok(())
    }

    async fn lookup_label_id(&self, target: &IssueTarget, label: &str) -> Result<Option<String>> {
        self.lookup_id(
            "resolve label",
            LABEL_ID_QUERY,
            json!({
                "login": target.repo.owner,
                "repository": target.repo.name,
                "labelName": label,
            }),
            "/repositoryOwner/repository/label/id",
        )
        .await
    }

    async fn add_labels(&self, target: &IssueTarget, label_ids: &[String]) -> Result<()> {
        self.execute(
            "add labels",
            ADD_LABELS_MUTATION,
            json!({ "labelableId": target.node_id, "labelIds": label_ids }),
        )
        .await?;
        Ok(())
    }

    async fn remove_labels(&self, target: &IssueTarget, label_ids: &[String]) -> Result<()> {
        self.execute(
            "remove labels",
            REMOVE_LABELS_MUTATION,
            json!({ "labelableId": target.node_id, "labelIds": label_ids }),
        )
        .await?;
        Ok(())
    }

    async fn lookup_user_id(&self, login: &str) -> Result<Option<String>> {
        self.lookup_id(
            "resolve user",
            USER_ID_QUERY,
            json!({ "login": login }),
            "/repositoryOwner/id",
        )
        .await
    }

    async fn lookup_team_id(&self, organization: &str, slug: &str) -> Result<Option<String>> {
        self.lookup_id(
            "resolve team",
            TEAM_ID_QUERY,
            json!({ "login": organization, "teamName": slug }),
            "/organization/team/id",
        )
        .await
    }

    async fn request_reviews(
        &self,
        target: &IssueTarget,
        user_ids: &[String],
        team_ids: &[String],
    ) -> Result<()> {
        self.execute(
            "request reviews",
            REQUEST_REVIEWS_MUTATION,
            json!({
                "pullRequestId": target.node_id,
                "userIds": user_ids,
                "teamIds": team_ids,
            }),
        )
        .await?;
        Ok(())
    }

    async fn add_comment(&self, target: &IssueTarget, body: &str) -> Result<()> {
        self.execute(
            "add comment",
            ADD_COMMENT_MUTATION,
            json!({ "subjectId": target.node_id, "comment": body }),
        )
        .await?;
        Ok(())
    }
}
