use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::command_registry::{none_match, recognize_commands, CommandContext, CommandKind};
use crate::comment_event::{CommentEvent, RepoRef};
use crate::issue_tracker::IssueTrackerClient;
use crate::policy_config::PolicyConfig;

/// Per-event collaborators the router acquires once a command has matched.
#[async_trait]
pub trait CommentOpsBackend: Send + Sync {
    async fn installation_token(&self, installation_id: u64) -> Result<String>;

    async fn policy_config(&self, token: &str, repo: &RepoRef) -> Result<PolicyConfig>;

    fn issue_tracker(&self, token: &str) -> Result<Arc<dyn IssueTrackerClient>>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouterOptions {
    /// Log unmatched comment bodies at info instead of debug.
    pub verbose: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Enumerates supported `CommandOutcomeStatus` values.
pub enum CommandOutcomeStatus {
    Executed,
    Denied { reason: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub kind: CommandKind,
    pub status: CommandOutcomeStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Per-event summary; outcomes follow registration order.
pub struct RouteReport {
    pub event_id: String,
    pub outcomes: Vec<CommandOutcome>,
}

impl RouteReport {
    pub fn executed_count(&self) -> usize {
        self.count(|status| matches!(status, CommandOutcomeStatus::Executed))
    }

    pub fn denied_count(&self) -> usize {
        self.count(|status| matches!(status, CommandOutcomeStatus::Denied { .. }))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|status| matches!(status, CommandOutcomeStatus::Failed { .. }))
    }

    fn count(&self, predicate: impl Fn(&CommandOutcomeStatus) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| predicate(&outcome.status))
            .count()
    }
}

/// Recognise, authorise, and dispatch every command in one comment event.
///
/// Token and policy acquisition failures abort the event. Once dispatch starts,
/// each matched command is evaluated and executed independently in
/// registration order; a denial or collaborator failure never blocks the rest.
pub async fn route_comment_event(
    backend: &dyn CommentOpsBackend,
    event: &CommentEvent,
    options: RouterOptions,
) -> Result<RouteReport> {
    let mut report = RouteReport {
        event_id: event.event_id.clone(),
        outcomes: Vec::new(),
    };

    let matches = recognize_commands(&event.comment_body);
    if none_match(&matches) {
        if options.verbose {
            tracing::info!(event_id = %event.event_id, body = %event.comment_body, "no command matched");
        } else {
            tracing::debug!(event_id = %event.event_id, "no command matched");
        }
        return Ok(report);
    }

    let token = backend
        .installation_token(event.installation_id)
        .await
        .with_context(|| {
            format!(
                "failed to acquire installation token for installation {}",
                event.installation_id
            )
        })?;
    let config = backend
        .policy_config(&token, &event.repo)
        .await
        .with_context(|| format!("failed to load comment-ops config for {}", event.repo))?;
    let tracker = backend.issue_tracker(&token)?;
    let context = CommandContext {
        event,
        tracker: tracker.as_ref(),
    };
    let target = event.target();

    for command in matches.into_iter().flatten() {
        let enablement = command.check_enabled(&config);
        let status = if enablement.enabled {
            match command.execute(&context).await {
                Ok(()) => CommandOutcomeStatus::Executed,
                Err(error) => {
                    tracing::warn!(
                        event_id = %event.event_id,
                        command = command.kind.as_str(),
                        error = %format!("{error:#}"),
                        "comment command failed"
                    );
                    CommandOutcomeStatus::Failed {
                        error: format!("{error:#}"),
                    }
                }
            }
        } else {
            let reason = enablement.error.unwrap_or_else(|| {
                format!(
                    "The {} command is not enabled for this repository",
                    command.kind.as_str()
                )
            });
            tracing::info!(
                event_id = %event.event_id,
                actor = %event.actor_handle,
                command = command.kind.as_str(),
                reason = %reason,
                "comment command denied by policy"
            );
            if let Err(error) = tracker.add_comment(&target, &reason).await {
                tracing::warn!(
                    event_id = %event.event_id,
                    command = command.kind.as_str(),
                    error = %format!("{error:#}"),
                    "failed to post denial comment"
                );
            }
            CommandOutcomeStatus::Denied { reason }
        };
        report.outcomes.push(CommandOutcome {
            kind: command.kind,
            status,
        });
    }

    Ok(report)
}
