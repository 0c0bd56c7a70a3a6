use std::future::Future;

use anyhow::Result;
use futures_util::future::try_join_all;

use crate::command_arguments::{CommandArguments, ReviewerSet};
use crate::command_matchers::{match_command_trigger, TriggerMatch};
use crate::command_policy::{evaluate_command_policy, EnablementResult};
use crate::command_render::{render_unresolved_labels_comment, render_unresolved_reviewers_comment};
use crate::comment_event::{CommentEvent, IssueTarget};
use crate::issue_tracker::IssueTrackerClient;
use crate::policy_config::PolicyConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Enumerates the recognised slash-commands.
pub enum CommandKind {
    Transfer,
    Close,
    Reopen,
    Label,
    RemoveLabel,
    Reviewer,
}

/// Processing order for matched commands. Denial comments follow this order.
pub const COMMAND_REGISTRY: [CommandKind; 6] = [
    CommandKind::Transfer,
    CommandKind::Close,
    CommandKind::Reopen,
    CommandKind::Label,
    CommandKind::RemoveLabel,
    CommandKind::Reviewer,
];

impl CommandKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::Close => "close",
            Self::Reopen => "reopen",
            Self::Label => "label",
            Self::RemoveLabel => "remove-label",
            Self::Reviewer => "reviewer",
        }
    }

    pub fn is_label_bearing(self) -> bool {
        matches!(self, Self::Label | Self::RemoveLabel)
    }

    pub fn matches(self, comment_body: &str) -> Option<CommandMatch> {
        match_command_trigger(self, comment_body).map(CommandMatch::from_trigger)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A recognised command with its raw capture and normalized arguments.
pub struct CommandMatch {
    pub kind: CommandKind,
    pub raw_arguments: Option<String>,
    pub arguments: CommandArguments,
}

/// Collaborators and event data available while a command executes.
pub struct CommandContext<'a> {
    pub event: &'a CommentEvent,
    pub tracker: &'a dyn IssueTrackerClient,
}

impl CommandMatch {
    pub fn from_trigger(trigger: TriggerMatch) -> Self {
        let arguments = CommandArguments::from_raw(trigger.kind, trigger.raw_arguments.as_deref());
        Self {
            kind: trigger.kind,
            raw_arguments: trigger.raw_arguments,
            arguments,
        }
    }

    pub fn check_enabled(&self, config: &PolicyConfig) -> EnablementResult {
        evaluate_command_policy(config, self.kind, self.arguments.requested_labels())
    }

    /// Issue the single logical action for this command.
    pub async fn execute(&self, context: &CommandContext<'_>) -> Result<()> {
        let event = context.event;
        tracing::info!(
            event_id = %event.event_id,
            actor = %event.actor_handle,
            command = self.kind.as_str(),
            issue_url = %event.target_url,
            arguments = self.raw_arguments.as_deref().unwrap_or_default(),
            "executing comment command"
        );

        let target = event.target();
        let tracker = context.tracker;
        match &self.arguments {
            CommandArguments::Transfer { target_repository } => {
                tracker.transfer_issue(&target, target_repository).await
            }
            CommandArguments::Close { reason } => tracker.close_issue(&target, *reason).await,
            CommandArguments::Reopen => tracker.reopen_issue(&target).await,
            CommandArguments::Label { labels } => {
                apply_label_mutation(tracker, &target, labels, LabelMutation::Add).await
            }
            CommandArguments::RemoveLabel { labels } => {
                apply_label_mutation(tracker, &target, labels, LabelMutation::Remove).await
            }
            CommandArguments::Reviewer { reviewers } => {
                request_reviewers(tracker, &target, reviewers).await
            }
        }
    }
}

/// Run every registered matcher against the body, in registration order.
pub fn recognize_commands(comment_body: &str) -> Vec<Option<CommandMatch>> {
    COMMAND_REGISTRY
        .iter()
        .map(|kind| kind.matches(comment_body))
        .collect()
}

pub fn none_match(matches: &[Option<CommandMatch>]) -> bool {
    matches.iter().all(Option::is_none)
}

#[derive(Debug, Clone, Copy)]
enum LabelMutation {
    Add,
    Remove,
}

impl LabelMutation {
    fn verb(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
        }
    }
}

#[derive(Debug, Default)]
struct ResolvedNames {
    ids: Vec<String>,
    unresolved: Vec<String>,
}

async fn resolve_names<'n, F, Fut>(names: &'n [String], lookup: F) -> Result<ResolvedNames>
where
    F: Fn(&'n String) -> Fut,
    Fut: Future<Output = Result<Option<String>>>,
{
    let results = try_join_all(names.iter().map(lookup)).await?;
    let mut resolved = ResolvedNames::default();
    for (name, id) in names.iter().zip(results) {
        match id {
            Some(id) => resolved.ids.push(id),
            None => resolved.unresolved.push(name.clone()),
        }
    }
    Ok(resolved)
}

async fn apply_label_mutation(
    tracker: &dyn IssueTrackerClient,
    target: &IssueTarget,
    labels: &[String],
    mutation: LabelMutation,
) -> Result<()> {
    if labels.is_empty() {
        tracing::debug!(issue_url = %target.url, "label command carried no label names");
        return Ok(());
    }

    let resolved = resolve_names(labels, |label| tracker.lookup_label_id(target, label)).await?;
    if !resolved.ids.is_empty() {
        match mutation {
            LabelMutation::Add => tracker.add_labels(target, &resolved.ids).await?,
            LabelMutation::Remove => tracker.remove_labels(target, &resolved.ids).await?,
        }
    }
    if !resolved.unresolved.is_empty() {
        let comment =
            render_unresolved_labels_comment(mutation.verb(), &target.repo, &resolved.unresolved);
        tracker.add_comment(target, &comment).await?;
    }
    Ok(())
}

fn split_team_reference(team: &str) -> Option<(&str, &str)> {
    let (organization, slug) = team.trim_start_matches('@').split_once('/')?;
    if organization.is_empty() || slug.is_empty() {
        return None;
    }
    Some((organization, slug))
}

async fn request_reviewers(
    tracker: &dyn IssueTrackerClient,
    target: &IssueTarget,
    reviewers: &ReviewerSet,
) -> Result<()> {
    if reviewers.is_empty() {
        tracing::debug!(issue_url = %target.url, "reviewer command carried no handles");
        return Ok(());
    }

    let users = resolve_names(&reviewers.users, |user| async move {
        tracker.lookup_user_id(user.trim_start_matches('@')).await
    });
    let teams = resolve_names(&reviewers.teams, |team| async move {
        match split_team_reference(team) {
            Some((organization, slug)) => tracker.lookup_team_id(organization, slug).await,
            None => Ok(None),
        }
    });
    let (users, teams) = futures_util::try_join!(users, teams)?;

    if !users.ids.is_empty() || !teams.ids.is_empty() {
        tracker
            .request_reviews(target, &users.ids, &teams.ids)
            .await?;
    }
    let unresolved = [users.unresolved, teams.unresolved].concat();
    if !unresolved.is_empty() {
        tracker
            .add_comment(target, &render_unresolved_reviewers_comment(&unresolved))
            .await?;
    }
    Ok(())
}
