use crate::command_registry::CommandKind;
use crate::policy_config::PolicyConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Outcome of an enablement check; `error` is set only when disabled.
pub struct EnablementResult {
    pub enabled: bool,
    pub error: Option<String>,
}

impl EnablementResult {
    pub fn allowed() -> Self {
        Self {
            enabled: true,
            error: None,
        }
    }

    pub fn denied(error: impl Into<String>) -> Self {
        Self {
            enabled: false,
            error: Some(error.into()),
        }
    }
}

fn not_enabled(kind: CommandKind) -> EnablementResult {
    EnablementResult::denied(format!(
        "The {} command is not enabled for this repository",
        kind.as_str()
    ))
}

/// Decide whether a matched command may run under the repository policy.
///
/// `requested_labels` is only consulted for label-bearing kinds. Every
/// requested label must be in a non-empty allow-list; an empty allow-list
/// places no restriction.
pub fn evaluate_command_policy(
    config: &PolicyConfig,
    kind: CommandKind,
    requested_labels: &[String],
) -> EnablementResult {
    let policy = config.policy_for(kind);
    if !policy.enabled {
        return not_enabled(kind);
    }
    if !kind.is_label_bearing() || policy.allowed_labels.is_empty() {
        return EnablementResult::allowed();
    }

    let all_allowed = requested_labels
        .iter()
        .all(|label| policy.allowed_labels.contains(label));
    if all_allowed {
        return EnablementResult::allowed();
    }
    EnablementResult::denied(format!(
        "{} doesn't match the allowed labels `{}`",
        requested_labels.join(","),
        policy.allowed_labels.join(",")
    ))
}
