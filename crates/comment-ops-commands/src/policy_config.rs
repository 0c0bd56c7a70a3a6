use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::command_registry::CommandKind;

pub const DEFAULT_POLICY_CONFIG_PATH: &str = ".github/comment-ops.yml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// Enablement policy for a single command kind.
pub struct CommandPolicy {
    pub enabled: bool,
    /// Only consulted for label-bearing kinds; empty means unrestricted.
    #[serde(alias = "allowed_labels")]
    pub allowed_labels: Vec<String>,
}

impl Default for CommandPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_labels: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// Per-kind policies; omitted kinds keep their defaults.
pub struct CommandPolicies {
    pub transfer: CommandPolicy,
    pub close: CommandPolicy,
    pub reopen: CommandPolicy,
    pub label: CommandPolicy,
    #[serde(alias = "remove-label")]
    pub remove_label: CommandPolicy,
    pub reviewer: CommandPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Per-repository configuration document, merged over defaults at load time.
pub struct PolicyConfig {
    pub commands: CommandPolicies,
}

impl PolicyConfig {
    pub fn policy_for(&self, kind: CommandKind) -> &CommandPolicy {
        let commands = &self.commands;
        match kind {
            CommandKind::Transfer => &commands.transfer,
            CommandKind::Close => &commands.close,
            CommandKind::Reopen => &commands.reopen,
            CommandKind::Label => &commands.label,
            CommandKind::RemoveLabel => &commands.remove_label,
            CommandKind::Reviewer => &commands.reviewer,
        }
    }

    pub fn policy_for_mut(&mut self, kind: CommandKind) -> &mut CommandPolicy {
        let commands = &mut self.commands;
        match kind {
            CommandKind::Transfer => &mut commands.transfer,
            CommandKind::Close => &mut commands.close,
            CommandKind::Reopen => &mut commands.reopen,
            CommandKind::Label => &mut commands.label,
            CommandKind::RemoveLabel => &mut commands.remove_label,
            CommandKind::Reviewer => &mut commands.reviewer,
        }
    }

    /// Parse a repository YAML document; missing fields fall back to defaults.
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let parsed = serde_yaml::from_str::<Option<Self>>(raw)
            .context("failed to parse comment-ops policy config")?;
        Ok(parsed.unwrap_or_default())
    }
}
