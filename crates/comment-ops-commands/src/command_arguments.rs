use crate::command_registry::CommandKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Issue close state reason sent with a close mutation.
pub enum CloseReason {
    Completed,
    NotPlanned,
}

impl CloseReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "COMPLETED",
            Self::NotPlanned => "NOT_PLANNED",
        }
    }

    pub fn from_raw_argument(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("not-planned") => Self::NotPlanned,
            _ => Self::Completed,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Reviewer handles split into user and team references, original spelling kept.
pub struct ReviewerSet {
    pub users: Vec<String>,
    pub teams: Vec<String>,
}

impl ReviewerSet {
    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.teams.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Normalized arguments for a matched command.
pub enum CommandArguments {
    Transfer { target_repository: String },
    Close { reason: CloseReason },
    Reopen,
    Label { labels: Vec<String> },
    RemoveLabel { labels: Vec<String> },
    Reviewer { reviewers: ReviewerSet },
}

impl CommandArguments {
    pub fn from_raw(kind: CommandKind, raw: Option<&str>) -> Self {
        match kind {
            CommandKind::Transfer => Self::Transfer {
                target_repository: raw.unwrap_or_default().trim().to_string(),
            },
            CommandKind::Close => Self::Close {
                reason: CloseReason::from_raw_argument(raw),
            },
            CommandKind::Reopen => Self::Reopen,
            CommandKind::Label => Self::Label {
                labels: extract_comma_separated(raw.unwrap_or_default()),
            },
            CommandKind::RemoveLabel => Self::RemoveLabel {
                labels: extract_comma_separated(raw.unwrap_or_default()),
            },
            CommandKind::Reviewer => Self::Reviewer {
                reviewers: extract_users_and_teams(raw.unwrap_or_default()),
            },
        }
    }

    /// Labels the enablement policy checks against an allow-list.
    pub fn requested_labels(&self) -> &[String] {
        match self {
            Self::Label { labels } | Self::RemoveLabel { labels } => labels,
            _ => &[],
        }
    }
}

/// Split a raw list argument on commas and whitespace, dropping blank tokens.
pub fn extract_comma_separated(raw: &str) -> Vec<String> {
    raw.split(|ch: char| ch == ',' || ch.is_whitespace())
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Split reviewer handles; a token containing `/` is a team reference.
pub fn extract_users_and_teams(raw: &str) -> ReviewerSet {
    let (teams, users): (Vec<String>, Vec<String>) = extract_comma_separated(raw)
        .into_iter()
        .partition(|token| token.contains('/'));
    ReviewerSet { users, teams }
}
