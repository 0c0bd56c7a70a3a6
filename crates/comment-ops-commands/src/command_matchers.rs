use std::sync::LazyLock;

use regex::Regex;

use crate::command_registry::CommandKind;

// Triggers are recognised only at the start of the body or of a line, with at
// most one leading space. Argument classes never span a line break.
static TRANSFER_TRIGGER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^ ?/transfer ([A-Za-z0-9-]+)").expect("transfer trigger regex")
});

static CLOSE_TRIGGER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^ ?/close(?: (not-planned))?\b").expect("close trigger regex")
});

static REOPEN_TRIGGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^ ?/reopen\b").expect("reopen trigger regex"));

static LABEL_TRIGGER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^ ?/label ([ \t,/:._A-Za-z0-9-]+)").expect("label trigger regex")
});

static REMOVE_LABEL_TRIGGER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^ ?/remove-label ([ \t,/:._A-Za-z0-9-]+)")
        .expect("remove-label trigger regex")
});

static REVIEWER_TRIGGER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^ ?/reviewers? ([ \t,@/._A-Za-z0-9-]+)").expect("reviewer trigger regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
/// Raw result of a trigger pattern matching a comment body.
pub struct TriggerMatch {
    pub kind: CommandKind,
    /// Captured argument group exactly as written, not yet split.
    pub raw_arguments: Option<String>,
}

fn trigger_for(kind: CommandKind) -> &'static Regex {
    match kind {
        CommandKind::Transfer => &TRANSFER_TRIGGER,
        CommandKind::Close => &CLOSE_TRIGGER,
        CommandKind::Reopen => &REOPEN_TRIGGER,
        CommandKind::Label => &LABEL_TRIGGER,
        CommandKind::RemoveLabel => &REMOVE_LABEL_TRIGGER,
        CommandKind::Reviewer => &REVIEWER_TRIGGER,
    }
}

/// Match one command kind's trigger against a comment body.
pub fn match_command_trigger(kind: CommandKind, body: &str) -> Option<TriggerMatch> {
    let captures = trigger_for(kind).captures(body)?;
    Some(TriggerMatch {
        kind,
        raw_arguments: captures.get(1).map(|group| group.as_str().to_string()),
    })
}
