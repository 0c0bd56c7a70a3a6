use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Repository coordinates (`owner/name`) a comment was posted in.
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// The issue or pull request a command acts on.
pub struct IssueTarget {
    pub repo: RepoRef,
    pub node_id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// One inbound `issue_comment.created` delivery, immutable once built.
pub struct CommentEvent {
    pub event_id: String,
    pub actor_handle: String,
    pub repo: RepoRef,
    pub target_node_id: String,
    pub target_url: String,
    pub installation_id: u64,
    pub comment_body: String,
}

impl CommentEvent {
    pub fn target(&self) -> IssueTarget {
        IssueTarget {
            repo: self.repo.clone(),
            node_id: self.target_node_id.clone(),
            url: self.target_url.clone(),
        }
    }
}
