use crate::comment_event::RepoRef;

/// Follow-up comment for label names that did not resolve during add or remove.
pub fn render_unresolved_labels_comment(verb: &str, repo: &RepoRef, labels: &[String]) -> String {
    format!(
        "I wasn't able to {verb} the following labels: {}\n\nCheck that [the label exists](https://github.com/{}/{}/labels) and is spelt right then try again.\n",
        labels.join(","),
        repo.owner,
        repo.name
    )
}

/// Follow-up comment for reviewer handles that did not resolve.
pub fn render_unresolved_reviewers_comment(reviewers: &[String]) -> String {
    format!(
        "I wasn't able to request review for the following reviewer(s): {}\n\nCheck that the reviewer is spelt right and try again.\n",
        reviewers.join(",")
    )
}
