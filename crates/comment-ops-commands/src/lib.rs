//! Slash-command recognition, enablement policy, and dispatch for issue and
//! pull-request comments.
//!
//! Network collaborators (token minting, config retrieval, GitHub mutations)
//! are reached through the `CommentOpsBackend` and `IssueTrackerClient` traits
//! and implemented by runtime crates.

pub mod command_arguments;
pub mod command_matchers;
pub mod command_policy;
pub mod command_registry;
pub mod command_render;
pub mod command_router;
pub mod comment_event;
pub mod issue_tracker;
pub mod policy_config;

pub use command_arguments::{
    extract_comma_separated, extract_users_and_teams, CloseReason, CommandArguments, ReviewerSet,
};
pub use command_matchers::match_command_trigger;
pub use command_policy::{evaluate_command_policy, EnablementResult};
pub use command_registry::{
    none_match, recognize_commands, CommandContext, CommandKind, CommandMatch, COMMAND_REGISTRY,
};
pub use command_router::{
    route_comment_event, CommandOutcome, CommandOutcomeStatus, CommentOpsBackend, RouteReport,
    RouterOptions,
};
pub use comment_event::{CommentEvent, IssueTarget, RepoRef};
pub use issue_tracker::IssueTrackerClient;
pub use policy_config::{CommandPolicies, CommandPolicy, PolicyConfig};
