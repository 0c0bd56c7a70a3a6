//! GitHub runtime for comment-ops: webhook ingress, installation auth,
//! repository policy loading, and the GraphQL issue tracker client.

pub mod github_backend;
pub mod github_graphql_client;
pub mod github_http;
pub mod installation_auth;
pub mod repository_config_loader;
pub mod webhook_payload;
pub mod webhook_server;

pub use github_backend::{GithubBackendConfig, GithubCommentOpsBackend};
pub use github_graphql_client::GithubGraphqlClient;
pub use github_http::{
    build_github_http_client, graphql_url_for_api_base, DEFAULT_GITHUB_API_BASE,
    DEFAULT_REQUEST_TIMEOUT_MS,
};
pub use installation_auth::InstallationTokenSource;
pub use repository_config_loader::RepositoryConfigLoader;
pub use webhook_payload::IssueCommentPayload;
pub use webhook_server::{
    build_webhook_router, run_webhook_server, WebhookRejection, WebhookServerConfig,
    WebhookServerState, WEBHOOK_PATH,
};
