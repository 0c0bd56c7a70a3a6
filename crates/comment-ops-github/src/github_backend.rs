use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use comment_ops_commands::policy_config::DEFAULT_POLICY_CONFIG_PATH;
use comment_ops_commands::{CommentOpsBackend, IssueTrackerClient, PolicyConfig, RepoRef};

use crate::github_graphql_client::GithubGraphqlClient;
use crate::github_http::{
    build_github_http_client, graphql_url_for_api_base, normalize_api_base,
    DEFAULT_GITHUB_API_BASE, DEFAULT_REQUEST_TIMEOUT_MS,
};
use crate::installation_auth::InstallationTokenSource;
use crate::repository_config_loader::RepositoryConfigLoader;

#[derive(Debug, Clone)]
pub struct GithubBackendConfig {
    pub api_base: String,
    pub graphql_url: Option<String>,
    pub config_path: String,
    pub request_timeout_ms: u64,
    pub token_source: InstallationTokenSource,
}

impl GithubBackendConfig {
    pub fn with_token_source(token_source: InstallationTokenSource) -> Self {
        Self {
            api_base: DEFAULT_GITHUB_API_BASE.to_string(),
            graphql_url: None,
            config_path: DEFAULT_POLICY_CONFIG_PATH.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            token_source,
        }
    }
}

/// Router collaborators backed by the GitHub REST and GraphQL APIs.
pub struct GithubCommentOpsBackend {
    http: reqwest::Client,
    api_base: String,
    graphql_url: String,
    token_source: InstallationTokenSource,
    config_loader: RepositoryConfigLoader,
}

impl GithubCommentOpsBackend {
    pub fn new(config: GithubBackendConfig) -> Result<Self> {
        let http = build_github_http_client(config.request_timeout_ms)?;
        let api_base = normalize_api_base(&config.api_base);
        let graphql_url = config
            .graphql_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| graphql_url_for_api_base(&api_base));
        let config_loader =
            RepositoryConfigLoader::new(http.clone(), api_base.clone(), &config.config_path);
        Ok(Self {
            http,
            api_base,
            graphql_url,
            token_source: config.token_source,
            config_loader,
        })
    }

    pub fn graphql_url(&self) -> &str {
        &self.graphql_url
    }
}

#[async_trait]
impl CommentOpsBackend for GithubCommentOpsBackend {
    async fn installation_token(&self, installation_id: u64) -> Result<String> {
        self.token_source
            .installation_token(&self.http, &self.api_base, installation_id)
            .await
    }

    async fn policy_config(&self, token: &str, repo: &RepoRef) -> Result<PolicyConfig> {
        self.config_loader.load_policy_config(token, repo).await
    }

    fn issue_tracker(&self, token: &str) -> Result<Arc<dyn IssueTrackerClient>> {
        Ok(Arc::new(GithubGraphqlClient::new(
            self.http.clone(),
            self.graphql_url.clone(),
            token,
        )))
    }
}
