use anyhow::{bail, Context, Result};
use comment_ops_commands::{PolicyConfig, RepoRef};
use reqwest::StatusCode;

use crate::github_http::truncate_for_error;

/// Reads the per-repository policy file through the contents API.
#[derive(Clone)]
pub struct RepositoryConfigLoader {
    http: reqwest::Client,
    api_base: String,
    config_path: String,
}

impl RepositoryConfigLoader {
    pub fn new(http: reqwest::Client, api_base: impl Into<String>, config_path: &str) -> Self {
        Self {
            http,
            api_base: api_base.into(),
            config_path: config_path.trim().trim_start_matches('/').to_string(),
        }
    }

    /// Fetch the raw document; `None` when the repository has no config file.
    pub async fn fetch_raw_config(&self, token: &str, repo: &RepoRef) -> Result<Option<String>> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base, repo.owner, repo.name, self.config_path
        );
        let response = self
            .http
            .get(url)
            .bearer_auth(token.trim())
            .header(reqwest::header::ACCEPT, "application/vnd.github.raw+json")
            .send()
            .await
            .with_context(|| format!("github config fetch for {repo} request failed"))?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!(
                "github config fetch for {repo} failed with status {}: {}",
                status.as_u16(),
                truncate_for_error(&body, 800)
            );
        }
        let raw = response
            .text()
            .await
            .with_context(|| format!("failed to read config body for {repo}"))?;
        Ok(Some(raw))
    }

    pub async fn load_policy_config(&self, token: &str, repo: &RepoRef) -> Result<PolicyConfig> {
        match self.fetch_raw_config(token, repo).await? {
            Some(raw) => PolicyConfig::from_yaml_str(&raw)
                .with_context(|| format!("invalid {} in {repo}", self.config_path)),
            None => {
                tracing::debug!(repo = %repo, path = %self.config_path, "no repository config, using defaults");
                Ok(PolicyConfig::default())
            }
        }
    }
}
