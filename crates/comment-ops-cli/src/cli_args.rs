use std::net::{Ipv4Addr, SocketAddr};

use anyhow::{bail, Result};
use clap::{ArgAction, Parser};
use comment_ops_commands::policy_config::DEFAULT_POLICY_CONFIG_PATH;
use comment_ops_commands::RouterOptions;
use comment_ops_github::{
    GithubBackendConfig, InstallationTokenSource, WebhookServerConfig, DEFAULT_GITHUB_API_BASE,
    DEFAULT_REQUEST_TIMEOUT_MS,
};

const DEFAULT_BIND_PORT: u16 = 3000;

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Parser)]
#[command(
    name = "comment-ops",
    about = "Slash commands for GitHub issue and pull request comments",
    version
)]
pub struct Cli {
    #[arg(
        long,
        env = "COMMENT_OPS_BIND",
        help = "Socket address for the webhook listener (defaults to 0.0.0.0:$PORT or 0.0.0.0:3000)"
    )]
    pub bind: Option<SocketAddr>,

    #[arg(long, env = "PORT", hide = true)]
    pub port: Option<u16>,

    #[arg(
        long = "webhook-secret",
        env = "WEBHOOK_SECRET",
        hide_env_values = true,
        help = "Shared secret used to verify x-hub-signature-256 on deliveries"
    )]
    pub webhook_secret: Option<String>,

    #[arg(
        long = "github-api-base",
        env = "GITHUB_API_BASE",
        default_value = DEFAULT_GITHUB_API_BASE,
        help = "GitHub REST API base URL"
    )]
    pub github_api_base: String,

    #[arg(
        long = "github-graphql-url",
        env = "GITHUB_GRAPHQL_URL",
        help = "Override for the GraphQL endpoint (derived from --github-api-base when unset)"
    )]
    pub github_graphql_url: Option<String>,

    #[arg(
        long = "github-token",
        env = "GITHUB_TOKEN",
        hide_env_values = true,
        help = "Static token used for every installation"
    )]
    pub github_token: Option<String>,

    #[arg(
        long = "github-app-jwt",
        env = "GITHUB_APP_JWT",
        hide_env_values = true,
        help = "GitHub App JWT exchanged for per-installation access tokens"
    )]
    pub github_app_jwt: Option<String>,

    #[arg(
        long = "config-path",
        env = "COMMENT_OPS_CONFIG_PATH",
        default_value = DEFAULT_POLICY_CONFIG_PATH,
        help = "Repository path of the per-repository policy file"
    )]
    pub config_path: String,

    #[arg(
        long = "request-timeout-ms",
        env = "COMMENT_OPS_REQUEST_TIMEOUT_MS",
        default_value_t = DEFAULT_REQUEST_TIMEOUT_MS,
        value_parser = parse_positive_u64,
        help = "Timeout for each GitHub API request"
    )]
    pub request_timeout_ms: u64,

    #[arg(
        long,
        env = "VERBOSE",
        default_value_t = false,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        help = "Log comments that did not match any command"
    )]
    pub verbose: bool,
}

impl Cli {
    pub fn resolve_bind_addr(&self) -> SocketAddr {
        self.bind.unwrap_or_else(|| {
            SocketAddr::from((
                Ipv4Addr::UNSPECIFIED,
                self.port.unwrap_or(DEFAULT_BIND_PORT),
            ))
        })
    }

    /// An app JWT takes precedence over a static token when both are set.
    pub fn resolve_token_source(&self) -> Result<InstallationTokenSource> {
        let non_empty = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(ToOwned::to_owned)
        };
        if let Some(app_jwt) = non_empty(&self.github_app_jwt) {
            return Ok(InstallationTokenSource::AppJwtExchange { app_jwt });
        }
        if let Some(token) = non_empty(&self.github_token) {
            return Ok(InstallationTokenSource::Static { token });
        }
        bail!("one of --github-token (GITHUB_TOKEN) or --github-app-jwt (GITHUB_APP_JWT) is required")
    }

    pub fn backend_config(&self) -> Result<GithubBackendConfig> {
        let mut config = GithubBackendConfig::with_token_source(self.resolve_token_source()?);
        config.api_base = self.github_api_base.clone();
        config.graphql_url = self.github_graphql_url.clone();
        config.config_path = self.config_path.clone();
        config.request_timeout_ms = self.request_timeout_ms;
        Ok(config)
    }

    pub fn server_config(&self) -> WebhookServerConfig {
        WebhookServerConfig {
            bind: self.resolve_bind_addr(),
            webhook_secret: self
                .webhook_secret
                .as_deref()
                .map(str::trim)
                .filter(|secret| !secret.is_empty())
                .map(ToOwned::to_owned),
            router_options: RouterOptions {
                verbose: self.verbose,
            },
        }
    }
}
