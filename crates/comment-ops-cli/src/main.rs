mod bootstrap_helpers;
mod cli_args;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use comment_ops_github::{run_webhook_server, GithubCommentOpsBackend};

use crate::bootstrap_helpers::init_tracing;
use crate::cli_args::Cli;

async fn run_cli(cli: Cli) -> Result<()> {
    let backend_config = cli.backend_config()?;
    let token_source = backend_config.token_source.as_str();
    let backend = GithubCommentOpsBackend::new(backend_config)
        .context("failed to initialize github backend")?;
    tracing::info!(
        token_source,
        graphql_url = backend.graphql_url(),
        config_path = %cli.config_path,
        "comment-ops starting"
    );
    run_webhook_server(cli.server_config(), Arc::new(backend)).await
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    run_cli(cli).await
}
