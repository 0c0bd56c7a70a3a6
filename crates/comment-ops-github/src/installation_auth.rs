use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::github_http::truncate_for_error;

#[derive(Clone)]
/// Where installation tokens come from.
pub enum InstallationTokenSource {
    /// One pre-issued token used for every installation.
    Static { token: String },
    /// Exchange an externally minted app JWT for a per-installation token.
    AppJwtExchange { app_jwt: String },
}

impl std::fmt::Debug for InstallationTokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static { .. } => f.write_str("InstallationTokenSource::Static"),
            Self::AppJwtExchange { .. } => f.write_str("InstallationTokenSource::AppJwtExchange"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct InstallationAccessToken {
    token: String,
}

impl InstallationTokenSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Static { .. } => "static",
            Self::AppJwtExchange { .. } => "app_jwt_exchange",
        }
    }

    pub async fn installation_token(
        &self,
        http: &reqwest::Client,
        api_base: &str,
        installation_id: u64,
    ) -> Result<String> {
        match self {
            Self::Static { token } => Ok(token.trim().to_string()),
            Self::AppJwtExchange { app_jwt } => {
                let response = http
                    .post(format!(
                        "{api_base}/app/installations/{installation_id}/access_tokens"
                    ))
                    .bearer_auth(app_jwt.trim())
                    .send()
                    .await
                    .context("github installation token request failed")?;
                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    bail!(
                        "github installation token exchange failed with status {}: {}",
                        status.as_u16(),
                        truncate_for_error(&body, 400)
                    );
                }
                let parsed = response
                    .json::<InstallationAccessToken>()
                    .await
                    .context("failed to decode github installation token")?;
                Ok(parsed.token)
            }
        }
    }
}
