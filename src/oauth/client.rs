use anyhow::Context;
use axum::async_trait;
use tracing::debug;

use crate::oauth::provider::ProviderConfig;
use crate::oauth::types::{ExternalIdentity, TokenResponse, UserInfoClaims};

/// External collaborator completing the OAuth handshake: given an
/// authorization code, produce the asserted identity. The HTTP exchange
/// lives behind this trait so handlers and tests never talk to a
/// provider directly.
#[async_trait]
pub trait IdentityExchange: Send + Sync {
    async fn resolve(
        &self,
        provider: &ProviderConfig,
        redirect_url: &str,
        code: &str,
    ) -> anyhow::Result<ExternalIdentity>;
}

pub struct HttpIdentityExchange {
    client: reqwest::Client,
}

impl HttpIdentityExchange {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpIdentityExchange {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityExchange for HttpIdentityExchange {
    async fn resolve(
        &self,
        provider: &ProviderConfig,
        redirect_url: &str,
        code: &str,
    ) -> anyhow::Result<ExternalIdentity> {
        let response = self
            .client
            .post(provider.token_url)
            .form(&[
                ("code", code),
                ("client_id", provider.client_id.as_str()),
                ("client_secret", provider.client_secret.as_str()),
                ("redirect_uri", redirect_url),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .context("token exchange request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("token endpoint returned {status}");
        }
        let token: TokenResponse = response
            .json()
            .await
            .context("malformed token endpoint response")?;
        debug!(provider = provider.name, "code exchanged for access token");

        let response = self
            .client
            .get(provider.userinfo_url)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .context("userinfo request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("userinfo endpoint returned {status}");
        }
        let claims: UserInfoClaims = response
            .json()
            .await
            .context("malformed userinfo response")?;

        let email = claims
            .email
            .filter(|e| !e.is_empty())
            .context("provider returned no email address")?;

        debug!(provider = provider.name, "userinfo resolved");
        Ok(ExternalIdentity {
            email,
            display_name: claims.name,
        })
    }
}
