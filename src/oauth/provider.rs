use crate::config::{OAuthConfig, ProviderCredentials};

/// Endpoints and credentials for one OAuth provider. Endpoint URLs are
/// fixed per provider; credentials come from the environment.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub name: &'static str,
    pub client_id: String,
    pub client_secret: String,
    pub authorize_url: &'static str,
    pub token_url: &'static str,
    pub userinfo_url: &'static str,
    pub scopes: &'static str,
}

impl ProviderConfig {
    pub fn google(creds: &ProviderCredentials) -> Self {
        Self {
            name: "google",
            client_id: creds.client_id.clone(),
            client_secret: creds.client_secret.clone(),
            authorize_url: "https://accounts.google.com/o/oauth2/v2/auth",
            token_url: "https://oauth2.googleapis.com/token",
            userinfo_url: "https://openidconnect.googleapis.com/v1/userinfo",
            scopes: "openid email profile",
        }
    }

    pub fn microsoft(creds: &ProviderCredentials) -> Self {
        Self {
            name: "microsoft",
            client_id: creds.client_id.clone(),
            client_secret: creds.client_secret.clone(),
            authorize_url: "https://login.microsoftonline.com/common/oauth2/v2.0/authorize",
            token_url: "https://login.microsoftonline.com/common/oauth2/v2.0/token",
            userinfo_url: "https://graph.microsoft.com/oidc/userinfo",
            scopes: "openid email profile",
        }
    }

    /// Resolve a provider by name, None when it is not configured.
    pub fn for_name(config: &OAuthConfig, name: &str) -> Option<Self> {
        match name {
            "google" => config.google.as_ref().map(Self::google),
            "microsoft" => config.microsoft.as_ref().map(Self::microsoft),
            _ => None,
        }
    }

    /// Authorization-code redirect URL for this provider.
    pub fn authorize_redirect(&self, redirect_url: &str, state: &str) -> String {
        format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}",
            self.authorize_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(redirect_url),
            urlencoding::encode(self.scopes),
            urlencoding::encode(state),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> ProviderCredentials {
        ProviderCredentials {
            client_id: "client-123".into(),
            client_secret: "secret-456".into(),
        }
    }

    #[test]
    fn authorize_redirect_carries_all_parameters() {
        let provider = ProviderConfig::google(&creds());
        let url = provider.authorize_redirect(
            "http://localhost:8080/api/auth/oauth-success",
            "state-token",
        );
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fapi%2Fauth%2Foauth-success"));
        assert!(url.contains("scope=openid%20email%20profile"));
        assert!(url.contains("state=state-token"));
    }

    #[test]
    fn for_name_respects_configuration() {
        let config = OAuthConfig {
            google: Some(creds()),
            microsoft: None,
            redirect_url: "http://localhost:8080/api/auth/oauth-success".into(),
            frontend_url: "http://localhost:3000/oauth".into(),
        };
        assert!(ProviderConfig::for_name(&config, "google").is_some());
        assert!(ProviderConfig::for_name(&config, "microsoft").is_none());
        assert!(ProviderConfig::for_name(&config, "github").is_none());
    }

    #[test]
    fn microsoft_uses_graph_userinfo() {
        let provider = ProviderConfig::microsoft(&creds());
        assert_eq!(provider.name, "microsoft");
        assert!(provider.userinfo_url.contains("graph.microsoft.com"));
    }
}
