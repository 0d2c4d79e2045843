use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_hours: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LockoutConfig {
    pub max_attempts: i32,
    pub duration_minutes: i32,
}

/// Client credentials for one OAuth provider. A provider without
/// credentials in the environment stays disabled.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderCredentials {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OAuthConfig {
    pub google: Option<ProviderCredentials>,
    pub microsoft: Option<ProviderCredentials>,
    pub redirect_url: String,
    pub frontend_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub lockout: LockoutConfig,
    pub oauth: OAuthConfig,
    pub cors_allowed_origins: Option<Vec<String>>,
}

fn provider_from_env(id_var: &str, secret_var: &str) -> Option<ProviderCredentials> {
    let client_id = std::env::var(id_var).ok()?;
    let client_secret = std::env::var(secret_var).ok()?;
    Some(ProviderCredentials {
        client_id,
        client_secret,
    })
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;

        let secret = std::env::var("JWT_SECRET")?;
        if secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 bytes");
        }
        let jwt = JwtConfig {
            secret,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "gatehouse".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "gatehouse-users".into()),
            ttl_hours: std::env::var("JWT_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(24),
        };

        let lockout = LockoutConfig {
            max_attempts: std::env::var("LOCKOUT_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse::<i32>().ok())
                .unwrap_or(5),
            duration_minutes: std::env::var("LOCKOUT_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i32>().ok())
                .unwrap_or(5),
        };

        let oauth = OAuthConfig {
            google: provider_from_env("GOOGLE_CLIENT_ID", "GOOGLE_CLIENT_SECRET"),
            microsoft: provider_from_env("MICROSOFT_CLIENT_ID", "MICROSOFT_CLIENT_SECRET"),
            redirect_url: std::env::var("OAUTH_REDIRECT_URL")
                .unwrap_or_else(|_| "http://localhost:8080/api/auth/oauth-success".into()),
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000/oauth".into()),
        };

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS").ok().map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        Ok(Self {
            database_url,
            jwt,
            lockout,
            oauth,
            cors_allowed_origins,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // single test so the env mutations cannot race a parallel test
    #[test]
    fn from_env_enforces_secret_length_and_defaults() {
        std::env::set_var("DATABASE_URL", "postgres://postgres@localhost/test");
        std::env::set_var("JWT_SECRET", "too-short");
        let err = AppConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("at least 32 bytes"));

        std::env::set_var("JWT_SECRET", "0123456789abcdef0123456789abcdef");
        let config = AppConfig::from_env().expect("config loads");
        assert_eq!(config.jwt.ttl_hours, 24);
        assert_eq!(config.lockout.max_attempts, 5);
        assert_eq!(config.lockout.duration_minutes, 5);
        assert!(config.oauth.redirect_url.ends_with("/api/auth/oauth-success"));
    }
}
