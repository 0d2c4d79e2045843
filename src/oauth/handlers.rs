use axum::{
    extract::{FromRef, Query, State},
    http::{
        header::{COOKIE, LOCATION, SET_COOKIE},
        HeaderMap, StatusCode,
    },
    routing::get,
    Router,
};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Deserialize;
use tracing::{instrument, warn};

use crate::{
    auth::{jwt::JwtKeys, services},
    error::ApiError,
    oauth::provider::ProviderConfig,
    state::AppState,
};

const STATE_COOKIE: &str = "oauth_state";
const STATE_COOKIE_MAX_AGE: u32 = 600;

pub fn oauth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/google-login", get(google_login))
        .route("/auth/microsoft-login", get(microsoft_login))
        .route("/auth/oauth-success", get(oauth_success))
}

fn random_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// The state cookie carries both the CSRF token and the provider name,
/// so the single callback route can finish either provider's flow.
fn state_cookie(value: &str, max_age: u32) -> String {
    format!("{STATE_COOKIE}={value}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age}")
}

fn parse_state_cookie(headers: &HeaderMap) -> Option<(String, String)> {
    for header in headers.get_all(COOKIE) {
        let Ok(raw) = header.to_str() else { continue };
        for pair in raw.split(';') {
            if let Some(value) = pair.trim().strip_prefix(&format!("{STATE_COOKIE}=")) {
                let (state, provider) = value.split_once('.')?;
                return Some((state.to_string(), provider.to_string()));
            }
        }
    }
    None
}

/// 302 Found with the given target; the login-by-redirect contract uses
/// 302 rather than axum's 303/307 helpers.
fn found(mut headers: HeaderMap, location: &str) -> Result<(StatusCode, HeaderMap), ApiError> {
    headers.insert(
        LOCATION,
        location
            .parse()
            .map_err(|_| ApiError::Internal(anyhow::anyhow!("invalid redirect target")))?,
    );
    Ok((StatusCode::FOUND, headers))
}

async fn start_login(
    state: AppState,
    provider_name: &str,
) -> Result<(StatusCode, HeaderMap), ApiError> {
    let provider = ProviderConfig::for_name(&state.config.oauth, provider_name)
        .ok_or(ApiError::NotFound("oauth provider is not configured"))?;

    let csrf = random_state();
    let url = provider.authorize_redirect(&state.config.oauth.redirect_url, &csrf);

    let mut headers = HeaderMap::new();
    let cookie = state_cookie(&format!("{csrf}.{}", provider.name), STATE_COOKIE_MAX_AGE);
    headers.insert(
        SET_COOKIE,
        cookie
            .parse()
            .map_err(|_| ApiError::Internal(anyhow::anyhow!("invalid state cookie")))?,
    );

    found(headers, &url)
}

#[instrument(skip(state))]
async fn google_login(State(state): State<AppState>) -> Result<(StatusCode, HeaderMap), ApiError> {
    start_login(state, "google").await
}

#[instrument(skip(state))]
async fn microsoft_login(
    State(state): State<AppState>,
) -> Result<(StatusCode, HeaderMap), ApiError> {
    start_login(state, "microsoft").await
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

async fn finish_login(
    state: &AppState,
    params: &CallbackParams,
    headers: &HeaderMap,
) -> Result<String, ApiError> {
    if let Some(provider_error) = &params.error {
        return Err(ApiError::UpstreamAuth(format!(
            "provider returned error: {provider_error}"
        )));
    }
    let code = params
        .code
        .as_deref()
        .ok_or_else(|| ApiError::UpstreamAuth("missing authorization code".into()))?;
    let callback_state = params
        .state
        .as_deref()
        .ok_or_else(|| ApiError::UpstreamAuth("missing state parameter".into()))?;

    let (cookie_state, provider_name) = parse_state_cookie(headers)
        .ok_or_else(|| ApiError::UpstreamAuth("missing login state cookie".into()))?;
    if cookie_state != callback_state {
        return Err(ApiError::UpstreamAuth("state mismatch".into()));
    }

    let provider = ProviderConfig::for_name(&state.config.oauth, &provider_name)
        .ok_or_else(|| ApiError::UpstreamAuth("oauth provider is not configured".into()))?;

    let identity = state
        .oauth
        .resolve(&provider, &state.config.oauth.redirect_url, code)
        .await
        .map_err(|e| ApiError::UpstreamAuth(e.to_string()))?;

    let user = services::find_or_create_external(state, &identity).await?;

    let keys = JwtKeys::from_ref(state);
    let (token, _) = keys.sign(&user)?;
    Ok(token)
}

/// Provider callback. Success and failure both redirect to the frontend;
/// the outcome rides in the query string.
#[instrument(skip(state, params, headers))]
async fn oauth_success(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
    headers: HeaderMap,
) -> (StatusCode, HeaderMap) {
    let frontend = &state.config.oauth.frontend_url;
    let target = match finish_login(&state, &params, &headers).await {
        Ok(token) => format!("{frontend}?token={}", urlencoding::encode(&token)),
        Err(err) => {
            warn!(error = %err, "oauth callback failed");
            let message = match err {
                ApiError::Internal(_) => "internal error".to_string(),
                other => other.to_string(),
            };
            format!("{frontend}?error={}", urlencoding::encode(&message))
        }
    };

    let mut response_headers = HeaderMap::new();
    // one-shot cookie, clear it regardless of outcome
    if let Ok(value) = state_cookie("", 0).parse() {
        response_headers.insert(SET_COOKIE, value);
    }
    match found(response_headers, &target) {
        Ok(response) => response,
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, HeaderMap::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn random_state_is_unique_and_sized() {
        let a = random_state();
        let b = random_state();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn state_cookie_round_trips_through_headers() {
        let cookie = state_cookie("abc123.google", STATE_COOKIE_MAX_AGE);
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Max-Age=600"));

        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("other=1; oauth_state=abc123.google"),
        );
        let (state, provider) = parse_state_cookie(&headers).expect("cookie parses");
        assert_eq!(state, "abc123");
        assert_eq!(provider, "google");
    }

    #[test]
    fn state_cookie_without_provider_part_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("oauth_state=abc123"));
        assert!(parse_state_cookie(&headers).is_none());
    }

    #[test]
    fn missing_cookie_yields_none() {
        assert!(parse_state_cookie(&HeaderMap::new()).is_none());
    }

    #[tokio::test]
    async fn finish_login_reports_provider_error() {
        let state = AppState::fake();
        let params = CallbackParams {
            code: None,
            state: None,
            error: Some("access_denied".into()),
        };
        let err = finish_login(&state, &params, &HeaderMap::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("access_denied"));
    }

    #[tokio::test]
    async fn finish_login_rejects_state_mismatch() {
        let state = AppState::fake();
        let params = CallbackParams {
            code: Some("authcode".into()),
            state: Some("expected".into()),
            error: None,
        };
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("oauth_state=different.google"),
        );
        let err = finish_login(&state, &params, &headers).await.unwrap_err();
        assert!(err.to_string().contains("state mismatch"));
    }
}
