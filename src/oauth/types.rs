use serde::Deserialize;

/// Token endpoint response; only the access token is consumed.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

/// OIDC userinfo claims this service reads. Providers return more; the
/// bridge only needs the address and a display name.
#[derive(Debug, Deserialize)]
pub struct UserInfoClaims {
    pub email: Option<String>,
    pub name: Option<String>,
}

/// A completed external identity assertion, reduced to what account
/// provisioning needs.
#[derive(Debug, Clone)]
pub struct ExternalIdentity {
    pub email: String,
    pub display_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn userinfo_deserializes_with_full_claims() {
        let claims: UserInfoClaims = serde_json::from_str(
            r#"{"sub":"1234","email":"jane@x.com","name":"Jane Doe","picture":"https://x/y.png"}"#,
        )
        .unwrap();
        assert_eq!(claims.email.as_deref(), Some("jane@x.com"));
        assert_eq!(claims.name.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn userinfo_tolerates_missing_email() {
        let claims: UserInfoClaims = serde_json::from_str(r#"{"sub":"1234"}"#).unwrap();
        assert!(claims.email.is_none());
        assert!(claims.name.is_none());
    }

    #[test]
    fn token_response_ignores_extra_fields() {
        let resp: TokenResponse = serde_json::from_str(
            r#"{"access_token":"ya29.a0","expires_in":3599,"token_type":"Bearer","scope":"openid"}"#,
        )
        .unwrap();
        assert_eq!(resp.access_token, "ya29.a0");
    }
}
