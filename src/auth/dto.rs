use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::User;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Plain acknowledgement body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_login_at: Option<OffsetDateTime>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

/// Response returned after a successful login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: PublicUser,
    pub token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub token_expiration: OffsetDateTime,
}

/// Response for the profile endpoint.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: PublicUser,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "alice@x.com".into(),
            password_hash: "$argon2id$fake".into(),
            created_at: OffsetDateTime::now_utc(),
            last_login_at: None,
            failed_login_count: 0,
            lockout_until: None,
        }
    }

    #[test]
    fn register_request_accepts_camel_case_confirmation() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"username":"alice","email":"alice@x.com",
                "password":"Passw0rd1","confirmPassword":"Passw0rd1"}"#,
        )
        .unwrap();
        assert_eq!(req.confirm_password, "Passw0rd1");
    }

    #[test]
    fn public_user_serializes_camel_case_without_hash() {
        let json = serde_json::to_value(PublicUser::from(sample_user())).unwrap();
        assert_eq!(json["username"], "alice");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("lastLoginAt").is_some());
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn login_response_uses_token_expiration_key() {
        let resp = LoginResponse {
            user: sample_user().into(),
            token: "abc".into(),
            token_expiration: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_value(resp).unwrap();
        assert!(json.get("tokenExpiration").is_some());
        assert!(json.get("token_expiration").is_none());
    }
}
