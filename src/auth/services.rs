use time::OffsetDateTime;
use tracing::{error, info, warn};

use crate::auth::dto::RegisterRequest;
use crate::auth::password::{generate_random_password, hash_password, verify_password};
use crate::auth::repo::{is_unique_violation, violated_field};
use crate::auth::repo_types::User;
use crate::auth::validate::registration_failures;
use crate::error::ApiError;
use crate::oauth::types::ExternalIdentity;
use crate::state::AppState;

/// Register a new account. Duplicate checks run up front for friendly
/// errors; the unique indexes stay authoritative, so a racing insert is
/// reported as the same duplicate error.
pub async fn register(state: &AppState, req: &RegisterRequest) -> Result<User, ApiError> {
    let failures = registration_failures(req);
    if !failures.is_empty() {
        warn!(username = %req.username, ?failures, "registration rejected");
        return Err(ApiError::Validation(failures));
    }

    if User::find_by_username(&state.db, &req.username).await?.is_some() {
        warn!(username = %req.username, "username already registered");
        return Err(ApiError::Duplicate("username"));
    }
    if User::find_by_email(&state.db, &req.email).await?.is_some() {
        warn!(email = %req.email, "email already registered");
        return Err(ApiError::Duplicate("email"));
    }

    let hash = hash_password(&req.password)?;
    let user = match User::create(&state.db, &req.username, &req.email, &hash).await {
        Ok(u) => u,
        Err(e) if is_unique_violation(&e) => {
            warn!(username = %req.username, "registration lost uniqueness race");
            return Err(ApiError::Duplicate(violated_field(&e)));
        }
        Err(e) => return Err(ApiError::Internal(e)),
    };

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(user)
}

/// Validate a username/password pair. Fails closed with the same generic
/// error for unknown usernames, locked accounts and wrong passwords.
pub async fn authenticate(
    state: &AppState,
    username: &str,
    password: &str,
) -> Result<User, ApiError> {
    let user = match User::find_by_username(&state.db, username).await? {
        Some(u) => u,
        None => {
            warn!(username = %username, "login unknown username");
            return Err(ApiError::Authentication);
        }
    };

    if user.is_locked_out(OffsetDateTime::now_utc()) {
        warn!(user_id = %user.id, "login attempt while locked out");
        return Err(ApiError::Authentication);
    }

    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        let lockout = &state.config.lockout;
        if let Err(e) = User::record_login_failure(
            &state.db,
            user.id,
            lockout.max_attempts,
            lockout.duration_minutes,
        )
        .await
        {
            error!(error = %e, user_id = %user.id, "failed to record login failure");
        }
        return Err(ApiError::Authentication);
    }

    let user = User::record_login_success(&state.db, user.id).await?;
    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok(user)
}

fn username_candidate(identity: &ExternalIdentity, attempt: u32) -> String {
    let seed = identity
        .display_name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| identity.email.split('@').next().unwrap_or("user"));

    let mut base: String = seed
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .take(30)
        .collect();
    if base.len() < 3 {
        base = format!("user_{base}");
    }
    if attempt == 0 {
        base
    } else {
        format!("{base}_{:04}", rand::random::<u16>() % 10000)
    }
}

/// Find the local account for an externally-asserted identity, creating
/// one on first login. OAuth-created accounts get a random unmemorable
/// password, so password login never works for them.
pub async fn find_or_create_external(
    state: &AppState,
    identity: &ExternalIdentity,
) -> Result<User, ApiError> {
    if let Some(user) = User::find_by_email(&state.db, &identity.email).await? {
        let user = User::record_login_success(&state.db, user.id).await?;
        info!(user_id = %user.id, "oauth login for existing account");
        return Ok(user);
    }

    let hash = hash_password(&generate_random_password())?;
    for attempt in 0..3 {
        let username = username_candidate(identity, attempt);
        match User::create(&state.db, &username, &identity.email, &hash).await {
            Ok(user) => {
                let user = User::record_login_success(&state.db, user.id).await?;
                info!(user_id = %user.id, username = %user.username, "oauth account created");
                return Ok(user);
            }
            Err(e) if is_unique_violation(&e) => {
                if violated_field(&e) == "email" {
                    // concurrent first login with the same email won the race
                    if let Some(user) = User::find_by_email(&state.db, &identity.email).await? {
                        let user = User::record_login_success(&state.db, user.id).await?;
                        return Ok(user);
                    }
                }
                warn!(username = %username, "oauth username collision, retrying");
            }
            Err(e) => return Err(ApiError::Internal(e)),
        }
    }

    Err(ApiError::UpstreamAuth(
        "could not allocate a username for the new account".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(email: &str, name: Option<&str>) -> ExternalIdentity {
        ExternalIdentity {
            email: email.into(),
            display_name: name.map(|n| n.to_string()),
        }
    }

    #[test]
    fn username_candidate_prefers_display_name() {
        let candidate = username_candidate(&identity("jane.doe@x.com", Some("Jane Doe")), 0);
        assert_eq!(candidate, "JaneDoe");
    }

    #[test]
    fn username_candidate_falls_back_to_email_local_part() {
        let candidate = username_candidate(&identity("jane.doe@x.com", None), 0);
        assert_eq!(candidate, "janedoe");
    }

    #[test]
    fn username_candidate_pads_short_seeds() {
        let candidate = username_candidate(&identity("ab@x.com", None), 0);
        assert!(candidate.len() >= 3);
        assert!(candidate.starts_with("user_"));
    }

    #[test]
    fn retry_candidates_carry_a_suffix() {
        let candidate = username_candidate(&identity("jane@x.com", None), 1);
        assert!(candidate.starts_with("jane_"));
        assert_eq!(candidate.len(), "jane_".len() + 4);
    }
}
