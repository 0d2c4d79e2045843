use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2 PHC string, not exposed in JSON
    pub created_at: OffsetDateTime,
    pub last_login_at: Option<OffsetDateTime>,
    pub failed_login_count: i32,
    pub lockout_until: Option<OffsetDateTime>,
}

impl User {
    /// True while a lockout window set by repeated failures is still open.
    pub fn is_locked_out(&self, now: OffsetDateTime) -> bool {
        self.lockout_until.map(|until| until > now).unwrap_or(false)
    }
}
