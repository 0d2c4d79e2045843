use crate::auth::repo_types::User;
use sqlx::PgPool;

impl User {
    /// Find a user by username, case-insensitively.
    pub async fn find_by_username(db: &PgPool, username: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, created_at, last_login_at,
                   failed_login_count, lockout_until
            FROM users
            WHERE LOWER(username) = LOWER($1)
            "#,
        )
        .bind(username)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Find a user by email, case-insensitively.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, created_at, last_login_at,
                   failed_login_count, lockout_until
            FROM users
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: uuid::Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, created_at, last_login_at,
                   failed_login_count, lockout_until
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user with hashed password. Races on the unique indexes
    /// surface as a unique violation, see [`is_unique_violation`].
    pub async fn create(
        db: &PgPool,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password_hash, created_at, last_login_at,
                      failed_login_count, lockout_until
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Stamp a successful login and clear lockout bookkeeping.
    pub async fn record_login_success(db: &PgPool, id: uuid::Uuid) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET last_login_at = now(), failed_login_count = 0, lockout_until = NULL
            WHERE id = $1
            RETURNING id, username, email, password_hash, created_at, last_login_at,
                      failed_login_count, lockout_until
            "#,
        )
        .bind(id)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Count a failed attempt; opens a lockout window once the configured
    /// threshold is reached.
    pub async fn record_login_failure(
        db: &PgPool,
        id: uuid::Uuid,
        max_attempts: i32,
        lockout_minutes: i32,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET failed_login_count = failed_login_count + 1,
                lockout_until = CASE WHEN failed_login_count + 1 >= $2
                    THEN now() + make_interval(mins => $3)
                    ELSE lockout_until END
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(max_attempts)
        .bind(lockout_minutes)
        .execute(db)
        .await?;
        Ok(())
    }
}

/// True when the error is a Postgres unique-constraint violation
/// (SQLSTATE 23505), i.e. a duplicate username or email insert.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .and_then(|db| db.code())
        .map(|code| code == "23505")
        .unwrap_or(false)
}

/// Names the colliding field when the constraint can be identified.
pub fn violated_field(err: &anyhow::Error) -> &'static str {
    let constraint = err
        .downcast_ref::<sqlx::Error>()
        .and_then(|e| e.as_database_error())
        .and_then(|db| db.constraint())
        .unwrap_or("");
    if constraint.contains("email") {
        "email"
    } else {
        "username"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_database_errors_are_not_unique_violations() {
        let err = anyhow::anyhow!("network down");
        assert!(!is_unique_violation(&err));
        assert_eq!(violated_field(&err), "username");
    }

    #[test]
    fn plain_sqlx_errors_are_not_unique_violations() {
        let err = anyhow::Error::from(sqlx::Error::RowNotFound);
        assert!(!is_unique_violation(&err));
    }
}
