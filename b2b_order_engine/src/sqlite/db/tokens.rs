use chrono::{DateTime, Utc};
use log::debug;
use sqlx::SqliteConnection;

use crate::{db_types::PasswordResetToken, traits::AccountApiError};

/// Stores the user's email confirmation key, replacing any previous one.
pub async fn upsert_confirmation_token(
    user_id: i64,
    token: &str,
    conn: &mut SqliteConnection,
) -> Result<(), AccountApiError> {
    sqlx::query(
        r#"INSERT INTO confirm_email_tokens (user_id, token) VALUES (?, ?)
        ON CONFLICT (user_id) DO UPDATE SET token = excluded.token, created_at = CURRENT_TIMESTAMP"#,
    )
    .bind(user_id)
    .bind(token)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn fetch_confirmation_token(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<String>, AccountApiError> {
    let token = sqlx::query_scalar("SELECT token FROM confirm_email_tokens WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(conn)
        .await?;
    Ok(token)
}

pub async fn delete_confirmation_token(user_id: i64, conn: &mut SqliteConnection) -> Result<(), AccountApiError> {
    sqlx::query("DELETE FROM confirm_email_tokens WHERE user_id = ?").bind(user_id).execute(conn).await?;
    Ok(())
}

pub async fn insert_reset_token(user_id: i64, token: &str, conn: &mut SqliteConnection) -> Result<(), AccountApiError> {
    sqlx::query("INSERT INTO password_reset_tokens (user_id, token) VALUES (?, ?)")
        .bind(user_id)
        .bind(token)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn fetch_reset_token(
    token: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<PasswordResetToken>, AccountApiError> {
    let token = sqlx::query_as("SELECT * FROM password_reset_tokens WHERE token = ?")
        .bind(token)
        .fetch_optional(conn)
        .await?;
    Ok(token)
}

pub async fn delete_reset_tokens_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<u64, AccountApiError> {
    let result =
        sqlx::query("DELETE FROM password_reset_tokens WHERE user_id = ?").bind(user_id).execute(conn).await?;
    Ok(result.rows_affected())
}

pub async fn purge_reset_tokens(cutoff: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<u64, AccountApiError> {
    let result = sqlx::query("DELETE FROM password_reset_tokens WHERE datetime(created_at) < datetime(?)")
        .bind(cutoff.format("%Y-%m-%d %H:%M:%S").to_string())
        .execute(conn)
        .await?;
    let purged = result.rows_affected();
    if purged > 0 {
        debug!("🗃️ Purged {purged} expired password reset tokens");
    }
    Ok(purged)
}
