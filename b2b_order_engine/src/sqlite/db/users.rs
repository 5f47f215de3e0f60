use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{NewUser, User, UserUpdate},
    traits::AccountApiError,
};

pub async fn fetch_user_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, AccountApiError> {
    let user = sqlx::query_as("SELECT * FROM users WHERE id = ?").bind(id).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn fetch_user_by_email(email: &str, conn: &mut SqliteConnection) -> Result<Option<User>, AccountApiError> {
    let user = sqlx::query_as("SELECT * FROM users WHERE email = ? COLLATE NOCASE")
        .bind(email)
        .fetch_optional(conn)
        .await?;
    Ok(user)
}

pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, AccountApiError> {
    let user: User = sqlx::query_as(
        r#"
            INSERT INTO users (
                email,
                password_hash,
                first_name,
                last_name,
                company,
                position,
                user_type,
                is_active,
                is_superuser
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *;
        "#,
    )
    .bind(user.email)
    .bind(user.password_hash)
    .bind(user.first_name)
    .bind(user.last_name)
    .bind(user.company)
    .bind(user.position)
    .bind(user.user_type)
    .bind(user.is_active)
    .bind(user.is_superuser)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ User #{} ({}) inserted", user.id, user.email);
    Ok(user)
}

pub async fn set_active(id: i64, active: bool, conn: &mut SqliteConnection) -> Result<Option<User>, AccountApiError> {
    // Deactivation revokes every access token issued so far
    let user = sqlx::query_as(
        r#"UPDATE users SET
            is_active = ?,
            auth_epoch = CASE WHEN ? THEN auth_epoch ELSE auth_epoch + 1 END,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ? RETURNING *"#,
    )
    .bind(active)
    .bind(active)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(user)
}

/// Applies the non-empty fields of `update`. A new email or password bumps the user's `auth_epoch`; `deactivate`
/// additionally clears `is_active`.
pub async fn update_user(
    id: i64,
    update: UserUpdate,
    deactivate: bool,
    conn: &mut SqliteConnection,
) -> Result<Option<User>, AccountApiError> {
    if update.is_empty() && !deactivate {
        trace!("🗃️ No fields to update for user #{id}");
        return fetch_user_by_id(id, conn).await;
    }
    let revoke = deactivate || update.email.is_some() || update.password_hash.is_some();
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE users SET updated_at = CURRENT_TIMESTAMP");
    let mut set_clause = builder.separated(", ");
    set_clause.push_unseparated(", ");
    if revoke {
        set_clause.push("auth_epoch = auth_epoch + 1");
    }
    if deactivate {
        set_clause.push("is_active = 0");
    }
    if let Some(email) = update.email {
        set_clause.push("email = ").push_bind_unseparated(email);
    }
    if let Some(hash) = update.password_hash {
        set_clause.push("password_hash = ").push_bind_unseparated(hash);
    }
    if let Some(first_name) = update.first_name {
        set_clause.push("first_name = ").push_bind_unseparated(first_name);
    }
    if let Some(last_name) = update.last_name {
        set_clause.push("last_name = ").push_bind_unseparated(last_name);
    }
    if let Some(company) = update.company {
        set_clause.push("company = ").push_bind_unseparated(company);
    }
    if let Some(position) = update.position {
        set_clause.push("position = ").push_bind_unseparated(position);
    }
    if let Some(user_type) = update.user_type {
        set_clause.push("user_type = ").push_bind_unseparated(user_type);
    }
    builder.push(" WHERE id = ").push_bind(id).push(" RETURNING *");
    trace!("🗃️ Executing query: {}", builder.sql());
    let user = builder.build_query_as::<User>().fetch_optional(conn).await?;
    Ok(user)
}

pub async fn fetch_admin_emails(conn: &mut SqliteConnection) -> Result<Vec<String>, AccountApiError> {
    let emails = sqlx::query_scalar("SELECT email FROM users WHERE is_superuser = 1 AND is_active = 1 ORDER BY id")
        .fetch_all(conn)
        .await?;
    Ok(emails)
}
