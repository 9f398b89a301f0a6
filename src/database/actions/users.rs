use crate::{
    authentication::{cryptography::verify_password, jwt::generate_jwt_session},
    constants::USER_COUNT_PER_PAGE,
    error::{ApiError, QueryError},
    pagination::PageContext,
    schema::{User, UserProfile, UserRow, Uuid},
};

use sqlx::{Pool, Postgres};

use super::subscriptions;

pub async fn get_user_by_id(pool: &Pool<Postgres>, user_id: Uuid) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn get_user_by_email(pool: &Pool<Postgres>, email: &str) -> Result<Option<User>, ApiError> {
    let row: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

/// Creates a user row. `password` is the argon2 hash, never the plain text.
/// Returns false when the username or email is already taken.
pub async fn register_user(
    username: &str,
    email: &str,
    first_name: &str,
    last_name: &str,
    password: &str,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    let query = sqlx::query(
        "
        INSERT INTO users (username, email, first_name, last_name, password)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT DO NOTHING;
    ",
    )
    .bind(username)
    .bind(email)
    .bind(first_name)
    .bind(last_name)
    .bind(password)
    .execute(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(query.rows_affected() > 0)
}

pub async fn login_user(
    email: &str,
    password: &str,
    secret: &[u8],
    pool: &Pool<Postgres>,
) -> Result<String, ApiError> {
    let user = match get_user_by_email(pool, email).await? {
        Some(user) => user,
        None => return Err(ApiError::BadRequest(String::from("Invalid credentials"))),
    };

    let authenticated = verify_password(password, &user.password)
        .map_err(|_e| ApiError::Internal(String::from("Stored credentials are unreadable")))?;
    if !authenticated {
        return Err(ApiError::BadRequest(String::from("Invalid credentials")));
    }

    generate_jwt_session(&user, secret)
}

pub async fn fetch_users(
    offset: i64,
    viewer: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<PageContext<UserProfile>, ApiError> {
    let rows: Vec<UserRow> = sqlx::query_as(
        "
        SELECT u.id, u.username, u.email, u.first_name, u.last_name, u.avatar, COUNT(*) OVER() AS count
        FROM users u
        ORDER BY u.id
        LIMIT $1 OFFSET $2
    ",
    )
    .bind(USER_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    let followed = match viewer {
        Some(viewer) => subscriptions::list_followed_ids(viewer, pool).await?,
        None => vec![],
    };

    let total_count = rows.first().map(|p| p.count).unwrap_or(0);
    let profiles = rows
        .into_iter()
        .map(|row| {
            let is_subscribed = followed.contains(&row.id);
            UserProfile::from_row(row, is_subscribed)
        })
        .collect();

    Ok(PageContext::from_rows(
        profiles,
        total_count,
        USER_COUNT_PER_PAGE,
        offset,
    ))
}

pub async fn get_user_profile(
    user_id: Uuid,
    viewer: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<Option<UserProfile>, ApiError> {
    let user = match get_user_by_id(pool, user_id).await? {
        Some(user) => user,
        None => return Ok(None),
    };

    let is_subscribed = match viewer {
        Some(viewer) => subscriptions::is_subscribed(viewer, user_id, pool).await?,
        None => false,
    };

    Ok(Some(UserProfile::from_user(user, is_subscribed)))
}

/// `password` is the new argon2 hash. Verifying the current password is the
/// caller's job.
pub async fn set_password(
    user_id: Uuid,
    password: &str,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    sqlx::query("UPDATE users SET password = $2 WHERE id = $1")
        .bind(user_id)
        .bind(password)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(())
}

pub async fn set_avatar(
    user_id: Uuid,
    avatar: Option<&str>,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    sqlx::query("UPDATE users SET avatar = $2 WHERE id = $1")
        .bind(user_id)
        .bind(avatar)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(())
}

/// Cascades to the user's recipes, favorites, cart entries and
/// subscriptions through the schema's FK clauses.
pub async fn delete_user(user_id: Uuid, pool: &Pool<Postgres>) -> Result<bool, ApiError> {
    let query = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(query.rows_affected() > 0)
}
