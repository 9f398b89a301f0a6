use crate::{
    constants::USER_COUNT_PER_PAGE,
    error::{ApiError, QueryError},
    pagination::PageContext,
    schema::{UserProfile, UserRow, Uuid},
};

use sqlx::{Pool, Postgres};

use super::users;

pub async fn is_subscribed(
    follower_id: Uuid,
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    let row: (bool,) = sqlx::query_as(
        "SELECT EXISTS (SELECT 1 FROM subscriptions WHERE follower_id = $1 AND author_id = $2)",
    )
    .bind(follower_id)
    .bind(author_id)
    .fetch_one(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(row.0)
}

pub async fn list_followed_ids(
    follower_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<Uuid>, ApiError> {
    let rows: Vec<(Uuid,)> =
        sqlx::query_as("SELECT author_id FROM subscriptions WHERE follower_id = $1")
            .bind(follower_id)
            .fetch_all(pool)
            .await
            .map_err(QueryError::from)?;

    Ok(rows.into_iter().map(|row| row.0).collect())
}

pub async fn subscribe(
    follower_id: Uuid,
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    if follower_id == author_id {
        return Err(ApiError::BadRequest(String::from(
            "Cannot subscribe to yourself",
        )));
    }

    if users::get_user_by_id(pool, author_id).await?.is_none() {
        return Err(ApiError::NotFound(String::from(
            "No user exists with specified id",
        )));
    }

    let query = sqlx::query(
        "INSERT INTO subscriptions (follower_id, author_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(follower_id)
    .bind(author_id)
    .execute(pool)
    .await
    .map_err(QueryError::from)?;

    if query.rows_affected() == 0 {
        return Err(ApiError::BadRequest(String::from(
            "Already subscribed to this user",
        )));
    }

    Ok(())
}

pub async fn unsubscribe(
    follower_id: Uuid,
    author_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let query = sqlx::query("DELETE FROM subscriptions WHERE follower_id = $1 AND author_id = $2")
        .bind(follower_id)
        .bind(author_id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    if query.rows_affected() == 0 {
        return Err(ApiError::NotFound(String::from(
            "Not subscribed to this user",
        )));
    }

    Ok(())
}

/// The followed authors of a user, oldest subscription first. Every profile
/// carries `is_subscribed: true` by construction.
pub async fn fetch_subscriptions(
    follower_id: Uuid,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<UserProfile>, ApiError> {
    let rows: Vec<UserRow> = sqlx::query_as(
        "
        SELECT u.id, u.username, u.email, u.first_name, u.last_name, u.avatar, COUNT(*) OVER() AS count
        FROM subscriptions s
        INNER JOIN users u ON u.id = s.author_id
        WHERE s.follower_id = $1
        ORDER BY s.created_at, u.id
        LIMIT $2 OFFSET $3
    ",
    )
    .bind(follower_id)
    .bind(USER_COUNT_PER_PAGE)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    let total_count = rows.first().map(|p| p.count).unwrap_or(0);
    let profiles = rows
        .into_iter()
        .map(|row| UserProfile::from_row(row, true))
        .collect();

    Ok(PageContext::from_rows(
        profiles,
        total_count,
        USER_COUNT_PER_PAGE,
        offset,
    ))
}
