use crate::{
    error::{ApiError, QueryError},
    schema::Uuid,
};

use sqlx::{Pool, Postgres};

use super::recipes;

pub async fn is_favorite(
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    let row: (bool,) = sqlx::query_as(
        "SELECT EXISTS (SELECT 1 FROM favorites WHERE recipe_id = $1 AND user_id = $2)",
    )
    .bind(recipe_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(row.0)
}

/// Adding twice is a client error, not a no-op.
pub async fn add_to_favorites(
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    if recipes::get_recipe(recipe_id, pool).await?.is_none() {
        return Err(ApiError::NotFound(String::from(
            "No recipe exists with specified id",
        )));
    }

    let query = sqlx::query(
        "INSERT INTO favorites (recipe_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(recipe_id)
    .bind(user_id)
    .execute(pool)
    .await
    .map_err(QueryError::from)?;

    if query.rows_affected() == 0 {
        return Err(ApiError::BadRequest(String::from(
            "Recipe is already in favorites",
        )));
    }

    Ok(())
}

pub async fn remove_from_favorites(
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let query = sqlx::query("DELETE FROM favorites WHERE recipe_id = $1 AND user_id = $2")
        .bind(recipe_id)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    if query.rows_affected() == 0 {
        return Err(ApiError::NotFound(String::from(
            "Recipe is not in favorites",
        )));
    }

    Ok(())
}
