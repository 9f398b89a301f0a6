use crate::{
    error::{ApiError, QueryError},
    schema::{Ingredient, IngredientSeed, Uuid},
};

use sqlx::{Pool, Postgres, QueryBuilder};

pub async fn get_ingredient(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Ingredient>, ApiError> {
    let row: Option<Ingredient> = sqlx::query_as("SELECT * FROM ingredients WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn list_ingredients(pool: &Pool<Postgres>) -> Result<Vec<Ingredient>, ApiError> {
    let rows: Vec<Ingredient> = sqlx::query_as("SELECT * FROM ingredients ORDER BY name")
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(rows)
}

/// Case-insensitive name prefix search for the ingredient picker.
pub async fn search_ingredients(
    name: &str,
    pool: &Pool<Postgres>,
) -> Result<Vec<Ingredient>, ApiError> {
    let rows: Vec<Ingredient> =
        sqlx::query_as("SELECT * FROM ingredients WHERE name ILIKE $1 ORDER BY name")
            .bind(format!("{name}%"))
            .fetch_all(pool)
            .await
            .map_err(QueryError::from)?;

    Ok(rows)
}

pub async fn count_existing_ingredients(
    ingredient_ids: &[Uuid],
    pool: &Pool<Postgres>,
) -> Result<i64, ApiError> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM ingredients WHERE id = ANY($1)")
        .bind(ingredient_ids)
        .fetch_one(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row.0)
}

/// Seeds the reference table from fixture rows, skipping pairs that already
/// exist. Returns the number of inserted rows.
pub async fn bulk_insert_ingredients(
    seeds: &[IngredientSeed],
    pool: &Pool<Postgres>,
) -> Result<u64, ApiError> {
    if seeds.is_empty() {
        return Ok(0);
    }

    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO ingredients (name, measurement_unit) ");

    query_builder.push_values(seeds.iter().take(65535 / 2), |mut b, seed| {
        b.push_bind(&seed.name).push_bind(&seed.measurement_unit);
    });
    query_builder.push(" ON CONFLICT DO NOTHING");

    let query = query_builder
        .build()
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(query.rows_affected())
}
