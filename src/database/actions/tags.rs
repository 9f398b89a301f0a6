use crate::{
    error::{ApiError, QueryError},
    schema::{Tag, TagSeed, Uuid},
};

use sqlx::{Pool, Postgres, QueryBuilder, Transaction};

pub async fn get_tag(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Tag>, ApiError> {
    let row: Option<Tag> = sqlx::query_as("SELECT * FROM tags WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn list_tags(pool: &Pool<Postgres>) -> Result<Vec<Tag>, ApiError> {
    let list: Vec<Tag> = sqlx::query_as("SELECT * FROM tags ORDER BY id")
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(list)
}

pub async fn list_recipe_tags(pool: &Pool<Postgres>, recipe_id: Uuid) -> Result<Vec<Tag>, ApiError> {
    let list: Vec<Tag> = sqlx::query_as(
        "
        SELECT t.id, t.name, t.slug
        FROM recipe_tags rt
        INNER JOIN tags t ON t.id = rt.tag_id
        WHERE rt.recipe_id = $1
        ORDER BY t.id
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(list)
}

pub async fn count_existing_tags(tag_ids: &[Uuid], pool: &Pool<Postgres>) -> Result<i64, ApiError> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tags WHERE id = ANY($1)")
        .bind(tag_ids)
        .fetch_one(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row.0)
}

/// Replaces the tag set of a recipe inside the caller's transaction.
pub async fn set_recipe_tags(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
    tag_ids: &[Uuid],
) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await
        .map_err(QueryError::from)?;

    if !tag_ids.is_empty() {
        let mut query_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");

        query_builder.push_values(tag_ids.iter(), |mut b, tag_id| {
            b.push_bind(recipe_id).push_bind(tag_id);
        });

        query_builder
            .build()
            .execute(&mut **tx)
            .await
            .map_err(QueryError::from)?;
    }

    Ok(())
}

/// Seeds the reference table, skipping rows whose slug already exists.
/// Returns the number of inserted rows.
pub async fn bulk_insert_tags(seeds: &[TagSeed], pool: &Pool<Postgres>) -> Result<u64, ApiError> {
    if seeds.is_empty() {
        return Ok(0);
    }

    let mut query_builder: QueryBuilder<Postgres> =
        QueryBuilder::new("INSERT INTO tags (name, slug) ");

    query_builder.push_values(seeds.iter().take(65535 / 2), |mut b, seed| {
        b.push_bind(&seed.name).push_bind(&seed.slug);
    });
    query_builder.push(" ON CONFLICT DO NOTHING");

    let query = query_builder
        .build()
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(query.rows_affected())
}
