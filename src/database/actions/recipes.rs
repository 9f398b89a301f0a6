use crate::{
    authentication::permissions::ActionType,
    constants::RECIPE_COUNT_PER_PAGE,
    error::{ApiError, QueryError},
    jwt::SessionData,
    pagination::PageContext,
    schema::{
        Recipe, RecipeDetail, RecipeFilter, RecipeIngredientEntry, RecipeIngredientRow,
        RecipePatch, RecipeRow, Uuid,
    },
};

use sqlx::{Pool, Postgres, QueryBuilder, Transaction};

use super::{favorites, ingredients, shopping, tags, users};

/// Filtered, newest-first recipe listing. The total row count rides along
/// on every row as a window count.
pub async fn fetch_recipes(
    filter: &RecipeFilter,
    offset: i64,
    pool: &Pool<Postgres>,
) -> Result<PageContext<RecipeRow>, ApiError> {
    let mut query_builder: QueryBuilder<Postgres> = QueryBuilder::new(
        "
        SELECT r.id, r.author_id, r.name, r.text, r.cooking_time, r.image, r.created_at,
               COUNT(*) OVER() AS count
        FROM recipes r
        WHERE TRUE
    ",
    );

    if let Some(author) = filter.author {
        query_builder.push(" AND r.author_id = ").push_bind(author);
    }
    if let Some(slugs) = &filter.tag_slugs {
        query_builder
            .push(
                "
            AND EXISTS (
                SELECT 1 FROM recipe_tags rt
                INNER JOIN tags t ON t.id = rt.tag_id
                WHERE rt.recipe_id = r.id AND t.slug = ANY(",
            )
            .push_bind(slugs.clone())
            .push(") )");
    }
    if let Some(user_id) = filter.favorited_by {
        query_builder
            .push(" AND EXISTS (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ")
            .push_bind(user_id)
            .push(")");
    }
    if let Some(user_id) = filter.in_cart_of {
        query_builder
            .push(" AND EXISTS (SELECT 1 FROM shopping_cart c WHERE c.recipe_id = r.id AND c.user_id = ")
            .push_bind(user_id)
            .push(")");
    }
    if let Some(search) = &filter.search {
        query_builder
            .push(" AND r.name ILIKE ")
            .push_bind(format!("{search}%"));
    }

    query_builder
        .push(" ORDER BY r.created_at DESC, r.id DESC LIMIT ")
        .push_bind(RECIPE_COUNT_PER_PAGE)
        .push(" OFFSET ")
        .push_bind(offset);

    let rows: Vec<RecipeRow> = query_builder
        .build_query_as()
        .fetch_all(pool)
        .await
        .map_err(QueryError::from)?;

    let total_count = rows.first().map(|p| p.count).unwrap_or(0);
    let page = PageContext::from_rows(rows, total_count, RECIPE_COUNT_PER_PAGE, offset);
    Ok(page)
}

pub async fn get_recipe(id: Uuid, pool: &Pool<Postgres>) -> Result<Option<Recipe>, ApiError> {
    let row: Option<Recipe> = sqlx::query_as("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(row)
}

pub async fn list_recipe_ingredients(
    pool: &Pool<Postgres>,
    recipe_id: Uuid,
) -> Result<Vec<RecipeIngredientRow>, ApiError> {
    let rows: Vec<RecipeIngredientRow> = sqlx::query_as(
        "
        SELECT i.id AS ingredient_id, i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM recipe_ingredients ri
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = $1
        ORDER BY i.name
    ",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(rows)
}

/// Detail view: the recipe with its author profile, tag set, ingredient
/// list and the viewer-relative membership flags.
pub async fn get_recipe_detail(
    id: Uuid,
    viewer: Option<Uuid>,
    pool: &Pool<Postgres>,
) -> Result<Option<RecipeDetail>, ApiError> {
    let recipe = match get_recipe(id, pool).await? {
        Some(recipe) => recipe,
        None => return Ok(None),
    };

    let author = match users::get_user_profile(recipe.author_id, viewer, pool).await? {
        Some(author) => author,
        None => return Err(ApiError::Internal(String::from("Recipe has no author row"))),
    };

    let tags = tags::list_recipe_tags(pool, id).await?;
    let ingredients = list_recipe_ingredients(pool, id).await?;

    let (is_favorited, is_in_shopping_cart) = match viewer {
        Some(viewer) => (
            favorites::is_favorite(id, viewer, pool).await?,
            shopping::is_in_cart(id, viewer, pool).await?,
        ),
        None => (false, false),
    };

    Ok(Some(RecipeDetail {
        id: recipe.id,
        author,
        name: recipe.name,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
        image: recipe.image,
        created_at: recipe.created_at,
        tags,
        ingredients,
        is_favorited,
        is_in_shopping_cart,
    }))
}

async fn ensure_references_exist(
    tag_ids: &[Uuid],
    entries: &[RecipeIngredientEntry],
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let found = tags::count_existing_tags(tag_ids, pool).await?;
    if found != tag_ids.len() as i64 {
        return Err(ApiError::BadRequest(String::from(
            "Tag doesn't exist",
        )));
    }

    let ingredient_ids: Vec<Uuid> = entries.iter().map(|entry| entry.id).collect();
    let found = ingredients::count_existing_ingredients(&ingredient_ids, pool).await?;
    if found != ingredient_ids.len() as i64 {
        return Err(ApiError::BadRequest(String::from(
            "Ingredient doesn't exist",
        )));
    }

    Ok(())
}

async fn insert_recipe_ingredients(
    tx: &mut Transaction<'_, Postgres>,
    recipe_id: Uuid,
    entries: &[RecipeIngredientEntry],
) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(recipe_id)
        .execute(&mut **tx)
        .await
        .map_err(QueryError::from)?;

    if !entries.is_empty() {
        let mut query_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ");

        query_builder.push_values(entries.iter().take(65535 / 3), |mut b, entry| {
            b.push_bind(recipe_id)
                .push_bind(entry.id)
                .push_bind(entry.amount as i32);
        });

        query_builder
            .build()
            .execute(&mut **tx)
            .await
            .map_err(QueryError::from)?;
    }

    Ok(())
}

/// Inserts the recipe row, its ingredient rows and its tag links in one
/// transaction. Field bounds are validated by the caller; referenced tags
/// and ingredients must exist.
pub async fn create_recipe(
    author_id: Uuid,
    name: &str,
    text: &str,
    cooking_time: i32,
    image: Option<&str>,
    tag_ids: &[Uuid],
    entries: &[RecipeIngredientEntry],
    pool: &Pool<Postgres>,
) -> Result<Uuid, ApiError> {
    ensure_references_exist(tag_ids, entries, pool).await?;

    let mut tx = pool.begin().await.map_err(QueryError::from)?;

    let id: (i32,) = sqlx::query_as(
        "
        INSERT INTO recipes (author_id, name, text, cooking_time, image)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
    ",
    )
    .bind(author_id)
    .bind(name)
    .bind(text)
    .bind(cooking_time)
    .bind(image)
    .fetch_one(&mut *tx)
    .await
    .map_err(QueryError::from)?;

    insert_recipe_ingredients(&mut tx, id.0, entries).await?;
    tags::set_recipe_tags(&mut tx, id.0, tag_ids).await?;

    tx.commit().await.map_err(QueryError::from)?;

    Ok(id.0)
}

/// PATCH update. Scalar fields apply when present; tag and ingredient
/// lists, when present, replace the stored sets in the same transaction.
pub async fn update_recipe(
    id: Uuid,
    patch: &RecipePatch,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    if let Some(tag_ids) = &patch.tag_ids {
        let entries = patch.ingredients.as_deref().unwrap_or(&[]);
        ensure_references_exist(tag_ids, entries, pool).await?;
    } else if let Some(entries) = &patch.ingredients {
        ensure_references_exist(&[], entries, pool).await?;
    }

    let mut tx = pool.begin().await.map_err(QueryError::from)?;

    sqlx::query(
        "
        UPDATE recipes SET
        name = COALESCE($2, name),
        text = COALESCE($3, text),
        cooking_time = COALESCE($4, cooking_time),
        image = COALESCE($5, image)
        WHERE id = $1
    ",
    )
    .bind(id)
    .bind(patch.name.as_deref())
    .bind(patch.text.as_deref())
    .bind(patch.cooking_time)
    .bind(patch.image.as_deref())
    .execute(&mut *tx)
    .await
    .map_err(QueryError::from)?;

    if let Some(entries) = &patch.ingredients {
        insert_recipe_ingredients(&mut tx, id, entries).await?;
    }
    if let Some(tag_ids) = &patch.tag_ids {
        tags::set_recipe_tags(&mut tx, id, tag_ids).await?;
    }

    tx.commit().await.map_err(QueryError::from)?;

    Ok(())
}

/// Cascades out of favorites and shopping carts through the FK clauses.
pub async fn delete_recipe(id: Uuid, pool: &Pool<Postgres>) -> Result<bool, ApiError> {
    let query = sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    Ok(query.rows_affected() > 0)
}

/// Fetches a recipe for mutation, enforcing owner-or-admin access.
pub async fn get_recipe_mut(
    id: Uuid,
    session: &SessionData,
    pool: &Pool<Postgres>,
) -> Result<Recipe, ApiError> {
    let recipe = get_recipe(id, pool).await?;
    session.authenticate(ActionType::ManageOwnRecipes)?;

    match recipe {
        Some(recipe) => match session.authenticate(ActionType::ManageAllRecipes) {
            Ok(_) => Ok(recipe),
            Err(_) => {
                if recipe.author_id != session.user_id {
                    Err(ApiError::Forbidden(String::from(
                        "You don't have permission to perform this action",
                    )))
                } else {
                    Ok(recipe)
                }
            }
        },
        None => Err(ApiError::NotFound(String::from(
            "No recipe exists with specified id",
        ))),
    }
}
