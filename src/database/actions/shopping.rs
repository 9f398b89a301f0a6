use std::collections::BTreeMap;

use crate::{
    error::{ApiError, QueryError},
    schema::{CartIngredientRow, ShoppingListLine, Uuid},
};

use sqlx::{Pool, Postgres};

use super::recipes;

pub async fn is_in_cart(
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<bool, ApiError> {
    let row: (bool,) = sqlx::query_as(
        "SELECT EXISTS (SELECT 1 FROM shopping_cart WHERE recipe_id = $1 AND user_id = $2)",
    )
    .bind(recipe_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(row.0)
}

pub async fn add_to_cart(
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
        "INSERT INTO shopping_cart (recipe_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
    )
    .bind(recipe_id)
    .bind(user_id)
    .execute(pool)
    .await
    .map_err(QueryError::from)?;

    if query.rows_affected() == 0 {
        return Err(ApiError::BadRequest(String::from(
            "Recipe is already in shopping cart",
        )));
    }

    Ok(())
}

pub async fn remove_from_cart(
    recipe_id: Uuid,
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<(), ApiError> {
    let query = sqlx::query("DELETE FROM shopping_cart WHERE recipe_id = $1 AND user_id = $2")
        .bind(recipe_id)
        .bind(user_id)
        .execute(pool)
        .await
        .map_err(QueryError::from)?;

    if query.rows_affected() == 0 {
        return Err(ApiError::NotFound(String::from(
            "Recipe is not in shopping cart",
        )));
    }

    Ok(())
}

/// One row per (recipe, ingredient) pair across the user's whole cart.
/// Aggregation happens in [`aggregate_shopping_list`].
pub async fn list_cart_ingredients(
    user_id: Uuid,
    pool: &Pool<Postgres>,
) -> Result<Vec<CartIngredientRow>, ApiError> {
    let rows: Vec<CartIngredientRow> = sqlx::query_as(
        "
        SELECT i.name AS name, i.measurement_unit AS measurement_unit, ri.amount AS amount
        FROM shopping_cart c
        INNER JOIN recipe_ingredients ri ON ri.recipe_id = c.recipe_id
        INNER JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE c.user_id = $1
    ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(QueryError::from)?;

    Ok(rows)
}

/// Sums amounts per (name, unit) pair. The BTreeMap key gives the stable
/// name-then-unit ordering of the rendered list.
pub fn aggregate_shopping_list(rows: &[CartIngredientRow]) -> Vec<ShoppingListLine> {
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();

    for row in rows {
        *totals
            .entry((row.name.clone(), row.measurement_unit.clone()))
            .or_insert(0) += row.amount as i64;
    }

    totals
        .into_iter()
        .map(|((name, measurement_unit), amount)| ShoppingListLine {
            name,
            measurement_unit,
            amount,
        })
        .collect()
}

pub fn render_shopping_list(lines: &[ShoppingListLine]) -> String {
    lines
        .iter()
        .map(|line| format!("{} ({}) — {}", line.name, line.measurement_unit, line.amount))
        .collect::<Vec<String>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, unit: &str, amount: i32) -> CartIngredientRow {
        CartIngredientRow {
            name: String::from(name),
            measurement_unit: String::from(unit),
            amount,
        }
    }

    #[test]
    fn aggregates_nothing_from_empty_cart() {
        assert!(aggregate_shopping_list(&[]).is_empty());
        assert_eq!(render_shopping_list(&[]), "");
    }

    #[test]
    fn sums_shared_ingredients_across_recipes() {
        let rows = vec![
            row("Flour", "g", 200),
            row("Milk", "ml", 50),
            row("Flour", "g", 100),
            row("Egg", "pc", 2),
        ];

        let lines = aggregate_shopping_list(&rows);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].name, "Egg");
        assert_eq!(lines[0].amount, 2);
        assert_eq!(lines[1].name, "Flour");
        assert_eq!(lines[1].amount, 300);
        assert_eq!(lines[2].name, "Milk");
        assert_eq!(lines[2].amount, 50);
    }

    #[test]
    fn keeps_same_name_different_unit_separate() {
        let rows = vec![row("Sugar", "g", 100), row("Sugar", "tbsp", 2)];

        let lines = aggregate_shopping_list(&rows);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].measurement_unit, "g");
        assert_eq!(lines[1].measurement_unit, "tbsp");
    }

    #[test]
    fn renders_name_unit_and_total_per_line() {
        let rows = vec![
            row("Flour", "g", 200),
            row("Milk", "ml", 50),
            row("Flour", "g", 100),
            row("Egg", "pc", 2),
        ];

        let rendered = render_shopping_list(&aggregate_shopping_list(&rows));
        assert_eq!(rendered, "Egg (pc) — 2\nFlour (g) — 300\nMilk (ml) — 50");
    }
}
