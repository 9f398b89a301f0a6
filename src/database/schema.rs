use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::TypeError;

pub type Uuid = i32;

#[derive(
    Clone, Debug, PartialEq, PartialOrd, sqlx::Type, Serialize, Eq, Ord, Hash, Deserialize,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    User,
    Admin,
}

impl TryFrom<Value> for UserRole {
    type Error = TypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value.as_str() {
            Some(value) => match value {
                "user" => Ok(Self::User),
                "admin" => Ok(Self::Admin),
                _ => Err(TypeError::new("Invalid variant")),
            },
            None => Err(TypeError::new("Failed to parse value as string")),
        }
    }
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: UserRole,
    pub avatar: Option<String>,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: Option<String>,

    pub count: i64,
}

/// Public profile as the API exposes it. `is_subscribed` is relative to the
/// viewer and is filled in at the action layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: Option<String>,
    pub is_subscribed: bool,
}

impl UserProfile {
    pub fn from_user(user: User, is_subscribed: bool) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            avatar: user.avatar,
            is_subscribed,
        }
    }

    pub fn from_row(row: UserRow, is_subscribed: bool) -> Self {
        Self {
            id: row.id,
            username: row.username,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            avatar: row.avatar,
            is_subscribed,
        }
    }
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
}

/// Fixture row, no id. Both reference tables are seeded from JSON files.
#[derive(Debug, Clone, Deserialize)]
pub struct IngredientSeed {
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagSeed {
    pub name: String,
    pub slug: String,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct Recipe {
    pub id: Uuid,
    pub author_id: Uuid,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeRow {
    pub id: Uuid,
    pub author_id: Uuid,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,

    pub count: i64,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
pub struct RecipeIngredientRow {
    pub ingredient_id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// One joined row of the shopping-cart contents, input of the aggregator.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct CartIngredientRow {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecipeDetail {
    pub id: Uuid,
    pub author: UserProfile,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub tags: Vec<Tag>,
    pub ingredients: Vec<RecipeIngredientRow>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

/// Criteria of the recipe listing. All fields combine with AND, the slugs
/// within `tag_slugs` combine with OR.
#[derive(Debug, Default, Clone)]
pub struct RecipeFilter {
    pub author: Option<Uuid>,
    pub tag_slugs: Option<Vec<String>>,
    pub favorited_by: Option<Uuid>,
    pub in_cart_of: Option<Uuid>,
    pub search: Option<String>,
}

/// PATCH payload for a recipe. `None` leaves the field untouched; present
/// tag and ingredient lists replace the stored sets.
#[derive(Debug, Default, Clone)]
pub struct RecipePatch {
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
    pub image: Option<String>,
    pub tag_ids: Option<Vec<Uuid>>,
    pub ingredients: Option<Vec<RecipeIngredientEntry>>,
}

/// One aggregated line of the shopping list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShoppingListLine {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RecipeIngredientEntry {
    pub id: Uuid,
    pub amount: i64,
}

#[derive(Debug, Clone)]
pub struct RecipeIngredientEntries(pub Vec<RecipeIngredientEntry>);

impl TryFrom<Value> for RecipeIngredientEntries {
    type Error = TypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        serde_json::from_value(value)
            .map(Self)
            .map_err(|_| TypeError::new("Failed to parse ingredient list"))
    }
}

#[derive(Debug, Clone)]
pub struct TagIdList(pub Vec<Uuid>);

impl TryFrom<Value> for TagIdList {
    type Error = TypeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        serde_json::from_value(value)
            .map(Self)
            .map_err(|_| TypeError::new("Failed to parse tag list"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ingredient_entries_from_value() {
        let value = json!([{"id": 3, "amount": 200}, {"id": 7, "amount": 1}]);
        let entries = RecipeIngredientEntries::try_from(value).unwrap();
        assert_eq!(entries.0.len(), 2);
        assert_eq!(entries.0[0], RecipeIngredientEntry { id: 3, amount: 200 });
    }

    #[test]
    fn ingredient_entries_reject_garbage() {
        assert!(RecipeIngredientEntries::try_from(json!("not a list")).is_err());
        assert!(RecipeIngredientEntries::try_from(json!([{"id": "x"}])).is_err());
    }

    #[test]
    fn tag_ids_from_value() {
        let tags = TagIdList::try_from(json!([1, 2, 3])).unwrap();
        assert_eq!(tags.0, vec![1, 2, 3]);
    }

    #[test]
    fn user_role_from_value() {
        assert_eq!(UserRole::try_from(json!("admin")).unwrap(), UserRole::Admin);
        assert!(UserRole::try_from(json!("superuser")).is_err());
        assert!(UserRole::try_from(json!(2)).is_err());
    }
}
