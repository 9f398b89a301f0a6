use redis::aio::MultiplexedConnection;
use serde::Deserialize;
use serde_json::json;
use sqlx::{Pool, Postgres};
use warp::{
    http::StatusCode,
    reply::{json as json_reply, with_header, with_status},
    Rejection, Reply,
};

use crate::{
    actions::{favorites, ingredients, recipes, shopping, subscriptions, tags, users},
    cache::cache::{CacheKey, RedisValue},
    constants::{SESSION_COOKIE, SESSION_LIFETIME_HOURS},
    cryptography::{hash_password, verify_password},
    error::ApiError,
    form::{Form, FormData},
    jwt::SessionData,
    permissions::ActionType,
    schema::{RecipeFilter, RecipeIngredientEntries, RecipePatch, TagIdList, Uuid},
    validation,
};

#[derive(Debug, Deserialize)]
pub struct OffsetQuery {
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct IngredientQuery {
    pub name: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RecipeListQuery {
    pub author: Option<Uuid>,
    pub tags: Option<String>,
    pub is_favorited: Option<String>,
    pub is_in_shopping_cart: Option<String>,
    pub search: Option<String>,
    pub offset: Option<i64>,
}

fn flag_enabled(value: Option<&str>) -> bool {
    matches!(value, Some("1") | Some("true"))
}

fn offset_or_default(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}

// Users & auth

pub async fn register(data: FormData, pool: Pool<Postgres>) -> Result<impl Reply, Rejection> {
    let form = Form::from_data(data);

    let username = form.get_str("username")?;
    let email = form.get_str("email")?;
    let password = form.get_str("password")?;

    validation::validate_username(&username)?;
    validation::validate_email(&email)?;
    validation::validate_password(&password)?;
    let first_name = validation::normalize_person_name(&form.get_str("first_name")?)?;
    let last_name = validation::normalize_person_name(&form.get_str("last_name")?)?;

    let hash = hash_password(&password)
        .map_err(|_e| ApiError::Internal(String::from("Failed to hash password")))?;

    let created =
        users::register_user(&username, &email, &first_name, &last_name, &hash, &pool).await?;
    if !created {
        return Err(ApiError::BadRequest(String::from(
            "A user with that username or email already exists",
        ))
        .into());
    }

    let profile = match users::get_user_by_email(&pool, &email).await? {
        Some(user) => crate::schema::UserProfile::from_user(user, false),
        None => {
            return Err(ApiError::Internal(String::from(
                "Registered user could not be loaded",
            ))
            .into())
        }
    };

    Ok(with_status(json_reply(&profile), StatusCode::CREATED))
}

pub async fn login(
    data: FormData,
    secret: Vec<u8>,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let form = Form::from_data(data);

    let email = form.get_str("email")?;
    let password = form.get_str("password")?;

    let token = users::login_user(&email, &password, &secret, &pool).await?;

    let cookie = format!(
        "{SESSION_COOKIE}={token}; HttpOnly; Path=/; Max-Age={}",
        SESSION_LIFETIME_HOURS * 3600
    );
    Ok(with_header(
        json_reply(&json!({ "auth_token": token })),
        "set-cookie",
        cookie,
    ))
}

/// Tokens are stateless, logout only clears the cookie.
pub async fn logout(_session: SessionData) -> Result<impl Reply, Rejection> {
    let cookie = format!("{SESSION_COOKIE}=; HttpOnly; Path=/; Max-Age=0");
    Ok(with_status(
        with_header(warp::reply(), "set-cookie", cookie),
        StatusCode::NO_CONTENT,
    ))
}

pub async fn list_users(
    query: OffsetQuery,
    session: Option<SessionData>,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let viewer = session.map(|session| session.user_id);
    let page = users::fetch_users(offset_or_default(query.offset), viewer, &pool).await?;

    Ok(json_reply(&page))
}

pub async fn get_user(
    id: Uuid,
    session: Option<SessionData>,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let viewer = session.map(|session| session.user_id);
    match users::get_user_profile(id, viewer, &pool).await? {
        Some(profile) => Ok(json_reply(&profile)),
        None => Err(ApiError::NotFound(String::from("No user exists with specified id")).into()),
    }
}

pub async fn get_me(session: SessionData, pool: Pool<Postgres>) -> Result<impl Reply, Rejection> {
    match users::get_user_profile(session.user_id, None, &pool).await? {
        Some(profile) => Ok(json_reply(&profile)),
        None => Err(ApiError::Unauthorized(String::from("Invalid session")).into()),
    }
}

pub async fn set_password(
    session: SessionData,
    data: FormData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageOwnProfile)?;
    let form = Form::from_data(data);

    let current_password = form.get_str("current_password")?;
    let new_password = form.get_str("new_password")?;

    let user = match users::get_user_by_id(&pool, session.user_id).await? {
        Some(user) => user,
        None => return Err(ApiError::Unauthorized(String::from("Invalid session")).into()),
    };

    let authenticated = verify_password(&current_password, &user.password)
        .map_err(|_e| ApiError::Internal(String::from("Stored credentials are unreadable")))?;
    if !authenticated {
        return Err(ApiError::BadRequest(String::from("Current password is incorrect")).into());
    }

    validation::validate_password(&new_password)?;
    let hash = hash_password(&new_password)
        .map_err(|_e| ApiError::Internal(String::from("Failed to hash password")))?;
    users::set_password(session.user_id, &hash, &pool).await?;

    Ok(with_status(warp::reply(), StatusCode::NO_CONTENT))
}

pub async fn put_avatar(
    session: SessionData,
    data: FormData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageOwnProfile)?;
    let form = Form::from_data(data);

    let avatar = form.get_str("avatar")?;
    users::set_avatar(session.user_id, Some(&avatar), &pool).await?;

    Ok(json_reply(&json!({ "avatar": avatar })))
}

pub async fn delete_avatar(
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageOwnProfile)?;
    users::set_avatar(session.user_id, None, &pool).await?;

    Ok(with_status(warp::reply(), StatusCode::NO_CONTENT))
}

pub async fn delete_user(
    id: Uuid,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageOwnProfile)?;
    if id != session.user_id {
        session.authenticate(ActionType::ManageUsers)?;
    }

    let deleted = users::delete_user(id, &pool).await?;
    if !deleted {
        return Err(ApiError::NotFound(String::from("No user exists with specified id")).into());
    }

    Ok(with_status(warp::reply(), StatusCode::NO_CONTENT))
}

pub async fn list_subscriptions(
    query: OffsetQuery,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageOwnSubscriptions)?;
    let page = subscriptions::fetch_subscriptions(
        session.user_id,
        offset_or_default(query.offset),
        &pool,
    )
    .await?;

    Ok(json_reply(&page))
}

pub async fn subscribe(
    id: Uuid,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageOwnSubscriptions)?;
    subscriptions::subscribe(session.user_id, id, &pool).await?;

    match users::get_user_profile(id, Some(session.user_id), &pool).await? {
        Some(profile) => Ok(with_status(json_reply(&profile), StatusCode::CREATED)),
        None => Err(ApiError::NotFound(String::from("No user exists with specified id")).into()),
    }
}

pub async fn unsubscribe(
    id: Uuid,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageOwnSubscriptions)?;
    subscriptions::unsubscribe(session.user_id, id, &pool).await?;

    Ok(with_status(warp::reply(), StatusCode::NO_CONTENT))
}

// Tags & ingredients

pub async fn list_tags(
    mut cache: MultiplexedConnection,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let list = RedisValue::get_or_list(CacheKey::Tags, &mut cache, move || async move {
        tags::list_tags(&pool).await
    })
    .await?;

    Ok(json_reply(&list))
}

pub async fn get_tag(id: Uuid, pool: Pool<Postgres>) -> Result<impl Reply, Rejection> {
    match tags::get_tag(id, &pool).await? {
        Some(tag) => Ok(json_reply(&tag)),
        None => Err(ApiError::NotFound(String::from("No tag exists with specified id")).into()),
    }
}

pub async fn list_ingredients(
    query: IngredientQuery,
    mut cache: MultiplexedConnection,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    if let Some(name) = query.name.or(query.search) {
        let list = ingredients::search_ingredients(&name, &pool).await?;
        return Ok(json_reply(&list));
    }

    let list = RedisValue::get_or_list(CacheKey::Ingredients, &mut cache, move || async move {
        ingredients::list_ingredients(&pool).await
    })
    .await?;

    Ok(json_reply(&list))
}

pub async fn get_ingredient(id: Uuid, pool: Pool<Postgres>) -> Result<impl Reply, Rejection> {
    match ingredients::get_ingredient(id, &pool).await? {
        Some(ingredient) => Ok(json_reply(&ingredient)),
        None => {
            Err(ApiError::NotFound(String::from("No ingredient exists with specified id")).into())
        }
    }
}

// Recipes

pub async fn list_recipes(
    query: RecipeListQuery,
    session: Option<SessionData>,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let viewer = session.map(|session| session.user_id);

    let mut filter = RecipeFilter {
        author: query.author,
        search: query.search.clone(),
        ..RecipeFilter::default()
    };

    if let Some(tags) = &query.tags {
        let slugs: Vec<String> = tags
            .split(',')
            .map(str::trim)
            .filter(|slug| !slug.is_empty())
            .map(String::from)
            .collect();
        if !slugs.is_empty() {
            filter.tag_slugs = Some(slugs);
        }
    }

    if flag_enabled(query.is_favorited.as_deref()) {
        match viewer {
            Some(viewer) => filter.favorited_by = Some(viewer),
            None => {
                return Err(ApiError::Unauthorized(String::from(
                    "Authentication credentials were not provided",
                ))
                .into())
            }
        }
    }
    if flag_enabled(query.is_in_shopping_cart.as_deref()) {
        match viewer {
            Some(viewer) => filter.in_cart_of = Some(viewer),
            None => {
                return Err(ApiError::Unauthorized(String::from(
                    "Authentication credentials were not provided",
                ))
                .into())
            }
        }
    }

    let page = recipes::fetch_recipes(&filter, offset_or_default(query.offset), &pool).await?;

    Ok(json_reply(&page))
}

pub async fn get_recipe(
    id: Uuid,
    session: Option<SessionData>,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    let viewer = session.map(|session| session.user_id);
    match recipes::get_recipe_detail(id, viewer, &pool).await? {
        Some(detail) => Ok(json_reply(&detail)),
        None => Err(ApiError::NotFound(String::from("No recipe exists with specified id")).into()),
    }
}

pub async fn create_recipe(
    session: SessionData,
    data: FormData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::CreateRecipes)?;
    let form = Form::from_data(data);

    let name = form.get_str("name")?;
    let text = form.get_str("text")?;
    let cooking_time = validation::validate_cooking_time(form.get_integer("cooking_time")?)?;
    let image = form.get_str_optional("image")?;
    let TagIdList(tag_ids) = form.get_value("tags")?;
    let RecipeIngredientEntries(entries) = form.get_value("ingredients")?;

    validation::validate_recipe_name(&name)?;
    validation::validate_recipe_text(&text)?;
    validation::validate_tag_ids(&tag_ids)?;
    validation::validate_ingredient_entries(&entries)?;

    let id = recipes::create_recipe(
        session.user_id,
        &name,
        &text,
        cooking_time,
        image.as_deref(),
        &tag_ids,
        &entries,
        &pool,
    )
    .await?;

    match recipes::get_recipe_detail(id, Some(session.user_id), &pool).await? {
        Some(detail) => Ok(with_status(json_reply(&detail), StatusCode::CREATED)),
        None => Err(ApiError::Internal(String::from(
            "Created recipe could not be loaded",
        ))
        .into()),
    }
}

pub async fn update_recipe(
    id: Uuid,
    session: SessionData,
    data: FormData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    recipes::get_recipe_mut(id, &session, &pool).await?;
    let form = Form::from_data(data);

    let mut patch = RecipePatch {
        name: form.get_str_optional("name")?,
        text: form.get_str_optional("text")?,
        cooking_time: None,
        image: form.get_str_optional("image")?,
        tag_ids: None,
        ingredients: None,
    };

    if let Some(name) = &patch.name {
        validation::validate_recipe_name(name)?;
    }
    if let Some(text) = &patch.text {
        validation::validate_recipe_text(text)?;
    }
    if let Some(cooking_time) = form.get_integer_optional("cooking_time")? {
        patch.cooking_time = Some(validation::validate_cooking_time(cooking_time)?);
    }
    if let Some(TagIdList(tag_ids)) = form.get_value_optional("tags")? {
        validation::validate_tag_ids(&tag_ids)?;
        patch.tag_ids = Some(tag_ids);
    }
    if let Some(RecipeIngredientEntries(entries)) = form.get_value_optional("ingredients")? {
        validation::validate_ingredient_entries(&entries)?;
        patch.ingredients = Some(entries);
    }

    recipes::update_recipe(id, &patch, &pool).await?;

    match recipes::get_recipe_detail(id, Some(session.user_id), &pool).await? {
        Some(detail) => Ok(json_reply(&detail)),
        None => Err(ApiError::NotFound(String::from("No recipe exists with specified id")).into()),
    }
}

pub async fn delete_recipe(
    id: Uuid,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    recipes::get_recipe_mut(id, &session, &pool).await?;

    let deleted = recipes::delete_recipe(id, &pool).await?;
    if !deleted {
        return Err(ApiError::NotFound(String::from("No recipe exists with specified id")).into());
    }

    Ok(with_status(warp::reply(), StatusCode::NO_CONTENT))
}

// Favorites & shopping cart

pub async fn add_favorite(
    id: Uuid,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageOwnFavorites)?;
    favorites::add_to_favorites(id, session.user_id, &pool).await?;

    match recipes::get_recipe(id, &pool).await? {
        Some(recipe) => Ok(with_status(json_reply(&recipe), StatusCode::CREATED)),
        None => Err(ApiError::NotFound(String::from("No recipe exists with specified id")).into()),
    }
}

pub async fn remove_favorite(
    id: Uuid,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageOwnFavorites)?;
    favorites::remove_from_favorites(id, session.user_id, &pool).await?;

    Ok(with_status(warp::reply(), StatusCode::NO_CONTENT))
}

pub async fn add_to_cart(
    id: Uuid,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageOwnCart)?;
    shopping::add_to_cart(id, session.user_id, &pool).await?;

    match recipes::get_recipe(id, &pool).await? {
        Some(recipe) => Ok(with_status(json_reply(&recipe), StatusCode::CREATED)),
        None => Err(ApiError::NotFound(String::from("No recipe exists with specified id")).into()),
    }
}

pub async fn remove_from_cart(
    id: Uuid,
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageOwnCart)?;
    shopping::remove_from_cart(id, session.user_id, &pool).await?;

    Ok(with_status(warp::reply(), StatusCode::NO_CONTENT))
}

pub async fn download_shopping_cart(
    session: SessionData,
    pool: Pool<Postgres>,
) -> Result<impl Reply, Rejection> {
    session.authenticate(ActionType::ManageOwnCart)?;

    let rows = shopping::list_cart_ingredients(session.user_id, &pool).await?;
    if rows.is_empty() {
        return Err(ApiError::NotFound(String::from("Shopping cart is empty")).into());
    }

    let body = shopping::render_shopping_list(&shopping::aggregate_shopping_list(&rows));

    Ok(with_header(
        with_header(body, "content-type", "text/plain; charset=utf-8"),
        "content-disposition",
        "attachment; filename=\"shopping_list.txt\"",
    ))
}
