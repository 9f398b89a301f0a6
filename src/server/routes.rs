use std::convert::Infallible;

use redis::aio::MultiplexedConnection;
use sqlx::{Pool, Postgres};
use warp::{Filter, Rejection, Reply};

use crate::{
    constants::MAX_BODY_BYTES,
    form::FormData,
    middleware::{with_possible_session, with_session},
    schema::Uuid,
};

use super::{handlers, rejection::handle_rejection};

/// The complete `/api` filter tree with rejection recovery applied.
pub fn routes(
    pool: Pool<Postgres>,
    cache: MultiplexedConnection,
    secret: Vec<u8>,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    warp::path("api")
        .and(
            auth_routes(pool.clone(), secret.clone())
                .or(user_routes(pool.clone(), secret.clone()))
                .or(tag_routes(pool.clone(), cache.clone()))
                .or(ingredient_routes(pool.clone(), cache))
                .or(recipe_routes(pool, secret)),
        )
        .recover(handle_rejection)
        .with(warp::log("recipegram::api"))
}

fn with_pool(
    pool: Pool<Postgres>,
) -> impl Filter<Extract = (Pool<Postgres>,), Error = Infallible> + Clone {
    warp::any().map(move || pool.clone())
}

fn with_cache(
    cache: MultiplexedConnection,
) -> impl Filter<Extract = (MultiplexedConnection,), Error = Infallible> + Clone {
    warp::any().map(move || cache.clone())
}

fn with_secret(secret: Vec<u8>) -> impl Filter<Extract = (Vec<u8>,), Error = Infallible> + Clone {
    warp::any().map(move || secret.clone())
}

fn json_body() -> impl Filter<Extract = (FormData,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

fn auth_routes(
    pool: Pool<Postgres>,
    secret: Vec<u8>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let login = warp::path!("auth" / "token" / "login")
        .and(warp::post())
        .and(json_body())
        .and(with_secret(secret.clone()))
        .and(with_pool(pool))
        .and_then(handlers::login);

    let logout = warp::path!("auth" / "token" / "logout")
        .and(warp::post())
        .and(with_session(secret))
        .and_then(handlers::logout);

    login.or(logout)
}

fn user_routes(
    pool: Pool<Postgres>,
    secret: Vec<u8>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let register = warp::path!("users")
        .and(warp::post())
        .and(json_body())
        .and(with_pool(pool.clone()))
        .and_then(handlers::register);

    let list = warp::path!("users")
        .and(warp::get())
        .and(warp::query::<handlers::OffsetQuery>())
        .and(with_possible_session(secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(handlers::list_users);

    let me = warp::path!("users" / "me")
        .and(warp::get())
        .and(with_session(secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(handlers::get_me);

    let set_password = warp::path!("users" / "set_password")
        .and(warp::post())
        .and(with_session(secret.clone()))
        .and(json_body())
        .and(with_pool(pool.clone()))
        .and_then(handlers::set_password);

    let put_avatar = warp::path!("users" / "me" / "avatar")
        .and(warp::put())
        .and(with_session(secret.clone()))
        .and(json_body())
        .and(with_pool(pool.clone()))
        .and_then(handlers::put_avatar);

    let delete_avatar = warp::path!("users" / "me" / "avatar")
        .and(warp::delete())
        .and(with_session(secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(handlers::delete_avatar);

    let subscriptions = warp::path!("users" / "subscriptions")
        .and(warp::get())
        .and(warp::query::<handlers::OffsetQuery>())
        .and(with_session(secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(handlers::list_subscriptions);

    let get = warp::path!("users" / Uuid)
        .and(warp::get())
        .and(with_possible_session(secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(handlers::get_user);

    let delete = warp::path!("users" / Uuid)
        .and(warp::delete())
        .and(with_session(secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(handlers::delete_user);

    let subscribe = warp::path!("users" / Uuid / "subscribe")
        .and(warp::post())
        .and(with_session(secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(handlers::subscribe);

    let unsubscribe = warp::path!("users" / Uuid / "subscribe")
        .and(warp::delete())
        .and(with_session(secret))
        .and(with_pool(pool))
        .and_then(handlers::unsubscribe);

    register
        .or(me)
        .or(set_password)
        .or(put_avatar)
        .or(delete_avatar)
        .or(subscriptions)
        .or(list)
        .or(subscribe)
        .or(unsubscribe)
        .or(get)
        .or(delete)
}

fn tag_routes(
    pool: Pool<Postgres>,
    cache: MultiplexedConnection,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let list = warp::path!("tags")
        .and(warp::get())
        .and(with_cache(cache))
        .and(with_pool(pool.clone()))
        .and_then(handlers::list_tags);

    let get = warp::path!("tags" / Uuid)
        .and(warp::get())
        .and(with_pool(pool))
        .and_then(handlers::get_tag);

    list.or(get)
}

fn ingredient_routes(
    pool: Pool<Postgres>,
    cache: MultiplexedConnection,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let list = warp::path!("ingredients")
        .and(warp::get())
        .and(warp::query::<handlers::IngredientQuery>())
        .and(with_cache(cache))
        .and(with_pool(pool.clone()))
        .and_then(handlers::list_ingredients);

    let get = warp::path!("ingredients" / Uuid)
        .and(warp::get())
        .and(with_pool(pool))
        .and_then(handlers::get_ingredient);

    list.or(get)
}

fn recipe_routes(
    pool: Pool<Postgres>,
    secret: Vec<u8>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let list = warp::path!("recipes")
        .and(warp::get())
        .and(warp::query::<handlers::RecipeListQuery>())
        .and(with_possible_session(secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(handlers::list_recipes);

    let create = warp::path!("recipes")
        .and(warp::post())
        .and(with_session(secret.clone()))
        .and(json_body())
        .and(with_pool(pool.clone()))
        .and_then(handlers::create_recipe);

    let download = warp::path!("recipes" / "download_shopping_cart")
        .and(warp::get())
        .and(with_session(secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(handlers::download_shopping_cart);

    let get = warp::path!("recipes" / Uuid)
        .and(warp::get())
        .and(with_possible_session(secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(handlers::get_recipe);

    let update = warp::path!("recipes" / Uuid)
        .and(warp::patch())
        .and(with_session(secret.clone()))
        .and(json_body())
        .and(with_pool(pool.clone()))
        .and_then(handlers::update_recipe);

    let delete = warp::path!("recipes" / Uuid)
        .and(warp::delete())
        .and(with_session(secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(handlers::delete_recipe);

    let favorite = warp::path!("recipes" / Uuid / "favorite")
        .and(warp::post())
        .and(with_session(secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(handlers::add_favorite);

    let unfavorite = warp::path!("recipes" / Uuid / "favorite")
        .and(warp::delete())
        .and(with_session(secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(handlers::remove_favorite);

    let cart_add = warp::path!("recipes" / Uuid / "shopping_cart")
        .and(warp::post())
        .and(with_session(secret.clone()))
        .and(with_pool(pool.clone()))
        .and_then(handlers::add_to_cart);

    let cart_remove = warp::path!("recipes" / Uuid / "shopping_cart")
        .and(warp::delete())
        .and(with_session(secret))
        .and(with_pool(pool))
        .and_then(handlers::remove_from_cart);

    download
        .or(list)
        .or(create)
        .or(favorite)
        .or(unfavorite)
        .or(cart_add)
        .or(cart_remove)
        .or(get)
        .or(update)
        .or(delete)
}
