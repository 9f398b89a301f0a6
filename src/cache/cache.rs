use std::future::Future;

use redis::{aio::MultiplexedConnection, AsyncCommands, FromRedisValue, ToRedisArgs};
use redis_macros::{FromRedisValue, ToRedisArgs};
use serde::{Deserialize, Serialize};

use crate::{
    constants::REFERENCE_CACHE_TTL_SECONDS,
    error::{ApiError, CacheError},
};

/// Keys for the cached reference tables. Seeding deletes the matching key.
#[derive(Clone, Copy, Debug)]
pub enum CacheKey {
    Tags,
    Ingredients,
}

impl CacheKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKey::Tags => "tags",
            CacheKey::Ingredients => "ingredients",
        }
    }
}

#[derive(Serialize, Deserialize, FromRedisValue, ToRedisArgs, Clone)]
pub struct RedisValue<T: Serialize + Send + Sync + Clone> {
    pub value: T,
}

impl<T: Serialize + Send + Sync + Clone + for<'a> Deserialize<'a>> RedisValue<T> {
    /// Cached read with database fallback. A cache read or write failure is
    /// logged and the caller gets the database rows anyway.
    pub async fn get_or_list<'a, F, Fut>(
        key: CacheKey,
        cache: &mut MultiplexedConnection,
        callback: F,
    ) -> Result<Vec<T>, ApiError>
    where
        Vec<T>: Serialize + Send + Sync,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Vec<T>, ApiError>> + Send + 'a,
    {
        let cached = match get_cache_value::<&str, RedisValue<Vec<T>>>(key.as_str(), cache).await {
            Ok(value) => value,
            Err(_) => {
                let mut c = cache.clone();
                tokio::spawn(async move {
                    log::error!("> Unreadable cached value. Deleting {}", key.as_str());
                    if let Err(e) = delete_cache_value(key.as_str(), &mut c).await {
                        log::error!("> Failed to delete cached value! {e}");
                    }
                });
                None
            }
        };

        match cached {
            Some(value) => {
                log::trace!("> Found {}", key.as_str());
                Ok(value.value)
            }
            None => {
                log::trace!("> Fetching {}", key.as_str());
                let value = callback().await?;

                let wrapped = RedisValue {
                    value: value.clone(),
                };
                if let Err(e) = set_cache_value(key.as_str(), wrapped, cache).await {
                    log::error!("{e:?}");
                }

                Ok(value)
            }
        }
    }
}

pub async fn set_cache_value<K: ToRedisArgs + Send + Sync, V: ToRedisArgs + Send + Sync>(
    key: K,
    value: V,
    cache: &mut MultiplexedConnection,
) -> Result<(), ApiError> {
    let _: () = cache
        .set_ex(key, value, REFERENCE_CACHE_TTL_SECONDS)
        .await
        .map_err(CacheError::from)?;

    Ok(())
}

pub async fn delete_cache_value<K: ToRedisArgs + Send + Sync>(
    key: K,
    cache: &mut MultiplexedConnection,
) -> Result<(), ApiError> {
    let _: () = cache.del(key).await.map_err(CacheError::from)?;

    Ok(())
}

pub async fn get_cache_value<K: ToRedisArgs + Send + Sync, V: FromRedisValue>(
    key: K,
    cache: &mut MultiplexedConnection,
) -> Result<Option<V>, ApiError> {
    let value: Option<V> = cache.get(key).await.map_err(CacheError::from)?;

    Ok(value)
}
