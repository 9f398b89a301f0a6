use warp::{reject::Rejection, Filter};

use crate::constants::SESSION_COOKIE;
use crate::database::error::ApiError;

use super::jwt::{verify_jwt_session, SessionData};

/// Token from the `session` cookie, falling back to the Authorization
/// header for non-browser clients.
fn session_token() -> impl Filter<Extract = (Option<String>,), Error = Rejection> + Copy {
    warp::cookie::optional::<String>(SESSION_COOKIE)
        .and(warp::header::optional::<String>("authorization"))
        .map(|cookie: Option<String>, header: Option<String>| {
            cookie.or_else(|| {
                header.map(|value| {
                    value
                        .strip_prefix("Bearer ")
                        .or_else(|| value.strip_prefix("Token "))
                        .unwrap_or(value.as_str())
                        .to_string()
                })
            })
        })
}

pub fn with_session(
    secret: Vec<u8>,
) -> impl Filter<Extract = (SessionData,), Error = Rejection> + Clone {
    session_token().and_then(move |token: Option<String>| {
        let secret = secret.clone();
        async move {
            match token {
                Some(token) => verify_jwt_session(&token, &secret)
                    .map(SessionData::from)
                    .map_err(Rejection::from),
                None => Err(ApiError::Unauthorized(String::from(
                    "Authentication credentials were not provided",
                ))
                .into()),
            }
        }
    })
}

pub fn with_possible_session(
    secret: Vec<u8>,
) -> impl Filter<Extract = (Option<SessionData>,), Error = Rejection> + Clone {
    session_token().map(move |token: Option<String>| {
        token
            .and_then(|token| verify_jwt_session(&token, &secret).ok())
            .map(SessionData::from)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::schema::{User, UserRole};
    use crate::jwt::generate_jwt_session;

    const SECRET: &[u8] = b"test-secret";

    fn token() -> String {
        let user = User {
            id: 3,
            username: String::from("baker"),
            email: String::from("baker@example.com"),
            first_name: String::from("Bread"),
            last_name: String::from("Baker"),
            password: String::from("<hash>"),
            role: UserRole::User,
            avatar: None,
        };
        generate_jwt_session(&user, SECRET).unwrap()
    }

    #[tokio::test]
    async fn session_from_cookie() {
        let filter = with_session(SECRET.to_vec());

        let session = warp::test::request()
            .header("cookie", format!("session={}", token()))
            .filter(&filter)
            .await
            .unwrap();

        assert_eq!(session.user_id, 3);
    }

    #[tokio::test]
    async fn session_from_authorization_header() {
        let filter = with_session(SECRET.to_vec());

        let session = warp::test::request()
            .header("authorization", format!("Token {}", token()))
            .filter(&filter)
            .await
            .unwrap();

        assert_eq!(session.username, "baker");
    }

    #[tokio::test]
    async fn missing_credentials_reject() {
        let filter = with_session(SECRET.to_vec());
        assert!(warp::test::request().filter(&filter).await.is_err());
    }

    #[tokio::test]
    async fn possible_session_tolerates_anonymous() {
        let filter = with_possible_session(SECRET.to_vec());

        let session = warp::test::request().filter(&filter).await.unwrap();
        assert!(session.is_none());

        let session = warp::test::request()
            .header("cookie", format!("session={}", token()))
            .filter(&filter)
            .await
            .unwrap();
        assert!(session.is_some());
    }

    #[tokio::test]
    async fn garbage_token_is_anonymous() {
        let filter = with_possible_session(SECRET.to_vec());

        let session = warp::test::request()
            .header("cookie", "session=garbage")
            .filter(&filter)
            .await
            .unwrap();

        assert!(session.is_none());
    }
}
