use chrono::Duration;
use chrono::Local;
use hmac::{Hmac, Mac};
use jwt::SignWithKey;
use jwt::VerifyWithKey;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;

use crate::constants::SESSION_LIFETIME_HOURS;
use crate::database::error::ApiError;
use crate::database::schema::{User, UserRole};

use super::permissions::ActionType;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JwtSessionData {
    pub user_id: i32,
    pub username: String,
    pub role: UserRole,
    iat: i64,
    exp: i64,
}

impl JwtSessionData {
    pub fn new(id: i32, username: String, role: UserRole) -> Self {
        let now = Local::now();
        let iat = now.timestamp();
        let exp = (now + Duration::hours(SESSION_LIFETIME_HOURS)).timestamp();

        Self {
            user_id: id,
            username,
            role,
            iat,
            exp,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionData {
    pub user_id: i32,
    pub username: String,
    pub role: UserRole,
    pub is_admin: bool,
}

impl SessionData {
    pub fn authenticate(&self, action: ActionType) -> Result<(), ApiError> {
        if !action.authenticate(self) {
            return Err(ApiError::Forbidden(String::from(
                "You don't have permission to perform this action",
            )));
        }
        Ok(())
    }
}

impl From<JwtSessionData> for SessionData {
    fn from(value: JwtSessionData) -> Self {
        SessionData {
            user_id: value.user_id,
            username: value.username,
            is_admin: value.role == UserRole::Admin,
            role: value.role,
        }
    }
}

fn signing_key(secret: &[u8]) -> Result<Hmac<Sha256>, ApiError> {
    Hmac::new_from_slice(secret)
        .map_err(|_| ApiError::Internal(String::from("Invalid signing key")))
}

pub fn generate_jwt_session(user: &User, secret: &[u8]) -> Result<String, ApiError> {
    let key = signing_key(secret)?;
    let claims = JwtSessionData::new(user.id, user.username.to_owned(), user.role.to_owned());

    claims
        .sign_with_key(&key)
        .map_err(|_| ApiError::Internal(String::from("Failed to sign session token")))
}

pub fn verify_jwt_session(token: &str, secret: &[u8]) -> Result<JwtSessionData, ApiError> {
    let key = signing_key(secret)?;

    token
        .verify_with_key(&key)
        .map_err(|_| ApiError::Unauthorized(String::from("Invalid session; Invalid token")))
        .map(|session: JwtSessionData| {
            let now = Local::now().timestamp();

            if (session.exp - now).is_negative() {
                return Err(ApiError::Unauthorized(String::from(
                    "Invalid session; Token expired",
                )));
            }
            Ok(session)
        })?
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-secret";

    fn user() -> User {
        User {
            id: 7,
            username: String::from("chef"),
            email: String::from("chef@example.com"),
            first_name: String::from("Main"),
            last_name: String::from("Chef"),
            password: String::from("<hash>"),
            role: UserRole::User,
            avatar: None,
        }
    }

    #[test]
    fn sign_and_verify_round_trip() {
        let token = generate_jwt_session(&user(), SECRET).unwrap();
        let session = verify_jwt_session(&token, SECRET).unwrap();

        assert_eq!(session.user_id, 7);
        assert_eq!(session.username, "chef");
        assert_eq!(session.role, UserRole::User);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_jwt_session(&user(), SECRET).unwrap();
        assert!(verify_jwt_session(&token, b"other-secret").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = Local::now().timestamp();
        let claims = JwtSessionData {
            user_id: 7,
            username: String::from("chef"),
            role: UserRole::User,
            iat: now - 7200,
            exp: now - 3600,
        };
        let key = signing_key(SECRET).unwrap();
        let token = claims.sign_with_key(&key).unwrap();

        assert!(verify_jwt_session(&token, SECRET).is_err());
    }

    #[test]
    fn session_data_marks_admins() {
        let mut admin = user();
        admin.role = UserRole::Admin;

        let token = generate_jwt_session(&admin, SECRET).unwrap();
        let session: SessionData = verify_jwt_session(&token, SECRET).unwrap().into();

        assert!(session.is_admin);
    }
}
