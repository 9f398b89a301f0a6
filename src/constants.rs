pub const USER_COUNT_PER_PAGE: i64 = 10;
pub const RECIPE_COUNT_PER_PAGE: i64 = 10;

pub const MIN_COOKING_TIME: i64 = 1;
pub const MAX_COOKING_TIME: i64 = 32000;

pub const MIN_INGREDIENT_AMOUNT: i64 = 1;
pub const MAX_INGREDIENT_AMOUNT: i64 = 32000;

pub const MIN_NAME_LENGTH: usize = 2;
pub const MAX_NAME_LENGTH: usize = 256;

pub const MIN_TEXT_LENGTH: usize = 1;
pub const MAX_TEXT_LENGTH: usize = 10000;

pub const MAX_USERNAME_LENGTH: usize = 150;
pub const MAX_EMAIL_LENGTH: usize = 254;

pub const MIN_PERSON_NAME_LENGTH: usize = 2;
pub const MAX_PERSON_NAME_LENGTH: usize = 150;

pub const MIN_PASSWORD_LENGTH: usize = 8;

pub const MIN_TAG_COUNT: usize = 1;
pub const MIN_INGREDIENT_COUNT: usize = 1;

pub const MAX_BODY_BYTES: u64 = 64 * 1024;

pub const SESSION_COOKIE: &str = "session";
pub const SESSION_LIFETIME_HOURS: i64 = 24;

pub const REFERENCE_CACHE_TTL_SECONDS: u64 = 3600;
