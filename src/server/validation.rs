use std::collections::HashSet;

use crate::{
    constants::{
        MAX_COOKING_TIME, MAX_EMAIL_LENGTH, MAX_INGREDIENT_AMOUNT, MAX_NAME_LENGTH,
        MAX_PERSON_NAME_LENGTH, MAX_TEXT_LENGTH, MAX_USERNAME_LENGTH, MIN_COOKING_TIME,
        MIN_INGREDIENT_AMOUNT, MIN_INGREDIENT_COUNT, MIN_NAME_LENGTH, MIN_PASSWORD_LENGTH,
        MIN_PERSON_NAME_LENGTH, MIN_TAG_COUNT, MIN_TEXT_LENGTH,
    },
    error::ApiError,
    schema::{RecipeIngredientEntry, Uuid},
};

pub fn validate_username(username: &str) -> Result<(), ApiError> {
    if username.is_empty() || username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Username must be 1 to {MAX_USERNAME_LENGTH} characters long"
        )));
    }

    let valid = username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-'));
    if !valid {
        return Err(ApiError::BadRequest(String::from(
            "Username may only contain letters, digits and @/./+/-/_",
        )));
    }

    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ApiError> {
    if email.chars().count() > MAX_EMAIL_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Email must be at most {MAX_EMAIL_LENGTH} characters long"
        )));
    }

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(ApiError::BadRequest(String::from("Invalid email address")));
    }

    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(ApiError::BadRequest(String::from(
            "Password cannot consist of digits only",
        )));
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        return Err(ApiError::BadRequest(String::from(
            "Password must contain at least one uppercase letter",
        )));
    }

    Ok(())
}

/// Validates a first or last name and normalizes it to title case.
pub fn normalize_person_name(name: &str) -> Result<String, ApiError> {
    let name = name.trim();

    let length = name.chars().count();
    if length < MIN_PERSON_NAME_LENGTH || length > MAX_PERSON_NAME_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Name must be {MIN_PERSON_NAME_LENGTH} to {MAX_PERSON_NAME_LENGTH} characters long"
        )));
    }

    let valid = name
        .chars()
        .all(|c| c.is_alphabetic() || c == ' ' || c == '-');
    if !valid {
        return Err(ApiError::BadRequest(String::from(
            "Name may only contain letters, spaces and hyphens",
        )));
    }

    let mut normalized = String::with_capacity(name.len());
    let mut word_start = true;
    for c in name.chars() {
        if c.is_alphabetic() {
            if word_start {
                normalized.extend(c.to_uppercase());
            } else {
                normalized.extend(c.to_lowercase());
            }
            word_start = false;
        } else {
            normalized.push(c);
            word_start = true;
        }
    }

    Ok(normalized)
}

pub fn validate_recipe_name(name: &str) -> Result<(), ApiError> {
    let length = name.chars().count();
    if length < MIN_NAME_LENGTH || length > MAX_NAME_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Recipe name must be {MIN_NAME_LENGTH} to {MAX_NAME_LENGTH} characters long"
        )));
    }

    Ok(())
}

pub fn validate_recipe_text(text: &str) -> Result<(), ApiError> {
    let length = text.chars().count();
    if length < MIN_TEXT_LENGTH || length > MAX_TEXT_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Recipe text must be {MIN_TEXT_LENGTH} to {MAX_TEXT_LENGTH} characters long"
        )));
    }

    Ok(())
}

pub fn validate_cooking_time(cooking_time: i64) -> Result<i32, ApiError> {
    if cooking_time < MIN_COOKING_TIME || cooking_time > MAX_COOKING_TIME {
        return Err(ApiError::BadRequest(format!(
            "Cooking time must be between {MIN_COOKING_TIME} and {MAX_COOKING_TIME} minutes"
        )));
    }

    Ok(cooking_time as i32)
}

pub fn validate_tag_ids(tag_ids: &[Uuid]) -> Result<(), ApiError> {
    if tag_ids.len() < MIN_TAG_COUNT {
        return Err(ApiError::BadRequest(String::from(
            "Recipe must have at least one tag",
        )));
    }

    let unique: HashSet<Uuid> = tag_ids.iter().copied().collect();
    if unique.len() != tag_ids.len() {
        return Err(ApiError::BadRequest(String::from(
            "Recipe tags must be unique",
        )));
    }

    Ok(())
}

pub fn validate_ingredient_entries(entries: &[RecipeIngredientEntry]) -> Result<(), ApiError> {
    if entries.len() < MIN_INGREDIENT_COUNT {
        return Err(ApiError::BadRequest(String::from(
            "Recipe must have at least one ingredient",
        )));
    }

    let unique: HashSet<Uuid> = entries.iter().map(|entry| entry.id).collect();
    if unique.len() != entries.len() {
        return Err(ApiError::BadRequest(String::from(
            "Recipe ingredients must be unique",
        )));
    }

    for entry in entries {
        if entry.amount < MIN_INGREDIENT_AMOUNT || entry.amount > MAX_INGREDIENT_AMOUNT {
            return Err(ApiError::BadRequest(format!(
                "Ingredient amount must be between {MIN_INGREDIENT_AMOUNT} and {MAX_INGREDIENT_AMOUNT}"
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_format() {
        assert!(validate_username("chef.42@home+_-").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("bad name").is_err());
        assert!(validate_username(&"x".repeat(151)).is_err());
    }

    #[test]
    fn email_shape() {
        assert!(validate_email("chef@example.com").is_ok());
        assert!(validate_email("chef@localhost").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("not-an-email").is_err());
    }

    #[test]
    fn password_strength() {
        assert!(validate_password("Secret123").is_ok());
        assert!(validate_password("Short1").is_err());
        assert!(validate_password("12345678").is_err());
        assert!(validate_password("alllowercase1").is_err());
    }

    #[test]
    fn person_name_normalization() {
        assert_eq!(normalize_person_name("  mary ann ").unwrap(), "Mary Ann");
        assert_eq!(normalize_person_name("jean-luc").unwrap(), "Jean-Luc");
        assert!(normalize_person_name("x").is_err());
        assert!(normalize_person_name("R2-D2").is_err());
    }

    #[test]
    fn recipe_field_bounds() {
        assert!(validate_recipe_name("Pancakes").is_ok());
        assert!(validate_recipe_name("x").is_err());
        assert!(validate_recipe_text("Mix and fry.").is_ok());
        assert!(validate_recipe_text("").is_err());
        assert_eq!(validate_cooking_time(20).unwrap(), 20);
        assert!(validate_cooking_time(0).is_err());
        assert!(validate_cooking_time(40000).is_err());
    }

    #[test]
    fn tag_and_ingredient_lists() {
        assert!(validate_tag_ids(&[1, 2]).is_ok());
        assert!(validate_tag_ids(&[]).is_err());
        assert!(validate_tag_ids(&[1, 1]).is_err());

        let entries = vec![
            RecipeIngredientEntry { id: 1, amount: 100 },
            RecipeIngredientEntry { id: 2, amount: 2 },
        ];
        assert!(validate_ingredient_entries(&entries).is_ok());
        assert!(validate_ingredient_entries(&[]).is_err());

        let duplicated = vec![
            RecipeIngredientEntry { id: 1, amount: 100 },
            RecipeIngredientEntry { id: 1, amount: 50 },
        ];
        assert!(validate_ingredient_entries(&duplicated).is_err());

        let zero = vec![RecipeIngredientEntry { id: 1, amount: 0 }];
        assert!(validate_ingredient_entries(&zero).is_err());
    }
}
