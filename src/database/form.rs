use std::collections::HashMap;

use serde_json::Value;

use super::error::{ApiError, TypeError};

pub type FormData = HashMap<String, Value>;

/// Wrapper over a JSON object body. Mutation payloads are parsed through
/// this instead of rigid DTO structs so that PATCH semantics (field present
/// vs. absent) stay observable.
pub struct Form {
    inner: HashMap<String, Value>,
}

impl Form {
    pub fn from_data(data: FormData) -> Self {
        Self { inner: data }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn get_value<T>(&self, key: &str) -> Result<T, ApiError>
    where
        T: TryFrom<Value>,
    {
        match self.inner.get(key) {
            Some(value) => value
                .to_owned()
                .try_into()
                .map_err(|_e| TypeError::new(&format!("Invalid value for field '{key}'")).into()),
            None => Err(TypeError::new(&format!("Missing field '{key}'")).into()),
        }
    }

    pub fn get_value_optional<T>(&self, key: &str) -> Result<Option<T>, ApiError>
    where
        T: TryFrom<Value>,
    {
        match self.inner.get(key) {
            Some(value) => value
                .to_owned()
                .try_into()
                .map(Some)
                .map_err(|_e| TypeError::new(&format!("Invalid value for field '{key}'")).into()),
            None => Ok(None),
        }
    }

    pub fn get_integer(&self, key: &str) -> Result<i64, ApiError> {
        match self.inner.get(key) {
            Some(value) => value
                .as_i64()
                .ok_or_else(|| TypeError::new(&format!("Invalid value for field '{key}'")).into()),
            None => Err(TypeError::new(&format!("Missing field '{key}'")).into()),
        }
    }

    pub fn get_integer_optional(&self, key: &str) -> Result<Option<i64>, ApiError> {
        match self.inner.get(key) {
            Some(value) => value
                .as_i64()
                .map(Some)
                .ok_or_else(|| TypeError::new(&format!("Invalid value for field '{key}'")).into()),
            None => Ok(None),
        }
    }

    pub fn get_str(&self, key: &str) -> Result<String, ApiError> {
        match self.inner.get(key) {
            Some(value) => match value.as_str() {
                Some(v) => Ok(v.to_string()),
                None => Err(TypeError::new(&format!("Invalid value for field '{key}'")).into()),
            },
            None => Err(TypeError::new(&format!("Missing field '{key}'")).into()),
        }
    }

    pub fn get_str_optional(&self, key: &str) -> Result<Option<String>, ApiError> {
        match self.inner.get(key) {
            Some(value) => match value.as_str() {
                Some(v) => Ok(Some(v.to_string())),
                None => Err(TypeError::new(&format!("Invalid value for field '{key}'")).into()),
            },
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form(value: Value) -> Form {
        let map = value.as_object().unwrap().clone().into_iter().collect();
        Form::from_data(map)
    }

    #[test]
    fn reads_typed_fields() {
        let form = form(json!({"name": "Pancakes", "cooking_time": 20}));

        assert_eq!(form.get_str("name").unwrap(), "Pancakes");
        assert_eq!(form.get_integer("cooking_time").unwrap(), 20);
        assert!(form.get_str("cooking_time").is_err());
        assert!(form.get_integer("name").is_err());
    }

    #[test]
    fn missing_and_optional_fields() {
        let form = form(json!({"image": "recipes/1.png"}));

        assert!(form.get_str("name").is_err());
        assert_eq!(form.get_str_optional("name").unwrap(), None);
        assert_eq!(
            form.get_str_optional("image").unwrap().as_deref(),
            Some("recipes/1.png")
        );
        assert_eq!(form.get_integer_optional("cooking_time").unwrap(), None);
        assert!(!form.contains("name"));
        assert!(form.contains("image"));
    }
}
