use recipegram::pagination::PageContext;
use recipegram::schema::{User, UserProfile, UserRole};
use serde_json::{json, Value};

fn user() -> User {
    User {
        id: 7,
        username: String::from("chef"),
        email: String::from("chef@example.com"),
        first_name: String::from("Julia"),
        last_name: String::from("Child"),
        password: String::from("$argon2id$..."),
        role: UserRole::User,
        avatar: None,
    }
}

#[test]
fn password_hash_never_leaves_the_api() {
    let value = serde_json::to_value(user()).unwrap();

    let object = value.as_object().unwrap();
    assert!(object.contains_key("username"));
    assert!(!object.contains_key("password"));
}

#[test]
fn profile_carries_the_subscription_flag() {
    let profile = UserProfile::from_user(user(), true);
    let value = serde_json::to_value(profile).unwrap();

    assert_eq!(value["id"], json!(7));
    assert_eq!(value["is_subscribed"], json!(true));
    assert_eq!(value["avatar"], Value::Null);
}

#[test]
fn page_context_matches_the_client_contract() {
    let page = PageContext::from_rows(vec![1, 2, 3], 25, 10, 10);
    let value = serde_json::to_value(page).unwrap();

    assert_eq!(value["count"], json!(25));
    assert_eq!(value["results"], json!([1, 2, 3]));
    assert_eq!(value["next_offset"], json!(20));
    assert_eq!(value["previous_offset"], json!(0));
}

#[test]
fn first_and_last_pages_drop_their_missing_neighbours() {
    let first = PageContext::from_rows(vec![0; 10], 25, 10, 0);
    let value = serde_json::to_value(first).unwrap();
    assert_eq!(value["previous_offset"], Value::Null);
    assert_eq!(value["next_offset"], json!(10));

    let last = PageContext::from_rows(vec![0; 5], 25, 10, 20);
    let value = serde_json::to_value(last).unwrap();
    assert_eq!(value["previous_offset"], json!(10));
    assert_eq!(value["next_offset"], Value::Null);
}
