pub mod favorites;
pub mod ingredients;
pub mod recipes;
pub mod shopping;
pub mod subscriptions;
pub mod tags;
pub mod users;
