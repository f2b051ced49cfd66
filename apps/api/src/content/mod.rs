pub mod handlers;
pub mod loader;
pub mod models;
pub mod related;
pub mod search;
pub mod series;
pub mod slug;
