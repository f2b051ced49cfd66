pub mod config;
pub mod content;
pub mod errors;
pub mod mal;
pub mod preview;
pub mod routes;
pub mod state;
