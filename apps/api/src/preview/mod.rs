pub mod controller;
pub mod domains;
pub mod handlers;
pub mod icons;
pub mod preferences;
