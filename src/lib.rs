pub mod config;
pub mod database;
pub mod errors;
pub mod extract;
pub mod filters;
pub mod logging;
pub mod models;
pub mod time;
pub mod write;
