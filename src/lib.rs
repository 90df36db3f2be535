pub mod auth;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod lookup;
pub mod render;
pub mod state;
pub mod types;
