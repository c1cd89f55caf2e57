pub mod config;
pub mod conversation;
pub mod models;
pub mod services;
