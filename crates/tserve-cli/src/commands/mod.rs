//! CLI command modules

pub mod config;
pub mod models;
pub mod security;
