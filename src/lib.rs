pub mod analytics;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod ident;
pub mod middleware;
pub mod scope;
pub mod services;
