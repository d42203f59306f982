pub mod app;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod model;
pub mod schema;
pub mod services;
pub mod templates;

#[cfg(test)]
pub mod testing;
