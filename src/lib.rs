pub mod analytics;
pub mod cli;
pub mod config;
pub mod error;
pub mod filters;
pub mod json;
pub mod models;
pub mod openapi;
pub mod routes;
pub mod services;
pub mod state;
