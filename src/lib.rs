pub mod app;
pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod effects;
pub mod error;
pub mod filter;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod pdf;
pub mod services;
pub mod state;
