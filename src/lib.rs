// Library entry point for ErrandPay
// This exposes modules for testing while keeping main.rs as the binary entry point

pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod observability;
pub mod schema;
pub mod services;
pub mod utility;

pub use error::ApiError;
pub use models::AppState;
