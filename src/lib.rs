// src/lib.rs

// Re-export or define the top-level modules you need
pub mod config;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

// Shared error alias for store- and service-level fallible calls
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
