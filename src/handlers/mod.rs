// src/handlers/mod.rs
pub mod auth;
pub mod call;
pub mod error;
pub mod files;
pub mod loan;
pub mod otp;
pub mod project;
pub mod quote;
