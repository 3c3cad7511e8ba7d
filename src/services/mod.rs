// src/services/mod.rs
pub mod auth;
pub mod db;
pub mod mailer;
pub mod otp;
pub mod quote;
