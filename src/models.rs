// src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::services::quote::QuoteEstimate;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Phone number, with country code.
    pub tele: String,
    pub password: String,
    pub reset_code: Option<String>,
    pub reset_code_expiry: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub roles: Vec<String>,
}

/// A quote estimate frozen into the caller's history. Append-only: the
/// store never edits or reorders entries once pushed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredQuote {
    #[serde(flatten)]
    pub estimate: QuoteEstimate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    #[serde(rename = "image")]
    Image,
    #[serde(rename = "pdf")]
    Pdf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub id: String,
    pub filename: String,
    pub original_name: String,
    pub file_type: FileType,
    pub document_type: Option<String>,
    pub mime_type: String,
    pub url: String,
    pub path: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
}

/// The per-user bundle of uploaded documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSet {
    pub user_id: String,
    pub files: Vec<StoredFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub landmark: String,
    pub solar_system_size: String,
    pub occupation: String,
    pub annualincome: String,
    pub created_at: DateTime<Utc>,
    pub files: Vec<StoredFile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookedCall {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub landmark: String,
    pub solar_system_size: String,
    pub schedule_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectStep {
    pub step: u32,
    pub title: &'static str,
    pub status: &'static str,
}
