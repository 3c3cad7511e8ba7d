// src/handlers/loan.rs
use chrono::Utc;
use log::{error, info};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use warp::multipart::FormData;
use warp::{Rejection, Reply};

use crate::config::AppConfig;
use crate::handlers::error::{reject, ApiError};
use crate::handlers::files::collect_uploads;
use crate::models::Loan;
use crate::services::db::{record_id, DocumentStore, LoanUpdate};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub landmark: Option<String>,
    #[serde(default)]
    pub solar_system_size: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub annualincome: Option<String>,
}

impl LoanRequest {
    fn missing_fields(&self) -> Vec<String> {
        let fields: [(&str, &Option<String>); 8] = [
            ("name", &self.name),
            ("phone", &self.phone),
            ("email", &self.email),
            ("address", &self.address),
            ("landmark", &self.landmark),
            ("solarSystemSize", &self.solar_system_size),
            ("occupation", &self.occupation),
            ("annualincome", &self.annualincome),
        ];
        fields
            .iter()
            .filter(|(_, value)| value.as_deref().unwrap_or("").is_empty())
            .map(|(name, _)| name.to_string())
            .collect()
    }
}

pub async fn apply_loan(
    user_id: String,
    request: LoanRequest,
    db: Arc<DocumentStore>,
) -> Result<impl Reply, Rejection> {
    info!("Handling loan application for user {}", user_id);

    let missing = request.missing_fields();
    if !missing.is_empty() {
        return Err(reject(ApiError::missing_fields(missing)));
    }

    let loan = Loan {
        id: record_id(),
        user_id: user_id.clone(),
        name: request.name.unwrap_or_default(),
        phone: request.phone.unwrap_or_default(),
        email: request.email.unwrap_or_default(),
        address: request.address.unwrap_or_default(),
        landmark: request.landmark.unwrap_or_default(),
        solar_system_size: request.solar_system_size.unwrap_or_default(),
        occupation: request.occupation.unwrap_or_default(),
        annualincome: request.annualincome.unwrap_or_default(),
        created_at: Utc::now(),
        files: Vec::new(),
    };

    db.upsert_loan(loan.clone()).await.map_err(|e| {
        error!("Error applying loan: {}", e);
        reject(ApiError::database_error(e.to_string()))
    })?;

    Ok(warp::reply::json(&json!({
        "success": true,
        "message": "Loan application submitted successfully",
        "loan": loan,
    })))
}

pub async fn get_loan_details(
    user_id: String,
    db: Arc<DocumentStore>,
) -> Result<impl Reply, Rejection> {
    let loan = db
        .get_loan(&user_id)
        .await
        .map_err(|e| reject(ApiError::database_error(e.to_string())))?
        .ok_or_else(|| reject(ApiError::not_found("No loan details found for this user")))?;

    Ok(warp::reply::json(&json!({
        "success": true,
        "data": loan,
    })))
}

pub async fn update_loan_details(
    user_id: String,
    update: LoanUpdate,
    db: Arc<DocumentStore>,
) -> Result<impl Reply, Rejection> {
    info!("Updating loan details for user {}", user_id);

    let loan = db
        .update_loan(&user_id, update)
        .await
        .map_err(|e| reject(ApiError::database_error(e.to_string())))?
        .ok_or_else(|| reject(ApiError::not_found("Loan details not found")))?;

    Ok(warp::reply::json(&json!({
        "success": true,
        "message": "Loan details updated successfully",
        "data": loan,
    })))
}

pub async fn get_loan_documents(
    user_id: String,
    db: Arc<DocumentStore>,
) -> Result<impl Reply, Rejection> {
    let loan = db
        .get_loan(&user_id)
        .await
        .map_err(|e| reject(ApiError::database_error(e.to_string())))?;

    match loan {
        Some(loan) if !loan.files.is_empty() => Ok(warp::reply::json(&json!({
            "success": true,
            "data": loan.files,
        }))),
        _ => Err(reject(ApiError::not_found(
            "No loan documents found for this user",
        ))),
    }
}

pub async fn upload_loan_documents(
    user_id: String,
    form: FormData,
    db: Arc<DocumentStore>,
    cfg: Arc<AppConfig>,
) -> Result<impl Reply, Rejection> {
    info!("Handling loan document upload for user {}", user_id);

    let files = collect_uploads(form, &cfg).await?;
    if files.is_empty() {
        return Err(reject(ApiError::validation("No files uploaded")));
    }
    let count = files.len();

    db.push_loan_files(&user_id, files.clone())
        .await
        .map_err(|e| {
            error!("Upload error: {}", e);
            reject(ApiError::database_error(e.to_string()))
        })?;

    Ok(warp::reply::json(&json!({
        "success": true,
        "message": format!("Successfully uploaded {} file(s)", count),
        "files": files,
    })))
}
