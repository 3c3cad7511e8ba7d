// src/handlers/call.rs
use chrono::{DateTime, Utc};
use log::{error, info};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use warp::{Rejection, Reply};

use crate::handlers::error::{reject, ApiError};
use crate::models::BookedCall;
use crate::services::db::{record_id, DocumentStore};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookCallRequest {
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
    pub schedule_date: Option<DateTime<Utc>>,
}

impl BookCallRequest {
    fn missing_fields(&self) -> Vec<String> {
        let mut missing: Vec<String> = [
            ("name", &self.name),
            ("phone", &self.phone),
            ("email", &self.email),
            ("address", &self.address),
            ("landmark", &self.landmark),
            ("solarSystemSize", &self.solar_system_size),
        ]
        .iter()
        .filter(|(_, value)| value.as_deref().unwrap_or("").is_empty())
        .map(|(name, _)| name.to_string())
        .collect();
        if self.schedule_date.is_none() {
            missing.push("scheduleDate".to_string());
        }
        missing
    }
}

pub async fn book_call(
    request: BookCallRequest,
    db: Arc<DocumentStore>,
) -> Result<impl Reply, Rejection> {
    info!("Handling call booking request");

    let missing = request.missing_fields();
    if !missing.is_empty() {
        return Err(reject(ApiError::missing_fields(missing)));
    }

    let call = BookedCall {
        id: record_id(),
        name: request.name.unwrap_or_default(),
        phone: request.phone.unwrap_or_default(),
        email: request.email.unwrap_or_default(),
        address: request.address.unwrap_or_default(),
        landmark: request.landmark.unwrap_or_default(),
        solar_system_size: request.solar_system_size.unwrap_or_default(),
        schedule_date: request.schedule_date.unwrap_or_else(Utc::now),
    };

    db.insert_booked_call(call).await.map_err(|e| {
        error!("Error booking call: {}", e);
        reject(ApiError::database_error(e.to_string()))
    })?;

    Ok(warp::reply::json(&json!({
        "message": "Call booked successfully",
    })))
}
