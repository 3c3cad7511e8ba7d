// src/handlers/quote.rs
use chrono::Utc;
use log::{error, info};
use serde::{Deserialize, Deserializer};
use serde_json::json;
use std::sync::Arc;
use warp::{Rejection, Reply};

use crate::config::AppConfig;
use crate::handlers::error::{reject, ApiError};
use crate::models::StoredQuote;
use crate::services::db::DocumentStore;
use crate::services::quote::{calculate_quote, AreaUnit, QuoteInput};

/// Accept both JSON numbers and string-encoded numbers; unparseable text
/// counts as absent so it lands in the missing-field report.
fn flexible_f64<'de, D>(de: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Text(String),
    }
    Ok(match Option::<Raw>::deserialize(de)? {
        None => None,
        Some(Raw::Num(n)) => Some(n),
        Some(Raw::Text(s)) => s.trim().parse().ok(),
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    #[serde(default)]
    pub connection_type: Option<String>,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub contract_load: Option<f64>,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub monthly_units: Option<f64>,
    #[serde(default)]
    pub selected_city: Option<String>,
    #[serde(default, deserialize_with = "flexible_f64")]
    pub roof_area: Option<f64>,
    #[serde(default)]
    pub area_unit: Option<String>,
}

impl QuoteRequest {
    /// Truthiness check matching the wire contract: absent, empty, or zero
    /// fields are "missing". `areaUnit` is optional by design.
    pub fn missing_fields(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.connection_type.as_deref().unwrap_or("").is_empty() {
            missing.push("connectionType".to_string());
        }
        if self.contract_load.unwrap_or(0.0) == 0.0 {
            missing.push("contractLoad".to_string());
        }
        if self.monthly_units.unwrap_or(0.0) == 0.0 {
            missing.push("monthlyUnits".to_string());
        }
        if self.selected_city.as_deref().unwrap_or("").is_empty() {
            missing.push("selectedCity".to_string());
        }
        if self.roof_area.unwrap_or(0.0) == 0.0 {
            missing.push("roofArea".to_string());
        }
        missing
    }

    fn into_input(self) -> QuoteInput {
        QuoteInput {
            connection_type: self.connection_type.unwrap_or_default(),
            contract_load: self.contract_load.unwrap_or_default(),
            monthly_units: self.monthly_units.unwrap_or_default(),
            selected_city: self.selected_city.unwrap_or_default(),
            roof_area: self.roof_area.unwrap_or_default(),
            area_unit: AreaUnit::parse(self.area_unit.as_deref()),
        }
    }
}

pub async fn calculate_solar_quote(
    user_id: String,
    request: QuoteRequest,
    db: Arc<DocumentStore>,
    cfg: Arc<AppConfig>,
) -> Result<impl Reply, Rejection> {
    info!("Handling solar quote calculation for user {}", user_id);

    let missing = request.missing_fields();
    if !missing.is_empty() {
        return Err(reject(ApiError::missing_fields(missing)));
    }

    let input = request.into_input();
    let estimate = calculate_quote(&input, &cfg.assumptions)
        .map_err(|e| reject(ApiError::validation(e.to_string())))?;

    if db
        .get_user(&user_id)
        .await
        .map_err(|e| {
            error!("Database error: {}", e);
            reject(ApiError::database_error(e.to_string()))
        })?
        .is_none()
    {
        return Err(reject(ApiError::not_found("User not found")));
    }

    let stored = StoredQuote {
        estimate: estimate.clone(),
        created_at: Utc::now(),
    };
    db.push_quote(&user_id, stored).await.map_err(|e| {
        error!("Failed to store quote for user {}: {}", user_id, e);
        reject(ApiError::database_error(e.to_string()))
    })?;

    Ok(warp::reply::json(&json!({
        "success": true,
        "message": "Solar quote calculated successfully",
        "data": estimate,
    })))
}

pub async fn get_solar_quotes(
    user_id: String,
    db: Arc<DocumentStore>,
) -> Result<impl Reply, Rejection> {
    info!("Fetching quote history for user {}", user_id);

    if db
        .get_user(&user_id)
        .await
        .map_err(|e| reject(ApiError::database_error(e.to_string())))?
        .is_none()
    {
        return Err(reject(ApiError::not_found("User not found")));
    }

    let quotes = db
        .get_quotes(&user_id)
        .await
        .map_err(|e| reject(ApiError::database_error(e.to_string())))?;

    Ok(warp::reply::json(&json!({
        "success": true,
        "data": quotes,
    })))
}
