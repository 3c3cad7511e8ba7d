// src/handlers/otp.rs
use log::{error, info};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use warp::{Rejection, Reply};

use crate::config::AppConfig;
use crate::handlers::error::{reject, ApiError};
use crate::services::auth::create_token;
use crate::services::db::DocumentStore;
use crate::services::otp::OtpClient;

/// Placeholder credential for accounts created through phone signup; the
/// user is expected to set a real password afterwards.
const PHONE_SIGNUP_PASSWORD: &str = "defaultPassword";

#[derive(Debug, Deserialize)]
pub struct RequestOtpRequest {
    #[serde(default)]
    pub tele: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub tele: String,
    pub otp: String,
}

pub async fn request_signup_otp(
    request: RequestOtpRequest,
    otp: Arc<OtpClient>,
) -> Result<impl Reply, Rejection> {
    let Some(tele) = request.tele.filter(|t| !t.is_empty()) else {
        return Err(reject(ApiError::missing_fields(vec!["tele".to_string()])));
    };
    info!("Requesting signup OTP for {}", tele);

    otp.send_otp(&tele).await.map_err(|e| {
        error!("Error requesting OTP: {}", e);
        reject(ApiError::external_error("Failed to send OTP"))
    })?;

    Ok(warp::reply::json(&json!({
        "message": "OTP sent to your mobile number",
    })))
}

pub async fn signup(
    request: SignupRequest,
    db: Arc<DocumentStore>,
    cfg: Arc<AppConfig>,
    otp: Arc<OtpClient>,
) -> Result<impl Reply, Rejection> {
    info!("Handling phone signup for {}", request.tele);

    let verified = otp
        .verify_otp(&request.tele, &request.otp)
        .await
        .map_err(|e| {
            error!("Error during signup: {}", e);
            reject(ApiError::external_error("Internal server error"))
        })?;
    if !verified {
        return Err(reject(ApiError::validation("Invalid or expired OTP")));
    }

    if db
        .find_user_by_phone(&request.tele)
        .await
        .map_err(|e| reject(ApiError::database_error(e.to_string())))?
        .is_some()
    {
        return Err(reject(ApiError::validation("User already exists")));
    }

    // Phone signups arrive without an email; synthesize a unique one so
    // the email index stays usable.
    let email = format!("{}@phone.local", request.tele.trim_start_matches('+'));
    let user = db
        .create_user(&request.name, &email, &request.tele, PHONE_SIGNUP_PASSWORD)
        .await
        .map_err(|e| {
            error!("Error creating user during signup: {}", e);
            reject(ApiError::database_error(e.to_string()))
        })?;

    let token = create_token(&user.id, &cfg.jwt_secret).map_err(|e| {
        error!("Failed to mint token: {}", e);
        reject(ApiError::internal("Internal server error"))
    })?;

    Ok(warp::reply::json(&json!({
        "token": token,
        "message": "Signup successful",
    })))
}
