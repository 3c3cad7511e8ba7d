// src/handlers/auth.rs
use chrono::{Duration, Utc};
use log::{error, info};
use rand::Rng;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use warp::{Rejection, Reply};

use crate::config::AppConfig;
use crate::handlers::error::{reject, ApiError};
use crate::services::auth::create_token;
use crate::services::db::DocumentStore;
use crate::services::mailer::Mailer;

const RESET_CODE_LIFETIME_MINUTES: i64 = 30;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub tele: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub tele: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RequestResetRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub reset_code: String,
    pub new_password: String,
}

pub async fn register(
    request: RegisterRequest,
    db: Arc<DocumentStore>,
) -> Result<impl Reply, Rejection> {
    info!("Handling user registration for {}", request.email);

    db.create_user(&request.name, &request.email, &request.tele, &request.password)
        .await
        .map_err(|e| {
            error!("Error registering user: {}", e);
            reject(ApiError::validation(e.to_string()))
        })?;

    Ok(warp::reply::json(&json!({
        "message": "User registered successfully",
    })))
}

pub async fn login(
    request: LoginRequest,
    db: Arc<DocumentStore>,
    cfg: Arc<AppConfig>,
) -> Result<impl Reply, Rejection> {
    let (Some(email), Some(password)) = (request.email, request.password) else {
        return Err(reject(ApiError::validation(
            "Email and Password are required",
        )));
    };
    info!("Handling login for {}", email);

    let user = db
        .find_user_by_email(&email)
        .await
        .map_err(|e| reject(ApiError::database_error(e.to_string())))?
        .ok_or_else(|| reject(ApiError::not_found("User not Found")))?;

    if user.password != password {
        return Err(reject(ApiError::unauthorized("Invalid Password!")));
    }

    let token = create_token(&user.id, &cfg.jwt_secret).map_err(|e| {
        error!("Failed to mint token: {}", e);
        reject(ApiError::internal("Internal server error"))
    })?;

    Ok(warp::reply::json(&json!({ "token": token })))
}

pub async fn get_user(user_id: String, db: Arc<DocumentStore>) -> Result<impl Reply, Rejection> {
    let user = db
        .get_user(&user_id)
        .await
        .map_err(|e| reject(ApiError::database_error(e.to_string())))?
        .ok_or_else(|| reject(ApiError::not_found("User not found")))?;

    Ok(warp::reply::json(&json!({
        "name": user.name,
        "email": user.email,
        "tele": user.tele,
    })))
}

pub async fn update_user(
    user_id: String,
    request: UpdateUserRequest,
    db: Arc<DocumentStore>,
) -> Result<impl Reply, Rejection> {
    info!("Updating profile for user {}", user_id);

    let mut user = db
        .get_user(&user_id)
        .await
        .map_err(|e| reject(ApiError::database_error(e.to_string())))?
        .ok_or_else(|| reject(ApiError::not_found("User not found")))?;

    if let Some(name) = request.name {
        user.name = name;
    }
    if let Some(email) = request.email {
        user.email = email;
    }
    if let Some(tele) = request.tele {
        user.tele = tele;
    }
    if let Some(password) = request.password {
        user.password = password;
    }

    db.update_user(&user)
        .await
        .map_err(|e| reject(ApiError::database_error(e.to_string())))?;

    Ok(warp::reply::json(&json!({
        "message": "User updated successfully",
    })))
}

pub async fn request_reset_password(
    request: RequestResetRequest,
    db: Arc<DocumentStore>,
    mailer: Arc<Mailer>,
) -> Result<impl Reply, Rejection> {
    info!("Handling password reset request for {}", request.email);

    let mut user = db
        .find_user_by_email(&request.email)
        .await
        .map_err(|e| reject(ApiError::database_error(e.to_string())))?
        .ok_or_else(|| reject(ApiError::not_found("User not found")))?;

    let reset_code = rand::thread_rng().gen_range(100_000..1_000_000).to_string();
    user.reset_code = Some(reset_code.clone());
    user.reset_code_expiry = Some(Utc::now() + Duration::minutes(RESET_CODE_LIFETIME_MINUTES));
    db.update_user(&user)
        .await
        .map_err(|e| reject(ApiError::database_error(e.to_string())))?;

    mailer
        .send_reset_code(&user.email, &reset_code)
        .await
        .map_err(|e| {
            error!("Email error: {}", e);
            reject(ApiError::external_error("Error sending email"))
        })?;

    Ok(warp::reply::json(&json!({
        "message": "Reset code sent to email",
    })))
}

pub async fn reset_password(
    request: ResetPasswordRequest,
    db: Arc<DocumentStore>,
) -> Result<impl Reply, Rejection> {
    info!("Handling password reset for {}", request.email);

    let mut user = db
        .find_user_by_email(&request.email)
        .await
        .map_err(|e| reject(ApiError::database_error(e.to_string())))?
        .ok_or_else(|| reject(ApiError::not_found("User not found")))?;

    if user.reset_code.as_deref() != Some(request.reset_code.as_str()) {
        return Err(reject(ApiError::validation("Invalid reset code")));
    }
    if matches!(user.reset_code_expiry, Some(expiry) if expiry < Utc::now()) {
        return Err(reject(ApiError::validation("Reset code has expired")));
    }

    user.password = request.new_password;
    user.reset_code = None;
    user.reset_code_expiry = None;
    db.update_user(&user)
        .await
        .map_err(|e| reject(ApiError::database_error(e.to_string())))?;

    Ok(warp::reply::json(&json!({
        "message": "Password reset successful",
    })))
}
