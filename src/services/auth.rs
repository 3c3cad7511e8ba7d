// src/services/auth.rs
use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Bearer-token claims: the user id plus issue/expiry instants.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

const TOKEN_LIFETIME_DAYS: i64 = 30;

pub fn create_token(user_id: &str, secret: &str) -> Result<String> {
    let iat = Utc::now();
    let exp = iat + Duration::days(TOKEN_LIFETIME_DAYS);
    let claims = Claims {
        sub: user_id.to_string(),
        iat: iat.timestamp(),
        exp: exp.timestamp(),
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;
    Ok(data.claims)
}
