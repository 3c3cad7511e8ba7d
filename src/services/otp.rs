// src/services/otp.rs
use anyhow::{bail, Result};
use log::warn;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

/// Client for the phone-verification vendor.
///
/// The vendor exposes `POST <base>/send-otp` and `POST <base>/verify-otp`,
/// both keyed by an `Authorization` header and answering with a success
/// flag.
pub struct OtpClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendOtpRequest<'a> {
    phone_number: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyOtpRequest<'a> {
    phone_number: &'a str,
    otp: &'a str,
}

#[derive(Debug, Deserialize)]
struct VendorResponse {
    success: bool,
    #[serde(default)]
    message: Option<String>,
}

impl OtpClient {
    pub fn new(cfg: &AppConfig) -> Self {
        OtpClient {
            client: Client::new(),
            base_url: cfg.otp_api_url.trim_end_matches('/').to_string(),
            api_key: cfg.otp_api_key.clone(),
        }
    }

    pub async fn send_otp(&self, phone_number: &str) -> Result<()> {
        let response: VendorResponse = self
            .client
            .post(format!("{}/send-otp", self.base_url))
            .header("Authorization", &self.api_key)
            .json(&SendOtpRequest { phone_number })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if !response.success {
            warn!(
                "OTP vendor refused send-otp: {}",
                response.message.as_deref().unwrap_or("no detail")
            );
            bail!("OTP vendor refused the request");
        }
        Ok(())
    }

    /// Check an OTP the user typed in. `Ok(false)` means the vendor
    /// answered but judged the code invalid or expired.
    pub async fn verify_otp(&self, phone_number: &str, otp: &str) -> Result<bool> {
        let response: VendorResponse = self
            .client
            .post(format!("{}/verify-otp", self.base_url))
            .header("Authorization", &self.api_key)
            .json(&VerifyOtpRequest { phone_number, otp })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.success)
    }
}
