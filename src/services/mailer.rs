// src/services/mailer.rs
use anyhow::{bail, Result};
use log::info;
use reqwest::Client;
use serde::Serialize;

use crate::config::AppConfig;

/// Client for the transactional-mail provider's HTTP API.
pub struct Mailer {
    client: Client,
    api_url: String,
    api_key: String,
    from: String,
}

#[derive(Debug, Serialize)]
struct MailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

impl Mailer {
    pub fn new(cfg: &AppConfig) -> Self {
        Mailer {
            client: Client::new(),
            api_url: cfg.mail_api_url.clone(),
            api_key: cfg.mail_api_key.clone(),
            from: cfg.mail_from.clone(),
        }
    }

    pub async fn send(&self, to: &str, subject: &str, text: &str) -> Result<()> {
        if self.api_url.is_empty() {
            bail!("mail provider is not configured (MAIL_API_URL)");
        }
        let body = MailRequest {
            from: &self.from,
            to,
            subject,
            text,
        };
        self.client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        info!("Sent '{}' mail to {}", subject, to);
        Ok(())
    }

    pub async fn send_reset_code(&self, to: &str, code: &str) -> Result<()> {
        let text = format!(
            "Your password reset code is: {}\nThis code will expire in 30 minutes.",
            code
        );
        self.send(to, "Password Reset Code", &text).await
    }
}
