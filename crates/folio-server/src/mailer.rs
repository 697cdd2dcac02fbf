// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Outgoing mail for contact form messages

use crate::config::{MailConfig, MailProvider};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use folio_api_contract::ContactMessage;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Mail provider rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Mail delivery is not configured: {0}")]
    NotConfigured(String),
}

/// A rendered message ready for delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub reply_to: Option<String>,
    pub subject: String,
    pub html: String,
}

/// Delivers rendered messages
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Short provider name for logs
    fn name(&self) -> &'static str;

    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;
}

/// Writes messages to the log instead of sending them
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        info!(
            to = ?email.to,
            reply_to = ?email.reply_to,
            subject = %email.subject,
            "Contact message received (log mailer)"
        );
        debug!(html = %email.html, "Rendered contact message");
        Ok(())
    }
}

/// Sends through the Resend HTTP API
#[derive(Debug, Clone)]
pub struct ResendMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl ResendMailer {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, MailError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("folio-server/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(15))
            .build()?;
        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    fn name(&self) -> &'static str {
        "resend"
    }

    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(email)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        debug!(status = status.as_u16(), "Resend accepted the message");
        Ok(())
    }
}

/// Build the mailer selected by configuration
pub fn build_mailer(config: &MailConfig) -> Result<Arc<dyn Mailer>, MailError> {
    match config.provider {
        MailProvider::Log => Ok(Arc::new(LogMailer)),
        MailProvider::Resend => {
            let api_key = config
                .resend_api_key
                .clone()
                .filter(|key| !key.is_empty())
                .ok_or_else(|| MailError::NotConfigured("RESEND_API_KEY is not set".to_string()))?;
            if config.to.as_deref().map_or(true, str::is_empty) {
                return Err(MailError::NotConfigured("MY_EMAIL is not set".to_string()));
            }
            Ok(Arc::new(ResendMailer::new(config.resend_api_url.clone(), api_key)?))
        }
    }
}

fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Render the notification for a contact form message
///
/// The sender becomes the reply-to address so the owner can answer directly.
pub fn contact_email(
    message: &ContactMessage,
    from: &str,
    to: &str,
    received_at: DateTime<Utc>,
) -> OutgoingEmail {
    let first_name = escape_html(message.first_name.trim());
    let last_name = escape_html(message.last_name.trim());
    let email = escape_html(message.email.trim());
    let subject = escape_html(message.subject.trim());
    let body = escape_html(message.message.trim()).replace('\n', "<br>");
    let date = received_at.format("%B %-d, %Y %H:%M UTC");

    let html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <title>New Contact Form Message</title>
</head>
<body style="margin: 0; padding: 0; font-family: sans-serif; background-color: #0a0a0a;">
  <div style="max-width: 600px; margin: 0 auto; background-color: #1a1a1a; color: #e5e5e5;">
    <div style="background-color: rgb(21, 128, 61); padding: 32px; text-align: center;">
      <h1 style="color: #ffffff; margin: 0;">New Contact Message</h1>
      <p style="margin: 8px 0 0 0;">You have received a new message from your portfolio website</p>
    </div>
    <div style="padding: 32px;">
      <p><strong>Name:</strong> {first_name} {last_name}</p>
      <p><strong>Email:</strong> <a href="mailto:{email}" style="color: #e5e5e5;">{email}</a></p>
      <p><strong>Subject:</strong> {subject}</p>
      <h3 style="color: #ffffff;">Message</h3>
      <div style="background-color: #2a2a2a; border-radius: 8px; padding: 20px;">{body}</div>
      <p style="text-align: center; margin-top: 24px;">
        <a href="mailto:{email}" style="color: #ffffff;">Reply to {first_name}</a>
      </p>
    </div>
    <div style="background-color: #000000; padding: 16px; text-align: center; font-size: 12px;">
      <p style="margin: 0;">This message was sent from your portfolio contact form</p>
      <p style="margin: 4px 0 0 0;">{date}</p>
    </div>
  </div>
</body>
</html>
"#
    );

    OutgoingEmail {
        from: from.to_string(),
        to: vec![to.to_string()],
        reply_to: Some(message.email.trim().to_string()),
        subject: format!("New Contact: {}", message.subject.trim()),
        html,
    }
}
