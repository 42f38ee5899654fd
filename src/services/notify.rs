//! Best-effort e-mail notification for contact submissions.
//!
//! Delivery goes through an HTTP relay webhook. The send runs in a spawned
//! task and every failure is logged and swallowed — a dead relay must never
//! fail the submission that triggered it.

use crate::domain::models::Contact;
use std::time::Duration;

pub struct Notifier {
    client: reqwest::Client,
    webhook_url: String,
    recipient: String,
}

impl Notifier {
    /// Returns `None` when no webhook is configured, which disables
    /// notifications entirely.
    pub fn from_config(webhook_url: Option<&str>, recipient: Option<&str>) -> Option<Self> {
        let webhook_url = webhook_url?.to_string();
        let recipient = recipient.unwrap_or("site-owner").to_string();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .ok()?;
        Some(Self {
            client,
            webhook_url,
            recipient,
        })
    }

    pub async fn send_contact_alert(&self, contact: &Contact) {
        let body = serde_json::json!({
            "to": self.recipient,
            "subject": format!("New training inquiry from {}", contact.name),
            "text": format!(
                "Name: {}\nEmail: {}\nPhone: {}\nCourse: {}\nMessage: {}\nReceived: {}",
                contact.name,
                contact.email,
                contact.phone,
                contact.course,
                contact.message,
                contact.timestamp.to_rfc3339(),
            ),
        });

        match self.client.post(&self.webhook_url).json(&body).send().await {
            Ok(resp) if resp.status().is_success() => {
                tracing::debug!("Contact notification sent for {}", contact.id);
            }
            Ok(resp) => {
                tracing::warn!(
                    "Contact notification relay returned {} for {}",
                    resp.status(),
                    contact.id
                );
            }
            Err(e) => {
                tracing::warn!("Failed to send contact notification for {}: {}", contact.id, e);
            }
        }
    }
}
