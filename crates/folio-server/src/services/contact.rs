// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! The public contact form
//!
//! Every valid message is stored before it is mailed, so a delivery failure
//! loses nothing. The receipt tells the caller whether the mail went out.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::mailer::{contact_email, Mailer};
use crate::services::single_field;
use chrono::Utc;
use folio_api_contract::{collections, ContactMessage, ContactReceipt, ContactSubmission};
use folio_local_db::{Collection, Database};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

pub struct ContactService {
    messages: Collection<ContactSubmission>,
    mailer: Arc<dyn Mailer>,
    from: String,
    to: String,
}

impl ContactService {
    /// Messages go to the configured inbox, or to the admin account without one
    pub fn new(db: &Database, mailer: Arc<dyn Mailer>, config: &ServerConfig) -> Self {
        let to = config
            .mail
            .to
            .clone()
            .filter(|to| !to.is_empty())
            .unwrap_or_else(|| config.admin.email.clone());
        Self {
            messages: db.typed(collections::MESSAGES),
            mailer,
            from: config.mail.from.clone(),
            to,
        }
    }

    pub async fn submit(&self, message: &ContactMessage) -> ServerResult<ContactReceipt> {
        let missing = message.missing_fields();
        if !missing.is_empty() {
            return Err(ServerError::BadRequest(format!(
                "Please fill in all required fields: {}",
                missing.join(", ")
            )));
        }
        message.validate()?;

        let message = ContactMessage {
            first_name: message.first_name.trim().to_string(),
            last_name: message.last_name.trim().to_string(),
            email: message.email.trim().to_string(),
            subject: message.subject.trim().to_string(),
            message: message.message.trim().to_string(),
        };
        let stored = self
            .messages
            .create(&ContactSubmission {
                first_name: message.first_name.clone(),
                last_name: message.last_name.clone(),
                email: message.email.clone(),
                subject: message.subject.clone(),
                message: message.message.clone(),
                delivered: false,
                ..Default::default()
            })
            .await?;

        let email = contact_email(&message, &self.from, &self.to, stored.created_at);
        let delivered = match self.mailer.send(&email).await {
            Ok(()) => {
                info!(id = %stored.id, mailer = self.mailer.name(), "Contact message delivered");
                self.messages
                    .update_document(&stored.id, single_field("delivered", Value::Bool(true)))
                    .await?;
                true
            }
            Err(e) => {
                warn!(id = %stored.id, mailer = self.mailer.name(), error = %e, "Contact message stored but not delivered");
                false
            }
        };

        Ok(ContactReceipt {
            id: stored.id,
            message: if delivered {
                "Message sent successfully".to_string()
            } else {
                "Message received".to_string()
            },
            delivered,
            received_at: Utc::now(),
        })
    }

    /// Stored messages, newest last
    pub async fn list(&self) -> ServerResult<Vec<ContactSubmission>> {
        Ok(self.messages.find_all().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::dependencies::open_database;
    use crate::mailer::{MailError, OutgoingEmail};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tracing_test::traced_test;

    fn database() -> Database {
        open_database(&StorageConfig::in_memory()).unwrap()
    }

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<OutgoingEmail>>,
        fail: bool,
    }

    #[async_trait]
    impl Mailer for Recorder {
        fn name(&self) -> &'static str {
            "recorder"
        }

        async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
            if self.fail {
                return Err(MailError::NotConfigured("offline".into()));
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    fn form() -> ContactMessage {
        ContactMessage {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            subject: "Hello".into(),
            message: "Nice site".into(),
        }
    }

    #[tokio::test]
    async fn valid_message_is_stored_and_mailed() {
        let db = database();
        let recorder = Arc::new(Recorder::default());
        let service = ContactService::new(&db, recorder.clone(), &ServerConfig::default());

        let receipt = service.submit(&form()).await.unwrap();
        assert!(receipt.delivered);

        let sent = recorder.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, vec!["admin@madebywael.com".to_string()]);
        assert_eq!(sent[0].subject, "New Contact: Hello");

        let stored = service.list().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].delivered);
    }

    #[tokio::test]
    #[traced_test]
    async fn delivery_failure_keeps_message() {
        let db = database();
        let recorder = Arc::new(Recorder {
            fail: true,
            ..Default::default()
        });
        let service = ContactService::new(&db, recorder, &ServerConfig::default());

        let receipt = service.submit(&form()).await.unwrap();
        assert!(!receipt.delivered);
        assert!(!service.list().await.unwrap()[0].delivered);
        assert!(logs_contain("Contact message stored but not delivered"));
    }

    #[tokio::test]
    async fn same_sender_can_write_again() {
        let db = database();
        let recorder = Arc::new(Recorder::default());
        let service = ContactService::new(&db, recorder.clone(), &ServerConfig::default());

        service.submit(&form()).await.unwrap();
        let receipt = service
            .submit(&ContactMessage {
                subject: "Following up".into(),
                ..form()
            })
            .await
            .unwrap();
        assert!(receipt.delivered);

        let stored = service.list().await.unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|m| m.email == "ada@example.com"));
        assert_eq!(recorder.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn blank_and_invalid_fields_are_rejected() {
        let db = database();
        let service = ContactService::new(&db, Arc::new(Recorder::default()), &ServerConfig::default());

        let err = service
            .submit(&ContactMessage {
                subject: "  ".into(),
                ..form()
            })
            .await
            .unwrap_err();
        assert_eq!(
            err.to_problem().detail,
            "Please fill in all required fields: Subject"
        );

        let err = service
            .submit(&ContactMessage {
                email: "ada@".into(),
                ..form()
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_problem().detail, "Please enter a valid email address");
        assert!(service.list().await.unwrap().is_empty());
    }
}
