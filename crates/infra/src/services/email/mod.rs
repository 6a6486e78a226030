use super::ChannelError;
use reqwest::Client;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Transactional email sending
#[async_trait::async_trait]
pub trait IEmailSender: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<(), ChannelError>;
}

/// Posts emails to the email-sending endpoint of the academy backend
pub struct HttpEmailSender {
    client: Client,
    endpoint_url: String,
    api_key: Option<String>,
}

impl HttpEmailSender {
    pub fn new(endpoint_url: String, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint_url,
            api_key,
        }
    }
}

#[async_trait::async_trait]
impl IEmailSender for HttpEmailSender {
    async fn send(&self, email: &OutboundEmail) -> Result<(), ChannelError> {
        let mut req = self.client.post(&self.endpoint_url).json(email);
        if let Some(api_key) = &self.api_key {
            req = req.bearer_auth(api_key);
        }
        let res = req
            .send()
            .await
            .map_err(|e| ChannelError::Network(e.without_url().to_string()))?;

        let status = res.status();
        if status.is_success() {
            return Ok(());
        }
        let message = res.text().await.unwrap_or_default();
        Err(ChannelError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

/// Records every email instead of sending it. Addresses marked as failing
/// reject their emails.
pub struct InMemoryEmailSender {
    attempts: Mutex<Vec<OutboundEmail>>,
    failing_addresses: Mutex<HashSet<String>>,
}

impl InMemoryEmailSender {
    pub fn new() -> Self {
        Self {
            attempts: Mutex::new(Vec::new()),
            failing_addresses: Mutex::new(HashSet::new()),
        }
    }

    pub fn fail_address(&self, address: &str) {
        self.failing_addresses
            .lock()
            .unwrap()
            .insert(address.to_string());
    }

    /// Every email handed to this sender, including rejected ones
    pub fn attempts(&self) -> Vec<OutboundEmail> {
        self.attempts.lock().unwrap().clone()
    }
}

impl Default for InMemoryEmailSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IEmailSender for InMemoryEmailSender {
    async fn send(&self, email: &OutboundEmail) -> Result<(), ChannelError> {
        self.attempts.lock().unwrap().push(email.clone());
        if self.failing_addresses.lock().unwrap().contains(&email.to) {
            return Err(ChannelError::Rejected {
                status: 422,
                message: "Invalid recipient".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn email() -> OutboundEmail {
        OutboundEmail {
            to: "student@academy.test".into(),
            subject: "Reminder".into(),
            html: "<p>Hi</p>".into(),
        }
    }

    #[tokio::test]
    async fn it_posts_the_email_with_bearer_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/functions/v1/send-email"))
            .and(header("authorization", "Bearer service-key"))
            .and(body_json(serde_json::json!({
                "to": "student@academy.test",
                "subject": "Reminder",
                "html": "<p>Hi</p>"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let sender = HttpEmailSender::new(
            format!("{}/functions/v1/send-email", server.uri()),
            Some("service-key".into()),
        );
        assert!(sender.send(&email()).await.is_ok());
    }

    #[tokio::test]
    async fn non_success_status_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("smtp down"))
            .mount(&server)
            .await;

        let sender = HttpEmailSender::new(server.uri(), None);
        assert_eq!(
            sender.send(&email()).await,
            Err(ChannelError::Rejected {
                status: 500,
                message: "smtp down".into()
            })
        );
    }
}
