//! Outbound collaborators: transactional email and identity-provider
//! provisioning. Both are HTTP APIs behind trait seams so routes can be
//! tested with mocks and deployments can run without either configured.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("mail API request failed: {0}")]
    Transport(String),
    #[error("mail API rejected the send: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub text: Option<String>,
    pub html: Option<String>,
}

/// Provider acknowledgement for a sent message.
#[derive(Debug, Clone)]
pub struct SendReceipt {
    pub message_id: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &OutgoingEmail) -> Result<SendReceipt, MailError>;
}

/// JSON-over-HTTP mail provider client.
pub struct HttpMailer {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

#[derive(Debug, Deserialize)]
struct MailApiResponse {
    id: String,
}

impl HttpMailer {
    pub fn new(api_url: String, api_key: String, from: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url,
            api_key,
            from,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, mail: &OutgoingEmail) -> Result<SendReceipt, MailError> {
        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.from,
                "to": mail.to,
                "subject": mail.subject,
                "text": mail.text,
                "html": mail.html,
            }))
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected(format!("{status}: {body}")));
        }

        let ack: MailApiResponse = response
            .json()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        Ok(SendReceipt { message_id: ack.id })
    }
}

#[derive(Error, Debug)]
pub enum IdpError {
    #[error("identity provider request failed: {0}")]
    Transport(String),
    #[error("identity provider rejected the request: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProvisionedUser {
    pub user_id: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create a login for the given email; idempotent on the provider side.
    async fn provision_user(
        &self,
        email: &str,
        display_name: &str,
    ) -> Result<ProvisionedUser, IdpError>;

    /// A one-time link the invitee can use to set a password.
    async fn password_set_link(&self, email: &str) -> Result<String, IdpError>;
}

/// Management-API client for the hosted identity provider.
pub struct HttpIdentityProvider {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl HttpIdentityProvider {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url,
            api_key,
        }
    }

    async fn post(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, IdpError> {
        let response = self
            .http
            .post(format!("{}{}", self.api_url.trim_end_matches('/'), path))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| IdpError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(IdpError::Rejected(format!("{status}: {body}")));
        }
        response
            .json()
            .await
            .map_err(|e| IdpError::Transport(e.to_string()))
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn provision_user(
        &self,
        email: &str,
        display_name: &str,
    ) -> Result<ProvisionedUser, IdpError> {
        let value = self
            .post("/users", json!({ "email": email, "name": display_name }))
            .await?;
        serde_json::from_value(value).map_err(|e| IdpError::Transport(e.to_string()))
    }

    async fn password_set_link(&self, email: &str) -> Result<String, IdpError> {
        let value = self
            .post("/password-reset", json!({ "email": email }))
            .await?;
        value
            .get("link")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| IdpError::Transport("response missing 'link'".into()))
    }
}
