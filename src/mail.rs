//! Outbound mail
//!
//! OTP codes and application confirmations leave the system through a
//! `Mailer`. `LogMailer` keeps an in-process outbox for simulation and tests;
//! `HttpMailRelay` posts to an HTTP mail relay.

use crate::error::AssistantError;
use crate::upstream::{call_with_retry, CallPolicy};
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundMail {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// OTP delivery mail for the email channel.
pub fn otp_mail(to: &str, code: &str) -> OutboundMail {
    OutboundMail {
        to: vec![to.to_string()],
        subject: "OTP Verification".to_string(),
        body: format!(
            "The OTP to verify your email account for your Credit Card through Credentic: {}\n\n\
             Thank you for choosing Credentic AI for your Credit Card application.\n\
             This OTP is only valid for the next 5 minutes.\n\n\
             This is an automatically generated message, please do not reply to this email.\n\n\
             Regards,\nCredentic\n",
            code
        ),
    }
}

/// Confirmation sent once the applicant has finished the flow.
pub fn confirmation_mail(to: &str) -> OutboundMail {
    OutboundMail {
        to: vec![to.to_string()],
        subject: "Credit Card Application Confirmation".to_string(),
        body: "Thank you for choosing Credentic AI for your Credit card application. \
               Your application is currently being processed.\n\n\
               Your application will now be handled by the Bank which issues the card you opted for.\n\n\
               This is an automatically generated message, please do not reply to this email.\n\n\
               Regards\nCredentic\n"
            .to_string(),
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &OutboundMail) -> Result<()>;
}

/// Simulated relay: logs each message and keeps it in an outbox.
#[derive(Default)]
pub struct LogMailer {
    outbox: Mutex<Vec<OutboundMail>>,
}

impl LogMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn outbox(&self) -> Vec<OutboundMail> {
        self.outbox.lock().await.clone()
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: &OutboundMail) -> Result<()> {
        info!(to = ?mail.to, subject = %mail.subject, "[SIMULATOR] Mail sent");
        self.outbox.lock().await.push(mail.clone());
        Ok(())
    }
}

/// JSON mail relay client (`{from, to, subject, text}`).
pub struct HttpMailRelay {
    client: Client,
    url: String,
    sender: String,
    token: Option<String>,
    policy: CallPolicy,
}

impl HttpMailRelay {
    pub fn new(url: String, sender: String, token: Option<String>, policy: CallPolicy) -> Result<Self> {
        let client = Client::builder()
            .timeout(policy.timeout)
            .pool_max_idle_per_host(4)
            .build()?;

        Ok(Self {
            client,
            url,
            sender,
            token,
            policy,
        })
    }

    async fn post_once(&self, mail: &OutboundMail) -> Result<()> {
        let mut request = self.client.post(&self.url).json(&json!({
            "from": self.sender,
            "to": mail.to,
            "subject": mail.subject,
            "text": mail.body,
        }));

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AssistantError::from_transport("mail relay", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, "Mail relay rejected message: {}", body);
            return Err(AssistantError::MailError(format!(
                "Mail relay returned {}: {}",
                status, body
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl Mailer for HttpMailRelay {
    async fn send(&self, mail: &OutboundMail) -> Result<()> {
        call_with_retry("mail relay", self.policy, || self.post_once(mail)).await?;
        info!(to = ?mail.to, subject = %mail.subject, "Mail handed to relay");
        Ok(())
    }
}
