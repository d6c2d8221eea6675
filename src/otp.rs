//! OTP simulator
//!
//! Two verification channels:
//! - Email: random 6-digit code delivered through the `Mailer`.
//! - Aadhaar: fixed simulator code, "sent" to the Aadhaar-linked mobile.
//!
//! Records are keyed by (session, channel, subject). A new issuance replaces
//! the previous record; stale records are never purged and expiry is checked
//! at read time.

use crate::error::AssistantError;
use crate::lookup::LookupStore;
use crate::mail::{otp_mail, Mailer};
use crate::models::SessionId;
use crate::Result;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::Rng;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Code issued on the Aadhaar channel.
///
/// This is a simulator constant so no SMS gateway is needed. It carries no
/// secrecy whatsoever and must not be used where a real Aadhaar OTP is
/// expected.
pub const SIMULATED_AADHAAR_OTP: &str = "197653";

pub const DEFAULT_OTP_TTL_SECS: i64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OtpChannel {
    Email,
    Aadhaar,
}

impl fmt::Display for OtpChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OtpChannel::Email => "email",
            OtpChannel::Aadhaar => "Aadhaar",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct OtpKey {
    session: SessionId,
    channel: OtpChannel,
    subject: String,
}

#[derive(Debug, Clone)]
pub struct OtpRecord {
    pub code: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Result of a successful issuance.
#[derive(Debug, Clone)]
pub struct IssuedOtp {
    pub code: String,
    pub expires_at: DateTime<Utc>,
    /// Email address or linked mobile number the code went to.
    pub delivered_to: String,
}

/// Why a verification failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpFailure {
    NotFound(OtpChannel),
    Expired,
    Invalid,
}

impl fmt::Display for OtpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OtpFailure::NotFound(channel) => write!(f, "No OTP found for this {}", channel),
            OtpFailure::Expired => write!(f, "OTP expired"),
            OtpFailure::Invalid => write!(f, "Invalid OTP"),
        }
    }
}

/// `{success, error}` view of a verification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OtpReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<std::result::Result<(), OtpFailure>> for OtpReport {
    fn from(outcome: std::result::Result<(), OtpFailure>) -> Self {
        match outcome {
            Ok(()) => Self {
                success: true,
                error: None,
            },
            Err(failure) => Self {
                success: false,
                error: Some(failure.to_string()),
            },
        }
    }
}

pub struct OtpSimulator {
    records: DashMap<OtpKey, OtpRecord>,
    lookup: Arc<dyn LookupStore>,
    mailer: Arc<dyn Mailer>,
    ttl: Duration,
}

impl OtpSimulator {
    pub fn new(lookup: Arc<dyn LookupStore>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            records: DashMap::new(),
            lookup,
            mailer,
            ttl: Duration::seconds(DEFAULT_OTP_TTL_SECS),
        }
    }

    pub fn with_ttl_secs(mut self, secs: i64) -> Self {
        self.ttl = Duration::seconds(secs);
        self
    }

    pub async fn issue_email_otp(&self, session: SessionId, email: &str) -> Result<IssuedOtp> {
        self.issue_email_otp_at(session, email, Utc::now()).await
    }

    /// Store a fresh random code, then deliver it. A failed delivery leaves the
    /// stored record in place.
    pub async fn issue_email_otp_at(
        &self,
        session: SessionId,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedOtp> {
        let code = random_code();
        let expires_at = self.store(session, OtpChannel::Email, email, &code, now);

        if let Err(e) = self.mailer.send(&otp_mail(email, &code)).await {
            warn!(session_id = %session, email, error = %e, "Failed to deliver email OTP");
            return Err(e);
        }

        info!(session_id = %session, email, "[SIMULATOR] Email OTP issued: {}", code);

        Ok(IssuedOtp {
            code,
            expires_at,
            delivered_to: email.to_string(),
        })
    }

    pub async fn issue_aadhaar_otp(&self, session: SessionId, aadhaar: &str) -> Result<IssuedOtp> {
        self.issue_aadhaar_otp_at(session, aadhaar, Utc::now()).await
    }

    /// Requires a linked mobile; without one nothing is stored.
    pub async fn issue_aadhaar_otp_at(
        &self,
        session: SessionId,
        aadhaar: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedOtp> {
        let mobile = self.lookup.mobile_for_id(aadhaar).await?.ok_or_else(|| {
            warn!(session_id = %session, aadhaar, "No mobile linked to Aadhaar");
            AssistantError::NotFound("No mobile linked to Aadhaar".to_string())
        })?;

        let expires_at = self.store(session, OtpChannel::Aadhaar, aadhaar, SIMULATED_AADHAAR_OTP, now);

        info!(
            session_id = %session,
            aadhaar,
            mobile = %mobile,
            "[SIMULATOR] Aadhaar OTP issued: {}",
            SIMULATED_AADHAAR_OTP
        );

        Ok(IssuedOtp {
            code: SIMULATED_AADHAAR_OTP.to_string(),
            expires_at,
            delivered_to: mobile,
        })
    }

    pub fn verify(
        &self,
        session: SessionId,
        channel: OtpChannel,
        subject: &str,
        code: &str,
    ) -> std::result::Result<(), OtpFailure> {
        self.verify_at(session, channel, subject, code, Utc::now())
    }

    /// Expiry is checked before the code, so a correct code past its window
    /// still reports `Expired`. Successful verification does not consume the
    /// record.
    pub fn verify_at(
        &self,
        session: SessionId,
        channel: OtpChannel,
        subject: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> std::result::Result<(), OtpFailure> {
        let key = OtpKey {
            session,
            channel,
            subject: subject.to_string(),
        };

        let record = self.records.get(&key).ok_or(OtpFailure::NotFound(channel))?;

        if now > record.expires_at {
            return Err(OtpFailure::Expired);
        }
        if record.code != code {
            return Err(OtpFailure::Invalid);
        }
        Ok(())
    }

    /// Current record for a subject, if any.
    pub fn record(&self, session: SessionId, channel: OtpChannel, subject: &str) -> Option<OtpRecord> {
        let key = OtpKey {
            session,
            channel,
            subject: subject.to_string(),
        };
        self.records.get(&key).map(|r| r.clone())
    }

    fn store(
        &self,
        session: SessionId,
        channel: OtpChannel,
        subject: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> DateTime<Utc> {
        let expires_at = now + self.ttl;
        self.records.insert(
            OtpKey {
                session,
                channel,
                subject: subject.to_string(),
            },
            OtpRecord {
                code: code.to_string(),
                issued_at: now,
                expires_at,
            },
        );
        expires_at
    }
}

fn random_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}
