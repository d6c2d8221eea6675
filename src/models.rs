//! Core data models for the credit-card assistant

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

//
// ================= Session =================
//

/// Identifies one conversation. Transcripts and OTP records are keyed by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Session used when a caller does not supply one.
    pub fn default_session() -> Self {
        Self::from_client_key("default-session")
    }

    /// Accept a UUID as-is, otherwise derive a stable UUID from the text.
    pub fn from_client_key(key: &str) -> Self {
        if let Ok(uuid) = Uuid::parse_str(key) {
            return Self(uuid);
        }

        let hash = Sha256::digest(key.as_bytes());
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&hash[..16]);

        // Set UUID version (4) and variant (RFC4122) bits.
        bytes[6] = (bytes[6] & 0x0f) | 0x40;
        bytes[8] = (bytes[8] & 0x3f) | 0x80;

        Self(Uuid::from_bytes(bytes))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ================= Cards =================
//

/// Read-only projection of a persisted credit card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardRecord {
    pub card_name: String,
    pub payment_network: String,
    pub major_benefit: String,
    #[serde(default)]
    pub joining_fee: Option<f64>,
    #[serde(default)]
    pub annual_fee: Option<f64>,
    #[serde(default)]
    pub reward_method: Option<String>,
    #[serde(default)]
    pub fee_waiver: Option<String>,
    #[serde(default)]
    pub other_benefits: Option<String>,
    #[serde(default)]
    pub preferred_bank: bool,
    pub min_cibil: i32,
    pub min_annual_income: f64,
}

/// Model-facing view of a card, keyed the way the assistant prompt expects.
#[derive(Debug, Clone, Serialize)]
pub struct CardSummary<'a> {
    #[serde(rename = "Card Name")]
    pub card_name: &'a str,
    #[serde(rename = "Network")]
    pub network: &'a str,
    #[serde(rename = "Joining Fee")]
    pub joining_fee: Option<f64>,
    #[serde(rename = "Annual Fee")]
    pub annual_fee: Option<f64>,
    #[serde(rename = "Reward Type")]
    pub reward_type: &'a str,
    #[serde(rename = "Fee Waiver")]
    pub fee_waiver: &'a str,
    #[serde(rename = "Other Benefits")]
    pub other_benefits: &'a str,
    #[serde(rename = "Preferred Bank")]
    pub preferred_bank: &'static str,
    #[serde(rename = "Min CIBIL")]
    pub min_cibil: i32,
    #[serde(rename = "Min Annual Income")]
    pub min_annual_income: f64,
}

impl<'a> From<&'a CardRecord> for CardSummary<'a> {
    fn from(card: &'a CardRecord) -> Self {
        Self {
            card_name: &card.card_name,
            network: &card.payment_network,
            joining_fee: card.joining_fee,
            annual_fee: card.annual_fee,
            reward_type: card.reward_method.as_deref().unwrap_or("N/A"),
            fee_waiver: card.fee_waiver.as_deref().unwrap_or("N/A"),
            other_benefits: card.other_benefits.as_deref().unwrap_or("N/A"),
            preferred_bank: if card.preferred_bank { "Yes" } else { "No" },
            min_cibil: card.min_cibil,
            min_annual_income: card.min_annual_income,
        }
    }
}

/// Preferred-bank cards first, then alphabetical by name.
pub fn order_cards(cards: &mut [CardRecord]) {
    cards.sort_by(|a, b| {
        b.preferred_bank
            .cmp(&a.preferred_bank)
            .then_with(|| a.card_name.cmp(&b.card_name))
    });
}

//
// ================= Identity =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AadhaarRecord {
    pub aadhaar_id: String,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanRecord {
    pub pan_id: String,
    #[serde(default)]
    pub cibil: Option<i32>,
    #[serde(default)]
    pub annual_income: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonRecord {
    pub name: String,
    pub aadhaar_id: String,
    pub pan_id: String,
}
