//! In-memory lookup backend
//!
//! Serves a dataset loaded once from JSON. Used by default when no database is
//! configured, and by tests.

use super::{normalize_mobile, LookupStore};
use crate::error::AssistantError;
use crate::models::{order_cards, AadhaarRecord, CardRecord, PanRecord, PersonRecord};
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Full read-only dataset
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub cards: Vec<CardRecord>,
    #[serde(default)]
    pub aadhaar: Vec<AadhaarRecord>,
    #[serde(default)]
    pub pan: Vec<PanRecord>,
    #[serde(default)]
    pub people: Vec<PersonRecord>,
}

pub struct InMemoryLookup {
    dataset: Dataset,
}

impl InMemoryLookup {
    pub fn new(dataset: Dataset) -> Self {
        Self { dataset }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AssistantError::ConfigError(format!("Cannot read dataset {}: {}", path.display(), e))
        })?;
        let dataset: Dataset = serde_json::from_str(&raw)?;

        info!(
            path = %path.display(),
            cards = dataset.cards.len(),
            people = dataset.people.len(),
            "Loaded lookup dataset"
        );

        Ok(Self::new(dataset))
    }

    fn matching_cards<F>(&self, keyword: &str, eligible: F) -> Vec<CardRecord>
    where
        F: Fn(&CardRecord) -> bool,
    {
        let mut cards: Vec<CardRecord> = self
            .dataset
            .cards
            .iter()
            .filter(|card| card.major_benefit.contains(keyword) && eligible(card))
            .cloned()
            .collect();

        order_cards(&mut cards);
        cards
    }

    fn aadhaar(&self, aadhaar: &str) -> Option<&AadhaarRecord> {
        self.dataset.aadhaar.iter().find(|r| r.aadhaar_id == aadhaar)
    }

    fn pan(&self, pan: &str) -> Option<&PanRecord> {
        self.dataset.pan.iter().find(|r| r.pan_id == pan)
    }
}

#[async_trait]
impl LookupStore for InMemoryLookup {
    async fn find_cards_by_benefit(&self, keyword: &str) -> Result<Vec<CardRecord>> {
        Ok(self.matching_cards(keyword, |_| true))
    }

    async fn find_eligible_cards(
        &self,
        keyword: &str,
        cibil: i32,
        annual_income: f64,
    ) -> Result<Vec<CardRecord>> {
        Ok(self.matching_cards(keyword, |card| {
            card.min_cibil <= cibil && card.min_annual_income <= annual_income
        }))
    }

    async fn mobile_for_id(&self, aadhaar: &str) -> Result<Option<String>> {
        Ok(self
            .aadhaar(aadhaar)
            .and_then(|r| r.mobile.as_deref())
            .and_then(normalize_mobile))
    }

    async fn address_for_id(&self, aadhaar: &str) -> Result<Option<String>> {
        Ok(self
            .aadhaar(aadhaar)
            .and_then(|r| r.address.clone())
            .filter(|a| !a.trim().is_empty()))
    }

    async fn cibil_for_tax_id(&self, pan: &str) -> Result<Option<i32>> {
        Ok(self.pan(pan).and_then(|r| r.cibil))
    }

    async fn income_for_tax_id(&self, pan: &str) -> Result<Option<f64>> {
        Ok(self.pan(pan).and_then(|r| r.annual_income))
    }

    async fn verify_identity_triple(&self, name: &str, aadhaar: &str, pan: &str) -> Result<bool> {
        let wanted = name.to_lowercase();
        Ok(self.dataset.people.iter().any(|p| {
            p.name.to_lowercase() == wanted && p.aadhaar_id == aadhaar && p.pan_id == pan
        }))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn card(name: &str, benefit: &str, preferred: bool, min_cibil: i32, min_income: f64) -> CardRecord {
        CardRecord {
            card_name: name.to_string(),
            payment_network: "Visa".to_string(),
            major_benefit: benefit.to_string(),
            joining_fee: Some(500.0),
            annual_fee: Some(500.0),
            reward_method: Some("Points".to_string()),
            fee_waiver: None,
            other_benefits: None,
            preferred_bank: preferred,
            min_cibil,
            min_annual_income: min_income,
        }
    }

    pub fn sample_dataset() -> Dataset {
        Dataset {
            cards: vec![
                card("Zen Travel", "Travel", false, 700, 300000.0),
                card("Atlas Travel", "Travel", false, 800, 900000.0),
                card("HDFC Regalia", "Travel, Lounge", true, 750, 500000.0),
                card("Axis Atlas", "Travel", true, 760, 400000.0),
                card("SBI SimplyCLICK", "Shopping", true, 650, 200000.0),
                card("Basic Travel", "travel", false, 600, 100000.0),
            ],
            aadhaar: vec![
                AadhaarRecord {
                    aadhaar_id: "123456789012".to_string(),
                    mobile: Some("+91 98765 43210".to_string()),
                    address: Some("12 MG Road, Bengaluru".to_string()),
                },
                AadhaarRecord {
                    aadhaar_id: "222222222222".to_string(),
                    mobile: None,
                    address: None,
                },
            ],
            pan: vec![PanRecord {
                pan_id: "ABCDE1234F".to_string(),
                cibil: Some(780),
                annual_income: Some(1200000.0),
            }],
            people: vec![PersonRecord {
                name: "Ravi Kumar".to_string(),
                aadhaar_id: "123456789012".to_string(),
                pan_id: "ABCDE1234F".to_string(),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::sample_dataset;
    use super::*;

    fn lookup() -> InMemoryLookup {
        InMemoryLookup::new(sample_dataset())
    }

    #[tokio::test]
    async fn test_find_cards_by_benefit_is_case_sensitive_and_ordered() {
        let cards = lookup().find_cards_by_benefit("Travel").await.unwrap();
        let names: Vec<&str> = cards.iter().map(|c| c.card_name.as_str()).collect();

        assert_eq!(names, vec!["Axis Atlas", "HDFC Regalia", "Atlas Travel", "Zen Travel"]);
    }

    #[tokio::test]
    async fn test_find_eligible_cards_applies_thresholds() {
        let cards = lookup().find_eligible_cards("Travel", 750, 500000.0).await.unwrap();

        assert!(cards.iter().all(|c| c.min_cibil <= 750 && c.min_annual_income <= 500000.0));
        let names: Vec<&str> = cards.iter().map(|c| c.card_name.as_str()).collect();
        assert_eq!(names, vec!["HDFC Regalia", "Zen Travel"]);
    }

    #[tokio::test]
    async fn test_keyed_lookups_return_none_when_absent() {
        let lookup = lookup();

        assert_eq!(lookup.mobile_for_id("000000000000").await.unwrap(), None);
        assert_eq!(lookup.mobile_for_id("222222222222").await.unwrap(), None);
        assert_eq!(
            lookup.mobile_for_id("123456789012").await.unwrap().as_deref(),
            Some("919876543210")
        );
        assert_eq!(lookup.address_for_id("000000000000").await.unwrap(), None);
        assert_eq!(lookup.cibil_for_tax_id("ZZZZZ9999Z").await.unwrap(), None);
        assert_eq!(lookup.income_for_tax_id("ABCDE1234F").await.unwrap(), Some(1200000.0));
    }

    #[tokio::test]
    async fn test_verify_identity_triple() {
        let lookup = lookup();

        assert!(lookup
            .verify_identity_triple("ravi KUMAR", "123456789012", "ABCDE1234F")
            .await
            .unwrap());
        assert!(!lookup
            .verify_identity_triple("Ravi Kumar", "123456789012", "ABCDE1234G")
            .await
            .unwrap());
    }

    #[test]
    fn test_dataset_deserializes_with_defaults() {
        let raw = r#"{"cards":[{"card_name":"X","payment_network":"Visa","major_benefit":"Fuel","min_cibil":700,"min_annual_income":250000}]}"#;
        let dataset: Dataset = serde_json::from_str(raw).unwrap();

        assert_eq!(dataset.cards.len(), 1);
        assert!(!dataset.cards[0].preferred_bank);
        assert!(dataset.people.is_empty());
    }

    #[tokio::test]
    async fn test_bundled_dataset_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/dataset.json");
        let lookup = InMemoryLookup::from_json_file(path).unwrap();

        let cards = lookup.find_cards_by_benefit("Shopping").await.unwrap();
        assert_eq!(cards.len(), 2);
        assert!(lookup
            .verify_identity_triple("Ravi Kumar", "123456789012", "ABCDE1234F")
            .await
            .unwrap());
    }
}
