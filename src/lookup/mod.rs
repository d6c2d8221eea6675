//! Identity & financial lookup service
//!
//! Read-only, keyed projections over the card / identity dataset.
//! Absence is reported as `None` (or `false`), never as an error; errors are
//! reserved for backend failures.

use crate::models::CardRecord;
use crate::Result;
use async_trait::async_trait;

pub mod memory;
pub mod postgres;

pub use memory::{Dataset, InMemoryLookup};
pub use postgres::PgLookup;

/// Trait for card and identity lookups
#[async_trait]
pub trait LookupStore: Send + Sync {
    /// Cards whose major benefit contains `keyword` (case-sensitive),
    /// preferred-bank cards first, then by name.
    async fn find_cards_by_benefit(&self, keyword: &str) -> Result<Vec<CardRecord>>;

    /// As `find_cards_by_benefit`, restricted to cards whose minimum CIBIL and
    /// minimum annual income do not exceed the applicant's.
    async fn find_eligible_cards(
        &self,
        keyword: &str,
        cibil: i32,
        annual_income: f64,
    ) -> Result<Vec<CardRecord>>;

    /// Digits-only mobile number linked to an Aadhaar number.
    async fn mobile_for_id(&self, aadhaar: &str) -> Result<Option<String>>;

    async fn address_for_id(&self, aadhaar: &str) -> Result<Option<String>>;

    async fn cibil_for_tax_id(&self, pan: &str) -> Result<Option<i32>>;

    async fn income_for_tax_id(&self, pan: &str) -> Result<Option<f64>>;

    /// Case-insensitive name match combined with exact Aadhaar and PAN match.
    async fn verify_identity_triple(&self, name: &str, aadhaar: &str, pan: &str) -> Result<bool>;
}

/// Reduce a stored mobile value to its digits; empty means "no mobile".
pub(crate) fn normalize_mobile(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}
