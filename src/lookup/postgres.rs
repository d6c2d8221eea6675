//! Postgres lookup backend (schema in `sql/schema.sql`)

use super::{normalize_mobile, LookupStore};
use crate::error::AssistantError;
use crate::models::CardRecord;
use crate::Result;
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{debug, info};

const CARD_COLUMNS: &str = r#"
    card_name, payment_network, major_benefit,
    joining_fee::float8 AS joining_fee, annual_fee::float8 AS annual_fee,
    reward_method, fee_waiver, other_benefits, preferred_bank,
    min_cibil, min_annual_income::float8 AS min_annual_income
"#;

/// Byte-order name sort, matching the in-memory backend.
const CARD_ORDER: &str = r#"ORDER BY CASE WHEN preferred_bank THEN 1 ELSE 2 END, card_name COLLATE "C""#;

fn benefit_query() -> String {
    format!(
        "SELECT {} FROM credit_cards WHERE major_benefit LIKE $1 {}",
        CARD_COLUMNS, CARD_ORDER
    )
}

fn eligible_query() -> String {
    format!(
        "SELECT {} FROM credit_cards \
         WHERE major_benefit LIKE $1 AND min_cibil <= $2 AND min_annual_income <= $3 {}",
        CARD_COLUMNS, CARD_ORDER
    )
}

pub struct PgLookup {
    pool: PgPool,
}

impl PgLookup {
    /// Build a lazily-connecting pool; the first query opens connections.
    pub fn connect_lazy(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_lazy(database_url)
            .map_err(|e| {
                AssistantError::DatabaseError(format!("Failed to configure postgres pool: {}", e))
            })?;

        info!("Lookup backend: postgres");
        Ok(Self { pool })
    }

    fn card_from_row(row: &PgRow) -> Result<CardRecord> {
        let map = |e: sqlx::Error| AssistantError::DatabaseError(format!("Bad card row: {}", e));

        Ok(CardRecord {
            card_name: row.try_get("card_name").map_err(map)?,
            payment_network: row.try_get("payment_network").map_err(map)?,
            major_benefit: row.try_get("major_benefit").map_err(map)?,
            joining_fee: row.try_get("joining_fee").map_err(map)?,
            annual_fee: row.try_get("annual_fee").map_err(map)?,
            reward_method: row.try_get("reward_method").map_err(map)?,
            fee_waiver: row.try_get("fee_waiver").map_err(map)?,
            other_benefits: row.try_get("other_benefits").map_err(map)?,
            preferred_bank: row.try_get("preferred_bank").map_err(map)?,
            min_cibil: row.try_get("min_cibil").map_err(map)?,
            min_annual_income: row.try_get("min_annual_income").map_err(map)?,
        })
    }

    fn query_failed(what: &str) -> impl Fn(sqlx::Error) -> AssistantError + '_ {
        move |e| AssistantError::DatabaseError(format!("Failed to {}: {}", what, e))
    }
}

/// `%keyword%` with LIKE metacharacters in the keyword escaped.
pub(crate) fn like_pattern(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len() + 2);
    escaped.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl LookupStore for PgLookup {
    async fn find_cards_by_benefit(&self, keyword: &str) -> Result<Vec<CardRecord>> {
        let sql = benefit_query();

        let rows = sqlx::query(&sql)
            .bind(like_pattern(keyword))
            .fetch_all(&self.pool)
            .await
            .map_err(Self::query_failed("search credit cards"))?;

        debug!(keyword, rows = rows.len(), "Card search");
        rows.iter().map(Self::card_from_row).collect()
    }

    async fn find_eligible_cards(
        &self,
        keyword: &str,
        cibil: i32,
        annual_income: f64,
    ) -> Result<Vec<CardRecord>> {
        let sql = eligible_query();

        let rows = sqlx::query(&sql)
            .bind(like_pattern(keyword))
            .bind(cibil)
            .bind(annual_income)
            .fetch_all(&self.pool)
            .await
            .map_err(Self::query_failed("search eligible cards"))?;

        debug!(keyword, cibil, annual_income, rows = rows.len(), "Eligible card search");
        rows.iter().map(Self::card_from_row).collect()
    }

    async fn mobile_for_id(&self, aadhaar: &str) -> Result<Option<String>> {
        let mobile: Option<Option<String>> =
            sqlx::query_scalar("SELECT mobile FROM aadhaar WHERE aadhaar_id = $1 LIMIT 1")
                .bind(aadhaar)
                .fetch_optional(&self.pool)
                .await
                .map_err(Self::query_failed("look up mobile"))?;

        Ok(mobile.flatten().as_deref().and_then(normalize_mobile))
    }

    async fn address_for_id(&self, aadhaar: &str) -> Result<Option<String>> {
        let address: Option<Option<String>> =
            sqlx::query_scalar("SELECT address FROM aadhaar WHERE aadhaar_id = $1 LIMIT 1")
                .bind(aadhaar)
                .fetch_optional(&self.pool)
                .await
                .map_err(Self::query_failed("look up address"))?;

        Ok(address.flatten().filter(|a| !a.trim().is_empty()))
    }

    async fn cibil_for_tax_id(&self, pan: &str) -> Result<Option<i32>> {
        let cibil: Option<Option<i32>> =
            sqlx::query_scalar("SELECT cibil FROM pan WHERE pan_id = $1 LIMIT 1")
                .bind(pan)
                .fetch_optional(&self.pool)
                .await
                .map_err(Self::query_failed("look up CIBIL"))?;

        Ok(cibil.flatten())
    }

    async fn income_for_tax_id(&self, pan: &str) -> Result<Option<f64>> {
        let income: Option<Option<f64>> = sqlx::query_scalar(
            "SELECT annual_income::float8 FROM pan WHERE pan_id = $1 LIMIT 1",
        )
        .bind(pan)
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::query_failed("look up income"))?;

        Ok(income.flatten())
    }

    async fn verify_identity_triple(&self, name: &str, aadhaar: &str, pan: &str) -> Result<bool> {
        let found: Option<i32> = sqlx::query_scalar(
            "SELECT 1 FROM people WHERE LOWER(name) = LOWER($1) AND aadhaar_id = $2 AND pan_id = $3 LIMIT 1",
        )
        .bind(name)
        .bind(aadhaar)
        .bind(pan)
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::query_failed("verify identity"))?;

        Ok(found.is_some())
    }
}
