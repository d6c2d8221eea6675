//! Card search tools

use super::{ParamKind, ParamSpec, Tool, ToolArgs, ToolContext};
use crate::lookup::LookupStore;
use crate::models::{CardRecord, CardSummary};
use crate::Result;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::info;

const PREFERRED_BANKS: &str = "HDFC, Axis, ICICI, SBI, Standard Chartered, or American Express";

fn dataset_json(cards: &[CardRecord]) -> Result<String> {
    let summaries: Vec<CardSummary<'_>> = cards.iter().map(CardSummary::from).collect();
    Ok(serde_json::to_string(&summaries)?)
}

/// Lowest annual fee first, then lowest joining fee. Unknown fees rank last.
fn rank_by_fees(cards: &mut [CardRecord]) {
    fn fee_cmp(a: Option<f64>, b: Option<f64>) -> Ordering {
        match (a, b) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    cards.sort_by(|a, b| {
        fee_cmp(a.annual_fee, b.annual_fee).then_with(|| fee_cmp(a.joining_fee, b.joining_fee))
    });
}

fn format_rupees(amount: f64) -> String {
    let whole = amount.round() as i64;
    let digits = whole.abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if whole < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

pub struct GetCreditCardsTool {
    lookup: Arc<dyn LookupStore>,
}

impl GetCreditCardsTool {
    pub fn new(lookup: Arc<dyn LookupStore>) -> Self {
        Self { lookup }
    }
}

const CREDIT_CARD_PARAMS: &[ParamSpec] = &[ParamSpec::required(
    "keyword_name",
    ParamKind::String,
    "Benefit category to search for, e.g. Travel, Shopping, Fuel",
)];

#[async_trait::async_trait]
impl Tool for GetCreditCardsTool {
    fn name(&self) -> &'static str {
        "GetCreditCards"
    }

    fn description(&self) -> &'static str {
        "Get Credit cards based on benefit type"
    }

    fn parameters(&self) -> &'static [ParamSpec] {
        CREDIT_CARD_PARAMS
    }

    async fn execute(&self, _ctx: &ToolContext, args: &ToolArgs) -> Result<String> {
        let keyword = args.text("keyword_name").unwrap_or_default();
        let cards = self.lookup.find_cards_by_benefit(&keyword).await?;

        info!(keyword = %keyword, count = cards.len(), "Credit card search");

        if cards.is_empty() {
            return Ok(format!(
                "No credit cards found matching: {}. Please try another benefit type.",
                keyword
            ));
        }

        Ok(format!(
            "Fetched {} credit cards for '{}' benefits. Use this dataset to display the top 5 cards, \
             preferring those from {}. If user asks for more, you can display additional ones.\n\n\
             Credit Card Dataset:\n{}",
            cards.len(),
            keyword,
            PREFERRED_BANKS,
            dataset_json(&cards)?
        ))
    }
}

pub struct GetValidCardsTool {
    lookup: Arc<dyn LookupStore>,
}

impl GetValidCardsTool {
    pub fn new(lookup: Arc<dyn LookupStore>) -> Self {
        Self { lookup }
    }
}

const VALID_CARD_PARAMS: &[ParamSpec] = &[
    ParamSpec::required("salary", ParamKind::Number, "Applicant's annual income in rupees"),
    ParamSpec::required("cibil", ParamKind::Integer, "Applicant's CIBIL score"),
    ParamSpec::required("major_keyword", ParamKind::String, "Benefit category to search for"),
];

#[async_trait::async_trait]
impl Tool for GetValidCardsTool {
    fn name(&self) -> &'static str {
        "GetValidCards"
    }

    fn description(&self) -> &'static str {
        "Get credit cards matching user CIBIL and salary"
    }

    fn parameters(&self) -> &'static [ParamSpec] {
        VALID_CARD_PARAMS
    }

    async fn execute(&self, _ctx: &ToolContext, args: &ToolArgs) -> Result<String> {
        let keyword = args.text("major_keyword").unwrap_or_default();

        let Some(salary) = args.number("salary").filter(|s| s.is_finite() && *s >= 0.0) else {
            return Ok("Invalid salary. Please provide the annual income as a number.".to_string());
        };
        let Some(cibil) = args.integer("cibil").and_then(|c| i32::try_from(c).ok()) else {
            return Ok("Invalid CIBIL score. Please provide a whole number such as 750.".to_string());
        };

        let mut cards = self.lookup.find_eligible_cards(&keyword, cibil, salary).await?;

        info!(keyword = %keyword, cibil, salary, count = cards.len(), "Eligible card search");

        if cards.is_empty() {
            return Ok(format!(
                "No credit cards found matching: {}. Please try another benefit type.",
                keyword
            ));
        }

        rank_by_fees(&mut cards);

        Ok(format!(
            "Fetched {} valid credit cards for '{}' benefits (CIBIL: {}, Salary: ₹{}). \
             Use this dataset to display the most suitable cards, prioritizing those from {}. \
             If user asks for more, show additional ones.\n\n\
             Valid Credit Card Dataset:\n{}",
            cards.len(),
            keyword,
            cibil,
            format_rupees(salary),
            PREFERRED_BANKS,
            dataset_json(&cards)?
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::memory::fixtures::{card, sample_dataset};
    use crate::lookup::InMemoryLookup;
    use crate::tools::testing::ctx;
    use serde_json::json;

    fn args(value: serde_json::Value) -> ToolArgs {
        ToolArgs::new(value.as_object().cloned().unwrap())
    }

    fn lookup() -> Arc<dyn LookupStore> {
        Arc::new(InMemoryLookup::new(sample_dataset()))
    }

    #[test]
    fn test_rank_by_fees_unknown_last() {
        let mut a = card("A", "Travel", false, 700, 0.0);
        a.annual_fee = None;
        let mut b = card("B", "Travel", false, 700, 0.0);
        b.annual_fee = Some(0.0);
        let mut c = card("C", "Travel", false, 700, 0.0);
        c.annual_fee = Some(0.0);
        c.joining_fee = Some(0.0);

        let mut cards = vec![a, b, c];
        rank_by_fees(&mut cards);

        let names: Vec<&str> = cards.iter().map(|c| c.card_name.as_str()).collect();
        assert_eq!(names, vec!["C", "B", "A"]);
    }

    #[test]
    fn test_format_rupees() {
        assert_eq!(format_rupees(500000.0), "500,000");
        assert_eq!(format_rupees(999.4), "999");
        assert_eq!(format_rupees(1234567.0), "1,234,567");
    }

    #[tokio::test]
    async fn test_get_credit_cards_lists_dataset() {
        let tool = GetCreditCardsTool::new(lookup());
        let out = tool.execute(&ctx(), &args(json!({"keyword_name": "Shopping"}))).await.unwrap();

        assert!(out.starts_with("Fetched 1 credit cards for 'Shopping' benefits."));
        assert!(out.contains("\"Card Name\":\"SBI SimplyCLICK\""));
    }

    #[tokio::test]
    async fn test_get_credit_cards_empty() {
        let tool = GetCreditCardsTool::new(lookup());
        let out = tool.execute(&ctx(), &args(json!({"keyword_name": "Fuel"}))).await.unwrap();

        assert_eq!(out, "No credit cards found matching: Fuel. Please try another benefit type.");
    }

    #[tokio::test]
    async fn test_get_valid_cards_filters_and_coerces() {
        let tool = GetValidCardsTool::new(lookup());
        let out = tool
            .execute(
                &ctx(),
                &args(json!({"salary": "500000", "cibil": 750, "major_keyword": "Travel"})),
            )
            .await
            .unwrap();

        assert!(out.starts_with("Fetched 2 valid credit cards for 'Travel' benefits (CIBIL: 750, Salary: ₹500,000)."));
        assert!(out.contains("HDFC Regalia"));
        assert!(out.contains("Zen Travel"));
        assert!(!out.contains("Axis Atlas"));
    }

    #[tokio::test]
    async fn test_get_valid_cards_reads_rupee_prefixed_salary() {
        let tool = GetValidCardsTool::new(lookup());
        let out = tool
            .execute(
                &ctx(),
                &args(json!({"salary": "Rs. 5,00,000", "cibil": 750, "major_keyword": "Travel"})),
            )
            .await
            .unwrap();
        assert!(out.starts_with("Fetched 2 valid credit cards"));

        let unitized = tool
            .execute(
                &ctx(),
                &args(json!({"salary": "12 LPA", "cibil": 750, "major_keyword": "Travel"})),
            )
            .await
            .unwrap();
        assert!(unitized.starts_with("Invalid salary"));
    }

    #[tokio::test]
    async fn test_get_valid_cards_rejects_non_numeric_cibil() {
        let tool = GetValidCardsTool::new(lookup());
        let out = tool
            .execute(
                &ctx(),
                &args(json!({"salary": 500000, "cibil": "excellent", "major_keyword": "Travel"})),
            )
            .await
            .unwrap();

        assert!(out.starts_with("Invalid CIBIL score"));
    }
}
