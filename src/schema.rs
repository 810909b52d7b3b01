use crate::utils::flexible_date;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Credit,
    Debit,
}

impl TransactionType {
    /// Credit for zero and positive amounts, debit for negative ones.
    pub fn from_signed_amount(amount: f64) -> Self {
        if amount >= 0.0 {
            Self::Credit
        } else {
            Self::Debit
        }
    }
}

/// A single statement line as stored inside a parse result.
///
/// This is the loosely-typed shape delivered by the persistence collaborator:
/// only `date`, `description` and `amount` are guaranteed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    #[serde(with = "flexible_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub description: String,
    pub amount: f64,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub transaction_type: Option<TransactionType>,
    #[serde(default, alias = "balanceAfter", skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterparty: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    #[serde(alias = "accountId")]
    pub account_number: String,
    #[serde(default)]
    pub transactions: Vec<RawTransaction>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParseStatus {
    #[serde(alias = "success")]
    Completed,
    /// Usable but incomplete output, e.g. from the PDF placeholder.
    Partial,
    #[serde(alias = "error")]
    Failed,
}

impl ParseStatus {
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Completed | Self::Partial)
    }
}

/// What the statement parser produces from one file's bytes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParsedStatement {
    pub total_transactions: usize,
    pub date_range_start: Option<NaiveDate>,
    pub date_range_end: Option<NaiveDate>,
    pub accounts: Vec<AccountRecord>,
    pub status: ParseStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Immutable record of one parse attempt over one statement file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    pub id: String,
    pub statement_file_id: String,
    #[serde(flatten)]
    pub statement: ParsedStatement,
}

/// Normalized transaction, materialized per call and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub date: NaiveDate,
    /// Always a non-negative magnitude; direction lives in `transaction_type`.
    pub amount: f64,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub category: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterparty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_after: Option<f64>,
    pub account_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPage {
    pub transactions: Vec<Transaction>,
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowSummary {
    pub total_inflow: f64,
    pub total_outflow: f64,
    pub net_cash_flow: f64,
    pub avg_daily_balance: f64,
    pub transaction_count: usize,
    pub date_range: DateRange,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct LiquidityMetrics {
    pub avg_daily_balance: f64,
    pub min_balance: f64,
    pub max_balance: f64,
    /// Coefficient of variation of observed balances.
    pub volatility: f64,
    pub liquidity_ratio: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpendingCategory {
    pub category: String,
    pub amount: f64,
    pub percentage: f64,
    pub transaction_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct IdleBalanceAnalysis {
    pub threshold: f64,
    /// Mean excess over the threshold, not the mean raw balance.
    pub avg_idle_amount: f64,
    /// Count of balance observations above the threshold.
    pub days_with_idle_balance: usize,
    pub potential_yield_gain: f64,
}

/// The metric snapshot the scoring engine evaluates products against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetrics {
    pub summary: CashFlowSummary,
    pub liquidity_metrics: LiquidityMetrics,
    pub spending_breakdown: Vec<SpendingCategory>,
    pub idle_balance_analysis: IdleBalanceAnalysis,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub id: String,
    pub client_id: String,
    pub statement_file_ids: Vec<String>,
    pub status: AnalysisStatus,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub metrics: AnalysisMetrics,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn weight(&self) -> u8 {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationStatus {
    Pending,
    Approved,
    Rejected,
}

/// Category-specific numeric projection attached to a recommendation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "category", rename_all = "lowercase")]
pub enum BenefitProjection {
    #[serde(rename_all = "camelCase")]
    Sweep {
        annual_yield_improvement: f64,
        annual_fees: f64,
        net_benefit: f64,
        estimated_roi: f64,
    },
    #[serde(rename_all = "camelCase")]
    Zba {
        operational_savings: f64,
        annual_fees: f64,
        net_benefit: f64,
        liquidity_improvement: f64,
        risk_reduction: f64,
    },
    #[serde(rename_all = "camelCase")]
    Deposit {
        recommended_amount: f64,
        annual_yield_improvement: f64,
        annual_fees: f64,
        net_benefit: f64,
        term_months: u32,
        liquidity_improvement: f64,
    },
    #[serde(rename_all = "camelCase")]
    Liquidity {
        recommended_facility: f64,
        annual_fees: f64,
        liquidity_improvement: f64,
        risk_reduction: f64,
    },
    #[serde(rename_all = "camelCase")]
    Investment {
        investment_amount: f64,
        annual_return: f64,
        annual_fees: f64,
        net_benefit: f64,
        risk_reduction: f64,
        liquidity_improvement: f64,
    },
    #[serde(rename_all = "camelCase")]
    Generic {
        estimated_annual_value: f64,
        annual_fees: f64,
        net_benefit: f64,
    },
}

impl BenefitProjection {
    /// Projected annual value net of fees, where the category defines one.
    pub fn net_annual_benefit(&self) -> Option<f64> {
        match self {
            Self::Sweep { net_benefit, .. }
            | Self::Zba { net_benefit, .. }
            | Self::Deposit { net_benefit, .. }
            | Self::Investment { net_benefit, .. }
            | Self::Generic { net_benefit, .. } => Some(*net_benefit),
            Self::Liquidity { .. } => None,
        }
    }
}

/// An eligible product with its scoring output, before ranking and persistence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationCandidate {
    pub product_id: String,
    pub product_name: String,
    /// Lowercased product category the candidate was scored under.
    pub category: String,
    pub priority: Priority,
    pub rationale: String,
    pub data_points: Vec<String>,
    pub benefit_projection: BenefitProjection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub id: String,
    pub analysis_id: String,
    pub product_id: String,
    /// Position in the ranked list, starting at 1.
    pub rank: usize,
    pub priority: Priority,
    pub rationale: String,
    pub data_points: Vec<String>,
    pub benefit_projection: BenefitProjection,
    pub status: RecommendationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Uploaded,
    Parsing,
    Parsed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatementFile {
    pub id: String,
    pub client_id: String,
    pub file_name: String,
    pub file_key: String,
    pub mime_type: String,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_transaction_accepts_loose_shapes() {
        let json = r#"{
            "date": "2024-01-15T00:00:00.000Z",
            "description": "WIRE FROM ACME CORP",
            "amount": -1500.5,
            "balanceAfter": 250000
        }"#;
        let raw: RawTransaction = serde_json::from_str(json).unwrap();
        assert_eq!(raw.date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(raw.balance, Some(250000.0));
        assert_eq!(raw.transaction_type, None);

        let json = r#"{"date": "2024-01-16", "description": "x", "amount": 10, "type": "debit", "balance": 5}"#;
        let raw: RawTransaction = serde_json::from_str(json).unwrap();
        assert_eq!(raw.transaction_type, Some(TransactionType::Debit));
        assert_eq!(raw.balance, Some(5.0));
    }

    #[test]
    fn test_parse_status_aliases() {
        let status: ParseStatus = serde_json::from_str("\"success\"").unwrap();
        assert_eq!(status, ParseStatus::Completed);
        let status: ParseStatus = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(status, ParseStatus::Failed);
        assert!(ParseStatus::Partial.is_usable());
        assert!(!ParseStatus::Failed.is_usable());
    }

    #[test]
    fn test_priority_ordering_matches_weight() {
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
        assert_eq!(Priority::High.weight(), 3);
        assert_eq!(Priority::Low.weight(), 1);
    }

    #[test]
    fn test_benefit_projection_is_tagged_by_category() {
        let projection = BenefitProjection::Zba {
            operational_savings: 5000.0,
            annual_fees: 1200.0,
            net_benefit: 3800.0,
            liquidity_improvement: 20.0,
            risk_reduction: 10.0,
        };
        let json = serde_json::to_string(&projection).unwrap();
        assert!(json.contains("\"category\":\"zba\""));
        assert!(json.contains("\"operationalSavings\""));
        assert_eq!(projection.net_annual_benefit(), Some(3800.0));
    }
}
