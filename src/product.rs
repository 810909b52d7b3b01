use crate::error::{AdvisoryError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const SWEEP_DEFAULT_YIELD_IMPROVEMENT: f64 = 2.5;

pub const ZBA_DEFAULT_OPERATIONAL_SAVINGS: f64 = 5000.0;
pub const ZBA_DEFAULT_LIQUIDITY_IMPROVEMENT: f64 = 15.0;
pub const ZBA_DEFAULT_RISK_REDUCTION: f64 = 10.0;

pub const DEPOSIT_DEFAULT_YIELD_RATE: f64 = 3.5;
pub const DEPOSIT_DEFAULT_TERM_MONTHS: u32 = 12;

pub const LIQUIDITY_DEFAULT_FACILITY_RATIO: f64 = 0.2;
pub const LIQUIDITY_DEFAULT_LIQUIDITY_IMPROVEMENT: f64 = 30.0;
pub const LIQUIDITY_DEFAULT_RISK_REDUCTION: f64 = 25.0;

pub const INVESTMENT_DEFAULT_EXPECTED_RETURN: f64 = 5.0;

pub const GENERIC_DEFAULT_ESTIMATED_ANNUAL_VALUE: f64 = 0.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityRules {
    #[schemars(description = "Minimum average daily balance the client must hold.")]
    pub min_balance: Option<f64>,

    #[schemars(description = "Minimum number of transactions across the analysed statements.")]
    pub min_transaction_volume: Option<u64>,

    #[schemars(description = "Minimum absolute net cash flow over the analysed period.")]
    pub min_cash_flow: Option<f64>,

    #[schemars(description = "Maximum coefficient of variation of balances the product tolerates.")]
    pub max_volatility: Option<f64>,
}

/// Category-specific knobs. Each category reads only the fields it understands;
/// absent fields fall back to the category's documented default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductBenefits {
    #[schemars(description = "Sweep: additional annual yield on idle cash, in percent. Default 2.5.")]
    pub yield_improvement: Option<f64>,

    #[schemars(description = "ZBA: annual operational savings in dollars. Default 5000.")]
    pub operational_savings: Option<f64>,

    #[schemars(description = "Deposit: annual yield rate on the placed amount, in percent. Default 3.5.")]
    pub yield_rate: Option<f64>,

    #[schemars(description = "Deposit: term length in months. Default 12.")]
    pub term_months: Option<u32>,

    #[schemars(description = "Liquidity: facility size as a fraction of the average daily balance. Default 0.2.")]
    pub facility_ratio: Option<f64>,

    #[schemars(description = "Investment: expected annual return, in percent. Default 5.0.")]
    pub expected_return: Option<f64>,

    #[schemars(description = "Projected liquidity improvement score (ZBA default 15, liquidity default 30).")]
    pub liquidity_improvement: Option<f64>,

    #[schemars(description = "Projected risk reduction score (ZBA default 10, liquidity default 25).")]
    pub risk_reduction: Option<f64>,

    #[schemars(description = "Other categories: estimated annual value in dollars. Default 0.")]
    pub estimated_annual_value: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductPricing {
    #[schemars(description = "One-off setup fee in dollars.")]
    pub setup_fee: Option<f64>,

    #[schemars(description = "Recurring monthly fee in dollars.")]
    pub monthly_fee: Option<f64>,
}

impl ProductPricing {
    /// First-year cost: twelve monthly fees plus the setup fee.
    pub fn annual_fees(&self) -> f64 {
        self.monthly_fee.unwrap_or(0.0) * 12.0 + self.setup_fee.unwrap_or(0.0)
    }
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TreasuryProduct {
    pub id: String,

    #[schemars(description = "Unique display name of the product.")]
    pub name: String,

    #[schemars(
        description = "Product category: sweep, zba, deposit, liquidity, investment. Any other value is scored generically."
    )]
    pub category: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub eligibility_rules: EligibilityRules,

    #[serde(default)]
    pub benefits: ProductBenefits,

    #[serde(default)]
    pub pricing: ProductPricing,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl TreasuryProduct {
    pub fn category_key(&self) -> String {
        self.category.trim().to_lowercase()
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AdvisoryError::BadRequest(format!(
                "Product {} has an empty name",
                self.id
            )));
        }
        if self.category.trim().is_empty() {
            return Err(AdvisoryError::BadRequest(format!(
                "Product '{}' has an empty category",
                self.name
            )));
        }

        let rules = &self.eligibility_rules;
        let benefits = &self.benefits;
        let pricing = &self.pricing;
        let knobs = [
            ("eligibilityRules.minBalance", rules.min_balance),
            ("eligibilityRules.minCashFlow", rules.min_cash_flow),
            ("eligibilityRules.maxVolatility", rules.max_volatility),
            ("benefits.yieldImprovement", benefits.yield_improvement),
            ("benefits.operationalSavings", benefits.operational_savings),
            ("benefits.yieldRate", benefits.yield_rate),
            ("benefits.facilityRatio", benefits.facility_ratio),
            ("benefits.expectedReturn", benefits.expected_return),
            ("benefits.estimatedAnnualValue", benefits.estimated_annual_value),
            ("pricing.setupFee", pricing.setup_fee),
            ("pricing.monthlyFee", pricing.monthly_fee),
        ];

        for (field, value) in knobs {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(AdvisoryError::BadRequest(format!(
                        "Product '{}' has invalid {}: {}",
                        self.name, field, v
                    )));
                }
            }
        }

        // Improvement and risk scores are signed, but must still be numbers.
        for (field, value) in [
            ("benefits.liquidityImprovement", benefits.liquidity_improvement),
            ("benefits.riskReduction", benefits.risk_reduction),
        ] {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(AdvisoryError::BadRequest(format!(
                        "Product '{}' has invalid {}: {}",
                        self.name, field, v
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(TreasuryProduct)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

/// Deserializes and validates a product catalog, rejecting duplicate names.
pub fn load_catalog(json: &str) -> Result<Vec<TreasuryProduct>> {
    let products: Vec<TreasuryProduct> = serde_json::from_str(json)?;
    validate_catalog(&products)?;
    Ok(products)
}

pub fn validate_catalog(products: &[TreasuryProduct]) -> Result<()> {
    let mut names = HashSet::new();
    for product in products {
        product.validate()?;
        if !names.insert(product.name.trim().to_lowercase()) {
            return Err(AdvisoryError::BadRequest(format!(
                "Duplicate product name '{}'",
                product.name
            )));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepTerms {
    pub yield_improvement: f64,
}

impl From<&ProductBenefits> for SweepTerms {
    fn from(benefits: &ProductBenefits) -> Self {
        Self {
            yield_improvement: benefits
                .yield_improvement
                .unwrap_or(SWEEP_DEFAULT_YIELD_IMPROVEMENT),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZbaTerms {
    pub operational_savings: f64,
    pub liquidity_improvement: f64,
    pub risk_reduction: f64,
}

impl From<&ProductBenefits> for ZbaTerms {
    fn from(benefits: &ProductBenefits) -> Self {
        Self {
            operational_savings: benefits
                .operational_savings
                .unwrap_or(ZBA_DEFAULT_OPERATIONAL_SAVINGS),
            liquidity_improvement: benefits
                .liquidity_improvement
                .unwrap_or(ZBA_DEFAULT_LIQUIDITY_IMPROVEMENT),
            risk_reduction: benefits.risk_reduction.unwrap_or(ZBA_DEFAULT_RISK_REDUCTION),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepositTerms {
    pub yield_rate: f64,
    pub term_months: u32,
}

impl From<&ProductBenefits> for DepositTerms {
    fn from(benefits: &ProductBenefits) -> Self {
        Self {
            yield_rate: benefits.yield_rate.unwrap_or(DEPOSIT_DEFAULT_YIELD_RATE),
            term_months: benefits.term_months.unwrap_or(DEPOSIT_DEFAULT_TERM_MONTHS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiquidityTerms {
    pub facility_ratio: f64,
    pub liquidity_improvement: f64,
    pub risk_reduction: f64,
}

impl From<&ProductBenefits> for LiquidityTerms {
    fn from(benefits: &ProductBenefits) -> Self {
        Self {
            facility_ratio: benefits
                .facility_ratio
                .unwrap_or(LIQUIDITY_DEFAULT_FACILITY_RATIO),
            liquidity_improvement: benefits
                .liquidity_improvement
                .unwrap_or(LIQUIDITY_DEFAULT_LIQUIDITY_IMPROVEMENT),
            risk_reduction: benefits
                .risk_reduction
                .unwrap_or(LIQUIDITY_DEFAULT_RISK_REDUCTION),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvestmentTerms {
    pub expected_return: f64,
}

impl From<&ProductBenefits> for InvestmentTerms {
    fn from(benefits: &ProductBenefits) -> Self {
        Self {
            expected_return: benefits
                .expected_return
                .unwrap_or(INVESTMENT_DEFAULT_EXPECTED_RETURN),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenericTerms {
    pub estimated_annual_value: f64,
}

impl From<&ProductBenefits> for GenericTerms {
    fn from(benefits: &ProductBenefits) -> Self {
        Self {
            estimated_annual_value: benefits
                .estimated_annual_value
                .unwrap_or(GENERIC_DEFAULT_ESTIMATED_ANNUAL_VALUE),
        }
    }
}
