use crate::error::{AdvisoryError, Result};
use crate::product::{
    DepositTerms, EligibilityRules, GenericTerms, InvestmentTerms, LiquidityTerms, SweepTerms,
    TreasuryProduct, ZbaTerms,
};
use crate::schema::{AnalysisMetrics, BenefitProjection, Priority, RecommendationCandidate};
use crate::utils::{format_currency, format_percent};
use log::debug;
use std::collections::HashMap;

pub const SWEEP_HIGH_IDLE_AMOUNT: f64 = 1_000_000.0;
pub const SWEEP_MEDIUM_IDLE_AMOUNT: f64 = 500_000.0;
/// Reported ROI when a product carries no fees at all.
pub const UNBOUNDED_ROI: f64 = 999.0;

pub const ZBA_MAX_VOLATILITY: f64 = 0.3;
pub const ZBA_HIGH_BALANCE: f64 = 2_000_000.0;

pub const DEPOSIT_MIN_BALANCE_MULTIPLE: f64 = 1.5;
pub const DEPOSIT_MAX_VOLATILITY: f64 = 0.4;
pub const DEPOSIT_BALANCE_SHARE: f64 = 0.3;
pub const DEPOSIT_HIGH_AMOUNT: f64 = 500_000.0;
/// Term deposits lock cash up, so they always cost some liquidity.
pub const DEPOSIT_LIQUIDITY_IMPROVEMENT: f64 = -10.0;

pub const LIQUIDITY_MIN_VOLATILITY: f64 = 0.5;
pub const LIQUIDITY_TIGHT_RATIO: f64 = 2.0;

pub const INVESTMENT_MIN_BALANCE: f64 = 1_000_000.0;
pub const INVESTMENT_MIN_IDLE_AMOUNT: f64 = 250_000.0;
pub const INVESTMENT_IDLE_SHARE: f64 = 0.6;
pub const INVESTMENT_BALANCE_SHARE: f64 = 0.25;
pub const INVESTMENT_HIGH_AMOUNT: f64 = 1_000_000.0;
pub const INVESTMENT_RISK_REDUCTION: f64 = -5.0;
pub const INVESTMENT_LIQUIDITY_IMPROVEMENT: f64 = -15.0;

pub const GENERIC_MEDIUM_BALANCE: f64 = 1_000_000.0;

/// Scoring output for one eligible product.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub priority: Priority,
    pub rationale: String,
    pub data_points: Vec<String>,
    pub benefit_projection: BenefitProjection,
}

/// Category-specific scoring. Returning `None` means the product is not a fit,
/// even though it passed the shared eligibility gate.
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, product: &TreasuryProduct, metrics: &AnalysisMetrics) -> Option<Evaluation>;
}

/// Returns the first eligibility rule the metrics violate, if any.
pub fn eligibility_failure(rules: &EligibilityRules, metrics: &AnalysisMetrics) -> Option<String> {
    let avg_balance = metrics.liquidity_metrics.avg_daily_balance;
    let transaction_count = metrics.summary.transaction_count as u64;
    let net_cash_flow = metrics.summary.net_cash_flow;
    let volatility = metrics.liquidity_metrics.volatility;

    if let Some(min) = rules.min_balance {
        if avg_balance < min {
            return Some(format!(
                "average daily balance {} is below the minimum {}",
                format_currency(avg_balance),
                format_currency(min)
            ));
        }
    }

    if let Some(min) = rules.min_transaction_volume {
        if transaction_count < min {
            return Some(format!(
                "{} transactions is below the minimum volume {}",
                transaction_count, min
            ));
        }
    }

    if let Some(min) = rules.min_cash_flow {
        if net_cash_flow.abs() < min {
            return Some(format!(
                "net cash flow {} is below the minimum {}",
                format_currency(net_cash_flow.abs()),
                format_currency(min)
            ));
        }
    }

    if let Some(max) = rules.max_volatility {
        if volatility > max {
            return Some(format!(
                "balance volatility {:.2} exceeds the maximum {:.2}",
                volatility, max
            ));
        }
    }

    None
}

/// Rejects metric snapshots carrying NaN or infinite figures.
pub fn validate_metrics(metrics: &AnalysisMetrics) -> Result<()> {
    let fields = [
        ("summary.netCashFlow", metrics.summary.net_cash_flow),
        ("summary.avgDailyBalance", metrics.summary.avg_daily_balance),
        (
            "liquidityMetrics.avgDailyBalance",
            metrics.liquidity_metrics.avg_daily_balance,
        ),
        ("liquidityMetrics.volatility", metrics.liquidity_metrics.volatility),
        (
            "liquidityMetrics.liquidityRatio",
            metrics.liquidity_metrics.liquidity_ratio,
        ),
        (
            "idleBalanceAnalysis.avgIdleAmount",
            metrics.idle_balance_analysis.avg_idle_amount,
        ),
    ];

    for (field, value) in fields {
        if !value.is_finite() {
            return Err(AdvisoryError::BadRequest(format!(
                "Metric {} is not a finite number",
                field
            )));
        }
    }
    Ok(())
}

fn roi_percent(net_benefit: f64, annual_fees: f64) -> f64 {
    if annual_fees > 0.0 {
        (net_benefit / annual_fees * 100.0).round()
    } else {
        UNBOUNDED_ROI
    }
}

pub struct SweepEvaluator;

impl Evaluator for SweepEvaluator {
    fn evaluate(&self, product: &TreasuryProduct, metrics: &AnalysisMetrics) -> Option<Evaluation> {
        let idle = &metrics.idle_balance_analysis;
        if idle.avg_idle_amount <= 0.0 {
            return None;
        }

        let terms = SweepTerms::from(&product.benefits);
        let annual_yield_improvement = idle.avg_idle_amount * terms.yield_improvement / 100.0;
        let annual_fees = product.pricing.annual_fees();
        let net_benefit = annual_yield_improvement - annual_fees;
        if net_benefit <= 0.0 {
            return None;
        }

        let priority = if idle.avg_idle_amount > SWEEP_HIGH_IDLE_AMOUNT {
            Priority::High
        } else if idle.avg_idle_amount > SWEEP_MEDIUM_IDLE_AMOUNT {
            Priority::Medium
        } else {
            Priority::Low
        };
        let estimated_roi = roi_percent(net_benefit, annual_fees);

        Some(Evaluation {
            priority,
            rationale: format!(
                "Balances average {} above the {} idle threshold. Sweeping that excess into {} at an additional {} would earn about {} a year, {} after fees.",
                format_currency(idle.avg_idle_amount),
                format_currency(idle.threshold),
                product.name,
                format_percent(terms.yield_improvement),
                format_currency(annual_yield_improvement),
                format_currency(net_benefit)
            ),
            data_points: vec![
                format!("Average idle balance: {}", format_currency(idle.avg_idle_amount)),
                format!("Balance observations above threshold: {}", idle.days_with_idle_balance),
                format!("Yield improvement: {}", format_percent(terms.yield_improvement)),
                format!("Annual yield improvement: {}", format_currency(annual_yield_improvement)),
                format!("Annual fees: {}", format_currency(annual_fees)),
                format!("Estimated ROI: {:.0}%", estimated_roi),
            ],
            benefit_projection: BenefitProjection::Sweep {
                annual_yield_improvement,
                annual_fees,
                net_benefit,
                estimated_roi,
            },
        })
    }
}

pub struct ZbaEvaluator;

impl Evaluator for ZbaEvaluator {
    fn evaluate(&self, product: &TreasuryProduct, metrics: &AnalysisMetrics) -> Option<Evaluation> {
        let liquidity = &metrics.liquidity_metrics;
        if liquidity.volatility >= ZBA_MAX_VOLATILITY {
            return None;
        }

        let terms = ZbaTerms::from(&product.benefits);
        let annual_fees = product.pricing.annual_fees();
        let net_benefit = terms.operational_savings - annual_fees;

        let priority = if liquidity.avg_daily_balance > ZBA_HIGH_BALANCE {
            Priority::High
        } else {
            Priority::Medium
        };

        Some(Evaluation {
            priority,
            rationale: format!(
                "Stable balances (volatility {:.2}) around an average of {} make a zero-balance structure practical. {} would centralize cash and save roughly {} a year in operating effort.",
                liquidity.volatility,
                format_currency(liquidity.avg_daily_balance),
                product.name,
                format_currency(terms.operational_savings)
            ),
            data_points: vec![
                format!("Average daily balance: {}", format_currency(liquidity.avg_daily_balance)),
                format!("Balance volatility: {:.2}", liquidity.volatility),
                format!("Operational savings: {}", format_currency(terms.operational_savings)),
                format!("Annual fees: {}", format_currency(annual_fees)),
                format!("Net annual benefit: {}", format_currency(net_benefit)),
            ],
            benefit_projection: BenefitProjection::Zba {
                operational_savings: terms.operational_savings,
                annual_fees,
                net_benefit,
                liquidity_improvement: terms.liquidity_improvement,
                risk_reduction: terms.risk_reduction,
            },
        })
    }
}

pub struct DepositEvaluator;

impl Evaluator for DepositEvaluator {
    fn evaluate(&self, product: &TreasuryProduct, metrics: &AnalysisMetrics) -> Option<Evaluation> {
        let liquidity = &metrics.liquidity_metrics;
        let required_balance =
            product.eligibility_rules.min_balance.unwrap_or(0.0) * DEPOSIT_MIN_BALANCE_MULTIPLE;

        if liquidity.avg_daily_balance <= required_balance
            || liquidity.volatility >= DEPOSIT_MAX_VOLATILITY
        {
            return None;
        }

        let terms = DepositTerms::from(&product.benefits);
        let recommended_amount = metrics
            .idle_balance_analysis
            .avg_idle_amount
            .min(liquidity.avg_daily_balance * DEPOSIT_BALANCE_SHARE);
        let annual_yield_improvement = recommended_amount * terms.yield_rate / 100.0;
        let annual_fees = product.pricing.annual_fees();
        let net_benefit = annual_yield_improvement - annual_fees;

        let priority = if recommended_amount > DEPOSIT_HIGH_AMOUNT {
            Priority::High
        } else {
            Priority::Medium
        };

        Some(Evaluation {
            priority,
            rationale: format!(
                "An average balance of {} with low volatility ({:.2}) leaves room to place {} in {} for {} months at {}, earning about {} a year.",
                format_currency(liquidity.avg_daily_balance),
                liquidity.volatility,
                format_currency(recommended_amount),
                product.name,
                terms.term_months,
                format_percent(terms.yield_rate),
                format_currency(annual_yield_improvement)
            ),
            data_points: vec![
                format!("Average daily balance: {}", format_currency(liquidity.avg_daily_balance)),
                format!("Balance volatility: {:.2}", liquidity.volatility),
                format!("Recommended deposit: {}", format_currency(recommended_amount)),
                format!("Yield rate: {}", format_percent(terms.yield_rate)),
                format!("Term: {} months", terms.term_months),
                format!("Annual yield improvement: {}", format_currency(annual_yield_improvement)),
            ],
            benefit_projection: BenefitProjection::Deposit {
                recommended_amount,
                annual_yield_improvement,
                annual_fees,
                net_benefit,
                term_months: terms.term_months,
                liquidity_improvement: DEPOSIT_LIQUIDITY_IMPROVEMENT,
            },
        })
    }
}

pub struct LiquidityEvaluator;

impl Evaluator for LiquidityEvaluator {
    fn evaluate(&self, product: &TreasuryProduct, metrics: &AnalysisMetrics) -> Option<Evaluation> {
        let liquidity = &metrics.liquidity_metrics;
        let volatile = liquidity.volatility > LIQUIDITY_MIN_VOLATILITY;
        let tight = liquidity.liquidity_ratio < LIQUIDITY_TIGHT_RATIO;
        if !volatile && !tight {
            return None;
        }

        let terms = LiquidityTerms::from(&product.benefits);
        let recommended_facility = liquidity.avg_daily_balance * terms.facility_ratio;
        let annual_fees = product.pricing.annual_fees();
        let priority = if tight { Priority::High } else { Priority::Medium };

        let reason = if tight {
            format!(
                "The liquidity ratio of {:.2} leaves a thin buffer over the lowest balance of {}",
                liquidity.liquidity_ratio,
                format_currency(liquidity.min_balance)
            )
        } else {
            format!(
                "Balances swing widely (volatility {:.2})",
                liquidity.volatility
            )
        };

        Some(Evaluation {
            priority,
            rationale: format!(
                "{}. A {} facility through {} would cover shortfalls without disrupting operations.",
                reason,
                format_currency(recommended_facility),
                product.name
            ),
            data_points: vec![
                format!("Liquidity ratio: {:.2}", liquidity.liquidity_ratio),
                format!("Balance volatility: {:.2}", liquidity.volatility),
                format!("Minimum balance: {}", format_currency(liquidity.min_balance)),
                format!("Recommended facility: {}", format_currency(recommended_facility)),
                format!("Annual fees: {}", format_currency(annual_fees)),
            ],
            benefit_projection: BenefitProjection::Liquidity {
                recommended_facility,
                annual_fees,
                liquidity_improvement: terms.liquidity_improvement,
                risk_reduction: terms.risk_reduction,
            },
        })
    }
}

pub struct InvestmentEvaluator;

impl Evaluator for InvestmentEvaluator {
    fn evaluate(&self, product: &TreasuryProduct, metrics: &AnalysisMetrics) -> Option<Evaluation> {
        let avg_balance = metrics.liquidity_metrics.avg_daily_balance;
        let net_cash_flow = metrics.summary.net_cash_flow;
        let idle_amount = metrics.idle_balance_analysis.avg_idle_amount;

        if avg_balance <= INVESTMENT_MIN_BALANCE
            || net_cash_flow <= 0.0
            || idle_amount <= INVESTMENT_MIN_IDLE_AMOUNT
        {
            return None;
        }

        let terms = InvestmentTerms::from(&product.benefits);
        let investment_amount =
            (idle_amount * INVESTMENT_IDLE_SHARE).min(avg_balance * INVESTMENT_BALANCE_SHARE);
        let annual_return = investment_amount * terms.expected_return / 100.0;
        let annual_fees = product.pricing.annual_fees();
        let net_benefit = annual_return - annual_fees;

        let priority = if investment_amount > INVESTMENT_HIGH_AMOUNT {
            Priority::High
        } else {
            Priority::Medium
        };

        Some(Evaluation {
            priority,
            rationale: format!(
                "Positive net cash flow of {} and idle balances averaging {} support investing {} through {} at an expected {}, about {} a year.",
                format_currency(net_cash_flow),
                format_currency(idle_amount),
                format_currency(investment_amount),
                product.name,
                format_percent(terms.expected_return),
                format_currency(annual_return)
            ),
            data_points: vec![
                format!("Average daily balance: {}", format_currency(avg_balance)),
                format!("Net cash flow: {}", format_currency(net_cash_flow)),
                format!("Average idle balance: {}", format_currency(idle_amount)),
                format!("Recommended investment: {}", format_currency(investment_amount)),
                format!("Expected return: {}", format_percent(terms.expected_return)),
            ],
            benefit_projection: BenefitProjection::Investment {
                investment_amount,
                annual_return,
                annual_fees,
                net_benefit,
                risk_reduction: INVESTMENT_RISK_REDUCTION,
                liquidity_improvement: INVESTMENT_LIQUIDITY_IMPROVEMENT,
            },
        })
    }
}

pub struct GenericEvaluator;

impl Evaluator for GenericEvaluator {
    fn evaluate(&self, product: &TreasuryProduct, metrics: &AnalysisMetrics) -> Option<Evaluation> {
        let avg_balance = metrics.liquidity_metrics.avg_daily_balance;
        let terms = GenericTerms::from(&product.benefits);
        let annual_fees = product.pricing.annual_fees();

        let priority = if avg_balance > GENERIC_MEDIUM_BALANCE {
            Priority::Medium
        } else {
            Priority::Low
        };

        Some(Evaluation {
            priority,
            rationale: format!(
                "{} matches this client's profile: an average daily balance of {} across {} transactions.",
                product.name,
                format_currency(avg_balance),
                metrics.summary.transaction_count
            ),
            data_points: vec![
                format!("Average daily balance: {}", format_currency(avg_balance)),
                format!("Transaction count: {}", metrics.summary.transaction_count),
                format!("Net cash flow: {}", format_currency(metrics.summary.net_cash_flow)),
            ],
            benefit_projection: BenefitProjection::Generic {
                estimated_annual_value: terms.estimated_annual_value,
                annual_fees,
                net_benefit: terms.estimated_annual_value - annual_fees,
            },
        })
    }
}

/// Dispatches products to evaluators by lowercased category, falling back
/// to [`GenericEvaluator`] for categories with no registered evaluator.
pub struct ScoringEngine {
    evaluators: HashMap<String, Box<dyn Evaluator>>,
    fallback: Box<dyn Evaluator>,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoringEngine {
    pub fn new() -> Self {
        let mut engine = Self::empty();
        engine.register("sweep", SweepEvaluator);
        engine.register("zba", ZbaEvaluator);
        engine.register("deposit", DepositEvaluator);
        engine.register("liquidity", LiquidityEvaluator);
        engine.register("investment", InvestmentEvaluator);
        engine
    }

    /// An engine where every category is scored by the generic evaluator.
    pub fn empty() -> Self {
        Self {
            evaluators: HashMap::new(),
            fallback: Box::new(GenericEvaluator),
        }
    }

    pub fn register(&mut self, category: &str, evaluator: impl Evaluator + 'static) {
        self.evaluators
            .insert(category.trim().to_lowercase(), Box::new(evaluator));
    }

    pub fn evaluator_for(&self, category: &str) -> &dyn Evaluator {
        self.evaluators
            .get(&category.trim().to_lowercase())
            .map(|e| e.as_ref())
            .unwrap_or(self.fallback.as_ref())
    }

    /// Scores one product. `Ok(None)` means "no recommendation", never an error.
    pub fn evaluate(
        &self,
        product: &TreasuryProduct,
        metrics: &AnalysisMetrics,
    ) -> Result<Option<RecommendationCandidate>> {
        product.validate()?;
        validate_metrics(metrics)?;

        if let Some(reason) = eligibility_failure(&product.eligibility_rules, metrics) {
            debug!("Product '{}' ineligible: {}", product.name, reason);
            return Ok(None);
        }

        let category = product.category_key();
        let evaluation = match self.evaluator_for(&category).evaluate(product, metrics) {
            Some(e) => e,
            None => {
                debug!(
                    "Product '{}' not a fit under the {} rules",
                    product.name, category
                );
                return Ok(None);
            }
        };

        Ok(Some(RecommendationCandidate {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            category,
            priority: evaluation.priority,
            rationale: evaluation.rationale,
            data_points: evaluation.data_points,
            benefit_projection: evaluation.benefit_projection,
        }))
    }

    /// Scores every product in catalog order, keeping only eligible ones.
    pub fn evaluate_catalog(
        &self,
        products: &[TreasuryProduct],
        metrics: &AnalysisMetrics,
    ) -> Result<Vec<RecommendationCandidate>> {
        let mut candidates = Vec::new();
        for product in products {
            if let Some(candidate) = self.evaluate(product, metrics)? {
                candidates.push(candidate);
            }
        }
        Ok(candidates)
    }
}
