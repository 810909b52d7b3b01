//! Cash-flow, liquidity, spending and idle-balance metrics.
//!
//! All four calculators are pure functions over the same normalized
//! transaction slice and share no state.

use crate::schema::{
    AnalysisMetrics, CashFlowSummary, DateRange, IdleBalanceAnalysis, LiquidityMetrics,
    SpendingCategory, Transaction, TransactionType,
};
use crate::utils::{mean, round_to, std_dev};
use std::collections::HashMap;

/// Assumed annual yield on idle cash when estimating the gain from deploying it.
pub const IDLE_YIELD_ASSUMPTION: f64 = 0.025;

fn balances(transactions: &[Transaction]) -> Vec<f64> {
    transactions.iter().filter_map(|t| t.balance_after).collect()
}

fn total_by_type(transactions: &[Transaction], transaction_type: TransactionType) -> f64 {
    transactions
        .iter()
        .filter(|t| t.transaction_type == transaction_type)
        .map(|t| t.amount)
        .sum()
}

pub fn calculate_summary(transactions: &[Transaction], date_range: DateRange) -> CashFlowSummary {
    let total_inflow = total_by_type(transactions, TransactionType::Credit);
    let total_outflow = total_by_type(transactions, TransactionType::Debit);

    CashFlowSummary {
        total_inflow,
        total_outflow,
        net_cash_flow: total_inflow - total_outflow,
        avg_daily_balance: mean(&balances(transactions)),
        transaction_count: transactions.len(),
        date_range,
    }
}

pub fn calculate_liquidity_metrics(transactions: &[Transaction]) -> LiquidityMetrics {
    let mut observed = balances(transactions);
    if observed.is_empty() {
        return LiquidityMetrics::default();
    }
    observed.sort_by(f64::total_cmp);

    let avg = mean(&observed);
    let min = observed[0];
    let max = observed[observed.len() - 1];

    let volatility = if avg > 0.0 { std_dev(&observed) / avg } else { 0.0 };
    let liquidity_ratio = if min > 0.0 { avg / min } else { 0.0 };

    LiquidityMetrics {
        avg_daily_balance: avg.round(),
        min_balance: min.round(),
        max_balance: max.round(),
        volatility: round_to(volatility, 2),
        liquidity_ratio: round_to(liquidity_ratio, 2),
    }
}

/// Debit totals per category, largest first. Percentages carry one decimal.
pub fn calculate_spending_breakdown(transactions: &[Transaction]) -> Vec<SpendingCategory> {
    let debits: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| t.transaction_type == TransactionType::Debit)
        .collect();

    let total_outflow: f64 = debits.iter().map(|t| t.amount).sum();
    if total_outflow <= 0.0 {
        return Vec::new();
    }

    // First-seen order keeps equal amounts deterministic after the stable sort.
    let mut order: Vec<String> = Vec::new();
    let mut totals: HashMap<String, (f64, usize)> = HashMap::new();
    for txn in debits {
        let entry = totals.entry(txn.category.clone()).or_insert_with(|| {
            order.push(txn.category.clone());
            (0.0, 0)
        });
        entry.0 += txn.amount;
        entry.1 += 1;
    }

    let mut breakdown: Vec<SpendingCategory> = order
        .into_iter()
        .map(|category| {
            let (amount, count) = totals[&category];
            SpendingCategory {
                percentage: (amount / total_outflow * 1000.0).round() / 10.0,
                category,
                amount,
                transaction_count: count,
            }
        })
        .collect();

    breakdown.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    breakdown
}

/// Idle cash above `threshold`.
///
/// Each balance observation above the threshold counts as one idle "day";
/// this is a sampling-based proxy, not a calendar-day count.
pub fn calculate_idle_balance(transactions: &[Transaction], threshold: f64) -> IdleBalanceAnalysis {
    let excess: Vec<f64> = balances(transactions)
        .into_iter()
        .filter(|b| *b > threshold)
        .map(|b| b - threshold)
        .collect();

    let avg_idle_amount = mean(&excess);

    IdleBalanceAnalysis {
        threshold,
        avg_idle_amount,
        days_with_idle_balance: excess.len(),
        potential_yield_gain: (avg_idle_amount * IDLE_YIELD_ASSUMPTION).round(),
    }
}

pub fn calculate_metrics(
    transactions: &[Transaction],
    date_range: DateRange,
    idle_threshold: f64,
) -> AnalysisMetrics {
    AnalysisMetrics {
        summary: calculate_summary(transactions, date_range),
        liquidity_metrics: calculate_liquidity_metrics(transactions),
        spending_breakdown: calculate_spending_breakdown(transactions),
        idle_balance_analysis: calculate_idle_balance(transactions, idle_threshold),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn txn(
        idx: usize,
        amount: f64,
        transaction_type: TransactionType,
        category: &str,
        balance: Option<f64>,
    ) -> Transaction {
        Transaction {
            id: format!("pr-A-{}", idx),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            amount,
            transaction_type,
            category: category.to_string(),
            description: String::new(),
            counterparty: None,
            balance_after: balance,
            account_id: "A".to_string(),
        }
    }

    fn sample() -> Vec<Transaction> {
        vec![
            txn(0, 10_000.0, TransactionType::Credit, "Transfers", Some(110_000.0)),
            txn(1, 3_000.0, TransactionType::Debit, "Payroll", Some(107_000.0)),
            txn(2, 1_000.0, TransactionType::Debit, "Utilities", Some(106_000.0)),
            txn(3, 2_000.0, TransactionType::Debit, "Payroll", None),
            txn(4, 500.0, TransactionType::Debit, "Bank Fees", Some(77_000.0)),
        ]
    }

    #[test]
    fn test_summary() {
        let range = DateRange {
            start: NaiveDate::from_ymd_opt(2024, 1, 1),
            end: NaiveDate::from_ymd_opt(2024, 1, 31),
        };
        let summary = calculate_summary(&sample(), range);
        assert_eq!(summary.total_inflow, 10_000.0);
        assert_eq!(summary.total_outflow, 6_500.0);
        assert_eq!(summary.net_cash_flow, 3_500.0);
        assert_eq!(summary.transaction_count, 5);
        assert_eq!(summary.avg_daily_balance, 100_000.0);
        assert_eq!(summary.date_range, range);
    }

    #[test]
    fn test_summary_without_balances() {
        let txns = vec![txn(0, 5.0, TransactionType::Credit, "Other", None)];
        let summary = calculate_summary(&txns, DateRange::default());
        assert_eq!(summary.avg_daily_balance, 0.0);
    }

    #[test]
    fn test_liquidity_invariants() {
        let metrics = calculate_liquidity_metrics(&sample());
        assert_eq!(metrics.min_balance, 77_000.0);
        assert_eq!(metrics.max_balance, 110_000.0);
        assert!(metrics.min_balance <= metrics.avg_daily_balance);
        assert!(metrics.avg_daily_balance <= metrics.max_balance);
        assert!(metrics.volatility >= 0.0);
        assert!((metrics.liquidity_ratio - 1.30).abs() < 0.001);
    }

    #[test]
    fn test_liquidity_constant_balances() {
        let txns: Vec<Transaction> = (0..4)
            .map(|i| txn(i, 1.0, TransactionType::Credit, "Other", Some(50_000.0)))
            .collect();
        let metrics = calculate_liquidity_metrics(&txns);
        assert_eq!(metrics.volatility, 0.0);
        assert_eq!(metrics.liquidity_ratio, 1.0);
    }

    #[test]
    fn test_liquidity_empty_and_non_positive() {
        assert_eq!(calculate_liquidity_metrics(&[]), LiquidityMetrics::default());

        let txns = vec![
            txn(0, 1.0, TransactionType::Debit, "Other", Some(-100.0)),
            txn(1, 1.0, TransactionType::Debit, "Other", Some(50.0)),
        ];
        let metrics = calculate_liquidity_metrics(&txns);
        assert_eq!(metrics.volatility, 0.0);
        assert_eq!(metrics.liquidity_ratio, 0.0);
    }

    #[test]
    fn test_spending_breakdown_sums() {
        let breakdown = calculate_spending_breakdown(&sample());
        assert_eq!(breakdown.len(), 3);
        assert_eq!(breakdown[0].category, "Payroll");
        assert_eq!(breakdown[0].amount, 5_000.0);
        assert_eq!(breakdown[0].transaction_count, 2);
        assert_eq!(breakdown[0].percentage, 76.9);

        let amount_sum: f64 = breakdown.iter().map(|c| c.amount).sum();
        assert!((amount_sum - 6_500.0).abs() < 0.01);
        let pct_sum: f64 = breakdown.iter().map(|c| c.percentage).sum();
        assert!((pct_sum - 100.0).abs() < 0.5);
    }

    #[test]
    fn test_spending_breakdown_empty_without_debits() {
        let txns = vec![txn(0, 5.0, TransactionType::Credit, "Other", None)];
        assert!(calculate_spending_breakdown(&txns).is_empty());
    }

    #[test]
    fn test_idle_balance_uses_excess_over_threshold() {
        let idle = calculate_idle_balance(&sample(), 100_000.0);
        assert_eq!(idle.days_with_idle_balance, 3);
        // Excesses: 10,000 + 7,000 + 6,000
        assert!((idle.avg_idle_amount - 23_000.0 / 3.0).abs() < 0.01);
        assert_eq!(idle.potential_yield_gain, (23_000.0 / 3.0 * 0.025_f64).round());
    }

    #[test]
    fn test_idle_balance_monotonic_in_threshold() {
        let txns = sample();
        let mut previous = usize::MAX;
        for threshold in [0.0, 80_000.0, 106_000.0, 108_000.0, 200_000.0] {
            let days = calculate_idle_balance(&txns, threshold).days_with_idle_balance;
            assert!(days <= previous);
            previous = days;
        }
        assert_eq!(previous, 0);
        assert_eq!(calculate_idle_balance(&txns, 200_000.0).avg_idle_amount, 0.0);
    }
}
