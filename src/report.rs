use crate::product::TreasuryProduct;
use crate::schema::{
    Analysis, DateRange, Priority, Recommendation, RecommendationStatus, SpendingCategory,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const TOP_SPENDING_CATEGORIES: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportHeadline {
    pub date_range: DateRange,
    pub transaction_count: usize,
    pub total_inflow: f64,
    pub total_outflow: f64,
    pub net_cash_flow: f64,
    pub avg_daily_balance: f64,
    pub volatility: f64,
    pub liquidity_ratio: f64,
    pub avg_idle_amount: f64,
    pub potential_yield_gain: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportRecommendation {
    pub rank: usize,
    pub product_id: String,
    pub product_name: String,
    pub priority: Priority,
    pub status: RecommendationStatus,
    pub rationale: String,
    pub data_points: Vec<String>,
    pub net_annual_benefit: Option<f64>,
}

/// Everything the report renderer needs for one analysis, with no formatting applied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub analysis_id: String,
    pub client_id: String,
    pub headline: ReportHeadline,
    pub top_spending: Vec<SpendingCategory>,
    pub recommendations: Vec<ReportRecommendation>,
    /// Sum of net annual benefits across recommendations that were not rejected.
    pub total_projected_benefit: f64,
}

impl AnalysisReport {
    pub fn build(
        analysis: &Analysis,
        recommendations: &[Recommendation],
        products: &[TreasuryProduct],
    ) -> Self {
        let metrics = &analysis.metrics;
        let names: HashMap<&str, &str> = products
            .iter()
            .map(|p| (p.id.as_str(), p.name.as_str()))
            .collect();

        let mut ranked: Vec<&Recommendation> = recommendations.iter().collect();
        ranked.sort_by_key(|r| r.rank);

        let recommendations: Vec<ReportRecommendation> = ranked
            .into_iter()
            .map(|r| ReportRecommendation {
                rank: r.rank,
                product_id: r.product_id.clone(),
                product_name: names
                    .get(r.product_id.as_str())
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| r.product_id.clone()),
                priority: r.priority,
                status: r.status,
                rationale: r.rationale.clone(),
                data_points: r.data_points.clone(),
                net_annual_benefit: r.benefit_projection.net_annual_benefit(),
            })
            .collect();

        let total_projected_benefit = recommendations
            .iter()
            .filter(|r| r.status != RecommendationStatus::Rejected)
            .filter_map(|r| r.net_annual_benefit)
            .sum();

        Self {
            analysis_id: analysis.id.clone(),
            client_id: analysis.client_id.clone(),
            headline: ReportHeadline {
                date_range: metrics.summary.date_range,
                transaction_count: metrics.summary.transaction_count,
                total_inflow: metrics.summary.total_inflow,
                total_outflow: metrics.summary.total_outflow,
                net_cash_flow: metrics.summary.net_cash_flow,
                avg_daily_balance: metrics.liquidity_metrics.avg_daily_balance,
                volatility: metrics.liquidity_metrics.volatility,
                liquidity_ratio: metrics.liquidity_metrics.liquidity_ratio,
                avg_idle_amount: metrics.idle_balance_analysis.avg_idle_amount,
                potential_yield_gain: metrics.idle_balance_analysis.potential_yield_gain,
            },
            top_spending: metrics
                .spending_breakdown
                .iter()
                .take(TOP_SPENDING_CATEGORIES)
                .cloned()
                .collect(),
            recommendations,
            total_projected_benefit,
        }
    }
}
