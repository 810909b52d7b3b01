//! # Treasury Advisor
//!
//! A library for turning uploaded bank statements into ranked treasury-product
//! recommendations for commercial clients.
//!
//! ## Core Concepts
//!
//! - **Parse Result**: The raw transactions extracted from one statement file
//! - **Transaction**: A normalized, categorized view of one statement row
//! - **Analysis**: Cash-flow, liquidity, spending and idle-balance metrics over a set of statements
//! - **Product Catalog**: Treasury products with eligibility rules, benefit knobs and pricing
//! - **Recommendation**: A scored, ranked product suggestion awaiting banker review
//!
//! ## Example
//!
//! ```rust,ignore
//! use treasury_advisor::*;
//!
//! let repository = InMemoryRepository::new();
//! repository.add_client(Client { id: "c1".into(), name: "ACME Corp".into() })?;
//! for product in load_catalog(&std::fs::read_to_string("catalog.json")?)? {
//!     repository.add_product(product)?;
//! }
//!
//! let service = AdvisoryService::new(repository, InMemoryObjectStore::new());
//! service.parse_statement_file("file-1")?;
//! let analysis = service.analyze_statements(&["file-1".into()], "c1", &AnalysisOptions::default())?;
//! let recommendations =
//!     service.generate_recommendations(&analysis.id, None, &RecommendationOptions::default())?;
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod normalizer;
pub mod parser;
pub mod product;
pub mod ranker;
pub mod report;
pub mod schema;
pub mod service;
pub mod store;
pub mod utils;

pub use config::{AdvisorConfig, AnalysisOptions, RecommendationOptions};
pub use engine::{Evaluation, Evaluator, ScoringEngine};
pub use error::{AdvisoryError, ErrorKind, Result};
pub use metrics::calculate_metrics;
pub use normalizer::{categorize, extract_counterparty, normalize, paginate};
pub use parser::{parse_statement, StatementFormat};
pub use product::{load_catalog, validate_catalog, TreasuryProduct};
pub use ranker::{into_recommendations, rank};
pub use report::AnalysisReport;
pub use schema::*;
pub use service::{AdvisoryService, FileParseOutcome};
pub use store::{InMemoryObjectStore, InMemoryRepository, ObjectStore, Repository};
pub use utils::*;

use log::{debug, info};

/// Storage-free entry point to the analysis and scoring pipeline.
pub struct TreasuryAdvisor;

impl TreasuryAdvisor {
    /// Runs normalization and metrics over already-parsed statements.
    pub fn analyze(parse_results: &[ParseResult], idle_threshold: f64) -> AnalysisMetrics {
        debug!(
            "Analyzing {} parse results with idle threshold {}",
            parse_results.len(),
            idle_threshold
        );
        analyze_parse_results(parse_results, idle_threshold)
    }

    /// Scores and ranks a catalog against a metric snapshot without touching
    /// any persistence.
    pub fn recommend(
        metrics: &AnalysisMetrics,
        products: &[TreasuryProduct],
        max_count: usize,
    ) -> Result<Vec<RecommendationCandidate>> {
        validate_catalog(products)?;

        let candidates = ScoringEngine::new().evaluate_catalog(products, metrics)?;
        info!(
            "{} of {} products eligible; keeping at most {}",
            candidates.len(),
            products.len(),
            max_count
        );

        Ok(rank(candidates, max_count, None))
    }
}

pub fn analyze_parse_results(parse_results: &[ParseResult], idle_threshold: f64) -> AnalysisMetrics {
    let transactions = normalize(parse_results);
    calculate_metrics(&transactions, date_range_of(parse_results), idle_threshold)
}

/// Earliest start and latest end across parse results. Missing bounds are skipped.
pub fn date_range_of(parse_results: &[ParseResult]) -> DateRange {
    DateRange {
        start: parse_results
            .iter()
            .filter_map(|r| r.statement.date_range_start)
            .min(),
        end: parse_results
            .iter()
            .filter_map(|r| r.statement.date_range_end)
            .max(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const JANUARY: &str = "Date,Description,Amount,Balance\n\
        2024-01-02,Customer deposit,500000,2500000\n\
        2024-01-10,Payroll run,-200000,2300000\n\
        2024-01-20,Wire from ACME,250000,2550000\n";

    const FEBRUARY: &str = "Date,Description,Amount,Balance\n\
        2024-02-05,Vendor payment,-150000,2400000\n\
        2024-02-25,Customer deposit,100000,2500000\n";

    fn parse(id: &str, csv: &str) -> ParseResult {
        ParseResult {
            id: id.to_string(),
            statement_file_id: format!("file-{}", id),
            statement: parse_statement(csv.as_bytes(), "text/csv").unwrap(),
        }
    }

    #[test]
    fn test_date_range_spans_statements() {
        let results = vec![parse("feb", FEBRUARY), parse("jan", JANUARY)];
        let range = date_range_of(&results);
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2024, 1, 2));
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2024, 2, 25));

        assert_eq!(date_range_of(&[]), DateRange::default());
    }

    #[test]
    fn test_end_to_end_pipeline() {
        let results = vec![parse("jan", JANUARY), parse("feb", FEBRUARY)];
        let metrics = TreasuryAdvisor::analyze(&results, 100_000.0);

        assert_eq!(metrics.summary.transaction_count, 5);
        assert!((metrics.summary.total_inflow - 850_000.0).abs() < 0.01);
        assert!((metrics.summary.total_outflow - 350_000.0).abs() < 0.01);
        assert!((metrics.summary.net_cash_flow - 500_000.0).abs() < 0.01);
        assert_eq!(metrics.liquidity_metrics.avg_daily_balance, 2_450_000.0);
        assert_eq!(metrics.idle_balance_analysis.days_with_idle_balance, 5);

        let products = load_catalog(
            r#"[
                {"id": "sweep-1", "name": "Sweep", "category": "sweep",
                 "pricing": {"monthlyFee": 100}},
                {"id": "zba-1", "name": "ZBA", "category": "zba"},
                {"id": "cd-1", "name": "Term Deposit", "category": "deposit",
                 "eligibilityRules": {"minBalance": 5000000}}
            ]"#,
        )
        .unwrap();

        let ranked = TreasuryAdvisor::recommend(&metrics, &products, 5).unwrap();
        assert!(ranked.iter().any(|c| c.product_id == "sweep-1"));
        assert!(ranked.iter().all(|c| c.product_id != "cd-1"));
        assert!(ranked
            .windows(2)
            .all(|w| w[0].priority.weight() >= w[1].priority.weight()));
    }

    #[test]
    fn test_recommend_rejects_duplicate_names() {
        let products: Vec<TreasuryProduct> = serde_json::from_str(
            r#"[
                {"id": "a", "name": "Sweep", "category": "sweep"},
                {"id": "b", "name": "sweep", "category": "sweep"}
            ]"#,
        )
        .unwrap();
        let err = TreasuryAdvisor::recommend(&AnalysisMetrics::default(), &products, 5).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }
}
