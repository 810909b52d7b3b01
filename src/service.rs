use crate::config::{AdvisorConfig, AnalysisOptions, RecommendationOptions};
use crate::engine::{validate_metrics, ScoringEngine};
use crate::error::{AdvisoryError, Result};
use crate::normalizer::{normalize, paginate};
use crate::parser::parse_statement;
use crate::ranker::{into_recommendations, rank};
use crate::report::AnalysisReport;
use crate::schema::{
    Analysis, AnalysisStatus, FileStatus, ParseResult, Recommendation, RecommendationStatus,
    StatementFile, TransactionPage,
};
use crate::store::{ObjectStore, Repository};
use crate::analyze_parse_results;
use chrono::Utc;
use log::{info, warn};
use uuid::Uuid;

/// Outcome of parsing one file inside a batch.
#[derive(Debug)]
pub struct FileParseOutcome {
    pub file_id: String,
    pub result: Result<ParseResult>,
}

/// Runs the advisory workflow against the persistence and storage collaborators.
pub struct AdvisoryService<R, S> {
    repository: R,
    storage: S,
    engine: ScoringEngine,
    config: AdvisorConfig,
}

impl<R: Repository, S: ObjectStore> AdvisoryService<R, S> {
    pub fn new(repository: R, storage: S) -> Self {
        Self::with_config(repository, storage, AdvisorConfig::default())
    }

    pub fn with_config(repository: R, storage: S, config: AdvisorConfig) -> Self {
        Self {
            repository,
            storage,
            engine: ScoringEngine::new(),
            config,
        }
    }

    pub fn with_engine(mut self, engine: ScoringEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn config(&self) -> &AdvisorConfig {
        &self.config
    }

    /// Parses a stored statement file and records the result against it.
    /// Files that already have a parse result are rejected.
    pub fn parse_statement_file(&self, file_id: &str) -> Result<ParseResult> {
        let mut file = self
            .repository
            .get_statement_file(file_id)?
            .ok_or_else(|| AdvisoryError::not_found("StatementFile", file_id))?;

        if self.repository.get_parse_result_for_file(file_id)?.is_some() {
            return Err(AdvisoryError::BadRequest(format!(
                "Statement file {} has already been parsed",
                file_id
            )));
        }

        info!("Parsing statement file {} ({})", file.file_name, file.mime_type);
        file.status = FileStatus::Parsing;
        file.error = None;
        self.repository.update_statement_file(&file)?;

        let outcome = self.parse_and_store(&file);
        if let Err(e) = &outcome {
            file.status = FileStatus::Failed;
            file.error = Some(e.to_string());
            if let Err(update_err) = self.repository.update_statement_file(&file) {
                warn!(
                    "Could not mark statement file {} as failed: {}",
                    file.id, update_err
                );
            }
        }
        outcome
    }

    fn parse_and_store(&self, file: &StatementFile) -> Result<ParseResult> {
        let bytes = self.storage.fetch(&file.file_key)?;
        let statement = parse_statement(&bytes, &file.mime_type)?;

        let result = ParseResult {
            id: Uuid::new_v4().to_string(),
            statement_file_id: file.id.clone(),
            statement,
        };
        self.repository.insert_parse_result(result.clone())?;

        let mut parsed = file.clone();
        parsed.status = FileStatus::Parsed;
        self.repository.update_statement_file(&parsed)?;

        Ok(result)
    }

    /// Parses each file independently; one failure never stops the others.
    pub fn parse_statement_files(&self, file_ids: &[String]) -> Vec<FileParseOutcome> {
        file_ids
            .iter()
            .map(|file_id| {
                let result = self.parse_statement_file(file_id);
                if let Err(e) = &result {
                    warn!("Failed to parse statement file {}: {}", file_id, e);
                }
                FileParseOutcome {
                    file_id: file_id.clone(),
                    result,
                }
            })
            .collect()
    }

    fn load_parse_results(
        &self,
        file_ids: &[String],
        client_id: Option<&str>,
    ) -> Result<Vec<ParseResult>> {
        let mut results = Vec::with_capacity(file_ids.len());

        for file_id in file_ids {
            let file = self
                .repository
                .get_statement_file(file_id)?
                .ok_or_else(|| AdvisoryError::not_found("StatementFile", file_id.clone()))?;

            if let Some(client_id) = client_id {
                if file.client_id != client_id {
                    return Err(AdvisoryError::BadRequest(format!(
                        "Statement file {} does not belong to client {}",
                        file_id, client_id
                    )));
                }
            }

            let result = self
                .repository
                .get_parse_result_for_file(file_id)?
                .filter(|r| r.statement.status.is_usable())
                .ok_or_else(|| {
                    AdvisoryError::BadRequest(format!(
                        "Statement file {} has not been parsed successfully",
                        file_id
                    ))
                })?;

            results.push(result);
        }

        Ok(results)
    }

    /// Paginated, newest-first view over the transactions of the given files.
    pub fn get_transactions(
        &self,
        file_ids: &[String],
        page: usize,
        limit: usize,
    ) -> Result<TransactionPage> {
        let results = self.load_parse_results(file_ids, None)?;
        let limit = if limit == 0 { self.config.page_size } else { limit };
        Ok(paginate(normalize(&results), page, limit))
    }

    pub fn analyze_statements(
        &self,
        file_ids: &[String],
        client_id: &str,
        options: &AnalysisOptions,
    ) -> Result<Analysis> {
        if file_ids.is_empty() {
            return Err(AdvisoryError::BadRequest(
                "At least one statement file is required".to_string(),
            ));
        }

        self.repository
            .get_client(client_id)?
            .ok_or_else(|| AdvisoryError::not_found("Client", client_id))?;

        let results = self.load_parse_results(file_ids, Some(client_id))?;

        let threshold = options
            .idle_balance_threshold
            .unwrap_or(self.config.idle_balance_threshold);
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(AdvisoryError::BadRequest(format!(
                "Invalid idle balance threshold {}",
                threshold
            )));
        }

        info!(
            "Analyzing {} statement files for client {}",
            results.len(),
            client_id
        );

        let metrics = analyze_parse_results(&results, threshold);
        validate_metrics(&metrics)
            .map_err(|e| AdvisoryError::internal("computing analysis metrics", e))?;

        let analysis = Analysis {
            id: Uuid::new_v4().to_string(),
            client_id: client_id.to_string(),
            statement_file_ids: file_ids.to_vec(),
            status: AnalysisStatus::Completed,
            created_at: Utc::now(),
            metrics,
        };
        self.repository.insert_analysis(analysis.clone())?;

        info!(
            "Analysis {} completed over {} transactions ({:?})",
            analysis.id,
            analysis.metrics.summary.transaction_count,
            analysis.metrics.summary.date_range
        );

        Ok(analysis)
    }

    /// Scores the catalog against a completed analysis. A pending batch from
    /// an earlier run is replaced; once any recommendation has been reviewed
    /// the analysis can no longer be regenerated.
    pub fn generate_recommendations(
        &self,
        analysis_id: &str,
        max_recommendations: Option<usize>,
        options: &RecommendationOptions,
    ) -> Result<Vec<Recommendation>> {
        let analysis = self
            .repository
            .get_analysis(analysis_id)?
            .ok_or_else(|| AdvisoryError::not_found("Analysis", analysis_id))?;

        if analysis.status != AnalysisStatus::Completed {
            return Err(AdvisoryError::BadRequest(format!(
                "Analysis {} is not completed",
                analysis_id
            )));
        }

        let existing = self.repository.list_recommendations(analysis_id)?;
        if existing
            .iter()
            .any(|r| r.status != RecommendationStatus::Pending)
        {
            return Err(AdvisoryError::BadRequest(format!(
                "Analysis {} already has reviewed recommendations",
                analysis_id
            )));
        }

        let active_only = options.active_only.unwrap_or(self.config.active_only);
        let allowed: Option<Vec<String>> = options
            .categories
            .as_ref()
            .map(|cats| cats.iter().map(|c| c.trim().to_lowercase()).collect());

        let products: Vec<_> = self
            .repository
            .list_products()?
            .into_iter()
            .filter(|p| !active_only || p.is_active)
            .filter(|p| {
                allowed
                    .as_ref()
                    .map_or(true, |cats| cats.contains(&p.category_key()))
            })
            .collect();

        info!(
            "Scoring {} products against analysis {}",
            products.len(),
            analysis_id
        );

        let candidates = self.engine.evaluate_catalog(&products, &analysis.metrics)?;
        let max_count = max_recommendations.unwrap_or(self.config.max_recommendations);
        let ranked = rank(candidates, max_count, options.min_priority);

        let recommendations = into_recommendations(analysis_id, ranked);
        self.repository
            .replace_recommendations(analysis_id, recommendations.clone())?;

        info!(
            "Generated {} recommendations for analysis {}",
            recommendations.len(),
            analysis_id
        );

        Ok(recommendations)
    }

    pub fn list_recommendations(&self, analysis_id: &str) -> Result<Vec<Recommendation>> {
        self.repository.list_recommendations(analysis_id)
    }

    pub fn approve_recommendation(&self, id: &str, approver: &str) -> Result<Recommendation> {
        self.review_recommendation(id, approver, RecommendationStatus::Approved)
    }

    pub fn reject_recommendation(&self, id: &str, approver: &str) -> Result<Recommendation> {
        self.review_recommendation(id, approver, RecommendationStatus::Rejected)
    }

    fn review_recommendation(
        &self,
        id: &str,
        approver: &str,
        status: RecommendationStatus,
    ) -> Result<Recommendation> {
        let mut recommendation = self
            .repository
            .get_recommendation(id)?
            .ok_or_else(|| AdvisoryError::not_found("Recommendation", id))?;

        if recommendation.status != RecommendationStatus::Pending {
            return Err(AdvisoryError::BadRequest(format!(
                "Recommendation {} is already {:?}",
                id, recommendation.status
            )));
        }

        recommendation.status = status;
        recommendation.approved_by = Some(approver.to_string());
        recommendation.approved_at = Some(Utc::now());
        self.repository.update_recommendation(&recommendation)?;

        info!("Recommendation {} marked {:?} by {}", id, status, approver);
        Ok(recommendation)
    }

    pub fn delete_analysis(&self, analysis_id: &str) -> Result<()> {
        if !self.repository.delete_analysis(analysis_id)? {
            return Err(AdvisoryError::not_found("Analysis", analysis_id));
        }
        Ok(())
    }

    /// Plain data for the report-rendering collaborator.
    pub fn build_report(&self, analysis_id: &str) -> Result<AnalysisReport> {
        let analysis = self
            .repository
            .get_analysis(analysis_id)?
            .ok_or_else(|| AdvisoryError::not_found("Analysis", analysis_id))?;
        let recommendations = self.repository.list_recommendations(analysis_id)?;
        let products = self.repository.list_products()?;

        Ok(AnalysisReport::build(&analysis, &recommendations, &products))
    }
}
