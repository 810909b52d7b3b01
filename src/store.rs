//! Seams to the persistence and object-storage collaborators, plus
//! in-memory implementations for embedding and tests.

use crate::error::{AdvisoryError, Result};
use crate::product::TreasuryProduct;
use crate::schema::{Analysis, Client, ParseResult, Recommendation, StatementFile};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

pub trait Repository: Send + Sync {
    fn get_client(&self, id: &str) -> Result<Option<Client>>;

    fn get_statement_file(&self, id: &str) -> Result<Option<StatementFile>>;
    fn update_statement_file(&self, file: &StatementFile) -> Result<()>;

    fn get_parse_result_for_file(&self, file_id: &str) -> Result<Option<ParseResult>>;
    fn insert_parse_result(&self, result: ParseResult) -> Result<()>;

    fn insert_analysis(&self, analysis: Analysis) -> Result<()>;
    fn get_analysis(&self, id: &str) -> Result<Option<Analysis>>;
    /// Returns whether an analysis was removed.
    fn delete_analysis(&self, id: &str) -> Result<bool>;

    fn list_products(&self) -> Result<Vec<TreasuryProduct>>;

    /// Swaps the stored batch for one analysis with `recommendations`.
    fn replace_recommendations(
        &self,
        analysis_id: &str,
        recommendations: Vec<Recommendation>,
    ) -> Result<()>;
    fn get_recommendation(&self, id: &str) -> Result<Option<Recommendation>>;
    fn update_recommendation(&self, recommendation: &Recommendation) -> Result<()>;
    /// Recommendations for one analysis in ranked order.
    fn list_recommendations(&self, analysis_id: &str) -> Result<Vec<Recommendation>>;
}

pub trait ObjectStore: Send + Sync {
    fn fetch(&self, file_key: &str) -> Result<Vec<u8>>;
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|e| AdvisoryError::internal("reading in-memory store", e))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|e| AdvisoryError::internal("writing in-memory store", e))
}

#[derive(Default)]
pub struct InMemoryRepository {
    clients: RwLock<HashMap<String, Client>>,
    statement_files: RwLock<HashMap<String, StatementFile>>,
    parse_results: RwLock<HashMap<String, ParseResult>>,
    analyses: RwLock<HashMap<String, Analysis>>,
    products: RwLock<Vec<TreasuryProduct>>,
    recommendations: RwLock<Vec<Recommendation>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_client(&self, client: Client) -> Result<()> {
        write(&self.clients)?.insert(client.id.clone(), client);
        Ok(())
    }

    pub fn add_statement_file(&self, file: StatementFile) -> Result<()> {
        write(&self.statement_files)?.insert(file.id.clone(), file);
        Ok(())
    }

    pub fn add_product(&self, product: TreasuryProduct) -> Result<()> {
        write(&self.products)?.push(product);
        Ok(())
    }
}

impl Repository for InMemoryRepository {
    fn get_client(&self, id: &str) -> Result<Option<Client>> {
        Ok(read(&self.clients)?.get(id).cloned())
    }

    fn get_statement_file(&self, id: &str) -> Result<Option<StatementFile>> {
        Ok(read(&self.statement_files)?.get(id).cloned())
    }

    fn update_statement_file(&self, file: &StatementFile) -> Result<()> {
        let mut files = write(&self.statement_files)?;
        match files.get_mut(&file.id) {
            Some(existing) => {
                *existing = file.clone();
                Ok(())
            }
            None => Err(AdvisoryError::not_found("StatementFile", file.id.clone())),
        }
    }

    fn get_parse_result_for_file(&self, file_id: &str) -> Result<Option<ParseResult>> {
        Ok(read(&self.parse_results)?.get(file_id).cloned())
    }

    fn insert_parse_result(&self, result: ParseResult) -> Result<()> {
        let mut results = write(&self.parse_results)?;
        if results.contains_key(&result.statement_file_id) {
            return Err(AdvisoryError::BadRequest(format!(
                "Statement file {} already has a parse result",
                result.statement_file_id
            )));
        }
        results.insert(result.statement_file_id.clone(), result);
        Ok(())
    }

    fn insert_analysis(&self, analysis: Analysis) -> Result<()> {
        write(&self.analyses)?.insert(analysis.id.clone(), analysis);
        Ok(())
    }

    fn get_analysis(&self, id: &str) -> Result<Option<Analysis>> {
        Ok(read(&self.analyses)?.get(id).cloned())
    }

    fn delete_analysis(&self, id: &str) -> Result<bool> {
        let removed = write(&self.analyses)?.remove(id).is_some();
        if removed {
            write(&self.recommendations)?.retain(|r| r.analysis_id != id);
        }
        Ok(removed)
    }

    fn list_products(&self) -> Result<Vec<TreasuryProduct>> {
        Ok(read(&self.products)?.clone())
    }

    fn replace_recommendations(
        &self,
        analysis_id: &str,
        recommendations: Vec<Recommendation>,
    ) -> Result<()> {
        let mut stored = write(&self.recommendations)?;
        stored.retain(|r| r.analysis_id != analysis_id);
        stored.extend(recommendations);
        Ok(())
    }

    fn get_recommendation(&self, id: &str) -> Result<Option<Recommendation>> {
        Ok(read(&self.recommendations)?
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    fn update_recommendation(&self, recommendation: &Recommendation) -> Result<()> {
        let mut recommendations = write(&self.recommendations)?;
        match recommendations.iter_mut().find(|r| r.id == recommendation.id) {
            Some(existing) => {
                *existing = recommendation.clone();
                Ok(())
            }
            None => Err(AdvisoryError::not_found(
                "Recommendation",
                recommendation.id.clone(),
            )),
        }
    }

    fn list_recommendations(&self, analysis_id: &str) -> Result<Vec<Recommendation>> {
        let mut found: Vec<Recommendation> = read(&self.recommendations)?
            .iter()
            .filter(|r| r.analysis_id == analysis_id)
            .cloned()
            .collect();
        found.sort_by_key(|r| r.rank);
        Ok(found)
    }
}

#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, file_key: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Result<()> {
        write(&self.objects)?.insert(file_key.into(), bytes.into());
        Ok(())
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn fetch(&self, file_key: &str) -> Result<Vec<u8>> {
        read(&self.objects)?
            .get(file_key)
            .cloned()
            .ok_or_else(|| AdvisoryError::not_found("Object", file_key))
    }
}
