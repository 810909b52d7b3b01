use crate::error::Result;
use crate::schema::Priority;
use serde::{Deserialize, Serialize};

pub const DEFAULT_IDLE_BALANCE_THRESHOLD: f64 = 100_000.0;
pub const DEFAULT_MAX_RECOMMENDATIONS: usize = 5;
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Engine-wide defaults. Every field may be omitted from the JSON form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AdvisorConfig {
    /// Balance level above which cash counts as idle.
    pub idle_balance_threshold: f64,
    pub max_recommendations: usize,
    pub active_only: bool,
    pub page_size: usize,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            idle_balance_threshold: DEFAULT_IDLE_BALANCE_THRESHOLD,
            max_recommendations: DEFAULT_MAX_RECOMMENDATIONS,
            active_only: true,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl AdvisorConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisOptions {
    pub idle_balance_threshold: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RecommendationOptions {
    pub active_only: Option<bool>,
    /// Case-insensitive allow-list of product categories.
    pub categories: Option<Vec<String>>,
    pub min_priority: Option<Priority>,
}
