use crate::schema::{Priority, Recommendation, RecommendationCandidate, RecommendationStatus};
use std::cmp::Reverse;
use uuid::Uuid;

/// Orders candidates by priority weight, drops those below `min_priority`
/// and keeps at most `max_count`. Equal priorities keep their catalog order.
pub fn rank(
    mut candidates: Vec<RecommendationCandidate>,
    max_count: usize,
    min_priority: Option<Priority>,
) -> Vec<RecommendationCandidate> {
    candidates.sort_by_key(|c| Reverse(c.priority.weight()));

    if let Some(min) = min_priority {
        candidates.retain(|c| c.priority.weight() >= min.weight());
    }

    candidates.truncate(max_count);
    candidates
}

/// Turns ranked candidates into pending recommendations for one analysis.
pub fn into_recommendations(
    analysis_id: &str,
    ranked: Vec<RecommendationCandidate>,
) -> Vec<Recommendation> {
    ranked
        .into_iter()
        .enumerate()
        .map(|(idx, candidate)| Recommendation {
            id: Uuid::new_v4().to_string(),
            analysis_id: analysis_id.to_string(),
            product_id: candidate.product_id,
            rank: idx + 1,
            priority: candidate.priority,
            rationale: candidate.rationale,
            data_points: candidate.data_points,
            benefit_projection: candidate.benefit_projection,
            status: RecommendationStatus::Pending,
            approved_by: None,
            approved_at: None,
        })
        .collect()
}
