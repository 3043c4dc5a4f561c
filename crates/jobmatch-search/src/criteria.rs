//! Query criteria extraction
//!
//! A query is a pipe-separated list of terms. Each term is classified against
//! the four criteria labels independently; a term fills the field of its best
//! label when that label's score is strictly above [`ACCEPTANCE_THRESHOLD`].
//! When several terms land on the same field, the last one wins.

use std::sync::Arc;

use futures::future::join_all;
use tracing::debug;

use crate::classification::{ClassificationProvider, LabelScore};
use crate::error::Result;
use crate::schema::{CriteriaField, FilterCriteria};

/// Minimum (exclusive) confidence for a term to be assigned
pub const ACCEPTANCE_THRESHOLD: f32 = 0.5;

/// Separator between query terms
pub const TERM_DELIMITER: char = '|';

/// Labels offered to the classifier, in field order
pub fn candidate_labels() -> [&'static str; 4] {
    CriteriaField::ALL.map(CriteriaField::label)
}

/// Split a raw query into terms without trimming or dropping empties
pub fn split_terms(query: &str) -> Vec<&str> {
    query.split(TERM_DELIMITER).collect()
}

/// Highest-scoring entry; on ties the earliest wins
fn best_label(scores: &[LabelScore]) -> Option<&LabelScore> {
    scores.iter().fold(None, |best: Option<&LabelScore>, candidate| match best {
        Some(current) if current.score >= candidate.score => Some(current),
        _ => Some(candidate),
    })
}

/// Field a term should fill, if its best label clears the threshold
pub fn assign_field(scores: &[LabelScore]) -> Option<CriteriaField> {
    let best = best_label(scores)?;
    if best.score > ACCEPTANCE_THRESHOLD {
        CriteriaField::from_label(&best.label)
    } else {
        None
    }
}

/// Turns free-text queries into [`FilterCriteria`]
pub struct CriteriaExtractor {
    classifier: Arc<dyn ClassificationProvider>,
}

impl CriteriaExtractor {
    pub fn new(classifier: Arc<dyn ClassificationProvider>) -> Self {
        Self { classifier }
    }

    /// Classify every term concurrently and fold the results in term order.
    ///
    /// The first failing term, in term order, aborts extraction.
    pub async fn extract(&self, query: &str) -> Result<FilterCriteria> {
        let labels = candidate_labels();
        let terms = split_terms(query);

        let classified = join_all(
            terms
                .iter()
                .map(|term| self.classifier.classify(term, &labels)),
        )
        .await;

        let mut criteria = FilterCriteria::default();
        for (term, scores) in terms.iter().zip(classified) {
            let scores = scores?;
            match assign_field(&scores) {
                Some(field) => {
                    debug!("Term '{}' -> {}", term, field);
                    criteria.set(field, *term);
                }
                None => debug!(
                    "Term '{}' unassigned (best: {:?})",
                    term,
                    best_label(&scores).map(|s| (&s.label, s.score))
                ),
            }
        }

        Ok(criteria)
    }
}

impl std::fmt::Debug for CriteriaExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CriteriaExtractor").finish_non_exhaustive()
    }
}
