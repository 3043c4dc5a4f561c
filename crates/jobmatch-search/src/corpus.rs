//! In-memory job posting corpus
//!
//! Holds the postings that search results are joined against. Ids are unique
//! once [`Corpus::assign_unique_ids`] has run.

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Result, SearchError};
use crate::schema::JobPosting;

/// Ordered collection of job postings
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    postings: Vec<JobPosting>,
}

impl Corpus {
    pub fn new(postings: Vec<JobPosting>) -> Self {
        Self { postings }
    }

    /// Load a JSON array of postings from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SearchError::Corpus(format!("failed to read '{}': {}", path.display(), e))
        })?;
        let postings: Vec<JobPosting> = serde_json::from_str(&content).map_err(|e| {
            SearchError::Corpus(format!("failed to parse '{}': {}", path.display(), e))
        })?;

        info!("Loaded {} job postings from {}", postings.len(), path.display());
        Ok(Self { postings })
    }

    pub fn postings(&self) -> &[JobPosting] {
        &self.postings
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Find the posting whose id equals `id` exactly
    pub fn find(&self, id: &str) -> Option<&JobPosting> {
        self.postings.iter().find(|posting| posting.job_id == id)
    }

    /// Rewrite colliding ids in place so every id is unique.
    ///
    /// A taken id at position `i` becomes `{id}_{i}`, repeated until free.
    /// The outcome depends only on input order. Returns the number of
    /// postings whose id changed.
    pub fn assign_unique_ids(&mut self) -> usize {
        let mut taken: HashSet<String> = HashSet::with_capacity(self.postings.len());
        let mut rewritten = 0;

        for (index, posting) in self.postings.iter_mut().enumerate() {
            let original = posting.job_id.clone();
            while taken.contains(&posting.job_id) {
                posting.job_id = format!("{}_{}", posting.job_id, index);
            }
            if posting.job_id != original {
                debug!("Rewrote duplicate job id '{}' -> '{}'", original, posting.job_id);
                rewritten += 1;
            }
            taken.insert(posting.job_id.clone());
        }

        rewritten
    }
}

impl From<Vec<JobPosting>> for Corpus {
    fn from(postings: Vec<JobPosting>) -> Self {
        Self::new(postings)
    }
}
