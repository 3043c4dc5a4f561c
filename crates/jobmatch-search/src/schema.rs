//! Job posting records, query criteria, and ranked results
//!
//! Field names follow the camelCase layout of the job posting source so a
//! corpus file deserializes directly into [`JobPosting`].

use serde::{Deserialize, Deserializer, Serialize};

/// Collection used when none is configured
pub const DEFAULT_COLLECTION: &str = "job_collection";

/// Payload field names stored alongside vectors
pub mod fields {
    /// Job id as it appears in the corpus after deduplication
    pub const JOB_ID: &str = "job_id";
    /// Document text that was embedded
    pub const DOCUMENT: &str = "document";
}

/// One job listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    /// Stable identifier; numeric ids in the source are kept in string form
    #[serde(deserialize_with = "string_or_number")]
    pub job_id: String,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub job_description: String,
    /// Employment status, e.g. "Full-Time"
    #[serde(default)]
    pub job_type: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub company: String,
}

impl JobPosting {
    /// Build the text that gets embedded for this posting.
    ///
    /// The labels and field order must stay in sync with documents already
    /// stored in a persistent collection.
    pub fn document_text(&self) -> String {
        format!(
            "jobTitle: {}. jobDescription: {}. jobType: {}. jobLocation: {}",
            self.job_title, self.job_description, self.job_type, self.location
        )
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
        RawId::Float(f) => f.to_string(),
    })
}

/// Semantic field a query term can be assigned to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriteriaField {
    Location,
    JobTitle,
    Company,
    JobType,
}

impl CriteriaField {
    /// All fields, in candidate label order
    pub const ALL: [CriteriaField; 4] = [
        CriteriaField::Location,
        CriteriaField::JobTitle,
        CriteriaField::Company,
        CriteriaField::JobType,
    ];

    /// Candidate label offered to the zero-shot classifier
    pub fn label(self) -> &'static str {
        match self {
            CriteriaField::Location => "location",
            CriteriaField::JobTitle => "job title",
            CriteriaField::Company => "company",
            CriteriaField::JobType => "employment status",
        }
    }

    /// Map a classifier label back to its field
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.label() == label)
    }

    /// The posting attribute this field describes
    pub fn value_of(self, posting: &JobPosting) -> &str {
        match self {
            CriteriaField::Location => &posting.location,
            CriteriaField::JobTitle => &posting.job_title,
            CriteriaField::Company => &posting.company,
            CriteriaField::JobType => &posting.job_type,
        }
    }
}

impl std::fmt::Display for CriteriaField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Structured interpretation of a free-text query
///
/// Each field holds at most one query term.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    pub location: Option<String>,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub job_type: Option<String>,
}

impl FilterCriteria {
    /// Assign a term to a field, replacing any earlier term
    pub fn set(&mut self, field: CriteriaField, term: impl Into<String>) {
        let slot = match field {
            CriteriaField::Location => &mut self.location,
            CriteriaField::JobTitle => &mut self.job_title,
            CriteriaField::Company => &mut self.company,
            CriteriaField::JobType => &mut self.job_type,
        };
        *slot = Some(term.into());
    }

    pub fn get(&self, field: CriteriaField) -> Option<&str> {
        match field {
            CriteriaField::Location => self.location.as_deref(),
            CriteriaField::JobTitle => self.job_title.as_deref(),
            CriteriaField::Company => self.company.as_deref(),
            CriteriaField::JobType => self.job_type.as_deref(),
        }
    }

    /// Populated fields with their terms
    pub fn populated(&self) -> impl Iterator<Item = (CriteriaField, &str)> + '_ {
        CriteriaField::ALL
            .into_iter()
            .filter_map(|field| self.get(field).map(|term| (field, term)))
    }

    pub fn is_empty(&self) -> bool {
        self.populated().next().is_none()
    }

    /// Whether a posting satisfies every populated criterion.
    ///
    /// A criterion matches when the posting's field contains the term,
    /// case-insensitively and ignoring whitespace around the term.
    pub fn matches(&self, posting: &JobPosting) -> bool {
        self.populated().all(|(field, term)| {
            let needle = term.trim().to_lowercase();
            needle.is_empty() || field.value_of(posting).to_lowercase().contains(&needle)
        })
    }
}

/// A posting enriched with its similarity distance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult {
    /// Vector store key
    pub id: String,
    /// Distance to the query vector; lower is more similar
    pub score: f32,
    #[serde(flatten)]
    pub posting: JobPosting,
}
