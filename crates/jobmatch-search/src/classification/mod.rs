//! Zero-shot classification of query terms
//!
//! ```text
//! ClassificationProvider (trait)
//!     └── HuggingFaceClassifier - zero-shot-classification pipeline
//! ```

pub mod huggingface;
mod provider;

use std::sync::Arc;

pub use huggingface::{HuggingFaceClassifier, HuggingFaceClassifierConfig};
pub use provider::{ClassificationProvider, LabelScore};

/// Create the configured classifier as a shareable trait object
pub fn create_classifier(
    config: &HuggingFaceClassifierConfig,
) -> crate::Result<Arc<dyn ClassificationProvider>> {
    Ok(Arc::new(HuggingFaceClassifier::new(config.clone())?))
}
