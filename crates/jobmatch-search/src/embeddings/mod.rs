//! Embedding generation for job postings and queries
//!
//! Providers wrap remote inference services behind one trait:
//!
//! ```text
//! EmbeddingProvider (trait)
//!     ├── HuggingFaceEmbedder  - feature-extraction pipeline
//!     └── OpenAIEmbedder       - /v1/embeddings API
//! ```

pub mod factory;
pub mod huggingface;
pub mod openai;
mod provider;

// Re-export provider types
pub use provider::{EmbeddingProvider, EmbeddingProviderType, ProviderStatus};

// Re-export factory types and function
pub use factory::{create as create_provider, EmbeddingConfig};

pub use huggingface::{HuggingFaceEmbedder, HuggingFaceEmbedderConfig};
pub use openai::{OpenAIConfig, OpenAIEmbedder};
