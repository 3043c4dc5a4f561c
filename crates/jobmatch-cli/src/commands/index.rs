//! Index command - Embed the job postings and write them to the vector store

use anyhow::{Context, Result};
use clap::Args;
use jobmatch_config::{JobmatchConfig, StoreBackend};
use jobmatch_search::{CorpusIndexer, VectorStore};
use std::sync::Arc;
use tracing::{error, warn};

use super::{build_embedder, build_store, connect_qdrant, load_corpus, print_info};
use crate::progress;
use crate::GlobalOptions;

/// Arguments for the index command
#[derive(Args, Debug)]
pub struct IndexArgs {
    /// Drop the collection before indexing (qdrant only)
    #[arg(long)]
    recreate: bool,

    /// Texts per embedding request
    #[arg(long, default_value = "64")]
    batch_size: usize,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Execute the index command
pub async fn execute(args: IndexArgs, global: GlobalOptions, config: JobmatchConfig) -> Result<()> {
    let mut corpus = load_corpus(&config)?;
    let embedder = build_embedder(&config)?;

    let store: Arc<dyn VectorStore> = match config.store.backend {
        StoreBackend::Qdrant => {
            let qdrant = connect_qdrant(&config).await?;
            if args.recreate {
                qdrant
                    .delete_collection(&config.store.collection)
                    .await
                    .context("Failed to drop collection")?;
            }
            Arc::new(qdrant)
        }
        StoreBackend::Memory => {
            warn!("Memory store selected; the index is discarded when this command exits");
            build_store(&config).await?
        }
    };

    let indexer = CorpusIndexer::new(embedder, store, config.store.collection.clone())
        .with_embedding_batch_size(args.batch_size);

    let pb = progress::spinner(
        &format!(
            "Indexing {} job postings into '{}'...",
            corpus.len(),
            indexer.collection()
        ),
        global.quiet || args.json,
    );

    let stats = match indexer.index(&mut corpus).await {
        Ok(stats) => {
            progress::clear_spinner(pb);
            stats
        }
        Err(e) => {
            progress::finish_spinner_error(pb, "Indexing failed");
            error!("Indexing failed: {}", e);
            return Err(e).context("Failed to index job postings");
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!(
        "Indexed {} of {} postings into '{}' ({} backend)",
        stats.total_indexed,
        stats.total_postings,
        config.store.collection,
        config.store.backend
    );
    print_info(
        &format!(
            "  Duplicate ids rewritten: {}\n  Vector dimension: {}",
            stats.ids_rewritten, stats.dimension
        ),
        global.quiet,
    );

    Ok(())
}
