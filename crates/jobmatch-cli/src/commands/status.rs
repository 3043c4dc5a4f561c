//! Status command - Show provider reachability and index status

use anyhow::Result;
use clap::Args;
use jobmatch_config::{JobmatchConfig, StoreBackend};
use jobmatch_search::ProviderStatus;

use super::{build_classifier, build_embedder, build_store};
use crate::GlobalOptions;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Execute the status command
///
/// Component failures are reported in the output rather than aborting.
pub async fn execute(args: StatusArgs, global: GlobalOptions, config: JobmatchConfig) -> Result<()> {
    let embedding = match build_embedder(&config) {
        Ok(embedder) => embedder.check_status().await.map_err(|e| e.to_string()),
        Err(e) => Err(format!("{:#}", e)),
    };

    let classification = match build_classifier(&config) {
        Ok(classifier) => classifier.check_status().await.map_err(|e| e.to_string()),
        Err(e) => Err(format!("{:#}", e)),
    };

    let collection = &config.store.collection;
    let indexed = match build_store(&config).await {
        Ok(store) => store.count(collection).await.map_err(|e| e.to_string()),
        Err(e) => Err(format!("{:#}", e)),
    };

    if args.json {
        let status = serde_json::json!({
            "corpus": config.corpus.path,
            "store": {
                "backend": config.store.backend.to_string(),
                "collection": collection,
                "indexed": indexed.as_ref().ok(),
                "error": indexed.as_ref().err(),
            },
            "embedding": provider_json(&embedding),
            "classification": provider_json(&classification),
            "filter_mode": config.search.filter_mode,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("Jobmatch Status");
    println!("===============\n");
    println!("Corpus:        {}", config.corpus.path.display());
    println!("Store:         {} ({})", config.store.backend, collection);
    match &indexed {
        Ok(count) => println!("Indexed:       {} postings", count),
        Err(e) => println!("Indexed:       unavailable ({})", e),
    }
    println!();
    print_provider("Embedding", &embedding);
    print_provider("Classification", &classification);

    if !global.quiet {
        match config.store.backend {
            StoreBackend::Memory => {
                eprintln!("\nMemory store: the corpus is indexed at the start of each search.")
            }
            StoreBackend::Qdrant if indexed.as_ref().is_ok_and(|count| *count == 0) => {
                eprintln!("\nCollection is empty. Run 'jobmatch index' to populate it.")
            }
            StoreBackend::Qdrant => {}
        }
    }

    Ok(())
}

fn provider_json(status: &std::result::Result<ProviderStatus, String>) -> serde_json::Value {
    match status {
        Ok(status) => serde_json::to_value(status).unwrap_or(serde_json::Value::Null),
        Err(e) => serde_json::json!({ "available": false, "error": e }),
    }
}

fn print_provider(name: &str, status: &std::result::Result<ProviderStatus, String>) {
    match status {
        Ok(status) if status.available => {
            let latency = status
                .latency_ms
                .map(|ms| format!(" in {}ms", ms))
                .unwrap_or_default();
            println!(
                "{:<15}✓ {} / {}{}",
                format!("{}:", name),
                status.provider,
                status.model,
                latency
            );
        }
        Ok(status) => println!(
            "{:<15}✗ {} / {} ({})",
            format!("{}:", name),
            status.provider,
            status.model,
            status.error.as_deref().unwrap_or("unavailable")
        ),
        Err(e) => println!("{:<15}✗ {}", format!("{}:", name), e),
    }
}
