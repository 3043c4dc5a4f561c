//! Search command - Match a pipe-separated query against the job corpus

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use jobmatch_config::JobmatchConfig;
use jobmatch_search::{resolve_query, FilterMode, QueryReport, SearchOutcome};
use tracing::error;

use super::create_orchestrator;
use crate::progress;
use crate::GlobalOptions;

/// Arguments for the search command
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Search query, keywords separated with pipes (prompted when omitted)
    query: Option<String>,

    /// Output format: text (default), json
    #[arg(long, short = 'o', default_value = "text")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for scripting
    Json,
}

/// Execute the search command
pub async fn execute(args: SearchArgs, global: GlobalOptions, config: JobmatchConfig) -> Result<()> {
    let default_query = config.search.default_query.clone();
    let raw = match args.query {
        Some(query) => Some(query),
        None => prompt_query(&default_query)?,
    };
    let query = resolve_query(raw.as_deref(), &default_query);

    let mut orchestrator = create_orchestrator(&config).await?;

    let pb = progress::spinner(
        &format!("Indexing {} job postings...", orchestrator.corpus().len()),
        global.quiet,
    );
    match orchestrator.ensure_indexed().await {
        Ok(stats) => progress::finish_spinner(
            pb,
            &format!(
                "Indexed {} postings ({} ids rewritten)",
                stats.total_indexed, stats.ids_rewritten
            ),
        ),
        Err(e) => {
            progress::finish_spinner_error(pb, "Indexing failed");
            error!("Indexing failed: {}", e);
            return Err(e).context("Failed to index job postings");
        }
    }

    let report = orchestrator
        .run(&query)
        .await
        .context("Failed to process query")?;

    match args.output {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&report).context("Failed to serialize results")?;
            println!("{}", json);
        }
        OutputFormat::Text => print_report(&report),
    }

    Ok(())
}

/// Ask for a query on stdin. `None` when stdin is closed.
fn prompt_query(default_query: &str) -> Result<Option<String>> {
    let mut stdout = std::io::stdout();
    write!(
        stdout,
        "Enter your job search query, keywords separated with pipes (|) [default: {}]: ",
        default_query
    )?;
    stdout.flush()?;

    let mut line = String::new();
    let read = std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read query from stdin")?;
    Ok((read > 0).then_some(line))
}

fn print_report(report: &QueryReport) {
    println!("Query: {}", report.query);
    print_criteria(report);

    match &report.outcome {
        SearchOutcome::Failed { reason } => {
            println!("Search failed: {}", reason);
        }
        SearchOutcome::Matches { results } if results.is_empty() => {
            println!("No items found similar to \"{}\"", report.query);
        }
        SearchOutcome::Matches { results } => {
            println!("Query results:");
            for (i, result) in results.iter().enumerate() {
                let posting = &result.posting;
                println!(
                    "Top {} jobTitle: {}, jobType: {}, jobDescription: {}, location: {}, Company: {}",
                    i + 1,
                    posting.job_title,
                    posting.job_type,
                    posting.job_description,
                    posting.location,
                    posting.company
                );
            }
        }
    }
}

fn print_criteria(report: &QueryReport) {
    let fields: Vec<String> = report
        .criteria
        .populated()
        .map(|(field, term)| format!("{}: {}", field, term))
        .collect();

    let note = match report.filter_mode {
        FilterMode::Diagnostic => " (not applied)",
        FilterMode::PostFilter => "",
    };

    if fields.is_empty() {
        println!("Filter Criteria: {{}}{}", note);
    } else {
        println!("Filter Criteria: {{ {} }}{}", fields.join(", "), note);
    }
}
