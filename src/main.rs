// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use pdf_rag::pipeline::graph::{evaluate_graph, generate_graph, index_graph};
use pdf_rag::utils::logging::{format_error, format_step, format_success, init_logger};
use pdf_rag::{Config, PipelineOrchestrator, PipelineStats};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "pdf_rag")]
#[command(version = "0.1.0")]
#[command(about = "Retrieval-augmented question answering over PDF documents", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index the sources, answer every input query, then score faithfulness
    Run,

    /// Index the sources and report store statistics
    Index,

    /// Index the sources and write generated answers
    Generate,

    /// Score a previously written generated answers file
    Evaluate {
        /// Generated answers file; defaults to output.generated_answers
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,
    },

    /// Print the Mermaid description of each pipeline
    Graph,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logger(cli.color, cli.verbose);

    let result = match cli.command {
        Commands::Graph => cmd_graph(),
        Commands::Run => cmd_run(&load_orchestrator(&cli.config)?).await,
        Commands::Index => cmd_index(&load_orchestrator(&cli.config)?).await,
        Commands::Generate => cmd_generate(&load_orchestrator(&cli.config)?).await,
        Commands::Evaluate { input } => {
            cmd_evaluate(&load_orchestrator(&cli.config)?, input).await
        }
    };

    if let Err(e) = &result {
        eprintln!("{}", format_error(&format!("{:#}", e)));
    }
    result
}

fn load_orchestrator(config_path: &Path) -> Result<PipelineOrchestrator> {
    info!("Loading configuration from: {}", config_path.display());

    let config = if config_path.exists() {
        Config::load(Some(config_path)).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using default configuration",
            config_path.display()
        );
        Config::load(None).unwrap_or_else(|e| {
            warn!("Falling back to built-in defaults: {}", e);
            Config::default_config()
        })
    };

    PipelineOrchestrator::new(config).context("Failed to initialize pipeline components")
}

async fn cmd_run(orchestrator: &PipelineOrchestrator) -> Result<()> {
    let stats = orchestrator.run().await.context("Pipeline run failed")?;
    print_summary(&stats);
    Ok(())
}

async fn cmd_index(orchestrator: &PipelineOrchestrator) -> Result<()> {
    let start = Instant::now();
    let output = orchestrator.index().await.context("Indexing failed")?;

    let stats = PipelineStats {
        sources_indexed: output.sources,
        documents_indexed: output.store.count(),
        duration_secs: start.elapsed().as_secs(),
        ..Default::default()
    };

    let embedded = output
        .store
        .documents()
        .iter()
        .filter(|doc| doc.embedding.is_some())
        .count();

    println!(
        "{}",
        format_success(&format!(
            "Indexed {} chunks ({} embedded) from {} sources in {}s",
            stats.documents_indexed, embedded, stats.sources_indexed, stats.duration_secs
        ))
    );
    Ok(())
}

async fn cmd_generate(orchestrator: &PipelineOrchestrator) -> Result<()> {
    println!("{}", format_step(1, 2, "Indexing sources"));
    let output = orchestrator.index().await.context("Indexing failed")?;

    println!("{}", format_step(2, 2, "Generating answers"));
    let manifest = orchestrator
        .generate(Arc::new(output.store))
        .await
        .context("Answer generation failed")?;

    println!(
        "{}",
        format_success(&format!(
            "Wrote {} answers to {}",
            manifest.total_records,
            manifest.path.display()
        ))
    );
    Ok(())
}

async fn cmd_evaluate(orchestrator: &PipelineOrchestrator, input: Option<PathBuf>) -> Result<()> {
    let input = input.unwrap_or_else(|| orchestrator.config().output.generated_answers.clone());

    let report = orchestrator
        .evaluate(&input)
        .await
        .with_context(|| format!("Evaluation of {} failed", input.display()))?;

    let mean = report
        .mean_score
        .map(|score| format!("{:.3}", score))
        .unwrap_or_else(|| "n/a".to_string());

    println!(
        "{}",
        format_success(&format!(
            "Evaluated {} answers ({} skipped), mean faithfulness {}",
            report.evaluated, report.skipped, mean
        ))
    );
    Ok(())
}

fn cmd_graph() -> Result<()> {
    for graph in [index_graph(), generate_graph(), evaluate_graph()] {
        graph
            .validate()
            .with_context(|| format!("Pipeline graph '{}' is inconsistent", graph.name))?;
        println!("%% {} pipeline", graph.name);
        println!("{}", graph.to_mermaid());
    }
    Ok(())
}

fn print_summary(stats: &PipelineStats) {
    println!("{}", format_success("Pipeline run complete"));
    for line in stats.summary_lines() {
        println!("  {}", line);
    }
}
