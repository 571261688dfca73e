use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use clap::Subcommand;
use tracing::info;
use tracing_subscriber::EnvFilter;

use devflow_content::create_service;
use devflow_core::config::PipelineConfig;
use devflow_engine::{FsArtifactStore, Pipeline};

#[derive(Parser)]
#[command(name = "devflow", version, about = "LLM-driven software delivery pipeline")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "devflow.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline for a requirements text
    Run {
        /// The product requirements to deliver
        #[arg(trailing_var_arg = true)]
        requirements: Vec<String>,
    },
    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = PipelineConfig::load(&cli.config)?;

    match cli.command {
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
        Commands::Run { requirements } => {
            let requirements = requirements.join(" ");
            let service = create_service(&config.model, &config.retry);
            let store = Arc::new(FsArtifactStore::new(&config.engine.artifact_dir));
            let pipeline = Pipeline::new(service, store, config.engine.max_visits)?;

            // Ctrl-C stops the run at the next node boundary
            let cancel = pipeline.cancel_token();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            });

            match pipeline.run(&requirements).await {
                Ok(report) => {
                    info!(run_id = %report.run_id, "Run finished");
                    for entry in &report.trace {
                        println!("{:>3}. {:<32} {}", entry.seq + 1, entry.node.name(), entry.status);
                    }
                    println!("\nFinal state:");
                    println!("{}", serde_json::to_string_pretty(&report.state)?);
                }
                Err(failure) => {
                    for entry in &failure.trace {
                        eprintln!("{:>3}. {:<32} {}", entry.seq + 1, entry.node.name(), entry.status);
                    }
                    anyhow::bail!("pipeline run failed: {}", failure.error);
                }
            }
        }
    }

    Ok(())
}
