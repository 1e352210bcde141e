use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use plansteer_core::config::AppConfig;
use plansteer_core::plan::PlanData;
use plansteer_core::state::WorkflowState;
use plansteer_executor::{PlanExecutor, PlanValidator};

#[derive(Parser)]
#[command(name = "plansteer", version, about = "Validate execution plans and route their steps")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "plansteer.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide the next node for a workflow state and print the state update
    Route {
        /// JSON snapshot of the workflow state
        #[arg(long)]
        state: Option<PathBuf>,
        /// Planner output to use as the plan (read as raw text)
        #[arg(long)]
        plan: Option<PathBuf>,
        /// 1-based number of the step that is due
        #[arg(long)]
        step: Option<usize>,
        /// Consecutive validation failures so far
        #[arg(long)]
        repair_count: Option<u32>,
        /// Pause for human review before running any step
        #[arg(long)]
        human_review: bool,
        /// Finish without a report once all steps have run
        #[arg(long)]
        only_nl2sql: bool,
    },
    /// Check a plan's structure
    Validate {
        /// Planner output to check (read as raw text)
        #[arg(long)]
        plan: PathBuf,
    },
    /// Show current configuration
    Config,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Handle completions before config loading
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(*shell, &mut cmd, "plansteer", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log.filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if cli.config.exists() {
        info!(path = %cli.config.display(), "Loaded config");
    } else {
        warn!(path = %cli.config.display(), "No config file found, using default node identifiers");
    }

    match cli.command {
        Commands::Route {
            state,
            plan,
            step,
            repair_count,
            human_review,
            only_nl2sql,
        } => {
            let mut snapshot = match state {
                Some(path) => read_state(&path)?,
                None => WorkflowState::default(),
            };
            if let Some(path) = plan {
                snapshot.plan = Some(PlanData::Text(read_text(&path)?));
            }
            if let Some(step) = step {
                snapshot.current_step = step;
            }
            if let Some(count) = repair_count {
                snapshot.repair_count = count;
            }
            snapshot.human_review_enabled |= human_review;
            snapshot.only_nl2sql |= only_nl2sql;

            let executor = PlanExecutor::from_config(&config);
            let update = executor.apply(&snapshot);
            let entries = serde_json::Value::Object(update.to_entries(executor.nodes()));
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        Commands::Validate { plan } => {
            let data = PlanData::Text(read_text(&plan)?);
            match PlanValidator::new(config.nodes.clone()).validate(Some(&data)) {
                Ok(plan) => println!("valid ({} steps)", plan.steps().len()),
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
        Commands::Completions { .. } => unreachable!("handled before config loading"),
    }

    Ok(())
}

/// Load the config file, falling back to defaults when it does not exist.
fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    if path.exists() {
        AppConfig::load(path).with_context(|| format!("loading {}", path.display()))
    } else {
        Ok(AppConfig::default())
    }
}

fn read_state(path: &Path) -> anyhow::Result<WorkflowState> {
    let text = read_text(path)?;
    serde_json::from_str(&text).with_context(|| format!("parsing state {}", path.display()))
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}
