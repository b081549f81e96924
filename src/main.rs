//! `scenario-miner` CLI: mine reproducible scenarios from Git history, and
//! drive one scenario through the sandboxed replay/evaluation harness.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;

use scenario_core::{LanguageFilter, MinerConfig, ScenarioMiner};
use scenario_git::GitView;
use scenario_miner::config::MinerToolConfig;
use scenario_sandbox::{
    RebaseEvaluationMode, RuntimeConfig, SandboxRuntime, ScenarioDriver, ScenarioDriverConfig,
    ScenarioInput,
};

/// Mines Git history into reproducible scenarios and replays them in a
/// sandboxed container for agent evaluation.
#[derive(Parser)]
#[command(name = "scenario-miner")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a `scenario-miner.toml` config file. Missing file uses
    /// built-in defaults.
    #[arg(long, global = true, default_value = "scenario-miner.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mine one repository's history for file-commit-gram, merge, and
    /// cherry-pick scenarios.
    Mine {
        /// Path to the repository to mine.
        #[arg(long)]
        repo_path: PathBuf,

        /// Minimum run length for a file-commit-gram to be reported.
        #[arg(long)]
        sliding_window_size: Option<usize>,

        /// Which file extension to track.
        #[arg(long, value_parser = ["python", "java", "kotlin", "text"])]
        programming_language: Option<String>,
    },

    /// Replay one scenario inside a sandboxed container and print its
    /// verdict. Does not itself invoke an agent — the scenario file's
    /// caller is expected to have already driven the agent to completion
    /// on the isolation branch before `eval` is invoked.
    Eval {
        /// Path to a JSON file describing the scenario to replay.
        #[arg(long)]
        scenario_file: PathBuf,
    },
}

/// The on-disk shape of a scenario file consumed by `eval`.
#[derive(Deserialize)]
struct EvalScenarioFile {
    repo_name: String,
    #[serde(default)]
    clone_dir: Option<String>,
    scenario: ScenarioInput,
    #[serde(default)]
    rebase_mode: RebaseEvaluationMode,
}

fn main() -> Result<()> {
    scenario_miner::telemetry::init();
    let cli = Cli::parse();
    let config = MinerToolConfig::load(&cli.config).context("loading config")?;

    match cli.command {
        Commands::Mine {
            repo_path,
            sliding_window_size,
            programming_language,
        } => run_mine(&config, &repo_path, sliding_window_size, programming_language),
        Commands::Eval { scenario_file } => run_eval(&config, &scenario_file),
    }
}

fn run_mine(
    config: &MinerToolConfig,
    repo_path: &std::path::Path,
    sliding_window_size: Option<usize>,
    programming_language: Option<String>,
) -> Result<()> {
    let window_size = sliding_window_size.unwrap_or(config.mining.sliding_window_size);
    let window_size = NonZeroUsize::new(window_size)
        .context("--sliding-window-size must be a positive integer")?;

    let language = programming_language.unwrap_or_else(|| config.mining.programming_language.clone());
    let language_filter = LanguageFilter::parse(&language)
        .with_context(|| format!("unsupported --programming-language `{language}`"))?;

    let view = GitView::open(repo_path);
    view.ensure_repository()
        .with_context(|| format!("{} is not a git repository", repo_path.display()))?;

    let mut miner = ScenarioMiner::new(MinerConfig {
        window_size,
        language_filter,
    });
    let record = miner.mine(&view);

    let json = serde_json::to_string_pretty(&record).context("serializing scenario record")?;
    println!("{json}");

    if let Some(trace) = &record.error_trace {
        eprintln!("mining completed with diagnostics:\n{trace}");
    }

    Ok(())
}

fn run_eval(config: &MinerToolConfig, scenario_file: &std::path::Path) -> Result<()> {
    let contents = std::fs::read_to_string(scenario_file)
        .with_context(|| format!("reading scenario file {}", scenario_file.display()))?;
    let file: EvalScenarioFile =
        serde_json::from_str(&contents).context("parsing scenario file")?;

    let clone_dir = file.clone_dir.unwrap_or_else(|| "/work/repo".to_owned());
    let runtime_config = RuntimeConfig {
        exec_timeout_secs: config.sandbox.exec_timeout_secs,
        output_cap_bytes: config.sandbox.output_cap_bytes,
        ..RuntimeConfig::default()
    };
    let mut runtime = SandboxRuntime::new(&config.sandbox.image, runtime_config);

    runtime.ensure_image().context("ensuring sandbox image")?;
    runtime.create().context("creating sandbox container")?;
    runtime.start().context("starting sandbox container")?;

    let driver_config = ScenarioDriverConfig {
        rebase_mode: file.rebase_mode,
    };
    let mut driver = ScenarioDriver::new(&runtime, clone_dir, driver_config);

    let result = (|| -> Result<scenario_sandbox::Verdict> {
        driver
            .setup_repository(&file.repo_name)
            .context("setting up repository")?;
        driver
            .setup_scenario(file.scenario)
            .context("setting up scenario")?;
        driver.mark_done().context("marking scenario done")?;
        driver.evaluate().context("evaluating scenario")
    })();

    driver.teardown_scenario().context("tearing down scenario")?;
    driver.teardown_repository().context("tearing down repository")?;
    runtime.stop_and_remove().context("stopping sandbox container")?;

    let verdict = result?;
    let json = serde_json::to_string_pretty(&verdict).context("serializing verdict")?;
    println!("{json}");

    let stats_json =
        serde_json::to_string_pretty(driver.stats()).context("serializing scenario stats")?;
    eprintln!("stats:\n{stats_json}");
    Ok(())
}
