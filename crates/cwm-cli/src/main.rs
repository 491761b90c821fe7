//! cwm CLI - synthesize code world models for small games
//!
//! Usage:
//!   cwm synth <game>              Generate and verify `generated_<game>.py`
//!   cwm check <code> <tests>      Run a saved artifact against a test suite
//!   cwm games                     List games with rules and tests available
//!   cwm init                      Write a default `.cwm/config.toml`

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use cwm_agent::OpenAiClient;
use cwm_core::{CwmConfig, SynthesisRequest};
use cwm_sandbox::{PythonRunner, TestRunner};
use cwm_synth::{RunLog, Synthesizer};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const RULES_SUFFIX: &str = "_rules.txt";
const TESTS_SUFFIX: &str = "_tests.py";

#[derive(Parser)]
#[command(name = "cwm")]
#[command(author, version, about = "LLM-driven code world model synthesis")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize and verify the transition functions for a game
    Synth {
        /// Game identifier (reads <data-dir>/<game>_rules.txt and <game>_tests.py)
        game: String,

        /// Information class: perfect or imperfect
        #[arg(short, long)]
        info: Option<String>,

        /// Refinement rounds after the first generation
        #[arg(short = 'n', long)]
        max_retries: Option<usize>,

        /// Model identifier
        #[arg(short, long)]
        model: Option<String>,

        /// Sampling temperature
        #[arg(long)]
        temperature: Option<f32>,

        /// Directory holding rules and tests
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Directory receiving the generated artifact
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Skip writing the markdown run transcript
        #[arg(long)]
        no_transcript: bool,
    },

    /// Run an artifact against a test suite once
    Check {
        /// Candidate source file
        code: PathBuf,

        /// Test source file
        tests: PathBuf,
    },

    /// List games that have both a rules and a tests file
    Games {
        /// Directory holding rules and tests
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Write a default configuration file
    Init {
        /// Project directory (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = CwmConfig::load_or_default(Path::new(".")).context("Failed to load config")?;

    // Only synthesis runs get a log file
    let logs_dir = match &cli.command {
        Commands::Synth { .. } => Some(config.paths.logs_dir.as_path()),
        _ => None,
    };
    if let Some(log_path) = init_logging(cli.verbose, logs_dir)? {
        println!("Logging enabled. Check file: {}", log_path.display());
    }

    match cli.command {
        Commands::Synth {
            game,
            info,
            max_retries,
            model,
            temperature,
            data_dir,
            out_dir,
            no_transcript,
        } => {
            let options = SynthOptions {
                info,
                max_retries,
                model,
                temperature,
                data_dir,
                out_dir,
                transcript: !no_transcript,
            };
            cmd_synth(&config, game, options).await
        }
        Commands::Check { code, tests } => cmd_check(&config, code, tests).await,
        Commands::Games { data_dir } => cmd_games(&config, data_dir),
        Commands::Init { path } => cmd_init(path),
    }
}

/// Install stdout logging plus, when `logs_dir` is given, a
/// `run_<timestamp>.log` file in it. Returns the log file path.
fn init_logging(verbose: bool, logs_dir: Option<&Path>) -> Result<Option<PathBuf>> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (file_layer, log_path) = match logs_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let path = dir.join(format!("run_{}.log", Local::now().format("%Y%m%d_%H%M%S")));
            let file = File::create(&path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Arc::new(file));
            (Some(layer), Some(path))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .try_init()?;

    Ok(log_path)
}

/// Command-line overrides for a synthesis run
struct SynthOptions {
    info: Option<String>,
    max_retries: Option<usize>,
    model: Option<String>,
    temperature: Option<f32>,
    data_dir: Option<PathBuf>,
    out_dir: Option<PathBuf>,
    transcript: bool,
}

async fn cmd_synth(config: &CwmConfig, game: String, options: SynthOptions) -> Result<()> {
    let data_dir = options
        .data_dir
        .unwrap_or_else(|| config.paths.data_dir.clone());
    let out_dir = options
        .out_dir
        .unwrap_or_else(|| config.paths.results_dir.clone());
    let info_class = options
        .info
        .unwrap_or_else(|| config.synthesis.default_info_class.to_string());
    let max_retries = options.max_retries.unwrap_or(config.synthesis.max_retries);

    let rules_path = data_dir.join(format!("{}{}", game, RULES_SUFFIX));
    let tests_path = data_dir.join(format!("{}{}", game, TESTS_SUFFIX));
    let output_path = out_dir.join(format!("generated_{}.py", game));

    info!("Loading data for {}...", game);
    let rules = read_input(&rules_path).await?;
    let tests = read_input(&tests_path).await?;

    // Unknown information classes stop here, before any generation
    let request =
        SynthesisRequest::parse(&game, rules, tests, &info_class)?.with_max_retries(max_retries);

    let mut model_config = config.model.clone();
    if let Some(model) = options.model {
        model_config.name = model;
    }
    if let Some(temperature) = options.temperature {
        model_config.temperature = temperature;
    }

    let generator = OpenAiClient::from_config(&model_config);
    let runner = PythonRunner::from_config(&config.sandbox);
    let mut synthesizer = Synthesizer::new(generator, runner);
    if options.transcript {
        let run_log = RunLog::in_dir(&config.paths.logs_dir, &game);
        info!("Writing run transcript to {}", run_log.path().display());
        synthesizer = synthesizer.with_run_log(run_log);
    }

    println!("Synthesizing {}...", game);
    println!("  Model: {} (temperature {})", model_config.name, model_config.temperature);
    println!("  Information class: {}", request.info_class);
    println!("  Max attempts: {}", request.max_attempts());
    println!();

    let outcome = synthesizer.synthesize(&request).await;

    println!();
    println!("  Attempts: {}", outcome.attempts);
    println!("  Generator calls: {}", outcome.generator_calls);
    println!("  Stop reason: {}", outcome.stop_reason);

    if !outcome.is_success() {
        error!("Pipeline failed to generate valid code.");
        anyhow::bail!(
            "Synthesis for {} failed after {} attempt(s); no output written",
            game,
            outcome.attempts
        );
    }

    info!("Saving verified CWM to {}...", output_path.display());
    tokio::fs::create_dir_all(&out_dir)
        .await
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;
    tokio::fs::write(&output_path, &outcome.code)
        .await
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    info!("--- Pipeline Complete ---");
    println!("  Output: {}", output_path.display());

    Ok(())
}

async fn cmd_check(config: &CwmConfig, code: PathBuf, tests: PathBuf) -> Result<()> {
    let code_src = read_input(&code).await?;
    let tests_src = read_input(&tests).await?;

    let runner = PythonRunner::from_config(&config.sandbox);
    let verdict = runner.run(&code_src, &tests_src).await;

    if verdict.success {
        println!("PASS: {} satisfies {}", code.display(), tests.display());
        Ok(())
    } else {
        println!("FAIL: {} against {}", code.display(), tests.display());
        println!();
        println!("{}", verdict.diagnostic);
        anyhow::bail!("Tests failed")
    }
}

fn cmd_games(config: &CwmConfig, data_dir: Option<PathBuf>) -> Result<()> {
    let data_dir = data_dir.unwrap_or_else(|| config.paths.data_dir.clone());
    let games = discover_games(&data_dir)?;

    if games.is_empty() {
        println!("No games found in {}", data_dir.display());
        println!(
            "Add <game>{} and <game>{} to get started.",
            RULES_SUFFIX, TESTS_SUFFIX
        );
        return Ok(());
    }

    println!("Games in {}:", data_dir.display());
    for game in games {
        println!("  {}", game);
    }
    Ok(())
}

fn cmd_init(path: PathBuf) -> Result<()> {
    let config_path = CwmConfig::write_default(&path)
        .with_context(|| format!("Failed to initialize {}", path.display()))?;

    println!("Initialized cwm in {}", path.display());
    println!("Created:");
    println!("  {}", config_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Put <game>{} and <game>{} in the data directory", RULES_SUFFIX, TESTS_SUFFIX);
    println!("  2. Export OPENAI_API_KEY");
    println!("  3. Run 'cwm synth <game>'");
    Ok(())
}

async fn read_input(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

/// Games with both a rules file and a tests file in `data_dir`, sorted
fn discover_games(data_dir: &Path) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(data_dir)
        .with_context(|| format!("Failed to read data directory {}", data_dir.display()))?;

    let mut games = Vec::new();
    for entry in entries {
        let file_name = entry?.file_name();
        let Some(game) = file_name.to_str().and_then(|n| n.strip_suffix(RULES_SUFFIX)) else {
            continue;
        };
        if data_dir.join(format!("{}{}", game, TESTS_SUFFIX)).is_file() {
            games.push(game.to_string());
        }
    }

    games.sort();
    Ok(games)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_discover_games_requires_both_files() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        std::fs::write(dir.join("kuhn_poker_rules.txt"), "rules").unwrap();
        std::fs::write(dir.join("kuhn_poker_tests.py"), "tests").unwrap();
        std::fs::write(dir.join("breakthrough_rules.txt"), "rules").unwrap();
        std::fs::write(dir.join("isolation_tests.py"), "tests").unwrap();
        std::fs::write(dir.join("tic_tac_toe_rules.txt"), "rules").unwrap();
        std::fs::write(dir.join("tic_tac_toe_tests.py"), "tests").unwrap();

        let games = discover_games(dir).unwrap();
        assert_eq!(games, vec!["kuhn_poker", "tic_tac_toe"]);
    }

    #[test]
    fn test_discover_games_missing_dir() {
        let temp_dir = TempDir::new().unwrap();
        assert!(discover_games(&temp_dir.path().join("absent")).is_err());
    }

    #[test]
    fn test_cli_parses_synth() {
        let cli = Cli::parse_from([
            "cwm", "-v", "synth", "kuhn_poker", "--info", "imperfect", "-n", "4",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Synth {
                game,
                info,
                max_retries,
                no_transcript,
                ..
            } => {
                assert_eq!(game, "kuhn_poker");
                assert_eq!(info.as_deref(), Some("imperfect"));
                assert_eq!(max_retries, Some(4));
                assert!(!no_transcript);
            }
            _ => panic!("expected synth"),
        }
    }
}
