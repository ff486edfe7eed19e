use clap::{Parser, Subcommand};
use junit_rerun::config::{ConfigLoader, env};
use junit_rerun::format::ResultFormatter;
use junit_rerun::rerun::RerunOutcome;
use junit_rerun::runner::create_runner_from_config;
use junit_rerun::{Error, RerunBuilder, Result, analyze, merge_reports};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::filter::EnvFilter;

#[derive(Parser)]
#[command(
    name = "junit-rerun",
    version,
    about = "Rerun failing tests from a JUnit XML report and merge the results"
)]
struct Cli {
    /// Log progress at info level.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify every test case of a report.
    Analyze {
        report: PathBuf,
        /// Print the analysis as JSON.
        #[arg(long)]
        json: bool,
        /// List only cases that did not pass.
        #[arg(long)]
        failures_only: bool,
    },
    /// Rerun the failed and errored tests of a report and merge the results.
    Rerun {
        report: PathBuf,
        /// Directory holding the test sources.
        base_dir: PathBuf,
        /// Configuration file (default: ./junit-rerun.toml if present).
        #[arg(long)]
        config: Option<PathBuf>,
        /// Where the runner writes its report.
        #[arg(long)]
        rerun_output: Option<PathBuf>,
        /// Where the merged report is written.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print the outcome as JSON.
        #[arg(long)]
        json: bool,
        /// Extra arguments passed to the runner.
        #[arg(last = true)]
        runner_args: Vec<String>,
    },
    /// Merge a rerun report into an original report.
    Merge {
        original: PathBuf,
        rerun: PathBuf,
        output: PathBuf,
        /// Print the outcome as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Show the effective configuration and runner availability.
    Check {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match execute(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> Result<ExitCode> {
    let formatter = ResultFormatter::default();
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Commands::Analyze {
            report,
            json,
            failures_only,
        } => {
            init_tracing(cli.verbose);
            let analysis = analyze(&report);
            if json {
                print_json(&analysis)?;
            } else {
                ResultFormatter::new(!failures_only).analysis(&mut stdout, &analysis)?;
            }
        }
        Commands::Rerun {
            report,
            base_dir,
            config,
            rerun_output,
            output,
            json,
            runner_args,
        } => {
            let loader = match config {
                Some(path) => ConfigLoader::new().config_file(path),
                None => ConfigLoader::new().search_dir("."),
            };
            let config = loader.load()?;
            init_tracing(cli.verbose || config.verbose);

            let mut builder = RerunBuilder::new()
                .with_config(config)
                .report(report)
                .base_dir(base_dir)
                .extra_args(runner_args);
            if let Some(path) = rerun_output {
                builder = builder.rerun_output(path);
            }
            if let Some(path) = output {
                builder = builder.final_output(path);
            }

            let outcome = builder.run()?;
            if json {
                print_json(&outcome)?;
            } else {
                formatter.rerun(&mut stdout, &outcome)?;
            }
            if matches!(outcome, RerunOutcome::NothingToRerun { .. }) {
                return Ok(ExitCode::from(2));
            }
        }
        Commands::Merge {
            original,
            rerun,
            output,
            json,
        } => {
            init_tracing(cli.verbose);
            let outcome = merge_reports(&original, &rerun, &output)?;
            if json {
                print_json(&serde_json::json!({
                    "updated": outcome.updated,
                    "output": outcome.output,
                }))?;
            } else {
                formatter.merge(&mut stdout, &outcome)?;
            }
        }
        Commands::Check { config } => {
            init_tracing(cli.verbose);
            check(config)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn check(config_file: Option<PathBuf>) -> Result<()> {
    let loader = match config_file {
        Some(path) => ConfigLoader::new().config_file(path),
        None => ConfigLoader::new().search_dir("."),
    };
    let config = loader.load()?;

    let rendered = toml::to_string_pretty(&config)
        .map_err(|e| Error::config(format!("failed to render config: {e}")))?;
    println!("{rendered}");

    let overrides = env::detect_active_overrides();
    if overrides.is_empty() {
        println!("no environment overrides active");
    } else {
        println!("environment overrides:");
        for (key, value) in overrides {
            println!("  {key}={value}");
        }
    }

    let runner = create_runner_from_config(&config)?;
    let availability = if runner.is_available() {
        "available"
    } else {
        "NOT available"
    };
    println!(
        "{} runner: {availability} ({})",
        runner.name(),
        config.runner.pytest.python
    );
    Ok(())
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
