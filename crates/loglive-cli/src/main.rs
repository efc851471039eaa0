//! `loglive`: run the live-evaluation pipeline from a terminal

mod render;
mod repl;
mod watch;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use loglive::{pipeline, Environment, FsSourceProvider, ScopePolicy, Settings};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::render::{print_failures, render_annotated, Palette};

#[derive(Parser, Debug)]
#[command(name = "loglive", version, about = "Show JS/TS values inline, the way an editor would")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Annotate a file once and print it
    Run {
        /// File to evaluate
        file: PathBuf,

        #[command(flatten)]
        settings: SettingsArgs,

        /// Print annotations and failures as JSON instead of the file
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Re-annotate a file every time it changes
    Watch {
        /// File to watch
        file: PathBuf,

        #[command(flatten)]
        settings: SettingsArgs,

        /// Polling interval in milliseconds
        #[arg(long, default_value_t = 300)]
        interval_ms: u64,
    },

    /// Build a document line by line and see each line's value
    Repl {
        #[command(flatten)]
        settings: SettingsArgs,
    },
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
struct SettingsArgs {
    /// Evaluate bare expressions and initializers, not only console.log
    #[arg(long, default_value_t = false)]
    all: bool,

    /// JSON settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keep bindings from earlier runs
    #[arg(long, default_value_t = false)]
    retain: bool,

    /// Print failed declarations, imports and targets to stderr
    #[arg(long, default_value_t = false)]
    failures: bool,
}

impl SettingsArgs {
    /// Settings from the config file, with command-line overrides.
    fn load(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::from_path(path)?,
            None => Settings::default(),
        };
        if self.all {
            settings.show_all_expressions = true;
        }
        if self.retain {
            settings.scope_policy = ScopePolicy::Retain;
        }
        Ok(settings)
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.cmd {
        Cmd::Run {
            file,
            settings,
            json,
        } => run_file(&file, &settings, json),
        Cmd::Watch {
            file,
            settings,
            interval_ms,
        } => {
            let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
            runtime.block_on(watch::watch(file, settings, interval_ms))
        }
        Cmd::Repl { settings } => repl::repl(&settings),
    }
}

fn run_file(file: &Path, args: &SettingsArgs, json: bool) -> Result<()> {
    let settings = args.load()?;
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let path = std::fs::canonicalize(file).unwrap_or_else(|_| file.to_path_buf());

    let mut env = Environment::new();
    let report = pipeline::run(&text, &path, &settings, FsSourceProvider, &mut env);

    if json {
        let out = serde_json::json!({
            "annotations": report.annotations,
            "failures": report.evaluation_failures,
            "syntaxError": report.syntax_error,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if let Some(err) = &report.syntax_error {
        anyhow::bail!("{}: {}", file.display(), err);
    }
    print!("{}", render_annotated(&text, &report.annotations, Palette::detect()));
    if args.failures {
        print_failures(&report);
    }
    Ok(())
}
