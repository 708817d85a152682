use std::fs;
use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use log::{debug, info, LevelFilter};

use nucleus::session::Session;
use nucleus::Config;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level_filter = level_filter_from_env_and_verbosity(cli.verbose);
    env_logger::Builder::new()
        .filter_level(level_filter)
        .format_timestamp_micros()
        .init();

    info!("Launching nucleus with args: {cli:?}");

    match cli.command {
        Command::Run { document, script, timeout_ms } => run(&document, &script, timeout_ms),
        Command::Repl { document, timeout_ms } => repl(&document, timeout_ms),
    }
}

fn run(document_path: &str, script_path: &str, timeout_ms: Option<u64>) -> Result<()> {
    let mut session = Session::new(Config::default());
    load_document(&mut session, document_path)?;

    let script =
        fs::read_to_string(script_path).with_context(|| format!("failed reading script '{script_path}'"))?;

    for line in script.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        print_turn(&mut session, line, timeout_ms);
    }
    Ok(())
}

fn repl(document_path: &str, timeout_ms: Option<u64>) -> Result<()> {
    let mut session = Session::new(Config::default());
    load_document(&mut session, document_path)?;

    let stdin = io::stdin();
    print!("nucleus> ");
    io::stdout().flush().ok();
    for line in stdin.lock().lines() {
        let line = line.context("failed reading from stdin")?;
        let line = line.trim();
        if !line.is_empty() {
            print_turn(&mut session, line, timeout_ms);
        }
        print!("nucleus> ");
        io::stdout().flush().ok();
    }
    Ok(())
}

fn load_document(session: &mut Session, path: &str) -> Result<()> {
    let text = fs::read_to_string(path).with_context(|| format!("failed reading document '{path}'"))?;
    let (line_count, length) = session.load(text, Some(path.to_string()));
    debug!("loaded '{path}': {line_count} lines, {length} bytes");
    Ok(())
}

fn print_turn(session: &mut Session, source: &str, timeout_ms: Option<u64>) {
    let timeout = timeout_ms.map(Duration::from_millis);
    let response = session.execute(source, timeout);
    if response.ok {
        if let Some(value) = &response.value {
            println!("{}", format!("{value:?}").green());
        }
    } else if let Some(error) = &response.error {
        eprintln!("{}", format!("{}: {}", error.kind, error.message).red());
    }
    for log_line in &response.logs {
        eprintln!("{}", log_line.dimmed());
    }
}

/// Load and execute a script file against a document, or drop into an
/// interactive loop over stdin.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase log verbosity level.
    ///
    /// The base log level is read from `RUST_LOG` (default: error), and
    /// increased according to the number of times this flag is given.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a document and execute a newline-separated script against it.
    Run {
        /// Path to the document to load.
        document: String,
        /// Path to a file containing one Nucleus expression per line.
        #[arg(long)]
        script: String,
        /// Per-expression deadline in milliseconds.
        #[arg(long, env)]
        timeout_ms: Option<u64>,
    },
    /// Load a document, then read one Nucleus expression per stdin line.
    Repl {
        /// Path to the document to load.
        document: String,
        /// Per-expression deadline in milliseconds.
        #[arg(long, env)]
        timeout_ms: Option<u64>,
    },
}

/// To the default log level found in the environment, adds the requested
/// additional verbosity level, clamped to the maximum available.
fn level_filter_from_env_and_verbosity(additional_verbosity: u8) -> LevelFilter {
    let available = LevelFilter::iter().collect::<Vec<_>>();
    let default = env_logger::Builder::from_default_env().build().filter();

    let level = default as usize + additional_verbosity as usize;

    available.get(level).copied().unwrap_or_else(|| {
        eprintln!("Requested additional verbosity on top of env default exceeds maximum, will use maximum");
        available.last().copied().expect("at least one level must be available")
    })
}
