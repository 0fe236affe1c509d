use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use gramdex::config::BuildConfig;
use gramdex::index::{self, Gram, gram_of};
use serde::Serialize;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gramdex")]
#[command(about = "Build suffix array + 3-gram bucket indexes over concatenated byte ranges")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index a config file describes
    Build {
        /// JSON build config
        config: PathBuf,

        /// Never draw progress bars
        #[arg(short, long)]
        quiet: bool,
    },
    /// Re-read the sources and check an existing index against them
    Verify {
        /// JSON build config
        config: PathBuf,

        /// Never draw progress bars
        #[arg(short, long)]
        quiet: bool,
    },
    /// Show index statistics
    Stats {
        /// JSON build config
        config: PathBuf,

        /// Show the suffix array bucket of one 3-byte prefix instead
        #[arg(short, long)]
        gram: Option<String>,
    },
    /// Show which source owns a document offset
    Locate {
        /// JSON build config
        config: PathBuf,

        /// Offset in the concatenated document
        offset: u64,
    },
}

/// Status line printed on stdout when a command finishes
#[derive(Serialize)]
struct Status {
    code: i32,
    message: String,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gramdex=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // --help and --version land here too
            if !err.use_stderr() {
                return ExitCode::SUCCESS;
            }
            return report(1, "Invalid argument".to_string());
        }
    };

    match run(cli.command) {
        Ok(Some(message)) => report(0, message),
        Ok(None) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err
                .downcast_ref::<gramdex::Error>()
                .map(gramdex::Error::exit_code)
                .unwrap_or(1);
            report(code, format!("{:#}", err))
        }
    }
}

/// Print the status line and turn `code` into the process exit code
fn report(code: i32, message: String) -> ExitCode {
    let status = Status { code, message };
    match serde_json::to_string(&status) {
        Ok(line) => println!("{}", line),
        Err(_) => println!("{{\"code\": {}}}", status.code),
    }
    ExitCode::from(code.clamp(0, 255) as u8)
}

/// Run one command; `Some` carries the success message for the status line
fn run(command: Commands) -> Result<Option<String>> {
    match command {
        Commands::Build { config, quiet } => {
            let config = BuildConfig::load(&config)?;
            let stats = index::build_index(&config, show_progress(quiet))?;
            Ok(Some(format!(
                "Success: {} bytes from {} sources indexed into {}",
                stats.total_length,
                stats.sources,
                config.index_file.display()
            )))
        }
        Commands::Verify { config, quiet } => {
            let config = BuildConfig::load(&config)?;
            let stats = index::verify_index(&config, show_progress(quiet))?;
            Ok(Some(format!(
                "Verified: {} bytes, {} populated grams",
                stats.total_length, stats.populated_grams
            )))
        }
        Commands::Stats { config, gram } => {
            let config = BuildConfig::load(&config)?;
            match gram {
                Some(text) => index::stats::show_gram(&config, parse_gram(&text)?)?,
                None => index::stats::show_stats(&config)?,
            }
            Ok(None)
        }
        Commands::Locate { config, offset } => {
            let config = BuildConfig::load(&config)?;
            index::stats::show_location(&config, offset)?;
            Ok(None)
        }
    }
}

fn show_progress(quiet: bool) -> bool {
    !quiet && std::io::stderr().is_terminal()
}

/// A gram given on the command line: exactly 3 bytes
fn parse_gram(text: &str) -> Result<Gram> {
    let bytes = text.as_bytes();
    if bytes.len() != 3 {
        bail!("gram must be exactly 3 bytes, got {:?}", text);
    }
    Ok(gram_of(bytes[0], bytes[1], bytes[2]))
}
