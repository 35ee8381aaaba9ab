//! featseq CLI: encode, decode, validate and dry-run CAD feature sequences.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use feature_engine::FailurePolicy;
use featseq_cli::{
    decode_file, encode_files, render_report, replay_file, validate_files, CliConfig, FileStatus,
};

#[derive(Parser)]
#[command(name = "featseq", version, about = "CAD feature sequence codec and replay tool")]
struct Cli {
    /// TOML config file with [engine], [codec] and [output] tables.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode Feature JSON files into instruction-vector files.
    Encode {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Directory for the `<name>.vec.json` outputs.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Write `{"sequence", "metadata"}` instead of a bare array.
        #[arg(long)]
        wrap: bool,

        /// Encode on the current thread only.
        #[arg(long)]
        sequential: bool,
    },

    /// Decode a vector file back into Feature JSON.
    Decode {
        file: PathBuf,

        /// Output file; prints to stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Replay a Feature JSON file against the in-process mock host.
    Replay {
        file: PathBuf,

        /// Save a checkpoint after every applied feature into this directory.
        #[arg(long)]
        checkpoints: Option<PathBuf>,

        /// Record failing features and continue with the next one.
        #[arg(long)]
        skip_failures: bool,

        /// Profile endpoint tolerance.
        #[arg(long)]
        tolerance: Option<f64>,

        /// Directory for reconstruction_results.json.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Parse and schema-check Feature JSON files.
    Validate {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = CliConfig::load_or_default(cli.config.as_deref()).into_diagnostic()?;

    match cli.command {
        Commands::Encode {
            files,
            out,
            wrap,
            sequential,
        } => {
            if out.is_some() {
                config.output.dir = out;
            }
            config.output.wrap_vectors |= wrap;
            if sequential {
                config.codec.parallel = false;
            }
            let statuses = encode_files(&files, &config).into_diagnostic()?;
            print_statuses(&statuses)?;
        }

        Commands::Decode { file, out } => {
            let sequence = decode_file(&file, &config).into_diagnostic()?;
            match out {
                Some(path) => {
                    file_format::save_features(&path, &sequence).into_diagnostic()?;
                    println!("{} features -> {}", sequence.len(), path.display());
                }
                None => println!(
                    "{}",
                    file_format::features_to_json(&sequence).into_diagnostic()?
                ),
            }
        }

        Commands::Replay {
            file,
            checkpoints,
            skip_failures,
            tolerance,
            out,
        } => {
            if checkpoints.is_some() {
                config.output.checkpoint_dir = checkpoints;
            }
            if out.is_some() {
                config.output.dir = out;
            }
            if skip_failures {
                config.engine.policy = FailurePolicy::SkipAndContinue;
            }
            if let Some(t) = tolerance {
                config.engine.tolerance = t;
            }
            let report = replay_file(&file, &config).into_diagnostic()?;
            println!("{}", render_report(&report));
            if !report.outcome.is_done() {
                miette::bail!("reconstruction of {} did not complete", file.display());
            }
        }

        Commands::Validate { files } => {
            print_statuses(&validate_files(&files))?;
        }
    }

    Ok(())
}

fn print_statuses(statuses: &[FileStatus]) -> Result<()> {
    for s in statuses {
        println!("{}", s);
    }
    let failed = statuses.iter().filter(|s| !s.is_ok()).count();
    if failed > 0 {
        miette::bail!("{} of {} files failed", failed, statuses.len());
    }
    Ok(())
}
