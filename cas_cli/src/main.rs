//! Reference command-line front-end for the CAS-backed backup engine.
//!
//! This binary is a thin dispatcher: all of the interesting behavior lives
//! in [`cas_fs`] (the directory-tree core) and [`cas_scan`] (the scanner and
//! extractor). This crate's own job is argument parsing, logging setup, the
//! on-disk backup-root layout (`<backup-dir>/blobs` plus a `log` file), and
//! mapping each subcommand's outcome onto the exit codes documented below.

mod cmd;
mod helpers;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use clap_verbosity_flag::InfoLevel;

use cmd::Outcome;

/// `0` success, `1` no-op (promoted to `0` with `--allow-noop`), `2` usage
/// error (handled by `clap` itself before `main` runs its own logic), `3`
/// execution error.
const EXIT_SUCCESS: u8 = 0;
const EXIT_NOOP: u8 = 1;
const EXIT_ERROR: u8 = 3;

#[derive(Parser)]
#[command(
    name = "cas",
    version,
    about = "A deduplicating filesystem backup engine over a content-addressable store",
    disable_help_flag = true
)]
struct Cli {
    /// Directory holding the backup root's blob store and commit log.
    #[arg(short = 'D', long = "backup-dir", global = true, default_value = ".")]
    backup_dir: PathBuf,

    #[command(flatten)]
    verbosity: clap_verbosity_flag::Verbosity<InfoLevel>,

    /// Treat a no-op outcome (e.g. `import` of an unchanged tree) as success.
    #[arg(long, global = true)]
    allow_noop: bool,

    #[arg(short = '?', long = "help", action = clap::ArgAction::Help, global = true)]
    help: Option<bool>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty backup root at `--backup-dir`.
    Init,
    /// Scan a real directory tree and commit it into the backup root.
    Import {
        /// Real filesystem path to import.
        path: PathBuf,
        /// Name to store the tree under (default: `path`'s basename).
        name: Option<String>,
    },
    /// Extract a committed tree back out to a real filesystem path.
    Export {
        /// Name previously passed to `import`.
        name: String,
        /// Destination directory to recreate the tree at.
        dest: PathBuf,
        /// Export a specific historical root digest instead of the latest.
        #[arg(long)]
        snapshot: Option<String>,
    },
    /// Print the recorded root digests, newest first.
    Log,
    /// List the entries of a resolved path.
    Ls {
        /// Path within the backup root, e.g. `a/b/c`.
        path: String,
    },
    /// Mount the backup root as a live filesystem (not implemented here).
    Mount {
        /// Mount point.
        dest: PathBuf,
    },
    /// Print the list of available subcommands, one per line.
    Commands,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity)
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Commands::Init => cmd::run_init(&cli.backup_dir),
        Commands::Import { path, name } => {
            cmd::run_import(&cli.backup_dir, path, name.clone())
        }
        Commands::Export {
            name,
            dest,
            snapshot,
        } => cmd::run_export(&cli.backup_dir, name, dest, snapshot.clone()),
        Commands::Log => cmd::run_log(&cli.backup_dir),
        Commands::Ls { path } => cmd::run_ls(&cli.backup_dir, path),
        Commands::Mount { dest } => cmd::run_mount(&cli.backup_dir, dest),
        Commands::Commands => cmd::run_commands(),
    };

    match result {
        Ok(Outcome::Success) => ExitCode::from(EXIT_SUCCESS),
        Ok(Outcome::NoOp) => {
            ExitCode::from(if cli.allow_noop { EXIT_SUCCESS } else { EXIT_NOOP })
        }
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}
