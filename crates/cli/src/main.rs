//! Warden
//!
//! Command line front end for browsing a remote file service.

mod console;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use browser::{
    default_config_path, BrowserSession, Config, DirectorySaveTarget, HttpFileService,
    OpenOutcome, SortDirection, SortKey, SortSpec, UploadCandidate, UploadReport,
};
use clap::{Parser, Subcommand, ValueEnum};

use console::{print_listing, ConsoleNotifier, ConsoleProgress, PromptConfirm};

/// Warden - browse, upload to and download from a remote file service.
#[derive(Parser, Debug)]
#[command(name = "warden")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List a remote directory (the configured root by default)
    Ls {
        /// Directory to list
        path: Option<String>,

        /// Sort key
        #[arg(long, short, value_enum, default_value = "name")]
        sort: SortArg,

        /// Sort descending
        #[arg(long)]
        desc: bool,
    },

    /// Open a path: list it if it is a directory, download it otherwise
    Open {
        /// Remote path
        path: String,

        /// Local directory for downloads (defaults to the current directory)
        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Upload local files into a remote directory
    Upload {
        /// Local files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Destination directory (defaults to the configured root)
        #[arg(long)]
        to: Option<String>,
    },

    /// Delete a remote file or directory
    Rm {
        /// Remote path
        path: String,

        /// Do not ask for confirmation
        #[arg(long, short)]
        yes: bool,
    },

    /// Download a remote file
    Get {
        /// Remote path
        path: String,

        /// Local directory to save into (defaults to the current directory)
        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Show what lives at a remote path
    Info {
        /// Remote path
        path: String,
    },

    /// Show the effective configuration
    Config {
        /// Write a default configuration file if none exists
        #[arg(long)]
        init: bool,
    },
}

/// Sort keys accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortArg {
    Name,
    Size,
    Date,
    Security,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Name => SortKey::Name,
            SortArg::Size => SortKey::Size,
            SortArg::Date => SortKey::Date,
            SortArg::Security => SortKey::Security,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut config = Config::load(&config_path)?;
    config.apply_env_overrides();

    // Initialize tracing
    let filter = if cli.verbose {
        "debug".to_string()
    } else {
        config.log.level.to_lowercase()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Using config file: {:?}", config_path);

    // Validate configuration
    config.validate()?;

    let service = HttpFileService::from_config(&config.service)
        .context("Failed to create file service client")?;
    let session = BrowserSession::new(service, &config, Arc::new(ConsoleNotifier));

    match cli.command {
        Commands::Ls { path, sort, desc } => {
            session.fetch_files(path.as_deref().unwrap_or("")).await?;
            let direction = if desc {
                SortDirection::Desc
            } else {
                SortDirection::Asc
            };
            session.set_sort(SortSpec::new(sort.into(), direction)).await;
            print_current(&session).await;
        }
        Commands::Open { path, out } => {
            let target = save_target(out)?;
            match session.open_path(&path, &target).await? {
                OpenOutcome::Navigated => print_current(&session).await,
                OpenOutcome::Downloaded(download) => {
                    println!(
                        "Saved {} ({} bytes, sha256 {})",
                        target.dir().join(&download.name).display(),
                        download.size,
                        download.sha256
                    );
                }
            }
        }
        Commands::Upload { files, to } => {
            let mut candidates = Vec::with_capacity(files.len());
            for file in &files {
                let candidate = UploadCandidate::from_path(file)
                    .await
                    .with_context(|| format!("Failed to read {}", file.display()))?;
                candidates.push(candidate);
            }

            session.fetch_files(to.as_deref().unwrap_or("")).await?;
            let report = session.upload(candidates, &ConsoleProgress).await?;
            if report.merged {
                print_current(&session).await;
            }
            return Ok(ExitCode::from(upload_exit_status(&report)));
        }
        Commands::Rm { path, yes } => {
            session.fetch_files(&parent_dir(&path)).await?;
            session.delete(&path, &PromptConfirm { assume_yes: yes }).await?;
        }
        Commands::Get { path, out } => {
            let target = save_target(out)?;
            session.fetch_files(&parent_dir(&path)).await?;
            let download = session.download(&path, &target).await?;
            println!(
                "Saved {} ({} bytes, sha256 {})",
                target.dir().join(&download.name).display(),
                download.size,
                download.sha256
            );
        }
        Commands::Info { path } => {
            let info = session.file_info(&path).await?;
            if !info.exists {
                anyhow::bail!("Nothing exists at {}", path);
            }
            println!("Path: {}", info.abs_path);
            println!("Name: {}", info.file_name);
            println!("Type: {}", if info.is_dir { "directory" } else { "file" });
            if !info.is_dir {
                println!("Level: {}", browser::classify::classify_name(&info.file_name));
            }
        }
        Commands::Config { init } => show_config(&config, &config_path, init)?,
    }

    Ok(ExitCode::SUCCESS)
}

/// Exit status for an upload: 2 when any file was rejected or refused.
fn upload_exit_status(report: &UploadReport) -> u8 {
    if report.is_complete() {
        0
    } else {
        2
    }
}

async fn print_current(session: &BrowserSession<HttpFileService>) {
    let snapshot = session.snapshot().await;
    print_listing(&snapshot.listing.current_path, &snapshot.sorted_entries());
}

fn save_target(out: Option<PathBuf>) -> anyhow::Result<DirectorySaveTarget> {
    let dir = match out {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to resolve current directory")?,
    };
    Ok(DirectorySaveTarget::new(dir))
}

fn show_config(config: &Config, path: &std::path::Path, init: bool) -> anyhow::Result<()> {
    if init {
        if path.exists() {
            println!("Config file already exists: {}", path.display());
        } else {
            Config::default().save(path)?;
            println!("Wrote default config to {}", path.display());
        }
        return Ok(());
    }

    println!("# {}", path.display());
    print!("{}", config.to_toml()?);
    Ok(())
}

/// Directory containing `path`, or the root.
fn parent_dir(path: &str) -> String {
    match path.trim_end_matches('/').rsplit_once('/') {
        Some(("", _)) | None => "/".to_string(),
        Some((parent, _)) => parent.to_string(),
    }
}
