//! WACZ command line
//!
//! `wacz create` packages WARC files; `wacz validate` checks a package.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing::{error, info};
use wacz_core::{
    CheckStatus, CreateOptions, HashAlgorithm, RecordFilter, ValidateOptions, create_wacz,
    validate_wacz,
};

#[derive(Parser, Debug)]
#[command(name = "wacz")]
#[command(version, about = "Create and validate WACZ web archive packages")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Package WARC files into a WACZ
    Create(CreateArgs),
    /// Check a WACZ against its datapackage.json
    Validate(ValidateArgs),
}

#[derive(Args, Debug)]
struct CreateArgs {
    /// WARC or WARC.gz files to package
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    #[arg(short = 'o', long, default_value = "archive.wacz")]
    output: PathBuf,

    /// Extract page titles and text into the page list
    #[arg(short = 't', long)]
    text: bool,

    /// Treat HTML captures that something refers to as pages
    #[arg(long)]
    detect_pages: bool,

    /// Authoritative page list (JSONL)
    #[arg(short = 'p', long)]
    pages: Option<PathBuf>,

    /// Secondary page list, written as pages/extraPages.jsonl
    #[arg(short = 'e', long)]
    extra_pages: Option<PathBuf>,

    /// Digest for datapackage.json resources (sha256, md5)
    #[arg(long, default_value = "sha256")]
    hash_type: String,

    /// Main page URL; creation fails if it was not captured
    #[arg(long)]
    url: Option<String>,

    /// Main page timestamp (requires --url)
    #[arg(long)]
    ts: Option<String>,

    /// Main page date recorded in the manifest
    #[arg(long)]
    date: Option<String>,

    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    desc: Option<String>,

    /// Directory of crawl logs bundled under logs/
    #[arg(short = 'l', long)]
    log_directory: Option<PathBuf>,

    /// Record types to index: `all` or a list such as `response,revisit`
    #[arg(long, default_value = "all")]
    records: String,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// Package to validate
    #[arg(short = 'f', long)]
    file: PathBuf,

    /// Skip re-deriving the index from the bundled WARCs
    #[arg(long)]
    skip_index: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Create(args) => run_create(args),
        Command::Validate(args) => run_validate(&args),
    };
    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run_create(args: CreateArgs) -> Result<bool, Box<dyn std::error::Error>> {
    let hash_algorithm: HashAlgorithm = args.hash_type.parse()?;

    let mut builder = CreateOptions::builder()
        .output(args.output)
        .text(args.text)
        .detect_pages(args.detect_pages)
        .hash_algorithm(hash_algorithm)
        .records(RecordFilter::parse(&args.records)?);
    for input in args.inputs {
        builder = builder.input(input);
    }
    if let Some(path) = args.pages {
        builder = builder.pages_file(path);
    }
    if let Some(path) = args.extra_pages {
        builder = builder.extra_pages_file(path);
    }
    if let Some(url) = args.url {
        builder = builder.main_url(url);
    }
    if let Some(ts) = args.ts {
        builder = builder.main_ts(ts);
    }
    if let Some(date) = args.date {
        builder = builder.date(date);
    }
    if let Some(title) = args.title {
        builder = builder.title(title);
    }
    if let Some(desc) = args.desc {
        builder = builder.description(desc);
    }
    if let Some(dir) = args.log_directory {
        builder = builder.log_directory(dir);
    }

    let summary = create_wacz(&builder.build())?;
    info!(
        "wrote {} ({} index entries, {} pages)",
        summary.output.display(),
        summary.index_entries,
        summary.pages
    );
    Ok(true)
}

fn run_validate(args: &ValidateArgs) -> Result<bool, Box<dyn std::error::Error>> {
    let options = ValidateOptions {
        check_index: !args.skip_index,
    };
    let report = validate_wacz(&args.file, options)?;
    info!("version detected as {}", report.version);
    for check in &report.checks {
        let status = match check.status {
            CheckStatus::Passed => "ok",
            CheckStatus::Failed if check.kind.is_advisory() => "warning",
            CheckStatus::Failed => "FAILED",
            CheckStatus::Skipped => "skipped",
        };
        info!("{:<20} {status}", check.kind.label());
        for finding in &check.findings {
            info!("    {finding}");
        }
    }
    if report.is_valid() {
        info!("{} is a valid WACZ", args.file.display());
    } else {
        error!("{} is not a valid WACZ", args.file.display());
    }
    Ok(report.is_valid())
}
