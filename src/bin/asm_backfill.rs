use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use directories::BaseDirs;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use assembly_backfill::cache::{CachePolicy, CacheStore};
use assembly_backfill::config::ConfigLoader;
use assembly_backfill::datasets::DatasetsCli;
use assembly_backfill::driver::Driver;
use assembly_backfill::error::BackfillError;
use assembly_backfill::listing::FtpListingClient;

#[derive(Parser)]
#[command(name = "asm-backfill")]
#[command(about = "Backfill superseded genome-assembly versions into the historical table")]
#[command(version, author)]
struct Cli {
    #[arg(long)]
    input: Utf8PathBuf,

    #[arg(long)]
    config: String,

    #[arg(long, default_value = "tmp/backfill_checkpoint.json")]
    checkpoint: Utf8PathBuf,

    #[arg(long)]
    cache_dir: Option<Utf8PathBuf>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(backfill) = report.downcast_ref::<BackfillError>() {
            return ExitCode::from(map_exit_code(backfill));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &BackfillError) -> u8 {
    match error {
        BackfillError::ConfigRead(_)
        | BackfillError::ConfigParse(_)
        | BackfillError::InputRead(_) => 2,
        BackfillError::ListingHttp(_)
        | BackfillError::ListingStatus { .. }
        | BackfillError::DatasetsTool(_)
        | BackfillError::DatasetsTimeout(_)
        | BackfillError::MissingTool(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = ConfigLoader::load(&cli.config).into_diagnostic()?;
    let output_path = config.file_name.clone();

    let cache_root = resolve_cache_root(cli.cache_dir).into_diagnostic()?;
    let cache = CacheStore::new(cache_root, CachePolicy::default());
    let listing = FtpListingClient::new().into_diagnostic()?;
    let datasets = DatasetsCli::new();

    let driver = Driver::new(listing, datasets, cache, config, cli.checkpoint);
    let summary = driver.run(&cli.input).into_diagnostic()?;

    println!("backfill summary");
    println!(
        "  assemblies processed: {}/{}",
        summary.tasks_processed, summary.tasks_total
    );
    println!("  rows written: {}", summary.rows_written);
    println!("  versions skipped: {}", summary.versions_skipped);
    println!("  output: {output_path}");
    Ok(())
}

fn resolve_cache_root(cache_dir: Option<Utf8PathBuf>) -> Result<Utf8PathBuf, BackfillError> {
    if let Some(dir) = cache_dir {
        return Ok(dir);
    }
    BaseDirs::new()
        .and_then(|dirs| {
            Utf8PathBuf::from_path_buf(dirs.home_dir().join(".cache").join("asm-backfill")).ok()
        })
        .ok_or_else(|| BackfillError::Filesystem("unable to resolve cache directory".to_string()))
}
