use camino::{Utf8Path, Utf8PathBuf};
use tracing::{info, warn};

use crate::cache::CacheStore;
use crate::checkpoint::{load_checkpoint, save_checkpoint};
use crate::config::Config;
use crate::datasets::DatasetsClient;
use crate::discovery::VersionDiscovery;
use crate::domain::parse_accession;
use crate::error::BackfillError;
use crate::historical::parse_historical_version;
use crate::listing::ListingClient;
use crate::output::{RowAccumulator, TsvWriter};
use crate::scan::identify_backfill_tasks;

const FLUSH_EVERY: usize = 100;

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub tasks_total: usize,
    pub tasks_processed: usize,
    pub rows_written: usize,
    pub versions_skipped: usize,
}

pub struct Driver<L, D> {
    listing: L,
    datasets: D,
    cache: CacheStore,
    config: Config,
    checkpoint_path: Utf8PathBuf,
}

impl<L: ListingClient, D: DatasetsClient> Driver<L, D> {
    pub fn new(
        listing: L,
        datasets: D,
        cache: CacheStore,
        config: Config,
        checkpoint_path: Utf8PathBuf,
    ) -> Self {
        Self {
            listing,
            datasets,
            cache,
            config,
            checkpoint_path,
        }
    }

    pub fn run(&self, input: &Utf8Path) -> Result<RunSummary, BackfillError> {
        let tasks = identify_backfill_tasks(input)?;
        if tasks.is_empty() {
            info!("no assemblies with version > 1 found, nothing to backfill");
            return Ok(RunSummary::default());
        }

        let checkpoint = load_checkpoint(&self.checkpoint_path);
        let start_index = checkpoint.processed_count.min(tasks.len());
        let total = tasks.len();
        let total_versions: usize = tasks
            .iter()
            .map(|task| task.historical_versions_needed.len())
            .sum();
        info!("backfilling {total} assemblies, {total_versions} historical versions");
        if start_index > 0 {
            info!("resuming from checkpoint: {start_index}/{total}");
        }

        let writer = TsvWriter::new(&self.config);
        let discovery = VersionDiscovery::new(&self.listing, &self.datasets, &self.cache);
        let mut accumulator = RowAccumulator::new();
        let mut summary = RunSummary {
            tasks_total: total,
            tasks_processed: start_index,
            ..RunSummary::default()
        };

        for task in &tasks[start_index..] {
            info!(
                "[{}/{total}] {} (current: v{})",
                summary.tasks_processed + 1,
                task.base_accession,
                task.current_version
            );

            let all_versions = discovery.discover(&task.current_accession);
            if all_versions.is_empty() {
                warn!("no versions found for {}", task.base_accession);
            }

            for record in &all_versions {
                let Some(accession) = record.get("accession").and_then(|v| v.as_str()) else {
                    warn!("version record for {} has no accession", task.base_accession);
                    summary.versions_skipped += 1;
                    continue;
                };
                let version_num = match parse_accession(accession) {
                    Ok((_, version)) => version,
                    Err(err) => {
                        warn!("skipping version record {accession}: {err}");
                        summary.versions_skipped += 1;
                        continue;
                    }
                };
                if version_num >= task.current_version {
                    continue;
                }

                match parse_historical_version(
                    record,
                    &self.config,
                    &self.datasets,
                    &task.base_accession,
                    version_num,
                ) {
                    Ok(row) => {
                        let key = row
                            .get("genbankAccession")
                            .filter(|value| !value.is_empty())
                            .cloned()
                            .unwrap_or_else(|| accession.to_string());
                        accumulator.insert(key, row);
                    }
                    Err(err) => {
                        warn!("could not parse {accession} v{version_num}: {err}");
                        summary.versions_skipped += 1;
                    }
                }
            }

            summary.tasks_processed += 1;
            if summary.tasks_processed % FLUSH_EVERY == 0 {
                info!(
                    "checkpoint: {}/{total} assemblies processed",
                    summary.tasks_processed
                );
                self.flush(&writer, &mut accumulator, &mut summary)?;
            }
        }

        self.flush(&writer, &mut accumulator, &mut summary)?;

        info!(
            "backfill complete: {}/{} assemblies, {} rows written, {} versions skipped",
            summary.tasks_processed, total, summary.rows_written, summary.versions_skipped
        );
        Ok(summary)
    }

    fn flush(
        &self,
        writer: &TsvWriter,
        accumulator: &mut RowAccumulator,
        summary: &mut RunSummary,
    ) -> Result<(), BackfillError> {
        let rows = accumulator.drain();
        writer.append(&rows)?;
        summary.rows_written += rows.len();
        if let Err(err) = save_checkpoint(&self.checkpoint_path, summary.tasks_processed) {
            warn!("could not save checkpoint {}: {err}", self.checkpoint_path);
        }
        Ok(())
    }
}
