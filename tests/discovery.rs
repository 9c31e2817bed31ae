use std::collections::HashMap;
use std::fs;
use std::sync::Mutex;

use camino::Utf8PathBuf;
use chrono::Utc;
use serde_json::{Value, json};
use tempfile::tempdir;

use assembly_backfill::cache::{CacheEntry, CacheNamespace, CachePolicy, CacheStore};
use assembly_backfill::datasets::DatasetsClient;
use assembly_backfill::discovery::VersionDiscovery;
use assembly_backfill::domain::{BaseAccession, GenomeAccession};
use assembly_backfill::error::BackfillError;
use assembly_backfill::listing::ListingClient;

struct MockListing {
    body: Option<String>,
    calls: Mutex<usize>,
}

impl MockListing {
    fn ok(body: &str) -> Self {
        Self {
            body: Some(body.to_string()),
            calls: Mutex::new(0),
        }
    }

    fn failing() -> Self {
        Self {
            body: None,
            calls: Mutex::new(0),
        }
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl ListingClient for MockListing {
    fn fetch_listing(&self, _base: &BaseAccession) -> Result<String, BackfillError> {
        *self.calls.lock().unwrap() += 1;
        self.body.clone().ok_or(BackfillError::ListingStatus {
            status: 503,
            message: "mirror unavailable".to_string(),
        })
    }
}

struct MockDatasets {
    records: HashMap<String, Value>,
    summary_calls: Mutex<usize>,
}

impl MockDatasets {
    fn with_records(records: &[Value]) -> Self {
        let records = records
            .iter()
            .map(|record| {
                let accession = record["accession"].as_str().unwrap().to_string();
                (accession, record.clone())
            })
            .collect();
        Self {
            records,
            summary_calls: Mutex::new(0),
        }
    }

    fn summary_calls(&self) -> usize {
        *self.summary_calls.lock().unwrap()
    }
}

impl DatasetsClient for MockDatasets {
    fn genome_summary(&self, accession: &GenomeAccession) -> Result<Value, BackfillError> {
        *self.summary_calls.lock().unwrap() += 1;
        self.records
            .get(accession.as_str())
            .cloned()
            .ok_or_else(|| BackfillError::DatasetsTool(format!("no metadata for {accession}")))
    }

    fn sequence_report(&self, _accession: &GenomeAccession) -> Result<Vec<Value>, BackfillError> {
        Ok(Vec::new())
    }
}

fn store_in(dir: &tempfile::TempDir) -> CacheStore {
    let root = Utf8PathBuf::from_path_buf(dir.path().join("cache")).unwrap();
    CacheStore::new(root, CachePolicy::default())
}

fn record(accession: &str) -> Value {
    json!({"accession": accession, "organism": {"organism_name": "Danio rerio"}})
}

const LISTING: &str = r#"
<a href="GCA_000222935.1_ASM22293v1/">GCA_000222935.1_ASM22293v1/</a>
<a href="GCA_000222935.2_ASM22293v2/">GCA_000222935.2_ASM22293v2/</a>
"#;

#[test]
fn discovers_versions_ascending() {
    let dir = tempdir().unwrap();
    let cache = store_in(&dir);
    let listing = MockListing::ok(LISTING);
    let datasets = MockDatasets::with_records(&[
        record("GCA_000222935.1"),
        record("GCA_000222935.2"),
    ]);

    let discovery = VersionDiscovery::new(&listing, &datasets, &cache);
    let versions = discovery.discover("GCA_000222935.2");

    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0]["accession"], json!("GCA_000222935.1"));
    assert_eq!(versions[1]["accession"], json!("GCA_000222935.2"));
    assert_eq!(listing.calls(), 1);
    assert_eq!(datasets.summary_calls(), 2);
}

#[test]
fn warm_cache_means_zero_remote_calls() {
    let dir = tempdir().unwrap();
    let cache = store_in(&dir);
    let listing = MockListing::ok(LISTING);
    let datasets = MockDatasets::with_records(&[
        record("GCA_000222935.1"),
        record("GCA_000222935.2"),
    ]);

    let discovery = VersionDiscovery::new(&listing, &datasets, &cache);
    let first = discovery.discover("GCA_000222935.2");
    let second = discovery.discover("GCA_000222935.2");

    assert_eq!(first, second);
    assert_eq!(listing.calls(), 1);
    assert_eq!(datasets.summary_calls(), 2);
}

#[test]
fn expired_discovery_entry_triggers_rescan() {
    let dir = tempdir().unwrap();
    let cache = store_in(&dir);

    let stale = CacheEntry {
        payload: json!({"versions": [record("GCA_000222935.1")]}),
        written_at: Utc::now().timestamp() - 8 * 24 * 3600,
    };
    let path = cache.path(CacheNamespace::VersionDiscovery, "GCA_000222935");
    fs::create_dir_all(path.parent().unwrap().as_std_path()).unwrap();
    fs::write(path.as_std_path(), serde_json::to_vec(&stale).unwrap()).unwrap();

    let listing = MockListing::ok(LISTING);
    let datasets = MockDatasets::with_records(&[
        record("GCA_000222935.1"),
        record("GCA_000222935.2"),
    ]);
    let discovery = VersionDiscovery::new(&listing, &datasets, &cache);
    let versions = discovery.discover("GCA_000222935.2");

    assert_eq!(listing.calls(), 1);
    assert_eq!(versions.len(), 2);
}

#[test]
fn listing_failure_yields_empty_and_caches_nothing() {
    let dir = tempdir().unwrap();
    let cache = store_in(&dir);
    let listing = MockListing::failing();
    let datasets = MockDatasets::with_records(&[]);

    let discovery = VersionDiscovery::new(&listing, &datasets, &cache);
    assert!(discovery.discover("GCA_000222935.2").is_empty());

    let path = cache.path(CacheNamespace::VersionDiscovery, "GCA_000222935");
    assert!(!path.as_std_path().exists());
    assert!(discovery.discover("GCA_000222935.2").is_empty());
    assert_eq!(listing.calls(), 2);
}

#[test]
fn empty_match_set_is_not_cached() {
    let dir = tempdir().unwrap();
    let cache = store_in(&dir);
    let listing = MockListing::ok("<html>no assemblies here</html>");
    let datasets = MockDatasets::with_records(&[]);

    let discovery = VersionDiscovery::new(&listing, &datasets, &cache);
    assert!(discovery.discover("GCA_000222935.2").is_empty());

    let path = cache.path(CacheNamespace::VersionDiscovery, "GCA_000222935");
    assert!(!path.as_std_path().exists());
}

#[test]
fn unreachable_version_is_skipped_not_fatal() {
    let dir = tempdir().unwrap();
    let cache = store_in(&dir);
    let listing = MockListing::ok(LISTING);
    let datasets = MockDatasets::with_records(&[record("GCA_000222935.2")]);

    let discovery = VersionDiscovery::new(&listing, &datasets, &cache);
    let versions = discovery.discover("GCA_000222935.2");

    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0]["accession"], json!("GCA_000222935.2"));
}

#[test]
fn warm_metadata_cache_skips_tool_invocation() {
    let dir = tempdir().unwrap();
    let cache = store_in(&dir);
    cache.write(
        CacheNamespace::Metadata,
        "GCA_000222935.1",
        &record("GCA_000222935.1"),
    );

    let listing = MockListing::ok(LISTING);
    let datasets = MockDatasets::with_records(&[record("GCA_000222935.2")]);
    let discovery = VersionDiscovery::new(&listing, &datasets, &cache);
    let versions = discovery.discover("GCA_000222935.2");

    assert_eq!(versions.len(), 2);
    assert_eq!(datasets.summary_calls(), 1);
}

#[test]
fn invalid_base_yields_empty() {
    let dir = tempdir().unwrap();
    let cache = store_in(&dir);
    let listing = MockListing::ok(LISTING);
    let datasets = MockDatasets::with_records(&[]);

    let discovery = VersionDiscovery::new(&listing, &datasets, &cache);
    assert!(discovery.discover("B.3").is_empty());
    assert_eq!(listing.calls(), 0);
}
