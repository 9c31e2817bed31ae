use std::collections::BTreeMap;

use regex::Regex;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::cache::{CacheNamespace, CacheStore};
use crate::datasets::DatasetsClient;
use crate::domain::{BaseAccession, GenomeAccession, parse_accession};
use crate::error::BackfillError;
use crate::listing::ListingClient;

pub struct VersionDiscovery<'a, L, D> {
    listing: &'a L,
    datasets: &'a D,
    cache: &'a CacheStore,
}

impl<'a, L: ListingClient, D: DatasetsClient> VersionDiscovery<'a, L, D> {
    pub fn new(listing: &'a L, datasets: &'a D, cache: &'a CacheStore) -> Self {
        Self {
            listing,
            datasets,
            cache,
        }
    }

    pub fn discover(&self, accession: &str) -> Vec<Value> {
        let base = match derive_base(accession) {
            Ok(base) => base,
            Err(err) => {
                warn!("cannot discover versions for {accession}: {err}");
                return Vec::new();
            }
        };

        if let Some(cached) = self.cache.read(CacheNamespace::VersionDiscovery, base.as_str()) {
            if let Some(versions) = cached.get("versions").and_then(|v| v.as_array()) {
                debug!("using cached version data for {base}");
                return versions.to_vec();
            }
        }

        debug!("discovering versions for {base} via listing");
        let listing = match self.listing.fetch_listing(&base) {
            Ok(listing) => listing,
            Err(err) => {
                warn!("listing fetch failed for {base}: {err}");
                return Vec::new();
            }
        };

        let mut versions = Vec::new();
        for version_accession in extract_version_accessions(&base, &listing).values() {
            if let Some(cached) = self.cache.read(CacheNamespace::Metadata, version_accession) {
                versions.push(cached);
                continue;
            }
            let validated: GenomeAccession = match version_accession.parse() {
                Ok(validated) => validated,
                Err(_) => {
                    warn!("skipping unexpected accession format: {version_accession}");
                    continue;
                }
            };
            match self.datasets.genome_summary(&validated) {
                Ok(record) => {
                    self.cache
                        .write(CacheNamespace::Metadata, version_accession, &record);
                    versions.push(record);
                }
                Err(err) => {
                    warn!("error fetching {version_accession}: {err}");
                    continue;
                }
            }
        }

        if !versions.is_empty() {
            let entry = json!({
                "versions": versions,
                "baseAccession": base.as_str(),
            });
            self.cache
                .write(CacheNamespace::VersionDiscovery, base.as_str(), &entry);
        }

        versions
    }
}

fn derive_base(accession: &str) -> Result<BaseAccession, BackfillError> {
    let (base, _) = parse_accession(accession)?;
    base.parse()
}

fn extract_version_accessions(base: &BaseAccession, listing: &str) -> BTreeMap<u32, String> {
    let pattern = Regex::new(&format!(r"{}\.\d+", base.as_str())).unwrap();
    let mut found = BTreeMap::new();
    for candidate in pattern.find_iter(listing) {
        if let Ok((_, version)) = parse_accession(candidate.as_str()) {
            found.insert(version, candidate.as_str().to_string());
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_unique_versions_in_ascending_order() {
        let base: BaseAccession = "GCA_000002035".parse().unwrap();
        let listing = r#"
            <a href="GCA_000002035.2_Zv8/">GCA_000002035.2_Zv8/</a>
            <a href="GCA_000002035.10_GRCz10/">GCA_000002035.10_GRCz10/</a>
            <a href="GCA_000002035.2_Zv8/">GCA_000002035.2_Zv8/</a>
            <a href="GCA_000002035.4_Zv9/">GCA_000002035.4_Zv9/</a>
        "#;
        let found = extract_version_accessions(&base, listing);
        let accessions: Vec<&String> = found.values().collect();
        assert_eq!(
            accessions,
            vec!["GCA_000002035.2", "GCA_000002035.4", "GCA_000002035.10"]
        );
    }

    #[test]
    fn ignores_other_bases_in_listing() {
        let base: BaseAccession = "GCA_000002035".parse().unwrap();
        let listing = "GCA_000002036.1 GCF_000002035.3";
        assert!(extract_version_accessions(&base, listing).is_empty());
    }
}
