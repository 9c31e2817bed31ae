use serde_json::{Value, json};

use assembly_backfill::config::{Config, ConfigLoader, RawConfig, RawField, RawFieldObject};
use assembly_backfill::datasets::DatasetsClient;
use assembly_backfill::domain::GenomeAccession;
use assembly_backfill::error::BackfillError;
use assembly_backfill::historical::parse_historical_version;

struct MockDatasets {
    sequences: Result<Vec<Value>, ()>,
}

impl DatasetsClient for MockDatasets {
    fn genome_summary(&self, accession: &GenomeAccession) -> Result<Value, BackfillError> {
        Err(BackfillError::DatasetsTool(format!(
            "unexpected summary call for {accession}"
        )))
    }

    fn sequence_report(&self, _accession: &GenomeAccession) -> Result<Vec<Value>, BackfillError> {
        self.sequences
            .clone()
            .map_err(|_| BackfillError::DatasetsTool("sequence report unavailable".to_string()))
    }
}

fn field(header: &str, path: &str) -> RawField {
    RawField::Detailed(RawFieldObject {
        header: header.to_string(),
        path: Some(path.to_string()),
        separator: None,
    })
}

fn test_config() -> Config {
    ConfigLoader::resolve(RawConfig {
        file_name: "out.tsv".to_string(),
        headers: vec![
            field("assemblyId", "processedAssemblyInfo.assemblyID"),
            field("genbankAccession", "processedAssemblyInfo.genbankAccession"),
            field("versionStatus", "processedAssemblyInfo.versionStatus"),
            field("organismName", "organism.organismName"),
            field("releaseDate", "assemblyInfo.releaseDate"),
            field(
                "mitochondrionAccession",
                "processedOrganelleInfo.mitochondrion.accession",
            ),
        ],
    })
    .unwrap()
}

fn version_record() -> Value {
    json!({
        "accession": "GCA_000222935.1",
        "paired_accession": "GCF_000222935.1",
        "organism": {"organism_name": "Aciculosporium take"},
        "assembly_info": {"release_date": "2011-09-08"},
        "assembly_stats": {"total_sequence_length": "1000"},
    })
}

fn mito_sequence() -> Value {
    json!({
        "assembly_unit": "non-nuclear",
        "assigned_molecule_location_type": "Mitochondrion",
        "role": "assembled-molecule",
        "genbank_accession": "CM000099.1",
        "length": 16000,
        "gc_percent": 44.5,
    })
}

#[test]
fn historical_row_is_tagged_and_keyed_by_own_version() {
    let config = test_config();
    let datasets = MockDatasets {
        sequences: Ok(vec![mito_sequence()]),
    };

    let row = parse_historical_version(
        &version_record(),
        &config,
        &datasets,
        "GCA_000222935",
        1,
    )
    .unwrap();

    assert_eq!(row["assemblyId"], "GCA_000222935_1");
    assert_eq!(row["versionStatus"], "superseded");
    assert_eq!(row["genbankAccession"], "GCA_000222935.1");
    assert_eq!(row["organismName"], "Aciculosporium take");
    assert_eq!(row["releaseDate"], "2011-09-08");

    assert_ne!(row["assemblyId"], "GCA_000222935_2");
}

#[test]
fn enrichment_detail_reaches_the_row() {
    let config = test_config();
    let datasets = MockDatasets {
        sequences: Ok(vec![mito_sequence()]),
    };
    let row = parse_historical_version(
        &version_record(),
        &config,
        &datasets,
        "GCA_000222935",
        1,
    )
    .unwrap();
    assert_eq!(row["mitochondrionAccession"], "CM000099.1");
}

#[test]
fn record_without_accession_is_an_error() {
    let config = test_config();
    let datasets = MockDatasets {
        sequences: Ok(Vec::new()),
    };
    let err = parse_historical_version(
        &json!({"organism": {}}),
        &config,
        &datasets,
        "GCA_000222935",
        1,
    )
    .unwrap_err();
    assert!(matches!(err, BackfillError::MissingField(_)));
}

#[test]
fn sequence_report_failure_propagates() {
    let config = test_config();
    let datasets = MockDatasets { sequences: Err(()) };
    let err = parse_historical_version(
        &version_record(),
        &config,
        &datasets,
        "GCA_000222935",
        1,
    )
    .unwrap_err();
    assert!(matches!(err, BackfillError::DatasetsTool(_)));
}
