use std::collections::HashMap;

use serde_json::Value;

use crate::config::Config;
use crate::datasets::DatasetsClient;
use crate::domain::GenomeAccession;
use crate::error::BackfillError;
use crate::report;

pub fn parse_historical_version<D: DatasetsClient>(
    version_record: &Value,
    config: &Config,
    datasets: &D,
    base: &str,
    version_num: u32,
) -> Result<HashMap<String, String>, BackfillError> {
    let record = report::convert_keys_to_camel_case(version_record);
    let mut processed = report::process_assembly_report(&record, None, "superseded");

    let accession_str = record
        .get("accession")
        .and_then(|v| v.as_str())
        .ok_or_else(|| BackfillError::MissingField("accession".to_string()))?;
    let accession: GenomeAccession = accession_str.parse()?;
    let sequences = datasets.sequence_report(&accession)?;
    report::attach_sequence_report(&mut processed, &sequences);

    if let Some(info) = processed
        .get_mut("processedAssemblyInfo")
        .and_then(|v| v.as_object_mut())
    {
        info.insert(
            "assemblyID".to_string(),
            Value::String(format!("{base}_{version_num}")),
        );
    }

    Ok(report::format_row(config, &processed))
}
