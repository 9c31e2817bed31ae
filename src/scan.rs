use std::fs::File;
use std::io::{BufRead, BufReader};

use camino::Utf8Path;
use serde_json::Value;
use tracing::warn;

use crate::domain::parse_accession;
use crate::error::BackfillError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillTask {
    pub base_accession: String,
    pub current_version: u32,
    pub current_accession: String,
    pub historical_versions_needed: Vec<u32>,
}

pub fn identify_backfill_tasks(input: &Utf8Path) -> Result<Vec<BackfillTask>, BackfillError> {
    let file = File::open(input.as_std_path())
        .map_err(|err| BackfillError::InputRead(format!("{input}: {err}")))?;
    let reader = BufReader::new(file);

    let mut tasks = Vec::new();
    for (line_number, line) in reader.lines().enumerate() {
        let line = line.map_err(|err| BackfillError::InputRead(format!("{input}: {err}")))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: Value = match serde_json::from_str(&line) {
            Ok(record) => record,
            Err(err) => {
                warn!("skipping corpus line {}: {err}", line_number + 1);
                continue;
            }
        };
        let Some(accession) = record.get("accession").and_then(|v| v.as_str()) else {
            warn!("skipping corpus line {}: no accession field", line_number + 1);
            continue;
        };
        let (base, version) = match parse_accession(accession) {
            Ok(parts) => parts,
            Err(err) => {
                warn!("skipping corpus record {accession}: {err}");
                continue;
            }
        };
        if version > 1 {
            tasks.push(BackfillTask {
                base_accession: base,
                current_version: version,
                current_accession: accession.to_string(),
                historical_versions_needed: (1..version).collect(),
            });
        }
    }
    Ok(tasks)
}
