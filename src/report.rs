use std::collections::{BTreeMap, HashMap};

use serde_json::{Map, Value, json};

use crate::config::Config;

pub fn convert_keys_to_camel_case(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut converted = Map::new();
            for (key, entry) in map {
                converted.insert(camel_case(key), convert_keys_to_camel_case(entry));
            }
            Value::Object(converted)
        }
        Value::Array(items) => {
            Value::Array(items.iter().map(convert_keys_to_camel_case).collect())
        }
        other => other.clone(),
    }
}

fn camel_case(key: &str) -> String {
    key.split('_')
        .enumerate()
        .map(|(i, word)| {
            if i == 0 {
                word.to_string()
            } else {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => {
                        first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                    }
                    None => String::new(),
                }
            }
        })
        .collect()
}

pub fn process_assembly_report(
    report: &Value,
    previous: Option<&Value>,
    version_status: &str,
) -> Value {
    let mut processed = report.clone();
    let accession = report
        .get("accession")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let paired = report
        .get("pairedAccession")
        .and_then(|v| v.as_str())
        .map(|v| v.to_string());

    let (genbank, refseq) = if accession.starts_with("GCF_") {
        (paired, Some(accession))
    } else {
        (Some(accession), paired)
    };

    let mut info = Map::new();
    if let Some(genbank) = genbank {
        info.insert("genbankAccession".to_string(), Value::String(genbank));
    }
    if let Some(refseq) = refseq.filter(|acc| acc.starts_with("GCF_")) {
        info.insert("refseqAccession".to_string(), Value::String(refseq));
    }
    info.insert(
        "versionStatus".to_string(),
        Value::String(version_status.to_string()),
    );

    let own_release = report
        .get("assemblyInfo")
        .and_then(|v| v.get("releaseDate"))
        .cloned();
    let first_public = previous
        .and_then(|prev| {
            prev.get("processedAssemblyInfo")
                .and_then(|v| v.get("firstPublicDate"))
                .cloned()
        })
        .or(own_release);
    if let Some(date) = first_public {
        info.insert("firstPublicDate".to_string(), date);
    }

    if let Some(map) = processed.as_object_mut() {
        map.insert("processedAssemblyInfo".to_string(), Value::Object(info));
    }
    processed
}

pub fn attach_sequence_report(processed: &mut Value, sequences: &[Value]) {
    let genbank = processed
        .get("processedAssemblyInfo")
        .and_then(|v| v.get("genbankAccession"))
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    let total_span = processed
        .get("assemblyStats")
        .and_then(|v| v.get("totalSequenceLength"))
        .and_then(as_u64_lenient)
        .unwrap_or(0);

    let mut chromosomes = Vec::new();
    let mut organelle_groups: BTreeMap<String, Vec<&Value>> = BTreeMap::new();

    for seq in sequences {
        if is_non_nuclear(seq) {
            let location = seq
                .get("assigned_molecule_location_type")
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            let name = if location.eq_ignore_ascii_case("mitochondrion") {
                "mitochondrion"
            } else {
                "plastid"
            };
            organelle_groups.entry(name.to_string()).or_default().push(seq);
            continue;
        }
        if is_assigned_to_chromosome(seq) && is_assembled_molecule(seq) {
            let length = seq.get("length").and_then(as_u64_lenient).unwrap_or(0);
            let seq_proportion = if total_span > 0 {
                length as f64 / total_span as f64
            } else {
                0.0
            };
            chromosomes.push(json!({
                "assemblyId": genbank,
                "sequenceId": seq.get("genbank_accession").and_then(|v| v.as_str()).unwrap_or(""),
                "start": 1,
                "end": length,
                "strand": 1,
                "length": length,
                "midpoint": length.div_ceil(2),
                "midpointProportion": 0.5,
                "seqProportion": seq_proportion,
            }));
        }
    }

    let mut organelles = Vec::new();
    let mut organelle_info = Map::new();
    for (name, group) in organelle_groups {
        let source_accession = processed
            .get("accession")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        let mut entry = Map::new();
        entry.insert(
            "sourceAccession".to_string(),
            Value::String(source_accession.to_string()),
        );
        entry.insert("organelle".to_string(), Value::String(name.clone()));

        let mut info = Map::new();
        let assembled = group.first().copied().filter(|seq| is_assembled_molecule(seq));
        if let Some(seq) = assembled {
            if let Some(acc) = seq.get("genbank_accession").and_then(|v| v.as_str()) {
                entry.insert(
                    "genbankAssmAccession".to_string(),
                    Value::String(acc.to_string()),
                );
                info.insert("accession".to_string(), Value::String(acc.to_string()));
            }
            if let Some(length) = seq.get("length").cloned() {
                entry.insert("totalSequenceLength".to_string(), length.clone());
                info.insert("assemblySpan".to_string(), length);
            }
            if let Some(gc) = seq.get("gc_percent").cloned() {
                entry.insert("gcPercent".to_string(), gc.clone());
                info.insert("gcPercent".to_string(), gc);
            }
        } else {
            let scaffolds = group
                .iter()
                .filter_map(|seq| seq.get("genbank_accession").and_then(|v| v.as_str()))
                .collect::<Vec<_>>()
                .join(";");
            info.insert("scaffolds".to_string(), Value::String(scaffolds));
        }
        organelle_info.insert(name, Value::Object(info));
        organelles.push(Value::Object(entry));
    }

    if let Some(map) = processed.as_object_mut() {
        map.insert("chromosomes".to_string(), Value::Array(chromosomes));
        if !organelles.is_empty() {
            map.insert("organelles".to_string(), Value::Array(organelles));
            map.insert(
                "processedOrganelleInfo".to_string(),
                Value::Object(organelle_info),
            );
        }
    }
}

fn is_non_nuclear(seq: &Value) -> bool {
    seq.get("assembly_unit").and_then(|v| v.as_str()) == Some("non-nuclear")
}

fn is_assembled_molecule(seq: &Value) -> bool {
    seq.get("role").and_then(|v| v.as_str()) == Some("assembled-molecule")
}

fn is_assigned_to_chromosome(seq: &Value) -> bool {
    let unit = seq.get("assembly_unit").and_then(|v| v.as_str());
    let location = seq
        .get("assigned_molecule_location_type")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    unit == Some("Primary Assembly") && matches!(location, "Chromosome" | "Linkage Group")
}

fn as_u64_lenient(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

pub fn format_row(config: &Config, processed: &Value) -> HashMap<String, String> {
    let mut row = HashMap::new();
    for field in &config.fields {
        let extracted = walk_path(processed, &field.path);
        row.insert(field.header.clone(), format_entry(extracted, &field.separator));
    }
    row
}

fn walk_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

fn format_entry(value: Option<&Value>, separator: &str) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(|item| format_entry(Some(item), separator))
            .collect::<Vec<_>>()
            .join(separator),
        Some(other) => other.to_string(),
    }
}
