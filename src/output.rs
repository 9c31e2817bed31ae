use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};

use crate::config::Config;
use crate::error::BackfillError;

pub type Row = HashMap<String, String>;

#[derive(Debug, Default)]
pub struct RowAccumulator {
    order: Vec<String>,
    rows: HashMap<String, Row>,
}

impl RowAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: String, row: Row) {
        if !self.rows.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.rows.insert(key, row);
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn drain(&mut self) -> Vec<Row> {
        let order = std::mem::take(&mut self.order);
        let mut rows = std::mem::take(&mut self.rows);
        order
            .into_iter()
            .filter_map(|key| rows.remove(&key))
            .collect()
    }
}

#[derive(Debug)]
pub struct TsvWriter {
    path: Utf8PathBuf,
    headers: Vec<String>,
}

impl TsvWriter {
    pub fn new(config: &Config) -> Self {
        Self {
            path: config.file_name.clone(),
            headers: config
                .headers()
                .into_iter()
                .map(|header| header.to_string())
                .collect(),
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn append(&self, rows: &[Row]) -> Result<(), BackfillError> {
        if rows.is_empty() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent.as_std_path())
                .map_err(|err| BackfillError::Filesystem(err.to_string()))?;
        }
        let is_new = !self.path.as_std_path().exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path.as_std_path())
            .map_err(|err| BackfillError::Filesystem(format!("{}: {err}", self.path)))?;

        if is_new {
            writeln!(file, "{}", self.headers.join("\t"))
                .map_err(|err| BackfillError::Filesystem(err.to_string()))?;
        }
        for row in rows {
            let line = self
                .headers
                .iter()
                .map(|header| row.get(header).map(String::as_str).unwrap_or(""))
                .collect::<Vec<_>>()
                .join("\t");
            writeln!(file, "{line}").map_err(|err| BackfillError::Filesystem(err.to_string()))?;
        }
        Ok(())
    }
}
