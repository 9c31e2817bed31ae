use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::BackfillError;

#[derive(Debug, Deserialize, Serialize)]
pub struct RawConfig {
    pub file_name: String,
    #[serde(default)]
    pub headers: Vec<RawField>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RawField {
    Shorthand(String),
    Detailed(RawFieldObject),
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RawFieldObject {
    pub header: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub separator: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub header: String,
    pub path: String,
    pub separator: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub file_name: Utf8PathBuf,
    pub fields: Vec<FieldSpec>,
}

impl Config {
    pub fn headers(&self) -> Vec<&str> {
        self.fields.iter().map(|field| field.header.as_str()).collect()
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load(path: &str) -> Result<Config, BackfillError> {
        let config_path = PathBuf::from(path);
        let content = fs::read_to_string(&config_path)
            .map_err(|_| BackfillError::ConfigRead(config_path.clone()))?;
        let raw: RawConfig = serde_json::from_str(&content)
            .map_err(|err| BackfillError::ConfigParse(err.to_string()))?;
        Self::resolve(raw)
    }

    pub fn resolve(raw: RawConfig) -> Result<Config, BackfillError> {
        let fields = raw
            .headers
            .into_iter()
            .map(|entry| match entry {
                RawField::Shorthand(header) => FieldSpec {
                    path: header.clone(),
                    header,
                    separator: ",".to_string(),
                },
                RawField::Detailed(obj) => FieldSpec {
                    path: obj.path.unwrap_or_else(|| obj.header.clone()),
                    header: obj.header,
                    separator: obj.separator.unwrap_or_else(|| ",".to_string()),
                },
            })
            .collect::<Vec<_>>();

        if fields.is_empty() {
            return Err(BackfillError::ConfigParse(
                "config declares no output headers".to_string(),
            ));
        }

        Ok(Config {
            file_name: Utf8PathBuf::from(raw.file_name),
            fields,
        })
    }
}
