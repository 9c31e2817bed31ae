use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BackfillError;

pub fn parse_accession(accession: &str) -> Result<(String, u32), BackfillError> {
    let trimmed = accession.trim();
    if trimmed.is_empty() {
        return Err(BackfillError::InvalidAccession(accession.to_string()));
    }
    match trimmed.rsplit_once('.') {
        None => Ok((trimmed.to_string(), 1)),
        Some((base, suffix)) => {
            let version = suffix
                .parse::<u32>()
                .map_err(|_| BackfillError::InvalidAccession(accession.to_string()))?;
            if version == 0 || base.is_empty() {
                return Err(BackfillError::InvalidAccession(accession.to_string()));
            }
            Ok((base.to_string(), version))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenomeAccession(String);

impl GenomeAccession {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn base(&self) -> BaseAccession {
        let (base, _) = self
            .0
            .split_once('.')
            .unwrap_or((self.0.as_str(), ""));
        BaseAccession(base.to_string())
    }

    pub fn version(&self) -> u32 {
        self.0
            .split_once('.')
            .and_then(|(_, suffix)| suffix.parse().ok())
            .unwrap_or(1)
    }
}

impl fmt::Display for GenomeAccession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GenomeAccession {
    type Err = BackfillError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_string();
        let Some((base, suffix)) = normalized.split_once('.') else {
            return Err(BackfillError::InvalidAccession(value.to_string()));
        };
        if !is_strict_base(base) || !is_version_suffix(suffix) {
            return Err(BackfillError::InvalidAccession(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BaseAccession(String);

impl BaseAccession {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BaseAccession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BaseAccession {
    type Err = BackfillError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_string();
        if !is_strict_base(&normalized) {
            return Err(BackfillError::InvalidAccession(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

fn is_strict_base(base: &str) -> bool {
    if !(base.starts_with("GCA_") || base.starts_with("GCF_")) {
        return false;
    }
    let body = &base[4..];
    body.len() == 9 && body.chars().all(|ch| ch.is_ascii_digit())
}

fn is_version_suffix(suffix: &str) -> bool {
    !suffix.is_empty() && suffix.chars().all(|ch| ch.is_ascii_digit())
}
