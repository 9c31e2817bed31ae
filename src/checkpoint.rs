use std::fs;

use camino::Utf8Path;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::BackfillError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub processed_count: usize,
    pub timestamp: String,
}

pub fn load_checkpoint(path: &Utf8Path) -> Checkpoint {
    if !path.as_std_path().exists() {
        return Checkpoint {
            processed_count: 0,
            timestamp: String::new(),
        };
    }
    match fs::read_to_string(path.as_std_path()) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(checkpoint) => checkpoint,
            Err(err) => {
                warn!("ignoring corrupt checkpoint {path}: {err}");
                Checkpoint {
                    processed_count: 0,
                    timestamp: String::new(),
                }
            }
        },
        Err(err) => {
            warn!("ignoring unreadable checkpoint {path}: {err}");
            Checkpoint {
                processed_count: 0,
                timestamp: String::new(),
            }
        }
    }
}

pub fn save_checkpoint(path: &Utf8Path, processed_count: usize) -> Result<(), BackfillError> {
    let checkpoint = Checkpoint {
        processed_count,
        timestamp: Utc::now().to_rfc3339(),
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| BackfillError::Filesystem(err.to_string()))?;
    }
    let content = serde_json::to_vec_pretty(&checkpoint)
        .map_err(|err| BackfillError::Filesystem(err.to_string()))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(tmp_path.as_std_path(), &content)
        .map_err(|err| BackfillError::Filesystem(err.to_string()))?;
    fs::rename(tmp_path.as_std_path(), path.as_std_path())
        .map_err(|err| BackfillError::Filesystem(err.to_string()))?;
    Ok(())
}
