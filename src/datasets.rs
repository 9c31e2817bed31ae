use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::domain::GenomeAccession;
use crate::error::BackfillError;

const TOOL_TIMEOUT: Duration = Duration::from_secs(60);

pub trait DatasetsClient: Send + Sync {
    fn genome_summary(&self, accession: &GenomeAccession) -> Result<Value, BackfillError>;

    fn sequence_report(&self, accession: &GenomeAccession) -> Result<Vec<Value>, BackfillError>;
}

#[derive(Debug, Clone)]
pub struct DatasetsCli {
    datasets: Option<PathBuf>,
}

impl DatasetsCli {
    pub fn new() -> Self {
        Self {
            datasets: find_in_path("datasets"),
        }
    }

    fn require_tool(&self) -> Result<&PathBuf, BackfillError> {
        self.datasets
            .as_ref()
            .ok_or_else(|| BackfillError::MissingTool("datasets".to_string()))
    }

    fn run_summary(&self, args: &[String]) -> Result<String, BackfillError> {
        let program = self.require_tool()?;
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| BackfillError::DatasetsTool(err.to_string()))?;

        let stdout_handle = child.stdout.take().map(spawn_reader);
        let stderr_handle = child.stderr.take().map(spawn_reader);

        let deadline = Instant::now() + TOOL_TIMEOUT;
        let status = loop {
            let polled = child
                .try_wait()
                .map_err(|err| BackfillError::DatasetsTool(err.to_string()))?;
            match polled {
                Some(status) => break status,
                None => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(BackfillError::DatasetsTimeout(TOOL_TIMEOUT.as_secs()));
                    }
                    thread::sleep(Duration::from_millis(50));
                }
            }
        };

        let stdout = stdout_handle
            .map(|handle| handle.join().unwrap_or_default())
            .unwrap_or_default();
        let stderr = stderr_handle
            .map(|handle| handle.join().unwrap_or_default())
            .unwrap_or_default();

        if !status.success() {
            let message = String::from_utf8_lossy(&stderr).trim().to_string();
            let message = if message.is_empty() {
                format!("datasets exited with {status}")
            } else {
                message
            };
            return Err(BackfillError::DatasetsTool(message));
        }

        Ok(String::from_utf8_lossy(&stdout).trim().to_string())
    }
}

impl Default for DatasetsCli {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetsClient for DatasetsCli {
    fn genome_summary(&self, accession: &GenomeAccession) -> Result<Value, BackfillError> {
        let args = vec![
            "summary".to_string(),
            "genome".to_string(),
            "accession".to_string(),
            accession.as_str().to_string(),
            "--as-json-lines".to_string(),
        ];
        let stdout = self.run_summary(&args)?;
        let line = stdout.lines().next().unwrap_or_default();
        if line.is_empty() {
            return Err(BackfillError::DatasetsTool(format!(
                "no metadata for {accession}"
            )));
        }
        serde_json::from_str(line).map_err(|err| BackfillError::DatasetsTool(err.to_string()))
    }

    fn sequence_report(&self, accession: &GenomeAccession) -> Result<Vec<Value>, BackfillError> {
        let args = vec![
            "summary".to_string(),
            "genome".to_string(),
            "accession".to_string(),
            accession.as_str().to_string(),
            "--report".to_string(),
            "sequence".to_string(),
            "--as-json-lines".to_string(),
        ];
        let stdout = self.run_summary(&args)?;
        let mut records = Vec::new();
        for line in stdout.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let record: Value = serde_json::from_str(line)
                .map_err(|err| BackfillError::DatasetsTool(err.to_string()))?;
            records.push(record);
        }
        Ok(records)
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut source: R) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        let _ = source.read_to_end(&mut buffer);
        buffer
    })
}

fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for path in std::env::split_paths(&path_var) {
        let exe = path.join(format!("{name}.exe"));
        if exe.exists() {
            return Some(exe);
        }
        let plain = path.join(name);
        if plain.exists() {
            return Some(plain);
        }
    }
    None
}
