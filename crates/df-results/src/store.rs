//! Dispatch record storage under `<case>/.dispatch/<run_id>/`.

use crate::types::{DispatchLogs, DispatchManifest};
use crate::{ResultsError, ResultsResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DISPATCH_DIR_NAME: &str = ".dispatch";

#[derive(Debug, Clone)]
pub struct DispatchStore {
    root_dir: PathBuf,
}

impl DispatchStore {
    pub fn new(root_dir: PathBuf) -> ResultsResult<Self> {
        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }
        Ok(Self { root_dir })
    }

    pub fn for_case(case_dir: &Path) -> ResultsResult<Self> {
        Self::new(case_dir.join(DISPATCH_DIR_NAME))
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    fn run_dir(&self, run_id: &str) -> PathBuf {
        self.root_dir.join(run_id)
    }

    pub fn has_run(&self, run_id: &str) -> bool {
        self.run_dir(run_id).join("manifest.json").exists()
    }

    pub fn save_run(&self, manifest: &DispatchManifest, logs: &DispatchLogs) -> ResultsResult<PathBuf> {
        let run_dir = self.run_dir(&manifest.run_id);
        fs::create_dir_all(&run_dir)?;

        fs::write(run_dir.join("stdout.log"), &logs.stdout)?;
        fs::write(run_dir.join("stderr.log"), &logs.stderr)?;

        // Written last so `has_run` only sees complete records.
        let manifest_json = serde_json::to_string_pretty(manifest)?;
        fs::write(run_dir.join("manifest.json"), manifest_json)?;
        debug!(run_id = %manifest.run_id, dir = %run_dir.display(), "saved dispatch record");

        Ok(run_dir)
    }

    pub fn load_manifest(&self, run_id: &str) -> ResultsResult<DispatchManifest> {
        let manifest_path = self.run_dir(run_id).join("manifest.json");

        if !manifest_path.exists() {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }

        let content = fs::read_to_string(manifest_path)?;
        let manifest = serde_json::from_str(&content)?;
        Ok(manifest)
    }

    pub fn load_logs(&self, run_id: &str) -> ResultsResult<DispatchLogs> {
        if !self.has_run(run_id) {
            return Err(ResultsError::RunNotFound {
                run_id: run_id.to_string(),
            });
        }
        let run_dir = self.run_dir(run_id);
        let read = |name: &str| -> ResultsResult<String> {
            let path = run_dir.join(name);
            if path.exists() {
                Ok(fs::read_to_string(path)?)
            } else {
                Ok(String::new())
            }
        };
        Ok(DispatchLogs {
            stdout: read("stdout.log")?,
            stderr: read("stderr.log")?,
        })
    }

    /// All recorded dispatches, oldest first.
    pub fn list_runs(&self) -> ResultsResult<Vec<DispatchManifest>> {
        let mut runs = Vec::new();

        if !self.root_dir.exists() {
            return Ok(runs);
        }

        for entry in fs::read_dir(&self.root_dir)? {
            let entry = entry?;
            if entry.path().is_dir() {
                let run_id = entry.file_name().to_string_lossy().to_string();
                if let Ok(manifest) = self.load_manifest(&run_id) {
                    runs.push(manifest);
                }
            }
        }

        runs.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(runs)
    }

    pub fn latest_run(&self) -> ResultsResult<Option<DispatchManifest>> {
        Ok(self.list_runs()?.pop())
    }
}
