//! JSON exporter for finished runs.
//!
//! Writes the parameters, every streamed pair result and the final summary
//! so a run can be inspected or replotted offline.

use crate::timeline::MonthSnapshot;
use bondsim_core::{PairResult, RunParams, RunSummary};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;

/// Complete run export.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunExport {
    /// Short run identifier from the logs
    pub run_id: String,

    pub params: RunParams,

    /// Results carried by progress notifications
    pub results: Vec<PairResult>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<RunSummary>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Yearly timeline snapshots, if requested
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub timeline: Vec<MonthSnapshot>,
}

impl RunExport {
    /// Creates a new export container.
    pub fn new(run_id: impl Into<String>, params: RunParams) -> Self {
        Self {
            run_id: run_id.into(),
            params,
            results: Vec::new(),
            summary: None,
            error: None,
            timeline: Vec::new(),
        }
    }

    /// Records the run's outcome.
    pub fn finalize(&mut self, summary: Option<RunSummary>, error: Option<String>) {
        self.summary = summary;
        self.error = error;
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_round_trip() {
        let mut export = RunExport::new("abcd1234", RunParams::default().with_seed(5));
        export.finalize(Some(RunSummary::default()), None);

        let path = std::env::temp_dir().join(format!("bondsim-export-{}.json", std::process::id()));
        let path = path.to_string_lossy().to_string();
        export.write_to_file(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(text.contains("\"runId\": \"abcd1234\""));
        assert!(text.contains("\"randomSeed\": 5"));
        assert!(!text.contains("\"error\""));
        assert!(!text.contains("\"timeline\""));

        let back: RunExport = serde_json::from_str(&text).unwrap();
        assert_eq!(back.params, export.params);
        assert_eq!(back.summary, Some(RunSummary::default()));
    }
}
