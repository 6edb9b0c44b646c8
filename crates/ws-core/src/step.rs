//! Per-step outcomes collected by the command orchestrators.
//!
//! Adapter failures never abort a command; they land here as `Failed` steps
//! and the remaining steps still run.

use std::path::PathBuf;

use serde::Serialize;

use crate::adapters::AdapterResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum StepStatus {
    Ok,
    /// Informational notice: the step ran but the caller should know something.
    Warning(String),
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    /// Short subject, e.g. `Terminal (tmux)`.
    pub label: String,
    #[serde(flatten)]
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub workspace: String,
    pub path: PathBuf,
    pub steps: Vec<Step>,
}

impl Report {
    pub fn new(workspace: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            workspace: workspace.into(),
            path: path.into(),
            steps: Vec::new(),
        }
    }

    pub fn ok(&mut self, label: impl Into<String>, detail: impl Into<String>) {
        self.push(label, StepStatus::Ok, Some(detail.into()));
    }

    pub fn warn(&mut self, label: impl Into<String>, reason: impl Into<String>) {
        self.push(label, StepStatus::Warning(reason.into()), None);
    }

    pub fn skipped(&mut self, label: impl Into<String>, reason: impl Into<String>) {
        self.push(label, StepStatus::Skipped(reason.into()), None);
    }

    pub fn failed(&mut self, label: impl Into<String>, reason: impl Into<String>) {
        self.push(label, StepStatus::Failed(reason.into()), None);
    }

    /// Record an adapter call: `Ok` values are described by `describe`,
    /// errors become a `Failed` step. Returns the value for further use.
    pub fn record<T>(
        &mut self,
        label: impl Into<String>,
        result: AdapterResult<T>,
        describe: impl FnOnce(&T) -> String,
    ) -> Option<T> {
        match result {
            Ok(value) => {
                let detail = describe(&value);
                self.ok(label, detail);
                Some(value)
            }
            Err(err) => {
                self.failed(label, err.to_string());
                None
            }
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &Step> {
        self.steps
            .iter()
            .filter(|step| matches!(step.status, StepStatus::Failed(_)))
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    pub fn step(&self, label: &str) -> Option<&Step> {
        self.steps.iter().find(|step| step.label == label)
    }

    fn push(&mut self, label: impl Into<String>, status: StepStatus, detail: Option<String>) {
        self.steps.push(Step {
            label: label.into(),
            status,
            detail,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::AdapterError;

    #[test]
    fn record_turns_errors_into_failed_steps() {
        let mut report = Report::new("demo", "/tmp/demo");
        let value = report.record("Editor (cursor)", Ok(3usize), |n| format!("{n} things"));
        assert_eq!(value, Some(3));
        let missing: AdapterResult<()> = Err(AdapterError::NotInstalled {
            tool: "cursor".to_string(),
        });
        assert_eq!(report.record("Editor (cursor)", missing, |_| String::new()), None);

        assert_eq!(report.steps.len(), 2);
        assert_eq!(report.steps[0].detail.as_deref(), Some("3 things"));
        assert_eq!(
            report.steps[1].status,
            StepStatus::Failed("cursor is not installed".to_string())
        );
        assert!(report.has_failures());
    }

    #[test]
    fn steps_serialize_with_flat_status() {
        let mut report = Report::new("demo", "/tmp/demo");
        report.skipped("Browser", "no adapter configured");
        let json = serde_json::to_value(&report).expect("json");
        assert_eq!(json["steps"][0]["status"], "skipped");
        assert_eq!(json["steps"][0]["reason"], "no adapter configured");
        assert!(!report.has_failures());
    }
}
