use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ledger::MigrationRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepState {
    Pending,
    Executed,
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepState::Pending => write!(f, "Pending"),
            StepState::Executed => write!(f, "Executed"),
        }
    }
}

/// One registered step as seen against the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepStatus {
    pub version: String,
    pub description: String,
    pub state: StepState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executed_at: Option<DateTime<Utc>>,
}

/// Registered steps in registration order, plus any ledger rows no
/// registered step accounts for.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusReport {
    pub steps: Vec<StepStatus>,
    pub orphaned: Vec<MigrationRecord>,
}

impl StatusReport {
    pub fn executed_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.state == StepState::Executed)
            .count()
    }

    pub fn pending_count(&self) -> usize {
        self.steps.len() - self.executed_count()
    }

    pub fn is_up_to_date(&self) -> bool {
        self.pending_count() == 0
    }

    pub fn has_orphans(&self) -> bool {
        !self.orphaned.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(version: &str, state: StepState) -> StepStatus {
        StepStatus {
            version: version.into(),
            description: format!("step {version}"),
            executed_at: (state == StepState::Executed).then(Utc::now),
            state,
        }
    }

    #[test]
    fn counts_pending_and_executed() {
        let report = StatusReport {
            steps: vec![
                status("001", StepState::Executed),
                status("002", StepState::Pending),
                status("003", StepState::Pending),
            ],
            orphaned: Vec::new(),
        };
        assert_eq!(report.executed_count(), 1);
        assert_eq!(report.pending_count(), 2);
        assert!(!report.is_up_to_date());
        assert!(!report.has_orphans());
    }

    #[test]
    fn empty_report_is_up_to_date() {
        let report = StatusReport::default();
        assert!(report.is_up_to_date());
        assert_eq!(report.pending_count(), 0);
    }

    #[test]
    fn serializes_state_in_lowercase_without_empty_timestamps() {
        let json = serde_json::to_value(status("002", StepState::Pending)).unwrap();
        assert_eq!(json["state"], "pending");
        assert!(json.get("executed_at").is_none());
    }
}
