use serde::Serialize;

/// Final disposition of a single record. Never retried.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IssueOutcome {
    Created { url: String },
    Skipped { reason: String },
    Failed { error: String },
}

#[cfg(test)]
impl IssueOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, IssueOutcome::Created { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordResult {
    pub title: String,
    pub outcome: IssueOutcome,
    /// Non-fatal problems hit while processing this record
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
    /// One entry per input record, in input order
    pub results: Vec<RecordResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<String>,
}

impl BatchSummary {
    pub fn push(&mut self, result: RecordResult) {
        match result.outcome {
            IssueOutcome::Created { .. } => self.created += 1,
            IssueOutcome::Skipped { .. } => self.skipped += 1,
            IssueOutcome::Failed { .. } => self.failed += 1,
        }
        self.total += 1;
        self.results.push(result);
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.results.iter().filter_map(|r| match &r.outcome {
            IssueOutcome::Failed { error } => Some((r.title.as_str(), error.as_str())),
            IssueOutcome::Created { .. } | IssueOutcome::Skipped { .. } => None,
        })
    }

    pub fn skips(&self) -> impl Iterator<Item = (&str, &str)> {
        self.results.iter().filter_map(|r| match &r.outcome {
            IssueOutcome::Skipped { reason } => Some((r.title.as_str(), reason.as_str())),
            IssueOutcome::Created { .. } | IssueOutcome::Failed { .. } => None,
        })
    }
}
