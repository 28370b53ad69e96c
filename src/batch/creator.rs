use super::project::ProjectBinder;
use super::reconcile::FieldReconciler;
use super::snapshot::RemoteSnapshot;
use crate::api::{NewIssue, Tracker};
use crate::models::outcome::IssueOutcome;
use crate::models::project::ProjectBinding;
use crate::models::record::IssueRecord;
use crate::report::RecordLog;

/// Creates one issue per call. A single attempt, no retries.
pub struct IssueCreator<'a> {
    tracker: &'a dyn Tracker,
    reconciler: FieldReconciler<'a>,
    binder: ProjectBinder<'a>,
}

impl<'a> IssueCreator<'a> {
    pub fn new(tracker: &'a dyn Tracker, reconciler: FieldReconciler<'a>) -> Self {
        Self {
            tracker,
            reconciler,
            binder: ProjectBinder::new(tracker),
        }
    }

    pub async fn create(
        &self,
        record: &IssueRecord,
        snapshot: &mut RemoteSnapshot,
        binding: Option<&ProjectBinding>,
        log: &mut RecordLog,
    ) -> IssueOutcome {
        if snapshot.contains_title(&record.title) {
            return IssueOutcome::Skipped {
                reason: format!("Issue with title '{}' already exists", record.title),
            };
        }

        let assignee = self
            .reconciler
            .resolve_assignee(record.assignee.as_deref(), log)
            .await;
        let labels = self
            .reconciler
            .reconcile_labels(&record.labels, snapshot, log)
            .await;

        let new_issue = NewIssue {
            title: record.title.clone(),
            body: record.description.clone(),
            assignee,
            labels,
        };

        let issue = match self.tracker.create_issue(&new_issue).await {
            Ok(issue) => issue,
            Err(e) => {
                return IssueOutcome::Failed {
                    error: format!("GitHub API error: {}", e.message),
                }
            }
        };

        if let Some(binding) = binding {
            self.binder.attach(&issue, record, binding, log).await;
        }

        IssueOutcome::Created {
            url: issue.html_url,
        }
    }
}
