use super::reconcile::validate_project_fields;
use crate::api::{ApiResult, CreatedIssue, Tracker};
use crate::models::project::ProjectBinding;
use crate::models::record::IssueRecord;
use crate::report::RecordLog;

#[derive(Debug, Clone, PartialEq)]
pub enum ProjectResolution {
    Found(ProjectBinding),
    /// No board has that exact title; the names that do exist, for the operator.
    NotFound { available: Vec<String> },
}

pub struct ProjectBinder<'a> {
    tracker: &'a dyn Tracker,
}

impl<'a> ProjectBinder<'a> {
    pub fn new(tracker: &'a dyn Tracker) -> Self {
        Self { tracker }
    }

    /// Find a board by exact, case-sensitive title and load its field schema.
    pub async fn resolve(&self, name: &str) -> ApiResult<ProjectResolution> {
        let projects = self.tracker.list_projects().await?;

        let Some(project) = projects.iter().find(|p| p.title == name).cloned() else {
            return Ok(ProjectResolution::NotFound {
                available: projects.into_iter().map(|p| p.title).collect(),
            });
        };

        let fields = self.tracker.project_fields(&project.id).await?;
        Ok(ProjectResolution::Found(ProjectBinding::new(project, fields)))
    }

    /// Add a freshly created issue to the board. Never fails: every problem,
    /// including the add itself, is recorded as a warning on `log`.
    pub async fn attach(
        &self,
        issue: &CreatedIssue,
        record: &IssueRecord,
        binding: &ProjectBinding,
        log: &mut RecordLog,
    ) {
        let status = record
            .status
            .as_deref()
            .or(binding.default_status.as_deref());

        let (fields, warnings) = validate_project_fields(
            binding,
            status,
            record.priority.as_deref(),
            &record.custom_fields,
        );

        if !warnings.is_empty() {
            for warning in warnings {
                log.warn(warning);
            }
            log.note("→ Proceeding with valid fields only");
        }

        match self
            .tracker
            .add_project_item(&binding.id, &issue.node_id, &fields)
            .await
        {
            Ok(rejected) => {
                log.note(&format!("Added to project '{}'", binding.title));
                for warning in rejected {
                    log.warn(warning);
                }
            }
            Err(e) => log.warn(format!(
                "Could not add issue to project '{}': {}",
                binding.title, e
            )),
        }
    }
}
