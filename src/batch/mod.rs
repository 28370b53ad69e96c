//! Batch issue creation: reconcile records against the remote once, then
//! create them one at a time, isolating failures per record.

pub mod creator;
pub mod project;
pub mod reconcile;
pub mod snapshot;


use colored::*;
use std::time::Duration;

use crate::api::{IssueState, Tracker};
use crate::errors::{Result, TissueError};
use crate::models::outcome::{BatchSummary, RecordResult};
use crate::models::project::ProjectBinding;
use crate::models::record::IssueRecord;
use crate::report::{self, RecordLog};
use creator::IssueCreator;
use project::{ProjectBinder, ProjectResolution};
use reconcile::FieldReconciler;
use snapshot::RemoteSnapshot;

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub verbose: bool,
    /// Delay after each record, for API rate limits
    pub pacing: Duration,
    pub dedup_state: IssueState,
    pub label_color: String,
    pub label_description: String,
}

pub struct BatchOrchestrator<'a> {
    tracker: &'a dyn Tracker,
    options: BatchOptions,
}

impl<'a> BatchOrchestrator<'a> {
    pub fn new(tracker: &'a dyn Tracker, options: BatchOptions) -> Self {
        Self { tracker, options }
    }

    /// Process every record in order. Only a missing connection is fatal;
    /// everything else ends up in the summary.
    pub async fn run(&self, records: &[IssueRecord], project_name: Option<&str>) -> Result<BatchSummary> {
        let Some(repository) = self.tracker.repository() else {
            return Err(TissueError::NotConnected);
        };

        println!(
            "{}",
            format!("Starting batch creation of {} issues in {}...", records.len(), repository)
                .cyan()
                .bold()
        );
        println!();

        let mut summary = BatchSummary::default();

        let binding = match project_name {
            Some(name) => self.bind_project(name, &mut summary.notices).await,
            None => None,
        };
        summary.project = binding.as_ref().map(|b| b.title.clone());

        let (mut snapshot, notices) = RemoteSnapshot::build(self.tracker, self.options.dedup_state).await;
        summary.notices.extend(notices);
        println!();

        let creator = IssueCreator::new(
            self.tracker,
            FieldReconciler::new(
                self.tracker,
                self.options.label_color.clone(),
                self.options.label_description.clone(),
            ),
        );

        for (index, record) in records.iter().enumerate() {
            report::progress(index + 1, records.len(), &record.title);

            let mut log = RecordLog::new();
            let outcome = creator
                .create(record, &mut snapshot, binding.as_ref(), &mut log)
                .await;
            report::outcome_line(&outcome);

            summary.push(RecordResult {
                title: record.title.clone(),
                outcome,
                warnings: log.into_warnings(),
            });

            if !self.options.pacing.is_zero() {
                tokio::time::sleep(self.options.pacing).await;
            }
        }

        Ok(summary)
    }

    /// Resolve the board once. Not finding it, or failing to look it up,
    /// means the batch runs without project integration.
    async fn bind_project(&self, name: &str, notices: &mut Vec<String>) -> Option<ProjectBinding> {
        println!(
            "{}",
            format!("Setting up project integration with '{}'...", name).cyan()
        );

        match ProjectBinder::new(self.tracker).resolve(name).await {
            Ok(ProjectResolution::Found(binding)) => {
                println!("{}", format!("  ✓ Found project: {}", binding.title).green());
                if self.options.verbose {
                    report::print_project(&binding);
                }
                Some(binding)
            }
            Ok(ProjectResolution::NotFound { available }) => {
                let mut notice = format!(
                    "Project '{}' not found. Issues will be created without project integration.",
                    name
                );
                if !available.is_empty() {
                    notice.push_str(&format!(" Available projects: {}", available.join(", ")));
                }
                println!("{}", format!("  ⚠ {}", notice).yellow());
                notices.push(notice);
                None
            }
            Err(e) => {
                let notice = format!("Could not set up project integration: {}", e);
                println!("{}", format!("  ⚠ {}", notice).yellow());
                notices.push(notice);
                None
            }
        }
    }
}
