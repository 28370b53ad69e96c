use colored::*;
use std::collections::{HashMap, HashSet};

use crate::api::{IssueState, Tracker};

/// Existing issue titles and labels, fetched once per batch.
///
/// Titles are read-only for the life of the batch: issues created during
/// the run are not added back. Labels are append-only, so a label created
/// for one record is reused by the next.
#[derive(Debug, Default, Clone)]
pub struct RemoteSnapshot {
    titles: HashSet<String>,
    labels: HashMap<String, String>,
}

impl RemoteSnapshot {
    /// Fails soft: a listing that errors leaves that half of the cache empty
    /// and is reported as a notice.
    pub async fn build(tracker: &dyn Tracker, state: IssueState) -> (Self, Vec<String>) {
        let mut snapshot = Self::default();
        let mut notices = Vec::new();

        println!("{}", "Caching existing issues...".dimmed());
        match tracker.list_issue_titles(state).await {
            Ok(titles) => {
                snapshot.titles = titles.iter().map(|t| t.to_lowercase()).collect();
                println!(
                    "{}",
                    format!("  Found {} existing {} issues", snapshot.title_count(), state.as_str()).dimmed()
                );
            }
            Err(e) => {
                let notice = format!("Could not cache existing issues: {}", e);
                println!("{}", format!("  ⚠ {}", notice).yellow());
                notices.push(notice);
            }
        }

        println!("{}", "Caching existing labels...".dimmed());
        match tracker.list_labels().await {
            Ok(labels) => {
                snapshot.labels = labels
                    .into_iter()
                    .map(|l| (l.name.to_lowercase(), l.name))
                    .collect();
                println!(
                    "{}",
                    format!("  Found {} existing labels", snapshot.label_count()).dimmed()
                );
            }
            Err(e) => {
                let notice = format!("Could not cache existing labels: {}", e);
                println!("{}", format!("  ⚠ {}", notice).yellow());
                notices.push(notice);
            }
        }

        (snapshot, notices)
    }

    pub fn contains_title(&self, title: &str) -> bool {
        self.titles.contains(&title.to_lowercase())
    }

    /// Canonical spelling of an existing label, matched ignoring case.
    pub fn canonical_label(&self, name: &str) -> Option<&str> {
        self.labels.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn remember_label(&mut self, name: &str) {
        self.labels.insert(name.to_lowercase(), name.to_string());
    }

    pub fn title_count(&self) -> usize {
        self.titles.len()
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }
}

#[cfg(test)]
impl RemoteSnapshot {
    pub fn with(titles: &[&str], labels: &[&str]) -> Self {
        Self {
            titles: titles.iter().map(|t| t.to_lowercase()).collect(),
            labels: labels
                .iter()
                .map(|l| (l.to_lowercase(), l.to_string()))
                .collect(),
        }
    }
}
