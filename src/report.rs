use colored::*;

use crate::models::outcome::{BatchSummary, IssueOutcome};
use crate::models::project::{FieldKind, ProjectBinding};

/// Collects the warnings raised while processing one record, printing each
/// as it happens.
#[derive(Debug, Default)]
pub struct RecordLog {
    warnings: Vec<String>,
}

impl RecordLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        println!("{}", format!("    ⚠ {}", message).yellow());
        self.warnings.push(message);
    }

    pub fn note(&self, message: &str) {
        println!("{}", format!("    {}", message).dimmed());
    }

    pub fn into_warnings(self) -> Vec<String> {
        self.warnings
    }
}

pub fn progress(index: usize, total: usize, title: &str) {
    println!(
        "{} {}",
        format!("Processing issue {}/{}:", index, total).cyan(),
        title.bright_white()
    );
}

pub fn outcome_line(outcome: &IssueOutcome) {
    match outcome {
        IssueOutcome::Created { url } => {
            println!("{}", format!("  ✓ Created: {}", url).green())
        }
        IssueOutcome::Skipped { reason } => {
            println!("{}", format!("  ⊝ Skipped: {}", reason).yellow())
        }
        IssueOutcome::Failed { error } => {
            println!("{}", format!("  ✗ Failed: {}", error).red())
        }
    }
}

pub fn print_project(binding: &ProjectBinding) {
    println!(
        "  {} {} {}",
        "Project:".bold(),
        binding.title.bright_white(),
        format!("(#{})", binding.number).dimmed()
    );
    if !binding.url.is_empty() {
        println!("  {} {}", "URL:".bold(), binding.url.bright_cyan());
    }
    if let Some(status) = &binding.default_status {
        println!("  {} {}", "Default status:".bold(), status.bright_white());
    }

    println!("  {}", "Fields:".bold());
    for field in &binding.fields {
        match &field.kind {
            FieldKind::SingleSelect(options) | FieldKind::Iteration(options) => {
                let names: Vec<&str> = options.iter().map(|o| o.name.as_str()).collect();
                println!(
                    "    {} {} {}",
                    field.name.bright_white(),
                    format!("({})", field.kind.describe()).dimmed(),
                    names.join(", ").dimmed()
                );
            }
            kind => {
                println!(
                    "    {} {}",
                    field.name.bright_white(),
                    format!("({})", kind.describe()).dimmed()
                );
            }
        }
    }
}

const RULE_WIDTH: usize = 60;

/// Human-readable summary of a finished batch.
pub fn format_summary(summary: &BatchSummary) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = Vec::new();

    out.push(String::new());
    out.push(rule.clone());
    out.push("BATCH ISSUE CREATION SUMMARY".bold().to_string());
    out.push(rule.clone());
    out.push(format!("Total issues processed: {}", summary.total));
    out.push(format!("Successfully created:   {}", summary.created));
    out.push(format!("Skipped (duplicates):   {}", summary.skipped));
    out.push(format!("Failed:                 {}", summary.failed));
    if let Some(project) = &summary.project {
        out.push(format!("Project:                {}", project));
    }
    out.push(rule);

    if summary.failed > 0 {
        out.push(String::new());
        out.push("FAILED ISSUES:".red().bold().to_string());
        for (title, error) in summary.failures() {
            out.push(format!("  • {}: {}", title, error));
        }
    }

    if summary.skipped > 0 {
        out.push(String::new());
        out.push("SKIPPED ISSUES:".yellow().bold().to_string());
        for (title, reason) in summary.skips() {
            out.push(format!("  • {}: {}", title, reason));
        }
    }

    let warned: Vec<_> = summary
        .results
        .iter()
        .filter(|r| !r.warnings.is_empty())
        .collect();
    if !warned.is_empty() || !summary.notices.is_empty() {
        out.push(String::new());
        out.push("WARNINGS:".yellow().bold().to_string());
        for notice in &summary.notices {
            out.push(format!("  • {}", notice));
        }
        for result in warned {
            for warning in &result.warnings {
                out.push(format!("  • {}: {}", result.title, warning));
            }
        }
    }

    if summary.created > 0 {
        out.push(String::new());
        out.push(
            format!("✓ Successfully created {} issues!", summary.created)
                .green()
                .bold()
                .to_string(),
        );
    }

    out.join("\n")
}

pub fn print_summary(summary: &BatchSummary) {
    println!("{}", format_summary(summary));
    println!();
}
