use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::snapshot::RemoteSnapshot;
use crate::api::{NewLabel, Tracker};
use crate::models::project::{
    FieldAssignment, FieldKind, FieldValue, ProjectBinding, ProjectField, PRIORITY_FIELD,
    STATUS_FIELD,
};
use crate::report::RecordLog;

/// Turns a record's assignee, labels and project fields into values the
/// remote will accept, degrading field by field instead of failing.
pub struct FieldReconciler<'a> {
    tracker: &'a dyn Tracker,
    label_color: String,
    label_description: String,
}

impl<'a> FieldReconciler<'a> {
    pub fn new(tracker: &'a dyn Tracker, label_color: String, label_description: String) -> Self {
        Self {
            tracker,
            label_color,
            label_description,
        }
    }

    /// `None` when there is no assignee or it can't be validated.
    pub async fn resolve_assignee(&self, assignee: Option<&str>, log: &mut RecordLog) -> Option<String> {
        let assignee = assignee?;

        match self.tracker.check_collaborator(assignee).await {
            Ok(()) => Some(assignee.to_string()),
            Err(e) if e.is_not_found() => {
                log.warn(format!(
                    "Assignee '{}' not found or no repo access. Creating issue without assignee.",
                    assignee
                ));
                None
            }
            Err(e) => {
                log.warn(format!(
                    "Could not validate assignee '{}': {}. Creating issue without assignee.",
                    assignee, e.message
                ));
                None
            }
        }
    }

    /// Map each requested label onto an existing one (ignoring case) or
    /// create it. Labels that can't be created are dropped individually.
    pub async fn reconcile_labels(
        &self,
        labels: &[String],
        snapshot: &mut RemoteSnapshot,
        log: &mut RecordLog,
    ) -> Vec<String> {
        let mut resolved: Vec<String> = Vec::with_capacity(labels.len());

        for label in labels {
            if let Some(existing) = snapshot.canonical_label(label) {
                if !resolved.iter().any(|r| r == existing) {
                    resolved.push(existing.to_string());
                }
                continue;
            }

            let new_label = NewLabel {
                name: label.clone(),
                color: self.label_color.clone(),
                description: self.label_description.clone(),
            };

            match self.tracker.create_label(&new_label).await {
                Ok(created) => {
                    log.note(&format!("Created new label: '{}'", created.name));
                    snapshot.remember_label(&created.name);
                    resolved.push(created.name);
                }
                Err(e) => {
                    log.warn(format!("Could not create label '{}': {}", label, e.message));
                }
            }
        }

        resolved
    }
}

/// Check a record's status and custom fields against a board's schema.
///
/// `priority`, when given, is merged in first under the `Priority` field and
/// may be overridden by an explicit custom field of the same name. Returns the
/// assignments that passed and a warning for everything that didn't.
pub fn validate_project_fields(
    binding: &ProjectBinding,
    status: Option<&str>,
    priority: Option<&str>,
    custom_fields: &BTreeMap<String, String>,
) -> (Vec<FieldAssignment>, Vec<String>) {
    let mut valid = Vec::new();
    let mut warnings = Vec::new();

    if let Some(status) = status {
        match binding.field(STATUS_FIELD) {
            Some(field) => match convert_value(field, status) {
                Ok(value) => valid.push(assignment(field, value)),
                Err(reason) => warnings.push(reason),
            },
            None => warnings.push(format!(
                "Project '{}' has no '{}' field; status '{}' ignored",
                binding.title, STATUS_FIELD, status
            )),
        }
    }

    let mut fields: Vec<(String, String)> = Vec::new();
    if let Some(priority) = priority {
        fields.push((PRIORITY_FIELD.to_string(), priority.to_string()));
    }
    for (name, value) in custom_fields {
        fields.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        fields.push((name.clone(), value.clone()));
    }

    for (name, value) in fields {
        let Some(field) = binding.field(&name) else {
            warnings.push(format!(
                "Unknown field '{}'. Available fields: {}",
                name,
                binding.field_names().join(", ")
            ));
            continue;
        };

        if field.name.eq_ignore_ascii_case(STATUS_FIELD) {
            warnings.push(format!(
                "Field '{}' must be set through the status column",
                field.name
            ));
            continue;
        }

        match convert_value(field, &value) {
            Ok(value) => valid.push(assignment(field, value)),
            Err(reason) => warnings.push(reason),
        }
    }

    (valid, warnings)
}

fn assignment(field: &ProjectField, value: FieldValue) -> FieldAssignment {
    FieldAssignment {
        field_id: field.id.clone(),
        field_name: field.name.clone(),
        value,
    }
}

fn convert_value(field: &ProjectField, raw: &str) -> Result<FieldValue, String> {
    let raw = raw.trim();

    match &field.kind {
        FieldKind::Text => Ok(FieldValue::Text(raw.to_string())),
        FieldKind::Number => raw
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(FieldValue::Number)
            .ok_or_else(|| format!("Invalid number '{}' for field '{}'", raw, field.name)),
        FieldKind::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(|d| FieldValue::Date(d.format("%Y-%m-%d").to_string()))
            .map_err(|_| {
                format!(
                    "Invalid date '{}' for field '{}' (expected YYYY-MM-DD)",
                    raw, field.name
                )
            }),
        FieldKind::SingleSelect(options) | FieldKind::Iteration(options) => options
            .iter()
            .find(|o| o.name.eq_ignore_ascii_case(raw))
            .map(|o| match field.kind {
                FieldKind::Iteration(_) => FieldValue::Iteration(o.id.clone()),
                _ => FieldValue::SingleSelect(o.id.clone()),
            })
            .ok_or_else(|| {
                let names: Vec<&str> = options.iter().map(|o| o.name.as_str()).collect();
                format!(
                    "Invalid value '{}' for field '{}'. Valid options: {}",
                    raw,
                    field.name,
                    names.join(", ")
                )
            }),
        FieldKind::Unsupported(data_type) => Err(format!(
            "Field '{}' has type '{}', which can't be set from input",
            field.name, data_type
        )),
    }
}
