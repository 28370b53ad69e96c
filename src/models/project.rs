use serde::{Deserialize, Serialize};

/// A Projects v2 board visible from the target repository.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProjectSummary {
    pub id: String,
    pub title: String,
    pub number: u64,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FieldOption {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    Number,
    Date,
    SingleSelect(Vec<FieldOption>),
    Iteration(Vec<FieldOption>),
    /// Built-in or unsupported field types (assignees, labels, ...), by GraphQL data type
    Unsupported(String),
}

impl FieldKind {
    pub fn describe(&self) -> &str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Date => "date",
            FieldKind::SingleSelect(_) => "single select",
            FieldKind::Iteration(_) => "iteration",
            FieldKind::Unsupported(data_type) => data_type,
        }
    }

    pub fn options(&self) -> &[FieldOption] {
        match self {
            FieldKind::SingleSelect(options) | FieldKind::Iteration(options) => options,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectField {
    pub id: String,
    pub name: String,
    pub kind: FieldKind,
}

pub const STATUS_FIELD: &str = "Status";
pub const PRIORITY_FIELD: &str = "Priority";

/// A resolved board plus the schema needed to validate field values.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectBinding {
    pub id: String,
    pub title: String,
    pub number: u64,
    pub url: String,
    pub default_status: Option<String>,
    pub fields: Vec<ProjectField>,
}

impl ProjectBinding {
    pub fn new(project: ProjectSummary, fields: Vec<ProjectField>) -> Self {
        let default_status = fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(STATUS_FIELD))
            .and_then(|f| {
                let options = f.kind.options();
                options
                    .iter()
                    .find(|o| o.name.eq_ignore_ascii_case("todo"))
                    .or_else(|| options.first())
            })
            .map(|o| o.name.clone());

        Self {
            id: project.id,
            title: project.title,
            number: project.number,
            url: project.url,
            default_status,
            fields,
        }
    }

    /// Field lookup by name, ignoring case.
    pub fn field(&self, name: &str) -> Option<&ProjectField> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    /// ISO 8601 date, `YYYY-MM-DD`
    Date(String),
    SingleSelect(String),
    Iteration(String),
}

/// A validated value ready to be written to a project item.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldAssignment {
    pub field_id: String,
    pub field_name: String,
    pub value: FieldValue,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_field(options: &[&str]) -> ProjectField {
        ProjectField {
            id: "F_status".into(),
            name: "Status".into(),
            kind: FieldKind::SingleSelect(
                options
                    .iter()
                    .enumerate()
                    .map(|(i, name)| FieldOption {
                        id: format!("opt{}", i),
                        name: name.to_string(),
                    })
                    .collect(),
            ),
        }
    }

    fn summary() -> ProjectSummary {
        ProjectSummary {
            id: "PVT_1".into(),
            title: "Roadmap".into(),
            number: 1,
            url: "https://github.com/orgs/acme/projects/1".into(),
        }
    }

    #[test]
    fn test_default_status_prefers_todo() {
        let binding = ProjectBinding::new(summary(), vec![status_field(&["Backlog", "Todo", "Done"])]);
        assert_eq!(binding.default_status.as_deref(), Some("Todo"));
    }

    #[test]
    fn test_default_status_falls_back_to_first_option() {
        let binding = ProjectBinding::new(summary(), vec![status_field(&["Backlog", "Done"])]);
        assert_eq!(binding.default_status.as_deref(), Some("Backlog"));
    }

    #[test]
    fn test_no_status_field() {
        let binding = ProjectBinding::new(summary(), vec![]);
        assert_eq!(binding.default_status, None);
    }

    #[test]
    fn test_field_lookup_ignores_case() {
        let binding = ProjectBinding::new(summary(), vec![status_field(&["Todo"])]);
        assert!(binding.field("status").is_some());
        assert!(binding.field("Estimate").is_none());
    }
}
