pub mod git;
pub mod github;
mod projects;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::project::{FieldAssignment, ProjectField, ProjectSummary};

/// Error returned by any remote tracker operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    /// HTTP status, when the failure came with one
    pub status: Option<u16>,
    pub message: String,
}

impl ApiError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Build an error from a failed response, preferring GitHub's structured
    /// `{"message": ..., "errors": [...]}` payload over the raw body.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = structured_message(body).unwrap_or_else(|| {
            let raw = body.trim();
            if raw.is_empty() {
                format!("HTTP {}", status)
            } else {
                raw.to_string()
            }
        });
        Self::new(Some(status), message)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} ({})", self.message, status),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::new(err.status().map(|s| s.as_u16()), err.to_string())
    }
}

#[derive(Deserialize)]
struct ErrorPayload {
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: Option<String>,
    field: Option<String>,
    code: Option<String>,
}

fn structured_message(body: &str) -> Option<String> {
    let payload: ErrorPayload = serde_json::from_str(body).ok()?;
    let mut message = payload.message?;

    let details: Vec<String> = payload
        .errors
        .iter()
        .filter_map(|e| match (&e.message, &e.field, &e.code) {
            (Some(msg), _, _) => Some(msg.clone()),
            (None, Some(field), Some(code)) => Some(format!("{}: {}", field, code)),
            (None, None, Some(code)) => Some(code.clone()),
            _ => None,
        })
        .collect();

    if !details.is_empty() {
        message = format!("{} ({})", message, details.join(", "));
    }

    Some(message)
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Issue state filter used when listing existing issues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    #[default]
    Open,
    Closed,
    All,
}

impl IssueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueState::Open => "open",
            IssueState::Closed => "closed",
            IssueState::All => "all",
        }
    }
}

impl std::str::FromStr for IssueState {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(IssueState::Open),
            "closed" => Ok(IssueState::Closed),
            "all" => Ok(IssueState::All),
            other => Err(format!("Unknown issue state '{}' (expected open, closed or all)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Label {
    pub name: String,
    #[serde(default)]
    #[allow(dead_code)]
    pub color: String,
    #[serde(default)]
    #[allow(dead_code)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewLabel {
    pub name: String,
    /// Hex color without the leading `#`
    pub color: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
    pub assignee: Option<String>,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreatedIssue {
    #[allow(dead_code)]
    pub number: u64,
    pub html_url: String,
    /// GraphQL node id, needed to add the issue to a project
    pub node_id: String,
}

/// The remote operations the batch engine needs, and nothing more.
#[async_trait]
pub trait Tracker: Send + Sync {
    /// Full `owner/repo` name once connected.
    fn repository(&self) -> Option<String>;

    async fn list_issue_titles(&self, state: IssueState) -> ApiResult<Vec<String>>;

    async fn list_labels(&self) -> ApiResult<Vec<Label>>;

    async fn create_label(&self, label: &NewLabel) -> ApiResult<Label>;

    async fn create_issue(&self, issue: &NewIssue) -> ApiResult<CreatedIssue>;

    /// Succeeds when `username` has access to the repository.
    async fn check_collaborator(&self, username: &str) -> ApiResult<()>;

    async fn list_projects(&self) -> ApiResult<Vec<ProjectSummary>>;

    async fn project_fields(&self, project_id: &str) -> ApiResult<Vec<ProjectField>>;

    /// Add an issue (by node id) to a project and set the given field values.
    /// Fails only when the item can't be added; each field value that is
    /// rejected comes back as a warning.
    async fn add_project_item(
        &self,
        project_id: &str,
        content_id: &str,
        fields: &[FieldAssignment],
    ) -> ApiResult<Vec<String>>;
}
