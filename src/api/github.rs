use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::projects;
use super::{ApiError, ApiResult, CreatedIssue, IssueState, Label, NewIssue, NewLabel, Tracker};
use crate::errors::{Result, TissueError};
use crate::models::project::{FieldAssignment, ProjectField, ProjectSummary};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const PER_PAGE: usize = 100;

pub struct GitHubClient {
    client: Client,
    api_url: String,
    owner: String,
    repo: String,
    token: String,
    connected: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateIssuePayload<'a> {
    title: &'a str,
    body: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    assignees: Vec<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    labels: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
struct IssueListing {
    title: String,
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct User {
    login: String,
}

#[derive(Debug, Deserialize)]
struct Repository {
    full_name: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

impl GitHubClient {
    pub fn new(api_url: String, owner: String, repo: String, token: String) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            owner,
            repo,
            token,
            connected: None,
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Browser URL of the repository's issue list.
    pub fn issues_web_url(&self) -> String {
        format!("{}/{}/{}/issues", web_base(&self.api_url), self.owner, self.repo)
    }

    /// Validate the token and repository access. Must succeed before
    /// the client can drive a batch.
    pub async fn connect(&mut self) -> Result<String> {
        let response = self.request(Method::GET, "/user").send().await?;
        match response.status().as_u16() {
            200..=299 => {}
            401 | 403 => return Err(TissueError::GitHubAuthFailed),
            status => {
                let text = response.text().await.unwrap_or_default();
                return Err(ApiError::from_response(status, &text).into());
            }
        }
        let user: User = response.json().await?;

        let path = format!("/repos/{}/{}", self.owner, self.repo);
        let response = self.request(Method::GET, &path).send().await?;
        match response.status().as_u16() {
            200..=299 => {}
            404 => {
                return Err(TissueError::RepositoryNotFound(format!(
                    "{}/{}",
                    self.owner, self.repo
                )))
            }
            status => {
                let text = response.text().await.unwrap_or_default();
                return Err(ApiError::from_response(status, &text).into());
            }
        }
        let repo: Repository = response.json().await?;

        self.connected = Some(repo.full_name);
        Ok(user.login)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.api_url, path))
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "tissue-cli")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    fn repo_path(&self, suffix: &str) -> String {
        format!("/repos/{}/{}{}", self.owner, self.repo, suffix)
    }

    async fn check(response: Response) -> ApiResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        Err(ApiError::from_response(status.as_u16(), &text))
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> ApiResult<T> {
        let response = Self::check(request.send().await?).await?;
        Ok(response.json::<T>().await?)
    }

    async fn paginate<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> ApiResult<Vec<T>> {
        let mut items = Vec::new();
        let per_page = PER_PAGE.to_string();

        for page in 1.. {
            let page = page.to_string();
            let batch: Vec<T> = Self::send_json(
                self.request(Method::GET, path)
                    .query(query)
                    .query(&[("per_page", per_page.as_str()), ("page", page.as_str())]),
            )
            .await?;

            let done = batch.len() < PER_PAGE;
            items.extend(batch);
            if done {
                break;
            }
        }

        Ok(items)
    }

    pub(super) async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> ApiResult<T> {
        let (data, errors) = self.graphql_partial(query, variables).await?;

        if !errors.is_empty() {
            return Err(ApiError::new(None, errors.join("; ")));
        }

        data.ok_or_else(|| ApiError::new(None, "GraphQL response contained no data"))
    }

    /// Whatever `data` came back, alongside any error messages.
    pub(super) async fn graphql_partial<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> ApiResult<(Option<T>, Vec<String>)> {
        let body = serde_json::json!({ "query": query, "variables": variables });
        let response: GraphQlResponse<T> =
            Self::send_json(self.request(Method::POST, "/graphql").json(&body)).await?;

        let errors = response.errors.into_iter().map(|e| e.message).collect();
        Ok((response.data, errors))
    }

    pub(super) fn repo_name(&self) -> &str {
        &self.repo
    }
}

/// `https://api.github.com` -> `https://github.com`, and
/// `https://ghe.example.com/api/v3` -> `https://ghe.example.com`.
fn web_base(api_url: &str) -> String {
    if api_url == DEFAULT_API_URL {
        "https://github.com".to_string()
    } else {
        api_url.trim_end_matches("/api/v3").to_string()
    }
}

/// Host that git remotes use for this API, e.g. `github.com`.
pub fn web_host(api_url: &str) -> String {
    let base = web_base(api_url.trim_end_matches('/'));
    let without_scheme = base.split_once("://").map_or(base.as_str(), |(_, rest)| rest);
    without_scheme.split('/').next().unwrap_or_default().to_string()
}

#[async_trait]
impl Tracker for GitHubClient {
    fn repository(&self) -> Option<String> {
        self.connected.clone()
    }

    async fn list_issue_titles(&self, state: IssueState) -> ApiResult<Vec<String>> {
        let issues: Vec<IssueListing> = self
            .paginate(&self.repo_path("/issues"), &[("state", state.as_str())])
            .await?;

        Ok(issues
            .into_iter()
            .filter(|i| i.pull_request.is_none())
            .map(|i| i.title)
            .collect())
    }

    async fn list_labels(&self) -> ApiResult<Vec<Label>> {
        self.paginate(&self.repo_path("/labels"), &[]).await
    }

    async fn create_label(&self, label: &NewLabel) -> ApiResult<Label> {
        Self::send_json(self.request(Method::POST, &self.repo_path("/labels")).json(label)).await
    }

    async fn create_issue(&self, issue: &NewIssue) -> ApiResult<CreatedIssue> {
        let payload = CreateIssuePayload {
            title: &issue.title,
            body: &issue.body,
            assignees: issue.assignee.as_deref().into_iter().collect(),
            labels: issue.labels.iter().map(String::as_str).collect(),
        };

        Self::send_json(self.request(Method::POST, &self.repo_path("/issues")).json(&payload)).await
    }

    async fn check_collaborator(&self, username: &str) -> ApiResult<()> {
        let path = self.repo_path(&format!(
            "/collaborators/{}/permission",
            urlencoding::encode(username)
        ));
        Self::check(self.request(Method::GET, &path).send().await?).await?;
        Ok(())
    }

    async fn list_projects(&self) -> ApiResult<Vec<ProjectSummary>> {
        projects::list_projects(self).await
    }

    async fn project_fields(&self, project_id: &str) -> ApiResult<Vec<ProjectField>> {
        projects::project_fields(self, project_id).await
    }

    async fn add_project_item(
        &self,
        project_id: &str,
        content_id: &str,
        fields: &[FieldAssignment],
    ) -> ApiResult<Vec<String>> {
        projects::add_project_item(self, project_id, content_id, fields).await
    }
}
