//! Projects v2 support, which GitHub only exposes through GraphQL.

use serde::Deserialize;
use serde_json::json;

use super::github::GitHubClient;
use super::{ApiError, ApiResult};
use crate::models::project::{
    FieldAssignment, FieldKind, FieldOption, FieldValue, ProjectField, ProjectSummary,
};

const LIST_PROJECTS: &str = r#"
query($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) {
    projectsV2(first: 100) { nodes { id title number url } }
    owner {
      ... on ProjectV2Owner {
        projectsV2(first: 100) { nodes { id title number url } }
      }
    }
  }
}"#;

const PROJECT_FIELDS: &str = r#"
query($id: ID!) {
  node(id: $id) {
    ... on ProjectV2 {
      fields(first: 100) {
        nodes {
          ... on ProjectV2FieldCommon { id name dataType }
          ... on ProjectV2SingleSelectField { options { id name } }
          ... on ProjectV2IterationField {
            configuration { iterations { id title } }
          }
        }
      }
    }
  }
}"#;

const ADD_ITEM: &str = r#"
mutation($project: ID!, $content: ID!) {
  addProjectV2ItemById(input: { projectId: $project, contentId: $content }) {
    item { id }
  }
}"#;

const UPDATE_FIELD: &str = r#"
mutation($project: ID!, $item: ID!, $field: ID!, $value: ProjectV2FieldValue!) {
  updateProjectV2ItemFieldValue(
    input: { projectId: $project, itemId: $item, fieldId: $field, value: $value }
  ) {
    projectV2Item { id }
  }
}"#;

#[derive(Deserialize)]
struct ProjectsData {
    repository: Option<RepositoryProjects>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryProjects {
    #[serde(default)]
    projects_v2: Option<Connection<ProjectSummary>>,
    #[serde(default)]
    owner: Option<OwnerProjects>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OwnerProjects {
    #[serde(default)]
    projects_v2: Option<Connection<ProjectSummary>>,
}

#[derive(Deserialize)]
struct Connection<T> {
    #[serde(default = "Vec::new")]
    nodes: Vec<Option<T>>,
}

#[derive(Deserialize)]
struct FieldsData {
    node: Option<FieldsNode>,
}

#[derive(Deserialize)]
struct FieldsNode {
    fields: Option<Connection<RawField>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawField {
    id: Option<String>,
    name: Option<String>,
    data_type: Option<String>,
    #[serde(default)]
    options: Vec<FieldOption>,
    configuration: Option<IterationConfiguration>,
}

#[derive(Deserialize)]
struct IterationConfiguration {
    #[serde(default)]
    iterations: Vec<Iteration>,
}

#[derive(Deserialize)]
struct Iteration {
    id: String,
    title: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddItemData {
    add_project_v2_item_by_id: AddItemPayload,
}

#[derive(Deserialize)]
struct AddItemPayload {
    item: ItemId,
}

#[derive(Deserialize)]
struct ItemId {
    id: String,
}

/// Boards linked to the repository, followed by the owner's boards. A token
/// that can't read the owner's boards still gets the repository's.
pub(super) async fn list_projects(client: &GitHubClient) -> ApiResult<Vec<ProjectSummary>> {
    let (data, errors) = client
        .graphql_partial::<ProjectsData>(
            LIST_PROJECTS,
            json!({ "owner": client.owner(), "name": client.repo_name() }),
        )
        .await?;

    let (repo_boards, owner_boards) = match data.and_then(|d| d.repository) {
        Some(repository) => (
            repository.projects_v2,
            repository.owner.and_then(|o| o.projects_v2),
        ),
        None => (None, None),
    };

    let Some(repo_boards) = repo_boards else {
        if errors.is_empty() {
            return Ok(Vec::new());
        }
        return Err(ApiError::new(None, errors.join("; ")));
    };

    let mut projects: Vec<ProjectSummary> = Vec::new();
    let owner_nodes = owner_boards.map(|c| c.nodes).unwrap_or_default();

    for project in repo_boards.nodes.into_iter().chain(owner_nodes).flatten() {
        if !projects.iter().any(|p| p.id == project.id) {
            projects.push(project);
        }
    }

    Ok(projects)
}

pub(super) async fn project_fields(
    client: &GitHubClient,
    project_id: &str,
) -> ApiResult<Vec<ProjectField>> {
    let data: FieldsData = client
        .graphql(PROJECT_FIELDS, json!({ "id": project_id }))
        .await?;

    let raw = data
        .node
        .and_then(|n| n.fields)
        .map(|c| c.nodes)
        .unwrap_or_default();

    Ok(raw.into_iter().flatten().filter_map(convert_field).collect())
}

fn convert_field(raw: RawField) -> Option<ProjectField> {
    let kind = match raw.data_type.as_deref()? {
        "TEXT" => FieldKind::Text,
        "NUMBER" => FieldKind::Number,
        "DATE" => FieldKind::Date,
        "SINGLE_SELECT" => FieldKind::SingleSelect(raw.options),
        "ITERATION" => FieldKind::Iteration(
            raw.configuration
                .map(|c| c.iterations)
                .unwrap_or_default()
                .into_iter()
                .map(|i| FieldOption {
                    id: i.id,
                    name: i.title,
                })
                .collect(),
        ),
        other => FieldKind::Unsupported(other.to_lowercase()),
    };

    Some(ProjectField {
        id: raw.id?,
        name: raw.name?,
        kind,
    })
}

fn value_json(value: &FieldValue) -> serde_json::Value {
    match value {
        FieldValue::Text(text) => json!({ "text": text }),
        FieldValue::Number(number) => json!({ "number": number }),
        FieldValue::Date(date) => json!({ "date": date }),
        FieldValue::SingleSelect(option_id) => json!({ "singleSelectOptionId": option_id }),
        FieldValue::Iteration(iteration_id) => json!({ "iterationId": iteration_id }),
    }
}

pub(super) async fn add_project_item(
    client: &GitHubClient,
    project_id: &str,
    content_id: &str,
    fields: &[FieldAssignment],
) -> ApiResult<Vec<String>> {
    let added: AddItemData = client
        .graphql(ADD_ITEM, json!({ "project": project_id, "content": content_id }))
        .await?;
    let item_id = added.add_project_v2_item_by_id.item.id;

    let mut rejected = Vec::new();
    for field in fields {
        let result: ApiResult<serde_json::Value> = client
            .graphql(
                UPDATE_FIELD,
                json!({
                    "project": project_id,
                    "item": item_id,
                    "field": field.field_id,
                    "value": value_json(&field.value),
                }),
            )
            .await;

        if let Err(e) = result {
            rejected.push(format!("Could not set field '{}': {}", field.field_name, e));
        }
    }

    Ok(rejected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Tracker;
    use mockito::Matcher;

    fn client_for(server: &mockito::ServerGuard) -> GitHubClient {
        GitHubClient::new(
            server.url(),
            "acme".to_string(),
            "widgets".to_string(),
            "test-token".to_string(),
        )
    }

    #[test]
    fn test_convert_single_select_field() {
        let raw: RawField = serde_json::from_value(json!({
            "id": "F1",
            "name": "Status",
            "dataType": "SINGLE_SELECT",
            "options": [{"id": "o1", "name": "Todo"}, {"id": "o2", "name": "Done"}]
        }))
        .unwrap();

        let field = convert_field(raw).unwrap();
        assert_eq!(field.name, "Status");
        assert_eq!(field.kind.options().len(), 2);
    }

    #[test]
    fn test_convert_iteration_and_unsupported_fields() {
        let iteration: RawField = serde_json::from_value(json!({
            "id": "F2",
            "name": "Sprint",
            "dataType": "ITERATION",
            "configuration": {"iterations": [{"id": "it1", "title": "Sprint 1"}]}
        }))
        .unwrap();
        let field = convert_field(iteration).unwrap();
        assert_eq!(field.kind.options()[0].name, "Sprint 1");

        let assignees: RawField = serde_json::from_value(json!({
            "id": "F3",
            "name": "Assignees",
            "dataType": "ASSIGNEES"
        }))
        .unwrap();
        let field = convert_field(assignees).unwrap();
        assert_eq!(field.kind, FieldKind::Unsupported("assignees".into()));
    }

    #[test]
    fn test_empty_node_is_skipped() {
        let raw: RawField = serde_json::from_value(json!({})).unwrap();
        assert!(convert_field(raw).is_none());
    }

    #[test]
    fn test_value_json_shapes() {
        assert_eq!(
            value_json(&FieldValue::SingleSelect("o1".into())),
            json!({ "singleSelectOptionId": "o1" })
        );
        assert_eq!(value_json(&FieldValue::Number(3.0)), json!({ "number": 3.0 }));
    }

    #[tokio::test]
    async fn test_list_projects_merges_repository_and_owner_boards() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/graphql")
            .match_body(Matcher::PartialJson(json!({
                "variables": {"owner": "acme", "name": "widgets"}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "data": {
                        "repository": {
                            "projectsV2": {"nodes": [
                                {"id": "P1", "title": "Roadmap", "number": 1, "url": "u1"}
                            ]},
                            "owner": {"projectsV2": {"nodes": [
                                {"id": "P1", "title": "Roadmap", "number": 1, "url": "u1"},
                                {"id": "P2", "title": "Bugs", "number": 2, "url": "u2"}
                            ]}}
                        }
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let projects = client.list_projects().await.unwrap();
        let titles: Vec<&str> = projects.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Roadmap", "Bugs"]);
    }

    #[tokio::test]
    async fn test_add_project_item_sets_each_field() {
        let mut server = mockito::Server::new_async().await;
        let add = server
            .mock("POST", "/graphql")
            .match_body(Matcher::Regex("addProjectV2ItemById".into()))
            .with_status(200)
            .with_body(r#"{"data":{"addProjectV2ItemById":{"item":{"id":"ITEM_1"}}}}"#)
            .expect(1)
            .create_async()
            .await;
        let update = server
            .mock("POST", "/graphql")
            .match_body(Matcher::Regex("updateProjectV2ItemFieldValue".into()))
            .with_status(200)
            .with_body(r#"{"data":{"updateProjectV2ItemFieldValue":{"projectV2Item":{"id":"ITEM_1"}}}}"#)
            .expect(2)
            .create_async()
            .await;

        let client = client_for(&server);
        let fields = vec![
            FieldAssignment {
                field_id: "F_status".into(),
                field_name: "Status".into(),
                value: FieldValue::SingleSelect("o1".into()),
            },
            FieldAssignment {
                field_id: "F_estimate".into(),
                field_name: "Estimate".into(),
                value: FieldValue::Number(5.0),
            },
        ];

        let rejected = client
            .add_project_item("PVT_1", "I_kw1", &fields)
            .await
            .unwrap();

        assert!(rejected.is_empty());
        add.assert_async().await;
        update.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_field_does_not_stop_later_fields() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/graphql")
            .match_body(Matcher::Regex("addProjectV2ItemById".into()))
            .with_status(200)
            .with_body(r#"{"data":{"addProjectV2ItemById":{"item":{"id":"ITEM_1"}}}}"#)
            .create_async()
            .await;
        let bad = server
            .mock("POST", "/graphql")
            .match_body(Matcher::PartialJson(json!({ "variables": { "field": "F_bad" } })))
            .with_status(200)
            .with_body(r#"{"data":null,"errors":[{"message":"bad value"}]}"#)
            .expect(1)
            .create_async()
            .await;
        let good = server
            .mock("POST", "/graphql")
            .match_body(Matcher::PartialJson(json!({ "variables": { "field": "F_good" } })))
            .with_status(200)
            .with_body(r#"{"data":{"updateProjectV2ItemFieldValue":{"projectV2Item":{"id":"ITEM_1"}}}}"#)
            .expect(1)
            .create_async()
            .await;

        let client = client_for(&server);
        let fields = vec![
            FieldAssignment {
                field_id: "F_bad".into(),
                field_name: "Bad".into(),
                value: FieldValue::Text("nope".into()),
            },
            FieldAssignment {
                field_id: "F_good".into(),
                field_name: "Good".into(),
                value: FieldValue::Text("fine".into()),
            },
        ];

        let rejected = client
            .add_project_item("PVT_1", "I_kw1", &fields)
            .await
            .unwrap();

        assert_eq!(rejected, vec!["Could not set field 'Bad': bad value"]);
        bad.assert_async().await;
        good.assert_async().await;
    }

    #[tokio::test]
    async fn test_unreadable_owner_boards_keep_repository_boards() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "data": {
                        "repository": {
                            "projectsV2": {"nodes": [
                                {"id": "P1", "title": "Roadmap", "number": 1, "url": "u1"}
                            ]},
                            "owner": {"projectsV2": null}
                        }
                    },
                    "errors": [{"message": "Resource not accessible by integration"}]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let projects = client.list_projects().await.unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].title, "Roadmap");
    }

    #[tokio::test]
    async fn test_list_projects_errors_without_repository_data() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":{"repository":null},"errors":[{"message":"Could not resolve to a Repository"}]}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client.list_projects().await.unwrap_err();
        assert!(err.message.contains("Could not resolve to a Repository"));
    }
}
