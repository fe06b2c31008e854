// GitHub wire formats (GraphQL v4 + REST v3)

use repogate_core::port::{ProviderRepository, ProviderWebhook, TreeEntry, TreeEntryKind};
use serde::{Deserialize, Serialize};

pub const LIST_REPOSITORIES_QUERY: &str = r#"
query AllRepositories($cursor: String) {
  viewer {
    repositories(first: 100, after: $cursor, orderBy: {field: UPDATED_AT, direction: DESC}) {
      nodes {
        databaseId
        name
        diskUsage
        owner { login }
      }
      pageInfo {
        hasNextPage
        endCursor
      }
    }
  }
}
"#;

pub const FIND_REPOSITORY_QUERY: &str = r#"
query Repository($owner: String!, $repo: String!) {
  repository(owner: $owner, name: $repo) {
    databaseId
    name
    diskUsage
    owner { login }
    isPrivate
    defaultBranchRef { name }
  }
}
"#;

// ============================================================================
// GraphQL
// ============================================================================

#[derive(Debug, Serialize)]
pub struct GraphQlRequest<'a, V> {
    pub query: &'a str,
    pub variables: V,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<D> {
    pub data: Option<D>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CursorVariables<'a> {
    pub cursor: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub struct RepositoryVariables<'a> {
    pub owner: &'a str,
    pub repo: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ViewerData {
    pub viewer: Viewer,
}

#[derive(Debug, Deserialize)]
pub struct Viewer {
    pub repositories: RepositoryConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryConnection {
    #[serde(default)]
    pub nodes: Vec<RepositoryNode>,
    pub page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryData {
    pub repository: Option<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryNode {
    pub database_id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub disk_usage: Option<i64>,
    pub owner: OwnerNode,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub default_branch_ref: Option<BranchRef>,
}

#[derive(Debug, Deserialize)]
pub struct OwnerNode {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub struct BranchRef {
    pub name: String,
}

impl From<RepositoryNode> for ProviderRepository {
    fn from(node: RepositoryNode) -> Self {
        ProviderRepository {
            database_id: node.database_id.unwrap_or_default(),
            name: node.name,
            owner_login: node.owner.login,
            disk_usage: node.disk_usage.unwrap_or_default(),
            is_private: node.is_private,
            default_branch: node.default_branch_ref.map(|b| b.name),
        }
    }
}

// ============================================================================
// REST
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TreeResponse {
    pub tree: Vec<TreeItem>,
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Debug, Deserialize)]
pub struct TreeItem {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl TreeItem {
    /// `None` for entry kinds this gateway does not model
    pub fn into_entry(self) -> Option<TreeEntry> {
        let kind = match self.kind.as_str() {
            "blob" => TreeEntryKind::Blob,
            "tree" => TreeEntryKind::Tree,
            "commit" => TreeEntryKind::Commit,
            _ => return None,
        };
        Some(TreeEntry {
            path: self.path,
            kind,
        })
    }
}

/// Single item of `GET /repos/{owner}/{repo}/contents/{path}`.
/// Directories come back as a JSON array instead.
#[derive(Debug, Deserialize)]
pub struct ContentItem {
    #[serde(rename = "type")]
    pub kind: String,
    pub path: String,
    pub content: Option<String>,
    pub encoding: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HookItem {
    pub id: i64,
    pub name: String,
    pub active: bool,
    #[serde(default)]
    pub config: HookConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct HookConfig {
    pub url: Option<String>,
}

impl From<HookItem> for ProviderWebhook {
    fn from(hook: HookItem) -> Self {
        ProviderWebhook {
            id: hook.id,
            name: hook.name,
            active: hook.active,
            url: hook.config.url,
        }
    }
}

/// Error body of REST responses
#[derive(Debug, Default, Deserialize)]
pub struct ApiMessage {
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewer_page_parses() {
        let body = r#"{
            "data": {
                "viewer": {
                    "repositories": {
                        "nodes": [
                            {"databaseId": 7, "name": "alpha", "diskUsage": 120, "owner": {"login": "octo"}}
                        ],
                        "pageInfo": {"hasNextPage": true, "endCursor": "Y3Vyc29yOjE="}
                    }
                }
            }
        }"#;
        let response: GraphQlResponse<ViewerData> = serde_json::from_str(body).unwrap();
        let connection = response.data.unwrap().viewer.repositories;

        assert!(response.errors.is_empty());
        assert!(connection.page_info.has_next_page);
        assert_eq!(connection.page_info.end_cursor.as_deref(), Some("Y3Vyc29yOjE="));

        let repo: ProviderRepository = connection.nodes.into_iter().next().unwrap().into();
        assert_eq!(repo.database_id, 7);
        assert_eq!(repo.owner_login, "octo");
        assert_eq!(repo.disk_usage, 120);
        assert_eq!(repo.default_branch, None);
    }

    #[test]
    fn test_missing_repository_parses_as_none_with_error() {
        let body = r#"{
            "data": {"repository": null},
            "errors": [{"type": "NOT_FOUND", "message": "Could not resolve to a Repository"}]
        }"#;
        let response: GraphQlResponse<RepositoryData> = serde_json::from_str(body).unwrap();

        assert!(response.data.unwrap().repository.is_none());
        assert_eq!(response.errors[0].kind.as_deref(), Some("NOT_FOUND"));
    }

    #[test]
    fn test_tree_items_map_to_entries() {
        let body = r#"{
            "sha": "abc",
            "tree": [
                {"path": "src", "type": "tree"},
                {"path": "src/lib.rs", "type": "blob"},
                {"path": "vendor/lib", "type": "commit"}
            ],
            "truncated": false
        }"#;
        let response: TreeResponse = serde_json::from_str(body).unwrap();
        let entries: Vec<_> = response
            .tree
            .into_iter()
            .filter_map(TreeItem::into_entry)
            .collect();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1], TreeEntry::blob("src/lib.rs"));
        assert_eq!(entries[2].kind, TreeEntryKind::Commit);
    }

    #[test]
    fn test_hook_without_url() {
        let body = r#"{"id": 3, "name": "web", "active": true, "config": {"content_type": "json"}}"#;
        let hook: ProviderWebhook = serde_json::from_str::<HookItem>(body).unwrap().into();

        assert_eq!(hook.id, 3);
        assert!(hook.active);
        assert_eq!(hook.url, None);
    }
}
