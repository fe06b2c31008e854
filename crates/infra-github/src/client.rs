// GitHub RepositoryProvider Implementation

use crate::config::GitHubConfig;
use crate::rate_limit::{classify, graphql_rate_limit, RateLimitSignals};
use crate::wire::{
    ApiMessage, ContentItem, CursorVariables, GraphQlRequest, GraphQlResponse, HookItem,
    RepositoryData, RepositoryVariables, TreeItem, TreeResponse, ViewerData,
    FIND_REPOSITORY_QUERY, LIST_REPOSITORIES_QUERY,
};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use repogate_core::port::{
    ProviderError, ProviderRepository, ProviderWebhook, RepositoryProvider, TreeEntry,
};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

const PER_PAGE: usize = 100;
const API_VERSION: &str = "2022-11-28";

/// Longest primary rate limit wait that is still retried
const MAX_RETRY_WAIT: Duration = Duration::from_secs(60);

/// Retries after 5xx responses and connection failures
const MAX_TRANSIENT_RETRIES: u32 = 3;
const TRANSIENT_BACKOFF: Duration = Duration::from_millis(250);

// Helper to convert reqwest::Error to ProviderError
fn map_reqwest_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Http(format!("request timed out: {}", err))
    } else if err.is_decode() {
        ProviderError::Decode(err.to_string())
    } else {
        ProviderError::Http(err.to_string())
    }
}

pub struct GitHubClient {
    http: reqwest::Client,
    config: GitHubConfig,
}

impl GitHubClient {
    pub fn new(config: GitHubConfig) -> Result<Self, ProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));
        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ProviderError::Http(format!("invalid token: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(map_reqwest_error)?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GitHubConfig {
        &self.config
    }

    /// `{api_url}/{segments...}` with each segment percent-encoded
    fn rest_url<'a>(
        &self,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&self.config.api_url)
            .map_err(|e| ProviderError::Http(format!("invalid API URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ProviderError::Http("API URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ProviderError> {
        debug!(url = %url, "GitHub REST request");
        let response = self.http.get(url).send().await.map_err(map_reqwest_error)?;
        let response = check(response).await?;
        response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))
    }

    async fn graphql<V, D>(&self, operation: &str, query: &str, variables: V) -> Result<D, ProviderError>
    where
        V: Serialize + Send + Sync,
        D: DeserializeOwned,
    {
        let url = self.config.graphql_url();
        let body = GraphQlRequest { query, variables };
        with_retry(operation, || self.graphql_once(&url, &body)).await
    }

    async fn graphql_once<V, D>(
        &self,
        url: &str,
        body: &GraphQlRequest<'_, V>,
    ) -> Result<D, ProviderError>
    where
        V: Serialize,
        D: DeserializeOwned,
    {
        debug!(url = %url, "GitHub GraphQL request");
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = check(response).await?;
        let signals = RateLimitSignals::from_headers(response.headers());

        let parsed: GraphQlResponse<D> = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        if let Some(first) = parsed.errors.first() {
            let now = chrono::Utc::now().timestamp();
            if let Some(err) = graphql_rate_limit(first.kind.as_deref(), &signals, now) {
                return Err(err);
            }
            if first.kind.as_deref() == Some("NOT_FOUND") {
                return Err(ProviderError::NotFound(first.message.clone()));
            }
            let messages: Vec<_> = parsed.errors.iter().map(|e| e.message.as_str()).collect();
            return Err(ProviderError::GraphQl(messages.join("; ")));
        }

        parsed
            .data
            .ok_or_else(|| ProviderError::GraphQl("response carried no data".to_string()))
    }
}

/// Turn an unsuccessful response into the matching error
async fn check(response: Response) -> Result<Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let signals = RateLimitSignals::from_headers(response.headers());
    let path = response.url().path().to_string();
    let message = response
        .json::<ApiMessage>()
        .await
        .unwrap_or_default()
        .message;

    if status == StatusCode::NOT_FOUND {
        return Err(ProviderError::NotFound(path));
    }
    if let Some(err) = classify(
        status.as_u16(),
        &signals,
        &message,
        chrono::Utc::now().timestamp(),
    ) {
        return Err(err);
    }
    Err(ProviderError::Status {
        status: status.as_u16(),
        message,
    })
}

/// Server errors and connection failures worth another attempt
fn is_transient(err: &ProviderError) -> bool {
    match err {
        ProviderError::Status { status, .. } => *status >= 500,
        ProviderError::Http(_) => true,
        _ => false,
    }
}

/// Run `call`, retrying once after a primary rate limit and up to
/// `MAX_TRANSIENT_RETRIES` times after a transient failure, with exponential
/// backoff. Secondary rate limits are reported, never retried.
async fn with_retry<T, F, Fut>(request: &str, mut call: F) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut rate_limit_retried = false;
    let mut transient_retries = 0u32;
    loop {
        let err = match call().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        match &err {
            ProviderError::RateLimited { retry_after_secs } => {
                warn!(request, "Request quota exhausted for request {}", request);
                let wait = Duration::from_secs(*retry_after_secs);
                if rate_limit_retried || wait > MAX_RETRY_WAIT {
                    return Err(err);
                }
                info!(request, retry_after_secs, "Retrying after {} seconds", retry_after_secs);
                tokio::time::sleep(wait).await;
                rate_limit_retried = true;
            }
            ProviderError::SecondaryRateLimited => {
                warn!(request, "Secondary rate limit detected for request {}", request);
                return Err(err);
            }
            _ if is_transient(&err) && transient_retries < MAX_TRANSIENT_RETRIES => {
                let backoff = TRANSIENT_BACKOFF * 2u32.pow(transient_retries);
                transient_retries += 1;
                warn!(
                    request,
                    error = %err,
                    attempt = transient_retries,
                    backoff_ms = backoff.as_millis() as u64,
                    "Transient GitHub failure, retrying"
                );
                tokio::time::sleep(backoff).await;
            }
            _ => return Err(err),
        }
    }
}

/// Decode the base64 payload of a contents response (GitHub wraps it at 60 columns)
fn decode_content(raw: &str) -> Result<String, ProviderError> {
    let compact: String = raw.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| ProviderError::Decode(format!("invalid base64 content: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| ProviderError::Decode(format!("content is not UTF-8: {}", e)))
}

#[async_trait]
impl RepositoryProvider for GitHubClient {
    async fn list_repositories(&self) -> Result<Vec<ProviderRepository>, ProviderError> {
        let mut repositories = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let data: ViewerData = self
                .graphql(
                    "query AllRepositories",
                    LIST_REPOSITORIES_QUERY,
                    CursorVariables {
                        cursor: cursor.as_deref(),
                    },
                )
                .await?;

            let connection = data.viewer.repositories;
            repositories.extend(connection.nodes.into_iter().map(ProviderRepository::from));

            match connection.page_info.end_cursor {
                Some(next) if connection.page_info.has_next_page => cursor = Some(next),
                _ => break,
            }
        }

        debug!(count = repositories.len(), "Listed viewer repositories");
        Ok(repositories)
    }

    async fn find_repository(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<ProviderRepository, ProviderError> {
        let data: RepositoryData = self
            .graphql(
                "query Repository",
                FIND_REPOSITORY_QUERY,
                RepositoryVariables { owner, repo },
            )
            .await?;

        data.repository
            .map(ProviderRepository::from)
            .ok_or_else(|| ProviderError::NotFound(format!("{}/{}", owner, repo)))
    }

    async fn list_tree(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<Vec<TreeEntry>, ProviderError> {
        let mut url = self.rest_url(["repos", owner, repo, "git", "trees", branch])?;
        url.query_pairs_mut().append_pair("recursive", "1");

        let response: TreeResponse =
            with_retry("GET /repos/{owner}/{repo}/git/trees/{tree_sha}", || {
                self.get_json(url.clone())
            })
            .await?;

        if response.truncated {
            warn!(owner, repo, branch, "Tree listing truncated by GitHub");
        }

        Ok(response
            .tree
            .into_iter()
            .filter_map(TreeItem::into_entry)
            .collect())
    }

    async fn file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<String, ProviderError> {
        let segments = ["repos", owner, repo, "contents"]
            .into_iter()
            .chain(path.split('/').filter(|s| !s.is_empty()));
        let url = self.rest_url(segments)?;

        let body: serde_json::Value =
            with_retry("GET /repos/{owner}/{repo}/contents/{path}", || {
                self.get_json(url.clone())
            })
            .await?;

        // Directories are listed as arrays
        if body.is_array() {
            return Err(ProviderError::FileTypeMismatch(path.to_string()));
        }
        let item: ContentItem =
            serde_json::from_value(body).map_err(|e| ProviderError::Decode(e.to_string()))?;
        if item.kind != "file" {
            return Err(ProviderError::FileTypeMismatch(item.path));
        }

        match item.encoding.as_deref() {
            None | Some("base64") => decode_content(item.content.as_deref().unwrap_or_default()),
            Some(other) => Err(ProviderError::Decode(format!(
                "unsupported content encoding '{}' for {}",
                other, item.path
            ))),
        }
    }

    async fn list_webhooks(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<ProviderWebhook>, ProviderError> {
        let mut hooks = Vec::new();
        let mut page = 1usize;

        loop {
            let mut url = self.rest_url(["repos", owner, repo, "hooks"])?;
            url.query_pairs_mut()
                .append_pair("per_page", &PER_PAGE.to_string())
                .append_pair("page", &page.to_string());

            let batch: Vec<HookItem> = with_retry("GET /repos/{owner}/{repo}/hooks", || {
                self.get_json(url.clone())
            })
            .await?;

            let last = batch.len() < PER_PAGE;
            hooks.extend(batch.into_iter().map(ProviderWebhook::from));
            if last {
                break;
            }
            page += 1;
        }

        Ok(hooks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn client(api_url: &str) -> GitHubClient {
        GitHubClient::new(GitHubConfig {
            api_url: api_url.to_string(),
            token: Some("ghp_test".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_decode_wrapped_base64() {
        // "name: ci\non: push\n" split across lines
        let raw = "bmFtZTogY2kKb246\nIHB1c2gK\n";
        assert_eq!(decode_content(raw).unwrap(), "name: ci\non: push\n");
    }

    #[test]
    fn test_decode_rejects_invalid_payload() {
        assert!(matches!(
            decode_content("***"),
            Err(ProviderError::Decode(_))
        ));
        // 0xFF 0xFE is not UTF-8
        assert!(matches!(decode_content("//4="), Err(ProviderError::Decode(_))));
    }

    #[test]
    fn test_rest_url_encodes_segments() {
        let client = client("https://api.github.com");
        let url = client
            .rest_url(["repos", "octo", "alpha", "git", "trees", "feature/x"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/octo/alpha/git/trees/feature%2Fx"
        );
    }

    #[test]
    fn test_rest_url_keeps_enterprise_prefix() {
        let client = client("https://ghe.example.com/api/v3/");
        let url = client.rest_url(["repos", "octo", "alpha", "hooks"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://ghe.example.com/api/v3/repos/octo/alpha/hooks"
        );
    }

    #[test]
    fn test_invalid_api_url_is_reported() {
        let client = client("not a url");
        assert!(matches!(
            client.rest_url(["repos"]),
            Err(ProviderError::Http(_))
        ));
    }

    #[test]
    fn test_primary_rate_limit_retried_once() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), _> = tokio_test::block_on(with_retry("GET /test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(ProviderError::RateLimited {
                    retry_after_secs: 0,
                })
            }
        }));

        assert!(matches!(result, Err(ProviderError::RateLimited { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_retry_succeeds_after_primary_rate_limit() {
        let calls = AtomicUsize::new(0);
        let result = tokio_test::block_on(with_retry("GET /test", || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err(ProviderError::RateLimited {
                        retry_after_secs: 0,
                    })
                } else {
                    Ok(attempt)
                }
            }
        }));

        assert_eq!(result, Ok(1));
    }

    #[test]
    fn test_secondary_rate_limit_not_retried() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), _> = tokio_test::block_on(with_retry("GET /test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::SecondaryRateLimited) }
        }));

        assert_eq!(result, Err(ProviderError::SecondaryRateLimited));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_long_reset_not_retried() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), _> = tokio_test::block_on(with_retry("GET /test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(ProviderError::RateLimited {
                    retry_after_secs: 3600,
                })
            }
        }));

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    fn bad_gateway() -> ProviderError {
        ProviderError::Status {
            status: 502,
            message: "Bad Gateway".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_error_retried_with_backoff() {
        let calls = AtomicUsize::new(0);
        let start = tokio::time::Instant::now();
        let result = with_retry("GET /test", || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 2 {
                    Err(bad_gateway())
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 250ms then 500ms
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(750), "waited {:?}", waited);
        assert!(waited < Duration::from_millis(800), "waited {:?}", waited);
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_server_error_gives_up() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), _> = with_retry("GET /test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(bad_gateway()) }
        })
        .await;

        assert_eq!(result, Err(bad_gateway()));
        assert_eq!(calls.load(Ordering::SeqCst), 1 + MAX_TRANSIENT_RETRIES as usize);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connection_error_retried() {
        let calls = AtomicUsize::new(0);
        let result = with_retry("GET /test", || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err(ProviderError::Http("connection reset".to_string()))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_errors_not_retried() {
        for err in [
            ProviderError::Status {
                status: 422,
                message: "Unprocessable".to_string(),
            },
            ProviderError::NotFound("/repos/octo/ghost".to_string()),
            ProviderError::Decode("bad json".to_string()),
        ] {
            let calls = AtomicUsize::new(0);
            let result: Result<(), _> = with_retry("GET /test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                let err = err.clone();
                async move { Err(err) }
            })
            .await;

            assert_eq!(result, Err(err));
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }
    }
}
