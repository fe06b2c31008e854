// GitHub Client Configuration

use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct GitHubConfig {
    /// REST base URL; GraphQL is served at `{api_url}/graphql`
    pub api_url: String,
    /// Personal access token. Unauthenticated when `None`.
    pub token: Option<String>,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: format!("repogate/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl GitHubConfig {
    pub fn graphql_url(&self) -> String {
        format!("{}/graphql", self.api_url.trim_end_matches('/'))
    }
}

impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("api_url", &self.api_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("request_timeout", &self.request_timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
