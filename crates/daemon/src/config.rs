//! Gateway configuration from environment variables

use anyhow::{anyhow, Context, Result};
use repogate_api_rpc::methods::{DEFAULT_REPOSITORY_CONCURRENCY, DEFAULT_REPOSITORY_TIMEOUT};
use repogate_api_rpc::server::DEFAULT_RPC_PORT;
use repogate_api_rpc::RpcServerConfig;
use repogate_infra_github::GitHubConfig;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub github: GitHubConfig,
    pub rpc: RpcServerConfig,
    pub repository_concurrency: usize,
    pub repository_timeout: Duration,
    pub log_format: LogFormat,
    /// Daily rolling log files are written here when set
    pub log_dir: Option<PathBuf>,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Unset variables take their
    /// defaults; malformed ones are rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut github = GitHubConfig {
            token: var("GITHUB_TOKEN"),
            ..Default::default()
        };
        if let Some(url) = var("REPOGATE_GITHUB_API_URL") {
            github.api_url = url;
        }
        if let Some(secs) = parse::<u64>(&var, "REPOGATE_REQUEST_TIMEOUT_SECS")? {
            github.request_timeout = Duration::from_secs(secs);
        }

        let mut rpc = RpcServerConfig::default();
        if let Some(host) = var("REPOGATE_RPC_HOST") {
            rpc.host = host;
        }
        rpc.port = parse(&var, "REPOGATE_RPC_PORT")?.unwrap_or(DEFAULT_RPC_PORT);

        let repository_concurrency = parse(&var, "REPOGATE_REPOSITORY_CONCURRENCY")?
            .unwrap_or(DEFAULT_REPOSITORY_CONCURRENCY);
        if repository_concurrency == 0 {
            return Err(anyhow!("REPOGATE_REPOSITORY_CONCURRENCY must be positive"));
        }
        let repository_timeout = parse::<u64>(&var, "REPOGATE_REPOSITORY_TIMEOUT_MS")?
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_REPOSITORY_TIMEOUT);
        if repository_timeout.is_zero() {
            return Err(anyhow!("REPOGATE_REPOSITORY_TIMEOUT_MS must be positive"));
        }

        let log_format = match var("REPOGATE_LOG_FORMAT").as_deref() {
            Some("json") => LogFormat::Json,
            Some("pretty") | None => LogFormat::Pretty,
            Some(other) => return Err(anyhow!("Unknown REPOGATE_LOG_FORMAT '{}'", other)),
        };
        let log_dir = var("REPOGATE_LOG_DIR").map(|dir| PathBuf::from(shellexpand::tilde(&dir).into_owned()));

        Ok(Self {
            github,
            rpc,
            repository_concurrency,
            repository_timeout,
            log_format,
            log_dir,
        })
    }
}

fn parse<T>(var: impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    var(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("Invalid value for {}: '{}'", key, raw))
        })
        .transpose()
}
