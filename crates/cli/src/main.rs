//! RepoGate CLI - Command-line interface for the RepoGate gateway

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9640";

#[derive(Parser)]
#[command(name = "repogate-cli")]
#[command(about = "RepoGate GitHub gateway CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "REPOGATE_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// List repositories of the gateway's account
    Repos,

    /// Show repository details
    Repo {
        owner: String,
        repo: String,
    },

    /// Count files on the default branch
    Files {
        owner: String,
        repo: String,
    },

    /// Print the first .yml file of a repository
    Yml {
        owner: String,
        repo: String,
    },

    /// List active webhooks
    Webhooks {
        owner: String,
        repo: String,
    },

    /// Show queue statistics
    Queues,
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Deserialize, Tabled)]
struct RepositoryRow {
    id: i64,
    owner: String,
    name: String,
    #[tabled(rename = "size (KB)")]
    size: i64,
}

#[derive(Deserialize)]
struct RepositoryDetails {
    id: i64,
    name: String,
    owner: String,
    size: i64,
    default_branch: Option<String>,
    is_private: bool,
}

#[derive(Deserialize)]
struct YmlFile {
    path: String,
    content: String,
}

#[derive(Deserialize, Tabled)]
struct WebhookRow {
    id: i64,
    name: String,
    #[tabled(display_with = "display_opt")]
    url: Option<String>,
}

#[derive(Deserialize, Tabled)]
struct QueueRow {
    name: String,
    #[tabled(rename = "limit", display_with = "display_opt")]
    concurrency_limit: Option<usize>,
    #[tabled(rename = "timeout (ms)", display_with = "display_opt")]
    default_timeout_ms: Option<u64>,
    running: usize,
    pending: usize,
    completed: u64,
    failed: u64,
    timed_out: u64,
}

#[derive(Deserialize)]
struct QueueStats {
    queues: Vec<QueueRow>,
    uptime_seconds: i64,
}

fn display_opt<T: std::fmt::Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "-".to_string(),
    }
}

async fn call_rpc(url: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to gateway")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

fn repository_params(owner: &str, repo: &str) -> serde_json::Value {
    json!({ "owner": owner, "repo": repo })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Repos => {
            let result = call_rpc(&cli.rpc_url, "repositories.list.v1", json!([])).await?;
            let rows: Vec<RepositoryRow> = serde_json::from_value(result)?;

            println!("{}", format!("{} repositories", rows.len()).cyan().bold());
            println!();
            println!("{}", Table::new(rows));
        }

        Commands::Repo { owner, repo } => {
            let result = call_rpc(
                &cli.rpc_url,
                "repository.get.v1",
                repository_params(&owner, &repo),
            )
            .await?;
            let details: RepositoryDetails = serde_json::from_value(result)?;

            println!("{}", format!("{}/{}", details.owner, details.name).cyan().bold());
            println!();
            println!("  {} {}", "ID:".bold(), details.id);
            println!("  {} {} KB", "Size:".bold(), details.size);
            println!(
                "  {} {}",
                "Visibility:".bold(),
                if details.is_private {
                    "private".yellow()
                } else {
                    "public".green()
                }
            );
            println!(
                "  {} {}",
                "Default branch:".bold(),
                details.default_branch.as_deref().unwrap_or("(empty repository)")
            );
        }

        Commands::Files { owner, repo } => {
            let result = call_rpc(
                &cli.rpc_url,
                "repository.files_count.v1",
                repository_params(&owner, &repo),
            )
            .await?;

            println!(
                "{} {}",
                format!("{}/{}:", owner, repo).bold(),
                format!("{} files", result["count"]).green()
            );
        }

        Commands::Yml { owner, repo } => {
            let result = call_rpc(
                &cli.rpc_url,
                "repository.yml_file.v1",
                repository_params(&owner, &repo),
            )
            .await?;

            match serde_json::from_value::<Option<YmlFile>>(result)? {
                Some(file) => {
                    println!("{}", file.path.cyan().bold());
                    println!("{}", file.content);
                }
                None => println!("{}", "No .yml file found".yellow()),
            }
        }

        Commands::Webhooks { owner, repo } => {
            let result = call_rpc(
                &cli.rpc_url,
                "repository.webhooks.v1",
                repository_params(&owner, &repo),
            )
            .await?;
            let rows: Vec<WebhookRow> = serde_json::from_value(result)?;

            if rows.is_empty() {
                println!("{}", "No active webhooks".yellow());
            } else {
                println!("{}", Table::new(rows));
            }
        }

        Commands::Queues => {
            println!("{}", "Queue Status".cyan().bold());
            println!();

            match call_rpc(&cli.rpc_url, "admin.queues.v1", json!([])).await {
                Ok(result) => {
                    let stats: QueueStats = serde_json::from_value(result)?;
                    println!("  {} {}", "RPC URL:".bold(), cli.rpc_url);
                    println!("  {} {}", "Status:".bold(), "ONLINE".green());
                    println!("  {} {} seconds", "Uptime:".bold(), stats.uptime_seconds);
                    println!();
                    if stats.queues.is_empty() {
                        println!("  {}", "No queue has been used yet".yellow());
                    } else {
                        println!("{}", Table::new(stats.queues));
                    }
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }
    }

    Ok(())
}
