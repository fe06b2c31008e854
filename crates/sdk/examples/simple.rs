//! Simple SDK Example
//!
//! Demonstrates basic usage of the RepoGate SDK.
//!
//! # Usage
//!
//! 1. Start the gateway:
//!    ```bash
//!    GITHUB_TOKEN=ghp_... cargo run --package repogate-daemon
//!    ```
//!
//! 2. Run this example:
//!    ```bash
//!    cargo run --example simple -- <owner> <repo>
//!    ```

use repogate_sdk::RepoGateClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let owner = args.next().unwrap_or_else(|| "rust-lang".to_string());
    let repo = args.next().unwrap_or_else(|| "cargo".to_string());

    println!("RepoGate SDK - Simple Example");
    println!("=============================\n");

    // 1. Connect to the gateway
    println!("1. Connecting to gateway...");
    let url = std::env::var("REPOGATE_RPC_URL").unwrap_or_else(|_| "http://127.0.0.1:9640".to_string());
    let client = RepoGateClient::connect(&url).await?;
    println!("   ✓ Connected to {}\n", url);

    // 2. Repository details (queued on the gateway)
    println!("2. Fetching {}/{}...", owner, repo);
    match client.repository(&owner, &repo).await {
        Ok(details) => {
            println!("   ✓ Repository:");
            println!("     - ID: {}", details.id);
            println!("     - Size: {} KB", details.size);
            println!("     - Private: {}", details.is_private);
            println!(
                "     - Default branch: {}\n",
                details.default_branch.as_deref().unwrap_or("(empty)")
            );
        }
        Err(e) if e.is_queue_timeout() => {
            println!("   ⚠ Gateway queue timed out: {}\n", e);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    // 3. Files and the first yml file
    println!("3. Inspecting files...");
    let count = client.files_count(&owner, &repo).await?;
    println!("   ✓ {} files", count);
    match client.yml_file(&owner, &repo).await? {
        Some(file) => println!("   ✓ First yml file: {} ({} bytes)\n", file.path, file.content.len()),
        None => println!("   - No yml file\n"),
    }

    // 4. Active webhooks
    println!("4. Listing active webhooks...");
    match client.active_webhooks(&owner, &repo).await {
        Ok(hooks) => {
            for hook in &hooks {
                println!("     | {} {} {}", hook.id, hook.name, hook.url.as_deref().unwrap_or("-"));
            }
            println!("   ✓ {} active\n", hooks.len());
        }
        Err(e) => println!("   ⚠ Not available: {}\n", e),
    }

    // 5. Queue statistics
    println!("5. Queue statistics...");
    let stats = client.queue_stats().await?;
    for queue in &stats.queues {
        println!(
            "     | {} running={} pending={} completed={} timed_out={}",
            queue.name, queue.running, queue.pending, queue.completed, queue.timed_out
        );
    }

    println!("\n✓ Example completed successfully!");

    Ok(())
}
