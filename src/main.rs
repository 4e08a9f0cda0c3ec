// src/main.rs
// =============================================================================
// This is the entry point of the repo-ingest CLI.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (diagnostics go to stderr, results to stdout)
// 3. Build a RepoClient and dispatch to the subcommand handler
// 4. Exit with proper code (0 = success, 1 = nothing found, 2 = error)
// =============================================================================

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use repo_ingest::{ClientConfig, Document, RepoClient};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            // Unexpected failure: print the whole error chain
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// RUST_LOG wins over --log-level when both are given
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("repo_ingest={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// Returns:
//   Ok(0) = success
//   Ok(1) = invalid repository URL, or nothing to show
//   Err   = unexpected error (exit code 2)
async fn run(cli: Cli) -> Result<i32> {
    let config = ClientConfig::default()
        .with_api_base_url(cli.api_url)
        .with_max_concurrency(cli.max_concurrency);
    let token = cli.token.unwrap_or_default();

    match cli.command {
        Commands::Branches { repo_url, json } => {
            let client = RepoClient::with_config(&repo_url, config)?.with_access_token(token);
            handle_branches(client, json).await
        }
        Commands::Load {
            repo_url,
            branch,
            ignore_paths,
            json,
        } => {
            let client = RepoClient::with_config(&repo_url, config)?
                .with_access_token(token)
                .with_branch(branch.unwrap_or_default())
                .with_ignore_paths(ignore_paths);
            handle_load(client, json).await
        }
        Commands::File {
            repo_url,
            path,
            branch,
        } => {
            let client = RepoClient::with_config(&repo_url, config)?
                .with_access_token(token)
                .with_branch(branch.unwrap_or_default());
            handle_file(client, &path).await
        }
    }
}

// Handles the 'branches' subcommand
async fn handle_branches(mut client: RepoClient, json: bool) -> Result<i32> {
    if !client.validate() {
        eprintln!("❌ Not a GitHub repository URL");
        return Ok(1);
    }

    let branches = client.get_repo_branches().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&branches)?);
    } else if branches.is_empty() {
        println!("⚠️  No branches found");
    } else {
        for branch in &branches {
            println!("{}", branch);
        }
    }

    Ok(if branches.is_empty() { 1 } else { 0 })
}

// Handles the 'load' subcommand
async fn handle_load(mut client: RepoClient, json: bool) -> Result<i32> {
    if client.init().await.is_none() {
        eprintln!("❌ Not a GitHub repository URL");
        return Ok(1);
    }

    let authenticated = client.access_token().is_some();
    eprintln!(
        "🔍 Loading {} @ {}{}",
        client.repo_url().unwrap_or_default(),
        client.branch().unwrap_or_default(),
        if authenticated { "" } else { " (unauthenticated, top level only)" }
    );

    let documents = client.recursive_loader().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&documents)?);
    } else {
        print_summary(&documents);
    }

    Ok(if documents.is_empty() { 1 } else { 0 })
}

// Handles the 'file' subcommand
async fn handle_file(mut client: RepoClient, path: &str) -> Result<i32> {
    if client.init().await.is_none() {
        eprintln!("❌ Not a GitHub repository URL");
        return Ok(1);
    }

    match client.fetch_single_file(path).await {
        Some(content) => {
            print!("{}", content);
            Ok(0)
        }
        None => {
            eprintln!("❌ Could not fetch {}", path);
            Ok(1)
        }
    }
}

// Prints one line per document plus a total
fn print_summary(documents: &[Document]) {
    println!("{:<70} {:>10}", "PATH", "BYTES");
    println!("{}", "=".repeat(81));

    for document in documents {
        let path = &document.metadata.source;
        // Keep long paths inside the column
        let path_display = if path.chars().count() > 67 {
            let tail: String = path.chars().skip(path.chars().count() - 64).collect();
            format!("...{}", tail)
        } else {
            path.clone()
        };
        println!("{:<70} {:>10}", path_display, document.page_content.len());
    }

    println!();
    println!("📊 Summary:");
    println!("   📄 Documents: {}", documents.len());
    println!(
        "   📦 Bytes: {}",
        documents.iter().map(|d| d.page_content.len()).sum::<usize>()
    );
}
