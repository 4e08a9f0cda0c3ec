// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Three subcommands map onto the three things RepoClient can do:
// - branches: list branches (no init needed beyond a valid URL)
// - load:     init, then load every file of the branch
// - file:     init, then print one file
//
// Options shared by all subcommands (token, API root, logging) live on Cli
// and are marked `global` so they can appear after the subcommand too.
// =============================================================================

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "repo-ingest",
    version,
    about = "Load the files of a GitHub repository for ingestion",
    long_about = "repo-ingest validates a GitHub repository URL, resolves the branch to read \
                  and either loads every file of that branch or fetches a single file. \
                  A token raises rate limits and enables recursive loading."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Personal access token sent as a bearer token
    #[arg(long, global = true, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Root of the GitHub REST API
    #[arg(
        long,
        global = true,
        env = "GITHUB_API_URL",
        default_value = repo_ingest::config::DEFAULT_API_BASE_URL
    )]
    pub api_url: String,

    /// Maximum number of files downloaded at once by `load`
    #[arg(long, global = true, default_value_t = repo_ingest::config::DEFAULT_MAX_CONCURRENCY)]
    pub max_concurrency: usize,

    /// Log level used when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the branches of a repository, main/master first
    ///
    /// Example: repo-ingest branches https://github.com/rust-lang/rust
    Branches {
        /// GitHub repository URL (e.g., https://github.com/user/repo)
        repo_url: String,

        /// Output the branch names as a JSON array
        #[arg(long)]
        json: bool,
    },

    /// Load every file of a branch
    ///
    /// Example: repo-ingest load https://github.com/user/repo --ignore '*.lock'
    Load {
        /// GitHub repository URL (e.g., https://github.com/user/repo)
        repo_url: String,

        /// Branch to read (defaults to main, then master)
        #[arg(long)]
        branch: Option<String>,

        /// Gitignore-style pattern to skip; may be repeated
        #[arg(long = "ignore", value_name = "PATTERN")]
        ignore_paths: Vec<String>,

        /// Output the documents as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Print the content of a single file
    ///
    /// Example: repo-ingest file https://github.com/user/repo src/main.rs
    File {
        /// GitHub repository URL (e.g., https://github.com/user/repo)
        repo_url: String,

        /// Path of the file inside the repository
        path: String,

        /// Branch to read (defaults to main, then master)
        #[arg(long)]
        branch: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_load_with_repeated_ignores() {
        let cli = Cli::parse_from([
            "repo-ingest",
            "load",
            "https://github.com/acme/widgets",
            "--ignore",
            "*.lock",
            "--ignore",
            "vendor/",
            "--branch",
            "dev",
        ]);

        match cli.command {
            Commands::Load {
                repo_url,
                branch,
                ignore_paths,
                json,
            } => {
                assert_eq!(repo_url, "https://github.com/acme/widgets");
                assert_eq!(branch.as_deref(), Some("dev"));
                assert_eq!(ignore_paths, vec!["*.lock", "vendor/"]);
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.max_concurrency, 3);
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = Cli::parse_from([
            "repo-ingest",
            "file",
            "https://github.com/acme/widgets",
            "README.md",
            "--api-url",
            "http://localhost:8080",
            "--log-level",
            "debug",
        ]);
        assert_eq!(cli.api_url, "http://localhost:8080");
        assert_eq!(cli.log_level, "debug");
        assert!(matches!(cli.command, Commands::File { .. }));
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
