// src/loader/mod.rs
// =============================================================================
// The bulk loading contract.
//
// RepoClient does not walk repository trees itself. It hands a
// LoaderOptions value to whatever implements RecursiveLoader and returns
// the documents it gets back untouched. GithubTreeLoader (tree.rs) is the
// implementation used by default; tests and embedders can swap in their own.
//
// Submodules:
// - tree: Loader built on the git trees API
//
// Rust concepts:
// - Traits: A shared interface several types can implement
// - async-trait: Lets a trait with async methods be used as Box<dyn Trait>
// =============================================================================

mod tree;

pub use tree::GithubTreeLoader;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// What to do with a file whose content cannot be read as text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownFileTypePolicy {
    /// Log a warning and skip the file
    #[default]
    Warn,
    /// Skip the file silently
    Ignore,
    /// Fail the whole load
    Error,
}

/// Everything a loader needs to walk one branch of one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderOptions {
    /// Normalized repository URL, e.g. https://github.com/acme/widgets
    pub repository_url: String,
    pub branch: String,
    /// Walk sub-directories; only the top level is loaded otherwise
    pub recursive: bool,
    /// Upper bound on concurrent file downloads
    pub max_concurrency: usize,
    /// Gitignore-style patterns of paths to skip
    pub ignore_paths: Vec<String>,
    pub access_token: Option<String>,
    pub unknown_file_type: UnknownFileTypePolicy,
}

/// One loaded file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub page_content: String,
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Path of the file inside the repository
    pub source: String,
    pub repository: String,
    pub branch: String,
}

#[async_trait]
pub trait RecursiveLoader: Send + Sync {
    async fn load(&self, options: &LoaderOptions) -> anyhow::Result<Vec<Document>>;
}
