// src/lib.rs
// =============================================================================
// repo-ingest: turn a GitHub repository URL into documents.
//
// The public surface is RepoClient:
//
//   let mut client = RepoClient::new("https://github.com/acme/widgets")?
//       .with_access_token(token);
//   if client.init().await.is_some() {
//       let documents = client.recursive_loader().await?;
//   }
//
// Modules:
// - config: Client settings (API root, page size, concurrency)
// - error: IngestError, the few failures that reach the caller
// - github: URL/branch/token handling and the REST calls
// - loader: The bulk loading contract and its default implementation
// =============================================================================

pub mod config;
pub mod error;
pub mod github;
pub mod loader;

pub use config::ClientConfig;
pub use error::IngestError;
pub use github::{InitState, RepoClient, TokenCheck};
pub use loader::{Document, DocumentMetadata, LoaderOptions, RecursiveLoader, UnknownFileTypePolicy};
