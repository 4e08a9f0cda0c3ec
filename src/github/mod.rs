// src/github/mod.rs
// =============================================================================
// This module talks to GitHub on behalf of one repository.
//
// Submodules:
// - url: Normalizing repository URLs and extracting owner/project
// - branches: Ordering discovered branches and picking the one to read
// - api: Raw REST calls with the shared headers (auth, API version)
// - client: RepoClient, which ties the pieces together behind init()
//
// Rust concepts:
// - Modules: Organizing related functionality
// - Public API: What other parts of the app can use
// =============================================================================

pub mod api;
pub mod branches;
mod client;
pub mod url;

// Re-export the types most callers need
pub use client::{InitState, RepoClient, TokenCheck};
