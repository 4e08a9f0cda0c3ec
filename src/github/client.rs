// src/github/client.rs
// =============================================================================
// RepoClient: one repository, one branch, one optional token.
//
// Lifecycle:
//   new() -> init() -> ready -> recursive_loader() / fetch_single_file()
//
// init() runs three steps exactly once, in order:
//   1. URL validation      (Uninitialized -> UrlValidated, or -> NotReady)
//   2. branch resolution   (UrlValidated  -> BranchResolved)
//   3. token validation    (BranchResolved -> TokenChecked -> Ready)
//
// Only an invalid URL stops init. A rejected token is dropped and the client
// carries on unauthenticated; a failing branch page just shortens the
// branch list. The single hard error is asking for a bulk load before the
// client is ready.
//
// All operations take &self or &mut self, so two calls can never overlap on
// the same client.
//
// Rust concepts:
// - Enums as state machines: InitState moves forward through transitions
// - Box<dyn Trait>: The bulk loader can be swapped at runtime
// - let-else: Early return when a precondition is missing
// =============================================================================

use tracing::{debug, info, warn};
use url::Url;

use super::api::GithubApi;
use super::branches::{order_branches, pick_branch, BranchPages};
use super::url::{normalize_url, RepoUrl};
use crate::config::ClientConfig;
use crate::error::{IngestError, Result};
use crate::loader::{
    Document, GithubTreeLoader, LoaderOptions, RecursiveLoader, UnknownFileTypePolicy,
};

/// Where a client is in its initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitState {
    Uninitialized,
    UrlValidated,
    BranchResolved,
    TokenChecked,
    Ready,
    /// The repository URL was rejected; terminal
    NotReady,
}

impl InitState {
    // The state after the current step succeeded
    pub fn advance(self) -> InitState {
        match self {
            InitState::Uninitialized => InitState::UrlValidated,
            InitState::UrlValidated => InitState::BranchResolved,
            InitState::BranchResolved => InitState::TokenChecked,
            InitState::TokenChecked => InitState::Ready,
            InitState::Ready => InitState::Ready,
            InitState::NotReady => InitState::NotReady,
        }
    }

    // The state after URL validation failed
    //
    // Only a client that has not started can fail; later states are kept.
    pub fn reject(self) -> InitState {
        match self {
            InitState::Uninitialized => InitState::NotReady,
            other => other,
        }
    }

    pub fn is_ready(self) -> bool {
        self == InitState::Ready
    }
}

/// Outcome of probing the access token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenCheck {
    /// No token configured, nothing was sent
    Absent,
    Accepted,
    /// The probe failed and the token has been dropped
    Rejected,
}

pub struct RepoClient {
    config: ClientConfig,
    api: GithubApi,
    loader: Box<dyn RecursiveLoader>,
    repo_url: Option<String>,
    owner: Option<String>,
    project: Option<String>,
    branch: Option<String>,
    branches: Vec<String>,
    access_token: Option<String>,
    ignore_paths: Vec<String>,
    state: InitState,
}

impl RepoClient {
    // Creates a client for public github.com
    pub fn new(repo_url: &str) -> Result<Self> {
        Self::with_config(repo_url, ClientConfig::default())
    }

    // Creates a client with custom settings
    //
    // The URL is normalized right away. A URL that does not parse is kept
    // as None, which makes init() fail later instead of here.
    pub fn with_config(repo_url: &str, config: ClientConfig) -> Result<Self> {
        let api = GithubApi::new(&config)?;
        let loader = Box::new(GithubTreeLoader::new(api.clone(), config.web_host.clone()));

        let trimmed = repo_url.trim();
        let repo_url = if trimmed.is_empty() {
            None
        } else {
            let normalized = normalize_url(trimmed);
            Url::parse(&normalized).ok().map(|_| normalized)
        };

        Ok(Self {
            config,
            api,
            loader,
            repo_url,
            owner: None,
            project: None,
            branch: None,
            branches: Vec::new(),
            access_token: None,
            ignore_paths: Vec::new(),
            state: InitState::Uninitialized,
        })
    }

    /// Branch to read; replaced during init() if the repository lacks it
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        let branch = branch.into();
        self.branch = (!branch.trim().is_empty()).then_some(branch);
        self
    }

    /// Bearer token; an empty string means no token
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.access_token = (!token.trim().is_empty()).then_some(token);
        self
    }

    pub fn with_ignore_paths(mut self, ignore_paths: Vec<String>) -> Self {
        self.ignore_paths = ignore_paths;
        self
    }

    /// Replaces the default GithubTreeLoader
    pub fn with_loader(mut self, loader: Box<dyn RecursiveLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn repo_url(&self) -> Option<&str> {
        self.repo_url.as_deref()
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn project(&self) -> Option<&str> {
        self.project.as_deref()
    }

    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    pub fn branches(&self) -> &[String] {
        &self.branches
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn ignore_paths(&self) -> &[String] {
        &self.ignore_paths
    }

    pub fn state(&self) -> InitState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    // Runs URL validation, branch resolution and token validation
    //
    // Returns None only when the URL is invalid (state becomes NotReady).
    // Calling it again on a ready client is a no-op.
    pub async fn init(&mut self) -> Option<&mut Self> {
        // Ready is terminal: the steps already ran once and nothing they
        // depend on (URL, requested branch) can change afterwards
        if self.state.is_ready() {
            return Some(self);
        }

        let mut state = InitState::Uninitialized;

        if !self.validate() {
            self.state = state.reject();
            return None;
        }
        state = state.advance();
        self.state = state;

        self.resolve_branch().await;
        state = state.advance();
        self.state = state;

        let token = self.validate_token().await;
        state = state.advance();
        self.state = state;

        self.state = state.advance();
        info!(
            owner = self.owner.as_deref().unwrap_or_default(),
            project = self.project.as_deref().unwrap_or_default(),
            branch = self.branch.as_deref().unwrap_or_default(),
            token = ?token,
            "repository client ready"
        );
        Some(self)
    }

    // Checks the repository URL and extracts owner/project
    //
    // Safe to call any number of times.
    pub fn validate(&mut self) -> bool {
        let Some(url) = self.repo_url.as_deref() else {
            warn!("no usable repository URL configured");
            return false;
        };

        match RepoUrl::parse(url, &self.config.web_host) {
            Ok(repo) => {
                debug!(owner = %repo.owner, project = %repo.project, "repository URL accepted");
                self.owner = Some(repo.owner);
                self.project = Some(repo.project);
                true
            }
            Err(e) => {
                warn!(url, error = %e, "invalid repository URL");
                false
            }
        }
    }

    // Probes the access token and drops it if the API refuses it
    //
    // Never cached: every call sends a fresh probe.
    pub async fn validate_token(&mut self) -> TokenCheck {
        let Some(token) = self.access_token.as_deref() else {
            return TokenCheck::Absent;
        };

        match self.api.probe_token(token).await {
            Ok(()) => TokenCheck::Accepted,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "access token rejected, continuing unauthenticated");
                self.access_token = None;
                TokenCheck::Rejected
            }
        }
    }

    // Lists every branch of the repository, "main"/"master" first
    //
    // Returns an empty list (without any request) until the URL has been
    // validated. A failing page ends the listing with what was collected.
    pub async fn list_branches(&mut self) -> Vec<String> {
        let (Some(owner), Some(project)) = (self.owner.clone(), self.project.clone()) else {
            debug!("branch listing skipped: repository URL not validated");
            return Vec::new();
        };

        // A stale token must not be sent with the page requests
        let token = self.validate_token().await;
        debug!(token = ?token, "listing branches");

        let pages = self.fetch_branch_pages(&owner, &project).await;
        if let Some(page) = pages.halted_at {
            warn!(
                page,
                collected = pages.names.len(),
                "branch listing incomplete, using branches collected so far"
            );
        }

        order_branches(pages.names)
    }

    // Pages through the branches endpoint one page at a time
    //
    // Pages are numbered from 0 and requested until one comes back empty.
    async fn fetch_branch_pages(&self, owner: &str, project: &str) -> BranchPages {
        let token = self.access_token.as_deref();
        let mut names = Vec::new();
        let mut page = 0;

        loop {
            match self.api.branches_page(owner, project, page, token).await {
                Ok(batch) if batch.is_empty() => {
                    return BranchPages {
                        names,
                        halted_at: None,
                    };
                }
                Ok(batch) => {
                    debug!(page, count = batch.len(), "received branch page");
                    names.extend(batch);
                    page += 1;
                }
                Err(e) => {
                    warn!(page, error = %format!("{e:#}"), "branch page request failed");
                    return BranchPages {
                        names,
                        halted_at: Some(page),
                    };
                }
            }
        }
    }

    // Populates `branches` and settles on the branch to read
    //
    // Keeps the requested branch if it exists, otherwise "main" if it
    // exists, otherwise "master" whether or not it was seen.
    pub async fn resolve_branch(&mut self) {
        self.branches = self.list_branches().await;
        let resolved = pick_branch(self.branch.as_deref(), &self.branches);

        match self.branch.as_deref() {
            Some(requested) if requested != resolved => {
                warn!(requested, resolved = %resolved, "requested branch not found");
            }
            None => info!(resolved = %resolved, "no branch requested"),
            _ => {}
        }
        self.branch = Some(resolved);
    }

    // Caller-facing branch listing, usable without init()
    pub async fn get_repo_branches(&mut self) -> Vec<String> {
        if self.owner.is_none() && !self.validate() {
            return Vec::new();
        }

        let branches = self.list_branches().await;
        self.branches = branches.clone();
        branches
    }

    // Options handed to the bulk loader
    //
    // Recursion is only enabled with a token: anonymous recursive walks
    // exhaust the public rate limit quickly.
    fn loader_options(&self, repository_url: String, branch: String) -> LoaderOptions {
        LoaderOptions {
            repository_url,
            branch,
            recursive: self.access_token.is_some(),
            max_concurrency: self.config.max_concurrency,
            ignore_paths: self.ignore_paths.clone(),
            access_token: self.access_token.clone(),
            unknown_file_type: UnknownFileTypePolicy::Warn,
        }
    }

    // Loads every file of the branch through the configured loader
    //
    // Fails with NotReady unless init() completed. Loader errors are
    // returned unchanged.
    pub async fn recursive_loader(&self) -> Result<Vec<Document>> {
        if !self.is_ready() {
            return Err(IngestError::NotReady);
        }
        let (Some(repository_url), Some(branch)) = (self.repo_url.clone(), self.branch.clone())
        else {
            return Err(IngestError::NotReady);
        };

        let options = self.loader_options(repository_url, branch);
        info!(
            repository = %options.repository_url,
            branch = %options.branch,
            recursive = options.recursive,
            "starting bulk load"
        );

        self.loader.load(&options).await.map_err(IngestError::Loader)
    }

    // Fetches one file at the resolved branch
    //
    // Every failure (network, error body, missing content, bad encoding)
    // is logged with the path and reported as None.
    pub async fn fetch_single_file(&self, path: &str) -> Option<String> {
        let (Some(owner), Some(project)) = (self.owner.as_deref(), self.project.as_deref()) else {
            warn!(path, "cannot fetch file: repository URL not validated");
            return None;
        };

        match self
            .api
            .file_contents(
                owner,
                project,
                path,
                self.branch.as_deref(),
                self.access_token.as_deref(),
            )
            .await
        {
            Ok(content) => Some(content),
            Err(e) => {
                warn!(path, error = %format!("{e:#}"), "could not fetch file");
                None
            }
        }
    }
}
