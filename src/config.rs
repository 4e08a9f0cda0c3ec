// src/config.rs
// =============================================================================
// Settings shared by the repository client and the default loader.
//
// Everything has a sensible default for public github.com, so most callers
// just use ClientConfig::default(). The CLI overrides individual fields from
// flags and environment variables (see cli.rs).
//
// Rust concepts:
// - Default trait: A standard way to build a value with default settings
// - const: Compile-time constants shared across modules
// =============================================================================

/// Base URL of the public GitHub REST API
pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

/// Host every repository URL must point at
pub const DEFAULT_WEB_HOST: &str = "github.com";

/// Pinned value of the X-GitHub-Api-Version header
pub const DEFAULT_API_VERSION: &str = "2022-11-28";

/// Largest page size the branches endpoint accepts
pub const DEFAULT_BRANCHES_PER_PAGE: u32 = 100;

/// How many file downloads the bulk loader keeps in flight
pub const DEFAULT_MAX_CONCURRENCY: usize = 3;

// Configuration for a RepoClient
//
// None of these fields carry credentials; the access token is owned by the
// client itself because it can be revoked (cleared) at runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// REST API root, e.g. https://api.github.com
    pub api_base_url: String,
    /// Hostname that repository URLs must use
    pub web_host: String,
    /// Sent as X-GitHub-Api-Version on every request
    pub api_version: String,
    /// GitHub rejects requests without a User-Agent
    pub user_agent: String,
    /// Page size for branch discovery
    pub branches_per_page: u32,
    /// Fan-out limit handed to the recursive loader
    pub max_concurrency: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            web_host: DEFAULT_WEB_HOST.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            user_agent: format!("repo-ingest/{}", env!("CARGO_PKG_VERSION")),
            branches_per_page: DEFAULT_BRANCHES_PER_PAGE,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }
}

impl ClientConfig {
    // Points the client at another API root (a mock server in tests,
    // or a GitHub Enterprise instance)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        // A zero limit would stall the loader forever
        self.max_concurrency = limit.max(1);
        self
    }
}
