// src/github/api.rs
// =============================================================================
// Thin wrapper around the GitHub REST API.
//
// Every request goes through GithubApi so they all carry the same headers:
// - Accept: application/vnd.github+json
// - X-GitHub-Api-Version: pinned (see config.rs)
// - User-Agent (GitHub rejects anonymous agents)
// - Authorization: Bearer <token>, only when the caller passes a token
//
// The functions here report failures as plain anyhow errors. Deciding
// whether a failure is fatal or just degrades the result is the client's
// job, not this module's.
//
// Rust concepts:
// - serde Deserialize: Decoding only the JSON fields we care about
// - Builder pattern: reqwest::RequestBuilder is configured step by step
// =============================================================================

use anyhow::{anyhow, bail, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use url::Url;

use crate::config::ClientConfig;
use crate::error::IngestError;

const GITHUB_JSON: &str = "application/vnd.github+json";
const GITHUB_RAW: &str = "application/vnd.github.raw+json";
const API_VERSION_HEADER: &str = "x-github-api-version";

#[derive(Debug, Deserialize)]
struct BranchEntry {
    name: String,
}

// Body of GET /repos/{owner}/{repo}/contents/{path}
//
// On success `content` holds base64 text. On failure GitHub sends
// `message` (and `status` on newer API versions) instead.
#[derive(Debug, Deserialize)]
struct ContentsBody {
    content: Option<String>,
    status: Option<serde_json::Value>,
    message: Option<String>,
}

/// Body of GET /repos/{owner}/{repo}/git/trees/{ref}
#[derive(Debug, Clone, Deserialize)]
pub struct TreeListing {
    pub tree: Vec<TreeEntry>,
    /// GitHub caps recursive listings; true means entries are missing
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    /// "blob", "tree" or "commit" (submodule)
    #[serde(rename = "type")]
    pub kind: String,
}

impl TreeEntry {
    pub fn is_file(&self) -> bool {
        self.kind == "blob"
    }
}

#[derive(Debug, Clone)]
pub struct GithubApi {
    client: Client,
    base: Url,
    per_page: u32,
}

impl GithubApi {
    // Builds the HTTP client once; reqwest pools connections internally,
    // so one GithubApi serves every request of a RepoClient
    pub fn new(config: &ClientConfig) -> Result<Self, IngestError> {
        let base = Url::parse(&config.api_base_url).map_err(|e| IngestError::Config {
            value: config.api_base_url.clone(),
            reason: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(IngestError::Config {
                value: config.api_base_url.clone(),
                reason: "URL cannot carry a path".to_string(),
            });
        }

        let api_version =
            HeaderValue::from_str(&config.api_version).map_err(|e| IngestError::Config {
                value: config.api_version.clone(),
                reason: e.to_string(),
            })?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_JSON));
        headers.insert(HeaderName::from_static(API_VERSION_HEADER), api_version);

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base,
            per_page: config.branches_per_page,
        })
    }

    // Appends path segments to the API root, percent-encoding each one
    //
    // Works for roots with a path prefix too, e.g.
    //   https://ghe.example.com/api/v3 + [repos, a, b] -> .../api/v3/repos/a/b
    pub fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn get(&self, url: Url, token: Option<&str>) -> RequestBuilder {
        let request = self.client.get(url);
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    // Checks that a token is accepted by the API
    //
    // /rate_limit answers anonymous requests too, but rejects a bad
    // Authorization header with 401, and does not count against the quota.
    pub async fn probe_token(&self, token: &str) -> Result<()> {
        let response = self
            .get(self.endpoint(["rate_limit"]), Some(token))
            .send()
            .await
            .context("token probe request failed")?;

        if !response.status().is_success() {
            bail!("token rejected: HTTP {}", response.status());
        }
        Ok(())
    }

    // Fetches one page of branch names
    pub async fn branches_page(
        &self,
        owner: &str,
        project: &str,
        page: u32,
        token: Option<&str>,
    ) -> Result<Vec<String>> {
        let url = self.endpoint(["repos", owner, project, "branches"]);
        let response = self
            .get(url, token)
            .query(&[("per_page", self.per_page), ("page", page)])
            .send()
            .await
            .with_context(|| format!("branches page {page} request failed"))?;

        if !response.status().is_success() {
            bail!("branches page {}: HTTP {}", page, response.status());
        }

        let entries: Vec<BranchEntry> = response
            .json()
            .await
            .with_context(|| format!("branches page {page} is not a JSON array"))?;

        Ok(entries.into_iter().map(|entry| entry.name).collect())
    }

    // Fetches a file through the contents endpoint and decodes it
    //
    // `branch` of None lets GitHub pick the default branch.
    pub async fn file_contents(
        &self,
        owner: &str,
        project: &str,
        path: &str,
        branch: Option<&str>,
        token: Option<&str>,
    ) -> Result<String> {
        let url = self.endpoint(contents_segments(owner, project, path));
        let mut request = self.get(url, token);
        if let Some(branch) = branch {
            request = request.query(&[("ref", branch)]);
        }

        let response = request.send().await.context("contents request failed")?;
        let status = response.status();
        let body: ContentsBody = response
            .json()
            .await
            .with_context(|| format!("HTTP {status}: body is not a JSON object"))?;

        if body.status.is_some() || !status.is_success() {
            let message = body.message.unwrap_or_else(|| "no message".to_string());
            bail!("HTTP {}: {}", status, message);
        }

        let content = body
            .content
            .ok_or_else(|| anyhow!("response has no content field"))?;
        decode_content(&content)
    }

    // Lists the files of a branch
    //
    // Without `recursive` only the top-level entries come back.
    pub async fn tree(
        &self,
        owner: &str,
        project: &str,
        branch: &str,
        recursive: bool,
        token: Option<&str>,
    ) -> Result<TreeListing> {
        let mut segments = vec!["repos", owner, project, "git", "trees"];
        segments.extend(branch.split('/'));

        let mut request = self.get(self.endpoint(segments), token);
        if recursive {
            request = request.query(&[("recursive", "1")]);
        }

        let response = request.send().await.context("tree request failed")?;
        if !response.status().is_success() {
            bail!("tree of '{}': HTTP {}", branch, response.status());
        }

        response
            .json()
            .await
            .with_context(|| format!("tree of '{branch}' could not be decoded"))
    }

    // Downloads the raw bytes of a file
    pub async fn raw_file(
        &self,
        owner: &str,
        project: &str,
        path: &str,
        branch: &str,
        token: Option<&str>,
    ) -> Result<Vec<u8>> {
        let url = self.endpoint(contents_segments(owner, project, path));
        let response = self
            .get(url, token)
            .header(ACCEPT, GITHUB_RAW)
            .query(&[("ref", branch)])
            .send()
            .await
            .with_context(|| format!("download of {path} failed"))?;

        if !response.status().is_success() {
            bail!("download of {}: HTTP {}", path, response.status());
        }

        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("download of {path} was interrupted"))?;
        Ok(bytes.to_vec())
    }
}

fn contents_segments<'a>(owner: &'a str, project: &'a str, path: &'a str) -> Vec<&'a str> {
    let mut segments = vec!["repos", owner, project, "contents"];
    segments.extend(path.split('/').filter(|s| !s.is_empty()));
    segments
}

// Decodes the base64 `content` field
//
// GitHub wraps the payload at 60 columns, so whitespace is dropped first.
pub fn decode_content(encoded: &str) -> Result<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .context("content is not valid base64")?;
    String::from_utf8(bytes).context("content is not UTF-8 text")
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why default_headers instead of adding headers per request?
//    - Accept and X-GitHub-Api-Version never change for a client
//    - A per-request .header() call still overrides them (raw_file does)
//
// 2. Why bearer_auth only in get()?
//    - The token can be cleared at runtime by the client
//    - Passing it per call means a dropped token is never sent again
//
// 3. What is `impl IntoIterator<Item = &'a str>`?
//    - endpoint() accepts arrays, Vecs or iterator chains alike
//    - The lifetime 'a ties the borrowed segments to the call
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base: &str) -> GithubApi {
        GithubApi::new(&ClientConfig::default().with_api_base_url(base)).unwrap()
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let url = api("https://api.github.com").endpoint(["repos", "acme", "widgets", "branches"]);
        assert_eq!(url.as_str(), "https://api.github.com/repos/acme/widgets/branches");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let url = api("https://ghe.example.com/api/v3/").endpoint(["rate_limit"]);
        assert_eq!(url.as_str(), "https://ghe.example.com/api/v3/rate_limit");
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let url = api("https://api.github.com").endpoint(contents_segments(
            "acme",
            "widgets",
            "docs/read me.md",
        ));
        assert_eq!(
            url.as_str(),
            "https://api.github.com/repos/acme/widgets/contents/docs/read%20me.md"
        );
    }

    #[test]
    fn test_invalid_base_url_is_a_config_error() {
        let config = ClientConfig::default().with_api_base_url("not a url");
        assert!(matches!(
            GithubApi::new(&config),
            Err(IngestError::Config { .. })
        ));

        let config = ClientConfig::default().with_api_base_url("mailto:someone@example.com");
        assert!(matches!(
            GithubApi::new(&config),
            Err(IngestError::Config { .. })
        ));
    }

    #[test]
    fn test_decode_content_with_line_breaks() {
        // "hello, world\n" wrapped the way GitHub wraps it
        let decoded = decode_content("aGVsbG8s\nIHdvcmxk\nCg==\n").unwrap();
        assert_eq!(decoded, "hello, world\n");
    }

    #[test]
    fn test_decode_content_rejects_garbage() {
        assert!(decode_content("!!not base64!!").is_err());
        // Valid base64 of bytes that are not UTF-8
        assert!(decode_content("/w==").is_err());
    }

    #[test]
    fn test_tree_entry_kinds() {
        let listing: TreeListing = serde_json::from_str(
            r#"{"sha":"abc","tree":[
                {"path":"README.md","type":"blob","mode":"100644"},
                {"path":"src","type":"tree","mode":"040000"}
            ]}"#,
        )
        .unwrap();
        assert!(!listing.truncated);
        assert!(listing.tree[0].is_file());
        assert!(!listing.tree[1].is_file());
    }
}
