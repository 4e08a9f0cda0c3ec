// src/loader/tree.rs
// =============================================================================
// Default recursive loader, built on the git trees API.
//
// How it works:
// 1. List the branch tree (one request, recursive only when asked)
// 2. Keep files ("blob" entries) that no ignore pattern matches
// 3. Download them with a bounded number of requests in flight
// 4. Turn each UTF-8 file into a Document; apply the unknown file type
//    policy to everything else
//
// Any failing request fails the whole load. The client passes that error
// straight through to its caller.
//
// Rust concepts:
// - Streams: stream::iter + buffered() for bounded concurrency
// - TryStreamExt: try_collect stops at the first error
// =============================================================================

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use tracing::{debug, info, warn};

use super::{Document, DocumentMetadata, LoaderOptions, RecursiveLoader, UnknownFileTypePolicy};
use crate::github::api::GithubApi;
use crate::github::url::RepoUrl;

pub struct GithubTreeLoader {
    api: GithubApi,
    web_host: String,
}

impl GithubTreeLoader {
    pub fn new(api: GithubApi, web_host: impl Into<String>) -> Self {
        Self {
            api,
            web_host: web_host.into(),
        }
    }
}

#[async_trait]
impl RecursiveLoader for GithubTreeLoader {
    async fn load(&self, options: &LoaderOptions) -> Result<Vec<Document>> {
        let repo = RepoUrl::parse(&options.repository_url, &self.web_host)
            .map_err(|e| anyhow!("cannot load {}: {}", options.repository_url, e))?;
        let token = options.access_token.as_deref();

        let listing = self
            .api
            .tree(&repo.owner, &repo.project, &options.branch, options.recursive, token)
            .await?;
        if listing.truncated {
            warn!(
                repository = %options.repository_url,
                branch = %options.branch,
                "tree listing was truncated by the API, some files will be missing"
            );
        }

        let files: Vec<String> = {
            let matcher = build_ignore_matcher(&options.ignore_paths)?;
            listing
                .tree
                .into_iter()
                .filter(|entry| entry.is_file())
                .filter(|entry| {
                    let ignored = is_ignored(&matcher, &entry.path);
                    if ignored {
                        debug!(path = %entry.path, "skipping ignored path");
                    }
                    !ignored
                })
                .map(|entry| entry.path)
                .collect()
        };

        info!(
            files = files.len(),
            recursive = options.recursive,
            max_concurrency = options.max_concurrency,
            "downloading repository files"
        );

        // buffered() (not buffer_unordered) keeps documents in tree order
        let downloads = files.into_iter().map(|path| {
            let api = &self.api;
            let repo = &repo;
            async move {
                let bytes = api
                    .raw_file(&repo.owner, &repo.project, &path, &options.branch, token)
                    .await?;
                Ok::<_, anyhow::Error>((path, bytes))
            }
        });
        let downloaded: Vec<(String, Vec<u8>)> = stream::iter(downloads)
            .buffered(options.max_concurrency.max(1))
            .try_collect()
            .await?;

        let mut documents = Vec::with_capacity(downloaded.len());
        for (path, bytes) in downloaded {
            match String::from_utf8(bytes) {
                Ok(page_content) => documents.push(Document {
                    page_content,
                    metadata: DocumentMetadata {
                        source: path,
                        repository: options.repository_url.clone(),
                        branch: options.branch.clone(),
                    },
                }),
                Err(_) => match options.unknown_file_type {
                    UnknownFileTypePolicy::Warn => {
                        warn!(path = %path, "skipping file with unknown (non-text) type");
                    }
                    UnknownFileTypePolicy::Ignore => {}
                    UnknownFileTypePolicy::Error => {
                        bail!("unknown file type: {}", path);
                    }
                },
            }
        }

        Ok(documents)
    }
}

fn build_ignore_matcher(patterns: &[String]) -> Result<Gitignore> {
    let mut builder = GitignoreBuilder::new("");
    for pattern in patterns {
        builder
            .add_line(None, pattern)
            .with_context(|| format!("invalid ignore pattern '{pattern}'"))?;
    }
    builder.build().context("could not build ignore matcher")
}

// A file is ignored when it or any of its parent directories matches
fn is_ignored(matcher: &Gitignore, path: &str) -> bool {
    matcher.matched_path_or_any_parents(path, false).is_ignore()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use mockito::{Matcher, Server};

    fn options(recursive: bool, policy: UnknownFileTypePolicy) -> LoaderOptions {
        LoaderOptions {
            repository_url: "https://github.com/acme/widgets".to_string(),
            branch: "main".to_string(),
            recursive,
            max_concurrency: 2,
            ignore_paths: vec!["*.lock".to_string(), "vendor/".to_string()],
            access_token: None,
            unknown_file_type: policy,
        }
    }

    fn loader(server: &Server) -> GithubTreeLoader {
        let config = ClientConfig::default().with_api_base_url(server.url());
        GithubTreeLoader::new(GithubApi::new(&config).unwrap(), "github.com")
    }

    const TREE: &str = r#"{"sha":"abc","truncated":false,"tree":[
        {"path":"README.md","type":"blob"},
        {"path":"Cargo.lock","type":"blob"},
        {"path":"src","type":"tree"},
        {"path":"src/lib.rs","type":"blob"},
        {"path":"vendor/dep.rs","type":"blob"},
        {"path":"logo.png","type":"blob"}
    ]}"#;

    async fn mock_file(server: &mut Server, path: &str, body: &[u8]) -> mockito::Mock {
        server
            .mock("GET", format!("/repos/acme/widgets/contents/{path}").as_str())
            .match_query(Matcher::UrlEncoded("ref".into(), "main".into()))
            .with_status(200)
            .with_body(body)
            .create_async()
            .await
    }

    #[test]
    fn test_ignore_patterns() {
        let matcher = build_ignore_matcher(&[
            "*.lock".to_string(),
            "vendor/".to_string(),
            "docs/internal".to_string(),
        ])
        .unwrap();

        assert!(is_ignored(&matcher, "Cargo.lock"));
        assert!(is_ignored(&matcher, "nested/yarn.lock"));
        assert!(is_ignored(&matcher, "vendor/dep.rs"));
        assert!(is_ignored(&matcher, "docs/internal/notes.md"));
        assert!(!is_ignored(&matcher, "docs/guide.md"));
        assert!(!is_ignored(&matcher, "src/lib.rs"));
    }

    #[test]
    fn test_no_patterns_ignore_nothing() {
        let matcher = build_ignore_matcher(&[]).unwrap();
        assert!(!is_ignored(&matcher, "anything/at/all.txt"));
    }

    #[tokio::test]
    async fn test_loads_text_files_in_tree_order() {
        let mut server = Server::new_async().await;
        let _tree = server
            .mock("GET", "/repos/acme/widgets/git/trees/main")
            .match_query(Matcher::UrlEncoded("recursive".into(), "1".into()))
            .with_status(200)
            .with_body(TREE)
            .create_async()
            .await;
        let _readme = mock_file(&mut server, "README.md", b"# Widgets").await;
        let _lib = mock_file(&mut server, "src/lib.rs", b"pub fn widget() {}").await;
        let _png = mock_file(&mut server, "logo.png", &[0x89, 0x50, 0xff, 0xfe]).await;

        let documents = loader(&server)
            .load(&options(true, UnknownFileTypePolicy::Warn))
            .await
            .unwrap();

        let sources: Vec<&str> = documents.iter().map(|d| d.metadata.source.as_str()).collect();
        assert_eq!(sources, vec!["README.md", "src/lib.rs"]);
        assert_eq!(documents[0].page_content, "# Widgets");
        assert_eq!(documents[1].metadata.branch, "main");
        assert_eq!(
            documents[1].metadata.repository,
            "https://github.com/acme/widgets"
        );
    }

    #[tokio::test]
    async fn test_unknown_file_type_can_fail_the_load() {
        let mut server = Server::new_async().await;
        let _tree = server
            .mock("GET", "/repos/acme/widgets/git/trees/main")
            .with_status(200)
            .with_body(r#"{"tree":[{"path":"logo.png","type":"blob"}]}"#)
            .create_async()
            .await;
        let _png = mock_file(&mut server, "logo.png", &[0xff, 0xfe]).await;

        let result = loader(&server)
            .load(&options(false, UnknownFileTypePolicy::Error))
            .await;
        let err = result.unwrap_err();
        assert!(err.to_string().contains("logo.png"));
    }

    #[tokio::test]
    async fn test_non_recursive_listing_omits_query() {
        // Without match_query the path must match with no query string at all
        let mut server = Server::new_async().await;
        let tree = server
            .mock("GET", "/repos/acme/widgets/git/trees/main")
            .with_status(200)
            .with_body(r#"{"tree":[{"path":"README.md","type":"blob"}]}"#)
            .create_async()
            .await;
        let _readme = mock_file(&mut server, "README.md", b"hi").await;

        let documents = loader(&server)
            .load(&options(false, UnknownFileTypePolicy::Warn))
            .await
            .unwrap();
        assert_eq!(documents.len(), 1);
        tree.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_download_fails_the_load() {
        let mut server = Server::new_async().await;
        let _tree = server
            .mock("GET", "/repos/acme/widgets/git/trees/main")
            .with_status(200)
            .with_body(r#"{"tree":[{"path":"README.md","type":"blob"}]}"#)
            .create_async()
            .await;
        let _readme = server
            .mock("GET", "/repos/acme/widgets/contents/README.md")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let result = loader(&server)
            .load(&options(false, UnknownFileTypePolicy::Warn))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_missing_branch_fails_the_load() {
        let mut server = Server::new_async().await;
        let _tree = server
            .mock("GET", "/repos/acme/widgets/git/trees/main")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"message":"Not Found"}"#)
            .create_async()
            .await;

        let result = loader(&server)
            .load(&options(true, UnknownFileTypePolicy::Warn))
            .await;
        assert!(result.unwrap_err().to_string().contains("404"));
    }
}
