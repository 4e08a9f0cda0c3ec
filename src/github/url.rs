// src/github/url.rs
// =============================================================================
// Repository URL handling: normalization and owner/project extraction.
//
// Supported input:
//   - https://github.com/owner/repo
//   - https://github.com/owner/repo.git
//   - https://github.com/owner/repo/tree/main/src   (extra segments ignored)
//
// Normalization is best-effort and never fails; validation is strict and
// reports why a URL was rejected so the caller can log it.
//
// Rust concepts:
// - Option and Result: For values that may be missing or invalid
// - url::Url: A real URL parser instead of string slicing
// =============================================================================

use thiserror::Error;
use tracing::warn;
use url::Url;

/// Why a repository URL was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("not an absolute URL: {0}")]
    Unparseable(String),
    #[error("host '{found}' is not {expected}")]
    WrongHost { found: String, expected: String },
    #[error("URL path must contain an owner and a repository name")]
    MissingSegments,
}

/// The owner/project pair a repository URL points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoUrl {
    pub owner: String,
    pub project: String,
}

impl RepoUrl {
    // Extracts owner and project from an (already normalized) URL
    //
    // Only the first two path segments count, and both must be non-empty:
    //   "https://github.com/acme/widgets/tree/dev" -> ("acme", "widgets")
    //   "https://github.com/acme"                  -> MissingSegments
    //   "https://github.com//widgets"              -> MissingSegments
    pub fn parse(url: &str, expected_host: &str) -> Result<RepoUrl, UrlError> {
        let parsed = Url::parse(url).map_err(|e| UrlError::Unparseable(e.to_string()))?;

        let host = parsed.host_str().unwrap_or_default();
        if host != expected_host {
            return Err(UrlError::WrongHost {
                found: host.to_string(),
                expected: expected_host.to_string(),
            });
        }

        let mut segments = parsed.path_segments().ok_or(UrlError::MissingSegments)?;
        let owner = segments
            .next()
            .filter(|s| !s.is_empty())
            .ok_or(UrlError::MissingSegments)?;
        let project = segments
            .next()
            .filter(|s| !s.is_empty())
            .ok_or(UrlError::MissingSegments)?;

        Ok(RepoUrl {
            owner: owner.to_string(),
            project: project.to_string(),
        })
    }
}

// Normalizes a repository URL
//
// Parses the input as an absolute URL and drops a trailing ".git" from the
// path (exactly those four characters). Query and fragment are kept.
// If the input does not parse it comes back unchanged; validation will
// reject it later.
pub fn normalize_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) => {
            if let Some(stripped) = url.path().strip_suffix(".git") {
                let stripped = stripped.to_string();
                url.set_path(&stripped);
            }
            url.to_string()
        }
        Err(e) => {
            warn!(url = raw, error = %e, "could not normalize repository URL");
            raw.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_git_suffix() {
        assert_eq!(
            normalize_url("https://github.com/acme/widgets.git"),
            "https://github.com/acme/widgets"
        );
    }

    #[test]
    fn test_normalize_only_strips_trailing_suffix() {
        // ".git" in the middle of a name is left alone
        assert_eq!(
            normalize_url("https://github.com/acme/widgets.github.io"),
            "https://github.com/acme/widgets.github.io"
        );
        // Only one suffix is removed
        assert_eq!(
            normalize_url("https://github.com/acme/widgets.git.git"),
            "https://github.com/acme/widgets.git"
        );
    }

    #[test]
    fn test_normalize_keeps_unparseable_input() {
        assert_eq!(normalize_url("github.com/acme/widgets.git"), "github.com/acme/widgets.git");
        assert_eq!(normalize_url(""), "");
    }

    #[test]
    fn test_parse_github_url() {
        let repo = RepoUrl::parse("https://github.com/rust-lang/rust", "github.com").unwrap();
        assert_eq!(repo.owner, "rust-lang");
        assert_eq!(repo.project, "rust");
    }

    #[test]
    fn test_parse_ignores_extra_segments() {
        let repo =
            RepoUrl::parse("https://github.com/acme/widgets/tree/main/src", "github.com").unwrap();
        assert_eq!(repo.owner, "acme");
        assert_eq!(repo.project, "widgets");
    }

    #[test]
    fn test_parse_rejects_other_hosts() {
        let result = RepoUrl::parse("https://gitlab.com/user/repo", "github.com");
        assert!(matches!(result, Err(UrlError::WrongHost { .. })));

        // Subdomains are a different host too
        let result = RepoUrl::parse("https://www.github.com/user/repo", "github.com");
        assert!(matches!(result, Err(UrlError::WrongHost { .. })));
    }

    #[test]
    fn test_parse_requires_two_segments() {
        for url in [
            "https://github.com",
            "https://github.com/",
            "https://github.com/acme",
            "https://github.com/acme/",
            "https://github.com//widgets",
        ] {
            assert_eq!(
                RepoUrl::parse(url, "github.com"),
                Err(UrlError::MissingSegments),
                "{url} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_rejects_relative_urls() {
        let result = RepoUrl::parse("acme/widgets", "github.com");
        assert!(matches!(result, Err(UrlError::Unparseable(_))));
    }
}
