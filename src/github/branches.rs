// src/github/branches.rs
// =============================================================================
// Branch ordering and default-branch selection.
//
// The network side (paging through the branches endpoint) lives in
// client.rs. This file only holds the pure rules applied to the names that
// came back, so they can be tested without a server.
// =============================================================================

use std::collections::{HashSet, VecDeque};

/// Branch names that are moved to the front of every listing
pub const PREFERRED_BRANCHES: [&str; 2] = ["main", "master"];

/// Picked when a repository has "main"
pub const DEFAULT_BRANCH: &str = "main";

/// Picked otherwise, even if it was never observed
pub const FALLBACK_BRANCH: &str = "master";

/// Result of paging through the branches endpoint
///
/// `halted_at` is set when a page request failed: the names collected
/// before it are still usable, the listing is just incomplete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchPages {
    pub names: Vec<String>,
    pub halted_at: Option<u32>,
}

// Deduplicates names (first occurrence wins) and moves "main"/"master"
// to the front
//
// Each preferred name is pushed onto the head of the list when it is met,
// so of the two the one seen last ends up first:
//   [feature-a, master, feature-b, main, master] -> [main, master, feature-a, feature-b]
pub fn order_branches(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ordered = VecDeque::new();

    for name in names {
        if !seen.insert(name.clone()) {
            continue;
        }
        if PREFERRED_BRANCHES.contains(&name.as_str()) {
            ordered.push_front(name);
        } else {
            ordered.push_back(name);
        }
    }

    ordered.into()
}

// Chooses the branch to read
//
// A requested branch survives only if discovery saw it.
pub fn pick_branch(requested: Option<&str>, known: &[String]) -> String {
    if let Some(requested) = requested {
        if known.iter().any(|b| b == requested) {
            return requested.to_string();
        }
    }

    if known.iter().any(|b| b == DEFAULT_BRANCH) {
        DEFAULT_BRANCH.to_string()
    } else {
        FALLBACK_BRANCH.to_string()
    }
}
