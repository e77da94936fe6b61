//! Data models for changelog aggregation.
//!
//! This module defines the classified views derived from merge requests:
//! - `ChangeLogEntry` - one merged MR, classified for rendering
//! - `ProjectChangelog` - a project and its ordered entries
//! - `IssueNode` - a node in the hierarchical milestone wiki tree
//!
//! Classification is a pure function of an immutable label snapshot,
//! evaluated by explicit ordered rules (first match wins); nothing here
//! talks to the network.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::forge::types::MergeRequest;

/// What kind of changelog item is this?
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Feature,
    Bug,
    Misc,
}

impl Kind {
    /// Section heading used by every Markdown rendering.
    pub fn heading(self) -> &'static str {
        match self {
            Kind::Feature => "New features",
            Kind::Bug => "Bug fixes",
            Kind::Misc => "Misc changes",
        }
    }
}

/// Should this entry be visible to the outside or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exposed {
    External,
    Internal,
}

/// One merged MR, classified for rendering.
///
/// Immutable value; `kind` and `exposed` are derived lazily from the
/// label snapshot, so re-classification after a label edit needs no
/// re-fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeLogEntry {
    /// Fully qualified reference, e.g. "group/project!123"
    pub slug: String,
    /// MR title
    pub text: String,
    pub web_url: String,
    pub labels: Vec<String>,
}

impl ChangeLogEntry {
    /// Classify a merge request. Pure; no side effects.
    pub fn from_mr(mr: &MergeRequest) -> Self {
        Self {
            slug: mr.references.full.clone(),
            text: mr.title.clone(),
            web_url: mr.web_url.clone(),
            labels: mr.labels.clone(),
        }
    }

    /// First match wins: Feature beats Bug beats everything else.
    pub fn kind(&self) -> Kind {
        if self.labels.iter().any(|l| l == "Feature") {
            return Kind::Feature;
        }
        if self.labels.iter().any(|l| l == "Bug") {
            return Kind::Bug;
        }
        Kind::Misc
    }

    /// Any case-insensitive "internal" label forces Internal.
    pub fn exposed(&self) -> Exposed {
        if self.labels.iter().any(|l| l.eq_ignore_ascii_case("internal")) {
            return Exposed::Internal;
        }
        Exposed::External
    }

    fn sort_key(&self) -> (Kind, Exposed, &str, &str) {
        (self.kind(), self.exposed(), &self.text, &self.slug)
    }
}

/// Total order by (kind, exposed, text, slug) for deterministic rendering.
impl Ord for ChangeLogEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for ChangeLogEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A project and its ordered changelog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectChangelog {
    /// Project display name ("group/project")
    pub name: String,
    pub changes: Vec<ChangeLogEntry>,
}

impl ProjectChangelog {
    /// Everything, internal included.
    pub fn internal(&self) -> Vec<&ChangeLogEntry> {
        self.changes.iter().collect()
    }

    /// Only externally visible entries.
    pub fn external(&self) -> Vec<&ChangeLogEntry> {
        self.changes
            .iter()
            .filter(|c| c.exposed() == Exposed::External)
            .collect()
    }
}

/// A node in the hierarchical issue tree rendered into the milestone wiki.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueNode {
    pub id: u64,
    pub title: String,
    /// Forge reference, e.g. "group/project#42"
    pub reference: String,
    pub web_url: String,
    /// "opened" or "closed"
    pub state: String,
    /// (completed, total) subtask counters when the issue has any
    pub progress: Option<(u32, u32)>,
    pub children: Vec<IssueNode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(slug: &str, text: &str, labels: &[&str]) -> ChangeLogEntry {
        ChangeLogEntry {
            slug: slug.to_string(),
            text: text.to_string(),
            web_url: String::new(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
        }
    }

    #[test]
    fn test_kind_feature_wins_over_bug() {
        let e = entry("p!1", "x", &["Bug", "Feature", "other"]);
        assert_eq!(e.kind(), Kind::Feature);
    }

    #[test]
    fn test_kind_bug_without_feature() {
        let e = entry("p!1", "x", &["Bug", "backend"]);
        assert_eq!(e.kind(), Kind::Bug);
    }

    #[test]
    fn test_kind_defaults_to_misc() {
        let e = entry("p!1", "x", &["backend"]);
        assert_eq!(e.kind(), Kind::Misc);
        assert_eq!(entry("p!1", "x", &[]).kind(), Kind::Misc);
    }

    #[test]
    fn test_exposed_case_insensitive_internal() {
        for label in ["internal", "Internal", "INTERNAL"] {
            let e = entry("p!1", "x", &["Feature", label]);
            assert_eq!(e.exposed(), Exposed::Internal, "label {label}");
        }
        assert_eq!(entry("p!1", "x", &["Feature"]).exposed(), Exposed::External);
    }

    #[test]
    fn test_ordering_groups_by_kind_then_slug() {
        let mut entries = vec![
            entry("p!4", "misc change", &[]),
            entry("p!3", "a feature", &["Feature"]),
            entry("p!2", "a bug", &["Bug"]),
            entry("p!1", "b feature", &["Feature"]),
        ];
        entries.sort();
        let kinds: Vec<Kind> = entries.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, [Kind::Feature, Kind::Feature, Kind::Bug, Kind::Misc]);
        // within the Feature block: ordered by text, then slug
        assert_eq!(entries[0].slug, "p!3");
        assert_eq!(entries[1].slug, "p!1");
    }

    #[test]
    fn test_ordering_internal_sorts_after_external_within_kind() {
        let mut entries = vec![
            entry("p!1", "a", &["Feature", "internal"]),
            entry("p!2", "b", &["Feature"]),
        ];
        entries.sort();
        assert_eq!(entries[0].slug, "p!2");
    }

    #[test]
    fn test_external_view_filters_internal() {
        let pcl = ProjectChangelog {
            name: "grp/proj".to_string(),
            changes: vec![
                entry("p!1", "a", &["Feature"]),
                entry("p!2", "b", &["internal"]),
            ],
        };
        assert_eq!(pcl.external().len(), 1);
        assert_eq!(pcl.internal().len(), 2);
    }
}
