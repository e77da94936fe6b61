//! Wire types for forge entities.
//!
//! Each struct deserializes only the fields this tool cares about; the
//! forge returns far more. All entities are transient views materialized
//! per invocation; the forge owns the canonical state.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Numeric project identifier.
pub type ProjectId = u64;

/// An account on the forge (the bot itself, or an MR author).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    /// Display name, used when rendering article front matter
    #[serde(default)]
    pub name: Option<String>,
}

/// A project hosted on the forge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    /// Full "group/project" slug, the display name used everywhere
    pub path_with_namespace: String,
    #[serde(default)]
    pub web_url: Option<String>,
}

/// Cross-reference slugs the forge computes for an entity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct References {
    /// Fully qualified reference, e.g. "group/project!123"
    #[serde(default)]
    pub full: String,
}

/// A merge request with the review metadata the bot reconciles.
///
/// Invariant (forge-enforced): exactly one milestone or none.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeRequest {
    pub id: u64,
    /// Project-scoped id, used in every REST route
    pub iid: u64,
    pub project_id: ProjectId,
    pub title: String,
    /// "opened", "merged" or "closed"
    pub state: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub milestone: Option<Milestone>,
    pub author: User,
    /// Draft flag; older deployments call this work_in_progress
    #[serde(default, alias = "work_in_progress")]
    pub draft: bool,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub web_url: String,
    #[serde(default)]
    pub references: References,
    #[serde(default)]
    pub source_branch: Option<String>,
}

impl MergeRequest {
    /// Whether this MR has been merged.
    pub fn is_merged(&self) -> bool {
        self.state == "merged"
    }
}

/// A comment on a merge request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: u64,
    pub body: String,
    pub author: User,
}

/// A named reaction attached by a specific account.
///
/// Used as a machine-readable status flag on MRs and notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwardEmoji {
    pub id: u64,
    pub name: String,
    pub user: User,
}

/// A milestone: a named, dated grouping of MRs and issues.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    pub id: u64,
    pub title: String,
    /// "active" or "closed"
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub web_url: Option<String>,
}

/// Subtask completion counters the forge tracks per issue description.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskCompletion {
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub completed_count: u32,
}

/// An issue, as consumed by the milestone wiki tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: u64,
    pub iid: u64,
    pub project_id: ProjectId,
    pub title: String,
    /// "opened" or "closed"
    pub state: String,
    #[serde(default)]
    pub web_url: String,
    #[serde(default)]
    pub references: References,
    #[serde(default)]
    pub task_completion_status: Option<TaskCompletion>,
}

/// A commit, reduced to its identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    pub id: String,
}

/// A git tag with its annotation message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default)]
    pub message: Option<String>,
    /// Object id the tag points at
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub commit: Option<Commit>,
}

/// A release object attached to a tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A wiki page. `content` is only populated on single-page fetches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikiPage {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
}

/// A repository branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    pub name: String,
}

/// A file in a repository tree, reduced to its path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoFile {
    pub file_path: String,
}
