//! Remote project store abstraction.
//!
//! The forge owns the canonical state of every entity this tool touches;
//! nagger only computes desired state and submits mutations. `Forge` is
//! the seam between the engines/sinks and the network: production code
//! uses the [`gitlab::GitLab`] client, unit tests use an in-memory fake.

pub mod gitlab;
pub mod types;

use crate::Result;
use types::{
    AwardEmoji, Branch, Commit, Issue, MergeRequest, Milestone, Note, Project, ProjectId, Release,
    RepoFile, Tag, User, WikiPage,
};

/// Operations consumed from the remote project store.
///
/// Every method is one blocking round-trip that can fail or return stale
/// data. Lookups that treat "absent" as a normal branch return `Option`;
/// the rest surface `Error::NotFound` or `Error::Status`.
pub trait Forge {
    /// The account the API token authenticates as (the bot).
    fn current_user(&self) -> Result<User>;

    fn project(&self, id: ProjectId) -> Result<Project>;
    fn project_by_path(&self, path: &str) -> Result<Project>;

    /// Milestones of a group, optionally filtered by state ("active").
    fn group_milestones(&self, group: &str, state: Option<&str>) -> Result<Vec<Milestone>>;
    fn milestone_merge_requests(&self, group: &str, milestone_id: u64)
        -> Result<Vec<MergeRequest>>;
    fn milestone_issues(&self, group: &str, milestone_id: u64) -> Result<Vec<Issue>>;

    fn group_merge_requests(&self, group: &str, state: &str) -> Result<Vec<MergeRequest>>;
    fn project_merge_requests(&self, project: ProjectId, state: &str) -> Result<Vec<MergeRequest>>;
    fn merge_request(&self, project: ProjectId, iid: u64) -> Result<MergeRequest>;
    fn create_merge_request(
        &self,
        project: ProjectId,
        title: &str,
        source: &str,
        target: &str,
    ) -> Result<MergeRequest>;
    fn set_merge_request_title(&self, project: ProjectId, iid: u64, title: &str) -> Result<()>;
    fn set_merge_request_labels(
        &self,
        project: ProjectId,
        iid: u64,
        labels: &[String],
    ) -> Result<()>;
    fn set_merge_request_milestone(
        &self,
        project: ProjectId,
        iid: u64,
        milestone_id: u64,
    ) -> Result<()>;

    fn set_issue_milestone(&self, project: ProjectId, iid: u64, milestone_id: u64) -> Result<()>;
    /// Issues linked to the given issue ("linked issue" relations).
    fn issue_links(&self, project: ProjectId, iid: u64) -> Result<Vec<Issue>>;

    fn merge_request_notes(&self, project: ProjectId, iid: u64) -> Result<Vec<Note>>;
    fn create_merge_request_note(&self, project: ProjectId, iid: u64, body: &str) -> Result<Note>;
    fn update_merge_request_note(
        &self,
        project: ProjectId,
        iid: u64,
        note_id: u64,
        body: &str,
    ) -> Result<()>;
    fn delete_merge_request_note(&self, project: ProjectId, iid: u64, note_id: u64) -> Result<()>;

    fn merge_request_awards(&self, project: ProjectId, iid: u64) -> Result<Vec<AwardEmoji>>;
    fn create_merge_request_award(&self, project: ProjectId, iid: u64, name: &str) -> Result<()>;
    fn delete_merge_request_award(&self, project: ProjectId, iid: u64, award_id: u64)
        -> Result<()>;
    fn note_awards(&self, project: ProjectId, iid: u64, note_id: u64) -> Result<Vec<AwardEmoji>>;
    fn create_note_award(
        &self,
        project: ProjectId,
        iid: u64,
        note_id: u64,
        name: &str,
    ) -> Result<()>;

    fn commit(&self, project: ProjectId, sha: &str) -> Result<Commit>;
    /// Merge requests associated with a commit, open or not.
    fn commit_merge_requests(&self, project: ProjectId, sha: &str) -> Result<Vec<MergeRequest>>;

    fn tag(&self, project: ProjectId, name: &str) -> Result<Tag>;
    fn create_tag(
        &self,
        project: ProjectId,
        name: &str,
        ref_name: &str,
        message: &str,
    ) -> Result<Tag>;
    /// Release lookup; absent is a normal branch, not an error.
    fn release(&self, project: ProjectId, tag: &str) -> Result<Option<Release>>;
    fn create_release(
        &self,
        project: ProjectId,
        tag: &str,
        name: &str,
        description: &str,
    ) -> Result<Release>;

    fn wiki_pages(&self, project: ProjectId) -> Result<Vec<WikiPage>>;
    fn create_wiki_page(&self, project: ProjectId, title: &str, content: &str) -> Result<()>;
    fn update_wiki_page(&self, project: ProjectId, slug: &str, content: &str) -> Result<()>;

    fn branches(&self, project: ProjectId) -> Result<Vec<Branch>>;
    fn create_branch(&self, project: ProjectId, name: &str, ref_name: &str) -> Result<Branch>;
    /// Repository file lookup on a ref; absent is a normal branch.
    fn file(&self, project: ProjectId, path: &str, ref_name: &str) -> Result<Option<RepoFile>>;
    fn create_file(
        &self,
        project: ProjectId,
        path: &str,
        branch: &str,
        content: &str,
        message: &str,
    ) -> Result<()>;
    fn update_file(
        &self,
        project: ProjectId,
        path: &str,
        branch: &str,
        content: &str,
        message: &str,
    ) -> Result<()>;
}
