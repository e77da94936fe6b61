//! Milestone overview wiki page.
//!
//! Expands the milestone's issues through their "linked issue" relations
//! into a tree and renders it (with a dependency diagram) into the wiki
//! project. The walk tracks visited (project id, issue iid) pairs and
//! terminates on revisit, so link cycles cannot recurse forever.

use std::collections::HashSet;

use tracing::info_span;

use crate::config::Config;
use crate::forge::types::{Issue, ProjectId};
use crate::forge::Forge;
use crate::models::IssueNode;
use crate::{aggregate, ensure, render, Result};

/// Upsert the `Milestone-<name>` page in the wiki project.
pub fn milestone_wiki(
    forge: &dyn Forge,
    config: &Config,
    milestone: Option<String>,
    dry_run: bool,
) -> Result<()> {
    let name = super::resolve_milestone(forge, &config.group, milestone)?;
    let span = info_span!("milestone_wiki", project = %config.wiki_project, milestone = %name);
    let _guard = span.enter();

    let milestone = aggregate::get_milestone(forge, &config.group, &name)?;
    let issues = forge.milestone_issues(&config.group, milestone.id)?;

    let mut visited: HashSet<(ProjectId, u64)> = HashSet::new();
    let mut tree = Vec::new();
    for issue in &issues {
        if let Some(node) = build_node(forge, issue, &mut visited)? {
            tree.push(node);
        }
    }

    let content = render::milestone_wiki_page(&milestone, &tree);
    let title = format!("Milestone-{name}");
    let project = forge.project_by_path(&config.wiki_project)?;
    ensure::upsert_wiki_page(forge, &project, &title, &content, dry_run)
}

/// Recursive expansion of linked issues. Returns `None` for an issue
/// already placed elsewhere in the tree.
fn build_node(
    forge: &dyn Forge,
    issue: &Issue,
    visited: &mut HashSet<(ProjectId, u64)>,
) -> Result<Option<IssueNode>> {
    if !visited.insert((issue.project_id, issue.iid)) {
        return Ok(None);
    }

    let mut children = Vec::new();
    for linked in forge.issue_links(issue.project_id, issue.iid)? {
        if let Some(child) = build_node(forge, &linked, visited)? {
            children.push(child);
        }
    }

    Ok(Some(IssueNode {
        id: issue.id,
        title: issue.title.clone(),
        reference: issue.references.full.clone(),
        web_url: issue.web_url.clone(),
        state: issue.state.clone(),
        progress: issue
            .task_completion_status
            .as_ref()
            .map(|t| (t.completed_count, t.count)),
        children,
    }))
}
