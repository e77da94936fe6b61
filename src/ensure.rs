//! Idempotent upserts against the forge.
//!
//! Every operation here looks up current remote state by name first and
//! only creates what is missing, so re-running a partially failed command
//! converges instead of piling up duplicates.

use tracing::{info, warn};

use crate::forge::types::{Branch, MergeRequest, Project};
use crate::forge::Forge;
use crate::Result;

/// Make sure a branch named `branch_name` exists in the project.
pub fn ensure_branch(forge: &dyn Forge, project: &Project, branch_name: &str, ref_name: &str) -> Result<Branch> {
    let branches = forge.branches(project.id)?;
    if let Some(found) = branches.into_iter().find(|b| b.name == branch_name) {
        info!(branch = %branch_name, "found branch");
        return Ok(found);
    }
    info!(branch = %branch_name, base = %ref_name, "creating branch");
    forge.create_branch(project.id, branch_name, ref_name)
}

/// Make sure an open MR titled `title` exists in the project.
///
/// Creates the backing branch first when needed; the MR is opened from it
/// against `target`.
pub fn ensure_mr(forge: &dyn Forge, project: &Project, title: &str, target: &str) -> Result<MergeRequest> {
    let mrs = forge.project_merge_requests(project.id, "opened")?;
    if let Some(found) = mrs.into_iter().find(|m| m.title == title) {
        info!(mr_title = %title, "found merge request");
        return Ok(found);
    }

    let branch = ensure_branch(forge, project, title, target)?;
    info!(mr_title = %title, source = %branch.name, "creating merge request");
    forge.create_merge_request(project.id, title, &branch.name, target)
}

/// Make sure `file_path` on `branch` has exactly `content`.
pub fn ensure_file_content(
    forge: &dyn Forge,
    project: &Project,
    branch: &str,
    file_path: &str,
    content: &str,
    message: &str,
) -> Result<()> {
    info!(file = %file_path, branch = %branch, "testing if file exists");
    if forge.file(project.id, file_path, branch)?.is_some() {
        info!(file = %file_path, "updating file");
        forge.update_file(project.id, file_path, branch, content, message)
    } else {
        info!(file = %file_path, "creating file");
        forge.create_file(project.id, file_path, branch, content, message)
    }
}

/// Upsert a wiki page by title.
///
/// Absent is a normal branch: the page is created. A duplicated slug is
/// fatal-for-that-page: logged and skipped rather than guessing which
/// page to overwrite. Dry-run prints the computed content and issues no
/// write.
pub fn upsert_wiki_page(
    forge: &dyn Forge,
    project: &Project,
    title: &str,
    content: &str,
    dry_run: bool,
) -> Result<()> {
    if dry_run {
        println!("DRY RUN {title}");
        println!("{content}");
        return Ok(());
    }

    let pages = forge.wiki_pages(project.id)?;
    let matching: Vec<_> = pages.iter().filter(|p| p.slug == title).collect();
    match matching.len() {
        0 => {
            info!(title = %title, "creating wiki page");
            forge.create_wiki_page(project.id, title, content)
        }
        1 => {
            info!(title = %title, "updating wiki page");
            forge.update_wiki_page(project.id, &matching[0].slug, content)
        }
        n => {
            warn!(title = %title, pages = n, "duplicate wiki page title, ignoring");
            Ok(())
        }
    }
}
