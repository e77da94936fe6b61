//! Changelog sinks: plain print, homepage article, release-notes wiki.
//!
//! All three consume the same aggregation output; only the template and
//! the exposure filter differ. Rendering always happens before the
//! dry-run branch so a dry run shows exactly what a live run would push.

use chrono::Utc;
use tracing::{info, info_span};

use crate::config::Config;
use crate::forge::Forge;
use crate::{aggregate, ensure, render, Error, Result};

const SCISSOR_OPEN: &str = "--8<--";
const SCISSOR_CLOSE: &str = "-->8--";
const COMMIT_MESSAGE: &str = "Nagger generated release notes";

/// Print the external changelog (scissor-marked) and the internal recap.
pub fn print(forge: &dyn Forge, config: &Config, milestone: Option<String>) -> Result<()> {
    let name = super::resolve_milestone(forge, &config.group, milestone)?;
    let all = aggregate::milestone_changelog(forge, config, &name)?;

    println!("{}\n", SCISSOR_OPEN.repeat(10));
    for project in &all {
        println!("{}", render::external_changelog(&project.name, &project.external()));
    }
    println!("{}\n", SCISSOR_CLOSE.repeat(10));

    println!("# Internal only changes\n");
    for project in &all {
        println!("{}", render::internal_changelog(&project.name, &project.internal()));
    }
    Ok(())
}

/// Upsert the homepage news article through an ensured merge request.
pub fn homepage(
    forge: &dyn Forge,
    config: &Config,
    milestone: Option<String>,
    dry_run: bool,
) -> Result<()> {
    let name = super::resolve_milestone(forge, &config.group, milestone)?;
    let span = info_span!("homepage", project = %config.homepage_project, milestone = %name);
    let _guard = span.enter();

    let all = aggregate::milestone_changelog(forge, config, &name)?;
    let user = forge.current_user()?;
    let author = user.name.unwrap_or(user.username);
    let date = Utc::now().format("%Y-%m-%d").to_string();
    let file_path = format!("content/news/release-{name}.md");
    let content = render::homepage_article(&name, &author, &date, &all);

    if dry_run {
        println!("DRY RUN: {file_path}");
        println!("{content}");
        return Ok(());
    }

    let project = forge.project_by_path(&config.homepage_project)?;
    let mr = ensure::ensure_mr(forge, &project, &name, &config.release_ref)?;
    let branch = mr
        .source_branch
        .ok_or_else(|| Error::Other(format!("merge request !{} has no source branch", mr.iid)))?;
    ensure::ensure_file_content(forge, &project, &branch, &file_path, &content, COMMIT_MESSAGE)?;
    info!("homepage article updated");
    Ok(())
}

/// Upsert the release-notes wiki page.
pub fn wiki(
    forge: &dyn Forge,
    config: &Config,
    milestone: Option<String>,
    dry_run: bool,
) -> Result<()> {
    let name = super::resolve_milestone(forge, &config.group, milestone)?;
    let span = info_span!("wiki", project = %config.wiki_project, milestone = %name);
    let _guard = span.enter();

    let all = aggregate::milestone_changelog(forge, config, &name)?;
    let title = format!("Release-notes-{name}");
    let content = render::wiki_changelog(&name, &all);

    let project = forge.project_by_path(&config.wiki_project)?;
    ensure::upsert_wiki_page(forge, &project, &title, &content, dry_run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::types::Milestone;
    use crate::test_utils::{merged_mr, FakeForge};

    fn setup() -> (FakeForge, Config) {
        let forge = FakeForge::new();
        forge.add_project(1, "grp/app");
        forge.add_project(2, "grp/www");
        forge.add_project(3, "grp/agile");
        forge.add_milestone(Milestone {
            id: 1,
            title: "v3.14".to_string(),
            state: "active".to_string(),
            start_date: None,
            due_date: None,
            web_url: None,
        });
        let mut mr = merged_mr(1, 1, "a feature", &["Feature"]);
        mr.milestone = forge.milestones.borrow().first().cloned();
        forge.add_merge_request(mr);

        let config = Config {
            group: "grp".to_string(),
            release_projects: Vec::new(),
            ignore_projects: Vec::new(),
            important_projects: Vec::new(),
            homepage_project: "grp/www".to_string(),
            wiki_project: "grp/agile".to_string(),
            release_ref: "master".to_string(),
        };
        (forge, config)
    }

    #[test]
    fn test_wiki_dry_run_writes_nothing() {
        let (forge, config) = setup();
        wiki(&forge, &config, Some("v3.14".to_string()), true).unwrap();
        assert_eq!(forge.writes.get(), 0);
    }

    #[test]
    fn test_wiki_live_run_upserts_page() {
        let (forge, config) = setup();
        wiki(&forge, &config, Some("v3.14".to_string()), false).unwrap();

        let pages = forge.wiki_pages(3).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].slug, "Release-notes-v3.14");
        assert!(pages[0].content.as_deref().unwrap().contains("a feature"));
    }

    #[test]
    fn test_homepage_dry_run_writes_nothing() {
        let (forge, config) = setup();
        homepage(&forge, &config, Some("v3.14".to_string()), true).unwrap();
        assert_eq!(forge.writes.get(), 0);
    }

    #[test]
    fn test_homepage_live_run_creates_mr_branch_and_file() {
        let (forge, config) = setup();
        homepage(&forge, &config, Some("v3.14".to_string()), false).unwrap();

        assert_eq!(forge.branches(2).unwrap().len(), 1);
        let files = forge.files.borrow();
        let content = files
            .get(&(2, "content/news/release-v3.14.md".to_string()))
            .unwrap();
        assert!(content.contains("a feature"));

        // the article rides on an ensured MR titled after the milestone
        let mrs = forge.project_merge_requests(2, "opened").unwrap();
        assert_eq!(mrs.len(), 1);
        assert_eq!(mrs[0].title, "v3.14");
    }

    #[test]
    fn test_homepage_rerun_reuses_mr_and_updates_file() {
        let (forge, config) = setup();
        homepage(&forge, &config, Some("v3.14".to_string()), false).unwrap();
        homepage(&forge, &config, Some("v3.14".to_string()), false).unwrap();

        assert_eq!(forge.project_merge_requests(2, "opened").unwrap().len(), 1);
        assert_eq!(forge.branches(2).unwrap().len(), 1);
    }
}
