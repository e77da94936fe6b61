//! Milestone fixup: reconciliation over the *absence* of a milestone.

use chrono::NaiveTime;
use tracing::{error, info, info_span};

use crate::config::Config;
use crate::forge::Forge;
use crate::{aggregate, Error, Result};

/// Assign merged, milestone-less MRs to the milestone.
///
/// Only MRs merged strictly between the milestone's start and due date
/// qualify; both dates are required. Each save is an independent unit of
/// work: a failure is logged and the loop continues, and a re-run picks
/// up whatever was left. With `pretend` the intended assignment is only
/// logged.
pub fn fixup(
    forge: &dyn Forge,
    config: &Config,
    milestone: Option<String>,
    pretend: bool,
) -> Result<()> {
    let name = super::resolve_milestone(forge, &config.group, milestone)?;
    let milestone = aggregate::get_milestone(forge, &config.group, &name)?;

    let start_date = milestone
        .start_date
        .ok_or_else(|| Error::InvalidInput("milestone needs a start date".to_string()))?;
    let due_date = milestone
        .due_date
        .ok_or_else(|| Error::InvalidInput("milestone needs a due date".to_string()))?;
    // The milestone carries bare dates; merge timestamps are UTC
    // datetimes, so widen for comparison.
    let start = start_date.and_time(NaiveTime::MIN).and_utc();
    let due = due_date.and_time(NaiveTime::MIN).and_utc();

    // The milestone's own MR list is useless here: we want everything
    // NOT part of it. Walk all merged MRs of the group instead.
    let mrs = forge.group_merge_requests(&config.group, "merged")?;
    let mut projects = aggregate::projects_from_mrs(forge, &mrs)?;
    projects.extend(aggregate::projects_from_list(forge, &config.release_projects)?);

    let mut ordered: Vec<_> = projects.values().collect();
    ordered.sort_by(|a, b| a.path_with_namespace.cmp(&b.path_with_namespace));

    for project in ordered {
        let span = info_span!("fixup", project = %project.path_with_namespace, pretend);
        let _guard = span.enter();
        if config.is_ignored(&project.path_with_namespace) {
            info!("ignoring project");
            continue;
        }

        let project_mrs = forge.project_merge_requests(project.id, "merged")?;
        for mr in project_mrs.iter().filter(|m| m.milestone.is_none()) {
            let span = info_span!("mr", title = %mr.title, url = %mr.web_url);
            let _guard = span.enter();

            let merged_at = match mr.merged_at {
                Some(t) => t,
                None => {
                    info!("no merged date, ignoring");
                    continue;
                }
            };
            if start < merged_at && merged_at < due {
                info!(milestone = %milestone.title, "assigning to milestone");
                if pretend {
                    continue;
                }
                if let Err(e) = forge.set_merge_request_milestone(project.id, mr.iid, milestone.id)
                {
                    error!(error = %e, "failed to update");
                }
            }
        }
    }
    Ok(())
}

/// Move still-open MRs and issues from one milestone to another.
///
/// Closed and merged work stays attributed to the source milestone's
/// cycle. Per-item failures are logged and skipped.
pub fn move_items(
    forge: &dyn Forge,
    config: &Config,
    source: Option<String>,
    target: Option<String>,
    dry_run: bool,
) -> Result<()> {
    let source_name = super::resolve_milestone(forge, &config.group, source)?;
    let target_name = super::resolve_milestone(forge, &config.group, target)?;
    if source_name == target_name {
        return Err(Error::InvalidInput(format!(
            "source and target milestone are the same: {source_name}"
        )));
    }

    let source_ms = aggregate::get_milestone(forge, &config.group, &source_name)?;
    let target_ms = aggregate::get_milestone(forge, &config.group, &target_name)?;
    let span = info_span!("move", from = %source_name, to = %target_name, dry_run);
    let _guard = span.enter();

    let mrs = forge.milestone_merge_requests(&config.group, source_ms.id)?;
    for mr in mrs.iter().filter(|m| m.state == "opened") {
        info!(mr = %mr.references.full, "moving merge request");
        if dry_run {
            continue;
        }
        if let Err(e) = forge.set_merge_request_milestone(mr.project_id, mr.iid, target_ms.id) {
            error!(error = %e, mr = %mr.references.full, "failed to move merge request");
        }
    }

    let issues = forge.milestone_issues(&config.group, source_ms.id)?;
    for issue in issues.iter().filter(|i| i.state == "opened") {
        info!(issue = %issue.references.full, "moving issue");
        if dry_run {
            continue;
        }
        if let Err(e) = forge.set_issue_milestone(issue.project_id, issue.iid, target_ms.id) {
            error!(error = %e, issue = %issue.references.full, "failed to move issue");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    use crate::forge::types::{Issue, Milestone, References};
    use crate::test_utils::{merged_mr, FakeForge};

    fn dated_milestone(id: u64, title: &str, start: &str, due: &str) -> Milestone {
        Milestone {
            id,
            title: title.to_string(),
            state: "active".to_string(),
            start_date: start.parse::<NaiveDate>().ok(),
            due_date: due.parse::<NaiveDate>().ok(),
            web_url: None,
        }
    }

    fn config() -> Config {
        Config {
            group: "grp".to_string(),
            release_projects: Vec::new(),
            ignore_projects: vec!["grp/ignored".to_string()],
            important_projects: Vec::new(),
            homepage_project: String::new(),
            wiki_project: String::new(),
            release_ref: "master".to_string(),
        }
    }

    #[test]
    fn test_fixup_assigns_mrs_inside_window() {
        let forge = FakeForge::new();
        forge.add_project(1, "grp/app");
        forge.add_milestone(dated_milestone(1, "v1.0", "2026-01-01", "2026-02-01"));

        let mut inside = merged_mr(1, 1, "inside", &[]);
        inside.merged_at = Some(Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap());
        forge.add_merge_request(inside);

        let mut outside = merged_mr(1, 2, "outside", &[]);
        outside.merged_at = Some(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap());
        forge.add_merge_request(outside);

        // no merged_at at all
        forge.add_merge_request(merged_mr(1, 3, "dateless", &[]));

        fixup(&forge, &config(), Some("v1.0".to_string()), false).unwrap();

        assert!(forge.merge_request(1, 1).unwrap().milestone.is_some());
        assert!(forge.merge_request(1, 2).unwrap().milestone.is_none());
        assert!(forge.merge_request(1, 3).unwrap().milestone.is_none());
    }

    #[test]
    fn test_fixup_pretend_mutates_nothing() {
        let forge = FakeForge::new();
        forge.add_project(1, "grp/app");
        forge.add_milestone(dated_milestone(1, "v1.0", "2026-01-01", "2026-02-01"));
        let mut mr = merged_mr(1, 1, "inside", &[]);
        mr.merged_at = Some(Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap());
        forge.add_merge_request(mr);

        fixup(&forge, &config(), Some("v1.0".to_string()), true).unwrap();

        assert_eq!(forge.writes.get(), 0);
        assert!(forge.merge_request(1, 1).unwrap().milestone.is_none());
    }

    #[test]
    fn test_fixup_requires_dates() {
        let forge = FakeForge::new();
        forge.add_milestone(Milestone {
            id: 1,
            title: "v1.0".to_string(),
            state: "active".to_string(),
            start_date: None,
            due_date: None,
            web_url: None,
        });

        let err = fixup(&forge, &config(), Some("v1.0".to_string()), false).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_fixup_skips_ignored_projects() {
        let forge = FakeForge::new();
        forge.add_project(1, "grp/ignored");
        forge.add_milestone(dated_milestone(1, "v1.0", "2026-01-01", "2026-02-01"));
        let mut mr = merged_mr(1, 1, "inside", &[]);
        mr.merged_at = Some(Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap());
        forge.add_merge_request(mr);

        fixup(&forge, &config(), Some("v1.0".to_string()), false).unwrap();

        assert!(forge.merge_request(1, 1).unwrap().milestone.is_none());
    }

    #[test]
    fn test_move_items_moves_open_work_only() {
        let forge = FakeForge::new();
        forge.add_project(1, "grp/app");
        let source = dated_milestone(1, "v1.0", "2026-01-01", "2026-02-01");
        let target = dated_milestone(2, "v1.1", "2026-02-01", "2026-03-01");
        forge.add_milestone(source.clone());
        forge.add_milestone(target);

        let mut open = merged_mr(1, 1, "open work", &[]);
        open.state = "opened".to_string();
        open.milestone = Some(source.clone());
        forge.add_merge_request(open);

        let mut done = merged_mr(1, 2, "done work", &[]);
        done.milestone = Some(source.clone());
        forge.add_merge_request(done);

        forge.add_issue(
            Issue {
                id: 1,
                iid: 5,
                project_id: 1,
                title: "open issue".to_string(),
                state: "opened".to_string(),
                web_url: String::new(),
                references: References {
                    full: "grp/app#5".to_string(),
                },
                task_completion_status: None,
            },
            Some(1),
        );

        move_items(
            &forge,
            &config(),
            Some("v1.0".to_string()),
            Some("v1.1".to_string()),
            false,
        )
        .unwrap();

        assert_eq!(forge.merge_request(1, 1).unwrap().milestone.unwrap().id, 2);
        assert_eq!(forge.merge_request(1, 2).unwrap().milestone.unwrap().id, 1);
        let moved = forge.milestone_issues("grp", 2).unwrap();
        assert_eq!(moved.len(), 1);
    }

    #[test]
    fn test_move_items_rejects_same_milestone() {
        let forge = FakeForge::new();
        let err = move_items(
            &forge,
            &config(),
            Some("v1.0".to_string()),
            Some("v1.0".to_string()),
            false,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
