//! Milestone resolution and the cross-project aggregation pipeline.
//!
//! Given a milestone name, collect every merged MR tied to it, resolve
//! the distinct owning projects (one lookup per project id, cached for
//! the run), union in the always-release allow-list, and produce one
//! ordered [`ProjectChangelog`] per project. Every sink renders the same
//! output with a different template and exposure filter.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::config::Config;
use crate::forge::types::{MergeRequest, Milestone, Project, ProjectId};
use crate::forge::Forge;
use crate::models::{ChangeLogEntry, ProjectChangelog};
use crate::{Error, Result};

/// Try to see if a milestone title is a version number.
///
/// An optional leading `v`/`V` is stripped; the rest must be non-empty
/// and drawn entirely from digits and dots.
pub fn is_version(name: &str) -> bool {
    let part = name.strip_prefix(['v', 'V']).unwrap_or(name);
    !part.is_empty() && part.chars().all(|c| c.is_ascii_digit() || c == '.')
}

/// Exact-title match among the group's active milestones.
///
/// Zero matches is fatal for the caller; there is nothing sensible to do
/// with a misspelled milestone.
pub fn get_milestone(forge: &dyn Forge, group: &str, name: &str) -> Result<Milestone> {
    let milestones = forge.group_milestones(group, Some("active"))?;
    milestones
        .into_iter()
        .find(|m| m.title == name)
        .ok_or_else(|| Error::NotFound(format!("milestone {name} in group {group}")))
}

/// Titles of active milestones that look like version numbers.
///
/// Feeds the interactive choice prompt only.
pub fn active_version_milestones(forge: &dyn Forge, group: &str) -> Result<Vec<String>> {
    debug!(group, "retrieving milestones");
    let milestones = forge.group_milestones(group, Some("active"))?;
    Ok(milestones
        .into_iter()
        .filter(|m| is_version(&m.title))
        .map(|m| m.title)
        .collect())
}

/// Look up the distinct owning projects of a set of MRs.
///
/// One remote lookup per distinct project id; cached within the run.
pub fn projects_from_mrs(
    forge: &dyn Forge,
    merge_requests: &[MergeRequest],
) -> Result<HashMap<ProjectId, Project>> {
    let mut projects = HashMap::new();
    for mr in merge_requests {
        if projects.contains_key(&mr.project_id) {
            continue;
        }
        info!(project_id = mr.project_id, "looking up project");
        let project = forge.project(mr.project_id)?;
        projects.insert(mr.project_id, project);
    }
    Ok(projects)
}

/// Look up the configured always-release projects.
pub fn projects_from_list(
    forge: &dyn Forge,
    paths: &[String],
) -> Result<HashMap<ProjectId, Project>> {
    let mut projects = HashMap::new();
    for path in paths {
        info!(project = %path, "looking up project");
        let project = forge.project_by_path(path)?;
        projects.insert(project.id, project);
    }
    Ok(projects)
}

/// Classify and sort a batch of MRs into changelog entries.
pub fn make_changelog(merge_requests: &[&MergeRequest]) -> Vec<ChangeLogEntry> {
    let mut entries: Vec<ChangeLogEntry> = merge_requests
        .iter()
        .map(|mr| ChangeLogEntry::from_mr(mr))
        .collect();
    entries.sort();
    entries
}

/// Build the per-project changelogs for a milestone.
///
/// Projects from the allow-list appear even with zero merged MRs, so
/// releases always cover the actively-shipped services. Output is sorted
/// by project name, with the configured important projects floated to
/// the front.
pub fn milestone_changelog(
    forge: &dyn Forge,
    config: &Config,
    milestone_name: &str,
) -> Result<Vec<ProjectChangelog>> {
    let milestone = get_milestone(forge, &config.group, milestone_name)?;
    let mrs = forge.milestone_merge_requests(&config.group, milestone.id)?;
    let merged: Vec<MergeRequest> = mrs.into_iter().filter(|m| m.is_merged()).collect();

    let mut projects = projects_from_mrs(forge, &merged)?;
    projects.extend(projects_from_list(forge, &config.release_projects)?);

    let mut grouped: HashMap<ProjectId, Vec<&MergeRequest>> = HashMap::new();
    for id in projects.keys() {
        grouped.insert(*id, Vec::new());
    }
    for mr in &merged {
        grouped.entry(mr.project_id).or_default().push(mr);
    }

    let mut result = Vec::new();
    for (project_id, merge_requests) in grouped {
        debug!(project_id, num_mrs = merge_requests.len(), "classifying");
        let project = match projects.get(&project_id) {
            Some(p) => p,
            None => continue,
        };
        result.push(ProjectChangelog {
            name: project.path_with_namespace.clone(),
            changes: make_changelog(&merge_requests),
        });
    }
    result.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(float_important(result, &config.important_projects))
}

/// Float the named projects to the front, in the configured order,
/// preserving the relative order of everything else.
pub fn float_important(
    changelogs: Vec<ProjectChangelog>,
    important: &[String],
) -> Vec<ProjectChangelog> {
    let (mut front, rest): (Vec<ProjectChangelog>, Vec<ProjectChangelog>) = changelogs
        .into_iter()
        .partition(|c| important.contains(&c.name));
    front.sort_by_key(|c| important.iter().position(|p| *p == c.name));
    front.extend(rest);
    front
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::types::Milestone;
    use crate::models::Kind;
    use crate::test_utils::{merged_mr, FakeForge};

    fn version_milestone(id: u64, title: &str) -> Milestone {
        Milestone {
            id,
            title: title.to_string(),
            state: "active".to_string(),
            start_date: None,
            due_date: None,
            web_url: None,
        }
    }

    #[test]
    fn test_is_version() {
        assert!(is_version("v1.23.2"));
        assert!(is_version("V1.23"));
        assert!(is_version("V123"));
        assert!(is_version("12.33"));
        assert!(!is_version("autumn"));
        assert!(!is_version("Version 2"));
        assert!(!is_version("v 2.33"));
        assert!(!is_version("v%2.33"));
        assert!(!is_version("2020-03-21"));
        assert!(!is_version("v"));
    }

    #[test]
    fn test_get_milestone_exact_match() {
        let forge = FakeForge::new();
        forge.add_milestone(version_milestone(1, "v3.14"));
        forge.add_milestone(version_milestone(2, "v3.15"));

        let ms = get_milestone(&forge, "grp", "v3.15").unwrap();
        assert_eq!(ms.id, 2);

        let err = get_milestone(&forge, "grp", "v9.99").unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_active_version_milestones_filters_names() {
        let forge = FakeForge::new();
        forge.add_milestone(version_milestone(1, "v3.14"));
        forge.add_milestone(version_milestone(2, "autumn cleanup"));

        let titles = active_version_milestones(&forge, "grp").unwrap();
        assert_eq!(titles, ["v3.14"]);
    }

    #[test]
    fn test_milestone_changelog_orders_blocks() {
        let forge = FakeForge::new();
        forge.add_project(10, "grp/app");
        forge.add_milestone(version_milestone(1, "v1.0"));
        let ms = version_milestone(1, "v1.0");
        for (iid, title, labels) in [
            (1, "misc one", vec![]),
            (2, "feat b", vec!["Feature"]),
            (3, "bug one", vec!["Bug"]),
            (4, "feat a", vec!["Feature"]),
        ] {
            let mut mr = merged_mr(10, iid, title, &labels);
            mr.milestone = Some(ms.clone());
            forge.add_merge_request(mr);
        }

        let cfg = Config {
            release_projects: Vec::new(),
            important_projects: Vec::new(),
            ..Config::default()
        };
        let changelogs = milestone_changelog(&forge, &cfg, "v1.0").unwrap();
        assert_eq!(changelogs.len(), 1);
        let kinds: Vec<Kind> = changelogs[0].changes.iter().map(|c| c.kind()).collect();
        assert_eq!(kinds, [Kind::Feature, Kind::Feature, Kind::Bug, Kind::Misc]);
        assert_eq!(changelogs[0].changes[0].text, "feat a");
    }

    #[test]
    fn test_allow_listed_project_appears_with_empty_changelog() {
        let forge = FakeForge::new();
        forge.add_project(20, "grp/always");
        forge.add_milestone(version_milestone(1, "v1.0"));

        let cfg = Config {
            release_projects: vec!["grp/always".to_string()],
            important_projects: Vec::new(),
            ..Config::default()
        };
        let changelogs = milestone_changelog(&forge, &cfg, "v1.0").unwrap();
        assert_eq!(changelogs.len(), 1);
        assert_eq!(changelogs[0].name, "grp/always");
        assert!(changelogs[0].changes.is_empty());
    }

    #[test]
    fn test_float_important_preserves_rest_order() {
        let pcl = |name: &str| ProjectChangelog {
            name: name.to_string(),
            changes: Vec::new(),
        };
        let sorted = vec![pcl("g/a"), pcl("g/b"), pcl("g/c"), pcl("g/d")];
        let important = vec!["g/c".to_string(), "g/a".to_string()];

        let floated = float_important(sorted, &important);
        let names: Vec<&str> = floated.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["g/c", "g/a", "g/b", "g/d"]);
    }

    #[test]
    fn test_project_lookup_cached_per_run() {
        let forge = FakeForge::new();
        forge.add_project(10, "grp/app");
        let mrs = vec![
            merged_mr(10, 1, "a", &[]),
            merged_mr(10, 2, "b", &[]),
        ];
        let projects = projects_from_mrs(&forge, &mrs).unwrap();
        assert_eq!(projects.len(), 1);
    }
}
