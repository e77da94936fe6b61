//! Release creation: the CI tag hook and the milestone-wide fan-out.

use std::collections::HashMap;

use tracing::{error, info, info_span};

use crate::config::Config;
use crate::forge::types::{MergeRequest, ProjectId};
use crate::forge::Forge;
use crate::{aggregate, ci, render, Error, Result};

/// Turn the CI job's tag into a release, once.
///
/// Meant to run from a tag pipeline. Bails quietly when the release
/// already exists; requires the tag to carry an annotation message whose
/// first line becomes the release name.
pub fn tag_to_release(forge: &dyn Forge) -> Result<()> {
    let project = forge.project(ci::project_id()?)?;
    let tag_name = ci::commit_tag()?;
    let span = info_span!(
        "tag_to_release",
        project = %project.path_with_namespace,
        tag = %tag_name,
    );
    let _guard = span.enter();

    if forge.release(project.id, &tag_name)?.is_some() {
        info!("release found, bailing");
        return Ok(());
    }

    let tag = forge.tag(project.id, &tag_name)?;
    let message = match tag.message.as_deref().map(str::trim) {
        Some(m) if !m.is_empty() => m.to_string(),
        _ => {
            error!("no message for tag");
            return Ok(());
        }
    };

    let mut lines = message.lines();
    let header = lines.next().unwrap_or_default().to_string();
    let description = lines.collect::<Vec<_>>().join("\n");

    let commit = forge.commit(project.id, &tag_name)?;
    if commit.id != tag.target {
        return Err(Error::InvalidInput(format!(
            "commit id and tag target differ: {} != {}",
            commit.id, tag.target
        )));
    }

    forge.create_release(project.id, &tag_name, &header, &description)?;
    info!(release = %header, "created release");
    Ok(())
}

/// Tag and release every project involved with a milestone.
///
/// `tag_name` must be a full version (at least two dots); the milestone
/// is the tag minus its last dot-segment. Tag and release creation are
/// independent per project: either failing is logged and the loop moves
/// on, and a re-run fills the gaps.
pub fn tag_release(
    forge: &dyn Forge,
    config: &Config,
    tag_name: &str,
    dry_run: bool,
) -> Result<()> {
    if tag_name.matches('.').count() < 2 {
        return Err(Error::InvalidInput(format!(
            "tag should be a full version, e.g. v3.14.0: {tag_name}"
        )));
    }
    let (milestone_name, _) = tag_name
        .rsplit_once('.')
        .ok_or_else(|| Error::InvalidInput(format!("tag has no dot: {tag_name}")))?;

    let milestone = aggregate::get_milestone(forge, &config.group, milestone_name)?;
    let mrs = forge.milestone_merge_requests(&config.group, milestone.id)?;
    let merged: Vec<MergeRequest> = mrs.into_iter().filter(|m| m.is_merged()).collect();

    let mut projects = aggregate::projects_from_mrs(forge, &merged)?;
    projects.extend(aggregate::projects_from_list(forge, &config.release_projects)?);

    let mut grouped: HashMap<ProjectId, Vec<&MergeRequest>> = HashMap::new();
    for mr in &merged {
        grouped.entry(mr.project_id).or_default().push(mr);
    }

    let mut ordered: Vec<_> = projects.values().collect();
    ordered.sort_by(|a, b| a.path_with_namespace.cmp(&b.path_with_namespace));

    for project in ordered {
        if config.is_ignored(&project.path_with_namespace) {
            continue;
        }
        let span = info_span!(
            "tag_release",
            project = %project.path_with_namespace,
            tag = %tag_name,
        );
        let _guard = span.enter();

        let changelog = aggregate::make_changelog(
            grouped.get(&project.id).map(Vec::as_slice).unwrap_or(&[]),
        );
        let tag_message = render::tag_message(tag_name, &changelog);
        let release_message = render::release_description(&milestone, tag_name, &changelog);

        if dry_run {
            info!("would create tag");
            info!("would create release");
            println!("DRY RUN: {}", project.path_with_namespace);
            println!("{tag_message}");
            println!("{release_message}");
            continue;
        }

        match forge.create_tag(project.id, tag_name, &config.release_ref, &tag_message) {
            Ok(tag) => {
                info!(commit = %tag.target, "created tag");
                println!(
                    "{}:  tag: {} commit: {}",
                    project.path_with_namespace, tag_name, tag.target
                );
            }
            Err(e) => error!(error = %e, "error creating tag"),
        }

        match forge.create_release(project.id, tag_name, tag_name, &release_message) {
            Ok(release) => {
                info!("created release");
                println!(
                    "{}:  tag: {}, release: {}",
                    project.path_with_namespace,
                    release.tag_name,
                    release.name.unwrap_or_default()
                );
            }
            Err(e) => error!(error = %e, "error creating release"),
        }
    }
    Ok(())
}
