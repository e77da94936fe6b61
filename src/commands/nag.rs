//! The nag state machine.
//!
//! A merge request is either `Flagged` (milestone absent) or `Clear`
//! (milestone present); both states are derived purely from observed
//! remote fields, never from local storage. Each transition re-derives
//! current remote state before every conditional write: any prior save
//! may have raced or partially failed, and the forge offers no
//! transactions. Running a transition twice converges to the same
//! terminal state with no extra side effects.

use tracing::{error, info, info_span, warn};

use crate::ci;
use crate::forge::types::{MergeRequest, Note, Project, ProjectId, User};
use crate::forge::Forge;
use crate::Result;

/// Reaction marking a reconciled, milestone-less MR.
pub const FLAG_EMOJI: &str = "house_abandoned";
/// Reaction marking an MR with a milestone.
pub const OK_EMOJI: &str = "house";
/// Reaction acknowledging the kept bot note on the clear path.
const NOTE_ACK_EMOJI: &str = "thumbsup";

const READY_LABEL: &str = "Ready";
const PENDING_LABEL: &str = "Pending";
const DRAFT_PREFIX: &str = "Draft:";

fn flag_note(author: &str) -> String {
    format!(
        "Hello @{author}.\n\n\
         You forgot to add a Milestone to this Merge Request.\n\n\
         I will try to mark it as `Pending` and `Draft` \
         so you do not forget to add a Milestone.\n\n\
         Please, make sure the title is descriptive."
    )
}

fn resolved_note(author: &str) -> String {
    format!(
        "Hello @{author}.\n\n\
         ~~You forgot to add a Milestone to this Merge Request.~~\n\n\
         ~~I will try to mark it as `Pending` and `Draft` \
         so you do not forget to add a Milestone.~~\n\n\
         Please, make sure the title is descriptive."
    )
}

/// Nag the merge requests of the running CI pipeline.
///
/// Prefers `CI_MERGE_REQUEST_IID`; outside an MR pipeline, falls back to
/// the open MRs associated with the CI commit on this project.
pub fn run(forge: &dyn Forge) -> Result<()> {
    let user = forge.current_user()?;
    let project = forge.project(ci::project_id()?)?;

    let mrs = match ci::merge_request_iid() {
        Ok(iid) => vec![forge.merge_request(project.id, iid)?],
        Err(_) => {
            let sha = ci::commit_sha()?;
            let candidates = forge.commit_merge_requests(project.id, &sha)?;
            candidates
                .into_iter()
                .filter(|m| m.state.contains("open") && m.project_id == project.id)
                .map(|m| forge.merge_request(project.id, m.iid))
                .collect::<Result<Vec<_>>>()?
        }
    };

    if mrs.is_empty() {
        info!("no merge requests to nag");
    }
    for mr in mrs {
        nag_merge_request(forge, &user, &project, &mr)?;
    }
    Ok(())
}

/// Drive a single MR toward its canonical flagged or clear state.
pub fn nag_merge_request(
    forge: &dyn Forge,
    user: &User,
    project: &Project,
    mr: &MergeRequest,
) -> Result<()> {
    let span = info_span!(
        "nag",
        project = %project.path_with_namespace,
        mr = mr.iid,
        author = %mr.author.username,
    );
    let _guard = span.enter();

    if mr.milestone.is_none() {
        flag(forge, user, project.id, mr)
    } else {
        clear(forge, user, project.id, mr)
    }
}

/// `Flagged` transition: milestone absent.
fn flag(forge: &dyn Forge, user: &User, project: ProjectId, mr: &MergeRequest) -> Result<()> {
    remove_own_award(forge, project, mr.iid, user, OK_EMOJI)?;
    add_own_award(forge, project, mr.iid, user, FLAG_EMOJI)?;

    // At most one bot note, ever: create only when none exists.
    if own_notes(forge, project, mr.iid, user)?.is_empty() {
        forge.create_merge_request_note(project, mr.iid, &flag_note(&mr.author.username))?;
        info!(commented = true, "created milestone reminder note");
    }

    // A previous save may have failed; re-load before deciding.
    let fresh = forge.merge_request(project, mr.iid)?;
    if !fresh.draft {
        let title = format!("{DRAFT_PREFIX} {}", fresh.title);
        info!(title = %title, "marking as draft");
        if let Err(e) = forge.set_merge_request_title(project, mr.iid, &title) {
            error!(error = %e, "error saving title, permission error?");
        }
    }

    let fresh = forge.merge_request(project, mr.iid)?;
    if fresh.labels.iter().any(|l| l == READY_LABEL)
        || !fresh.labels.iter().any(|l| l == PENDING_LABEL)
    {
        make_pending(forge, &fresh);
    }

    info!("updated MR due to missing milestone");
    Ok(())
}

/// `Clear` transition: milestone present, undo the nag.
fn clear(forge: &dyn Forge, user: &User, project: ProjectId, mr: &MergeRequest) -> Result<()> {
    let mut own = own_notes(forge, project, mr.iid, user)?;
    if !own.is_empty() {
        // Keep the first note; update it in place when the body differs.
        let keep = own.remove(0);
        ack_note(forge, project, mr.iid, &keep, user)?;
        let resolved = resolved_note(&mr.author.username);
        if keep.body != resolved {
            forge.update_merge_request_note(project, mr.iid, keep.id, &resolved)?;
        }
        // Extra bot notes only exist after bugs or races; drop them.
        for note in own {
            warn!(note_id = note.id, "deleting extra note");
            forge.delete_merge_request_note(project, mr.iid, note.id)?;
        }
    }

    remove_own_award(forge, project, mr.iid, user, FLAG_EMOJI)?;
    add_own_award(forge, project, mr.iid, user, OK_EMOJI)?;
    info!("cleared nag due to having milestone");
    Ok(())
}

/// Not Ready, but Pending. A failed save is logged; the label swap is
/// independent of the other reconciliation steps.
fn make_pending(forge: &dyn Forge, mr: &MergeRequest) {
    let mut labels: std::collections::BTreeSet<String> = mr.labels.iter().cloned().collect();
    if labels.remove(READY_LABEL) {
        info!(removed_label = READY_LABEL, "dropping label");
    }
    labels.insert(PENDING_LABEL.to_string());
    let labels: Vec<String> = labels.into_iter().collect();
    if let Err(e) = forge.set_merge_request_labels(mr.project_id, mr.iid, &labels) {
        error!(error = %e, "error saving labels, permission error?");
    }
}

fn own_notes(forge: &dyn Forge, project: ProjectId, iid: u64, user: &User) -> Result<Vec<Note>> {
    Ok(forge
        .merge_request_notes(project, iid)?
        .into_iter()
        .filter(|n| n.author.id == user.id)
        .collect())
}

/// Remove every reaction named `name` owned by the bot. Checked then
/// acted; the forge has no compare-and-swap.
fn remove_own_award(
    forge: &dyn Forge,
    project: ProjectId,
    iid: u64,
    user: &User,
    name: &str,
) -> Result<bool> {
    let awards = forge.merge_request_awards(project, iid)?;
    let mut removed = false;
    for award in awards {
        if award.user.id == user.id && award.name == name {
            info!(emoji_removed = name, "removing reaction");
            forge.delete_merge_request_award(project, iid, award.id)?;
            removed = true;
        }
    }
    Ok(removed)
}

/// Add the reaction named `name` unless the bot already placed one.
fn add_own_award(
    forge: &dyn Forge,
    project: ProjectId,
    iid: u64,
    user: &User,
    name: &str,
) -> Result<()> {
    let awards = forge.merge_request_awards(project, iid)?;
    let already = awards
        .iter()
        .any(|a| a.user.id == user.id && a.name == name);
    if !already {
        info!(emoji_added = name, "adding reaction");
        forge.create_merge_request_award(project, iid, name)?;
    }
    Ok(())
}

/// Thumbs-up the kept bot note unless already acknowledged.
fn ack_note(
    forge: &dyn Forge,
    project: ProjectId,
    iid: u64,
    note: &Note,
    user: &User,
) -> Result<()> {
    let awards = forge.note_awards(project, iid, note.id)?;
    let already = awards
        .iter()
        .any(|a| a.user.id == user.id && a.name == NOTE_ACK_EMOJI);
    if !already {
        forge.create_note_award(project, iid, note.id, NOTE_ACK_EMOJI)?;
    }
    Ok(())
}
