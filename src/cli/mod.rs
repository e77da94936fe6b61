//! CLI argument definitions for nagger.

use clap::{Parser, Subcommand};

/// Version string carrying the build commit and timestamp.
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("NAGGER_GIT_COMMIT"),
    ", built ",
    env!("NAGGER_BUILD_TIMESTAMP"),
    ")"
);

/// Nagger - milestone nagging and release aggregation for a GitLab group.
///
/// Run from CI with `NAGGUS_KEY` holding the bot's API token. Commands
/// taking a milestone fall back to an interactive choice of active
/// version-like milestones when the argument is omitted.
#[derive(Parser, Debug)]
#[command(name = "nagger")]
#[command(author, version, long_version = LONG_VERSION)]
#[command(about = "Nag milestone-less merge requests and aggregate milestone changelogs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Nag the pipeline's merge requests about a missing milestone
    ///
    /// Meant to be run in a CI job; reconciles labels, title, reactions
    /// and the reminder note. Safe to re-run.
    Nag,

    /// Turn the pipeline's tag into a release
    ///
    /// Meant to be run from a tag pipeline; the tag's annotation message
    /// becomes the release name and description.
    TagToRelease,

    /// Print the changelog for a milestone
    Changelog {
        /// Milestone title (e.g. v3.14); prompts when omitted
        milestone: Option<String>,
    },

    /// Upsert the homepage news article for a milestone
    ChangelogHomepage {
        /// Milestone title (e.g. v3.14); prompts when omitted
        milestone: Option<String>,

        /// Render and print without touching the forge
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Upsert the release-notes wiki page for a milestone
    ChangelogWiki {
        /// Milestone title (e.g. v3.14); prompts when omitted
        milestone: Option<String>,

        /// Render and print without touching the forge
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Upsert the milestone overview wiki page (issue tree)
    MilestoneWiki {
        /// Milestone title (e.g. v3.14); prompts when omitted
        milestone: Option<String>,

        /// Render and print without touching the forge
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Assign stray merged MRs to the milestone
    ///
    /// Covers merged, milestone-less MRs merged inside the milestone's
    /// start/due window.
    Fixup {
        /// Milestone title (e.g. v3.14); prompts when omitted
        milestone: Option<String>,

        /// Log intended assignments without saving them
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Tag and release every project involved with the milestone
    TagRelease {
        /// Full version tag, e.g. v3.14.0
        tag_name: String,

        /// Render and print without touching the forge
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Move open MRs and issues from one milestone to another
    MoveMilestoneItems {
        /// Source milestone title; prompts when omitted
        source: Option<String>,

        /// Target milestone title; prompts when omitted
        target: Option<String>,

        /// Log intended moves without saving them
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Print all CI-related environment variables
    ///
    /// The only command that works without an API token.
    DebugVariables,
}
