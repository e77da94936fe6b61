//! Nagger CLI - milestone nagging and release aggregation.

use std::process;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use nagger::cli::{Cli, Commands};
use nagger::config::Config;
use nagger::forge::gitlab::GitLab;
use nagger::{ci, commands};

fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(e) = run(cli.command) {
        error!(error = %e, "command failed");
        process::exit(1);
    }
}

/// Default to info-level logs on stderr; `RUST_LOG` overrides.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands) -> nagger::Result<()> {
    // debug-variables must work without a token; everything else needs
    // the bot account.
    if matches!(command, Commands::DebugVariables) {
        ci::debug_variables();
        return Ok(());
    }

    let token = ci::api_token()?;
    let forge = GitLab::new(&ci::api_url(), &token);
    let config = Config::from_env();

    match command {
        Commands::Nag => commands::nag::run(&forge),
        Commands::TagToRelease => commands::release::tag_to_release(&forge),
        Commands::Changelog { milestone } => commands::changelog::print(&forge, &config, milestone),
        Commands::ChangelogHomepage { milestone, dry_run } => {
            commands::changelog::homepage(&forge, &config, milestone, dry_run)
        }
        Commands::ChangelogWiki { milestone, dry_run } => {
            commands::changelog::wiki(&forge, &config, milestone, dry_run)
        }
        Commands::MilestoneWiki { milestone, dry_run } => {
            commands::wiki::milestone_wiki(&forge, &config, milestone, dry_run)
        }
        Commands::Fixup { milestone, dry_run } => {
            commands::fixup::fixup(&forge, &config, milestone, dry_run)
        }
        Commands::TagRelease { tag_name, dry_run } => {
            commands::release::tag_release(&forge, &config, &tag_name, dry_run)
        }
        Commands::MoveMilestoneItems {
            source,
            target,
            dry_run,
        } => commands::fixup::move_items(&forge, &config, source, target, dry_run),
        Commands::DebugVariables => Ok(()),
    }
}
