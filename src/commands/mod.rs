//! Command implementations for the nagger CLI.
//!
//! Each submodule holds the business logic for one family of
//! subcommands:
//! - `nag` - merge request reconciliation (the nag state machine)
//! - `changelog` - changelog print, homepage article and wiki sinks
//! - `release` - CI tag-to-release and milestone tag/release fan-out
//! - `fixup` - milestone fixup and moving items between milestones
//! - `wiki` - milestone overview wiki page (issue tree)

pub mod changelog;
pub mod fixup;
pub mod nag;
pub mod release;
pub mod wiki;

use std::io::{self, BufRead, Write};

use crate::aggregate;
use crate::forge::Forge;
use crate::{Error, Result};

/// Resolve the milestone argument, prompting interactively when absent.
///
/// The prompt is restricted to active milestones whose titles look like
/// version numbers.
pub fn resolve_milestone(
    forge: &dyn Forge,
    group: &str,
    milestone: Option<String>,
) -> Result<String> {
    if let Some(name) = milestone {
        return Ok(name);
    }
    let titles = aggregate::active_version_milestones(forge, group)?;
    choose(&titles, &mut io::stdin().lock(), &mut io::stderr())
}

/// Numbered choice prompt over `titles`, reading one line from `input`.
fn choose<R: BufRead, W: Write>(titles: &[String], input: &mut R, prompt: &mut W) -> Result<String> {
    if titles.is_empty() {
        return Err(Error::NotFound("no active version milestones".to_string()));
    }
    writeln!(prompt, "Select a milestone:")?;
    for (i, title) in titles.iter().enumerate() {
        writeln!(prompt, "  {}: {}", i + 1, title)?;
    }
    write!(prompt, "> ")?;
    prompt.flush()?;

    let mut line = String::new();
    input.read_line(&mut line)?;
    let choice: usize = line
        .trim()
        .parse()
        .map_err(|_| Error::InvalidInput(format!("not a number: {}", line.trim())))?;
    titles
        .get(choice.wrapping_sub(1))
        .cloned()
        .ok_or_else(|| Error::InvalidInput(format!("no such choice: {choice}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choose_picks_numbered_entry() {
        let titles = vec!["v3.14".to_string(), "v3.15".to_string()];
        let mut out = Vec::new();
        let picked = choose(&titles, &mut "2\n".as_bytes(), &mut out).unwrap();
        assert_eq!(picked, "v3.15");
        let prompt = String::from_utf8(out).unwrap();
        assert!(prompt.contains("1: v3.14"));
    }

    #[test]
    fn test_choose_rejects_garbage_and_out_of_range() {
        let titles = vec!["v3.14".to_string()];
        let mut out = Vec::new();
        assert!(choose(&titles, &mut "x\n".as_bytes(), &mut out).is_err());
        assert!(choose(&titles, &mut "0\n".as_bytes(), &mut out).is_err());
        assert!(choose(&titles, &mut "5\n".as_bytes(), &mut out).is_err());
    }

    #[test]
    fn test_choose_empty_list_is_not_found() {
        let mut out = Vec::new();
        let err = choose(&[], &mut "1\n".as_bytes(), &mut out).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
