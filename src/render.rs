//! Rendering: pure functions from (model, destination) to text.
//!
//! Every sink renders the same aggregation output; only the template and
//! the exposure filter differ. Nothing here performs I/O.

use std::fmt::Write;

use crate::forge::types::Milestone;
use crate::models::{ChangeLogEntry, IssueNode, Kind, ProjectChangelog};

/// Convert labels to forge-flavoured Markdown label references.
pub fn labels_to_md(labels: &[String]) -> String {
    labels
        .iter()
        .map(|l| format!("~{l}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Group already-sorted entries into (kind, block) runs.
fn kind_blocks<'a>(entries: &[&'a ChangeLogEntry]) -> Vec<(Kind, Vec<&'a ChangeLogEntry>)> {
    let mut blocks: Vec<(Kind, Vec<&ChangeLogEntry>)> = Vec::new();
    for entry in entries {
        match blocks.last_mut() {
            Some((kind, block)) if *kind == entry.kind() => block.push(entry),
            _ => blocks.push((entry.kind(), vec![entry])),
        }
    }
    blocks
}

/// Public-facing changelog section for one project.
///
/// An empty changelog renders as "No major changes".
pub fn external_changelog(project: &str, entries: &[&ChangeLogEntry]) -> String {
    let mut out = format!("## {project}\n\n");
    if entries.is_empty() {
        out.push_str("No major changes.\n");
        return out;
    }
    for (kind, block) in kind_blocks(entries) {
        let _ = writeln!(out, "### {}\n", kind.heading());
        for entry in block {
            let _ = writeln!(out, "* [{}]({})", entry.text, entry.web_url);
        }
        out.push('\n');
    }
    out
}

/// Concise internal changelog section for one project.
pub fn internal_changelog(project: &str, entries: &[&ChangeLogEntry]) -> String {
    let mut out = format!("## {project}\n\n");
    if entries.is_empty() {
        out.push_str("No changes.\n");
        return out;
    }
    for entry in entries {
        let labels = labels_to_md(&entry.labels);
        if labels.is_empty() {
            let _ = writeln!(out, "* {} ({})", entry.text, entry.slug);
        } else {
            let _ = writeln!(out, "* {} ({}) {}", entry.text, entry.slug, labels);
        }
    }
    out
}

/// Homepage news article: front matter plus external sections.
pub fn homepage_article(
    milestone_name: &str,
    author: &str,
    date: &str,
    changelogs: &[ProjectChangelog],
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "---");
    let _ = writeln!(out, "title: \"Release {milestone_name}\"");
    let _ = writeln!(out, "date: {date}");
    let _ = writeln!(out, "author: \"{author}\"");
    let _ = writeln!(out, "---");
    out.push('\n');
    for project in changelogs {
        out.push_str(&external_changelog(&project.name, &project.external()));
        out.push('\n');
    }
    out
}

/// Release-notes wiki page: external sections, then the internal recap.
pub fn wiki_changelog(milestone_name: &str, changelogs: &[ProjectChangelog]) -> String {
    let mut out = format!("# Release notes {milestone_name}\n\n");
    for project in changelogs {
        out.push_str(&external_changelog(&project.name, &project.external()));
        out.push('\n');
    }
    out.push_str("# Internal only changes\n\n");
    for project in changelogs {
        out.push_str(&internal_changelog(&project.name, &project.internal()));
        out.push('\n');
    }
    out
}

/// Annotated tag message, plain text.
pub fn tag_message(tag_name: &str, entries: &[ChangeLogEntry]) -> String {
    let mut out = format!("Release {tag_name}\n\n");
    if entries.is_empty() {
        out.push_str("No major changes.\n");
        return out;
    }
    let refs: Vec<&ChangeLogEntry> = entries.iter().collect();
    for (kind, block) in kind_blocks(&refs) {
        let _ = writeln!(out, "{}:", kind.heading());
        for entry in block {
            let _ = writeln!(out, "* {} ({})", entry.text, entry.slug);
        }
        out.push('\n');
    }
    out
}

/// Release description, Markdown.
pub fn release_description(
    milestone: &Milestone,
    tag_name: &str,
    entries: &[ChangeLogEntry],
) -> String {
    let mut out = format!("# Release {tag_name}\n\n");
    if let Some(url) = &milestone.web_url {
        let _ = writeln!(out, "Milestone: [{}]({url})\n", milestone.title);
    }
    if entries.is_empty() {
        out.push_str("No major changes.\n");
        return out;
    }
    let refs: Vec<&ChangeLogEntry> = entries.iter().collect();
    for (kind, block) in kind_blocks(&refs) {
        let _ = writeln!(out, "## {}\n", kind.heading());
        for entry in block {
            let _ = writeln!(out, "* [{}]({}) ({})", entry.text, entry.web_url, entry.slug);
        }
        out.push('\n');
    }
    out
}

/// Milestone overview wiki page: issue tree plus a dependency diagram.
pub fn milestone_wiki_page(milestone: &Milestone, tree: &[IssueNode]) -> String {
    let mut out = format!("# Milestone {}\n\n", milestone.title);
    if let (Some(start), Some(due)) = (milestone.start_date, milestone.due_date) {
        let _ = writeln!(out, "{start} to {due}\n");
    }
    if tree.is_empty() {
        out.push_str("No issues scheduled.\n");
        return out;
    }
    for node in tree {
        write_issue_node(&mut out, node, 0);
    }
    out.push('\n');
    out.push_str(&dependency_diagram(tree));
    out
}

fn write_issue_node(out: &mut String, node: &IssueNode, depth: usize) {
    let indent = "  ".repeat(depth);
    let check = if node.state == "closed" { "x" } else { " " };
    let progress = match node.progress {
        Some((done, total)) if total > 0 => format!(" ({done}/{total})"),
        _ => String::new(),
    };
    let _ = writeln!(
        out,
        "{indent}* [{check}] [{}]({}){progress}",
        node.title, node.web_url
    );
    for child in &node.children {
        write_issue_node(out, child, depth + 1);
    }
}

/// Mermaid flowchart of the linked-issue edges.
fn dependency_diagram(tree: &[IssueNode]) -> String {
    let mut out = String::from("```mermaid\ngraph TD\n");
    let mut stack: Vec<&IssueNode> = tree.iter().collect();
    while let Some(node) = stack.pop() {
        if node.children.is_empty() {
            let _ = writeln!(out, "  i{}[\"{}\"]", node.id, node.reference);
        }
        for child in &node.children {
            let _ = writeln!(
                out,
                "  i{}[\"{}\"] --> i{}[\"{}\"]",
                node.id, node.reference, child.id, child.reference
            );
            stack.push(child);
        }
    }
    out.push_str("```\n");
    out
}
