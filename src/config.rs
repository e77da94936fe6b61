//! Run configuration.
//!
//! Everything here is resolved once per invocation: built-in defaults for
//! the group's project lists, each overridable through a `NAGGER_*`
//! environment variable (env > default; comma-separated for lists). No
//! configuration files are read or written.

use std::env;

/// Group-wide settings the commands thread through their calls.
#[derive(Debug, Clone)]
pub struct Config {
    /// Group whose milestones and merge requests are aggregated
    pub group: String,

    /// Always-release allow-list: projects that appear in every
    /// aggregation (and get tags/releases) even with zero changes
    pub release_projects: Vec<String>,

    /// Projects never nagged about, fixed up, tagged or released
    pub ignore_projects: Vec<String>,

    /// Projects floated to the front of rendered changelogs,
    /// in this order; the rest keep their relative order
    pub important_projects: Vec<String>,

    /// Project holding the public homepage content
    pub homepage_project: String,

    /// Project whose wiki receives release notes and milestone pages
    pub wiki_project: String,

    /// Ref tags are created on
    pub release_ref: String,
}

const GROUP_NAME: &str = "ModioAB";

const RELEASE_PROJECTS: &[&str] = &[
    "ModioAB/afase",
    "ModioAB/mytemp-backend",
    "ModioAB/modio-api",
    "ModioAB/zabbix-containers",
    "ModioAB/submit",
    "ModioAB/plagiation",
    "ModioAB/housekeeper",
    "ModioAB/containers",
    "ModioAB/grafana-datasource",
    "ModioAB/caramel-manager",
    "ModioAB/visualisation-editor",
];

const IGNORE_MR_PROJECTS: &[&str] = &["ModioAB/sysadmin", "ModioAB/clientconfig"];

const IMPORTANT_PROJECTS: &[&str] = &["ModioAB/afase", "ModioAB/modio-api"];

const HOMEPAGE_PROJECT: &str = "ModioAB/modio.se";
const WIKI_PROJECT: &str = "ModioAB/agile";

impl Default for Config {
    fn default() -> Self {
        Self {
            group: GROUP_NAME.to_string(),
            release_projects: RELEASE_PROJECTS.iter().map(|s| s.to_string()).collect(),
            ignore_projects: IGNORE_MR_PROJECTS.iter().map(|s| s.to_string()).collect(),
            important_projects: IMPORTANT_PROJECTS.iter().map(|s| s.to_string()).collect(),
            homepage_project: HOMEPAGE_PROJECT.to_string(),
            wiki_project: WIKI_PROJECT.to_string(),
            release_ref: "master".to_string(),
        }
    }
}

impl Config {
    /// Resolve the configuration, applying `NAGGER_*` env overrides.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(group) = env_string("NAGGER_GROUP") {
            cfg.group = group;
        }
        if let Some(list) = env_list("NAGGER_RELEASE_PROJECTS") {
            cfg.release_projects = list;
        }
        if let Some(list) = env_list("NAGGER_IGNORE_PROJECTS") {
            cfg.ignore_projects = list;
        }
        if let Some(list) = env_list("NAGGER_IMPORTANT_PROJECTS") {
            cfg.important_projects = list;
        }
        if let Some(project) = env_string("NAGGER_HOMEPAGE_PROJECT") {
            cfg.homepage_project = project;
        }
        if let Some(project) = env_string("NAGGER_WIKI_PROJECT") {
            cfg.wiki_project = project;
        }
        if let Some(r) = env_string("NAGGER_RELEASE_REF") {
            cfg.release_ref = r;
        }
        cfg
    }

    pub fn is_ignored(&self, project_path: &str) -> bool {
        self.ignore_projects.iter().any(|p| p == project_path)
    }
}

fn env_string(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn env_list(key: &str) -> Option<Vec<String>> {
    env_string(key).map(|v| {
        v.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_include_allow_and_ignore_lists() {
        let cfg = Config::default();
        assert!(cfg.release_projects.contains(&"ModioAB/afase".to_string()));
        assert!(cfg.is_ignored("ModioAB/sysadmin"));
        assert!(!cfg.is_ignored("ModioAB/afase"));
    }
}
