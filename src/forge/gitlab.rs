//! GitLab v4 REST client.
//!
//! Blocking `ureq` round-trips, one at a time. List endpoints paginate
//! with `per_page=100` and follow the `x-next-page` response header until
//! it runs dry. Lookups where "absent" is a normal outcome map 404 to
//! `Ok(None)`; release lookups also treat 403 that way, since the forge
//! answers 403 for a missing release.

use serde::de::DeserializeOwned;

use super::types::{
    AwardEmoji, Branch, Commit, Issue, MergeRequest, Milestone, Note, Project, ProjectId, Release,
    RepoFile, Tag, User, WikiPage,
};
use super::Forge;
use crate::{Error, Result};

/// Authenticated client for one GitLab deployment.
pub struct GitLab {
    agent: ureq::Agent,
    /// Scheme + authority, e.g. "https://gitlab.com"
    base: String,
    token: String,
}

impl GitLab {
    pub fn new(base: &str, token: &str) -> Self {
        Self {
            agent: ureq::Agent::new(),
            base: base.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v4/{}", self.base, path)
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        self.agent
            .request(method, &self.url(path))
            .set("PRIVATE-TOKEN", &self.token)
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self.request("GET", path).call().map_err(map_err)?;
        Ok(resp.into_json()?)
    }

    /// GET where 404 (or any status in `absent`) means "not there".
    fn get_opt<T: DeserializeOwned>(&self, path: &str, absent: &[u16]) -> Result<Option<T>> {
        match self.request("GET", path).call() {
            Ok(resp) => Ok(Some(resp.into_json()?)),
            Err(ureq::Error::Status(code, _)) if absent.contains(&code) => Ok(None),
            Err(e) => Err(map_err(e)),
        }
    }

    /// GET a list endpoint, following `x-next-page` until exhausted.
    fn get_paged<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<Vec<T>> {
        let mut out = Vec::new();
        let mut page = String::from("1");
        loop {
            let mut req = self
                .request("GET", path)
                .query("per_page", "100")
                .query("page", &page);
            for (k, v) in query {
                req = req.query(k, v);
            }
            let resp = req.call().map_err(map_err)?;
            let next = resp
                .header("x-next-page")
                .unwrap_or_default()
                .trim()
                .to_string();
            let mut batch: Vec<T> = resp.into_json()?;
            out.append(&mut batch);
            if next.is_empty() {
                break;
            }
            page = next;
        }
        Ok(out)
    }

    fn post<T: DeserializeOwned>(&self, path: &str, body: serde_json::Value) -> Result<T> {
        let resp = self.request("POST", path).send_json(body).map_err(map_err)?;
        Ok(resp.into_json()?)
    }

    fn post_unit(&self, path: &str, body: serde_json::Value) -> Result<()> {
        self.request("POST", path).send_json(body).map_err(map_err)?;
        Ok(())
    }

    fn put_unit(&self, path: &str, body: serde_json::Value) -> Result<()> {
        self.request("PUT", path).send_json(body).map_err(map_err)?;
        Ok(())
    }

    fn delete_unit(&self, path: &str) -> Result<()> {
        self.request("DELETE", path).call().map_err(map_err)?;
        Ok(())
    }
}

fn map_err(e: ureq::Error) -> Error {
    match e {
        ureq::Error::Status(code, resp) => {
            let body = resp.into_string().unwrap_or_default();
            Error::Status { code, body }
        }
        other => Error::Http(other.to_string()),
    }
}

fn encode(component: &str) -> String {
    urlencoding::encode(component).into_owned()
}

impl Forge for GitLab {
    fn current_user(&self) -> Result<User> {
        self.get("user")
    }

    fn project(&self, id: ProjectId) -> Result<Project> {
        self.get(&format!("projects/{id}"))
    }

    fn project_by_path(&self, path: &str) -> Result<Project> {
        self.get(&format!("projects/{}", encode(path)))
    }

    fn group_milestones(&self, group: &str, state: Option<&str>) -> Result<Vec<Milestone>> {
        let path = format!("groups/{}/milestones", encode(group));
        match state {
            Some(s) => self.get_paged(&path, &[("state", s)]),
            None => self.get_paged(&path, &[]),
        }
    }

    fn milestone_merge_requests(
        &self,
        group: &str,
        milestone_id: u64,
    ) -> Result<Vec<MergeRequest>> {
        self.get_paged(
            &format!("groups/{}/milestones/{milestone_id}/merge_requests", encode(group)),
            &[],
        )
    }

    fn milestone_issues(&self, group: &str, milestone_id: u64) -> Result<Vec<Issue>> {
        self.get_paged(
            &format!("groups/{}/milestones/{milestone_id}/issues", encode(group)),
            &[],
        )
    }

    fn group_merge_requests(&self, group: &str, state: &str) -> Result<Vec<MergeRequest>> {
        self.get_paged(
            &format!("groups/{}/merge_requests", encode(group)),
            &[("state", state)],
        )
    }

    fn project_merge_requests(&self, project: ProjectId, state: &str) -> Result<Vec<MergeRequest>> {
        self.get_paged(
            &format!("projects/{project}/merge_requests"),
            &[("state", state), ("order_by", "created_at")],
        )
    }

    fn merge_request(&self, project: ProjectId, iid: u64) -> Result<MergeRequest> {
        self.get(&format!("projects/{project}/merge_requests/{iid}"))
    }

    fn create_merge_request(
        &self,
        project: ProjectId,
        title: &str,
        source: &str,
        target: &str,
    ) -> Result<MergeRequest> {
        self.post(
            &format!("projects/{project}/merge_requests"),
            serde_json::json!({
                "title": title,
                "source_branch": source,
                "target_branch": target,
                "remove_source_branch": true,
            }),
        )
    }

    fn set_merge_request_title(&self, project: ProjectId, iid: u64, title: &str) -> Result<()> {
        self.put_unit(
            &format!("projects/{project}/merge_requests/{iid}"),
            serde_json::json!({ "title": title }),
        )
    }

    fn set_merge_request_labels(
        &self,
        project: ProjectId,
        iid: u64,
        labels: &[String],
    ) -> Result<()> {
        self.put_unit(
            &format!("projects/{project}/merge_requests/{iid}"),
            serde_json::json!({ "labels": labels.join(",") }),
        )
    }

    fn set_merge_request_milestone(
        &self,
        project: ProjectId,
        iid: u64,
        milestone_id: u64,
    ) -> Result<()> {
        self.put_unit(
            &format!("projects/{project}/merge_requests/{iid}"),
            serde_json::json!({ "milestone_id": milestone_id }),
        )
    }

    fn set_issue_milestone(&self, project: ProjectId, iid: u64, milestone_id: u64) -> Result<()> {
        self.put_unit(
            &format!("projects/{project}/issues/{iid}"),
            serde_json::json!({ "milestone_id": milestone_id }),
        )
    }

    fn issue_links(&self, project: ProjectId, iid: u64) -> Result<Vec<Issue>> {
        self.get_paged(&format!("projects/{project}/issues/{iid}/links"), &[])
    }

    fn merge_request_notes(&self, project: ProjectId, iid: u64) -> Result<Vec<Note>> {
        self.get_paged(
            &format!("projects/{project}/merge_requests/{iid}/notes"),
            &[],
        )
    }

    fn create_merge_request_note(&self, project: ProjectId, iid: u64, body: &str) -> Result<Note> {
        self.post(
            &format!("projects/{project}/merge_requests/{iid}/notes"),
            serde_json::json!({ "body": body }),
        )
    }

    fn update_merge_request_note(
        &self,
        project: ProjectId,
        iid: u64,
        note_id: u64,
        body: &str,
    ) -> Result<()> {
        self.put_unit(
            &format!("projects/{project}/merge_requests/{iid}/notes/{note_id}"),
            serde_json::json!({ "body": body }),
        )
    }

    fn delete_merge_request_note(&self, project: ProjectId, iid: u64, note_id: u64) -> Result<()> {
        self.delete_unit(&format!(
            "projects/{project}/merge_requests/{iid}/notes/{note_id}"
        ))
    }

    fn merge_request_awards(&self, project: ProjectId, iid: u64) -> Result<Vec<AwardEmoji>> {
        self.get_paged(
            &format!("projects/{project}/merge_requests/{iid}/award_emoji"),
            &[],
        )
    }

    fn create_merge_request_award(&self, project: ProjectId, iid: u64, name: &str) -> Result<()> {
        self.post_unit(
            &format!("projects/{project}/merge_requests/{iid}/award_emoji"),
            serde_json::json!({ "name": name }),
        )
    }

    fn delete_merge_request_award(
        &self,
        project: ProjectId,
        iid: u64,
        award_id: u64,
    ) -> Result<()> {
        self.delete_unit(&format!(
            "projects/{project}/merge_requests/{iid}/award_emoji/{award_id}"
        ))
    }

    fn note_awards(&self, project: ProjectId, iid: u64, note_id: u64) -> Result<Vec<AwardEmoji>> {
        self.get_paged(
            &format!("projects/{project}/merge_requests/{iid}/notes/{note_id}/award_emoji"),
            &[],
        )
    }

    fn create_note_award(
        &self,
        project: ProjectId,
        iid: u64,
        note_id: u64,
        name: &str,
    ) -> Result<()> {
        self.post_unit(
            &format!("projects/{project}/merge_requests/{iid}/notes/{note_id}/award_emoji"),
            serde_json::json!({ "name": name }),
        )
    }

    fn commit(&self, project: ProjectId, sha: &str) -> Result<Commit> {
        self.get(&format!(
            "projects/{project}/repository/commits/{}",
            encode(sha)
        ))
    }

    fn commit_merge_requests(&self, project: ProjectId, sha: &str) -> Result<Vec<MergeRequest>> {
        self.get_paged(
            &format!(
                "projects/{project}/repository/commits/{}/merge_requests",
                encode(sha)
            ),
            &[],
        )
    }

    fn tag(&self, project: ProjectId, name: &str) -> Result<Tag> {
        self.get(&format!(
            "projects/{project}/repository/tags/{}",
            encode(name)
        ))
    }

    fn create_tag(
        &self,
        project: ProjectId,
        name: &str,
        ref_name: &str,
        message: &str,
    ) -> Result<Tag> {
        self.post(
            &format!("projects/{project}/repository/tags"),
            serde_json::json!({
                "tag_name": name,
                "ref": ref_name,
                "message": message,
            }),
        )
    }

    fn release(&self, project: ProjectId, tag: &str) -> Result<Option<Release>> {
        self.get_opt(
            &format!("projects/{project}/releases/{}", encode(tag)),
            &[403, 404],
        )
    }

    fn create_release(
        &self,
        project: ProjectId,
        tag: &str,
        name: &str,
        description: &str,
    ) -> Result<Release> {
        // Group milestones cannot be linked by name here, so no milestone
        // association is sent.
        self.post(
            &format!("projects/{project}/releases"),
            serde_json::json!({
                "tag_name": tag,
                "name": name,
                "description": description,
            }),
        )
    }

    fn wiki_pages(&self, project: ProjectId) -> Result<Vec<WikiPage>> {
        self.get_paged(&format!("projects/{project}/wikis"), &[])
    }

    fn create_wiki_page(&self, project: ProjectId, title: &str, content: &str) -> Result<()> {
        self.post_unit(
            &format!("projects/{project}/wikis"),
            serde_json::json!({ "title": title, "content": content }),
        )
    }

    fn update_wiki_page(&self, project: ProjectId, slug: &str, content: &str) -> Result<()> {
        self.put_unit(
            &format!("projects/{project}/wikis/{}", encode(slug)),
            serde_json::json!({ "content": content }),
        )
    }

    fn branches(&self, project: ProjectId) -> Result<Vec<Branch>> {
        self.get_paged(&format!("projects/{project}/repository/branches"), &[])
    }

    fn create_branch(&self, project: ProjectId, name: &str, ref_name: &str) -> Result<Branch> {
        self.post(
            &format!("projects/{project}/repository/branches"),
            serde_json::json!({ "branch": name, "ref": ref_name }),
        )
    }

    fn file(&self, project: ProjectId, path: &str, ref_name: &str) -> Result<Option<RepoFile>> {
        let route = format!("projects/{project}/repository/files/{}", encode(path));
        match self.request("GET", &route).query("ref", ref_name).call() {
            Ok(resp) => Ok(Some(resp.into_json()?)),
            Err(ureq::Error::Status(404, _)) => Ok(None),
            Err(e) => Err(map_err(e)),
        }
    }

    fn create_file(
        &self,
        project: ProjectId,
        path: &str,
        branch: &str,
        content: &str,
        message: &str,
    ) -> Result<()> {
        self.post_unit(
            &format!("projects/{project}/repository/files/{}", encode(path)),
            serde_json::json!({
                "branch": branch,
                "content": content,
                "commit_message": message,
            }),
        )
    }

    fn update_file(
        &self,
        project: ProjectId,
        path: &str,
        branch: &str,
        content: &str,
        message: &str,
    ) -> Result<()> {
        self.put_unit(
            &format!("projects/{project}/repository/files/{}", encode(path)),
            serde_json::json!({
                "branch": branch,
                "content": content,
                "commit_message": message,
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let gl = GitLab::new("https://gitlab.example.com/", "t0ken");
        assert_eq!(
            gl.url("projects/1"),
            "https://gitlab.example.com/api/v4/projects/1"
        );
    }

    #[test]
    fn test_path_namespace_encoding() {
        assert_eq!(encode("group/project"), "group%2Fproject");
        assert_eq!(encode("content/news/release-3.14.md"), "content%2Fnews%2Frelease-3.14.md");
    }
}
