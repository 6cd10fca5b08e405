//! Read-only GitLab API client.
//!
//! chartpin talks to two GitLab instances: the central one hosting the
//! individual chart projects, and the legacy one hosting the deployment
//! repository with the umbrella manifest. Both speak the same v4 REST API,
//! so one client type covers both; what differs per instance is the base
//! URL, captured in a [`UrlTemplates`] value at construction time.
//!
//! All operations are plain GETs routed through [`HttpClient`], which
//! handles URI validation, timeouts, and retries. List endpoints are walked
//! through [`pagination::fetch_all_pages`].

pub mod http;
pub mod pagination;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::constants::PER_PAGE;
use crate::core::{ChartpinError, Result};
use crate::utils::progress::ProgressBar;

pub use http::HttpClient;

/// A project listed under a group on the central instance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Project {
    /// Numeric project id used by API endpoints
    pub id: u64,
    /// Repository name, e.g. `helm-database`
    pub name: String,
}

/// A branch of a repository.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Branch {
    /// Branch name as stored on the server
    pub name: String,
}

/// A repository tag together with the title of the commit it points at.
///
/// The commit title is what ties a release tag back to the branch it was
/// cut from, so it is kept alongside the tag name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Tag name, e.g. `9.2.0` or `v9.2.0`
    pub name: String,
    /// Title of the tagged commit
    pub title: String,
}

#[derive(Deserialize)]
struct TagRecord {
    name: String,
    commit: CommitRecord,
}

#[derive(Deserialize)]
struct CommitRecord {
    title: String,
}

/// All tags of one project, as fetched from the central instance.
#[derive(Debug, Clone)]
pub struct ProjectTags {
    /// The project the tags belong to
    pub project: Project,
    /// Its tags, most recently updated first
    pub tags: Vec<Tag>,
}

/// URI templates for one GitLab instance.
///
/// Placeholders in `{braces}` are substituted by the client operations.
/// Building them once per instance keeps the operations free of string
/// assembly and makes the full set of touched endpoints easy to audit.
#[derive(Debug, Clone)]
pub struct UrlTemplates {
    /// Single group lookup by name or path
    pub group: String,
    /// Paginated subgroup listing of a group
    pub subgroups: String,
    /// Paginated project listing of a group, including subgroups
    pub group_projects: String,
    /// Project search within a group
    pub project_search: String,
    /// Paginated tag listing of a project, most recently updated first
    pub project_tags: String,
    /// Single branch lookup of a project
    pub branch: String,
    /// Raw file download from a repository path
    pub raw_file: String,
}

impl UrlTemplates {
    /// Build the template set for an instance base URL.
    #[must_use]
    pub fn for_instance(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            group: format!("{base}/api/v4/groups/{{group}}"),
            subgroups: format!(
                "{base}/api/v4/groups/{{group}}/subgroups?page={{page}}&per_page={PER_PAGE}"
            ),
            group_projects: format!(
                "{base}/api/v4/groups/{{id}}/projects?include_subgroups=true&page={{page}}&per_page={PER_PAGE}"
            ),
            project_search: format!("{base}/api/v4/groups/{{id}}/projects?search={{name}}"),
            project_tags: format!(
                "{base}/api/v4/projects/{{id}}/repository/tags?order_by=updated&page={{page}}&per_page={PER_PAGE}"
            ),
            branch: format!("{base}/api/v4/projects/{{id}}/repository/branches/{{branch}}"),
            raw_file: format!("{base}/{{project}}/raw/{{branch}}/{{path}}/{{file}}"),
        }
    }
}

/// Client for one GitLab instance.
pub struct GitlabClient {
    http: HttpClient,
    urls: UrlTemplates,
    instance: String,
}

impl GitlabClient {
    /// Create a client for the instance at `base_url`.
    ///
    /// `instance` is a short label ("central", "legacy") used in log lines
    /// and error messages to tell the two instances apart.
    #[must_use]
    pub fn new(base_url: &str, instance: impl Into<String>) -> Self {
        Self {
            http: HttpClient::new(),
            urls: UrlTemplates::for_instance(base_url),
            instance: instance.into(),
        }
    }

    /// Replace the HTTP client, keeping templates and label. Tests use this
    /// to shrink the retry budget.
    #[must_use]
    pub fn with_http(mut self, http: HttpClient) -> Self {
        self.http = http;
        self
    }

    /// Resolve the numeric id of a group by its name.
    ///
    /// # Errors
    ///
    /// [`ChartpinError::FetchFailed`] when the group does not exist, and
    /// [`ChartpinError::ElementNotFound`] when the returned record is not
    /// the group that was asked for or carries no id.
    pub async fn group_id(&self, group: &str) -> Result<u64> {
        let operation = format!("look up group '{group}'");
        let uri = self.urls.group.replace("{group}", group);
        let response = self.http.request_ok(&uri, &operation).await?;
        let record: Value = self.read_json(response, &uri, &operation).await?;

        // A lookup by path can resolve to a group whose name differs from
        // the query.
        if record.get("name").and_then(Value::as_str) != Some(group) {
            warn!("group lookup for '{group}' returned a different record");
            return Err(ChartpinError::ElementNotFound {
                operation,
                name: group.to_string(),
            });
        }

        record
            .get("id")
            .and_then(Value::as_u64)
            .inspect(|id| debug!("group '{group}' has id {id} on {}", self.instance))
            .ok_or_else(|| {
                warn!("group record for '{group}' carries no id");
                ChartpinError::ElementNotFound {
                    operation,
                    name: group.to_string(),
                }
            })
    }

    /// Resolve the numeric id of a subgroup by scanning the subgroup listing
    /// of its parent group.
    ///
    /// Groups carry at most a handful of subgroups, so a single page of the
    /// listing is enough.
    ///
    /// # Errors
    ///
    /// [`ChartpinError::ElementNotFound`] when no subgroup carries the name.
    pub async fn subgroup_id(
        &self,
        group: &str,
        subgroup: &str,
        progress: &ProgressBar,
    ) -> Result<u64> {
        let operation = format!("list subgroups of '{group}'");
        let template = self.urls.subgroups.replace("{group}", group);
        let records =
            pagination::fetch_all_pages(&self.http, &template, &operation, false, progress).await?;

        records
            .iter()
            .find(|record| record.get("name").and_then(Value::as_str) == Some(subgroup))
            .and_then(|record| record.get("id").and_then(Value::as_u64))
            .inspect(|id| debug!("subgroup '{subgroup}' of '{group}' has id {id}"))
            .ok_or_else(|| {
                warn!("no subgroup named '{subgroup}' under '{group}'");
                ChartpinError::ElementNotFound {
                    operation,
                    name: subgroup.to_string(),
                }
            })
    }

    /// List every project under a group, subgroups included.
    ///
    /// # Errors
    ///
    /// Request failures, or [`ChartpinError::JsonError`] when a record does
    /// not look like a project.
    pub async fn projects(&self, group_id: u64, progress: &ProgressBar) -> Result<Vec<Project>> {
        let operation = format!("list projects of group {group_id}");
        let template = self
            .urls
            .group_projects
            .replace("{id}", &group_id.to_string());
        let records =
            pagination::fetch_all_pages(&self.http, &template, &operation, true, progress).await?;

        let projects = records
            .into_iter()
            .map(serde_json::from_value::<Project>)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        info!(
            "group {group_id} on {} has {} project(s)",
            self.instance,
            projects.len()
        );
        Ok(projects)
    }

    /// Resolve the numeric id of a project by searching for its name within
    /// a group. The group name is resolved to its id first; the search is
    /// fuzzy on the server side, so the results are filtered down to an
    /// exact name match.
    ///
    /// # Errors
    ///
    /// [`ChartpinError::ElementNotFound`] when no result matches exactly.
    pub async fn project_id(&self, group: &str, name: &str) -> Result<u64> {
        let group_id = self.group_id(group).await?;
        let operation = format!("search projects of group '{group}'");
        let uri = self
            .urls
            .project_search
            .replace("{id}", &group_id.to_string())
            .replace("{name}", name);
        let response = self.http.request_ok(&uri, &operation).await?;
        let records: Vec<Project> = self.read_json(response, &uri, &operation).await?;

        records
            .into_iter()
            .find(|project| project.name == name)
            .map(|project| project.id)
            .ok_or_else(|| {
                warn!("no project named '{name}' in group '{group}'");
                ChartpinError::ElementNotFound {
                    operation,
                    name: name.to_string(),
                }
            })
    }

    /// Fetch the tags of a project, most recently updated first.
    ///
    /// With `deep` set, the full tag history is walked; otherwise only the
    /// first page is fetched, which covers the recent releases.
    pub async fn tags(
        &self,
        project: &Project,
        deep: bool,
        progress: &ProgressBar,
    ) -> Result<Vec<Tag>> {
        let operation = format!("fetch tags of '{}'", project.name);
        let template = self
            .urls
            .project_tags
            .replace("{id}", &project.id.to_string());
        let records =
            pagination::fetch_all_pages(&self.http, &template, &operation, deep, progress).await?;

        records
            .into_iter()
            .map(|record| {
                serde_json::from_value::<TagRecord>(record)
                    .map(|tag| Tag {
                        name: tag.name,
                        title: tag.commit.title,
                    })
                    .map_err(ChartpinError::from)
            })
            .collect()
    }

    /// Fetch the tags of every given project, one project at a time.
    ///
    /// The progress bar advances once per project. Failures are not
    /// tolerated here; a project whose tags cannot be fetched aborts the
    /// run, since a partial tag picture would silently skip charts.
    pub async fn project_tags(
        &self,
        projects: &[Project],
        deep: bool,
        progress: &ProgressBar,
    ) -> Result<Vec<ProjectTags>> {
        let mut sets = Vec::with_capacity(projects.len());
        for project in projects {
            let tags = self.tags(project, deep, progress).await?;
            debug!("project '{}' has {} tag(s)", project.name, tags.len());
            sets.push(ProjectTags {
                project: project.clone(),
                tags,
            });
            progress.inc(1);
        }
        Ok(sets)
    }

    /// Look up a branch of a project identified by `group` and `name`.
    ///
    /// # Errors
    ///
    /// [`ChartpinError::BranchNotFound`] when the server answers 404 or with
    /// a branch record whose name differs from the requested one.
    pub async fn branch(&self, group: &str, name: &str, branch: &str) -> Result<Branch> {
        let project_id = self.project_id(group, name).await?;
        let operation = format!("look up branch '{branch}' of '{group}/{name}'");
        let uri = self
            .urls
            .branch
            .replace("{id}", &project_id.to_string())
            .replace("{branch}", branch);

        let response = self.http.request(&uri, &operation).await?;
        match response.status().as_u16() {
            200 => {
                let record: Branch = self.read_json(response, &uri, &operation).await?;
                if record.name == branch {
                    Ok(record)
                } else {
                    warn!("branch lookup for '{branch}' answered with '{}'", record.name);
                    Err(ChartpinError::BranchNotFound {
                        branch: branch.to_string(),
                        instance: self.instance.clone(),
                    })
                }
            }
            404 => {
                warn!("branch '{branch}' does not exist on {}", self.instance);
                Err(ChartpinError::BranchNotFound {
                    branch: branch.to_string(),
                    instance: self.instance.clone(),
                })
            }
            status => {
                warn!("{operation}: HTTP {status} from {uri}");
                Err(ChartpinError::FetchFailed {
                    operation,
                    status,
                    uri,
                })
            }
        }
    }

    /// Download a raw file from a repository branch.
    ///
    /// `project` is the full `group/name` path, `dir` the directory inside
    /// the repository.
    pub async fn raw_file(
        &self,
        project: &str,
        branch: &str,
        dir: &str,
        file: &str,
    ) -> Result<String> {
        let operation = format!("download '{file}' from '{project}' at '{branch}'");
        let uri = self
            .urls
            .raw_file
            .replace("{project}", project)
            .replace("{branch}", branch)
            .replace("{path}", dir.trim_matches('/'))
            .replace("{file}", file);

        let response = self.http.request_ok(&uri, &operation).await?;
        response
            .text()
            .await
            .map_err(|e| ChartpinError::RequestFailed {
                operation,
                uri,
                reason: format!("could not read response body: {e}"),
            })
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
        uri: &str,
        operation: &str,
    ) -> Result<T> {
        response.json::<T>().await.map_err(|e| {
            warn!("{operation}: unusable response payload from {uri}: {e}");
            ChartpinError::RequestFailed {
                operation: operation.to_string(),
                uri: uri.to_string(),
                reason: format!("unusable response payload: {e}"),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn templates_substitute_into_expected_uris() {
        let urls = UrlTemplates::for_instance("https://gitlab.example.com");

        assert_eq!(
            urls.group.replace("{group}", "ntas"),
            "https://gitlab.example.com/api/v4/groups/ntas"
        );
        assert_eq!(
            urls.subgroups
                .replace("{group}", "ntas")
                .replace("{page}", "2"),
            "https://gitlab.example.com/api/v4/groups/ntas/subgroups?page=2&per_page=50"
        );
        assert_eq!(
            urls.project_search
                .replace("{id}", "7")
                .replace("{name}", "kubernetes"),
            "https://gitlab.example.com/api/v4/groups/7/projects?search=kubernetes"
        );
        assert_eq!(
            urls.project_tags
                .replace("{id}", "42")
                .replace("{page}", "1"),
            "https://gitlab.example.com/api/v4/projects/42/repository/tags?order_by=updated&page=1&per_page=50"
        );
        assert_eq!(
            urls.raw_file
                .replace("{project}", "tas/kubernetes")
                .replace("{branch}", "main")
                .replace("{path}", "helm/ntas")
                .replace("{file}", "requirements.yaml"),
            "https://gitlab.example.com/tas/kubernetes/raw/main/helm/ntas/requirements.yaml"
        );
    }

    #[test]
    fn trailing_slash_on_base_url_is_ignored() {
        let urls = UrlTemplates::for_instance("https://gitlab.example.com/");
        assert_eq!(
            urls.group.replace("{group}", "ntas"),
            "https://gitlab.example.com/api/v4/groups/ntas"
        );
    }

    #[test]
    fn tag_records_flatten_commit_titles() {
        let record = json!({
            "name": "9.2.0",
            "message": "",
            "commit": {
                "id": "f00dcafe",
                "title": "release-9.2 weekly build"
            },
            "release": null
        });
        let tag: TagRecord = serde_json::from_value(record).unwrap();
        assert_eq!(tag.name, "9.2.0");
        assert_eq!(tag.commit.title, "release-9.2 weekly build");
    }

    #[test]
    fn project_records_ignore_extra_fields() {
        let record = json!({
            "id": 101,
            "name": "helm-database",
            "path_with_namespace": "ntas/helm/helm-database",
            "default_branch": "main"
        });
        let project: Project = serde_json::from_value(record).unwrap();
        assert_eq!(
            project,
            Project {
                id: 101,
                name: "helm-database".to_string()
            }
        );
    }
}
