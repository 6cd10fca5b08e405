//! Common test utilities for chartpin integration tests
//!
//! Wraps a [`wiremock::MockServer`] in helpers that mount the GitLab
//! endpoints the update pipeline talks to, so individual tests only
//! describe the data they care about.

// Allow dead code because these utilities are shared across test files
// and not all of them are used in every test binary
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub use chartpin_cli::test_utils::{init_test_logging, sample_manifest, temp_workdir};

/// Build a tag record shaped like GitLab's repository tags endpoint.
pub fn tag_record(name: &str, title: &str) -> Value {
    json!({
        "name": name,
        "commit": {
            "id": "d0a3f1c2",
            "title": title,
        },
    })
}

/// Build a project record shaped like GitLab's group projects endpoint.
pub fn project_record(id: u64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "path_with_namespace": format!("ntas/helm/{name}"),
    })
}

/// A mock GitLab instance with helpers for the endpoints chartpin reads.
pub struct MockGitlab {
    pub server: MockServer,
}

impl MockGitlab {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL for pointing a client (or the CLI) at this instance.
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Mount consecutive pages of a paginated endpoint, plus the empty
    /// page that terminates a deep walk.
    pub async fn mount_pages(&self, endpoint: &str, pages: Vec<Vec<Value>>) {
        let terminator = pages.len() + 1;
        for (idx, records) in pages.into_iter().enumerate() {
            Mock::given(method("GET"))
                .and(path(endpoint))
                .and(query_param("page", (idx + 1).to_string()))
                .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(records)))
                .mount(&self.server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path(endpoint))
            .and(query_param("page", terminator.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&self.server)
            .await;
    }

    /// Mount the subgroup listing for a group as a single page.
    pub async fn mount_subgroups(&self, group: &str, subgroups: Vec<Value>) {
        self.mount_pages(&format!("/api/v4/groups/{group}/subgroups"), vec![subgroups])
            .await;
    }

    /// Mount the project listing for a (numeric) group id as a single page.
    pub async fn mount_projects(&self, group_id: u64, projects: Vec<Value>) {
        self.mount_pages(&format!("/api/v4/groups/{group_id}/projects"), vec![projects])
            .await;
    }

    /// Mount the tag listing for a project, one mock per page.
    pub async fn mount_tags(&self, project_id: u64, pages: Vec<Vec<Value>>) {
        self.mount_pages(
            &format!("/api/v4/projects/{project_id}/repository/tags"),
            pages,
        )
        .await;
    }

    /// Mount the group lookup endpoint resolving a group name to its id.
    pub async fn mount_group(&self, group: &str, id: u64) {
        Mock::given(method("GET"))
            .and(path(format!("/api/v4/groups/{group}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": id,
                "name": group,
                "path": group,
            })))
            .mount(&self.server)
            .await;
    }

    /// Mount the project search endpoint used to look a project up by name
    /// within a (numeric) group id.
    pub async fn mount_project_search(&self, group_id: u64, name: &str, results: Vec<Value>) {
        Mock::given(method("GET"))
            .and(path(format!("/api/v4/groups/{group_id}/projects")))
            .and(query_param("search", name))
            .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(results)))
            .mount(&self.server)
            .await;
    }

    /// Mount the branch lookup for a project, either found or missing.
    pub async fn mount_branch(&self, project_id: u64, branch: &str, exists: bool) {
        let response = if exists {
            ResponseTemplate::new(200).set_body_json(json!({
                "name": branch,
                "merged": false,
            }))
        } else {
            ResponseTemplate::new(404).set_body_json(json!({
                "message": "404 Branch Not Found",
            }))
        };
        Mock::given(method("GET"))
            .and(path(format!(
                "/api/v4/projects/{project_id}/repository/branches/{branch}"
            )))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    /// Mount the raw-file endpoint serving a manifest body.
    pub async fn mount_raw_file(
        &self,
        project: &str,
        branch: &str,
        dir: &str,
        file: &str,
        body: &str,
    ) {
        Mock::given(method("GET"))
            .and(path(format!("/{project}/raw/{branch}/{dir}/{file}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&self.server)
            .await;
    }
}

/// Mount the deploy-project group, search, and branch lookup on the legacy
/// instance.
pub async fn mount_deploy_lookup(legacy: &MockGitlab, branch: &str, exists: bool) {
    legacy.mount_group("tas", 4).await;
    legacy
        .mount_project_search(4, "kubernetes", vec![project_record(9, "kubernetes")])
        .await;
    legacy.mount_branch(9, branch, exists).await;
}

/// Responder that replays a fixed sequence of status codes, then settles
/// on a 200 with the given JSON body for every later call.
#[derive(Clone)]
pub struct SeqResponder {
    calls: Arc<AtomicUsize>,
    statuses: Vec<u16>,
    body: Value,
}

impl SeqResponder {
    pub fn new(statuses: Vec<u16>, body: Value) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            statuses,
            body,
        }
    }

    /// Number of requests this responder has served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Respond for SeqResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let idx = self.calls.fetch_add(1, Ordering::SeqCst);
        match self.statuses.get(idx) {
            Some(status) => ResponseTemplate::new(*status),
            None => ResponseTemplate::new(200).set_body_json(self.body.clone()),
        }
    }
}
