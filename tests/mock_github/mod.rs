//! A mock of the parts of the GitHub REST API used for publishing commits

use chrono::DateTime;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use super::*;
use pretty_assertions::assert_eq;

pub const TOKEN: &str = "test-token";
pub const OWNER: &str = "octo";
pub const REPO: &str = "hello";
pub const BRANCH: &str = "main";

/// The head commit of the mocked branch, whose tree is `EMPTY_TREE`
pub const HEAD: &str = "7fd1a60b01f91b314f59955a4e4d4e80d8edf11d";
pub const NEW_TREE: &str = "3d21ec53a331a6f037a91c368710b99387d012c1";
pub const NEW_COMMIT: &str = "7638417db6d59f3c431d3e1f261cc637155684cd";

/// Rebuild the commit payload from the fields of a create-commit request, the way the platform
/// does when it checks a signature.
pub fn reconstruct_payload(body: &Value) -> String {
    let mut out = format!("tree {}\n", body["tree"].as_str().unwrap());
    for parent in body["parents"].as_array().unwrap() {
        out.push_str(&format!("parent {}\n", parent.as_str().unwrap()));
    }
    for role in ["author", "committer"] {
        let actor = &body[role];
        let date = DateTime::parse_from_rfc3339(actor["date"].as_str().unwrap()).unwrap();
        let minutes = date.offset().local_minus_utc() / 60;
        let sign = if minutes < 0 { '-' } else { '+' };
        out.push_str(&format!(
            "{role} {} <{}> {} {sign}{:02}{:02}\n",
            actor["name"].as_str().unwrap(),
            actor["email"].as_str().unwrap(),
            date.timestamp(),
            minutes.abs() / 60,
            minutes.abs() % 60,
        ));
    }
    out.push('\n');
    out.push_str(body["message"].as_str().unwrap());
    out
}

/// Responds to create-commit requests with the platform's view of the commit.
pub struct CommitResponder {
    /// Report a payload with an extra trailing newline
    pub tamper: bool,
}

impl Respond for CommitResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = request.body_json().expect("commit request should be JSON");
        let mut payload = reconstruct_payload(&body);
        if self.tamper {
            payload.push('\n');
        }
        let parents: Vec<Value> = body["parents"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| json!({ "sha": p }))
            .collect();

        ResponseTemplate::new(201).set_body_json(json!({
            "sha": NEW_COMMIT,
            "html_url": format!("https://github.com/{OWNER}/{REPO}/commit/{NEW_COMMIT}"),
            "tree": { "sha": body["tree"] },
            "parents": parents,
            "message": body["message"],
            "author": body["author"],
            "committer": body["committer"],
            "verification": {
                "verified": false,
                "reason": "unknown_key",
                "signature": body["signature"],
                "payload": payload
            }
        }))
    }
}

pub async fn mount_rate_limit(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/rate_limit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "rate": { "limit": 5000, "remaining": 4999, "reset": 1700003600, "used": 1 }
        })))
        .mount(server)
        .await;
}

pub async fn mount_branch(server: &MockServer) {
    mount_branch_at(server, BRANCH).await;
}

/// Serve the head of a branch whose request path ends with `branch_path`, as sent on the wire.
pub async fn mount_branch_at(server: &MockServer, branch_path: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{OWNER}/{REPO}/branches/{branch_path}")))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": BRANCH,
            "commit": {
                "sha": HEAD,
                "commit": { "tree": { "sha": EMPTY_TREE } }
            },
            "protected": false
        })))
        .expect(1)
        .mount(server)
        .await;
}

/// Expect a single tree creation adding `greeting.txt`, or none at all.
pub async fn mount_tree(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(format!("/repos/{OWNER}/{REPO}/git/trees")))
        .and(body_json(json!({
            "base_tree": EMPTY_TREE,
            "tree": [
                { "path": "greeting.txt", "mode": "100644", "type": "blob", "content": "hello, world\n" }
            ]
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({ "sha": NEW_TREE, "truncated": false })),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

pub async fn mount_commit(server: &MockServer, responder: CommitResponder) {
    Mock::given(method("POST"))
        .and(path(format!("/repos/{OWNER}/{REPO}/git/commits")))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(responder)
        .expect(1)
        .mount(server)
        .await;
}

pub async fn mount_ref_update(server: &MockServer, expected_calls: u64) {
    mount_ref_update_at(server, BRANCH, expected_calls).await;
}

pub async fn mount_ref_update_at(server: &MockServer, branch_path: &str, expected_calls: u64) {
    Mock::given(method("PATCH"))
        .and(path(format!("/repos/{OWNER}/{REPO}/git/refs/heads/{branch_path}")))
        .and(body_json(json!({ "sha": NEW_COMMIT, "force": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ref": format!("refs/heads/{branch_path}"),
            "object": { "sha": NEW_COMMIT, "type": "commit" }
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// The body of the single create-commit request the server received.
pub async fn commit_request(server: &MockServer) -> Value {
    let requests = server.received_requests().await.unwrap();
    let commits: Vec<&Request> = requests
        .iter()
        .filter(|r| r.url.path().ends_with("/git/commits"))
        .collect();
    assert_eq!(commits.len(), 1);
    commits[0].body_json().unwrap()
}
