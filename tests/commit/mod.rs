//! Tests for sigcommit's `commit` command, run against a mock GitHub API

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::mock_github::*;
use super::*;
use pretty_assertions::assert_eq;

fn commit_cmd(server: &MockServer, env: &TestEnv) -> Command {
    let greeting = env.file("greeting.txt", "hello, world\n");
    let mut cmd = sigcommit!(
        "commit",
        "--owner",
        OWNER,
        "--repo",
        REPO,
        "--branch",
        BRANCH,
        "-m",
        "add greeting",
        "--author-name",
        "Jane Doe",
        "--author-email",
        "jane@example.com",
        "--time",
        "1700000000",
        "--tz-offset",
        "-0530",
        "--api-url",
        server.uri()
    );
    cmd.arg("--file")
        .arg(format!("greeting.txt={}", greeting.path().display()))
        .arg("--signing-key")
        .arg(key_fixture("jane_ed25519"));
    cmd
}

#[tokio::test]
async fn commit_json_format() {
    let server = MockServer::start().await;
    mount_rate_limit(&server).await;
    mount_branch(&server).await;
    mount_tree(&server, 1).await;
    mount_commit(&server, CommitResponder { tamper: false }).await;
    mount_ref_update(&server, 1).await;

    let env = TestEnv::new();
    let assert = commit_cmd(&server, &env)
        .args(["--format", "json"])
        .env("SIGCOMMIT_GITHUB_TOKEN", TOKEN)
        .assert()
        .success();

    let output: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(output["commit_id"], NEW_COMMIT);
    assert_eq!(output["parent"], HEAD);
    assert_eq!(output["tree"], NEW_TREE);
    assert_eq!(output["key_id"], JANE_KEY_ID);
    assert_eq!(
        output["remote"],
        json!({
            "verified": false,
            "reason": "unknown_key",
            "payload_compared": true,
            "signature_checked": true
        })
    );

    let body = commit_request(&server).await;
    assert_eq!(output["payload"], reconstruct_payload(&body));
}

#[tokio::test]
async fn commit_human_format() {
    let server = MockServer::start().await;
    mount_rate_limit(&server).await;
    mount_branch(&server).await;
    mount_tree(&server, 1).await;
    mount_commit(&server, CommitResponder { tamper: false }).await;
    mount_ref_update(&server, 1).await;

    let env = TestEnv::new();
    commit_cmd(&server, &env)
        .env("SIGCOMMIT_GITHUB_TOKEN", TOKEN)
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Commit: {NEW_COMMIT}\n")))
        .stdout(predicate::str::contains(format!("Signed with: {JANE_KEY_ID}\n")))
        .stdout(predicate::str::contains("Remote verification: unverified (unknown_key)\n"))
        .stderr(predicate::str::contains("unverified"));
}

#[tokio::test]
async fn commit_without_token() {
    let server = MockServer::start().await;

    let env = TestEnv::new();
    commit_cmd(&server, &env)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("SIGCOMMIT_GITHUB_TOKEN"));

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn commit_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rate_limit"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("Retry-After", "60")
                .set_body_json(json!({ "message": "API rate limit exceeded" })),
        )
        .mount(&server)
        .await;

    let env = TestEnv::new();
    commit_cmd(&server, &env)
        .env("SIGCOMMIT_GITHUB_TOKEN", TOKEN)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Rate limit exceeded"))
        .stderr(predicate::str::contains("request was rate-limited: API rate limit exceeded"));
}

#[tokio::test]
async fn commit_missing_local_file() {
    let server = MockServer::start().await;

    let env = TestEnv::new();
    sigcommit!(
        "commit",
        "--owner",
        OWNER,
        "--repo",
        REPO,
        "--branch",
        BRANCH,
        "-m",
        "add greeting",
        "--author-name",
        "Jane Doe",
        "--author-email",
        "jane@example.com",
        "--api-url",
        server.uri()
    )
    .arg("--file")
    .arg(format!("greeting.txt={}", env.child("missing.txt").path().display()))
    .arg("--signing-key")
    .arg(key_fixture("jane_ed25519"))
    .env("SIGCOMMIT_GITHUB_TOKEN", TOKEN)
    .assert()
    .failure()
    .code(2)
    .stderr(predicate::str::contains("Failed to read"));

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[test]
fn commit_bad_file_spec() {
    sigcommit!(
        "commit",
        "--owner",
        OWNER,
        "--repo",
        REPO,
        "--branch",
        BRANCH,
        "-m",
        "add greeting",
        "--author-name",
        "Jane Doe",
        "--author-email",
        "jane@example.com",
        "--file",
        "greeting.txt"
    )
    .assert()
    .failure()
    .code(2)
    .stderr(predicate::str::contains("REPO_PATH=LOCAL_PATH"));
}
