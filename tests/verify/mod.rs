//! Tests for sigcommit's `verify` command

use super::*;
use pretty_assertions::assert_eq;

fn verify_cmd(payload: &Path, signature: &Path) -> Command {
    sigcommit!("verify", "--payload-file", payload, "--signature-file", signature)
}

#[test]
fn good_signature() {
    verify_cmd(&fixture("hello_payload.txt"), &fixture("hello_payload.sig"))
        .arg("--verifying-key")
        .arg(key_fixture("jane_ed25519.pub"))
        .assert()
        .success()
        .stdout(predicate::str::diff(format!("Good signature from {JANE_KEY_ID}\n")))
        .stderr(is_empty());
}

#[test]
fn key_from_env() {
    let key = std::fs::read_to_string(key_fixture("jane_ed25519.pub")).unwrap();
    verify_cmd(&fixture("hello_payload.txt"), &fixture("hello_payload.sig"))
        .env("SIGCOMMIT_VERIFYING_KEY", key)
        .assert()
        .success()
        .stdout(predicate::str::diff(format!("Good signature from {JANE_KEY_ID}\n")));
}

#[test]
fn no_key() {
    verify_cmd(&fixture("hello_payload.txt"), &fixture("hello_payload.sig"))
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("No verifying key given"));
}

#[test]
fn json_format() {
    let assert = verify_cmd(&fixture("hello_payload.txt"), &fixture("hello_payload.sig"))
        .args(["--format", "json", "--verifying-key"])
        .arg(key_fixture("jane_ed25519.pub"))
        .assert()
        .success();
    let output: serde_json::Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(output, serde_json::json!({ "key_id": JANE_KEY_ID }));
}

#[test]
fn modified_payload() {
    let env = TestEnv::new();
    let original = std::fs::read_to_string(fixture("hello_payload.txt")).unwrap();
    let payload = env.file("payload.txt", &original.replace("hello", "hellO"));

    verify_cmd(payload.path(), &fixture("hello_payload.sig"))
        .arg("--verifying-key")
        .arg(key_fixture("jane_ed25519.pub"))
        .assert()
        .failure()
        .code(2)
        .stdout(is_empty())
        .stderr(predicate::str::contains("Signature verification failed"));
}

#[test]
fn missing_trailing_newline() {
    let env = TestEnv::new();
    let original = std::fs::read_to_string(fixture("hello_payload.txt")).unwrap();
    let payload = env.file("payload.txt", original.trim_end());

    verify_cmd(payload.path(), &fixture("hello_payload.sig"))
        .arg("--verifying-key")
        .arg(key_fixture("jane_ed25519.pub"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Signature verification failed"));
}

#[test]
fn wrong_key() {
    verify_cmd(&fixture("hello_payload.txt"), &fixture("hello_payload.sig"))
        .arg("--verifying-key")
        .arg(key_fixture("mallory_ed25519.pub"))
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("not made by the given key"));
}

#[test]
fn armor_headers_and_crlf_are_accepted() {
    let env = TestEnv::new();
    let original = std::fs::read_to_string(fixture("hello_payload.sig")).unwrap();
    let decorated = original
        .replacen(
            "-----BEGIN SSH SIGNATURE-----\n",
            "-----BEGIN SSH SIGNATURE-----\nComment: made by hand\n\n",
            1,
        )
        .replace('\n', "\r\n");
    let signature = env.file("decorated.sig", &decorated);

    verify_cmd(&fixture("hello_payload.txt"), signature.path())
        .arg("--verifying-key")
        .arg(key_fixture("jane_ed25519.pub"))
        .assert()
        .success()
        .stdout(predicate::str::diff(format!("Good signature from {JANE_KEY_ID}\n")));
}

#[test]
fn garbage_signature() {
    let env = TestEnv::new();
    let signature = env.file("garbage.sig", "this is not a signature\n");

    verify_cmd(&fixture("hello_payload.txt"), signature.path())
        .arg("--verifying-key")
        .arg(key_fixture("jane_ed25519.pub"))
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("cannot parse signature"));
}

#[test]
fn gpg_signature() {
    verify_cmd(&fixture("hello_payload.txt"), &fixture("hello_payload.pgp.asc"))
        .arg("--verifying-key")
        .arg(key_fixture("jane_pgp.pub.asc"))
        .assert()
        .success()
        .stdout(predicate::str::diff(format!("Good signature from {JANE_PGP_KEY_ID}\n")))
        .stderr(is_empty());
}

#[test]
fn gpg_signature_wrong_key() {
    verify_cmd(&fixture("hello_payload.txt"), &fixture("hello_payload.pgp.asc"))
        .arg("--verifying-key")
        .arg(key_fixture("mallory_pgp.pub.asc"))
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("not made by the given key"));
}

#[test]
fn gpg_signature_with_ssh_key() {
    verify_cmd(&fixture("hello_payload.txt"), &fixture("hello_payload.pgp.asc"))
        .arg("--verifying-key")
        .arg(key_fixture("jane_ed25519.pub"))
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("OpenPGP signature cannot be checked with SSH key"));
}
