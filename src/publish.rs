//! Publishing a signed commit to a branch through the hosting API.

use anyhow::{bail, Context};
use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{Config, RepoTarget};
use crate::github::models::{GitActor, GitCommit, NewCommit, NewTree, NewTreeEntry, UpdateReference};
use crate::github::{self, Client, ClientBuilder};
use crate::signing::{self, DetachedSignature, KeyId, VerifyingKey};
use crate::{CommitIdentity, CommitPayload, ObjectId};

// -------------------------------------------------------------------------------------------------
// PublishRequest
// -------------------------------------------------------------------------------------------------
/// A file to add or replace in the new commit's tree
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileEntry {
    /// Path within the repository, using `/` as separator
    pub path: String,
    pub content: String,
}

/// What to commit
#[derive(Clone, Debug)]
pub struct PublishRequest {
    pub message: String,
    /// Files to add on top of the branch head's tree; if empty, the head's tree is reused
    pub files: Vec<FileEntry>,
}

// -------------------------------------------------------------------------------------------------
// PublishedCommit
// -------------------------------------------------------------------------------------------------
#[derive(Debug, Serialize)]
pub struct PublishedCommit {
    pub commit_id: ObjectId,
    pub parent: ObjectId,
    pub tree: ObjectId,
    pub key_id: KeyId,
    pub html_url: Option<String>,
    /// The exact signed bytes
    pub payload: String,
    pub remote: RemoteVerification,
}

/// What the platform said about the new commit's signature, and what was checked locally
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RemoteVerification {
    /// `None` if the platform returned no verification result
    pub verified: Option<bool>,
    pub reason: Option<String>,
    /// The platform's reconstructed payload was compared with the local payload and matched
    pub payload_compared: bool,
    /// The signature stored by the platform was verified locally against its payload
    pub signature_checked: bool,
}

// -------------------------------------------------------------------------------------------------
// publish
// -------------------------------------------------------------------------------------------------
/// Create a signed commit on top of the configured branch and move the branch to it.
///
/// The branch is only moved once the commit's signature has been checked locally, both before
/// creation and against what the platform reports back.
pub async fn publish_signed_commit(
    client: &Client,
    config: &Config,
    request: &PublishRequest,
    now: DateTime<FixedOffset>,
) -> anyhow::Result<PublishedCommit> {
    let RepoTarget {
        owner,
        repo,
        branch,
    } = &config.target;

    let head = client
        .get_branch(owner, repo, branch)
        .await
        .with_context(|| format!("Failed to look up branch {}", config.target))?;
    let parent = head.commit.sha;
    let base_tree = head.commit.commit.tree.sha;
    debug!("Head of {} is {parent} with tree {base_tree}", config.target);

    let tree = if request.files.is_empty() {
        base_tree
    } else {
        let new_tree = NewTree {
            base_tree,
            tree: request
                .files
                .iter()
                .map(|f| NewTreeEntry::file(&f.path, &f.content))
                .collect(),
        };
        let tree = client
            .create_tree(owner, repo, &new_tree)
            .await
            .context("Failed to create tree")?;
        debug!("Created tree {} with {} new entries", tree.sha, request.files.len());
        tree.sha
    };

    let author = config.author.at(&now)?;
    let committer = config.committer().at(&now)?;
    let payload = CommitPayload::new(tree, Some(parent), author, committer, request.message.as_str());
    let payload_text = payload.serialize();

    let signature = signing::sign(payload_text.as_bytes(), &config.keys.signing_key)
        .context("Failed to sign commit payload")?;
    let verifying_key = config.keys.verifying_key();
    let key_id = signing::verify(payload_text.as_bytes(), &signature, &verifying_key)
        .context("Failed to verify signature locally")?;
    info!("Signed commit payload with {key_id}");

    // The stored message is exactly the payload's message section.
    let message = format!("{}\n", payload.message());
    let new_commit = NewCommit {
        message: &message,
        tree,
        parents: vec![parent],
        author: git_actor(payload.author())?,
        committer: git_actor(payload.committer())?,
        signature: Some(signature.as_str()),
    };
    let commit = client
        .create_commit(owner, repo, &new_commit)
        .await
        .context("Failed to create commit")?;
    info!("Created commit {}", commit.sha);

    let remote = check_remote(&commit, payload_text.as_bytes(), &verifying_key)
        .with_context(|| format!("Commit {} was created but not published", commit.sha))?;

    let update = UpdateReference {
        sha: commit.sha,
        force: false,
    };
    client
        .update_ref(owner, repo, branch, &update)
        .await
        .with_context(|| format!("Failed to update {} to {}", config.target, commit.sha))?;
    info!("Updated {} to {}", config.target, commit.sha);

    Ok(PublishedCommit {
        commit_id: commit.sha,
        parent,
        tree,
        key_id,
        html_url: commit.html_url,
        payload: payload_text,
        remote,
    })
}

/// Publish a signed commit, creating the API client and async runtime.
///
/// The access token is taken from the `SIGCOMMIT_GITHUB_TOKEN` environment variable.
pub fn run_blocking(
    config: &Config,
    request: &PublishRequest,
    now: DateTime<FixedOffset>,
) -> anyhow::Result<PublishedCommit> {
    let client = ClientBuilder::new()
        .base_url(config.api.url.clone())
        .context("Failed to set API base URL")?
        .ignore_certs(config.api.ignore_certs)
        .token_from_env()
        .context("Failed to load access token from environment")?
        .build()
        .context("Failed to initialize GitHub client")?;

    if !client.is_authenticated() {
        bail!("No access token given; set the {} environment variable", ClientBuilder::TOKEN_ENV_VAR);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to initialize async runtime")?;

    let result = runtime.block_on(async {
        // Connectivity and authentication problems show up here first.
        let rate_limit = client
            .get_rate_limit()
            .await
            .context("Failed to query rate limits")?;
        debug!("GitHub rate limits: {:?}", rate_limit.rate);

        publish_signed_commit(&client, config, request, now).await
    });

    if let Err(err) = &result {
        if let Some(github::Error::RateLimited { wait, .. }) = err.downcast_ref::<github::Error>() {
            warn!("Rate limit exceeded: Would need to wait for {wait:?} before retrying");
        }
    }
    result
}

/// Express an identity the way the API expects it, with an ISO-8601 date in the identity's own
/// offset.
fn git_actor(identity: &CommitIdentity) -> crate::Result<GitActor> {
    Ok(GitActor {
        name: identity.name().to_string(),
        email: identity.email().to_string(),
        date: identity.datetime()?.to_rfc3339_opts(SecondsFormat::Secs, false),
    })
}

/// Check what the platform reports for a newly created commit.
///
/// A reconstructed payload that differs from the local one, or a stored signature that does not
/// verify, is an error. The platform's own `verified` flag only produces a warning, since it
/// depends on the key being registered with the account.
fn check_remote(
    commit: &GitCommit,
    payload: &[u8],
    key: &VerifyingKey,
) -> anyhow::Result<RemoteVerification> {
    let Some(verification) = &commit.verification else {
        warn!("No verification result returned for commit {}", commit.sha);
        return Ok(RemoteVerification::default());
    };

    let mut report = RemoteVerification {
        verified: Some(verification.verified),
        reason: Some(verification.reason.clone()),
        ..Default::default()
    };

    if let Some(remote_payload) = &verification.payload {
        let remote_payload = remote_payload.as_bytes();
        if let Some(pos) = first_difference(payload, remote_payload) {
            warn!(
                "Remote payload differs at byte {pos}: local {:?}, remote {:?}",
                excerpt(payload, pos),
                excerpt(remote_payload, pos),
            );
            bail!("Platform reconstructed a different commit payload (first difference at byte {pos})");
        }
        report.payload_compared = true;

        if let Some(remote_signature) = &verification.signature {
            let remote_signature = DetachedSignature::from_armored(remote_signature)
                .context("Failed to parse signature stored by the platform")?;
            signing::verify(remote_payload, &remote_signature, key)
                .context("Signature stored by the platform does not verify")?;
            report.signature_checked = true;
        }
    }

    if verification.verified {
        info!("Platform verified the signature of {}", commit.sha);
    } else {
        warn!(
            "Platform reports the signature of {} as unverified ({}); is the key registered as a signing key?",
            commit.sha, verification.reason
        );
    }

    Ok(report)
}

/// The index of the first byte at which `a` and `b` differ, or `None` if they are equal.
pub fn first_difference(a: &[u8], b: &[u8]) -> Option<usize> {
    match a.iter().zip(b).position(|(x, y)| x != y) {
        Some(pos) => Some(pos),
        None if a.len() != b.len() => Some(a.len().min(b.len())),
        None => None,
    }
}

/// A few bytes around `pos`, for logging.
fn excerpt(bytes: &[u8], pos: usize) -> String {
    let start = pos.saturating_sub(16).min(bytes.len());
    let end = (pos + 16).min(bytes.len());
    String::from_utf8_lossy(&bytes[start..end]).into_owned()
}
