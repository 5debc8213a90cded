use serde::{Deserialize, Serialize};

use crate::ObjectId;

// -------------------------------------------------------------------------------------------------
// ClientError
// -------------------------------------------------------------------------------------------------
#[derive(Debug, Deserialize)]
pub struct ClientError {
    pub message: String,
    pub documentation_url: Option<String>,
    pub errors: Option<Vec<ErrorDetail>>,
}

// -------------------------------------------------------------------------------------------------
// ErrorDetail
// -------------------------------------------------------------------------------------------------
#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    pub resource: Option<String>,
    pub field: Option<String>,
    pub code: ErrorCode,
    pub message: Option<String>,
}

impl std::fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.code)?;
        if let (Some(resource), Some(field)) = (&self.resource, &self.field) {
            write!(f, " {resource}.{field}")?;
        }
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------
// ErrorCode
// -------------------------------------------------------------------------------------------------
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Missing,
    MissingField,
    Invalid,
    AlreadyExists,
    Unprocessable,
    Custom,
    #[serde(other)]
    Other,
}

// -------------------------------------------------------------------------------------------------
// RateLimit
// -------------------------------------------------------------------------------------------------
#[derive(Debug, Deserialize)]
pub struct RateLimitOverview {
    pub rate: Rate,
}

// -------------------------------------------------------------------------------------------------
// Rate
// -------------------------------------------------------------------------------------------------
#[derive(Debug, Deserialize)]
pub struct Rate {
    pub limit: i64,
    pub remaining: i64,
    pub reset: i64,
    pub used: i64,
}

// -------------------------------------------------------------------------------------------------
// Branch
// -------------------------------------------------------------------------------------------------
#[derive(Debug, Deserialize)]
pub struct Branch {
    pub name: String,
    pub commit: BranchCommit,
    pub protected: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct BranchCommit {
    pub sha: ObjectId,
    pub commit: BranchCommitDetail,
}

#[derive(Debug, Deserialize)]
pub struct BranchCommitDetail {
    pub tree: ObjectRef,
}

// -------------------------------------------------------------------------------------------------
// ObjectRef
// -------------------------------------------------------------------------------------------------
/// A reference to a Git object by ID, as nested in many responses
#[derive(Debug, Deserialize)]
pub struct ObjectRef {
    pub sha: ObjectId,
}

// -------------------------------------------------------------------------------------------------
// Tree
// -------------------------------------------------------------------------------------------------
/// Request body for creating a tree
#[derive(Debug, Serialize)]
pub struct NewTree<'a> {
    pub base_tree: ObjectId,
    pub tree: Vec<NewTreeEntry<'a>>,
}

/// A blob entry with inline content
#[derive(Debug, Serialize)]
pub struct NewTreeEntry<'a> {
    pub path: &'a str,
    pub mode: &'static str,
    #[serde(rename = "type")]
    pub entry_type: &'static str,
    pub content: &'a str,
}

impl<'a> NewTreeEntry<'a> {
    /// A regular, non-executable file
    pub fn file(path: &'a str, content: &'a str) -> Self {
        NewTreeEntry {
            path,
            mode: "100644",
            entry_type: "blob",
            content,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Tree {
    pub sha: ObjectId,
    pub truncated: Option<bool>,
}

// -------------------------------------------------------------------------------------------------
// Commit
// -------------------------------------------------------------------------------------------------
/// Author or committer as sent to and returned by the API
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GitActor {
    pub name: String,
    pub email: String,
    /// ISO-8601 timestamp with offset
    pub date: String,
}

/// Request body for creating a commit
#[derive(Debug, Serialize)]
pub struct NewCommit<'a> {
    pub message: &'a str,
    pub tree: ObjectId,
    pub parents: Vec<ObjectId>,
    pub author: GitActor,
    pub committer: GitActor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct GitCommit {
    pub sha: ObjectId,
    pub html_url: Option<String>,
    pub tree: ObjectRef,
    pub parents: Vec<ObjectRef>,
    pub message: String,
    pub author: GitActor,
    pub committer: GitActor,
    pub verification: Option<Verification>,
}

/// The platform's own signature check of a commit
#[derive(Debug, Deserialize, Clone)]
pub struct Verification {
    pub verified: bool,
    pub reason: String,
    /// The armored signature as stored in the commit
    pub signature: Option<String>,
    /// The commit text the platform reconstructed and checked the signature against
    pub payload: Option<String>,
}

// -------------------------------------------------------------------------------------------------
// Reference
// -------------------------------------------------------------------------------------------------
/// Request body for moving a ref
#[derive(Debug, Serialize)]
pub struct UpdateReference {
    pub sha: ObjectId,
    pub force: bool,
}

#[derive(Debug, Deserialize)]
pub struct Reference {
    #[serde(rename = "ref")]
    pub name: String,
    pub object: ReferenceObject,
}

#[derive(Debug, Deserialize)]
pub struct ReferenceObject {
    pub sha: ObjectId,
    #[serde(rename = "type")]
    pub object_type: String,
}
