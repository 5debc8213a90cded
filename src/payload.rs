//! The canonical text of a Git commit object, which is what a commit signature covers.

use lazy_static::lazy_static;
use regex::Regex;

use crate::{CommitIdentity, Error, ObjectId, Result, TzOffset};

// -------------------------------------------------------------------------------------------------
// CommitPayload
// -------------------------------------------------------------------------------------------------
/// The fields of a commit that a signature covers.
///
/// The serialized form is byte-for-byte what Git (and the hosting platform) reconstructs from the
/// stored commit metadata, so it must not change once a signature has been computed over it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitPayload {
    tree: ObjectId,
    parent: Option<ObjectId>,
    author: CommitIdentity,
    committer: CommitIdentity,
    message: String,
}

impl CommitPayload {
    /// Create a new payload.
    ///
    /// Trailing newlines are removed from the message; serialization adds back exactly one.
    pub fn new(
        tree: ObjectId,
        parent: Option<ObjectId>,
        author: CommitIdentity,
        committer: CommitIdentity,
        message: impl Into<String>,
    ) -> Self {
        let mut message = message.into();
        let trimmed_len = message.trim_end_matches('\n').len();
        message.truncate(trimmed_len);
        CommitPayload {
            tree,
            parent,
            author,
            committer,
            message,
        }
    }

    #[inline]
    pub fn tree(&self) -> &ObjectId {
        &self.tree
    }

    #[inline]
    pub fn parent(&self) -> Option<&ObjectId> {
        self.parent.as_ref()
    }

    #[inline]
    pub fn author(&self) -> &CommitIdentity {
        &self.author
    }

    #[inline]
    pub fn committer(&self) -> &CommitIdentity {
        &self.committer
    }

    /// The normalized message, without a trailing newline
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Serialize to the canonical commit text.
    pub fn serialize(&self) -> String {
        let mut buf = String::with_capacity(256 + self.message.len());
        buf.push_str("tree ");
        buf.push_str(&self.tree.hex());
        buf.push('\n');
        if let Some(parent) = &self.parent {
            buf.push_str("parent ");
            buf.push_str(&parent.hex());
            buf.push('\n');
        }
        buf.push_str(&format!("author {}\n", self.author));
        buf.push_str(&format!("committer {}\n", self.committer));
        buf.push('\n');
        buf.push_str(&self.message);
        buf.push('\n');
        buf
    }

    /// The exact bytes to sign.
    #[inline]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.serialize().into_bytes()
    }

    /// Parse canonical commit text, as produced by `serialize`.
    ///
    /// Only the headers that `serialize` emits are accepted, in the same order.
    pub fn parse(text: &str) -> Result<Self> {
        let (headers, message) = text
            .split_once("\n\n")
            .ok_or_else(|| bad_payload("missing blank line between headers and message"))?;
        let message = message
            .strip_suffix('\n')
            .ok_or_else(|| bad_payload("message must end with a newline"))?;
        if message.ends_with('\n') {
            return Err(bad_payload("message must end with exactly one newline"));
        }

        let mut lines = headers.split('\n').peekable();

        let tree = match lines.next().and_then(|l| l.strip_prefix("tree ")) {
            Some(v) => ObjectId::from_hex(v)?,
            None => return Err(bad_payload("expected `tree` header first")),
        };

        let parent = match lines.peek().and_then(|l| l.strip_prefix("parent ")) {
            Some(v) => {
                let parent = ObjectId::from_hex(v)?;
                lines.next();
                Some(parent)
            }
            None => None,
        };

        let author = match lines.next().and_then(|l| l.strip_prefix("author ")) {
            Some(v) => parse_identity(v)?,
            None => return Err(bad_payload("expected `author` header")),
        };

        let committer = match lines.next().and_then(|l| l.strip_prefix("committer ")) {
            Some(v) => parse_identity(v)?,
            None => return Err(bad_payload("expected `committer` header")),
        };

        if let Some(extra) = lines.next() {
            return Err(bad_payload(format!("unexpected header line {extra:?}")));
        }

        Ok(CommitPayload::new(tree, parent, author, committer, message))
    }
}

impl std::fmt::Display for CommitPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.serialize())
    }
}

impl std::str::FromStr for CommitPayload {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

lazy_static! {
    static ref IDENTITY_PATTERN: Regex =
        Regex::new(r"^(?P<name>[^<>\n]+) <(?P<email>[^<>\n]+)> (?P<seconds>-?[0-9]+) (?P<offset>[+-][0-9]{4})$")
            .expect("identity regex should compile");
}

fn parse_identity(line: &str) -> Result<CommitIdentity> {
    let captures = IDENTITY_PATTERN
        .captures(line)
        .ok_or_else(|| bad_payload(format!("ill-formed identity {line:?}")))?;
    let seconds: i64 = captures["seconds"]
        .parse()
        .map_err(|e| bad_payload(format!("ill-formed timestamp in {line:?}: {e}")))?;
    let offset: TzOffset = captures["offset"].parse()?;
    CommitIdentity::new(&captures["name"], &captures["email"], seconds, offset)
}

fn bad_payload(reason: impl Into<String>) -> Error {
    Error::validation("commit payload", reason)
}
