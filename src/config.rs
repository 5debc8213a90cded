//! Explicit configuration for publishing a signed commit.

use chrono::{DateTime, TimeZone};
use secrecy::SecretString;
use std::path::Path;
use tracing::debug;
use url::Url;

use crate::signing::{SigningKey, VerifyingKey};
use crate::{CommitIdentity, Error, Result, TzOffset};

/// Environment variable holding private key text (OpenSSH or armored OpenPGP), used when no key
/// file is given
pub const SIGNING_KEY_ENV_VAR: &str = "SIGCOMMIT_SIGNING_KEY";

/// Environment variable holding the passphrase of an encrypted private key
pub const KEY_PASSPHRASE_ENV_VAR: &str = "SIGCOMMIT_KEY_PASSPHRASE";

/// Environment variable holding public key text (OpenSSH or armored OpenPGP), used when no public
/// key file is given
pub const VERIFYING_KEY_ENV_VAR: &str = "SIGCOMMIT_VERIFYING_KEY";

// -------------------------------------------------------------------------------------------------
// Config
// -------------------------------------------------------------------------------------------------
/// Everything needed to publish a signed commit to a branch
#[derive(Debug)]
pub struct Config {
    pub target: RepoTarget,
    pub author: Person,
    /// The committer, if different from the author
    pub committer: Option<Person>,
    pub keys: KeyMaterial,
    pub api: ApiConfig,
}

impl Config {
    pub fn committer(&self) -> &Person {
        self.committer.as_ref().unwrap_or(&self.author)
    }
}

/// The branch to commit to
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepoTarget {
    pub owner: String,
    pub repo: String,
    pub branch: String,
}

impl std::fmt::Display for RepoTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}@{}", self.owner, self.repo, self.branch)
    }
}

/// Where the hosting API lives
#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub url: Url,
    pub ignore_certs: bool,
}

// -------------------------------------------------------------------------------------------------
// Person
// -------------------------------------------------------------------------------------------------
/// A name and email, not yet tied to a point in time
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Person {
    pub name: String,
    pub email: String,
}

impl Person {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Result<Self> {
        let person = Person {
            name: name.into(),
            email: email.into(),
        };
        // validate eagerly rather than at commit time
        CommitIdentity::new(person.name.as_str(), person.email.as_str(), 0, TzOffset::UTC)?;
        Ok(person)
    }

    /// Stamp this person with a time to get a commit identity.
    pub fn at<Tz: TimeZone>(&self, time: &DateTime<Tz>) -> Result<CommitIdentity> {
        CommitIdentity::at(self.name.clone(), self.email.clone(), time)
    }
}

// -------------------------------------------------------------------------------------------------
// KeyMaterial
// -------------------------------------------------------------------------------------------------
/// The signing key, and the public key used for checking signatures locally
#[derive(Debug)]
pub struct KeyMaterial {
    pub signing_key: SigningKey,
    verifying_key: Option<VerifyingKey>,
}

impl KeyMaterial {
    pub fn new(signing_key: SigningKey, verifying_key: Option<VerifyingKey>) -> Self {
        KeyMaterial {
            signing_key,
            verifying_key,
        }
    }

    /// Load key material from files, falling back to environment variables.
    ///
    /// The private key comes from `signing_key_path`, or else from `SIGCOMMIT_SIGNING_KEY`.
    /// The public key comes from `verifying_key_path`, or else from `SIGCOMMIT_VERIFYING_KEY`;
    /// if neither is set, the public half of the signing key is used.
    /// An encrypted private key is decrypted with `SIGCOMMIT_KEY_PASSPHRASE`.
    pub fn load(signing_key_path: Option<&Path>, verifying_key_path: Option<&Path>) -> Result<Self> {
        let passphrase = env_var(KEY_PASSPHRASE_ENV_VAR, Error::Signing)?.map(SecretString::new);

        let signing_key = match signing_key_path {
            Some(path) => {
                debug!("Loading signing key from {}", path.display());
                SigningKey::read_file(path, passphrase.as_ref())?
            }
            None => match env_var(SIGNING_KEY_ENV_VAR, Error::Signing)? {
                Some(text) => {
                    debug!("Loading signing key from {SIGNING_KEY_ENV_VAR} environment variable");
                    SigningKey::parse(&text, passphrase.as_ref())?
                }
                None => {
                    return Err(Error::Signing(format!(
                        "no signing key given; use --signing-key or set {SIGNING_KEY_ENV_VAR}"
                    )))
                }
            },
        };

        let verifying_key = load_verifying_key(verifying_key_path)?;

        Ok(KeyMaterial::new(signing_key, verifying_key))
    }

    /// The key used for local verification.
    pub fn verifying_key(&self) -> VerifyingKey {
        match &self.verifying_key {
            Some(key) => key.clone(),
            None => self.signing_key.verifying_key(),
        }
    }
}

/// Load a public key from a file, falling back to `SIGCOMMIT_VERIFYING_KEY`.
///
/// Returns `None` if neither is given.
pub fn load_verifying_key(path: Option<&Path>) -> Result<Option<VerifyingKey>> {
    match path {
        Some(path) => {
            debug!("Loading verifying key from {}", path.display());
            Ok(Some(VerifyingKey::read_file(path)?))
        }
        None => env_var(VERIFYING_KEY_ENV_VAR, Error::Verification)?
            .map(|text| VerifyingKey::parse(&text))
            .transpose(),
    }
}

/// Read an optional environment variable, treating non-Unicode values as errors.
fn env_var(name: &str, make_err: fn(String) -> Error) -> Result<Option<String>> {
    match std::env::var(name) {
        Ok(val) => Ok(Some(val)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => {
            Err(make_err(format!("ill-formed value of {name} environment variable")))
        }
    }
}
