//! Integration Test Utilities and Common Code

#![allow(dead_code)]

pub use assert_cmd::prelude::*;
pub use assert_fs::prelude::*;
pub use assert_fs::{fixture::ChildPath, TempDir};
pub use predicates::prelude::*;
pub use predicates::str::{is_empty, RegexPredicate};
pub use pretty_assertions::{assert_eq, assert_ne};
pub use std::path::{Path, PathBuf};
pub use std::process::Command;

/// Build a `Command` for the `sigcommit` crate binary with variadic command-line arguments.
///
/// The arguments can be anything that is allowed by `Command::arg`.
#[macro_export]
macro_rules! sigcommit {
    ( $( $arg:expr ),* ) => {
        {
            let mut cmd = sigcommit_cmd();
            $(
                cmd.arg($arg);
            )*
            cmd
        }
    }
}

/// Build an `assert_cmd::assert::Assert` by calling `sigcommit!(args).assert().success()`.
#[macro_export]
macro_rules! sigcommit_success {
    ( $( $arg:expr ),* ) => { sigcommit!($( $arg ),*).assert().success() }
}

/// Build an `assert_cmd::assert::Assert` by calling `sigcommit!(args).assert().failure()`.
#[macro_export]
macro_rules! sigcommit_failure {
    ( $( $arg:expr ),* ) => { sigcommit!($( $arg ),*).assert().failure() }
}

// make macros easily visible to other modules
pub use {sigcommit, sigcommit_failure, sigcommit_success};

/// Environment variables that would change the behavior of the binary under test
const SIGCOMMIT_ENV_VARS: &[&str] = &[
    "SIGCOMMIT_GITHUB_TOKEN",
    "SIGCOMMIT_SIGNING_KEY",
    "SIGCOMMIT_KEY_PASSPHRASE",
    "SIGCOMMIT_VERIFYING_KEY",
    "SIGCOMMIT_AUTHOR_NAME",
    "SIGCOMMIT_AUTHOR_EMAIL",
    "SIGCOMMIT_API_URL",
];

/// Build a `Command` for the `sigcommit` crate binary, isolated from the caller's environment.
pub fn sigcommit_cmd() -> Command {
    let mut cmd = Command::cargo_bin("sigcommit").expect("sigcommit should be executable");
    for var in SIGCOMMIT_ENV_VARS {
        cmd.env_remove(var);
    }
    cmd.env("NO_COLOR", "1");
    cmd
}

/// Create a `RegexPredicate` from the given pattern.
pub fn is_match(pat: &str) -> RegexPredicate {
    predicates::str::is_match(pat).expect("pattern should compile")
}

/// The path to a file under `tests/fixtures`.
pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// The path to a key under `tests/fixtures/keys`.
pub fn key_fixture(name: &str) -> PathBuf {
    fixture("keys").join(name)
}

pub const EMPTY_TREE: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";
pub const JANE_KEY_ID: &str = "SHA256:RYOT3ZSvBTj+YeG1J/95wi5edVzcdyDiFJBCbBJDI4M";
pub const JANE_ENC_KEY_ID: &str = "SHA256:RwwH9FLTI326X2UHJpohlZyFjAk0lIpEDx2OCPZ7H9M";
pub const JANE_ENC_PASSPHRASE: &str = "correct horse battery staple";
pub const JANE_PGP_KEY_ID: &str = "98182842fa382101";

/// A scratch directory for files written by a test.
pub struct TestEnv {
    pub root: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        let root = TempDir::new().expect("should be able to create tempdir");
        Self { root }
    }

    /// Create a file within this environment with the given name and contents.
    pub fn file(&self, name: &str, contents: &str) -> ChildPath {
        let input = self.root.child(name);
        input
            .write_str(contents)
            .expect("should be able to write input file contents");
        input
    }

    /// Create a name for a child entry within this environment.
    ///
    /// The filesystem is not touched by this function; this merely produces a `ChildPath`.
    pub fn child(&self, name: &str) -> ChildPath {
        self.root.child(name)
    }
}
