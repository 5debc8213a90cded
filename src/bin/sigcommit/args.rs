use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, TimeZone};
use clap::{crate_description, crate_version, ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use url::Url;

use sigcommit::config::Person;
use sigcommit::{ObjectId, TzOffset};

// -----------------------------------------------------------------------------
// command-line args
// -----------------------------------------------------------------------------
#[derive(Parser, Debug)]
#[command(
    author,   // retrieved from Cargo.toml `authors`
    version,  // retrieved from Cargo.toml `version`
    about,    // retrieved from Cargo.toml `description`

    long_version = concat!(
        crate_version!(),
    ),

    long_about = concat!(
        crate_description!(),
    ),
)]
#[deny(missing_docs)]
/// Create signed Git commits through the GitHub REST API
pub struct CommandLineArgs {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub global_args: GlobalArgs,
}

impl CommandLineArgs {
    pub fn parse_args() -> Self {
        let mut s = Self::parse();

        // If `NO_COLOR` is set in the environment, disable colored output
        //
        // https://no-color.org/
        if std::env::var("NO_COLOR").is_ok() {
            s.global_args.color = Mode::Never
        }

        s
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the canonical commit payload for the given fields
    ///
    /// The payload is the exact text Git hashes to compute a commit ID, minus the signature
    /// header. It is the text that gets signed.
    #[command(display_order = 1)]
    Payload(PayloadArgs),

    /// Sign a commit payload
    ///
    /// The payload is read from a file or from stdin and signed as-is, byte for byte.
    /// With an OpenSSH key, the result is an armored SSH signature in the `git` namespace, as
    /// produced by `ssh-keygen -Y sign -n git`. With an armored OpenPGP key, it is an armored
    /// OpenPGP detached signature.
    #[command(display_order = 2)]
    Sign(SignArgs),

    /// Verify a signature over a commit payload
    #[command(display_order = 3)]
    Verify(VerifyArgs),

    /// Create a signed commit on a GitHub branch
    ///
    /// This looks up the head of the branch, creates a tree with the given files on top of the
    /// head's tree, signs the resulting commit payload, creates the commit, and moves the branch
    /// to it.
    ///
    /// An access token with permission to write repository contents must be given in the
    /// `SIGCOMMIT_GITHUB_TOKEN` environment variable.
    #[command(display_order = 4)]
    Commit(CommitArgs),
}

// -----------------------------------------------------------------------------
// global options
// -----------------------------------------------------------------------------
#[derive(Args, Debug)]
#[command(next_help_heading = "Global Options")]
pub struct GlobalArgs {
    /// Enable verbose output
    ///
    /// This can be repeated up to 3 times to enable successively more output.
    #[arg(global=true, long, short, action=ArgAction::Count)]
    pub verbose: u8,

    /// Enable or disable colored output
    ///
    /// When this is "auto", colors are enabled for each of stdout and stderr when it is a tty.
    ///
    /// If the `NO_COLOR` environment variable is set, it takes precedence and is equivalent to `--color=never`.
    #[arg(global=true, long, default_value_t=Mode::Auto, value_name="MODE")]
    pub color: Mode,
}

impl GlobalArgs {
    /// Whether to use color on stdout, where reports go.
    pub fn use_color(&self) -> bool {
        self.use_color_on(atty::Stream::Stdout)
    }

    /// Whether to use color on stderr, where logs go.
    pub fn use_color_stderr(&self) -> bool {
        self.use_color_on(atty::Stream::Stderr)
    }

    fn use_color_on(&self, stream: atty::Stream) -> bool {
        match self.color {
            Mode::Never => false,
            Mode::Always => true,
            Mode::Auto => atty::is(stream),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum Mode {
    Auto,
    Never,
    Always,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Mode::Auto => "auto",
            Mode::Never => "never",
            Mode::Always => "always",
        };
        write!(f, "{s}")
    }
}

// -----------------------------------------------------------------------------
// `payload` command
// -----------------------------------------------------------------------------
#[derive(Args, Debug)]
pub struct PayloadArgs {
    /// The ID of the commit's tree
    #[arg(long, value_name = "ID")]
    pub tree: ObjectId,

    /// The ID of the commit's parent, if any
    #[arg(long, value_name = "ID")]
    pub parent: Option<ObjectId>,

    /// The commit message
    #[arg(long, short, value_name = "MESSAGE")]
    pub message: String,

    #[command(flatten)]
    pub identity_args: IdentityArgs,

    #[command(flatten)]
    pub time_args: TimeArgs,

    #[command(flatten)]
    pub output_args: OutputArgs,
}

// -----------------------------------------------------------------------------
// `sign` command
// -----------------------------------------------------------------------------
#[derive(Args, Debug)]
pub struct SignArgs {
    /// Read the payload from this file; `-` means stdin
    #[arg(long, value_name = "PATH", default_value = "-")]
    pub payload_file: PathBuf,

    /// Private key file, either OpenSSH or armored OpenPGP
    ///
    /// If not given, the key text is taken from the `SIGCOMMIT_SIGNING_KEY` environment variable.
    /// An encrypted key is decrypted with the passphrase in `SIGCOMMIT_KEY_PASSPHRASE`.
    #[arg(long, value_name = "PATH")]
    pub signing_key: Option<PathBuf>,

    #[command(flatten)]
    pub output_args: OutputArgs,
}

// -----------------------------------------------------------------------------
// `verify` command
// -----------------------------------------------------------------------------
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// The signed payload
    #[arg(long, value_name = "PATH")]
    pub payload_file: PathBuf,

    /// The armored signature
    #[arg(long, value_name = "PATH")]
    pub signature_file: PathBuf,

    /// Public key file, either OpenSSH or armored OpenPGP
    ///
    /// If not given, the key text is taken from the `SIGCOMMIT_VERIFYING_KEY` environment variable.
    #[arg(long, value_name = "PATH")]
    pub verifying_key: Option<PathBuf>,

    #[command(flatten)]
    pub output_args: OutputArgs,
}

// -----------------------------------------------------------------------------
// `commit` command
// -----------------------------------------------------------------------------
#[derive(Args, Debug)]
pub struct CommitArgs {
    /// The owner of the repository
    #[arg(long, value_name = "NAME")]
    pub owner: String,

    /// The name of the repository
    #[arg(long, value_name = "NAME")]
    pub repo: String,

    /// The branch to commit to
    #[arg(long, value_name = "NAME")]
    pub branch: String,

    /// The commit message
    #[arg(long, short, value_name = "MESSAGE")]
    pub message: String,

    /// Add a file to the commit, as REPO_PATH=LOCAL_PATH
    ///
    /// The contents of LOCAL_PATH are stored at REPO_PATH in the new commit's tree.
    /// This can be repeated. If no files are given, the commit reuses the tree of the branch head.
    #[arg(long, value_name = "SPEC", value_parser = parse_file_spec)]
    pub file: Vec<FileSpec>,

    #[command(flatten)]
    pub identity_args: IdentityArgs,

    #[command(flatten)]
    pub time_args: TimeArgs,

    #[command(flatten)]
    pub key_args: KeyArgs,

    #[command(flatten)]
    pub api_args: ApiArgs,

    #[command(flatten)]
    pub output_args: OutputArgs,
}

/// A file to add to a commit
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileSpec {
    pub repo_path: String,
    pub local_path: PathBuf,
}

fn parse_file_spec(s: &str) -> Result<FileSpec, String> {
    let (repo_path, local_path) = s
        .split_once('=')
        .ok_or_else(|| format!("expected REPO_PATH=LOCAL_PATH, got {s:?}"))?;
    if repo_path.is_empty() || local_path.is_empty() {
        return Err(format!("expected REPO_PATH=LOCAL_PATH, got {s:?}"));
    }
    if repo_path.starts_with('/') {
        return Err(format!("repository path {repo_path:?} must be relative"));
    }
    Ok(FileSpec {
        repo_path: repo_path.to_string(),
        local_path: PathBuf::from(local_path),
    })
}

#[derive(Args, Debug)]
#[command(next_help_heading = "Key Options")]
pub struct KeyArgs {
    /// Private key file, either OpenSSH or armored OpenPGP
    ///
    /// If not given, the key text is taken from the `SIGCOMMIT_SIGNING_KEY` environment variable.
    /// An encrypted key is decrypted with the passphrase in `SIGCOMMIT_KEY_PASSPHRASE`.
    #[arg(long, value_name = "PATH")]
    pub signing_key: Option<PathBuf>,

    /// Public key file used to check signatures locally, either OpenSSH or armored OpenPGP
    ///
    /// If not given, the key text is taken from the `SIGCOMMIT_VERIFYING_KEY` environment variable,
    /// or else the public half of the signing key is used.
    #[arg(long, value_name = "PATH")]
    pub verifying_key: Option<PathBuf>,
}

#[derive(Args, Debug)]
#[command(next_help_heading = "API Options")]
pub struct ApiArgs {
    /// Use the specified URL for GitHub API access
    ///
    /// If accessing a GitHub Enterprise Server instance, this value should be the entire base URL
    /// include the `api/v3` portion, e.g., `https://github.example.com/api/v3`.
    #[arg(
        long,
        value_name = "URL",
        default_value = "https://api.github.com/",
        env("SIGCOMMIT_API_URL")
    )]
    pub api_url: Url,

    /// Ignore validation of TLS certificates
    #[arg(long)]
    pub ignore_certs: bool,
}

// -----------------------------------------------------------------------------
// identity options
// -----------------------------------------------------------------------------
#[derive(Args, Debug)]
#[command(next_help_heading = "Identity Options")]
pub struct IdentityArgs {
    /// The author's name
    #[arg(long, value_name = "NAME", env("SIGCOMMIT_AUTHOR_NAME"))]
    pub author_name: String,

    /// The author's email address
    #[arg(long, value_name = "EMAIL", env("SIGCOMMIT_AUTHOR_EMAIL"))]
    pub author_email: String,

    /// The committer's name, if different from the author
    #[arg(long, value_name = "NAME", requires = "committer_email")]
    pub committer_name: Option<String>,

    /// The committer's email address, if different from the author
    #[arg(long, value_name = "EMAIL", requires = "committer_name")]
    pub committer_email: Option<String>,
}

impl IdentityArgs {
    pub fn author(&self) -> Result<Person> {
        Person::new(&self.author_name, &self.author_email).context("Invalid author")
    }

    pub fn committer(&self) -> Result<Option<Person>> {
        match (&self.committer_name, &self.committer_email) {
            (Some(name), Some(email)) => {
                Ok(Some(Person::new(name, email).context("Invalid committer")?))
            }
            _ => Ok(None),
        }
    }
}

// -----------------------------------------------------------------------------
// time options
// -----------------------------------------------------------------------------
#[derive(Args, Debug)]
#[command(next_help_heading = "Time Options")]
pub struct TimeArgs {
    /// The commit time, in seconds since the Unix epoch
    ///
    /// If not given, the current time is used.
    #[arg(long, value_name = "SECONDS", allow_negative_numbers = true)]
    pub time: Option<i64>,

    /// The UTC offset recorded with the commit time, as `+HHMM` or `-HHMM`
    ///
    /// If not given, the local offset is used.
    #[arg(long, value_name = "OFFSET", allow_hyphen_values = true)]
    pub tz_offset: Option<TzOffset>,
}

impl TimeArgs {
    /// The commit time, in the requested offset.
    ///
    /// Without an explicit offset, the local offset in effect at the commit time is used.
    pub fn datetime(&self) -> Result<DateTime<FixedOffset>> {
        let local = match self.time {
            Some(seconds) => chrono::Local
                .timestamp_opt(seconds, 0)
                .single()
                .with_context(|| format!("Commit time {seconds} is out of range"))?,
            None => chrono::Local::now(),
        };
        Ok(match self.tz_offset {
            Some(offset) => local.with_timezone(&offset.to_fixed_offset()),
            None => local.fixed_offset(),
        })
    }
}

// -----------------------------------------------------------------------------
// output options
// -----------------------------------------------------------------------------
#[derive(Args, Debug)]
#[command(next_help_heading = "Output Options")]
pub struct OutputArgs {
    /// Write output to the specified path
    ///
    /// If this argument is not provided, stdout will be used.
    #[arg(long, short, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Write output in the specified format
    #[arg(long, short, value_name="FORMAT", default_value_t=OutputFormat::Human)]
    pub format: OutputFormat,
}

impl OutputArgs {
    pub fn get_writer(&self) -> std::io::Result<Box<dyn std::io::Write>> {
        use std::fs::File;
        use std::io::BufWriter;

        match &self.output {
            None => Ok(Box::new(BufWriter::new(std::io::stdout()))),
            Some(p) => {
                let f = File::create(p)?;
                Ok(Box::new(BufWriter::new(f)))
            }
        }
    }
}

// -----------------------------------------------------------------------------
// output format
// -----------------------------------------------------------------------------
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum OutputFormat {
    /// A text-based format designed for humans; for `payload` and `sign`, the raw text
    Human,

    /// Pretty-printed JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OutputFormat::Human => "human",
            OutputFormat::Json => "json",
        };
        write!(f, "{s}")
    }
}

// -----------------------------------------------------------------------------
// report writer
// -----------------------------------------------------------------------------
pub trait Reportable {
    fn human_format<W: std::io::Write>(&self, writer: W) -> Result<()>;
    fn json_format<W: std::io::Write>(&self, writer: W) -> Result<()>;

    fn report(&self, output_args: &OutputArgs) -> Result<()> {
        let writer = output_args
            .get_writer()
            .context("Failed to open output destination for writing")?;

        let result = match &output_args.format {
            OutputFormat::Human => self.human_format(writer),
            OutputFormat::Json => self.json_format(writer),
        };
        match result {
            Ok(()) => Ok(()),
            Err(e) => match e.downcast_ref::<std::io::Error>() {
                // Ignore SIGPIPE errors, like those that can come from piping to `head`
                Some(e) if e.kind() == std::io::ErrorKind::BrokenPipe => Ok(()),
                _ => Err(e)?,
            },
        }
    }
}

/// Read a whole input file, where `-` means stdin.
pub fn read_input(path: &Path) -> Result<Vec<u8>> {
    use std::io::Read;

    if path == Path::new("-") {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("Failed to read from stdin")?;
        Ok(buf)
    } else {
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
    }
}
