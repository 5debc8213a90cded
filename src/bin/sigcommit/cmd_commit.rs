use anyhow::{Context, Result};
use lazy_static::lazy_static;
use tracing::debug;

use crate::args::{CommitArgs, GlobalArgs, Reportable};
use sigcommit::config::{ApiConfig, Config, KeyMaterial, RepoTarget};
use sigcommit::publish::{self, FileEntry, PublishRequest, PublishedCommit};

pub fn run(_global_args: &GlobalArgs, args: &CommitArgs) -> Result<()> {
    let config = Config {
        target: RepoTarget {
            owner: args.owner.clone(),
            repo: args.repo.clone(),
            branch: args.branch.clone(),
        },
        author: args.identity_args.author()?,
        committer: args.identity_args.committer()?,
        keys: KeyMaterial::load(
            args.key_args.signing_key.as_deref(),
            args.key_args.verifying_key.as_deref(),
        )
        .context("Failed to load key material")?,
        api: ApiConfig {
            url: args.api_args.api_url.clone(),
            ignore_certs: args.api_args.ignore_certs,
        },
    };
    debug!("Committing to {} as {:?}", config.target, config.keys.signing_key);

    let files = args
        .file
        .iter()
        .map(|spec| {
            let content = std::fs::read_to_string(&spec.local_path)
                .with_context(|| format!("Failed to read {}", spec.local_path.display()))?;
            Ok(FileEntry {
                path: spec.repo_path.clone(),
                content,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let request = PublishRequest {
        message: args.message.clone(),
        files,
    };

    let now = args.time_args.datetime()?;
    let published = publish::run_blocking(&config, &request, now)?;

    CommitReporter(published).report(&args.output_args)
}

struct CommitReporter(PublishedCommit);

lazy_static! {
    static ref STYLE_HEADING: console::Style = console::Style::new().bold();
    static ref STYLE_COMMIT: console::Style = console::Style::new().yellow();
    static ref STYLE_GOOD: console::Style = console::Style::new().green();
    static ref STYLE_BAD: console::Style = console::Style::new().red();
}

impl Reportable for CommitReporter {
    fn human_format<W: std::io::Write>(&self, mut writer: W) -> Result<()> {
        let c = &self.0;
        writeln!(
            writer,
            "{} {}",
            STYLE_HEADING.apply_to("Commit:"),
            STYLE_COMMIT.apply_to(c.commit_id)
        )?;
        if let Some(url) = &c.html_url {
            writeln!(writer, "{} {url}", STYLE_HEADING.apply_to("URL:"))?;
        }
        writeln!(writer, "{} {}", STYLE_HEADING.apply_to("Parent:"), c.parent)?;
        writeln!(writer, "{} {}", STYLE_HEADING.apply_to("Tree:"), c.tree)?;
        writeln!(writer, "{} {}", STYLE_HEADING.apply_to("Signed with:"), c.key_id)?;

        let status = match (c.remote.verified, &c.remote.reason) {
            (Some(true), _) => STYLE_GOOD.apply_to("verified".to_string()),
            (Some(false), Some(reason)) => STYLE_BAD.apply_to(format!("unverified ({reason})")),
            (Some(false), None) => STYLE_BAD.apply_to("unverified".to_string()),
            (None, _) => STYLE_BAD.apply_to("not reported".to_string()),
        };
        writeln!(writer, "{} {status}", STYLE_HEADING.apply_to("Remote verification:"))?;
        writer.flush()?;
        Ok(())
    }

    fn json_format<W: std::io::Write>(&self, mut writer: W) -> Result<()> {
        serde_json::to_writer_pretty(&mut writer, &self.0)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}
