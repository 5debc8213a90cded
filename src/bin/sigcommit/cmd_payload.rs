use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use crate::args::{GlobalArgs, PayloadArgs, Reportable};
use sigcommit::{CommitPayload, ObjectId};

pub fn run(_global_args: &GlobalArgs, args: &PayloadArgs) -> Result<()> {
    let time = args.time_args.datetime()?;
    let author = args.identity_args.author()?;
    let committer = args.identity_args.committer()?.unwrap_or_else(|| author.clone());

    let payload = CommitPayload::new(
        args.tree,
        args.parent,
        author.at(&time).context("Invalid author time")?,
        committer.at(&time).context("Invalid committer time")?,
        args.message.as_str(),
    );
    debug!("Built payload for tree {}", payload.tree());

    PayloadReporter(&payload).report(&args.output_args)
}

struct PayloadReporter<'a>(&'a CommitPayload);

#[derive(Serialize)]
struct PayloadJson<'a> {
    tree: &'a ObjectId,
    parent: Option<&'a ObjectId>,
    author: String,
    committer: String,
    payload: String,
}

impl Reportable for PayloadReporter<'_> {
    fn human_format<W: std::io::Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(self.0.serialize().as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    fn json_format<W: std::io::Write>(&self, mut writer: W) -> Result<()> {
        let payload = self.0;
        let json = PayloadJson {
            tree: payload.tree(),
            parent: payload.parent(),
            author: payload.author().to_string(),
            committer: payload.committer().to_string(),
            payload: payload.serialize(),
        };
        serde_json::to_writer_pretty(&mut writer, &json)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}
