use anyhow::{Context, Result};
use serde::Serialize;

use crate::args::{read_input, GlobalArgs, Reportable, VerifyArgs};
use sigcommit::config::{load_verifying_key, VERIFYING_KEY_ENV_VAR};
use sigcommit::signing::{self, DetachedSignature, KeyId};

pub fn run(_global_args: &GlobalArgs, args: &VerifyArgs) -> Result<()> {
    let key = load_verifying_key(args.verifying_key.as_deref())
        .context("Failed to load verifying key")?
        .with_context(|| {
            format!("No verifying key given; use --verifying-key or set {VERIFYING_KEY_ENV_VAR}")
        })?;

    let payload = read_input(&args.payload_file)?;
    let signature = read_input(&args.signature_file)?;
    let signature = String::from_utf8(signature).context("Signature is not valid UTF-8")?;
    let signature = DetachedSignature::from_armored(&signature)?;

    let key_id =
        signing::verify(&payload, &signature, &key).context("Signature verification failed")?;

    VerificationReporter { key_id }.report(&args.output_args)
}

#[derive(Serialize)]
struct VerificationReporter {
    key_id: KeyId,
}

impl Reportable for VerificationReporter {
    fn human_format<W: std::io::Write>(&self, mut writer: W) -> Result<()> {
        writeln!(
            writer,
            "{} from {}",
            console::style("Good signature").green().bold(),
            self.key_id
        )?;
        writer.flush()?;
        Ok(())
    }

    fn json_format<W: std::io::Write>(&self, mut writer: W) -> Result<()> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}
