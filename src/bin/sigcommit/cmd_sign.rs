use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::args::{read_input, GlobalArgs, Reportable, SignArgs};
use sigcommit::config::KeyMaterial;
use sigcommit::signing::{self, DetachedSignature, KeyId};

pub fn run(_global_args: &GlobalArgs, args: &SignArgs) -> Result<()> {
    let keys = KeyMaterial::load(args.signing_key.as_deref(), None)
        .context("Failed to load signing key")?;
    let payload = read_input(&args.payload_file)?;

    let signature = signing::sign(&payload, &keys.signing_key).context("Failed to sign payload")?;
    let key_id = keys.signing_key.key_id();
    info!("Signed {} bytes with {key_id}", payload.len());

    SignatureReporter { signature, key_id }.report(&args.output_args)
}

#[derive(Serialize)]
struct SignatureReporter {
    key_id: KeyId,
    #[serde(serialize_with = "serialize_armored")]
    signature: DetachedSignature,
}

fn serialize_armored<S: serde::Serializer>(
    value: &DetachedSignature,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(value.as_str())
}

impl Reportable for SignatureReporter {
    fn human_format<W: std::io::Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(self.signature.as_str().as_bytes())?;
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
