//! `inspect-template`: list a template's fields for mapping work

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use referral_pdf::{fields_csv, fields_skeleton, inspect_fields};
use tracing::info;

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Fillable PDF to inspect
    pub pdf: PathBuf,

    /// Write the `name,type` CSV here instead of stdout
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Also write an empty JSON payload keyed by field name
    #[arg(long)]
    pub skeleton: Option<PathBuf>,
}

pub fn run(args: &InspectArgs) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.pdf)
        .with_context(|| format!("Missing fillable PDF at: {}", args.pdf.display()))?;
    let fields = inspect_fields(&bytes)?;
    let csv = fields_csv(&fields);

    match &args.csv {
        Some(path) => {
            std::fs::write(path, &csv).with_context(|| format!("Writing {}", path.display()))?;
            info!(path = %path.display(), fields = fields.len(), "Wrote field list");
        }
        None => print!("{}", csv),
    }

    if let Some(path) = &args.skeleton {
        let json = serde_json::to_string_pretty(&fields_skeleton(&fields))?;
        std::fs::write(path, json).with_context(|| format!("Writing {}", path.display()))?;
        info!(path = %path.display(), "Wrote payload skeleton");
    }
    Ok(())
}
