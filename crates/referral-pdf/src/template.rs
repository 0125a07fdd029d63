//! Template lookup
//!
//! Templates are static assets. Each one has a list of accepted file names
//! and is searched for in an ordered list of directories; the first hit
//! wins.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::error::PdfError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateId {
    Referral,
    Consent,
}

impl TemplateId {
    /// Accepted file names, in order of preference
    pub fn file_names(&self) -> &'static [&'static str] {
        match self {
            TemplateId::Referral => &["ccp-referral-fillable.pdf"],
            TemplateId::Consent => &[
                "Consent-for-Referral-and-Release.pdf",
                "Consent for Referral and Release.pdf",
            ],
        }
    }

    /// Download name for a single filled template
    pub fn output_name(&self) -> &'static str {
        match self {
            TemplateId::Referral => "Referral-Filled.pdf",
            TemplateId::Consent => "Consent-Filled.pdf",
        }
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_names()[0])
    }
}

#[derive(Debug, Clone)]
pub struct TemplateStore {
    dirs: Vec<PathBuf>,
}

impl TemplateStore {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    /// `<root>/assets`, `<root>/public/assets` and `<root>` itself
    pub fn with_default_dirs(root: &Path) -> Self {
        Self::new(vec![
            root.join("assets"),
            root.join("public").join("assets"),
            root.to_path_buf(),
        ])
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Candidate paths in search order
    pub fn candidates(&self, id: TemplateId) -> Vec<PathBuf> {
        self.dirs
            .iter()
            .flat_map(|dir| id.file_names().iter().map(move |name| dir.join(name)))
            .collect()
    }

    pub fn resolve(&self, id: TemplateId) -> Result<PathBuf, PdfError> {
        self.candidates(id)
            .into_iter()
            .find(|path| path.is_file())
            .ok_or_else(|| PdfError::ResourceNotFound(format!("Missing {} in assets", id)))
    }

    pub fn read(&self, id: TemplateId) -> Result<Vec<u8>, PdfError> {
        let path = self.resolve(id)?;
        debug!(template = %id, path = %path.display(), "Reading template");
        std::fs::read(&path)
            .map_err(|e| PdfError::ResourceNotFound(format!("{}: {}", path.display(), e)))
    }
}
