//! Field mapping from intake payload to PDF form fields
//!
//! Each template has a fixed schema. The mapper turns the flat payload into
//! an ordered list of [`FieldTriple`]s that the filler applies verbatim.
//! Every target a rule touches is written explicitly, so checkboxes are
//! always either checked or unchecked and text fields are cleared when the
//! answer is missing.

pub mod consent;
pub mod referral;

use serde::Serialize;

pub use consent::{consent_fields, consent_signatures, SignatureImage};
pub use referral::referral_fields;

/// Answers that check a box or select "Yes"
pub const YES_WORDS: &[&str] = &["1", "true", "yes", "y", "on"];

/// Answers that select "No"
pub const NO_WORDS: &[&str] = &["0", "false", "no", "n", "off"];

/// Answers that select "Unknown" on tri-state questions
pub const UNKNOWN_WORDS: &[&str] = &["u", "unk", "unknown"];

/// How the mapper interpreted a target field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Checkbox,
    YesNo,
    TriState,
    OneOf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Checked(bool),
}

/// A single write against a named form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldTriple {
    pub name: String,
    pub value: FieldValue,
    pub kind: FieldKind,
}

impl FieldTriple {
    pub fn text(name: &str, value: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            value: FieldValue::Text(value.into()),
            kind: FieldKind::Text,
        }
    }

    pub fn checked(name: &str, on: bool, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            value: FieldValue::Checked(on),
            kind,
        }
    }
}

/// Classified answer to a yes/no style question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Yes,
    No,
    Unknown,
    Unrecognized,
}

/// Match `raw` against the yes, no and unknown vocabularies (case-insensitive)
pub fn classify(raw: &str) -> Answer {
    let s = raw.to_lowercase();
    if YES_WORDS.contains(&s.as_str()) {
        Answer::Yes
    } else if NO_WORDS.contains(&s.as_str()) {
        Answer::No
    } else if UNKNOWN_WORDS.contains(&s.as_str()) {
        Answer::Unknown
    } else {
        Answer::Unrecognized
    }
}

pub fn is_truthy(raw: &str) -> bool {
    classify(raw) == Answer::Yes
}

/// Ordered collection of triples for one template
#[derive(Debug, Default)]
pub struct FieldSet {
    triples: Vec<FieldTriple>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&mut self, name: &str, value: impl Into<String>) {
        self.triples.push(FieldTriple::text(name, value));
    }

    pub fn checkbox(&mut self, name: &str, on: bool) {
        self.triples
            .push(FieldTriple::checked(name, on, FieldKind::Checkbox));
    }

    /// Two mutually exclusive boxes. Unrecognized answers clear both.
    pub fn yes_no(&mut self, yes: &str, no: &str, raw: &str) {
        let answer = classify(raw);
        self.triples.push(FieldTriple::checked(
            yes,
            answer == Answer::Yes,
            FieldKind::YesNo,
        ));
        self.triples.push(FieldTriple::checked(
            no,
            answer == Answer::No,
            FieldKind::YesNo,
        ));
    }

    /// Yes/No/Unknown boxes. Without an unknown target an unknown answer
    /// leaves everything cleared.
    pub fn tri_state(&mut self, yes: &str, no: &str, unknown: Option<&str>, raw: &str) {
        let answer = classify(raw);
        self.triples.push(FieldTriple::checked(
            yes,
            answer == Answer::Yes,
            FieldKind::TriState,
        ));
        self.triples.push(FieldTriple::checked(
            no,
            answer == Answer::No,
            FieldKind::TriState,
        ));
        if let Some(unknown) = unknown {
            self.triples.push(FieldTriple::checked(
                unknown,
                answer == Answer::Unknown,
                FieldKind::TriState,
            ));
        }
    }

    /// Check the target whose label equals `raw` (trimmed, case-insensitive)
    pub fn one_of(&mut self, options: &[(&str, &str)], raw: &str) {
        let norm = raw.trim().to_lowercase();
        for (label, target) in options {
            self.triples.push(FieldTriple::checked(
                target,
                norm == label.to_lowercase(),
                FieldKind::OneOf,
            ));
        }
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn into_triples(self) -> Vec<FieldTriple> {
        self.triples
    }
}
