//! Care-coordination-unit lookup by ZIP code
//!
//! The directory is a static JSON object keyed by 5-digit ZIP:
//!
//! ```json
//! { "60148": { "ccu_name": "...", "ccu_email": "...", "ccu_phone": "630-555-0100 / 630-555-0101" } }
//! ```
//!
//! It is read once and never mutated. A missing or unreadable file yields an
//! empty directory so consent forms still render with blank CCU fields.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::phones::split_phones;

/// File name of the lookup resource
pub const CCU_LOOKUP_FILE: &str = "ccu_lookup.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CcuRecord {
    #[serde(default)]
    pub ccu_name: Option<String>,
    #[serde(default)]
    pub ccu_email: Option<String>,
    #[serde(default)]
    pub ccu_phone: Option<String>,
}

/// Values written into the consent form's CCU fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CcuOutputs {
    pub name: String,
    pub contact: String,
    pub contact2: String,
}

#[derive(Debug, Clone, Default)]
pub struct CcuDirectory {
    records: HashMap<String, CcuRecord>,
}

impl CcuDirectory {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = (String, CcuRecord)>) -> Self {
        Self {
            records: records.into_iter().collect(),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let records: HashMap<String, CcuRecord> = serde_json::from_str(raw)?;
        Ok(Self { records })
    }

    /// Load from the first candidate that exists and parses
    pub fn load(candidates: &[PathBuf]) -> Self {
        for path in candidates {
            if !path.exists() {
                continue;
            }
            match Self::read(path) {
                Ok(directory) => {
                    debug!(path = %path.display(), zips = directory.len(), "Loaded CCU lookup");
                    return directory;
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable CCU lookup"),
            }
        }
        warn!("No CCU lookup found; consent forms will have blank CCU fields");
        Self::empty()
    }

    fn read(path: &Path) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let raw = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&raw)?)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, zip: &str) -> Option<&CcuRecord> {
        self.records.get(zip)
    }

    pub fn zips(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Resolve the CCU name and up to two contact slots for a ZIP.
    ///
    /// With an email on file the email fills the first slot and the first
    /// phone the second; otherwise the first two phones fill both slots.
    pub fn outputs_for_zip(&self, zip: &str) -> CcuOutputs {
        let Some(record) = self.records.get(&normalize_zip(zip)) else {
            return CcuOutputs::default();
        };

        let name = trimmed(&record.ccu_name);
        let email = trimmed(&record.ccu_email);
        let mut phones = split_phones(record.ccu_phone.as_deref().unwrap_or_default()).into_iter();

        let (contact, contact2) = if email.is_empty() {
            (
                phones.next().unwrap_or_default(),
                phones.next().unwrap_or_default(),
            )
        } else {
            (email, phones.next().unwrap_or_default())
        };

        CcuOutputs {
            name,
            contact,
            contact2,
        }
    }
}

/// Keep digits only, first five
pub fn normalize_zip(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).take(5).collect()
}

fn trimmed(value: &Option<String>) -> String {
    value.as_deref().unwrap_or_default().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const SAMPLE: &str = r#"{
        "60148": {
            "ccu_name": " Senior Services of DuPage ",
            "ccu_email": "intake@dupage.example",
            "ccu_phone": "630-555-0100 / 630-555-0101"
        },
        "60616": {
            "ccu_name": "Chicago Department on Aging",
            "ccu_email": "",
            "ccu_phone": "312-555-0100, 312-555-0101 or 312-555-0102"
        },
        "60901": {
            "ccu_name": "Kankakee Case Coordination",
            "ccu_email": null,
            "ccu_phone": null
        }
    }"#;

    fn sample() -> CcuDirectory {
        CcuDirectory::from_json(SAMPLE).unwrap()
    }

    #[test]
    fn test_email_then_first_phone() {
        assert_eq!(
            sample().outputs_for_zip("60148"),
            CcuOutputs {
                name: "Senior Services of DuPage".into(),
                contact: "intake@dupage.example".into(),
                contact2: "630-555-0100".into(),
            }
        );
    }

    #[test]
    fn test_two_phones_without_email() {
        assert_eq!(
            sample().outputs_for_zip("60616"),
            CcuOutputs {
                name: "Chicago Department on Aging".into(),
                contact: "312-555-0100".into(),
                contact2: "312-555-0101".into(),
            }
        );
    }

    #[test]
    fn test_record_without_contacts() {
        let out = sample().outputs_for_zip("60901");
        assert_eq!(out.name, "Kankakee Case Coordination");
        assert_eq!(out.contact, "");
        assert_eq!(out.contact2, "");
    }

    #[test]
    fn test_absent_zip_is_empty() {
        assert_eq!(sample().outputs_for_zip("00000"), CcuOutputs::default());
    }

    #[test]
    fn test_zip_plus_four_is_normalized() {
        assert_eq!(sample().outputs_for_zip("60148-2201").name, "Senior Services of DuPage");
        assert_eq!(normalize_zip(" 60 148x"), "60148");
    }

    #[test]
    fn test_load_skips_missing_and_broken_files() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        let good = dir.path().join(CCU_LOOKUP_FILE);
        std::fs::write(&good, SAMPLE).unwrap();

        let directory = CcuDirectory::load(&[dir.path().join("missing.json"), broken, good]);
        assert_eq!(directory.len(), 3);
    }

    #[test]
    fn test_load_degrades_to_empty() {
        let directory = CcuDirectory::load(&[PathBuf::from("/nonexistent/ccu_lookup.json")]);
        assert!(directory.is_empty());
    }

    #[test]
    fn test_bundled_lookup_parses() {
        let raw = include_str!("../../../assets/ccu_lookup.json");
        let directory = CcuDirectory::from_json(raw).unwrap();
        assert!(directory.get("60148").is_some());
    }

    #[test]
    fn test_every_bundled_zip_resolves() {
        let raw = include_str!("../../../assets/ccu_lookup.json");
        let directory = CcuDirectory::from_json(raw).unwrap();
        for zip in directory.zips() {
            let record = directory.get(zip).unwrap();
            let out = directory.outputs_for_zip(zip);
            assert!(!out.name.is_empty(), "{} has no name", zip);
            let has_contact = !trimmed(&record.ccu_email).is_empty()
                || !split_phones(record.ccu_phone.as_deref().unwrap_or_default()).is_empty();
            if has_contact {
                assert!(
                    !out.contact.is_empty() || !out.contact2.is_empty(),
                    "{} has no contact slot",
                    zip
                );
            }
        }
    }

    proptest! {
        #[test]
        fn normalized_zip_is_at_most_five_digits(raw in ".{0,20}") {
            let zip = normalize_zip(&raw);
            prop_assert!(zip.len() <= 5);
            prop_assert!(zip.chars().all(|c| c.is_ascii_digit()));
        }

        #[test]
        fn unknown_zips_yield_empty_outputs(zip in "[0-9]{5}") {
            let directory = sample();
            prop_assume!(directory.get(&zip).is_none());
            prop_assert_eq!(directory.outputs_for_zip(&zip), CcuOutputs::default());
        }
    }
}
