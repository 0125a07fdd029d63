//! Referral Core
//!
//! Intake payloads, the field mapping for the CCP referral and consent
//! templates, the ZIP to care-coordination-unit lookup and the validation
//! the intake form applies before submitting.

#![recursion_limit = "256"]

pub mod ccu;
pub mod dates;
pub mod demo;
pub mod error;
pub mod intake;
pub mod mapper;
pub mod payload;
pub mod phones;
pub mod summary;
pub mod validation;

pub use ccu::{CcuDirectory, CcuOutputs, CcuRecord, CCU_LOOKUP_FILE};
pub use error::CoreError;
pub use intake::{apply_intake_defaults, AgencyProfile};
pub use mapper::{
    consent_fields, consent_signatures, referral_fields, FieldKind, FieldTriple, FieldValue,
    SignatureImage,
};
pub use payload::{merged_file_name, sanitize_file_name, IntakePayload};
pub use phones::split_phones;
pub use summary::ReferralSummary;
pub use validation::validate_intake;
