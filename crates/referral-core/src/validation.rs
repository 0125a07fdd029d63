//! Intake validation
//!
//! The same checks the intake form runs before it lets the user submit,
//! applied again on the server for the end-to-end submit endpoint.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

use crate::dates::parse_flexible_date;
use crate::error::CoreError;
use crate::mapper::referral::consent_agreed;
use crate::payload::IntakePayload;

lazy_static! {
    static ref PLACE_NAME: Regex = Regex::new(r"^[A-Za-z .'-]{2,}$").unwrap();
    static ref ZIP: Regex = Regex::new(r"^\d{5}(-\d{4})?$").unwrap();
    static ref PHONE: Regex = Regex::new(r"^\d{10}$|^\d{3}-\d{3}-\d{4}$").unwrap();
    static ref EMAIL: Regex =
        Regex::new(r"(?i)^[a-z0-9_.-]+@([a-z0-9_-]+\.)+[a-z0-9_-]{2,}$").unwrap();
}

fn invalid(field: &'static str, message: &'static str) -> CoreError {
    CoreError::Validation { field, message }
}

/// Check the individual's details and the consent step.
/// Returns the first failing field.
pub fn validate_intake(payload: &IntakePayload, today: NaiveDate) -> Result<(), CoreError> {
    if payload.is_blank("individual_name") {
        return Err(invalid("individual_name", "This field is required."));
    }

    match parse_flexible_date(&payload.text("individual_dob")) {
        Some(dob) if dob < today => {}
        _ => {
            return Err(invalid(
                "individual_dob",
                "Date of birth must be a valid past date.",
            ))
        }
    }

    if payload.text("individual_address").trim().chars().count() < 5 {
        return Err(invalid(
            "individual_address",
            "Please enter a full street address.",
        ));
    }

    let checks: [(&'static str, &Regex, &'static str); 5] = [
        ("individual_city", &PLACE_NAME, "Enter a valid city name."),
        (
            "individual_zip",
            &ZIP,
            "Enter a valid ZIP (12345 or 12345-6789).",
        ),
        ("individual_county", &PLACE_NAME, "Enter a valid county."),
        (
            "individual_phone",
            &PHONE,
            "Use 1234567890 or 123-456-7890.",
        ),
        ("individual_email", &EMAIL, "Enter a valid email address."),
    ];
    for (field, pattern, message) in checks {
        if !pattern.is_match(payload.text(field).trim()) {
            return Err(invalid(field, message));
        }
    }

    validate_consent(payload)
}

/// The consent step needs the agreement box and both signatures
pub fn validate_consent(payload: &IntakePayload) -> Result<(), CoreError> {
    if !consent_agreed(payload) {
        return Err(invalid(
            "consent_agree",
            "Please confirm you agree to the consent terms.",
        ));
    }
    if payload.is_blank("consent_client_signature") || payload.is_blank("consent_agency_signature")
    {
        return Err(invalid(
            "consent_signatures",
            "Please provide both signatures before submitting.",
        ));
    }
    Ok(())
}
