//! Automatic header and referrer details added to every submission

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::dates::{age_text, format_hh_mm, format_mm_dd_yyyy, iso_to_mm_dd_yyyy, parse_flexible_date};
use crate::payload::IntakePayload;

/// The agency and the person filing referrals on its behalf
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgencyProfile {
    pub agency_name: String,
    pub staff_person: String,
    pub referrer_name: String,
    pub referrer_phone: String,
    pub referrer_phone_type: String,
    pub referrer_email: String,
    pub referrer_relationship: String,
}

impl Default for AgencyProfile {
    fn default() -> Self {
        Self {
            agency_name: "Safe Life Home Health Care".to_string(),
            staff_person: "Intake Team".to_string(),
            referrer_name: String::new(),
            referrer_phone: String::new(),
            referrer_phone_type: "Cell".to_string(),
            referrer_email: String::new(),
            referrer_relationship: "Home Care Provider Agency".to_string(),
        }
    }
}

/// Fill in what the intake form adds on its own. Values already present in
/// the payload win.
pub fn apply_intake_defaults(payload: &mut IntakePayload, profile: &AgencyProfile, now: NaiveDateTime) {
    payload.set_if_blank("referral_date", format_mm_dd_yyyy(now.date()));
    payload.set_if_blank("referral_time", format_hh_mm(now.time()));

    payload.set_if_blank("agency_name", profile.agency_name.as_str());
    payload.set_if_blank("staff_person", profile.staff_person.as_str());
    payload.set_if_blank("referrer_name", profile.referrer_name.as_str());
    payload.set_if_blank("referrer_phone", profile.referrer_phone.as_str());
    payload.set_if_blank("referrer_phone_type", profile.referrer_phone_type.as_str());
    payload.set_if_blank("referrer_email", profile.referrer_email.as_str());
    payload.set_if_blank(
        "referrer_relationship",
        profile.referrer_relationship.as_str(),
    );

    let dob = payload.text("individual_dob");
    if let Some(parsed) = parse_flexible_date(&dob) {
        payload.set_if_blank("individual_age", age_text(parsed, now.date()));
    }
    let converted = iso_to_mm_dd_yyyy(&dob);
    if !converted.is_empty() {
        payload.set("individual_dob", converted);
    }
}
