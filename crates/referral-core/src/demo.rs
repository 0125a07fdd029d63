//! Built-in demo submissions served by the `GET` fill endpoints

use chrono::NaiveDate;
use serde_json::json;

use crate::dates::format_mm_dd_yyyy;
use crate::payload::IntakePayload;

/// 1x1 transparent PNG used as a placeholder signature
pub const PLACEHOLDER_SIGNATURE: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mP8Xw8AAukBdy9d2WkAAAAASUVORK5CYII=";

/// A referral that exercises every section of the referral form,
/// including several facility boxes and the "Other" facility name.
pub fn referral_demo() -> IntakePayload {
    let value = json!({
        "referral_date": "2025-08-12",
        "referral_time": "14:30",
        "agency_name": "Safe Life Home Health Care",
        "staff_person": "Intake Team",

        "referrer_name": "John Doe",
        "referrer_phone": "312-555-0100",
        "referrer_phone_type": "Cell",
        "referrer_email": "john@example.com",
        "referrer_relationship": "Daughter",

        "individual_name": "Jane Smith",
        "individual_age": "79",
        "individual_dob": "1946-01-10",
        "individual_address": "101 W 22nd St, Apt 4B",
        "individual_city": "Chicago",
        "individual_zip": "60616",
        "individual_county": "Cook",
        "individual_phone": "773-555-2222",
        "individual_email": "jane.smith@example.com",
        "individual_pref_language": "English",
        "individual_lives_alone": "Yes",
        "individual_safety_issues": "Yes",
        "individual_safety_desc": "Large dog on premises.",

        "facility_name": "Sunrise Residence",
        "facility_address": "2000 N Example Ave, Chicago, IL",
        "facility_type": ["Supportive Living Program", "Hospice Facility", "Other"],
        "facility_other_name": "Memory Care Wing",

        "has_spouse": "Yes",
        "spouse_name": "Robert Smith",
        "spouse_needs_services": "No",
        "spouse_age": "82",
        "has_caregiver": "Yes",
        "caregiver_contact": "Mary Smith (POA), 312-555-1001",

        "legal_guardian": "Yes",
        "representative_payee": "No",
        "poa_health": "Yes",
        "poa_financial": "Unknown",
        "rep_contact": "POA: Mary Smith, mary@example.com",

        "other_person_exists": "Yes",
        "other_person_name": "Grandson: Luke",
        "other_person_age": "14",

        "hearing_loss": "Unknown",
        "vision_issues": "Yes",
        "alz_dementia": "Unknown",
        "mental_health": "No",
        "physical_disability": "Yes",
        "intellectual_dev_disability": "No",
        "brain_injury": "Yes",
        "pref_comm_method": "Phone (TTY if needed)",

        "reason_for_referral": "Needs home support with ADLs and light housekeeping.",
        "receives_services": "Yes",
        "types_services": "Meals on Wheels; nurse visits weekly",
        "problems_with_services": "Yes",
        "problems_explain": "Service days occasionally missed; needs medication reminders",

        "military_service": "No",
        "aware_of_referral": "Yes",
        "immediate_danger": "No",
        "danger_explain": "N/A",
        "immediate_assistance": "Yes",
        "assist_explain": "Needs urgent home safety assessment",

        "wants_someone_present": "Yes",
        "who_present": "Daughter (Mary Smith)",
        "best_time": "Weekday mornings",
        "best_phone": "773-555-2222",
        "best_email": "jane.smith@example.com"
    });
    IntakePayload::from_value(value).unwrap_or_default()
}

/// A consent submission for a ZIP that has both an email and phones in
/// the bundled lookup, signed with placeholder images
pub fn consent_demo(today: NaiveDate) -> IntakePayload {
    let value = json!({
        "referral_date": format_mm_dd_yyyy(today),
        "individual_name": "Jane Doe",
        "individual_address": "101 W 22nd St STE 202",
        "individual_city": "Lombard",
        "individual_county": "DuPage",
        "individual_zip": "60148",
        "individual_email": "jane.doe@example.com",
        "individual_phone": "224-555-0199",
        "best_phone": "224-555-0100",
        "reason_for_referral": "Needs assistance with in-home care and transportation.",
        "consent_client_signature": PLACEHOLDER_SIGNATURE,
        "consent_agency_signature": PLACEHOLDER_SIGNATURE
    });
    IntakePayload::from_value(value).unwrap_or_default()
}
