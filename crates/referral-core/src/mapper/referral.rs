//! CCP referral form schema

use super::{is_truthy, FieldSet, FieldTriple};
use crate::payload::IntakePayload;

/// Referrer phone type options (label, target)
const PHONE_TYPES: &[(&str, &str)] = &[("cell", "Cell"), ("home", "Home"), ("work", "Work")];

/// Representation questions: (payload key, yes, no, unknown)
const REPRESENTATION: &[(&str, &str, &str, &str)] = &[
    ("legal_guardian", "L_G_Yes", "L_G_No", "L_G_Unk"),
    ("representative_payee", "Rep_Yes", "Rep_No", "Rep_Unk"),
    ("poa_health", "POA_Yes", "POA_No", "POA_Unk"),
    ("poa_financial", "POAF_Yes", "POAF_No", "POAF_Unk"),
];

/// Health questions. The vision "yes" box is misspelled in the template.
const HEALTH: &[(&str, &str, &str, &str)] = &[
    ("hearing_loss", "Hearing_loss_Yes", "Hearing_loss_No", "Hearing_loss_Unk"),
    ("vision_issues", "Vission_loss_Yes", "Vision_loss_No", "Vision_loss_Unk"),
    ("alz_dementia", "Alz_Yes", "Alz_No", "Alz_Unk"),
    ("mental_health", "MHI_Yes", "MHI_No", "MHI_Unk"),
    ("physical_disability", "Dis_Yes", "Dis_No", "Dis_Unk"),
    ("brain_injury", "BI_Yes", "BI_No", "BI_Unk"),
];

/// Map an intake payload onto the referral template
pub fn referral_fields(p: &IntakePayload) -> Vec<FieldTriple> {
    let mut f = FieldSet::new();

    // Header
    f.text("Referral Date", p.text_any(&["referral_date", "referralDate"]));
    f.text("Referral Time", p.text_any(&["referral_time", "time"]));
    f.text("Agency Name", p.text_any(&["agency_name", "agencyName"]));
    f.text(
        "Staff person taking referral",
        p.text_any(&["staff_person", "staffPerson"]),
    );

    // Person making the referral
    f.text("Name", p.text("referrer_name"));
    f.text("Phone of Referral Preparer", p.text("referrer_phone"));
    f.one_of(PHONE_TYPES, &p.text("referrer_phone_type"));
    f.text("Email of Referral Preparer", p.text("referrer_email"));
    f.text(
        "Relationship to Individual in need of supports and services",
        p.text("referrer_relationship"),
    );

    // Individual
    f.text("Name_2", p.text("individual_name"));
    f.text("Age", p.text("individual_age"));
    f.text("Date of Birth", p.text("individual_dob"));
    f.text("Address", p.text("individual_address"));
    f.text("City", p.text("individual_city"));
    f.text("Zip Code", p.text("individual_zip"));
    f.text("County", p.text("individual_county"));
    f.text("Phone of Client", p.text("individual_phone"));
    f.text("Email_2", p.text("individual_email"));
    f.text(
        "If not Englishspeaking preferred language",
        p.text("individual_pref_language"),
    );
    f.yes_no(
        "Lives_Alone_Yes",
        "Lives_Alone_No",
        &p.text("individual_lives_alone"),
    );
    f.yes_no(
        "Safety Issue_Yes",
        "Safety_issue_No",
        &p.text("individual_safety_issues"),
    );
    f.text("What Safety Issue?", p.text("individual_safety_desc"));

    facility(&mut f, p);

    // Spouse & caregiver
    f.yes_no("Spouse_Yes", "Spouse_No", &p.text("has_spouse"));
    f.text("If yes Spouse Name", p.text("spouse_name"));
    f.yes_no(
        "Spouse needs services_Yes",
        "Spouse needs services_No",
        &p.text("spouse_needs_services"),
    );
    f.text("Age of spouse", p.text("spouse_age"));
    f.yes_no(
        "Friend/Family Caregiver_Yes",
        "Friend_Family Caregiver_No",
        &p.text_first_present(&["has_caregiver", "caregiver_exists"]),
    );
    f.text(
        "If yes provide contact information if known",
        p.text("caregiver_contact"),
    );

    // Representation
    for (key, yes, no, unk) in REPRESENTATION {
        f.tri_state(yes, no, Some(unk), &p.text(key));
    }
    let rep_contact = p.text("rep_contact");
    if !rep_contact.is_empty() {
        f.text("If yes provide contact information if known_2", rep_contact.clone());
        f.text("If yes provide contact information if known_3", rep_contact);
    }

    // Other person in home
    f.yes_no(
        "Any other needs service_Yes",
        "Any other needs service_No",
        &p.text("other_person_exists"),
    );
    f.text("Name of other individual if known", p.text("other_person_name"));
    f.text("Age of other individual if known", p.text("other_person_age"));

    // Health
    for (key, yes, no, unk) in HEALTH.iter().take(5) {
        f.tri_state(yes, no, Some(unk), &p.text(key));
    }
    f.tri_state(
        "I/D_Yes",
        "I/D_No",
        Some("I/D_Unk"),
        &p.text_first_present(&["intellectual_dev_disability", "idd"]),
    );
    let (key, yes, no, unk) = HEALTH[5];
    f.tri_state(yes, no, Some(unk), &p.text(key));
    f.text(
        "If yes preferred method of communication ie Interpreter TTY Relay Services or Braille Assistance",
        p.text("pref_comm_method"),
    );

    // Current services & problems
    f.text(
        "Reason for Referral general concerns",
        p.text("reason_for_referral"),
    );
    f.yes_no(
        "Receive any support_Yes",
        "Receive any support_No",
        &p.text("receives_services"),
    );
    f.text(
        "What support and services does the client recieve now?",
        p.text_any(&["types_services", "current_services_types"]),
    );
    f.yes_no(
        "Problem with current support_Yes",
        "Problem with current support_No",
        &p.text("problems_with_services"),
    );
    f.text(
        "Explain the problems with current support",
        p.text("problems_explain"),
    );

    // More questions
    f.yes_no("Mil_Yes", "Mil_No", &p.text("military_service"));
    f.tri_state(
        "Aware_yes",
        "Aware_No",
        Some("Aware_Unk"),
        &p.text("aware_of_referral"),
    );
    f.tri_state(
        "Danger_Yes",
        "Danger_No",
        Some("Danger_Unk"),
        &p.text("immediate_danger"),
    );
    f.text(
        "Is the Individual in immediate danger Yes No Unknown Explain",
        p.text("danger_explain"),
    );
    f.yes_no(
        "Imm_Assistance_Yes",
        "Imm_Assistance_No",
        &p.text("immediate_assistance"),
    );
    f.text(
        "Is the Individual in need of immediate assistance Yes No Explain",
        p.text("assist_explain"),
    );
    f.yes_no(
        "Someone Present at time of visit (Yes)",
        "Someone Present at time of visit (No)",
        &p.text("wants_someone_present"),
    );
    f.text(
        "Who does the client wants to be present at time of visit?",
        p.text("who_present"),
    );

    f.text("Best Time to Contact", p.text("best_time"));
    f.text("Best Phone to contact", p.text("best_phone"));
    f.text("Best Email to contact", p.text("best_email"));

    f.into_triples()
}

/// Facility section. `facility_type` may be a single answer or a list;
/// every matching box is checked.
fn facility(f: &mut FieldSet, p: &IntakePayload) {
    f.text("Facility Name", p.text("facility_name"));
    f.text("Facility Address", p.text("facility_address"));

    let types = p.list("facility_type").join(" | ").to_lowercase();
    f.checkbox("Assisted Living", types.contains("assisted"));
    f.checkbox("Supportive Living Program", types.contains("supportive"));
    f.checkbox(
        "Longterm Care Facility Nursing Home",
        types.contains("long") || types.contains("nursing"),
    );
    f.checkbox("Hospital", types.contains("hospital"));
    f.checkbox("Hospice Facility", types.contains("hospice"));

    let other_name = p.text("facility_other_name");
    let is_other = types.contains("other") || !other_name.is_empty();
    f.checkbox("Other Name", is_other);
    if is_other {
        let name = if other_name.is_empty() {
            p.text("facility_type")
        } else {
            other_name
        };
        f.text("Other Facility Name", name);
    }
}

/// Consent checkbox on the final step, used by validation
pub fn consent_agreed(p: &IntakePayload) -> bool {
    is_truthy(&p.text("consent_agree"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::{FieldKind, FieldValue};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn triples(value: serde_json::Value) -> Vec<FieldTriple> {
        referral_fields(&IntakePayload::from_value(value).unwrap())
    }

    fn value_of<'a>(t: &'a [FieldTriple], name: &str) -> Option<&'a FieldValue> {
        t.iter().rev().find(|x| x.name == name).map(|x| &x.value)
    }

    fn text(s: &str) -> FieldValue {
        FieldValue::Text(s.to_string())
    }

    #[test]
    fn test_header_fallback_keys() {
        let t = triples(json!({"referralDate": "08/12/2025", "time": "14:30"}));
        assert_eq!(value_of(&t, "Referral Date"), Some(&text("08/12/2025")));
        assert_eq!(value_of(&t, "Referral Time"), Some(&text("14:30")));
    }

    #[test]
    fn test_missing_text_is_cleared() {
        let t = triples(json!({}));
        assert_eq!(value_of(&t, "Name_2"), Some(&text("")));
        assert_eq!(value_of(&t, "Best Email to contact"), Some(&text("")));
    }

    #[test]
    fn test_phone_type_one_of() {
        let t = triples(json!({"referrer_phone_type": "Cell"}));
        assert_eq!(value_of(&t, "Cell"), Some(&FieldValue::Checked(true)));
        assert_eq!(value_of(&t, "Home"), Some(&FieldValue::Checked(false)));
        assert_eq!(value_of(&t, "Work"), Some(&FieldValue::Checked(false)));
    }

    #[test]
    fn test_facility_multi_select_with_other() {
        let t = triples(json!({
            "facility_type": ["Supportive Living Program", "Hospice Facility", "Other"],
            "facility_other_name": "Memory Care Wing"
        }));
        assert_eq!(
            value_of(&t, "Supportive Living Program"),
            Some(&FieldValue::Checked(true))
        );
        assert_eq!(value_of(&t, "Hospice Facility"), Some(&FieldValue::Checked(true)));
        assert_eq!(value_of(&t, "Hospital"), Some(&FieldValue::Checked(false)));
        assert_eq!(value_of(&t, "Other Name"), Some(&FieldValue::Checked(true)));
        assert_eq!(
            value_of(&t, "Other Facility Name"),
            Some(&text("Memory Care Wing"))
        );
    }

    #[test]
    fn test_facility_other_falls_back_to_type_text() {
        let t = triples(json!({"facility_type": "Other group home"}));
        assert_eq!(
            value_of(&t, "Other Facility Name"),
            Some(&text("Other group home"))
        );
    }

    #[test]
    fn test_no_other_facility_leaves_name_untouched() {
        let t = triples(json!({"facility_type": "Hospital"}));
        assert_eq!(value_of(&t, "Other Facility Name"), None);
        assert_eq!(
            value_of(&t, "Longterm Care Facility Nursing Home"),
            Some(&FieldValue::Checked(false))
        );
    }

    #[test]
    fn test_rep_contact_only_written_when_present() {
        let t = triples(json!({}));
        assert_eq!(
            value_of(&t, "If yes provide contact information if known_2"),
            None
        );

        let t = triples(json!({"rep_contact": "POA: Mary"}));
        assert_eq!(
            value_of(&t, "If yes provide contact information if known_3"),
            Some(&text("POA: Mary"))
        );
    }

    #[test]
    fn test_vision_uses_template_spelling() {
        let t = triples(json!({"vision_issues": "Yes"}));
        assert_eq!(value_of(&t, "Vission_loss_Yes"), Some(&FieldValue::Checked(true)));
        assert_eq!(value_of(&t, "Vision_loss_No"), Some(&FieldValue::Checked(false)));
    }

    #[test]
    fn test_idd_fallback_key() {
        let t = triples(json!({"idd": "unknown"}));
        assert_eq!(value_of(&t, "I/D_Unk"), Some(&FieldValue::Checked(true)));
    }

    #[test]
    fn test_caregiver_fallback_key() {
        let t = triples(json!({"caregiver_exists": "yes"}));
        assert_eq!(
            value_of(&t, "Friend/Family Caregiver_Yes"),
            Some(&FieldValue::Checked(true))
        );
    }

    #[test]
    fn test_kinds_are_tagged() {
        let t = triples(json!({}));
        let kind = |name: &str| t.iter().find(|x| x.name == name).unwrap().kind;
        assert_eq!(kind("Mil_Yes"), FieldKind::YesNo);
        assert_eq!(kind("Danger_Unk"), FieldKind::TriState);
        assert_eq!(kind("Hospital"), FieldKind::Checkbox);
        assert_eq!(kind("Home"), FieldKind::OneOf);
        assert_eq!(kind("County"), FieldKind::Text);
    }

    #[test]
    fn test_demo_payload_covers_every_section() {
        let t = referral_fields(&crate::demo::referral_demo());
        assert_eq!(value_of(&t, "Name_2"), Some(&text("Jane Smith")));
        assert_eq!(value_of(&t, "POAF_Unk"), Some(&FieldValue::Checked(true)));
        assert_eq!(value_of(&t, "Mil_No"), Some(&FieldValue::Checked(true)));
    }

    #[test]
    fn test_consent_agreed() {
        let p = IntakePayload::from_value(json!({"consent_agree": true})).unwrap();
        assert!(consent_agreed(&p));
        assert!(!consent_agreed(&IntakePayload::new()));
    }
}
