//! Column catalogue for the register.
//!
//! One place defines the storage column names, their order, the form
//! labels and input types. The record store, the exporters and the form
//! pages all walk the same lists, so a column can never appear in one and
//! not the others.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::types::Value;

use crate::models::{FollowUp, FollowUpKind, VisitEntry, VisitRecord};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ═══════════════════════════════════════════
// Field descriptors
// ═══════════════════════════════════════════

pub const YES_NO: &[(&str, &str)] = &[("Y", "Yes"), ("N", "No")];
pub const TEST_RESULT: &[(&str, &str)] = &[("P", "Positive"), ("N", "Negative"), ("ND", "Not done")];
pub const SEX: &[(&str, &str)] = &[("F", "Female"), ("M", "Male")];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputKind {
    Text,
    Date,
    Time,
    DateTime,
    Integer,
    Decimal,
    Choice(&'static [(&'static str, &'static str)]),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub input: InputKind,
    pub required: bool,
}

const fn field(name: &'static str, label: &'static str, input: InputKind) -> FieldSpec {
    FieldSpec { name, label, input, required: false }
}

const fn required(name: &'static str, label: &'static str, input: InputKind) -> FieldSpec {
    FieldSpec { name, label, input, required: true }
}

#[derive(Debug, Clone, Copy)]
pub struct Section {
    pub title: &'static str,
    pub fields: &'static [FieldSpec],
}

pub const DEMOGRAPHICS: Section = Section {
    title: "Client Details",
    fields: &[
        field("serial_no", "Serial No.", InputKind::Text),
        field("national_id", "National ID / Birth Cert. No.", InputKind::Text),
        required("client_name", "Client Name", InputKind::Text),
        field("address", "Address", InputKind::Text),
        field("contact_no", "Contact No.", InputKind::Text),
        field("next_of_kin", "Next of Kin", InputKind::Text),
        field("ovc", "OVC", InputKind::Choice(YES_NO)),
        required("age", "Age (years)", InputKind::Integer),
        required("sex", "Sex", InputKind::Choice(SEX)),
        field("marital_status", "Marital Status", InputKind::Text),
        field("disability", "Disability", InputKind::Text),
    ],
};

pub const INITIAL_VISIT: Section = Section {
    title: "Initial Visit",
    fields: &[
        required("visit_date", "Date of Arrival", InputKind::Date),
        field("arrival_time", "Time of Arrival", InputKind::Time),
        field("incident_at", "Date & Time of Incident", InputKind::DateTime),
        field("medical_form_filled", "Date Medical Form Filled", InputKind::Date),
        field("p3_form", "P3 Form Filled", InputKind::Choice(YES_NO)),
        field("perpetrator_relation", "Relationship to Perpetrator", InputKind::Text),
        field("type_of_violence", "Type of Violence", InputKind::Text),
        field("type_of_case", "Type of Case", InputKind::Text),
        field("facility_name", "Facility Name", InputKind::Text),
    ],
};

pub const LABORATORY: Section = Section {
    title: "Laboratory",
    fields: &[
        field("hiv_test_initial", "HIV Test", InputKind::Choice(TEST_RESULT)),
        field("pregnancy_test_initial", "Pregnancy Test", InputKind::Choice(TEST_RESULT)),
        field("anal_swab", "Anal Swab", InputKind::Text),
        field("hvs", "HVS", InputKind::Text),
        field("spermatozoa", "Spermatozoa", InputKind::Text),
        field("urinalysis", "Urinalysis", InputKind::Text),
        field("hep_b_initial", "Hepatitis B", InputKind::Choice(TEST_RESULT)),
        field("syphilis_initial", "Syphilis", InputKind::Choice(TEST_RESULT)),
    ],
};

pub const TREATMENT: Section = Section {
    title: "Treatment",
    fields: &[
        field("ecp_given", "ECP Given", InputKind::Choice(YES_NO)),
        field("pep_given", "PEP Given", InputKind::Choice(YES_NO)),
        field("sti_treatment", "STI Treatment", InputKind::Choice(YES_NO)),
        field("trauma_counseling_initial", "Trauma Counselling", InputKind::Choice(YES_NO)),
        field("adherence_counseling_initial", "Adherence Counselling", InputKind::Choice(YES_NO)),
        field("tt_given_initial", "TT Given", InputKind::Choice(YES_NO)),
        field("hep_b_vaccine_initial", "Hep B Vaccine", InputKind::Choice(YES_NO)),
        field("syphilis_treatment", "Syphilis Treatment", InputKind::Choice(YES_NO)),
        field("referral_initial", "Referral (code 1-6)", InputKind::Text),
    ],
};

pub const OUTCOME: Section = Section {
    title: "Outcome",
    fields: &[field("client_outcome", "Client Outcome", InputKind::Text)],
};

pub const ENTRY_SECTIONS: [Section; 5] = [DEMOGRAPHICS, INITIAL_VISIT, LABORATORY, TREATMENT, OUTCOME];

/// Follow-up fields by base name; storage columns add the kind suffix.
pub const FOLLOW_UP_FIELDS: &[FieldSpec] = &[
    required("actual_return", "Actual Return Date", InputKind::Date),
    field("next_appointment", "Next Appointment", InputKind::Date),
    field("status", "Client Status", InputKind::Text),
    field("referral", "Referral", InputKind::Text),
    field("trauma_counseling", "Trauma Counselling", InputKind::Choice(YES_NO)),
    field("adherence_counseling", "Adherence Counselling", InputKind::Choice(YES_NO)),
    field("pep_refill", "PEP Refill", InputKind::Choice(YES_NO)),
    field("pep_completed", "PEP Completed", InputKind::Choice(YES_NO)),
    field("hiv_test", "HIV Test", InputKind::Choice(TEST_RESULT)),
    field("pregnancy_test", "Pregnancy Test", InputKind::Choice(TEST_RESULT)),
    field("hep_b_test", "Hep B Test", InputKind::Choice(TEST_RESULT)),
    field("hb", "Hb (g/dL)", InputKind::Decimal),
    field("alt", "ALT (U/L)", InputKind::Integer),
    field("hep_b_vaccine", "Hep B Vaccine Dose", InputKind::Text),
    field("tt_given", "TT Given", InputKind::Choice(YES_NO)),
    field("syphilis_test", "Syphilis Test", InputKind::Choice(TEST_RESULT)),
    field("referral_update", "Referral Update", InputKind::Text),
];

// ═══════════════════════════════════════════
// Column names
// ═══════════════════════════════════════════

pub fn follow_up_column(base: &str, kind: FollowUpKind) -> String {
    format!("{base}_{}", kind.suffix())
}

pub fn follow_up_columns(kind: FollowUpKind) -> Vec<String> {
    FOLLOW_UP_FIELDS
        .iter()
        .map(|f| follow_up_column(f.name, kind))
        .collect()
}

/// Every entry column in catalogue order: sections, then follow-ups 2w → 6m.
pub fn entry_columns() -> Vec<String> {
    let mut columns: Vec<String> = ENTRY_SECTIONS
        .iter()
        .flat_map(|s| s.fields.iter().map(|f| f.name.to_string()))
        .collect();
    for kind in FollowUpKind::ALL {
        columns.extend(follow_up_columns(kind));
    }
    columns
}

/// Header row shared by the CSV and spreadsheet exports.
pub fn export_columns() -> Vec<String> {
    let mut columns = vec!["id".to_string(), "created_at".to_string()];
    columns.extend(entry_columns());
    columns
}

pub fn find_field(name: &str) -> Option<&'static FieldSpec> {
    ENTRY_SECTIONS
        .iter()
        .flat_map(|s| s.fields.iter())
        .find(|f| f.name == name)
}

// ═══════════════════════════════════════════
// Values
// ═══════════════════════════════════════════

fn text(value: &Option<String>) -> Value {
    match value {
        Some(s) => Value::Text(s.clone()),
        None => Value::Null,
    }
}

fn date(value: Option<NaiveDate>) -> Value {
    match value {
        Some(d) => Value::Text(d.format(DATE_FORMAT).to_string()),
        None => Value::Null,
    }
}

fn time(value: Option<NaiveTime>) -> Value {
    match value {
        Some(t) => Value::Text(t.format(TIME_FORMAT).to_string()),
        None => Value::Null,
    }
}

fn datetime(value: Option<NaiveDateTime>) -> Value {
    match value {
        Some(dt) => Value::Text(dt.format(DATETIME_FORMAT).to_string()),
        None => Value::Null,
    }
}

/// Initial-visit values paired with their column names, in section order.
pub fn initial_values(entry: &VisitEntry) -> Vec<(&'static str, Value)> {
    let d = &entry.demographics;
    let v = &entry.initial_visit;
    let l = &entry.lab_results;
    let t = &entry.treatments;
    vec![
        ("serial_no", text(&d.serial_no)),
        ("national_id", text(&d.national_id)),
        ("client_name", Value::Text(d.client_name.clone())),
        ("address", text(&d.address)),
        ("contact_no", text(&d.contact_no)),
        ("next_of_kin", text(&d.next_of_kin)),
        ("ovc", text(&d.ovc)),
        ("age", Value::Integer(i64::from(d.age))),
        ("sex", Value::Text(d.sex.as_str().to_string())),
        ("marital_status", text(&d.marital_status)),
        ("disability", text(&d.disability)),
        ("visit_date", date(Some(v.visit_date))),
        ("arrival_time", time(v.arrival_time)),
        ("incident_at", datetime(v.incident_at)),
        ("medical_form_filled", date(v.medical_form_filled)),
        ("p3_form", text(&v.p3_form)),
        ("perpetrator_relation", text(&v.perpetrator_relation)),
        ("type_of_violence", text(&v.type_of_violence)),
        ("type_of_case", text(&v.type_of_case)),
        ("facility_name", text(&v.facility_name)),
        ("hiv_test_initial", text(&l.hiv_test)),
        ("pregnancy_test_initial", text(&l.pregnancy_test)),
        ("anal_swab", text(&l.anal_swab)),
        ("hvs", text(&l.hvs)),
        ("spermatozoa", text(&l.spermatozoa)),
        ("urinalysis", text(&l.urinalysis)),
        ("hep_b_initial", text(&l.hep_b)),
        ("syphilis_initial", text(&l.syphilis)),
        ("ecp_given", text(&t.ecp_given)),
        ("pep_given", text(&t.pep_given)),
        ("sti_treatment", text(&t.sti_treatment)),
        ("trauma_counseling_initial", text(&t.trauma_counseling)),
        ("adherence_counseling_initial", text(&t.adherence_counseling)),
        ("tt_given_initial", text(&t.tt_given)),
        ("hep_b_vaccine_initial", text(&t.hep_b_vaccine)),
        ("syphilis_treatment", text(&t.syphilis_treatment)),
        ("referral_initial", text(&t.referral)),
        ("client_outcome", text(&entry.client_outcome)),
    ]
}

/// Follow-up values by base name. `None` yields all-NULL (pending).
pub fn follow_up_values(follow_up: Option<&FollowUp>) -> Vec<(&'static str, Value)> {
    let Some(f) = follow_up else {
        return FOLLOW_UP_FIELDS.iter().map(|s| (s.name, Value::Null)).collect();
    };
    vec![
        ("actual_return", date(Some(f.date))),
        ("next_appointment", date(f.next_appointment)),
        ("status", text(&f.status)),
        ("referral", text(&f.referral)),
        ("trauma_counseling", text(&f.trauma_counseling)),
        ("adherence_counseling", text(&f.adherence_counseling)),
        ("pep_refill", text(&f.pep_refill)),
        ("pep_completed", text(&f.pep_completed)),
        ("hiv_test", text(&f.hiv_test)),
        ("pregnancy_test", text(&f.pregnancy_test)),
        ("hep_b_test", text(&f.hep_b_test)),
        ("hb", f.hb.map(Value::Real).unwrap_or(Value::Null)),
        ("alt", f.alt.map(|a| Value::Integer(i64::from(a))).unwrap_or(Value::Null)),
        ("hep_b_vaccine", text(&f.hep_b_vaccine)),
        ("tt_given", text(&f.tt_given)),
        ("syphilis_test", text(&f.syphilis_test)),
        ("referral_update", text(&f.referral_update)),
    ]
}

/// All entry values keyed by storage column, in `entry_columns()` order.
pub fn entry_values(entry: &VisitEntry) -> Vec<(String, Value)> {
    let mut values: Vec<(String, Value)> = initial_values(entry)
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect();
    for kind in FollowUpKind::ALL {
        values.extend(
            follow_up_values(entry.follow_ups.get(kind))
                .into_iter()
                .map(|(base, value)| (follow_up_column(base, kind), value)),
        );
    }
    values
}

/// One export row, in `export_columns()` order.
pub fn record_values(record: &VisitRecord) -> Vec<Value> {
    let mut values = vec![
        Value::Integer(record.id),
        datetime(Some(record.created_at)),
    ];
    values.extend(entry_values(&record.entry).into_iter().map(|(_, v)| v));
    values
}

/// Plain-text rendering of a stored value, as written to CSV cells.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(i) => i.to_string(),
        Value::Real(r) => r.to_string(),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

/// Human-readable rendering for pages and print: choice codes become labels.
pub fn field_display(spec: &FieldSpec, value: &Value) -> String {
    let raw = display_value(value);
    match spec.input {
        InputKind::Choice(options) => options
            .iter()
            .find(|(code, _)| *code == raw)
            .map_or(raw.clone(), |(_, label)| (*label).to_string()),
        _ => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::sample_entry;

    #[test]
    fn initial_values_follow_section_order() {
        let entry = sample_entry("2024-03-15");
        let names: Vec<&str> = initial_values(&entry).iter().map(|(n, _)| *n).collect();
        let expected: Vec<&str> = ENTRY_SECTIONS
            .iter()
            .flat_map(|s| s.fields.iter().map(|f| f.name))
            .collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn follow_up_values_follow_field_order() {
        let follow_up = FollowUp::on(NaiveDate::from_ymd_opt(2024, 3, 29).unwrap());
        let names: Vec<&str> = follow_up_values(Some(&follow_up)).iter().map(|(n, _)| *n).collect();
        let expected: Vec<&str> = FOLLOW_UP_FIELDS.iter().map(|f| f.name).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn entry_values_match_entry_columns() {
        let entry = sample_entry("2024-03-15");
        let names: Vec<String> = entry_values(&entry).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, entry_columns());
    }

    #[test]
    fn export_columns_start_with_identity() {
        let columns = export_columns();
        assert_eq!(columns[0], "id");
        assert_eq!(columns[1], "created_at");
        assert!(columns.contains(&"actual_return_6m".to_string()));
        assert!(columns.contains(&"client_outcome".to_string()));
        assert!(columns.contains(&"hep_b_test_3m".to_string()));
        // 38 initial-visit columns + 4 × 17 follow-up columns + id + created_at
        assert_eq!(columns.len(), 2 + 38 + 4 * 17);
    }

    #[test]
    fn pending_follow_up_is_all_null() {
        assert!(follow_up_values(None).iter().all(|(_, v)| *v == Value::Null));
    }

    #[test]
    fn display_value_renders_cells() {
        assert_eq!(display_value(&Value::Null), "");
        assert_eq!(display_value(&Value::Integer(24)), "24");
        assert_eq!(display_value(&Value::Real(11.5)), "11.5");
        assert_eq!(display_value(&Value::Text("Y".into())), "Y");
    }

    #[test]
    fn choice_codes_display_as_labels() {
        let sex = find_field("sex").unwrap();
        assert_eq!(field_display(sex, &Value::Text("F".into())), "Female");
        assert_eq!(field_display(sex, &Value::Text("X".into())), "X");
        let name = find_field("client_name").unwrap();
        assert_eq!(field_display(name, &Value::Text("F".into())), "F");
        assert_eq!(field_display(sex, &Value::Null), "");
    }

    #[test]
    fn required_fields_are_marked() {
        assert!(find_field("client_name").unwrap().required);
        assert!(find_field("visit_date").unwrap().required);
        assert!(!find_field("address").unwrap().required);
        assert!(find_field("nonexistent").is_none());
    }
}
