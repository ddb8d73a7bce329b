//! Normalization of submitted HTML forms into typed entries.
//!
//! Blank inputs become absent values, dates and numbers are parsed, and
//! choice fields are checked against their option codes. Everything past
//! this module works with `VisitEntry` and `FollowUp` only.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::models::*;
use crate::schema::{self, FieldSpec, InputKind, DATE_FORMAT, FOLLOW_UP_FIELDS};

pub type FormData = HashMap<String, String>;

const TIME_INPUTS: &[&str] = &["%H:%M", "%H:%M:%S"];
const DATETIME_INPUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

fn spec_for(name: &str) -> Option<&'static FieldSpec> {
    schema::find_field(name).or_else(|| FOLLOW_UP_FIELDS.iter().find(|f| f.name == name))
}

struct FormReader<'a> {
    form: &'a FormData,
}

impl<'a> FormReader<'a> {
    fn raw(&self, name: &str) -> Option<&'a str> {
        self.form
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Text input; choice fields are matched case-insensitively and stored
    /// as their option code.
    fn text(&self, name: &str) -> Result<Option<String>, ValidationError> {
        let Some(value) = self.raw(name) else {
            return Ok(None);
        };
        match spec_for(name).map(|s| s.input) {
            Some(InputKind::Choice(options)) => options
                .iter()
                .find(|(code, _)| code.eq_ignore_ascii_case(value))
                .map(|(code, _)| Some((*code).to_string()))
                .ok_or_else(|| ValidationError::InvalidChoice {
                    field: name.into(),
                    value: value.into(),
                }),
            _ => Ok(Some(value.to_string())),
        }
    }

    fn required_text(&self, name: &str) -> Result<String, ValidationError> {
        self.text(name)?
            .ok_or_else(|| ValidationError::MissingField(name.into()))
    }

    fn parsed<T>(
        &self,
        name: &str,
        parse: impl Fn(&str) -> Option<T>,
        invalid: impl Fn(String, String) -> ValidationError,
    ) -> Result<Option<T>, ValidationError> {
        match self.raw(name) {
            None => Ok(None),
            Some(value) => parse(value)
                .map(Some)
                .ok_or_else(|| invalid(name.into(), value.into())),
        }
    }

    fn date(&self, name: &str) -> Result<Option<NaiveDate>, ValidationError> {
        self.parsed(
            name,
            |s| NaiveDate::parse_from_str(s, DATE_FORMAT).ok(),
            |field, value| ValidationError::InvalidDate { field, value },
        )
    }

    fn required_date(&self, name: &str) -> Result<NaiveDate, ValidationError> {
        self.date(name)?
            .ok_or_else(|| ValidationError::MissingField(name.into()))
    }

    fn time(&self, name: &str) -> Result<Option<NaiveTime>, ValidationError> {
        self.parsed(
            name,
            |s| TIME_INPUTS.iter().find_map(|f| NaiveTime::parse_from_str(s, f).ok()),
            |field, value| ValidationError::InvalidDate { field, value },
        )
    }

    fn datetime(&self, name: &str) -> Result<Option<NaiveDateTime>, ValidationError> {
        self.parsed(
            name,
            |s| DATETIME_INPUTS.iter().find_map(|f| NaiveDateTime::parse_from_str(s, f).ok()),
            |field, value| ValidationError::InvalidDate { field, value },
        )
    }

    fn number<T: FromStr>(&self, name: &str) -> Result<Option<T>, ValidationError> {
        self.parsed(
            name,
            |s| s.parse::<T>().ok(),
            |field, value| ValidationError::InvalidNumber { field, value },
        )
    }
}

/// Build a new case from the entry form.
pub fn parse_entry(form: &FormData) -> Result<VisitEntry, ValidationError> {
    let f = FormReader { form };

    let age = f
        .number::<u32>("age")?
        .ok_or_else(|| ValidationError::MissingField("age".into()))?;
    let sex_code = f.required_text("sex")?;
    let sex = Sex::from_str(&sex_code).map_err(|_| ValidationError::InvalidChoice {
        field: "sex".into(),
        value: sex_code.clone(),
    })?;

    Ok(VisitEntry {
        demographics: Demographics {
            serial_no: f.text("serial_no")?,
            national_id: f.text("national_id")?,
            client_name: f.required_text("client_name")?,
            address: f.text("address")?,
            contact_no: f.text("contact_no")?,
            next_of_kin: f.text("next_of_kin")?,
            ovc: f.text("ovc")?,
            age,
            sex,
            marital_status: f.text("marital_status")?,
            disability: f.text("disability")?,
        },
        initial_visit: InitialVisit {
            visit_date: f.required_date("visit_date")?,
            arrival_time: f.time("arrival_time")?,
            incident_at: f.datetime("incident_at")?,
            medical_form_filled: f.date("medical_form_filled")?,
            p3_form: f.text("p3_form")?,
            perpetrator_relation: f.text("perpetrator_relation")?,
            type_of_violence: f.text("type_of_violence")?,
            type_of_case: f.text("type_of_case")?,
            facility_name: f.text("facility_name")?,
        },
        lab_results: LabResults {
            hiv_test: f.text("hiv_test_initial")?,
            pregnancy_test: f.text("pregnancy_test_initial")?,
            anal_swab: f.text("anal_swab")?,
            hvs: f.text("hvs")?,
            spermatozoa: f.text("spermatozoa")?,
            urinalysis: f.text("urinalysis")?,
            hep_b: f.text("hep_b_initial")?,
            syphilis: f.text("syphilis_initial")?,
        },
        treatments: Treatments {
            ecp_given: f.text("ecp_given")?,
            pep_given: f.text("pep_given")?,
            sti_treatment: f.text("sti_treatment")?,
            trauma_counseling: f.text("trauma_counseling_initial")?,
            adherence_counseling: f.text("adherence_counseling_initial")?,
            tt_given: f.text("tt_given_initial")?,
            hep_b_vaccine: f.text("hep_b_vaccine_initial")?,
            syphilis_treatment: f.text("syphilis_treatment")?,
            referral: f.text("referral_initial")?,
        },
        client_outcome: f.text("client_outcome")?,
        follow_ups: FollowUps::default(),
    })
}

/// Read the `kind` select of the follow-up form.
pub fn parse_follow_up_kind(form: &FormData) -> Result<FollowUpKind, ValidationError> {
    let f = FormReader { form };
    f.raw("kind")
        .ok_or_else(|| ValidationError::MissingField("kind".into()))?
        .parse()
}

/// Build a follow-up from the follow-up form (fields keyed by base name).
pub fn parse_follow_up(form: &FormData) -> Result<FollowUp, ValidationError> {
    let f = FormReader { form };
    Ok(FollowUp {
        date: f.required_date("actual_return")?,
        next_appointment: f.date("next_appointment")?,
        status: f.text("status")?,
        referral: f.text("referral")?,
        trauma_counseling: f.text("trauma_counseling")?,
        adherence_counseling: f.text("adherence_counseling")?,
        pep_refill: f.text("pep_refill")?,
        pep_completed: f.text("pep_completed")?,
        hiv_test: f.text("hiv_test")?,
        pregnancy_test: f.text("pregnancy_test")?,
        hep_b_test: f.text("hep_b_test")?,
        hb: f.number::<f64>("hb")?,
        alt: f.number::<u32>("alt")?,
        hep_b_vaccine: f.text("hep_b_vaccine")?,
        tt_given: f.text("tt_given")?,
        syphilis_test: f.text("syphilis_test")?,
        referral_update: f.text("referral_update")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> FormData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("client_name", "Jane Wanjiru"),
            ("age", "24"),
            ("sex", "F"),
            ("visit_date", "2024-03-15"),
        ]
    }

    #[test]
    fn minimal_entry_parses_with_blanks_absent() {
        let mut pairs = minimal();
        pairs.push(("address", "   "));
        pairs.push(("pep_given", ""));
        let entry = parse_entry(&form(&pairs)).unwrap();

        assert_eq!(entry.demographics.client_name, "Jane Wanjiru");
        assert_eq!(entry.demographics.age, 24);
        assert_eq!(entry.demographics.sex, Sex::Female);
        assert_eq!(entry.demographics.address, None);
        assert_eq!(entry.treatments.pep_given, None);
        assert_eq!(
            entry.initial_visit.visit_date,
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );
    }

    #[test]
    fn client_outcome_is_read() {
        let mut pairs = minimal();
        pairs.push(("client_outcome", " Referred to police "));
        let entry = parse_entry(&form(&pairs)).unwrap();
        assert_eq!(entry.client_outcome.as_deref(), Some("Referred to police"));
        assert_eq!(parse_entry(&form(&minimal())).unwrap().client_outcome, None);
    }

    #[test]
    fn browser_date_time_inputs_parse() {
        let mut pairs = minimal();
        pairs.push(("arrival_time", "09:30"));
        pairs.push(("incident_at", "2024-03-14T22:00"));
        let entry = parse_entry(&form(&pairs)).unwrap();

        assert_eq!(entry.initial_visit.arrival_time, NaiveTime::from_hms_opt(9, 30, 0));
        assert_eq!(
            entry.initial_visit.incident_at,
            NaiveDate::from_ymd_opt(2024, 3, 14).unwrap().and_hms_opt(22, 0, 0)
        );
    }

    #[test]
    fn choice_codes_are_normalized() {
        let mut pairs = minimal();
        pairs.push(("pep_given", "y"));
        pairs.push(("hiv_test_initial", "nd"));
        let entry = parse_entry(&form(&pairs)).unwrap();
        assert_eq!(entry.treatments.pep_given.as_deref(), Some("Y"));
        assert_eq!(entry.lab_results.hiv_test.as_deref(), Some("ND"));
    }

    #[test]
    fn unknown_choice_is_rejected() {
        let mut pairs = minimal();
        pairs.push(("pep_given", "maybe"));
        let err = parse_entry(&form(&pairs)).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidChoice { field: "pep_given".into(), value: "maybe".into() }
        );
    }

    #[test]
    fn missing_required_fields_are_reported() {
        let err = parse_entry(&form(&[("age", "24"), ("sex", "F"), ("visit_date", "2024-03-15")]))
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingField("client_name".into()));

        let err = parse_entry(&form(&[("client_name", "A"), ("sex", "F"), ("visit_date", "2024-03-15")]))
            .unwrap_err();
        assert_eq!(err, ValidationError::MissingField("age".into()));
    }

    #[test]
    fn malformed_values_are_rejected() {
        let mut pairs = minimal();
        pairs[3] = ("visit_date", "2024-02-30");
        assert!(matches!(
            parse_entry(&form(&pairs)).unwrap_err(),
            ValidationError::InvalidDate { .. }
        ));

        let mut pairs = minimal();
        pairs[1] = ("age", "-3");
        assert!(matches!(
            parse_entry(&form(&pairs)).unwrap_err(),
            ValidationError::InvalidNumber { .. }
        ));
    }

    #[test]
    fn follow_up_form_parses() {
        let data = form(&[
            ("kind", "2weeks"),
            ("actual_return", "2024-03-29"),
            ("status", "resolved"),
            ("hb", "11.5"),
            ("alt", ""),
            ("hep_b_test", "p"),
            ("hep_b_vaccine", "3rd dose"),
        ]);
        assert_eq!(parse_follow_up_kind(&data).unwrap(), FollowUpKind::TwoWeeks);

        let follow_up = parse_follow_up(&data).unwrap();
        assert_eq!(follow_up.date, NaiveDate::from_ymd_opt(2024, 3, 29).unwrap());
        assert_eq!(follow_up.status.as_deref(), Some("resolved"));
        assert_eq!(follow_up.hb, Some(11.5));
        assert_eq!(follow_up.alt, None);
        assert_eq!(follow_up.hep_b_test.as_deref(), Some("P"));
        assert_eq!(follow_up.hep_b_vaccine.as_deref(), Some("3rd dose"));
    }

    #[test]
    fn follow_up_kind_must_be_known() {
        let err = parse_follow_up_kind(&form(&[("kind", "5weeks")])).unwrap_err();
        assert_eq!(err, ValidationError::UnknownFollowUpKind("5weeks".into()));
        let err = parse_follow_up_kind(&form(&[])).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("kind".into()));
    }

    #[test]
    fn follow_up_requires_return_date() {
        let err = parse_follow_up(&form(&[("status", "resolved")])).unwrap_err();
        assert_eq!(err, ValidationError::MissingField("actual_return".into()));
    }
}
