//! Visit schema: typed mirror of one row of the paper register.
//!
//! `VisitEntry` is what a health worker submits; `VisitRecord` is what the
//! store hands back (entry plus the assigned case id and insert timestamp).

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::enums::{FollowUpKind, Sex};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitRecord {
    pub id: i64,
    pub created_at: NaiveDateTime,
    #[serde(flatten)]
    pub entry: VisitEntry,
}

/// One case as captured on the entry form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitEntry {
    pub demographics: Demographics,
    pub initial_visit: InitialVisit,
    #[serde(default)]
    pub lab_results: LabResults,
    #[serde(default)]
    pub treatments: Treatments,
    /// Final outcome of the case, recorded once known.
    #[serde(default)]
    pub client_outcome: Option<String>,
    #[serde(default)]
    pub follow_ups: FollowUps,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    #[serde(default)]
    pub serial_no: Option<String>,
    #[serde(default)]
    pub national_id: Option<String>,
    pub client_name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub contact_no: Option<String>,
    #[serde(default)]
    pub next_of_kin: Option<String>,
    /// Orphan or vulnerable child status code.
    #[serde(default)]
    pub ovc: Option<String>,
    pub age: u32,
    pub sex: Sex,
    #[serde(default)]
    pub marital_status: Option<String>,
    #[serde(default)]
    pub disability: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialVisit {
    /// Date of arrival at the facility; the date reports filter on.
    pub visit_date: NaiveDate,
    #[serde(default)]
    pub arrival_time: Option<NaiveTime>,
    #[serde(default)]
    pub incident_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub medical_form_filled: Option<NaiveDate>,
    #[serde(default)]
    pub p3_form: Option<String>,
    #[serde(default)]
    pub perpetrator_relation: Option<String>,
    #[serde(default)]
    pub type_of_violence: Option<String>,
    #[serde(default)]
    pub type_of_case: Option<String>,
    #[serde(default)]
    pub facility_name: Option<String>,
}

/// Laboratory results taken at the initial visit (register result codes).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabResults {
    pub hiv_test: Option<String>,
    pub pregnancy_test: Option<String>,
    pub anal_swab: Option<String>,
    pub hvs: Option<String>,
    pub spermatozoa: Option<String>,
    pub urinalysis: Option<String>,
    pub hep_b: Option<String>,
    pub syphilis: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Treatments {
    pub ecp_given: Option<String>,
    pub pep_given: Option<String>,
    pub sti_treatment: Option<String>,
    pub trauma_counseling: Option<String>,
    pub adherence_counseling: Option<String>,
    pub tt_given: Option<String>,
    pub hep_b_vaccine: Option<String>,
    pub syphilis_treatment: Option<String>,
    pub referral: Option<String>,
}

/// A completed follow-up visit. Absent (`None`) means pending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUp {
    /// Actual return date.
    pub date: NaiveDate,
    #[serde(default)]
    pub next_appointment: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub referral: Option<String>,
    #[serde(default)]
    pub trauma_counseling: Option<String>,
    #[serde(default)]
    pub adherence_counseling: Option<String>,
    #[serde(default)]
    pub pep_refill: Option<String>,
    #[serde(default)]
    pub pep_completed: Option<String>,
    #[serde(default)]
    pub hiv_test: Option<String>,
    #[serde(default)]
    pub pregnancy_test: Option<String>,
    /// Hepatitis B test result; the vaccine dose is `hep_b_vaccine`.
    #[serde(default)]
    pub hep_b_test: Option<String>,
    /// Haemoglobin, g/dL.
    #[serde(default)]
    pub hb: Option<f64>,
    /// Alanine aminotransferase, U/L.
    #[serde(default)]
    pub alt: Option<u32>,
    #[serde(default)]
    pub hep_b_vaccine: Option<String>,
    #[serde(default)]
    pub tt_given: Option<String>,
    #[serde(default)]
    pub syphilis_test: Option<String>,
    #[serde(default)]
    pub referral_update: Option<String>,
}

impl FollowUp {
    /// A follow-up with only the return date filled in.
    pub fn on(date: NaiveDate) -> Self {
        Self {
            date,
            next_appointment: None,
            status: None,
            referral: None,
            trauma_counseling: None,
            adherence_counseling: None,
            pep_refill: None,
            pep_completed: None,
            hiv_test: None,
            pregnancy_test: None,
            hep_b_test: None,
            hb: None,
            alt: None,
            hep_b_vaccine: None,
            tt_given: None,
            syphilis_test: None,
            referral_update: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowUps {
    #[serde(rename = "2weeks")]
    pub two_weeks: Option<FollowUp>,
    #[serde(rename = "1month")]
    pub one_month: Option<FollowUp>,
    #[serde(rename = "3months")]
    pub three_months: Option<FollowUp>,
    #[serde(rename = "6months")]
    pub six_months: Option<FollowUp>,
}

impl FollowUps {
    pub fn get(&self, kind: FollowUpKind) -> Option<&FollowUp> {
        match kind {
            FollowUpKind::TwoWeeks => self.two_weeks.as_ref(),
            FollowUpKind::OneMonth => self.one_month.as_ref(),
            FollowUpKind::ThreeMonths => self.three_months.as_ref(),
            FollowUpKind::SixMonths => self.six_months.as_ref(),
        }
    }

    pub fn set(&mut self, kind: FollowUpKind, follow_up: Option<FollowUp>) {
        let slot = match kind {
            FollowUpKind::TwoWeeks => &mut self.two_weeks,
            FollowUpKind::OneMonth => &mut self.one_month,
            FollowUpKind::ThreeMonths => &mut self.three_months,
            FollowUpKind::SixMonths => &mut self.six_months,
        };
        *slot = follow_up;
    }

    /// Kinds still waiting for a return date, in register order.
    pub fn pending(&self) -> Vec<FollowUpKind> {
        FollowUpKind::ALL
            .into_iter()
            .filter(|kind| self.get(*kind).is_none())
            .collect()
    }
}
