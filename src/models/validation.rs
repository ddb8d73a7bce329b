//! Field validation for register entries.
//!
//! Hard failures (`ValidationError`) reject the submission. Ordering
//! problems between dates are policy only: they come back as warnings and
//! the entry is still stored.

use chrono::NaiveDate;
use thiserror::Error;

use rusqlite::types::Value;

use super::enums::FollowUpKind;
use super::visit::{FollowUp, VisitEntry};
use crate::schema;

/// Oldest age accepted on the entry form.
pub const MAX_AGE: u32 = 120;

/// Longest accepted free-text value, in characters. Well inside the
/// 32,767-character limit of a spreadsheet cell.
pub const MAX_TEXT_LEN: usize = 2_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Required field missing: {0}")]
    MissingField(String),

    #[error("Invalid date for {field}: {value}")]
    InvalidDate { field: String, value: String },

    #[error("Invalid number for {field}: {value}")]
    InvalidNumber { field: String, value: String },

    #[error("Value out of range for {field}: {value}")]
    OutOfRange { field: String, value: String },

    #[error("Invalid choice for {field}: {value}")]
    InvalidChoice { field: String, value: String },

    #[error("Unknown follow-up kind: {0} (expected 2weeks, 1month, 3months or 6months)")]
    UnknownFollowUpKind(String),

    #[error("{field} is too long (at most {max} characters)")]
    TooLong { field: String, max: usize },
}

fn check_text_lengths<'a>(
    values: impl IntoIterator<Item = (&'a str, &'a Value)>,
) -> Result<(), ValidationError> {
    for (field, value) in values {
        if let Value::Text(text) = value {
            if text.chars().count() > MAX_TEXT_LEN {
                return Err(ValidationError::TooLong {
                    field: field.to_string(),
                    max: MAX_TEXT_LEN,
                });
            }
        }
    }
    Ok(())
}

/// Check the invariants every stored entry must satisfy.
pub fn validate_entry(entry: &VisitEntry) -> Result<(), ValidationError> {
    if entry.demographics.client_name.trim().is_empty() {
        return Err(ValidationError::MissingField("client_name".into()));
    }
    if entry.demographics.age > MAX_AGE {
        return Err(ValidationError::OutOfRange {
            field: "age".into(),
            value: entry.demographics.age.to_string(),
        });
    }
    let values = schema::initial_values(entry);
    check_text_lengths(values.iter().map(|(name, value)| (*name, value)))?;
    for kind in FollowUpKind::ALL {
        if let Some(follow_up) = entry.follow_ups.get(kind) {
            validate_follow_up(follow_up)?;
        }
    }
    Ok(())
}

pub fn validate_follow_up(follow_up: &FollowUp) -> Result<(), ValidationError> {
    if let Some(hb) = follow_up.hb {
        if !hb.is_finite() || hb < 0.0 {
            return Err(ValidationError::OutOfRange {
                field: "hb".into(),
                value: hb.to_string(),
            });
        }
    }
    let values = schema::follow_up_values(Some(follow_up));
    check_text_lengths(values.iter().map(|(name, value)| (*name, value)))
}

/// Warning text when a follow-up is dated before the initial visit.
pub fn follow_up_order_warning(
    visit_date: NaiveDate,
    kind: FollowUpKind,
    follow_up: &FollowUp,
) -> Option<String> {
    if follow_up.date < visit_date {
        Some(format!(
            "{} follow-up date {} is before the initial visit on {}",
            kind.label(),
            follow_up.date,
            visit_date
        ))
    } else {
        None
    }
}

/// All ordering warnings for an entry, in register order.
pub fn entry_warnings(entry: &VisitEntry) -> Vec<String> {
    FollowUpKind::ALL
        .into_iter()
        .filter_map(|kind| {
            entry
                .follow_ups
                .get(kind)
                .and_then(|f| follow_up_order_warning(entry.initial_visit.visit_date, kind, f))
        })
        .collect()
}
