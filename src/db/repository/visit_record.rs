use std::str::FromStr;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::validation::{follow_up_order_warning, validate_entry, validate_follow_up};
use crate::models::*;
use crate::report::DateRange;
use crate::schema::{self, DATETIME_FORMAT, DATE_FORMAT, TIME_FORMAT};

const ENTITY: &str = "visit_record";

/// Persist a new case and return its assigned id.
pub fn insert_visit_record(conn: &Connection, entry: &VisitEntry) -> Result<i64, DatabaseError> {
    let created_at = Local::now().naive_local().trunc_subsecs(0);
    insert_visit_record_at(conn, entry, created_at)
}

/// Same as `insert_visit_record` with an explicit insert timestamp.
pub fn insert_visit_record_at(
    conn: &Connection,
    entry: &VisitEntry,
    created_at: NaiveDateTime,
) -> Result<i64, DatabaseError> {
    validate_entry(entry)?;

    let values = schema::entry_values(entry);
    let columns: Vec<&str> = values.iter().map(|(c, _)| c.as_str()).collect();
    let placeholders: Vec<String> = (1..=values.len() + 1).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "INSERT INTO gbv_records (created_at, {}) VALUES ({})",
        columns.join(", "),
        placeholders.join(", ")
    );

    let mut params: Vec<Value> = Vec::with_capacity(values.len() + 1);
    params.push(Value::Text(created_at.format(DATETIME_FORMAT).to_string()));
    params.extend(values.into_iter().map(|(_, v)| v));

    conn.execute(&sql, params_from_iter(params))?;
    let id = conn.last_insert_rowid();

    tracing::info!(record_id = id, visit_date = %entry.initial_visit.visit_date, "Visit record created");
    for kind in FollowUpKind::ALL {
        if let Some(warning) = entry
            .follow_ups
            .get(kind)
            .and_then(|f| follow_up_order_warning(entry.initial_visit.visit_date, kind, f))
        {
            tracing::warn!(record_id = id, "{warning}");
        }
    }
    Ok(id)
}

pub fn get_visit_record(conn: &Connection, id: i64) -> Result<VisitRecord, DatabaseError> {
    let mut stmt = conn.prepare("SELECT * FROM gbv_records WHERE id = ?1")?;
    let mut rows = stmt.query(params![id])?;
    let record = match rows.next()? {
        Some(row) => visit_record_from_row(row)?,
        None => {
            return Err(DatabaseError::NotFound {
                entity_type: ENTITY.into(),
                id: id.to_string(),
            })
        }
    };
    Ok(record)
}

/// Overwrite one follow-up of an existing case.
///
/// Every column of the follow-up is written, so submitting the same data
/// twice leaves the row unchanged.
pub fn update_follow_up(
    conn: &Connection,
    id: i64,
    kind: FollowUpKind,
    follow_up: &FollowUp,
) -> Result<(), DatabaseError> {
    validate_follow_up(follow_up)?;

    let values = schema::follow_up_values(Some(follow_up));
    let assignments: Vec<String> = values
        .iter()
        .enumerate()
        .map(|(i, (base, _))| format!("{} = ?{}", schema::follow_up_column(base, kind), i + 1))
        .collect();
    let sql = format!(
        "UPDATE gbv_records SET {} WHERE id = ?{} RETURNING visit_date",
        assignments.join(", "),
        values.len() + 1
    );

    let mut params: Vec<Value> = values.into_iter().map(|(_, v)| v).collect();
    params.push(Value::Integer(id));

    let visit_date: Option<String> = conn
        .query_row(&sql, params_from_iter(params), |row| row.get(0))
        .optional()?;
    let visit_date = visit_date.ok_or_else(|| DatabaseError::NotFound {
        entity_type: ENTITY.into(),
        id: id.to_string(),
    })?;

    tracing::info!(record_id = id, kind = kind.as_str(), "Follow-up recorded");
    if let Ok(visit_date) = NaiveDate::parse_from_str(&visit_date, DATE_FORMAT) {
        if let Some(warning) = follow_up_order_warning(visit_date, kind, follow_up) {
            tracing::warn!(record_id = id, "{warning}");
        }
    }
    Ok(())
}

/// Stream records whose visit date falls in `range`, newest first.
///
/// Rows are decoded one at a time from a fresh query, so each call sees
/// the current table contents. Returns the number of records visited.
pub fn for_each_visit_record<F>(
    conn: &Connection,
    range: &DateRange,
    mut visitor: F,
) -> Result<usize, DatabaseError>
where
    F: FnMut(VisitRecord) -> Result<(), DatabaseError>,
{
    let bounds = DateBounds::new("visit_date", range);
    let sql = format!(
        "SELECT * FROM gbv_records WHERE 1 = 1{} ORDER BY visit_date DESC, id DESC",
        bounds.sql_suffix()
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bounds.params()))?;

    let mut visited = 0;
    while let Some(row) = rows.next()? {
        visitor(visit_record_from_row(row)?)?;
        visited += 1;
    }
    Ok(visited)
}

pub fn list_visit_records(conn: &Connection) -> Result<Vec<VisitRecord>, DatabaseError> {
    list_visit_records_in_range(conn, &DateRange::all_time())
}

pub fn list_visit_records_in_range(
    conn: &Connection,
    range: &DateRange,
) -> Result<Vec<VisitRecord>, DatabaseError> {
    let mut records = Vec::new();
    for_each_visit_record(conn, range, |record| {
        records.push(record);
        Ok(())
    })?;
    Ok(records)
}

pub fn count_visit_records(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM gbv_records", [], |row| row.get(0))?;
    Ok(count)
}

// ═══════════════════════════════════════════
// Date bounds
// ═══════════════════════════════════════════

/// Builds the `AND column >= ?n AND column < ?m` suffix for a date range.
/// Unbounded sides add no clause.
pub(crate) struct DateBounds {
    clauses: Vec<String>,
    params: Vec<Value>,
}

impl DateBounds {
    pub(crate) fn new(date_column: &str, range: &DateRange) -> Self {
        let mut clauses = Vec::new();
        let mut params = Vec::new();

        if let Some(start) = range.lower_bound() {
            params.push(Value::Text(start.format(DATE_FORMAT).to_string()));
            clauses.push(format!(" AND {date_column} >= ?{}", params.len()));
        }
        if let Some(end) = range.upper_bound() {
            params.push(Value::Text(end.format(DATE_FORMAT).to_string()));
            clauses.push(format!(" AND {date_column} < ?{}", params.len()));
        }

        Self { clauses, params }
    }

    pub(crate) fn sql_suffix(&self) -> String {
        self.clauses.join("")
    }

    pub(crate) fn params(&self) -> Vec<Value> {
        self.params.clone()
    }
}

// ═══════════════════════════════════════════
// Row decoding
// ═══════════════════════════════════════════

fn text(row: &Row<'_>, column: &str) -> Result<Option<String>, DatabaseError> {
    Ok(row.get::<_, Option<String>>(column)?)
}

fn required_text(row: &Row<'_>, column: &str) -> Result<String, DatabaseError> {
    text(row, column)?.ok_or_else(|| DatabaseError::InvalidStoredValue {
        column: column.into(),
        value: "NULL".into(),
    })
}

fn parsed<T>(
    row: &Row<'_>,
    column: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, DatabaseError> {
    match text(row, column)? {
        None => Ok(None),
        Some(raw) => parse(&raw)
            .map(Some)
            .ok_or(DatabaseError::InvalidStoredValue {
                column: column.into(),
                value: raw,
            }),
    }
}

fn date(row: &Row<'_>, column: &str) -> Result<Option<NaiveDate>, DatabaseError> {
    parsed(row, column, |s| NaiveDate::parse_from_str(s, DATE_FORMAT).ok())
}

fn time(row: &Row<'_>, column: &str) -> Result<Option<NaiveTime>, DatabaseError> {
    parsed(row, column, |s| NaiveTime::parse_from_str(s, TIME_FORMAT).ok())
}

fn datetime(row: &Row<'_>, column: &str) -> Result<Option<NaiveDateTime>, DatabaseError> {
    parsed(row, column, |s| NaiveDateTime::parse_from_str(s, DATETIME_FORMAT).ok())
}

fn required<T>(value: Option<T>, column: &str) -> Result<T, DatabaseError> {
    value.ok_or_else(|| DatabaseError::InvalidStoredValue {
        column: column.into(),
        value: "NULL".into(),
    })
}

fn unsigned(row: &Row<'_>, column: &str) -> Result<Option<u32>, DatabaseError> {
    match row.get::<_, Option<i64>>(column)? {
        None => Ok(None),
        Some(n) => u32::try_from(n)
            .map(Some)
            .map_err(|_| DatabaseError::InvalidStoredValue {
                column: column.into(),
                value: n.to_string(),
            }),
    }
}

fn follow_up_from_row(row: &Row<'_>, kind: FollowUpKind) -> Result<Option<FollowUp>, DatabaseError> {
    let col = |base: &str| schema::follow_up_column(base, kind);

    // Pending until the return date is recorded
    let Some(return_date) = date(row, &col("actual_return"))? else {
        return Ok(None);
    };

    Ok(Some(FollowUp {
        date: return_date,
        next_appointment: date(row, &col("next_appointment"))?,
        status: text(row, &col("status"))?,
        referral: text(row, &col("referral"))?,
        trauma_counseling: text(row, &col("trauma_counseling"))?,
        adherence_counseling: text(row, &col("adherence_counseling"))?,
        pep_refill: text(row, &col("pep_refill"))?,
        pep_completed: text(row, &col("pep_completed"))?,
        hiv_test: text(row, &col("hiv_test"))?,
        pregnancy_test: text(row, &col("pregnancy_test"))?,
        hep_b_test: text(row, &col("hep_b_test"))?,
        hb: row.get::<_, Option<f64>>(col("hb").as_str())?,
        alt: unsigned(row, &col("alt"))?,
        hep_b_vaccine: text(row, &col("hep_b_vaccine"))?,
        tt_given: text(row, &col("tt_given"))?,
        syphilis_test: text(row, &col("syphilis_test"))?,
        referral_update: text(row, &col("referral_update"))?,
    }))
}

fn visit_record_from_row(row: &Row<'_>) -> Result<VisitRecord, DatabaseError> {
    let mut follow_ups = FollowUps::default();
    for kind in FollowUpKind::ALL {
        follow_ups.set(kind, follow_up_from_row(row, kind)?);
    }

    Ok(VisitRecord {
        id: row.get("id")?,
        created_at: required(datetime(row, "created_at")?, "created_at")?,
        entry: VisitEntry {
            demographics: Demographics {
                serial_no: text(row, "serial_no")?,
                national_id: text(row, "national_id")?,
                client_name: required_text(row, "client_name")?,
                address: text(row, "address")?,
                contact_no: text(row, "contact_no")?,
                next_of_kin: text(row, "next_of_kin")?,
                ovc: text(row, "ovc")?,
                age: required(unsigned(row, "age")?, "age")?,
                sex: Sex::from_str(&required_text(row, "sex")?)?,
                marital_status: text(row, "marital_status")?,
                disability: text(row, "disability")?,
            },
            initial_visit: InitialVisit {
                visit_date: required(date(row, "visit_date")?, "visit_date")?,
                arrival_time: time(row, "arrival_time")?,
                incident_at: datetime(row, "incident_at")?,
                medical_form_filled: date(row, "medical_form_filled")?,
                p3_form: text(row, "p3_form")?,
                perpetrator_relation: text(row, "perpetrator_relation")?,
                type_of_violence: text(row, "type_of_violence")?,
                type_of_case: text(row, "type_of_case")?,
                facility_name: text(row, "facility_name")?,
            },
            lab_results: LabResults {
                hiv_test: text(row, "hiv_test_initial")?,
                pregnancy_test: text(row, "pregnancy_test_initial")?,
                anal_swab: text(row, "anal_swab")?,
                hvs: text(row, "hvs")?,
                spermatozoa: text(row, "spermatozoa")?,
                urinalysis: text(row, "urinalysis")?,
                hep_b: text(row, "hep_b_initial")?,
                syphilis: text(row, "syphilis_initial")?,
            },
            treatments: Treatments {
                ecp_given: text(row, "ecp_given")?,
                pep_given: text(row, "pep_given")?,
                sti_treatment: text(row, "sti_treatment")?,
                trauma_counseling: text(row, "trauma_counseling_initial")?,
                adherence_counseling: text(row, "adherence_counseling_initial")?,
                tt_given: text(row, "tt_given_initial")?,
                hep_b_vaccine: text(row, "hep_b_vaccine_initial")?,
                syphilis_treatment: text(row, "syphilis_treatment")?,
                referral: text(row, "referral_initial")?,
            },
            client_outcome: text(row, "client_outcome")?,
            follow_ups,
        },
    })
}
