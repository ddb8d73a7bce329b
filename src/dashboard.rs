//! Dashboard: case counts, key percentages and breakdowns over a date range.
//!
//! Every aggregate is computed in SQLite over `gbv_records`, filtered on
//! `visit_date` with the same half-open bounds the reports use.

use rusqlite::{params_from_iter, Connection};
use serde::Serialize;

use crate::db::{DatabaseError, DateBounds};
use crate::report::DateRange;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One labelled count in a breakdown table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountRow {
    pub label: String,
    pub count: u32,
}

/// Aggregates shown on the dashboard page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub range: DateRange,
    pub total: u32,
    pub female_pct: f64,
    pub minors_pct: f64,
    pub pep_pct: f64,
    pub referred_pct: f64,
    pub by_month: Vec<CountRow>,
    pub by_violence_type: Vec<CountRow>,
    pub by_age_group: Vec<CountRow>,
}

/// Age bands in display order.
pub const AGE_GROUPS: [&str; 5] = ["0-9", "10-17", "18-24", "25-49", "50+"];

/// Initial-visit referral codes counted as a referral.
const REFERRAL_CODES: &str = "('1', '2', '3', '4', '5', '6')";

// ---------------------------------------------------------------------------
// Repository functions
// ---------------------------------------------------------------------------

/// Percentage rounded to one decimal; zero when there is nothing to divide.
fn percentage(part: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (f64::from(part) * 1000.0 / f64::from(total)).round() / 10.0
}

fn count_where(conn: &Connection, bounds: &DateBounds, condition: &str) -> Result<u32, DatabaseError> {
    let sql = format!(
        "SELECT COUNT(*) FROM gbv_records WHERE {condition}{}",
        bounds.sql_suffix()
    );
    let count = conn.query_row(&sql, params_from_iter(bounds.params()), |row| row.get(0))?;
    Ok(count)
}

fn grouped_counts(
    conn: &Connection,
    bounds: &DateBounds,
    label_expr: &str,
    order: &str,
) -> Result<Vec<CountRow>, DatabaseError> {
    let sql = format!(
        "SELECT {label_expr} AS label, COUNT(*) AS cases FROM gbv_records
         WHERE 1 = 1{} GROUP BY label ORDER BY {order}",
        bounds.sql_suffix()
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(bounds.params()), |row| {
            Ok(CountRow {
                label: row.get(0)?,
                count: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Compute the dashboard for cases whose visit date falls in `range`.
pub fn dashboard_summary(conn: &Connection, range: &DateRange) -> Result<DashboardSummary, DatabaseError> {
    let bounds = DateBounds::new("visit_date", range);

    let total = count_where(conn, &bounds, "1 = 1")?;
    let female = count_where(conn, &bounds, "sex = 'F'")?;
    let minors = count_where(conn, &bounds, "age < 18")?;
    let pep = count_where(conn, &bounds, "UPPER(TRIM(pep_given)) = 'Y'")?;
    let referred = count_where(
        conn,
        &bounds,
        &format!("TRIM(referral_initial) IN {REFERRAL_CODES}"),
    )?;

    let by_month = grouped_counts(conn, &bounds, "substr(visit_date, 1, 7)", "label")?;
    let by_violence_type = grouped_counts(
        conn,
        &bounds,
        "COALESCE(NULLIF(TRIM(type_of_violence), ''), 'Unknown')",
        "cases DESC, label",
    )?;
    let by_age_group = age_groups(conn, &bounds)?;

    Ok(DashboardSummary {
        range: *range,
        total,
        female_pct: percentage(female, total),
        minors_pct: percentage(minors, total),
        pep_pct: percentage(pep, total),
        referred_pct: percentage(referred, total),
        by_month,
        by_violence_type,
        by_age_group,
    })
}

/// Counts per age band; bands with no cases are listed with zero.
fn age_groups(conn: &Connection, bounds: &DateBounds) -> Result<Vec<CountRow>, DatabaseError> {
    let found = grouped_counts(
        conn,
        bounds,
        "CASE
            WHEN age < 10 THEN '0-9'
            WHEN age < 18 THEN '10-17'
            WHEN age < 25 THEN '18-24'
            WHEN age < 50 THEN '25-49'
            ELSE '50+'
         END",
        "label",
    )?;

    Ok(AGE_GROUPS
        .iter()
        .map(|group| CountRow {
            label: (*group).to_string(),
            count: found
                .iter()
                .find(|row| row.label == *group)
                .map_or(0, |row| row.count),
        })
        .collect())
}
