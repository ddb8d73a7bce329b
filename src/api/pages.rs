//! HTML rendering for the register pages.
//!
//! Pages are self-contained strings: one shared layout with inline CSS and
//! a navigation bar. Forms are generated from the field descriptors in
//! `schema`, so every input matches a storage column.

use axum::http::StatusCode;
use chrono::{Days, NaiveDate};

use crate::api::forms::FormData;
use crate::config::APP_NAME;
use crate::dashboard::{CountRow, DashboardSummary};
use crate::export::escape_html;
use crate::models::validation::MAX_TEXT_LEN;
use crate::models::{FollowUpKind, VisitRecord};
use crate::report::{DateRange, ReportPeriod};
use crate::schema::{
    self, field_display, FieldSpec, InputKind, DATE_FORMAT, ENTRY_SECTIONS, FOLLOW_UP_FIELDS,
};

const STYLE: &str = r#"
*,*::before,*::after{box-sizing:border-box}
body{margin:0;font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,sans-serif;background:#f5f5f4;color:#1c1917}
nav{background:#7c2d12;padding:12px 24px;display:flex;gap:20px;align-items:center}
nav a{color:#fff;text-decoration:none;font-weight:500}
nav .brand{font-weight:700;margin-right:auto}
main{max-width:1100px;margin:24px auto;padding:0 16px}
.card{background:#fff;border-radius:8px;box-shadow:0 1px 4px rgba(0,0,0,.08);padding:20px;margin-bottom:20px}
h1{font-size:1.5rem;margin:0 0 16px}
h2{font-size:1.1rem;margin:0 0 12px}
table{border-collapse:collapse;width:100%}
th,td{border-bottom:1px solid #e7e5e4;padding:6px 8px;text-align:left;font-size:.9rem}
th{background:#fafaf9}
fieldset{border:1px solid #e7e5e4;border-radius:8px;margin-bottom:16px;padding:12px 16px}
legend{font-weight:600;padding:0 6px}
.fields{display:grid;grid-template-columns:repeat(auto-fill,minmax(240px,1fr));gap:12px}
label{display:block;font-size:.85rem;color:#44403c;margin-bottom:4px}
input,select{width:100%;padding:6px 8px;border:1px solid #d6d3d1;border-radius:6px;font-size:.9rem}
.req{color:#b91c1c}
.btn{display:inline-block;background:#7c2d12;color:#fff;border:none;border-radius:6px;padding:8px 16px;font-size:.9rem;text-decoration:none;cursor:pointer}
.btn-secondary{background:#e7e5e4;color:#1c1917}
.notice{padding:10px 14px;border-radius:6px;margin-bottom:16px}
.notice-success{background:#dcfce7;border:1px solid #86efac}
.notice-warning{background:#fef9c3;border:1px solid #fde047}
.notice-error{background:#fee2e2;border:1px solid #fca5a5}
.kpis{display:grid;grid-template-columns:repeat(auto-fit,minmax(160px,1fr));gap:12px}
.kpi{background:#fff;border-radius:8px;padding:16px;text-align:center;box-shadow:0 1px 4px rgba(0,0,0,.08)}
.kpi .value{font-size:1.6rem;font-weight:700}
.kpi .label{font-size:.8rem;color:#78716c}
.actions{display:flex;gap:8px;flex-wrap:wrap;margin:12px 0}
.pending{color:#b45309}
.done{color:#15803d}
"#;

// ═══════════════════════════════════════════════════════════
// Layout
// ═══════════════════════════════════════════════════════════

pub fn layout(title: &str, body: &str) -> String {
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} · {app}</title>
<style>{style}</style>
</head>
<body>
<nav>
  <a class="brand" href="/">{app}</a>
  <a href="/records/new">New Record</a>
  <a href="/records">Records</a>
  <a href="/reports">Reports</a>
  <a href="/dashboard">Dashboard</a>
</nav>
<main>
{body}
</main>
</body>
</html>"##,
        title = escape_html(title),
        app = APP_NAME,
        style = STYLE,
        body = body,
    )
}

fn notice(kind: &str, message: &str) -> String {
    format!(
        r#"<div class="notice notice-{kind}">{}</div>"#,
        escape_html(message)
    )
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    let title = status.canonical_reason().unwrap_or("Error");
    layout(
        title,
        &format!(
            r#"<div class="card"><h1>{} {}</h1>{}<a class="btn btn-secondary" href="/">Back to home</a></div>"#,
            status.as_u16(),
            escape_html(title),
            notice("error", message)
        ),
    )
}

pub fn home_page(total_records: i64) -> String {
    layout(
        "Home",
        &format!(
            r#"<div class="card">
<h1>Gender Based Violence Register</h1>
<p>HMIS MCH 061 &middot; {total_records} record(s) on file.</p>
<div class="actions">
  <a class="btn" href="/records/new">Register a new case</a>
  <a class="btn btn-secondary" href="/records">Browse records</a>
  <a class="btn btn-secondary" href="/reports">Reports &amp; exports</a>
  <a class="btn btn-secondary" href="/dashboard">Dashboard</a>
</div>
</div>"#
        ),
    )
}

// ═══════════════════════════════════════════════════════════
// Form inputs
// ═══════════════════════════════════════════════════════════

fn render_input(spec: &FieldSpec, value: &str) -> String {
    let name = spec.name;
    let required = if spec.required { " required" } else { "" };
    let value = escape_html(value);
    let control = match spec.input {
        InputKind::Choice(options) => {
            let opts: String = options
                .iter()
                .map(|(code, label)| {
                    let selected = if *code == value { " selected" } else { "" };
                    format!(r#"<option value="{code}"{selected}>{label}</option>"#)
                })
                .collect();
            format!(r#"<select id="{name}" name="{name}"{required}><option value=""></option>{opts}</select>"#)
        }
        InputKind::Text => format!(
            r#"<input type="text" id="{name}" name="{name}" value="{value}" maxlength="{MAX_TEXT_LEN}"{required}>"#
        ),
        InputKind::Date => format!(r#"<input type="date" id="{name}" name="{name}" value="{value}"{required}>"#),
        InputKind::Time => format!(r#"<input type="time" id="{name}" name="{name}" value="{value}"{required}>"#),
        InputKind::DateTime => format!(
            r#"<input type="datetime-local" id="{name}" name="{name}" value="{value}"{required}>"#
        ),
        InputKind::Integer => format!(
            r#"<input type="number" min="0" step="1" id="{name}" name="{name}" value="{value}"{required}>"#
        ),
        InputKind::Decimal => format!(
            r#"<input type="number" min="0" step="0.1" id="{name}" name="{name}" value="{value}"{required}>"#
        ),
    };
    let marker = if spec.required { r#" <span class="req">*</span>"# } else { "" };
    format!(
        r#"<div><label for="{name}">{}{marker}</label>{control}</div>"#,
        escape_html(spec.label)
    )
}

fn render_fields(fields: &[FieldSpec], values: &FormData) -> String {
    fields
        .iter()
        .map(|spec| render_input(spec, values.get(spec.name).map(String::as_str).unwrap_or("")))
        .collect()
}

// ═══════════════════════════════════════════════════════════
// Entry form
// ═══════════════════════════════════════════════════════════

pub fn entry_form_page(values: &FormData, error: Option<&str>) -> String {
    let sections: String = ENTRY_SECTIONS
        .iter()
        .map(|section| {
            format!(
                r#"<fieldset><legend>{}</legend><div class="fields">{}</div></fieldset>"#,
                escape_html(section.title),
                render_fields(section.fields, values)
            )
        })
        .collect();

    layout(
        "New Record",
        &format!(
            r#"<div class="card">
<h1>Register a new case</h1>
{error}
<form method="post" action="/records/new">
{sections}
<button class="btn" type="submit">Save record</button>
</form>
</div>"#,
            error = error.map(|e| notice("error", e)).unwrap_or_default(),
        ),
    )
}

// ═══════════════════════════════════════════════════════════
// Records
// ═══════════════════════════════════════════════════════════

fn records_table(records: &[VisitRecord]) -> String {
    if records.is_empty() {
        return "<p>No records found.</p>".to_string();
    }
    let rows: String = records
        .iter()
        .map(|r| {
            let d = &r.entry.demographics;
            let v = &r.entry.initial_visit;
            let completed = FollowUpKind::ALL.len() - r.entry.follow_ups.pending().len();
            format!(
                r#"<tr><td>{id}</td><td>{date}</td><td>{name}</td><td>{age}</td><td>{sex}</td><td>{violence}</td><td>{completed}/4</td><td><a href="/records/{id}">View</a></td></tr>"#,
                id = r.id,
                date = v.visit_date.format(DATE_FORMAT),
                name = escape_html(&d.client_name),
                age = d.age,
                sex = d.sex.label(),
                violence = escape_html(v.type_of_violence.as_deref().unwrap_or("")),
            )
        })
        .collect();
    format!(
        "<table><tr><th>ID</th><th>Visit Date</th><th>Client Name</th><th>Age</th><th>Sex</th><th>Type of Violence</th><th>Follow-ups</th><th></th></tr>{rows}</table>"
    )
}

pub fn records_page(records: &[VisitRecord]) -> String {
    layout(
        "Records",
        &format!(
            r#"<div class="card">
<h1>Records ({count})</h1>
<div class="actions"><a class="btn" href="/records/new">New record</a></div>
{table}
</div>"#,
            count = records.len(),
            table = records_table(records),
        ),
    )
}

fn detail_sections(record: &VisitRecord) -> String {
    let values = schema::initial_values(&record.entry);
    let mut values = values.iter();
    ENTRY_SECTIONS
        .iter()
        .map(|section| {
            let rows: String = section
                .fields
                .iter()
                .zip(values.by_ref())
                .map(|(spec, (_, value))| {
                    format!(
                        "<tr><th>{}</th><td>{}</td></tr>",
                        escape_html(spec.label),
                        escape_html(&field_display(spec, value))
                    )
                })
                .collect();
            format!(
                r#"<div class="card"><h2>{}</h2><table>{rows}</table></div>"#,
                escape_html(section.title)
            )
        })
        .collect()
}

fn follow_up_status(record: &VisitRecord) -> String {
    let visit_date = record.entry.initial_visit.visit_date;
    let rows: String = FollowUpKind::ALL
        .iter()
        .map(|kind| {
            let link = format!("/records/{}/follow-up?kind={}", record.id, kind.as_str());
            match record.entry.follow_ups.get(*kind) {
                Some(f) => format!(
                    r#"<tr><td>{}</td><td class="done">Seen {}</td><td>{}</td><td><a href="{link}">Edit</a></td></tr>"#,
                    kind.label(),
                    f.date.format(DATE_FORMAT),
                    escape_html(f.status.as_deref().unwrap_or("")),
                ),
                None => {
                    let due = visit_date
                        .checked_add_days(Days::new(kind.due_after_days()))
                        .map(|d| format!("due {}", d.format(DATE_FORMAT)))
                        .unwrap_or_default();
                    format!(
                        r#"<tr><td>{}</td><td class="pending">Pending</td><td>{due}</td><td><a href="{link}">Record</a></td></tr>"#,
                        kind.label(),
                    )
                }
            }
        })
        .collect();
    format!(
        r#"<div class="card"><h2>Follow-ups</h2><table><tr><th>Visit</th><th>Status</th><th></th><th></th></tr>{rows}</table></div>"#
    )
}

pub fn record_page(record: &VisitRecord, notices: &[String], warnings: &[String]) -> String {
    let notices: String = notices.iter().map(|n| notice("success", n)).collect();
    let warnings: String = warnings.iter().map(|w| notice("warning", w)).collect();
    layout(
        &format!("Record #{}", record.id),
        &format!(
            r#"<h1>Record #{id} &middot; {name}</h1>
{notices}{warnings}
<div class="actions"><a class="btn" href="/records/{id}/follow-up">Record follow-up</a><a class="btn btn-secondary" href="/records">All records</a></div>
{follow_ups}
{sections}"#,
            id = record.id,
            name = escape_html(&record.entry.demographics.client_name),
            follow_ups = follow_up_status(record),
            sections = detail_sections(record),
        ),
    )
}

/// Form values pre-filled from a stored follow-up, keyed by base name.
pub fn follow_up_form_values(record: &VisitRecord, kind: FollowUpKind) -> FormData {
    let Some(existing) = record.entry.follow_ups.get(kind) else {
        return FormData::new();
    };
    schema::follow_up_values(Some(existing))
        .into_iter()
        .map(|(name, value)| (name.to_string(), schema::display_value(&value)))
        .collect()
}

pub fn follow_up_form_page(
    record: &VisitRecord,
    kind: FollowUpKind,
    values: &FormData,
    error: Option<&str>,
) -> String {
    // Switching kind reloads the page so the form only ever holds values
    // belonging to the kind it posts.
    let kinds: String = FollowUpKind::ALL
        .iter()
        .map(|k| {
            let state = if record.entry.follow_ups.get(*k).is_some() { "recorded" } else { "pending" };
            let class = if *k == kind { "btn" } else { "btn btn-secondary" };
            format!(
                r#"<a class="{class}" href="/records/{}/follow-up?kind={}">{} ({state})</a> "#,
                record.id,
                k.as_str(),
                k.label()
            )
        })
        .collect();

    layout(
        "Follow-up",
        &format!(
            r#"<div class="card">
<h1>Follow-up for record #{id} &middot; {name}</h1>
<p>Initial visit: {visit_date}</p>
{error}
<p>{kinds}</p>
<form method="post" action="/records/{id}/follow-up">
<input type="hidden" name="kind" value="{kind_value}">
<fieldset><legend>{kind_label} follow-up</legend><div class="fields">{fields}</div></fieldset>
<button class="btn" type="submit">Save follow-up</button>
<a class="btn btn-secondary" href="/records/{id}">Cancel</a>
</form>
</div>"#,
            id = record.id,
            name = escape_html(&record.entry.demographics.client_name),
            visit_date = record.entry.initial_visit.visit_date.format(DATE_FORMAT),
            error = error.map(|e| notice("error", e)).unwrap_or_default(),
            kind_value = kind.as_str(),
            kind_label = kind.label(),
            fields = render_fields(FOLLOW_UP_FIELDS, values),
        ),
    )
}

// ═══════════════════════════════════════════════════════════
// Reports
// ═══════════════════════════════════════════════════════════

/// `period=…&date=…` shared by the report page and its export links.
pub fn period_query(period: ReportPeriod, reference: NaiveDate) -> String {
    format!("period={}&date={}", period.as_str(), reference.format(DATE_FORMAT))
}

pub fn report_page(
    period: ReportPeriod,
    reference: NaiveDate,
    range: &DateRange,
    records: &[VisitRecord],
) -> String {
    let options: String = ReportPeriod::ALL
        .iter()
        .map(|p| {
            let selected = if *p == period { " selected" } else { "" };
            format!(r#"<option value="{}"{selected}>{}</option>"#, p.as_str(), p.label())
        })
        .collect();
    let query = period_query(period, reference);

    layout(
        "Reports",
        &format!(
            r#"<div class="card">
<h1>Reports</h1>
<form method="get" action="/reports" class="fields">
  <div><label for="period">Period</label><select id="period" name="period">{options}</select></div>
  <div><label for="date">Reference date</label><input type="date" id="date" name="date" value="{reference}"></div>
  <div><label>&nbsp;</label><button class="btn" type="submit">Generate</button></div>
</form>
</div>
<div class="card">
<h2>{label}: {range} &middot; {count} record(s)</h2>
<div class="actions">
  <a class="btn btn-secondary" href="/export/csv?{query}">Export CSV</a>
  <a class="btn btn-secondary" href="/export/excel?{query}">Export Excel</a>
  <a class="btn btn-secondary" href="/print-report?{query}" target="_blank">Print</a>
</div>
{table}
</div>"#,
            reference = reference.format(DATE_FORMAT),
            label = period.label(),
            range = escape_html(&range.to_string()),
            count = records.len(),
            table = records_table(records),
        ),
    )
}

// ═══════════════════════════════════════════════════════════
// Dashboard
// ═══════════════════════════════════════════════════════════

fn count_table(title: &str, heading: &str, rows: &[CountRow]) -> String {
    let body: String = if rows.is_empty() {
        r#"<tr><td colspan="2">No data</td></tr>"#.to_string()
    } else {
        rows.iter()
            .map(|r| format!("<tr><td>{}</td><td>{}</td></tr>", escape_html(&r.label), r.count))
            .collect()
    };
    format!(
        r#"<div class="card"><h2>{title}</h2><table><tr><th>{heading}</th><th>Cases</th></tr>{body}</table></div>"#
    )
}

fn kpi(value: &str, label: &str) -> String {
    format!(r#"<div class="kpi"><div class="value">{value}</div><div class="label">{label}</div></div>"#)
}

pub fn dashboard_page(summary: &DashboardSummary, start: NaiveDate, end: NaiveDate) -> String {
    let kpis = [
        kpi(&summary.total.to_string(), "Total cases"),
        kpi(&format!("{:.1}%", summary.female_pct), "Female"),
        kpi(&format!("{:.1}%", summary.minors_pct), "Minors (under 18)"),
        kpi(&format!("{:.1}%", summary.pep_pct), "PEP given"),
        kpi(&format!("{:.1}%", summary.referred_pct), "Referred"),
    ]
    .concat();

    layout(
        "Dashboard",
        &format!(
            r#"<div class="card">
<h1>Dashboard</h1>
<form method="get" action="/dashboard" class="fields">
  <div><label for="start_date">From</label><input type="date" id="start_date" name="start_date" value="{start}"></div>
  <div><label for="end_date">To</label><input type="date" id="end_date" name="end_date" value="{end}"></div>
  <div><label>&nbsp;</label><button class="btn" type="submit">Apply</button></div>
</form>
</div>
<div class="kpis">{kpis}</div>
<br>
{by_month}
{by_type}
{by_age}"#,
            start = start.format(DATE_FORMAT),
            end = end.format(DATE_FORMAT),
            by_month = count_table("Cases by month", "Month", &summary.by_month),
            by_type = count_table("Cases by type of violence", "Type", &summary.by_violence_type),
            by_age = count_table("Cases by age group", "Age group", &summary.by_age_group),
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use crate::models::test_support::sample_entry;
    use crate::models::FollowUp;

    fn record() -> VisitRecord {
        VisitRecord {
            id: 12,
            created_at: NaiveDateTime::parse_from_str("2024-03-15 10:00:00", "%Y-%m-%d %H:%M:%S")
                .unwrap(),
            entry: sample_entry("2024-03-15"),
        }
    }

    #[test]
    fn entry_form_has_every_entry_column() {
        let html = entry_form_page(&FormData::new(), None);
        for section in ENTRY_SECTIONS.iter() {
            for field in section.fields {
                assert!(html.contains(&format!(r#"name="{}""#, field.name)), "{}", field.name);
            }
        }
        assert!(html.contains(r#"action="/records/new""#));
    }

    #[test]
    fn entry_form_keeps_submitted_values_and_error() {
        let mut values = FormData::new();
        values.insert("client_name".into(), "Jane <Doe>".into());
        values.insert("sex".into(), "F".into());
        let html = entry_form_page(&values, Some("Required field missing: age"));
        assert!(html.contains(r#"value="Jane &lt;Doe&gt;""#));
        assert!(html.contains(r#"<option value="F" selected>Female</option>"#));
        assert!(html.contains("Required field missing: age"));
    }

    #[test]
    fn record_page_lists_pending_follow_ups() {
        let mut rec = record();
        rec.entry
            .follow_ups
            .set(FollowUpKind::TwoWeeks, Some(FollowUp::on(NaiveDate::from_ymd_opt(2024, 3, 29).unwrap())));
        let html = record_page(&rec, &[], &[]);
        assert!(html.contains("Seen 2024-03-29"));
        assert_eq!(html.matches(r#"class="pending">Pending"#).count(), 3);
        assert!(html.contains("due 2024-04-14"));
    }

    #[test]
    fn follow_up_form_preselects_kind_and_prefills() {
        let mut rec = record();
        let mut f = FollowUp::on(NaiveDate::from_ymd_opt(2024, 4, 15).unwrap());
        f.status = Some("stable".into());
        rec.entry.follow_ups.set(FollowUpKind::OneMonth, Some(f));

        let values = follow_up_form_values(&rec, FollowUpKind::OneMonth);
        let html = follow_up_form_page(&rec, FollowUpKind::OneMonth, &values, None);
        assert!(html.contains(r#"<input type="hidden" name="kind" value="1month">"#));
        assert!(html.contains(r#"value="2024-04-15""#));
        assert!(html.contains(r#"value="stable""#));
        assert!(follow_up_form_values(&rec, FollowUpKind::SixMonths).is_empty());
    }

    #[test]
    fn follow_up_kind_is_fixed_per_page() {
        let rec = record();
        let html = follow_up_form_page(&rec, FollowUpKind::TwoWeeks, &FormData::new(), None);
        assert!(!html.contains(r#"<select id="kind""#));
        assert_eq!(html.matches(r#"name="kind""#).count(), 1);
        assert!(html.contains(r#"<input type="hidden" name="kind" value="2weeks">"#));
        for kind in FollowUpKind::ALL {
            let link = format!(r#"href="/records/{}/follow-up?kind={}""#, rec.id, kind.as_str());
            assert!(html.contains(&link), "missing link for {kind}");
        }
        assert!(html.contains(r#"<a class="btn" href="/records/"#));
    }

    #[test]
    fn report_page_links_exports_with_same_period() {
        let reference = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
        let range = crate::report::resolve_period(ReportPeriod::Monthly, reference);
        let html = report_page(ReportPeriod::Monthly, reference, &range, &[record()]);
        assert!(html.contains("/export/csv?period=monthly&date=2024-03-20"));
        assert!(html.contains("/export/excel?period=monthly&date=2024-03-20"));
        assert!(html.contains("/print-report?period=monthly&date=2024-03-20"));
        assert!(html.contains("1 record(s)"));
    }

    #[test]
    fn error_page_shows_status() {
        let html = error_page(StatusCode::NOT_FOUND, "No record with id 5");
        assert!(html.contains("404 Not Found"));
        assert!(html.contains("No record with id 5"));
    }
}
