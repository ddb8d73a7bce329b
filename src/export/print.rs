use chrono::NaiveDateTime;

use crate::models::{FollowUpKind, VisitRecord};
use crate::schema::{self, field_display, ENTRY_SECTIONS, FOLLOW_UP_FIELDS};

/// Heading details for a printed report.
#[derive(Debug, Clone)]
pub struct PrintContext {
    pub period_label: String,
    pub range_label: String,
    pub facility_name: Option<String>,
    pub printed_at: NaiveDateTime,
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const PRINT_CSS: &str = r#"
body{font-family:Arial,Helvetica,sans-serif;font-size:11px;color:#000;margin:16px}
h1{font-size:16px;margin:0 0 4px;text-align:center}
.meta{text-align:center;margin-bottom:12px}
.record{page-break-after:always;border:1px solid #000;padding:8px;margin-bottom:16px}
.record:last-child{page-break-after:auto}
.record h2{font-size:13px;margin:0 0 6px}
.grid{display:grid;grid-template-columns:repeat(4,1fr);gap:8px}
table{border-collapse:collapse;width:100%}
th,td{border:1px solid #555;padding:2px 4px;text-align:left;vertical-align:top}
th{background:#eee}
.empty{text-align:center;font-style:italic;margin-top:32px}
@media print{body{margin:0}.no-print{display:none}}
"#;

/// Render a self-contained HTML page laid out like the paper register.
pub fn to_print_document(records: &[VisitRecord], ctx: &PrintContext) -> String {
    let facility = ctx
        .facility_name
        .as_deref()
        .map(|f| format!("<div>{}</div>", escape_html(f)))
        .unwrap_or_default();

    let body = if records.is_empty() {
        r#"<p class="empty">No records found for this period.</p>"#.to_string()
    } else {
        records.iter().map(render_record).collect::<Vec<_>>().join("\n")
    };

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>GBV Register Report</title>
<style>{css}</style>
</head>
<body>
<h1>Gender Based Violence Register (HMIS MCH 061)</h1>
<div class="meta">
  {facility}
  <div>Period: {period} ({range})</div>
  <div>Total records: {count}</div>
  <div>Printed on: {printed}</div>
</div>
<button class="no-print" onclick="window.print()">Print</button>
{body}
</body>
</html>"##,
        css = PRINT_CSS,
        facility = facility,
        period = escape_html(&ctx.period_label),
        range = escape_html(&ctx.range_label),
        count = records.len(),
        printed = ctx.printed_at.format("%d/%m/%Y %H:%M"),
        body = body,
    )
}

fn render_record(record: &VisitRecord) -> String {
    let values = schema::initial_values(&record.entry);
    let mut values = values.iter();

    let mut sections = String::new();
    for section in ENTRY_SECTIONS.iter() {
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
        sections.push_str(&format!(
            "<div><table><tr><th colspan=\"2\">{}</th></tr>{rows}</table></div>",
            escape_html(section.title)
        ));
    }

    format!(
        r#"<section class="record">
<h2>Record #{id} &middot; {name}</h2>
<div class="grid">{sections}</div>
<h3>Follow-ups</h3>
{follow_ups}
</section>"#,
        id = record.id,
        name = escape_html(&record.entry.demographics.client_name),
        sections = sections,
        follow_ups = render_follow_ups(record),
    )
}

fn render_follow_ups(record: &VisitRecord) -> String {
    let columns: Vec<Vec<String>> = FollowUpKind::ALL
        .iter()
        .map(|kind| {
            schema::follow_up_values(record.entry.follow_ups.get(*kind))
                .iter()
                .zip(FOLLOW_UP_FIELDS)
                .map(|((_, value), spec)| field_display(spec, value))
                .collect()
        })
        .collect();

    let header: String = FollowUpKind::ALL
        .iter()
        .map(|kind| format!("<th>{}</th>", kind.label()))
        .collect();

    let body: String = FOLLOW_UP_FIELDS
        .iter()
        .enumerate()
        .map(|(i, spec)| {
            let cells: String = columns
                .iter()
                .map(|col| format!("<td>{}</td>", escape_html(&col[i])))
                .collect();
            format!("<tr><th>{}</th>{cells}</tr>", escape_html(spec.label))
        })
        .collect();

    format!("<table><tr><th></th>{header}</tr>{body}</table>")
}
