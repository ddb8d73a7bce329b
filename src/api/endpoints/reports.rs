//! Period reports and their CSV, spreadsheet and print renditions.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use chrono::NaiveDate;

use crate::api::error::{ApiError, PageError};
use crate::api::pages;
use crate::api::types::{now, today, ApiContext, PeriodQuery};
use crate::db;
use crate::export::{self, ExportFormat, PrintContext};
use crate::models::{ValidationError, VisitRecord};
use crate::report::{resolve_named_period, DateRange, ReportPeriod};
use crate::schema::DATE_FORMAT;

const DEFAULT_PERIOD: &str = "all";

/// A resolved `?period=&date=` pair and the records it selects.
struct PeriodReport {
    period: ReportPeriod,
    reference: NaiveDate,
    range: DateRange,
    records: Vec<VisitRecord>,
}

pub(crate) fn parse_date_param(field: &str, raw: Option<&str>, default: NaiveDate) -> Result<NaiveDate, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(default),
        Some(value) => NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| {
            ApiError::from(ValidationError::InvalidDate {
                field: field.into(),
                value: value.into(),
            })
        }),
    }
}

fn load(ctx: &ApiContext, query: &PeriodQuery) -> Result<PeriodReport, ApiError> {
    let reference = parse_date_param("date", query.date.as_deref(), today())?;
    let name = query
        .period
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or(DEFAULT_PERIOD);
    let (period, range) = resolve_named_period(name, reference)?;

    let conn = ctx.open_db()?;
    let records = db::list_visit_records_in_range(&conn, &range)?;
    Ok(PeriodReport {
        period,
        reference,
        range,
        records,
    })
}

fn attachment(format: ExportFormat, report: &PeriodReport, bytes: Vec<u8>) -> Response {
    let file_name = export::export_file_name(format, report.period, today());
    tracing::info!(
        period = report.period.as_str(),
        records = report.records.len(),
        %file_name,
        "Report exported"
    );
    (
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

/// `GET /reports`
pub async fn report(
    State(ctx): State<ApiContext>,
    Query(query): Query<PeriodQuery>,
) -> Result<Html<String>, PageError> {
    let r = load(&ctx, &query)?;
    Ok(Html(pages::report_page(r.period, r.reference, &r.range, &r.records)))
}

/// `GET /export/csv`
pub async fn export_csv(
    State(ctx): State<ApiContext>,
    Query(query): Query<PeriodQuery>,
) -> Result<Response, PageError> {
    let r = load(&ctx, &query)?;
    let bytes = export::to_csv(&r.records)?;
    Ok(attachment(ExportFormat::Csv, &r, bytes))
}

/// `GET /export/excel`
pub async fn export_excel(
    State(ctx): State<ApiContext>,
    Query(query): Query<PeriodQuery>,
) -> Result<Response, PageError> {
    let r = load(&ctx, &query)?;
    let bytes = export::to_spreadsheet(&r.records)?;
    Ok(attachment(ExportFormat::Spreadsheet, &r, bytes))
}

/// `GET /print-report`
pub async fn print(
    State(ctx): State<ApiContext>,
    Query(query): Query<PeriodQuery>,
) -> Result<Html<String>, PageError> {
    let r = load(&ctx, &query)?;
    let print_ctx = PrintContext {
        period_label: r.period.label().to_string(),
        range_label: r.range.to_string(),
        facility_name: ctx.core.facility_name.clone(),
        printed_at: now(),
    };
    Ok(Html(export::to_print_document(&r.records, &print_ctx)))
}
