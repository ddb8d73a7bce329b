use axum::extract::{Query, State};
use axum::response::Html;
use chrono::Days;

use crate::api::endpoints::reports::parse_date_param;
use crate::api::error::{ApiError, PageError};
use crate::api::pages;
use crate::api::types::{today, ApiContext, DashboardQuery};
use crate::dashboard::dashboard_summary;
use crate::report::DateRange;

/// Window shown when no dates are given.
const DEFAULT_WINDOW_DAYS: u64 = 30;

/// `GET /dashboard?start_date=&end_date=`, both dates inclusive.
pub async fn show(
    State(ctx): State<ApiContext>,
    Query(query): Query<DashboardQuery>,
) -> Result<Html<String>, PageError> {
    let end = parse_date_param("end_date", query.end_date.as_deref(), today())?;
    let default_start = end.checked_sub_days(Days::new(DEFAULT_WINDOW_DAYS)).unwrap_or(end);
    let start = parse_date_param("start_date", query.start_date.as_deref(), default_start)?;
    if end < start {
        return Err(ApiError::BadRequest(format!(
            "end_date {end} is before start_date {start}"
        ))
        .into());
    }

    let conn = ctx.open_db()?;
    let summary = dashboard_summary(&conn, &DateRange::from_inclusive(start, end))?;
    Ok(Html(pages::dashboard_page(&summary, start, end)))
}
