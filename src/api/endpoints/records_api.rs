//! JSON surface over the record store.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::endpoints::reports::parse_date_param;
use crate::api::error::ApiError;
use crate::api::types::{parse_record_id, today, ApiContext, PeriodQuery};
use crate::db;
use crate::models::validation::entry_warnings;
use crate::models::{FollowUp, FollowUpKind, VisitEntry, VisitRecord};
use crate::report::{resolve_named_period, DateRange};

#[derive(Serialize)]
pub struct SavedRecord {
    pub record: VisitRecord,
    /// Follow-up dates that precede the initial visit.
    pub warnings: Vec<String>,
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {e}")))
}

/// `GET /api/records[?period=&date=]`: all records unless a period is given.
pub async fn list(
    State(ctx): State<ApiContext>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<Vec<VisitRecord>>, ApiError> {
    let range = match query.period.as_deref() {
        Some(name) => {
            let reference = parse_date_param("date", query.date.as_deref(), today())?;
            resolve_named_period(name, reference)?.1
        }
        None => DateRange::all_time(),
    };
    let conn = ctx.open_db()?;
    Ok(Json(db::list_visit_records_in_range(&conn, &range)?))
}

/// `POST /api/records`
pub async fn create(
    State(ctx): State<ApiContext>,
    body: Bytes,
) -> Result<(StatusCode, Json<SavedRecord>), ApiError> {
    let entry: VisitEntry = parse_body(&body)?;
    let conn = ctx.open_db()?;
    let id = db::insert_visit_record(&conn, &entry)?;
    let record = db::get_visit_record(&conn, id)?;
    let warnings = entry_warnings(&record.entry);
    Ok((StatusCode::CREATED, Json(SavedRecord { record, warnings })))
}

/// `GET /api/records/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<VisitRecord>, ApiError> {
    let id = parse_record_id(&id)?;
    let conn = ctx.open_db()?;
    Ok(Json(db::get_visit_record(&conn, id)?))
}

/// `PUT /api/records/:id/follow-ups/:kind`
pub async fn update_follow_up(
    State(ctx): State<ApiContext>,
    Path((id, kind)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<SavedRecord>, ApiError> {
    let id = parse_record_id(&id)?;
    let kind: FollowUpKind = kind.parse()?;
    let follow_up: FollowUp = parse_body(&body)?;

    let conn = ctx.open_db()?;
    db::update_follow_up(&conn, id, kind, &follow_up)?;
    let record = db::get_visit_record(&conn, id)?;
    let warnings = entry_warnings(&record.entry);
    Ok(Json(SavedRecord { record, warnings }))
}
