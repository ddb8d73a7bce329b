//! Record list and detail pages.

use axum::extract::{Path, Query, State};
use axum::response::Html;

use crate::api::error::PageError;
use crate::api::pages;
use crate::api::types::{parse_record_id, ApiContext, NoticeQuery};
use crate::db;
use crate::models::validation::entry_warnings;
use crate::models::FollowUpKind;

/// `GET /records`
pub async fn list(State(ctx): State<ApiContext>) -> Result<Html<String>, PageError> {
    let conn = ctx.open_db()?;
    let records = db::list_visit_records(&conn)?;
    Ok(Html(pages::records_page(&records)))
}

/// `GET /records/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    Query(query): Query<NoticeQuery>,
) -> Result<Html<String>, PageError> {
    let id = parse_record_id(&id)?;
    let conn = ctx.open_db()?;
    let record = db::get_visit_record(&conn, id)?;

    let mut notices = Vec::new();
    if query.created.is_some() {
        notices.push("Record added successfully.".to_string());
    }
    if let Some(kind) = query.updated.as_deref().and_then(|k| k.parse::<FollowUpKind>().ok()) {
        notices.push(format!("{} follow-up saved.", kind.label()));
    }

    let warnings = entry_warnings(&record.entry);
    Ok(Html(pages::record_page(&record, &notices, &warnings)))
}
