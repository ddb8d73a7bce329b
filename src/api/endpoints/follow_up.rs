//! Follow-up form: record one of the four check-ins for an existing case.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;

use crate::api::error::PageError;
use crate::api::forms::{self, FormData};
use crate::api::pages;
use crate::api::types::{parse_record_id, ApiContext, KindQuery};
use crate::db::{self, DatabaseError};
use crate::models::{FollowUpKind, ValidationError, VisitRecord};

/// `GET /records/:id/follow-up[?kind=]`
///
/// Without `kind`, the first pending follow-up is selected.
pub async fn form(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    Query(query): Query<KindQuery>,
) -> Result<Html<String>, PageError> {
    let id = parse_record_id(&id)?;
    let conn = ctx.open_db()?;
    let record = db::get_visit_record(&conn, id)?;

    let kind = match query.kind.as_deref() {
        Some(raw) => raw.parse::<FollowUpKind>()?,
        None => record
            .entry
            .follow_ups
            .pending()
            .first()
            .copied()
            .unwrap_or(FollowUpKind::TwoWeeks),
    };

    let values = pages::follow_up_form_values(&record, kind);
    Ok(Html(pages::follow_up_form_page(&record, kind, &values, None)))
}

fn rejected(record: &VisitRecord, kind: FollowUpKind, form: &FormData, err: &ValidationError) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Html(pages::follow_up_form_page(record, kind, form, Some(&err.to_string()))),
    )
        .into_response()
}

/// `POST /records/:id/follow-up`: overwrite the selected follow-up.
pub async fn submit(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
    Form(form): Form<FormData>,
) -> Result<Response, PageError> {
    let id = parse_record_id(&id)?;
    let conn = ctx.open_db()?;
    let record = db::get_visit_record(&conn, id)?;

    let kind = forms::parse_follow_up_kind(&form)?;
    let follow_up = match forms::parse_follow_up(&form) {
        Ok(follow_up) => follow_up,
        Err(err) => return Ok(rejected(&record, kind, &form, &err)),
    };

    match db::update_follow_up(&conn, id, kind, &follow_up) {
        Ok(()) => {}
        Err(DatabaseError::Validation(err)) => return Ok(rejected(&record, kind, &form, &err)),
        Err(err) => return Err(err.into()),
    }

    Ok(Redirect::to(&format!("/records/{id}?updated={}", kind.as_str())).into_response())
}
