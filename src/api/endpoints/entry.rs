//! Entry form: register a new case.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;

use crate::api::error::PageError;
use crate::api::forms::{self, FormData};
use crate::api::pages;
use crate::api::types::ApiContext;
use crate::db::{self, DatabaseError};
use crate::models::ValidationError;

/// `GET /records/new`
pub async fn form() -> Html<String> {
    Html(pages::entry_form_page(&FormData::new(), None))
}

/// Re-render the form with the submitted values and the reason it failed.
fn rejected(form: &FormData, err: &ValidationError) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Html(pages::entry_form_page(form, Some(&err.to_string()))),
    )
        .into_response()
}

/// `POST /records/new`: store the case and redirect to its detail page.
pub async fn submit(
    State(ctx): State<ApiContext>,
    Form(form): Form<FormData>,
) -> Result<Response, PageError> {
    let entry = match forms::parse_entry(&form) {
        Ok(entry) => entry,
        Err(err) => return Ok(rejected(&form, &err)),
    };

    let conn = ctx.open_db()?;
    let id = match db::insert_visit_record(&conn, &entry) {
        Ok(id) => id,
        Err(DatabaseError::Validation(err)) => return Ok(rejected(&form, &err)),
        Err(err) => return Err(err.into()),
    };

    Ok(Redirect::to(&format!("/records/{id}?created=1")).into_response())
}
