use axum::extract::State;
use axum::response::Html;

use crate::api::error::PageError;
use crate::api::pages;
use crate::api::types::ApiContext;
use crate::db;

/// `GET /`
pub async fn index(State(ctx): State<ApiContext>) -> Result<Html<String>, PageError> {
    let conn = ctx.open_db()?;
    let total = db::count_visit_records(&conn)?;
    Ok(Html(pages::home_page(total)))
}
