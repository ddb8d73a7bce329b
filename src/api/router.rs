//! Register router.
//!
//! HTML pages live at the root; a JSON surface for scripted clients is
//! nested under `/api/`. Every response passes through the access logger
//! and carries `Cache-Control: no-store`, since pages show client data.

use std::sync::Arc;

use axum::http::header::CACHE_CONTROL;
use axum::http::{HeaderValue, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints;
use crate::api::error::{ApiError, PageError};
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::RegisterState;

/// Build the full router for a register instance.
pub fn register_router(core: Arc<RegisterState>) -> Router {
    let ctx = ApiContext::new(core);

    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    // `/records/new` wins over `/records/:id` as a static segment.
    let pages = Router::new()
        .route("/", get(endpoints::home::index))
        .route("/records", get(endpoints::records::list))
        .route(
            "/records/new",
            get(endpoints::entry::form).post(endpoints::entry::submit),
        )
        .route("/records/:id", get(endpoints::records::detail))
        .route(
            "/records/:id/follow-up",
            get(endpoints::follow_up::form).post(endpoints::follow_up::submit),
        )
        .route("/reports", get(endpoints::reports::report))
        .route("/export/csv", get(endpoints::reports::export_csv))
        .route("/export/excel", get(endpoints::reports::export_excel))
        .route("/print-report", get(endpoints::reports::print))
        .route("/dashboard", get(endpoints::dashboard::show));

    let api = Router::new()
        .route("/health", get(endpoints::health::check))
        .route(
            "/records",
            get(endpoints::records_api::list).post(endpoints::records_api::create),
        )
        .route("/records/:id", get(endpoints::records_api::detail))
        .route(
            "/records/:id/follow-ups/:kind",
            put(endpoints::records_api::update_follow_up),
        );

    Router::new()
        .merge(pages)
        .nest("/api", api)
        .fallback(not_found)
        .with_state(ctx)
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
}

/// JSON for `/api/...`, an HTML page everywhere else.
async fn not_found(uri: Uri) -> Response {
    let message = format!("No page at {}", uri.path());
    if uri.path() == "/api" || uri.path().starts_with("/api/") {
        ApiError::NotFound(message).into_response()
    } else {
        PageError(ApiError::NotFound(message)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use crate::db;
    use crate::models::test_support::sample_entry;

    /// A router backed by a fresh database file.
    /// The tempdir guard must be kept alive for the duration of the test.
    fn test_app() -> (Router, Arc<RegisterState>, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let core = Arc::new(RegisterState::new(
            tmp.path().join("gbv.db"),
            Some("Kibera Health Centre".into()),
        ));
        (register_router(core.clone()), core, tmp)
    }

    fn seed(core: &RegisterState, visit_date: &str) -> i64 {
        let conn = core.open_db().unwrap();
        db::insert_visit_record(&conn, &sample_entry(visit_date)).unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn form_req(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn json_req(method: &str, uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), 4 * 1024 * 1024)
            .await
            .unwrap()
            .to_vec()
    }

    async fn body_text(response: Response) -> String {
        String::from_utf8(body_bytes(response).await).unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    fn location(response: &Response) -> String {
        response
            .headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    }

    // ── pages ──────────────────────────────────────────────

    #[tokio::test]
    async fn home_page_is_not_cached() {
        let (app, _core, _tmp) = test_app();
        let response = app.oneshot(get_req("/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(CACHE_CONTROL).unwrap(), "no-store");
        let html = body_text(response).await;
        assert!(html.contains("Gender Based Violence Register"));
        assert!(html.contains("0 record(s) on file"));
    }

    #[tokio::test]
    async fn entry_form_renders() {
        let (app, _core, _tmp) = test_app();
        let response = app.oneshot(get_req("/records/new")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Register a new case"));
        assert!(html.contains(r#"name="client_name""#));
    }

    #[tokio::test]
    async fn submitting_the_entry_form_stores_and_redirects() {
        let (app, core, _tmp) = test_app();
        let response = app
            .oneshot(form_req(
                "/records/new",
                "client_name=Jane+Wanjiru&age=24&sex=F&visit_date=2024-03-15&pep_given=y",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/records/1?created=1");

        let conn = core.open_db().unwrap();
        let record = db::get_visit_record(&conn, 1).unwrap();
        assert_eq!(record.entry.demographics.client_name, "Jane Wanjiru");
        assert_eq!(record.entry.treatments.pep_given.as_deref(), Some("Y"));
    }

    #[tokio::test]
    async fn invalid_entry_form_is_rerendered_with_400() {
        let (app, core, _tmp) = test_app();
        let response = app
            .oneshot(form_req(
                "/records/new",
                "client_name=Jane+Wanjiru&age=24&sex=F&visit_date=15%2F03%2F2024",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = body_text(response).await;
        assert!(html.contains("Register a new case"));
        assert!(html.contains("Jane Wanjiru"));

        let conn = core.open_db().unwrap();
        assert_eq!(db::count_visit_records(&conn).unwrap(), 0);
    }

    #[tokio::test]
    async fn record_detail_shows_creation_notice() {
        let (app, core, _tmp) = test_app();
        let id = seed(&core, "2024-03-15");

        let response = app
            .oneshot(get_req(&format!("/records/{id}?created=1")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Record added successfully."));
        assert!(html.contains("Jane Wanjiru"));
    }

    #[tokio::test]
    async fn unknown_and_malformed_ids_are_404_pages() {
        let (app, _core, _tmp) = test_app();
        for uri in ["/records/999", "/records/abc", "/records/999/follow-up"] {
            let response = app.clone().oneshot(get_req(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
            let html = body_text(response).await;
            assert!(html.contains("404"), "{uri}");
        }
    }

    #[tokio::test]
    async fn follow_up_form_round_trip() {
        let (app, core, _tmp) = test_app();
        let id = seed(&core, "2024-03-15");

        let response = app
            .clone()
            .oneshot(get_req(&format!("/records/{id}/follow-up")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Follow-up for record #"));

        let response = app
            .clone()
            .oneshot(form_req(
                &format!("/records/{id}/follow-up"),
                "kind=2weeks&actual_return=2024-03-29&status=Stable&hb=12.5",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), format!("/records/{id}?updated=2weeks"));

        let conn = core.open_db().unwrap();
        let record = db::get_visit_record(&conn, id).unwrap();
        let two_weeks = record
            .entry
            .follow_ups
            .get(crate::models::FollowUpKind::TwoWeeks)
            .unwrap();
        assert_eq!(two_weeks.date.to_string(), "2024-03-29");
        assert_eq!(two_weeks.hb, Some(12.5));

        let response = app
            .oneshot(get_req(&format!("/records/{id}?updated=2weeks")))
            .await
            .unwrap();
        assert!(body_text(response).await.contains("2 Weeks follow-up saved."));
    }

    #[tokio::test]
    async fn switching_follow_up_kind_loads_that_kinds_values() {
        let (app, core, _tmp) = test_app();
        let id = seed(&core, "2024-03-15");
        let response = app
            .clone()
            .oneshot(form_req(
                &format!("/records/{id}/follow-up"),
                "kind=2weeks&actual_return=2024-03-29&status=Stable",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let response = app
            .clone()
            .oneshot(get_req(&format!("/records/{id}/follow-up?kind=2weeks")))
            .await
            .unwrap();
        let html = body_text(response).await;
        assert!(html.contains(r#"<input type="hidden" name="kind" value="2weeks">"#));
        assert!(html.contains(r#"value="2024-03-29""#));

        let response = app
            .oneshot(get_req(&format!("/records/{id}/follow-up?kind=1month")))
            .await
            .unwrap();
        let html = body_text(response).await;
        assert!(html.contains(r#"<input type="hidden" name="kind" value="1month">"#));
        assert!(!html.contains(r#"value="2024-03-29""#));
        assert!(!html.contains(r#"value="Stable""#));
    }

    #[tokio::test]
    async fn follow_up_without_return_date_is_rejected() {
        let (app, core, _tmp) = test_app();
        let id = seed(&core, "2024-03-15");

        let response = app
            .oneshot(form_req(
                &format!("/records/{id}/follow-up"),
                "kind=1month&status=Stable",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let conn = core.open_db().unwrap();
        let record = db::get_visit_record(&conn, id).unwrap();
        assert!(record.entry.follow_ups.get(crate::models::FollowUpKind::OneMonth).is_none());
    }

    #[tokio::test]
    async fn report_lists_records_in_period() {
        let (app, core, _tmp) = test_app();
        seed(&core, "2024-03-15");
        seed(&core, "2024-04-02");

        let response = app
            .oneshot(get_req("/reports?period=monthly&date=2024-03-20"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("1 record(s)"));
    }

    #[tokio::test]
    async fn report_rejects_unknown_period_and_bad_date() {
        let (app, _core, _tmp) = test_app();
        for uri in ["/reports?period=fortnightly", "/export/csv?period=daily&date=yesterday"] {
            let response = app.clone().oneshot(get_req(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[tokio::test]
    async fn csv_export_is_an_attachment() {
        let (app, core, _tmp) = test_app();
        seed(&core, "2024-03-15");

        let response = app
            .oneshot(get_req("/export/csv?period=yearly&date=2024-06-01"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers().get(header::CONTENT_TYPE).unwrap();
        assert!(content_type.to_str().unwrap().starts_with("text/csv"));
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment; filename=\"gbv_report_yearly_"));
        assert!(disposition.ends_with(".csv\""));

        let text = body_text(response).await;
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("Jane Wanjiru"));
    }

    #[tokio::test]
    async fn excel_export_is_a_workbook() {
        let (app, core, _tmp) = test_app();
        seed(&core, "2024-03-15");

        let response = app.oneshot(get_req("/export/excel")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("gbv_report_all_"));
        assert!(disposition.ends_with(".xlsx\""));

        let bytes = body_bytes(response).await;
        // XLSX is a zip container.
        assert_eq!(&bytes[..2], b"PK");
    }

    #[tokio::test]
    async fn print_report_carries_facility_name() {
        let (app, core, _tmp) = test_app();
        seed(&core, "2024-03-15");

        let response = app.oneshot(get_req("/print-report?period=all")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Gender Based Violence Register (HMIS MCH 061)"));
        assert!(html.contains("Kibera Health Centre"));
        assert!(html.contains("Jane Wanjiru"));
    }

    #[tokio::test]
    async fn dashboard_renders_for_explicit_range() {
        let (app, core, _tmp) = test_app();
        seed(&core, "2024-03-15");

        let response = app
            .oneshot(get_req("/dashboard?start_date=2024-03-01&end_date=2024-03-31"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Dashboard"));
    }

    #[tokio::test]
    async fn dashboard_rejects_inverted_range() {
        let (app, _core, _tmp) = test_app();
        let response = app
            .oneshot(get_req("/dashboard?start_date=2024-03-31&end_date=2024-03-01"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_page_is_html_404() {
        let (app, _core, _tmp) = test_app();
        let response = app.oneshot(get_req("/nowhere")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let content_type = response.headers().get(header::CONTENT_TYPE).unwrap();
        assert!(content_type.to_str().unwrap().starts_with("text/html"));
    }

    // ── JSON API ───────────────────────────────────────────

    #[tokio::test]
    async fn health_reports_record_count() {
        let (app, core, _tmp) = test_app();
        seed(&core, "2024-03-15");

        let response = app.oneshot(get_req("/api/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["record_count"], 1);
    }

    #[tokio::test]
    async fn api_create_get_and_update_follow_up() {
        let (app, _core, _tmp) = test_app();
        let entry = serde_json::to_string(&sample_entry("2024-03-15")).unwrap();

        let response = app
            .clone()
            .oneshot(json_req("POST", "/api/records", &entry))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        let id = json["record"]["id"].as_i64().unwrap();
        assert_eq!(json["record"]["demographics"]["client_name"], "Jane Wanjiru");
        assert_eq!(json["warnings"].as_array().unwrap().len(), 0);

        let response = app
            .clone()
            .oneshot(get_req(&format!("/api/records/{id}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["id"], id);

        let response = app
            .clone()
            .oneshot(json_req(
                "PUT",
                &format!("/api/records/{id}/follow-ups/3months"),
                r#"{"date":"2024-06-14","status":"Stable"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["record"]["follow_ups"]["3months"]["date"], "2024-06-14");

        let response = app.oneshot(get_req("/api/records")).await.unwrap();
        let json = body_json(response).await;
        assert_eq!(json.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn api_rejects_malformed_json_and_unknown_kind() {
        let (app, core, _tmp) = test_app();
        let id = seed(&core, "2024-03-15");

        let response = app
            .clone()
            .oneshot(json_req("POST", "/api/records", "{not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "BAD_REQUEST");

        let response = app
            .oneshot(json_req(
                "PUT",
                &format!("/api/records/{id}/follow-ups/fortnight"),
                r#"{"date":"2024-03-29"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "VALIDATION");
    }

    #[tokio::test]
    async fn api_invalid_entry_is_a_validation_error() {
        let (app, core, _tmp) = test_app();
        let mut entry = sample_entry("2024-03-15");
        entry.demographics.client_name = "   ".into();
        let body = serde_json::to_string(&entry).unwrap();

        let response = app
            .oneshot(json_req("POST", "/api/records", &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "VALIDATION");

        let conn = core.open_db().unwrap();
        assert_eq!(db::count_visit_records(&conn).unwrap(), 0);
    }

    #[tokio::test]
    async fn api_not_found_is_json() {
        let (app, _core, _tmp) = test_app();
        for uri in ["/api/records/42", "/api/nonexistent"] {
            let response = app.clone().oneshot(get_req(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(body_json(response).await["error"]["code"], "NOT_FOUND", "{uri}");
        }
    }

    #[tokio::test]
    async fn api_list_filters_by_period() {
        let (app, core, _tmp) = test_app();
        seed(&core, "2024-03-15");
        seed(&core, "2024-07-01");

        let response = app
            .oneshot(get_req("/api/records?period=quarterly&date=2024-02-10"))
            .await
            .unwrap();
        let json = body_json(response).await;
        let records = json.as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["initial_visit"]["visit_date"], "2024-03-15");
    }
}
