//! Shared types for the web layer.

use std::sync::Arc;

use chrono::{Local, NaiveDate, NaiveDateTime, SubsecRound};
use rusqlite::Connection;
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::core_state::RegisterState;

// ═══════════════════════════════════════════════════════════
// API context: shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<RegisterState>,
}

impl ApiContext {
    pub fn new(core: Arc<RegisterState>) -> Self {
        Self { core }
    }

    /// Open a connection for the current request.
    pub fn open_db(&self) -> Result<Connection, ApiError> {
        Ok(self.core.open_db()?)
    }
}

/// Path ids that are not integers can never match a record.
pub fn parse_record_id(raw: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::NotFound(format!("No record with id {raw}")))
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

// ═══════════════════════════════════════════════════════════
// Query strings
// ═══════════════════════════════════════════════════════════

/// `?period=&date=` for reports and exports.
#[derive(Debug, Default, Deserialize)]
pub struct PeriodQuery {
    pub period: Option<String>,
    pub date: Option<String>,
}

/// `?start_date=&end_date=` for the dashboard.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Flags carried on the redirect after a successful submission.
#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub created: Option<String>,
    pub updated: Option<String>,
}

/// `?kind=` preselecting a follow-up on the form.
#[derive(Debug, Default, Deserialize)]
pub struct KindQuery {
    pub kind: Option<String>,
}
