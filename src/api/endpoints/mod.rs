//! Route handlers.
//!
//! HTML page handlers return `PageError` on failure; the JSON handlers in
//! `records_api` and `health` return `ApiError`.

pub mod dashboard;
pub mod entry;
pub mod follow_up;
pub mod health;
pub mod home;
pub mod records;
pub mod records_api;
pub mod reports;
