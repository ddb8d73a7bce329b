//! Web surface of the register.
//!
//! HTML pages for the entry form, record browser, reports and dashboard,
//! plus a small JSON API under `/api/`. `register_router()` returns a
//! `Router` that `server::start_server_on` mounts on a local listener.

pub mod endpoints;
pub mod error;
pub mod forms;
pub mod middleware;
pub mod pages;
pub mod router;
pub mod server;
pub mod types;

pub use router::register_router;
pub use server::{start_server_on, RegisterServer, ServerError};
pub use types::ApiContext;
