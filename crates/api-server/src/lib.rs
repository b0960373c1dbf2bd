//! REST surface for the campaign credit platform.

pub mod account_rest;
pub mod auth;
pub mod auth_rest;
pub mod campaign_rest;
pub mod report_rest;
pub mod rest;
pub mod server;

pub use rest::AppState;
pub use server::{build_router, ApiServer};
