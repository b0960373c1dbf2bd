//! Derived read-only views: dashboard counts and reseller summaries.

pub mod dashboard;

pub use dashboard::{DashboardStats, ReportService, ResellerSummary};
