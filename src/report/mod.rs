//! The monthly dashboard summary and the yearly report.

mod aggregation;
mod endpoints;
mod query;

pub use aggregation::{build_monthly_summary, build_yearly_report};
pub use endpoints::{get_monthly_summary_endpoint, get_yearly_report_endpoint};
pub use query::{ReportTransaction, get_report_transactions};
