use serde::Deserialize;

/// Reporting period; defaults to the current month.
#[derive(Debug, Deserialize)]
pub struct ReportParams {
    pub month: Option<i32>,
    pub year: Option<i32>,
}
