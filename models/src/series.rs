use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily case counts for one region, oldest day first.
///
/// The region key is a sanitized lowercase slug (see the ingest tool);
/// `start_date` anchors index 0 so consumers can reconstruct the date of
/// every observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseSeries {
    pub region: String,
    pub start_date: NaiveDate,
    pub counts: Vec<f64>,
}

impl CaseSeries {
    /// Date of the last observation, if any.
    pub fn last_date(&self) -> Option<NaiveDate> {
        if self.counts.is_empty() {
            None
        } else {
            Some(self.start_date + chrono::Duration::days(self.counts.len() as i64 - 1))
        }
    }
}
