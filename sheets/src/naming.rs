//! Sheet names derived from the run date.
//!
//! Month names are always English and never depend on the host locale.

use chrono::{Datelike, Days, NaiveDate};

/// Label of the flat bridging snapshot sheet.
pub const BRIDGING_LABEL: &str = "Bridging";

fn long_date(date: NaiveDate) -> String {
    format!("{} {}", date.day(), date.format("%B %Y"))
}

/// `"13 - 20 May 2024"` for 2024-05-20: the trailing seven days, with only
/// the day of month shown for the start.
pub fn weekly_name(today: NaiveDate) -> String {
    let start = today - Days::new(7);
    format!("{} - {}", start.day(), long_date(today))
}

/// `"All Time (20 May 2024)"`.
pub fn alltime_name(today: NaiveDate) -> String {
    snapshot_name("All Time", today)
}

/// `"<label> (20 May 2024)"`.
pub fn snapshot_name(label: &str, today: NaiveDate) -> String {
    format!("{label} ({})", long_date(today))
}

/// All sheet names for one run, computed once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SheetNames {
    pub snapshot: String,
    pub weekly: String,
    pub alltime: String,
}

impl SheetNames {
    pub fn for_date(today: NaiveDate) -> Self {
        SheetNames {
            snapshot: snapshot_name(BRIDGING_LABEL, today),
            weekly: weekly_name(today),
            alltime: alltime_name(today),
        }
    }
}
