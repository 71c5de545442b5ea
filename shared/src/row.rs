//! Column schemas for records written to spreadsheets.

use serde_json::Value;

/// A record with a declared, fixed column layout.
///
/// `COLUMNS` is both the header row and the order in which `cells` yields
/// values, so every record of one type always lines up with the same header.
pub trait Row {
    const COLUMNS: &'static [&'static str];

    /// Cell values in `COLUMNS` order.
    fn cells(&self) -> Vec<Value>;

    fn header() -> Vec<Value> {
        Self::COLUMNS
            .iter()
            .map(|column| Value::String((*column).to_string()))
            .collect()
    }
}

/// Text cell for an optional source field. Missing values become empty cells.
pub fn text_cell(value: &Option<String>) -> Value {
    Value::String(value.clone().unwrap_or_default())
}
