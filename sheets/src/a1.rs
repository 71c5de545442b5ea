//! A1 notation for sheet ranges.
//!
//! Sheet names are always quoted (`'13 - 20 May 2024'!A:A`) with embedded
//! quotes doubled, so dated names containing spaces address the right sheet.

use std::fmt;

#[derive(thiserror::Error, Debug, PartialEq)]
#[error("invalid A1 range '{0}'")]
pub struct InvalidRange(pub String);

pub fn quote_sheet_name(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}

/// Column letters for a 1-based column index: 1 is `A`, 27 is `AA`.
pub fn column_letters(mut index: usize) -> String {
    let mut letters = Vec::new();
    while index > 0 {
        let rem = (index - 1) % 26;
        letters.push(b'A' + rem as u8);
        index = (index - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }
    letters.chars().try_fold(0usize, |acc, c| {
        c.is_ascii_uppercase()
            .then(|| acc * 26 + (c as usize - 'A' as usize + 1))
    })
}

/// A cell reference; the row is absent for whole-column references.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRef {
    pub column: usize,
    pub row: Option<usize>,
}

impl CellRef {
    fn parse(s: &str) -> Option<Self> {
        let split = s.find(|c: char| c.is_ascii_digit()).unwrap_or(s.len());
        let (letters, digits) = s.split_at(split);
        let column = column_index(letters)?;
        let row = match digits {
            "" => None,
            digits => Some(digits.parse().ok().filter(|&row| row > 0)?),
        };
        Some(CellRef { column, row })
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&column_letters(self.column))?;
        if let Some(row) = self.row {
            write!(f, "{row}")?;
        }
        Ok(())
    }
}

/// A range within one named sheet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SheetRange {
    pub sheet: String,
    pub start: CellRef,
    pub end: Option<CellRef>,
}

impl SheetRange {
    /// The whole of one column, e.g. `'Sheet'!A:A`.
    pub fn column(sheet: &str, column: usize) -> Self {
        let cell = CellRef { column, row: None };
        SheetRange {
            sheet: sheet.to_string(),
            start: cell,
            end: Some(cell),
        }
    }

    /// A block of `rows` by `columns` cells whose top-left corner is column A
    /// of `start_row`.
    pub fn block(sheet: &str, start_row: usize, rows: usize, columns: usize) -> Self {
        SheetRange {
            sheet: sheet.to_string(),
            start: CellRef {
                column: 1,
                row: Some(start_row),
            },
            end: Some(CellRef {
                column: columns.max(1),
                row: Some(start_row + rows.max(1) - 1),
            }),
        }
    }

    pub fn parse(range: &str) -> Result<Self, InvalidRange> {
        let invalid = || InvalidRange(range.to_string());

        let (sheet, cells) = range.rsplit_once('!').ok_or_else(invalid)?;
        let sheet = match sheet.strip_prefix('\'') {
            Some(quoted) => quoted
                .strip_suffix('\'')
                .ok_or_else(invalid)?
                .replace("''", "'"),
            None => sheet.to_string(),
        };
        if sheet.is_empty() {
            return Err(invalid());
        }

        let (start, end) = match cells.split_once(':') {
            Some((start, end)) => (
                CellRef::parse(start).ok_or_else(invalid)?,
                Some(CellRef::parse(end).ok_or_else(invalid)?),
            ),
            None => (CellRef::parse(cells).ok_or_else(invalid)?, None),
        };

        if let Some(end) = end {
            let reversed_rows = matches!(
                (start.row, end.row),
                (Some(first), Some(last)) if last < first
            );
            if end.column < start.column || reversed_rows {
                return Err(invalid());
            }
        }

        Ok(SheetRange { sheet, start, end })
    }
}

impl fmt::Display for SheetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}", quote_sheet_name(&self.sheet), self.start)?;
        if let Some(end) = self.end {
            write!(f, ":{end}")?;
        }
        Ok(())
    }
}
