use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum rows per worksheet (1,048,576).
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum columns per worksheet (16,384).
pub const MAX_COLS: u32 = 16_384;

/// A reference to a single cell within a worksheet.
///
/// Rows and columns are **0-indexed**:
/// - `row = 0` is row `1`
/// - `col = 0` is column `A`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellRef {
    /// 0-indexed row.
    pub row: u32,
    /// 0-indexed column.
    pub col: u32,
}

impl CellRef {
    #[inline]
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Convert to A1 notation (e.g. `A1`, `BC32`).
    pub fn to_xc(self) -> String {
        format!("{}{}", col_to_letters(self.col), self.row + 1)
    }

    /// Parse an A1-style reference (e.g. `A1`, `$B$2`), ignoring `$` markers.
    pub fn from_xc(xc: &str) -> Result<Self, A1ParseError> {
        parse_xc_with_flags(xc).map(|parsed| parsed.cell)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xc())
    }
}

/// A cell reference together with its `$` (fixed) markers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FlaggedCellRef {
    pub cell: CellRef,
    pub col_fixed: bool,
    pub row_fixed: bool,
}

impl FlaggedCellRef {
    pub fn to_xc(self) -> String {
        let mut out = String::new();
        if self.col_fixed {
            out.push('$');
        }
        out.push_str(&col_to_letters(self.cell.col));
        if self.row_fixed {
            out.push('$');
        }
        out.push_str(&(self.cell.row + 1).to_string());
        out
    }
}

/// Parse an A1 reference, keeping track of `$` markers on each axis.
pub fn parse_xc_with_flags(xc: &str) -> Result<FlaggedCellRef, A1ParseError> {
    let s = xc.trim();
    if s.is_empty() {
        return Err(A1ParseError::Empty);
    }

    let bytes = s.as_bytes();
    let mut idx = 0usize;
    let col_fixed = bytes.first() == Some(&b'$');
    if col_fixed {
        idx += 1;
    }

    let col_start = idx;
    while idx < bytes.len() && bytes[idx].is_ascii_alphabetic() {
        idx += 1;
    }
    if idx == col_start {
        return Err(A1ParseError::MissingColumn);
    }
    let col_str = &s[col_start..idx];

    let row_fixed = bytes.get(idx) == Some(&b'$');
    if row_fixed {
        idx += 1;
    }

    let row_start = idx;
    while idx < bytes.len() && bytes[idx].is_ascii_digit() {
        idx += 1;
    }
    if idx == row_start {
        return Err(A1ParseError::MissingRow);
    }
    if idx != bytes.len() {
        return Err(A1ParseError::TrailingCharacters);
    }

    let col = letters_to_col(col_str)?;
    if col >= MAX_COLS {
        return Err(A1ParseError::InvalidColumn);
    }
    let row_1_based: u32 = s[row_start..idx]
        .parse()
        .map_err(|_| A1ParseError::InvalidRow)?;
    if row_1_based == 0 || row_1_based > MAX_ROWS {
        return Err(A1ParseError::InvalidRow);
    }

    Ok(FlaggedCellRef {
        cell: CellRef::new(row_1_based - 1, col),
        col_fixed,
        row_fixed,
    })
}

/// A rectangular region within a worksheet.
///
/// The range is inclusive and always normalized such that `start <= end` on both axes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: CellRef,
    pub end: CellRef,
}

impl Range {
    /// Construct a new range, normalizing coordinates if needed.
    pub const fn new(a: CellRef, b: CellRef) -> Self {
        let start_row = if a.row <= b.row { a.row } else { b.row };
        let end_row = if a.row <= b.row { b.row } else { a.row };
        let start_col = if a.col <= b.col { a.col } else { b.col };
        let end_col = if a.col <= b.col { b.col } else { a.col };
        Self {
            start: CellRef::new(start_row, start_col),
            end: CellRef::new(end_row, end_col),
        }
    }

    #[inline]
    pub const fn contains(&self, cell: CellRef) -> bool {
        cell.row >= self.start.row
            && cell.row <= self.end.row
            && cell.col >= self.start.col
            && cell.col <= self.end.col
    }

    #[inline]
    pub const fn width(&self) -> u32 {
        self.end.col - self.start.col + 1
    }

    #[inline]
    pub const fn height(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    #[inline]
    pub const fn is_single_cell(&self) -> bool {
        self.start.row == self.end.row && self.start.col == self.end.col
    }

    /// Parse an A1 range like `A1:B2` or a single cell like `C3`.
    pub fn from_xc(xc: &str) -> Result<Self, RangeParseError> {
        let s = xc.trim();
        if s.is_empty() {
            return Err(RangeParseError::Empty);
        }

        match s.split_once(':') {
            None => {
                let cell = CellRef::from_xc(s)?;
                Ok(Range::new(cell, cell))
            }
            Some((a, b)) => {
                let start = CellRef::from_xc(a)?;
                let end = CellRef::from_xc(b)?;
                Ok(Range::new(start, end))
            }
        }
    }

    /// Iterate the cells of the range in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellRef> + '_ {
        (self.start.row..=self.end.row)
            .flat_map(move |row| (self.start.col..=self.end.col).map(move |col| CellRef::new(row, col)))
    }

    /// Smallest range covering both `self` and `other`.
    pub fn union(&self, other: &Range) -> Range {
        Range::new(
            CellRef::new(
                self.start.row.min(other.start.row),
                self.start.col.min(other.start.col),
            ),
            CellRef::new(self.end.row.max(other.end.row), self.end.col.max(other.end.col)),
        )
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single_cell() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}

/// Errors that can occur when parsing an A1 cell reference.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum A1ParseError {
    #[error("empty A1 reference")]
    Empty,
    #[error("missing column in A1 reference")]
    MissingColumn,
    #[error("missing row in A1 reference")]
    MissingRow,
    #[error("invalid column in A1 reference")]
    InvalidColumn,
    #[error("invalid row in A1 reference")]
    InvalidRow,
    #[error("trailing characters in A1 reference")]
    TrailingCharacters,
}

/// Errors that can occur when parsing an A1 range.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum RangeParseError {
    #[error("empty A1 range")]
    Empty,
    #[error("invalid cell reference in range: {0}")]
    Cell(#[from] A1ParseError),
}

/// Convert a 0-based column index into letters (`0` -> `A`, `27` -> `AB`).
pub fn col_to_letters(col: u32) -> String {
    let mut n = col + 1;
    let mut out = Vec::<char>::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    out.iter().rev().collect()
}

/// Convert column letters into a 0-based index (`A` -> `0`), case-insensitive.
pub fn letters_to_col(s: &str) -> Result<u32, A1ParseError> {
    let mut col: u32 = 0;
    for b in s.bytes() {
        if !b.is_ascii_alphabetic() {
            return Err(A1ParseError::InvalidColumn);
        }
        let v = (b.to_ascii_uppercase() - b'A') as u32 + 1;
        col = col
            .checked_mul(26)
            .and_then(|c| c.checked_add(v))
            .ok_or(A1ParseError::InvalidColumn)?;
    }
    if col == 0 {
        return Err(A1ParseError::InvalidColumn);
    }
    Ok(col - 1)
}

/// Quote a sheet name for use in a reference when it contains characters other than
/// letters, digits and underscores.
pub fn quote_sheet_name(name: &str) -> String {
    let plain = !name.is_empty()
        && name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    if plain {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

/// Reverse of [`quote_sheet_name`].
pub fn unquote_sheet_name(name: &str) -> String {
    match name.strip_prefix('\'').and_then(|n| n.strip_suffix('\'')) {
        Some(inner) => inner.replace("''", "'"),
        None => name.to_string(),
    }
}

/// Split `Sheet1!A1:B2` into (`Some("Sheet1")`, `"A1:B2"`), unquoting the sheet name.
pub fn split_sheet_reference(reference: &str) -> (Option<String>, &str) {
    match reference.rfind('!') {
        Some(idx) => (
            Some(unquote_sheet_name(&reference[..idx])),
            &reference[idx + 1..],
        ),
        None => (None, reference),
    }
}
