//! Structured table references (`Table1[[#Headers],[Rank]]`) to plain A1 ranges.

use tabula_model::{quote_sheet_name, CellRef, Range};

/// Replacement text of a reference that cannot be resolved.
pub const INVALID_REFERENCE: &str = "#REF";

/// What a formula needs to know about one table of the workbook.
#[derive(Clone, Debug, PartialEq)]
pub struct TableZone {
    pub name: String,
    pub sheet: String,
    pub range: Range,
    pub columns: Vec<String>,
    pub header_rows: u32,
    pub totals_rows: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Keyword {
    All,
    Data,
    Headers,
    Totals,
    ThisRow,
}

impl Keyword {
    fn parse(text: &str) -> Option<Self> {
        Some(match text.to_ascii_lowercase().as_str() {
            "#all" => Keyword::All,
            "#data" => Keyword::Data,
            "#headers" => Keyword::Headers,
            "#totals" => Keyword::Totals,
            "#this row" => Keyword::ThisRow,
            _ => return None,
        })
    }
}

#[derive(Debug, Default)]
struct Selection<'r> {
    keywords: Vec<Keyword>,
    columns: Option<(&'r str, &'r str)>,
}

/// Split `text` on commas that are not nested in brackets.
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, c) in text.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&text[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

fn strip_brackets(text: &str) -> &str {
    text.trim().trim_start_matches('[').trim_end_matches(']')
}

fn parse_selection(body: &str) -> Option<Selection<'_>> {
    let mut selection = Selection::default();
    let segments = if body.trim_start().starts_with('[') {
        split_top_level(body)
    } else {
        vec![body]
    };
    for segment in segments {
        let segment = segment.trim();
        if let Some((a, b)) = segment.split_once("]:[") {
            selection.columns = Some((strip_brackets(a), strip_brackets(b)));
            continue;
        }
        let item = strip_brackets(segment);
        if item.starts_with('#') {
            selection.keywords.push(Keyword::parse(item)?);
        } else if let Some(column) = item.strip_prefix('@') {
            selection.keywords.push(Keyword::ThisRow);
            if !column.is_empty() {
                selection.columns = Some((strip_brackets(column), strip_brackets(column)));
            }
        } else if !item.is_empty() {
            if selection.columns.is_some() {
                return None;
            }
            selection.columns = Some((item, item));
        }
    }
    Some(selection)
}

/// Inclusive row span of the selected keywords.
fn row_span(table: &TableZone, keywords: &[Keyword], current_row: u32) -> Option<(u32, u32)> {
    let top = table.range.start.row;
    let bottom = table.range.end.row;
    let data_start = top + table.header_rows;
    let data_end = bottom.checked_sub(table.totals_rows)?;
    let span = |keyword: Keyword| -> Option<(u32, u32)> {
        match keyword {
            Keyword::All => Some((top, bottom)),
            Keyword::Data => (data_start <= data_end).then_some((data_start, data_end)),
            Keyword::Headers => (table.header_rows > 0).then(|| (top, data_start - 1)),
            Keyword::Totals => (table.totals_rows > 0).then_some((data_end + 1, bottom)),
            Keyword::ThisRow => Some((current_row, current_row)),
        }
    };
    match keywords {
        [] => span(Keyword::Data),
        [single] => span(*single),
        [a, b] => {
            let pair = [*a, *b];
            let allowed = [
                [Keyword::Data, Keyword::Totals],
                [Keyword::Headers, Keyword::Data],
            ];
            let valid = allowed
                .iter()
                .any(|p| pair == *p || pair == [p[1], p[0]]);
            if !valid {
                return None;
            }
            let (a_start, a_end) = span(*a)?;
            let (b_start, b_end) = span(*b)?;
            Some((a_start.min(b_start), a_end.max(b_end)))
        }
        _ => None,
    }
}

fn column_index(table: &TableZone, name: &str) -> Option<u32> {
    let name = name.replace('\'', "");
    table
        .columns
        .iter()
        .position(|c| c.eq_ignore_ascii_case(name.trim()))
        .map(|i| table.range.start.col + i as u32)
}

/// Resolve `reference` (the full `Name[...]` text) against the workbook tables.
///
/// `sheet` and `cell` locate the formula; the result is sheet-qualified only when the table
/// lives on another sheet.
pub fn resolve_table_reference(
    reference: &str,
    tables: &[TableZone],
    sheet: &str,
    cell: CellRef,
) -> Option<String> {
    let open = reference.find('[')?;
    let name = reference[..open].trim();
    let body = reference[open..].strip_prefix('[')?.strip_suffix(']')?;
    let table = tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))?;
    let selection = parse_selection(body)?;

    let (first_row, last_row) = row_span(table, &selection.keywords, cell.row)?;
    let (first_col, last_col) = match selection.columns {
        None => (table.range.start.col, table.range.end.col),
        Some((a, b)) => {
            let a = column_index(table, a)?;
            let b = column_index(table, b)?;
            (a.min(b), a.max(b))
        }
    };
    let range = Range::new(
        CellRef::new(first_row, first_col),
        CellRef::new(last_row, last_col),
    )
    .to_string();
    if table.sheet == sheet {
        Some(range)
    } else {
        Some(format!("{}!{range}", quote_sheet_name(&table.sheet)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn zone() -> TableZone {
        TableZone {
            name: "Table1".into(),
            sheet: "Sheet1".into(),
            range: Range::from_xc("B2:D8").unwrap(),
            columns: vec!["Name".into(), "Rank".into(), "Score".into()],
            header_rows: 1,
            totals_rows: 1,
        }
    }

    fn resolve(reference: &str) -> Option<String> {
        resolve_table_reference(reference, &[zone()], "Sheet1", CellRef::from_xc("F5").unwrap())
    }

    #[test]
    fn header_cell_of_a_column() {
        assert_eq!(resolve("Table1[[#Headers],[Rank]]").as_deref(), Some("C2"));
    }

    #[test]
    fn keyword_pairs() {
        assert_eq!(resolve("Table1[[#Data],[#Totals],[Rank]]").as_deref(), Some("C3:C8"));
        assert_eq!(resolve("Table1[[#Headers],[#Data],[Score]]").as_deref(), Some("D2:D7"));
        assert_eq!(resolve("Table1[[#Headers],[#Totals],[Rank]]"), None);
        assert_eq!(resolve("Table1[[#All],[#Data],[#Totals]]"), None);
    }

    #[test]
    fn columns_and_whole_zones() {
        assert_eq!(resolve("Table1[Rank]").as_deref(), Some("C3:C7"));
        assert_eq!(resolve("table1[#All]").as_deref(), Some("B2:D8"));
        assert_eq!(resolve("Table1[[Name]:[Rank]]").as_deref(), Some("B3:C7"));
        assert_eq!(resolve("Table1[@Score]").as_deref(), Some("D5"));
        assert_eq!(resolve("Table1[Missing]"), None);
        assert_eq!(resolve("Other[Rank]"), None);
    }

    #[test]
    fn other_sheets_are_qualified() {
        let got = resolve_table_reference(
            "Table1[#Totals]",
            &[TableZone { sheet: "My Data".into(), ..zone() }],
            "Sheet1",
            CellRef::new(0, 0),
        );
        assert_eq!(got.as_deref(), Some("'My Data'!B8:D8"));
    }

    #[test]
    fn tables_without_totals_reject_the_totals_keyword() {
        let table = TableZone { totals_rows: 0, ..zone() };
        let got = resolve_table_reference("Table1[#Totals]", &[table], "Sheet1", CellRef::new(0, 0));
        assert_eq!(got, None);
    }
}
