//! Table parts (`xl/tables/table{n}.xml`).

use std::collections::HashSet;

use quick_xml::se::to_string;
use serde::Serialize;
use tabula_model::{parse_markdown_link, CellRef, Range, SheetData, Table};

use crate::xml::{NS_MAIN, XML_HEADER};
use crate::ExportError;

#[derive(Debug, Serialize)]
#[serde(rename = "table")]
struct TableXmlOut<'a> {
    #[serde(rename = "@xmlns")]
    xmlns: &'a str,
    #[serde(rename = "@id")]
    id: u32,
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@displayName")]
    display_name: String,
    #[serde(rename = "@ref")]
    reference: String,
    #[serde(rename = "@headerRowCount", skip_serializing_if = "Option::is_none")]
    header_row_count: Option<u32>,
    #[serde(rename = "@totalsRowCount", skip_serializing_if = "Option::is_none")]
    totals_row_count: Option<u32>,
    #[serde(rename = "@totalsRowShown")]
    totals_row_shown: u8,
    #[serde(rename = "autoFilter", skip_serializing_if = "Option::is_none")]
    auto_filter: Option<AutoFilterXmlOut>,
    #[serde(rename = "tableColumns")]
    table_columns: TableColumnsXmlOut,
    #[serde(rename = "tableStyleInfo")]
    style_info: TableStyleInfoXmlOut<'a>,
}

#[derive(Debug, Serialize)]
struct AutoFilterXmlOut {
    #[serde(rename = "@ref")]
    reference: String,
}

#[derive(Debug, Serialize)]
struct TableColumnsXmlOut {
    #[serde(rename = "@count")]
    count: u32,
    #[serde(rename = "tableColumn")]
    columns: Vec<TableColumnXmlOut>,
}

#[derive(Debug, Serialize)]
struct TableColumnXmlOut {
    #[serde(rename = "@id")]
    id: u32,
    #[serde(rename = "@name")]
    name: String,
}

#[derive(Debug, Serialize)]
struct TableStyleInfoXmlOut<'a> {
    #[serde(rename = "@name")]
    name: &'a str,
    #[serde(rename = "@showFirstColumn")]
    show_first_column: u8,
    #[serde(rename = "@showLastColumn")]
    show_last_column: u8,
    #[serde(rename = "@showRowStripes")]
    show_row_stripes: u8,
    #[serde(rename = "@showColumnStripes")]
    show_column_stripes: u8,
}

/// Unique, non-empty column names taken from the first header row.
fn column_names(sheet: &SheetData, range: &Range, has_header: bool) -> Vec<String> {
    let mut seen = HashSet::new();
    (range.start.col..=range.end.col)
        .enumerate()
        .map(|(index, col)| {
            let header = has_header
                .then(|| sheet.cell(&CellRef::new(range.start.row, col).to_xc()))
                .flatten()
                .and_then(|cell| {
                    if let Some(content) = &cell.content {
                        return Some(parse_markdown_link(content).map_or_else(|| content.clone(), |l| l.label));
                    }
                    cell.formula.as_ref()?.value.as_ref().map(|v| v.to_content())
                })
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| format!("Column{}", index + 1));
            let mut name = header.clone();
            let mut suffix = 2;
            while !seen.insert(name.to_lowercase()) {
                name = format!("{header}{suffix}");
                suffix += 1;
            }
            name
        })
        .collect()
}

/// XML of the `id`-th table part of the workbook.
pub fn table_xml(sheet: &SheetData, table: &Table, id: u32) -> Result<String, ExportError> {
    let range = Range::from_xc(&table.range).map_err(|_| ExportError::InvalidReference(table.range.clone()))?;
    let config = &table.config;
    let headers = config.number_of_headers.min(range.height());
    let totals = u32::from(config.total_row && range.height() > headers);

    let auto_filter = (config.has_filters && headers > 0).then(|| {
        let end = CellRef::new(range.end.row - totals, range.end.col);
        AutoFilterXmlOut {
            reference: Range::new(range.start, end).to_string(),
        }
    });
    let name = format!("Table{id}");
    let columns: Vec<TableColumnXmlOut> = column_names(sheet, &range, headers > 0)
        .into_iter()
        .enumerate()
        .map(|(index, name)| TableColumnXmlOut { id: index as u32 + 1, name })
        .collect();

    let xml = TableXmlOut {
        xmlns: NS_MAIN,
        id,
        display_name: name.clone(),
        name,
        reference: range.to_string(),
        header_row_count: (headers != 1).then_some(headers),
        totals_row_count: (totals > 0).then_some(totals),
        totals_row_shown: 0,
        auto_filter,
        table_columns: TableColumnsXmlOut {
            count: columns.len() as u32,
            columns,
        },
        style_info: TableStyleInfoXmlOut {
            name: &config.style_id,
            show_first_column: u8::from(config.first_column),
            show_last_column: u8::from(config.last_column),
            show_row_stripes: u8::from(config.banded_rows),
            show_column_stripes: u8::from(config.banded_columns),
        },
    };
    let body = to_string(&xml).map_err(|e| ExportError::Serialize {
        part: format!("xl/tables/table{id}.xml"),
        message: e.to_string(),
    })?;
    Ok(format!("{XML_HEADER}\n{body}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::table::extract_table;
    use crate::{XlsxFiles, XlsxPart};
    use pretty_assertions::assert_eq;
    use tabula_model::{CellData, TableConfig};

    fn text(content: &str) -> CellData {
        CellData { content: Some(content.into()), ..Default::default() }
    }

    #[test]
    fn table_part_reimports_with_its_config() {
        let mut sheet = SheetData::new("1", "Sheet1");
        sheet.cells.insert("A1".into(), text("Name"));
        sheet.cells.insert("B1".into(), text("name"));
        let table = Table {
            range: "A1:C6".into(),
            config: TableConfig { total_row: true, first_column: true, ..Default::default() },
        };
        let xml = table_xml(&sheet, &table, 3).unwrap();

        let mut files = XlsxFiles::new();
        files.insert("xl/tables/table3.xml".into(), XlsxPart::Xml(xml));
        let parsed = extract_table(&files, "xl/tables/table3.xml").unwrap();
        assert_eq!(parsed.display_name, "Table3");
        assert_eq!(parsed.reference, "A1:C6");
        assert_eq!(parsed.header_rows(), 1);
        assert_eq!(parsed.totals_rows(), 1);
        assert_eq!(parsed.auto_filter.as_ref().map(|f| f.reference.as_str()), Some("A1:C5"));
        assert_eq!(parsed.column_names(), vec!["Name", "name2", "Column3"]);
        let style = parsed.style_info.unwrap();
        assert_eq!(style.name.as_deref(), Some("TableStyleMedium2"));
        assert_eq!(style.show_first_column, Some(1));
        assert_eq!(style.show_column_stripes, Some(0));
    }

    #[test]
    fn headerless_tables_have_no_filter() {
        let sheet = SheetData::new("1", "Sheet1");
        let table = Table {
            range: "B2:C4".into(),
            config: TableConfig { number_of_headers: 0, ..Default::default() },
        };
        let xml = table_xml(&sheet, &table, 1).unwrap();
        assert!(xml.contains(r#"headerRowCount="0""#));
        assert!(!xml.contains("autoFilter"));
    }

    #[test]
    fn bad_ranges_are_reported() {
        let sheet = SheetData::new("1", "Sheet1");
        let table = Table { range: "nope".into(), config: TableConfig::default() };
        assert!(matches!(table_xml(&sheet, &table, 1), Err(ExportError::InvalidReference(r)) if r == "nope"));
    }
}
