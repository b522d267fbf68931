//! One worksheet record to one model sheet.

use std::collections::BTreeMap;

use tabula_formula::normalize_formula;
use tabula_model::format::datetime_to_serial;
use tabula_model::{
    is_preset_table_style, split_sheet_reference, CellData, CellRef, CellValue, HeaderData, HeaderGroup,
    HeaderGroups, Link, PaneDivisions, SheetData, Table, TableConfig, DEFAULT_TABLE_STYLE,
    SHEET_LINK_PREFIX,
};

use super::cf::convert_conditional_formats;
use super::color::convert_color;
use super::data_validation::convert_data_validations;
use super::figure::convert_figures;
use super::outline::convert_groups;
use super::{sheet_model_id, ConversionContext};
use crate::extraction::records::{
    SheetState, XlsxCell, XlsxHeader, XlsxHyperlink, XlsxPivotTable, XlsxSheet, XlsxTable,
    XlsxTableStyleInfo,
};
use crate::formula_adapter::{import_formula, offset_shared_formula, ImportFormulaContext};
use crate::warnings::WarningKind;

/// Pixels per character of column width.
pub const PX_PER_WIDTH_UNIT: f64 = 7.2;

/// Points per pixel of row height.
pub const PT_PER_PX: f64 = 0.75;

/// Serial offset between the 1904 and 1900 date systems.
const DATE1904_OFFSET: f64 = 1462.0;

pub fn width_to_px(width: f64) -> f64 {
    (width * PX_PER_WIDTH_UNIT).round()
}

pub fn px_to_width(px: f64) -> f64 {
    px / PX_PER_WIDTH_UNIT
}

pub fn points_to_px(points: f64) -> f64 {
    points / PT_PER_PX
}

pub fn px_to_points(px: f64) -> f64 {
    px * PT_PER_PX
}

pub fn convert_sheet(sheet: &XlsxSheet, ctx: &mut ConversionContext<'_>) -> SheetData {
    let mut data = SheetData::new(sheet_model_id(sheet), sheet.name.clone());
    data.col_number = sheet.col_number;
    data.row_number = sheet.row_number;
    data.is_visible = sheet.state == SheetState::Visible;
    data.are_grid_lines_visible = sheet.show_grid_lines;
    data.color = sheet
        .tab_color
        .as_ref()
        .and_then(|c| convert_color(c, ctx.style.theme));
    data.merges = sheet.merges.clone();
    data.header_groups = HeaderGroups {
        rows: convert_groups(&sheet.row_groups),
        cols: convert_groups(&sheet.col_groups),
    };
    data.cols = convert_headers(&sheet.cols, &data.header_groups.cols, width_to_px);
    data.rows = convert_headers(&sheet.rows, &data.header_groups.rows, points_to_px);
    if let Some(pane) = sheet.pane.as_ref().filter(|p| p.frozen) {
        data.pane_divisions = PaneDivisions {
            x_split: pane.x_split,
            y_split: pane.y_split,
        };
    }

    for cell in &sheet.cells {
        let converted = convert_cell(cell, sheet, ctx);
        if !converted.is_empty() {
            data.cells.insert(cell.xc.clone(), converted);
        }
    }
    for link in &sheet.hyperlinks {
        apply_hyperlink(&mut data.cells, link, ctx);
    }

    data.conditional_formats = convert_conditional_formats(&sheet.conditional_formats, &ctx.style, &mut ctx.ids);
    data.data_validation_rules = convert_data_validations(&sheet.data_validations, ctx.warnings, &mut ctx.ids);
    data.tables = sheet
        .tables
        .iter()
        .map(convert_table)
        .chain(sheet.pivots.iter().map(convert_pivot))
        .collect();
    data.figures = convert_figures(&sheet.figures, &data, ctx.style.theme, ctx.warnings, &mut ctx.ids);
    data
}

/// Headers hidden by a folded group keep their size only; folding is carried by the group.
fn convert_headers(
    headers: &[XlsxHeader],
    groups: &[HeaderGroup],
    to_px: fn(f64) -> f64,
) -> BTreeMap<u32, HeaderData> {
    let folded = |index: u32| {
        groups
            .iter()
            .any(|g| g.is_folded && (g.start..=g.end).contains(&index))
    };
    headers
        .iter()
        .filter_map(|h| {
            let data = HeaderData {
                size: h.size.map(to_px),
                is_hidden: h.hidden && !folded(h.index),
            };
            (data.size.is_some() || data.is_hidden).then_some((h.index, data))
        })
        .collect()
}

fn cell_value(cell: &XlsxCell, is_date: bool, date1904: bool) -> Option<CellValue> {
    let raw = cell.value.as_deref()?;
    Some(match cell.type_.as_str() {
        "b" => CellValue::Boolean(raw == "1" || raw.eq_ignore_ascii_case("true")),
        "s" | "str" | "inlineStr" | "e" => CellValue::Text(raw.to_string()),
        "d" => match chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
            .or_else(|_| {
                chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map(|d| d.and_hms_opt(0, 0, 0).unwrap_or_default())
            }) {
            Ok(dt) => CellValue::Number(datetime_to_serial(dt)),
            Err(_) => CellValue::Text(raw.to_string()),
        },
        _ => match raw.trim().parse::<f64>() {
            Ok(n) if is_date && date1904 => CellValue::Number(n + DATE1904_OFFSET),
            Ok(n) => CellValue::Number(n),
            Err(_) => CellValue::Text(raw.to_string()),
        },
    })
}

fn convert_cell(cell: &XlsxCell, sheet: &XlsxSheet, ctx: &mut ConversionContext<'_>) -> CellData {
    let ids = ctx.cell_style(cell.style_index);
    let value = cell_value(cell, ids.is_date, ctx.date1904);
    let formula = cell.formula.as_ref().and_then(|f| {
        let text = match (f.text.is_empty(), f.shared_index) {
            (true, Some(index)) => {
                let shared = sheet.shared_formulas.get(&index)?;
                let anchor = CellRef::from_xc(&shared.anchor).ok()?;
                let target = CellRef::from_xc(&cell.xc).ok()?;
                offset_shared_formula(&shared.text, anchor, target)
            }
            (true, None) => return None,
            (false, _) => f.text.clone(),
        };
        let formula_ctx = ImportFormulaContext {
            sheet: &sheet.name,
            cell: CellRef::from_xc(&cell.xc).unwrap_or(CellRef::new(0, 0)),
            tables: &ctx.tables,
        };
        Some(normalize_formula(&import_formula(&text, &formula_ctx), value.clone()))
    });
    CellData {
        content: match formula {
            Some(_) => None,
            None => value.map(|v| v.to_content()),
        },
        formula,
        style: ids.style,
        border: ids.border,
        format: ids.format,
    }
}

fn apply_hyperlink(cells: &mut BTreeMap<String, CellData>, link: &XlsxHyperlink, ctx: &ConversionContext<'_>) {
    let xc = link.reference.split(':').next().unwrap_or_default().to_string();
    let url = match (&link.target, &link.location) {
        (Some(target), location) => match location {
            Some(location) => format!("{target}#{location}"),
            None => target.clone(),
        },
        (None, Some(location)) => {
            let (sheet, _) = split_sheet_reference(location);
            match sheet.and_then(|name| ctx.sheet_ids.get(&name)) {
                Some(id) => format!("{SHEET_LINK_PREFIX}{id}"),
                None => {
                    ctx.warnings.generate_not_supported_warning(
                        WarningKind::BadHyperlink,
                        Some(location),
                        None,
                    );
                    return;
                }
            }
        }
        (None, None) => {
            ctx.warnings
                .generate_not_supported_warning(WarningKind::BadHyperlink, Some(&link.reference), None);
            return;
        }
    };
    let cell = cells.entry(xc).or_default();
    if cell.formula.is_some() {
        return;
    }
    let label = cell
        .content
        .clone()
        .or_else(|| link.display.clone())
        .unwrap_or_else(|| url.clone());
    cell.content = Some(Link { label, url }.to_markdown());
}

fn style_id(name: Option<&str>) -> String {
    name.filter(|n| is_preset_table_style(n))
        .unwrap_or(DEFAULT_TABLE_STYLE)
        .to_string()
}

fn convert_table(table: &XlsxTable) -> Table {
    let info = table.style_info.as_ref();
    let flag = |get: fn(&XlsxTableStyleInfo) -> Option<u8>| {
        info.and_then(get).is_some_and(|v| v != 0)
    };
    Table {
        range: table.reference.clone(),
        config: TableConfig {
            number_of_headers: table.header_rows(),
            total_row: table.totals_rows() > 0,
            banded_rows: flag(|i| i.show_row_stripes),
            banded_columns: flag(|i| i.show_column_stripes),
            first_column: flag(|i| i.show_first_column),
            last_column: flag(|i| i.show_last_column),
            has_filters: table.auto_filter.is_some(),
            style_id: style_id(info.and_then(|i| i.name.as_deref())),
        },
    }
}

/// Pivot tables are imported as their rendered zone.
fn convert_pivot(pivot: &XlsxPivotTable) -> Table {
    Table {
        range: pivot.reference.clone(),
        config: TableConfig {
            number_of_headers: pivot.first_data_row.max(1),
            total_row: pivot.row_grand_totals,
            banded_rows: pivot.show_row_stripes,
            banded_columns: pivot.show_col_stripes,
            first_column: pivot.show_first_column,
            last_column: pivot.show_last_column,
            has_filters: false,
            style_id: style_id(pivot.style_name.as_deref()),
        },
    }
}
