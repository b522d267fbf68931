//! Pure mappings between import records and the workbook model.

pub mod cf;
pub mod color;
pub mod data_validation;
pub mod figure;
pub mod format;
pub mod outline;
pub mod sheet;
pub mod style;
pub mod table_ref;

use std::collections::{BTreeMap, HashMap};

use tabula_model::format::parse_format;
use tabula_model::{Border, CellData, CellRef, CellValue, Interner, Range, SheetData, Style, WorkbookData};

use self::style::StyleContext;
use self::table_ref::TableZone;
use crate::extraction::records::{XlsxExternalBook, XlsxSheet};
use crate::extraction::XlsxPackage;
use crate::formula_adapter::external_sheet_name;
use crate::warnings::{WarningKind, WarningManager};
use crate::ImportOptions;

/// Sequential ids for conditional formats, validation rules and figures of one import.
#[derive(Debug, Default)]
pub struct IdSequence {
    last: u64,
}

impl IdSequence {
    pub fn next_id(&mut self) -> String {
        self.last += 1;
        self.last.to_string()
    }
}

/// Dictionary ids of one `cellXfs` entry.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CellStyleIds {
    pub style: Option<u32>,
    pub border: Option<u32>,
    pub format: Option<u32>,
    pub is_date: bool,
}

/// State shared by every sheet conversion of one import.
pub struct ConversionContext<'a> {
    pub style: StyleContext<'a>,
    pub warnings: &'a WarningManager,
    pub tables: Vec<TableZone>,
    /// Sheet name to model sheet id.
    pub sheet_ids: BTreeMap<String, String>,
    pub ids: IdSequence,
    pub date1904: bool,
    styles: Interner<Style>,
    borders: Interner<Border>,
    formats: Interner<String>,
    xf_cache: HashMap<u32, CellStyleIds>,
}

impl<'a> ConversionContext<'a> {
    pub fn new(package: &'a XlsxPackage, warnings: &'a WarningManager) -> Self {
        Self {
            style: StyleContext {
                styles: &package.styles,
                theme: &package.theme,
                warnings,
            },
            warnings,
            tables: table_zones(&package.sheets),
            sheet_ids: package
                .sheets
                .iter()
                .map(|s| (s.name.clone(), sheet_model_id(s)))
                .collect(),
            ids: IdSequence::default(),
            date1904: package.workbook.date1904,
            styles: Interner::new(),
            borders: Interner::new(),
            formats: Interner::new(),
            xf_cache: HashMap::new(),
        }
    }

    /// Interned style, border and format ids of cell format `index`.
    pub fn cell_style(&mut self, index: u32) -> CellStyleIds {
        if let Some(ids) = self.xf_cache.get(&index) {
            return *ids;
        }
        let styles = self.style.styles;
        let ids = match styles.cell_xfs.get(index as usize) {
            Some(xf) => {
                let style = self.style.convert_style(xf);
                let border = styles
                    .borders
                    .get(xf.border_id as usize)
                    .map(|b| self.style.convert_border(b))
                    .unwrap_or_default();
                let format = self.style.convert_format(xf);
                let is_date = format
                    .as_deref()
                    .and_then(|f| parse_format(f).ok())
                    .is_some_and(|f| f.is_date());
                CellStyleIds {
                    style: (style != Style::default()).then(|| self.styles.intern(style)),
                    border: (border != Border::default()).then(|| self.borders.intern(border)),
                    format: format.map(|f| self.formats.intern(f)),
                    is_date,
                }
            }
            None => CellStyleIds::default(),
        };
        self.xf_cache.insert(index, ids);
        ids
    }
}

pub fn sheet_model_id(sheet: &XlsxSheet) -> String {
    sheet.sheet_id.to_string()
}

fn table_zones(sheets: &[XlsxSheet]) -> Vec<TableZone> {
    sheets
        .iter()
        .flat_map(|sheet| {
            sheet.tables.iter().filter_map(move |table| {
                let range = Range::from_xc(&table.reference).ok()?;
                Some(TableZone {
                    name: table.display_name.clone(),
                    sheet: sheet.name.clone(),
                    range,
                    columns: table.column_names().into_iter().map(str::to_string).collect(),
                    header_rows: table.header_rows(),
                    totals_rows: table.totals_rows(),
                })
            })
        })
        .collect()
}

/// Fold every record of a package into one workbook.
pub fn convert_package(
    package: &XlsxPackage,
    options: &ImportOptions,
    warnings: &WarningManager,
) -> WorkbookData {
    if !package.workbook.defined_names.is_empty() {
        warnings.generate_not_supported_warning(WarningKind::DefinedNames, None, None);
    }
    let mut ctx = ConversionContext::new(package, warnings);
    let mut sheets: Vec<SheetData> = package
        .sheets
        .iter()
        .map(|sheet| sheet::convert_sheet(sheet, &mut ctx))
        .collect();
    for (index, book) in package.external_books.iter().enumerate() {
        sheets.extend(convert_external_book(book, index + 1, options));
    }
    if !package.external_books.is_empty() {
        warnings.generate_not_supported_warning(WarningKind::ExternalReference, None, None);
    }
    log::debug!(
        "converted {} sheets ({} styles, {} borders, {} formats)",
        sheets.len(),
        ctx.styles.len(),
        ctx.borders.len(),
        ctx.formats.len()
    );
    WorkbookData {
        sheets,
        styles: ctx.styles.into_map(),
        borders: ctx.borders.into_map(),
        formats: ctx.formats.into_map(),
        ..WorkbookData::default()
    }
}

/// Cached values of an external book as hidden sheets, so rewritten references keep resolving.
fn convert_external_book(book: &XlsxExternalBook, index: usize, options: &ImportOptions) -> Vec<SheetData> {
    book.sheets
        .iter()
        .enumerate()
        .map(|(position, external)| {
            let mut sheet = SheetData::new(
                format!("external-{index}-{}", position + 1),
                external_sheet_name(&external.name, index),
            );
            sheet.is_visible = false;
            let (mut cols, mut rows) = (options.min_cols, options.min_rows);
            for cell in &external.cells {
                let value = match cell.type_.as_str() {
                    "b" => CellValue::Boolean(cell.value == "1"),
                    "s" | "str" | "e" => CellValue::Text(cell.value.clone()),
                    _ => match cell.value.parse::<f64>() {
                        Ok(n) => CellValue::Number(n),
                        Err(_) => CellValue::Text(cell.value.clone()),
                    },
                };
                if let Ok(position) = CellRef::from_xc(&cell.xc) {
                    cols = cols.max(position.col + 1);
                    rows = rows.max(position.row + 1);
                }
                sheet.cells.insert(
                    cell.xc.clone(),
                    CellData {
                        content: Some(value.to_content()),
                        ..Default::default()
                    },
                );
            }
            sheet.col_number = cols;
            sheet.row_number = rows;
            sheet
        })
        .collect()
}
