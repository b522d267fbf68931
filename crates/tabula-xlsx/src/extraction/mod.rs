//! Reading side: typed import records from the raw package parts.

pub mod cf;
pub mod chart;
pub mod drawing;
pub mod external_book;
pub mod kernel;
pub mod pivot;
pub mod records;
pub mod shared_strings;
pub mod sheet;
pub mod style;
pub mod table;
pub mod theme;
pub mod workbook;

use self::kernel::Relationships;
use self::records::{XlsxExternalBook, XlsxSheet, XlsxStyleSheet, XlsxTheme, XlsxWorkbook};
use crate::warnings::WarningManager;
use crate::{ImportError, ImportOptions, XlsxFiles};

/// Every record of one package.
#[derive(Clone, Debug)]
pub struct XlsxPackage {
    pub workbook: XlsxWorkbook,
    pub sheets: Vec<XlsxSheet>,
    pub styles: XlsxStyleSheet,
    pub theme: XlsxTheme,
    /// Indexed like [`XlsxWorkbook::external_links`]; books that failed to parse are empty.
    pub external_books: Vec<XlsxExternalBook>,
}

/// Extract the whole package.
///
/// Failures in the workbook part abort the import. A worksheet, drawing, table or external
/// book that fails is skipped with a parsing warning.
pub fn extract_package(
    files: &XlsxFiles,
    options: &ImportOptions,
    warnings: &WarningManager,
) -> Result<XlsxPackage, ImportError> {
    let workbook_path = workbook::workbook_part(files)?;
    let workbook = workbook::extract_workbook(files, &workbook_path, warnings)?;
    let rels = Relationships::for_part(files, &workbook_path)?;

    let styles = match rels.first_of_kind("styles") {
        Some(rel) => style::extract_styles(files, &rel.target, warnings)?,
        None => XlsxStyleSheet::default(),
    };
    let theme = match rels.first_of_kind("theme") {
        Some(rel) => theme::extract_theme(files, &rel.target, warnings)?,
        None => theme::default_theme(),
    };
    let shared_strings = match rels.first_of_kind("sharedStrings") {
        Some(rel) => shared_strings::extract_shared_strings(files, &rel.target, warnings)?,
        None => Vec::new(),
    };

    let mut sheets = Vec::with_capacity(workbook.sheets.len());
    for entry in &workbook.sheets {
        match sheet::extract_sheet(files, entry, &shared_strings, options, warnings) {
            Ok(sheet) => sheets.push(sheet),
            Err(err) => warnings.add_parsing_warning(format!(
                "Skipping sheet \"{}\" ({}): {err}",
                entry.name, entry.path
            )),
        }
    }

    let external_books = workbook
        .external_links
        .iter()
        .map(|path| {
            external_book::extract_external_book(files, path, warnings).unwrap_or_else(|err| {
                warnings.add_parsing_warning(format!("Skipping <externalLink> {path}: {err}"));
                XlsxExternalBook::default()
            })
        })
        .collect();

    Ok(XlsxPackage {
        workbook,
        sheets,
        styles,
        theme,
        external_books,
    })
}
