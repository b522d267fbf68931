//! XLSX interchange for the Tabula workbook model.
//!
//! A package is handled as a map of part names to [`XlsxPart`]s; zipping the container is left
//! to the caller. The crate is split the way data flows through it:
//!
//! - [`extraction`]: namespace-agnostic XML extraction of the package parts into typed
//!   records (`Xlsx*`).
//! - [`conversion`]: pure mappings between those records and [`tabula_model`] types,
//!   including the helpers the export side reuses.
//! - [`export`]: one [`export::ExportSession`] walks a [`WorkbookData`] and emits every part,
//!   interning styles, strings, relationships and figure numbers along the way.
//! - [`formula_adapter`]: Excel-specific formula rewriting in both directions.
//! - [`warnings`]: the deduplicated "not yet supported" messages of a session.
//!
//! [`import_xlsx`] and [`export_xlsx`] are the only entry points most callers need.

pub mod conversion;
mod error;
pub mod export;
pub mod extraction;
pub mod formula_adapter;
mod path;
pub mod warnings;
mod xml;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tabula_model::WorkbookData;

pub use error::{ExportError, ImportError};

use crate::warnings::WarningManager;

/// Package parts keyed by part name (`xl/worksheets/sheet1.xml`, no leading `/`).
pub type XlsxFiles = BTreeMap<String, XlsxPart>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum XlsxPart {
    Xml(String),
    /// Media part whose bytes live at `source` (the image path of the model).
    Image { source: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportOptions {
    /// Floor of the imported column count of every sheet.
    pub min_cols: u32,
    /// Floor of the imported row count of every sheet.
    pub min_rows: u32,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            min_cols: 30,
            min_rows: 100,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportOptions {
    /// Font of `styles.xml` font 0, used by cells without an explicit style.
    pub default_font: String,
    /// Size in points of the default font.
    pub default_font_size: f64,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            default_font: "Arial".to_string(),
            default_font_size: 10.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImportResult {
    pub data: WorkbookData,
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExportResult {
    pub files: XlsxFiles,
    pub warnings: Vec<String>,
}

/// Import a package into a workbook.
///
/// Only a missing or malformed workbook part is an error. Other parts that fail to parse are
/// skipped and reported in [`ImportResult::warnings`] together with the unsupported features
/// met during conversion.
pub fn import_xlsx(files: &XlsxFiles, options: &ImportOptions) -> Result<ImportResult, ImportError> {
    let warnings = WarningManager::new();
    let package = extraction::extract_package(files, options, &warnings)?;
    let data = conversion::convert_package(&package, options, &warnings);
    Ok(ImportResult {
        data,
        warnings: warnings.warnings(),
    })
}

/// Export a workbook into a package.
///
/// Fails when a cell references a style, border or format id missing from the workbook
/// dictionaries, or when a table range is not a valid A1 range.
pub fn export_xlsx(data: &WorkbookData, options: &ExportOptions) -> Result<ExportResult, ExportError> {
    export::export_workbook(data, options)
}
