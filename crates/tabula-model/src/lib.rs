//! Normalized in-memory workbook model.
//!
//! This crate holds the data structures the XLSX engine imports into and exports from:
//! [`WorkbookData`] and its sheets, cells, shared style dictionaries, conditional formats,
//! data validation rules, tables and figures. It also provides A1 addressing helpers and the
//! host number-format language ([`format`]).

mod address;
mod cell;
pub mod charts;
mod conditional_formatting;
mod data_validation;
mod figure;
pub mod format;
mod interner;
mod style;
mod table;
mod workbook;

pub use address::{
    col_to_letters, letters_to_col, parse_xc_with_flags, quote_sheet_name,
    split_sheet_reference, unquote_sheet_name, A1ParseError, CellRef, FlaggedCellRef, Range,
    RangeParseError, MAX_COLS, MAX_ROWS,
};
pub use cell::{
    format_number_literal, parse_markdown_link, CellData, CellValue, Link, NormalizedFormula,
    SHEET_LINK_PREFIX,
};
pub use conditional_formatting::{
    icons, CellIsOperator, CellIsRule, CfRule, CfStyle, ColorScaleRule, ColorScaleThreshold,
    ConditionalFormat, DataBarRule, IconSetIcons, IconSetRule, IconThreshold,
    InflectionOperator, ThresholdType,
};
pub use data_validation::{
    ComparisonOperator, DataValidationCriterion, DataValidationRule, ListDisplayStyle,
};
pub use figure::{
    extension_from_mimetype, mimetype_from_path, Figure, FigureData, FigureSize, ImageData,
    CHART_TAG, IMAGE_TAG,
};
pub use format::FormatError;
pub use interner::Interner;
pub use style::{
    normalize_color, Align, Border, BorderDescr, BorderStyle, Style, VerticalAlign, Wrapping,
};
pub use table::{is_preset_table_style, Table, TableConfig, DEFAULT_TABLE_STYLE};
pub use workbook::{
    DanglingReference, HeaderData, HeaderGroup, HeaderGroups, PaneDivisions, SheetData,
    WorkbookData, CURRENT_VERSION, DEFAULT_CELL_HEIGHT, DEFAULT_CELL_WIDTH, START_REVISION,
};
