//! Import records: near-declarative mirrors of the OOXML fragments, alive for one import.

use std::collections::BTreeMap;

use serde::Deserialize;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct XlsxColor {
    /// `AARRGGBB` or `RRGGBB` as written in the file.
    pub rgb: Option<String>,
    pub indexed: Option<u32>,
    pub theme: Option<u32>,
    pub tint: Option<f64>,
    pub auto: bool,
}

impl XlsxColor {
    pub fn rgb(rgb: impl Into<String>) -> Self {
        Self {
            rgb: Some(rgb.into()),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Workbook
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SheetState {
    Visible,
    Hidden,
    VeryHidden,
}

#[derive(Clone, Debug, PartialEq)]
pub struct XlsxSheetEntry {
    pub name: String,
    pub sheet_id: u32,
    pub rel_id: String,
    pub state: SheetState,
    /// Resolved worksheet part.
    pub path: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct XlsxDefinedName {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct XlsxWorkbook {
    pub sheets: Vec<XlsxSheetEntry>,
    pub date1904: bool,
    pub defined_names: Vec<XlsxDefinedName>,
    /// Resolved `externalLink` parts, in `r:id` order of appearance. Index 0 is `[1]`.
    pub external_links: Vec<String>,
}

// ---------------------------------------------------------------------------
// Styles
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub struct XlsxNumFmt {
    pub id: u32,
    pub format_code: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct XlsxFont {
    pub name: Option<String>,
    /// Points.
    pub size: Option<f64>,
    pub bold: bool,
    pub italic: bool,
    pub strike: bool,
    pub underline: bool,
    pub color: Option<XlsxColor>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct XlsxFill {
    pub pattern_type: Option<String>,
    pub fg_color: Option<XlsxColor>,
    pub bg_color: Option<XlsxColor>,
    pub gradient: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct XlsxBorderSide {
    pub style: Option<String>,
    pub color: Option<XlsxColor>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct XlsxBorder {
    pub left: Option<XlsxBorderSide>,
    pub right: Option<XlsxBorderSide>,
    pub top: Option<XlsxBorderSide>,
    pub bottom: Option<XlsxBorderSide>,
    pub diagonal: Option<XlsxBorderSide>,
    pub diagonal_up: bool,
    pub diagonal_down: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct XlsxAlignment {
    pub horizontal: Option<String>,
    pub vertical: Option<String>,
    pub wrap_text: bool,
    pub shrink_to_fit: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct XlsxCellXf {
    pub num_fmt_id: u32,
    pub font_id: u32,
    pub fill_id: u32,
    pub border_id: u32,
    pub alignment: Option<XlsxAlignment>,
}

/// Differential format used by conditional formatting rules.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct XlsxDxf {
    pub font: Option<XlsxFont>,
    pub fill: Option<XlsxFill>,
    pub border: Option<XlsxBorder>,
    pub num_fmt: Option<XlsxNumFmt>,
    pub alignment: Option<XlsxAlignment>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct XlsxStyleSheet {
    pub num_fmts: Vec<XlsxNumFmt>,
    pub fonts: Vec<XlsxFont>,
    pub fills: Vec<XlsxFill>,
    pub borders: Vec<XlsxBorder>,
    pub cell_xfs: Vec<XlsxCellXf>,
    pub dxfs: Vec<XlsxDxf>,
}

impl XlsxStyleSheet {
    pub fn num_fmt(&self, id: u32) -> Option<&XlsxNumFmt> {
        self.num_fmts.iter().find(|f| f.id == id)
    }
}

// ---------------------------------------------------------------------------
// Worksheet
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub struct XlsxCellFormula {
    /// Formula text without the leading `=`. Empty for cells that only reference a shared formula.
    pub text: String,
    pub shared_index: Option<u32>,
    pub shared_ref: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct XlsxCell {
    pub xc: String,
    pub style_index: u32,
    /// `t` attribute: `n`, `s`, `str`, `inlineStr`, `b`, `e`, `d`.
    pub type_: String,
    pub value: Option<String>,
    pub formula: Option<XlsxCellFormula>,
}

/// One row or column header. Sizes are in file units (characters for columns, points for rows).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct XlsxHeader {
    /// 0-based index.
    pub index: u32,
    pub size: Option<f64>,
    pub hidden: bool,
    pub outline_level: u32,
    pub collapsed: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct XlsxHyperlink {
    pub reference: String,
    pub rel_id: Option<String>,
    /// Resolved external target of `rel_id`.
    pub target: Option<String>,
    /// In-workbook location (`Sheet2!A1`).
    pub location: Option<String>,
    pub display: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct XlsxSharedFormula {
    pub anchor: String,
    pub text: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct XlsxPane {
    /// Frozen columns (or split width for unfrozen panes).
    pub x_split: u32,
    pub y_split: u32,
    pub frozen: bool,
}

/// A run of consecutive headers sharing an outline level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XlsxOutlineGroup {
    pub start: u32,
    pub end: u32,
    pub collapsed: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct XlsxSheet {
    pub name: String,
    pub sheet_id: u32,
    pub path: String,
    pub state: SheetState,
    pub cells: Vec<XlsxCell>,
    pub cols: Vec<XlsxHeader>,
    pub rows: Vec<XlsxHeader>,
    /// Points.
    pub default_row_height: Option<f64>,
    /// Characters.
    pub default_col_width: Option<f64>,
    pub merges: Vec<String>,
    pub hyperlinks: Vec<XlsxHyperlink>,
    pub conditional_formats: Vec<XlsxConditionalFormat>,
    pub data_validations: Vec<XlsxDataValidation>,
    pub figures: Vec<XlsxFigure>,
    pub tables: Vec<XlsxTable>,
    pub pivots: Vec<XlsxPivotTable>,
    pub shared_formulas: BTreeMap<u32, XlsxSharedFormula>,
    pub tab_color: Option<XlsxColor>,
    pub summary_below: bool,
    pub summary_right: bool,
    pub show_grid_lines: bool,
    pub pane: Option<XlsxPane>,
    /// Number of columns/rows, floored at the import minimums.
    pub col_number: u32,
    pub row_number: u32,
    pub row_groups: Vec<XlsxOutlineGroup>,
    pub col_groups: Vec<XlsxOutlineGroup>,
}

// ---------------------------------------------------------------------------
// Conditional formatting
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub struct XlsxCfvo {
    /// `min`, `max`, `num`, `percent`, `percentile`, `formula`, `autoMin`, `autoMax`.
    pub type_: String,
    pub value: Option<String>,
    pub gte: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct XlsxColorScale {
    pub cfvos: Vec<XlsxCfvo>,
    pub colors: Vec<XlsxColor>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct XlsxDataBar {
    pub cfvos: Vec<XlsxCfvo>,
    pub color: Option<XlsxColor>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct XlsxCfIcon {
    /// `NoIcons` marks an empty slot.
    pub icon_set: String,
    pub icon_id: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct XlsxIconSet {
    pub icon_set: String,
    pub cfvos: Vec<XlsxCfvo>,
    pub reverse: bool,
    pub show_value: bool,
    /// Per-slot icons of a custom (x14) set, lowest slot first.
    pub custom_icons: Vec<XlsxCfIcon>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct XlsxCfRule {
    pub type_: String,
    pub priority: u32,
    pub dxf_id: Option<u32>,
    pub operator: Option<String>,
    pub text: Option<String>,
    pub formulas: Vec<String>,
    pub stop_if_true: bool,
    pub color_scale: Option<XlsxColorScale>,
    pub data_bar: Option<XlsxDataBar>,
    pub icon_set: Option<XlsxIconSet>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct XlsxConditionalFormat {
    pub sqref: Vec<String>,
    pub rules: Vec<XlsxCfRule>,
}

// ---------------------------------------------------------------------------
// Data validation
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub struct XlsxDataValidation {
    pub type_: String,
    pub operator: String,
    pub sqref: Vec<String>,
    pub formula1: Option<String>,
    pub formula2: Option<String>,
    pub error_style: String,
    pub show_error_message: bool,
    pub allow_blank: bool,
    /// OOXML `showDropDown="1"` hides the in-cell arrow.
    pub hide_dropdown: bool,
}

// ---------------------------------------------------------------------------
// Drawings, charts, images
// ---------------------------------------------------------------------------

/// Cell marker of a drawing anchor. Offsets are EMUs.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct XlsxAnchorMarker {
    pub col: u32,
    pub col_off: i64,
    pub row: u32,
    pub row_off: i64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum XlsxAnchor {
    TwoCell {
        from: XlsxAnchorMarker,
        to: XlsxAnchorMarker,
    },
    OneCell {
        from: XlsxAnchorMarker,
        /// `(cx, cy)` in EMUs.
        ext: (i64, i64),
    },
    Absolute {
        pos: (i64, i64),
        ext: (i64, i64),
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct XlsxImage {
    pub path: String,
    pub mimetype: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum XlsxFigureData {
    Chart(XlsxChart),
    Image(XlsxImage),
}

#[derive(Clone, Debug, PartialEq)]
pub struct XlsxFigure {
    pub anchor: XlsxAnchor,
    pub data: XlsxFigureData,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum XlsxChartFamilyKind {
    Bar,
    Line,
    Pie,
    Doughnut,
    Radar,
    Bubble,
    Scatter,
    Area,
    Funnel,
    Treemap,
    Sunburst,
    Waterfall,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct XlsxChartSeries {
    /// Reference of the series name cell.
    pub tx: Option<String>,
    pub cat: Option<String>,
    pub val: Option<String>,
    pub x_val: Option<String>,
    pub y_val: Option<String>,
    pub bubble_size: Option<String>,
    pub smooth: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct XlsxChartFamily {
    pub kind: XlsxChartFamilyKind,
    /// `col` or `bar`.
    pub bar_dir: Option<String>,
    /// `clustered`, `stacked`, `percentStacked`, `standard`.
    pub grouping: Option<String>,
    pub hole_size: Option<u32>,
    pub first_slice_angle: Option<u32>,
    /// `filled` for filled radar charts.
    pub radar_style: Option<String>,
    pub series: Vec<XlsxChartSeries>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct XlsxChart {
    pub title: Option<String>,
    pub background: Option<XlsxColor>,
    /// `None` when the chart has no legend.
    pub legend_position: Option<String>,
    pub families: Vec<XlsxChartFamily>,
}

// ---------------------------------------------------------------------------
// Tables, pivots, external books, theme
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename = "table")]
pub struct XlsxTable {
    #[serde(rename = "@id")]
    pub id: u32,
    #[serde(rename = "@name", default)]
    pub name: String,
    #[serde(rename = "@displayName")]
    pub display_name: String,
    #[serde(rename = "@ref")]
    pub reference: String,
    #[serde(rename = "@headerRowCount")]
    pub header_row_count: Option<u32>,
    #[serde(rename = "@totalsRowCount")]
    pub totals_row_count: Option<u32>,
    #[serde(rename = "@totalsRowShown")]
    pub totals_row_shown: Option<u8>,
    #[serde(rename = "autoFilter")]
    pub auto_filter: Option<XlsxAutoFilter>,
    #[serde(rename = "tableColumns")]
    pub table_columns: XlsxTableColumns,
    #[serde(rename = "tableStyleInfo")]
    pub style_info: Option<XlsxTableStyleInfo>,
}

impl XlsxTable {
    pub fn header_rows(&self) -> u32 {
        self.header_row_count.unwrap_or(1)
    }

    pub fn totals_rows(&self) -> u32 {
        self.totals_row_count.unwrap_or(0)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.table_columns
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .collect()
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct XlsxAutoFilter {
    #[serde(rename = "@ref")]
    pub reference: String,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct XlsxTableColumns {
    #[serde(rename = "@count")]
    pub count: Option<u32>,
    #[serde(rename = "tableColumn", default)]
    pub columns: Vec<XlsxTableColumn>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct XlsxTableColumn {
    #[serde(rename = "@id")]
    pub id: u32,
    #[serde(rename = "@name")]
    pub name: String,
    #[serde(rename = "@totalsRowFunction")]
    pub totals_row_function: Option<String>,
    #[serde(rename = "@totalsRowLabel")]
    pub totals_row_label: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct XlsxTableStyleInfo {
    #[serde(rename = "@name")]
    pub name: Option<String>,
    #[serde(rename = "@showFirstColumn")]
    pub show_first_column: Option<u8>,
    #[serde(rename = "@showLastColumn")]
    pub show_last_column: Option<u8>,
    #[serde(rename = "@showRowStripes")]
    pub show_row_stripes: Option<u8>,
    #[serde(rename = "@showColumnStripes")]
    pub show_column_stripes: Option<u8>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct XlsxPivotTable {
    pub name: String,
    /// `location@ref`.
    pub reference: String,
    pub first_header_row: u32,
    pub first_data_row: u32,
    pub first_data_col: u32,
    pub row_grand_totals: bool,
    pub col_grand_totals: bool,
    pub style_name: Option<String>,
    pub show_row_stripes: bool,
    pub show_col_stripes: bool,
    pub show_first_column: bool,
    pub show_last_column: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct XlsxExternalCell {
    pub xc: String,
    pub type_: String,
    pub value: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct XlsxExternalSheet {
    pub name: String,
    /// Cached values of the external sheet.
    pub cells: Vec<XlsxExternalCell>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct XlsxExternalBook {
    pub sheets: Vec<XlsxExternalSheet>,
}

/// The 12 scheme colors in file order (`dk1, lt1, dk2, lt2, accent1..6, hlink, folHlink`), `RRGGBB`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct XlsxTheme {
    pub colors: Vec<String>,
}
