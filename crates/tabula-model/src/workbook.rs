use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::charts::ChartDefinition;
use crate::{
    CellData, CellRef, ConditionalFormat, DataValidationRule, Figure, FigureData, Style, Table,
};
use crate::style::Border;

/// Current serialization schema version.
pub const CURRENT_VERSION: u32 = 1;

pub const START_REVISION: &str = "START_REVISION";

/// Default column width, in pixels.
pub const DEFAULT_CELL_WIDTH: f64 = 96.0;

/// Default row height, in pixels.
pub const DEFAULT_CELL_HEIGHT: f64 = 23.0;

#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderData {
    /// Size in pixels, when different from the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_hidden: bool,
}

/// A collapsible run of consecutive rows or columns (0-indexed, inclusive).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderGroup {
    pub start: u32,
    pub end: u32,
    #[serde(default)]
    pub is_folded: bool,
}

impl HeaderGroup {
    pub fn contains(&self, index: u32) -> bool {
        index >= self.start && index <= self.end
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderGroups {
    #[serde(default)]
    pub rows: Vec<HeaderGroup>,
    #[serde(default)]
    pub cols: Vec<HeaderGroup>,
}

/// Frozen panes: number of frozen columns (`x_split`) and rows (`y_split`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaneDivisions {
    #[serde(default)]
    pub x_split: u32,
    #[serde(default)]
    pub y_split: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetData {
    pub id: String,
    pub name: String,
    pub col_number: u32,
    pub row_number: u32,
    #[serde(default)]
    pub cells: BTreeMap<String, CellData>,
    #[serde(default)]
    pub merges: Vec<String>,
    #[serde(default)]
    pub conditional_formats: Vec<ConditionalFormat>,
    #[serde(default)]
    pub data_validation_rules: Vec<DataValidationRule>,
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub figures: Vec<Figure<FigureData>>,
    #[serde(default)]
    pub rows: BTreeMap<u32, HeaderData>,
    #[serde(default)]
    pub cols: BTreeMap<u32, HeaderData>,
    #[serde(default)]
    pub header_groups: HeaderGroups,
    #[serde(default)]
    pub pane_divisions: PaneDivisions,
    #[serde(default = "default_true")]
    pub is_visible: bool,
    #[serde(default = "default_true")]
    pub are_grid_lines_visible: bool,
    /// Tab color (`#RRGGBB`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl SheetData {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            col_number: 26,
            row_number: 100,
            cells: BTreeMap::new(),
            merges: Vec::new(),
            conditional_formats: Vec::new(),
            data_validation_rules: Vec::new(),
            tables: Vec::new(),
            figures: Vec::new(),
            rows: BTreeMap::new(),
            cols: BTreeMap::new(),
            header_groups: HeaderGroups::default(),
            pane_divisions: PaneDivisions::default(),
            is_visible: true,
            are_grid_lines_visible: true,
            color: None,
        }
    }

    pub fn cell(&self, xc: &str) -> Option<&CellData> {
        self.cells.get(xc)
    }

    /// Cells sorted in row-major order. Cells with an unparsable key are skipped.
    pub fn cells_row_major(&self) -> Vec<(CellRef, &CellData)> {
        let mut cells: Vec<(CellRef, &CellData)> = self
            .cells
            .iter()
            .filter_map(|(xc, cell)| CellRef::from_xc(xc).ok().map(|r| (r, cell)))
            .collect();
        cells.sort_by_key(|(r, _)| (r.row, r.col));
        cells
    }

    pub fn col_size(&self, col: u32) -> f64 {
        self.cols
            .get(&col)
            .and_then(|h| h.size)
            .unwrap_or(DEFAULT_CELL_WIDTH)
    }

    pub fn row_size(&self, row: u32) -> f64 {
        self.rows
            .get(&row)
            .and_then(|h| h.size)
            .unwrap_or(DEFAULT_CELL_HEIGHT)
    }

    pub fn charts(&self) -> impl Iterator<Item = (&Figure<FigureData>, &ChartDefinition)> {
        self.figures.iter().filter_map(|f| match &f.data {
            FigureData::Chart(chart) => Some((f, chart)),
            FigureData::Image(_) => None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkbookData {
    pub version: u32,
    pub sheets: Vec<SheetData>,
    #[serde(default)]
    pub styles: BTreeMap<u32, Style>,
    #[serde(default)]
    pub borders: BTreeMap<u32, Border>,
    #[serde(default)]
    pub formats: BTreeMap<u32, String>,
    pub revision_id: String,
}

impl Default for WorkbookData {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            sheets: Vec::new(),
            styles: BTreeMap::new(),
            borders: BTreeMap::new(),
            formats: BTreeMap::new(),
            revision_id: START_REVISION.to_string(),
        }
    }
}

/// A reference from a cell to a dictionary entry that does not exist.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DanglingReference {
    pub sheet: String,
    pub xc: String,
    pub kind: &'static str,
    pub id: u32,
}

impl WorkbookData {
    pub fn sheet_by_name(&self, name: &str) -> Option<&SheetData> {
        self.sheets
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    pub fn sheet_by_id(&self, id: &str) -> Option<&SheetData> {
        self.sheets.iter().find(|s| s.id == id)
    }

    /// Every style/border/format id referenced by a cell that is missing from its dictionary.
    pub fn dangling_references(&self) -> Vec<DanglingReference> {
        let mut out = Vec::new();
        for sheet in &self.sheets {
            for (xc, cell) in &sheet.cells {
                let checks = [
                    ("style", cell.style, self.styles.contains_key(&cell.style.unwrap_or(0))),
                    ("border", cell.border, self.borders.contains_key(&cell.border.unwrap_or(0))),
                    ("format", cell.format, self.formats.contains_key(&cell.format.unwrap_or(0))),
                ];
                for (kind, id, present) in checks {
                    if let Some(id) = id {
                        if !present {
                            out.push(DanglingReference {
                                sheet: sheet.name.clone(),
                                xc: xc.clone(),
                                kind,
                                id,
                            });
                        }
                    }
                }
            }
        }
        out
    }
}

fn default_true() -> bool {
    true
}

fn is_false(b: &bool) -> bool {
    !*b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells_sorted_row_major() {
        let mut sheet = SheetData::new("s1", "Sheet1");
        for xc in ["B1", "A2", "A1", "AA1"] {
            sheet.cells.insert(xc.to_string(), CellData::default());
        }
        let order: Vec<String> = sheet
            .cells_row_major()
            .into_iter()
            .map(|(r, _)| r.to_xc())
            .collect();
        assert_eq!(order, vec!["A1", "B1", "AA1", "A2"]);
    }

    #[test]
    fn dangling_ids_are_reported() {
        let mut data = WorkbookData::default();
        let mut sheet = SheetData::new("s1", "Sheet1");
        sheet.cells.insert(
            "A1".to_string(),
            CellData {
                style: Some(3),
                ..Default::default()
            },
        );
        data.sheets.push(sheet);
        let dangling = data.dangling_references();
        assert_eq!(dangling.len(), 1);
        assert_eq!(dangling[0].kind, "style");

        data.styles.insert(3, Style::default());
        assert!(data.dangling_references().is_empty());
    }
}
