use std::collections::BTreeMap;

use roxmltree::Node;
use tabula_model::{CellRef, Range, MAX_COLS};

use super::cf::{extract_conditional_formats, split_sqref};
use super::drawing::extract_drawing;
use super::kernel::{node_text, Extractor, Relationships, XmlFile};
use super::pivot::extract_pivot_table;
use super::records::{
    XlsxCell, XlsxCellFormula, XlsxDataValidation, XlsxHeader, XlsxHyperlink, XlsxPane,
    XlsxSharedFormula, XlsxSheet, XlsxSheetEntry,
};
use super::shared_strings::string_item_text;
use super::style::extract_color;
use super::table::extract_table;
use crate::conversion::outline::groups_from_headers;
use crate::warnings::WarningManager;
use crate::{ImportError, ImportOptions, XlsxFiles};

/// Extract one worksheet together with the drawings, tables and pivot tables it references.
pub fn extract_sheet(
    files: &XlsxFiles,
    entry: &XlsxSheetEntry,
    shared_strings: &[String],
    options: &ImportOptions,
    warnings: &WarningManager,
) -> Result<XlsxSheet, ImportError> {
    let path = entry.path.as_str();
    let file = XmlFile::open(files, path)?;
    let ex = Extractor::new(&file.path, warnings);
    let rels = Relationships::for_part(files, path)?;
    let root = file.root();

    let sheet_pr = ex.child(root, "sheetPr");
    let outline_pr = sheet_pr.and_then(|pr| ex.child(pr, "outlinePr"));
    let summary_below = outline_pr.map_or(true, |o| ex.attr_or(o, "summaryBelow", true));
    let summary_right = outline_pr.map_or(true, |o| ex.attr_or(o, "summaryRight", true));

    let sheet_view = ex
        .child(root, "sheetViews")
        .and_then(|views| ex.child(views, "sheetView"));
    let format_pr = ex.child(root, "sheetFormatPr");

    let cols = extract_cols(&ex, root);
    let (rows, cells, shared_formulas) = extract_sheet_data(&ex, root, shared_strings)?;
    let merges: Vec<String> = ex
        .child(root, "mergeCells")
        .map(|m| {
            ex.children(m, "mergeCell")
                .into_iter()
                .filter_map(|c| ex.opt_attr(c, "ref"))
                .collect()
        })
        .unwrap_or_default();

    let (col_number, row_number) = dimensions(&cells, &merges, options);

    let mut sheet = XlsxSheet {
        name: entry.name.clone(),
        sheet_id: entry.sheet_id,
        path: path.to_string(),
        state: entry.state.clone(),
        row_groups: groups_from_headers(&rows, summary_below),
        col_groups: groups_from_headers(&cols, summary_right),
        cells,
        cols,
        rows,
        default_row_height: format_pr.and_then(|f| ex.opt_attr(f, "defaultRowHeight")),
        default_col_width: format_pr.and_then(|f| ex.opt_attr(f, "defaultColWidth")),
        merges,
        hyperlinks: extract_hyperlinks(&ex, root, &rels),
        conditional_formats: extract_conditional_formats(&ex, root),
        data_validations: extract_data_validations(&ex, root),
        figures: Vec::new(),
        tables: Vec::new(),
        pivots: Vec::new(),
        shared_formulas,
        tab_color: sheet_pr
            .and_then(|pr| ex.child(pr, "tabColor"))
            .map(|c| extract_color(&ex, c)),
        summary_below,
        summary_right,
        show_grid_lines: sheet_view.map_or(true, |v| ex.attr_or(v, "showGridLines", true)),
        pane: sheet_view
            .and_then(|v| ex.child(v, "pane"))
            .map(|pane| XlsxPane {
                x_split: ex.attr_or(pane, "xSplit", 0.0f64).max(0.0) as u32,
                y_split: ex.attr_or(pane, "ySplit", 0.0f64).max(0.0) as u32,
                frozen: ex
                    .attr_or(pane, "state", String::new())
                    .starts_with("frozen"),
            }),
        col_number,
        row_number,
    };

    if let Some(drawing) = ex.child(root, "drawing") {
        let target = ex
            .opt_attr::<String>(drawing, "r:id")
            .and_then(|id| rels.get(&id));
        if let Some(rel) = target {
            match extract_drawing(files, &rel.target, warnings) {
                Ok(figures) => sheet.figures = figures,
                Err(err) => skip(warnings, "drawing", path, &err),
            }
        }
    }

    if let Some(parts) = ex.child(root, "tableParts") {
        for part in ex.children(parts, "tablePart") {
            let Some(rel) = ex.opt_attr::<String>(part, "r:id").and_then(|id| rels.get(&id)) else {
                continue;
            };
            match extract_table(files, &rel.target) {
                Ok(table) => sheet.tables.push(table),
                Err(err) => skip(warnings, "tablePart", path, &err),
            }
        }
    }

    for rel in rels.of_kind("pivotTable") {
        match extract_pivot_table(files, &rel.target, warnings) {
            Ok(pivot) => sheet.pivots.push(pivot),
            Err(err) => skip(warnings, "pivotTableDefinition", path, &err),
        }
    }

    Ok(sheet)
}

fn skip(warnings: &WarningManager, tag: &str, part: &str, err: &ImportError) {
    warnings.add_parsing_warning(format!("Skipping <{tag}> of {part}: {err}"));
}

fn extract_cols(ex: &Extractor<'_>, root: Node<'_, '_>) -> Vec<XlsxHeader> {
    let Some(cols) = ex.child(root, "cols") else {
        return Vec::new();
    };
    let mut headers = Vec::new();
    for col in ex.children(cols, "col") {
        let min: u32 = ex.attr_or(col, "min", 1u32).max(1);
        let max: u32 = ex.attr_or(col, "max", min).min(MAX_COLS);
        let size: Option<f64> = ex.opt_attr(col, "width");
        let hidden = ex.attr_or(col, "hidden", false);
        let outline_level = ex.attr_or(col, "outlineLevel", 0);
        let collapsed = ex.attr_or(col, "collapsed", false);
        if size.is_none() && !hidden && outline_level == 0 && !collapsed {
            continue;
        }
        headers.extend((min..=max).map(|c| XlsxHeader {
            index: c - 1,
            size,
            hidden,
            outline_level,
            collapsed,
        }));
    }
    headers
}

type SheetDataParts = (Vec<XlsxHeader>, Vec<XlsxCell>, BTreeMap<u32, XlsxSharedFormula>);

fn extract_sheet_data(
    ex: &Extractor<'_>,
    root: Node<'_, '_>,
    shared_strings: &[String],
) -> Result<SheetDataParts, ImportError> {
    let mut rows = Vec::new();
    let mut cells = Vec::new();
    let mut shared_formulas = BTreeMap::new();
    let Some(data) = ex.child(root, "sheetData") else {
        return Ok((rows, cells, shared_formulas));
    };

    let mut next_row = 0u32;
    for row in ex.children(data, "row") {
        let row_index = ex
            .opt_attr::<u32>(row, "r")
            .and_then(|r| r.checked_sub(1))
            .unwrap_or(next_row);
        next_row = row_index + 1;

        let size: Option<f64> = ex.opt_attr(row, "ht");
        let header = XlsxHeader {
            index: row_index,
            size: size.filter(|_| ex.attr_or(row, "customHeight", size.is_some())),
            hidden: ex.attr_or(row, "hidden", false),
            outline_level: ex.attr_or(row, "outlineLevel", 0),
            collapsed: ex.attr_or(row, "collapsed", false),
        };
        if header.size.is_some() || header.hidden || header.outline_level > 0 || header.collapsed {
            rows.push(header);
        }

        let mut next_col = 0u32;
        for c in ex.children(row, "c") {
            let cell_ref = match ex.opt_attr::<String>(c, "r") {
                Some(xc) => CellRef::from_xc(&xc).map_err(|_| ImportError::InvalidReference {
                    part: ex.part().to_string(),
                    reference: xc.clone(),
                })?,
                None => CellRef::new(row_index, next_col),
            };
            next_col = cell_ref.col + 1;
            let xc = cell_ref.to_xc();

            let type_ = ex.attr_or(c, "t", "n".to_string());
            let value = match type_.as_str() {
                "inlineStr" => ex.child(c, "is").map(|is| string_item_text(ex, is)),
                "s" => ex
                    .opt_text(c, "v")
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .and_then(|i| shared_strings.get(i).cloned()),
                _ => ex.opt_text(c, "v"),
            };

            let formula = ex.child(c, "f").map(|f| XlsxCellFormula {
                text: node_text(f),
                shared_index: (ex.attr_or(f, "t", String::new()) == "shared")
                    .then(|| ex.opt_attr(f, "si"))
                    .flatten(),
                shared_ref: ex.opt_attr(f, "ref"),
            });
            if let Some(f) = &formula {
                if let (Some(si), false) = (f.shared_index, f.text.is_empty()) {
                    shared_formulas.insert(
                        si,
                        XlsxSharedFormula {
                            anchor: xc.clone(),
                            text: f.text.clone(),
                        },
                    );
                }
            }

            cells.push(XlsxCell {
                xc,
                style_index: ex.attr_or(c, "s", 0),
                type_,
                value,
                formula,
            });
        }
    }
    Ok((rows, cells, shared_formulas))
}

/// Number of columns and rows spanned by the cells and merges, floored at the import minimums.
fn dimensions(cells: &[XlsxCell], merges: &[String], options: &ImportOptions) -> (u32, u32) {
    let mut cols = options.min_cols;
    let mut rows = options.min_rows;
    let cell_ends = cells
        .iter()
        .filter_map(|c| CellRef::from_xc(&c.xc).ok());
    let merge_ends = merges
        .iter()
        .filter_map(|m| Range::from_xc(m).ok())
        .map(|r| r.end);
    for end in cell_ends.chain(merge_ends) {
        cols = cols.max(end.col + 1);
        rows = rows.max(end.row + 1);
    }
    (cols, rows)
}

fn extract_hyperlinks(
    ex: &Extractor<'_>,
    root: Node<'_, '_>,
    rels: &Relationships,
) -> Vec<XlsxHyperlink> {
    let Some(list) = ex.child(root, "hyperlinks") else {
        return Vec::new();
    };
    ex.children(list, "hyperlink")
        .into_iter()
        .filter_map(|link| {
            let rel_id: Option<String> = ex.opt_attr(link, "r:id");
            Some(XlsxHyperlink {
                reference: ex.opt_attr(link, "ref")?,
                target: rel_id
                    .as_deref()
                    .and_then(|id| rels.get(id))
                    .map(|r| r.target.clone()),
                rel_id,
                location: ex.opt_attr(link, "location"),
                display: ex.opt_attr(link, "display"),
            })
        })
        .collect()
}

fn extract_data_validations(ex: &Extractor<'_>, root: Node<'_, '_>) -> Vec<XlsxDataValidation> {
    let mut rules: Vec<XlsxDataValidation> = ex
        .child(root, "dataValidations")
        .map(|list| {
            ex.children(list, "dataValidation")
                .into_iter()
                .map(|dv| data_validation(ex, dv, ex.opt_attr::<String>(dv, "sqref")))
                .collect()
        })
        .unwrap_or_default();

    if let Some(ext_list) = ex.child(root, "extLst") {
        for dv in ex.descendants(ext_list, "x14:dataValidation") {
            let sqref = ex.opt_text(dv, "xm:sqref");
            rules.push(data_validation(ex, dv, sqref));
        }
    }
    rules
}

fn data_validation(
    ex: &Extractor<'_>,
    dv: Node<'_, '_>,
    sqref: Option<String>,
) -> XlsxDataValidation {
    // x14 rules nest their formulas in `<xm:f>`.
    let formula = |tag: &str| {
        ex.child(dv, tag).map(|f| match ex.child(f, "xm:f") {
            Some(inner) => node_text(inner),
            None => node_text(f),
        })
    };
    XlsxDataValidation {
        type_: ex.attr_or(dv, "type", "none".to_string()),
        operator: ex.attr_or(dv, "operator", "between".to_string()),
        sqref: split_sqref(&sqref.unwrap_or_default()),
        formula1: formula("formula1"),
        formula2: formula("formula2"),
        error_style: ex.attr_or(dv, "errorStyle", "stop".to_string()),
        show_error_message: ex.attr_or(dv, "showErrorMessage", false),
        allow_blank: ex.attr_or(dv, "allowBlank", false),
        hide_dropdown: ex.attr_or(dv, "showDropDown", false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::records::{SheetState, XlsxOutlineGroup};
    use crate::XlsxPart;
    use pretty_assertions::assert_eq;

    const SHEET: &str = r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
      <sheetPr><tabColor rgb="FF00B050"/><outlinePr summaryBelow="0"/></sheetPr>
      <sheetViews><sheetView showGridLines="0" workbookViewId="0"><pane xSplit="1" ySplit="2" topLeftCell="B3" state="frozen"/></sheetView></sheetViews>
      <sheetFormatPr defaultRowHeight="15"/>
      <cols><col min="1" max="2" width="20" customWidth="1"/><col min="3" max="3" style="1"/><col min="4" max="4" width="9" hidden="1"/></cols>
      <sheetData>
        <row r="1" ht="30" customHeight="1"><c r="A1" t="s"><v>1</v></c><c r="B1"><v>12.5</v></c><c t="inlineStr"><is><t>inline</t></is></c></row>
        <row r="2" outlineLevel="1" collapsed="1"><c r="A2"><f t="shared" ref="A2:A4" si="0">B1*2</f><v>25</v></c></row>
        <row r="3" outlineLevel="1"><c r="A3"><f t="shared" si="0"/><v>0</v></c></row>
        <row r="40"><c r="AF40" t="b"><v>1</v></c></row>
      </sheetData>
      <mergeCells count="1"><mergeCell ref="B2:C150"/></mergeCells>
      <hyperlinks><hyperlink ref="B1" r:id="rId1" display="docs"/><hyperlink ref="A1" location="'Other sheet'!A1"/></hyperlinks>
      <dataValidations count="1"><dataValidation type="list" allowBlank="1" showErrorMessage="1" sqref="D1:D5 E1"><formula1>"a,b,c"</formula1></dataValidation></dataValidations>
    </worksheet>"#;

    fn files() -> XlsxFiles {
        let mut files = XlsxFiles::new();
        files.insert("xl/worksheets/sheet1.xml".to_string(), XlsxPart::Xml(SHEET.to_string()));
        files.insert(
            "xl/worksheets/_rels/sheet1.xml.rels".to_string(),
            XlsxPart::Xml(r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/docs" TargetMode="External"/></Relationships>"#.to_string()),
        );
        files
    }

    fn entry() -> XlsxSheetEntry {
        XlsxSheetEntry {
            name: "Data".to_string(),
            sheet_id: 1,
            rel_id: "rId1".to_string(),
            state: SheetState::Visible,
            path: "xl/worksheets/sheet1.xml".to_string(),
        }
    }

    #[test]
    fn reads_cells_headers_and_sheet_properties() {
        let warnings = WarningManager::new();
        let strings = vec!["zero".to_string(), "one".to_string()];
        let sheet = extract_sheet(&files(), &entry(), &strings, &ImportOptions::default(), &warnings).unwrap();

        let values: Vec<(&str, Option<&str>)> = sheet
            .cells
            .iter()
            .map(|c| (c.xc.as_str(), c.value.as_deref()))
            .collect();
        assert_eq!(
            values,
            vec![
                ("A1", Some("one")),
                ("B1", Some("12.5")),
                ("C1", Some("inline")),
                ("A2", Some("25")),
                ("A3", Some("0")),
                ("AF40", Some("1")),
            ]
        );
        assert_eq!(sheet.shared_formulas[&0], XlsxSharedFormula { anchor: "A2".into(), text: "B1*2".into() });
        assert_eq!(sheet.cells[4].formula.as_ref().unwrap().shared_index, Some(0));

        assert_eq!(sheet.cols.iter().map(|c| c.index).collect::<Vec<_>>(), vec![0, 1, 3]);
        assert!(sheet.cols[2].hidden);
        assert_eq!(sheet.rows[0].size, Some(30.0));
        assert_eq!(sheet.default_row_height, Some(15.0));

        assert_eq!((sheet.col_number, sheet.row_number), (32, 150));
        assert!(!sheet.summary_below);
        assert_eq!(sheet.row_groups, vec![XlsxOutlineGroup { start: 1, end: 2, collapsed: false }]);
        assert!(!sheet.show_grid_lines);
        assert_eq!(sheet.pane, Some(XlsxPane { x_split: 1, y_split: 2, frozen: true }));
        assert_eq!(sheet.tab_color.as_ref().and_then(|c| c.rgb.as_deref()), Some("FF00B050"));

        assert_eq!(sheet.hyperlinks[0].target.as_deref(), Some("https://example.com/docs"));
        assert_eq!(sheet.hyperlinks[1].location.as_deref(), Some("'Other sheet'!A1"));
        assert_eq!(sheet.data_validations[0].sqref, vec!["D1:D5", "E1"]);
        assert_eq!(sheet.data_validations[0].formula1.as_deref(), Some("\"a,b,c\""));
        assert!(warnings.warnings().is_empty());
    }

    #[test]
    fn missing_drawing_part_is_skipped_with_a_warning() {
        let mut files = files();
        files.insert(
            "xl/worksheets/sheet1.xml".to_string(),
            XlsxPart::Xml(SHEET.replace("</worksheet>", r#"<drawing r:id="rId2"/></worksheet>"#)),
        );
        files.insert(
            "xl/worksheets/_rels/sheet1.xml.rels".to_string(),
            XlsxPart::Xml(r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing" Target="../drawings/drawing9.xml"/></Relationships>"#.to_string()),
        );
        let warnings = WarningManager::new();
        let sheet = extract_sheet(&files, &entry(), &[], &ImportOptions::default(), &warnings).unwrap();
        assert!(sheet.figures.is_empty());
        assert_eq!(warnings.parsing_warnings().len(), 1);
        assert!(warnings.parsing_warnings()[0].contains("xl/drawings/drawing9.xml"));
    }
}
