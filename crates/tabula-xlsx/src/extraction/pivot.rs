use super::kernel::{Extractor, XmlFile};
use super::records::XlsxPivotTable;
use crate::warnings::WarningManager;
use crate::{ImportError, XlsxFiles};

/// Read the layout of a pivot table definition. Only the rendered location and style survive:
/// pivots are imported as plain tables.
pub fn extract_pivot_table(
    files: &XlsxFiles,
    path: &str,
    warnings: &WarningManager,
) -> Result<XlsxPivotTable, ImportError> {
    let file = XmlFile::open(files, path)?;
    let ex = Extractor::new(&file.path, warnings);
    let root = file.root();
    let location = ex
        .child(root, "location")
        .ok_or_else(|| ImportError::MissingRequired {
            part: path.to_string(),
            element: "pivotTableDefinition".to_string(),
            attribute: "location".to_string(),
        })?;
    let style = ex.child(root, "pivotTableStyleInfo");
    let style_flag = |name: &str| style.map(|s| ex.attr_or(s, name, false)).unwrap_or(false);

    Ok(XlsxPivotTable {
        name: ex.attr_or(root, "name", String::new()),
        reference: ex.required_attr(location, "ref")?,
        first_header_row: ex.attr_or(location, "firstHeaderRow", 0),
        first_data_row: ex.attr_or(location, "firstDataRow", 0),
        first_data_col: ex.attr_or(location, "firstDataCol", 0),
        row_grand_totals: ex.attr_or(root, "rowGrandTotals", true),
        col_grand_totals: ex.attr_or(root, "colGrandTotals", true),
        style_name: style.and_then(|s| ex.opt_attr(s, "name")),
        show_row_stripes: style_flag("showRowStripes"),
        show_col_stripes: style_flag("showColStripes"),
        show_first_column: style_flag("showRowHeaders"),
        show_last_column: style_flag("showLastColumn"),
    })
}
