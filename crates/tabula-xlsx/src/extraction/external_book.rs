use super::kernel::{Extractor, XmlFile};
use super::records::{XlsxExternalBook, XlsxExternalCell, XlsxExternalSheet};
use crate::warnings::WarningManager;
use crate::{ImportError, XlsxFiles};

/// Sheet names and cached values of an `externalLink` part.
pub fn extract_external_book(
    files: &XlsxFiles,
    path: &str,
    warnings: &WarningManager,
) -> Result<XlsxExternalBook, ImportError> {
    let file = XmlFile::open(files, path)?;
    let ex = Extractor::new(&file.path, warnings);
    let Some(book) = ex.child(file.root(), "externalBook") else {
        return Ok(XlsxExternalBook::default());
    };

    let mut sheets: Vec<XlsxExternalSheet> = ex
        .child(book, "sheetNames")
        .map(|names| {
            ex.children(names, "sheetName")
                .into_iter()
                .map(|n| XlsxExternalSheet {
                    name: ex.attr_or(n, "val", String::new()),
                    cells: Vec::new(),
                })
                .collect()
        })
        .unwrap_or_default();

    if let Some(data_set) = ex.child(book, "sheetDataSet") {
        for sheet_data in ex.children(data_set, "sheetData") {
            let sheet_id: usize = ex.required_attr::<u32>(sheet_data, "sheetId")? as usize;
            let Some(sheet) = sheets.get_mut(sheet_id) else {
                continue;
            };
            for row in ex.children(sheet_data, "row") {
                for cell in ex.children(row, "cell") {
                    let Some(value) = ex.opt_text(cell, "v") else {
                        continue;
                    };
                    sheet.cells.push(XlsxExternalCell {
                        xc: ex.required_attr(cell, "r")?,
                        type_: ex.attr_or(cell, "t", "n".to_string()),
                        value,
                    });
                }
            }
        }
    }
    Ok(XlsxExternalBook { sheets })
}
