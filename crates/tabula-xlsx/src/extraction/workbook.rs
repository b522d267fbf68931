use super::kernel::{node_text, Extractor, Relationships, XmlFile};
use super::records::{SheetState, XlsxDefinedName, XlsxSheetEntry, XlsxWorkbook};
use crate::warnings::WarningManager;
use crate::{ImportError, XlsxFiles};

pub const DEFAULT_WORKBOOK_PART: &str = "xl/workbook.xml";

/// Locate the workbook part through the package relationships.
pub fn workbook_part(files: &XlsxFiles) -> Result<String, ImportError> {
    let rels = Relationships::for_part(files, "")?;
    Ok(rels
        .first_of_kind("officeDocument")
        .map(|r| r.target.clone())
        .unwrap_or_else(|| DEFAULT_WORKBOOK_PART.to_string()))
}

pub fn extract_workbook(
    files: &XlsxFiles,
    path: &str,
    warnings: &WarningManager,
) -> Result<XlsxWorkbook, ImportError> {
    let file = XmlFile::open(files, path)?;
    let ex = Extractor::new(&file.path, warnings);
    let rels = Relationships::for_part(files, path)?;
    let root = file.root();

    let date1904 = ex
        .child(root, "workbookPr")
        .map(|pr| ex.attr_or(pr, "date1904", false))
        .unwrap_or(false);

    let mut sheets = Vec::new();
    if let Some(list) = ex.child(root, "sheets") {
        for node in ex.children(list, "sheet") {
            let name: String = ex.required_attr(node, "name")?;
            let sheet_id: u32 = ex.required_attr(node, "sheetId")?;
            let rel_id: String = ex.required_attr(node, "r:id")?;
            let state = match ex.attr_or(node, "state", String::new()).as_str() {
                "hidden" => SheetState::Hidden,
                "veryHidden" => SheetState::VeryHidden,
                _ => SheetState::Visible,
            };
            let Some(rel) = rels.get(&rel_id) else {
                ex.warnings().add_parsing_warning(format!(
                    "Sheet \"{name}\" references unknown relationship {rel_id} in {path}, skipping it."
                ));
                continue;
            };
            sheets.push(XlsxSheetEntry {
                name,
                sheet_id,
                rel_id,
                state,
                path: rel.target.clone(),
            });
        }
    }

    let defined_names = ex
        .child(root, "definedNames")
        .map(|list| {
            ex.children(list, "definedName")
                .into_iter()
                .filter_map(|node| {
                    Some(XlsxDefinedName {
                        name: ex.opt_attr(node, "name")?,
                        value: node_text(node),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    let external_links = ex
        .child(root, "externalReferences")
        .map(|list| {
            ex.children(list, "externalReference")
                .into_iter()
                .filter_map(|node| ex.opt_attr::<String>(node, "r:id"))
                .filter_map(|id| rels.get(&id).map(|r| r.target.clone()))
                .collect()
        })
        .unwrap_or_default();

    Ok(XlsxWorkbook {
        sheets,
        date1904,
        defined_names,
        external_links,
    })
}
