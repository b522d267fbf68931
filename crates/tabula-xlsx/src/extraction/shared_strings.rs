use super::kernel::{node_text, Extractor, XmlFile};
use crate::warnings::{WarningKind, WarningManager};
use crate::{ImportError, XlsxFiles};

/// Read the shared string table. Rich text runs are flattened into plain text.
pub fn extract_shared_strings(
    files: &XlsxFiles,
    path: &str,
    warnings: &WarningManager,
) -> Result<Vec<String>, ImportError> {
    let file = XmlFile::open(files, path)?;
    let ex = Extractor::new(&file.path, warnings);
    Ok(ex
        .children(file.root(), "si")
        .into_iter()
        .map(|si| string_item_text(&ex, si))
        .collect())
}

/// Text of an `<si>` or `<is>` element: a single `<t>` or a sequence of `<r>` runs.
/// Phonetic runs (`<rPh>`) are not part of the value.
pub fn string_item_text(ex: &Extractor<'_>, item: roxmltree::Node<'_, '_>) -> String {
    if let Some(t) = ex.child(item, "t") {
        return node_text(t);
    }
    let runs = ex.children(item, "r");
    if runs
        .iter()
        .any(|r| ex.child(*r, "rPr").is_some())
    {
        ex.warnings()
            .generate_not_supported_warning(WarningKind::RichText, None, None);
    }
    runs.into_iter()
        .filter_map(|r| ex.child(r, "t"))
        .map(node_text)
        .collect()
}
