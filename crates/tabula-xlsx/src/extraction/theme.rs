use super::kernel::{Extractor, XmlFile};
use super::records::XlsxTheme;
use crate::warnings::WarningManager;
use crate::{ImportError, XlsxFiles};

const SCHEME_SLOTS: [&str; 12] = [
    "dk1", "lt1", "dk2", "lt2", "accent1", "accent2", "accent3", "accent4", "accent5", "accent6",
    "hlink", "folHlink",
];

/// Default "Office" scheme, used when the package has no theme or a slot is missing.
const DEFAULT_SCHEME: [&str; 12] = [
    "000000", "FFFFFF", "1F497D", "EEECE1", "4F81BD", "C0504D", "9BBB59", "8064A2", "4BACC6",
    "F79646", "0000FF", "800080",
];

pub fn default_theme() -> XlsxTheme {
    XlsxTheme {
        colors: DEFAULT_SCHEME.iter().map(|c| c.to_string()).collect(),
    }
}

/// Parse the `clrScheme` of a theme part. Missing slots fall back to the default scheme.
pub fn extract_theme(
    files: &XlsxFiles,
    path: &str,
    warnings: &WarningManager,
) -> Result<XlsxTheme, ImportError> {
    let file = XmlFile::open(files, path)?;
    let ex = Extractor::new(&file.path, warnings);
    let mut theme = default_theme();
    let Some(scheme) = ex.descendants(file.root(), "a:clrScheme").into_iter().next() else {
        return Ok(theme);
    };

    for (slot, name) in SCHEME_SLOTS.iter().enumerate() {
        let Some(color) = ex.child(scheme, name).and_then(|entry| ex.child_at(entry, 0)) else {
            continue;
        };
        let value = match color.tag_name().name() {
            "srgbClr" => ex.opt_attr::<String>(color, "val"),
            "sysClr" => ex
                .opt_attr::<String>(color, "lastClr")
                .or_else(|| sys_color(&ex.attr_or(color, "val", String::new())).map(str::to_string)),
            _ => None,
        };
        if let Some(value) = value.filter(|v| v.len() == 6) {
            theme.colors[slot] = value.to_ascii_uppercase();
        }
    }
    Ok(theme)
}

fn sys_color(name: &str) -> Option<&'static str> {
    match name {
        "windowText" => Some("000000"),
        "window" => Some("FFFFFF"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::XlsxPart;
    use pretty_assertions::assert_eq;

    #[test]
    fn reads_scheme_colors() {
        let mut files = XlsxFiles::new();
        files.insert(
            "xl/theme/theme1.xml".to_string(),
            XlsxPart::Xml(
                r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"><a:themeElements><a:clrScheme name="Office">
                <a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>
                <a:lt1><a:sysClr val="window"/></a:lt1>
                <a:dk2><a:srgbClr val="44546a"/></a:dk2>
                <a:lt2><a:srgbClr val="E7E6E6"/></a:lt2>
                <a:accent1><a:srgbClr val="4472C4"/></a:accent1>
                </a:clrScheme></a:themeElements></a:theme>"#
                    .to_string(),
            ),
        );
        let warnings = WarningManager::new();
        let theme = extract_theme(&files, "xl/theme/theme1.xml", &warnings).unwrap();
        assert_eq!(&theme.colors[..5], &["000000", "FFFFFF", "44546A", "E7E6E6", "4472C4"]);
        assert_eq!(theme.colors[5], "C0504D");
    }
}
