//! `[Content_Types].xml`.

use super::workbook::{SHARED_STRINGS_PART, STYLES_PART, WORKBOOK_PART};
use crate::xml::{push_attr, XML_HEADER};
use crate::{XlsxFiles, XlsxPart};

pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

fn override_type(part: &str) -> Option<&'static str> {
    let file_name = part.rsplit('/').next().unwrap_or(part);
    Some(match part {
        WORKBOOK_PART => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml",
        STYLES_PART => "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml",
        SHARED_STRINGS_PART => "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml",
        _ if part.starts_with("xl/worksheets/") && file_name.ends_with(".xml") => {
            "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"
        }
        _ if part.starts_with("xl/drawings/") && file_name.ends_with(".xml") => {
            "application/vnd.openxmlformats-officedocument.drawing+xml"
        }
        _ if part.starts_with("xl/charts/") && file_name.ends_with(".xml") => {
            "application/vnd.openxmlformats-officedocument.drawingml.chart+xml"
        }
        _ if part.starts_with("xl/tables/") && file_name.ends_with(".xml") => {
            "application/vnd.openxmlformats-officedocument.spreadsheetml.table+xml"
        }
        _ => return None,
    })
}

/// `[Content_Types].xml` for every part of `files`: one `Default` per media extension and one
/// `Override` per typed XML part.
pub fn content_types_xml(files: &XlsxFiles) -> String {
    let mut xml = String::new();
    xml.push_str(XML_HEADER);
    xml.push('\n');
    xml.push_str(&format!(r#"<Types xmlns="{NS_CONTENT_TYPES}">"#));
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);

    let mut extensions: Vec<&str> = files
        .iter()
        .filter(|(_, part)| matches!(part, XlsxPart::Image { .. }))
        .filter_map(|(name, _)| name.rsplit_once('.').map(|(_, ext)| ext))
        .collect();
    extensions.sort_unstable();
    extensions.dedup();
    for ext in extensions {
        let Some(mimetype) = tabula_model::mimetype_from_path(&format!("x.{ext}")) else {
            continue;
        };
        xml.push_str("<Default");
        push_attr(&mut xml, "Extension", ext);
        push_attr(&mut xml, "ContentType", mimetype);
        xml.push_str("/>");
    }

    for name in files.keys() {
        if let Some(content_type) = override_type(name) {
            xml.push_str("<Override");
            push_attr(&mut xml, "PartName", format!("/{name}"));
            push_attr(&mut xml, "ContentType", content_type);
            xml.push_str("/>");
        }
    }
    xml.push_str("</Types>");
    xml
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_types_cover_media_and_parts() {
        let mut files = XlsxFiles::new();
        files.insert(WORKBOOK_PART.into(), XlsxPart::Xml(String::new()));
        files.insert("xl/worksheets/sheet1.xml".into(), XlsxPart::Xml(String::new()));
        files.insert("xl/worksheets/_rels/sheet1.xml.rels".into(), XlsxPart::Xml(String::new()));
        files.insert("xl/media/image1.png".into(), XlsxPart::Image { source: "logo.png".into() });
        files.insert("xl/media/image2.png".into(), XlsxPart::Image { source: "other.png".into() });

        let xml = content_types_xml(&files);
        assert_eq!(xml.matches(r#"Extension="png""#).count(), 1);
        assert!(xml.contains(r#"<Override PartName="/xl/worksheets/sheet1.xml""#));
        assert!(!xml.contains("sheet1.xml.rels\""));
    }
}
