//! `xl/workbook.xml` and the shared string table.

use tabula_model::WorkbookData;

use crate::xml::{push_attr, push_text_element, NS_MAIN, NS_REL, XML_HEADER};

pub const WORKBOOK_PART: &str = "xl/workbook.xml";
pub const STYLES_PART: &str = "xl/styles.xml";
pub const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";

/// `xl/workbook.xml`. `sheet_rels[i]` is the relationship id of the i-th sheet part.
pub fn workbook_xml(data: &WorkbookData, sheet_rels: &[String]) -> String {
    let mut xml = String::new();
    xml.push_str(XML_HEADER);
    xml.push('\n');
    xml.push_str(&format!(r#"<workbook xmlns="{NS_MAIN}" xmlns:r="{NS_REL}">"#));
    xml.push_str(r#"<workbookPr date1904="0"/>"#);
    let active = data.sheets.iter().position(|s| s.is_visible).unwrap_or(0);
    xml.push_str(&format!(r#"<bookViews><workbookView activeTab="{active}"/></bookViews>"#));
    xml.push_str("<sheets>");
    for (index, (sheet, rel_id)) in data.sheets.iter().zip(sheet_rels).enumerate() {
        xml.push_str("<sheet");
        push_attr(&mut xml, "name", &sheet.name);
        push_attr(&mut xml, "sheetId", (index + 1).to_string());
        if !sheet.is_visible {
            push_attr(&mut xml, "state", "hidden");
        }
        push_attr(&mut xml, "r:id", rel_id);
        xml.push_str("/>");
    }
    xml.push_str("</sheets></workbook>");
    xml
}

pub fn shared_strings_xml(strings: &[String]) -> String {
    let mut xml = String::new();
    xml.push_str(XML_HEADER);
    xml.push('\n');
    xml.push_str(&format!(
        r#"<sst xmlns="{NS_MAIN}" count="{count}" uniqueCount="{count}">"#,
        count = strings.len()
    ));
    for text in strings {
        xml.push_str("<si>");
        push_text_element(&mut xml, "t", text);
        xml.push_str("</si>");
    }
    xml.push_str("</sst>");
    xml
}
