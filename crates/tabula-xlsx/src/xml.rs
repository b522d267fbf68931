//! Small helpers shared by the XML emitters.

use std::borrow::Cow;

pub(crate) const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

pub(crate) const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
pub(crate) const NS_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
pub(crate) const NS_PKG_REL: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
pub(crate) const NS_DRAWING: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
pub(crate) const NS_SPREADSHEET_DRAWING: &str =
    "http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing";
pub(crate) const NS_CHART: &str = "http://schemas.openxmlformats.org/drawingml/2006/chart";
pub(crate) const NS_X14: &str = "http://schemas.microsoft.com/office/spreadsheetml/2009/9/main";
pub(crate) const NS_XM: &str = "http://schemas.microsoft.com/office/excel/2006/main";

pub(crate) fn escape_text(s: &str) -> Cow<'_, str> {
    quick_xml::escape::partial_escape(s)
}

pub(crate) fn escape_attr(s: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(s)
}

pub(crate) fn needs_space_preserve(s: &str) -> bool {
    s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace)
}

/// Append ` name="value"` to `out`.
pub(crate) fn push_attr(out: &mut String, name: &str, value: impl AsRef<str>) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape_attr(value.as_ref()));
    out.push('"');
}

/// Append `<tag>text</tag>` to `out`.
pub(crate) fn push_text_element(out: &mut String, tag: &str, text: &str) {
    out.push('<');
    out.push_str(tag);
    if needs_space_preserve(text) {
        out.push_str(r#" xml:space="preserve""#);
    }
    out.push('>');
    out.push_str(&escape_text(text));
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_and_attributes_are_escaped() {
        let mut out = String::new();
        out.push_str("<v");
        push_attr(&mut out, "name", r#"a"b<c"#);
        out.push('>');
        assert_eq!(out, r#"<v name="a&quot;b&lt;c">"#);

        let mut out = String::new();
        push_text_element(&mut out, "t", " x & y");
        assert_eq!(out, r#"<t xml:space="preserve"> x &amp; y</t>"#);
    }
}
