//! `xl/styles.xml`: cell formats and differential formats interned during the export walk.

use tabula_model::{format_number_literal, Align, Border, BorderDescr, CfStyle, Style, VerticalAlign, Wrapping};

use super::pools::InternPool;
use crate::conversion::color::to_argb;
use crate::conversion::format::{builtin_format_id, export_number_format, FIRST_CUSTOM_FORMAT_ID};
use crate::xml::{push_attr, NS_MAIN, XML_HEADER};
use crate::ExportOptions;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FontRecord {
    pub name: String,
    pub size_100pt: u32,
    pub bold: bool,
    pub italic: bool,
    pub strike: bool,
    pub underline: bool,
    pub color: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FillRecord {
    pub pattern: &'static str,
    pub color: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AlignmentRecord {
    pub horizontal: Option<&'static str>,
    pub vertical: Option<&'static str>,
    pub wrap_text: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct XfRecord {
    pub num_fmt_id: u32,
    pub font_id: u32,
    pub fill_id: u32,
    pub border_id: u32,
    pub alignment: Option<AlignmentRecord>,
}

/// Font, fill, border, number format, `cellXfs` and `dxfs` pools of one export.
///
/// Index 0 of every pool is the workbook default, and fill 1 is the reserved `gray125`.
#[derive(Debug)]
pub struct StylePools {
    default_font: FontRecord,
    fonts: InternPool<FontRecord>,
    fills: InternPool<FillRecord>,
    borders: InternPool<Border>,
    num_fmts: InternPool<String>,
    xfs: InternPool<XfRecord>,
    dxfs: InternPool<CfStyle>,
}

impl StylePools {
    pub fn new(options: &ExportOptions) -> Self {
        let default_font = FontRecord {
            name: options.default_font.clone(),
            size_100pt: (options.default_font_size * 100.0).round() as u32,
            bold: false,
            italic: false,
            strike: false,
            underline: false,
            color: None,
        };
        Self {
            fonts: InternPool::seeded([default_font.clone()]),
            default_font,
            fills: InternPool::seeded([
                FillRecord { pattern: "none", color: None },
                FillRecord { pattern: "gray125", color: None },
            ]),
            borders: InternPool::seeded([Border::default()]),
            num_fmts: InternPool::new(),
            xfs: InternPool::seeded([XfRecord {
                num_fmt_id: 0,
                font_id: 0,
                fill_id: 0,
                border_id: 0,
                alignment: None,
            }]),
            dxfs: InternPool::new(),
        }
    }

    /// `cellXfs` index of a cell with the given style, border and host number format.
    pub fn push_cell_format(
        &mut self,
        style: Option<&Style>,
        border: Option<&Border>,
        format: Option<&str>,
    ) -> u32 {
        let default_style = Style::default();
        let style = style.unwrap_or(&default_style);
        let xf = XfRecord {
            num_fmt_id: format.map_or(0, |f| self.push_num_fmt(f)),
            font_id: self.push_font(style),
            fill_id: self.push_fill(style.fill_color.as_deref()),
            border_id: border.map_or(0, |b| self.borders.push_or_find(b.clone())),
            alignment: alignment(style),
        };
        self.xfs.push_or_find(xf)
    }

    pub fn push_font(&mut self, style: &Style) -> u32 {
        let font = FontRecord {
            size_100pt: style.font_size_100pt.unwrap_or(self.default_font.size_100pt),
            bold: style.bold,
            italic: style.italic,
            strike: style.strikethrough,
            underline: style.underline,
            color: style.text_color.clone(),
            ..self.default_font.clone()
        };
        self.fonts.push_or_find(font)
    }

    pub fn push_fill(&mut self, color: Option<&str>) -> u32 {
        match color {
            Some(color) => self.fills.push_or_find(FillRecord {
                pattern: "solid",
                color: Some(color.to_string()),
            }),
            None => 0,
        }
    }

    /// Number format id of a host format: built-in ids when the code has one, else a custom id.
    pub fn push_num_fmt(&mut self, format: &str) -> u32 {
        let code = export_number_format(format);
        if let Some(id) = builtin_format_id(&code) {
            return id;
        }
        FIRST_CUSTOM_FORMAT_ID + self.num_fmts.push_or_find(code)
    }

    pub fn push_dxf(&mut self, style: &CfStyle) -> u32 {
        self.dxfs.push_or_find(style.clone())
    }

    pub fn cell_format_count(&self) -> usize {
        self.xfs.len()
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(XML_HEADER);
        xml.push('\n');
        xml.push_str(&format!(r#"<styleSheet xmlns="{NS_MAIN}">"#));

        if !self.num_fmts.is_empty() {
            xml.push_str(&format!(r#"<numFmts count="{}">"#, self.num_fmts.len()));
            for (index, code) in self.num_fmts.items().iter().enumerate() {
                xml.push_str("<numFmt");
                push_attr(&mut xml, "numFmtId", (FIRST_CUSTOM_FORMAT_ID + index as u32).to_string());
                push_attr(&mut xml, "formatCode", code);
                xml.push_str("/>");
            }
            xml.push_str("</numFmts>");
        }

        xml.push_str(&format!(r#"<fonts count="{}">"#, self.fonts.len()));
        for font in self.fonts.items() {
            font_xml(&mut xml, font);
        }
        xml.push_str("</fonts>");

        xml.push_str(&format!(r#"<fills count="{}">"#, self.fills.len()));
        for fill in self.fills.items() {
            fill_xml(&mut xml, fill);
        }
        xml.push_str("</fills>");

        xml.push_str(&format!(r#"<borders count="{}">"#, self.borders.len()));
        for border in self.borders.items() {
            border_xml(&mut xml, border);
        }
        xml.push_str("</borders>");

        xml.push_str(r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#);

        xml.push_str(&format!(r#"<cellXfs count="{}">"#, self.xfs.len()));
        for xf in self.xfs.items() {
            xf_xml(&mut xml, xf);
        }
        xml.push_str("</cellXfs>");

        xml.push_str(r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#);

        xml.push_str(&format!(r#"<dxfs count="{}">"#, self.dxfs.len()));
        for dxf in self.dxfs.items() {
            dxf_xml(&mut xml, dxf);
        }
        xml.push_str("</dxfs>");

        xml.push_str("</styleSheet>");
        xml
    }
}

fn alignment(style: &Style) -> Option<AlignmentRecord> {
    let record = AlignmentRecord {
        horizontal: style.align.map(|a| match a {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
        }),
        vertical: style.vertical_align.map(|v| match v {
            VerticalAlign::Top => "top",
            VerticalAlign::Middle => "center",
            VerticalAlign::Bottom => "bottom",
        }),
        wrap_text: style.wrapping == Some(Wrapping::Wrap),
    };
    (record.horizontal.is_some() || record.vertical.is_some() || record.wrap_text).then_some(record)
}

fn push_color(xml: &mut String, tag: &str, color: &str) {
    xml.push('<');
    xml.push_str(tag);
    push_attr(xml, "rgb", to_argb(color));
    xml.push_str("/>");
}

fn font_xml(xml: &mut String, font: &FontRecord) {
    xml.push_str("<font>");
    if font.bold {
        xml.push_str("<b/>");
    }
    if font.italic {
        xml.push_str("<i/>");
    }
    if font.strike {
        xml.push_str("<strike/>");
    }
    if font.underline {
        xml.push_str("<u/>");
    }
    xml.push_str("<sz");
    push_attr(xml, "val", format_number_literal(f64::from(font.size_100pt) / 100.0));
    xml.push_str("/>");
    if let Some(color) = &font.color {
        push_color(xml, "color", color);
    }
    xml.push_str("<name");
    push_attr(xml, "val", &font.name);
    xml.push_str("/></font>");
}

fn fill_xml(xml: &mut String, fill: &FillRecord) {
    xml.push_str("<fill><patternFill");
    push_attr(xml, "patternType", fill.pattern);
    match &fill.color {
        Some(color) => {
            xml.push('>');
            push_color(xml, "fgColor", color);
            xml.push_str(r#"<bgColor indexed="64"/></patternFill>"#);
        }
        None => xml.push_str("/>"),
    }
    xml.push_str("</fill>");
}

fn border_side_xml(xml: &mut String, tag: &str, side: Option<&BorderDescr>) {
    match side {
        Some(side) => {
            xml.push('<');
            xml.push_str(tag);
            push_attr(xml, "style", side.style.as_str());
            xml.push('>');
            push_color(xml, "color", &side.color);
            xml.push_str("</");
            xml.push_str(tag);
            xml.push('>');
        }
        None => {
            xml.push('<');
            xml.push_str(tag);
            xml.push_str("/>");
        }
    }
}

fn border_xml(xml: &mut String, border: &Border) {
    xml.push_str("<border>");
    border_side_xml(xml, "left", border.left.as_ref());
    border_side_xml(xml, "right", border.right.as_ref());
    border_side_xml(xml, "top", border.top.as_ref());
    border_side_xml(xml, "bottom", border.bottom.as_ref());
    xml.push_str("<diagonal/></border>");
}

fn xf_xml(xml: &mut String, xf: &XfRecord) {
    xml.push_str("<xf");
    push_attr(xml, "numFmtId", xf.num_fmt_id.to_string());
    push_attr(xml, "fontId", xf.font_id.to_string());
    push_attr(xml, "fillId", xf.fill_id.to_string());
    push_attr(xml, "borderId", xf.border_id.to_string());
    push_attr(xml, "xfId", "0");
    for (name, applied) in [
        ("applyNumberFormat", xf.num_fmt_id != 0),
        ("applyFont", xf.font_id != 0),
        ("applyFill", xf.fill_id != 0),
        ("applyBorder", xf.border_id != 0),
        ("applyAlignment", xf.alignment.is_some()),
    ] {
        if applied {
            push_attr(xml, name, "1");
        }
    }
    let Some(alignment) = &xf.alignment else {
        xml.push_str("/>");
        return;
    };
    xml.push_str("><alignment");
    if let Some(horizontal) = alignment.horizontal {
        push_attr(xml, "horizontal", horizontal);
    }
    if let Some(vertical) = alignment.vertical {
        push_attr(xml, "vertical", vertical);
    }
    if alignment.wrap_text {
        push_attr(xml, "wrapText", "1");
    }
    xml.push_str("/></xf>");
}

fn dxf_flag(xml: &mut String, tag: &str, value: Option<bool>) {
    match value {
        Some(true) => xml.push_str(&format!("<{tag}/>")),
        Some(false) => xml.push_str(&format!(r#"<{tag} val="0"/>"#)),
        None => {}
    }
}

/// Differential formats carry the solid color in `bgColor`.
fn dxf_xml(xml: &mut String, style: &CfStyle) {
    xml.push_str("<dxf>");
    let has_font = style.bold.is_some()
        || style.italic.is_some()
        || style.strikethrough.is_some()
        || style.underline.is_some()
        || style.text_color.is_some();
    if has_font {
        xml.push_str("<font>");
        dxf_flag(xml, "b", style.bold);
        dxf_flag(xml, "i", style.italic);
        dxf_flag(xml, "strike", style.strikethrough);
        match style.underline {
            Some(true) => xml.push_str("<u/>"),
            Some(false) => xml.push_str(r#"<u val="none"/>"#),
            None => {}
        }
        if let Some(color) = &style.text_color {
            push_color(xml, "color", color);
        }
        xml.push_str("</font>");
    }
    if let Some(color) = &style.fill_color {
        xml.push_str(r#"<fill><patternFill patternType="solid">"#);
        push_color(xml, "bgColor", color);
        xml.push_str("</patternFill></fill>");
    }
    xml.push_str("</dxf>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tabula_model::BorderStyle;

    fn pools() -> StylePools {
        StylePools::new(&ExportOptions::default())
    }

    #[test]
    fn equal_styles_share_one_cell_format() {
        let mut pools = pools();
        let bold = Style { bold: true, fill_color: Some("#FF0000".into()), ..Default::default() };
        let italic = Style { italic: true, ..Default::default() };
        let a = pools.push_cell_format(Some(&bold), None, None);
        let b = pools.push_cell_format(Some(&italic), None, None);
        let c = pools.push_cell_format(Some(&bold.clone()), None, None);
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(pools.push_cell_format(None, None, None), 0);
        assert_eq!(pools.push_cell_format(Some(&Style::default()), None, None), 0);
        assert_eq!(pools.cell_format_count(), 3);
    }

    #[test]
    fn number_formats_reuse_builtin_ids() {
        let mut pools = pools();
        assert_eq!(pools.push_num_fmt("0.00%"), 10);
        assert_eq!(pools.push_num_fmt("#,##0.000"), 164);
        assert_eq!(pools.push_num_fmt("[$$]#,##0.0"), 165);
        assert_eq!(pools.push_num_fmt("#,##0.000"), 164);
        let xml = pools.to_xml();
        assert!(xml.contains(r#"<numFmt numFmtId="165" formatCode="&quot;$&quot;#,##0.0"/>"#));
    }

    #[test]
    fn styles_xml_lists_defaults_first() {
        let mut pools = pools();
        let border = Border {
            top: Some(BorderDescr { style: BorderStyle::Thin, color: "#00FF00".into() }),
            ..Default::default()
        };
        let style = Style { align: Some(Align::Center), font_size_100pt: Some(1400), ..Default::default() };
        assert_eq!(pools.push_cell_format(Some(&style), Some(&border), None), 1);
        let xml = pools.to_xml();
        assert!(xml.contains(r#"<fonts count="2"><font><sz val="10"/><name val="Arial"/></font><font><sz val="14"/><name val="Arial"/></font></fonts>"#));
        assert!(xml.contains(r#"<fill><patternFill patternType="gray125"/></fill>"#));
        assert!(xml.contains(r#"<top style="thin"><color rgb="FF00FF00"/></top>"#));
        assert!(xml.contains(r#"<xf numFmtId="0" fontId="1" fillId="0" borderId="1" xfId="0" applyFont="1" applyBorder="1" applyAlignment="1"><alignment horizontal="center"/></xf>"#));
    }

    #[test]
    fn dxfs_keep_only_set_attributes() {
        let mut pools = pools();
        let style = CfStyle { fill_color: Some("#FFC7CE".into()), bold: Some(true), ..Default::default() };
        assert_eq!(pools.push_dxf(&style), 0);
        assert_eq!(pools.push_dxf(&style), 0);
        let xml = pools.to_xml();
        assert!(xml.contains(r#"<dxfs count="1"><dxf><font><b/></font><fill><patternFill patternType="solid"><bgColor rgb="FFFFC7CE"/></patternFill></fill></dxf></dxfs>"#));
    }
}
