//! Worksheet parts (`xl/worksheets/sheet{n}.xml`).
//!
//! Cells are written row by row. Shared strings, cell formats, differential formats and
//! hyperlink relationships are interned into the session while the sheet is walked.

use std::collections::{BTreeMap, BTreeSet};

use tabula_formula::denormalize_formula;
use tabula_model::{
    format_number_literal, icons, parse_markdown_link, quote_sheet_name, CellData,
    CellIsOperator, CellIsRule, CellRef, CellValue, CfRule, ColorScaleRule, ColorScaleThreshold,
    ConditionalFormat, DataValidationRule, IconSetRule, IconThreshold, InflectionOperator, Link,
    SheetData, ThresholdType, DEFAULT_CELL_HEIGHT, DEFAULT_CELL_WIDTH,
};

use super::pools::REL_HYPERLINK;
use super::ExportSession;
use crate::conversion::cf::{cell_is_operator_name, cfvo_type_name, export_cf_value};
use crate::conversion::color::to_argb;
use crate::conversion::data_validation::export_data_validation;
use crate::conversion::outline::{headers_from_groups, OutlineAttrs};
use crate::conversion::sheet::{px_to_points, px_to_width};
use crate::formula_adapter::{export_formula, has_relative_reference};
use crate::warnings::WarningKind;
use crate::xml::{push_attr, push_text_element, NS_MAIN, NS_REL, NS_X14, NS_XM, XML_HEADER};
use crate::ExportError;

const X14_CF_EXT_URI: &str = "{78C0D931-6437-407d-A8EE-F0AAD7539E65}";

/// Relationship ids of the parts a worksheet points to.
#[derive(Clone, Debug, Default)]
pub struct SheetRels {
    pub drawing: Option<String>,
    pub tables: Vec<String>,
}

pub fn worksheet_xml(
    session: &mut ExportSession<'_>,
    sheet: &SheetData,
    part: &str,
    rels: &SheetRels,
) -> Result<String, ExportError> {
    let mut xml = String::new();
    xml.push_str(XML_HEADER);
    xml.push('\n');
    xml.push_str(&format!(
        r#"<worksheet xmlns="{NS_MAIN}" xmlns:r="{NS_REL}" xmlns:x14="{NS_X14}" xmlns:xm="{NS_XM}">"#
    ));

    sheet_pr_xml(&mut xml, sheet);
    sheet_views_xml(&mut xml, sheet);
    xml.push_str("<sheetFormatPr");
    push_attr(&mut xml, "defaultRowHeight", format_number_literal(px_to_points(DEFAULT_CELL_HEIGHT)));
    push_attr(&mut xml, "defaultColWidth", format_number_literal(px_to_width(DEFAULT_CELL_WIDTH)));
    xml.push_str("/>");
    cols_xml(&mut xml, sheet);

    let mut links = Vec::new();
    sheet_data_xml(&mut xml, session, sheet, &mut links)?;

    if !sheet.merges.is_empty() {
        xml.push_str(&format!(r#"<mergeCells count="{}">"#, sheet.merges.len()));
        for merge in &sheet.merges {
            xml.push_str("<mergeCell");
            push_attr(&mut xml, "ref", merge);
            xml.push_str("/>");
        }
        xml.push_str("</mergeCells>");
    }

    let x14_rules = conditional_formats_xml(&mut xml, session, sheet);
    data_validations_xml(&mut xml, &sheet.data_validation_rules);
    hyperlinks_xml(&mut xml, session, part, &links);

    if let Some(id) = &rels.drawing {
        xml.push_str("<drawing");
        push_attr(&mut xml, "r:id", id);
        xml.push_str("/>");
    }
    if !rels.tables.is_empty() {
        xml.push_str(&format!(r#"<tableParts count="{}">"#, rels.tables.len()));
        for id in &rels.tables {
            xml.push_str("<tablePart");
            push_attr(&mut xml, "r:id", id);
            xml.push_str("/>");
        }
        xml.push_str("</tableParts>");
    }
    if !x14_rules.is_empty() {
        xml.push_str("<extLst><ext");
        push_attr(&mut xml, "uri", X14_CF_EXT_URI);
        xml.push_str("><x14:conditionalFormattings>");
        xml.push_str(&x14_rules);
        xml.push_str("</x14:conditionalFormattings></ext></extLst>");
    }
    xml.push_str("</worksheet>");
    Ok(xml)
}

fn sheet_pr_xml(xml: &mut String, sheet: &SheetData) {
    xml.push_str("<sheetPr>");
    if let Some(color) = &sheet.color {
        xml.push_str("<tabColor");
        push_attr(xml, "rgb", to_argb(color));
        xml.push_str("/>");
    }
    xml.push_str(r#"<outlinePr summaryBelow="1" summaryRight="1"/></sheetPr>"#);
}

fn sheet_views_xml(xml: &mut String, sheet: &SheetData) {
    xml.push_str(r#"<sheetViews><sheetView workbookViewId="0""#);
    if !sheet.are_grid_lines_visible {
        push_attr(xml, "showGridLines", "0");
    }
    let pane = sheet.pane_divisions;
    if pane.x_split == 0 && pane.y_split == 0 {
        xml.push_str("/></sheetViews>");
        return;
    }
    xml.push_str("><pane");
    if pane.x_split > 0 {
        push_attr(xml, "xSplit", pane.x_split.to_string());
    }
    if pane.y_split > 0 {
        push_attr(xml, "ySplit", pane.y_split.to_string());
    }
    push_attr(xml, "topLeftCell", CellRef::new(pane.y_split, pane.x_split).to_xc());
    let active = match (pane.x_split > 0, pane.y_split > 0) {
        (true, true) => "bottomRight",
        (true, false) => "topRight",
        _ => "bottomLeft",
    };
    push_attr(xml, "activePane", active);
    xml.push_str(r#" state="frozen"/></sheetView></sheetViews>"#);
}

fn push_outline_attrs(xml: &mut String, hidden: bool, outline: OutlineAttrs) {
    if hidden || outline.hidden {
        push_attr(xml, "hidden", "1");
    }
    if outline.level > 0 {
        push_attr(xml, "outlineLevel", outline.level.to_string());
    }
    if outline.collapsed {
        push_attr(xml, "collapsed", "1");
    }
}

fn cols_xml(xml: &mut String, sheet: &SheetData) {
    let outline = headers_from_groups(&sheet.header_groups.cols);
    let indexes: BTreeSet<u32> = sheet
        .cols
        .iter()
        .filter(|(_, h)| h.size.is_some() || h.is_hidden)
        .map(|(i, _)| *i)
        .chain(outline.keys().copied())
        .collect();
    if indexes.is_empty() {
        return;
    }
    xml.push_str("<cols>");
    for index in indexes {
        let header = sheet.cols.get(&index);
        xml.push_str("<col");
        push_attr(xml, "min", (index + 1).to_string());
        push_attr(xml, "max", (index + 1).to_string());
        if let Some(size) = header.and_then(|h| h.size) {
            push_attr(xml, "width", format_number_literal(px_to_width(size)));
            push_attr(xml, "customWidth", "1");
        }
        let attrs = outline.get(&index).copied().unwrap_or_default();
        push_outline_attrs(xml, header.is_some_and(|h| h.is_hidden), attrs);
        xml.push_str("/>");
    }
    xml.push_str("</cols>");
}

fn sheet_data_xml<'s>(
    xml: &mut String,
    session: &mut ExportSession<'_>,
    sheet: &'s SheetData,
    links: &mut Vec<(String, Link)>,
) -> Result<(), ExportError> {
    let outline = headers_from_groups(&sheet.header_groups.rows);
    let mut rows: BTreeMap<u32, Vec<(CellRef, &'s CellData)>> = sheet
        .rows
        .iter()
        .filter(|(_, h)| h.size.is_some() || h.is_hidden)
        .map(|(i, _)| (*i, Vec::new()))
        .chain(outline.keys().map(|i| (*i, Vec::new())))
        .collect();
    for (position, cell) in sheet.cells_row_major() {
        if !cell.is_empty() {
            rows.entry(position.row).or_default().push((position, cell));
        }
    }

    xml.push_str("<sheetData>");
    for (index, cells) in rows {
        let header = sheet.rows.get(&index);
        xml.push_str("<row");
        push_attr(xml, "r", (index + 1).to_string());
        if let Some(size) = header.and_then(|h| h.size) {
            push_attr(xml, "ht", format_number_literal(px_to_points(size)));
            push_attr(xml, "customHeight", "1");
        }
        let attrs = outline.get(&index).copied().unwrap_or_default();
        push_outline_attrs(xml, header.is_some_and(|h| h.is_hidden), attrs);
        xml.push('>');
        for (position, cell) in cells {
            cell_xml(xml, session, sheet, &position.to_xc(), cell, links)?;
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData>");
    Ok(())
}

fn lookup<'d, T>(
    dictionary: &'d BTreeMap<u32, T>,
    id: Option<u32>,
    kind: &'static str,
    sheet: &SheetData,
    xc: &str,
) -> Result<Option<&'d T>, ExportError> {
    id.map(|id| {
        dictionary.get(&id).ok_or_else(|| ExportError::UnknownId {
            sheet: sheet.name.clone(),
            xc: xc.to_string(),
            kind,
            id,
        })
    })
    .transpose()
}

/// `cellXfs` index of a cell; 0 when the cell has no style, border or format.
fn cell_format(
    session: &mut ExportSession<'_>,
    sheet: &SheetData,
    xc: &str,
    cell: &CellData,
) -> Result<u32, ExportError> {
    if cell.style.is_none() && cell.border.is_none() && cell.format.is_none() {
        return Ok(0);
    }
    let data = session.data;
    let style = lookup(&data.styles, cell.style, "style", sheet, xc)?;
    let border = lookup(&data.borders, cell.border, "border", sheet, xc)?;
    let format = lookup(&data.formats, cell.format, "format", sheet, xc)?;
    Ok(session
        .styles
        .push_cell_format(style, border, format.map(String::as_str)))
}

/// Typed value of literal cell content.
fn content_value(content: &str) -> CellValue {
    if content.eq_ignore_ascii_case("true") {
        return CellValue::Boolean(true);
    }
    if content.eq_ignore_ascii_case("false") {
        return CellValue::Boolean(false);
    }
    match content.parse::<f64>() {
        Ok(n) if n.is_finite() => CellValue::Number(n),
        _ => CellValue::Text(content.to_string()),
    }
}

/// Appends the `t` attribute and `<v>` of `value`. Text goes to the shared strings unless
/// `inline` is set, in which case it is written as a `str` cell.
fn push_value(
    attrs: &mut String,
    body: &mut String,
    session: &mut ExportSession<'_>,
    value: &CellValue,
    inline: bool,
) {
    match value {
        CellValue::Boolean(b) => {
            push_attr(attrs, "t", "b");
            push_text_element(body, "v", if *b { "1" } else { "0" });
        }
        CellValue::Number(n) => push_text_element(body, "v", &format_number_literal(*n)),
        CellValue::Text(text) if inline => {
            push_attr(attrs, "t", "str");
            push_text_element(body, "v", text);
        }
        CellValue::Text(text) => {
            let index = session.strings.push_or_find(text.clone());
            push_attr(attrs, "t", "s");
            push_text_element(body, "v", &index.to_string());
        }
    }
}

fn cell_xml(
    xml: &mut String,
    session: &mut ExportSession<'_>,
    sheet: &SheetData,
    xc: &str,
    cell: &CellData,
    links: &mut Vec<(String, Link)>,
) -> Result<(), ExportError> {
    let mut attrs = String::new();
    push_attr(&mut attrs, "r", xc);
    let xf = cell_format(session, sheet, xc, cell)?;
    if xf != 0 {
        push_attr(&mut attrs, "s", xf.to_string());
    }

    let mut body = String::new();
    if let Some(formula) = &cell.formula {
        match export_formula(&denormalize_formula(formula)) {
            Some(text) => {
                push_text_element(&mut body, "f", &text);
                if let Some(value) = &formula.value {
                    push_value(&mut attrs, &mut body, session, value, true);
                }
            }
            None => {
                log::debug!("{}!{xc}: writing the cached value of {:?}", sheet.name, formula.text);
                if let Some(value) = &formula.value {
                    push_value(&mut attrs, &mut body, session, value, false);
                }
            }
        }
    } else if let Some(content) = &cell.content {
        let value = match parse_markdown_link(content) {
            Some(link) => {
                let label = CellValue::Text(link.label.clone());
                links.push((xc.to_string(), link));
                label
            }
            None => content_value(content),
        };
        push_value(&mut attrs, &mut body, session, &value, false);
    }

    xml.push_str("<c");
    xml.push_str(&attrs);
    if body.is_empty() {
        xml.push_str("/>");
    } else {
        xml.push('>');
        xml.push_str(&body);
        xml.push_str("</c>");
    }
    Ok(())
}

fn hyperlinks_xml(xml: &mut String, session: &mut ExportSession<'_>, part: &str, links: &[(String, Link)]) {
    let mut entries = String::new();
    for (xc, link) in links {
        let mut entry = String::from("<hyperlink");
        push_attr(&mut entry, "ref", xc);
        match link.sheet_id() {
            Some(id) => {
                let Some(target) = session.data.sheet_by_id(id) else {
                    session.warnings.generate_not_supported_warning(
                        WarningKind::BadHyperlink,
                        Some(&link.url),
                        None,
                    );
                    continue;
                };
                push_attr(&mut entry, "location", format!("{}!A1", quote_sheet_name(&target.name)));
            }
            None => {
                let id = session.rels.push_external(part, REL_HYPERLINK, &link.url);
                push_attr(&mut entry, "r:id", id);
            }
        }
        push_attr(&mut entry, "display", &link.label);
        entry.push_str("/>");
        entries.push_str(&entry);
    }
    if !entries.is_empty() {
        xml.push_str("<hyperlinks>");
        xml.push_str(&entries);
        xml.push_str("</hyperlinks>");
    }
}

fn data_validations_xml(xml: &mut String, rules: &[DataValidationRule]) {
    if rules.is_empty() {
        return;
    }
    xml.push_str(&format!(r#"<dataValidations count="{}">"#, rules.len()));
    for rule in rules {
        let dv = export_data_validation(rule);
        xml.push_str("<dataValidation");
        push_attr(xml, "type", &dv.type_);
        if !dv.operator.is_empty() {
            push_attr(xml, "operator", &dv.operator);
        }
        if dv.error_style != "stop" {
            push_attr(xml, "errorStyle", &dv.error_style);
        }
        if dv.allow_blank {
            push_attr(xml, "allowBlank", "1");
        }
        if dv.hide_dropdown {
            push_attr(xml, "showDropDown", "1");
        }
        if dv.show_error_message {
            push_attr(xml, "showErrorMessage", "1");
        }
        push_attr(xml, "sqref", dv.sqref.join(" "));
        xml.push('>');
        if let Some(formula) = &dv.formula1 {
            push_text_element(xml, "formula1", formula);
        }
        if let Some(formula) = &dv.formula2 {
            push_text_element(xml, "formula2", formula);
        }
        xml.push_str("</dataValidation>");
    }
    xml.push_str("</dataValidations>");
}

/// Top-left cell of the first range of `cf`, the anchor of relative rule formulas.
fn anchor_cell(cf: &ConditionalFormat) -> String {
    cf.ranges
        .first()
        .and_then(|range| range.split(':').next())
        .map(|xc| xc.replace('$', ""))
        .filter(|xc| !xc.is_empty())
        .unwrap_or_else(|| "A1".to_string())
}

fn open_rule(out: &mut String, type_: &str, priority: u32, stop_if_true: bool) {
    out.push_str("<cfRule");
    push_attr(out, "type", type_);
    push_attr(out, "priority", priority.to_string());
    if stop_if_true {
        push_attr(out, "stopIfTrue", "1");
    }
}

/// Writes the `<conditionalFormatting>` blocks and returns the x14 blocks for the `extLst`.
///
/// Priorities follow the model order. Rules that cannot be exported take no priority.
fn conditional_formats_xml(xml: &mut String, session: &mut ExportSession<'_>, sheet: &SheetData) -> String {
    let mut x14 = String::new();
    let mut priority = 0u32;
    for cf in &sheet.conditional_formats {
        let sqref = cf.ranges.join(" ");
        let next = priority + 1;
        let mut rule = String::new();
        match &cf.rule {
            CfRule::CellIsRule(cell_is) => cell_is_xml(&mut rule, session, cf, cell_is, next),
            CfRule::ColorScaleRule(scale) => {
                let Some(cfvos) = color_scale_cfvos(session, scale) else {
                    continue;
                };
                open_rule(&mut rule, "colorScale", next, cf.stop_if_true);
                rule.push_str("><colorScale>");
                for cfvo in &cfvos {
                    cfvo.write(&mut rule);
                }
                let colors = std::iter::once(&scale.minimum)
                    .chain(scale.midpoint.as_ref())
                    .chain(std::iter::once(&scale.maximum));
                for threshold in colors {
                    rule.push_str("<color");
                    push_attr(&mut rule, "rgb", to_argb(&threshold.color));
                    rule.push_str("/>");
                }
                rule.push_str("</colorScale></cfRule>");
            }
            CfRule::IconSetRule(icon_set) => {
                let Some(cfvos) = icon_cfvos(session, icon_set) else {
                    continue;
                };
                let Some((name, reverse)) = standard_icon_set(icon_set) else {
                    custom_icon_set_xml(&mut x14, icon_set, &cfvos, &sqref, next);
                    priority = next;
                    continue;
                };
                open_rule(&mut rule, "iconSet", next, cf.stop_if_true);
                rule.push_str("><iconSet");
                push_attr(&mut rule, "iconSet", name);
                if reverse {
                    push_attr(&mut rule, "reverse", "1");
                }
                rule.push('>');
                for cfvo in &cfvos {
                    cfvo.write(&mut rule);
                }
                rule.push_str("</iconSet></cfRule>");
            }
            CfRule::DataBarRule(bar) => {
                open_rule(&mut rule, "dataBar", next, cf.stop_if_true);
                rule.push_str(r#"><dataBar><cfvo type="min"/><cfvo type="max"/><color"#);
                push_attr(&mut rule, "rgb", to_argb(&bar.color));
                rule.push_str("/></dataBar></cfRule>");
            }
        }
        priority = next;
        xml.push_str("<conditionalFormatting");
        push_attr(xml, "sqref", &sqref);
        xml.push('>');
        xml.push_str(&rule);
        xml.push_str("</conditionalFormatting>");
    }
    x14
}

fn cell_is_xml(
    rule: &mut String,
    session: &mut ExportSession<'_>,
    cf: &ConditionalFormat,
    cell_is: &CellIsRule,
    priority: u32,
) {
    let anchor = anchor_cell(cf);
    let operand = export_cf_value(cell_is.values.first().map_or("", String::as_str));
    let (type_, formulas) = match cell_is.operator {
        CellIsOperator::IsEmpty => ("containsBlanks", vec![format!("LEN(TRIM({anchor}))=0")]),
        CellIsOperator::IsNotEmpty => ("notContainsBlanks", vec![format!("LEN(TRIM({anchor}))>0")]),
        CellIsOperator::ContainsText => (
            "containsText",
            vec![format!("NOT(ISERROR(SEARCH({operand},{anchor})))")],
        ),
        CellIsOperator::NotContains => ("notContainsText", vec![format!("ISERROR(SEARCH({operand},{anchor}))")]),
        CellIsOperator::BeginsWith => (
            "beginsWith",
            vec![format!("LEFT({anchor},LEN({operand}))={operand}")],
        ),
        CellIsOperator::EndsWith => (
            "endsWith",
            vec![format!("RIGHT({anchor},LEN({operand}))={operand}")],
        ),
        _ => (
            "cellIs",
            cell_is
                .values
                .iter()
                .take(cell_is.operator.arity())
                .map(|v| export_cf_value(v))
                .collect(),
        ),
    };
    open_rule(rule, type_, priority, cf.stop_if_true);
    push_attr(rule, "dxfId", session.styles.push_dxf(&cell_is.style).to_string());
    if cell_is.operator.arity() > 0 {
        push_attr(rule, "operator", cell_is_operator_name(cell_is.operator));
    }
    if type_ != "cellIs" {
        if let Some(text) = cell_is.values.first() {
            push_attr(rule, "text", text);
        }
    }
    rule.push('>');
    for formula in &formulas {
        push_text_element(rule, "formula", formula);
    }
    rule.push_str("</cfRule>");
}

/// A `cfvo` ready to be written in either the main or the x14 namespace.
struct Cfvo {
    type_: &'static str,
    value: Option<String>,
    gte: bool,
}

impl Cfvo {
    fn write(&self, out: &mut String) {
        out.push_str("<cfvo");
        push_attr(out, "type", self.type_);
        if let Some(value) = &self.value {
            push_attr(out, "val", value);
        }
        if !self.gte {
            push_attr(out, "gte", "0");
        }
        out.push_str("/>");
    }

    fn write_x14(&self, out: &mut String) {
        out.push_str("<x14:cfvo");
        push_attr(out, "type", self.type_);
        if !self.gte {
            push_attr(out, "gte", "0");
        }
        match &self.value {
            Some(value) => {
                out.push('>');
                push_text_element(out, "xm:f", value);
                out.push_str("</x14:cfvo>");
            }
            None => out.push_str("/>"),
        }
    }
}

/// Threshold value in cfvo form, or `None` when a formula threshold cannot be carried.
fn threshold_value(session: &ExportSession<'_>, type_: ThresholdType, value: &str) -> Option<String> {
    if type_ == ThresholdType::Formula {
        if has_relative_reference(value) {
            session.warnings.generate_not_supported_warning(
                WarningKind::CfFormulaThreshold,
                Some(value),
                None,
            );
            return None;
        }
        return Some(value.trim_start_matches('=').to_string());
    }
    Some(value.to_string())
}

fn color_scale_cfvos(session: &ExportSession<'_>, scale: &ColorScaleRule) -> Option<Vec<Cfvo>> {
    let thresholds: [(Option<&ColorScaleThreshold>, bool); 3] = [
        (Some(&scale.minimum), false),
        (scale.midpoint.as_ref(), false),
        (Some(&scale.maximum), true),
    ];
    let mut cfvos = Vec::with_capacity(3);
    for (threshold, is_max) in thresholds {
        let Some(threshold) = threshold else {
            continue;
        };
        let value = match (&threshold.value, threshold.type_) {
            (_, ThresholdType::Value) | (None, _) => None,
            (Some(value), type_) => Some(threshold_value(session, type_, value)?),
        };
        cfvos.push(Cfvo {
            type_: cfvo_type_name(threshold.type_, is_max),
            value,
            gte: true,
        });
    }
    Some(cfvos)
}

fn icon_cfvo(session: &ExportSession<'_>, threshold: &IconThreshold) -> Option<Cfvo> {
    let type_ = match threshold.type_ {
        ThresholdType::Value => "num",
        other => cfvo_type_name(other, false),
    };
    Some(Cfvo {
        type_,
        value: Some(threshold_value(session, threshold.type_, &threshold.value)?),
        gte: threshold.operator == InflectionOperator::Ge,
    })
}

/// `[percent 0, lower, upper]`, or `None` when a threshold cannot be exported.
fn icon_cfvos(session: &ExportSession<'_>, set: &IconSetRule) -> Option<[Cfvo; 3]> {
    let lower = icon_cfvo(session, &set.lower_inflection_point)?;
    let upper = icon_cfvo(session, &set.upper_inflection_point)?;
    let first = Cfvo {
        type_: "percent",
        value: Some("0".to_string()),
        gte: true,
    };
    Some([first, lower, upper])
}

fn family_set_name(family: &[&str; 3]) -> &'static str {
    if family == &icons::ARROWS {
        "3Arrows"
    } else if family == &icons::SMILEYS {
        "3Symbols"
    } else {
        "3TrafficLights1"
    }
}

/// Built-in set name and `reverse` flag when the three icons are one family in order.
fn standard_icon_set(set: &IconSetRule) -> Option<(&'static str, bool)> {
    let (family, lower) = icons::locate(&set.icons.lower)?;
    let (middle_family, middle) = icons::locate(&set.icons.middle)?;
    let (upper_family, upper) = icons::locate(&set.icons.upper)?;
    if family != middle_family || family != upper_family || middle != 1 {
        return None;
    }
    match (lower, upper) {
        (0, 2) => Some((family_set_name(family), false)),
        (2, 0) => Some((family_set_name(family), true)),
        _ => None,
    }
}

fn custom_icon_set_xml(x14: &mut String, set: &IconSetRule, cfvos: &[Cfvo; 3], sqref: &str, priority: u32) {
    x14.push_str(r#"<x14:conditionalFormatting><x14:cfRule type="iconSet""#);
    push_attr(x14, "priority", priority.to_string());
    push_attr(x14, "id", format!("{{00000000-0000-0000-0000-{priority:012}}}"));
    x14.push_str(r#"><x14:iconSet iconSet="3TrafficLights1" custom="1">"#);
    for cfvo in cfvos {
        cfvo.write_x14(x14);
    }
    for icon in [&set.icons.lower, &set.icons.middle, &set.icons.upper] {
        x14.push_str("<x14:cfIcon");
        match icons::locate(icon) {
            Some((family, slot)) => {
                push_attr(x14, "iconSet", family_set_name(family));
                push_attr(x14, "iconId", slot.to_string());
            }
            None => {
                push_attr(x14, "iconSet", "NoIcons");
                push_attr(x14, "iconId", "0");
            }
        }
        x14.push_str("/>");
    }
    x14.push_str("</x14:iconSet></x14:cfRule>");
    push_text_element(x14, "xm:sqref", sqref);
    x14.push_str("</x14:conditionalFormatting>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExportOptions;
    use tabula_formula::normalize_formula;
    use tabula_model::{CfStyle, IconSetIcons, PaneDivisions, WorkbookData};

    fn render(data: &WorkbookData) -> (String, Vec<String>) {
        let mut session = ExportSession::new(data, &ExportOptions::default());
        let xml = worksheet_xml(&mut session, &data.sheets[0], "xl/worksheets/sheet1.xml", &SheetRels::default())
            .unwrap();
        (xml, session.warnings.warnings())
    }

    fn workbook(sheet: SheetData) -> WorkbookData {
        let mut data = WorkbookData::default();
        data.sheets.push(sheet);
        data
    }

    fn content(text: &str) -> CellData {
        CellData { content: Some(text.into()), ..Default::default() }
    }

    fn threshold(type_: ThresholdType, value: &str, operator: InflectionOperator) -> IconThreshold {
        IconThreshold { type_, value: value.into(), operator }
    }

    fn icon_set(lower: &str, middle: &str, upper: &str) -> CfRule {
        CfRule::IconSetRule(IconSetRule {
            icons: IconSetIcons { upper: upper.into(), middle: middle.into(), lower: lower.into() },
            lower_inflection_point: threshold(ThresholdType::Number, "10", InflectionOperator::Ge),
            upper_inflection_point: threshold(ThresholdType::Percentage, "80", InflectionOperator::Gt),
        })
    }

    fn cf(range: &str, rule: CfRule) -> ConditionalFormat {
        ConditionalFormat { id: "1".into(), ranges: vec![range.into()], stop_if_true: false, rule }
    }

    #[test]
    fn cells_are_typed() {
        let mut sheet = SheetData::new("1", "Sheet1");
        sheet.cells.insert("A1".into(), content("hello"));
        sheet.cells.insert("B1".into(), content("42"));
        sheet.cells.insert("C1".into(), content("TRUE"));
        sheet.cells.insert(
            "A2".into(),
            CellData {
                formula: Some(normalize_formula("=SUM(A1:B1)", Some(CellValue::Number(42.0)))),
                ..Default::default()
            },
        );
        sheet.cells.insert(
            "B2".into(),
            CellData {
                formula: Some(normalize_formula("=WAIT(100)", Some(CellValue::Text("done".into())))),
                ..Default::default()
            },
        );
        let (xml, warnings) = render(&workbook(sheet));

        assert!(xml.contains(r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1"><v>42</v></c><c r="C1" t="b"><v>1</v></c></row>"#));
        assert!(xml.contains(r#"<c r="A2"><f>SUM(A1:B1)</f><v>42</v></c>"#));
        assert!(xml.contains(r#"<c r="B2" t="s"><v>1</v></c>"#));
        assert!(warnings.is_empty());
    }

    #[test]
    fn equal_strings_share_one_entry() {
        let mut sheet = SheetData::new("1", "Sheet1");
        sheet.cells.insert("A1".into(), content("same"));
        sheet.cells.insert("A2".into(), content("same"));
        let data = workbook(sheet);
        let mut session = ExportSession::new(&data, &ExportOptions::default());
        worksheet_xml(&mut session, &data.sheets[0], "xl/worksheets/sheet1.xml", &SheetRels::default()).unwrap();
        assert_eq!(session.strings.items(), ["same".to_string()]);
    }

    #[test]
    fn links_become_hyperlinks() {
        let mut sheet = SheetData::new("1", "Sheet1");
        sheet.cells.insert("A1".into(), content("[Docs](https://example.com)"));
        sheet.cells.insert("A2".into(), content("[Go](sheet://2)"));
        sheet.cells.insert("A3".into(), content("[Lost](sheet://9)"));
        let mut data = workbook(sheet);
        data.sheets.push(SheetData::new("2", "Summary"));
        let (xml, warnings) = render(&data);

        assert!(xml.contains(r#"<hyperlink ref="A1" r:id="rId1" display="Docs"/>"#));
        assert!(xml.contains(r#"<hyperlink ref="A2" location="Summary!A1" display="Go"/>"#));
        assert!(!xml.contains(r#"ref="A3""#));
        assert!(warnings.iter().any(|w| w.starts_with("Badly formatted hyperlink")));
    }

    #[test]
    fn unknown_style_ids_fail() {
        let mut sheet = SheetData::new("1", "Sheet1");
        sheet.cells.insert("C4".into(), CellData { style: Some(7), ..Default::default() });
        let data = workbook(sheet);
        let mut session = ExportSession::new(&data, &ExportOptions::default());
        let err = worksheet_xml(&mut session, &data.sheets[0], "xl/worksheets/sheet1.xml", &SheetRels::default())
            .unwrap_err();
        assert!(matches!(err, ExportError::UnknownId { kind: "style", id: 7, ref xc, .. } if xc == "C4"));
    }

    #[test]
    fn frozen_panes_are_written() {
        let mut sheet = SheetData::new("1", "Sheet1");
        sheet.pane_divisions = PaneDivisions { x_split: 1, y_split: 2 };
        sheet.are_grid_lines_visible = false;
        let (xml, _) = render(&workbook(sheet));
        assert!(xml.contains(
            r#"<sheetView workbookViewId="0" showGridLines="0"><pane xSplit="1" ySplit="2" topLeftCell="B3" activePane="bottomRight" state="frozen"/>"#
        ));
    }

    #[test]
    fn one_family_icon_sets_are_built_in() {
        let mut sheet = SheetData::new("1", "Sheet1");
        sheet
            .conditional_formats
            .push(cf("A1:A5", icon_set(icons::ARROW_BAD, icons::ARROW_NEUTRAL, icons::ARROW_GOOD)));
        sheet
            .conditional_formats
            .push(cf("B1:B5", icon_set(icons::SMILE_GOOD, icons::SMILE_NEUTRAL, icons::SMILE_BAD)));
        let (xml, _) = render(&workbook(sheet));

        assert!(xml.contains(
            r#"<cfRule type="iconSet" priority="1"><iconSet iconSet="3Arrows"><cfvo type="percent" val="0"/><cfvo type="num" val="10"/><cfvo type="percent" val="80" gte="0"/></iconSet></cfRule>"#
        ));
        assert!(xml.contains(r#"<cfRule type="iconSet" priority="2"><iconSet iconSet="3Symbols" reverse="1">"#));
        assert!(!xml.contains("extLst"));
    }

    #[test]
    fn mixed_icon_sets_go_to_the_extension_list() {
        let mut sheet = SheetData::new("1", "Sheet1");
        sheet
            .conditional_formats
            .push(cf("A1:A5", icon_set(icons::DOT_BAD, icons::SMILE_NEUTRAL, icons::ARROW_GOOD)));
        let (xml, _) = render(&workbook(sheet));

        assert!(!xml.contains("<conditionalFormatting"));
        assert!(xml.contains(r#"<x14:cfRule type="iconSet" priority="1" id="{00000000-0000-0000-0000-000000000001}">"#));
        assert!(xml.contains(
            r#"<x14:cfIcon iconSet="3TrafficLights1" iconId="0"/><x14:cfIcon iconSet="3Symbols" iconId="1"/><x14:cfIcon iconSet="3Arrows" iconId="2"/>"#
        ));
        assert!(xml.contains(r#"<x14:cfvo type="num"><xm:f>10</xm:f></x14:cfvo>"#));
        assert!(xml.contains("<xm:sqref>A1:A5</xm:sqref>"));
    }

    #[test]
    fn relative_formula_thresholds_are_dropped() {
        let mut sheet = SheetData::new("1", "Sheet1");
        sheet.conditional_formats.push(cf(
            "A1:A5",
            CfRule::ColorScaleRule(ColorScaleRule {
                minimum: ColorScaleThreshold {
                    type_: ThresholdType::Formula,
                    value: Some("=A1".into()),
                    color: "#FF0000".into(),
                },
                midpoint: None,
                maximum: ColorScaleThreshold { type_: ThresholdType::Value, value: None, color: "#00FF00".into() },
            }),
        ));
        let mut fixed = icon_set(icons::DOT_BAD, icons::DOT_NEUTRAL, icons::DOT_GOOD);
        if let CfRule::IconSetRule(set) = &mut fixed {
            set.lower_inflection_point = threshold(ThresholdType::Formula, "=$B$1", InflectionOperator::Ge);
        }
        sheet.conditional_formats.push(cf("C1:C5", fixed));
        let (xml, warnings) = render(&workbook(sheet));

        assert!(!xml.contains("colorScale"));
        assert!(xml.contains(r#"<cfRule type="iconSet" priority="1"><iconSet iconSet="3TrafficLights1">"#));
        assert!(xml.contains(r#"<cfvo type="formula" val="$B$1"/>"#));
        assert!(warnings.iter().any(|w| w.starts_with("Formula thresholds in conditional formats")));
    }

    #[test]
    fn text_rules_use_search_formulas() {
        let mut sheet = SheetData::new("1", "Sheet1");
        sheet.conditional_formats.push(cf(
            "B2:B4",
            CfRule::CellIsRule(CellIsRule {
                operator: CellIsOperator::ContainsText,
                values: vec!["abc".into()],
                style: CfStyle { bold: Some(true), ..Default::default() },
            }),
        ));
        let (xml, _) = render(&workbook(sheet));
        assert!(xml.contains(
            r#"<cfRule type="containsText" priority="1" dxfId="0" operator="containsText" text="abc"><formula>NOT(ISERROR(SEARCH("abc",B2)))</formula></cfRule>"#
        ));
    }
}
