use roxmltree::Node;

use super::kernel::{node_text, Extractor};
use super::records::{
    XlsxCfIcon, XlsxCfRule, XlsxCfvo, XlsxColorScale, XlsxConditionalFormat, XlsxDataBar,
    XlsxIconSet,
};
use super::style::extract_color;

pub const DEFAULT_ICON_SET: &str = "3TrafficLights1";

/// `<conditionalFormatting>` blocks of a worksheet, followed by the x14 icon sets of its `extLst`.
pub fn extract_conditional_formats(
    ex: &Extractor<'_>,
    worksheet: Node<'_, '_>,
) -> Vec<XlsxConditionalFormat> {
    let mut formats: Vec<XlsxConditionalFormat> = ex
        .children(worksheet, "conditionalFormatting")
        .into_iter()
        .map(|cf| XlsxConditionalFormat {
            sqref: split_sqref(&ex.attr_or(cf, "sqref", String::new())),
            rules: ex
                .children(cf, "cfRule")
                .into_iter()
                .map(|rule| extract_rule(ex, rule))
                .collect(),
        })
        .collect();

    if let Some(ext_list) = ex.child(worksheet, "extLst") {
        for cf in ex.descendants(ext_list, "x14:conditionalFormatting") {
            let sqref = ex
                .opt_text(cf, "xm:sqref")
                .map(|s| split_sqref(&s))
                .unwrap_or_default();
            let rules: Vec<XlsxCfRule> = ex
                .children(cf, "x14:cfRule")
                .into_iter()
                .filter(|rule| ex.attr_or(*rule, "type", String::new()) == "iconSet")
                .map(|rule| extract_rule(ex, rule))
                .collect();
            if !rules.is_empty() {
                formats.push(XlsxConditionalFormat { sqref, rules });
            }
        }
    }
    formats
}

pub fn split_sqref(sqref: &str) -> Vec<String> {
    sqref.split_whitespace().map(str::to_string).collect()
}

fn extract_rule(ex: &Extractor<'_>, rule: Node<'_, '_>) -> XlsxCfRule {
    XlsxCfRule {
        type_: ex.attr_or(rule, "type", String::new()),
        priority: ex.attr_or(rule, "priority", 0),
        dxf_id: ex.opt_attr(rule, "dxfId"),
        operator: ex.opt_attr(rule, "operator"),
        text: ex.opt_attr(rule, "text"),
        formulas: ex
            .children(rule, "formula")
            .into_iter()
            .chain(ex.children(rule, "xm:f"))
            .map(node_text)
            .collect(),
        stop_if_true: ex.attr_or(rule, "stopIfTrue", false),
        color_scale: ex.child(rule, "colorScale").map(|cs| XlsxColorScale {
            cfvos: extract_cfvos(ex, cs),
            colors: ex
                .children(cs, "color")
                .into_iter()
                .map(|c| extract_color(ex, c))
                .collect(),
        }),
        data_bar: ex.child(rule, "dataBar").map(|db| XlsxDataBar {
            cfvos: extract_cfvos(ex, db),
            color: ex.child(db, "color").map(|c| extract_color(ex, c)),
        }),
        icon_set: ex.child(rule, "iconSet").map(|is| XlsxIconSet {
            icon_set: ex.attr_or(is, "iconSet", DEFAULT_ICON_SET.to_string()),
            cfvos: extract_cfvos(ex, is),
            reverse: ex.attr_or(is, "reverse", false),
            show_value: ex.attr_or(is, "showValue", true),
            custom_icons: ex
                .children(is, "cfIcon")
                .into_iter()
                .map(|icon| XlsxCfIcon {
                    icon_set: ex.attr_or(icon, "iconSet", String::new()),
                    icon_id: ex.attr_or(icon, "iconId", 0),
                })
                .collect(),
        }),
    }
}

fn extract_cfvos(ex: &Extractor<'_>, node: Node<'_, '_>) -> Vec<XlsxCfvo> {
    ex.children(node, "cfvo")
        .into_iter()
        .map(|cfvo| XlsxCfvo {
            type_: ex.attr_or(cfvo, "type", String::new()),
            value: ex.opt_attr(cfvo, "val").or_else(|| ex.opt_text(cfvo, "xm:f")),
            gte: ex.attr_or(cfvo, "gte", true),
        })
        .collect()
}
