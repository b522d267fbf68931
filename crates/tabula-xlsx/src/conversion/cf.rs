//! `cfRule` records to model conditional formats, plus the value helpers shared with export.

use tabula_model::{
    icons, CellIsOperator, CellIsRule, CfRule, ColorScaleRule, ColorScaleThreshold,
    ConditionalFormat, DataBarRule, IconSetIcons, IconSetRule, IconThreshold,
    InflectionOperator, ThresholdType,
};

use super::color::convert_color;
use super::style::StyleContext;
use super::IdSequence;
use crate::extraction::records::{
    XlsxCfRule, XlsxCfvo, XlsxColor, XlsxColorScale, XlsxConditionalFormat, XlsxDataBar,
    XlsxIconSet,
};
use crate::warnings::WarningKind;

const SLOT_NAMES: [&str; 3] = ["lower", "middle", "upper"];

/// One model conditional format per supported rule, in priority order.
pub fn convert_conditional_formats(
    formats: &[XlsxConditionalFormat],
    ctx: &StyleContext<'_>,
    ids: &mut IdSequence,
) -> Vec<ConditionalFormat> {
    let mut rules: Vec<(&XlsxCfRule, &[String])> = formats
        .iter()
        .flat_map(|cf| cf.rules.iter().map(move |rule| (rule, cf.sqref.as_slice())))
        .collect();
    rules.sort_by_key(|(rule, _)| rule.priority);

    rules
        .into_iter()
        .filter_map(|(rule, ranges)| {
            let converted = convert_rule(rule, ctx)?;
            Some(ConditionalFormat {
                id: ids.next_id(),
                ranges: ranges.to_vec(),
                stop_if_true: rule.stop_if_true,
                rule: converted,
            })
        })
        .collect()
}

fn convert_rule(rule: &XlsxCfRule, ctx: &StyleContext<'_>) -> Option<CfRule> {
    match rule.type_.as_str() {
        "cellIs" | "containsText" | "notContainsText" | "beginsWith" | "endsWith"
        | "containsBlanks" | "notContainsBlanks" => convert_cell_is(rule, ctx).map(CfRule::CellIsRule),
        "colorScale" => rule
            .color_scale
            .as_ref()
            .and_then(|cs| convert_color_scale(cs, ctx))
            .map(CfRule::ColorScaleRule),
        "iconSet" => rule
            .icon_set
            .as_ref()
            .map(|is| CfRule::IconSetRule(convert_icon_set(is, ctx))),
        "dataBar" => rule
            .data_bar
            .as_ref()
            .and_then(|db| convert_data_bar(db, ctx))
            .map(CfRule::DataBarRule),
        other => {
            ctx.warnings.generate_not_supported_warning(
                WarningKind::ConditionalFormatType,
                Some(other),
                None,
            );
            None
        }
    }
}

fn cell_is_operator(name: &str) -> Option<CellIsOperator> {
    Some(match name {
        "between" => CellIsOperator::Between,
        "notBetween" => CellIsOperator::NotBetween,
        "equal" => CellIsOperator::Equal,
        "notEqual" => CellIsOperator::NotEqual,
        "greaterThan" => CellIsOperator::GreaterThan,
        "greaterThanOrEqual" => CellIsOperator::GreaterThanOrEqual,
        "lessThan" => CellIsOperator::LessThan,
        "lessThanOrEqual" => CellIsOperator::LessThanOrEqual,
        _ => return None,
    })
}

pub fn cell_is_operator_name(operator: CellIsOperator) -> &'static str {
    match operator {
        CellIsOperator::Between => "between",
        CellIsOperator::NotBetween => "notBetween",
        CellIsOperator::Equal => "equal",
        CellIsOperator::NotEqual => "notEqual",
        CellIsOperator::GreaterThan => "greaterThan",
        CellIsOperator::GreaterThanOrEqual => "greaterThanOrEqual",
        CellIsOperator::LessThan => "lessThan",
        CellIsOperator::LessThanOrEqual => "lessThanOrEqual",
        CellIsOperator::BeginsWith => "beginsWith",
        CellIsOperator::ContainsText => "containsText",
        CellIsOperator::EndsWith => "endsWith",
        CellIsOperator::NotContains => "notContains",
        CellIsOperator::IsEmpty => "containsBlanks",
        CellIsOperator::IsNotEmpty => "notContainsBlanks",
    }
}

fn convert_cell_is(rule: &XlsxCfRule, ctx: &StyleContext<'_>) -> Option<CellIsRule> {
    let (operator, values) = match rule.type_.as_str() {
        "cellIs" => {
            let operator = rule.operator.as_deref().and_then(cell_is_operator);
            let Some(operator) = operator else {
                ctx.warnings.generate_not_supported_warning(
                    WarningKind::ConditionalFormatType,
                    rule.operator.as_deref(),
                    None,
                );
                return None;
            };
            let values: Vec<String> = rule
                .formulas
                .iter()
                .take(operator.arity())
                .map(|f| import_cf_value(f))
                .collect();
            if values.len() < operator.arity() {
                return None;
            }
            (operator, values)
        }
        "containsBlanks" => (CellIsOperator::IsEmpty, Vec::new()),
        "notContainsBlanks" => (CellIsOperator::IsNotEmpty, Vec::new()),
        text_rule => {
            let operator = match text_rule {
                "containsText" => CellIsOperator::ContainsText,
                "notContainsText" => CellIsOperator::NotContains,
                "beginsWith" => CellIsOperator::BeginsWith,
                _ => CellIsOperator::EndsWith,
            };
            (operator, vec![rule.text.clone().unwrap_or_default()])
        }
    };
    let style = rule
        .dxf_id
        .and_then(|id| ctx.styles.dxfs.get(id as usize))
        .map(|dxf| ctx.convert_dxf(dxf))
        .unwrap_or_default();
    Some(CellIsRule { operator, values, style })
}

/// Rule operand from an OOXML formula: numbers stay literal, quoted strings are unquoted,
/// anything else becomes a `=` formula.
pub fn import_cf_value(formula: &str) -> String {
    let formula = formula.trim();
    if formula.parse::<f64>().is_ok() {
        return formula.to_string();
    }
    if formula.len() >= 2 && formula.starts_with('"') && formula.ends_with('"') {
        let inner = &formula[1..formula.len() - 1];
        if !inner.replace("\"\"", "").contains('"') {
            return inner.replace("\"\"", "\"");
        }
    }
    format!("={formula}")
}

/// Inverse of [`import_cf_value`].
pub fn export_cf_value(value: &str) -> String {
    if let Some(formula) = value.strip_prefix('=') {
        return formula.to_string();
    }
    if value.trim().parse::<f64>().is_ok() {
        return value.trim().to_string();
    }
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn threshold_type(cfvo: &XlsxCfvo) -> ThresholdType {
    match cfvo.type_.as_str() {
        "num" => ThresholdType::Number,
        "percent" => ThresholdType::Percentage,
        "percentile" => ThresholdType::Percentile,
        "formula" => ThresholdType::Formula,
        _ => ThresholdType::Value,
    }
}

pub fn cfvo_type_name(type_: ThresholdType, is_max: bool) -> &'static str {
    match type_ {
        ThresholdType::Value if is_max => "max",
        ThresholdType::Value => "min",
        ThresholdType::Number => "num",
        ThresholdType::Percentage => "percent",
        ThresholdType::Percentile => "percentile",
        ThresholdType::Formula => "formula",
    }
}

fn convert_color_scale(scale: &XlsxColorScale, ctx: &StyleContext<'_>) -> Option<ColorScaleRule> {
    let len = scale.cfvos.len();
    if !(2..=3).contains(&len) || scale.colors.len() != len {
        return None;
    }
    let mut thresholds = Vec::with_capacity(len);
    for (cfvo, color) in scale.cfvos.iter().zip(&scale.colors) {
        let type_ = threshold_type(cfvo);
        thresholds.push(ColorScaleThreshold {
            type_,
            value: (type_ != ThresholdType::Value)
                .then(|| cfvo.value.clone())
                .flatten(),
            color: resolve_rule_color(Some(color), ctx)?,
        });
    }
    let maximum = thresholds.pop()?;
    let midpoint = (len == 3).then(|| thresholds.pop()).flatten();
    let minimum = thresholds.pop()?;
    Some(ColorScaleRule { minimum, midpoint, maximum })
}

/// Icon family of a built-in OOXML icon set.
fn icon_family(icon_set: &str) -> Option<&'static [&'static str; 3]> {
    if icon_set.contains("Arrows") {
        Some(&icons::ARROWS)
    } else if icon_set.contains("TrafficLights") || icon_set.contains("Signs") || icon_set.contains("RedToBlack") {
        Some(&icons::DOTS)
    } else if icon_set.contains("Symbols") {
        Some(&icons::SMILEYS)
    } else {
        None
    }
}

/// Number of icons of a set (`3Arrows` has 3).
fn icon_count(icon_set: &str) -> u32 {
    icon_set
        .chars()
        .next()
        .and_then(|c| c.to_digit(10))
        .unwrap_or(3)
}

/// Three-slot position of OOXML icon `id` in a set of `count` icons.
fn slot_of(id: u32, count: u32) -> usize {
    if id == 0 {
        0
    } else if id + 1 >= count {
        2
    } else {
        1
    }
}

/// `[first, middle, last]` of `items`.
fn pick_three<T: Clone>(items: &[T]) -> Option<[T; 3]> {
    let last = items.len().checked_sub(1)?;
    Some([items[0].clone(), items[last / 2 + last % 2].clone(), items[last].clone()])
}

fn convert_icon_set(set: &XlsxIconSet, ctx: &StyleContext<'_>) -> IconSetRule {
    let mut slots: [Option<&'static str>; 3] = [None; 3];
    if set.custom_icons.is_empty() {
        if let Some(family) = icon_family(&set.icon_set) {
            slots = [Some(family[0]), Some(family[1]), Some(family[2])];
        }
    } else {
        let indexed: Vec<(usize, &_)> = set.custom_icons.iter().enumerate().collect();
        if let Some(picked) = pick_three(&indexed) {
            for (slot, (_, icon)) in picked.into_iter().enumerate() {
                if icon.icon_set == "NoIcons" {
                    continue;
                }
                let position = slot_of(icon.icon_id, icon_count(&icon.icon_set));
                slots[slot] = icon_family(&icon.icon_set).map(|family| family[position]);
            }
        }
    }

    let icons_by_slot: Vec<String> = slots
        .iter()
        .enumerate()
        .map(|(slot, icon)| match icon {
            Some(icon) => icon.to_string(),
            None => {
                ctx.warnings.generate_not_supported_warning(
                    WarningKind::EmptyIcon,
                    Some(SLOT_NAMES[slot]),
                    None,
                );
                icons::DOTS[slot].to_string()
            }
        })
        .collect();

    let (lower_cfvo, upper_cfvo) = match pick_three(&set.cfvos) {
        Some([_, middle, last]) => (Some(middle), Some(last)),
        None => (None, None),
    };
    let mut icons = IconSetIcons {
        lower: icons_by_slot[0].clone(),
        middle: icons_by_slot[1].clone(),
        upper: icons_by_slot[2].clone(),
    };
    if set.reverse {
        std::mem::swap(&mut icons.upper, &mut icons.lower);
    }
    IconSetRule {
        icons,
        upper_inflection_point: inflection(upper_cfvo.as_ref(), "66"),
        lower_inflection_point: inflection(lower_cfvo.as_ref(), "33"),
    }
}

fn inflection(cfvo: Option<&XlsxCfvo>, default_percent: &str) -> IconThreshold {
    match cfvo {
        Some(cfvo) => IconThreshold {
            type_: match threshold_type(cfvo) {
                ThresholdType::Value => ThresholdType::Number,
                other => other,
            },
            value: cfvo.value.clone().unwrap_or_else(|| "0".to_string()),
            operator: if cfvo.gte { InflectionOperator::Ge } else { InflectionOperator::Gt },
        },
        None => IconThreshold {
            type_: ThresholdType::Percentage,
            value: default_percent.to_string(),
            operator: InflectionOperator::Ge,
        },
    }
}

fn convert_data_bar(bar: &XlsxDataBar, ctx: &StyleContext<'_>) -> Option<DataBarRule> {
    let color = resolve_rule_color(bar.color.as_ref(), ctx)?;
    Some(DataBarRule { color })
}

/// A color scale or data bar loses its rule when one of its colors does not resolve.
fn resolve_rule_color(color: Option<&XlsxColor>, ctx: &StyleContext<'_>) -> Option<String> {
    let resolved = color.and_then(|c| convert_color(c, ctx.theme));
    if resolved.is_none() {
        ctx.warnings
            .generate_not_supported_warning(WarningKind::CfColor, None, None);
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::records::{XlsxCfIcon, XlsxDxf, XlsxFill, XlsxStyleSheet};
    use tabula_model::CfStyle;
    use crate::extraction::theme::default_theme;
    use crate::warnings::WarningManager;
    use pretty_assertions::assert_eq;

    fn rule(type_: &str) -> XlsxCfRule {
        XlsxCfRule {
            type_: type_.to_string(),
            priority: 1,
            dxf_id: None,
            operator: None,
            text: None,
            formulas: Vec::new(),
            stop_if_true: false,
            color_scale: None,
            data_bar: None,
            icon_set: None,
        }
    }

    fn cfvo(type_: &str, value: Option<&str>) -> XlsxCfvo {
        XlsxCfvo { type_: type_.into(), value: value.map(str::to_string), gte: true }
    }

    fn convert(rules: Vec<XlsxCfRule>, styles: &XlsxStyleSheet, warnings: &WarningManager) -> Vec<ConditionalFormat> {
        let theme = default_theme();
        let ctx = StyleContext { styles, theme: &theme, warnings };
        let formats = vec![XlsxConditionalFormat { sqref: vec!["A1:A10".into()], rules }];
        convert_conditional_formats(&formats, &ctx, &mut IdSequence::default())
    }

    #[test]
    fn cell_is_rule_keeps_operands_and_dxf_style() {
        let styles = XlsxStyleSheet {
            dxfs: vec![XlsxDxf {
                fill: Some(XlsxFill { bg_color: Some(XlsxColor::rgb("FFFF0000")), ..Default::default() }),
                ..Default::default()
            }],
            ..Default::default()
        };
        let warnings = WarningManager::new();
        let cf = convert(
            vec![XlsxCfRule {
                operator: Some("between".into()),
                formulas: vec!["1".into(), "$B$1".into()],
                dxf_id: Some(0),
                ..rule("cellIs")
            }],
            &styles,
            &warnings,
        );
        assert_eq!(
            cf[0].rule,
            CfRule::CellIsRule(CellIsRule {
                operator: CellIsOperator::Between,
                values: vec!["1".into(), "=$B$1".into()],
                style: CfStyle { fill_color: Some("#FF0000".into()), ..Default::default() },
            })
        );
        assert_eq!(cf[0].ranges, vec!["A1:A10".to_string()]);
    }

    #[test]
    fn unsupported_rule_types_are_warned_and_dropped() {
        let warnings = WarningManager::new();
        let cf = convert(vec![rule("top10"), rule("containsBlanks")], &XlsxStyleSheet::default(), &warnings);
        assert_eq!(cf.len(), 1);
        assert_eq!(
            warnings.conversion_warnings(),
            vec![r#"Conditional format type "top10" is not yet supported."#.to_string()]
        );
    }

    #[test]
    fn color_scale_requires_matching_stops() {
        let warnings = WarningManager::new();
        let scale = |colors: usize| XlsxCfRule {
            color_scale: Some(XlsxColorScale {
                cfvos: vec![cfvo("min", None), cfvo("percentile", Some("50")), cfvo("max", None)],
                colors: vec![XlsxColor::rgb("FFF8696B"); colors],
            }),
            ..rule("colorScale")
        };
        assert!(convert(vec![scale(2)], &XlsxStyleSheet::default(), &warnings).is_empty());
        let cf = convert(vec![scale(3)], &XlsxStyleSheet::default(), &warnings);
        let CfRule::ColorScaleRule(rule) = &cf[0].rule else { panic!("expected a color scale") };
        assert_eq!(rule.minimum, ColorScaleThreshold { type_: ThresholdType::Value, value: None, color: "#F8696B".into() });
        assert_eq!(rule.midpoint.as_ref().map(|m| m.type_), Some(ThresholdType::Percentile));
    }

    #[test]
    fn rules_with_unresolved_colors_are_warned_and_dropped() {
        let warnings = WarningManager::new();
        let unknown_theme = XlsxColor { theme: Some(40), ..Default::default() };
        let scale = XlsxCfRule {
            color_scale: Some(XlsxColorScale {
                cfvos: vec![cfvo("min", None), cfvo("max", None)],
                colors: vec![XlsxColor::rgb("FF63BE7B"), unknown_theme],
            }),
            ..rule("colorScale")
        };
        let bar = XlsxCfRule {
            data_bar: Some(XlsxDataBar { cfvos: vec![cfvo("min", None), cfvo("max", None)], color: None }),
            ..rule("dataBar")
        };
        assert!(convert(vec![scale, bar], &XlsxStyleSheet::default(), &warnings).is_empty());
        assert_eq!(
            warnings.conversion_warnings(),
            vec!["Unresolved colors in conditional formats are not yet supported.".to_string()]
        );
    }

    #[test]
    fn five_icon_sets_keep_first_middle_and_last_thresholds() {
        let warnings = WarningManager::new();
        let cf = convert(
            vec![XlsxCfRule {
                icon_set: Some(XlsxIconSet {
                    icon_set: "5Arrows".into(),
                    cfvos: (0..5).map(|i| cfvo("percent", Some(&(i * 20).to_string()))).collect(),
                    reverse: true,
                    show_value: true,
                    custom_icons: Vec::new(),
                }),
                ..rule("iconSet")
            }],
            &XlsxStyleSheet::default(),
            &warnings,
        );
        let CfRule::IconSetRule(rule) = &cf[0].rule else { panic!("expected an icon set") };
        assert_eq!(rule.icons.upper, icons::ARROW_BAD);
        assert_eq!(rule.icons.lower, icons::ARROW_GOOD);
        assert_eq!(rule.lower_inflection_point.value, "40");
        assert_eq!(rule.upper_inflection_point.value, "80");
        assert!(warnings.conversion_warnings().is_empty());
    }

    #[test]
    fn empty_custom_icons_fall_back_to_dots() {
        let warnings = WarningManager::new();
        let icon = |set: &str, id| XlsxCfIcon { icon_set: set.into(), icon_id: id };
        let cf = convert(
            vec![XlsxCfRule {
                icon_set: Some(XlsxIconSet {
                    icon_set: "3Arrows".into(),
                    cfvos: vec![cfvo("percent", Some("0")), cfvo("percent", Some("33")), cfvo("percent", Some("67"))],
                    reverse: false,
                    show_value: true,
                    custom_icons: vec![icon("3Arrows", 0), icon("NoIcons", 0), icon("3Symbols", 2)],
                }),
                ..rule("iconSet")
            }],
            &XlsxStyleSheet::default(),
            &warnings,
        );
        let CfRule::IconSetRule(rule) = &cf[0].rule else { panic!("expected an icon set") };
        assert_eq!(
            rule.icons,
            IconSetIcons {
                upper: icons::SMILE_GOOD.into(),
                middle: icons::DOT_NEUTRAL.into(),
                lower: icons::ARROW_BAD.into(),
            }
        );
        assert_eq!(warnings.conversion_warnings().len(), 1);
    }

    #[test]
    fn cf_values_round_trip_through_export_form() {
        for value in ["12.5", "=$A$1*2", "say \"hi\""] {
            assert_eq!(import_cf_value(&export_cf_value(value)), value);
        }
    }
}
