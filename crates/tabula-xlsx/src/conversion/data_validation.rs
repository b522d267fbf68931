//! `dataValidation` records to model rules and back.

use std::sync::OnceLock;

use regex::Regex;
use tabula_model::format::{datetime_to_serial, serial_to_datetime};
use tabula_model::{
    format_number_literal, ComparisonOperator, DataValidationCriterion, DataValidationRule,
    ListDisplayStyle,
};

use super::cf::{export_cf_value, import_cf_value};
use super::IdSequence;
use crate::extraction::records::XlsxDataValidation;
use crate::warnings::{WarningKind, WarningManager};

pub const SUPPORTED_TYPES: &[&str] = &["decimal", "whole", "list", "date", "custom"];

fn range_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:(?:'(?:[^']|'')+'|[A-Za-z0-9_.]+)!)?\$?[A-Za-z]{1,3}\$?\d+(?::\$?[A-Za-z]{1,3}\$?\d+)?$")
            .expect("valid regex")
    })
}

fn parse_operator(name: &str) -> Option<ComparisonOperator> {
    Some(match name {
        "between" => ComparisonOperator::Between,
        "notBetween" => ComparisonOperator::NotBetween,
        "equal" => ComparisonOperator::Equal,
        "notEqual" => ComparisonOperator::NotEqual,
        "greaterThan" => ComparisonOperator::GreaterThan,
        "greaterThanOrEqual" => ComparisonOperator::GreaterThanOrEqual,
        "lessThan" => ComparisonOperator::LessThan,
        "lessThanOrEqual" => ComparisonOperator::LessThanOrEqual,
        _ => return None,
    })
}

pub fn operator_name(operator: ComparisonOperator) -> &'static str {
    match operator {
        ComparisonOperator::Between => "between",
        ComparisonOperator::NotBetween => "notBetween",
        ComparisonOperator::Equal => "equal",
        ComparisonOperator::NotEqual => "notEqual",
        ComparisonOperator::GreaterThan => "greaterThan",
        ComparisonOperator::GreaterThanOrEqual => "greaterThanOrEqual",
        ComparisonOperator::LessThan => "lessThan",
        ComparisonOperator::LessThanOrEqual => "lessThanOrEqual",
    }
}

pub fn convert_data_validations(
    validations: &[XlsxDataValidation],
    warnings: &WarningManager,
    ids: &mut IdSequence,
) -> Vec<DataValidationRule> {
    validations
        .iter()
        .filter_map(|dv| {
            let criterion = convert_criterion(dv, warnings)?;
            Some(DataValidationRule {
                id: ids.next_id(),
                ranges: dv.sqref.clone(),
                is_blocking: dv.show_error_message && dv.error_style == "stop",
                criterion,
            })
        })
        .collect()
}

fn convert_criterion(dv: &XlsxDataValidation, warnings: &WarningManager) -> Option<DataValidationCriterion> {
    let formula1 = dv.formula1.as_deref().map(str::trim);
    match dv.type_.as_str() {
        "list" => {
            let display_style = if dv.hide_dropdown {
                ListDisplayStyle::PlainText
            } else {
                ListDisplayStyle::Arrow
            };
            let formula = formula1?;
            if range_re().is_match(formula) {
                return Some(DataValidationCriterion::ValueInRange {
                    range: formula.to_string(),
                    display_style,
                });
            }
            let literal = formula.strip_prefix('"').and_then(|f| f.strip_suffix('"'));
            match literal {
                Some(list) => Some(DataValidationCriterion::ValueInList {
                    values: list.split(',').map(|v| v.trim().to_string()).collect(),
                    display_style,
                }),
                None => {
                    warnings.generate_not_supported_warning(
                        WarningKind::DataValidationType,
                        Some("list from formula"),
                        None,
                    );
                    None
                }
            }
        }
        "decimal" | "whole" | "date" => {
            let operator_name = if dv.operator.is_empty() { "between" } else { dv.operator.as_str() };
            let Some(operator) = parse_operator(operator_name) else {
                warnings.generate_not_supported_warning(
                    WarningKind::DataValidationOperator,
                    Some(operator_name),
                    None,
                );
                return None;
            };
            let operands: Vec<&str> = [formula1, dv.formula2.as_deref().map(str::trim)]
                .into_iter()
                .flatten()
                .take(operator.arity())
                .collect();
            if operands.len() < operator.arity() {
                return None;
            }
            if dv.type_ == "date" {
                let values = operands.into_iter().map(import_date_operand).collect();
                Some(DataValidationCriterion::DateCompare { operator, values })
            } else {
                let values = operands.into_iter().map(import_cf_value).collect();
                Some(DataValidationCriterion::DecimalCompare { operator, values })
            }
        }
        "custom" => Some(DataValidationCriterion::CustomFormula {
            formula: format!("={}", formula1?),
        }),
        other => {
            warnings.generate_not_supported_warning(
                WarningKind::DataValidationType,
                Some(other),
                Some(SUPPORTED_TYPES),
            );
            None
        }
    }
}

/// Date serials become ISO dates; anything else is kept as a formula.
fn import_date_operand(operand: &str) -> String {
    operand
        .parse::<f64>()
        .ok()
        .and_then(serial_to_datetime)
        .map(|dt| dt.date().format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| format!("={operand}"))
}

fn export_date_operand(value: &str) -> String {
    if let Some(formula) = value.strip_prefix('=') {
        return formula.to_string();
    }
    match chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) => date
            .and_hms_opt(0, 0, 0)
            .map(|dt| format_number_literal(datetime_to_serial(dt)))
            .unwrap_or_else(|| value.to_string()),
        Err(_) => export_cf_value(value),
    }
}

/// OOXML record of a model rule.
pub fn export_data_validation(rule: &DataValidationRule) -> XlsxDataValidation {
    let mut dv = XlsxDataValidation {
        type_: String::new(),
        operator: String::new(),
        sqref: rule.ranges.clone(),
        formula1: None,
        formula2: None,
        error_style: "stop".to_string(),
        show_error_message: rule.is_blocking,
        allow_blank: true,
        hide_dropdown: false,
    };
    let set_operands = |dv: &mut XlsxDataValidation, values: Vec<String>| {
        let mut values = values.into_iter();
        dv.formula1 = values.next();
        dv.formula2 = values.next();
    };
    match &rule.criterion {
        DataValidationCriterion::DecimalCompare { operator, values } => {
            dv.type_ = "decimal".into();
            dv.operator = operator_name(*operator).into();
            set_operands(&mut dv, values.iter().map(|v| export_cf_value(v)).collect());
        }
        DataValidationCriterion::DateCompare { operator, values } => {
            dv.type_ = "date".into();
            dv.operator = operator_name(*operator).into();
            set_operands(&mut dv, values.iter().map(|v| export_date_operand(v)).collect());
        }
        DataValidationCriterion::ValueInRange { range, display_style } => {
            dv.type_ = "list".into();
            dv.hide_dropdown = *display_style == ListDisplayStyle::PlainText;
            dv.formula1 = Some(range.trim_start_matches('=').to_string());
        }
        DataValidationCriterion::ValueInList { values, display_style } => {
            dv.type_ = "list".into();
            dv.hide_dropdown = *display_style == ListDisplayStyle::PlainText;
            dv.formula1 = Some(format!("\"{}\"", values.join(",")));
        }
        DataValidationCriterion::CustomFormula { formula } => {
            dv.type_ = "custom".into();
            dv.formula1 = Some(formula.trim_start_matches('=').to_string());
        }
    }
    dv
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dv(type_: &str, operator: &str, f1: Option<&str>, f2: Option<&str>) -> XlsxDataValidation {
        XlsxDataValidation {
            type_: type_.into(),
            operator: operator.into(),
            sqref: vec!["B2:B9".into()],
            formula1: f1.map(str::to_string),
            formula2: f2.map(str::to_string),
            error_style: "stop".into(),
            show_error_message: true,
            allow_blank: true,
            hide_dropdown: false,
        }
    }

    fn criteria(records: &[XlsxDataValidation], warnings: &WarningManager) -> Vec<DataValidationCriterion> {
        convert_data_validations(records, warnings, &mut IdSequence::default())
            .into_iter()
            .map(|r| r.criterion)
            .collect()
    }

    #[test]
    fn lists_are_split_between_ranges_and_literals() {
        let warnings = WarningManager::new();
        let got = criteria(
            &[
                dv("list", "", Some("'My Sheet'!$A$1:$A$4"), None),
                dv("list", "", Some("\"yes,no, maybe\""), None),
                dv("list", "", Some("INDIRECT(A1)"), None),
            ],
            &warnings,
        );
        assert_eq!(
            got,
            vec![
                DataValidationCriterion::ValueInRange {
                    range: "'My Sheet'!$A$1:$A$4".into(),
                    display_style: ListDisplayStyle::Arrow,
                },
                DataValidationCriterion::ValueInList {
                    values: vec!["yes".into(), "no".into(), "maybe".into()],
                    display_style: ListDisplayStyle::Arrow,
                },
            ]
        );
        assert_eq!(warnings.conversion_warnings().len(), 1);
    }

    #[test]
    fn operand_count_follows_the_operator() {
        let warnings = WarningManager::new();
        let got = criteria(
            &[
                dv("decimal", "between", Some("1"), Some("10")),
                dv("whole", "greaterThan", Some("5"), Some("99")),
                dv("date", "lessThan", Some("45292"), None),
            ],
            &warnings,
        );
        assert_eq!(
            got,
            vec![
                DataValidationCriterion::DecimalCompare {
                    operator: ComparisonOperator::Between,
                    values: vec!["1".into(), "10".into()],
                },
                DataValidationCriterion::DecimalCompare {
                    operator: ComparisonOperator::GreaterThan,
                    values: vec!["5".into()],
                },
                DataValidationCriterion::DateCompare {
                    operator: ComparisonOperator::LessThan,
                    values: vec!["2024-01-01".into()],
                },
            ]
        );
    }

    #[test]
    fn unsupported_types_are_warned() {
        let warnings = WarningManager::new();
        assert!(criteria(&[dv("textLength", "lessThan", Some("3"), None)], &warnings).is_empty());
        assert_eq!(
            warnings.conversion_warnings(),
            vec![r#"Data validation type "textLength" is not yet supported. Only decimal, whole, list, date, custom are currently supported."#.to_string()]
        );
    }

    #[test]
    fn exported_rules_import_back() {
        let warnings = WarningManager::new();
        let rules = vec![
            DataValidationRule {
                id: "1".into(),
                ranges: vec!["A1:A3".into()],
                is_blocking: true,
                criterion: DataValidationCriterion::DateCompare {
                    operator: ComparisonOperator::Between,
                    values: vec!["2024-01-01".into(), "2024-12-31".into()],
                },
            },
            DataValidationRule {
                id: "2".into(),
                ranges: vec!["C1".into()],
                is_blocking: false,
                criterion: DataValidationCriterion::CustomFormula { formula: "=A1>0".into() },
            },
        ];
        let records: Vec<_> = rules.iter().map(export_data_validation).collect();
        let back = convert_data_validations(&records, &warnings, &mut IdSequence::default());
        assert_eq!(back, rules);
    }
}
