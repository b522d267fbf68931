use serde::{Deserialize, Serialize};

/// Comparison performed by a [`CellIsRule`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CellIsOperator {
    BeginsWith,
    Between,
    ContainsText,
    EndsWith,
    Equal,
    GreaterThan,
    GreaterThanOrEqual,
    IsEmpty,
    IsNotEmpty,
    LessThan,
    LessThanOrEqual,
    NotBetween,
    NotContains,
    NotEqual,
}

impl CellIsOperator {
    /// Number of operands the operator consumes.
    pub fn arity(self) -> usize {
        match self {
            CellIsOperator::IsEmpty | CellIsOperator::IsNotEmpty => 0,
            CellIsOperator::Between | CellIsOperator::NotBetween => 2,
            _ => 1,
        }
    }
}

/// Partial style applied by a matching [`CellIsRule`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CfStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strikethrough: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellIsRule {
    pub operator: CellIsOperator,
    /// At most two operands, stored as entered (formulas keep their leading `=`).
    pub values: Vec<String>,
    pub style: CfStyle,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ThresholdType {
    /// Lowest/highest value of the range (no explicit value).
    Value,
    Number,
    Percentage,
    Percentile,
    Formula,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorScaleThreshold {
    #[serde(rename = "type")]
    pub type_: ThresholdType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// `#RRGGBB`
    pub color: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorScaleRule {
    pub minimum: ColorScaleThreshold,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub midpoint: Option<ColorScaleThreshold>,
    pub maximum: ColorScaleThreshold,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InflectionOperator {
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconThreshold {
    #[serde(rename = "type")]
    pub type_: ThresholdType,
    pub value: String,
    pub operator: InflectionOperator,
}

/// Icon names of an icon set, by position.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconSetIcons {
    pub upper: String,
    pub middle: String,
    pub lower: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconSetRule {
    pub icons: IconSetIcons,
    pub upper_inflection_point: IconThreshold,
    pub lower_inflection_point: IconThreshold,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataBarRule {
    /// `#RRGGBB`
    pub color: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum CfRule {
    CellIsRule(CellIsRule),
    ColorScaleRule(ColorScaleRule),
    IconSetRule(IconSetRule),
    DataBarRule(DataBarRule),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalFormat {
    pub id: String,
    pub ranges: Vec<String>,
    #[serde(default)]
    pub stop_if_true: bool,
    pub rule: CfRule,
}

/// Built-in icons, grouped by set. Index convention: `bad`, `neutral`, `good`.
pub mod icons {
    pub const ARROW_GOOD: &str = "arrowGood";
    pub const ARROW_NEUTRAL: &str = "arrowNeutral";
    pub const ARROW_BAD: &str = "arrowBad";
    pub const SMILE_GOOD: &str = "smileGood";
    pub const SMILE_NEUTRAL: &str = "smileNeutral";
    pub const SMILE_BAD: &str = "smileBad";
    pub const DOT_GOOD: &str = "dotGood";
    pub const DOT_NEUTRAL: &str = "dotNeutral";
    pub const DOT_BAD: &str = "dotBad";

    /// `[bad, neutral, good]`
    pub const ARROWS: [&str; 3] = [ARROW_BAD, ARROW_NEUTRAL, ARROW_GOOD];
    pub const SMILEYS: [&str; 3] = [SMILE_BAD, SMILE_NEUTRAL, SMILE_GOOD];
    pub const DOTS: [&str; 3] = [DOT_BAD, DOT_NEUTRAL, DOT_GOOD];

    /// Returns the set (as `[bad, neutral, good]`) an icon belongs to and its slot.
    pub fn locate(icon: &str) -> Option<(&'static [&'static str; 3], usize)> {
        for set in [&ARROWS, &SMILEYS, &DOTS] {
            if let Some(slot) = set.iter().position(|i| *i == icon) {
                return Some((set, slot));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_serializes_with_type_tag() {
        let cf = ConditionalFormat {
            id: "cf1".to_string(),
            ranges: vec!["A1:A5".to_string()],
            stop_if_true: false,
            rule: CfRule::DataBarRule(DataBarRule {
                color: "#FF0000".to_string(),
            }),
        };
        let json = serde_json::to_value(&cf).unwrap();
        assert_eq!(json["rule"]["type"], "dataBarRule");
        let back: ConditionalFormat = serde_json::from_value(json).unwrap();
        assert_eq!(back, cf);
    }

    #[test]
    fn icons_are_located_in_their_set() {
        assert_eq!(icons::locate("dotNeutral").map(|(_, slot)| slot), Some(1));
        assert!(icons::locate("unknown").is_none());
    }

    #[test]
    fn operator_arity() {
        assert_eq!(CellIsOperator::Between.arity(), 2);
        assert_eq!(CellIsOperator::IsEmpty.arity(), 0);
        assert_eq!(CellIsOperator::GreaterThan.arity(), 1);
    }
}
