use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComparisonOperator {
    Between,
    NotBetween,
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl ComparisonOperator {
    /// `between`/`notBetween` take two operands, every other operator one.
    pub fn arity(self) -> usize {
        match self {
            ComparisonOperator::Between | ComparisonOperator::NotBetween => 2,
            _ => 1,
        }
    }
}

/// How a list validation is rendered in the cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ListDisplayStyle {
    #[default]
    Arrow,
    PlainText,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum DataValidationCriterion {
    DecimalCompare {
        operator: ComparisonOperator,
        values: Vec<String>,
    },
    ValueInRange {
        range: String,
        #[serde(default)]
        display_style: ListDisplayStyle,
    },
    ValueInList {
        values: Vec<String>,
        #[serde(default)]
        display_style: ListDisplayStyle,
    },
    /// Dates are stored as ISO `yyyy-mm-dd` strings (or formulas starting with `=`).
    DateCompare {
        operator: ComparisonOperator,
        values: Vec<String>,
    },
    CustomFormula {
        formula: String,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataValidationRule {
    pub id: String,
    pub ranges: Vec<String>,
    #[serde(default)]
    pub is_blocking: bool,
    pub criterion: DataValidationCriterion,
}
