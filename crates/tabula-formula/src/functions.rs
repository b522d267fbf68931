//! Descriptions of the spreadsheet functions known to the host.
//!
//! Only signatures are described here (argument names, optionality, repetition and
//! documented defaults); evaluation lives elsewhere.

use std::collections::HashMap;
use std::sync::OnceLock;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ArgDefinition {
    pub name: &'static str,
    pub optional: bool,
    pub repeating: bool,
    /// Value used when the argument is omitted, as formula text.
    pub default_value: Option<&'static str>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FunctionDescription {
    pub name: &'static str,
    pub args: &'static [ArgDefinition],
    /// False for host-only functions that have no Excel counterpart.
    pub is_exported: bool,
}

impl FunctionDescription {
    pub fn min_args(&self) -> usize {
        self.args
            .iter()
            .filter(|a| !a.optional && !a.repeating)
            .count()
            + usize::from(self.args.iter().any(|a| a.repeating && !a.optional))
    }

    /// `None` when a repeating argument makes the count unbounded.
    pub fn max_args(&self) -> Option<usize> {
        if self.args.iter().any(|a| a.repeating) {
            None
        } else {
            Some(self.args.len())
        }
    }

    pub fn arg(&self, index: usize) -> Option<&ArgDefinition> {
        self.args.get(index)
    }
}

const fn req(name: &'static str) -> ArgDefinition {
    ArgDefinition {
        name,
        optional: false,
        repeating: false,
        default_value: None,
    }
}

const fn opt(name: &'static str) -> ArgDefinition {
    ArgDefinition {
        name,
        optional: true,
        repeating: false,
        default_value: None,
    }
}

const fn opt_default(name: &'static str, default_value: &'static str) -> ArgDefinition {
    ArgDefinition {
        name,
        optional: true,
        repeating: false,
        default_value: Some(default_value),
    }
}

const fn rep(name: &'static str) -> ArgDefinition {
    ArgDefinition {
        name,
        optional: false,
        repeating: true,
        default_value: None,
    }
}

const fn opt_rep(name: &'static str) -> ArgDefinition {
    ArgDefinition {
        name,
        optional: true,
        repeating: true,
        default_value: None,
    }
}

macro_rules! exported {
    ($name:expr, $args:expr) => {
        FunctionDescription {
            name: $name,
            args: $args,
            is_exported: true,
        }
    };
}

macro_rules! host_only {
    ($name:expr, $args:expr) => {
        FunctionDescription {
            name: $name,
            args: $args,
            is_exported: false,
        }
    };
}

const VALUES: &[ArgDefinition] = &[req("value1"), opt_rep("value2")];
const NUMBER: &[ArgDefinition] = &[req("value")];
const CRITERIA_RANGE: &[ArgDefinition] = &[req("criteria_range"), req("criterion"), opt("sum_range")];
const ROUNDING: &[ArgDefinition] = &[req("value"), opt_default("places", "0")];
const SIGNIFICANCE: &[ArgDefinition] = &[req("value"), opt_default("factor", "1")];
const TEXT_SPLIT: &[ArgDefinition] = &[req("text"), opt_default("number_of_characters", "1")];
const NONE: &[ArgDefinition] = &[];

static FUNCTIONS: &[FunctionDescription] = &[
    exported!("ABS", NUMBER),
    exported!("AND", &[req("logical_expression1"), opt_rep("logical_expression2")]),
    exported!("AVERAGE", VALUES),
    exported!("AVERAGEIF", CRITERIA_RANGE),
    exported!("CEILING", SIGNIFICANCE),
    exported!("CEILING.MATH", &[req("number"), opt_default("significance", "1"), opt_default("mode", "0")]),
    exported!("CHOOSE", &[req("index"), rep("choice")]),
    exported!("CONCAT", VALUES),
    exported!("CONCATENATE", VALUES),
    exported!("COUNT", VALUES),
    exported!("COUNTA", VALUES),
    exported!("COUNTBLANK", &[req("value1"), opt_rep("value2")]),
    exported!("COUNTIF", &[req("range"), req("criterion")]),
    exported!("COUNTIFS", &[rep("criteria_range"), rep("criterion")]),
    exported!("DATE", &[req("year"), req("month"), req("day")]),
    exported!("DAY", &[req("date")]),
    exported!("DAYS", &[req("end_date"), req("start_date")]),
    exported!("EDATE", &[req("start_date"), req("months")]),
    exported!("EOMONTH", &[req("start_date"), req("months")]),
    exported!("FILTER", &[req("range"), rep("condition")]),
    exported!("FIND", &[req("search_for"), req("text_to_search"), opt_default("starting_at", "1")]),
    exported!("FLOOR", SIGNIFICANCE),
    exported!("FLOOR.MATH", &[req("number"), opt_default("significance", "1"), opt_default("mode", "0")]),
    exported!("HLOOKUP", &[req("search_key"), req("range"), req("index"), opt_default("is_sorted", "TRUE")]),
    exported!("IF", &[req("logical_expression"), req("value_if_true"), opt_default("value_if_false", "FALSE")]),
    exported!("IFERROR", &[req("value"), opt_default("value_if_error", "\"\"")]),
    exported!("IFNA", &[req("value"), opt_default("value_if_error", "\"\"")]),
    exported!("IFS", &[rep("condition"), rep("value")]),
    exported!("INDEX", &[req("reference"), opt("row"), opt("column")]),
    exported!("INT", NUMBER),
    exported!("ISBLANK", NUMBER),
    exported!("ISERROR", NUMBER),
    exported!("ISNUMBER", NUMBER),
    exported!("ISTEXT", NUMBER),
    exported!("LEFT", TEXT_SPLIT),
    exported!("LEN", &[req("text")]),
    exported!("LOWER", &[req("text")]),
    exported!("MATCH", &[req("search_key"), req("range"), opt_default("search_type", "1")]),
    exported!("MAX", VALUES),
    exported!("MAXIFS", &[req("range"), rep("criteria_range"), rep("criterion")]),
    exported!("MEDIAN", VALUES),
    exported!("MID", &[req("text"), req("starting_at"), req("extract_length")]),
    exported!("MIN", VALUES),
    exported!("MINIFS", &[req("range"), rep("criteria_range"), rep("criterion")]),
    exported!("MOD", &[req("dividend"), req("divisor")]),
    exported!("MONTH", &[req("date")]),
    exported!("NOT", &[req("logical_expression")]),
    exported!("NOW", NONE),
    exported!("OR", &[req("logical_expression1"), opt_rep("logical_expression2")]),
    exported!("POWER", &[req("base"), req("exponent")]),
    exported!("PRODUCT", VALUES),
    exported!("RAND", NONE),
    exported!("RANDBETWEEN", &[req("low"), req("high")]),
    exported!("RIGHT", TEXT_SPLIT),
    exported!("ROUND", ROUNDING),
    exported!("ROUNDDOWN", ROUNDING),
    exported!("ROUNDUP", ROUNDING),
    exported!("SEQUENCE", &[req("rows"), opt_default("columns", "1"), opt_default("start", "1"), opt_default("step", "1")]),
    exported!("SORT", &[req("range"), opt_rep("sort_column")]),
    exported!("SQRT", NUMBER),
    exported!("STDEV", VALUES),
    exported!("SUBSTITUTE", &[req("text_to_search"), req("search_for"), req("replace_with"), opt("occurrence_number")]),
    exported!("SUM", VALUES),
    exported!("SUMIF", CRITERIA_RANGE),
    exported!("SUMIFS", &[req("sum_range"), rep("criteria_range"), rep("criterion")]),
    exported!("SUMPRODUCT", VALUES),
    exported!("SWITCH", &[req("expression"), rep("case"), rep("value")]),
    exported!("TEXT", &[req("number"), req("format")]),
    exported!("TEXTJOIN", &[req("delimiter"), req("ignore_empty"), rep("text")]),
    exported!("TODAY", NONE),
    exported!("TRIM", &[req("text")]),
    exported!("UNIQUE", &[req("range"), opt_default("by_column", "FALSE"), opt_default("exactly_once", "FALSE")]),
    exported!("UPPER", &[req("text")]),
    exported!("VLOOKUP", &[req("search_key"), req("range"), req("index"), opt_default("is_sorted", "TRUE")]),
    exported!("WEEKDAY", &[req("date"), opt_default("type", "1")]),
    exported!("XLOOKUP", &[req("search_key"), req("lookup_range"), req("return_range"), opt("if_not_found"), opt_default("match_mode", "0"), opt_default("search_mode", "1")]),
    exported!("XOR", &[req("logical_expression1"), opt_rep("logical_expression2")]),
    exported!("YEAR", &[req("date")]),
    host_only!("WAIT", &[req("ms")]),
    host_only!("GETPIVOTDATA.HOST", &[req("pivot_id"), req("measure_name"), opt_rep("domain_field_name")]),
];

/// Case-insensitive lookup table over the known function descriptions.
pub struct FunctionRegistry {
    functions: HashMap<String, &'static FunctionDescription>,
}

impl FunctionRegistry {
    pub fn global() -> &'static FunctionRegistry {
        static REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();
        REGISTRY.get_or_init(|| FunctionRegistry {
            functions: FUNCTIONS
                .iter()
                .map(|f| (f.name.to_ascii_uppercase(), f))
                .collect(),
        })
    }

    pub fn get(&self, name: &str) -> Option<&'static FunctionDescription> {
        let upper = name.to_ascii_uppercase();
        if let Some(f) = self.functions.get(&upper) {
            return Some(*f);
        }
        upper
            .strip_prefix("_XLFN.")
            .and_then(|stripped| self.functions.get(stripped).copied())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static FunctionDescription> + '_ {
        self.functions.values().copied()
    }
}

pub fn lookup_function(name: &str) -> Option<&'static FunctionDescription> {
    FunctionRegistry::global().get(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity() {
        let round = lookup_function("round").unwrap();
        assert_eq!(round.min_args(), 1);
        assert_eq!(round.max_args(), Some(2));
        assert_eq!(round.arg(1).and_then(|a| a.default_value), Some("0"));

        let sum = lookup_function("SUM").unwrap();
        assert_eq!(sum.min_args(), 1);
        assert_eq!(sum.max_args(), None);
    }

    #[test]
    fn prefixed_names_resolve() {
        assert_eq!(lookup_function("_xlfn.XLOOKUP").map(|f| f.name), Some("XLOOKUP"));
        assert!(lookup_function("NOPE").is_none());
    }

    #[test]
    fn host_only_functions_are_not_exported() {
        assert!(!lookup_function("WAIT").unwrap().is_exported);
        assert!(lookup_function("SUM").unwrap().is_exported);
    }
}
