//! Formula text between the host dialect and Excel.
//!
//! Import works on tokens so `$` markers and spacing survive untouched; export walks the
//! parsed AST.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::{Captures, Regex};
use tabula_formula::{ast_to_formula, lookup_function, parse, split_reference, tokenize, Ast, TokenKind};
use tabula_model::{
    col_to_letters, letters_to_col, parse_xc_with_flags, quote_sheet_name, CellRef, MAX_COLS, MAX_ROWS,
};

use crate::conversion::table_ref::{resolve_table_reference, TableZone, INVALID_REFERENCE};

/// Functions Excel stores with the `_xlfn.` marker.
pub const NON_RETROCOMPATIBLE_FUNCTIONS: &[&str] = &[
    "CEILING.MATH",
    "CONCAT",
    "DAYS",
    "FILTER",
    "FLOOR.MATH",
    "IFNA",
    "IFS",
    "MAXIFS",
    "MINIFS",
    "SEQUENCE",
    "SORT",
    "SWITCH",
    "TEXTJOIN",
    "UNIQUE",
    "XLOOKUP",
    "XOR",
];

/// Worksheet functions that also need the `_xlws.` marker.
const WORKSHEET_NAMESPACED: &[&str] = &["FILTER", "SORT"];

/// Optional arguments the host may omit but Excel requires, as `(function, argument index)`.
const FORCED_DEFAULT_ARGS: &[(&str, usize)] = &[("CEILING", 1), ("FLOOR", 1)];

const FUTURE_PREFIXES: &[&str] = &["_xlfn.", "_xlws."];

/// Name of the hidden sheet holding the cached values of sheet `sheet` of external book `index` (1-based).
pub fn external_sheet_name(sheet: &str, index: usize) -> String {
    format!("{sheet} (external {index})")
}

/// Where an imported formula lives and what it may refer to.
#[derive(Clone, Copy)]
pub struct ImportFormulaContext<'a> {
    pub sheet: &'a str,
    pub cell: CellRef,
    pub tables: &'a [TableZone],
}

/// OOXML formula text (no leading `=`) to host formula text.
pub fn import_formula(formula: &str, ctx: &ImportFormulaContext<'_>) -> String {
    let formula = rewrite_external_references(formula);
    let text: String = tokenize(&formula)
        .into_iter()
        .map(|token| match token.kind {
            TokenKind::Symbol => strip_future_prefixes(&token.value).to_string(),
            TokenKind::TableReference => {
                resolve_table_reference(&token.value, ctx.tables, ctx.sheet, ctx.cell)
                    .unwrap_or_else(|| INVALID_REFERENCE.to_string())
            }
            _ => token.value,
        })
        .collect();
    format!("={text}")
}

fn strip_future_prefixes(mut name: &str) -> &str {
    loop {
        let stripped = FUTURE_PREFIXES.iter().find_map(|prefix| {
            name.get(..prefix.len())
                .filter(|head| head.eq_ignore_ascii_case(prefix))
                .map(|_| &name[prefix.len()..])
        });
        match stripped {
            Some(rest) => name = rest,
            None => return name,
        }
    }
}

fn external_reference_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"'\[(\d+)\]((?:[^']|'')+)'!|\[(\d+)\]([A-Za-z0-9_.]+)!").expect("valid regex")
    })
}

/// `[1]Sheet1!A1` and `'[1]My Sheet'!A1` point to the hidden sheets imported from external books.
pub fn rewrite_external_references(formula: &str) -> String {
    if !formula.contains('[') {
        return formula.to_string();
    }
    let mut out = String::with_capacity(formula.len());
    for (idx, chunk) in formula.split('"').enumerate() {
        if idx > 0 {
            out.push('"');
        }
        if idx % 2 == 1 {
            out.push_str(chunk);
            continue;
        }
        let rewritten = external_reference_re().replace_all(chunk, |caps: &Captures<'_>| {
            let (index, sheet) = match (caps.get(1), caps.get(2)) {
                (Some(index), Some(sheet)) => (index.as_str(), sheet.as_str().replace("''", "'")),
                _ => (
                    caps.get(3).map_or("", |m| m.as_str()),
                    caps.get(4).map_or("", |m| m.as_str()).to_string(),
                ),
            };
            let index = index.parse::<usize>().unwrap_or_default();
            format!("{}!", quote_sheet_name(&external_sheet_name(&sheet, index)))
        });
        out.push_str(&rewritten);
    }
    out
}

/// Re-derive a shared formula written for `anchor` at `target`.
///
/// Each relative axis of each reference moves by the anchor-to-target offset; fixed (`$`) axes
/// are kept. Whole columns move on the column axis and whole rows on the row axis. A
/// reference pushed outside the grid becomes `#REF`.
pub fn offset_shared_formula(formula: &str, anchor: CellRef, target: CellRef) -> String {
    let d_row = i64::from(target.row) - i64::from(anchor.row);
    let d_col = i64::from(target.col) - i64::from(anchor.col);
    tokenize(formula)
        .into_iter()
        .map(|token| match token.kind {
            TokenKind::Reference => shift_reference(&token.value, d_row, d_col),
            _ => token.value,
        })
        .collect()
}

fn shift_reference(reference: &str, d_row: i64, d_col: i64) -> String {
    let (sheet, body) = split_reference(reference);
    let parts: Option<Vec<String>> = body
        .split(':')
        .map(|part| shift_cell(part, d_row, d_col))
        .collect();
    match parts {
        Some(parts) => match sheet {
            Some(sheet) => format!("{sheet}!{}", parts.join(":")),
            None => parts.join(":"),
        },
        None => INVALID_REFERENCE.to_string(),
    }
}

fn shift_cell(xc: &str, d_row: i64, d_col: i64) -> Option<String> {
    let Ok(mut flagged) = parse_xc_with_flags(xc) else {
        return shift_header(xc, d_row, d_col);
    };
    if !flagged.col_fixed {
        let col = i64::from(flagged.cell.col) + d_col;
        flagged.cell.col = u32::try_from(col).ok().filter(|c| *c < MAX_COLS)?;
    }
    if !flagged.row_fixed {
        let row = i64::from(flagged.cell.row) + d_row;
        flagged.cell.row = u32::try_from(row).ok().filter(|r| *r < MAX_ROWS)?;
    }
    Some(flagged.to_xc())
}

/// The column part of `A:C` or the row part of `2:5`.
fn shift_header(part: &str, d_row: i64, d_col: i64) -> Option<String> {
    let body = part;
    if body.is_empty() || body.starts_with('$') {
        return Some(part.to_string());
    }
    if body.bytes().all(|b| b.is_ascii_alphabetic()) {
        let col = i64::from(letters_to_col(body).ok()?) + d_col;
        let col = u32::try_from(col).ok().filter(|c| *c < MAX_COLS)?;
        return Some(col_to_letters(col));
    }
    if body.bytes().all(|b| b.is_ascii_digit()) {
        let row = body.parse::<i64>().ok()? + d_row;
        let row = u32::try_from(row).ok().filter(|r| (1..=MAX_ROWS).contains(r))?;
        return Some(row.to_string());
    }
    Some(part.to_string())
}

/// Host formula text (with or without `=`) to OOXML formula text (no leading `=`).
///
/// `None` when the formula calls a function Excel does not know; such cells are exported as
/// their cached value. Text that does not parse is passed through.
pub fn export_formula(formula: &str) -> Option<String> {
    let formula = formula.trim_start_matches('=');
    match parse(formula) {
        Ok(ast) => Some(ast_to_formula(&adapt_ast(ast)?)),
        Err(err) => {
            log::debug!("exporting unparsed formula {formula:?}: {err:?}");
            Some(formula.to_string())
        }
    }
}

fn adapt_ast(ast: Ast) -> Option<Ast> {
    Some(match ast {
        Ast::FunctionCall { name, args } => {
            let name = strip_future_prefixes(&name).to_ascii_uppercase();
            let mut args = args.into_iter().map(adapt_ast).collect::<Option<Vec<_>>>()?;
            if let Some(description) = lookup_function(&name) {
                if !description.is_exported {
                    return None;
                }
                for (function, index) in FORCED_DEFAULT_ARGS {
                    if *function != name {
                        continue;
                    }
                    while args.len() <= *index {
                        let default = description
                            .arg(args.len())
                            .and_then(|a| a.default_value)
                            .and_then(|d| parse(d).ok())
                            .unwrap_or(Ast::Empty);
                        args.push(default);
                    }
                }
            }
            let name = if NON_RETROCOMPATIBLE_FUNCTIONS.contains(&name.as_str()) {
                if WORKSHEET_NAMESPACED.contains(&name.as_str()) {
                    format!("_xlfn._xlws.{name}")
                } else {
                    format!("_xlfn.{name}")
                }
            } else {
                name
            };
            Ast::FunctionCall { name, args }
        }
        Ast::String(text) => Ast::String(iso_date(&text).unwrap_or(text)),
        Ast::Unary { op, operand } => Ast::Unary {
            op,
            operand: Box::new(adapt_ast(*operand)?),
        },
        Ast::Percent(operand) => Ast::Percent(Box::new(adapt_ast(*operand)?)),
        Ast::Binary { op, left, right } => Ast::Binary {
            op,
            left: Box::new(adapt_ast(*left)?),
            right: Box::new(adapt_ast(*right)?),
        },
        other => other,
    })
}

/// `12/31/2024` and `2024/12/31` become `2024-12-31`.
fn iso_date(text: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^(?:\d{1,2}/\d{1,2}/\d{4}|\d{4}/\d{1,2}/\d{1,2})$").expect("valid regex")
    });
    if !re.is_match(text.trim()) {
        return None;
    }
    ["%m/%d/%Y", "%Y/%m/%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text.trim(), fmt).ok())
        .map(|date| date.format("%Y-%m-%d").to_string())
}

/// True when a reference of `formula` has an axis without `$`.
pub fn has_relative_reference(formula: &str) -> bool {
    tokenize(formula.trim_start_matches('='))
        .iter()
        .filter(|token| token.kind == TokenKind::Reference)
        .any(|token| {
            let (_, body) = split_reference(&token.value);
            body.split(':').any(|part| {
                parse_xc_with_flags(part).is_ok_and(|flagged| !flagged.col_fixed || !flagged.row_fixed)
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn shift(formula: &str, target: &str) -> String {
        offset_shared_formula(
            formula,
            CellRef::from_xc("A1").unwrap(),
            CellRef::from_xc(target).unwrap(),
        )
    }

    #[test]
    fn shared_formulas_move_relative_axes_only() {
        assert_eq!(shift("=A1", "C3"), "=C3");
        assert_eq!(shift("=$A1", "C3"), "=$A3");
        assert_eq!(shift("=A$1", "C3"), "=C$1");
        assert_eq!(shift("=$A$1", "C3"), "=$A$1");
        assert_eq!(shift("=SUM(A1:B2,3,C2)", "C3"), "=SUM(C3:D4,3,E4)");
        assert_eq!(shift("=Sheet2!B2*2", "A2"), "=Sheet2!B3*2");
    }

    #[test]
    fn shared_formulas_keep_quoted_sheet_names() {
        assert_eq!(shift("='My Data'!B1*2", "A2"), "='My Data'!B2*2");
        assert_eq!(shift("=SUM('It''s'!A1:A3)", "B1"), "=SUM('It''s'!B1:B3)");
    }

    #[test]
    fn whole_columns_and_rows_move_on_their_axis() {
        assert_eq!(shift("=SUM(A:A)", "B2"), "=SUM(B:B)");
        assert_eq!(shift("=SUM(1:1)", "B2"), "=SUM(2:2)");
        assert_eq!(shift("=SUM($A:B)", "C3"), "=SUM($A:D)");
        assert_eq!(shift("=SUM($1:2)", "C3"), "=SUM($1:4)");
        assert_eq!(shift("=COUNT(Sheet2!C:D)", "B1"), "=COUNT(Sheet2!D:E)");
    }

    #[test]
    fn references_pushed_off_the_grid_are_invalid() {
        let got = offset_shared_formula("=A1+1", CellRef::from_xc("B2").unwrap(), CellRef::from_xc("A2").unwrap());
        assert_eq!(got, "=#REF+1");
    }

    #[test]
    fn future_prefixes_are_stripped_on_import() {
        let ctx = ImportFormulaContext { sheet: "Sheet1", cell: CellRef::new(0, 0), tables: &[] };
        assert_eq!(import_formula("_xlfn._xlws.SORT(A1:A4)", &ctx), "=SORT(A1:A4)");
        assert_eq!(import_formula("_xlfn.CONCAT(\"_xlfn.\",B1)", &ctx), "=CONCAT(\"_xlfn.\",B1)");
    }

    #[test]
    fn external_references_target_imported_sheets() {
        assert_eq!(
            rewrite_external_references("[1]Prices!A1+'[2]Q1 Data'!B2&\"[3]x!\""),
            "'Prices (external 1)'!A1+'Q1 Data (external 2)'!B2&\"[3]x!\""
        );
    }

    #[test]
    fn export_adapts_function_calls() {
        assert_eq!(export_formula("=concat(A1, \"x\")").as_deref(), Some("_xlfn.CONCAT(A1,\"x\")"));
        assert_eq!(export_formula("=FILTER(A1:A9,B1:B9>0)").as_deref(), Some("_xlfn._xlws.FILTER(A1:A9,B1:B9>0)"));
        assert_eq!(export_formula("=CEILING(A1)").as_deref(), Some("CEILING(A1,1)"));
        assert_eq!(export_formula("=WAIT(100)"), None);
        assert_eq!(export_formula("=MYUDF(1)").as_deref(), Some("MYUDF(1)"));
    }

    #[test]
    fn date_literals_become_iso() {
        assert_eq!(
            export_formula("=A1>\"12/31/2024\"").as_deref(),
            Some("A1>\"2024-12-31\"")
        );
    }

    #[test]
    fn relative_references_are_detected() {
        assert!(has_relative_reference("=A1*2"));
        assert!(has_relative_reference("=$A1"));
        assert!(has_relative_reference("=SUM($A$1:B$2)"));
        assert!(!has_relative_reference("=$B$1+1"));
        assert!(!has_relative_reference("=Sheet2!$C$3"));
        assert!(!has_relative_reference("=\"A1\""));
    }
}
