//! Formula tokenizer.
//!
//! Tokens keep their exact source text so a formula can be rebuilt by concatenating token
//! values. References are recognized eagerly: `Sheet1!$A$1:B2`, `'My sheet'!C3`,
//! `[1]Data!A1`, `A:C` and `2:5` each come out as one [`TokenKind::Reference`].

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Operator,
    Number,
    String,
    /// Identifiers: function names, named ranges, `TRUE`/`FALSE`.
    Symbol,
    Space,
    ArgSeparator,
    LeftParen,
    RightParen,
    Reference,
    /// Structured table reference such as `Table1[[#Data],[Price]]`.
    TableReference,
    Error,
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
}

impl Token {
    fn new(kind: TokenKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

const ERROR_LITERALS: &[&str] = &[
    "#DIV/0!", "#N/A", "#NAME?", "#NULL!", "#NUM!", "#REF!", "#VALUE!", "#SPILL!", "#CALC!",
    "#GETTING_DATA", "#ERROR", "#REF",
];

const TWO_CHAR_OPERATORS: &[&str] = &["<>", "<=", ">="];
const OPERATORS: &[char] = &['+', '-', '*', '/', '^', '&', '=', '<', '>', '%', ':'];

pub fn tokenize(formula: &str) -> Vec<Token> {
    let chars: Vec<char> = formula.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let rest: String = chars[i..].iter().take(2).collect();
        if c == '"' {
            let end = scan_string(&chars, i);
            tokens.push(Token::new(TokenKind::String, collect(&chars, i, end)));
            i = end;
        } else if c.is_whitespace() {
            let mut end = i;
            while end < chars.len() && chars[end].is_whitespace() {
                end += 1;
            }
            tokens.push(Token::new(TokenKind::Space, collect(&chars, i, end)));
            i = end;
        } else if c == ',' {
            tokens.push(Token::new(TokenKind::ArgSeparator, ","));
            i += 1;
        } else if c == '(' {
            tokens.push(Token::new(TokenKind::LeftParen, "("));
            i += 1;
        } else if c == ')' {
            tokens.push(Token::new(TokenKind::RightParen, ")"));
            i += 1;
        } else if c == '#' {
            match ERROR_LITERALS
                .iter()
                .find(|lit| starts_with_ignore_case(&chars[i..], lit))
            {
                Some(lit) => {
                    let len = lit.chars().count();
                    tokens.push(Token::new(TokenKind::Error, collect(&chars, i, i + len)));
                    i += len;
                }
                None => {
                    tokens.push(Token::new(TokenKind::Unknown, "#"));
                    i += 1;
                }
            }
        } else if TWO_CHAR_OPERATORS.contains(&rest.as_str()) {
            tokens.push(Token::new(TokenKind::Operator, rest));
            i += 2;
        } else if let Some(end) = scan_reference(&chars, i) {
            tokens.push(Token::new(TokenKind::Reference, collect(&chars, i, end)));
            i = end;
        } else if c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit())) {
            let end = scan_number(&chars, i);
            tokens.push(Token::new(TokenKind::Number, collect(&chars, i, end)));
            i = end;
        } else if OPERATORS.contains(&c) {
            tokens.push(Token::new(TokenKind::Operator, c.to_string()));
            i += 1;
        } else if is_symbol_char(c) {
            let mut end = i;
            while end < chars.len() && is_symbol_char(chars[end]) {
                end += 1;
            }
            if chars.get(end) == Some(&'[') {
                let close = scan_brackets(&chars, end);
                tokens.push(Token::new(TokenKind::TableReference, collect(&chars, i, close)));
                i = close;
            } else {
                tokens.push(Token::new(TokenKind::Symbol, collect(&chars, i, end)));
                i = end;
            }
        } else {
            tokens.push(Token::new(TokenKind::Unknown, c.to_string()));
            i += 1;
        }
    }
    tokens
}

fn collect(chars: &[char], start: usize, end: usize) -> String {
    chars[start..end.min(chars.len())].iter().collect()
}

fn starts_with_ignore_case(chars: &[char], lit: &str) -> bool {
    let mut it = chars.iter();
    lit.chars()
        .all(|l| it.next().is_some_and(|c| c.eq_ignore_ascii_case(&l)))
}

fn is_symbol_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '\\' | '?' | '$')
}

/// End index (exclusive) of a double-quoted string starting at `start`. `""` is an escaped quote.
fn scan_string(chars: &[char], start: usize) -> usize {
    let mut i = start + 1;
    while i < chars.len() {
        if chars[i] == '"' {
            if chars.get(i + 1) == Some(&'"') {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    chars.len()
}

fn scan_number(chars: &[char], start: usize) -> usize {
    let mut i = start;
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    if chars.get(i) == Some(&'.') {
        i += 1;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
    }
    if matches!(chars.get(i), Some('e' | 'E')) {
        let mut j = i + 1;
        if matches!(chars.get(j), Some('+' | '-')) {
            j += 1;
        }
        if chars.get(j).is_some_and(|c| c.is_ascii_digit()) {
            while j < chars.len() && chars[j].is_ascii_digit() {
                j += 1;
            }
            i = j;
        }
    }
    i
}

/// End index of a balanced `[...]` group starting at `start`.
fn scan_brackets(chars: &[char], start: usize) -> usize {
    let mut depth = 0usize;
    let mut i = start;
    while i < chars.len() {
        match chars[i] {
            // `'` escapes the next character inside structured references.
            '\'' => i += 1,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    chars.len()
}

/// Sheet prefix (`Sheet1!`, `'My sheet'!`, `[1]Sheet1!`, `'[1]My sheet'!`) starting at `start`.
fn scan_sheet_prefix(chars: &[char], start: usize) -> Option<usize> {
    let mut i = start;
    if chars.get(i) == Some(&'\'') {
        i += 1;
        loop {
            match chars.get(i) {
                None => return None,
                Some('\'') if chars.get(i + 1) == Some(&'\'') => i += 2,
                Some('\'') => break,
                Some(_) => i += 1,
            }
        }
        i += 1;
    } else {
        if chars.get(i) == Some(&'[') {
            i += 1;
            let digits = i;
            while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
                i += 1;
            }
            if i == digits || chars.get(i) != Some(&']') {
                return None;
            }
            i += 1;
        }
        let name = i;
        while chars
            .get(i)
            .is_some_and(|c| c.is_alphanumeric() || matches!(c, '_' | '.'))
        {
            i += 1;
        }
        if i == name {
            return None;
        }
    }
    (chars.get(i) == Some(&'!')).then_some(i + 1)
}

/// Column part of an A1 reference (`$AB`). Returns the end index.
fn scan_col(chars: &[char], start: usize) -> Option<usize> {
    let mut i = start;
    if chars.get(i) == Some(&'$') {
        i += 1;
    }
    let letters = i;
    while chars.get(i).is_some_and(|c| c.is_ascii_alphabetic()) && i - letters < 3 {
        i += 1;
    }
    (i > letters).then_some(i)
}

fn scan_row(chars: &[char], start: usize) -> Option<usize> {
    let mut i = start;
    if chars.get(i) == Some(&'$') {
        i += 1;
    }
    let digits = i;
    while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
        i += 1;
    }
    (i > digits && chars[digits] != '0').then_some(i)
}

fn scan_cell(chars: &[char], start: usize) -> Option<usize> {
    scan_row(chars, scan_col(chars, start)?)
}

/// True when the character at `i` can not continue an identifier.
fn at_boundary(chars: &[char], i: usize) -> bool {
    match chars.get(i) {
        None => true,
        Some(c) => !(c.is_alphanumeric() || matches!(c, '_' | '.' | '(' | '[' | '!' | '$' | '?' | '\\')),
    }
}

/// End of a reference starting at `start`.
fn scan_reference(chars: &[char], start: usize) -> Option<usize> {
    let body = scan_sheet_prefix(chars, start).unwrap_or(start);

    if let Some(end) = scan_cell(chars, body) {
        if chars.get(end) == Some(&':') {
            let second = scan_sheet_prefix(chars, end + 1).unwrap_or(end + 1);
            if let Some(range_end) = scan_cell(chars, second) {
                if at_boundary(chars, range_end) {
                    return Some(range_end);
                }
            }
        }
        if at_boundary(chars, end) {
            return Some(end);
        }
    }
    // Full columns (`A:C`) and full rows (`2:5`).
    for scan in [scan_col as fn(&[char], usize) -> Option<usize>, scan_row] {
        if let Some(end) = scan(chars, body) {
            if chars.get(end) == Some(&':') {
                if let Some(range_end) = scan(chars, end + 1) {
                    if at_boundary(chars, range_end) {
                        return Some(range_end);
                    }
                }
            }
        }
    }
    None
}

/// Split a reference token into its sheet prefix (without the `!`) and its A1 body.
pub fn split_reference(reference: &str) -> (Option<&str>, &str) {
    if let Some(rest) = reference.strip_prefix('\'') {
        let mut prev_quote = false;
        for (idx, c) in rest.char_indices() {
            if c == '\'' {
                prev_quote = !prev_quote;
            } else if c == '!' && prev_quote {
                return (Some(&reference[..idx + 1]), &rest[idx + 1..]);
            } else {
                prev_quote = false;
            }
        }
        return (None, reference);
    }
    match reference.find('!') {
        Some(idx) => (Some(&reference[..idx]), &reference[idx + 1..]),
        None => (None, reference),
    }
}

/// Rebuild formula text from tokens.
pub fn tokens_to_formula(tokens: &[Token]) -> String {
    tokens.iter().map(|t| t.value.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(formula: &str) -> Vec<(TokenKind, String)> {
        tokenize(formula)
            .into_iter()
            .map(|t| (t.kind, t.value))
            .collect()
    }

    #[test]
    fn function_call_with_range() {
        use TokenKind::*;
        assert_eq!(
            kinds("=SUM(A1:B2, 3)"),
            vec![
                (Operator, "=".into()),
                (Symbol, "SUM".into()),
                (LeftParen, "(".into()),
                (Reference, "A1:B2".into()),
                (ArgSeparator, ",".into()),
                (Space, " ".into()),
                (Number, "3".into()),
                (RightParen, ")".into()),
            ]
        );
    }

    #[test]
    fn sheet_qualified_and_external_references() {
        for reference in ["Sheet1!$A$1", "'My sheet'!C3:D4", "[1]Data!A1", "'[2]Other data'!B2"] {
            let tokens = tokenize(reference);
            assert_eq!(tokens.len(), 1, "{reference}");
            assert_eq!(tokens[0].kind, TokenKind::Reference, "{reference}");
        }
    }

    #[test]
    fn full_columns_and_rows() {
        assert_eq!(kinds("A:C")[0], (TokenKind::Reference, "A:C".into()));
        assert_eq!(kinds("$2:$5")[0], (TokenKind::Reference, "$2:$5".into()));
    }

    #[test]
    fn symbols_that_look_like_cells() {
        assert_eq!(kinds("LOG10(1)")[0], (TokenKind::Symbol, "LOG10".into()));
        assert_eq!(kinds("ABCD1")[0], (TokenKind::Symbol, "ABCD1".into()));
        assert_eq!(kinds("TRUE")[0], (TokenKind::Symbol, "TRUE".into()));
    }

    #[test]
    fn strings_errors_and_tables() {
        use TokenKind::*;
        assert_eq!(
            kinds(r#""a""b"&#REF!&Table1[[#Data],[Price]]"#),
            vec![
                (String, r#""a""b""#.into()),
                (Operator, "&".into()),
                (Error, "#REF!".into()),
                (Operator, "&".into()),
                (TableReference, "Table1[[#Data],[Price]]".into()),
            ]
        );
    }

    #[test]
    fn split_sheet_prefix() {
        assert_eq!(split_reference("'It''s'!A1"), (Some("'It''s'"), "A1"));
        assert_eq!(split_reference("'My Data'!B1:C2"), (Some("'My Data'"), "B1:C2"));
        assert_eq!(split_reference("Sheet1!A1:B2"), (Some("Sheet1"), "A1:B2"));
        assert_eq!(split_reference("B7"), (None, "B7"));
    }

    #[test]
    fn rebuilds_source_text() {
        let formula = "=IF(A1>=2, \"yes\", 'S 2'!B$3 * 10%)";
        assert_eq!(tokens_to_formula(&tokenize(formula)), formula);
    }
}
