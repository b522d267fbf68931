use tabula_model::{CellValue, NormalizedFormula};

use crate::tokenizer::{tokenize, TokenKind};

/// Replace every reference of `formula` with a `|i|` placeholder.
///
/// Identical references (compared case-insensitively) share one placeholder.
pub fn normalize_formula(formula: &str, value: Option<CellValue>) -> NormalizedFormula {
    let mut text = String::with_capacity(formula.len());
    let mut dependencies: Vec<String> = Vec::new();
    for token in tokenize(formula) {
        if token.kind != TokenKind::Reference {
            text.push_str(&token.value);
            continue;
        }
        let reference = token.value;
        let index = match dependencies
            .iter()
            .position(|d| d.eq_ignore_ascii_case(&reference))
        {
            Some(index) => index,
            None => {
                dependencies.push(reference);
                dependencies.len() - 1
            }
        };
        text.push('|');
        text.push_str(&index.to_string());
        text.push('|');
    }
    NormalizedFormula {
        text,
        dependencies,
        value,
    }
}

/// Substitute the placeholders of a normalized formula with its dependencies.
///
/// Placeholders inside string literals are left alone; an index without a dependency is
/// rendered as `#REF`.
pub fn denormalize_formula(formula: &NormalizedFormula) -> String {
    let text = &formula.text;
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut chars = text.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        if c == '"' {
            in_string = !in_string;
            out.push(c);
            continue;
        }
        if c == '|' && !in_string {
            let rest = &text[idx + 1..];
            let digits: String = rest.chars().take_while(|d| d.is_ascii_digit()).collect();
            if !digits.is_empty() && rest[digits.len()..].starts_with('|') {
                let reference = digits
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| formula.dependencies.get(i));
                out.push_str(reference.map(String::as_str).unwrap_or("#REF"));
                for _ in 0..=digits.len() {
                    chars.next();
                }
                continue;
            }
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn references_become_placeholders() {
        let normalized = normalize_formula("=SUM(A1:B2, a1:b2, Sheet2!C3) & \"A1\"", None);
        assert_eq!(normalized.text, "=SUM(|0|, |0|, |1|) & \"A1\"");
        assert_eq!(normalized.dependencies, vec!["A1:B2", "Sheet2!C3"]);
        assert_eq!(
            denormalize_formula(&normalized),
            "=SUM(A1:B2, A1:B2, Sheet2!C3) & \"A1\""
        );
    }

    #[test]
    fn placeholders_in_strings_are_literal() {
        let formula = NormalizedFormula {
            text: "=\"|0|\"&|0|&|7|".to_string(),
            dependencies: vec!["B4".to_string()],
            value: None,
        };
        assert_eq!(denormalize_formula(&formula), "=\"|0|\"&B4&#REF");
    }
}
