//! Number format codes: SpreadsheetML format language to the host format language and back.

use std::sync::OnceLock;

use regex::Regex;
use tabula_model::format::parse_format;

use crate::warnings::{WarningKind, WarningManager};

/// First id available for custom formats.
pub const FIRST_CUSTOM_FORMAT_ID: u32 = 164;

/// Built-in format codes (ECMA-376 §18.8.30, en-US).
pub fn builtin_format(id: u32) -> Option<&'static str> {
    Some(match id {
        0 => "General",
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        5 => r##""$"#,##0_);("$"#,##0)"##,
        6 => r##""$"#,##0_);[Red]("$"#,##0)"##,
        7 => r##""$"#,##0.00_);("$"#,##0.00)"##,
        8 => r##""$"#,##0.00_);[Red]("$"#,##0.00)"##,
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "# ?/?",
        13 => "# ??/??",
        14 => "mm-dd-yy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        37 => "#,##0 ;(#,##0)",
        38 => "#,##0 ;[Red](#,##0)",
        39 => "#,##0.00;(#,##0.00)",
        40 => "#,##0.00;[Red](#,##0.00)",
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mmss.0",
        48 => "##0.0E+0",
        49 => "@",
        _ => return None,
    })
}

/// Reverse lookup used on export so common formats keep their built-in id.
pub fn builtin_format_id(code: &str) -> Option<u32> {
    (0..FIRST_CUSTOM_FORMAT_ID).find(|id| builtin_format(*id) == Some(code))
}

fn host_literal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[\$[^\]]*\]").expect("valid regex"))
}

fn date_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)[dmyhse]|am/pm|a/p").expect("valid regex"))
}

const PLAIN_LITERALS: &[char] = &[' ', '-', '/', ':', '(', ')', '+', '.', ','];

/// Convert a SpreadsheetML format code into the host format language.
///
/// Returns `None` for `General` and for codes that cannot be represented; the latter are
/// reported once through `warnings`.
pub fn convert_number_format(code: &str, warnings: &WarningManager) -> Option<String> {
    let section = first_section(code).trim();
    if section.is_empty() || section.eq_ignore_ascii_case("general") {
        return None;
    }
    let mut converted = rewrite_section(section);
    let without_literals = host_literal_re().replace_all(&converted, "");
    if date_token_re().is_match(&without_literals) {
        converted = normalize_date_tokens(&converted);
    }
    match parse_format(&converted) {
        Ok(_) => Some(converted),
        Err(_) => {
            warnings.generate_not_supported_warning(WarningKind::NumberFormat, Some(code), None);
            None
        }
    }
}

/// Text up to the first `;` that is not inside a quoted literal.
fn first_section(code: &str) -> &str {
    let mut in_quotes = false;
    let mut escaped = false;
    for (idx, c) in code.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if !in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => return &code[..idx],
            _ => {}
        }
    }
    code
}

fn push_literal(out: &mut String, text: &str) {
    if text.chars().all(|c| PLAIN_LITERALS.contains(&c)) {
        out.push_str(text);
        return;
    }
    let text: String = text.chars().filter(|c| *c != ']').collect();
    if !text.is_empty() {
        out.push_str("[$");
        out.push_str(&text);
        out.push(']');
    }
}

/// Rewrite quoted and escaped literals as `[$...]` and reduce `[$sym-locale]` qualifiers to their
/// symbol. Colors, conditions and the `_x` / `*x` directives are dropped.
fn rewrite_section(section: &str) -> String {
    let mut out = String::with_capacity(section.len());
    let mut chars = section.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                let literal: String = chars.by_ref().take_while(|c| *c != '"').collect();
                push_literal(&mut out, &literal);
            }
            '\\' => {
                if let Some(escaped) = chars.next() {
                    push_literal(&mut out, &escaped.to_string());
                }
            }
            '_' | '*' => {
                chars.next();
            }
            '[' => {
                let inner: String = chars.by_ref().take_while(|c| *c != ']').collect();
                if let Some(qualifier) = inner.strip_prefix('$') {
                    let symbol = qualifier.split('-').next().unwrap_or_default();
                    push_literal(&mut out, symbol);
                } else if inner.chars().all(|c| matches!(c.to_ascii_lowercase(), 'h' | 'm' | 's')) {
                    // Elapsed time ([h], [mm]) is approximated by the plain token.
                    out.push_str(&inner);
                }
            }
            c => out.push(c),
        }
    }
    out
}

/// Lowercase date tokens and map them on the supported token lengths.
fn normalize_date_tokens(format: &str) -> String {
    let chars: Vec<char> = format.chars().collect();
    let mut out = String::with_capacity(format.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '[' {
            while i < chars.len() {
                out.push(chars[i]);
                i += 1;
                if chars[i - 1] == ']' {
                    break;
                }
            }
            continue;
        }
        let rest: String = chars[i..].iter().collect::<String>().to_ascii_lowercase();
        if rest.starts_with("am/pm") {
            out.push('a');
            i += 5;
            continue;
        }
        if rest.starts_with("a/p") {
            out.push('a');
            i += 3;
            continue;
        }
        let lower = c.to_ascii_lowercase();
        if matches!(lower, 'd' | 'm' | 'y' | 'h' | 's' | 'e') {
            let mut len = 1;
            while chars.get(i + len).map(|n| n.to_ascii_lowercase()) == Some(lower) {
                len += 1;
            }
            let token = match lower {
                'd' => "d".repeat(len.min(4)),
                'm' if len > 4 => "mmm".to_string(),
                'm' => "m".repeat(len),
                'y' | 'e' if len <= 2 && lower == 'y' => "yy".to_string(),
                'y' | 'e' => "yyyy".to_string(),
                'h' => "h".repeat(len.min(2)),
                _ => "s".repeat(len.min(2)),
            };
            out.push_str(&token);
            i += len;
            continue;
        }
        out.push(c);
        i += 1;
    }
    out
}

/// Convert a host format back into a SpreadsheetML format code.
pub fn export_number_format(format: &str) -> String {
    let mut out = String::with_capacity(format.len() + 4);
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        match c {
            '[' => {
                let inner: String = chars.by_ref().take_while(|c| *c != ']').collect();
                let literal = inner.strip_prefix('$').unwrap_or(&inner);
                if literal.contains('"') {
                    for l in literal.chars() {
                        out.push('\\');
                        out.push(l);
                    }
                } else {
                    out.push('"');
                    out.push_str(literal);
                    out.push('"');
                }
            }
            'a' => out.push_str("AM/PM"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn convert(code: &str) -> Option<String> {
        convert_number_format(code, &WarningManager::new())
    }

    #[test]
    fn keeps_first_section_and_drops_directives() {
        assert_eq!(convert("#,##0.00_);[Red](#,##0.00)").as_deref(), Some("#,##0.00"));
        assert_eq!(convert(r##""$"#,##0_);("$"#,##0)"##).as_deref(), Some("[$$]#,##0"));
        assert_eq!(convert("0.00%").as_deref(), Some("0.00%"));
        assert_eq!(convert("* #,##0").as_deref(), Some("#,##0"));
    }

    #[test]
    fn currency_qualifiers_keep_their_symbol() {
        assert_eq!(convert("[$€-407]#,##0.00").as_deref(), Some("[$€]#,##0.00"));
        assert_eq!(convert("[$-409]#,##0").as_deref(), Some("#,##0"));
        assert_eq!(convert(r#"0.0" km""#).as_deref(), Some("0.0[$ km]"));
        assert_eq!(convert(r"0\ \-").as_deref(), Some("0 -"));
    }

    #[test]
    fn date_tokens_are_normalized() {
        assert_eq!(convert("mm-dd-yy").as_deref(), Some("mm-dd-yy"));
        assert_eq!(convert("DD/MM/YYYY").as_deref(), Some("dd/mm/yyyy"));
        assert_eq!(convert("h:mm AM/PM").as_deref(), Some("h:mm a"));
        assert_eq!(convert("[h]:mm:ss").as_deref(), Some("h:mm:ss"));
        assert_eq!(convert("[$-409]mmmmm yyy").as_deref(), Some("mmm yyyy"));
        assert_eq!(convert("dddddd").as_deref(), Some("dddd"));
    }

    #[test]
    fn unsupported_codes_are_dropped_with_a_warning() {
        let warnings = WarningManager::new();
        assert_eq!(convert_number_format("0.00E+00", &warnings), None);
        assert_eq!(convert_number_format("@", &warnings), None);
        assert_eq!(convert_number_format("General", &warnings), None);
        assert_eq!(
            warnings.conversion_warnings(),
            vec![
                r#"Number format "0.00E+00" is not yet supported."#.to_string(),
                r#"Number format "@" is not yet supported."#.to_string(),
            ]
        );
    }

    #[test]
    fn export_restores_quoted_literals() {
        assert_eq!(export_number_format("[$$]#,##0"), r##""$"#,##0"##);
        assert_eq!(export_number_format("h:mm a"), "h:mm AM/PM");
        assert_eq!(builtin_format_id("0.00%"), Some(10));
        assert_eq!(builtin_format_id("0.000"), None);
    }
}
