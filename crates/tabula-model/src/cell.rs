use serde::{Deserialize, Serialize};

/// A computed cell value (cached formula result or typed literal).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Boolean(bool),
    Number(f64),
    Text(String),
}

impl CellValue {
    /// Text form used when the value is written as cell content.
    pub fn to_content(&self) -> String {
        match self {
            CellValue::Boolean(true) => "TRUE".to_string(),
            CellValue::Boolean(false) => "FALSE".to_string(),
            CellValue::Number(n) => format_number_literal(*n),
            CellValue::Text(s) => s.clone(),
        }
    }
}

/// Format a number the way it is stored in cell content (no trailing `.0`).
pub fn format_number_literal(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// A formula whose references are replaced by `|i|` placeholders.
///
/// `dependencies[i]` holds the reference text substituted for `|i|`. Keeping references apart
/// from the formula body lets the model rewrite references without re-parsing the formula.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedFormula {
    pub text: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<CellValue>,
}

#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<NormalizedFormula>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<u32>,
}

impl CellData {
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.formula.is_none()
            && self.style.is_none()
            && self.border.is_none()
            && self.format.is_none()
    }
}

/// Prefix of hyperlink targets that point to another sheet of the same workbook.
pub const SHEET_LINK_PREFIX: &str = "sheet://";

/// A hyperlink decoded from the `[label](url)` markdown form used for cell content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
    pub label: String,
    pub url: String,
}

impl Link {
    pub fn to_markdown(&self) -> String {
        format!(
            "[{}]({})",
            self.label.replace('[', "\\[").replace(']', "\\]"),
            self.url.replace('(', "%28").replace(')', "%29")
        )
    }

    /// Returns the sheet id when the link targets a sheet of the workbook.
    pub fn sheet_id(&self) -> Option<&str> {
        self.url.strip_prefix(SHEET_LINK_PREFIX)
    }
}

/// Parse markdown link content (`[label](url)`).
pub fn parse_markdown_link(content: &str) -> Option<Link> {
    let rest = content.strip_prefix('[')?;
    let mut label = String::new();
    let mut chars = rest.char_indices();
    let mut label_end = None;
    while let Some((idx, c)) = chars.next() {
        match c {
            '\\' => {
                if let Some((_, escaped)) = chars.next() {
                    label.push(escaped);
                }
            }
            ']' => {
                label_end = Some(idx);
                break;
            }
            _ => label.push(c),
        }
    }
    let after = &rest[label_end? + 1..];
    let url = after.strip_prefix('(')?.strip_suffix(')')?;
    if url.is_empty() || url.contains('(') || url.contains(')') {
        return None;
    }
    Some(Link {
        label,
        url: url.replace("%28", "(").replace("%29", ")"),
    })
}
