use serde::{Deserialize, Serialize};

pub const DEFAULT_TABLE_STYLE: &str = "TableStyleMedium2";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableConfig {
    pub number_of_headers: u32,
    #[serde(default)]
    pub total_row: bool,
    #[serde(default)]
    pub banded_rows: bool,
    #[serde(default)]
    pub banded_columns: bool,
    #[serde(default)]
    pub first_column: bool,
    #[serde(default)]
    pub last_column: bool,
    #[serde(default)]
    pub has_filters: bool,
    pub style_id: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            number_of_headers: 1,
            total_row: false,
            banded_rows: true,
            banded_columns: false,
            first_column: false,
            last_column: false,
            has_filters: true,
            style_id: DEFAULT_TABLE_STYLE.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    /// A1 range of the whole table, headers and totals included.
    pub range: String,
    pub config: TableConfig,
}

/// Returns true when `style_id` names one of the preset table styles.
pub fn is_preset_table_style(style_id: &str) -> bool {
    let (prefix, max) = if let Some(n) = style_id.strip_prefix("TableStyleLight") {
        (n, 21)
    } else if let Some(n) = style_id.strip_prefix("TableStyleMedium") {
        (n, 28)
    } else if let Some(n) = style_id.strip_prefix("TableStyleDark") {
        (n, 11)
    } else {
        return false;
    };
    matches!(prefix.parse::<u32>(), Ok(n) if (1..=max).contains(&n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_styles() {
        assert!(is_preset_table_style("TableStyleMedium2"));
        assert!(is_preset_table_style("TableStyleLight21"));
        assert!(!is_preset_table_style("TableStyleLight22"));
        assert!(!is_preset_table_style("PivotStyleLight16"));
    }
}
