//! Deduplicated "not yet supported" messages collected during one import or export.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;

/// Feature family named in a conversion warning.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum WarningKind {
    DiagonalBorders,
    BorderStyle,
    FillStyle,
    Font,
    HorizontalAlignment,
    VerticalAlignment,
    ConditionalFormatType,
    CfBorder,
    CfAlignment,
    CfNumberFormat,
    CfFormulaThreshold,
    CfColor,
    EmptyIcon,
    BadHyperlink,
    NumberFormat,
    ChartType,
    DefinedNames,
    DataValidationType,
    DataValidationOperator,
    RichText,
    GradientFill,
    ExternalReference,
    ImageFormat,
}

impl WarningKind {
    pub fn as_str(self) -> &'static str {
        match self {
            WarningKind::DiagonalBorders => "Diagonal Borders",
            WarningKind::BorderStyle => "Borders Style",
            WarningKind::FillStyle => "Fill Style",
            WarningKind::Font => "Font",
            WarningKind::HorizontalAlignment => "Horizontal Alignments",
            WarningKind::VerticalAlignment => "Vertical Alignments",
            WarningKind::ConditionalFormatType => "Conditional format type",
            WarningKind::CfBorder => "Borders in conditional formats",
            WarningKind::CfAlignment => "Alignment in conditional formats",
            WarningKind::CfNumberFormat => "Num formats in conditional formats",
            WarningKind::CfFormulaThreshold => "Formula thresholds in conditional formats",
            WarningKind::CfColor => "Unresolved colors in conditional formats",
            WarningKind::EmptyIcon => "IconSets with empty icons",
            WarningKind::BadHyperlink => "Badly formatted hyperlink",
            WarningKind::NumberFormat => "Number format",
            WarningKind::ChartType => "Chart type",
            WarningKind::DefinedNames => "Defined names",
            WarningKind::DataValidationType => "Data validation type",
            WarningKind::DataValidationOperator => "Data validation operator",
            WarningKind::RichText => "Rich text runs",
            WarningKind::GradientFill => "Gradient fills",
            WarningKind::ExternalReference => "External references",
            WarningKind::ImageFormat => "Image format",
        }
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the warning sentence for an unsupported feature.
///
/// ```
/// use tabula_xlsx::warnings::{not_supported_message, WarningKind};
///
/// assert_eq!(
///     not_supported_message(WarningKind::Font, Some("Calibri"), Some(&["Arial"])),
///     r#"Font "Calibri" is not yet supported. Only Arial are currently supported."#
/// );
/// ```
pub fn not_supported_message(
    kind: WarningKind,
    name: Option<&str>,
    supported: Option<&[&str]>,
) -> String {
    let mut message = match name {
        Some(name) => format!("{kind} \"{name}\" is not yet supported."),
        None => format!("{kind} are not yet supported."),
    };
    if let Some(supported) = supported.filter(|s| !s.is_empty()) {
        message.push_str(&format!(" Only {} are currently supported.", supported.join(", ")));
    }
    message
}

#[derive(Debug, Default)]
struct OrderedSet {
    seen: HashSet<String>,
    items: Vec<String>,
}

impl OrderedSet {
    fn insert(&mut self, message: String) -> bool {
        if self.seen.contains(&message) {
            return false;
        }
        self.seen.insert(message.clone());
        self.items.push(message);
        true
    }
}

/// Session-scoped warning sink.
///
/// Parsing failures and conversion warnings are kept in separate sets; each set keeps
/// first-insertion order and drops exact duplicates. Methods take `&self` so every
/// extractor and converter of a session can share one instance.
#[derive(Debug, Default)]
pub struct WarningManager {
    parsing: RefCell<OrderedSet>,
    conversion: RefCell<OrderedSet>,
}

impl WarningManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a fragment that failed to parse and was skipped.
    pub fn add_parsing_warning(&self, message: impl Into<String>) {
        let message = message.into();
        if self.parsing.borrow_mut().insert(message.clone()) {
            log::warn!("{message}");
        }
    }

    pub fn add_conversion_warning(&self, message: impl Into<String>) {
        let message = message.into();
        if self.conversion.borrow_mut().insert(message.clone()) {
            log::debug!("{message}");
        }
    }

    pub fn generate_not_supported_warning(
        &self,
        kind: WarningKind,
        name: Option<&str>,
        supported: Option<&[&str]>,
    ) {
        self.add_conversion_warning(not_supported_message(kind, name, supported));
    }

    pub fn parsing_warnings(&self) -> Vec<String> {
        self.parsing.borrow().items.clone()
    }

    pub fn conversion_warnings(&self) -> Vec<String> {
        self.conversion.borrow().items.clone()
    }

    /// Parsing warnings followed by conversion warnings.
    pub fn warnings(&self) -> Vec<String> {
        let mut all = self.parsing_warnings();
        all.extend(self.conversion_warnings());
        all
    }
}
