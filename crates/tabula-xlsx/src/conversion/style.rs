//! Cell formats (`cellXfs`) and differential formats (`dxfs`) to model styles and borders.
//!
//! Anything outside the supported subset is approximated and reported once.

use tabula_model::{Align, Border, BorderDescr, BorderStyle, CfStyle, Style, VerticalAlign, Wrapping};

use super::color::convert_color;
use super::format::{builtin_format, convert_number_format};
use crate::extraction::records::{
    XlsxAlignment, XlsxBorder, XlsxBorderSide, XlsxCellXf, XlsxDxf, XlsxFill, XlsxFont,
    XlsxStyleSheet, XlsxTheme,
};
use crate::warnings::{WarningKind, WarningManager};

pub const SUPPORTED_FONTS: &[&str] = &["Arial"];
pub const SUPPORTED_FILL_STYLES: &[&str] = &["solid"];
pub const SUPPORTED_HORIZONTAL_ALIGNMENTS: &[&str] = &["general", "left", "center", "right"];
pub const SUPPORTED_VERTICAL_ALIGNMENTS: &[&str] = &["top", "center", "bottom"];
pub const SUPPORTED_BORDER_STYLES: &[&str] = &["thin"];

pub const DEFAULT_BORDER_COLOR: &str = "#000000";

/// Shared inputs of the style converters.
#[derive(Clone, Copy)]
pub struct StyleContext<'a> {
    pub styles: &'a XlsxStyleSheet,
    pub theme: &'a XlsxTheme,
    pub warnings: &'a WarningManager,
}

impl<'a> StyleContext<'a> {
    fn default_font_size(&self) -> Option<f64> {
        self.styles.fonts.first().and_then(|f| f.size)
    }

    pub fn convert_style(&self, xf: &XlsxCellXf) -> Style {
        let mut style = Style::default();
        if let Some(font) = self.styles.fonts.get(xf.font_id as usize) {
            self.apply_font(&mut style, font);
        }
        if let Some(fill) = self.styles.fills.get(xf.fill_id as usize) {
            style.fill_color = self.convert_fill(fill, false);
        }
        if let Some(alignment) = &xf.alignment {
            self.apply_alignment(&mut style, alignment);
        }
        style
    }

    fn apply_font(&self, style: &mut Style, font: &XlsxFont) {
        if let Some(name) = font.name.as_deref() {
            if !SUPPORTED_FONTS.contains(&name) {
                self.warnings.generate_not_supported_warning(
                    WarningKind::Font,
                    Some(name),
                    Some(SUPPORTED_FONTS),
                );
            }
        }
        style.bold = font.bold;
        style.italic = font.italic;
        style.strikethrough = font.strike;
        style.underline = font.underline;
        style.text_color = font
            .color
            .as_ref()
            .and_then(|c| convert_color(c, self.theme));
        style.font_size_100pt = font
            .size
            .filter(|size| Some(*size) != self.default_font_size())
            .map(|size| (size * 100.0).round() as u32);
    }

    /// Solid fills keep their color. Pattern fills are approximated by their foreground color.
    /// In differential formats the solid color lives in `bgColor`.
    fn convert_fill(&self, fill: &XlsxFill, differential: bool) -> Option<String> {
        if fill.gradient {
            self.warnings
                .generate_not_supported_warning(WarningKind::GradientFill, None, None);
            return None;
        }
        let color = |first: &Option<_>, second: &Option<_>| {
            first
                .as_ref()
                .or(second.as_ref())
                .and_then(|c| convert_color(c, self.theme))
        };
        match (fill.pattern_type.as_deref(), differential) {
            (Some("none"), _) | (None, false) => None,
            (None | Some("solid"), true) => color(&fill.bg_color, &fill.fg_color),
            (Some("solid"), false) => color(&fill.fg_color, &fill.bg_color),
            (Some(pattern), _) => {
                self.warnings.generate_not_supported_warning(
                    WarningKind::FillStyle,
                    Some(pattern),
                    Some(SUPPORTED_FILL_STYLES),
                );
                color(&fill.fg_color, &fill.bg_color)
            }
        }
    }

    fn apply_alignment(&self, style: &mut Style, alignment: &XlsxAlignment) {
        style.align = match alignment.horizontal.as_deref() {
            None | Some("general") => None,
            Some("left") => Some(Align::Left),
            Some("center") => Some(Align::Center),
            Some("right") => Some(Align::Right),
            Some(other) => {
                self.warnings.generate_not_supported_warning(
                    WarningKind::HorizontalAlignment,
                    Some(other),
                    Some(SUPPORTED_HORIZONTAL_ALIGNMENTS),
                );
                (other == "centerContinuous").then_some(Align::Center)
            }
        };
        style.vertical_align = match alignment.vertical.as_deref() {
            None => None,
            Some("top") => Some(VerticalAlign::Top),
            Some("center") => Some(VerticalAlign::Middle),
            Some("bottom") => Some(VerticalAlign::Bottom),
            Some(other) => {
                self.warnings.generate_not_supported_warning(
                    WarningKind::VerticalAlignment,
                    Some(other),
                    Some(SUPPORTED_VERTICAL_ALIGNMENTS),
                );
                None
            }
        };
        if alignment.wrap_text {
            style.wrapping = Some(Wrapping::Wrap);
        }
    }

    pub fn convert_border(&self, border: &XlsxBorder) -> Border {
        if border.diagonal.is_some() && (border.diagonal_up || border.diagonal_down) {
            self.warnings
                .generate_not_supported_warning(WarningKind::DiagonalBorders, None, None);
        }
        Border {
            top: border.top.as_ref().and_then(|s| self.convert_side(s)),
            bottom: border.bottom.as_ref().and_then(|s| self.convert_side(s)),
            left: border.left.as_ref().and_then(|s| self.convert_side(s)),
            right: border.right.as_ref().and_then(|s| self.convert_side(s)),
        }
    }

    fn convert_side(&self, side: &XlsxBorderSide) -> Option<BorderDescr> {
        let style = side.style.as_deref()?;
        if style == "none" {
            return None;
        }
        if !SUPPORTED_BORDER_STYLES.contains(&style) {
            self.warnings.generate_not_supported_warning(
                WarningKind::BorderStyle,
                Some(style),
                Some(SUPPORTED_BORDER_STYLES),
            );
        }
        Some(BorderDescr {
            style: BorderStyle::Thin,
            color: side
                .color
                .as_ref()
                .and_then(|c| convert_color(c, self.theme))
                .unwrap_or_else(|| DEFAULT_BORDER_COLOR.to_string()),
        })
    }

    /// Host format of a cell format, when it has one.
    pub fn convert_format(&self, xf: &XlsxCellXf) -> Option<String> {
        if xf.num_fmt_id == 0 {
            return None;
        }
        let code = self
            .styles
            .num_fmt(xf.num_fmt_id)
            .map(|f| f.format_code.as_str())
            .or_else(|| builtin_format(xf.num_fmt_id))?;
        convert_number_format(code, self.warnings)
    }

    /// Partial style of a conditional format rule.
    pub fn convert_dxf(&self, dxf: &XlsxDxf) -> CfStyle {
        if dxf.border.as_ref().is_some_and(|b| *b != XlsxBorder::default()) {
            self.warnings
                .generate_not_supported_warning(WarningKind::CfBorder, None, None);
        }
        if dxf.alignment.is_some() {
            self.warnings
                .generate_not_supported_warning(WarningKind::CfAlignment, None, None);
        }
        if dxf.num_fmt.is_some() {
            self.warnings
                .generate_not_supported_warning(WarningKind::CfNumberFormat, None, None);
        }
        let set = |flag: bool| flag.then_some(true);
        let font = dxf.font.clone().unwrap_or_default();
        CfStyle {
            fill_color: dxf.fill.as_ref().and_then(|f| self.convert_fill(f, true)),
            text_color: font.color.as_ref().and_then(|c| convert_color(c, self.theme)),
            bold: set(font.bold),
            italic: set(font.italic),
            strikethrough: set(font.strike),
            underline: set(font.underline),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::records::XlsxColor;
    use crate::extraction::theme::default_theme;
    use pretty_assertions::assert_eq;

    fn sheet() -> XlsxStyleSheet {
        XlsxStyleSheet {
            fonts: vec![
                XlsxFont {
                    name: Some("Arial".into()),
                    size: Some(10.0),
                    ..Default::default()
                },
                XlsxFont {
                    name: Some("Calibri".into()),
                    size: Some(14.0),
                    bold: true,
                    color: Some(XlsxColor::rgb("FFFF0000")),
                    ..Default::default()
                },
            ],
            fills: vec![
                XlsxFill::default(),
                XlsxFill {
                    pattern_type: Some("darkGrid".into()),
                    fg_color: Some(XlsxColor::rgb("FF00FF00")),
                    ..Default::default()
                },
                XlsxFill {
                    pattern_type: Some("solid".into()),
                    fg_color: Some(XlsxColor::rgb("FF0000FF")),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn unsupported_attributes_are_approximated_with_warnings() {
        let styles = sheet();
        let theme = default_theme();
        let warnings = WarningManager::new();
        let ctx = StyleContext { styles: &styles, theme: &theme, warnings: &warnings };
        let xf = XlsxCellXf {
            font_id: 1,
            fill_id: 1,
            alignment: Some(XlsxAlignment {
                horizontal: Some("centerContinuous".into()),
                vertical: Some("center".into()),
                wrap_text: true,
                ..Default::default()
            }),
            ..Default::default()
        };
        let style = ctx.convert_style(&xf);
        assert_eq!(
            style,
            Style {
                bold: true,
                align: Some(Align::Center),
                vertical_align: Some(VerticalAlign::Middle),
                wrapping: Some(Wrapping::Wrap),
                fill_color: Some("#00FF00".into()),
                text_color: Some("#FF0000".into()),
                font_size_100pt: Some(1400),
                ..Default::default()
            }
        );
        assert_eq!(
            warnings.conversion_warnings(),
            vec![
                r#"Font "Calibri" is not yet supported. Only Arial are currently supported."#.to_string(),
                r#"Fill Style "darkGrid" is not yet supported. Only solid are currently supported."#.to_string(),
                r#"Horizontal Alignments "centerContinuous" is not yet supported. Only general, left, center, right are currently supported."#.to_string(),
            ]
        );
    }

    #[test]
    fn default_font_size_is_implicit() {
        let styles = sheet();
        let theme = default_theme();
        let warnings = WarningManager::new();
        let ctx = StyleContext { styles: &styles, theme: &theme, warnings: &warnings };
        let style = ctx.convert_style(&XlsxCellXf { fill_id: 2, ..Default::default() });
        assert_eq!(style.font_size_100pt, None);
        assert_eq!(style.fill_color.as_deref(), Some("#0000FF"));
        assert!(warnings.conversion_warnings().is_empty());
    }

    #[test]
    fn thick_borders_become_thin() {
        let styles = sheet();
        let theme = default_theme();
        let warnings = WarningManager::new();
        let ctx = StyleContext { styles: &styles, theme: &theme, warnings: &warnings };
        let border = ctx.convert_border(&XlsxBorder {
            top: Some(XlsxBorderSide { style: Some("thick".into()), color: None }),
            left: Some(XlsxBorderSide {
                style: Some("thin".into()),
                color: Some(XlsxColor::rgb("FF112233")),
            }),
            diagonal: Some(XlsxBorderSide { style: Some("thin".into()), color: None }),
            diagonal_down: true,
            ..Default::default()
        });
        assert_eq!(border.top.unwrap().color, "#000000");
        assert_eq!(border.left.unwrap().color, "#112233");
        assert!(border.bottom.is_none());
        assert_eq!(
            warnings.conversion_warnings(),
            vec![
                "Diagonal Borders are not yet supported.".to_string(),
                r#"Borders Style "thick" is not yet supported. Only thin are currently supported."#.to_string(),
            ]
        );
    }

    #[test]
    fn differential_fills_read_the_background_color() {
        let styles = sheet();
        let theme = default_theme();
        let warnings = WarningManager::new();
        let ctx = StyleContext { styles: &styles, theme: &theme, warnings: &warnings };
        let cf_style = ctx.convert_dxf(&XlsxDxf {
            font: Some(XlsxFont { bold: true, ..Default::default() }),
            fill: Some(XlsxFill {
                bg_color: Some(XlsxColor::rgb("FFFFC7CE")),
                ..Default::default()
            }),
            alignment: Some(XlsxAlignment::default()),
            ..Default::default()
        });
        assert_eq!(cf_style.fill_color.as_deref(), Some("#FFC7CE"));
        assert_eq!(cf_style.bold, Some(true));
        assert_eq!(cf_style.italic, None);
        assert_eq!(warnings.conversion_warnings(), vec!["Alignment in conditional formats are not yet supported.".to_string()]);
    }
}
