use roxmltree::Node;

use super::kernel::{Extractor, XmlFile};
use super::records::{
    XlsxAlignment, XlsxBorder, XlsxBorderSide, XlsxCellXf, XlsxColor, XlsxDxf, XlsxFill,
    XlsxFont, XlsxNumFmt, XlsxStyleSheet,
};
use crate::warnings::WarningManager;
use crate::{ImportError, XlsxFiles};

pub fn extract_styles(
    files: &XlsxFiles,
    path: &str,
    warnings: &WarningManager,
) -> Result<XlsxStyleSheet, ImportError> {
    let file = XmlFile::open(files, path)?;
    let ex = Extractor::new(&file.path, warnings);
    let root = file.root();

    let list = |container: &str, item: &str| list_items(&ex, root, container, item);

    let mut num_fmts = Vec::new();
    for node in list("numFmts", "numFmt") {
        num_fmts.push(extract_num_fmt(&ex, node)?);
    }

    let cell_xfs = list("cellXfs", "xf")
        .into_iter()
        .map(|xf| XlsxCellXf {
            num_fmt_id: ex.attr_or(xf, "numFmtId", 0),
            font_id: ex.attr_or(xf, "fontId", 0),
            fill_id: ex.attr_or(xf, "fillId", 0),
            border_id: ex.attr_or(xf, "borderId", 0),
            alignment: ex.child(xf, "alignment").map(|a| extract_alignment(&ex, a)),
        })
        .collect();

    let mut dxfs = Vec::new();
    for dxf in list("dxfs", "dxf") {
        dxfs.push(XlsxDxf {
            font: ex.child(dxf, "font").map(|f| extract_font(&ex, f)),
            fill: ex.child(dxf, "fill").map(|f| extract_fill(&ex, f)),
            border: ex.child(dxf, "border").map(|b| extract_border(&ex, b)),
            num_fmt: match ex.child(dxf, "numFmt") {
                Some(n) => Some(extract_num_fmt(&ex, n)?),
                None => None,
            },
            alignment: ex.child(dxf, "alignment").map(|a| extract_alignment(&ex, a)),
        });
    }

    Ok(XlsxStyleSheet {
        num_fmts,
        fonts: list("fonts", "font")
            .into_iter()
            .map(|f| extract_font(&ex, f))
            .collect(),
        fills: list("fills", "fill")
            .into_iter()
            .map(|f| extract_fill(&ex, f))
            .collect(),
        borders: list("borders", "border")
            .into_iter()
            .map(|b| extract_border(&ex, b))
            .collect(),
        cell_xfs,
        dxfs,
    })
}

fn list_items<'a, 'i>(
    ex: &Extractor<'_>,
    root: Node<'a, 'i>,
    container: &str,
    item: &str,
) -> Vec<Node<'a, 'i>> {
    ex.child(root, container)
        .map(|c| ex.children(c, item))
        .unwrap_or_default()
}

fn extract_num_fmt(ex: &Extractor<'_>, node: Node<'_, '_>) -> Result<XlsxNumFmt, ImportError> {
    Ok(XlsxNumFmt {
        id: ex.required_attr(node, "numFmtId")?,
        format_code: ex.required_attr(node, "formatCode")?,
    })
}

/// `<color>`-like element (`rgb`, `indexed`, `theme`, `tint`, `auto`).
pub fn extract_color(ex: &Extractor<'_>, node: Node<'_, '_>) -> XlsxColor {
    XlsxColor {
        rgb: ex.opt_attr(node, "rgb"),
        indexed: ex.opt_attr(node, "indexed"),
        theme: ex.opt_attr(node, "theme"),
        tint: ex.opt_attr(node, "tint"),
        auto: ex.attr_or(node, "auto", false),
    }
}

fn child_color(ex: &Extractor<'_>, node: Node<'_, '_>, tag: &str) -> Option<XlsxColor> {
    ex.child(node, tag).map(|c| extract_color(ex, c))
}

/// Boolean font property (`<b/>`, `<b val="0"/>`).
fn flag(ex: &Extractor<'_>, node: Node<'_, '_>, tag: &str) -> bool {
    ex.child(node, tag)
        .map(|c| ex.attr_or(c, "val", true))
        .unwrap_or(false)
}

pub fn extract_font(ex: &Extractor<'_>, node: Node<'_, '_>) -> XlsxFont {
    XlsxFont {
        name: ex.child_val(node, "name"),
        size: ex.child_val(node, "sz"),
        bold: flag(ex, node, "b"),
        italic: flag(ex, node, "i"),
        strike: flag(ex, node, "strike"),
        underline: ex
            .child(node, "u")
            .map(|u| ex.attr_or(u, "val", "single".to_string()) != "none")
            .unwrap_or(false),
        color: child_color(ex, node, "color"),
    }
}

pub fn extract_fill(ex: &Extractor<'_>, node: Node<'_, '_>) -> XlsxFill {
    if ex.child(node, "gradientFill").is_some() {
        return XlsxFill {
            gradient: true,
            ..Default::default()
        };
    }
    match ex.child(node, "patternFill") {
        Some(pattern) => XlsxFill {
            pattern_type: ex.opt_attr(pattern, "patternType"),
            fg_color: child_color(ex, pattern, "fgColor"),
            bg_color: child_color(ex, pattern, "bgColor"),
            gradient: false,
        },
        None => XlsxFill::default(),
    }
}

pub fn extract_border(ex: &Extractor<'_>, node: Node<'_, '_>) -> XlsxBorder {
    let side = |tag: &str| {
        ex.child(node, tag).and_then(|s| {
            let style: Option<String> = ex.opt_attr(s, "style");
            style.as_ref()?;
            Some(XlsxBorderSide {
                style,
                color: child_color(ex, s, "color"),
            })
        })
    };
    XlsxBorder {
        left: side("left").or_else(|| side("start")),
        right: side("right").or_else(|| side("end")),
        top: side("top"),
        bottom: side("bottom"),
        diagonal: side("diagonal"),
        diagonal_up: ex.attr_or(node, "diagonalUp", false),
        diagonal_down: ex.attr_or(node, "diagonalDown", false),
    }
}

fn extract_alignment(ex: &Extractor<'_>, node: Node<'_, '_>) -> XlsxAlignment {
    XlsxAlignment {
        horizontal: ex.opt_attr(node, "horizontal"),
        vertical: ex.opt_attr(node, "vertical"),
        wrap_text: ex.attr_or(node, "wrapText", false),
        shrink_to_fit: ex.attr_or(node, "shrinkToFit", false),
    }
}
