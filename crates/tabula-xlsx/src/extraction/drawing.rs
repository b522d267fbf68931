use roxmltree::Node;
use tabula_model::mimetype_from_path;

use super::chart::{extract_chart, extract_chart_ex};
use super::kernel::{Extractor, Relationships, XmlFile};
use super::records::{XlsxAnchor, XlsxAnchorMarker, XlsxFigure, XlsxFigureData, XlsxImage};
use crate::warnings::WarningManager;
use crate::{ImportError, XlsxFiles};

/// Figures of a drawing part. An anchor whose chart part fails to parse is skipped with a
/// parsing warning; its siblings are still read.
pub fn extract_drawing(
    files: &XlsxFiles,
    path: &str,
    warnings: &WarningManager,
) -> Result<Vec<XlsxFigure>, ImportError> {
    let file = XmlFile::open(files, path)?;
    let ex = Extractor::new(&file.path, warnings);
    let rels = Relationships::for_part(files, path)?;

    let mut figures = Vec::new();
    for anchor_node in file.root().children().filter(|n| n.is_element()) {
        let Some(anchor) = extract_anchor(&ex, anchor_node) else {
            continue;
        };
        match extract_figure_data(files, &ex, &rels, anchor_node) {
            Ok(Some(data)) => figures.push(XlsxFigure { anchor, data }),
            Ok(None) => {}
            Err(err) => warnings.add_parsing_warning(format!(
                "Skipping <{}> in {path}: {err}",
                anchor_node.tag_name().name()
            )),
        }
    }
    Ok(figures)
}

fn marker(ex: &Extractor<'_>, node: Node<'_, '_>) -> XlsxAnchorMarker {
    let number = |tag: &str| ex.opt_text(node, tag).and_then(|t| t.trim().parse::<i64>().ok());
    XlsxAnchorMarker {
        col: number("xdr:col").unwrap_or(0).max(0) as u32,
        col_off: number("xdr:colOff").unwrap_or(0),
        row: number("xdr:row").unwrap_or(0).max(0) as u32,
        row_off: number("xdr:rowOff").unwrap_or(0),
    }
}

fn ext(ex: &Extractor<'_>, node: Node<'_, '_>) -> (i64, i64) {
    ex.child(node, "xdr:ext")
        .map(|e| (ex.attr_or(e, "cx", 0), ex.attr_or(e, "cy", 0)))
        .unwrap_or((0, 0))
}

fn extract_anchor(ex: &Extractor<'_>, node: Node<'_, '_>) -> Option<XlsxAnchor> {
    match node.tag_name().name() {
        "twoCellAnchor" => Some(XlsxAnchor::TwoCell {
            from: marker(ex, ex.child(node, "xdr:from")?),
            to: marker(ex, ex.child(node, "xdr:to")?),
        }),
        "oneCellAnchor" => Some(XlsxAnchor::OneCell {
            from: marker(ex, ex.child(node, "xdr:from")?),
            ext: ext(ex, node),
        }),
        "absoluteAnchor" => {
            let pos = ex.child(node, "xdr:pos")?;
            Some(XlsxAnchor::Absolute {
                pos: (ex.attr_or(pos, "x", 0), ex.attr_or(pos, "y", 0)),
                ext: ext(ex, node),
            })
        }
        _ => None,
    }
}

fn extract_figure_data(
    files: &XlsxFiles,
    ex: &Extractor<'_>,
    rels: &Relationships,
    anchor: Node<'_, '_>,
) -> Result<Option<XlsxFigureData>, ImportError> {
    if let Some(chart_ref) = ex.descendants(anchor, "c:chart").into_iter().next() {
        let Some(rel) = ex.opt_attr::<String>(chart_ref, "r:id").and_then(|id| rels.get(&id)) else {
            return Ok(None);
        };
        let chart = if rel.type_.ends_with("/chartEx") {
            extract_chart_ex(files, &rel.target, ex.warnings())?
        } else {
            extract_chart(files, &rel.target, ex.warnings())?
        };
        return Ok(Some(XlsxFigureData::Chart(chart)));
    }

    if let Some(blip) = ex.descendants(anchor, "a:blip").into_iter().next() {
        let Some(rel) = ex.opt_attr::<String>(blip, "r:embed").and_then(|id| rels.get(&id)) else {
            return Ok(None);
        };
        return Ok(Some(XlsxFigureData::Image(XlsxImage {
            path: rel.target.clone(),
            mimetype: mimetype_from_path(&rel.target).map(str::to_string),
        })));
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::XlsxPart;
    use pretty_assertions::assert_eq;

    fn xml(files: &mut XlsxFiles, path: &str, body: &str) {
        files.insert(path.to_string(), XlsxPart::Xml(body.to_string()));
    }

    #[test]
    fn reads_anchored_charts_and_pictures() {
        let mut files = XlsxFiles::new();
        xml(&mut files, "xl/drawings/drawing1.xml", r#"<xdr:wsDr xmlns:xdr="http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart">
          <xdr:twoCellAnchor>
            <xdr:from><xdr:col>1</xdr:col><xdr:colOff>9525</xdr:colOff><xdr:row>2</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>
            <xdr:to><xdr:col>5</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>10</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:to>
            <xdr:graphicFrame><xdr:nvGraphicFramePr><xdr:cNvPr id="2" name="Chart 1"/></xdr:nvGraphicFramePr>
              <a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/chart"><c:chart r:id="rId1"/></a:graphicData></a:graphic>
            </xdr:graphicFrame><xdr:clientData/>
          </xdr:twoCellAnchor>
          <xdr:oneCellAnchor>
            <xdr:from><xdr:col>0</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>0</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>
            <xdr:ext cx="952500" cy="476250"/>
            <xdr:pic><xdr:blipFill><a:blip r:embed="rId2"/></xdr:blipFill></xdr:pic><xdr:clientData/>
          </xdr:oneCellAnchor>
          <xdr:twoCellAnchor>
            <xdr:from><xdr:col>0</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>0</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>
            <xdr:to><xdr:col>1</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>1</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:to>
            <xdr:graphicFrame><a:graphic><a:graphicData><c:chart r:id="rId3"/></a:graphicData></a:graphic></xdr:graphicFrame>
          </xdr:twoCellAnchor>
        </xdr:wsDr>"#);
        xml(&mut files, "xl/drawings/_rels/drawing1.xml.rels", r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
          <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart" Target="../charts/chart1.xml"/>
          <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image1.png"/>
          <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart" Target="../charts/broken.xml"/>
        </Relationships>"#);
        xml(&mut files, "xl/charts/chart1.xml", r#"<c:chartSpace xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart"><c:chart><c:plotArea><c:pieChart><c:ser><c:val><c:numRef><c:f>Sheet1!$A$1:$A$3</c:f></c:numRef></c:val></c:ser></c:pieChart></c:plotArea></c:chart></c:chartSpace>"#);
        xml(&mut files, "xl/charts/broken.xml", "<c:chartSpace>");

        let warnings = WarningManager::new();
        let figures = extract_drawing(&files, "xl/drawings/drawing1.xml", &warnings).unwrap();
        assert_eq!(figures.len(), 2);
        match &figures[0].anchor {
            XlsxAnchor::TwoCell { from, to } => {
                assert_eq!((from.col, from.col_off, from.row), (1, 9525, 2));
                assert_eq!((to.col, to.row), (5, 10));
            }
            other => panic!("unexpected anchor {other:?}"),
        }
        assert!(matches!(figures[0].data, XlsxFigureData::Chart(_)));
        match &figures[1].data {
            XlsxFigureData::Image(image) => {
                assert_eq!(image.path, "xl/media/image1.png");
                assert_eq!(image.mimetype.as_deref(), Some("image/png"));
            }
            other => panic!("unexpected figure {other:?}"),
        }
        assert_eq!(figures[1].anchor, XlsxAnchor::OneCell {
            from: XlsxAnchorMarker::default(),
            ext: (952500, 476250),
        });
        assert_eq!(warnings.parsing_warnings().len(), 1);
    }
}
