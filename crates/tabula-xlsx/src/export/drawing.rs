//! SpreadsheetDrawing parts (`xl/drawings/drawing{n}.xml`) anchoring charts and pictures.

use tabula_model::{Figure, FigureData, SheetData};

use crate::conversion::figure::{position_marker, px_to_emu};
use crate::extraction::records::XlsxAnchorMarker;
use crate::xml::{push_attr, NS_CHART, NS_DRAWING, NS_REL, NS_SPREADSHEET_DRAWING, XML_HEADER};

#[derive(Clone, Debug, PartialEq)]
pub enum DrawingContent {
    /// `r:id` of the chart part relationship.
    Chart { rel_id: String },
    /// `r:embed` of the media relationship.
    Picture { rel_id: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct DrawingObject {
    pub from: XlsxAnchorMarker,
    pub to: XlsxAnchorMarker,
    /// `(cx, cy)` in EMUs.
    pub ext: (i64, i64),
    pub content: DrawingContent,
}

impl DrawingObject {
    /// Two-cell anchor covering the pixel geometry of `figure` on `sheet`.
    pub fn anchored(sheet: &SheetData, figure: &Figure<FigureData>, content: DrawingContent) -> Self {
        Self {
            from: position_marker(sheet, figure.x, figure.y),
            to: position_marker(sheet, figure.x + figure.width, figure.y + figure.height),
            ext: (px_to_emu(figure.width), px_to_emu(figure.height)),
            content,
        }
    }
}

fn marker_xml(out: &mut String, tag: &str, marker: &XlsxAnchorMarker) {
    out.push_str(&format!(
        "<xdr:{tag}><xdr:col>{}</xdr:col><xdr:colOff>{}</xdr:colOff><xdr:row>{}</xdr:row><xdr:rowOff>{}</xdr:rowOff></xdr:{tag}>",
        marker.col, marker.col_off, marker.row, marker.row_off
    ));
}

fn graphic_frame_xml(out: &mut String, object_id: usize, rel_id: &str) {
    out.push_str(&format!(
        r#"<xdr:graphicFrame macro=""><xdr:nvGraphicFramePr><xdr:cNvPr id="{object_id}" name="Chart {object_id}"/><xdr:cNvGraphicFramePr/></xdr:nvGraphicFramePr><xdr:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/></xdr:xfrm><a:graphic><a:graphicData uri="{NS_CHART}"><c:chart xmlns:c="{NS_CHART}""#
    ));
    push_attr(out, "r:id", rel_id);
    out.push_str("/></a:graphicData></a:graphic></xdr:graphicFrame>");
}

fn picture_xml(out: &mut String, object_id: usize, rel_id: &str, (cx, cy): (i64, i64)) {
    out.push_str(&format!(
        r#"<xdr:pic><xdr:nvPicPr><xdr:cNvPr id="{object_id}" name="Picture {object_id}"/><xdr:cNvPicPr><a:picLocks noChangeAspect="1"/></xdr:cNvPicPr></xdr:nvPicPr><xdr:blipFill><a:blip"#
    ));
    push_attr(out, "r:embed", rel_id);
    out.push_str(&format!(
        r#"/><a:stretch><a:fillRect/></a:stretch></xdr:blipFill><xdr:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></xdr:spPr></xdr:pic>"#
    ));
}

pub fn drawing_xml(objects: &[DrawingObject]) -> String {
    let mut xml = String::new();
    xml.push_str(XML_HEADER);
    xml.push('\n');
    xml.push_str(&format!(
        r#"<xdr:wsDr xmlns:xdr="{NS_SPREADSHEET_DRAWING}" xmlns:a="{NS_DRAWING}" xmlns:r="{NS_REL}">"#
    ));
    for (index, object) in objects.iter().enumerate() {
        let object_id = index + 1;
        xml.push_str(r#"<xdr:twoCellAnchor editAs="oneCell">"#);
        marker_xml(&mut xml, "from", &object.from);
        marker_xml(&mut xml, "to", &object.to);
        match &object.content {
            DrawingContent::Chart { rel_id } => graphic_frame_xml(&mut xml, object_id, rel_id),
            DrawingContent::Picture { rel_id } => picture_xml(&mut xml, object_id, rel_id, object.ext),
        }
        xml.push_str("<xdr:clientData/></xdr:twoCellAnchor>");
    }
    xml.push_str("</xdr:wsDr>");
    xml
}
