//! DrawingML chart parts (`xl/charts/chart{n}.xml`).

use tabula_model::charts::{ChartDefinition, DataSet, LegendPosition, SeriesKind};
use tabula_model::quote_sheet_name;

use crate::conversion::color::to_rgb;
use crate::warnings::{WarningKind, WarningManager};
use crate::xml::{push_attr, push_text_element, NS_CHART, NS_DRAWING, NS_REL, XML_HEADER};

const CAT_AX_ID: u32 = 1;
const VAL_AX_ID: u32 = 2;

/// One plot-area family (`c:barChart`, `c:lineChart`, ...) with its series.
struct Family<'a> {
    tag: &'static str,
    /// Extra children written before the series (`c:barDir`, `c:grouping`, ...).
    head: String,
    /// Extra children written after the series.
    tail: String,
    series: Vec<Series<'a>>,
    has_axes: bool,
    smooth: Option<bool>,
}

struct Series<'a> {
    data_set: &'a DataSet,
    x_range: Option<&'a str>,
    bubble_size: Option<&'a str>,
}

impl<'a> Series<'a> {
    fn plain(data_set: &'a DataSet) -> Self {
        Self { data_set, x_range: None, bubble_size: None }
    }
}

/// Chart-space XML of `chart`, or `None` for chart kinds DrawingML has no family for.
///
/// Unqualified ranges are qualified with `sheet_name`.
pub fn chart_xml(chart: &ChartDefinition, sheet_name: &str, warnings: &WarningManager) -> Option<String> {
    let Some(families) = families(chart) else {
        warnings.generate_not_supported_warning(WarningKind::ChartType, Some(chart.kind().as_str()), None);
        return None;
    };
    let ctx = chart.creation_context();
    let labels = chart.labels_range().map(|r| qualify(r, sheet_name));
    let scatter_axes = matches!(chart, ChartDefinition::Bubble(_));

    let mut xml = String::new();
    xml.push_str(XML_HEADER);
    xml.push('\n');
    xml.push_str(&format!(
        r#"<c:chartSpace xmlns:c="{NS_CHART}" xmlns:a="{NS_DRAWING}" xmlns:r="{NS_REL}">"#
    ));
    xml.push_str(r#"<c:roundedCorners val="0"/><c:chart>"#);

    let title = chart.title();
    if title.is_empty() {
        xml.push_str(r#"<c:autoTitleDeleted val="1"/>"#);
    } else {
        xml.push_str("<c:title><c:tx><c:rich><a:bodyPr/><a:lstStyle/><a:p><a:r>");
        push_text_element(&mut xml, "a:t", title);
        xml.push_str(r#"</a:r></a:p></c:rich></c:tx><c:overlay val="0"/></c:title>"#);
        xml.push_str(r#"<c:autoTitleDeleted val="0"/>"#);
    }

    xml.push_str("<c:plotArea><c:layout/>");
    let mut index = 0;
    let mut has_axes = false;
    for family in &families {
        xml.push('<');
        xml.push_str(family.tag);
        xml.push('>');
        xml.push_str(&family.head);
        for series in &family.series {
            series_xml(&mut xml, index, series, labels.as_deref(), sheet_name, family.smooth);
            index += 1;
        }
        xml.push_str(&family.tail);
        if family.has_axes {
            has_axes = true;
            xml.push_str(&format!(r#"<c:axId val="{CAT_AX_ID}"/><c:axId val="{VAL_AX_ID}"/>"#));
        }
        xml.push_str("</");
        xml.push_str(family.tag);
        xml.push('>');
    }
    if has_axes {
        axes_xml(&mut xml, scatter_axes);
    }
    xml.push_str("</c:plotArea>");

    if let Some(pos) = legend_pos(ctx.legend_position.unwrap_or_default()) {
        xml.push_str("<c:legend><c:legendPos");
        push_attr(&mut xml, "val", pos);
        xml.push_str(r#"/><c:overlay val="0"/></c:legend>"#);
    }
    xml.push_str(r#"<c:plotVisOnly val="1"/><c:dispBlanksAs val="gap"/></c:chart>"#);

    if let Some(background) = &ctx.background {
        xml.push_str("<c:spPr><a:solidFill><a:srgbClr");
        push_attr(&mut xml, "val", to_rgb(background));
        xml.push_str("/></a:solidFill></c:spPr>");
    }
    xml.push_str("</c:chartSpace>");
    Some(xml)
}

fn legend_pos(position: LegendPosition) -> Option<&'static str> {
    match position {
        LegendPosition::Top => Some("t"),
        LegendPosition::Bottom => Some("b"),
        LegendPosition::Left => Some("l"),
        LegendPosition::Right => Some("r"),
        LegendPosition::None => None,
    }
}

fn grouping(stacked: bool) -> &'static str {
    if stacked {
        "stacked"
    } else {
        "standard"
    }
}

fn bar_family<'a>(data_sets: impl Iterator<Item = &'a DataSet>, stacked: bool, horizontal: bool) -> Family<'a> {
    let (grouping, overlap) = if stacked {
        ("stacked", r#"<c:overlap val="100"/>"#)
    } else {
        ("clustered", "")
    };
    Family {
        tag: "c:barChart",
        head: format!(
            r#"<c:barDir val="{}"/><c:grouping val="{grouping}"/><c:varyColors val="0"/>"#,
            if horizontal { "bar" } else { "col" }
        ),
        tail: format!(r#"<c:gapWidth val="150"/>{overlap}"#),
        series: data_sets.map(Series::plain).collect(),
        has_axes: true,
        smooth: None,
    }
}

fn line_family<'a>(data_sets: impl Iterator<Item = &'a DataSet>, stacked: bool, smooth: bool) -> Family<'a> {
    Family {
        tag: "c:lineChart",
        head: format!(r#"<c:grouping val="{}"/><c:varyColors val="0"/>"#, grouping(stacked)),
        tail: r#"<c:marker val="1"/>"#.to_string(),
        series: data_sets.map(Series::plain).collect(),
        has_axes: true,
        smooth: Some(smooth),
    }
}

fn families(chart: &ChartDefinition) -> Option<Vec<Family<'_>>> {
    let families = match chart {
        ChartDefinition::Bar(bar) => vec![bar_family(bar.data_sets.iter(), bar.stacked, bar.horizontal)],
        ChartDefinition::Pyramid(pyramid) => vec![bar_family(pyramid.data_sets.iter(), true, true)],
        ChartDefinition::Line(line) if line.fill_area => vec![Family {
            tag: "c:areaChart",
            head: format!(r#"<c:grouping val="{}"/><c:varyColors val="0"/>"#, grouping(line.stacked)),
            tail: String::new(),
            series: line.data_sets.iter().map(Series::plain).collect(),
            has_axes: true,
            smooth: None,
        }],
        ChartDefinition::Line(line) => vec![line_family(line.data_sets.iter(), line.stacked, line.smooth)],
        ChartDefinition::Pie(pie) => {
            let series = pie.data_sets.iter().map(Series::plain).collect();
            let first_slice = format!(r#"<c:firstSliceAng val="{}"/>"#, pie.first_slice_angle);
            if pie.is_doughnut() {
                vec![Family {
                    tag: "c:doughnutChart",
                    head: r#"<c:varyColors val="1"/>"#.to_string(),
                    tail: format!(r#"{first_slice}<c:holeSize val="{}"/>"#, pie.hole_size),
                    series,
                    has_axes: false,
                    smooth: None,
                }]
            } else {
                vec![Family {
                    tag: "c:pieChart",
                    head: r#"<c:varyColors val="1"/>"#.to_string(),
                    tail: first_slice,
                    series,
                    has_axes: false,
                    smooth: None,
                }]
            }
        }
        ChartDefinition::Radar(radar) => vec![Family {
            tag: "c:radarChart",
            head: format!(
                r#"<c:radarStyle val="{}"/><c:varyColors val="0"/>"#,
                if radar.fill_area { "filled" } else { "marker" }
            ),
            tail: String::new(),
            series: radar.data_sets.iter().map(Series::plain).collect(),
            has_axes: true,
            smooth: None,
        }],
        ChartDefinition::Bubble(bubble) => vec![Family {
            tag: "c:bubbleChart",
            head: r#"<c:varyColors val="0"/>"#.to_string(),
            tail: r#"<c:bubbleScale val="100"/>"#.to_string(),
            series: bubble
                .data_sets
                .iter()
                .enumerate()
                .map(|(i, data_set)| Series {
                    data_set,
                    x_range: bubble.labels_range.as_deref(),
                    bubble_size: bubble.size_ranges.get(i).map(String::as_str),
                })
                .collect(),
            has_axes: true,
            smooth: None,
        }],
        ChartDefinition::Combo(combo) => {
            let is_line = |d: &&DataSet| d.series_kind == Some(SeriesKind::Line);
            let mut families = vec![bar_family(combo.data_sets.iter().filter(|d| !is_line(d)), false, false)];
            let lines: Vec<&DataSet> = combo.data_sets.iter().filter(is_line).collect();
            if !lines.is_empty() {
                families.push(line_family(lines.into_iter(), false, false));
            }
            families
        }
        ChartDefinition::Funnel(_)
        | ChartDefinition::Geo(_)
        | ChartDefinition::Sunburst(_)
        | ChartDefinition::Treemap(_)
        | ChartDefinition::Waterfall(_) => return None,
    };
    Some(families)
}

/// Sheet-qualify a range that has no sheet part.
fn qualify(range: &str, sheet_name: &str) -> String {
    if range.contains('!') {
        range.to_string()
    } else {
        format!("{}!{range}", quote_sheet_name(sheet_name))
    }
}

fn push_ref(xml: &mut String, tag: &str, ref_tag: &str, range: &str) {
    xml.push_str(&format!("<{tag}><{ref_tag}>"));
    push_text_element(xml, "c:f", range);
    xml.push_str(&format!("</{ref_tag}></{tag}>"));
}

fn series_xml(
    xml: &mut String,
    index: usize,
    series: &Series<'_>,
    labels: Option<&str>,
    sheet_name: &str,
    smooth: Option<bool>,
) {
    xml.push_str(&format!(r#"<c:ser><c:idx val="{index}"/><c:order val="{index}"/>"#));
    if let Some(label) = &series.data_set.label_cell {
        push_ref(xml, "c:tx", "c:strRef", &qualify(label, sheet_name));
    }
    let values = qualify(&series.data_set.data_range, sheet_name);
    match series.bubble_size {
        Some(size) => {
            if let Some(x) = series.x_range {
                push_ref(xml, "c:xVal", "c:numRef", &qualify(x, sheet_name));
            }
            push_ref(xml, "c:yVal", "c:numRef", &values);
            push_ref(xml, "c:bubbleSize", "c:numRef", &qualify(size, sheet_name));
        }
        None if series.x_range.is_some() => {
            if let Some(x) = series.x_range {
                push_ref(xml, "c:xVal", "c:numRef", &qualify(x, sheet_name));
            }
            push_ref(xml, "c:yVal", "c:numRef", &values);
        }
        None => {
            if let Some(labels) = labels {
                push_ref(xml, "c:cat", "c:strRef", labels);
            }
            push_ref(xml, "c:val", "c:numRef", &values);
        }
    }
    if let Some(smooth) = smooth {
        xml.push_str(&format!(r#"<c:smooth val="{}"/>"#, u8::from(smooth)));
    }
    xml.push_str("</c:ser>");
}

fn axes_xml(xml: &mut String, value_x_axis: bool) {
    let scaling = r#"<c:scaling><c:orientation val="minMax"/></c:scaling><c:delete val="0"/>"#;
    let x_tag = if value_x_axis { "c:valAx" } else { "c:catAx" };
    xml.push_str(&format!(
        r#"<{x_tag}><c:axId val="{CAT_AX_ID}"/>{scaling}<c:axPos val="b"/><c:crossAx val="{VAL_AX_ID}"/></{x_tag}>"#
    ));
    xml.push_str(&format!(
        r#"<c:valAx><c:axId val="{VAL_AX_ID}"/>{scaling}<c:axPos val="l"/><c:majorGridlines/><c:crossAx val="{CAT_AX_ID}"/></c:valAx>"#
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tabula_model::charts::{ChartCreationContext, ChartKind};

    fn chart(kind: ChartKind, ctx: ChartCreationContext) -> ChartDefinition {
        ChartDefinition::from_context(kind, &ctx)
    }

    fn context() -> ChartCreationContext {
        ChartCreationContext {
            title: Some("Sales & costs".into()),
            legend_position: Some(LegendPosition::Bottom),
            labels_range: Some("A2:A5".into()),
            background: Some("#FFEE00".into()),
            data_sets: Some(vec![DataSet {
                data_range: "B2:B5".into(),
                label_cell: Some("B1".into()),
                series_kind: None,
            }]),
            ..Default::default()
        }
    }

    #[test]
    fn bar_chart_has_series_axes_and_legend() {
        let warnings = WarningManager::new();
        let xml = chart_xml(&chart(ChartKind::Bar, context()), "My Sheet", &warnings).unwrap();
        assert!(xml.contains("<a:t>Sales &amp; costs</a:t>"));
        assert!(xml.contains(r#"<c:barDir val="col"/><c:grouping val="clustered"/>"#));
        assert!(xml.contains("<c:tx><c:strRef><c:f>'My Sheet'!B1</c:f></c:strRef></c:tx>"));
        assert!(xml.contains("<c:cat><c:strRef><c:f>'My Sheet'!A2:A5</c:f></c:strRef></c:cat>"));
        assert!(xml.contains("<c:val><c:numRef><c:f>'My Sheet'!B2:B5</c:f></c:numRef></c:val>"));
        assert!(xml.contains(r#"<c:legendPos val="b"/>"#));
        assert!(xml.contains("<c:catAx>"));
        assert!(xml.contains(r#"<c:spPr><a:solidFill><a:srgbClr val="FFEE00"/></a:solidFill></c:spPr></c:chartSpace>"#));
        assert!(warnings.warnings().is_empty());
    }

    #[test]
    fn pie_with_hole_is_a_doughnut_without_axes() {
        let ctx = ChartCreationContext { hole_size: Some(40), legend_position: Some(LegendPosition::None), ..context() };
        let xml = chart_xml(&chart(ChartKind::Pie, ctx), "Sheet1", &WarningManager::new()).unwrap();
        assert!(xml.contains("<c:doughnutChart>"));
        assert!(xml.contains(r#"<c:holeSize val="40"/>"#));
        assert!(!xml.contains("<c:legend>"));
        assert!(!xml.contains("c:catAx"));
    }

    #[test]
    fn filled_line_is_an_area_chart() {
        let ctx = ChartCreationContext { fill_area: Some(true), stacked: Some(true), ..context() };
        let xml = chart_xml(&chart(ChartKind::Line, ctx), "Sheet1", &WarningManager::new()).unwrap();
        assert!(xml.contains(r#"<c:areaChart><c:grouping val="stacked"/>"#));
    }

    #[test]
    fn combo_splits_bar_and_line_series() {
        let ctx = ChartCreationContext {
            data_sets: Some(vec![
                DataSet { data_range: "Sheet1!B2:B5".into(), label_cell: None, series_kind: Some(SeriesKind::Bar) },
                DataSet { data_range: "Sheet1!C2:C5".into(), label_cell: None, series_kind: Some(SeriesKind::Line) },
            ]),
            ..context()
        };
        let xml = chart_xml(&chart(ChartKind::Combo, ctx), "Sheet1", &WarningManager::new()).unwrap();
        let bar = xml.find("<c:barChart>").unwrap();
        let line = xml.find("<c:lineChart>").unwrap();
        assert!(bar < line);
        assert!(xml.contains(r#"<c:idx val="1"/>"#));
        assert_eq!(xml.matches(r#"<c:axId val="1"/>"#).count(), 3);
    }

    #[test]
    fn unsupported_kinds_warn_once() {
        let warnings = WarningManager::new();
        assert!(chart_xml(&chart(ChartKind::Waterfall, context()), "Sheet1", &warnings).is_none());
        assert!(chart_xml(&chart(ChartKind::Waterfall, context()), "Sheet1", &warnings).is_none());
        assert_eq!(
            warnings.conversion_warnings(),
            vec![r#"Chart type "waterfall" is not yet supported."#.to_string()]
        );
    }
}
