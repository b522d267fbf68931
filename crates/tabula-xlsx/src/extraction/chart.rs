//! DrawingML charts (`c:chartSpace`) and Office 2016 chartEx parts (`cx:chartSpace`).

use std::collections::BTreeMap;

use roxmltree::Node;

use super::kernel::{node_text, Extractor, XmlFile};
use super::records::{XlsxChart, XlsxChartFamily, XlsxChartFamilyKind, XlsxChartSeries, XlsxColor};
use crate::warnings::{WarningKind, WarningManager};
use crate::{ImportError, XlsxFiles};

const FAMILY_TAGS: [(&str, XlsxChartFamilyKind); 12] = [
    ("barChart", XlsxChartFamilyKind::Bar),
    ("bar3DChart", XlsxChartFamilyKind::Bar),
    ("lineChart", XlsxChartFamilyKind::Line),
    ("line3DChart", XlsxChartFamilyKind::Line),
    ("pieChart", XlsxChartFamilyKind::Pie),
    ("pie3DChart", XlsxChartFamilyKind::Pie),
    ("doughnutChart", XlsxChartFamilyKind::Doughnut),
    ("radarChart", XlsxChartFamilyKind::Radar),
    ("bubbleChart", XlsxChartFamilyKind::Bubble),
    ("scatterChart", XlsxChartFamilyKind::Scatter),
    ("areaChart", XlsxChartFamilyKind::Area),
    ("area3DChart", XlsxChartFamilyKind::Area),
];

pub fn extract_chart(
    files: &XlsxFiles,
    path: &str,
    warnings: &WarningManager,
) -> Result<XlsxChart, ImportError> {
    let file = XmlFile::open(files, path)?;
    let ex = Extractor::new(&file.path, warnings);
    let root = file.root();
    let Some(chart) = ex.child(root, "c:chart") else {
        return Ok(XlsxChart::default());
    };

    let mut families = Vec::new();
    if let Some(plot_area) = ex.child(chart, "c:plotArea") {
        for node in plot_area.children().filter(|n| n.is_element()) {
            let tag = node.tag_name().name();
            if let Some((_, kind)) = FAMILY_TAGS.iter().find(|(t, _)| *t == tag) {
                families.push(extract_family(&ex, node, *kind));
            } else if tag.ends_with("Chart") {
                warnings.generate_not_supported_warning(WarningKind::ChartType, Some(tag), None);
            }
        }
    }

    Ok(XlsxChart {
        title: ex.child(chart, "c:title").and_then(|t| title_text(&ex, t)),
        background: ex
            .find(root, &["c:spPr", "a:solidFill", "a:srgbClr"])
            .and_then(|c| ex.opt_attr::<String>(c, "val"))
            .map(XlsxColor::rgb),
        legend_position: ex
            .child(chart, "c:legend")
            .map(|l| ex.child_val(l, "c:legendPos").unwrap_or_else(|| "r".to_string())),
        families,
    })
}

fn title_text(ex: &Extractor<'_>, title: Node<'_, '_>) -> Option<String> {
    let tx = ex.child(title, "c:tx")?;
    if let Some(rich) = ex.child(tx, "c:rich") {
        let text: String = ex.descendants(rich, "a:t").into_iter().map(node_text).collect();
        return Some(text);
    }
    ex.descendants(tx, "c:v").into_iter().next().map(node_text)
}

fn extract_family(
    ex: &Extractor<'_>,
    node: Node<'_, '_>,
    kind: XlsxChartFamilyKind,
) -> XlsxChartFamily {
    let scatter_smooth = ex
        .child_val::<String>(node, "c:scatterStyle")
        .is_some_and(|s| s.starts_with("smooth"));
    XlsxChartFamily {
        kind,
        bar_dir: ex.child_val(node, "c:barDir"),
        grouping: ex.child_val(node, "c:grouping"),
        hole_size: ex.child_val(node, "c:holeSize"),
        first_slice_angle: ex.child_val(node, "c:firstSliceAng"),
        radar_style: ex.child_val(node, "c:radarStyle"),
        series: ex
            .children(node, "c:ser")
            .into_iter()
            .map(|ser| XlsxChartSeries {
                tx: series_ref(ex, ser, "c:tx"),
                cat: series_ref(ex, ser, "c:cat"),
                val: series_ref(ex, ser, "c:val"),
                x_val: series_ref(ex, ser, "c:xVal"),
                y_val: series_ref(ex, ser, "c:yVal"),
                bubble_size: series_ref(ex, ser, "c:bubbleSize"),
                smooth: scatter_smooth || ex.child_val(ser, "c:smooth").unwrap_or(false),
            })
            .collect(),
    }
}

/// Formula of a `strRef`/`numRef`/`multiLvlStrRef` below `tag`.
fn series_ref(ex: &Extractor<'_>, ser: Node<'_, '_>, tag: &str) -> Option<String> {
    let data = ex.child(ser, tag)?;
    ex.descendants(data, "c:f")
        .into_iter()
        .next()
        .map(node_text)
        .filter(|f| !f.is_empty())
}

/// chartEx parts hold one family per `layoutId`; data is referenced through `cx:dataId`.
pub fn extract_chart_ex(
    files: &XlsxFiles,
    path: &str,
    warnings: &WarningManager,
) -> Result<XlsxChart, ImportError> {
    let file = XmlFile::open(files, path)?;
    let ex = Extractor::new(&file.path, warnings);
    let root = file.root();

    let mut data: BTreeMap<u32, (Option<String>, Option<String>)> = BTreeMap::new();
    if let Some(chart_data) = ex.child(root, "cx:chartData") {
        for node in ex.children(chart_data, "cx:data") {
            let id = ex.attr_or(node, "id", 0);
            let mut cat = None;
            let mut val = None;
            for dim in node.children().filter(|n| n.is_element()) {
                let formula = ex.opt_text(dim, "cx:f");
                match ex.attr_or(dim, "type", String::new()).as_str() {
                    "cat" => cat = formula,
                    "val" | "size" => val = val.or(formula),
                    _ => {}
                }
            }
            data.insert(id, (cat, val));
        }
    }

    let Some(chart) = ex.child(root, "cx:chart") else {
        return Ok(XlsxChart::default());
    };
    let mut families: Vec<XlsxChartFamily> = Vec::new();
    for series in ex.descendants(chart, "cx:series") {
        let layout = ex.attr_or(series, "layoutId", String::new());
        let kind = match layout.as_str() {
            "funnel" => XlsxChartFamilyKind::Funnel,
            "treemap" => XlsxChartFamilyKind::Treemap,
            "sunburst" => XlsxChartFamilyKind::Sunburst,
            "waterfall" => XlsxChartFamilyKind::Waterfall,
            other => {
                warnings.generate_not_supported_warning(WarningKind::ChartType, Some(other), None);
                continue;
            }
        };
        let (cat, val) = ex
            .child(series, "cx:dataId")
            .and_then(|d| ex.opt_attr::<u32>(d, "val"))
            .and_then(|id| data.get(&id).cloned())
            .unwrap_or_default();
        let record = XlsxChartSeries {
            tx: ex
                .find(series, &["cx:tx", "cx:txData", "cx:f"])
                .map(node_text),
            cat,
            val,
            ..Default::default()
        };
        match families.iter_mut().find(|f| f.kind == kind) {
            Some(family) => family.series.push(record),
            None => families.push(XlsxChartFamily {
                kind,
                bar_dir: None,
                grouping: None,
                hole_size: None,
                first_slice_angle: None,
                radar_style: None,
                series: vec![record],
            }),
        }
    }

    let title = ex.child(chart, "cx:title").and_then(|t| {
        ex.find(t, &["cx:tx", "cx:txData", "cx:v"])
            .map(node_text)
            .or_else(|| {
                let runs = ex.descendants(t, "a:t");
                (!runs.is_empty()).then(|| runs.into_iter().map(node_text).collect())
            })
    });

    Ok(XlsxChart {
        title,
        background: ex
            .find(root, &["cx:spPr", "a:solidFill", "a:srgbClr"])
            .and_then(|c| ex.opt_attr::<String>(c, "val"))
            .map(XlsxColor::rgb),
        legend_position: ex
            .child(chart, "cx:legend")
            .map(|l| ex.attr_or(l, "pos", "r".to_string())),
        families,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::XlsxPart;
    use pretty_assertions::assert_eq;

    const CHART: &str = r#"<c:chartSpace xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main">
      <c:chart>
        <c:title><c:tx><c:rich><a:bodyPr/><a:p><a:r><a:t>Sales </a:t></a:r><a:r><a:t>2024</a:t></a:r></a:p></c:rich></c:tx></c:title>
        <c:plotArea><c:layout/>
          <c:barChart><c:barDir val="bar"/><c:grouping val="stacked"/>
            <c:ser><c:idx val="0"/><c:tx><c:strRef><c:f>Sheet1!$B$1</c:f></c:strRef></c:tx>
              <c:cat><c:strRef><c:f>Sheet1!$A$2:$A$5</c:f></c:strRef></c:cat>
              <c:val><c:numRef><c:f>Sheet1!$B$2:$B$5</c:f><c:numCache/></c:numRef></c:val></c:ser>
          </c:barChart>
          <c:lineChart><c:grouping val="standard"/><c:ser><c:val><c:numRef><c:f>Sheet1!$C$2:$C$5</c:f></c:numRef></c:val><c:smooth val="1"/></c:ser></c:lineChart>
          <c:stockChart/>
          <c:catAx/>
        </c:plotArea>
        <c:legend><c:legendPos val="b"/></c:legend>
      </c:chart>
      <c:spPr><a:solidFill><a:srgbClr val="FFFFCC"/></a:solidFill></c:spPr>
    </c:chartSpace>"#;

    const CHART_EX: &str = r#"<cx:chartSpace xmlns:cx="http://schemas.microsoft.com/office/drawing/2014/chartex">
      <cx:chartData><cx:data id="0"><cx:strDim type="cat"><cx:f>Sheet1!$A$2:$A$6</cx:f></cx:strDim><cx:numDim type="val"><cx:f>Sheet1!$B$2:$B$6</cx:f></cx:numDim></cx:data></cx:chartData>
      <cx:chart><cx:title><cx:tx><cx:txData><cx:v>Pipeline</cx:v></cx:txData></cx:tx></cx:title>
        <cx:plotArea><cx:plotAreaRegion><cx:series layoutId="funnel" uniqueId="{1}"><cx:tx><cx:txData><cx:f>Sheet1!$B$1</cx:f><cx:v>Deals</cx:v></cx:txData></cx:tx><cx:dataId val="0"/></cx:series></cx:plotAreaRegion></cx:plotArea>
        <cx:legend pos="t"/></cx:chart>
    </cx:chartSpace>"#;

    #[test]
    fn reads_plot_area_families() {
        let mut files = XlsxFiles::new();
        files.insert("xl/charts/chart1.xml".to_string(), XlsxPart::Xml(CHART.to_string()));
        let warnings = WarningManager::new();
        let chart = extract_chart(&files, "xl/charts/chart1.xml", &warnings).unwrap();

        assert_eq!(chart.title.as_deref(), Some("Sales 2024"));
        assert_eq!(chart.legend_position.as_deref(), Some("b"));
        assert_eq!(chart.background, Some(XlsxColor::rgb("FFFFCC")));
        assert_eq!(chart.families.len(), 2);
        let bar = &chart.families[0];
        assert_eq!(bar.bar_dir.as_deref(), Some("bar"));
        assert_eq!(bar.series[0].tx.as_deref(), Some("Sheet1!$B$1"));
        assert_eq!(bar.series[0].val.as_deref(), Some("Sheet1!$B$2:$B$5"));
        assert!(chart.families[1].series[0].smooth);
        assert_eq!(
            warnings.conversion_warnings(),
            vec![r#"Chart type "stockChart" is not yet supported."#.to_string()]
        );
    }

    #[test]
    fn reads_chart_ex_series() {
        let mut files = XlsxFiles::new();
        files.insert("xl/charts/chartEx1.xml".to_string(), XlsxPart::Xml(CHART_EX.to_string()));
        let warnings = WarningManager::new();
        let chart = extract_chart_ex(&files, "xl/charts/chartEx1.xml", &warnings).unwrap();
        assert_eq!(chart.title.as_deref(), Some("Pipeline"));
        assert_eq!(chart.families[0].kind, XlsxChartFamilyKind::Funnel);
        let series = &chart.families[0].series[0];
        assert_eq!(series.cat.as_deref(), Some("Sheet1!$A$2:$A$6"));
        assert_eq!(series.val.as_deref(), Some("Sheet1!$B$2:$B$6"));
        assert_eq!(series.tx.as_deref(), Some("Sheet1!$B$1"));
        assert_eq!(chart.legend_position.as_deref(), Some("t"));
    }
}
