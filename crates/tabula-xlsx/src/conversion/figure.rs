//! Drawing anchors and chart records to model figures.

use tabula_model::charts::{ChartCreationContext, ChartDefinition, ChartKind, DataSet, LegendPosition, SeriesKind};
use tabula_model::{Figure, FigureData, FigureSize, ImageData, SheetData};

use super::color::convert_color;
use super::IdSequence;
use crate::extraction::records::{
    XlsxAnchor, XlsxAnchorMarker, XlsxChart, XlsxChartFamily, XlsxChartFamilyKind,
    XlsxChartSeries, XlsxFigure, XlsxFigureData, XlsxTheme,
};
use crate::warnings::{WarningKind, WarningManager};

pub const EMU_PER_PIXEL: f64 = 9525.0;

/// Doughnut hole used when the file does not say.
pub const DEFAULT_HOLE_SIZE: u32 = 50;

pub fn emu_to_px(emu: i64) -> f64 {
    emu as f64 / EMU_PER_PIXEL
}

pub fn px_to_emu(px: f64) -> i64 {
    (px * EMU_PER_PIXEL).round() as i64
}

/// Pixel position of a cell marker on `sheet`.
fn marker_position(sheet: &SheetData, marker: &XlsxAnchorMarker) -> (f64, f64) {
    let x: f64 = (0..marker.col).map(|c| sheet.col_size(c)).sum();
    let y: f64 = (0..marker.row).map(|r| sheet.row_size(r)).sum();
    (x + emu_to_px(marker.col_off), y + emu_to_px(marker.row_off))
}

/// `[x, y, width, height]` in pixels.
pub fn anchor_geometry(sheet: &SheetData, anchor: &XlsxAnchor) -> [f64; 4] {
    match anchor {
        XlsxAnchor::TwoCell { from, to } => {
            let (x, y) = marker_position(sheet, from);
            let (x2, y2) = marker_position(sheet, to);
            [x, y, (x2 - x).max(0.0), (y2 - y).max(0.0)]
        }
        XlsxAnchor::OneCell { from, ext } => {
            let (x, y) = marker_position(sheet, from);
            [x, y, emu_to_px(ext.0), emu_to_px(ext.1)]
        }
        XlsxAnchor::Absolute { pos, ext } => {
            [emu_to_px(pos.0), emu_to_px(pos.1), emu_to_px(ext.0), emu_to_px(ext.1)]
        }
    }
}

/// Cell marker for a pixel position: the cell containing the point plus the EMU offset inside it.
pub fn position_marker(sheet: &SheetData, x: f64, y: f64) -> XlsxAnchorMarker {
    let (col, col_px) = locate(x, |c| sheet.col_size(c));
    let (row, row_px) = locate(y, |r| sheet.row_size(r));
    XlsxAnchorMarker {
        col,
        col_off: px_to_emu(col_px),
        row,
        row_off: px_to_emu(row_px),
    }
}

fn locate(mut offset: f64, size: impl Fn(u32) -> f64) -> (u32, f64) {
    let mut index = 0;
    while index < tabula_model::MAX_COLS.max(tabula_model::MAX_ROWS) {
        let current = size(index);
        if offset < current || current <= 0.0 {
            break;
        }
        offset -= current;
        index += 1;
    }
    (index, offset.max(0.0))
}

pub fn convert_figures(
    figures: &[XlsxFigure],
    sheet: &SheetData,
    theme: &XlsxTheme,
    warnings: &WarningManager,
    ids: &mut IdSequence,
) -> Vec<Figure<FigureData>> {
    figures
        .iter()
        .filter_map(|figure| {
            let geometry = anchor_geometry(sheet, &figure.anchor);
            match &figure.data {
                XlsxFigureData::Chart(chart) => {
                    let definition = convert_chart(chart, theme, warnings)?;
                    Some(Figure::chart(ids.next_id(), geometry, definition))
                }
                XlsxFigureData::Image(image) => Some(Figure::image(
                    ids.next_id(),
                    geometry,
                    ImageData {
                        path: image.path.clone(),
                        mimetype: image.mimetype.clone(),
                        size: FigureSize { width: geometry[2], height: geometry[3] },
                    },
                )),
            }
        })
        .collect()
}

pub fn legend_position(pos: Option<&str>) -> LegendPosition {
    match pos {
        None => LegendPosition::None,
        Some("t") => LegendPosition::Top,
        Some("b") => LegendPosition::Bottom,
        Some("l") => LegendPosition::Left,
        Some(_) => LegendPosition::Right,
    }
}

fn is_stacked(family: &XlsxChartFamily) -> bool {
    matches!(family.grouping.as_deref(), Some("stacked" | "percentStacked"))
}

fn series_kind(kind: XlsxChartFamilyKind) -> Option<SeriesKind> {
    match kind {
        XlsxChartFamilyKind::Bar => Some(SeriesKind::Bar),
        XlsxChartFamilyKind::Line | XlsxChartFamilyKind::Area | XlsxChartFamilyKind::Scatter => {
            Some(SeriesKind::Line)
        }
        _ => None,
    }
}

/// Values and labels of a series; scatter and bubble series use their x/y references.
fn series_ranges(series: &XlsxChartSeries) -> (Option<&String>, Option<&String>) {
    (
        series.val.as_ref().or(series.y_val.as_ref()),
        series.cat.as_ref().or(series.x_val.as_ref()),
    )
}

fn data_sets(families: &[&XlsxChartFamily], combo: bool) -> Vec<DataSet> {
    families
        .iter()
        .flat_map(|family| {
            family.series.iter().filter_map(move |series| {
                let (values, _) = series_ranges(series);
                Some(DataSet {
                    data_range: values?.clone(),
                    label_cell: series.tx.clone(),
                    series_kind: if combo { series_kind(family.kind) } else { None },
                })
            })
        })
        .collect()
}

pub fn convert_chart(chart: &XlsxChart, theme: &XlsxTheme, warnings: &WarningManager) -> Option<ChartDefinition> {
    let first = chart.families.first()?;
    let combinable = chart.families.len() > 1
        && chart.families.iter().all(|f| series_kind(f.kind).is_some());
    let families: Vec<&XlsxChartFamily> = if combinable {
        chart.families.iter().collect()
    } else {
        if chart.families.len() > 1 {
            warnings.generate_not_supported_warning(
                WarningKind::ChartType,
                Some("combination of chart families"),
                None,
            );
        }
        vec![first]
    };

    let mut ctx = ChartCreationContext {
        title: Some(chart.title.clone().unwrap_or_default()),
        background: chart.background.as_ref().and_then(|c| convert_color(c, theme)),
        legend_position: Some(legend_position(chart.legend_position.as_deref())),
        data_sets: Some(data_sets(&families, combinable)),
        labels_range: first.series.first().and_then(|s| series_ranges(s).1.cloned()),
        data_sets_have_title: Some(false),
        ..Default::default()
    };

    let kind = if combinable {
        ChartKind::Combo
    } else {
        match first.kind {
            XlsxChartFamilyKind::Bar => {
                ctx.stacked = Some(is_stacked(first));
                ctx.horizontal = Some(first.bar_dir.as_deref() == Some("bar"));
                ChartKind::Bar
            }
            XlsxChartFamilyKind::Line | XlsxChartFamilyKind::Scatter | XlsxChartFamilyKind::Area => {
                ctx.stacked = Some(is_stacked(first));
                ctx.fill_area = Some(first.kind == XlsxChartFamilyKind::Area);
                ctx.smooth = Some(first.series.iter().any(|s| s.smooth));
                ChartKind::Line
            }
            XlsxChartFamilyKind::Pie => ChartKind::Pie,
            XlsxChartFamilyKind::Doughnut => {
                ctx.hole_size = Some(first.hole_size.unwrap_or(DEFAULT_HOLE_SIZE));
                ChartKind::Pie
            }
            XlsxChartFamilyKind::Radar => {
                ctx.fill_area = Some(first.radar_style.as_deref() == Some("filled"));
                ChartKind::Radar
            }
            XlsxChartFamilyKind::Bubble => {
                ctx.size_ranges = Some(
                    first.series.iter().filter_map(|s| s.bubble_size.clone()).collect(),
                );
                ChartKind::Bubble
            }
            XlsxChartFamilyKind::Funnel => ChartKind::Funnel,
            XlsxChartFamilyKind::Treemap => ChartKind::Treemap,
            XlsxChartFamilyKind::Sunburst => ChartKind::Sunburst,
            XlsxChartFamilyKind::Waterfall => ChartKind::Waterfall,
        }
    };
    if matches!(first.kind, XlsxChartFamilyKind::Pie | XlsxChartFamilyKind::Doughnut) {
        ctx.first_slice_angle = first.first_slice_angle;
    }
    Some(ChartDefinition::from_context(kind, &ctx))
}
