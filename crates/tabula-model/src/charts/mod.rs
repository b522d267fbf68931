//! Chart definitions, one variant per chart family.
//!
//! A definition is either deserialized from a stored workbook or built from a
//! [`ChartCreationContext`]. Once built it is only changed through
//! [`ChartDefinition::update_ranges`].

mod context;
mod definitions;

use serde::{Deserialize, Serialize};

pub use context::ChartCreationContext;
pub use definitions::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LegendPosition {
    #[default]
    Top,
    Bottom,
    Left,
    Right,
    None,
}

/// Series type of a combo chart data set.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SeriesKind {
    Bar,
    Line,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSet {
    /// Values range, possibly sheet-qualified (e.g. `Sheet1!B2:B10`).
    pub data_range: String,
    /// Cell holding the series name, when not part of `data_range`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_cell: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_kind: Option<SeriesKind>,
}

impl DataSet {
    pub fn new(data_range: impl Into<String>) -> Self {
        Self {
            data_range: data_range.into(),
            label_cell: None,
            series_kind: None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
    Funnel,
    Geo,
    Radar,
    Sunburst,
    Treemap,
    Waterfall,
    Bubble,
    Pyramid,
    Combo,
}

impl ChartKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Pie => "pie",
            ChartKind::Funnel => "funnel",
            ChartKind::Geo => "geo",
            ChartKind::Radar => "radar",
            ChartKind::Sunburst => "sunburst",
            ChartKind::Treemap => "treemap",
            ChartKind::Waterfall => "waterfall",
            ChartKind::Bubble => "bubble",
            ChartKind::Pyramid => "pyramid",
            ChartKind::Combo => "combo",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum ChartDefinition {
    Bar(BarChartDefinition),
    Line(LineChartDefinition),
    Pie(PieChartDefinition),
    Funnel(FunnelChartDefinition),
    Geo(GeoChartDefinition),
    Radar(RadarChartDefinition),
    Sunburst(HierarchicalChartDefinition),
    Treemap(HierarchicalChartDefinition),
    Waterfall(WaterfallChartDefinition),
    Bubble(BubbleChartDefinition),
    Pyramid(PyramidChartDefinition),
    Combo(ComboChartDefinition),
}

/// What happened to one tracked range during [`ChartDefinition::update_ranges`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RangeAdaptation {
    Unchanged,
    Moved(String),
    Removed,
}

/// Result of [`ChartDefinition::update_ranges`].
///
/// `Unchanged` means no tracked range changed and the caller keeps its current definition.
#[derive(Clone, Debug, PartialEq)]
pub enum RangeUpdate<T> {
    Unchanged,
    Changed(T),
}

impl<T> RangeUpdate<T> {
    pub fn is_stale(&self) -> bool {
        matches!(self, RangeUpdate::Changed(_))
    }
}

/// Access to the ranges a chart variant tracks.
pub trait TrackedRanges {
    fn data_sets_mut(&mut self) -> &mut Vec<DataSet>;

    fn labels_range_mut(&mut self) -> &mut Option<String>;

    fn extra_ranges_mut(&mut self) -> Vec<&mut String> {
        Vec::new()
    }
}

/// Apply `adapt` to every tracked range of `def`. Returns `true` if anything changed.
fn adapt_ranges<D: TrackedRanges>(def: &mut D, adapt: &dyn Fn(&str) -> RangeAdaptation) -> bool {
    let mut changed = false;

    let data_sets = std::mem::take(def.data_sets_mut());
    let mut kept = Vec::with_capacity(data_sets.len());
    for mut data_set in data_sets {
        match adapt(&data_set.data_range) {
            RangeAdaptation::Unchanged => {}
            RangeAdaptation::Moved(range) => {
                data_set.data_range = range;
                changed = true;
            }
            RangeAdaptation::Removed => {
                changed = true;
                continue;
            }
        }
        if let Some(label) = data_set.label_cell.take() {
            data_set.label_cell = match adapt(&label) {
                RangeAdaptation::Unchanged => Some(label),
                RangeAdaptation::Moved(range) => {
                    changed = true;
                    Some(range)
                }
                RangeAdaptation::Removed => {
                    changed = true;
                    None
                }
            };
        }
        kept.push(data_set);
    }
    *def.data_sets_mut() = kept;

    let labels = def.labels_range_mut();
    if let Some(range) = labels.take() {
        *labels = match adapt(&range) {
            RangeAdaptation::Unchanged => Some(range),
            RangeAdaptation::Moved(moved) => {
                changed = true;
                Some(moved)
            }
            RangeAdaptation::Removed => {
                changed = true;
                None
            }
        };
    }

    for range in def.extra_ranges_mut() {
        match adapt(range) {
            RangeAdaptation::Unchanged => {}
            RangeAdaptation::Moved(moved) => {
                *range = moved;
                changed = true;
            }
            RangeAdaptation::Removed => {
                range.clear();
                changed = true;
            }
        }
    }

    changed
}

macro_rules! with_definition {
    ($value:expr, $def:ident => $body:expr) => {
        match $value {
            ChartDefinition::Bar($def) => $body,
            ChartDefinition::Line($def) => $body,
            ChartDefinition::Pie($def) => $body,
            ChartDefinition::Funnel($def) => $body,
            ChartDefinition::Geo($def) => $body,
            ChartDefinition::Radar($def) => $body,
            ChartDefinition::Sunburst($def) => $body,
            ChartDefinition::Treemap($def) => $body,
            ChartDefinition::Waterfall($def) => $body,
            ChartDefinition::Bubble($def) => $body,
            ChartDefinition::Pyramid($def) => $body,
            ChartDefinition::Combo($def) => $body,
        }
    };
}

impl ChartDefinition {
    /// Build a definition of `kind` from a creation context.
    pub fn from_context(kind: ChartKind, ctx: &ChartCreationContext) -> Self {
        match kind {
            ChartKind::Bar => ChartDefinition::Bar(BarChartDefinition::from_context(ctx)),
            ChartKind::Line => ChartDefinition::Line(LineChartDefinition::from_context(ctx)),
            ChartKind::Pie => ChartDefinition::Pie(PieChartDefinition::from_context(ctx)),
            ChartKind::Funnel => ChartDefinition::Funnel(FunnelChartDefinition::from_context(ctx)),
            ChartKind::Geo => ChartDefinition::Geo(GeoChartDefinition::from_context(ctx)),
            ChartKind::Radar => ChartDefinition::Radar(RadarChartDefinition::from_context(ctx)),
            ChartKind::Sunburst => {
                ChartDefinition::Sunburst(HierarchicalChartDefinition::from_context(ctx))
            }
            ChartKind::Treemap => {
                ChartDefinition::Treemap(HierarchicalChartDefinition::from_context(ctx))
            }
            ChartKind::Waterfall => {
                ChartDefinition::Waterfall(WaterfallChartDefinition::from_context(ctx))
            }
            ChartKind::Bubble => ChartDefinition::Bubble(BubbleChartDefinition::from_context(ctx)),
            ChartKind::Pyramid => {
                ChartDefinition::Pyramid(PyramidChartDefinition::from_context(ctx))
            }
            ChartKind::Combo => ChartDefinition::Combo(ComboChartDefinition::from_context(ctx)),
        }
    }

    pub fn kind(&self) -> ChartKind {
        match self {
            ChartDefinition::Bar(_) => ChartKind::Bar,
            ChartDefinition::Line(_) => ChartKind::Line,
            ChartDefinition::Pie(_) => ChartKind::Pie,
            ChartDefinition::Funnel(_) => ChartKind::Funnel,
            ChartDefinition::Geo(_) => ChartKind::Geo,
            ChartDefinition::Radar(_) => ChartKind::Radar,
            ChartDefinition::Sunburst(_) => ChartKind::Sunburst,
            ChartDefinition::Treemap(_) => ChartKind::Treemap,
            ChartDefinition::Waterfall(_) => ChartKind::Waterfall,
            ChartDefinition::Bubble(_) => ChartKind::Bubble,
            ChartDefinition::Pyramid(_) => ChartKind::Pyramid,
            ChartDefinition::Combo(_) => ChartKind::Combo,
        }
    }

    pub fn title(&self) -> &str {
        with_definition!(self, def => def.title.as_str())
    }

    pub fn data_sets(&self) -> &[DataSet] {
        with_definition!(self, def => def.data_sets.as_slice())
    }

    pub fn labels_range(&self) -> Option<&str> {
        with_definition!(self, def => def.labels_range.as_deref())
    }

    /// Extract the fields shared across chart kinds, e.g. to switch a chart to another kind.
    pub fn creation_context(&self) -> ChartCreationContext {
        let mut ctx = with_definition!(self, def => ChartCreationContext {
            title: Some(def.title.clone()),
            background: def.background.clone(),
            legend_position: Some(def.legend_position),
            data_sets: Some(def.data_sets.clone()),
            labels_range: def.labels_range.clone(),
            data_sets_have_title: Some(def.data_sets_have_title),
            ..Default::default()
        });
        match self {
            ChartDefinition::Bar(def) => {
                ctx.stacked = Some(def.stacked);
                ctx.horizontal = Some(def.horizontal);
            }
            ChartDefinition::Line(def) => {
                ctx.stacked = Some(def.stacked);
                ctx.cumulative = Some(def.cumulative);
                ctx.fill_area = Some(def.fill_area);
                ctx.smooth = Some(def.smooth);
            }
            ChartDefinition::Pie(def) => {
                ctx.hole_size = Some(def.hole_size);
                ctx.first_slice_angle = Some(def.first_slice_angle);
            }
            ChartDefinition::Geo(def) => ctx.region = def.region.clone(),
            ChartDefinition::Radar(def) => {
                ctx.stacked = Some(def.stacked);
                ctx.fill_area = Some(def.fill_area);
            }
            ChartDefinition::Waterfall(def) => {
                ctx.show_subtotals = Some(def.show_subtotals);
                ctx.positive_color = def.positive_values_color.clone();
                ctx.negative_color = def.negative_values_color.clone();
            }
            ChartDefinition::Bubble(def) => ctx.size_ranges = Some(def.size_ranges.clone()),
            ChartDefinition::Funnel(_)
            | ChartDefinition::Sunburst(_)
            | ChartDefinition::Treemap(_)
            | ChartDefinition::Pyramid(_)
            | ChartDefinition::Combo(_) => {}
        }
        ctx
    }

    /// Apply a range transformation to every tracked range.
    ///
    /// Data sets whose values range is removed are dropped. When no range changes the
    /// current definition stays valid and [`RangeUpdate::Unchanged`] is returned.
    pub fn update_ranges(&self, adapt: &dyn Fn(&str) -> RangeAdaptation) -> RangeUpdate<Self> {
        let mut updated = self.clone();
        let changed = with_definition!(&mut updated, def => adapt_ranges(def, adapt));
        if !changed {
            return RangeUpdate::Unchanged;
        }
        if let ChartDefinition::Bubble(def) = &mut updated {
            def.size_ranges.retain(|r| !r.is_empty());
        }
        RangeUpdate::Changed(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar() -> ChartDefinition {
        ChartDefinition::from_context(
            ChartKind::Bar,
            &ChartCreationContext {
                title: Some("Sales".to_string()),
                data_sets: Some(vec![DataSet::new("Sheet1!B1:B5"), DataSet::new("Sheet1!C1:C5")]),
                labels_range: Some("Sheet1!A2:A5".to_string()),
                stacked: Some(true),
                ..Default::default()
            },
        )
    }

    #[test]
    fn untouched_ranges_preserve_identity() {
        let def = bar();
        let update = def.update_ranges(&|_| RangeAdaptation::Unchanged);
        assert_eq!(update, RangeUpdate::Unchanged);
        assert!(!update.is_stale());
    }

    #[test]
    fn moved_and_removed_ranges_mark_the_definition_stale() {
        let def = bar();
        let update = def.update_ranges(&|range| match range {
            "Sheet1!B1:B5" => RangeAdaptation::Moved("Sheet1!D1:D5".to_string()),
            "Sheet1!C1:C5" => RangeAdaptation::Removed,
            _ => RangeAdaptation::Unchanged,
        });
        let RangeUpdate::Changed(updated) = update else {
            panic!("expected a changed definition");
        };
        assert_eq!(updated.data_sets(), &[DataSet::new("Sheet1!D1:D5")]);
        assert_eq!(updated.labels_range(), Some("Sheet1!A2:A5"));
        assert_eq!(updated.title(), "Sales");
    }

    #[test]
    fn context_switches_kind_without_losing_shared_fields() {
        let def = bar();
        let line = ChartDefinition::from_context(ChartKind::Line, &def.creation_context());
        let ChartDefinition::Line(line) = line else {
            panic!("expected a line chart");
        };
        assert!(line.stacked);
        assert_eq!(line.data_sets.len(), 2);
        assert_eq!(line.title, "Sales");
    }

    #[test]
    fn funnel_keeps_a_single_data_set() {
        let def = ChartDefinition::from_context(ChartKind::Funnel, &bar().creation_context());
        assert_eq!(def.data_sets().len(), 1);
    }
}
