use serde::{Deserialize, Serialize};

use super::{ChartCreationContext, DataSet, LegendPosition, TrackedRanges};

fn title_of(ctx: &ChartCreationContext) -> String {
    ctx.title.clone().unwrap_or_default()
}

fn legend_of(ctx: &ChartCreationContext) -> LegendPosition {
    ctx.legend_position.unwrap_or_default()
}

fn data_sets_of(ctx: &ChartCreationContext) -> Vec<DataSet> {
    ctx.data_sets.clone().unwrap_or_default()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarChartDefinition {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default)]
    pub legend_position: LegendPosition,
    pub data_sets: Vec<DataSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels_range: Option<String>,
    #[serde(default)]
    pub data_sets_have_title: bool,
    #[serde(default)]
    pub stacked: bool,
    #[serde(default)]
    pub horizontal: bool,
}

impl BarChartDefinition {
    pub fn from_context(ctx: &ChartCreationContext) -> Self {
        Self {
            title: title_of(ctx),
            background: ctx.background.clone(),
            legend_position: legend_of(ctx),
            data_sets: data_sets_of(ctx),
            labels_range: ctx.labels_range.clone(),
            data_sets_have_title: ctx.data_sets_have_title.unwrap_or(false),
            stacked: ctx.stacked.unwrap_or(false),
            horizontal: ctx.horizontal.unwrap_or(false),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineChartDefinition {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default)]
    pub legend_position: LegendPosition,
    pub data_sets: Vec<DataSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels_range: Option<String>,
    #[serde(default)]
    pub data_sets_have_title: bool,
    #[serde(default)]
    pub stacked: bool,
    #[serde(default)]
    pub cumulative: bool,
    #[serde(default)]
    pub fill_area: bool,
    #[serde(default)]
    pub smooth: bool,
}

impl LineChartDefinition {
    pub fn from_context(ctx: &ChartCreationContext) -> Self {
        Self {
            title: title_of(ctx),
            background: ctx.background.clone(),
            legend_position: legend_of(ctx),
            data_sets: data_sets_of(ctx),
            labels_range: ctx.labels_range.clone(),
            data_sets_have_title: ctx.data_sets_have_title.unwrap_or(false),
            stacked: ctx.stacked.unwrap_or(false),
            cumulative: ctx.cumulative.unwrap_or(false),
            fill_area: ctx.fill_area.unwrap_or(false),
            smooth: ctx.smooth.unwrap_or(false),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PieChartDefinition {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default)]
    pub legend_position: LegendPosition,
    pub data_sets: Vec<DataSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels_range: Option<String>,
    #[serde(default)]
    pub data_sets_have_title: bool,
    /// A non-zero hole size renders the pie as a doughnut.
    #[serde(default)]
    pub hole_size: u32,
    #[serde(default)]
    pub first_slice_angle: u32,
}

impl PieChartDefinition {
    pub fn from_context(ctx: &ChartCreationContext) -> Self {
        Self {
            title: title_of(ctx),
            background: ctx.background.clone(),
            legend_position: legend_of(ctx),
            data_sets: data_sets_of(ctx),
            labels_range: ctx.labels_range.clone(),
            data_sets_have_title: ctx.data_sets_have_title.unwrap_or(false),
            hole_size: ctx.hole_size.unwrap_or(0).min(90),
            first_slice_angle: ctx.first_slice_angle.unwrap_or(0) % 360,
        }
    }

    pub fn is_doughnut(&self) -> bool {
        self.hole_size > 0
    }
}

/// Single-series charts drawn as stacked horizontal bands (funnel, pyramid).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunnelChartDefinition {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default)]
    pub legend_position: LegendPosition,
    pub data_sets: Vec<DataSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels_range: Option<String>,
    #[serde(default)]
    pub data_sets_have_title: bool,
}

impl FunnelChartDefinition {
    pub fn from_context(ctx: &ChartCreationContext) -> Self {
        Self {
            title: title_of(ctx),
            background: ctx.background.clone(),
            legend_position: ctx.legend_position.unwrap_or(LegendPosition::None),
            // Funnels only draw their first data set.
            data_sets: data_sets_of(ctx).into_iter().take(1).collect(),
            labels_range: ctx.labels_range.clone(),
            data_sets_have_title: ctx.data_sets_have_title.unwrap_or(false),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PyramidChartDefinition {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default)]
    pub legend_position: LegendPosition,
    /// At most two data sets: left and right side of the pyramid.
    pub data_sets: Vec<DataSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels_range: Option<String>,
    #[serde(default)]
    pub data_sets_have_title: bool,
}

impl PyramidChartDefinition {
    pub fn from_context(ctx: &ChartCreationContext) -> Self {
        Self {
            title: title_of(ctx),
            background: ctx.background.clone(),
            legend_position: legend_of(ctx),
            data_sets: data_sets_of(ctx).into_iter().take(2).collect(),
            labels_range: ctx.labels_range.clone(),
            data_sets_have_title: ctx.data_sets_have_title.unwrap_or(false),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoChartDefinition {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default)]
    pub legend_position: LegendPosition,
    pub data_sets: Vec<DataSet>,
    /// Range holding the region names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels_range: Option<String>,
    #[serde(default)]
    pub data_sets_have_title: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl GeoChartDefinition {
    pub fn from_context(ctx: &ChartCreationContext) -> Self {
        Self {
            title: title_of(ctx),
            background: ctx.background.clone(),
            legend_position: legend_of(ctx),
            data_sets: data_sets_of(ctx).into_iter().take(1).collect(),
            labels_range: ctx.labels_range.clone(),
            data_sets_have_title: ctx.data_sets_have_title.unwrap_or(false),
            region: ctx.region.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarChartDefinition {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default)]
    pub legend_position: LegendPosition,
    pub data_sets: Vec<DataSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels_range: Option<String>,
    #[serde(default)]
    pub data_sets_have_title: bool,
    #[serde(default)]
    pub stacked: bool,
    #[serde(default)]
    pub fill_area: bool,
}

impl RadarChartDefinition {
    pub fn from_context(ctx: &ChartCreationContext) -> Self {
        Self {
            title: title_of(ctx),
            background: ctx.background.clone(),
            legend_position: legend_of(ctx),
            data_sets: data_sets_of(ctx),
            labels_range: ctx.labels_range.clone(),
            data_sets_have_title: ctx.data_sets_have_title.unwrap_or(false),
            stacked: ctx.stacked.unwrap_or(false),
            fill_area: ctx.fill_area.unwrap_or(false),
        }
    }
}

/// Hierarchical charts (sunburst, treemap): `data_sets` are the hierarchy levels from
/// the root down, `labels_range` holds the values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchicalChartDefinition {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default)]
    pub legend_position: LegendPosition,
    pub data_sets: Vec<DataSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels_range: Option<String>,
    #[serde(default)]
    pub data_sets_have_title: bool,
}

impl HierarchicalChartDefinition {
    pub fn from_context(ctx: &ChartCreationContext) -> Self {
        Self {
            title: title_of(ctx),
            background: ctx.background.clone(),
            legend_position: ctx.legend_position.unwrap_or(LegendPosition::None),
            data_sets: data_sets_of(ctx),
            labels_range: ctx.labels_range.clone(),
            data_sets_have_title: ctx.data_sets_have_title.unwrap_or(false),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterfallChartDefinition {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default)]
    pub legend_position: LegendPosition,
    pub data_sets: Vec<DataSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels_range: Option<String>,
    #[serde(default)]
    pub data_sets_have_title: bool,
    #[serde(default)]
    pub show_subtotals: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positive_values_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_values_color: Option<String>,
}

impl WaterfallChartDefinition {
    pub fn from_context(ctx: &ChartCreationContext) -> Self {
        Self {
            title: title_of(ctx),
            background: ctx.background.clone(),
            legend_position: legend_of(ctx),
            data_sets: data_sets_of(ctx),
            labels_range: ctx.labels_range.clone(),
            data_sets_have_title: ctx.data_sets_have_title.unwrap_or(false),
            show_subtotals: ctx.show_subtotals.unwrap_or(false),
            positive_values_color: ctx.positive_color.clone(),
            negative_values_color: ctx.negative_color.clone(),
        }
    }
}

/// Bubble chart: `labels_range` holds the x values, each data set the y values and
/// `size_ranges[i]` the bubble sizes of data set `i`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BubbleChartDefinition {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default)]
    pub legend_position: LegendPosition,
    pub data_sets: Vec<DataSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels_range: Option<String>,
    #[serde(default)]
    pub data_sets_have_title: bool,
    #[serde(default)]
    pub size_ranges: Vec<String>,
}

impl BubbleChartDefinition {
    pub fn from_context(ctx: &ChartCreationContext) -> Self {
        Self {
            title: title_of(ctx),
            background: ctx.background.clone(),
            legend_position: legend_of(ctx),
            data_sets: data_sets_of(ctx),
            labels_range: ctx.labels_range.clone(),
            data_sets_have_title: ctx.data_sets_have_title.unwrap_or(false),
            size_ranges: ctx.size_ranges.clone().unwrap_or_default(),
        }
    }
}

/// Bar and line series on shared axes. Each data set carries its series type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComboChartDefinition {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default)]
    pub legend_position: LegendPosition,
    pub data_sets: Vec<DataSet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels_range: Option<String>,
    #[serde(default)]
    pub data_sets_have_title: bool,
}

impl ComboChartDefinition {
    pub fn from_context(ctx: &ChartCreationContext) -> Self {
        Self {
            title: title_of(ctx),
            background: ctx.background.clone(),
            legend_position: legend_of(ctx),
            data_sets: data_sets_of(ctx),
            labels_range: ctx.labels_range.clone(),
            data_sets_have_title: ctx.data_sets_have_title.unwrap_or(false),
        }
    }
}

macro_rules! impl_tracked_ranges {
    ($($ty:ty),* $(,)?) => {
        $(
            impl TrackedRanges for $ty {
                fn data_sets_mut(&mut self) -> &mut Vec<DataSet> {
                    &mut self.data_sets
                }

                fn labels_range_mut(&mut self) -> &mut Option<String> {
                    &mut self.labels_range
                }
            }
        )*
    };
}

impl_tracked_ranges!(
    BarChartDefinition,
    LineChartDefinition,
    PieChartDefinition,
    FunnelChartDefinition,
    PyramidChartDefinition,
    GeoChartDefinition,
    RadarChartDefinition,
    HierarchicalChartDefinition,
    WaterfallChartDefinition,
    ComboChartDefinition,
);

impl TrackedRanges for BubbleChartDefinition {
    fn data_sets_mut(&mut self) -> &mut Vec<DataSet> {
        &mut self.data_sets
    }

    fn labels_range_mut(&mut self) -> &mut Option<String> {
        &mut self.labels_range
    }

    fn extra_ranges_mut(&mut self) -> Vec<&mut String> {
        self.size_ranges.iter_mut().collect()
    }
}
