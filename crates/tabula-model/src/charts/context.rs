use serde::{Deserialize, Serialize};

use super::{DataSet, LegendPosition};

/// Chart-kind-agnostic configuration used to build (or switch) a chart definition.
///
/// Every field is optional; each chart variant picks the fields it understands in its own
/// `from_context` function and falls back to its defaults for the rest.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartCreationContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legend_position: Option<LegendPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_sets: Option<Vec<DataSet>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels_range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_sets_have_title: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stacked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizontal: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cumulative: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_area: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smooth: Option<bool>,
    /// Doughnut hole size in percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hole_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_slice_angle: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_subtotals: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub positive_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_ranges: Option<Vec<String>>,
}
