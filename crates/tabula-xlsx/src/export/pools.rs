//! Deduplicating collections filled during the export walk.
//!
//! Indexes handed out by a pool stay valid for the rest of the session, but a pool's content
//! is only complete once the walk is over; emitters read the pools last.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use crate::path::{rels_for_part, relative_target};
use crate::xml::{push_attr, NS_PKG_REL, XML_HEADER};

/// Values in first-pushed order; structurally equal values share one 0-based index.
#[derive(Clone, Debug)]
pub struct InternPool<T> {
    items: Vec<T>,
    index: HashMap<T, u32>,
}

impl<T> Default for InternPool<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Clone + Eq + Hash> InternPool<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pool starting with `items` at indexes `0..items.len()`.
    pub fn seeded(items: impl IntoIterator<Item = T>) -> Self {
        let mut pool = Self::new();
        for item in items {
            pool.push_or_find(item);
        }
        pool
    }

    pub fn push_or_find(&mut self, item: T) -> u32 {
        if let Some(index) = self.index.get(&item) {
            return *index;
        }
        let index = self.items.len() as u32;
        self.items.push(item.clone());
        self.index.insert(item, index);
        index
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }
}

pub const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
pub const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
pub const REL_SHARED_STRINGS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";
pub const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub const REL_DRAWING: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing";
pub const REL_CHART: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart";
pub const REL_IMAGE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
pub const REL_TABLE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/table";
pub const REL_HYPERLINK: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct RelEntry {
    type_: &'static str,
    /// Package part, or the raw URL of an external target.
    target: String,
    external: bool,
}

/// One `.rels` file per source part.
#[derive(Debug, Default)]
pub struct RelsPool {
    files: BTreeMap<String, InternPool<RelEntry>>,
}

impl RelsPool {
    /// Relationship id (`rId{n}`) from `source` to the package part `target`.
    pub fn push_or_find(&mut self, source: &str, type_: &'static str, target: &str) -> String {
        self.push(source, type_, target.to_string(), false)
    }

    pub fn push_external(&mut self, source: &str, type_: &'static str, url: &str) -> String {
        self.push(source, type_, url.to_string(), true)
    }

    fn push(&mut self, source: &str, type_: &'static str, target: String, external: bool) -> String {
        let index = self
            .files
            .entry(source.to_string())
            .or_default()
            .push_or_find(RelEntry { type_, target, external });
        format!("rId{}", index + 1)
    }

    /// `(rels part name, xml)` of every source part that has relationships.
    pub fn to_parts(&self) -> Vec<(String, String)> {
        self.files
            .iter()
            .map(|(source, pool)| (rels_for_part(source), rels_xml(source, pool)))
            .collect()
    }
}

fn rels_xml(source: &str, pool: &InternPool<RelEntry>) -> String {
    let mut xml = String::new();
    xml.push_str(XML_HEADER);
    xml.push('\n');
    xml.push_str(&format!(r#"<Relationships xmlns="{NS_PKG_REL}">"#));
    for (index, rel) in pool.items().iter().enumerate() {
        xml.push_str("<Relationship");
        push_attr(&mut xml, "Id", format!("rId{}", index + 1));
        push_attr(&mut xml, "Type", rel.type_);
        if rel.external {
            push_attr(&mut xml, "Target", &rel.target);
            push_attr(&mut xml, "TargetMode", "External");
        } else {
            push_attr(&mut xml, "Target", relative_target(source, &rel.target));
        }
        xml.push_str("/>");
    }
    xml.push_str("</Relationships>");
    xml
}

/// Sequential OOXML numbers for the charts, images and drawings of one export session.
#[derive(Debug, Default)]
pub struct FigureIds {
    charts: HashMap<String, u32>,
    images: HashMap<String, u32>,
    drawings: u32,
}

impl FigureIds {
    /// Number of the chart part of `figure_id` (`xl/charts/chart{n}.xml`).
    pub fn chart(&mut self, sheet_id: &str, figure_id: &str) -> u32 {
        let next = self.charts.len() as u32 + 1;
        *self
            .charts
            .entry(format!("{sheet_id}/{figure_id}"))
            .or_insert(next)
    }

    /// Number of the media part holding the image at `path`. Equal paths share one part.
    pub fn image(&mut self, path: &str) -> u32 {
        let next = self.images.len() as u32 + 1;
        *self.images.entry(path.to_string()).or_insert(next)
    }

    pub fn next_drawing(&mut self) -> u32 {
        self.drawings += 1;
        self.drawings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn equal_values_collapse_regardless_of_order() {
        let mut pool = InternPool::seeded(["none".to_string()]);
        assert_eq!(pool.push_or_find("b".to_string()), 1);
        assert_eq!(pool.push_or_find("a".to_string()), 2);
        assert_eq!(pool.push_or_find("b".to_string()), 1);
        assert_eq!(pool.push_or_find("none".to_string()), 0);
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn rels_are_relative_to_their_source() {
        let mut rels = RelsPool::default();
        let sheet = "xl/worksheets/sheet1.xml";
        assert_eq!(rels.push_or_find(sheet, REL_DRAWING, "xl/drawings/drawing1.xml"), "rId1");
        assert_eq!(rels.push_external(sheet, REL_HYPERLINK, "https://example.com/?a=1&b=2"), "rId2");
        assert_eq!(rels.push_or_find(sheet, REL_DRAWING, "xl/drawings/drawing1.xml"), "rId1");

        let parts = rels.to_parts();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].0, "xl/worksheets/_rels/sheet1.xml.rels");
        assert!(parts[0].1.contains(r#"Target="../drawings/drawing1.xml""#));
        assert!(parts[0]
            .1
            .contains(r#"Target="https://example.com/?a=1&amp;b=2" TargetMode="External""#));
    }

    #[test]
    fn figure_numbers_are_per_session() {
        let mut first = FigureIds::default();
        assert_eq!(first.chart("1", "7"), 1);
        assert_eq!(first.chart("1", "9"), 2);
        assert_eq!(first.chart("1", "7"), 1);
        assert_eq!(first.image("a.png"), 1);
        assert_eq!(first.image("a.png"), 1);

        let mut second = FigureIds::default();
        assert_eq!(second.chart("1", "9"), 1);
    }
}
