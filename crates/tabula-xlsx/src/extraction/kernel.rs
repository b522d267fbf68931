//! Typed value extraction over `roxmltree` documents.
//!
//! Every lookup goes through [`Extractor`], which applies one of three policies
//! (see [`ExtractOptions`]):
//! - optional without default: absent values are `None`;
//! - optional with default: absent values silently become the default;
//! - required: absent values become the default with a parsing warning, or fail with
//!   [`ImportError::MissingRequired`] when there is no default.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use roxmltree::{Document, Node};

use crate::path::{rels_for_part, resolve_target};
use crate::warnings::WarningManager;
use crate::{ImportError, XlsxFiles, XlsxPart};

/// How element names must be compared by the underlying XML engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NamespaceHandling {
    /// Prefixes are stripped when matching (`c:chart` matches `<chart>`-local names).
    LocalName,
    /// Names are compared with their prefix.
    Qualified,
}

impl NamespaceHandling {
    /// Detected once per process from a probe document.
    pub fn detect() -> Self {
        static DETECTED: OnceLock<NamespaceHandling> = OnceLock::new();
        *DETECTED.get_or_init(Self::probe)
    }

    fn probe() -> Self {
        const PROBE: &str = r#"<p:probe xmlns:p="urn:tabula:probe"><p:child/></p:probe>"#;
        match Document::parse(PROBE) {
            Ok(doc) if doc
                .root_element()
                .children()
                .any(|n| n.is_element() && n.tag_name().name() == "child") =>
            {
                NamespaceHandling::LocalName
            }
            _ => NamespaceHandling::Qualified,
        }
    }

    /// Rewrite a (possibly prefixed) query into the form this engine matches on.
    pub fn normalize(self, query: &str) -> &str {
        match self {
            NamespaceHandling::LocalName => query.rsplit_once(':').map_or(query, |(_, local)| local),
            NamespaceHandling::Qualified => query,
        }
    }

    pub fn matches(self, node: Node<'_, '_>, query: &str) -> bool {
        if !node.is_element() {
            return false;
        }
        let query = self.normalize(query);
        match self {
            NamespaceHandling::LocalName => node.tag_name().name() == query,
            NamespaceHandling::Qualified => {
                let local = node.tag_name().name();
                match query.split_once(':') {
                    Some((prefix, name)) => {
                        name == local
                            && node
                                .tag_name()
                                .namespace()
                                .and_then(|ns| node.lookup_prefix(ns))
                                == Some(prefix)
                    }
                    None => local == query,
                }
            }
        }
    }
}

/// A parsed XML part.
pub struct XmlFile<'a> {
    pub path: String,
    pub doc: Document<'a>,
}

impl<'a> XmlFile<'a> {
    pub fn parse(path: &str, xml: &'a str) -> Result<Self, ImportError> {
        let xml = xml.strip_prefix('\u{feff}').unwrap_or(xml);
        let doc = Document::parse(xml).map_err(|source| ImportError::Xml {
            part: path.to_string(),
            source,
        })?;
        Ok(Self {
            path: path.to_string(),
            doc,
        })
    }

    /// Parse `path` from the package.
    pub fn open(files: &'a XlsxFiles, path: &str) -> Result<Self, ImportError> {
        Self::parse(path, xml_part(files, path)?)
    }

    pub fn root(&self) -> Node<'_, 'a> {
        self.doc.root_element()
    }
}

pub fn xml_part<'a>(files: &'a XlsxFiles, path: &str) -> Result<&'a str, ImportError> {
    match files.get(path) {
        Some(XlsxPart::Xml(xml)) => Ok(xml),
        Some(XlsxPart::Image { .. }) => Err(ImportError::NotXml(path.to_string())),
        None => Err(ImportError::MissingPart(path.to_string())),
    }
}

/// Attribute value types the kernel knows how to parse.
pub trait FromAttr: Sized {
    fn from_attr(value: &str) -> Option<Self>;
}

impl FromAttr for String {
    fn from_attr(value: &str) -> Option<Self> {
        Some(value.to_string())
    }
}

impl FromAttr for u32 {
    fn from_attr(value: &str) -> Option<Self> {
        value.trim().parse().ok()
    }
}

impl FromAttr for i64 {
    fn from_attr(value: &str) -> Option<Self> {
        value.trim().parse().ok()
    }
}

impl FromAttr for f64 {
    fn from_attr(value: &str) -> Option<Self> {
        value.trim().parse().ok()
    }
}

impl FromAttr for bool {
    fn from_attr(value: &str) -> Option<Self> {
        match value.trim() {
            "1" | "true" | "on" => Some(true),
            "0" | "false" | "off" => Some(false),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExtractOptions<T> {
    pub required: bool,
    pub default: Option<T>,
}

impl<T> Default for ExtractOptions<T> {
    fn default() -> Self {
        Self {
            required: false,
            default: None,
        }
    }
}

impl<T> ExtractOptions<T> {
    pub fn optional() -> Self {
        Self::default()
    }

    pub fn with_default(default: T) -> Self {
        Self {
            required: false,
            default: Some(default),
        }
    }

    pub fn required() -> Self {
        Self {
            required: true,
            default: None,
        }
    }

    pub fn required_with_default(default: T) -> Self {
        Self {
            required: true,
            default: Some(default),
        }
    }
}

/// Namespace-agnostic accessors bound to one part.
#[derive(Clone, Copy)]
pub struct Extractor<'s> {
    part: &'s str,
    ns: NamespaceHandling,
    warnings: &'s WarningManager,
}

impl<'s> Extractor<'s> {
    pub fn new(part: &'s str, warnings: &'s WarningManager) -> Self {
        Self {
            part,
            ns: NamespaceHandling::detect(),
            warnings,
        }
    }

    pub fn part(&self) -> &'s str {
        self.part
    }

    pub fn warnings(&self) -> &'s WarningManager {
        self.warnings
    }

    fn raw_attr<'a>(&self, node: Node<'a, '_>, name: &str) -> Option<&'a str> {
        match name.split_once(':') {
            // Prefixed attributes (`r:id`) are namespaced; match them on their local name.
            Some((_, local)) => node
                .attributes()
                .find(|a| a.name() == local && a.namespace().is_some())
                .map(|a| a.value()),
            None => node
                .attributes()
                .find(|a| a.name() == name && a.namespace().is_none())
                .map(|a| a.value()),
        }
    }

    fn apply<T>(
        &self,
        node: Node<'_, '_>,
        name: &str,
        value: Option<T>,
        opts: ExtractOptions<T>,
    ) -> Result<Option<T>, ImportError> {
        if value.is_some() {
            return Ok(value);
        }
        match (opts.required, opts.default) {
            (false, default) => Ok(default),
            (true, Some(default)) => {
                self.warnings.add_parsing_warning(format!(
                    "Missing required `{name}` on <{}> in {}, using its default value.",
                    node.tag_name().name(),
                    self.part
                ));
                Ok(Some(default))
            }
            (true, None) => Err(ImportError::MissingRequired {
                part: self.part.to_string(),
                element: node.tag_name().name().to_string(),
                attribute: name.to_string(),
            }),
        }
    }

    pub fn attr<T: FromAttr>(
        &self,
        node: Node<'_, '_>,
        name: &str,
        opts: ExtractOptions<T>,
    ) -> Result<Option<T>, ImportError> {
        let value = self.raw_attr(node, name).and_then(T::from_attr);
        self.apply(node, name, value, opts)
    }

    pub fn opt_attr<T: FromAttr>(&self, node: Node<'_, '_>, name: &str) -> Option<T> {
        self.raw_attr(node, name).and_then(T::from_attr)
    }

    pub fn attr_or<T: FromAttr>(&self, node: Node<'_, '_>, name: &str, default: T) -> T {
        self.opt_attr(node, name).unwrap_or(default)
    }

    pub fn required_attr<T: FromAttr>(&self, node: Node<'_, '_>, name: &str) -> Result<T, ImportError> {
        let value = self.raw_attr(node, name).and_then(T::from_attr);
        self.apply(node, name, value, ExtractOptions::required())?
            .ok_or_else(|| ImportError::MissingRequired {
                part: self.part.to_string(),
                element: node.tag_name().name().to_string(),
                attribute: name.to_string(),
            })
    }

    pub fn child<'a, 'i>(&self, node: Node<'a, 'i>, tag: &str) -> Option<Node<'a, 'i>> {
        node.children().find(|n| self.ns.matches(*n, tag))
    }

    pub fn children<'a, 'i>(&self, node: Node<'a, 'i>, tag: &str) -> Vec<Node<'a, 'i>> {
        node.children().filter(|n| self.ns.matches(*n, tag)).collect()
    }

    /// Element child at `index`, ignoring text and comment nodes.
    pub fn child_at<'a, 'i>(&self, node: Node<'a, 'i>, index: usize) -> Option<Node<'a, 'i>> {
        node.children().filter(|n| n.is_element()).nth(index)
    }

    /// Follow a path of child tags (`["c:chart", "c:plotArea"]`).
    pub fn find<'a, 'i>(&self, node: Node<'a, 'i>, path: &[&str]) -> Option<Node<'a, 'i>> {
        path.iter().try_fold(node, |current, tag| self.child(current, tag))
    }

    pub fn descendants<'a, 'i>(&self, node: Node<'a, 'i>, tag: &str) -> Vec<Node<'a, 'i>> {
        node.descendants()
            .filter(|n| self.ns.matches(*n, tag))
            .collect()
    }

    /// Text content of the child element `tag`.
    pub fn text(
        &self,
        node: Node<'_, '_>,
        tag: &str,
        opts: ExtractOptions<String>,
    ) -> Result<Option<String>, ImportError> {
        let value = self.child(node, tag).map(node_text);
        self.apply(node, tag, value, opts)
    }

    pub fn opt_text(&self, node: Node<'_, '_>, tag: &str) -> Option<String> {
        self.child(node, tag).map(node_text)
    }

    /// `val` attribute of the child `tag` (`<c:barDir val="col"/>`).
    pub fn child_val<T: FromAttr>(&self, node: Node<'_, '_>, tag: &str) -> Option<T> {
        self.child(node, tag).and_then(|c| self.opt_attr(c, "val"))
    }
}

/// Concatenated text of all descendant text nodes.
pub fn node_text(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub type_: String,
    /// Resolved part name, or the raw target for external relationships.
    pub target: String,
    pub external: bool,
}

impl Relationship {
    /// Whether the type URI ends with `/{kind}`.
    pub fn is_kind(&self, kind: &str) -> bool {
        self.type_
            .rsplit_once('/')
            .is_some_and(|(_, last)| last == kind)
    }
}

/// Relationships of one part, keyed by id.
#[derive(Clone, Debug, Default)]
pub struct Relationships {
    by_id: BTreeMap<String, Relationship>,
}

impl Relationships {
    /// Parse the `.rels` part belonging to `part`. A missing `.rels` part means no relationships.
    pub fn for_part(files: &XlsxFiles, part: &str) -> Result<Self, ImportError> {
        let rels_path = rels_for_part(part);
        let xml = match files.get(&rels_path) {
            Some(XlsxPart::Xml(xml)) => xml.as_str(),
            _ => return Ok(Self::default()),
        };
        let file = XmlFile::parse(&rels_path, xml)?;
        let mut by_id = BTreeMap::new();
        for node in file.root().children().filter(|n| n.is_element()) {
            if node.tag_name().name() != "Relationship" {
                continue;
            }
            let Some(id) = node.attribute("Id") else {
                continue;
            };
            let external = node
                .attribute("TargetMode")
                .is_some_and(|m| m.eq_ignore_ascii_case("External"));
            let raw_target = node.attribute("Target").unwrap_or_default();
            let target = if external {
                raw_target.to_string()
            } else {
                resolve_target(part, raw_target)
            };
            by_id.insert(
                id.to_string(),
                Relationship {
                    id: id.to_string(),
                    type_: node.attribute("Type").unwrap_or_default().to_string(),
                    target,
                    external,
                },
            );
        }
        Ok(Self { by_id })
    }

    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.by_id.get(id)
    }

    /// Relationships whose type URI ends with `/{kind}` (e.g. `worksheet`).
    pub fn of_kind<'r>(&'r self, kind: &'r str) -> impl Iterator<Item = &'r Relationship> + 'r {
        self.by_id.values().filter(move |r| r.is_kind(kind))
    }

    pub fn first_of_kind(&self, kind: &str) -> Option<&Relationship> {
        self.by_id.values().find(|r| r.is_kind(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SHEET: &str = r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"
        xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
        <sheetData><row r="1"><c r="A1" s="2"><v>3</v></c></row></sheetData>
        <drawing r:id="rId4"/>
    </worksheet>"#;

    #[test]
    fn extraction_policies() {
        let warnings = WarningManager::new();
        let file = XmlFile::parse("xl/worksheets/sheet1.xml", SHEET).unwrap();
        let ex = Extractor::new(&file.path, &warnings);
        let cell = ex.find(file.root(), &["sheetData", "row", "c"]).unwrap();

        assert_eq!(ex.attr::<u32>(cell, "s", ExtractOptions::optional()).unwrap(), Some(2));
        assert_eq!(ex.attr::<u32>(cell, "t", ExtractOptions::optional()).unwrap(), None);
        assert_eq!(ex.attr(cell, "t", ExtractOptions::with_default("n".to_string())).unwrap(), Some("n".to_string()));
        assert!(warnings.parsing_warnings().is_empty());

        assert_eq!(ex.attr(cell, "cm", ExtractOptions::required_with_default(0u32)).unwrap(), Some(0));
        assert_eq!(warnings.parsing_warnings().len(), 1);

        let err = ex.required_attr::<String>(cell, "vm").unwrap_err();
        assert!(matches!(err, ImportError::MissingRequired { ref attribute, .. } if attribute == "vm"));
    }

    #[test]
    fn prefixed_queries_are_normalized() {
        let warnings = WarningManager::new();
        let file = XmlFile::parse("xl/worksheets/sheet1.xml", SHEET).unwrap();
        let ex = Extractor::new(&file.path, &warnings);
        let drawing = ex.child(file.root(), "x:drawing").unwrap();
        assert_eq!(ex.opt_attr::<String>(drawing, "r:id").as_deref(), Some("rId4"));
        assert_eq!(ex.child_at(file.root(), 1).map(|n| n.tag_name().name()), Some("drawing"));
        assert_eq!(ex.opt_text(ex.find(file.root(), &["sheetData", "row", "c"]).unwrap(), "v").as_deref(), Some("3"));
    }

    #[test]
    fn relationships_resolve_targets() {
        let mut files = XlsxFiles::new();
        files.insert(
            "xl/drawings/_rels/drawing1.xml.rels".to_string(),
            XlsxPart::Xml(r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
                <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart" Target="../charts/chart1.xml"/>
                <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com" TargetMode="External"/>
            </Relationships>"#.to_string()),
        );
        let rels = Relationships::for_part(&files, "xl/drawings/drawing1.xml").unwrap();
        assert_eq!(rels.get("rId1").unwrap().target, "xl/charts/chart1.xml");
        assert_eq!(rels.first_of_kind("chart").map(|r| r.id.as_str()), Some("rId1"));
        let link = rels.get("rId2").unwrap();
        assert!(link.external);
        assert_eq!(link.target, "https://example.com");
        assert!(Relationships::for_part(&files, "xl/workbook.xml").unwrap().get("rId1").is_none());
    }

    #[test]
    fn namespace_detection_matches_local_names() {
        assert_eq!(NamespaceHandling::detect(), NamespaceHandling::LocalName);
    }
}
