//! Writing side: one export session walks the workbook and emits every package part.
//!
//! Sheets are written first. Each emitter interns what it references (strings, cell formats,
//! relationships, figure numbers) into the session pools, and the pool-backed parts
//! (`styles.xml`, `sharedStrings.xml`, `.rels`) are emitted once the walk is over.

pub mod chart;
pub mod content_types;
pub mod drawing;
pub mod pools;
pub mod styles;
pub mod table;
pub mod workbook;
pub mod worksheet;

use tabula_model::{extension_from_mimetype, mimetype_from_path, FigureData, SheetData, WorkbookData};

use self::chart::chart_xml;
use self::content_types::{content_types_xml, CONTENT_TYPES_PART};
use self::drawing::{drawing_xml, DrawingContent, DrawingObject};
use self::pools::{
    FigureIds, InternPool, RelsPool, REL_CHART, REL_DRAWING, REL_IMAGE, REL_OFFICE_DOCUMENT,
    REL_SHARED_STRINGS, REL_STYLES, REL_TABLE, REL_WORKSHEET,
};
use self::styles::StylePools;
use self::table::table_xml;
use self::workbook::{shared_strings_xml, workbook_xml, SHARED_STRINGS_PART, STYLES_PART, WORKBOOK_PART};
use self::worksheet::{worksheet_xml, SheetRels};
use crate::warnings::{WarningKind, WarningManager};
use crate::{ExportError, ExportOptions, ExportResult, XlsxFiles, XlsxPart};

/// State of one export. Pools are never shared between sessions.
pub struct ExportSession<'a> {
    pub(crate) data: &'a WorkbookData,
    pub(crate) warnings: WarningManager,
    pub(crate) styles: StylePools,
    pub(crate) strings: InternPool<String>,
    pub(crate) rels: RelsPool,
    pub(crate) figures: FigureIds,
    files: XlsxFiles,
    tables: u32,
}

/// A drawing object whose target part is written but not yet related to its drawing.
struct PendingObject<'f> {
    figure: &'f tabula_model::Figure<FigureData>,
    rel_type: &'static str,
    target: String,
}

impl<'a> ExportSession<'a> {
    pub fn new(data: &'a WorkbookData, options: &ExportOptions) -> Self {
        Self {
            data,
            warnings: WarningManager::new(),
            styles: StylePools::new(options),
            strings: InternPool::new(),
            rels: RelsPool::default(),
            figures: FigureIds::default(),
            files: XlsxFiles::new(),
            tables: 0,
        }
    }

    /// Write the `index`-th sheet with its tables and drawing; returns the sheet part name.
    fn export_sheet(&mut self, index: usize, sheet: &SheetData) -> Result<String, ExportError> {
        let part = format!("xl/worksheets/sheet{}.xml", index + 1);
        let mut rels = SheetRels::default();
        for table in &sheet.tables {
            self.tables += 1;
            let path = format!("xl/tables/table{}.xml", self.tables);
            let xml = table_xml(sheet, table, self.tables)?;
            self.files.insert(path.clone(), XlsxPart::Xml(xml));
            rels.tables.push(self.rels.push_or_find(&part, REL_TABLE, &path));
        }
        rels.drawing = self.export_drawing(sheet, &part);

        let xml = worksheet_xml(self, sheet, &part, &rels)?;
        self.files.insert(part.clone(), XlsxPart::Xml(xml));
        Ok(part)
    }

    /// Write the chart and media parts of `sheet` and the drawing holding them.
    /// Figures that cannot be exported are skipped; `None` when nothing remains.
    fn export_drawing(&mut self, sheet: &SheetData, sheet_part: &str) -> Option<String> {
        let mut pending = Vec::new();
        for figure in &sheet.figures {
            match &figure.data {
                FigureData::Chart(chart) => {
                    let Some(xml) = chart_xml(chart, &sheet.name, &self.warnings) else {
                        continue;
                    };
                    let number = self.figures.chart(&sheet.id, &figure.id);
                    let target = format!("xl/charts/chart{number}.xml");
                    self.files.insert(target.clone(), XlsxPart::Xml(xml));
                    pending.push(PendingObject { figure, rel_type: REL_CHART, target });
                }
                FigureData::Image(image) => {
                    let extension = image
                        .mimetype
                        .as_deref()
                        .or_else(|| mimetype_from_path(&image.path))
                        .and_then(extension_from_mimetype);
                    let Some(extension) = extension else {
                        self.warnings.generate_not_supported_warning(
                            WarningKind::ImageFormat,
                            Some(&image.path),
                            None,
                        );
                        continue;
                    };
                    let number = self.figures.image(&image.path);
                    let target = format!("xl/media/image{number}.{extension}");
                    self.files.insert(
                        target.clone(),
                        XlsxPart::Image {
                            source: image.path.clone(),
                        },
                    );
                    pending.push(PendingObject { figure, rel_type: REL_IMAGE, target });
                }
            }
        }
        if pending.is_empty() {
            return None;
        }

        let drawing_part = format!("xl/drawings/drawing{}.xml", self.figures.next_drawing());
        let objects: Vec<DrawingObject> = pending
            .into_iter()
            .map(|object| {
                let rel_id = self.rels.push_or_find(&drawing_part, object.rel_type, &object.target);
                let content = if object.rel_type == REL_CHART {
                    DrawingContent::Chart { rel_id }
                } else {
                    DrawingContent::Picture { rel_id }
                };
                DrawingObject::anchored(sheet, object.figure, content)
            })
            .collect();
        self.files
            .insert(drawing_part.clone(), XlsxPart::Xml(drawing_xml(&objects)));
        Some(self.rels.push_or_find(sheet_part, REL_DRAWING, &drawing_part))
    }

    /// Emit the workbook and every pool-backed part.
    fn finish(mut self, sheet_parts: &[String]) -> ExportResult {
        let sheet_rels: Vec<String> = sheet_parts
            .iter()
            .map(|part| self.rels.push_or_find(WORKBOOK_PART, REL_WORKSHEET, part))
            .collect();
        self.rels.push_or_find(WORKBOOK_PART, REL_STYLES, STYLES_PART);
        if !self.strings.is_empty() {
            self.rels.push_or_find(WORKBOOK_PART, REL_SHARED_STRINGS, SHARED_STRINGS_PART);
            self.files.insert(
                SHARED_STRINGS_PART.to_string(),
                XlsxPart::Xml(shared_strings_xml(self.strings.items())),
            );
        }
        self.rels.push_or_find("", REL_OFFICE_DOCUMENT, WORKBOOK_PART);

        self.files.insert(
            WORKBOOK_PART.to_string(),
            XlsxPart::Xml(workbook_xml(self.data, &sheet_rels)),
        );
        self.files
            .insert(STYLES_PART.to_string(), XlsxPart::Xml(self.styles.to_xml()));
        for (name, xml) in self.rels.to_parts() {
            self.files.insert(name, XlsxPart::Xml(xml));
        }
        let content_types = content_types_xml(&self.files);
        self.files
            .insert(CONTENT_TYPES_PART.to_string(), XlsxPart::Xml(content_types));

        log::debug!(
            "exported {} sheets into {} parts ({} cell formats, {} shared strings)",
            sheet_parts.len(),
            self.files.len(),
            self.styles.cell_format_count(),
            self.strings.len()
        );
        ExportResult {
            files: self.files,
            warnings: self.warnings.warnings(),
        }
    }
}

/// Export every sheet of `data` into a package.
pub fn export_workbook(data: &WorkbookData, options: &ExportOptions) -> Result<ExportResult, ExportError> {
    let mut session = ExportSession::new(data, options);
    let mut sheet_parts = Vec::with_capacity(data.sheets.len());
    for (index, sheet) in data.sheets.iter().enumerate() {
        sheet_parts.push(session.export_sheet(index, sheet)?);
    }
    Ok(session.finish(&sheet_parts))
}
