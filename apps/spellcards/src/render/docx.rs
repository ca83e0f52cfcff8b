//! WordprocessingML writer.
//!
//! Each page section becomes a single-column table with one row per region; pages are
//! separated by explicit page breaks. Only the package parts Word needs to open the file
//! are emitted: content types, package relationships, core properties and the body.

use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;

use chrono::Utc;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::document::{
    Alignment, Block, BorderEdge, PageDocument, PageGeometry, Paragraph, ParagraphStyle, Region,
    Run, Side, Table,
};
use crate::errors::CardError;

const WORD_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const BODY_FONT: &str = "Times New Roman";
/// 4pt, in half-points.
const SPACER_SIZE: u32 = 8;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#;

// ────────────────────────────────────────────────────────────────────────────
// Package
// ────────────────────────────────────────────────────────────────────────────

/// Writes `doc` as a `.docx` package at `path`.
pub fn write_docx(doc: &PageDocument, path: &Path) -> Result<(), CardError> {
    let file = File::create(path)?;
    write_package(doc, file)?;
    Ok(())
}

/// Writes the package parts into `sink` and returns it once the archive is finished.
pub fn write_package<W: Write + Seek>(doc: &PageDocument, sink: W) -> Result<W, CardError> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(sink);

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(CONTENT_TYPES.as_bytes())?;

    zip.start_file("_rels/.rels", options)?;
    zip.write_all(PACKAGE_RELS.as_bytes())?;

    zip.start_file("docProps/core.xml", options)?;
    zip.write_all(&core_properties_xml(&doc.title)?)?;

    zip.start_file("word/document.xml", options)?;
    zip.write_all(&document_xml(doc)?)?;

    Ok(zip.finish()?)
}

fn core_properties_xml(title: &str) -> Result<Vec<u8>, CardError> {
    let mut xml = XmlOut::new();
    xml.declaration()?;
    xml.start(
        "cp:coreProperties",
        &[
            (
                "xmlns:cp",
                "http://schemas.openxmlformats.org/package/2006/metadata/core-properties",
            ),
            ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
            ("xmlns:dcterms", "http://purl.org/dc/terms/"),
            ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
        ],
    )?;
    xml.text_element("dc:title", &[], title)?;
    xml.text_element("dc:creator", &[], env!("CARGO_PKG_NAME"))?;
    let created = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
    xml.text_element("dcterms:created", &[("xsi:type", "dcterms:W3CDTF")], &created)?;
    xml.end("cp:coreProperties")?;
    Ok(xml.finish())
}

// ────────────────────────────────────────────────────────────────────────────
// Document body
// ────────────────────────────────────────────────────────────────────────────

/// Serializes the body part, `word/document.xml`.
pub fn document_xml(doc: &PageDocument) -> Result<Vec<u8>, CardError> {
    let mut xml = XmlOut::new();
    xml.declaration()?;
    xml.start("w:document", &[("xmlns:w", WORD_NS)])?;
    xml.start("w:body", &[])?;

    for (index, section) in doc.sections.iter().enumerate() {
        if index > 0 {
            write_page_break(&mut xml)?;
        }
        write_page(&mut xml, &doc.geometry, &section.regions)?;
    }

    write_section_properties(&mut xml, &doc.geometry)?;
    xml.end("w:body")?;
    xml.end("w:document")?;
    Ok(xml.finish())
}

fn write_page_break(xml: &mut XmlOut) -> Result<(), CardError> {
    xml.start("w:p", &[])?;
    xml.start("w:r", &[])?;
    xml.empty("w:br", &[("w:type", "page")])?;
    xml.end("w:r")?;
    xml.end("w:p")
}

fn write_section_properties(xml: &mut XmlOut, geometry: &PageGeometry) -> Result<(), CardError> {
    let width = geometry.width.to_string();
    let height = geometry.height.to_string();
    let margin = geometry.margin.to_string();
    xml.start("w:sectPr", &[])?;
    xml.empty("w:pgSz", &[("w:w", &width), ("w:h", &height)])?;
    xml.empty(
        "w:pgMar",
        &[
            ("w:top", &margin),
            ("w:right", &margin),
            ("w:bottom", &margin),
            ("w:left", &margin),
            ("w:header", "0"),
            ("w:footer", "0"),
            ("w:gutter", "0"),
        ],
    )?;
    xml.end("w:sectPr")
}

fn write_page(
    xml: &mut XmlOut,
    geometry: &PageGeometry,
    regions: &[Region],
) -> Result<(), CardError> {
    let width = geometry.content_width().to_string();
    xml.start("w:tbl", &[])?;
    xml.start("w:tblPr", &[])?;
    xml.empty("w:tblW", &[("w:w", &width), ("w:type", "dxa")])?;
    xml.empty("w:tblLayout", &[("w:type", "fixed")])?;
    xml.end("w:tblPr")?;
    xml.start("w:tblGrid", &[])?;
    xml.empty("w:gridCol", &[("w:w", &width)])?;
    xml.end("w:tblGrid")?;

    for region in regions {
        xml.start("w:tr", &[])?;
        if let Some(height) = region.height {
            let height = height.to_string();
            xml.start("w:trPr", &[])?;
            xml.empty("w:trHeight", &[("w:val", &height), ("w:hRule", "atLeast")])?;
            xml.end("w:trPr")?;
        }
        xml.start("w:tc", &[])?;
        xml.start("w:tcPr", &[])?;
        xml.empty("w:tcW", &[("w:w", &width), ("w:type", "dxa")])?;
        write_borders(xml, &region.borders)?;
        if let Some(fill) = &region.fill {
            xml.empty(
                "w:shd",
                &[("w:val", "clear"), ("w:color", "auto"), ("w:fill", fill.as_str())],
            )?;
        }
        xml.end("w:tcPr")?;
        write_region_content(xml, region)?;
        xml.end("w:tc")?;
        xml.end("w:tr")?;
    }

    xml.end("w:tbl")
}

fn side_rank(side: Side) -> u8 {
    match side {
        Side::Top => 0,
        Side::Left => 1,
        Side::Bottom => 2,
        Side::Right => 3,
    }
}

fn write_borders(xml: &mut XmlOut, borders: &[BorderEdge]) -> Result<(), CardError> {
    if borders.is_empty() {
        return Ok(());
    }
    let mut edges: Vec<&BorderEdge> = borders.iter().collect();
    edges.sort_by_key(|e| side_rank(e.side));

    xml.start("w:tcBorders", &[])?;
    for edge in edges {
        let name = match edge.side {
            Side::Top => "w:top",
            Side::Left => "w:left",
            Side::Bottom => "w:bottom",
            Side::Right => "w:right",
        };
        let size = edge.size.to_string();
        xml.empty(
            name,
            &[
                ("w:val", "single"),
                ("w:sz", &size),
                ("w:space", "0"),
                ("w:color", edge.color.as_str()),
            ],
        )?;
    }
    xml.end("w:tcBorders")
}

fn write_region_content(xml: &mut XmlOut, region: &Region) -> Result<(), CardError> {
    let mut label = region.label.as_deref();
    for block in &region.blocks {
        match block {
            Block::Paragraph(paragraph) => write_paragraph(xml, paragraph, label.take())?,
            Block::Table(table) => write_table(xml, table)?,
        }
    }
    // A cell must end with a paragraph.
    if !matches!(region.blocks.last(), Some(Block::Paragraph(_))) {
        write_paragraph(xml, &Paragraph::default(), label)?;
    }
    Ok(())
}

fn write_paragraph(
    xml: &mut XmlOut,
    paragraph: &Paragraph,
    label: Option<&str>,
) -> Result<(), CardError> {
    let body_font = paragraph.style != ParagraphStyle::Template;
    xml.start("w:p", &[])?;
    xml.start("w:pPr", &[])?;
    xml.empty(
        "w:spacing",
        &[("w:before", "0"), ("w:after", "0"), ("w:line", "240"), ("w:lineRule", "auto")],
    )?;
    match paragraph.align {
        Alignment::Left => {}
        Alignment::Center => xml.empty("w:jc", &[("w:val", "center")])?,
        Alignment::Right => xml.empty("w:jc", &[("w:val", "right")])?,
    }
    if paragraph.style == ParagraphStyle::Spacer {
        let size = SPACER_SIZE.to_string();
        xml.start("w:rPr", &[])?;
        xml.empty("w:rFonts", &[("w:ascii", BODY_FONT), ("w:hAnsi", BODY_FONT)])?;
        xml.empty("w:sz", &[("w:val", &size)])?;
        xml.end("w:rPr")?;
    }
    xml.end("w:pPr")?;

    if let Some(label) = label {
        let caption = Run {
            text: label.to_string(),
            bold: true,
            size: paragraph.runs.first().and_then(|r| r.size),
            ..Run::default()
        };
        write_run(xml, &caption, body_font)?;
    }
    for run in &paragraph.runs {
        write_run(xml, run, body_font)?;
    }
    xml.end("w:p")
}

fn write_run(xml: &mut XmlOut, run: &Run, body_font: bool) -> Result<(), CardError> {
    if run.text.is_empty() {
        return Ok(());
    }
    xml.start("w:r", &[])?;
    xml.start("w:rPr", &[])?;
    if body_font {
        xml.empty("w:rFonts", &[("w:ascii", BODY_FONT), ("w:hAnsi", BODY_FONT)])?;
    }
    if run.bold {
        xml.empty("w:b", &[])?;
    }
    if run.italic {
        xml.empty("w:i", &[])?;
    }
    if let Some(color) = &run.color {
        xml.empty("w:color", &[("w:val", color.as_str())])?;
    }
    if let Some(size) = run.size {
        let size = size.to_string();
        xml.empty("w:sz", &[("w:val", &size)])?;
    }
    if run.underline {
        xml.empty("w:u", &[("w:val", "single")])?;
    }
    xml.end("w:rPr")?;

    for (i, line) in run.text.split('\n').enumerate() {
        if i > 0 {
            xml.empty("w:br", &[])?;
        }
        if !line.is_empty() {
            xml.text_element("w:t", &[("xml:space", "preserve")], line)?;
        }
    }
    xml.end("w:r")
}

/// Writes a nested table. Rows without cells are skipped, and a table left with no rows
/// is not written at all, since Word refuses both.
fn write_table(xml: &mut XmlOut, table: &Table) -> Result<(), CardError> {
    if table.cols == 0 || table.rows.iter().all(Vec::is_empty) {
        return Ok(());
    }
    let cols = table.cols;
    let col_width = table.width / cols as u32;
    let width = table.width.to_string();
    let col_width_text = col_width.to_string();

    xml.start("w:tbl", &[])?;
    xml.start("w:tblPr", &[])?;
    xml.empty("w:tblW", &[("w:w", &width), ("w:type", "dxa")])?;
    xml.empty("w:jc", &[("w:val", "center")])?;
    xml.start("w:tblBorders", &[])?;
    for edge in ["w:top", "w:left", "w:bottom", "w:right", "w:insideH", "w:insideV"] {
        xml.empty(
            edge,
            &[("w:val", "single"), ("w:sz", "4"), ("w:space", "0"), ("w:color", "000000")],
        )?;
    }
    xml.end("w:tblBorders")?;
    xml.empty("w:tblLayout", &[("w:type", "fixed")])?;
    xml.end("w:tblPr")?;

    xml.start("w:tblGrid", &[])?;
    for _ in 0..cols {
        xml.empty("w:gridCol", &[("w:w", &col_width_text)])?;
    }
    xml.end("w:tblGrid")?;

    for row in table.rows.iter().filter(|row| !row.is_empty()) {
        xml.start("w:tr", &[])?;
        for cell in row {
            let span = cell.col_span.max(1);
            let cell_width = (col_width * span as u32).to_string();
            xml.start("w:tc", &[])?;
            xml.start("w:tcPr", &[])?;
            xml.empty("w:tcW", &[("w:w", &cell_width), ("w:type", "dxa")])?;
            if span > 1 {
                let span = span.to_string();
                xml.empty("w:gridSpan", &[("w:val", &span)])?;
            }
            if let Some(fill) = &cell.fill {
                xml.empty(
                    "w:shd",
                    &[("w:val", "clear"), ("w:color", "auto"), ("w:fill", fill.as_str())],
                )?;
            }
            xml.end("w:tcPr")?;
            let paragraph = Paragraph::new(cell.runs.clone(), ParagraphStyle::TableText);
            write_paragraph(xml, &paragraph, None)?;
            xml.end("w:tc")?;
        }
        xml.end("w:tr")?;
    }
    xml.end("w:tbl")
}

// ────────────────────────────────────────────────────────────────────────────
// XML helper
// ────────────────────────────────────────────────────────────────────────────

fn xml_error(e: impl std::fmt::Display) -> CardError {
    CardError::Render(format!("XML write failed: {e}"))
}

/// Thin event writer that maps quick-xml errors into [`CardError`].
struct XmlOut {
    writer: Writer<Vec<u8>>,
}

impl XmlOut {
    fn new() -> Self {
        XmlOut {
            writer: Writer::new(Vec::new()),
        }
    }

    fn declaration(&mut self) -> Result<(), CardError> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
            .map_err(xml_error)
    }

    fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), CardError> {
        let tag = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.writer.write_event(Event::Start(tag)).map_err(xml_error)
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), CardError> {
        let tag = BytesStart::new(name).with_attributes(attrs.iter().copied());
        self.writer.write_event(Event::Empty(tag)).map_err(xml_error)
    }

    fn end(&mut self, name: &str) -> Result<(), CardError> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_error)
    }

    fn text_element(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
        text: &str,
    ) -> Result<(), CardError> {
        self.start(name, attrs)?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_error)?;
        self.end(name)
    }

    fn finish(self) -> Vec<u8> {
        self.writer.into_inner()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
