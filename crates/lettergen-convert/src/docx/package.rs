//! WordprocessingML package writer
//!
//! Entries are written in a fixed order with a fixed timestamp so that equal
//! documents produce byte-identical archives.

use super::model::{Block, Cell, Document, Inline, Paragraph, Table};
use std::fmt::Write as _;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// A4 portrait in twentieths of a point
const PAGE_WIDTH_TWIPS: u32 = 11906;
const PAGE_HEIGHT_TWIPS: u32 = 16838;

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const WP_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const A_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const PIC_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";

/// Page margins `[top, right, bottom, left]` in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMargins(pub [u32; 4]);

impl PageMargins {
    fn twips(self) -> [u32; 4] {
        self.0.map(mm_to_twips)
    }

    /// Text column width in twips
    pub fn text_width_twips(self) -> u32 {
        let [_, right, _, left] = self.twips();
        PAGE_WIDTH_TWIPS.saturating_sub(left.saturating_add(right))
    }
}

pub fn mm_to_twips(mm: u32) -> u32 {
    (mm as f64 * 1440.0 / 25.4).round() as u32
}

/// Serialize `document` into a `.docx` archive
pub fn write_package(document: &Document, margins: PageMargins) -> zip::result::ZipResult<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(CONTENT_TYPES_XML.as_bytes())?;

    zip.start_file("_rels/.rels", options)?;
    zip.write_all(package_rels().as_bytes())?;

    zip.start_file("word/document.xml", options)?;
    zip.write_all(document_xml(document, margins).as_bytes())?;

    zip.start_file("word/styles.xml", options)?;
    zip.write_all(STYLES_XML.as_bytes())?;

    zip.start_file("word/_rels/document.xml.rels", options)?;
    zip.write_all(document_rels(document).as_bytes())?;

    for (index, media) in document.media.iter().enumerate() {
        zip.start_file(format!("word/media/{}", media.file_name(index)), options)?;
        zip.write_all(&media.bytes)?;
    }

    Ok(zip.finish()?.into_inner())
}

const CONTENT_TYPES_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Default Extension="png" ContentType="image/png"/>"#,
    r#"<Default Extension="jpeg" ContentType="image/jpeg"/>"#,
    r#"<Default Extension="gif" ContentType="image/gif"/>"#,
    r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#,
    r#"<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#,
    "</Types>"
);

fn package_rels() -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<Relationships xmlns="{ns}">"#,
            r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
            "</Relationships>"
        ),
        ns = REL_NS
    )
}

/// `rId1` is the style sheet, images follow from `rId2`
fn image_rel_id(media: usize) -> String {
    format!("rId{}", media + 2)
}

fn document_rels(document: &Document) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    let _ = write!(xml, r#"<Relationships xmlns="{}">"#, REL_NS);
    xml.push_str(r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#);
    for (index, media) in document.media.iter().enumerate() {
        let _ = write!(
            xml,
            r#"<Relationship Id="{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/{}"/>"#,
            image_rel_id(index),
            media.file_name(index)
        );
    }
    xml.push_str("</Relationships>");
    xml
}

fn document_xml(document: &Document, margins: PageMargins) -> String {
    let mut writer = BodyWriter {
        xml: String::new(),
        next_drawing_id: 1,
        text_width_twips: margins.text_width_twips(),
    };

    writer.xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    let _ = write!(
        writer.xml,
        r#"<w:document xmlns:w="{}" xmlns:r="{}" xmlns:wp="{}" xmlns:a="{}" xmlns:pic="{}"><w:body>"#,
        W_NS, R_NS, WP_NS, A_NS, PIC_NS
    );

    for block in &document.blocks {
        writer.write_block(block);
    }

    let [top, right, bottom, left] = margins.twips();
    let _ = write!(
        writer.xml,
        r#"<w:sectPr><w:pgSz w:w="{}" w:h="{}"/><w:pgMar w:top="{}" w:right="{}" w:bottom="{}" w:left="{}" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr>"#,
        PAGE_WIDTH_TWIPS, PAGE_HEIGHT_TWIPS, top, right, bottom, left
    );
    writer.xml.push_str("</w:body></w:document>");
    writer.xml
}

struct BodyWriter {
    xml: String,
    next_drawing_id: u32,
    text_width_twips: u32,
}

impl BodyWriter {
    fn write_block(&mut self, block: &Block) {
        match block {
            Block::Paragraph(paragraph) => self.write_paragraph(paragraph),
            Block::Table(table) => self.write_table(table),
        }
    }

    fn write_paragraph(&mut self, paragraph: &Paragraph) {
        self.xml.push_str("<w:p>");

        // Child order of w:pPr is fixed by the schema
        let has_props = paragraph.style.is_some()
            || paragraph.rule
            || paragraph.indent_twips > 0
            || paragraph.align.is_some();
        if has_props {
            self.xml.push_str("<w:pPr>");
            if let Some(style) = &paragraph.style {
                let _ = write!(self.xml, r#"<w:pStyle w:val="{}"/>"#, escape_xml(style));
            }
            if paragraph.rule {
                self.xml.push_str(r#"<w:pBdr><w:bottom w:val="single" w:sz="6" w:space="1" w:color="auto"/></w:pBdr>"#);
            }
            if paragraph.indent_twips > 0 {
                let _ = write!(self.xml, r#"<w:ind w:left="{}"/>"#, paragraph.indent_twips);
            }
            if let Some(align) = paragraph.align {
                let _ = write!(self.xml, r#"<w:jc w:val="{}"/>"#, align.as_wml());
            }
            self.xml.push_str("</w:pPr>");
        }

        for inline in &paragraph.inlines {
            match inline {
                Inline::Text { text, format } => {
                    self.xml.push_str("<w:r>");
                    if format.bold || format.italic || format.underline {
                        self.xml.push_str("<w:rPr>");
                        if format.bold {
                            self.xml.push_str("<w:b/>");
                        }
                        if format.italic {
                            self.xml.push_str("<w:i/>");
                        }
                        if format.underline {
                            self.xml.push_str(r#"<w:u w:val="single"/>"#);
                        }
                        self.xml.push_str("</w:rPr>");
                    }
                    let _ = write!(
                        self.xml,
                        r#"<w:t xml:space="preserve">{}</w:t></w:r>"#,
                        escape_xml(text)
                    );
                }
                Inline::Break => self.xml.push_str("<w:r><w:br/></w:r>"),
                Inline::Image(image) => {
                    let id = self.next_drawing_id;
                    self.next_drawing_id += 1;
                    let _ = write!(
                        self.xml,
                        concat!(
                            "<w:r><w:drawing>",
                            r#"<wp:inline distT="0" distB="0" distL="0" distR="0">"#,
                            r#"<wp:extent cx="{cx}" cy="{cy}"/>"#,
                            r#"<wp:docPr id="{id}" name="Picture {id}"/>"#,
                            r#"<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
                            "<pic:pic>",
                            r#"<pic:nvPicPr><pic:cNvPr id="{id}" name="Picture {id}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
                            r#"<pic:blipFill><a:blip r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
                            r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr>"#,
                            "</pic:pic></a:graphicData></a:graphic></wp:inline>",
                            "</w:drawing></w:r>"
                        ),
                        cx = image.width_emu,
                        cy = image.height_emu,
                        id = id,
                        rel = image_rel_id(image.media),
                    );
                }
            }
        }

        self.xml.push_str("</w:p>");
    }

    fn write_table(&mut self, table: &Table) {
        let columns = table.columns().max(1) as u32;
        let column_width = self.text_width_twips / columns;

        self.xml.push_str(r#"<w:tbl><w:tblPr><w:tblStyle w:val="TableGrid"/><w:tblW w:w="0" w:type="auto"/></w:tblPr><w:tblGrid>"#);
        for _ in 0..columns {
            let _ = write!(self.xml, r#"<w:gridCol w:w="{}"/>"#, column_width);
        }
        self.xml.push_str("</w:tblGrid>");

        for row in &table.rows {
            self.xml.push_str("<w:tr>");
            for index in 0..columns as usize {
                let empty = Cell::default();
                let cell = row.get(index).unwrap_or(&empty);
                self.write_cell(cell, column_width);
            }
            self.xml.push_str("</w:tr>");
        }
        self.xml.push_str("</w:tbl>");
    }

    fn write_cell(&mut self, cell: &Cell, width: u32) {
        let _ = write!(
            self.xml,
            r#"<w:tc><w:tcPr><w:tcW w:w="{}" w:type="dxa"/></w:tcPr>"#,
            width
        );
        for block in &cell.blocks {
            self.write_block(block);
        }
        // A cell must end with a paragraph
        if !matches!(cell.blocks.last(), Some(Block::Paragraph(_))) {
            self.xml.push_str("<w:p/>");
        }
        self.xml.push_str("</w:tc>");
    }
}

pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            // Control characters are not allowed in XML 1.0
            c if (c as u32) < 0x20 && c != '\t' && c != '\n' && c != '\r' => {}
            c => escaped.push(c),
        }
    }
    escaped
}

const STYLES_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
    r#"<w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:cs="Calibri"/><w:sz w:val="22"/></w:rPr></w:rPrDefault>"#,
    r#"<w:pPrDefault><w:pPr><w:spacing w:after="120" w:line="264" w:lineRule="auto"/></w:pPr></w:pPrDefault></w:docDefaults>"#,
    r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>"#,
    r#"<w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="240" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="36"/></w:rPr></w:style>"#,
    r#"<w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="200" w:after="100"/><w:outlineLvl w:val="1"/></w:pPr><w:rPr><w:b/><w:sz w:val="32"/></w:rPr></w:style>"#,
    r#"<w:style w:type="paragraph" w:styleId="Heading3"><w:name w:val="heading 3"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="200" w:after="80"/><w:outlineLvl w:val="2"/></w:pPr><w:rPr><w:b/><w:sz w:val="28"/></w:rPr></w:style>"#,
    r#"<w:style w:type="paragraph" w:styleId="Heading4"><w:name w:val="heading 4"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:outlineLvl w:val="3"/></w:pPr><w:rPr><w:b/><w:sz w:val="24"/></w:rPr></w:style>"#,
    r#"<w:style w:type="paragraph" w:styleId="Heading5"><w:name w:val="heading 5"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:outlineLvl w:val="4"/></w:pPr><w:rPr><w:b/><w:i/><w:sz w:val="22"/></w:rPr></w:style>"#,
    r#"<w:style w:type="paragraph" w:styleId="Heading6"><w:name w:val="heading 6"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:outlineLvl w:val="5"/></w:pPr><w:rPr><w:i/><w:sz w:val="22"/></w:rPr></w:style>"#,
    r#"<w:style w:type="table" w:styleId="TableGrid"><w:name w:val="Table Grid"/><w:tblPr><w:tblBorders>"#,
    r#"<w:top w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:left w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#,
    r#"<w:bottom w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:right w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#,
    r#"<w:insideH w:val="single" w:sz="4" w:space="0" w:color="auto"/><w:insideV w:val="single" w:sz="4" w:space="0" w:color="auto"/>"#,
    r#"</w:tblBorders></w:tblPr></w:style>"#,
    "</w:styles>"
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::model::{Align, Format};

    #[test]
    fn test_mm_to_twips() {
        assert_eq!(mm_to_twips(0), 0);
        assert_eq!(mm_to_twips(25), 1417);
        assert_eq!(PageMargins([15; 4]).text_width_twips(), 11906 - 2 * 850);
    }

    #[test]
    fn test_oversized_margins_leave_no_text_width() {
        assert_eq!(PageMargins([u32::MAX; 4]).text_width_twips(), 0);
        assert_eq!(PageMargins([0, 300, 0, 300]).text_width_twips(), 0);
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b & \"c\">"), "a&lt;b &amp; &quot;c&quot;&gt;");
        assert_eq!(escape_xml("bell\u{7}"), "bell");
    }

    #[test]
    fn test_paragraph_properties_in_schema_order() {
        let document = Document {
            blocks: vec![Block::Paragraph(Paragraph {
                style: Some("Heading2".to_string()),
                align: Some(Align::Justify),
                indent_twips: 360,
                rule: true,
                inlines: vec![Inline::Text {
                    text: "x".to_string(),
                    format: Format::default(),
                }],
            })],
            media: Vec::new(),
        };
        let xml = document_xml(&document, PageMargins([15; 4]));

        let style = xml.find("<w:pStyle").unwrap();
        let border = xml.find("<w:pBdr>").unwrap();
        let indent = xml.find("<w:ind").unwrap();
        let justify = xml.find(r#"<w:jc w:val="both"/>"#).unwrap();
        assert!(style < border && border < indent && indent < justify);
    }

    #[test]
    fn test_table_cells_padded_and_closed() {
        let cell = |text: &str| Cell {
            blocks: vec![Block::Paragraph(Paragraph {
                inlines: vec![Inline::Text {
                    text: text.to_string(),
                    format: Format::default(),
                }],
                ..Paragraph::default()
            })],
        };
        let document = Document {
            blocks: vec![Block::Table(Table {
                rows: vec![vec![cell("a"), cell("b")], vec![cell("c")]],
            })],
            media: Vec::new(),
        };
        let xml = document_xml(&document, PageMargins([15; 4]));

        assert_eq!(xml.matches("<w:gridCol").count(), 2);
        assert_eq!(xml.matches("<w:tc>").count(), 4);
        assert_eq!(xml.matches("<w:p/>").count(), 1);
    }
}
