//! HTML → document model
//!
//! Walks the html5ever DOM once, keeping a formatting stack for runs and a
//! list stack for indentation. Paragraphs are opened lazily by the first
//! visible content and closed by the next block boundary.

use super::helpers::{get_attr, parse_px, style_property};
use super::model::{
    Align, Block, Cell, Document, Format, ImageKind, ImageRef, Inline, Media, Paragraph, Table,
};
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use lettergen_core::ConversionError;
use markup5ever::Attribute;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use std::cell::RefCell;
use std::collections::HashMap;
use url::Url;

/// Indentation per list level and for block quotes
const INDENT_STEP_TWIPS: u32 = 360;
const QUOTE_INDENT_TWIPS: u32 = 720;

/// English Metric Units per CSS pixel (96 dpi)
const EMU_PER_PX: f64 = 9525.0;

/// Parse `html` into a [`Document`]; images wider than `max_width_px` are
/// scaled down to fit
pub fn build_document(html: &str, max_width_px: f64) -> Result<Document, ConversionError> {
    let dom = parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .map_err(|e| ConversionError::docx(format!("cannot parse HTML: {}", e)))?;

    let mut builder = DocxBuilder::new(max_width_px);
    builder.walk_node(&dom.document);
    Ok(builder.finalize())
}

#[derive(Debug, Clone, Copy)]
struct ListState {
    ordered: bool,
    counter: u32,
}

pub(super) struct DocxBuilder {
    blocks: Vec<Block>,
    current: Option<Paragraph>,
    formats: Vec<Format>,
    aligns: Vec<Align>,
    lists: Vec<ListState>,
    quote_indent: u32,
    preformatted: usize,
    last_was_space: bool,
    base: Option<Url>,
    media: Vec<Media>,
    media_by_src: HashMap<String, usize>,
    max_width_px: f64,
}

impl DocxBuilder {
    fn new(max_width_px: f64) -> Self {
        Self {
            blocks: Vec::new(),
            current: None,
            formats: Vec::new(),
            aligns: Vec::new(),
            lists: Vec::new(),
            quote_indent: 0,
            preformatted: 0,
            last_was_space: true,
            base: None,
            media: Vec::new(),
            media_by_src: HashMap::new(),
            max_width_px,
        }
    }

    /// Walks DOM tree recursively
    pub(super) fn walk_node(&mut self, handle: &Handle) {
        match &handle.data {
            NodeData::Document => self.walk_children(handle),
            NodeData::Element { name, attrs, .. } => {
                let tag = name.local.as_ref();
                let pushed_format = self.push_format(tag, attrs);
                let pushed_align = self.push_align(attrs);

                self.handle_element(tag, attrs, handle);

                if pushed_align {
                    self.aligns.pop();
                }
                if pushed_format {
                    self.formats.pop();
                }
            }
            NodeData::Text { contents } => self.handle_text(&contents.borrow()),
            _ => {}
        }
    }

    fn walk_children(&mut self, handle: &Handle) {
        for child in handle.children.borrow().iter() {
            self.walk_node(child);
        }
    }

    fn handle_element(&mut self, tag: &str, attrs: &RefCell<Vec<Attribute>>, handle: &Handle) {
        match tag {
            "head" => self.read_base(handle),
            "script" | "style" | "title" | "meta" | "link" | "noscript" | "template" | "base" => {}
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => self.handle_heading(tag, handle),
            "p" => self.handle_paragraph(handle),
            "br" => self.handle_line_break(),
            "hr" => self.handle_rule(),
            "ul" => self.handle_list(false, None, handle),
            "ol" => {
                let start = get_attr(attrs, "start").and_then(|s| s.trim().parse::<u32>().ok());
                self.handle_list(true, start, handle);
            }
            "li" => self.handle_list_item(handle),
            "table" => self.handle_table(handle),
            "img" => self.handle_image(attrs),
            "pre" => self.handle_preformatted(handle),
            "blockquote" => self.handle_blockquote(handle),
            _ if is_block(tag) => self.handle_block(handle),
            _ => self.walk_children(handle),
        }
    }

    // ---- formatting state ----

    fn format(&self) -> Format {
        self.formats.last().copied().unwrap_or_default()
    }

    fn push_format(&mut self, tag: &str, attrs: &RefCell<Vec<Attribute>>) -> bool {
        let mut format = self.format();
        match tag {
            "b" | "strong" | "th" => format.bold = true,
            "i" | "em" | "cite" | "var" => format.italic = true,
            "u" | "ins" => format.underline = true,
            _ => {}
        }
        if let Some(weight) = style_property(attrs, "font-weight") {
            format.bold = matches!(weight.as_str(), "bold" | "bolder" | "600" | "700" | "800" | "900");
        }
        if let Some(style) = style_property(attrs, "font-style") {
            format.italic = style == "italic" || style == "oblique";
        }
        if let Some(decoration) = style_property(attrs, "text-decoration") {
            format.underline = decoration.contains("underline");
        }

        if format == self.format() {
            return false;
        }
        self.formats.push(format);
        true
    }

    fn push_align(&mut self, attrs: &RefCell<Vec<Attribute>>) -> bool {
        let align = style_property(attrs, "text-align")
            .or_else(|| get_attr(attrs, "align"))
            .and_then(|value| Align::parse(&value));
        match align {
            Some(align) => {
                self.aligns.push(align);
                true
            }
            None => false,
        }
    }

    // ---- paragraphs ----

    fn start_paragraph(&mut self, style: Option<String>) {
        self.flush_paragraph();
        let list_indent = self.lists.len() as u32 * INDENT_STEP_TWIPS;
        self.current = Some(Paragraph {
            style,
            align: self.aligns.last().copied(),
            indent_twips: self.quote_indent + list_indent,
            rule: false,
            inlines: Vec::new(),
        });
        self.last_was_space = true;
    }

    fn ensure_paragraph(&mut self) -> &mut Paragraph {
        if self.current.is_none() {
            self.start_paragraph(None);
        }
        self.current.get_or_insert_with(Paragraph::default)
    }

    pub(super) fn flush_paragraph(&mut self) {
        let Some(mut paragraph) = self.current.take() else {
            return;
        };
        if let Some(Inline::Text { text, .. }) = paragraph.inlines.last_mut() {
            let trimmed = text.trim_end_matches(' ').len();
            text.truncate(trimmed);
            if text.is_empty() {
                paragraph.inlines.pop();
            }
        }
        if !paragraph.is_empty() {
            self.blocks.push(Block::Paragraph(paragraph));
        }
    }

    fn push_run(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let format = self.format();
        let paragraph = self.ensure_paragraph();
        match paragraph.inlines.last_mut() {
            Some(Inline::Text {
                text: existing,
                format: existing_format,
            }) if *existing_format == format => existing.push_str(text),
            _ => paragraph.inlines.push(Inline::Text {
                text: text.to_string(),
                format,
            }),
        }
    }

    fn handle_text(&mut self, text: &str) {
        if self.preformatted > 0 {
            for (i, line) in text.split('\n').enumerate() {
                if i > 0 {
                    self.ensure_paragraph().inlines.push(Inline::Break);
                }
                self.push_run(line);
            }
            return;
        }

        if self.current.is_none() && text.trim_matches(is_html_space).is_empty() {
            return;
        }
        self.ensure_paragraph();

        let mut collapsed = String::with_capacity(text.len());
        for c in text.chars() {
            if is_html_space(c) {
                if !self.last_was_space {
                    collapsed.push(' ');
                    self.last_was_space = true;
                }
            } else {
                collapsed.push(c);
                self.last_was_space = false;
            }
        }
        self.push_run(&collapsed);
    }

    fn handle_heading(&mut self, tag: &str, handle: &Handle) {
        let level = &tag[1..];
        self.start_paragraph(Some(format!("Heading{}", level)));
        self.walk_children(handle);
        self.flush_paragraph();
    }

    fn handle_paragraph(&mut self, handle: &Handle) {
        self.start_paragraph(None);
        self.walk_children(handle);
        self.flush_paragraph();
    }

    fn handle_block(&mut self, handle: &Handle) {
        self.flush_paragraph();
        self.walk_children(handle);
        self.flush_paragraph();
    }

    fn handle_line_break(&mut self) {
        self.ensure_paragraph().inlines.push(Inline::Break);
        self.last_was_space = true;
    }

    fn handle_rule(&mut self) {
        self.flush_paragraph();
        self.blocks.push(Block::Paragraph(Paragraph {
            rule: true,
            ..Paragraph::default()
        }));
    }

    fn handle_preformatted(&mut self, handle: &Handle) {
        self.start_paragraph(None);
        self.preformatted += 1;
        self.walk_children(handle);
        self.preformatted -= 1;
        self.flush_paragraph();
    }

    fn handle_blockquote(&mut self, handle: &Handle) {
        self.flush_paragraph();
        self.quote_indent += QUOTE_INDENT_TWIPS;
        self.walk_children(handle);
        self.flush_paragraph();
        self.quote_indent -= QUOTE_INDENT_TWIPS;
    }

    // ---- lists ----

    fn handle_list(&mut self, ordered: bool, start: Option<u32>, handle: &Handle) {
        self.flush_paragraph();
        self.lists.push(ListState {
            ordered,
            counter: start.unwrap_or(1).saturating_sub(1),
        });
        self.walk_children(handle);
        self.flush_paragraph();
        self.lists.pop();
    }

    fn handle_list_item(&mut self, handle: &Handle) {
        let marker = match self.lists.last_mut() {
            Some(list) if list.ordered => {
                list.counter += 1;
                format!("{}. ", list.counter)
            }
            _ => "\u{2022} ".to_string(),
        };

        self.start_paragraph(None);
        if let Some(paragraph) = self.current.as_mut() {
            paragraph.inlines.push(Inline::Text {
                text: marker,
                format: Format::default(),
            });
        }
        self.walk_children(handle);
        self.flush_paragraph();
    }

    // ---- tables ----

    fn handle_table(&mut self, handle: &Handle) {
        self.flush_paragraph();
        let mut table = Table::default();
        self.collect_rows(handle, &mut table);
        if !table.rows.is_empty() {
            self.blocks.push(Block::Table(table));
        }
    }

    fn collect_rows(&mut self, handle: &Handle, table: &mut Table) {
        for child in handle.children.borrow().iter() {
            let NodeData::Element { name, .. } = &child.data else {
                continue;
            };
            match name.local.as_ref() {
                "thead" | "tbody" | "tfoot" => self.collect_rows(child, table),
                "tr" => {
                    let row = self.collect_cells(child);
                    if !row.is_empty() {
                        table.rows.push(row);
                    }
                }
                _ => {}
            }
        }
    }

    fn collect_cells(&mut self, row: &Handle) -> Vec<Cell> {
        let mut cells = Vec::new();
        for child in row.children.borrow().iter() {
            let NodeData::Element { name, .. } = &child.data else {
                continue;
            };
            if matches!(name.local.as_ref(), "td" | "th") {
                let blocks = self.with_saved_blocks(|builder| builder.walk_node(child));
                cells.push(Cell { blocks });
            }
        }
        cells
    }

    /// Run `f` against an empty block list and return what it produced
    pub(super) fn with_saved_blocks<F>(&mut self, f: F) -> Vec<Block>
    where
        F: FnOnce(&mut Self),
    {
        self.flush_paragraph();
        let saved_blocks = std::mem::take(&mut self.blocks);
        let saved_lists = std::mem::take(&mut self.lists);
        let saved_indent = std::mem::replace(&mut self.quote_indent, 0);

        f(self);
        self.flush_paragraph();

        self.lists = saved_lists;
        self.quote_indent = saved_indent;
        std::mem::replace(&mut self.blocks, saved_blocks)
    }

    // ---- images ----

    fn read_base(&mut self, head: &Handle) {
        for child in head.children.borrow().iter() {
            if let NodeData::Element { name, attrs, .. } = &child.data
                && name.local.as_ref() == "base"
                && self.base.is_none()
            {
                self.base = get_attr(attrs, "href").and_then(|href| Url::parse(&href).ok());
            }
        }
    }

    fn handle_image(&mut self, attrs: &RefCell<Vec<Attribute>>) {
        let image = get_attr(attrs, "src").and_then(|src| self.load_image(&src, attrs));
        match image {
            Some(image) => {
                self.ensure_paragraph().inlines.push(Inline::Image(image));
                self.last_was_space = false;
            }
            None => {
                if let Some(alt) = get_attr(attrs, "alt").filter(|a| !a.trim().is_empty()) {
                    self.handle_text(&alt);
                }
            }
        }
    }

    fn load_image(&mut self, src: &str, attrs: &RefCell<Vec<Attribute>>) -> Option<ImageRef> {
        let url = match &self.base {
            Some(base) => base.join(src).ok()?,
            None => Url::parse(src).ok()?,
        };
        if url.scheme() != "file" {
            tracing::debug!(src, "skipping non-file image");
            return None;
        }

        let media = match self.media_by_src.get(url.as_str()) {
            Some(index) => *index,
            None => {
                let media = read_media(&url)?;
                self.media.push(media);
                let index = self.media.len() - 1;
                self.media_by_src.insert(url.to_string(), index);
                index
            }
        };

        let bytes = &self.media[media].bytes;
        let size = imagesize::blob_size(bytes).ok()?;
        let (width, height) = image_extent(
            (size.width as f64, size.height as f64),
            get_attr(attrs, "width").as_deref().and_then(parse_px),
            get_attr(attrs, "height").as_deref().and_then(parse_px),
            self.max_width_px,
        );

        Some(ImageRef {
            media,
            width_emu: (width * EMU_PER_PX).round() as u64,
            height_emu: (height * EMU_PER_PX).round() as u64,
        })
    }

    fn finalize(mut self) -> Document {
        self.flush_paragraph();
        Document {
            blocks: self.blocks,
            media: self.media,
        }
    }
}

fn read_media(url: &Url) -> Option<Media> {
    let path = url.to_file_path().ok()?;
    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "image not readable, skipped");
            return None;
        }
    };
    let kind = match imagesize::image_type(&bytes) {
        Ok(imagesize::ImageType::Png) => ImageKind::Png,
        Ok(imagesize::ImageType::Jpeg) => ImageKind::Jpeg,
        Ok(imagesize::ImageType::Gif) => ImageKind::Gif,
        _ => {
            tracing::warn!(path = %path.display(), "unsupported image format, skipped");
            return None;
        }
    };
    Some(Media { kind, bytes })
}

/// Display size in pixels: explicit attributes, else intrinsic, keeping the
/// aspect ratio when only one side is given, then capped to `max_width`
pub(super) fn image_extent(
    intrinsic: (f64, f64),
    width: Option<f64>,
    height: Option<f64>,
    max_width: f64,
) -> (f64, f64) {
    let (iw, ih) = (intrinsic.0.max(1.0), intrinsic.1.max(1.0));
    let (w, h) = match (width, height) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, w * ih / iw),
        (None, Some(h)) => (h * iw / ih, h),
        (None, None) => (iw, ih),
    };
    if w > max_width {
        (max_width, h * max_width / w)
    } else {
        (w, h)
    }
}

fn is_html_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0C')
}

fn is_block(tag: &str) -> bool {
    matches!(
        tag,
        "html"
            | "body"
            | "div"
            | "section"
            | "article"
            | "header"
            | "footer"
            | "main"
            | "aside"
            | "nav"
            | "address"
            | "center"
            | "figure"
            | "figcaption"
            | "dl"
            | "dt"
            | "dd"
            | "form"
            | "fieldset"
            | "caption"
    )
}
