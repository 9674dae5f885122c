//! Document model between the HTML walker and the package writer

/// Paragraph alignment (`text-align`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
    Justify,
}

impl Align {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Some(Align::Left),
            "center" | "middle" => Some(Align::Center),
            "right" | "end" => Some(Align::Right),
            "justify" => Some(Align::Justify),
            _ => None,
        }
    }

    pub fn as_wml(self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
            Align::Justify => "both",
        }
    }
}

/// Character formatting of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Format {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text { text: String, format: Format },
    Break,
    Image(ImageRef),
}

/// Placement of an embedded image; `media` indexes [`Document::media`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRef {
    pub media: usize,
    pub width_emu: u64,
    pub height_emu: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    /// Style id such as `Heading1`
    pub style: Option<String>,
    pub align: Option<Align>,
    pub indent_twips: u32,
    /// Draw a bottom border (`<hr>`)
    pub rule: bool,
    pub inlines: Vec<Inline>,
}

impl Paragraph {
    pub fn is_empty(&self) -> bool {
        self.inlines.is_empty() && !self.rule
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn columns(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
    Gif,
}

impl ImageKind {
    pub fn extension(self) -> &'static str {
        match self {
            ImageKind::Png => "png",
            ImageKind::Jpeg => "jpeg",
            ImageKind::Gif => "gif",
        }
    }
}

/// An embedded image file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
    pub kind: ImageKind,
    pub bytes: Vec<u8>,
}

impl Media {
    /// Part name inside `word/media/`
    pub fn file_name(&self, index: usize) -> String {
        format!("image{}.{}", index + 1, self.kind.extension())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub blocks: Vec<Block>,
    pub media: Vec<Media>,
}
