//! PDF export of a diary.
//!
//! [`export_diary`] lays the diary out as a fixed sequence of calls on a
//! [`PdfRenderer`]: the same diary always produces the same calls. The layout
//! lives in [`PdfLayout`] (millimetres on an A4 page):
//!
//! ```text
//! font 20, title centred at (105, 20)          y = 40
//! for each entry:
//!     if y > 250: new page                     y = 20
//!     font 14, location at (20, y)             y += 10
//!     font 10, date at (20, y)                 y += 10
//!     font 12, wrapped description (if any)    y += lines × 5
//!                                              y += 10
//! save "<title>.pdf"
//! ```
//!
//! The page-break check runs before an entry's location line, so an entry is
//! never split from its heading but a long description can run past the
//! break line.
//!
//! [`PdfWriter`] is the built-in renderer: a text-only document assembled
//! with `lopdf`, using standard Helvetica for Western text and the Adobe CJK
//! fonts for Chinese, Japanese and Korean.

use crate::config::{LabelsConfig, PdfLayout};
use crate::types::{DiaryEntry, display_date};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, StringFormat, dictionary};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF error: {0}")]
    Document(#[from] lopdf::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// Stateful document builder, in millimetres from the top-left corner.
pub trait PdfRenderer {
    fn set_font_size(&mut self, size: f64);

    /// Draw one or more lines starting at `(x, y)`.
    fn text(&mut self, lines: &[String], x: f64, y: f64, align: Align);

    /// Word-wrap `text` to `width` at the current font size.
    fn split_text_to_size(&self, text: &str, width: f64) -> Vec<String>;

    fn add_page(&mut self);

    /// Write the document. Returns where it was written.
    fn save(&mut self, file_name: &str) -> Result<PathBuf, PdfError>;
}

/// `<title>.pdf`, with path separators replaced.
pub fn file_name(title: &str) -> String {
    let safe: String = title
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '-' } else { c })
        .collect();
    format!("{safe}.pdf")
}

/// Lay out a diary and save it through `renderer`.
pub fn export_diary<R: PdfRenderer>(
    renderer: &mut R,
    title: &str,
    entries: &[DiaryEntry],
    layout: &PdfLayout,
    labels: &LabelsConfig,
) -> Result<PathBuf, PdfError> {
    renderer.set_font_size(layout.title_font_size);
    renderer.text(
        &[title.to_string()],
        layout.page_width / 2.0,
        layout.title_y,
        Align::Center,
    );

    let mut y = layout.first_entry_y;
    for entry in entries {
        if y > layout.page_break_y {
            renderer.add_page();
            y = layout.top_margin;
        }

        let location = if entry.location.is_empty() {
            &labels.unknown_location
        } else {
            &entry.location
        };
        renderer.set_font_size(layout.location_font_size);
        renderer.text(&[location.clone()], layout.left_margin, y, Align::Left);
        y += layout.line_gap;

        renderer.set_font_size(layout.date_font_size);
        renderer.text(
            &[display_date(&entry.timestamp)],
            layout.left_margin,
            y,
            Align::Left,
        );
        y += layout.line_gap;

        if !entry.description.is_empty() {
            renderer.set_font_size(layout.description_font_size);
            let lines = renderer.split_text_to_size(&entry.description, layout.wrap_width);
            renderer.text(&lines, layout.left_margin, y, Align::Left);
            y += lines.len() as f64 * layout.line_height;
        }

        y += layout.entry_gap;
    }

    renderer.save(&file_name(title))
}

// ============================================================================
// Built-in writer
// ============================================================================

const PT_PER_MM: f64 = 72.0 / 25.4;
/// Average Helvetica glyph width, in em. CJK glyphs are a full em.
const NARROW_EM: f64 = 0.5;
const LINE_HEIGHT_FACTOR: f64 = 1.15;

#[derive(Debug, Clone)]
struct PlacedText {
    size: f64,
    x: f64,
    y: f64,
    text: String,
}

/// Text-only PDF writer built on `lopdf`.
///
/// Text is split into runs by the font that can show it: Helvetica for
/// WinAnsi characters, and the viewer-provided Adobe CJK fonts (`STSong-Light`
/// for Chinese and Japanese, `HYSMyeongJo-Medium` for Hangul) for the rest.
/// The CJK fonts are referenced, not embedded.
#[derive(Debug)]
pub struct PdfWriter {
    out_dir: PathBuf,
    page_width: f64,
    page_height: f64,
    font_size: f64,
    pages: Vec<Vec<PlacedText>>,
}

impl PdfWriter {
    pub fn new(out_dir: impl Into<PathBuf>, layout: &PdfLayout) -> Self {
        Self {
            out_dir: out_dir.into(),
            page_width: layout.page_width,
            page_height: layout.page_height,
            font_size: 16.0,
            pages: vec![Vec::new()],
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Estimated width of `text` in millimetres at the current font size.
    fn text_width(&self, text: &str) -> f64 {
        columns(text) as f64 * NARROW_EM * self.font_size / PT_PER_MM
    }

    /// Serialize the document.
    pub fn to_bytes(&self) -> Result<Vec<u8>, PdfError> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let helvetica = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let fonts = dictionary! {
            Font::Latin.resource() => helvetica,
            Font::Chinese.resource() => cid_font(&mut doc, "STSong-Light", "UniGB-UTF16-H", "GB1", 4),
            Font::Korean.resource() => cid_font(&mut doc, "HYSMyeongJo-Medium", "UniKS-UTF16-H", "Korea1", 1),
        };
        let resources = doc.add_object(dictionary! { "Font" => fonts });

        let height_pt = self.page_height * PT_PER_MM;
        let mut kids: Vec<Object> = Vec::with_capacity(self.pages.len());
        for page in &self.pages {
            let content = page_content(page, height_pt).encode()?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, content));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let pages = dictionary! {
            "Type" => "Pages",
            "Count" => Object::Integer(kids.len() as i64),
            "Kids" => kids,
            "Resources" => resources,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                real(self.page_width * PT_PER_MM),
                real(height_pt),
            ],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog);
        doc.compress();

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;
        Ok(bytes)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Font {
    Latin,
    Chinese,
    Korean,
}

impl Font {
    fn of(c: char) -> Self {
        if win_ansi(c).is_some() {
            Font::Latin
        } else if matches!(c as u32, 0x1100..=0x11FF | 0x3130..=0x318F | 0xAC00..=0xD7AF) {
            Font::Korean
        } else {
            Font::Chinese
        }
    }

    fn resource(self) -> &'static str {
        match self {
            Font::Latin => "F1",
            Font::Chinese => "F2",
            Font::Korean => "F3",
        }
    }

    /// String operand for `Tj`: WinAnsi bytes, or UTF-16BE for the CID fonts.
    fn encode(self, run: &str) -> Object {
        match self {
            Font::Latin => Object::String(
                run.chars().filter_map(win_ansi).collect(),
                StringFormat::Literal,
            ),
            Font::Chinese | Font::Korean => Object::String(
                run.encode_utf16().flat_map(u16::to_be_bytes).collect(),
                StringFormat::Hexadecimal,
            ),
        }
    }
}

/// Type0 font over one of the Adobe CJK collections viewers ship.
fn cid_font(doc: &mut Document, name: &str, cmap: &str, ordering: &str, supplement: i64) -> ObjectId {
    let descriptor = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => name,
        "Flags" => Object::Integer(6),
        "FontBBox" => vec![
            Object::Integer(-25),
            Object::Integer(-254),
            Object::Integer(1000),
            Object::Integer(880),
        ],
        "ItalicAngle" => Object::Integer(0),
        "Ascent" => Object::Integer(880),
        "Descent" => Object::Integer(-120),
        "CapHeight" => Object::Integer(880),
        "StemV" => Object::Integer(93),
    });
    let descendant = dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType0",
        "BaseFont" => name,
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal(ordering),
            "Supplement" => Object::Integer(supplement),
        },
        "FontDescriptor" => descriptor,
    };
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => name,
        "Encoding" => cmap,
        "DescendantFonts" => vec![Object::Dictionary(descendant)],
    })
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

fn page_content(texts: &[PlacedText], height_pt: f64) -> Content {
    let mut operations = Vec::new();
    for t in texts {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new(
            "Td",
            vec![real(t.x * PT_PER_MM), real(height_pt - t.y * PT_PER_MM)],
        ));
        for (font, run) in runs(&t.text) {
            operations.push(Operation::new("Tf", vec![font.resource().into(), real(t.size)]));
            operations.push(Operation::new("Tj", vec![font.encode(&run)]));
        }
        operations.push(Operation::new("ET", vec![]));
    }
    Content { operations }
}

/// Split `text` into maximal runs shown with the same font.
fn runs(text: &str) -> Vec<(Font, String)> {
    let mut runs: Vec<(Font, String)> = Vec::new();
    for c in text.chars() {
        let font = Font::of(c);
        match runs.last_mut() {
            Some((last, run)) if *last == font => run.push(c),
            _ => runs.push((font, c.to_string())),
        }
    }
    runs
}

/// WinAnsiEncoding byte for `c`. Control characters become spaces.
fn win_ansi(c: char) -> Option<u8> {
    let byte = match c {
        ' '..='~' | '\u{A0}'..='\u{FF}' => c as u8,
        _ if c.is_control() => b' ',
        '€' => 0x80,
        '‚' => 0x82,
        '„' => 0x84,
        '…' => 0x85,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '™' => 0x99,
        _ => return None,
    };
    Some(byte)
}

/// Width of `text` in half-em columns: narrow glyphs take one, CJK glyphs two.
fn columns(text: &str) -> usize {
    text.chars().map(char_columns).sum()
}

fn char_columns(c: char) -> usize {
    if win_ansi(c).is_some() { 1 } else { 2 }
}

impl PdfRenderer for PdfWriter {
    fn set_font_size(&mut self, size: f64) {
        self.font_size = size;
    }

    fn text(&mut self, lines: &[String], x: f64, y: f64, align: Align) {
        let line_step = self.font_size * LINE_HEIGHT_FACTOR / PT_PER_MM;
        let placed: Vec<PlacedText> = lines
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let x = match align {
                    Align::Left => x,
                    Align::Center => x - self.text_width(line) / 2.0,
                };
                PlacedText {
                    size: self.font_size,
                    x,
                    y: y + i as f64 * line_step,
                    text: line.clone(),
                }
            })
            .collect();
        if let Some(page) = self.pages.last_mut() {
            page.extend(placed);
        }
    }

    fn split_text_to_size(&self, text: &str, width: f64) -> Vec<String> {
        let max_columns = ((width / self.text_width("m")).floor() as usize).max(1);
        wrap(text, max_columns)
    }

    fn add_page(&mut self) {
        self.pages.push(Vec::new());
    }

    fn save(&mut self, file_name: &str) -> Result<PathBuf, PdfError> {
        let bytes = self.to_bytes()?;
        fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join(file_name);
        fs::write(&path, bytes)?;
        Ok(path)
    }
}

/// Greedy word wrap to `max_columns` half-em columns per line (a CJK
/// glyph takes two). Words longer than a line are split; explicit newlines
/// start a new line.
pub fn wrap(text: &str, max_columns: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut line = String::new();
        let mut line_cols = 0;
        for word in paragraph.split_whitespace() {
            let word_cols = columns(word);
            if line_cols > 0 && line_cols + 1 + word_cols <= max_columns {
                line.push(' ');
                line.push_str(word);
                line_cols += 1 + word_cols;
                continue;
            }
            if line_cols > 0 {
                lines.push(std::mem::take(&mut line));
                line_cols = 0;
            }
            for c in word.chars() {
                let width = char_columns(c);
                if line_cols > 0 && line_cols + width > max_columns {
                    lines.push(std::mem::take(&mut line));
                    line_cols = 0;
                }
                line.push(c);
                line_cols += width;
            }
        }
        if line_cols > 0 || paragraph.trim().is_empty() {
            lines.push(line);
        }
    }
    lines
}

/// Path a diary titled `title` is written to by a [`PdfWriter`] on `out_dir`.
pub fn output_path(out_dir: &Path, title: &str) -> PathBuf {
    out_dir.join(file_name(title))
}
