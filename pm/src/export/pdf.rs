//! PDF renderer built on lopdf's object model
//!
//! Uses the fourteen standard Type1 fonts, so nothing is embedded and text
//! is limited to WinAnsi.

use chrono::Local;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use tracing::debug;

use super::layout::{Font, Line, classify, encode_win_ansi, strip_emphasis, text_width, wrap};
use super::{DocumentRenderer, ExportError};
use crate::chain::{Availability, Tier};

// A4 in points
const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;

const MARGIN_X: f32 = 50.0;
const MARGIN_TOP: f32 = 50.0;
const MARGIN_BOTTOM: f32 = 70.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN_X;

const BULLET_INDENT: f32 = 14.0;

const TITLE: &str = "Business Strategy Plan";

/// Text style of one block
#[derive(Debug, Clone, Copy)]
struct Style {
    font: Font,
    size: f32,
}

impl Style {
    const fn new(font: Font, size: f32) -> Self {
        Self { font, size }
    }

    fn line_height(&self) -> f32 {
        self.size + 6.0
    }
}

const TITLE_STYLE: Style = Style::new(Font::Bold, 15.0);
const LABEL_STYLE: Style = Style::new(Font::Bold, 12.0);
const HEADING1_STYLE: Style = Style::new(Font::Bold, 14.0);
const HEADING2_STYLE: Style = Style::new(Font::Bold, 12.0);
const HEADING3_STYLE: Style = Style::new(Font::BoldOblique, 11.0);
const BODY_STYLE: Style = Style::new(Font::Regular, 11.0);
const FOOTER_STYLE: Style = Style::new(Font::Oblique, 8.0);

/// Lays text out top to bottom, breaking pages as needed
struct PageWriter {
    pages: Vec<Content>,
    current: Content,
    y: f32,
}

impl PageWriter {
    fn new() -> Self {
        let mut writer = Self {
            pages: Vec::new(),
            current: Content { operations: vec![] },
            y: 0.0,
        };
        writer.start_page();
        writer
    }

    fn start_page(&mut self) {
        debug!(page = self.pages.len() + 1, "PageWriter::start_page: called");
        self.y = PAGE_HEIGHT - MARGIN_TOP;
        self.centered(TITLE_STYLE, TITLE);
        self.gap(TITLE_STYLE.size);
    }

    fn new_page(&mut self) {
        let done = std::mem::replace(&mut self.current, Content { operations: vec![] });
        self.pages.push(done);
        self.start_page();
    }

    fn ensure(&mut self, height: f32) {
        if self.y - height < MARGIN_BOTTOM {
            self.new_page();
        }
    }

    fn gap(&mut self, height: f32) {
        self.y -= height;
        if self.y < MARGIN_BOTTOM {
            self.new_page();
        }
    }

    fn draw(&mut self, style: Style, x: f32, text: &str) {
        let baseline = self.y - style.size;
        let ops = &mut self.current.operations;
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new(
            "Tf",
            vec![style.font.resource_name().into(), style.size.into()],
        ));
        ops.push(Operation::new("Td", vec![x.into(), baseline.into()]));
        ops.push(Operation::new("Tj", vec![Object::string_literal(encode_win_ansi(text))]));
        ops.push(Operation::new("ET", vec![]));
    }

    fn centered(&mut self, style: Style, text: &str) {
        self.ensure(style.line_height());
        let width = text_width(text, style.font, style.size);
        let x = MARGIN_X + ((CONTENT_WIDTH - width) / 2.0).max(0.0);
        self.draw(style, x, text);
        self.y -= style.line_height();
    }

    /// Wrapped paragraph starting at `indent`; `marker` hangs in front of the first line
    fn paragraph(&mut self, style: Style, indent: f32, marker: Option<&str>, text: &str) {
        let text_x = MARGIN_X + indent + if marker.is_some() { BULLET_INDENT } else { 0.0 };
        let width = PAGE_WIDTH - MARGIN_X - text_x;

        for (i, line) in wrap(text, style.font, style.size, width).iter().enumerate() {
            self.ensure(style.line_height());
            if i == 0
                && let Some(marker) = marker
            {
                self.draw(style, MARGIN_X + indent, marker);
            }
            self.draw(style, text_x, line);
            self.y -= style.line_height();
        }
    }

    fn rule(&mut self) {
        self.ensure(1.0);
        let ops = &mut self.current.operations;
        ops.push(Operation::new("w", vec![0.5_f32.into()]));
        ops.push(Operation::new("m", vec![MARGIN_X.into(), self.y.into()]));
        ops.push(Operation::new("l", vec![(PAGE_WIDTH - MARGIN_X).into(), self.y.into()]));
        ops.push(Operation::new("S", vec![]));
    }

    fn finish(mut self) -> Vec<Content> {
        self.pages.push(self.current);
        self.pages
    }
}

/// Append the footer to every page once the page count is known
fn add_footers(pages: &mut [Content], generated_on: &str) {
    let total = pages.len();
    let stamp = format!("Generated on {} - Powered by PlanMind AI", generated_on);
    let stamp_width = text_width(&stamp, FOOTER_STYLE.font, FOOTER_STYLE.size);
    let stamp_x = MARGIN_X + ((CONTENT_WIDTH - stamp_width) / 2.0).max(0.0);

    for (i, page) in pages.iter_mut().enumerate() {
        let number = format!("Page {}/{}", i + 1, total);
        let number_x = PAGE_WIDTH - MARGIN_X - text_width(&number, FOOTER_STYLE.font, FOOTER_STYLE.size);

        for (x, y, text) in [(stamp_x, 40.0_f32, &stamp), (number_x, 28.0_f32, &number)] {
            page.operations.push(Operation::new("BT", vec![]));
            page.operations.push(Operation::new(
                "Tf",
                vec![FOOTER_STYLE.font.resource_name().into(), FOOTER_STYLE.size.into()],
            ));
            page.operations.push(Operation::new("Td", vec![x.into(), y.into()]));
            page.operations.push(Operation::new("Tj", vec![Object::string_literal(encode_win_ansi(text))]));
            page.operations.push(Operation::new("ET", vec![]));
        }
    }
}

/// Renders a plan to an A4 PDF
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfRenderer;

impl PdfRenderer {
    /// Lay out the whole plan into page content streams
    fn layout(&self, problem: &str, context: &str, response: &str) -> Vec<Content> {
        let mut writer = PageWriter::new();

        writer.paragraph(LABEL_STYLE, 0.0, None, "Business Problem:");
        writer.paragraph(BODY_STYLE, 0.0, None, problem);
        writer.gap(5.0);

        if !context.trim().is_empty() {
            writer.paragraph(LABEL_STYLE, 0.0, None, "Additional Context:");
            for line in context.lines() {
                writer.paragraph(BODY_STYLE, 0.0, None, line);
            }
            writer.gap(5.0);
        }

        writer.rule();
        writer.gap(10.0);
        writer.centered(HEADING1_STYLE, "Strategic Plan");
        writer.gap(5.0);

        for raw in response.lines() {
            match classify(raw) {
                Line::Heading1(text) => writer.paragraph(HEADING1_STYLE, 0.0, None, &strip_emphasis(text)),
                Line::Heading2(text) => writer.paragraph(HEADING2_STYLE, 0.0, None, &strip_emphasis(text)),
                Line::Heading3(text) => writer.paragraph(HEADING3_STYLE, 0.0, None, &strip_emphasis(text)),
                Line::Bullet { depth, text } => {
                    let indent = 5.0 + depth as f32 * BULLET_INDENT;
                    writer.paragraph(BODY_STYLE, indent, Some("•"), &strip_emphasis(text));
                }
                Line::Blank => writer.gap(5.0),
                Line::Body(text) => writer.paragraph(BODY_STYLE, 0.0, None, &strip_emphasis(text)),
            }
        }

        writer.finish()
    }

    fn assemble(&self, pages: Vec<Content>) -> Result<Vec<u8>, ExportError> {
        debug!(page_count = pages.len(), "PdfRenderer::assemble: called");
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let mut fonts = Dictionary::new();
        for font in Font::ALL {
            let font_id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => font.base_font(),
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(font.resource_name(), font_id);
        }
        let resources_id = doc.add_object(dictionary! { "Font" => fonts });

        let mut page_ids: Vec<ObjectId> = Vec::with_capacity(pages.len());
        for content in pages {
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode()?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            page_ids.push(page_id);
        }

        let kids: Vec<Object> = page_ids.iter().map(|id| Object::from(*id)).collect();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_ids.len() as i64,
            }),
        );

        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out)?;
        Ok(out)
    }
}

impl Tier for PdfRenderer {
    fn name(&self) -> &str {
        "pdf"
    }

    fn availability(&self) -> Availability {
        Availability::Ready
    }
}

impl DocumentRenderer for PdfRenderer {
    fn render(&self, problem: &str, context: &str, response: &str) -> Result<Vec<u8>, ExportError> {
        debug!(response_len = response.len(), "PdfRenderer::render: called");
        let mut pages = self.layout(problem, context, response);
        let generated_on = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        add_footers(&mut pages, &generated_on);
        self.assemble(pages)
    }
}
