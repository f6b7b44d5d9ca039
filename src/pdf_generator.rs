use crate::error::{DocfillError, Result};
use crate::pdf::{encode_pdf_string, validate_pdf_bytes};
use serde::{Deserialize, Serialize};
use tracing::debug;

// --- Page layout ---

/// Fixed page geometry, all values in PDF points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageLayout {
    pub width: f32,
    pub height: f32,
    pub margin_left: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub line_height: f32,
    pub font_size: f32,
    /// One of the standard Type1 fonts
    pub font: String,
}

impl PageLayout {
    /// ISO A4 portrait
    pub fn a4() -> Self {
        PageLayout {
            width: 595.28,
            height: 841.89,
            margin_left: 50.0,
            margin_top: 50.0,
            margin_bottom: 50.0,
            line_height: 15.0,
            font_size: 11.0,
            font: "Helvetica".to_string(),
        }
    }

    pub fn content_top(&self) -> f32 {
        self.height - self.margin_top
    }

    /// Number of lines that fit between the margins
    pub fn lines_per_page(&self) -> usize {
        if self.line_height <= 0.0 {
            return 0;
        }
        ((self.content_top() - self.margin_bottom) / self.line_height).floor().max(0.0) as usize
    }
}

impl Default for PageLayout {
    fn default() -> Self {
        Self::a4()
    }
}

// --- Low-level PDF object model ---

pub struct PdfGenerator {
    objects: Vec<PdfObj>,
    next_id: u32,
}

#[derive(Debug)]
struct PdfObj {
    id: u32,
    content: String,
    stream_data: Option<Vec<u8>>,
}

impl PdfGenerator {
    pub fn new() -> Self {
        PdfGenerator {
            objects: Vec::new(),
            next_id: 1,
        }
    }

    /// Reserve an object id whose content is supplied later with [`Self::set_object`]
    pub fn reserve(&mut self) -> u32 {
        let id = self.next_id;
        self.objects.push(PdfObj {
            id,
            content: String::new(),
            stream_data: None,
        });
        self.next_id += 1;
        id
    }

    pub fn set_object(&mut self, id: u32, content: String) {
        if let Some(obj) = self.objects.iter_mut().find(|o| o.id == id) {
            obj.content = content;
        }
    }

    pub fn add_object(&mut self, content: String) -> u32 {
        let id = self.reserve();
        self.set_object(id, content);
        id
    }

    pub fn add_stream_object(&mut self, data: Vec<u8>) -> u32 {
        let id = self.next_id;
        self.objects.push(PdfObj {
            id,
            content: format!("<< /Length {} >>\n", data.len()),
            stream_data: Some(data),
        });
        self.next_id += 1;
        id
    }

    /// Serialize all objects with an xref table and a trailer pointing at `root`
    pub fn generate(&self, root: u32) -> Vec<u8> {
        let mut pdf = Vec::new();

        pdf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

        let mut offsets = Vec::with_capacity(self.objects.len());
        for obj in &self.objects {
            offsets.push(pdf.len());
            pdf.extend_from_slice(format!("{} 0 obj\n", obj.id).as_bytes());
            pdf.extend_from_slice(obj.content.as_bytes());
            if let Some(data) = &obj.stream_data {
                pdf.extend_from_slice(b"stream\n");
                pdf.extend_from_slice(data);
                pdf.extend_from_slice(b"\nendstream\n");
            }
            pdf.extend_from_slice(b"endobj\n");
        }

        let xref_offset = pdf.len();
        pdf.extend_from_slice(format!("xref\n0 {}\n", self.objects.len() + 1).as_bytes());
        pdf.extend_from_slice(b"0000000000 65535 f \n");
        for offset in offsets {
            pdf.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
        }

        pdf.extend_from_slice(b"trailer\n<<\n");
        pdf.extend_from_slice(format!("/Size {}\n", self.objects.len() + 1).as_bytes());
        pdf.extend_from_slice(format!("/Root {} 0 R\n", root).as_bytes());
        pdf.extend_from_slice(b">>\nstartxref\n");
        pdf.extend_from_slice(format!("{}\n", xref_offset).as_bytes());
        pdf.extend_from_slice(b"%%EOF\n");

        pdf
    }
}

impl Default for PdfGenerator {
    fn default() -> Self {
        Self::new()
    }
}

// --- Pagination ---

/// Split text into lines. `\n`, `\r\n` and a lone `\r` each end a line; tabs
/// become four spaces.
pub fn split_lines(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    text.replace("\r\n", "\n")
        .split(['\n', '\r'])
        .map(|l| l.replace('\t', "    "))
        .collect()
}

/// Group lines into pages of at most `lines_per_page` lines
pub fn paginate<T>(lines: &[T], lines_per_page: usize) -> Vec<&[T]> {
    if lines.is_empty() || lines_per_page == 0 {
        return vec![&lines[..0]];
    }
    lines.chunks(lines_per_page).collect()
}

/// Content stream builder: tracks the vertical cursor within the current page
struct ContentStreamBuilder<'a> {
    pages: Vec<Vec<u8>>,
    current: Vec<u8>,
    y: f32,
    layout: &'a PageLayout,
}

impl<'a> ContentStreamBuilder<'a> {
    fn new(layout: &'a PageLayout) -> Self {
        ContentStreamBuilder {
            pages: Vec::new(),
            current: Vec::new(),
            y: layout.content_top(),
            layout,
        }
    }

    fn new_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.current));
        self.y = self.layout.content_top();
    }

    fn emit_line(&mut self, line: &str) -> Result<()> {
        self.y -= self.layout.line_height;

        if line.is_empty() {
            return Ok(());
        }
        let encoded = encode_pdf_string(line).map_err(|c| {
            DocfillError::RenderFailure(format!(
                "character {:?} (U+{:04X}) cannot be drawn with {}",
                c, c as u32, self.layout.font
            ))
        })?;

        self.current.extend_from_slice(
            format!(
                "BT\n/F1 {} Tf\n{} {} Td\n(",
                self.layout.font_size, self.layout.margin_left, self.y
            )
            .as_bytes(),
        );
        self.current.extend_from_slice(&encoded);
        self.current.extend_from_slice(b") Tj\nET\n");
        Ok(())
    }

    fn finish(mut self) -> Vec<Vec<u8>> {
        self.pages.push(self.current);
        self.pages
    }
}

// --- Public API ---

/// A finished PDF
#[derive(Debug, Clone)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

/// Lay `text` out line by line and produce a complete PDF.
///
/// Nothing is returned unless every line was drawn and the result passes the
/// structural check.
pub fn render_text(text: &str, layout: &PageLayout) -> Result<RenderedPdf> {
    if layout.lines_per_page() == 0 {
        return Err(DocfillError::RenderFailure(
            "page layout leaves no room for a single line".to_string(),
        ));
    }

    let lines = split_lines(text);
    let mut builder = ContentStreamBuilder::new(layout);
    for (i, page) in paginate(&lines, layout.lines_per_page()).into_iter().enumerate() {
        if i > 0 {
            builder.new_page();
        }
        for line in page {
            builder.emit_line(line)?;
        }
    }
    let page_streams = builder.finish();

    let bytes = assemble_pdf(&page_streams, layout);
    let validation = validate_pdf_bytes(&bytes);
    if !validation.valid {
        return Err(DocfillError::RenderFailure(validation.errors.join("; ")));
    }

    debug!(pages = page_streams.len(), size = bytes.len(), "rendered PDF");
    Ok(RenderedPdf {
        bytes,
        page_count: page_streams.len(),
    })
}

/// Assemble final PDF from per-page content streams
fn assemble_pdf(page_streams: &[Vec<u8>], layout: &PageLayout) -> Vec<u8> {
    let mut generator = PdfGenerator::new();

    let catalog_id = generator.reserve();
    let pages_id = generator.reserve();
    let font_id = generator.add_object(format!(
        "<< /Type /Font\n/Subtype /Type1\n/BaseFont /{}\n/Encoding /WinAnsiEncoding\n>>\n",
        layout.font
    ));

    let mut page_ids = Vec::with_capacity(page_streams.len());
    for stream in page_streams {
        let content_id = generator.add_stream_object(stream.clone());
        let page_id = generator.add_object(format!(
            "<< /Type /Page\n\
             /Parent {} 0 R\n\
             /MediaBox [0 0 {} {}]\n\
             /Contents {} 0 R\n\
             /Resources << /Font << /F1 {} 0 R >> >>\n\
             >>\n",
            pages_id, layout.width, layout.height, content_id, font_id
        ));
        page_ids.push(page_id);
    }

    let kids: Vec<String> = page_ids.iter().map(|id| format!("{} 0 R", id)).collect();
    generator.set_object(
        pages_id,
        format!(
            "<< /Type /Pages\n/Kids [{}]\n/Count {}\n>>\n",
            kids.join(" "),
            page_ids.len()
        ),
    );
    generator.set_object(
        catalog_id,
        format!("<< /Type /Catalog\n/Pages {} 0 R\n>>\n", pages_id),
    );

    generator.generate(catalog_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 600pt of usable height at 15pt per line: 40 lines per page
    fn forty_line_layout() -> PageLayout {
        PageLayout {
            height: 700.0,
            margin_top: 50.0,
            margin_bottom: 50.0,
            line_height: 15.0,
            ..PageLayout::a4()
        }
    }

    fn numbered_lines(n: usize) -> String {
        (1..=n)
            .map(|i| format!("line {}", i))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_a4_lines_per_page() {
        assert_eq!(PageLayout::a4().lines_per_page(), 49);
        assert_eq!(forty_line_layout().lines_per_page(), 40);
    }

    #[test]
    fn test_split_lines() {
        assert_eq!(split_lines("a\r\nb\n\nc"), vec!["a", "b", "", "c"]);
        assert_eq!(split_lines("x\ty"), vec!["x    y"]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn test_paginate_breaks_after_40_and_80() {
        let lines = split_lines(&numbered_lines(100));
        let pages = paginate(&lines, 40);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].len(), 40);
        assert_eq!(pages[0].last().unwrap(), "line 40");
        assert_eq!(pages[1].first().unwrap(), "line 41");
        assert_eq!(pages[1].last().unwrap(), "line 80");
        assert_eq!(pages[2].first().unwrap(), "line 81");
        assert_eq!(pages[2].len(), 20);
    }

    #[test]
    fn test_render_100_lines_three_pages() {
        let pdf = render_text(&numbered_lines(100), &forty_line_layout()).unwrap();
        assert_eq!(pdf.page_count, 3);

        let validation = validate_pdf_bytes(&pdf.bytes);
        assert!(validation.valid, "errors: {:?}", validation.errors);
        assert_eq!(validation.page_count, 3);

        // Each content stream is written just before its page object.
        let content = String::from_utf8_lossy(&pdf.bytes);
        let page_objs: Vec<usize> = content.match_indices("/Type /Page\n").map(|(i, _)| i).collect();
        let at = |needle: &str| content.find(needle).unwrap();
        assert!(at("(line 40)") < page_objs[0] && page_objs[0] < at("(line 41)"));
        assert!(at("(line 80)") < page_objs[1] && page_objs[1] < at("(line 81)"));
    }

    #[test]
    fn test_render_exact_fit_single_page() {
        let pdf = render_text(&numbered_lines(40), &forty_line_layout()).unwrap();
        assert_eq!(pdf.page_count, 1);
        let pdf = render_text(&numbered_lines(41), &forty_line_layout()).unwrap();
        assert_eq!(pdf.page_count, 2);
    }

    #[test]
    fn test_render_empty_text_is_one_blank_page() {
        let pdf = render_text("", &PageLayout::a4()).unwrap();
        assert_eq!(pdf.page_count, 1);
        assert!(validate_pdf_bytes(&pdf.bytes).valid);
    }

    #[test]
    fn test_render_positions_first_line_below_top_margin() {
        let layout = forty_line_layout();
        let pdf = render_text("hello", &layout).unwrap();
        let content = String::from_utf8_lossy(&pdf.bytes);
        assert!(content.contains("50 635 Td\n(hello) Tj"));
        assert!(content.contains("/BaseFont /Helvetica"));
        assert!(content.contains("/MediaBox [0 0 595.28 700]"));
    }

    #[test]
    fn test_render_unencodable_character_fails() {
        let result = render_text("ok\n\u{4e2d}\u{6587}", &PageLayout::a4());
        assert!(matches!(result, Err(DocfillError::RenderFailure(_))));
    }

    #[test]
    fn test_render_latin1_and_punctuation() {
        let pdf = render_text("Caf\u{e9} \u{2014} (draft)", &PageLayout::a4()).unwrap();
        let content = String::from_utf8_lossy(&pdf.bytes);
        assert!(content.contains("(Caf\\351 \\227 \\(draft\\)) Tj"));
    }

    #[test]
    fn test_render_rejects_degenerate_layout() {
        let layout = PageLayout {
            margin_top: 500.0,
            margin_bottom: 500.0,
            ..PageLayout::a4()
        };
        assert!(matches!(
            render_text("x", &layout),
            Err(DocfillError::RenderFailure(_))
        ));
    }

    #[test]
    fn test_split_lines_line_endings() {
        assert_eq!(split_lines("a\r\nb\rc\nd"), vec!["a", "b", "c", "d"]);
        assert_eq!(split_lines("a\r\rb"), vec!["a", "", "b"]);
    }

    #[test]
    fn test_render_lone_carriage_return() {
        let pdf = render_text("a\rb", &PageLayout::a4()).unwrap();
        let content = String::from_utf8_lossy(&pdf.bytes);
        assert!(content.contains("(a) Tj"));
        assert!(content.contains("(b) Tj"));
    }

    #[test]
    fn test_render_text_that_looks_like_pdf_syntax() {
        let text = "see endobj and backendstream\n1 0 obj\n/Type /Page\nstream\n(unbalanced";
        let pdf = render_text(text, &PageLayout::a4()).unwrap();
        assert_eq!(pdf.page_count, 1);

        let validation = validate_pdf_bytes(&pdf.bytes);
        assert!(validation.valid, "errors: {:?}", validation.errors);
        assert_eq!(validation.page_count, 1);
        let content = String::from_utf8_lossy(&pdf.bytes);
        assert!(content.contains("(see endobj and backendstream) Tj"));
        assert!(content.contains("(\\(unbalanced) Tj"));
    }
}
