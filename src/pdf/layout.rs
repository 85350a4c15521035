//! Flowing text layout on A4 pages.
//!
//! Blocks are measured before they are placed: a block that does not fit in
//! the space left on the current page moves to a fresh page as a whole. Only
//! blocks taller than a full page are split line by line. Page footers are
//! stamped once the total page count is known.

use super::writer::{write_document, DocumentInfo, DrawOp, Font, PageContent, A4_HEIGHT, A4_WIDTH};

const MARGIN_X: f32 = 50.0;
const MARGIN_TOP: f32 = 56.0;
const MARGIN_BOTTOM: f32 = 60.0;
const FOOTER_Y: f32 = 32.0;
const LINE_FACTOR: f32 = 1.35;

/// Helvetica advance widths (1/1000 em) for printable ASCII, from the AFM metrics
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' ' to '/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // digits
    278, 278, 584, 584, 584, 556, 1015, // ':' to '@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A-M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N-Z
    278, 278, 278, 469, 556, 333, // '[' to '`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a-m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n-z
    334, 260, 334, 584, // '{' to '~'
];

fn base_letter(c: char) -> char {
    match c {
        'à' | 'â' | 'ä' | 'á' | 'ã' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'î' | 'ï' | 'í' => 'i',
        'ô' | 'ö' | 'ó' | 'õ' => 'o',
        'ù' | 'û' | 'ü' | 'ú' => 'u',
        'ç' => 'c',
        'ÿ' => 'y',
        'À' | 'Â' | 'Ä' | 'Á' => 'A',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'Î' | 'Ï' => 'I',
        'Ô' | 'Ö' => 'O',
        'Ù' | 'Û' | 'Ü' => 'U',
        'Ç' => 'C',
        other => other,
    }
}

/// Rendered width of `text` in points
pub fn text_width(text: &str, font: Font, size: f32) -> f32 {
    let units: u32 = text
        .chars()
        .map(|c| {
            let c = base_letter(c);
            if (' '..='~').contains(&c) {
                HELVETICA_WIDTHS[c as usize - 32] as u32
            } else {
                556
            }
        })
        .sum();
    // Bold glyphs run about 6% wider; close enough for line breaking
    let factor = if font == Font::Bold { 1.06 } else { 1.0 };
    units as f32 * size / 1000.0 * factor
}

/// Greedy word wrap; words longer than a line are hard-split
pub fn wrap_text(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() { word.to_string() } else { format!("{} {}", current, word) };
            if text_width(&candidate, font, size) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if text_width(word, font, size) <= max_width {
                current = word.to_string();
            } else {
                for c in word.chars() {
                    current.push(c);
                    if text_width(&current, font, size) > max_width {
                        current.pop();
                        lines.push(std::mem::replace(&mut current, c.to_string()));
                    }
                }
            }
        }
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[derive(Debug, Clone, Copy)]
pub struct TextStyle {
    pub font: Font,
    pub size: f32,
    pub indent: f32,
}

impl TextStyle {
    pub const TITLE: TextStyle = TextStyle { font: Font::Bold, size: 18.0, indent: 0.0 };
    pub const HEADING: TextStyle = TextStyle { font: Font::Bold, size: 13.0, indent: 0.0 };
    pub const BODY: TextStyle = TextStyle { font: Font::Regular, size: 10.5, indent: 0.0 };
    pub const NOTE: TextStyle = TextStyle { font: Font::Oblique, size: 9.5, indent: 0.0 };

    pub fn indented(self, indent: f32) -> Self {
        Self { indent, ..self }
    }

    fn leading(&self) -> f32 {
        self.size * LINE_FACTOR
    }
}

/// Accumulates pages while text flows top to bottom
pub struct DocumentBuilder {
    info: DocumentInfo,
    footer_label: String,
    pages: Vec<PageContent>,
    cursor_y: f32,
}

impl DocumentBuilder {
    pub fn new(info: DocumentInfo, footer_label: impl Into<String>) -> Self {
        Self {
            info,
            footer_label: footer_label.into(),
            pages: vec![PageContent::default()],
            cursor_y: A4_HEIGHT - MARGIN_TOP,
        }
    }

    fn content_width() -> f32 {
        A4_WIDTH - 2.0 * MARGIN_X
    }

    fn full_page_height() -> f32 {
        A4_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM
    }

    pub fn remaining(&self) -> f32 {
        self.cursor_y - MARGIN_BOTTOM
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn new_page(&mut self) {
        self.pages.push(PageContent::default());
        self.cursor_y = A4_HEIGHT - MARGIN_TOP;
    }

    /// Start a new page unless `height` points still fit on this one
    pub fn ensure_space(&mut self, height: f32) {
        if height > self.remaining() && self.cursor_y < A4_HEIGHT - MARGIN_TOP {
            self.new_page();
        }
    }

    fn current(&mut self) -> &mut PageContent {
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn place_line(&mut self, line: String, style: TextStyle) {
        self.cursor_y -= style.size;
        let y = self.cursor_y;
        self.current().ops.push(DrawOp::Text {
            x: MARGIN_X + style.indent,
            y,
            font: style.font,
            size: style.size,
            text: line,
        });
        self.cursor_y -= style.leading() - style.size;
    }

    /// Wrapped text block, kept on one page whenever it fits on one
    pub fn paragraph(&mut self, text: &str, style: TextStyle) {
        let lines = wrap_text(text, style.font, style.size, Self::content_width() - style.indent);
        let height = lines.len() as f32 * style.leading();

        if height <= Self::full_page_height() {
            self.ensure_space(height);
            for line in lines {
                self.place_line(line, style);
            }
        } else {
            for line in lines {
                self.ensure_space(style.leading());
                self.place_line(line, style);
            }
        }
    }

    /// Section heading that never ends a page on its own
    pub fn heading(&mut self, text: &str) {
        let style = TextStyle::HEADING;
        self.ensure_space(style.leading() + TextStyle::BODY.leading() + 8.0);
        self.spacer(8.0);
        self.paragraph(text, style);
        self.rule();
    }

    pub fn title(&mut self, text: &str) {
        self.paragraph(text, TextStyle::TITLE);
        self.spacer(4.0);
    }

    /// `Label : value` on one wrapped block
    pub fn field(&mut self, label: &str, value: &str) {
        self.paragraph(&format!("{} : {}", label, value), TextStyle::BODY);
    }

    pub fn bullet(&mut self, text: &str) {
        self.paragraph(&format!("• {}", text), TextStyle::BODY.indented(12.0));
    }

    pub fn spacer(&mut self, height: f32) {
        if height >= self.remaining() {
            self.new_page();
        } else {
            self.cursor_y -= height;
        }
    }

    pub fn rule(&mut self) {
        let y = self.cursor_y + 2.0;
        self.current().ops.push(DrawOp::Rule {
            x1: MARGIN_X,
            y1: y,
            x2: A4_WIDTH - MARGIN_X,
            y2: y,
            width: 0.5,
        });
        self.cursor_y -= 4.0;
    }

    /// Stamp `label ... Page n / N` footers and serialise
    pub fn finish(mut self) -> Vec<u8> {
        let total = self.pages.len();
        let size = 8.5;
        for (i, page) in self.pages.iter_mut().enumerate() {
            let numbering = format!("Page {} / {}", i + 1, total);
            let width = text_width(&numbering, Font::Regular, size);
            page.ops.push(DrawOp::Rule {
                x1: MARGIN_X,
                y1: FOOTER_Y + 12.0,
                x2: A4_WIDTH - MARGIN_X,
                y2: FOOTER_Y + 12.0,
                width: 0.3,
            });
            page.ops.push(DrawOp::Text {
                x: MARGIN_X,
                y: FOOTER_Y,
                font: Font::Regular,
                size,
                text: self.footer_label.clone(),
            });
            page.ops.push(DrawOp::Text {
                x: A4_WIDTH - MARGIN_X - width,
                y: FOOTER_Y,
                font: Font::Regular,
                size,
                text: numbering,
            });
        }
        write_document(&self.info, &self.pages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> DocumentBuilder {
        DocumentBuilder::new(DocumentInfo { title: "t".into(), author: "a".into() }, "footer")
    }

    #[test]
    fn wraps_on_word_boundaries() {
        let lines = wrap_text("un deux trois quatre cinq six", Font::Regular, 10.0, 60.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, Font::Regular, 10.0) <= 60.0);
            assert!(!line.starts_with(' '));
        }
        assert_eq!(lines.join(" "), "un deux trois quatre cinq six");
    }

    #[test]
    fn hard_splits_overlong_words() {
        let word = "x".repeat(200);
        let lines = wrap_text(&word, Font::Regular, 10.0, 100.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), word);
    }

    #[test]
    fn block_that_does_not_fit_moves_to_next_page() {
        let mut doc = builder();
        while doc.remaining() > 30.0 {
            doc.paragraph("ligne", TextStyle::BODY);
        }
        assert_eq!(doc.page_count(), 1);

        // Three lines need ~42pt, more than what is left
        doc.paragraph("a\nb\nc", TextStyle::BODY);
        assert_eq!(doc.page_count(), 2);
        let moved = doc.pages[1].ops.iter().filter(|op| matches!(op, DrawOp::Text { .. })).count();
        assert_eq!(moved, 3);
    }

    #[test]
    fn footers_number_every_page() {
        let mut doc = builder();
        for _ in 0..120 {
            doc.paragraph("Point abordé pendant la séance.", TextStyle::BODY);
        }
        let pages = doc.page_count();
        assert!(pages >= 2);
        let bytes = doc.finish();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains(&format!("(Page 1 / {})", pages)));
        assert!(text.contains(&format!("(Page {} / {})", pages, pages)));
    }
}
