//! Minimal PDF 1.4 serialisation: base-14 Helvetica fonts with
//! WinAnsiEncoding, one content stream per page, classic xref table.

use std::fmt::Write as _;

pub const A4_WIDTH: f32 = 595.28;
pub const A4_HEIGHT: f32 = 841.89;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
    Oblique,
}

impl Font {
    fn resource(&self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
            Font::Oblique => "F3",
        }
    }

    fn base_font(&self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold => "Helvetica-Bold",
            Font::Oblique => "Helvetica-Oblique",
        }
    }

    const ALL: [Font; 3] = [Font::Regular, Font::Bold, Font::Oblique];
}

/// One drawing instruction, in PDF user space (origin bottom-left)
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text { x: f32, y: f32, font: Font, size: f32, text: String },
    Rule { x1: f32, y1: f32, x2: f32, y2: f32, width: f32 },
}

#[derive(Debug, Clone, Default)]
pub struct PageContent {
    pub ops: Vec<DrawOp>,
}

#[derive(Debug, Clone, Default)]
pub struct DocumentInfo {
    pub title: String,
    pub author: String,
}

/// Character to its WinAnsi (cp1252) byte; unmappable characters become `?`
pub fn win_ansi_byte(c: char) -> u8 {
    match c {
        '\u{20}'..='\u{7e}' => c as u8,
        '\u{a0}'..='\u{ff}' => c as u32 as u8,
        '€' => 0x80,
        '‚' => 0x82,
        '„' => 0x84,
        '…' => 0x85,
        'Œ' => 0x8c,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        'œ' => 0x9c,
        'Ÿ' => 0x9f,
        '\t' => b' ',
        _ => b'?',
    }
}

/// Literal string body: WinAnsi bytes with `\`, `(` and `)` escaped
pub fn encode_text(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for c in text.chars() {
        let b = win_ansi_byte(c);
        if matches!(b, b'\\' | b'(' | b')') {
            out.push(b'\\');
        }
        out.push(b);
    }
    out
}

fn page_stream(page: &PageContent) -> Vec<u8> {
    let mut out = Vec::new();
    for op in &page.ops {
        match op {
            DrawOp::Text { x, y, font, size, text } => {
                out.extend_from_slice(
                    format!("BT /{} {:.1} Tf {:.2} {:.2} Td (", font.resource(), size, x, y).as_bytes(),
                );
                out.extend_from_slice(&encode_text(text));
                out.extend_from_slice(b") Tj ET\n");
            }
            DrawOp::Rule { x1, y1, x2, y2, width } => {
                out.extend_from_slice(
                    format!("{:.2} w {:.2} {:.2} m {:.2} {:.2} l S\n", width, x1, y1, x2, y2).as_bytes(),
                );
            }
        }
    }
    out
}

/// Serialise pages into a complete PDF file
pub fn write_document(info: &DocumentInfo, pages: &[PageContent]) -> Vec<u8> {
    // Fixed objects: 1 catalog, 2 page tree, 3 info, 4..=6 fonts; then page + content pairs
    let first_page_obj = 4 + Font::ALL.len();
    let page_ids: Vec<usize> = (0..pages.len()).map(|i| first_page_obj + i * 2).collect();

    let mut objects: Vec<Vec<u8>> = Vec::new();
    objects.push(b"<< /Type /Catalog /Pages 2 0 R >>".to_vec());

    let kids = page_ids.iter().fold(String::new(), |mut acc, id| {
        let _ = write!(acc, "{} 0 R ", id);
        acc
    });
    objects.push(format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids.trim_end(), pages.len()).into_bytes());

    let mut info_dict = b"<< /Title (".to_vec();
    info_dict.extend_from_slice(&encode_text(&info.title));
    info_dict.extend_from_slice(b") /Author (");
    info_dict.extend_from_slice(&encode_text(&info.author));
    info_dict.extend_from_slice(b") /Producer (asso-admin-api) >>");
    objects.push(info_dict);

    for font in Font::ALL {
        objects.push(
            format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                font.base_font()
            )
            .into_bytes(),
        );
    }

    let font_resources = Font::ALL
        .iter()
        .enumerate()
        .map(|(i, f)| format!("/{} {} 0 R", f.resource(), 4 + i))
        .collect::<Vec<_>>()
        .join(" ");

    for (page, page_id) in pages.iter().zip(&page_ids) {
        objects.push(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] /Resources << /Font << {} >> >> /Contents {} 0 R >>",
                A4_WIDTH,
                A4_HEIGHT,
                font_resources,
                page_id + 1
            )
            .into_bytes(),
        );
        let stream = page_stream(page);
        let mut content = format!("<< /Length {} >>\nstream\n", stream.len()).into_bytes();
        content.extend_from_slice(&stream);
        content.extend_from_slice(b"endstream");
        objects.push(content);
    }

    let mut out: Vec<u8> = b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n", i + 1).as_bytes());
        out.extend_from_slice(body);
        out.extend_from_slice(b"\nendobj\n");
    }

    let xref_offset = out.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        let _ = write!(xref, "{:010} 00000 n \n", offset);
    }
    let _ = write!(
        xref,
        "trailer\n<< /Size {} /Root 1 0 R /Info 3 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_offset
    );
    out.extend_from_slice(xref.as_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_accents_and_escapes_parentheses() {
        assert_eq!(encode_text("é"), vec![0xe9]);
        assert_eq!(encode_text("a(b)\\"), b"a\\(b\\)\\\\".to_vec());
        assert_eq!(encode_text("€ ✓"), vec![0x80, b' ', b'?']);
    }

    #[test]
    fn xref_points_at_objects() {
        let page = PageContent {
            ops: vec![DrawOp::Text { x: 50.0, y: 800.0, font: Font::Bold, size: 14.0, text: "Bonjour".into() }],
        };
        let bytes = write_document(&DocumentInfo { title: "T".into(), author: "A".into() }, &[page]);
        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(bytes.ends_with(b"%%EOF\n"));

        let marker = bytes.windows(9).rposition(|w| w == b"startxref").unwrap();
        let tail = String::from_utf8(bytes[marker..].to_vec()).unwrap();
        let startxref: usize = tail.lines().nth(1).and_then(|n| n.parse().ok()).unwrap();
        assert!(bytes[startxref..].starts_with(b"xref"));

        let xref = String::from_utf8(bytes[startxref..].to_vec()).unwrap();
        assert!(xref.contains("/Size 9"));

        // Object 1 offset from the first in-use xref entry
        let first_entry = xref.lines().nth(3).unwrap();
        let offset: usize = first_entry[..10].parse().unwrap();
        assert!(bytes[offset..].starts_with(b"1 0 obj"));
    }
}
