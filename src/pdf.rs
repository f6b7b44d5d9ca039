//! Low-level PDF helpers: string encoding for the standard fonts and a
//! structural check of finished documents.

use regex::Regex;
use std::sync::OnceLock;

// --- Font encoding ---

/// Encode one character as a WinAnsiEncoding byte.
///
/// Printable ASCII and the Latin-1 upper half map to themselves; the
/// 0x80..0x9F block holds the typographic extras (euro, dashes, quotes).
pub fn winansi_encode(c: char) -> Option<u8> {
    let byte = match c {
        ' '..='~' => c as u8,
        '\u{A0}'..='\u{FF}' => c as u32 as u8,
        '\u{20AC}' => 0x80, // Euro sign
        '\u{201A}' => 0x82, // Single low-9 quotation mark
        '\u{0192}' => 0x83, // Latin small f with hook
        '\u{201E}' => 0x84, // Double low-9 quotation mark
        '\u{2026}' => 0x85, // Horizontal ellipsis
        '\u{2020}' => 0x86, // Dagger
        '\u{2021}' => 0x87, // Double dagger
        '\u{02C6}' => 0x88, // Modifier letter circumflex accent
        '\u{2030}' => 0x89, // Per mille sign
        '\u{0160}' => 0x8A, // Latin capital S with caron
        '\u{2039}' => 0x8B, // Single left-pointing angle quotation
        '\u{0152}' => 0x8C, // Latin capital ligature OE
        '\u{017D}' => 0x8E, // Latin capital Z with caron
        '\u{2018}' => 0x91, // Left single quotation mark
        '\u{2019}' => 0x92, // Right single quotation mark
        '\u{201C}' => 0x93, // Left double quotation mark
        '\u{201D}' => 0x94, // Right double quotation mark
        '\u{2022}' => 0x95, // Bullet
        '\u{2013}' => 0x96, // En dash
        '\u{2014}' => 0x97, // Em dash
        '\u{02DC}' => 0x98, // Small tilde
        '\u{2122}' => 0x99, // Trade mark sign
        '\u{0161}' => 0x9A, // Latin small s with caron
        '\u{203A}' => 0x9B, // Single right-pointing angle quotation
        '\u{0153}' => 0x9C, // Latin small ligature oe
        '\u{017E}' => 0x9E, // Latin small z with caron
        '\u{0178}' => 0x9F, // Latin capital Y with diaeresis
        _ => return None,
    };
    Some(byte)
}

/// Encode `text` as the body of a PDF literal string `( ... )`.
///
/// Returns the first character that has no WinAnsi code.
pub fn encode_pdf_string(text: &str) -> Result<Vec<u8>, char> {
    let mut out = Vec::with_capacity(text.len() + 8);
    for c in text.chars() {
        let b = winansi_encode(c).ok_or(c)?;
        match b {
            b'\\' | b'(' | b')' => {
                out.push(b'\\');
                out.push(b);
            }
            0x80..=0xFF => out.extend_from_slice(format!("\\{:03o}", b).as_bytes()),
            _ => out.push(b),
        }
    }
    Ok(out)
}

// --- Structural validation ---

/// Validation result for PDF structural checks
#[derive(Debug, Clone)]
pub struct PdfValidation {
    pub valid: bool,
    pub errors: Vec<String>,
    pub page_count: usize,
    pub object_count: usize,
}

fn stream_start_re() -> &'static regex::bytes::Regex {
    static RE: OnceLock<regex::bytes::Regex> = OnceLock::new();
    RE.get_or_init(|| {
        regex::bytes::Regex::new(r"/Length\s+(\d+)\s*>>\s*stream\r?\n")
            .expect("stream pattern is valid")
    })
}

fn page_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // "/Type /Page" but not "/Type /Pages"
    RE.get_or_init(|| Regex::new(r"/Type\s*/Page\b").expect("page pattern is valid"))
}

fn obj_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\d+\s+\d+\s+obj\b").expect("obj pattern is valid"))
}

fn root_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/Root\s+\d+\s+\d+\s+R").expect("root pattern is valid"))
}

/// Copy of `data` with every stream body cut out, keeping the `stream` and
/// `endstream` keywords. Bodies are skipped by their declared `/Length`.
fn strip_stream_bodies(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut pos = 0;
    while let Some(caps) = stream_start_re().captures_at(data, pos) {
        let body_start = caps.get(0).map_or(pos, |m| m.end());
        let length = std::str::from_utf8(&caps[1])
            .ok()
            .and_then(|n| n.parse::<usize>().ok())
            .unwrap_or(0);
        out.extend_from_slice(&data[pos..body_start]);
        pos = body_start.saturating_add(length).min(data.len());
    }
    out.extend_from_slice(&data[pos..]);
    out
}

/// Check header, trailer, catalog and page tree of a finished PDF.
///
/// Stream contents are not inspected, so drawn text never affects the result.
pub fn validate_pdf_bytes(data: &[u8]) -> PdfValidation {
    let mut errors = Vec::new();
    let structure = strip_stream_bodies(data);
    let content = String::from_utf8_lossy(&structure);

    if !content.starts_with("%PDF-") {
        errors.push("Missing PDF header (%PDF-x.x)".to_string());
    }

    if !content.trim_end().ends_with("%%EOF") {
        errors.push("Missing %%EOF marker at end of file".to_string());
    }

    let has_xref = content.contains("\nxref\n");
    if !has_xref {
        errors.push("Missing xref table".to_string());
    }
    if !content.contains("startxref") {
        errors.push("Missing startxref pointer".to_string());
    }
    if has_xref && !content.contains("trailer") {
        errors.push("Missing trailer dictionary".to_string());
    }

    if !content.contains("/Type /Catalog") {
        errors.push("Missing document catalog (/Type /Catalog)".to_string());
    }
    if !content.contains("/Type /Pages") {
        errors.push("Missing pages tree (/Type /Pages)".to_string());
    }

    let page_count = page_re().find_iter(&content).count();
    if page_count == 0 {
        errors.push("No page objects found (/Type /Page)".to_string());
    }

    let object_count = obj_re().find_iter(&content).count();
    let endobj_count = content.matches("endobj").count();
    if object_count == 0 {
        errors.push("No PDF objects found".to_string());
    } else if object_count != endobj_count {
        errors.push(format!(
            "Object/endobj mismatch: {} obj vs {} endobj",
            object_count, endobj_count
        ));
    }

    let stream_count = content.matches("\nstream\n").count();
    let endstream_count = content.matches("endstream").count();
    if stream_count != endstream_count {
        errors.push(format!(
            "Stream/endstream mismatch: {} stream vs {} endstream",
            stream_count, endstream_count
        ));
    }

    if !root_re().is_match(&content) {
        errors.push("Trailer missing /Root reference".to_string());
    }

    PdfValidation {
        valid: errors.is_empty(),
        errors,
        page_count,
        object_count,
    }
}
