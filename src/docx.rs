//! Template text extraction.
//!
//! A template is either a DOCX package or a UTF-8 plain-text file. DOCX
//! paragraphs become one line each; a table becomes one line per row with the
//! cell texts joined by [`CELL_DELIMITER`], followed by a blank line.

use crate::error::{DocfillError, Result};
use docx_rs::{
    DocumentChild, Paragraph, ParagraphChild, RunChild, Table, TableCellContent, TableChild,
    TableRowChild,
};
use tracing::debug;

/// Separator between table cells of one row
pub const CELL_DELIMITER: &str = " | ";

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Kind of template detected from its leading bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateFormat {
    Docx,
    PlainText,
}

pub fn detect_format(data: &[u8]) -> Result<TemplateFormat> {
    if data.starts_with(ZIP_MAGIC) {
        Ok(TemplateFormat::Docx)
    } else if std::str::from_utf8(data).is_ok() {
        Ok(TemplateFormat::PlainText)
    } else {
        Err(DocfillError::Document(
            "neither a DOCX package nor UTF-8 text".to_string(),
        ))
    }
}

/// Extract the textual content of a template
pub fn extract_text(data: &[u8]) -> Result<String> {
    match detect_format(data)? {
        TemplateFormat::Docx => extract_docx_text(data),
        TemplateFormat::PlainText => {
            let text = std::str::from_utf8(data)
                .map_err(|e| DocfillError::Document(e.to_string()))?;
            Ok(text.strip_prefix('\u{feff}').unwrap_or(text).to_string())
        }
    }
}

fn extract_docx_text(data: &[u8]) -> Result<String> {
    let docx = docx_rs::read_docx(data).map_err(|e| DocfillError::Document(e.to_string()))?;

    let mut lines: Vec<String> = Vec::new();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(p) => lines.push(paragraph_text(p)),
            DocumentChild::Table(t) => {
                lines.extend(table_lines(t));
                lines.push(String::new());
            }
            _ => {}
        }
    }

    debug!(lines = lines.len(), "extracted DOCX text");
    Ok(lines.join("\n"))
}

/// Text of a paragraph with all runs concatenated.
///
/// Word often splits one visible word across several runs, so a placeholder
/// only becomes matchable once the runs are joined.
fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    push_paragraph_children(&paragraph.children, &mut text);
    text
}

fn push_paragraph_children(children: &[ParagraphChild], out: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => {
                for rc in &run.children {
                    match rc {
                        RunChild::Text(t) => out.push_str(&t.text),
                        RunChild::Tab(_) => out.push('\t'),
                        RunChild::Break(_) => out.push('\n'),
                        _ => {}
                    }
                }
            }
            ParagraphChild::Hyperlink(link) => push_paragraph_children(&link.children, out),
            _ => {}
        }
    }
}

#[allow(irrefutable_let_patterns)]
fn table_lines(table: &Table) -> Vec<String> {
    let mut lines = Vec::new();
    for child in &table.rows {
        let TableChild::TableRow(row) = child else {
            continue;
        };
        let mut cells = Vec::with_capacity(row.cells.len());
        for rc in &row.cells {
            if let TableRowChild::TableCell(cell) = rc {
                let text: Vec<String> = cell
                    .children
                    .iter()
                    .filter_map(|content| match content {
                        TableCellContent::Paragraph(p) => Some(paragraph_text(p)),
                        _ => None,
                    })
                    .collect();
                cells.push(text.join(" "));
            }
        }
        lines.push(cells.join(CELL_DELIMITER));
    }
    lines
}
