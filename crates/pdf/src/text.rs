//! Page counting and embedded text via the `pdf` crate.

use crate::{page_index, PdfError};
use pdf::{
    content::{Op, TextDrawAdjusted},
    file::FileOptions,
};

/// Counts the pages of a PDF without rendering anything.
pub fn count_pages(pdf_data: &[u8]) -> Result<u32, PdfError> {
    let file = FileOptions::cached()
        .load(pdf_data)
        .map_err(|e| PdfError::Parse(e.to_string()))?;
    Ok(file.num_pages())
}

/// Collects the text drawn on one 1-indexed page.
///
/// Returns `None` for pages without a text layer, such as scans.
pub fn extract_page_text(pdf_data: &[u8], page_number: u32) -> Result<Option<String>, PdfError> {
    let file = FileOptions::cached()
        .load(pdf_data)
        .map_err(|e| PdfError::Parse(e.to_string()))?;
    let index = page_index(page_number, file.num_pages())?;
    let resolver = file.resolver();

    let page = file
        .get_page(index)
        .map_err(|e| PdfError::Parse(e.to_string()))?;
    let mut text = String::new();

    if let Some(content) = &page.contents {
        let operations = content
            .operations(&resolver)
            .map_err(|e| PdfError::Parse(e.to_string()))?;
        for op in operations.iter() {
            match op {
                Op::TextDraw { text: drawn } => text.push_str(&drawn.to_string_lossy()),
                Op::TextDrawAdjusted { array } => {
                    for item in array {
                        if let TextDrawAdjusted::Text(drawn) = item {
                            text.push_str(&drawn.to_string_lossy());
                        }
                    }
                }
                Op::TextNewline | Op::EndText => {
                    if !text.ends_with('\n') && !text.is_empty() {
                        text.push('\n');
                    }
                }
                _ => {}
            }
        }
    }

    let text = text.trim();
    Ok((!text.is_empty()).then(|| text.to_string()))
}
