//! Shared test fixtures: a PDFium-free renderer and canned model replies.

use async_trait::async_trait;
use docfield::{DocfieldError, PageImage, PageRenderer};
use serde_json::{json, Value};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

// --- Fake Renderer ---

/// Counts pages and reads text with the real `pdf` parser, but "renders" page
/// `n` as the bytes `page-n` so tests can run without the PDFium library.
#[derive(Clone, Debug, Default)]
pub struct FakeRenderer {
    render_calls: Arc<AtomicUsize>,
}

impl FakeRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many pages have been rendered so far.
    pub fn renders(&self) -> usize {
        self.render_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageRenderer for FakeRenderer {
    async fn page_count(&self, pdf_data: &[u8]) -> Result<u32, DocfieldError> {
        Ok(docfield_pdf::count_pages(pdf_data)?)
    }

    async fn render_page(
        &self,
        pdf_data: &[u8],
        page_number: u32,
    ) -> Result<PageImage, DocfieldError> {
        let total_pages = self.page_count(pdf_data).await?;
        if page_number == 0 || page_number > total_pages {
            return Err(DocfieldError::PageOutOfRange {
                page: page_number,
                total_pages,
            });
        }
        self.render_calls.fetch_add(1, Ordering::SeqCst);
        Ok(PageImage {
            png: format!("page-{page_number}").into_bytes(),
            width: 1190,
            height: 1684,
        })
    }

    async fn page_text(
        &self,
        pdf_data: &[u8],
        page_number: u32,
    ) -> Result<Option<String>, DocfieldError> {
        Ok(docfield_pdf::extract_page_text(pdf_data, page_number)?)
    }
}

// --- Canned Model Replies ---

/// Wraps `content` in an OpenAI chat completions response envelope.
pub fn chat_completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

/// A field extraction reply in which every field is found with the given value and confidence.
pub fn fields_reply(fields: &[(&str, &str, f64)]) -> String {
    let entries: serde_json::Map<String, Value> = fields
        .iter()
        .map(|(name, value, confidence)| {
            (
                name.to_string(),
                json!({ "value": value, "confidence": confidence }),
            )
        })
        .collect();
    Value::Object(entries).to_string()
}

// --- Test-Specific Helpers ---
#[cfg(feature = "pdf")]
pub mod helpers {
    use anyhow::Result;
    use printpdf::{
        BuiltinFont, Layer, Mm, Op, ParsedFont, PdfDocument, PdfPage, PdfSaveOptions, Pt, TextItem,
        TextMatrix, TextRenderingMode,
    };

    /// Generates an A4 PDF with one page per entry of `pages`, each carrying that text.
    pub fn generate_test_pdf(pages: &[&str]) -> Result<Vec<u8>> {
        let mut doc = PdfDocument::new("Test PDF");
        let layer_id = doc.add_layer(&Layer::new("Layer 1"));

        let font_bytes = BuiltinFont::Helvetica.get_subset_font().bytes;
        let font = ParsedFont::from_bytes(&font_bytes, 0, &mut Vec::new())
            .ok_or_else(|| anyhow::anyhow!("Failed to parse built-in font"))?;
        let font_id = doc.add_font(&font);

        for text in pages {
            let mut page = PdfPage::new(Mm(210.0), Mm(297.0), vec![]);
            page.ops = vec![
                Op::BeginLayer {
                    layer_id: layer_id.clone(),
                },
                Op::SetFontSize {
                    size: Pt(12.0),
                    font: font_id.clone(),
                },
                Op::StartTextSection,
                Op::SetTextMatrix {
                    matrix: TextMatrix::Translate(Mm(10.0).into(), Mm(280.0).into()),
                },
                Op::SetTextRenderingMode {
                    mode: TextRenderingMode::Fill,
                },
                Op::WriteText {
                    items: vec![TextItem::Text(text.to_string())],
                    font: font_id.clone(),
                },
                Op::EndTextSection,
                Op::EndLayer {
                    layer_id: layer_id.clone(),
                },
            ];
            doc.pages.push(page);
        }

        let mut warnings = Vec::new();
        let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            eprintln!("PDF generation warnings: {warnings:?}");
        }

        Ok(bytes)
    }
}
