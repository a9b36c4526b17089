//! # PDF Backend Tests
//!
//! Covers the `pdf`-crate half of the backend. Rasterizing needs the PDFium
//! shared library and is exercised only when `PDFIUM_LIBRARY_PATH` is set.

use anyhow::Result;
use docfield::{DocfieldError, PageRenderer};
use docfield_pdf::{count_pages, extract_page_text, PdfError, PdfiumRenderer};
use docfield_test_utils::helpers::generate_test_pdf;

#[test]
fn test_counts_pages_of_generated_pdf() -> Result<()> {
    let pdf = generate_test_pdf(&["Invoice INV-2024-001", "Date 2024-01-15", "Total 1250.50"])?;
    assert_eq!(count_pages(&pdf)?, 3);
    Ok(())
}

#[test]
fn test_extracts_text_only_for_pages_in_range() -> Result<()> {
    let pdf = generate_test_pdf(&["The magic number is 42.", "Second page"])?;

    assert!(extract_page_text(&pdf, 1)?.is_some());
    assert!(matches!(
        extract_page_text(&pdf, 0),
        Err(PdfError::PageOutOfRange { page: 0, total_pages: 2 })
    ));
    assert!(matches!(
        extract_page_text(&pdf, 3),
        Err(PdfError::PageOutOfRange { page: 3, total_pages: 2 })
    ));
    Ok(())
}

#[test]
fn test_garbage_is_a_parse_error() {
    let err = count_pages(b"%PDF-1.7\nthis is not a real pdf").unwrap_err();
    assert!(matches!(err, PdfError::Parse(_)));
    assert!(matches!(
        DocfieldError::from(err),
        DocfieldError::RenderFailure(_)
    ));
}

#[tokio::test]
async fn test_renderer_counts_pages_without_pdfium() -> Result<()> {
    let pdf = generate_test_pdf(&["one", "two"])?;
    let renderer = PdfiumRenderer::default();
    assert_eq!(renderer.page_count(&pdf).await?, 2);
    Ok(())
}

#[tokio::test]
async fn test_renders_png_when_pdfium_is_available() -> Result<()> {
    let Ok(library_path) = std::env::var("PDFIUM_LIBRARY_PATH") else {
        eprintln!("PDFIUM_LIBRARY_PATH not set; skipping rasterizing test.");
        return Ok(());
    };
    let pdf = generate_test_pdf(&["Invoice INV-2024-001"])?;
    let renderer = PdfiumRenderer::new(Some(library_path.into()), 1.0);

    let image = renderer.render_page(&pdf, 1).await?;
    assert!(image.png.starts_with(&[0x89, b'P', b'N', b'G']));
    // A4 is 595 x 842 points.
    assert!((590..=600).contains(&image.width));

    let err = renderer.render_page(&pdf, 2).await.unwrap_err();
    assert!(matches!(err, DocfieldError::PageOutOfRange { page: 2, total_pages: 1 }));
    Ok(())
}
