//! pdfium-backed page rasterization, entirely in memory.
//!
//! The shared library is bound once per [`Rasterizer`]; a sweep over many
//! pages loads the document a single time and renders page by page.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use pdfium_render::prelude::*;

/// Locate the pdfium shared library.
///
/// `PDFIUM_DYNAMIC_LIB_PATH` takes precedence; otherwise
/// `vendor/pdfium/lib/` under the crate root is tried.
fn pdfium_lib_path() -> crate::error::Result<PathBuf> {
    if let Ok(path) = std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
        let p = PathBuf::from(&path);
        if p.exists() {
            return Ok(p);
        }
        return Err(crate::error::DelogoError::render(format!(
            "PDFIUM_DYNAMIC_LIB_PATH is set to '{path}' but the path does not exist"
        )));
    }

    if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
        let vendor = PathBuf::from(manifest_dir).join("vendor/pdfium/lib");
        if vendor.exists() {
            return Ok(vendor);
        }
    }

    Err(crate::error::DelogoError::render(
        "pdfium library not found: set PDFIUM_DYNAMIC_LIB_PATH or place libpdfium.so in vendor/pdfium/lib/",
    ))
}

/// A bound pdfium instance. Binding involves a dynamic library load, so one
/// `Rasterizer` is created per sweep and reused for every page.
pub struct Rasterizer {
    pdfium: Pdfium,
}

impl Rasterizer {
    pub fn new() -> crate::error::Result<Self> {
        let lib_path = pdfium_lib_path()?;
        let lib_path = lib_path.to_str().ok_or_else(|| {
            crate::error::DelogoError::render("pdfium library path contains non-UTF-8 characters")
        })?;
        let bindings =
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(lib_path))
                .map_err(|e| crate::error::DelogoError::render(e.to_string()))?;
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }

    /// Load a document for rendering. The handle borrows the rasterizer and
    /// is dropped before any other stage touches the file.
    pub fn load_document(&self, pdf_path: &Path) -> crate::error::Result<PdfDocument<'_>> {
        let path = pdf_path.to_str().ok_or_else(|| {
            crate::error::DelogoError::render("PDF path contains non-UTF-8 characters")
        })?;
        self.pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| crate::error::DelogoError::render(e.to_string()))
    }

    /// Render one 0-indexed page to an in-memory bitmap.
    ///
    /// The target size is derived from the page's point dimensions at `dpi`;
    /// at 72 DPI one point maps to one pixel, so match coordinates and page
    /// coordinates stay aligned without scaling.
    pub fn render_page(
        &self,
        document: &PdfDocument<'_>,
        page_index: u32,
        dpi: u32,
    ) -> crate::error::Result<DynamicImage> {
        let page_index = u16::try_from(page_index)
            .map_err(|_| crate::error::DelogoError::render("page index exceeds u16 range"))?;
        let page = document
            .pages()
            .get(page_index)
            .map_err(|e| crate::error::DelogoError::render(e.to_string()))?;

        // 1 point = 1/72 inch, so each point covers dpi/72 pixels.
        let width_px = (page.width().value * dpi as f32 / 72.0).round() as i32;
        let height_px = (page.height().value * dpi as f32 / 72.0).round() as i32;

        let config = PdfRenderConfig::new()
            .set_target_width(width_px)
            .set_target_height(height_px);

        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| crate::error::DelogoError::render(e.to_string()))?;

        Ok(bitmap.as_image())
    }
}
