// pdfium-render によるページのラスタライズ（メモリ上のみ）

use image::RgbImage;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use tracing::debug;

use crate::error::ExcerptError;
use crate::render::PageRasterizer;

/// Resolves the path to the pdfium shared library.
///
/// Search order:
/// 1. `PDFIUM_DYNAMIC_LIB_PATH` environment variable
/// 2. `vendor/pdfium/lib/` relative to the project root (for development)
fn resolve_pdfium_lib_path() -> crate::error::Result<PathBuf> {
    if let Ok(path) = std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
        let p = PathBuf::from(&path);
        if p.exists() {
            return Ok(p);
        }
        return Err(ExcerptError::render(format!(
            "PDFIUM_DYNAMIC_LIB_PATH is set to '{path}' but the path does not exist"
        )));
    }

    if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
        let vendor_path = PathBuf::from(&manifest_dir).join("vendor/pdfium/lib");
        if vendor_path.exists() {
            return Ok(vendor_path);
        }
    }

    Err(ExcerptError::render(
        "pdfium library not found: set PDFIUM_DYNAMIC_LIB_PATH or place libpdfium.so in vendor/pdfium/lib/",
    ))
}

/// [`PageRasterizer`] backed by a dynamically loaded pdfium.
pub struct PdfiumRasterizer {
    pdfium: Pdfium,
}

impl PdfiumRasterizer {
    pub fn new() -> crate::error::Result<Self> {
        let lib_path = resolve_pdfium_lib_path()?;
        let lib_path_str = lib_path
            .to_str()
            .ok_or_else(|| ExcerptError::render("pdfium library path contains non-UTF-8 characters"))?;
        let bindings =
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(lib_path_str))?;
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }
}

impl PageRasterizer for PdfiumRasterizer {
    fn rasterize(
        &self,
        pdf_bytes: &[u8],
        page_num: u32,
        scale: f32,
    ) -> crate::error::Result<RgbImage> {
        if scale.is_nan() || scale <= 0.0 {
            return Err(ExcerptError::render(format!("invalid raster scale {scale}")));
        }

        let document = self.pdfium.load_pdf_from_byte_slice(pdf_bytes, None)?;

        let index = page_num
            .checked_sub(1)
            .and_then(|i| u16::try_from(i).ok())
            .ok_or(ExcerptError::MissingPage(page_num))?;
        let page = document
            .pages()
            .get(index)
            .map_err(|_| ExcerptError::MissingPage(page_num))?;

        let width_px = (page.width().value * scale).round().max(1.0) as i32;
        let height_px = (page.height().value * scale).round().max(1.0) as i32;

        let config = PdfRenderConfig::new()
            .set_target_width(width_px)
            .set_target_height(height_px);

        let bitmap = page.render_with_config(&config)?;
        debug!(page_num, width_px, height_px, "rasterized page");
        Ok(bitmap.as_image().to_rgb8())
    }
}
