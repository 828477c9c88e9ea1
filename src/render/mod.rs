#[cfg(feature = "pdfium")]
pub mod pdfium;

use image::RgbImage;

/// Renders one page of a PDF into an RGB raster.
pub trait PageRasterizer {
    /// `page_num` is 1-based. `scale` is pixels per PDF point.
    fn rasterize(&self, pdf_bytes: &[u8], page_num: u32, scale: f32)
    -> crate::error::Result<RgbImage>;
}

/// The rasterizer compiled into this build.
#[cfg(feature = "pdfium")]
pub fn default_rasterizer() -> crate::error::Result<Box<dyn PageRasterizer>> {
    Ok(Box::new(pdfium::PdfiumRasterizer::new()?))
}

#[cfg(not(feature = "pdfium"))]
pub fn default_rasterizer() -> crate::error::Result<Box<dyn PageRasterizer>> {
    Err(crate::error::ExcerptError::render(
        "built without the `pdfium` feature: no page rasterizer available",
    ))
}
