use image::RgbImage;
use image::imageops;

use super::encode::{CropEncoding, encode_rgb};
use crate::error::ExcerptError;
use crate::region::RectAnnotation;

/// ラスタ上の切り抜き範囲（ピクセル、原点は左上）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// 注釈のバウンディングボックスをラスタ寸法でスケールしたピクセル範囲を返す。
///
/// 各辺は最寄りのピクセル境界に丸め、ラスタ内に収める。
/// 幅・高さが0になる場合でも最低1ピクセルを確保する。
pub fn pixel_rect(
    annotation: &RectAnnotation,
    raster_width: u32,
    raster_height: u32,
) -> crate::error::Result<PixelRect> {
    if raster_width == 0 || raster_height == 0 {
        return Err(ExcerptError::encode(format!(
            "cannot crop from an empty raster ({}x{})",
            raster_width, raster_height
        )));
    }

    let a = annotation.normalized();
    let (left, right) = scale_span(a.x1, a.x2, raster_width);
    let (top, bottom) = scale_span(a.y1, a.y2, raster_height);

    Ok(PixelRect {
        x: left,
        y: top,
        width: right - left,
        height: bottom - top,
    })
}

/// [lo, hi] の比率区間を [0, extent] のピクセル区間に変換する（幅 >= 1）。
fn scale_span(lo: f64, hi: f64, extent: u32) -> (u32, u32) {
    let max = extent as f64;
    let start = (lo * max).round().clamp(0.0, max - 1.0) as u32;
    let end = (hi * max).round().clamp(0.0, max) as u32;
    (start, end.max(start + 1))
}

/// ラスタから注釈部分を切り抜き、圧縮画像を返す。
pub fn extract_crop(
    raster: &RgbImage,
    annotation: &RectAnnotation,
    encoding: CropEncoding,
) -> crate::error::Result<Vec<u8>> {
    let rect = pixel_rect(annotation, raster.width(), raster.height())?;
    let cropped = imageops::crop_imm(raster, rect.x, rect.y, rect.width, rect.height).to_image();
    encode_rgb(&cropped, encoding)
}
