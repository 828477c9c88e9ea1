// image crate: cropped RGB -> JPEG / PNG bytes

use crate::error::ExcerptError;
use image::RgbImage;
use serde::Deserialize;
use std::io::Cursor;

/// 切り抜き画像の圧縮形式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormatSetting {
    #[default]
    Jpeg,
    Png,
}

/// 圧縮形式と品質の組。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropEncoding {
    Jpeg { quality: u8 },
    Png,
}

impl CropEncoding {
    pub fn from_setting(format: ImageFormatSetting, jpeg_quality: u8) -> Self {
        match format {
            ImageFormatSetting::Jpeg => CropEncoding::Jpeg {
                quality: jpeg_quality,
            },
            ImageFormatSetting::Png => CropEncoding::Png,
        }
    }
}

/// Encode an RGB image with the given encoding.
///
/// The output never carries an alpha channel.
pub fn encode_rgb(rgb: &RgbImage, encoding: CropEncoding) -> crate::error::Result<Vec<u8>> {
    match encoding {
        CropEncoding::Jpeg { quality } => encode_rgb_to_jpeg(rgb, quality),
        CropEncoding::Png => encode_rgb_to_png(rgb),
    }
}

/// Encode an RGB image to JPEG bytes at the given quality (1-100).
pub fn encode_rgb_to_jpeg(rgb: &RgbImage, quality: u8) -> crate::error::Result<Vec<u8>> {
    if !(1..=100).contains(&quality) {
        return Err(ExcerptError::encode(format!(
            "JPEG quality must be 1-100, got {}",
            quality
        )));
    }

    let mut buf = Cursor::new(Vec::new());
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
    rgb.write_with_encoder(encoder)?;

    Ok(buf.into_inner())
}

pub fn encode_rgb_to_png(rgb: &RgbImage) -> crate::error::Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    rgb.write_with_encoder(encoder)?;

    Ok(buf.into_inner())
}
