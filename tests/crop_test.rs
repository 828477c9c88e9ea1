// 切り抜き（ピクセル範囲・エンコード・画像XObject）テスト

use image::{ImageFormat, Rgb, RgbImage};
use pdf_excerpt::crop::encode::{CropEncoding, ImageFormatSetting, encode_rgb};
use pdf_excerpt::crop::extract::{PixelRect, extract_crop, pixel_rect};
use pdf_excerpt::error::ExcerptError;
use pdf_excerpt::pdf::image_xobject::{build_image_xobject, sniff_format};
use pdf_excerpt::region::RectAnnotation;

/// 左半分が赤、右半分が青のラスタ。
fn two_tone_raster(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgb([255, 0, 0])
        } else {
            Rgb([0, 0, 255])
        }
    })
}

// ============================================================
// 1. ピクセル範囲
// ============================================================

#[test]
fn test_pixel_rect_scales_and_rounds() {
    let rect = pixel_rect(&RectAnnotation::new(0.1, 0.25, 0.5, 0.75), 200, 100)
        .expect("valid raster");
    assert_eq!(
        rect,
        PixelRect {
            x: 20,
            y: 25,
            width: 80,
            height: 50,
        }
    );
}

#[test]
fn test_pixel_rect_accepts_unnormalized_annotation() {
    let a = pixel_rect(&RectAnnotation::new(0.5, 0.75, 0.1, 0.25), 200, 100).expect("ok");
    let b = pixel_rect(&RectAnnotation::new(0.1, 0.25, 0.5, 0.75), 200, 100).expect("ok");
    assert_eq!(a, b);
}

#[test]
fn test_pixel_rect_never_empty() {
    let rect = pixel_rect(&RectAnnotation::new(1.0, 1.0, 1.0, 1.0), 50, 50).expect("ok");
    assert_eq!(rect.width, 1);
    assert_eq!(rect.height, 1);
    assert!(rect.x + rect.width <= 50);
    assert!(rect.y + rect.height <= 50);
}

#[test]
fn test_pixel_rect_rejects_empty_raster() {
    let result = pixel_rect(&RectAnnotation::new(0.0, 0.0, 1.0, 1.0), 0, 10);
    assert!(matches!(result, Err(ExcerptError::EncodeError(_))));
}

// ============================================================
// 2. 切り抜きとエンコード
// ============================================================

#[test]
fn test_extract_crop_png_is_exact() {
    let raster = two_tone_raster(100, 40);
    let bytes = extract_crop(
        &raster,
        &RectAnnotation::new(0.5, 0.0, 1.0, 0.5),
        CropEncoding::Png,
    )
    .expect("crop");

    assert_eq!(sniff_format(&bytes).expect("png"), ImageFormat::Png);
    let decoded = image::load_from_memory(&bytes).expect("decode").to_rgb8();
    assert_eq!(decoded.dimensions(), (50, 20));
    assert!(decoded.pixels().all(|p| *p == Rgb([0, 0, 255])));
}

#[test]
fn test_extract_crop_jpeg_dimensions() {
    let raster = two_tone_raster(120, 80);
    let bytes = extract_crop(
        &raster,
        &RectAnnotation::new(0.0, 0.0, 0.25, 0.5),
        CropEncoding::Jpeg { quality: 85 },
    )
    .expect("crop");

    assert_eq!(sniff_format(&bytes).expect("jpeg"), ImageFormat::Jpeg);
    let decoded = image::load_from_memory(&bytes).expect("decode");
    assert_eq!((decoded.width(), decoded.height()), (30, 40));
}

#[test]
fn test_jpeg_quality_out_of_range() {
    let raster = two_tone_raster(10, 10);
    let result = encode_rgb(&raster, CropEncoding::Jpeg { quality: 0 });
    assert!(result.is_err(), "quality 0 should be rejected");
}

#[test]
fn test_crop_encoding_from_setting() {
    assert_eq!(
        CropEncoding::from_setting(ImageFormatSetting::Jpeg, 70),
        CropEncoding::Jpeg { quality: 70 }
    );
    assert_eq!(
        CropEncoding::from_setting(ImageFormatSetting::Png, 70),
        CropEncoding::Png
    );
}

// ============================================================
// 3. 画像XObject
// ============================================================

#[test]
fn test_sniff_rejects_unknown_bytes() {
    let result = sniff_format(b"definitely not an image");
    assert!(matches!(result, Err(ExcerptError::UnsupportedImageFormat(_))));
}

#[test]
fn test_sniff_rejects_other_formats() {
    // GIF ヘッダ
    let result = sniff_format(b"GIF89a\x01\x00\x01\x00\x00\x00\x00");
    assert!(matches!(result, Err(ExcerptError::UnsupportedImageFormat(_))));
}

#[test]
fn test_jpeg_xobject_passthrough() {
    let raster = two_tone_raster(16, 8);
    let jpeg = encode_rgb(&raster, CropEncoding::Jpeg { quality: 90 }).expect("jpeg");
    let xobject = build_image_xobject(&jpeg).expect("xobject");

    assert_eq!((xobject.width, xobject.height), (16, 8));
    assert_eq!(xobject.stream.content, jpeg);
    let filter = xobject.stream.dict.get(b"Filter").expect("Filter");
    assert_eq!(filter.as_name().expect("name"), b"DCTDecode");
}

#[test]
fn test_png_xobject_is_flate_rgb() {
    let raster = two_tone_raster(6, 4);
    let png = encode_rgb(&raster, CropEncoding::Png).expect("png");
    let xobject = build_image_xobject(&png).expect("xobject");

    assert_eq!((xobject.width, xobject.height), (6, 4));
    let dict = &xobject.stream.dict;
    assert_eq!(
        dict.get(b"Filter").and_then(|o| o.as_name()).expect("Filter"),
        b"FlateDecode"
    );
    assert_eq!(
        dict.get(b"ColorSpace")
            .and_then(|o| o.as_name())
            .expect("ColorSpace"),
        b"DeviceRGB"
    );

    let raw = xobject.stream.decompressed_content().expect("inflate");
    assert_eq!(raw.len(), 6 * 4 * 3);
}

#[test]
fn test_build_xobject_rejects_garbage() {
    let result = build_image_xobject(b"plain text, not pixels");
    assert!(matches!(result, Err(ExcerptError::UnsupportedImageFormat(_))));
}
