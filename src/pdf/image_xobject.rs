// 切り抜き画像（JPEG/PNG）から画像XObjectストリームを構築する

use std::io::{Cursor, Write};

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::{ColorType, ImageDecoder, ImageFormat};
use lopdf::{Stream, dictionary};

use crate::error::ExcerptError;

/// 埋込用に変換済みの画像XObject。
#[derive(Debug)]
pub struct ImageXObject {
    pub stream: Stream,
    pub width: u32,
    pub height: u32,
}

/// バイト列の先頭から形式を判定する。JPEG/PNG 以外はエラー。
pub fn sniff_format(bytes: &[u8]) -> crate::error::Result<ImageFormat> {
    match image::guess_format(bytes) {
        Ok(format @ (ImageFormat::Jpeg | ImageFormat::Png)) => Ok(format),
        Ok(other) => Err(ExcerptError::unsupported_image_format(format!("{other:?}"))),
        Err(_) => Err(ExcerptError::unsupported_image_format(
            "unrecognized image data",
        )),
    }
}

/// JPEG/PNG のバイト列から画像XObjectを作る。
///
/// - JPEG: そのまま DCTDecode ストリームとして格納
/// - PNG: デコードしてアルファを捨て、RGB を FlateDecode で格納
pub fn build_image_xobject(bytes: &[u8]) -> crate::error::Result<ImageXObject> {
    match sniff_format(bytes)? {
        ImageFormat::Jpeg => jpeg_xobject(bytes),
        _ => png_xobject(bytes),
    }
}

fn jpeg_xobject(bytes: &[u8]) -> crate::error::Result<ImageXObject> {
    let decoder = image::codecs::jpeg::JpegDecoder::new(Cursor::new(bytes))
        .map_err(|e| ExcerptError::pdf_write(format!("JPEG header error: {e}")))?;
    let (width, height) = decoder.dimensions();
    let color_space = match decoder.color_type() {
        ColorType::L8 | ColorType::L16 => "DeviceGray",
        _ => "DeviceRGB",
    };

    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => color_space,
        "BitsPerComponent" => 8,
        "Filter" => "DCTDecode",
    };
    Ok(ImageXObject {
        stream: Stream::new(dict, bytes.to_vec()),
        width,
        height,
    })
}

fn png_xobject(bytes: &[u8]) -> crate::error::Result<ImageXObject> {
    let decoded = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(|e| ExcerptError::pdf_write(format!("PNG decode error: {e}")))?;
    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(rgb.as_raw())?;
    let compressed = encoder.finish()?;

    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
        "Filter" => "FlateDecode",
    };
    Ok(ImageXObject {
        stream: Stream::new(dict, compressed),
        width,
        height,
    })
}
