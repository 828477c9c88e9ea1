use tracing::debug;

use super::job::Job;
use super::settings::{FontSettings, Settings, validate_raster_scale};
use crate::crop::encode::{CropEncoding, ImageFormatSetting};
use crate::layout::{AppendixGeometry, StampStyle};
use crate::pdf::font::LabelFont;
use crate::pipeline::orchestrator::RenderSettings;

#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub raster_scale: f32,
    pub image_format: ImageFormatSetting,
    pub jpeg_quality: u8,
    pub watermark: bool,
    pub watermark_text: String,
    pub appendix: AppendixGeometry,
    pub stamp: StampStyle,
    pub label_font: FontSettings,
    pub compress_streams: bool,
}

impl MergedConfig {
    /// JobのOption値がSomeならJobの値を、NoneならSettingsの値を使用する。
    pub fn new(settings: &Settings, job: &Job) -> crate::error::Result<Self> {
        let raster_scale = job.raster_scale.unwrap_or(settings.raster_scale);
        validate_raster_scale(raster_scale)?;

        let [page_width, page_height] = settings.appendix_page_size;
        Ok(MergedConfig {
            raster_scale,
            image_format: job.image_format.unwrap_or(settings.image_format),
            jpeg_quality: settings.jpeg_quality,
            watermark: job.watermark.unwrap_or(settings.watermark),
            watermark_text: settings.watermark_text.clone(),
            appendix: AppendixGeometry {
                page_width,
                page_height,
                margin: settings.margin,
                gap: settings.gap,
                label_font_size: settings.label_font_size,
            },
            stamp: StampStyle {
                height_cap: settings.stamp_height_cap,
                width_cap: settings.stamp_width_cap,
                ..StampStyle::default()
            },
            label_font: settings.label_font.clone(),
            compress_streams: settings.compress_streams,
        })
    }

    pub fn encoding(&self) -> CropEncoding {
        CropEncoding::from_setting(self.image_format, self.jpeg_quality)
    }

    /// フォントを解決してレンダリング設定を組み立てる。
    pub fn render_settings(&self) -> crate::error::Result<RenderSettings> {
        Ok(RenderSettings {
            stamp: self.stamp,
            appendix: self.appendix,
            watermark_text: self.watermark_text.clone(),
            label_font: resolve_label_font(&self.label_font)?,
            encoding: self.encoding(),
            compress: self.compress_streams,
        })
    }
}

/// ファイル指定 > ファミリー指定 > Helvetica-Bold の順で解決する。
pub fn resolve_label_font(font: &FontSettings) -> crate::error::Result<LabelFont> {
    if let Some(path) = &font.path {
        debug!(path = %path.display(), "loading label font file");
        return LabelFont::from_file(path);
    }
    if let Some(family) = &font.family {
        debug!(family, "resolving label font family");
        return LabelFont::from_system_family(family);
    }
    Ok(LabelFont::HelveticaBold)
}
