use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::crop::encode::ImageFormatSetting;
use crate::error::ExcerptError;
use crate::pipeline::orchestrator::DEFAULT_WATERMARK_TEXT;

/// ラベル用フォントの指定。両方空なら Helvetica-Bold。
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FontSettings {
    /// システムフォントのファミリー名
    pub family: Option<String>,
    /// TrueTypeフォントファイル（settings.yaml からの相対パス可）
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// ラスタ化の倍率（pt あたりのピクセル数）
    pub raster_scale: f32,
    pub image_format: ImageFormatSetting,
    pub jpeg_quality: u8,
    pub margin: f64,
    pub gap: f64,
    pub label_font_size: f64,
    pub appendix_page_size: [f64; 2],
    pub stamp_height_cap: f64,
    /// `null` で幅による制限を外す
    pub stamp_width_cap: Option<f64>,
    pub watermark: bool,
    pub watermark_text: String,
    pub label_font: FontSettings,
    pub compress_streams: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            raster_scale: 3.0,
            image_format: ImageFormatSetting::Jpeg,
            jpeg_quality: 90,
            margin: 20.0,
            gap: 15.0,
            label_font_size: 16.0,
            appendix_page_size: [595.28, 841.89],
            stamp_height_cap: 0.04,
            stamp_width_cap: Some(0.04),
            watermark: false,
            watermark_text: DEFAULT_WATERMARK_TEXT.to_string(),
            label_font: FontSettings::default(),
            compress_streams: true,
        }
    }
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        let settings: Settings = serde_yml::from_str(yaml)
            .map_err(|e| ExcerptError::config(format!("Failed to parse settings YAML: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut settings = Self::from_yaml(&content)?;
        if let (Some(font_path), Some(dir)) = (&settings.label_font.path, path.parent())
            && font_path.is_relative()
        {
            settings.label_font.path = Some(dir.join(font_path));
        }
        Ok(settings)
    }

    /// 値の範囲を検証する。
    pub fn validate(&self) -> crate::error::Result<()> {
        validate_raster_scale(self.raster_scale)?;
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ExcerptError::config(format!(
                "jpeg_quality must be within 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        for (name, value) in [
            ("margin", self.margin),
            ("gap", self.gap),
            ("label_font_size", self.label_font_size),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ExcerptError::config(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        let [width, height] = self.appendix_page_size;
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(ExcerptError::config(format!(
                "appendix_page_size must be positive, got [{width}, {height}]"
            )));
        }
        if width <= 3.0 * self.margin || height <= 2.0 * self.margin {
            return Err(ExcerptError::config(format!(
                "margin {} leaves no room on a {width}x{height} appendix page",
                self.margin
            )));
        }
        validate_cap("stamp_height_cap", self.stamp_height_cap)?;
        if let Some(cap) = self.stamp_width_cap {
            validate_cap("stamp_width_cap", cap)?;
        }
        Ok(())
    }
}

pub(crate) fn validate_raster_scale(scale: f32) -> crate::error::Result<()> {
    if scale.is_finite() && scale > 0.0 {
        Ok(())
    } else {
        Err(ExcerptError::config(format!(
            "raster_scale must be a positive number, got {scale}"
        )))
    }
}

fn validate_cap(name: &str, value: f64) -> crate::error::Result<()> {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ExcerptError::config(format!(
            "{name} must be within (0, 1], got {value}"
        )))
    }
}
