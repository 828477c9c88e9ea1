use serde::Serialize;

use crate::geometry::{Rect, Rgb};
use crate::pdf::surface::{DrawingSurface, TextStyle};
use crate::region::RectLocation;

/// 番号ボックスの描画設定。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StampStyle {
    /// フォントサイズ上限（ページ高さに対する比率）
    pub height_cap: f64,
    /// フォントサイズ上限（ページ幅に対する比率）。`None` なら幅による制限なし
    pub width_cap: Option<f64>,
    pub fill: Rgb,
    pub text_color: Rgb,
}

impl Default for StampStyle {
    fn default() -> Self {
        Self {
            height_cap: 0.04,
            width_cap: Some(0.04),
            fill: Rgb::gray(0.3),
            text_color: Rgb::gray(0.9),
        }
    }
}

/// ボックス高さの8割（整数に丸める）を、ページ寸法の上限で抑える。
pub fn stamp_font_size(box_height: f64, page_width: f64, page_height: f64, style: &StampStyle) -> f64 {
    let size = (box_height * 0.8)
        .round()
        .min(style.height_cap * page_height);
    match style.width_cap {
        Some(cap) => size.min(cap * page_width),
        None => size,
    }
}

/// 描画したスタンプの記録。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StampRecord {
    pub page: u32,
    pub label: String,
    pub rect: Rect,
    pub font_size: f64,
    pub text_origin: (f64, f64),
}

/// 元ページ上の領域を塗りつぶし、中央にラベルを描く。
#[allow(clippy::too_many_arguments)]
pub fn paint_stamp<S: DrawingSurface>(
    surface: &mut S,
    page: S::Page,
    page_num: u32,
    font: &S::Font,
    location: &RectLocation,
    label: &str,
    style: &StampStyle,
) -> crate::error::Result<StampRecord> {
    let (page_width, page_height) = surface.page_dimensions(page)?;

    let x = location.x * page_width;
    let top = location.y * page_height;
    let w = location.w * page_width;
    let h = location.h * page_height;
    let rect = Rect::new(x, top - h, w, h);

    surface.draw_filled_rect(page, rect, style.fill)?;

    let font_size = stamp_font_size(h, page_width, page_height, style);
    let extent = surface.measure_text(font, font_size, label);
    let text_origin = (x + (w - extent.width) / 2.0, top - (h + extent.height) / 2.0);

    // 0.625pt未満のボックスではサイズが0に丸まる
    if font_size > 0.0 {
        surface.draw_text(
            page,
            font,
            label,
            text_origin,
            TextStyle {
                size: font_size,
                color: style.text_color,
            },
        )?;
    }

    Ok(StampRecord {
        page: page_num,
        label: label.to_string(),
        rect,
        font_size,
        text_origin,
    })
}
