use crate::geometry::{Rect, Rgb};
use crate::pdf::font::{LabelFont, TextExtent};

/// 埋込済み画像のネイティブピクセル寸法。
pub trait ImageSize {
    fn pixel_size(&self) -> (u32, u32);
}

/// 文字描画のスタイル。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f64,
    pub color: Rgb,
}

/// スタンプ描画と付録レイアウトが使う描画先ドキュメントの能力。
///
/// 座標はすべてページの左下を原点とするユーザー空間単位。
/// ページ番号は1-based。
pub trait DrawingSurface {
    type Page: Copy + std::fmt::Debug;
    type Font;
    type Image: ImageSize;

    fn page_count(&self) -> u32;

    /// 既存ページを取得する。存在しなければ `MissingPage`。
    fn page(&self, page_num: u32) -> crate::error::Result<Self::Page>;

    /// ページの (幅, 高さ)。
    fn page_dimensions(&self, page: Self::Page) -> crate::error::Result<(f64, f64)>;

    /// 末尾にページを追加する。`size` が `None` なら既定サイズ。
    fn add_page(&mut self, size: Option<(f64, f64)>) -> crate::error::Result<Self::Page>;

    fn embed_font(&mut self, font: &LabelFont) -> crate::error::Result<Self::Font>;

    fn measure_text(&self, font: &Self::Font, size: f64, text: &str) -> TextExtent;

    /// `(x, y)` はベースライン左端。
    fn draw_text(
        &mut self,
        page: Self::Page,
        font: &Self::Font,
        text: &str,
        origin: (f64, f64),
        style: TextStyle,
    ) -> crate::error::Result<()>;

    fn draw_filled_rect(
        &mut self,
        page: Self::Page,
        rect: Rect,
        color: Rgb,
    ) -> crate::error::Result<()>;

    fn draw_rect_border(
        &mut self,
        page: Self::Page,
        rect: Rect,
        color: Rgb,
        line_width: f64,
    ) -> crate::error::Result<()>;

    /// JPEG/PNG を埋め込む。それ以外は `UnsupportedImageFormat`。
    fn embed_image(&mut self, bytes: &[u8]) -> crate::error::Result<Self::Image>;

    fn draw_image(
        &mut self,
        page: Self::Page,
        image: &Self::Image,
        rect: Rect,
    ) -> crate::error::Result<()>;

    fn serialize(&mut self) -> crate::error::Result<Vec<u8>>;
}
