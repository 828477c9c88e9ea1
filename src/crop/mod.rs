pub mod encode;
pub mod extract;

use crate::region::RectLocation;

/// 1回のエクスポートで生成され、そのまま消費される切り抜き結果。
#[derive(Debug, Clone)]
pub struct CropArtifact {
    /// JPEG または PNG のバイト列
    pub image: Vec<u8>,
    pub location: RectLocation,
    pub label: String,
}
