use serde::Serialize;

/// PDFユーザー空間の矩形（原点は左下、単位はポイント）。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// 上端のy座標。
    pub fn top(&self) -> f64 {
        self.y + self.height
    }
}

/// DeviceRGB の塗り/線色（各成分 0.0〜1.0）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub const fn gray(level: f64) -> Self {
        Self::new(level, level, level)
    }

    pub const BLACK: Rgb = Rgb::gray(0.0);
}
