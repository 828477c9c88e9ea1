use serde::Serialize;

/// ページ比率座標の点（原点は左上、各成分 0.0〜1.0 が紙面内）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// ユーザーが描いた矩形。角の順序は問わない。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectAnnotation {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl RectAnnotation {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// 両角が同じ点の矩形（ドラッグ開始時の候補）。
    pub fn at(point: Point) -> Self {
        Self::new(point.x, point.y, point.x, point.y)
    }

    /// 角を並べ替えて `x1 <= x2`, `y1 <= y2` にし、全成分を [0, 1] に収める。
    ///
    /// 冪等: `a.normalized().normalized() == a.normalized()`。
    pub fn normalized(&self) -> Self {
        Self {
            x1: clamp01(self.x1.min(self.x2)),
            y1: clamp01(self.y1.min(self.y2)),
            x2: clamp01(self.x1.max(self.x2)),
            y2: clamp01(self.y1.max(self.y2)),
        }
    }

    pub fn is_normalized(&self) -> bool {
        self.x1 <= self.x2
            && self.y1 <= self.y2
            && [self.x1, self.y1, self.x2, self.y2]
                .iter()
                .all(|v| (0.0..=1.0).contains(v))
    }

    /// 対角線の長さ（ページ比率単位）。
    pub fn diagonal(&self) -> f64 {
        (self.x2 - self.x1).hypot(self.y2 - self.y1)
    }

    pub fn width(&self) -> f64 {
        (self.x2 - self.x1).abs()
    }

    pub fn height(&self) -> f64 {
        (self.y2 - self.y1).abs()
    }

    /// 正規化した上で、左下原点の配置に変換する。
    pub fn location(&self) -> RectLocation {
        let n = self.normalized();
        RectLocation {
            x: n.x1,
            y: 1.0 - n.y1,
            w: n.width(),
            h: n.height(),
        }
    }
}

/// 左下原点のページ比率配置。`y` は矩形の上端。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RectLocation {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

fn clamp01(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}
