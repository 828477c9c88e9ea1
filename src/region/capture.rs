use std::sync::Arc;

use image::RgbImage;
use tracing::debug;

use super::annotation::{Point, RectAnnotation};
use super::set::SharedRegionSet;

/// これ以下の対角線長（ページ比率）のドラッグは確定しない。
pub const MIN_DIAGONAL: f64 = 0.005;

/// デバイス非依存のジェスチャ遷移。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    Start(Point),
    Update { point: Point, symmetric: bool },
    Commit,
    Clear,
}

/// キャプチャ状態。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Dragging { candidate: RectAnnotation },
}

/// 1ページ分のドラッグ状態機械。確定した矩形は共有 RegionSet に追加される。
#[derive(Debug, Clone)]
pub struct RegionCapture {
    regions: SharedRegionSet,
    state: CaptureState,
}

impl RegionCapture {
    pub fn new(regions: SharedRegionSet) -> Self {
        Self {
            regions,
            state: CaptureState::Idle,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, CaptureState::Dragging { .. })
    }

    /// 描画中の候補矩形（正規化済み）。
    pub fn candidate(&self) -> Option<RectAnnotation> {
        match self.state {
            CaptureState::Dragging { candidate } => Some(candidate.normalized()),
            CaptureState::Idle => None,
        }
    }

    pub fn regions(&self) -> &SharedRegionSet {
        &self.regions
    }

    pub fn apply(&mut self, gesture: Gesture) {
        match gesture {
            Gesture::Start(point) => self.start(point),
            Gesture::Update { point, symmetric } => self.update(point, symmetric),
            Gesture::Commit => {
                self.commit();
            }
            Gesture::Clear => self.clear(),
        }
    }

    pub fn start(&mut self, point: Point) {
        self.state = CaptureState::Dragging {
            candidate: RectAnnotation::at(point),
        };
    }

    /// `symmetric` の場合は現在の幅・高さを保ったまま遠い角が `point` を追う。
    pub fn update(&mut self, point: Point, symmetric: bool) {
        let CaptureState::Dragging { candidate } = &mut self.state else {
            return;
        };
        if symmetric {
            let width = candidate.x2 - candidate.x1;
            let height = candidate.y2 - candidate.y1;
            *candidate = RectAnnotation::new(point.x - width, point.y - height, point.x, point.y);
        } else {
            candidate.x2 = point.x;
            candidate.y2 = point.y;
        }
    }

    /// 候補を正規化し、しきい値を超えていれば RegionSet に追加する。
    ///
    /// 追加した場合はその矩形を返す。候補は常に破棄される。
    pub fn commit(&mut self) -> Option<RectAnnotation> {
        let CaptureState::Dragging { candidate } = std::mem::take(&mut self.state) else {
            return None;
        };
        let rect = candidate.normalized();
        if rect.diagonal() > MIN_DIAGONAL {
            self.regions.append(rect);
            Some(rect)
        } else {
            debug!(diagonal = rect.diagonal(), "discarding sub-threshold drag");
            None
        }
    }

    pub fn clear(&mut self) {
        self.state = CaptureState::Idle;
        self.regions.clear();
    }
}

/// オーケストレータに登録するページ単位のハンドル。
///
/// ページのラスタ（切り抜き元）と RegionSet を保持し、
/// 生成時のドキュメント世代を記録する。
#[derive(Debug, Clone)]
pub struct PageCapture {
    page_num: u32,
    generation: u64,
    regions: SharedRegionSet,
    raster: Arc<RgbImage>,
}

impl PageCapture {
    pub fn new(page_num: u32, generation: u64, raster: RgbImage) -> Self {
        Self {
            page_num,
            generation,
            regions: SharedRegionSet::new(),
            raster: Arc::new(raster),
        }
    }

    pub fn page_num(&self) -> u32 {
        self.page_num
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn raster(&self) -> &Arc<RgbImage> {
        &self.raster
    }

    pub fn regions(&self) -> &SharedRegionSet {
        &self.regions
    }

    /// このページの RegionSet に書き込むジェスチャ状態機械を作る。
    pub fn gesture(&self) -> RegionCapture {
        RegionCapture::new(self.regions.clone())
    }

    pub fn drain(&self) -> Vec<RectAnnotation> {
        self.regions.drain()
    }

    pub fn clear(&self) {
        self.regions.clear();
    }
}
