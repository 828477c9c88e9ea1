use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::annotation::RectAnnotation;

/// 1ページ分の確定済み矩形（挿入順）。
#[derive(Debug, Clone, Default)]
pub struct RegionSet {
    rects: Vec<RectAnnotation>,
}

impl RegionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, rect: RectAnnotation) {
        self.rects.push(rect);
    }

    /// 全要素を挿入順で取り出し、セットを空にする。
    pub fn drain(&mut self) -> Vec<RectAnnotation> {
        std::mem::take(&mut self.rects)
    }

    pub fn clear(&mut self) {
        self.rects.clear();
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    pub fn rects(&self) -> &[RectAnnotation] {
        &self.rects
    }
}

/// キャプチャ側とレジストリ側で共有する RegionSet。
///
/// drain はロック1回の中で完結するため、途中状態は観測されない。
#[derive(Debug, Clone, Default)]
pub struct SharedRegionSet {
    inner: Arc<Mutex<RegionSet>>,
}

impl SharedRegionSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, RegionSet> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn append(&self, rect: RectAnnotation) {
        self.lock().append(rect);
    }

    pub fn drain(&self) -> Vec<RectAnnotation> {
        self.lock().drain()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// 現在の内容のコピー（表示用）。
    pub fn snapshot(&self) -> Vec<RectAnnotation> {
        self.lock().rects().to_vec()
    }
}
