// ページ番号 → キャプチャハンドルの登録表

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::region::PageCapture;

/// Registered pages, keyed by 1-based page number.
///
/// Every source document change bumps the generation and forgets all pages.
/// Handles created under an older generation are refused.
#[derive(Debug, Default)]
pub struct PageRegistry {
    generation: u64,
    pages: BTreeMap<u32, PageCapture>,
}

impl PageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Forget every page and start a new generation.
    pub fn invalidate(&mut self) -> u64 {
        self.generation += 1;
        self.pages.clear();
        debug!(generation = self.generation, "page registry invalidated");
        self.generation
    }

    /// Register (or replace) the capture for its page.
    ///
    /// Returns `false` if the handle belongs to an older generation.
    pub fn register(&mut self, capture: PageCapture) -> bool {
        if capture.generation() != self.generation {
            warn!(
                page = capture.page_num(),
                handle_generation = capture.generation(),
                current_generation = self.generation,
                "ignoring capture from a previous document"
            );
            return false;
        }
        debug!(page = capture.page_num(), "page registered");
        self.pages.insert(capture.page_num(), capture);
        true
    }

    /// Clear the regions of one page. Returns `false` if it is not registered.
    pub fn clear_page(&self, page_num: u32) -> bool {
        match self.pages.get(&page_num) {
            Some(capture) => {
                capture.clear();
                true
            }
            None => false,
        }
    }

    pub fn get(&self, page_num: u32) -> Option<&PageCapture> {
        self.pages.get(&page_num)
    }

    /// The registered page with the smallest number `>= from`.
    pub fn next_from(&self, from: u32) -> Option<PageCapture> {
        self.pages.range(from..).next().map(|(_, c)| c.clone())
    }

    pub fn page_numbers(&self) -> Vec<u32> {
        self.pages.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
