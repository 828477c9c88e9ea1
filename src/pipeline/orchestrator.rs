// エクスポート全体: ドキュメント読込 → 領域ドレイン → スタンプ → 付録 → 書き出し

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use image::RgbImage;
use serde::Serialize;
use tokio::task::spawn_blocking;
use tracing::{debug, info};

use crate::crop::CropArtifact;
use crate::crop::encode::CropEncoding;
use crate::crop::extract::extract_crop;
use crate::error::ExcerptError;
use crate::layout::{
    AppendixGeometry, AppendixReport, StampRecord, StampStyle, Watermark, layout_appendix,
    paint_stamp,
};
use crate::pdf::font::LabelFont;
use crate::pdf::reader::PdfReader;
use crate::pdf::surface::DrawingSurface;
use crate::pdf::writer::PdfSurface;
use crate::pipeline::registry::PageRegistry;
use crate::region::PageCapture;

pub const DEFAULT_WATERMARK_TEXT: &str = "Created with pdf_excerpt";

/// Everything a render needs besides the document and the regions.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub stamp: StampStyle,
    pub appendix: AppendixGeometry,
    pub watermark_text: String,
    pub label_font: LabelFont,
    pub encoding: CropEncoding,
    /// FlateDecode-compress the content streams we add.
    pub compress: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            stamp: StampStyle::default(),
            appendix: AppendixGeometry::default(),
            watermark_text: DEFAULT_WATERMARK_TEXT.to_string(),
            label_font: LabelFont::default(),
            encoding: CropEncoding::Jpeg { quality: 90 },
            compress: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderReport {
    pub stamps: Vec<StampRecord>,
    pub appendix: AppendixReport,
}

#[derive(Debug, Clone)]
pub struct RenderOutput {
    /// The annotated document.
    pub bytes: Vec<u8>,
    pub report: RenderReport,
}

/// Label shown on a stamp and above its appendix image.
///
/// A lone crop is labelled with the page number; otherwise `<page>.<n>` with
/// `n` counting from 1.
pub fn crop_label(page_num: u32, index: usize, count: usize) -> String {
    if count == 1 {
        page_num.to_string()
    } else {
        format!("{page_num}.{}", index + 1)
    }
}

#[derive(Debug)]
struct SourceDocument {
    bytes: Arc<Vec<u8>>,
    page_count: u32,
}

#[derive(Debug, Default)]
struct OrchestratorState {
    source: Option<SourceDocument>,
    registry: PageRegistry,
}

/// Holds the in-flight flag for the duration of one render.
struct RenderGuard<'a>(&'a AtomicBool);

impl<'a> RenderGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for RenderGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns the source document and the page registry, and runs renders.
#[derive(Debug, Default)]
pub struct Orchestrator {
    settings: RenderSettings,
    state: Mutex<OrchestratorState>,
    in_flight: AtomicBool,
}

impl Orchestrator {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
            state: Mutex::default(),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    fn state(&self) -> MutexGuard<'_, OrchestratorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Parse and adopt a new source document. Returns its page count.
    ///
    /// Pages registered for the previous document are forgotten.
    pub fn load_document(&self, bytes: Vec<u8>) -> crate::error::Result<u32> {
        let page_count = PdfReader::from_bytes(&bytes)?.page_count();
        let mut state = self.state();
        let generation = state.registry.invalidate();
        state.source = Some(SourceDocument {
            bytes: Arc::new(bytes),
            page_count,
        });
        info!(page_count, generation, "source document loaded");
        Ok(page_count)
    }

    pub fn unload(&self) {
        let mut state = self.state();
        state.registry.invalidate();
        state.source = None;
        debug!("source document unloaded");
    }

    pub fn page_count(&self) -> Option<u32> {
        self.state().source.as_ref().map(|s| s.page_count)
    }

    pub fn generation(&self) -> u64 {
        self.state().registry.generation()
    }

    pub fn is_rendering(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// A capture handle for `page_num` bound to the current document.
    pub fn page_capture(&self, page_num: u32, raster: RgbImage) -> PageCapture {
        PageCapture::new(page_num, self.generation(), raster)
    }

    /// Returns `false` when the handle was made for a previous document.
    pub fn register_page(&self, capture: PageCapture) -> bool {
        self.state().registry.register(capture)
    }

    pub fn clear_page(&self, page_num: u32) -> bool {
        self.state().registry.clear_page(page_num)
    }

    pub fn registered_pages(&self) -> Vec<u32> {
        self.state().registry.page_numbers()
    }

    /// Stamp every registered region onto the source and append the gallery.
    ///
    /// Returns `Ok(None)` when another render is already running or no document
    /// is loaded. Any error aborts the render; regions drained before the error
    /// are not restored.
    pub async fn render(&self, watermark: bool) -> crate::error::Result<Option<RenderOutput>> {
        let Some(_guard) = RenderGuard::acquire(&self.in_flight) else {
            debug!("render already in progress; request dropped");
            return Ok(None);
        };
        tokio::task::yield_now().await;

        let (source, generation) = {
            let state = self.state();
            match &state.source {
                Some(source) => (Arc::clone(&source.bytes), state.registry.generation()),
                None => {
                    debug!("render requested without a document");
                    return Ok(None);
                }
            }
        };

        let surface = spawn_blocking(move || PdfSurface::load(&source)).await??;
        let appendix_size = (
            self.settings.appendix.page_width,
            self.settings.appendix.page_height,
        );
        let mut surface = surface
            .with_default_page_size(appendix_size)
            .with_compression(self.settings.compress);
        let font = surface.embed_font(&self.settings.label_font)?;

        let mut stamps = Vec::new();
        let mut crops = Vec::new();
        let mut next = Some(1u32);

        while let Some(from) = next {
            let Some(capture) = self.next_capture(from, generation)? else {
                break;
            };
            let page_num = capture.page_num();
            next = page_num.checked_add(1);

            let annotations = capture.drain();
            if annotations.is_empty() {
                continue;
            }
            debug!(page = page_num, regions = annotations.len(), "drained regions");

            let page = surface.page(page_num)?;
            let count = annotations.len();
            for (index, annotation) in annotations.into_iter().enumerate() {
                let raster = Arc::clone(capture.raster());
                let encoding = self.settings.encoding;
                let image =
                    spawn_blocking(move || extract_crop(&raster, &annotation, encoding)).await??;

                let label = crop_label(page_num, index, count);
                let location = annotation.location();
                stamps.push(paint_stamp(
                    &mut surface,
                    page,
                    page_num,
                    &font,
                    &location,
                    &label,
                    &self.settings.stamp,
                )?);
                crops.push(CropArtifact {
                    image,
                    location,
                    label,
                });
            }
        }

        let watermark = watermark.then(|| Watermark::new(self.settings.watermark_text.clone()));
        let appendix = layout_appendix(
            &mut surface,
            &font,
            &crops,
            &self.settings.appendix,
            watermark.as_ref(),
        )?;

        let bytes = spawn_blocking(move || surface.serialize()).await??;

        info!(
            stamps = stamps.len(),
            appendix_pages = appendix.pages,
            bytes = bytes.len(),
            "render complete"
        );
        Ok(Some(RenderOutput {
            bytes,
            report: RenderReport { stamps, appendix },
        }))
    }

    /// The next registered page at or after `from`, provided the document is
    /// still the one the render started with.
    fn next_capture(&self, from: u32, generation: u64) -> crate::error::Result<Option<PageCapture>> {
        let state = self.state();
        if state.registry.generation() != generation {
            return Err(ExcerptError::task("source document changed while rendering"));
        }
        Ok(state.registry.next_from(from))
    }
}
