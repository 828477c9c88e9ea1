//! Appendix gallery: greedy shelf packing of cropped regions onto new pages.
//!
//! Items are placed left to right in rows. A row's top edge is fixed when the
//! row starts; later items join the row while there is horizontal room and the
//! row top leaves enough vertical space for the item. Otherwise a new row starts
//! below the lowest image placed so far, and when even that does not fit, a new
//! page starts. One forward pass, no backtracking.

use serde::Serialize;
use tracing::debug;

use crate::crop::CropArtifact;
use crate::geometry::{Rect, Rgb};
use crate::pdf::surface::{DrawingSurface, ImageSize, TextStyle};
use crate::pdf::writer::DEFAULT_PAGE_SIZE;

pub const BORDER_COLOR: Rgb = Rgb::gray(0.3);
pub const BORDER_WIDTH: f64 = 1.0;

/// Page size and spacing constants for appendix pages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppendixGeometry {
    pub page_width: f64,
    pub page_height: f64,
    pub margin: f64,
    pub gap: f64,
    pub label_font_size: f64,
}

impl Default for AppendixGeometry {
    fn default() -> Self {
        Self {
            page_width: DEFAULT_PAGE_SIZE.0,
            page_height: DEFAULT_PAGE_SIZE.1,
            margin: 20.0,
            gap: 15.0,
            label_font_size: 16.0,
        }
    }
}

impl AppendixGeometry {
    /// Top y of the first row on a fresh page.
    pub fn top(&self) -> f64 {
        self.page_height - self.margin
    }

    /// Vertical space an item consumes below its row top: label, gaps, image.
    pub fn required_height(&self, render_height: f64) -> f64 {
        1.5 * self.gap + self.label_font_size + render_height
    }

    /// Render size for an item of page-fraction width `location_w` whose
    /// embedded image is `pixel_size` pixels. Aspect ratio follows the pixels.
    pub fn render_size(&self, location_w: f64, pixel_size: (u32, u32)) -> (f64, f64) {
        let width = (location_w * self.page_width)
            .min(self.page_width - 3.0 * self.margin)
            .max(0.0);
        let (px_w, px_h) = pixel_size;
        let ratio = px_h as f64 / px_w.max(1) as f64;
        (width, width * ratio)
    }
}

/// Caption stamped once on every appendix page.
#[derive(Debug, Clone, PartialEq)]
pub struct Watermark {
    pub text: String,
    pub font_size: f64,
    pub baseline_y: f64,
    pub color: Rgb,
}

impl Watermark {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_size: 6.0,
            baseline_y: 5.0,
            color: Rgb::gray(0.5),
        }
    }
}

/// Transient packing state for one export pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutCursor {
    pub page_index: usize,
    pub x_cursor: f64,
    /// Shared top y of the current row.
    pub row_top_y: f64,
    /// Lowest y reached so far in the current row.
    pub row_min_y: f64,
    /// Bottom edge of the last placed image.
    pub last_bottom_y: f64,
    pub items_on_page: usize,
}

/// Where one item goes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub page_index: usize,
    /// The item opens a new appendix page (never true for the first page).
    pub starts_page: bool,
    pub label_origin: (f64, f64),
    pub image: Rect,
}

#[derive(Debug, Clone)]
pub struct ShelfPacker {
    geometry: AppendixGeometry,
    cursor: LayoutCursor,
}

impl ShelfPacker {
    pub fn new(geometry: AppendixGeometry) -> Self {
        let top = geometry.top();
        Self {
            geometry,
            cursor: LayoutCursor {
                page_index: 0,
                // forces the first item onto a new row
                x_cursor: geometry.page_width,
                row_top_y: top,
                row_min_y: top,
                last_bottom_y: top,
                items_on_page: 0,
            },
        }
    }

    pub fn cursor(&self) -> &LayoutCursor {
        &self.cursor
    }

    pub fn page_count(&self) -> usize {
        self.cursor.page_index + 1
    }

    pub fn place(&mut self, location_w: f64, pixel_size: (u32, u32)) -> Slot {
        let g = self.geometry;
        let (render_width, render_height) = g.render_size(location_w, pixel_size);
        let required = g.required_height(render_height);
        let c = &mut self.cursor;

        c.row_min_y = c.row_min_y.min(c.last_bottom_y);

        let fits_row =
            g.page_width - (g.margin + c.x_cursor + g.gap) > render_width && c.row_top_y > required;
        let (mut x, mut y) = if fits_row {
            (c.x_cursor + g.gap, c.row_top_y)
        } else {
            c.row_top_y = c.row_min_y;
            (g.margin, c.row_min_y)
        };

        // A page is opened only once the current one holds an item. The
        // unconditional break would leave an empty page before an item that
        // fits on no page at all.
        let mut starts_page = false;
        if y < required && c.items_on_page > 0 {
            let top = g.top();
            c.page_index += 1;
            c.items_on_page = 0;
            c.row_top_y = top;
            c.row_min_y = top;
            x = g.margin;
            y = top;
            starts_page = true;
        }

        let label_y = y - g.label_font_size - g.gap;
        let image_y = label_y - render_height - g.gap / 2.0;

        c.x_cursor = x + render_width;
        c.last_bottom_y = image_y;
        c.items_on_page += 1;

        Slot {
            page_index: c.page_index,
            starts_page,
            label_origin: (x, label_y),
            image: Rect::new(x, image_y, render_width, render_height),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppendixPlacement {
    pub page_index: usize,
    pub label: String,
    pub label_origin: (f64, f64),
    pub image: Rect,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AppendixReport {
    /// Number of appendix pages created.
    pub pages: usize,
    pub placements: Vec<AppendixPlacement>,
}

/// Lay out every crop onto appendix pages appended to `surface`.
///
/// Does nothing (and adds no page) when `crops` is empty.
pub fn layout_appendix<S: DrawingSurface>(
    surface: &mut S,
    font: &S::Font,
    crops: &[CropArtifact],
    geometry: &AppendixGeometry,
    watermark: Option<&Watermark>,
) -> crate::error::Result<AppendixReport> {
    if crops.is_empty() {
        return Ok(AppendixReport::default());
    }

    let mut page = open_appendix_page(surface, font, geometry, watermark)?;
    let mut packer = ShelfPacker::new(*geometry);
    let mut placements = Vec::with_capacity(crops.len());

    for crop in crops {
        let image = surface.embed_image(&crop.image)?;
        let slot = packer.place(crop.location.w, image.pixel_size());
        if slot.starts_page {
            page = open_appendix_page(surface, font, geometry, watermark)?;
        }

        surface.draw_text(
            page,
            font,
            &crop.label,
            slot.label_origin,
            TextStyle {
                size: geometry.label_font_size,
                color: Rgb::BLACK,
            },
        )?;
        surface.draw_image(page, &image, slot.image)?;
        surface.draw_rect_border(page, slot.image, BORDER_COLOR, BORDER_WIDTH)?;

        placements.push(AppendixPlacement {
            page_index: slot.page_index,
            label: crop.label.clone(),
            label_origin: slot.label_origin,
            image: slot.image,
        });
    }

    debug!(
        pages = packer.page_count(),
        items = placements.len(),
        "appendix laid out"
    );
    Ok(AppendixReport {
        pages: packer.page_count(),
        placements,
    })
}

fn open_appendix_page<S: DrawingSurface>(
    surface: &mut S,
    font: &S::Font,
    geometry: &AppendixGeometry,
    watermark: Option<&Watermark>,
) -> crate::error::Result<S::Page> {
    let page = surface.add_page(Some((geometry.page_width, geometry.page_height)))?;
    if let Some(mark) = watermark {
        let extent = surface.measure_text(font, mark.font_size, &mark.text);
        surface.draw_text(
            page,
            font,
            &mark.text,
            ((geometry.page_width - extent.width) / 2.0, mark.baseline_y),
            TextStyle {
                size: mark.font_size,
                color: mark.color,
            },
        )?;
    }
    Ok(page)
}
