// lopdf上の描画先: スタンプ・付録ページの描画、リソース統合、保存

use std::collections::{BTreeMap, HashMap};

use lopdf::content::Operation;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::ExcerptError;
use crate::geometry::{Rect, Rgb};
use crate::pdf::content_stream::{
    Matrix, border_rect_ops, encode_operations, fill_rect_ops, image_ops, real, text_ops,
    transform_op,
};
use crate::pdf::font::{LabelFont, TextExtent, encode_win_ansi};
use crate::pdf::image_xobject::build_image_xobject;
use crate::pdf::optimizer::compress_streams;
use crate::pdf::reader::{self, PageBox, content_refs, effective_resources};
use crate::pdf::surface::{DrawingSurface, ImageSize, TextStyle};

/// A4（pt）。付録ページの既定サイズ。
pub const DEFAULT_PAGE_SIZE: (f64, f64) = (595.28, 841.89);

/// 描画先ページ。MediaBoxの原点と寸法を保持する。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdfPage {
    pub id: ObjectId,
    pub page_box: PageBox,
}

/// 埋込済みフォント。
#[derive(Debug, Clone)]
pub struct EmbeddedFont {
    pub resource_name: String,
    pub id: ObjectId,
    pub font: LabelFont,
}

/// 埋込済み画像XObject。
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    pub resource_name: String,
    pub id: ObjectId,
    pub width: u32,
    pub height: u32,
}

impl ImageSize for EmbeddedImage {
    fn pixel_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// ページに追記予定の描画とリソース。
#[derive(Debug, Default)]
struct PendingPage {
    origin: (f64, f64),
    operations: Vec<Operation>,
    fonts: BTreeMap<String, ObjectId>,
    xobjects: BTreeMap<String, ObjectId>,
}

/// lopdf Document をラップした [`DrawingSurface`] 実装。
///
/// 描画はページごとに溜め、`serialize` 時に `q <元の内容> Q <追記>` の形で
/// Contents に連結する。元のグラフィックス状態は追記側に漏れない。
pub struct PdfSurface {
    doc: Document,
    default_page_size: (f64, f64),
    compress: bool,
    pending: BTreeMap<ObjectId, PendingPage>,
    /// SHA-256(hex) → 埋込済み画像
    images: HashMap<String, EmbeddedImage>,
    font_count: usize,
    created_streams: Vec<ObjectId>,
}

impl PdfSurface {
    pub fn new(doc: Document) -> Self {
        Self {
            doc,
            default_page_size: DEFAULT_PAGE_SIZE,
            compress: true,
            pending: BTreeMap::new(),
            images: HashMap::new(),
            font_count: 0,
            created_streams: Vec::new(),
        }
    }

    /// PDFバイト列を読み込む。
    pub fn load(bytes: &[u8]) -> crate::error::Result<Self> {
        Ok(Self::new(reader::PdfReader::from_bytes(bytes)?.into_document()))
    }

    pub fn with_default_page_size(mut self, size: (f64, f64)) -> Self {
        self.default_page_size = size;
        self
    }

    /// 追記したストリームを FlateDecode 圧縮するか。
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// 埋め込んだ画像XObjectの数（重複排除後）。
    pub fn embedded_image_count(&self) -> usize {
        self.images.len()
    }

    fn pending_page(&mut self, page: PdfPage) -> &mut PendingPage {
        self.pending
            .entry(page.id)
            .or_insert_with(|| PendingPage {
                origin: (page.page_box.x0, page.page_box.y0),
                ..PendingPage::default()
            })
    }

    fn root_pages_id(&self) -> crate::error::Result<ObjectId> {
        Ok(self.doc.catalog()?.get(b"Pages")?.as_reference()?)
    }

    fn add_stream(&mut self, content: Vec<u8>) -> ObjectId {
        let id = self
            .doc
            .add_object(Object::Stream(Stream::new(dictionary! {}, content)));
        self.created_streams.push(id);
        id
    }

    /// 溜めた描画を各ページの Contents と Resources に反映する。
    fn flush_pending(&mut self) -> crate::error::Result<()> {
        let pending = std::mem::take(&mut self.pending);

        for (page_id, page) in pending {
            let mut operations = Vec::with_capacity(page.operations.len() + 1);
            if page.origin != (0.0, 0.0) {
                operations.push(transform_op(&Matrix::scale_translate(
                    1.0,
                    1.0,
                    page.origin.0,
                    page.origin.1,
                )));
            }
            operations.extend(page.operations);

            let encoded = encode_operations(operations)?;
            let existing = content_refs(&self.doc, page_id)?;
            let contents: Vec<Object> = if existing.is_empty() {
                vec![Object::Reference(self.add_stream(encoded))]
            } else {
                // 元の内容を q ... Q で囲み、状態を戻してから追記する
                let mut appended = b"\nQ\n".to_vec();
                appended.extend(encoded);
                let prefix_id = self.add_stream(b"q\n".to_vec());
                let suffix_id = self.add_stream(appended);
                std::iter::once(Object::Reference(prefix_id))
                    .chain(existing)
                    .chain(std::iter::once(Object::Reference(suffix_id)))
                    .collect()
            };

            let mut resources = effective_resources(&self.doc, page_id)?;
            merge_named(&mut resources, "Font", &page.fonts);
            merge_named(&mut resources, "XObject", &page.xobjects);

            let page_dict = self.doc.get_dictionary_mut(page_id)?;
            page_dict.set("Contents", contents);
            page_dict.set("Resources", resources);
        }

        Ok(())
    }
}

fn merge_named(resources: &mut Dictionary, key: &str, entries: &BTreeMap<String, ObjectId>) {
    if entries.is_empty() {
        return;
    }
    let mut dict = match resources.get(key.as_bytes()) {
        Ok(Object::Dictionary(existing)) => existing.clone(),
        _ => Dictionary::new(),
    };
    for (name, id) in entries {
        dict.set(name.as_bytes().to_vec(), Object::Reference(*id));
    }
    resources.set(key, dict);
}

impl DrawingSurface for PdfSurface {
    type Page = PdfPage;
    type Font = EmbeddedFont;
    type Image = EmbeddedImage;

    fn page_count(&self) -> u32 {
        reader::page_count(&self.doc)
    }

    fn page(&self, page_num: u32) -> crate::error::Result<PdfPage> {
        let id = reader::page_id(&self.doc, page_num)?;
        let page_box = reader::page_box(&self.doc, id)?;
        Ok(PdfPage { id, page_box })
    }

    fn page_dimensions(&self, page: PdfPage) -> crate::error::Result<(f64, f64)> {
        Ok((page.page_box.width, page.page_box.height))
    }

    fn add_page(&mut self, size: Option<(f64, f64)>) -> crate::error::Result<PdfPage> {
        let (width, height) = size.unwrap_or(self.default_page_size);
        if width <= 0.0 || height <= 0.0 {
            return Err(ExcerptError::pdf_write(format!(
                "invalid page size {width}x{height}"
            )));
        }

        let pages_id = self.root_pages_id()?;
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), real(width), real(height)],
            "Resources" => dictionary! {},
        });

        let pages = self.doc.get_dictionary_mut(pages_id)?;
        let mut kids = match pages.get(b"Kids") {
            Ok(Object::Array(kids)) => kids.clone(),
            Err(_) => Vec::new(),
            Ok(_) => {
                return Err(ExcerptError::pdf_write(
                    "page tree root has an indirect Kids array",
                ));
            }
        };
        kids.push(Object::Reference(page_id));
        let count = pages.get(b"Count").and_then(Object::as_i64).unwrap_or(0);
        pages.set("Kids", kids);
        pages.set("Count", count + 1);

        debug!(?page_id, width, height, "appended page");
        Ok(PdfPage {
            id: page_id,
            page_box: PageBox {
                x0: 0.0,
                y0: 0.0,
                width,
                height,
            },
        })
    }

    fn embed_font(&mut self, font: &LabelFont) -> crate::error::Result<EmbeddedFont> {
        let id = font.embed(&mut self.doc);
        self.font_count += 1;
        Ok(EmbeddedFont {
            resource_name: format!("ExcF{}", self.font_count),
            id,
            font: font.clone(),
        })
    }

    fn measure_text(&self, font: &EmbeddedFont, size: f64, text: &str) -> TextExtent {
        font.font.measure(size, text)
    }

    fn draw_text(
        &mut self,
        page: PdfPage,
        font: &EmbeddedFont,
        text: &str,
        origin: (f64, f64),
        style: TextStyle,
    ) -> crate::error::Result<()> {
        let ops = text_ops(
            &font.resource_name,
            style.size,
            origin,
            style.color,
            encode_win_ansi(text),
        );
        let pending = self.pending_page(page);
        pending.fonts.insert(font.resource_name.clone(), font.id);
        pending.operations.extend(ops);
        Ok(())
    }

    fn draw_filled_rect(
        &mut self,
        page: PdfPage,
        rect: Rect,
        color: Rgb,
    ) -> crate::error::Result<()> {
        self.pending_page(page)
            .operations
            .extend(fill_rect_ops(&rect, color));
        Ok(())
    }

    fn draw_rect_border(
        &mut self,
        page: PdfPage,
        rect: Rect,
        color: Rgb,
        line_width: f64,
    ) -> crate::error::Result<()> {
        self.pending_page(page)
            .operations
            .extend(border_rect_ops(&rect, color, line_width));
        Ok(())
    }

    fn embed_image(&mut self, bytes: &[u8]) -> crate::error::Result<EmbeddedImage> {
        let digest = hex::encode(Sha256::digest(bytes));
        if let Some(existing) = self.images.get(&digest) {
            return Ok(existing.clone());
        }

        let xobject = build_image_xobject(bytes)?;
        let id = self.doc.add_object(Object::Stream(xobject.stream));
        let image = EmbeddedImage {
            resource_name: format!("ExcIm{}", self.images.len() + 1),
            id,
            width: xobject.width,
            height: xobject.height,
        };
        self.images.insert(digest, image.clone());
        Ok(image)
    }

    fn draw_image(
        &mut self,
        page: PdfPage,
        image: &EmbeddedImage,
        rect: Rect,
    ) -> crate::error::Result<()> {
        let ops = image_ops(&image.resource_name, &rect);
        let pending = self.pending_page(page);
        pending
            .xobjects
            .insert(image.resource_name.clone(), image.id);
        pending.operations.extend(ops);
        Ok(())
    }

    fn serialize(&mut self) -> crate::error::Result<Vec<u8>> {
        self.flush_pending()?;
        if self.compress {
            let streams = std::mem::take(&mut self.created_streams);
            compress_streams(&mut self.doc, &streams);
        }

        let mut buf = Vec::new();
        self.doc
            .save_to(&mut buf)
            .map_err(|e| ExcerptError::pdf_write(e.to_string()))?;
        Ok(buf)
    }
}
