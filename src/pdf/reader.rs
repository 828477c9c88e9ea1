use std::path::Path;

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::ExcerptError;

/// ページ継承をたどる上限（循環参照対策）。
const MAX_TREE_DEPTH: usize = 64;

/// ページのMediaBox（原点と寸法）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub x0: f64,
    pub y0: f64,
    pub width: f64,
    pub height: f64,
}

pub struct PdfReader {
    doc: Document,
}

impl PdfReader {
    /// PDFファイルを開いてPdfReaderを作成する。
    pub fn open(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let doc = Document::load(path)?;
        Ok(Self { doc })
    }

    /// メモリ上のPDFバイト列から作成する。
    pub fn from_bytes(bytes: &[u8]) -> crate::error::Result<Self> {
        let doc = Document::load_mem(bytes)?;
        Ok(Self { doc })
    }

    /// 内部のlopdf Documentへの参照を返す。
    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn into_document(self) -> Document {
        self.doc
    }

    /// ページ数を返す。
    pub fn page_count(&self) -> u32 {
        page_count(&self.doc)
    }

    /// 指定ページ(1-indexed)の寸法(width_pts, height_pts)を返す。
    pub fn page_dimensions(&self, page_num: u32) -> crate::error::Result<(f64, f64)> {
        let page_box = page_box(&self.doc, page_id(&self.doc, page_num)?)?;
        Ok((page_box.width, page_box.height))
    }
}

pub fn page_count(doc: &Document) -> u32 {
    doc.get_pages().len() as u32
}

/// ページ番号(1-indexed)からObjectIdを取得する。
pub fn page_id(doc: &Document, page_num: u32) -> crate::error::Result<ObjectId> {
    doc.get_pages()
        .get(&page_num)
        .copied()
        .ok_or(ExcerptError::MissingPage(page_num))
}

/// ページ辞書から `key` を探し、無ければ Parent をたどって継承値を返す。
fn inherited<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> crate::error::Result<Option<&'a Object>> {
    let mut current = page_id;
    for _ in 0..MAX_TREE_DEPTH {
        let dict = doc.get_dictionary(current)?;
        if let Ok(obj) = dict.get(key) {
            return Ok(Some(obj));
        }
        match dict.get(b"Parent").and_then(Object::as_reference) {
            Ok(parent) => current = parent,
            Err(_) => return Ok(None),
        }
    }
    Err(ExcerptError::pdf_read("page tree is too deep or cyclic"))
}

/// 参照を解決する。
fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> crate::error::Result<&'a Object> {
    match obj {
        Object::Reference(id) => Ok(doc.get_object(*id)?),
        other => Ok(other),
    }
}

/// MediaBoxを取得する（Parent経由の継承も考慮）。
pub fn page_box(doc: &Document, page_id: ObjectId) -> crate::error::Result<PageBox> {
    let media_box = inherited(doc, page_id, b"MediaBox")?
        .ok_or_else(|| ExcerptError::pdf_read("MediaBox not found"))?;
    let values = resolve(doc, media_box)?.as_array()?;
    if values.len() < 4 {
        return Err(ExcerptError::pdf_read("Invalid MediaBox"));
    }

    let to_f64 = |obj: &Object| -> crate::error::Result<f64> {
        match resolve(doc, obj)? {
            Object::Integer(i) => Ok(*i as f64),
            Object::Real(f) => Ok(*f as f64),
            _ => Err(ExcerptError::pdf_read("Invalid MediaBox value")),
        }
    };

    let (ax, ay, bx, by) = (
        to_f64(&values[0])?,
        to_f64(&values[1])?,
        to_f64(&values[2])?,
        to_f64(&values[3])?,
    );
    let page_box = PageBox {
        x0: ax.min(bx),
        y0: ay.min(by),
        width: (bx - ax).abs(),
        height: (by - ay).abs(),
    };

    if page_box.width <= 0.0 || page_box.height <= 0.0 {
        return Err(ExcerptError::pdf_read(
            "Invalid MediaBox: non-positive page dimensions",
        ));
    }

    Ok(page_box)
}

/// ページに実際に適用されるResources辞書の複製を返す。
///
/// 参照・継承されている場合も解決し、Font/XObject サブ辞書も
/// 直接の辞書として展開する。
pub fn effective_resources(doc: &Document, page_id: ObjectId) -> crate::error::Result<Dictionary> {
    let mut resources = match inherited(doc, page_id, b"Resources")? {
        Some(obj) => resolve(doc, obj)?.as_dict()?.clone(),
        None => Dictionary::new(),
    };

    for key in [&b"Font"[..], &b"XObject"[..]] {
        let expanded = match resources.get(key) {
            Ok(obj) => Some(resolve(doc, obj)?.as_dict()?.clone()),
            Err(_) => None,
        };
        if let Some(dict) = expanded {
            resources.set(key, dict);
        }
    }

    Ok(resources)
}

/// ページのContentsを参照の配列として返す（無ければ空）。
pub fn content_refs(doc: &Document, page_id: ObjectId) -> crate::error::Result<Vec<Object>> {
    let page = doc.get_dictionary(page_id)?;
    let Ok(contents) = page.get(b"Contents") else {
        return Ok(Vec::new());
    };
    match contents {
        Object::Array(items) => Ok(items.clone()),
        Object::Reference(id) => match doc.get_object(*id)? {
            Object::Array(items) => Ok(items.clone()),
            _ => Ok(vec![Object::Reference(*id)]),
        },
        _ => Err(ExcerptError::pdf_read("Invalid page Contents")),
    }
}
