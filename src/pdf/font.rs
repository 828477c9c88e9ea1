use std::path::Path;
use std::sync::Arc;

use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use ttf_parser::name_id;

use crate::error::ExcerptError;

/// WinAnsi で扱う最初と最後の文字コード。
const FIRST_CHAR: u8 = 32;
const LAST_CHAR: u8 = 255;

/// Helvetica-Bold の AFM 幅（文字コード 32..=126、1/1000 em）。
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // 32-47
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // 48-63
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // 64-79
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // 80-95
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // 96-111
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // 112-126
];
const HELVETICA_BOLD_DEFAULT_WIDTH: u16 = 556;
const HELVETICA_BOLD_ASCENDER: f64 = 718.0;
const HELVETICA_BOLD_DESCENDER: f64 = -207.0;

/// 指定サイズでの文字列の寸法。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextExtent {
    pub width: f64,
    pub height: f64,
}

/// ラベル描画用フォント。
#[derive(Debug, Clone, Default)]
pub enum LabelFont {
    /// PDF標準14フォント（埋込なし）
    #[default]
    HelveticaBold,
    /// 埋込TrueTypeフォント
    TrueType(Arc<TrueTypeFont>),
}

impl LabelFont {
    /// フォントファイルを読み込む。
    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let data = std::fs::read(path).map_err(|e| {
            ExcerptError::font(format!("failed to read font {}: {e}", path.display()))
        })?;
        Ok(Self::TrueType(Arc::new(TrueTypeFont::from_bytes(data, 0)?)))
    }

    /// システムフォントDBから太字のファミリーを探して読み込む。
    pub fn from_system_family(family: &str) -> crate::error::Result<Self> {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();

        let families = [fontdb::Family::Name(family)];
        let query = fontdb::Query {
            families: &families,
            weight: fontdb::Weight::BOLD,
            ..fontdb::Query::default()
        };
        let id = db
            .query(&query)
            .ok_or_else(|| ExcerptError::font(format!("font family '{family}' not found")))?;

        db.with_face_data(id, |data, index| TrueTypeFont::from_bytes(data.to_vec(), index))
            .ok_or_else(|| ExcerptError::font(format!("font data for '{family}' unavailable")))?
            .map(|font| Self::TrueType(Arc::new(font)))
    }

    /// PDFのBaseFont名。
    pub fn base_font(&self) -> &str {
        match self {
            LabelFont::HelveticaBold => "Helvetica-Bold",
            LabelFont::TrueType(font) => &font.postscript_name,
        }
    }

    /// 文字コードの幅（1/1000 em）。
    fn code_width(&self, code: u8) -> f64 {
        match self {
            LabelFont::HelveticaBold => {
                let width = if (FIRST_CHAR..=126).contains(&code) {
                    HELVETICA_BOLD_WIDTHS[(code - FIRST_CHAR) as usize]
                } else {
                    HELVETICA_BOLD_DEFAULT_WIDTH
                };
                width as f64
            }
            LabelFont::TrueType(font) => font.code_width(code),
        }
    }

    /// ascender - descender（1/1000 em）。
    fn line_height(&self) -> f64 {
        match self {
            LabelFont::HelveticaBold => HELVETICA_BOLD_ASCENDER - HELVETICA_BOLD_DESCENDER,
            LabelFont::TrueType(font) => {
                font.to_thousandths(font.ascender as f64 - font.descender as f64)
            }
        }
    }

    /// 文字列の幅と高さを測る。高さはディセンダを含むフォント全体の高さ。
    pub fn measure(&self, size: f64, text: &str) -> TextExtent {
        let units: f64 = encode_win_ansi(text)
            .into_iter()
            .map(|code| self.code_width(code))
            .sum();
        TextExtent {
            width: units * size / 1000.0,
            height: self.line_height() * size / 1000.0,
        }
    }

    /// フォント辞書（TrueTypeの場合は記述子とフォントファイルも）を追加する。
    pub fn embed(&self, doc: &mut Document) -> ObjectId {
        match self {
            LabelFont::HelveticaBold => doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica-Bold",
                "Encoding" => "WinAnsiEncoding",
            }),
            LabelFont::TrueType(font) => font.embed(doc),
        }
    }
}

/// 文字列をWinAnsi（ASCII + Latin-1）のバイト列にする。範囲外の文字は `?`。
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            code @ (32..=126 | 160..=255) => code as u8,
            _ => b'?',
        })
        .collect()
}

/// 解析済みTrueTypeフォント。計測に必要な値は読み込み時に確定させる。
#[derive(Debug)]
pub struct TrueTypeFont {
    data: Vec<u8>,
    postscript_name: String,
    units_per_em: u16,
    ascender: i16,
    descender: i16,
    cap_height: i16,
    bbox: [i16; 4],
    /// 文字コード FIRST_CHAR..=LAST_CHAR の送り幅（フォント単位）
    advances: Vec<u16>,
}

impl TrueTypeFont {
    pub fn from_bytes(data: Vec<u8>, index: u32) -> crate::error::Result<Self> {
        let face = ttf_parser::Face::parse(&data, index)?;

        let postscript_name = face
            .names()
            .into_iter()
            .find(|name| name.name_id == name_id::POST_SCRIPT_NAME && name.is_unicode())
            .and_then(|name| name.to_string())
            .map(|name| name.replace(' ', ""))
            .unwrap_or_else(|| "EmbeddedLabelFont".to_string());

        let notdef = face.glyph_hor_advance(ttf_parser::GlyphId(0)).unwrap_or(0);
        let advances = (FIRST_CHAR..=LAST_CHAR)
            .map(|code| match code {
                127..=159 => 0,
                _ => face
                    .glyph_index(char::from(code))
                    .and_then(|gid| face.glyph_hor_advance(gid))
                    .unwrap_or(notdef),
            })
            .collect();

        let bbox = face.global_bounding_box();
        let units_per_em = face.units_per_em();
        let ascender = face.ascender();
        let descender = face.descender();
        let cap_height = face.capital_height().unwrap_or(ascender);

        drop(face);
        Ok(Self {
            data,
            postscript_name,
            units_per_em,
            ascender,
            descender,
            cap_height,
            bbox: [bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max],
            advances,
        })
    }

    pub fn postscript_name(&self) -> &str {
        &self.postscript_name
    }

    fn to_thousandths(&self, units: f64) -> f64 {
        units * 1000.0 / self.units_per_em.max(1) as f64
    }

    fn code_width(&self, code: u8) -> f64 {
        let advance = code
            .checked_sub(FIRST_CHAR)
            .and_then(|i| self.advances.get(i as usize))
            .copied()
            .unwrap_or(0);
        self.to_thousandths(advance as f64)
    }

    fn embed(&self, doc: &mut Document) -> ObjectId {
        let file_stream = Stream::new(
            dictionary! { "Length1" => self.data.len() as i64 },
            self.data.clone(),
        );
        let file_id = doc.add_object(Object::Stream(file_stream));

        let scaled = |v: i16| Object::Integer(self.to_thousandths(v as f64).round() as i64);
        let descriptor_id = doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => Object::Name(self.postscript_name.as_bytes().to_vec()),
            // Nonsymbolic
            "Flags" => 32,
            "FontBBox" => self.bbox.iter().map(|&v| scaled(v)).collect::<Vec<_>>(),
            "ItalicAngle" => 0,
            "Ascent" => scaled(self.ascender),
            "Descent" => scaled(self.descender),
            "CapHeight" => scaled(self.cap_height),
            "StemV" => 80,
            "FontFile2" => file_id,
        });

        let widths: Vec<Object> = (FIRST_CHAR..=LAST_CHAR)
            .map(|code| Object::Integer(self.code_width(code).round() as i64))
            .collect();

        doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "TrueType",
            "BaseFont" => Object::Name(self.postscript_name.as_bytes().to_vec()),
            "FirstChar" => FIRST_CHAR as i64,
            "LastChar" => LAST_CHAR as i64,
            "Widths" => widths,
            "Encoding" => "WinAnsiEncoding",
            "FontDescriptor" => descriptor_id,
        })
    }
}
