use lopdf::Object;
use lopdf::content::{Content, Operation};

use crate::geometry::{Rect, Rgb};

/// 6要素アフィン変換行列 [a, b, c, d, e, f]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Matrix {
    pub fn identity() -> Self {
        Self::scale_translate(1.0, 1.0, 0.0, 0.0)
    }

    pub fn scale_translate(sx: f64, sy: f64, tx: f64, ty: f64) -> Self {
        Self {
            a: sx,
            b: 0.0,
            c: 0.0,
            d: sy,
            e: tx,
            f: ty,
        }
    }

    /// self * other
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn operands(&self) -> Vec<Object> {
        [self.a, self.b, self.c, self.d, self.e, self.f]
            .into_iter()
            .map(real)
            .collect()
    }

    /// 単位正方形を変換した軸平行矩形（回転なしを前提）。
    pub fn unit_square_rect(&self) -> Rect {
        let xs = [self.e, self.a + self.e, self.c + self.e, self.a + self.c + self.e];
        let ys = [self.f, self.b + self.f, self.d + self.f, self.b + self.d + self.f];
        let min = |v: &[f64]| v.iter().copied().fold(f64::INFINITY, f64::min);
        let max = |v: &[f64]| v.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Rect::new(min(&xs), min(&ys), max(&xs) - min(&xs), max(&ys) - min(&ys))
    }
}

/// 実数オペランド。
pub fn real(v: f64) -> Object {
    Object::Real(v as f32)
}

fn color_operands(color: Rgb) -> Vec<Object> {
    vec![real(color.r), real(color.g), real(color.b)]
}

fn rect_operands(rect: &Rect) -> Vec<Object> {
    vec![
        real(rect.x),
        real(rect.y),
        real(rect.width),
        real(rect.height),
    ]
}

pub fn transform_op(m: &Matrix) -> Operation {
    Operation::new("cm", m.operands())
}

/// 枠線なしの塗りつぶし矩形。
pub fn fill_rect_ops(rect: &Rect, color: Rgb) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new("rg", color_operands(color)),
        Operation::new("re", rect_operands(rect)),
        Operation::new("f", vec![]),
        Operation::new("Q", vec![]),
    ]
}

/// 塗りなしの枠線矩形。
pub fn border_rect_ops(rect: &Rect, color: Rgb, line_width: f64) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new("RG", color_operands(color)),
        Operation::new("w", vec![real(line_width)]),
        Operation::new("re", rect_operands(rect)),
        Operation::new("S", vec![]),
        Operation::new("Q", vec![]),
    ]
}

/// 1行のテキスト。`text` はエンコード済みバイト列。
pub fn text_ops(
    font_name: &str,
    size: f64,
    origin: (f64, f64),
    color: Rgb,
    text: Vec<u8>,
) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new("BT", vec![]),
        Operation::new("rg", color_operands(color)),
        Operation::new(
            "Tf",
            vec![Object::Name(font_name.as_bytes().to_vec()), real(size)],
        ),
        Operation::new("Td", vec![real(origin.0), real(origin.1)]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
        Operation::new("Q", vec![]),
    ]
}

/// 画像XObjectを `rect` に描画する。
pub fn image_ops(xobject_name: &str, rect: &Rect) -> Vec<Operation> {
    let placement = Matrix::scale_translate(rect.width, rect.height, rect.x, rect.y);
    vec![
        Operation::new("q", vec![]),
        transform_op(&placement),
        Operation::new("Do", vec![Object::Name(xobject_name.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ]
}

pub fn encode_operations(operations: Vec<Operation>) -> crate::error::Result<Vec<u8>> {
    Content { operations }
        .encode()
        .map_err(|e| crate::error::ExcerptError::pdf_write(e.to_string()))
}

/// コンテンツストリーム中で描画された XObject とその配置。
#[derive(Debug, Clone, PartialEq)]
pub struct XObjectPlacement {
    pub name: String,
    pub rect: Rect,
}

/// コンテンツストリームを解析し、Do オペレータの XObject 配置を抽出する。
///
/// q/Q の CTM スタックと cm を追跡する。
pub fn extract_xobject_placements(
    content_bytes: &[u8],
) -> crate::error::Result<Vec<XObjectPlacement>> {
    let mut placements = Vec::new();
    let mut stack = vec![Matrix::identity()];

    for op in decode(content_bytes)? {
        match op.operator.as_str() {
            "q" => {
                let top = stack.last().copied().unwrap_or_else(Matrix::identity);
                stack.push(top);
            }
            "Q" => {
                if stack.len() > 1 {
                    stack.pop();
                }
            }
            "cm" if op.operands.len() == 6 => {
                let v = op
                    .operands
                    .iter()
                    .map(operand_to_f64)
                    .collect::<crate::error::Result<Vec<_>>>()?;
                let m = Matrix {
                    a: v[0],
                    b: v[1],
                    c: v[2],
                    d: v[3],
                    e: v[4],
                    f: v[5],
                };
                if let Some(top) = stack.last_mut() {
                    *top = m.multiply(top);
                }
            }
            "Do" => {
                if let Some(Ok(name)) = op.operands.first().map(Object::as_name) {
                    let ctm = stack.last().copied().unwrap_or_else(Matrix::identity);
                    placements.push(XObjectPlacement {
                        name: String::from_utf8_lossy(name).into_owned(),
                        rect: ctm.unit_square_rect(),
                    });
                }
            }
            _ => {}
        }
    }

    Ok(placements)
}

/// コンテンツストリーム中の Tj で表示される文字列を順に返す。
pub fn extract_shown_text(content_bytes: &[u8]) -> crate::error::Result<Vec<String>> {
    Ok(decode(content_bytes)?
        .into_iter()
        .filter(|op| op.operator == "Tj")
        .filter_map(|op| match op.operands.first() {
            Some(Object::String(bytes, _)) => Some(String::from_utf8_lossy(bytes).into_owned()),
            _ => None,
        })
        .collect())
}

fn decode(content_bytes: &[u8]) -> crate::error::Result<Vec<Operation>> {
    if content_bytes.is_empty() {
        return Ok(Vec::new());
    }
    Content::decode(content_bytes)
        .map(|c| c.operations)
        .map_err(|e| crate::error::ExcerptError::pdf_read(e.to_string()))
}

fn operand_to_f64(obj: &Object) -> crate::error::Result<f64> {
    match obj {
        Object::Integer(i) => Ok(*i as f64),
        Object::Real(r) => Ok(*r as f64),
        _ => Err(crate::error::ExcerptError::pdf_read(format!(
            "expected numeric operand, got {:?}",
            obj
        ))),
    }
}
