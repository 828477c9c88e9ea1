// FlateDecode圧縮

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use lopdf::{Document, Object, ObjectId};

/// 指定ストリームのうち未圧縮のものにFlateDecode圧縮を適用する。
///
/// 既にフィルターが設定されているストリームはスキップする（二重圧縮防止）。
/// 圧縮に失敗したストリームは非圧縮のまま残す。
pub fn compress_streams(doc: &mut Document, ids: &[ObjectId]) -> usize {
    let mut compressed_count = 0;

    for id in ids {
        let Some(Object::Stream(stream)) = doc.objects.get_mut(id) else {
            continue;
        };
        if stream.dict.get(b"Filter").is_ok() {
            continue;
        }

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        if encoder.write_all(&stream.content).is_err() {
            continue;
        }
        let Ok(compressed) = encoder.finish() else {
            continue;
        };

        stream.dict.set("Filter", "FlateDecode");
        stream.set_content(compressed);
        compressed_count += 1;
    }

    compressed_count
}
