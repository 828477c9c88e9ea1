use serde::Deserialize;

use crate::crop::encode::ImageFormatSetting;
use crate::error::ExcerptError;

#[derive(Debug, Clone, Deserialize)]
pub struct JobFile {
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    pub input: String,
    pub output: String,
    /// レンダリング結果（スタンプ・配置）を書き出す JSON のパス
    pub report: Option<String>,
    pub watermark: Option<bool>,
    pub image_format: Option<ImageFormatSetting>,
    pub raster_scale: Option<f32>,
    #[serde(default)]
    pub regions: Vec<PageRegions>,
}

/// 複数ページに同じ矩形群を指定する。
///
/// 矩形は `[x1, y1, x2, y2]`（ページ幅・高さに対する比率、左上原点）。
#[derive(Debug, Clone, Deserialize)]
pub struct PageRegions {
    #[serde(deserialize_with = "deserialize_pages")]
    pub pages: Vec<u32>,
    pub rects: Vec<[f64; 4]>,
}

impl Job {
    /// ページごとの矩形リスト（ページ昇順、記述順）にまとめる。
    pub fn regions_by_page(&self) -> Vec<(u32, Vec<[f64; 4]>)> {
        let mut by_page: std::collections::BTreeMap<u32, Vec<[f64; 4]>> =
            std::collections::BTreeMap::new();
        for entry in &self.regions {
            for &page in &entry.pages {
                by_page
                    .entry(page)
                    .or_default()
                    .extend(entry.rects.iter().copied());
            }
        }
        by_page.into_iter().collect()
    }
}

/// ページ範囲文字列をパースしてページ番号のベクタに変換する。
///
/// 形式:
/// - 単一ページ: `"5"`
/// - 範囲: `"5-10"` (5, 6, 7, 8, 9, 10)
/// - 混合（カンマ区切り）: `"1, 3, 5-10, 15"`
///
/// 結果はソート済み・重複なし。ページ番号は1以上。
pub fn parse_page_range(s: &str) -> crate::error::Result<Vec<u32>> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(ExcerptError::config("Page range cannot be empty"));
    }

    let mut pages = Vec::new();

    for part in trimmed.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((start_str, end_str)) => {
                let start = parse_page_number(start_str)?;
                let end = parse_page_number(end_str)?;
                if start > end {
                    return Err(ExcerptError::config(format!(
                        "Invalid page range: start ({start}) > end ({end})"
                    )));
                }
                pages.extend(start..=end);
            }
            None => pages.push(parse_page_number(part)?),
        }
    }

    if pages.is_empty() {
        return Err(ExcerptError::config("Page range resolved to empty set"));
    }

    pages.sort_unstable();
    pages.dedup();
    Ok(pages)
}

fn parse_page_number(s: &str) -> crate::error::Result<u32> {
    let s = s.trim();
    match s.parse::<u32>() {
        Ok(0) => Err(ExcerptError::config("Page numbers start at 1")),
        Ok(page) => Ok(page),
        Err(_) => Err(ExcerptError::config(format!("Invalid page number: '{s}'"))),
    }
}

/// serdeのdeserialize_withで使用するページ範囲デシリアライザ
fn deserialize_pages<'de, D>(deserializer: D) -> Result<Vec<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PagesField {
        Number(u32),
        Text(String),
    }

    let text = match PagesField::deserialize(deserializer)? {
        PagesField::Number(n) => n.to_string(),
        PagesField::Text(s) => s,
    };
    parse_page_range(&text).map_err(serde::de::Error::custom)
}
