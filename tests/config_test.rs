// 設定ファイル解析テスト

use std::io::Write;

use pdf_excerpt::config::job::{JobFile, parse_page_range};
use pdf_excerpt::config::load_settings_for_job;
use pdf_excerpt::config::merged::{MergedConfig, resolve_label_font};
use pdf_excerpt::config::settings::{FontSettings, Settings};
use pdf_excerpt::crop::encode::{CropEncoding, ImageFormatSetting};
use pdf_excerpt::pdf::font::LabelFont;

// ============================================================
// 1. ページ範囲パーサ
// ============================================================

#[test]
fn test_parse_page_range_single_range() {
    let result = parse_page_range("5-10").expect("should parse range");
    assert_eq!(result, vec![5, 6, 7, 8, 9, 10]);
}

#[test]
fn test_parse_page_range_single_page() {
    let result = parse_page_range("1").expect("should parse single page");
    assert_eq!(result, vec![1]);
}

#[test]
fn test_parse_page_range_mixed_and_deduplicated() {
    let result = parse_page_range("15, 1, 3, 5-10, 6").expect("should parse mixed");
    assert_eq!(result, vec![1, 3, 5, 6, 7, 8, 9, 10, 15]);
}

#[test]
fn test_parse_page_range_invalid_text() {
    assert!(parse_page_range("abc").is_err(), "non-numeric input");
}

#[test]
fn test_parse_page_range_reversed_range() {
    assert!(parse_page_range("10-5").is_err(), "start > end");
}

#[test]
fn test_parse_page_range_empty_string() {
    assert!(parse_page_range("").is_err(), "empty string");
    assert!(parse_page_range(" , ").is_err(), "only separators");
}

#[test]
fn test_parse_page_range_rejects_zero() {
    assert!(parse_page_range("0").is_err());
    assert!(parse_page_range("0-3").is_err());
}

// ============================================================
// 2. Settings 構造体のデシリアライズ
// ============================================================

#[test]
fn test_settings_full_yaml() {
    let yaml = r#"
raster_scale: 2.0
image_format: png
jpeg_quality: 75
margin: 30
gap: 10
label_font_size: 12
appendix_page_size: [612, 792]
stamp_height_cap: 0.05
stamp_width_cap: null
watermark: true
watermark_text: "Excerpted"
label_font:
  family: "DejaVu Sans"
compress_streams: false
"#;
    let settings = Settings::from_yaml(yaml).expect("should parse full YAML");
    assert_eq!(settings.raster_scale, 2.0);
    assert_eq!(settings.image_format, ImageFormatSetting::Png);
    assert_eq!(settings.jpeg_quality, 75);
    assert_eq!(settings.margin, 30.0);
    assert_eq!(settings.gap, 10.0);
    assert_eq!(settings.label_font_size, 12.0);
    assert_eq!(settings.appendix_page_size, [612.0, 792.0]);
    assert_eq!(settings.stamp_height_cap, 0.05);
    assert_eq!(settings.stamp_width_cap, None);
    assert!(settings.watermark);
    assert_eq!(settings.watermark_text, "Excerpted");
    assert_eq!(settings.label_font.family.as_deref(), Some("DejaVu Sans"));
    assert!(settings.label_font.path.is_none());
    assert!(!settings.compress_streams);
}

#[test]
fn test_settings_empty_yaml() {
    // 空YAML（"{}" はserde_ymlで空のマッピングを意味する）
    let settings = Settings::from_yaml("{}").expect("should use defaults for empty YAML");
    assert_eq!(settings.raster_scale, 3.0);
    assert_eq!(settings.image_format, ImageFormatSetting::Jpeg);
    assert_eq!(settings.jpeg_quality, 90);
    assert_eq!(settings.margin, 20.0);
    assert_eq!(settings.gap, 15.0);
    assert_eq!(settings.label_font_size, 16.0);
    assert_eq!(settings.appendix_page_size, [595.28, 841.89]);
    assert_eq!(settings.stamp_height_cap, 0.04);
    assert_eq!(settings.stamp_width_cap, Some(0.04));
    assert!(!settings.watermark);
    assert_eq!(settings.label_font, FontSettings::default());
    assert!(settings.compress_streams);
}

#[test]
fn test_settings_partial_yaml() {
    let settings = Settings::from_yaml("gap: 8").expect("should fill missing with defaults");
    assert_eq!(settings.gap, 8.0);
    assert_eq!(settings.margin, 20.0);
    assert_eq!(settings.jpeg_quality, 90);
}

#[test]
fn test_settings_rejects_unknown_image_format() {
    assert!(Settings::from_yaml("image_format: gif").is_err());
}

#[test]
fn test_settings_validation() {
    let invalid = [
        "raster_scale: 0",
        "jpeg_quality: 0",
        "margin: -1",
        "appendix_page_size: [0, 100]",
        "margin: 300\nappendix_page_size: [600, 800]",
        "stamp_height_cap: 1.5",
        "stamp_width_cap: 0",
    ];
    for yaml in invalid {
        assert!(Settings::from_yaml(yaml).is_err(), "should reject: {yaml}");
    }
}

// ============================================================
// 3. Job 構造体のデシリアライズ
// ============================================================

#[test]
fn test_job_required_fields_only() {
    let yaml = r#"
jobs:
  - input: "input.pdf"
    output: "output.pdf"
"#;
    let job_file: JobFile = serde_yml::from_str(yaml).expect("should parse required fields");
    assert_eq!(job_file.jobs.len(), 1);
    let job = &job_file.jobs[0];
    assert_eq!(job.input, "input.pdf");
    assert_eq!(job.output, "output.pdf");
    assert!(job.report.is_none());
    assert!(job.watermark.is_none());
    assert!(job.image_format.is_none());
    assert!(job.raster_scale.is_none());
    assert!(job.regions.is_empty());
}

#[test]
fn test_job_with_regions() {
    let yaml = r#"
jobs:
  - input: "input.pdf"
    output: "output.pdf"
    report: "report.json"
    watermark: true
    regions:
      - pages: "1, 3-4"
        rects:
          - [0.1, 0.1, 0.4, 0.3]
      - pages: 3
        rects:
          - [0.5, 0.5, 0.9, 0.9]
          - [0.0, 0.0, 0.2, 0.2]
"#;
    let job_file: JobFile = serde_yml::from_str(yaml).expect("should parse regions");
    let job = &job_file.jobs[0];
    assert_eq!(job.report.as_deref(), Some("report.json"));
    assert_eq!(job.watermark, Some(true));
    assert_eq!(job.regions.len(), 2);
    assert_eq!(job.regions[0].pages, vec![1, 3, 4]);
    assert_eq!(job.regions[1].pages, vec![3]);

    let by_page = job.regions_by_page();
    let pages: Vec<u32> = by_page.iter().map(|(p, _)| *p).collect();
    assert_eq!(pages, vec![1, 3, 4]);
    // ページ3は記述順に3つ
    assert_eq!(
        by_page[1].1,
        vec![
            [0.1, 0.1, 0.4, 0.3],
            [0.5, 0.5, 0.9, 0.9],
            [0.0, 0.0, 0.2, 0.2],
        ]
    );
}

#[test]
fn test_job_invalid_page_range() {
    let yaml = r#"
jobs:
  - input: "input.pdf"
    output: "output.pdf"
    regions:
      - pages: "4-2"
        rects: []
"#;
    let result: Result<JobFile, _> = serde_yml::from_str(yaml);
    assert!(result.is_err(), "reversed range should fail");
}

#[test]
fn test_job_missing_required_field() {
    let yaml = r#"
jobs:
  - output: "output.pdf"
"#;
    let result: Result<JobFile, _> = serde_yml::from_str(yaml);
    assert!(result.is_err(), "should fail when input is missing");
}

// ============================================================
// 4. 設定マージロジック
// ============================================================

fn single_job(yaml: &str) -> JobFile {
    serde_yml::from_str(yaml).expect("parse job")
}

#[test]
fn test_merge_job_overrides_settings() {
    let settings =
        Settings::from_yaml("watermark: false\nraster_scale: 3.0").expect("parse settings");
    let job_file = single_job(
        r#"
jobs:
  - input: "in.pdf"
    output: "out.pdf"
    watermark: true
    image_format: png
    raster_scale: 1.5
"#,
    );
    let merged = MergedConfig::new(&settings, &job_file.jobs[0]).expect("merge");
    assert!(merged.watermark);
    assert_eq!(merged.raster_scale, 1.5);
    assert_eq!(merged.encoding(), CropEncoding::Png);
}

#[test]
fn test_merge_uses_settings_when_job_silent() {
    let settings = Settings::from_yaml(
        "watermark: true\njpeg_quality: 60\nmargin: 25\nstamp_width_cap: null",
    )
    .expect("parse settings");
    let job_file = single_job(
        r#"
jobs:
  - input: "in.pdf"
    output: "out.pdf"
"#,
    );
    let merged = MergedConfig::new(&settings, &job_file.jobs[0]).expect("merge");
    assert!(merged.watermark);
    assert_eq!(merged.encoding(), CropEncoding::Jpeg { quality: 60 });
    assert_eq!(merged.appendix.margin, 25.0);
    assert_eq!(merged.stamp.width_cap, None);

    let render = merged.render_settings().expect("render settings");
    assert!(matches!(render.label_font, LabelFont::HelveticaBold));
    assert_eq!(render.appendix.margin, 25.0);
}

#[test]
fn test_merge_rejects_invalid_raster_scale() {
    let job_file = single_job(
        r#"
jobs:
  - input: "in.pdf"
    output: "out.pdf"
    raster_scale: -2
"#,
    );
    assert!(MergedConfig::new(&Settings::default(), &job_file.jobs[0]).is_err());
}

#[test]
fn test_missing_font_file_is_an_error() {
    let font = FontSettings {
        family: None,
        path: Some("/nonexistent/label-font.ttf".into()),
    };
    assert!(resolve_label_font(&font).is_err());
}

// ============================================================
// 5. settings.yaml の自動検出
// ============================================================

#[test]
fn test_load_settings_for_job_with_settings_file() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let mut file = std::fs::File::create(dir.path().join("settings.yaml")).expect("create");
    writeln!(file, "gap: 9").expect("write");
    writeln!(file, "label_font:").expect("write");
    writeln!(file, "  path: fonts/label.ttf").expect("write");

    let settings = load_settings_for_job(&dir.path().join("jobs.yaml")).expect("load");
    assert_eq!(settings.gap, 9.0);
    // フォントパスは settings.yaml のディレクトリ基準
    assert_eq!(
        settings.label_font.path.as_deref(),
        Some(dir.path().join("fonts/label.ttf").as_path())
    );
}

#[test]
fn test_load_settings_for_job_without_settings_file() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let settings = load_settings_for_job(&dir.path().join("jobs.yaml")).expect("defaults");
    assert_eq!(settings.gap, 15.0);
}

#[test]
fn test_load_settings_for_job_invalid_yaml() {
    let dir = tempfile::tempdir().expect("create temp dir");
    std::fs::write(dir.path().join("settings.yaml"), "gap: [not, a, number]").expect("write");
    assert!(load_settings_for_job(&dir.path().join("jobs.yaml")).is_err());
}
