// ジョブ実行テスト（ラスタライザはテスト用の単色実装）

use std::path::Path;

use image::{Rgb, RgbImage};
use lopdf::{Document, Object, Stream, dictionary};
use pdf_excerpt::config::job::JobFile;
use pdf_excerpt::config::merged::MergedConfig;
use pdf_excerpt::config::settings::Settings;
use pdf_excerpt::error::ExcerptError;
use pdf_excerpt::pipeline::job_runner::{JobConfig, run_all_jobs, run_job};
use pdf_excerpt::render::PageRasterizer;

// ============================================================
// Helpers
// ============================================================

/// ページ寸法 × scale の単色ラスタを返す。
struct SolidRasterizer;

impl PageRasterizer for SolidRasterizer {
    fn rasterize(
        &self,
        pdf_bytes: &[u8],
        page_num: u32,
        scale: f32,
    ) -> pdf_excerpt::error::Result<RgbImage> {
        let reader = pdf_excerpt::pdf::reader::PdfReader::from_bytes(pdf_bytes)?;
        let (width, height) = reader.page_dimensions(page_num)?;
        Ok(RgbImage::from_pixel(
            (width * scale as f64).round() as u32,
            (height * scale as f64).round() as u32,
            Rgb([20, 120, 220]),
        ))
    }
}

fn create_pdf(path: &Path, num_pages: usize) {
    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::new();
    for _ in 0..num_pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ],
            "Contents" => content_id,
            "Resources" => dictionary! {},
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(num_pages as i64),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).expect("failed to save test PDF");
}

fn job_config(dir: &Path, job_yaml: &str) -> JobConfig {
    let job_file: JobFile = serde_yml::from_str(job_yaml).expect("parse job");
    let job = &job_file.jobs[0];
    let settings = Settings::from_yaml("raster_scale: 0.5").expect("settings");
    JobConfig {
        input_path: dir.join(&job.input),
        output_path: dir.join(&job.output),
        report_path: job.report.as_ref().map(|r| dir.join(r)),
        regions: job.regions_by_page(),
        config: MergedConfig::new(&settings, job).expect("merge"),
    }
}

// ============================================================
// 1. 正常系
// ============================================================

#[test]
fn test_run_job_writes_output_and_report() {
    let dir = tempfile::tempdir().expect("create temp dir");
    create_pdf(&dir.path().join("input.pdf"), 3);

    let config = job_config(
        dir.path(),
        r#"
jobs:
  - input: "input.pdf"
    output: "output.pdf"
    report: "report.json"
    regions:
      - pages: "1, 3"
        rects:
          - [0.1, 0.1, 0.5, 0.3]
          - [0.6, 0.6, 0.9, 0.9]
      - pages: 2
        rects:
          - [0.2, 0.2, 0.201, 0.201]
"#,
    );

    let result = run_job(&config, &SolidRasterizer).expect("job should succeed");
    // ページ2の矩形はしきい値未満で捨てられる
    assert_eq!(result.regions_exported, 4);
    assert!(result.appendix_pages >= 1);

    let doc = Document::load(&config.output_path).expect("output loadable");
    assert_eq!(doc.get_pages().len(), 3 + result.appendix_pages);

    let report: serde_json::Value = serde_json::from_slice(
        &std::fs::read(config.report_path.as_ref().expect("report path")).expect("read report"),
    )
    .expect("report is JSON");
    let labels: Vec<&str> = report["stamps"]
        .as_array()
        .expect("stamps")
        .iter()
        .map(|s| s["label"].as_str().expect("label"))
        .collect();
    assert_eq!(labels, vec!["1.1", "1.2", "3.1", "3.2"]);
    assert_eq!(
        report["appendix"]["pages"].as_u64(),
        Some(result.appendix_pages as u64)
    );
}

#[test]
fn test_run_job_without_regions_copies_document() {
    let dir = tempfile::tempdir().expect("create temp dir");
    create_pdf(&dir.path().join("input.pdf"), 2);

    let config = job_config(
        dir.path(),
        r#"
jobs:
  - input: "input.pdf"
    output: "output.pdf"
"#,
    );

    let result = run_job(&config, &SolidRasterizer).expect("job should succeed");
    assert_eq!(result.regions_exported, 0);
    assert_eq!(result.appendix_pages, 0);
    let doc = Document::load(&config.output_path).expect("output loadable");
    assert_eq!(doc.get_pages().len(), 2);
}

// ============================================================
// 2. 異常系
// ============================================================

#[test]
fn test_run_job_page_out_of_range() {
    let dir = tempfile::tempdir().expect("create temp dir");
    create_pdf(&dir.path().join("input.pdf"), 1);

    let config = job_config(
        dir.path(),
        r#"
jobs:
  - input: "input.pdf"
    output: "output.pdf"
    regions:
      - pages: 4
        rects:
          - [0.1, 0.1, 0.5, 0.5]
"#,
    );

    let result = run_job(&config, &SolidRasterizer);
    assert!(matches!(result, Err(ExcerptError::MissingPage(4))));
    assert!(!config.output_path.exists(), "no partial output");
}

#[test]
fn test_run_all_jobs_continues_after_failure() {
    let dir = tempfile::tempdir().expect("create temp dir");
    create_pdf(&dir.path().join("good.pdf"), 1);

    let missing = job_config(
        dir.path(),
        r#"
jobs:
  - input: "missing.pdf"
    output: "missing_out.pdf"
"#,
    );
    let good = job_config(
        dir.path(),
        r#"
jobs:
  - input: "good.pdf"
    output: "good_out.pdf"
    regions:
      - pages: 1
        rects:
          - [0.0, 0.0, 0.5, 0.5]
"#,
    );

    let results = run_all_jobs(&[missing, good], &SolidRasterizer);
    assert_eq!(results.len(), 2);
    assert!(matches!(results[0], Err(ExcerptError::IoError(_))));
    let good_result = results[1].as_ref().expect("second job succeeds");
    assert_eq!(good_result.regions_exported, 1);
}
