// ジョブ単位: PDF読込 -> ページのラスタ化と領域登録 -> レンダリング -> 出力

use std::path::PathBuf;

use tracing::{debug, info};

use crate::config::merged::MergedConfig;
use crate::error::ExcerptError;
use crate::pipeline::orchestrator::Orchestrator;
use crate::region::Point;
use crate::render::PageRasterizer;

/// Configuration for a single job.
pub struct JobConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// JSON report destination, if requested.
    pub report_path: Option<PathBuf>,
    /// 1-based page number and the rectangles drawn on it, `[x1, y1, x2, y2]`.
    pub regions: Vec<(u32, Vec<[f64; 4]>)>,
    pub config: MergedConfig,
}

/// Result of processing a single job.
#[derive(Debug)]
pub struct JobResult {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub regions_exported: usize,
    pub appendix_pages: usize,
}

/// Run one job on a fresh single-threaded runtime.
///
/// Every rectangle is replayed through the drag state machine, so rectangles
/// are normalized and near-zero ones are dropped exactly as interactive input
/// would be.
pub fn run_job(
    config: &JobConfig,
    rasterizer: &dyn PageRasterizer,
) -> crate::error::Result<JobResult> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .map_err(|e| ExcerptError::task(format!("failed to start runtime: {e}")))?;

    let bytes = std::fs::read(&config.input_path)?;
    let orchestrator = Orchestrator::new(config.config.render_settings()?);
    let page_count = orchestrator.load_document(bytes.clone())?;

    for (page_num, rects) in &config.regions {
        let page_num = *page_num;
        if page_num == 0 || page_num > page_count {
            return Err(ExcerptError::MissingPage(page_num));
        }

        let raster = rasterizer.rasterize(&bytes, page_num, config.config.raster_scale)?;
        let capture = orchestrator.page_capture(page_num, raster);
        let mut gesture = capture.gesture();
        for &[x1, y1, x2, y2] in rects {
            gesture.start(Point::new(x1, y1));
            gesture.update(Point::new(x2, y2), false);
            if gesture.commit().is_none() {
                debug!(page = page_num, x1, y1, x2, y2, "rectangle too small; skipped");
            }
        }
        orchestrator.register_page(capture);
    }

    let output = runtime
        .block_on(orchestrator.render(config.config.watermark))?
        .ok_or_else(|| ExcerptError::task("render did not run"))?;

    std::fs::write(&config.output_path, &output.bytes)?;
    if let Some(report_path) = &config.report_path {
        let json = serde_json::to_vec_pretty(&output.report)?;
        std::fs::write(report_path, json)?;
    }

    info!(
        input = %config.input_path.display(),
        output = %config.output_path.display(),
        regions = output.report.stamps.len(),
        "job finished"
    );
    Ok(JobResult {
        input_path: config.input_path.clone(),
        output_path: config.output_path.clone(),
        regions_exported: output.report.stamps.len(),
        appendix_pages: output.report.appendix.pages,
    })
}

/// Run multiple jobs, collecting results.
/// One job failure does NOT prevent other jobs from running.
pub fn run_all_jobs(
    jobs: &[JobConfig],
    rasterizer: &dyn PageRasterizer,
) -> Vec<crate::error::Result<JobResult>> {
    jobs.iter().map(|job| run_job(job, rasterizer)).collect()
}
