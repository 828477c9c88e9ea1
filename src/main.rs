use std::path::{Path, PathBuf};
use std::process::ExitCode;

use pdf_excerpt::config::job::JobFile;
use pdf_excerpt::config::merged::MergedConfig;
use pdf_excerpt::config::{self};
use pdf_excerpt::pipeline::job_runner::{JobConfig, run_all_jobs};
use pdf_excerpt::render::default_rasterizer;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("Usage: pdf_excerpt <jobs.yaml>...");
        eprintln!("  Stamp numbered boxes over PDF regions and append a gallery of the crops.");
        return if args.is_empty() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        };
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        eprintln!("pdf_excerpt {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    let mut job_configs: Vec<JobConfig> = Vec::new();

    for job_file_arg in &args {
        let job_file_path = Path::new(job_file_arg);

        // Load settings from the same directory as the job file.
        let settings = match config::load_settings_for_job(job_file_path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("ERROR: Failed to load settings for {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };

        let yaml_content = match std::fs::read_to_string(job_file_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("ERROR: Failed to read job file {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };

        let job_file: JobFile = match serde_yml::from_str(&yaml_content) {
            Ok(jf) => jf,
            Err(e) => {
                eprintln!("ERROR: Failed to parse job file {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };

        let job_dir = job_file_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        for job in &job_file.jobs {
            let merged = match MergedConfig::new(&settings, job) {
                Ok(m) => m,
                Err(e) => {
                    eprintln!("ERROR: {job_file_arg}: {e}");
                    return ExitCode::FAILURE;
                }
            };

            job_configs.push(JobConfig {
                input_path: resolve_path(&job_dir, &job.input),
                output_path: resolve_path(&job_dir, &job.output),
                report_path: job.report.as_deref().map(|r| resolve_path(&job_dir, r)),
                regions: job.regions_by_page(),
                config: merged,
            });
        }
    }

    let rasterizer = match default_rasterizer() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("ERROR: {e}");
            return ExitCode::FAILURE;
        }
    };

    let results = run_all_jobs(&job_configs, rasterizer.as_ref());

    let mut has_error = false;
    for (job, result) in job_configs.iter().zip(&results) {
        match result {
            Ok(job_result) => {
                eprintln!(
                    "OK: {} -> {} ({} regions, {} appendix pages)",
                    job_result.input_path.display(),
                    job_result.output_path.display(),
                    job_result.regions_exported,
                    job_result.appendix_pages
                );
            }
            Err(e) => {
                eprintln!(
                    "ERROR: {} -> {}: {e}",
                    job.input_path.display(),
                    job.output_path.display()
                );
                has_error = true;
            }
        }
    }

    if has_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Resolve a potentially relative path against a base directory.
/// If the path is already absolute, return it as-is.
fn resolve_path(base_dir: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}
