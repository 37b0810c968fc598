use std::path::{Path, PathBuf};
use std::process::ExitCode;

use pdf_delogo::config;
use pdf_delogo::config::job::{JobFile, Selection, parse_selection};
use pdf_delogo::config::merged::MergedConfig;
use pdf_delogo::error::{DelogoError, Result};
use pdf_delogo::pipeline::job_runner::{JobConfig, JobOutcome, JobResult};
use pdf_delogo::pipeline::orchestrator::run_all_jobs;

const USAGE: &str = "Usage: pdf_delogo <jobs.yaml>...\n\
Detects recurring logos in PDF documents and removes or covers them.";

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("{USAGE}");
        return ExitCode::SUCCESS;
    }
    if args.iter().any(|a| a == "--version" || a == "-V") {
        eprintln!("pdf_delogo {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }
    if args.is_empty() {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut job_configs: Vec<JobConfig> = Vec::new();
    for arg in &args {
        match load_job_configs(Path::new(arg)) {
            Ok(mut configs) => job_configs.append(&mut configs),
            Err(e) => {
                eprintln!("ERROR: {arg}: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    let results = run_all_jobs(&job_configs);

    let mut failed = 0usize;
    for (config, result) in job_configs.iter().zip(&results) {
        match result {
            Ok(job_result) => report_outcome(job_result),
            Err(e) => {
                eprintln!(
                    "ERROR: {} -> {}: {e}",
                    config.input_path.display(),
                    config.output_path.display()
                );
                failed += 1;
            }
        }
    }

    if failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// All job configs described by one job file. Relative paths resolve against
/// the file's directory; `settings.yaml` next to it supplies defaults.
fn load_job_configs(job_file_path: &Path) -> Result<Vec<JobConfig>> {
    let settings = config::load_settings_for_job(job_file_path)?;
    let job_file: JobFile = serde_yml::from_str(&std::fs::read_to_string(job_file_path)?)?;
    let job_dir = job_file_path.parent().unwrap_or_else(|| Path::new("."));

    let mut configs = Vec::with_capacity(job_file.jobs.len());
    for job in &job_file.jobs {
        let merged = MergedConfig::new(&settings, job);

        let input_path = resolve(job_dir, &job.input);
        if !input_path.exists() {
            return Err(DelogoError::config(format!(
                "input file {} does not exist",
                input_path.display()
            )));
        }
        let template_path = job.template.as_deref().map(|t| resolve(job_dir, t));
        if let Some(template) = &template_path
            && !template.exists()
        {
            return Err(DelogoError::config(format!(
                "template image {} does not exist",
                template.display()
            )));
        }

        // Absent `select` means every detected group.
        let selection = match job.select.as_deref() {
            Some(s) => parse_selection(s)?,
            None => Selection::All,
        };

        // Config pages are 1-based; the pipeline works with 0-based indices.
        let pages = job
            .pages
            .as_ref()
            .map(|pages| pages.iter().filter(|&&p| p >= 1).map(|p| p - 1).collect());

        configs.push(JobConfig {
            input_path,
            output_path: resolve(job_dir, &job.output),
            template_path,
            method: merged.method,
            threshold: merged.threshold,
            min_scale: merged.min_scale,
            max_scale: merged.max_scale,
            scale_steps: merged.scale_steps,
            pages,
            selection,
            dump_dir: job.dump_dir.as_deref().map(|d| resolve(job_dir, d)),
            dpi: merged.dpi,
        });
    }
    Ok(configs)
}

fn report_outcome(result: &JobResult) {
    let input = result.input_path.display();
    match &result.outcome {
        JobOutcome::Removed { removed, requested } => eprintln!(
            "OK: {input} -> {} ({removed}/{requested} removed, {} pages)",
            result.output_path.display(),
            result.pages_touched
        ),
        JobOutcome::NoCandidates => {
            eprintln!("OK: {input}: no logo matches above threshold, output not written")
        }
        JobOutcome::NoRasterImages => {
            eprintln!("OK: {input}: no embedded raster images found, output not written")
        }
        JobOutcome::NothingSelected => {
            eprintln!("OK: {input}: no image groups selected, output not written")
        }
    }
}

fn resolve(base_dir: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}
