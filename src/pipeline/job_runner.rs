//! Job execution: one job is either an exact-duplicate removal pass or a
//! template-matching sweep plus removal pass.
//!
//! The document handle is owned by one stage at a time: the `PdfReader` used
//! by the read stages is dropped before the `PdfEditor` opens the file for
//! mutation.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::job::{RemovalMethod, Selection};
use crate::error::DelogoError;
use crate::extract::dedup::{UniqueImageGroup, merge_duplicates};
use crate::extract::{RasterComponent, extract_raster_components};
use crate::pdf::editor::PdfEditor;
use crate::pdf::reader::PdfReader;
use crate::removal::{RemovalTarget, execute_removal};

/// Configuration for a single job.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// Some: template-matching path. None: exact-duplicate path.
    pub template_path: Option<PathBuf>,
    pub method: RemovalMethod,
    pub threshold: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    pub scale_steps: u32,
    /// 0-based page subset; `None` processes all pages.
    pub pages: Option<Vec<u32>>,
    /// Group selection for the exact-duplicate path.
    pub selection: Selection,
    /// Directory for saving unique-group representatives for inspection.
    pub dump_dir: Option<PathBuf>,
    pub dpi: u32,
}

/// Terminal outcome of a job. Empty results are distinct from failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Removed { removed: usize, requested: usize },
    /// Sweep found no match above the threshold; output not written.
    NoCandidates,
    /// Document contains no embedded raster images; output not written.
    NoRasterImages,
    /// Selection resolved to no groups; output not written.
    NothingSelected,
}

/// Result of processing a single job.
#[derive(Debug)]
pub struct JobResult {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub pages_touched: usize,
    pub outcome: JobOutcome,
}

/// Run a single job: locate targets, then mutate and persist the document.
pub fn run_job(config: &JobConfig) -> crate::error::Result<JobResult> {
    validate(config)?;

    let targets = match &config.template_path {
        Some(template_path) => collect_template_targets(config, template_path)?,
        None => collect_exact_targets(config)?,
    };

    let targets = match targets {
        Ok(targets) => targets,
        Err(outcome) => {
            // Empty result: a distinct terminal outcome, not a failure. The
            // source is left untouched and no output file is produced.
            return Ok(JobResult {
                input_path: config.input_path.clone(),
                output_path: config.output_path.clone(),
                pages_touched: 0,
                outcome,
            });
        }
    };

    // Mutation stage: exclusive ownership of the document.
    let mut editor = PdfEditor::open(&config.input_path)?;
    let summary = execute_removal(&mut editor, &targets);
    editor.save(&config.output_path)?;

    Ok(JobResult {
        input_path: config.input_path.clone(),
        output_path: config.output_path.clone(),
        pages_touched: summary.pages_touched,
        outcome: JobOutcome::Removed {
            removed: summary.removed,
            requested: summary.requested,
        },
    })
}

/// Fatal precondition checks. Everything below this tier is handled at the
/// component boundary that produces it.
fn validate(config: &JobConfig) -> crate::error::Result<()> {
    if !(config.threshold > 0.0 && config.threshold <= 1.0) {
        return Err(DelogoError::config(format!(
            "threshold must be in (0, 1], got {}",
            config.threshold
        )));
    }
    if config.min_scale <= 0.0 || config.min_scale > config.max_scale {
        return Err(DelogoError::config(format!(
            "invalid scale range [{}, {}]",
            config.min_scale, config.max_scale
        )));
    }
    if config.scale_steps == 0 {
        return Err(DelogoError::config("scale_steps must be at least 1"));
    }
    if config.dpi == 0 {
        return Err(DelogoError::config("dpi must be positive"));
    }
    if config.output_path == config.input_path {
        return Err(DelogoError::config(
            "output path must differ from the input path; the source is never mutated in place",
        ));
    }
    Ok(())
}

/// Template-matching path: sweep the document and convert every candidate to
/// a region cover in PDF points.
#[cfg(feature = "render")]
fn collect_template_targets(
    config: &JobConfig,
    template_path: &Path,
) -> crate::error::Result<Result<Vec<RemovalTarget>, JobOutcome>> {
    use std::collections::HashMap;

    use crate::matching::load_template;
    use crate::matching::sweep::{SweepConfig, run_sweep};
    use crate::pdf::content_stream::BBox;

    // Fatal preconditions: template and document must load before any work.
    let template = load_template(template_path)?;
    let reader = PdfReader::open(&config.input_path)?;
    let page_count = reader.page_count();

    // Page heights are needed to flip match coordinates from the raster's
    // top-left origin into PDF bottom-left points after the sweep.
    let mut page_dims: HashMap<u32, (f64, f64)> = HashMap::new();
    for page_index in 0..page_count {
        match reader.page_dimensions(page_index + 1) {
            Ok(dims) => {
                page_dims.insert(page_index, dims);
            }
            Err(e) => {
                warn!(page = page_index + 1, error = %e, "page dimensions unavailable");
            }
        }
    }
    drop(reader);

    let sweep_config = SweepConfig {
        min_scale: config.min_scale,
        max_scale: config.max_scale,
        scale_steps: config.scale_steps,
        threshold: config.threshold,
        pages: config.pages.clone(),
        dpi: config.dpi,
    };
    let candidates = run_sweep(&config.input_path, page_count, &template, &sweep_config, None)?;

    if candidates.is_empty() {
        return Ok(Err(JobOutcome::NoCandidates));
    }

    let px_to_pt = 72.0 / config.dpi as f64;
    let mut targets = Vec::new();
    for candidate in candidates {
        let Some(&(_, page_h_pts)) = page_dims.get(&candidate.page_index) else {
            warn!(
                page = candidate.page_index + 1,
                "dropping candidate on page without known dimensions"
            );
            continue;
        };
        // Flip the vertical axis: raster row 0 is the top of the page.
        let bbox = BBox {
            x_min: candidate.bbox.x_min * px_to_pt,
            y_min: page_h_pts - candidate.bbox.y_max * px_to_pt,
            x_max: candidate.bbox.x_max * px_to_pt,
            y_max: page_h_pts - candidate.bbox.y_min * px_to_pt,
        };
        targets.push(RemovalTarget::RegionCover {
            page_index: candidate.page_index,
            bbox,
        });
    }

    if targets.is_empty() {
        return Ok(Err(JobOutcome::NoCandidates));
    }
    Ok(Ok(targets))
}

#[cfg(not(feature = "render"))]
fn collect_template_targets(
    _config: &JobConfig,
    _template_path: &Path,
) -> crate::error::Result<Result<Vec<RemovalTarget>, JobOutcome>> {
    Err(DelogoError::config(
        "template matching requires the 'render' feature",
    ))
}

/// Exact-duplicate path: extract, deduplicate, apply the declarative
/// selection, and turn every member occurrence into a removal target.
fn collect_exact_targets(
    config: &JobConfig,
) -> crate::error::Result<Result<Vec<RemovalTarget>, JobOutcome>> {
    let reader = PdfReader::open(&config.input_path)?;
    let components = extract_raster_components(&reader);
    drop(reader);

    if components.is_empty() {
        info!("no embedded raster images found");
        return Ok(Err(JobOutcome::NoRasterImages));
    }

    let groups = merge_duplicates(&components);
    info!(
        components = components.len(),
        groups = groups.len(),
        "merged duplicate images"
    );
    log_group_listing(&groups);

    if let Some(dump_dir) = &config.dump_dir {
        dump_group_representatives(&groups, dump_dir)?;
    }

    let chosen = apply_selection(&groups, &config.selection);
    if chosen.is_empty() {
        return Ok(Err(JobOutcome::NothingSelected));
    }

    let selected_hashes: HashSet<&str> = chosen
        .iter()
        .map(|g| g.representative.content_hash.as_str())
        .collect();

    let page_filter: Option<HashSet<u32>> = config
        .pages
        .as_ref()
        .map(|pages| pages.iter().copied().collect());

    let targets: Vec<RemovalTarget> = components
        .iter()
        .filter(|c| selected_hashes.contains(c.content_hash.as_str()))
        .filter(|c| {
            page_filter
                .as_ref()
                .is_none_or(|pages| pages.contains(&c.raster.page_index))
        })
        .map(|c| exact_target(c, config.method))
        .collect();

    if targets.is_empty() {
        return Ok(Err(JobOutcome::NothingSelected));
    }
    Ok(Ok(targets))
}

/// Map one component occurrence to a removal target per the configured
/// method. Covering needs a region; a component without a recovered placement
/// can only be deleted.
fn exact_target(component: &RasterComponent, method: RemovalMethod) -> RemovalTarget {
    match (method, &component.bbox) {
        (RemovalMethod::Cover, Some(bbox)) => RemovalTarget::RegionCover {
            page_index: component.raster.page_index,
            bbox: bbox.clone(),
        },
        _ => RemovalTarget::ExactObject {
            raster: component.raster.clone(),
            bbox: component.bbox.clone(),
        },
    }
}

/// Ranked group listing, mirroring what an operator reviews when choosing
/// `select` indices.
fn log_group_listing(groups: &[UniqueImageGroup]) {
    for (i, group) in groups.iter().enumerate() {
        let pages: Vec<String> = group
            .page_indices
            .iter()
            .map(|p| (p + 1).to_string())
            .collect();
        info!(
            group = i + 1,
            name = %group.representative.raster.name,
            dimensions = format!(
                "{}x{}",
                group.representative.width, group.representative.height
            ),
            size_kb = format!("{:.1}", group.representative.byte_size as f64 / 1024.0),
            occurrences = group.occurrence_count,
            pages = pages.join(", "),
            "unique image group"
        );
    }
}

/// Save each group representative's raw encoded bytes for offline review.
fn dump_group_representatives(
    groups: &[UniqueImageGroup],
    dump_dir: &Path,
) -> crate::error::Result<()> {
    std::fs::create_dir_all(dump_dir)?;
    for (i, group) in groups.iter().enumerate() {
        let ext = match group.representative.encoding.as_str() {
            "jpeg" => "jpg",
            "jp2" => "jp2",
            _ => "bin",
        };
        let path = dump_dir.join(format!("image_{}.{ext}", i + 1));
        std::fs::write(&path, &group.representative.bytes)?;
        info!(group = i + 1, path = %path.display(), "saved group representative");
    }
    Ok(())
}

/// Resolve the declarative selection against the ranked group list. Invalid
/// 1-based indices are dropped with a warning.
fn apply_selection<'a>(
    groups: &'a [UniqueImageGroup],
    selection: &Selection,
) -> Vec<&'a UniqueImageGroup> {
    match selection {
        Selection::All => groups.iter().collect(),
        Selection::None => Vec::new(),
        Selection::Groups(indices) => indices
            .iter()
            .filter_map(|&i| {
                let group = groups.get(i - 1);
                if group.is_none() {
                    warn!(group = i, total = groups.len(), "ignoring out-of-range group selection");
                }
                group
            })
            .collect(),
    }
}
