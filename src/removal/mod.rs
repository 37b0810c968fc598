//! Removal Executor: applies exact object deletion or opaque-region covering,
//! grouped by page for a single mutation pass per page.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::extract::RasterRef;
use crate::pdf::content_stream::BBox;
use crate::pdf::editor::PdfEditor;

/// One region or object slated for removal. BBoxes are in PDF points
/// (bottom-left origin).
#[derive(Debug, Clone)]
pub enum RemovalTarget {
    /// True deletion of an embedded image XObject. When deletion fails and a
    /// bounding box is available, the executor falls back to covering.
    ExactObject {
        raster: RasterRef,
        bbox: Option<BBox>,
    },
    /// Opaque white rectangle painted above existing page content.
    RegionCover { page_index: u32, bbox: BBox },
}

impl RemovalTarget {
    pub fn page_index(&self) -> u32 {
        match self {
            RemovalTarget::ExactObject { raster, .. } => raster.page_index,
            RemovalTarget::RegionCover { page_index, .. } => *page_index,
        }
    }
}

/// Per-target result. Every outcome is an explicit, testable case; a failed
/// target never aborts the page or the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOutcome {
    Deleted,
    Covered,
    /// Deletion failed; the region was covered instead.
    CoveredFallback,
    Failed,
}

/// Aggregate result of one removal pass.
#[derive(Debug)]
pub struct RemovalSummary {
    pub requested: usize,
    pub removed: usize,
    /// Distinct pages that were mutated.
    pub pages_touched: usize,
    /// (0-based page index, outcome) per target, grouped by page.
    pub outcomes: Vec<(u32, RemovalOutcome)>,
}

impl RemovalSummary {
    /// Human-readable `removed/requested` count.
    pub fn report(&self) -> String {
        format!("removed {}/{} targets", self.removed, self.requested)
    }
}

/// Group targets by page and process each page once.
///
/// Per-object failures are logged and recorded as [`RemovalOutcome::Failed`];
/// the run always completes. The caller persists the document afterwards via
/// [`PdfEditor::save`].
pub fn execute_removal(editor: &mut PdfEditor, targets: &[RemovalTarget]) -> RemovalSummary {
    let mut by_page: BTreeMap<u32, Vec<&RemovalTarget>> = BTreeMap::new();
    for target in targets {
        by_page.entry(target.page_index()).or_default().push(target);
    }

    info!(
        targets = targets.len(),
        pages = by_page.len(),
        "starting removal pass"
    );

    let mut outcomes: Vec<(u32, RemovalOutcome)> = Vec::new();
    let mut pages_touched = 0usize;

    for (page_index, page_targets) in &by_page {
        let page_num = page_index + 1;
        let mut page_mutated = false;
        debug!(page = page_num, targets = page_targets.len(), "processing page");

        for target in page_targets {
            let outcome = match target {
                RemovalTarget::ExactObject { raster, bbox } => {
                    match editor.delete_image(page_num, &raster.name) {
                        Ok(()) => RemovalOutcome::Deleted,
                        Err(e) => match bbox {
                            Some(bbox) => {
                                warn!(
                                    page = page_num,
                                    name = %raster.name,
                                    error = %e,
                                    "deletion failed, covering region instead"
                                );
                                match editor.draw_cover_rect(page_num, bbox) {
                                    Ok(()) => RemovalOutcome::CoveredFallback,
                                    Err(e) => {
                                        warn!(page = page_num, error = %e, "cover fallback failed");
                                        RemovalOutcome::Failed
                                    }
                                }
                            }
                            None => {
                                warn!(
                                    page = page_num,
                                    name = %raster.name,
                                    error = %e,
                                    "deletion failed and no bounding box is available, skipping"
                                );
                                RemovalOutcome::Failed
                            }
                        },
                    }
                }
                RemovalTarget::RegionCover { bbox, .. } => {
                    match editor.draw_cover_rect(page_num, bbox) {
                        Ok(()) => RemovalOutcome::Covered,
                        Err(e) => {
                            warn!(page = page_num, error = %e, "cover failed");
                            RemovalOutcome::Failed
                        }
                    }
                }
            };

            if outcome != RemovalOutcome::Failed {
                page_mutated = true;
            }
            outcomes.push((*page_index, outcome));
        }

        if page_mutated {
            pages_touched += 1;
        }
    }

    let removed = outcomes
        .iter()
        .filter(|(_, o)| *o != RemovalOutcome::Failed)
        .count();

    let summary = RemovalSummary {
        requested: targets.len(),
        removed,
        pages_touched,
        outcomes,
    };
    info!(summary = summary.report(), "removal pass finished");
    summary
}
