//! Multi-scale sweep: run the template matcher over a scale range and a page
//! subset, aggregating per-page match candidates.
//!
//! Candidates are NOT deduplicated across scales within a page: every scale
//! clearing the threshold contributes its own candidate. Recall is favored
//! over precision; overlap resolution belongs to the caller's selection
//! policy.

use image::GrayImage;
use rayon::prelude::*;
use tracing::debug;

use crate::matching::template::{MatchOutcome, match_at_scale};
use crate::pdf::content_stream::BBox;

/// One template occurrence clearing the confidence threshold.
#[derive(Debug, Clone)]
pub struct MatchCandidate {
    /// 0-based page index.
    pub page_index: u32,
    /// Bounding box in rendered-pixel space (top-left origin).
    pub bbox: BBox,
    /// Correlation score in [-1, 1]; always >= the sweep threshold.
    pub score: f64,
    /// Template scale factor that produced this candidate.
    pub scale: f64,
}

/// Parameters of a sweep over one document.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub min_scale: f64,
    pub max_scale: f64,
    pub scale_steps: u32,
    /// Confidence threshold in (0, 1].
    pub threshold: f64,
    /// Optional 0-based page subset; out-of-range indices are silently
    /// dropped. `None` sweeps every page.
    pub pages: Option<Vec<u32>>,
    /// Rendering resolution. At 72 DPI pixels equal PDF points.
    pub dpi: u32,
}

/// Optional progress hook. The sweep's correctness never depends on whether
/// an observer is attached.
pub trait SweepObserver {
    fn page_scanned(&self, page_index: u32, candidates: usize) {
        let _ = (page_index, candidates);
    }
}

/// `steps` evenly spaced scale factors spanning `[min_scale, max_scale]`
/// inclusive, monotonically increasing. `steps == 1` degenerates to
/// `[min_scale]`.
pub fn scale_factors(min_scale: f64, max_scale: f64, steps: u32) -> Vec<f64> {
    if steps <= 1 {
        return vec![min_scale];
    }
    (0..steps)
        .map(|i| min_scale + (max_scale - min_scale) * i as f64 / (steps - 1) as f64)
        .collect()
}

/// Sweep one rendered page across all scale factors.
///
/// Scales are independent and order-insensitive, so they run in parallel;
/// results are re-sorted by scale before returning for a deterministic
/// sequence.
pub fn sweep_page(
    page: &GrayImage,
    template: &GrayImage,
    page_index: u32,
    scales: &[f64],
    threshold: f64,
) -> Vec<MatchCandidate> {
    let mut hits: Vec<(usize, MatchCandidate)> = scales
        .par_iter()
        .enumerate()
        .filter_map(|(i, &scale)| match match_at_scale(page, template, scale) {
            MatchOutcome::Found(m) if m.score >= threshold => {
                let candidate = MatchCandidate {
                    page_index,
                    bbox: BBox {
                        x_min: m.x as f64,
                        y_min: m.y as f64,
                        x_max: (m.x + m.width) as f64,
                        y_max: (m.y + m.height) as f64,
                    },
                    score: m.score,
                    scale,
                };
                Some((i, candidate))
            }
            MatchOutcome::Found(m) => {
                debug!(page = page_index + 1, scale, score = m.score, "below threshold");
                None
            }
            MatchOutcome::SkippedOversized => {
                debug!(page = page_index + 1, scale, "template oversized at this scale");
                None
            }
        })
        .collect();

    hits.sort_by_key(|(i, _)| *i);
    hits.into_iter().map(|(_, c)| c).collect()
}

#[cfg(feature = "render")]
pub use document_sweep::run_sweep;

#[cfg(feature = "render")]
mod document_sweep {
    use std::path::Path;

    use tracing::{info, warn};

    use super::*;
    use crate::render::pdfium::Rasterizer;

    /// Sweep a document: render each target page, convert to grayscale, and
    /// collect every candidate clearing the threshold.
    ///
    /// The pdfium binding and the document are set up once for the whole
    /// sweep. A page that fails to render is logged and skipped; the sweep
    /// continues over the remaining pages. The caller validates the template
    /// before calling (a missing template is a fatal precondition, not a
    /// sweep concern).
    pub fn run_sweep(
        pdf_path: &Path,
        page_count: u32,
        template: &GrayImage,
        config: &SweepConfig,
        observer: Option<&dyn SweepObserver>,
    ) -> crate::error::Result<Vec<MatchCandidate>> {
        let scales = scale_factors(config.min_scale, config.max_scale, config.scale_steps);

        let targets: Vec<u32> = match &config.pages {
            Some(subset) => subset.iter().copied().filter(|&p| p < page_count).collect(),
            None => (0..page_count).collect(),
        };

        info!(
            pages = targets.len(),
            scales = scales.len(),
            threshold = config.threshold,
            "starting multi-scale logo sweep"
        );

        let rasterizer = Rasterizer::new()?;
        let document = rasterizer.load_document(pdf_path)?;

        let mut candidates: Vec<MatchCandidate> = Vec::new();
        for page_index in targets {
            let bitmap = match rasterizer.render_page(&document, page_index, config.dpi) {
                Ok(bitmap) => bitmap,
                Err(e) => {
                    warn!(page = page_index + 1, error = %e, "page render failed, skipping");
                    continue;
                }
            };
            let gray = bitmap.to_luma8();

            let page_hits = sweep_page(&gray, template, page_index, &scales, config.threshold);
            if let Some(obs) = observer {
                obs.page_scanned(page_index, page_hits.len());
            }
            candidates.extend(page_hits);
        }

        if candidates.is_empty() {
            info!("sweep finished: no matches above threshold");
        } else {
            let pages_hit = {
                let mut pages: Vec<u32> = candidates.iter().map(|c| c.page_index).collect();
                pages.dedup();
                pages.len()
            };
            let scale_lo = candidates.iter().map(|c| c.scale).fold(f64::INFINITY, f64::min);
            let scale_hi = candidates
                .iter()
                .map(|c| c.scale)
                .fold(f64::NEG_INFINITY, f64::max);
            info!(
                matches = candidates.len(),
                pages = pages_hit,
                scale_min = format!("{scale_lo:.2}"),
                scale_max = format!("{scale_hi:.2}"),
                "sweep finished"
            );
        }

        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, imageops};

    #[test]
    fn test_scale_factors_span_range_inclusive() {
        let scales = scale_factors(0.5, 1.5, 10);

        assert_eq!(scales.len(), 10);
        assert!((scales[0] - 0.5).abs() < 1e-12);
        assert!((scales[9] - 1.5).abs() < 1e-12);
        for pair in scales.windows(2) {
            assert!(pair[0] < pair[1], "factors must be monotonically increasing");
        }
    }

    #[test]
    fn test_scale_factors_are_distinct() {
        let scales = scale_factors(0.8, 1.2, 5);
        for (i, a) in scales.iter().enumerate() {
            for b in &scales[i + 1..] {
                assert!((a - b).abs() > 1e-12);
            }
        }
    }

    #[test]
    fn test_single_step_degenerates_to_min_scale() {
        assert_eq!(scale_factors(0.5, 1.5, 1), vec![0.5]);
    }

    #[test]
    fn test_two_steps_are_the_endpoints() {
        assert_eq!(scale_factors(0.5, 1.5, 2), vec![0.5, 1.5]);
    }

    fn page_with_block(w: u32, h: u32, bx: u32, by: u32, bw: u32, bh: u32) -> GrayImage {
        let mut page = GrayImage::from_pixel(w, h, Luma([220u8]));
        for y in by..by + bh {
            for x in bx..bx + bw {
                let v = if (x + y) % 2 == 0 { 30 } else { 70 };
                page.put_pixel(x, y, Luma([v]));
            }
        }
        page
    }

    #[test]
    fn test_sweep_page_finds_unscaled_template() {
        let page = page_with_block(80, 60, 24, 16, 12, 12);
        let template = imageops::crop_imm(&page, 24, 16, 12, 12).to_image();

        let scales = scale_factors(0.5, 1.5, 3); // 0.5, 1.0, 1.5
        let hits = sweep_page(&page, &template, 4, &scales, 0.8);

        assert!(!hits.is_empty());
        let exact = hits
            .iter()
            .find(|c| (c.scale - 1.0).abs() < 1e-12)
            .expect("scale 1.0 must clear the threshold");
        assert!(exact.score >= 0.99);
        assert_eq!(exact.page_index, 4);
        assert_eq!(exact.bbox.x_min, 24.0);
        assert_eq!(exact.bbox.y_min, 16.0);
        assert_eq!(exact.bbox.width(), 12.0);
        assert_eq!(exact.bbox.height(), 12.0);
    }

    #[test]
    fn test_sweep_page_keeps_candidates_from_multiple_scales() {
        // Coarse two-level structure correlates well at adjacent scales too:
        // a dark square with a lighter inner square survives a 10% resize.
        let mut page = GrayImage::from_pixel(100, 100, Luma([240u8]));
        for y in 30..60 {
            for x in 30..60 {
                page.put_pixel(x, y, Luma([20u8]));
            }
        }
        for y in 38..52 {
            for x in 38..52 {
                page.put_pixel(x, y, Luma([150u8]));
            }
        }
        let template = imageops::crop_imm(&page, 30, 30, 30, 30).to_image();

        let scales = scale_factors(0.9, 1.1, 3);
        let hits = sweep_page(&page, &template, 0, &scales, 0.6);

        assert!(
            hits.len() > 1,
            "near-identical scales should each contribute a candidate, got {}",
            hits.len()
        );
        // Re-sorted by scale: deterministic submission order.
        for pair in hits.windows(2) {
            assert!(pair[0].scale <= pair[1].scale);
        }
    }

    #[test]
    fn test_sweep_page_skips_oversized_scales_silently() {
        let page = page_with_block(30, 30, 5, 5, 10, 10);
        let template = imageops::crop_imm(&page, 5, 5, 10, 10).to_image();

        // 10 * 5.0 = 50 > 30: every scale is structurally impossible.
        let hits = sweep_page(&page, &template, 0, &[5.0, 6.0], 0.5);
        assert!(hits.is_empty());
    }

    #[test]
    fn test_sweep_page_scores_respect_threshold() {
        let page = page_with_block(80, 60, 24, 16, 12, 12);
        let template = imageops::crop_imm(&page, 24, 16, 12, 12).to_image();

        let scales = scale_factors(0.5, 1.5, 7);
        let hits = sweep_page(&page, &template, 0, &scales, 0.95);
        for hit in &hits {
            assert!(hit.score >= 0.95);
            assert!(hit.score <= 1.0);
        }
    }
}
