//! Grayscale template matching via zero-mean normalized cross-correlation.
//!
//! The score is the TM_CCOEFF_NORMED measure: 1.0 is a perfect match, values
//! near 0 are uncorrelated, -1.0 is a perfect inverse. Matching is a pure
//! numeric computation; the same inputs always produce the same output.

use image::{GrayImage, imageops};

/// Best-aligned location of a (resized) template within a page raster.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    /// Top-left corner, in page-raster pixels.
    pub x: u32,
    pub y: u32,
    /// Resized template dimensions; the caller derives the bounding box.
    pub width: u32,
    pub height: u32,
    /// Correlation score in [-1, 1].
    pub score: f64,
}

/// Outcome of matching one scale. A template that does not fit the page at
/// this scale is a structurally impossible configuration, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Found(Match),
    SkippedOversized,
}

/// Resize the template by `scale` and find its best-aligned occurrence.
///
/// Returns [`MatchOutcome::SkippedOversized`] when the resized template
/// exceeds either page dimension or collapses to zero pixels.
pub fn match_at_scale(page: &GrayImage, template: &GrayImage, scale: f64) -> MatchOutcome {
    let scaled_w = (template.width() as f64 * scale) as u32;
    let scaled_h = (template.height() as f64 * scale) as u32;

    if scaled_w == 0 || scaled_h == 0 || scaled_w > page.width() || scaled_h > page.height() {
        return MatchOutcome::SkippedOversized;
    }

    let resized = if scaled_w == template.width() && scaled_h == template.height() {
        template.clone()
    } else {
        imageops::resize(template, scaled_w, scaled_h, imageops::FilterType::Triangle)
    };

    MatchOutcome::Found(best_correlation(page, &resized))
}

/// Exhaustive search for the window with the highest zero-mean normalized
/// cross-correlation against `template`. Ties keep the first (row-major)
/// location.
///
/// Window sums and sums of squares come from summed-area tables, so the
/// per-window denominator is O(1); the cross term is computed directly.
fn best_correlation(page: &GrayImage, template: &GrayImage) -> Match {
    let (pw, ph) = (page.width() as usize, page.height() as usize);
    let (tw, th) = (template.width() as usize, template.height() as usize);
    let n = (tw * th) as f64;

    // Zero-mean template and its norm.
    let t_mean = template.pixels().map(|p| p.0[0] as f64).sum::<f64>() / n;
    let t_zero_mean: Vec<f64> = template.pixels().map(|p| p.0[0] as f64 - t_mean).collect();
    let t_norm = t_zero_mean.iter().map(|v| v * v).sum::<f64>().sqrt();

    let (sum, sum_sq) = summed_area_tables(page);
    let page_raw = page.as_raw();

    let mut best = Match {
        x: 0,
        y: 0,
        width: tw as u32,
        height: th as u32,
        score: f64::NEG_INFINITY,
    };

    for y in 0..=(ph - th) {
        for x in 0..=(pw - tw) {
            let win_sum = table_window(&sum, pw, x, y, tw, th);
            let win_sum_sq = table_window(&sum_sq, pw, x, y, tw, th);
            // Σ (f - f̄)² for the window, guarded against rounding below zero.
            let win_var = (win_sum_sq - win_sum * win_sum / n).max(0.0);
            let denom = win_var.sqrt() * t_norm;

            // Σ f·t' == Σ (f - f̄)(t - t̄) because Σ t' == 0.
            let mut cross = 0.0;
            for ty in 0..th {
                let page_row = &page_raw[(y + ty) * pw + x..(y + ty) * pw + x + tw];
                let tpl_row = &t_zero_mean[ty * tw..(ty + 1) * tw];
                for (p, t) in page_row.iter().zip(tpl_row) {
                    cross += *p as f64 * t;
                }
            }

            // A flat window or flat template has no defined correlation.
            let score = if denom > f64::EPSILON {
                (cross / denom).clamp(-1.0, 1.0)
            } else {
                0.0
            };

            if score > best.score {
                best.x = x as u32;
                best.y = y as u32;
                best.score = score;
            }
        }
    }

    best
}

/// Summed-area tables of pixel values and squared pixel values, both with a
/// one-cell zero border ((w+1) x (h+1)).
fn summed_area_tables(page: &GrayImage) -> (Vec<f64>, Vec<f64>) {
    let (w, h) = (page.width() as usize, page.height() as usize);
    let stride = w + 1;
    let mut sum = vec![0.0; stride * (h + 1)];
    let mut sum_sq = vec![0.0; stride * (h + 1)];
    let raw = page.as_raw();

    for y in 0..h {
        let mut row_sum = 0.0;
        let mut row_sum_sq = 0.0;
        for x in 0..w {
            let v = raw[y * w + x] as f64;
            row_sum += v;
            row_sum_sq += v * v;
            sum[(y + 1) * stride + x + 1] = sum[y * stride + x + 1] + row_sum;
            sum_sq[(y + 1) * stride + x + 1] = sum_sq[y * stride + x + 1] + row_sum_sq;
        }
    }

    (sum, sum_sq)
}

/// Sum over the window [x, x+w) x [y, y+h) from a summed-area table whose
/// row stride is `page_w + 1`.
fn table_window(table: &[f64], page_w: usize, x: usize, y: usize, w: usize, h: usize) -> f64 {
    let stride = page_w + 1;
    table[(y + h) * stride + x + w] + table[y * stride + x]
        - table[y * stride + x + w]
        - table[(y + h) * stride + x]
}
