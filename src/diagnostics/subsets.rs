use ndarray::{Array1, Axis};
use serde::Serialize;

use crate::data_loading::{Attribute, Dataset};
use crate::error::{AnalysisError, Result};
use crate::linalg::{dependent_columns, with_intercept, LeastSquares, RANK_TOLERANCE};
use crate::processing::{DesignEncoder, Term, Transform};

const MAX_CANDIDATES: usize = 20;

/// Best subset of one size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubsetResult {
    pub size: usize,
    pub terms: Vec<String>,
    pub rss: f64,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    /// Mallows' Cp against the model with every candidate.
    pub cp: f64,
    pub bic: f64,
}

/// Exhaustive best-subset regression over `candidates`.
///
/// For every size `1..=max_size` keeps the subset of terms with the smallest
/// residual sum of squares. Subsets whose design is rank-deficient are
/// skipped. Sizes count terms, not encoded columns.
pub fn best_subsets(
    dataset: &Dataset,
    rows: &[usize],
    target: Attribute,
    target_transform: Transform,
    candidates: &[Term],
    max_size: usize,
) -> Result<Vec<SubsetResult>> {
    if candidates.is_empty() || candidates.len() > MAX_CANDIDATES {
        return Err(AnalysisError::InvalidSpec(format!(
            "best subsets needs 1 to {} candidate terms, got {}",
            MAX_CANDIDATES,
            candidates.len()
        )));
    }
    let encoder = DesignEncoder::fit(dataset, rows, candidates)?;
    let x = encoder.encode_rows(dataset, rows)?.to_array();
    let term_of_column = encoder.term_of_column();
    let y: Array1<f64> = target_transform
        .apply_all(target, &dataset.column(target, rows))?
        .into_iter()
        .collect();

    let n = y.len() as f64;
    let mean = y.mean().unwrap_or(0.0);
    let tss = y.mapv(|v| (v - mean).powi(2)).sum();

    // error variance of the full model, over its identifiable columns
    let full = with_intercept(&x);
    let aliased = dependent_columns(&full, RANK_TOLERANCE);
    let keep: Vec<usize> = (0..full.ncols()).filter(|j| !aliased.contains(j)).collect();
    let sigma2 = LeastSquares::new(full.select(Axis(1), &keep))
        .map(|ls| ls.rss(&y) / (n - keep.len() as f64))
        .filter(|s| *s > 0.0 && s.is_finite());

    let m = candidates.len();
    let max_size = max_size.min(m);
    let mut best: Vec<Option<(f64, u32, usize)>> = vec![None; max_size + 1];

    for mask in 1u32..(1u32 << m) {
        let size = mask.count_ones() as usize;
        if size > max_size {
            continue;
        }
        let columns: Vec<usize> = (0..x.ncols())
            .filter(|&j| mask & (1 << term_of_column[j]) != 0)
            .collect();
        let design = with_intercept(&x.select(Axis(1), &columns));
        if n <= design.ncols() as f64 || !dependent_columns(&design, RANK_TOLERANCE).is_empty() {
            continue;
        }
        let Some(ls) = LeastSquares::new(design) else {
            continue;
        };
        let rss = ls.rss(&y);
        let better = match best[size] {
            Some((current, _, _)) => rss < current,
            None => true,
        };
        if better {
            best[size] = Some((rss, mask, columns.len()));
        }
    }

    let results: Vec<SubsetResult> = best
        .into_iter()
        .enumerate()
        .filter_map(|(size, entry)| entry.map(|e| (size, e)))
        .map(|(size, (rss, mask, n_columns))| {
            let k = (n_columns + 1) as f64;
            let r_squared = if tss > 0.0 { 1.0 - rss / tss } else { 1.0 };
            SubsetResult {
                size,
                terms: (0..m)
                    .filter(|i| mask & (1 << i) != 0)
                    .map(|i| candidates[i].to_string())
                    .collect(),
                rss,
                r_squared,
                adj_r_squared: 1.0 - (1.0 - r_squared) * (n - 1.0) / (n - k),
                cp: sigma2.map_or(f64::NAN, |s2| rss / s2 - n + 2.0 * k),
                bic: n * (rss / n).ln() + k * n.ln(),
            }
        })
        .collect();

    tracing::debug!(candidates = m, sizes = results.len(), "best subsets searched");
    Ok(results)
}
