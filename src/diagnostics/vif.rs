use ndarray::{Array1, Axis};
use serde::Serialize;

use crate::data_loading::Dataset;
use crate::error::Result;
use crate::linalg::{dependent_columns, with_intercept, LeastSquares, RANK_TOLERANCE};
use crate::processing::{DesignEncoder, Term};

/// Variance-inflation factor of one design column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Vif {
    pub column: String,
    /// `1 / (1 - R²)` of the column regressed on all other columns;
    /// infinite under exact collinearity.
    pub vif: f64,
    pub r_squared: f64,
}

/// VIF of every encoded column of `terms` over `rows`.
pub fn vif(dataset: &Dataset, rows: &[usize], terms: &[Term]) -> Result<Vec<Vif>> {
    let encoder = DesignEncoder::fit(dataset, rows, terms)?;
    let design = encoder.encode_rows(dataset, rows)?;
    let x = design.to_array();
    let p = x.ncols();

    let out = (0..p)
        .map(|j| {
            let y: Array1<f64> = x.column(j).to_owned();
            let others: Vec<usize> = (0..p).filter(|&k| k != j).collect();
            let r_squared = if others.is_empty() {
                0.0
            } else {
                r_squared_on(&y, &with_intercept(&x.select(Axis(1), &others)))
            };
            let vif = if r_squared >= 1.0 {
                f64::INFINITY
            } else {
                1.0 / (1.0 - r_squared)
            };
            Vif {
                column: design.names()[j].clone(),
                vif,
                r_squared,
            }
        })
        .collect();
    Ok(out)
}

/// R² of `y` on `x` (intercept included in `x`). Aliased columns of `x` are
/// dropped first; a constant `y` counts as R² = 1.
fn r_squared_on(y: &Array1<f64>, x: &ndarray::Array2<f64>) -> f64 {
    let mean = y.mean().unwrap_or(0.0);
    let tss = y.mapv(|v| (v - mean).powi(2)).sum();
    if tss <= 0.0 {
        return 1.0;
    }
    let aliased = dependent_columns(x, RANK_TOLERANCE);
    let keep: Vec<usize> = (0..x.ncols()).filter(|j| !aliased.contains(j)).collect();
    match LeastSquares::new(x.select(Axis(1), &keep)) {
        Some(ls) => {
            let r2 = 1.0 - ls.rss(y) / tss;
            if r2 > 1.0 - 1e-12 {
                1.0
            } else {
                r2.max(0.0)
            }
        }
        None => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_loading::{Attribute, Observation};

    fn dataset() -> Dataset {
        let observations = (0..48)
            .map(|i| {
                let wa = 245.0 + 24.5 * (i % 4) as f64;
                let ra = 110.25 + 36.75 * ((i / 4) % 3) as f64;
                let ga = [0.1, 0.25, 0.4][(i / 12) % 3];
                Observation::new([0.8, wa + 2.0 * ra, wa, ra, 7.0, 2.0, ga, 1.0, 20.0, 25.0])
            })
            .collect();
        Dataset::new(observations, 0).unwrap()
    }

    #[test]
    fn balanced_independent_columns_have_unit_vif() {
        let ds = dataset();
        let terms = [Term::numeric(Attribute::WallArea), Term::numeric(Attribute::RoofArea)];
        let result = vif(&ds, &ds.all_rows(), &terms).unwrap();
        for v in result {
            assert!((v.vif - 1.0).abs() < 1e-9, "{}: {}", v.column, v.vif);
        }
    }

    #[test]
    fn exact_combination_is_infinite() {
        let ds = dataset();
        let terms = [
            Term::numeric(Attribute::SurfaceArea),
            Term::numeric(Attribute::WallArea),
            Term::numeric(Attribute::RoofArea),
            Term::numeric(Attribute::GlazingArea),
        ];
        let result = vif(&ds, &ds.all_rows(), &terms).unwrap();
        assert!(result[0].vif.is_infinite());
        assert!(result[2].vif.is_infinite());
        assert!(result[3].vif.is_finite());
    }
}
