use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

use crate::error::{AnalysisError, Result};

/// Fixed assignment of every dataset row to exactly one of train or test.
///
/// Drawn once from a seeded shuffle and read-only afterwards; every model of
/// a run is evaluated against the same partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Partition {
    seed: u64,
    train: Vec<usize>,
    test: Vec<usize>,
}

impl Partition {
    /// Shuffles `0..n` with `seed` and puts the first `floor(n * train_fraction)`
    /// rows into the training subset.
    pub fn split(n: usize, train_fraction: f64, seed: u64) -> Result<Self> {
        if !(train_fraction > 0.0 && train_fraction < 1.0) {
            return Err(AnalysisError::InvalidSpec(format!(
                "train fraction must be in (0, 1), got {}",
                train_fraction
            )));
        }
        let n_train = (n as f64 * train_fraction).floor() as usize;
        if n_train == 0 || n_train == n {
            return Err(AnalysisError::EmptyDataset(format!(
                "{} rows cannot be split {:.2}/{:.2}",
                n,
                train_fraction,
                1.0 - train_fraction
            )));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut rows: Vec<usize> = (0..n).collect();
        rows.shuffle(&mut rng);

        let mut train = rows[..n_train].to_vec();
        let mut test = rows[n_train..].to_vec();
        train.sort_unstable();
        test.sort_unstable();

        tracing::info!(seed, train = train.len(), test = test.len(), "partition drawn");
        Ok(Self { seed, train, test })
    }

    pub fn train(&self) -> &[usize] {
        &self.train
    }

    pub fn test(&self) -> &[usize] {
        &self.test
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn len(&self) -> usize {
        self.train.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One cross-validation fold over a subset of rows.
#[derive(Debug, Clone)]
pub struct Fold {
    pub fit: Vec<usize>,
    pub validate: Vec<usize>,
}

/// Splits `rows` into `k` folds after a seeded shuffle; fold sizes differ by at most one.
pub fn k_folds(rows: &[usize], k: usize, seed: u64) -> Result<Vec<Fold>> {
    if k < 2 || rows.len() < k {
        return Err(AnalysisError::InvalidSpec(format!(
            "cannot make {} folds from {} rows",
            k,
            rows.len()
        )));
    }
    let mut shuffled = rows.to_vec();
    shuffled.shuffle(&mut StdRng::seed_from_u64(seed));

    let folds = (0..k)
        .map(|f| {
            let mut fit = Vec::with_capacity(rows.len());
            let mut validate = Vec::with_capacity(rows.len() / k + 1);
            for (i, &row) in shuffled.iter().enumerate() {
                if i % k == f {
                    validate.push(row);
                } else {
                    fit.push(row);
                }
            }
            Fold { fit, validate }
        })
        .collect();
    Ok(folds)
}
