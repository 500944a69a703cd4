//! Synthetic building data on the full 768-row design grid.

#![allow(dead_code)]

use std::f64::consts::PI;
use std::io::Write;

use heatload::{CsvDataLoader, DataLoader, Dataset};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::NamedTempFile;

/// (rc, sa, wa, ra, oh) of the twelve building shapes; sa = wa + 2 ra.
pub const SHAPES: [(f64, f64, f64, f64, f64); 12] = [
    (0.98, 514.5, 294.0, 110.25, 7.0),
    (0.90, 563.5, 318.5, 122.5, 7.0),
    (0.86, 588.0, 294.0, 147.0, 7.0),
    (0.82, 612.5, 318.5, 147.0, 7.0),
    (0.79, 637.0, 343.0, 147.0, 7.0),
    (0.76, 661.5, 416.5, 122.5, 7.0),
    (0.74, 686.0, 245.0, 220.5, 3.5),
    (0.71, 710.5, 269.5, 220.5, 3.5),
    (0.69, 735.0, 294.0, 220.5, 3.5),
    (0.66, 759.5, 318.5, 220.5, 3.5),
    (0.64, 784.0, 343.0, 220.5, 3.5),
    (0.62, 808.5, 367.5, 220.5, 3.5),
];

pub const HEADER: &str = "idx,id,X1,X2,X3,X4,X5,X6,X7,X8,Y1,Y2";

fn glazing_effect(ga: f64) -> f64 {
    match ga {
        g if g == 0.0 => 0.0,
        g if g == 0.1 => 0.25,
        g if g == 0.25 => 0.45,
        _ => 0.6,
    }
}

fn normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.random::<f64>().max(f64::MIN_POSITIVE);
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// CSV text of the 768 buildings: 12 shapes, 4 orientations, and either no
/// glazing or one of three glazing areas over five distributions.
///
/// ln hl = 0.5 + 0.3 ln wa + 0.6 [oh = 7] + glazing effect + N(0, 0.03²).
pub fn building_csv(seed: u64) -> String {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut lines = vec![HEADER.to_string()];
    let mut idx = 0;
    for &(rc, sa, wa, ra, oh) in &SHAPES {
        for orient in 2..=5 {
            let mut glazing = vec![(0.0, 0.0)];
            for ga in [0.1, 0.25, 0.4] {
                for gad in 1..=5 {
                    glazing.push((ga, gad as f64));
                }
            }
            for (ga, gad) in glazing {
                idx += 1;
                let tall = if oh == 7.0 { 0.6 } else { 0.0 };
                let ln_hl = 0.5 + 0.3 * wa.ln() + tall + glazing_effect(ga) + 0.03 * normal(&mut rng);
                let hl = ln_hl.exp();
                let cl = 1.1 * hl + 3.0;
                lines.push(format!(
                    "{idx},{idx},{rc},{sa},{wa},{ra},{oh},{orient},{ga},{gad},{hl:.4},{cl:.4}"
                ));
            }
        }
    }
    lines.join("\n") + "\n"
}

pub fn building_dataset() -> Dataset {
    CsvDataLoader::default()
        .load_from_string(&building_csv(7))
        .unwrap()
}

/// The CSV written to a temp file that lives as long as the handle.
pub fn building_csv_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(building_csv(7).as_bytes()).unwrap();
    file
}

/// Config that keeps the forest and CV cheap.
pub fn fast_config_toml() -> &'static str {
    "seed = 1\nforest_trees = 20\ncv_folds = 5\ntree_max_depth = 6\n"
}

pub fn fast_config_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(fast_config_toml().as_bytes()).unwrap();
    file
}
