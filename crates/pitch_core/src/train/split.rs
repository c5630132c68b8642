//! Seeded train/test splitting

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Stratified holdout: shuffles within each class and sends roughly
/// `test_fraction` of every class to the test side.
///
/// Degrades instead of erroring on tiny classes: a class keeps at least
/// one training row, and a singleton class goes entirely to training.
/// Returned index lists are sorted, disjoint, and cover `labels` exactly.
pub fn stratified_split(labels: &[u32], test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    // BTreeMap keeps class iteration order stable across runs.
    let mut by_class: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (index, label) in labels.iter().enumerate() {
        by_class.entry(*label).or_default().push(index);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for (_, mut indices) in by_class {
        indices.shuffle(&mut rng);
        let mut n_test = (indices.len() as f64 * test_fraction).floor() as usize;
        if n_test == 0 && indices.len() >= 2 && test_fraction > 0.0 {
            n_test = 1;
        }
        if n_test >= indices.len() && !indices.is_empty() {
            n_test = indices.len() - 1;
        }
        test.extend(indices.drain(..n_test));
        train.extend(indices);
    }

    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}

/// Plain shuffled holdout without stratification. The test side takes
/// `ceil(n * test_fraction)` rows, capped to leave at least one training
/// row.
pub fn shuffled_split(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));

    let mut n_test = ((n as f64) * test_fraction).ceil() as usize;
    if n_test >= n && n > 0 {
        n_test = n - 1;
    }
    let (test, train) = indices.split_at(n_test);
    let mut train = train.to_vec();
    let mut test = test.to_vec();
    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}
