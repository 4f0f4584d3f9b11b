//! Scoring and fold assignment for cross-validation.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Coefficient of determination, `1 - SS_res / SS_tot`.
///
/// A constant target (SS_tot = 0) scores 1.0 when predicted exactly and
/// 0.0 otherwise. Empty input scores 0.0.
pub fn r2_score(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return 0.0;
    }
    let actual = &actual[..n];
    let mean = actual.iter().sum::<f64>() / n as f64;
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();

    if ss_tot == 0.0 {
        if ss_res == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - ss_res / ss_tot
    }
}

/// One train / held-out split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffled K-fold split of `0..n`.
///
/// Indices are shuffled with `StdRng::seed_from_u64(seed)` and cut into `k`
/// contiguous folds; the first `n % k` folds hold one extra row. Both index
/// lists of a fold are sorted ascending. Requires `2 <= k <= n`.
pub fn kfold_splits(n: usize, k: usize, seed: u64) -> Vec<Fold> {
    debug_assert!(k >= 2 && k <= n, "kfold_splits needs 2 <= k <= n (k={k}, n={n})");
    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let base = n / k;
    let extra = n % k;
    let mut folds = Vec::with_capacity(k);
    let mut start = 0;
    for i in 0..k {
        let size = base + usize::from(i < extra);
        let mut test = order[start..start + size].to_vec();
        let mut train: Vec<usize> = order[..start]
            .iter()
            .chain(&order[start + size..])
            .copied()
            .collect();
        test.sort_unstable();
        train.sort_unstable();
        folds.push(Fold { train, test });
        start += size;
    }
    folds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_r2_perfect_and_mean() {
        let y = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(r2_score(&y, &y), 1.0);
        assert_eq!(r2_score(&y, &[2.5; 4]), 0.0);
        assert!(r2_score(&y, &[4.0, 3.0, 2.0, 1.0]) < 0.0);
    }

    #[test]
    fn test_r2_constant_target() {
        assert_eq!(r2_score(&[5.0, 5.0], &[5.0, 5.0]), 1.0);
        assert_eq!(r2_score(&[5.0, 5.0], &[4.0, 5.0]), 0.0);
        assert_eq!(r2_score(&[], &[]), 0.0);
    }

    #[test]
    fn test_kfold_partitions_rows() {
        let folds = kfold_splits(10, 3, 42);
        assert_eq!(folds.len(), 3);
        assert_eq!(
            folds.iter().map(|f| f.test.len()).collect::<Vec<_>>(),
            vec![4, 3, 3]
        );

        let mut all_test: Vec<usize> = folds.iter().flat_map(|f| f.test.clone()).collect();
        all_test.sort_unstable();
        assert_eq!(all_test, (0..10).collect::<Vec<_>>());

        for fold in &folds {
            assert_eq!(fold.train.len() + fold.test.len(), 10);
            assert!(fold.test.iter().all(|t| !fold.train.contains(t)));
        }
    }

    #[test]
    fn test_kfold_deterministic() {
        assert_eq!(kfold_splits(25, 5, 7), kfold_splits(25, 5, 7));
    }
}
