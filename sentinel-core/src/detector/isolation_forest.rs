//! Isolation forest.
//!
//! Outliers are isolated by fewer random axis-aligned splits than inliers.
//! Scores follow the usual `2^(-E[h(x)] / c(n))` form: close to 1 for easy
//! isolation, around 0.5 or below for typical points.
//!
//! Each tree draws its subsample and splits from its own BLAKE3-derived seed,
//! so trees are built in parallel with rayon without changing the result.

use ndarray::{Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::Rng;
use rayon::prelude::*;

use crate::rng::RngHierarchy;

const EULER_GAMMA: f64 = 0.577_215_664_9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsolationForestConfig {
    pub n_trees: usize,
    pub max_samples: usize,
    /// Expected share of outliers; sets the decision threshold.
    pub contamination: f64,
    pub seed: u64,
}

impl Default for IsolationForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_samples: 256,
            contamination: 0.1,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf {
        size: usize,
    },
}

#[derive(Debug, Clone)]
struct IsolationTree {
    root: Node,
}

impl IsolationTree {
    fn build(data: &Array2<f64>, sample: Vec<usize>, max_depth: usize, rng: &mut StdRng) -> Self {
        Self {
            root: build_node(data, sample, 0, max_depth, rng),
        }
    }

    fn path_length(&self, point: ArrayView1<f64>) -> f64 {
        let mut node = &self.root;
        let mut depth = 0usize;
        loop {
            match node {
                Node::Leaf { size } => return depth as f64 + average_path_length(*size),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if point[*feature] < *threshold {
                        left
                    } else {
                        right
                    };
                    depth += 1;
                }
            }
        }
    }
}

fn build_node(
    data: &Array2<f64>,
    rows: Vec<usize>,
    depth: usize,
    max_depth: usize,
    rng: &mut StdRng,
) -> Node {
    if depth >= max_depth || rows.len() <= 1 {
        return Node::Leaf { size: rows.len() };
    }

    let feature = rng.gen_range(0..data.ncols());
    let (lo, hi) = rows.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
        let v = data[[r, feature]];
        (lo.min(v), hi.max(v))
    });
    if hi - lo < 1e-10 {
        return Node::Leaf { size: rows.len() };
    }

    let threshold = rng.gen_range(lo..hi);
    let (left, right): (Vec<usize>, Vec<usize>) =
        rows.iter().partition(|&&r| data[[r, feature]] < threshold);
    if left.is_empty() || right.is_empty() {
        return Node::Leaf { size: rows.len() };
    }

    Node::Split {
        feature,
        threshold,
        left: Box::new(build_node(data, left, depth + 1, max_depth, rng)),
        right: Box::new(build_node(data, right, depth + 1, max_depth, rng)),
    }
}

/// Average path length of an unsuccessful BST search over `n` points.
pub fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * (n.ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// A fitted forest plus its contamination threshold.
#[derive(Debug, Clone)]
pub struct IsolationForest {
    trees: Vec<IsolationTree>,
    sample_size: usize,
    threshold: f64,
}

impl IsolationForest {
    /// Fit on every row of `data`. Returns `None` for an empty matrix.
    pub fn fit(data: &Array2<f64>, config: &IsolationForestConfig) -> Option<Self> {
        let n = data.nrows();
        if n == 0 || data.ncols() == 0 {
            return None;
        }
        let sample_size = config.max_samples.clamp(1, n);
        let max_depth = (sample_size as f64).log2().ceil() as usize;
        let seeds = RngHierarchy::new(config.seed);

        let trees: Vec<IsolationTree> = (0..config.n_trees.max(1))
            .into_par_iter()
            .map(|t| {
                let mut rng = seeds.rng_for("isolation_tree", t as u64);
                let sample = index::sample(&mut rng, n, sample_size).into_vec();
                IsolationTree::build(data, sample, max_depth, &mut rng)
            })
            .collect();

        let mut forest = Self {
            trees,
            sample_size,
            threshold: 0.5,
        };

        let mut scores = forest.score_samples(data);
        scores.sort_by(|a, b| b.total_cmp(a));
        let idx = (n as f64 * config.contamination).ceil() as usize;
        forest.threshold = scores[idx.min(n - 1)];
        Some(forest)
    }

    /// Anomaly score in `(0, 1]` for one point.
    pub fn score(&self, point: ArrayView1<f64>) -> f64 {
        let mean_path = self
            .trees
            .iter()
            .map(|tree| tree.path_length(point))
            .sum::<f64>()
            / self.trees.len() as f64;
        let c = average_path_length(self.sample_size);
        if c > 0.0 {
            2f64.powf(-mean_path / c)
        } else {
            0.5
        }
    }

    pub fn score_samples(&self, data: &Array2<f64>) -> Vec<f64> {
        data.outer_iter().map(|row| self.score(row)).collect()
    }

    /// Scores strictly above this are outliers.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn is_outlier(&self, score: f64) -> bool {
        score > self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn cluster_with_outliers() -> Array2<f64> {
        let mut rng = StdRng::seed_from_u64(42);
        let mut data = Array2::zeros((102, 2));
        for i in 0..100 {
            data[[i, 0]] = rng.gen_range(-1.0..1.0);
            data[[i, 1]] = rng.gen_range(-1.0..1.0);
        }
        data[[100, 0]] = 10.0;
        data[[100, 1]] = 10.0;
        data[[101, 0]] = -10.0;
        data[[101, 1]] = -10.0;
        data
    }

    #[test]
    fn outliers_score_higher_than_cluster() {
        let data = cluster_with_outliers();
        let forest = IsolationForest::fit(&data, &IsolationForestConfig::default()).unwrap();
        let scores = forest.score_samples(&data);
        let cluster_max = scores[..100].iter().cloned().fold(f64::MIN, f64::max);
        assert!(scores[100] > cluster_max);
        assert!(scores[101] > cluster_max);
        assert!(forest.is_outlier(scores[100]));
    }

    #[test]
    fn fitting_is_deterministic() {
        let data = cluster_with_outliers();
        let config = IsolationForestConfig::default();
        let a = IsolationForest::fit(&data, &config).unwrap();
        let b = IsolationForest::fit(&data, &config).unwrap();
        assert_eq!(a.score_samples(&data), b.score_samples(&data));
        assert_eq!(a.threshold(), b.threshold());
    }

    #[test]
    fn contamination_bounds_flag_count() {
        let data = cluster_with_outliers();
        let forest = IsolationForest::fit(&data, &IsolationForestConfig::default()).unwrap();
        let flagged = forest
            .score_samples(&data)
            .into_iter()
            .filter(|s| forest.is_outlier(*s))
            .count();
        // ceil(102 * 0.1) = 11 points at most sit above the threshold.
        assert!(flagged <= 11);
    }

    #[test]
    fn single_row_fits() {
        let data = Array2::from_elem((1, 3), 1.0);
        let forest = IsolationForest::fit(&data, &IsolationForestConfig::default()).unwrap();
        let s = forest.score(data.row(0));
        assert!(s.is_finite());
        assert!(!forest.is_outlier(s));
    }

    #[test]
    fn empty_matrix_does_not_fit() {
        let data = Array2::<f64>::zeros((0, 3));
        assert!(IsolationForest::fit(&data, &IsolationForestConfig::default()).is_none());
    }

    #[test]
    fn average_path_length_values() {
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        assert!(average_path_length(256) > average_path_length(10));
    }
}
