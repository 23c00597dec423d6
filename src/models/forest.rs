//! Ensemble tree classifier with an explicit, serializable structure.
//!
//! Trees are stored as flat node arrays so a persisted artifact describes
//! the classifier completely, instead of carrying an opaque binary blob.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Sampling and stopping parameters for forest fitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 2,
        }
    }
}

/// One node of a flattened decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        /// Fraction of positive-label samples that reached this leaf
        probability: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Positive-class probability at the leaf this vector routes to.
    fn predict_positive(&self, features: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { probability } => return *probability,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

/// Random forest over binary labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    /// Distinct class labels seen at fit time, ascending
    classes: Vec<u32>,
    trees: Vec<DecisionTree>,
    /// Mean impurity-decrease per feature, normalized to sum to 1.
    /// Empty when the forest carries no importance information.
    #[serde(default)]
    feature_importances: Vec<f64>,
    n_features: usize,
}

impl RandomForest {
    /// Fit a forest on a row-major sample matrix with binary labels.
    ///
    /// Bootstrap-samples each tree and searches sqrt(n_features) candidate
    /// features per split. All randomness comes from the caller's RNG, so a
    /// seeded RNG yields a bit-identical forest.
    pub fn fit(rows: &[Vec<f64>], labels: &[u32], params: &ForestParams, rng: &mut StdRng) -> Self {
        let n_samples = rows.len();
        let n_features = rows.first().map_or(0, Vec::len);

        let mut classes: Vec<u32> = labels.to_vec();
        classes.sort_unstable();
        classes.dedup();

        let mut trees = Vec::with_capacity(params.n_estimators);
        let mut raw_importances = vec![0.0; n_features];

        for _ in 0..params.n_estimators {
            let indices: Vec<usize> =
                (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();

            let mut builder = TreeBuilder {
                rows,
                labels,
                params,
                n_features,
                root_samples: indices.len() as f64,
                nodes: Vec::new(),
                importances: vec![0.0; n_features],
            };
            builder.build_node(rng, &indices, 0);

            for (acc, imp) in raw_importances.iter_mut().zip(&builder.importances) {
                *acc += imp;
            }
            trees.push(DecisionTree {
                nodes: builder.nodes,
            });
        }

        let total: f64 = raw_importances.iter().sum();
        let feature_importances = if total > 0.0 {
            raw_importances.into_iter().map(|v| v / total).collect()
        } else {
            Vec::new()
        };

        Self {
            classes,
            trees,
            feature_importances,
            n_features,
        }
    }

    /// Class-probability estimate for one vector, one column per entry in
    /// `classes()`. A single-class forest yields a single column of 1.0.
    pub fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        if self.classes.len() < 2 {
            return vec![1.0];
        }
        let positive: f64 = self
            .trees
            .iter()
            .map(|tree| tree.predict_positive(features))
            .sum::<f64>()
            / self.trees.len() as f64;
        vec![1.0 - positive, positive]
    }

    pub fn classes(&self) -> &[u32] {
        &self.classes
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Per-feature importance weights, if the forest carries them.
    pub fn feature_importances(&self) -> Option<&[f64]> {
        if self.feature_importances.is_empty() {
            None
        } else {
            Some(&self.feature_importances)
        }
    }
}

struct SplitChoice {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct TreeBuilder<'a> {
    rows: &'a [Vec<f64>],
    labels: &'a [u32],
    params: &'a ForestParams,
    n_features: usize,
    root_samples: f64,
    nodes: Vec<Node>,
    importances: Vec<f64>,
}

impl TreeBuilder<'_> {
    /// Grow the subtree for `indices`, returning its node index.
    fn build_node(&mut self, rng: &mut StdRng, indices: &[usize], depth: usize) -> usize {
        let n = indices.len();
        let positives = indices.iter().filter(|&&i| self.labels[i] == 1).count();
        let impurity = gini(positives, n);

        if depth >= self.params.max_depth
            || n < self.params.min_samples_split
            || impurity == 0.0
        {
            return self.push_leaf(positives, n);
        }

        let Some(split) = self.best_split(rng, indices, impurity) else {
            return self.push_leaf(positives, n);
        };

        // Importance: impurity decrease weighted by the node's sample share.
        self.importances[split.feature] += (n as f64 / self.root_samples) * split.gain;

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| self.rows[i][split.feature] <= split.threshold);

        // Reserve the slot before recursing so children land after it.
        let slot = self.nodes.len();
        self.nodes.push(Node::Leaf { probability: 0.0 });
        let left = self.build_node(rng, &left_indices, depth + 1);
        let right = self.build_node(rng, &right_indices, depth + 1);
        self.nodes[slot] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        slot
    }

    fn push_leaf(&mut self, positives: usize, n: usize) -> usize {
        let probability = if n > 0 {
            positives as f64 / n as f64
        } else {
            0.0
        };
        self.nodes.push(Node::Leaf { probability });
        self.nodes.len() - 1
    }

    /// Best gini-gain split across a random sqrt-sized feature subset.
    fn best_split(
        &self,
        rng: &mut StdRng,
        indices: &[usize],
        parent_impurity: f64,
    ) -> Option<SplitChoice> {
        let n = indices.len();
        let k = ((self.n_features as f64).sqrt().round() as usize).max(1);

        let mut candidates: Vec<usize> = (0..self.n_features).collect();
        candidates.shuffle(rng);
        candidates.truncate(k);

        let total_positives = indices.iter().filter(|&&i| self.labels[i] == 1).count();
        let mut best: Option<SplitChoice> = None;

        for feature in candidates {
            let mut column: Vec<(f64, u32)> = indices
                .iter()
                .map(|&i| (self.rows[i][feature], self.labels[i]))
                .collect();
            column.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_n = 0usize;
            let mut left_positives = 0usize;
            for i in 0..n - 1 {
                left_n += 1;
                if column[i].1 == 1 {
                    left_positives += 1;
                }
                // Thresholds only make sense between distinct values.
                if column[i].0 == column[i + 1].0 {
                    continue;
                }
                let right_n = n - left_n;
                if left_n < self.params.min_samples_leaf
                    || right_n < self.params.min_samples_leaf
                {
                    continue;
                }

                let left_impurity = gini(left_positives, left_n);
                let right_impurity = gini(total_positives - left_positives, right_n);
                let weighted = (left_n as f64 * left_impurity + right_n as f64 * right_impurity)
                    / n as f64;
                let gain = parent_impurity - weighted;

                if gain > best.as_ref().map_or(1e-12, |b| b.gain) {
                    best = Some(SplitChoice {
                        feature,
                        threshold: (column[i].0 + column[i + 1].0) / 2.0,
                        gain,
                    });
                }
            }
        }

        best
    }
}

fn gini(positives: usize, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let p = positives as f64 / n as f64;
    2.0 * p * (1.0 - p)
}
