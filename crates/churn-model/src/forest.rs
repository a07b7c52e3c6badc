//! Random forest classifier exported from a fitted scikit-learn forest.
//!
//! Each tree is stored as the parallel `tree_` arrays (`children_left`,
//! `children_right`, `feature`, `threshold`, `value`). A node is a leaf when
//! its `children_left` is `-1`. Forest probabilities are the mean of the
//! per-tree leaf distributions, the same soft voting `predict_proba` does.

use std::path::Path;

use churn_core::Probabilities;
use serde::Deserialize;

use crate::ModelError;
use crate::artifact::{Classifier, artifact_name, read_json};

const TREE_LEAF: i64 = -1;

#[derive(Deserialize)]
struct ForestFile {
    n_features: usize,
    #[serde(default)]
    feature_names: Option<Vec<String>>,
    trees: Vec<TreeFile>,
}

/// One estimator's `tree_` arrays as exported.
#[derive(Debug, Clone, Deserialize)]
pub struct TreeFile {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        proba: [f64; 2],
    },
}

/// A validated binary decision tree.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    n_features: usize,
}

impl DecisionTree {
    /// Validate exported arrays against `n_features`.
    ///
    /// Children must point forward (scikit-learn numbers nodes depth-first),
    /// which rules out cycles and guarantees traversal terminates.
    pub fn from_arrays(arrays: TreeFile, n_features: usize) -> Result<Self, ModelError> {
        Self::validate(arrays, n_features)
            .map_err(|reason| ModelError::invalid("decision tree", reason))
    }

    fn validate(arrays: TreeFile, n_features: usize) -> Result<Self, String> {
        let n = arrays.children_left.len();
        if n == 0 {
            return Err("tree has no nodes".into());
        }
        let lengths = [
            arrays.children_right.len(),
            arrays.feature.len(),
            arrays.threshold.len(),
            arrays.value.len(),
        ];
        if lengths.iter().any(|&len| len != n) {
            return Err(format!(
                "node arrays disagree in length: {n} vs {lengths:?}"
            ));
        }

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let left = arrays.children_left[i];
            let right = arrays.children_right[i];

            if left == TREE_LEAF {
                if right != TREE_LEAF {
                    return Err(format!("node {i}: leaf with a right child"));
                }
                nodes.push(Node::Leaf {
                    proba: leaf_distribution(&arrays.value[i]).map_err(|e| format!("node {i}: {e}"))?,
                });
                continue;
            }

            let child = |c: i64| -> Result<usize, String> {
                usize::try_from(c)
                    .ok()
                    .filter(|&c| c > i && c < n)
                    .ok_or_else(|| format!("node {i}: child index {c} out of range"))
            };
            let feature = usize::try_from(arrays.feature[i])
                .ok()
                .filter(|&f| f < n_features)
                .ok_or_else(|| {
                    format!("node {i}: feature index {} out of range", arrays.feature[i])
                })?;
            let threshold = arrays.threshold[i];
            if threshold.is_nan() {
                return Err(format!("node {i}: NaN threshold"));
            }

            nodes.push(Node::Split {
                feature,
                threshold,
                left: child(left)?,
                right: child(right)?,
            });
        }

        Ok(Self { nodes, n_features })
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Class distribution of the leaf `features` falls into.
    pub fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2], ModelError> {
        if features.len() != self.n_features {
            return Err(ModelError::FeatureMismatch {
                expected: self.n_features,
                found: features.len(),
            });
        }

        let mut i = 0;
        loop {
            match &self.nodes[i] {
                Node::Leaf { proba } => return Ok(*proba),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    // Inputs are compared at float32 precision, as the fitted trees expect.
                    let x = features[*feature] as f32 as f64;
                    i = if x <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

/// Normalise a leaf's class weights (counts or fractions) into probabilities.
fn leaf_distribution(value: &[f64]) -> Result<[f64; 2], String> {
    let [no, yes] = value else {
        return Err(format!("expected 2 class weights, got {}", value.len()));
    };
    if !no.is_finite() || !yes.is_finite() || *no < 0.0 || *yes < 0.0 {
        return Err(format!("invalid class weights {value:?}"));
    }
    let total = no + yes;
    if total <= 0.0 {
        return Err("leaf carries no weight".into());
    }
    Ok([no / total, yes / total])
}

/// Soft-voting ensemble of [`DecisionTree`]s.
#[derive(Debug)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
    feature_names: Option<Vec<String>>,
}

impl RandomForest {
    pub fn new(
        trees: Vec<DecisionTree>,
        n_features: usize,
        feature_names: Option<Vec<String>>,
    ) -> Result<Self, ModelError> {
        Self::build("classifier", trees, n_features, feature_names)
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let name = artifact_name(path);
        let file: ForestFile = read_json(path)?;
        let trees = file
            .trees
            .into_iter()
            .enumerate()
            .map(|(t, arrays)| {
                DecisionTree::validate(arrays, file.n_features)
                    .map_err(|reason| ModelError::invalid(&name, format!("tree {t}: {reason}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::build(&name, trees, file.n_features, file.feature_names)
    }

    fn build(
        name: &str,
        trees: Vec<DecisionTree>,
        n_features: usize,
        feature_names: Option<Vec<String>>,
    ) -> Result<Self, ModelError> {
        if trees.is_empty() {
            return Err(ModelError::invalid(name, "forest has no trees"));
        }
        if let Some(t) = trees.iter().position(|tree| tree.n_features != n_features) {
            return Err(ModelError::invalid(
                name,
                format!(
                    "tree {t} expects {} features, forest has {n_features}",
                    trees[t].n_features
                ),
            ));
        }
        if let Some(names) = &feature_names {
            if names.len() != n_features {
                return Err(ModelError::invalid(
                    name,
                    format!(
                        "{} feature names for {n_features} features",
                        names.len()
                    ),
                ));
            }
        }
        Ok(Self {
            trees,
            n_features,
            feature_names,
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Classifier for RandomForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn predict_proba(&self, features: &[f64]) -> Result<Probabilities, ModelError> {
        if features.len() != self.n_features {
            return Err(ModelError::FeatureMismatch {
                expected: self.n_features,
                found: features.len(),
            });
        }

        let mut sum = [0.0f64; 2];
        for tree in &self.trees {
            let [no, yes] = tree.predict_proba(features)?;
            sum[0] += no;
            sum[1] += yes;
        }
        let n = self.trees.len() as f64;
        Ok(Probabilities {
            no_churn: sum[0] / n,
            churn: sum[1] / n,
        })
    }

    fn describe(&self) -> String {
        let nodes: usize = self.trees.iter().map(DecisionTree::n_nodes).sum();
        format!(
            "random forest ({} trees, {nodes} nodes, {} features)",
            self.trees.len(),
            self.n_features
        )
    }
}
