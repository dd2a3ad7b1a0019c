//! Decision Tree Ensemble Regressor
//!
//! Trees use the parallel-array layout of a fitted CART tree, exported as JSON:
//!
//! ```json
//! {
//!   "n_features": 55,
//!   "aggregation": "mean",
//!   "trees": [
//!     {
//!       "children_left":  [1, -1, -1],
//!       "children_right": [2, -1, -1],
//!       "feature":        [4, -2, -2],
//!       "threshold":      [1200.5, -2.0, -2.0],
//!       "value":          [181000.0, 150000.0, 210000.0]
//!     }
//!   ]
//! }
//! ```
//!
//! A node is a leaf when `children_left == -1`. Internal nodes send a row left
//! when `row[feature] <= threshold`. Children always have a larger index than
//! their parent, which is checked on load and guarantees traversal terminates.

use crate::{ArtifactError, InferenceError, Regressor};
use serde::{Deserialize, Serialize};

/// Child index marking a leaf
pub const LEAF: i64 = -1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawTree {
    children_left: Vec<i64>,
    children_right: Vec<i64>,
    feature: Vec<i64>,
    threshold: Vec<f64>,
    value: Vec<f64>,
}

/// A single fitted regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTree", into = "RawTree")]
pub struct DecisionTree {
    children_left: Vec<i64>,
    children_right: Vec<i64>,
    feature: Vec<i64>,
    threshold: Vec<f64>,
    value: Vec<f64>,
}

impl TryFrom<RawTree> for DecisionTree {
    type Error = ArtifactError;

    fn try_from(raw: RawTree) -> Result<Self, Self::Error> {
        let n = raw.value.len();
        if n == 0 {
            return Err(ArtifactError::Invalid("tree has no nodes".to_string()));
        }
        if [
            raw.children_left.len(),
            raw.children_right.len(),
            raw.feature.len(),
            raw.threshold.len(),
        ]
        .iter()
        .any(|&len| len != n)
        {
            return Err(ArtifactError::Invalid(
                "tree node arrays differ in length".to_string(),
            ));
        }

        for node in 0..n {
            let left = raw.children_left[node];
            let right = raw.children_right[node];
            if left == LEAF {
                if right != LEAF {
                    return Err(ArtifactError::Invalid(format!(
                        "node {} has a right child but no left child",
                        node
                    )));
                }
                if !raw.value[node].is_finite() {
                    return Err(ArtifactError::Invalid(format!(
                        "leaf {} has a non-finite value",
                        node
                    )));
                }
                continue;
            }
            for child in [left, right] {
                if child <= node as i64 || child >= n as i64 {
                    return Err(ArtifactError::Invalid(format!(
                        "node {} has out-of-order child {}",
                        node, child
                    )));
                }
            }
            if raw.feature[node] < 0 {
                return Err(ArtifactError::Invalid(format!(
                    "split node {} has negative feature index",
                    node
                )));
            }
            if raw.threshold[node].is_nan() {
                return Err(ArtifactError::Invalid(format!(
                    "split node {} has a NaN threshold",
                    node
                )));
            }
        }

        Ok(Self {
            children_left: raw.children_left,
            children_right: raw.children_right,
            feature: raw.feature,
            threshold: raw.threshold,
            value: raw.value,
        })
    }
}

impl From<DecisionTree> for RawTree {
    fn from(tree: DecisionTree) -> Self {
        Self {
            children_left: tree.children_left,
            children_right: tree.children_right,
            feature: tree.feature,
            threshold: tree.threshold,
            value: tree.value,
        }
    }
}

impl DecisionTree {
    /// Tree consisting of a single leaf
    pub fn leaf(value: f64) -> Self {
        Self {
            children_left: vec![LEAF],
            children_right: vec![LEAF],
            feature: vec![-2],
            threshold: vec![-2.0],
            value: vec![value],
        }
    }

    /// Depth-one tree splitting on a single feature
    pub fn stump(feature: usize, threshold: f64, left: f64, right: f64) -> Self {
        Self {
            children_left: vec![1, LEAF, LEAF],
            children_right: vec![2, LEAF, LEAF],
            feature: vec![feature as i64, -2, -2],
            threshold: vec![threshold, -2.0, -2.0],
            value: vec![(left + right) / 2.0, left, right],
        }
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.value.len()
    }

    /// Largest feature index any split reads, if the tree has splits
    pub fn max_feature(&self) -> Option<usize> {
        self.children_left
            .iter()
            .zip(&self.feature)
            .filter(|(left, _)| **left != LEAF)
            .map(|(_, f)| *f as usize)
            .max()
    }

    /// Walk from the root to a leaf and return its value
    pub fn evaluate(&self, row: &[f64]) -> Result<f64, InferenceError> {
        let mut node = 0usize;
        loop {
            let left = self.children_left[node];
            if left == LEAF {
                return Ok(self.value[node]);
            }
            let feature = self.feature[node] as usize;
            let x = row.get(feature).copied().ok_or(InferenceError::InvalidInputShape {
                expected: feature + 1,
                actual: row.len(),
            })?;
            node = if x <= self.threshold[node] {
                left as usize
            } else {
                self.children_right[node] as usize
            };
        }
    }
}

/// How per-tree outputs combine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Average of the trees (random forest)
    #[default]
    Mean,
    /// `base_score` plus the sum of the trees (boosted ensemble)
    Sum,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawEnsemble {
    n_features: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    feature_names: Option<Vec<String>>,
    #[serde(default)]
    aggregation: Aggregation,
    #[serde(default)]
    base_score: f64,
    trees: Vec<DecisionTree>,
}

/// Fitted tree ensemble regressor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEnsemble", into = "RawEnsemble")]
pub struct TreeEnsemble {
    n_features: usize,
    feature_names: Option<Vec<String>>,
    aggregation: Aggregation,
    base_score: f64,
    trees: Vec<DecisionTree>,
}

impl TryFrom<RawEnsemble> for TreeEnsemble {
    type Error = ArtifactError;

    fn try_from(raw: RawEnsemble) -> Result<Self, Self::Error> {
        let ensemble = Self {
            n_features: raw.n_features,
            feature_names: raw.feature_names,
            aggregation: raw.aggregation,
            base_score: raw.base_score,
            trees: raw.trees,
        };
        ensemble.validate()?;
        Ok(ensemble)
    }
}

impl From<TreeEnsemble> for RawEnsemble {
    fn from(ensemble: TreeEnsemble) -> Self {
        Self {
            n_features: ensemble.n_features,
            feature_names: ensemble.feature_names,
            aggregation: ensemble.aggregation,
            base_score: ensemble.base_score,
            trees: ensemble.trees,
        }
    }
}

impl TreeEnsemble {
    /// Create an ensemble from fitted trees
    pub fn new(
        n_features: usize,
        trees: Vec<DecisionTree>,
        aggregation: Aggregation,
    ) -> Result<Self, ArtifactError> {
        let ensemble = Self {
            n_features,
            feature_names: None,
            aggregation,
            base_score: 0.0,
            trees,
        };
        ensemble.validate()?;
        Ok(ensemble)
    }

    /// Assemble trees already known to fit `n_features`
    pub(crate) fn from_parts(n_features: usize, trees: Vec<DecisionTree>, aggregation: Aggregation) -> Self {
        Self {
            n_features,
            feature_names: None,
            aggregation,
            base_score: 0.0,
            trees,
        }
    }

    /// Set the constant added under [`Aggregation::Sum`]
    pub fn with_base_score(mut self, base_score: f64) -> Self {
        self.base_score = base_score;
        self
    }

    fn validate(&self) -> Result<(), ArtifactError> {
        if self.trees.is_empty() {
            return Err(ArtifactError::Invalid("ensemble has no trees".to_string()));
        }
        if !self.base_score.is_finite() {
            return Err(ArtifactError::Invalid("base_score is not finite".to_string()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            if let Some(feature) = tree.max_feature() {
                if feature >= self.n_features {
                    return Err(ArtifactError::Invalid(format!(
                        "tree {} splits on feature {} but the model has {} features",
                        i, feature, self.n_features
                    )));
                }
            }
        }
        Ok(())
    }

    /// Number of input columns
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Column names the model was fitted on, when exported
    pub fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    /// Number of trees
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Aggregation mode
    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
    }
}

impl Regressor for TreeEnsemble {
    fn predict(&self, row: &[f64]) -> Result<f64, InferenceError> {
        if row.len() != self.n_features {
            return Err(InferenceError::InvalidInputShape {
                expected: self.n_features,
                actual: row.len(),
            });
        }

        let mut total = 0.0;
        for tree in &self.trees {
            total += tree.evaluate(row)?;
        }

        Ok(match self.aggregation {
            Aggregation::Mean => total / self.trees.len() as f64,
            Aggregation::Sum => self.base_score + total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stump_goes_left_on_equal() {
        let tree = DecisionTree::stump(0, 10.0, 1.0, 2.0);
        assert_eq!(tree.evaluate(&[10.0]).unwrap(), 1.0);
        assert_eq!(tree.evaluate(&[10.5]).unwrap(), 2.0);
    }

    #[test]
    fn test_mean_aggregation() {
        let model = TreeEnsemble::new(
            2,
            vec![
                DecisionTree::stump(0, 50.0, 100.0, 200.0),
                DecisionTree::stump(1, 30.0, -50.0, 50.0),
            ],
            Aggregation::Mean,
        )
        .unwrap();

        // 100 + -50
        assert_eq!(model.predict(&[30.0, 20.0]).unwrap(), 25.0);
        // 200 + 50
        assert_eq!(model.predict(&[60.0, 40.0]).unwrap(), 125.0);
    }

    #[test]
    fn test_sum_aggregation_with_base_score() {
        let model = TreeEnsemble::new(
            1,
            vec![DecisionTree::leaf(10.0), DecisionTree::stump(0, 0.0, -1.0, 1.0)],
            Aggregation::Sum,
        )
        .unwrap()
        .with_base_score(100.0);

        assert_eq!(model.predict(&[5.0]).unwrap(), 111.0);
    }

    #[test]
    fn test_deeper_tree_from_json() {
        // root: x0 <= 5 ? (x1 <= 1 ? 10 : 20) : 30
        let json = r#"{
            "n_features": 2,
            "trees": [{
                "children_left":  [1, 2, -1, -1, -1],
                "children_right": [4, 3, -1, -1, -1],
                "feature":        [0, 1, -2, -2, -2],
                "threshold":      [5.0, 1.0, -2.0, -2.0, -2.0],
                "value":          [20.0, 15.0, 10.0, 20.0, 30.0]
            }]
        }"#;
        let model: TreeEnsemble = serde_json::from_str(json).unwrap();
        assert_eq!(model.aggregation(), Aggregation::Mean);
        assert_eq!(model.predict(&[1.0, 0.0]).unwrap(), 10.0);
        assert_eq!(model.predict(&[1.0, 2.0]).unwrap(), 20.0);
        assert_eq!(model.predict(&[9.0, 0.0]).unwrap(), 30.0);
    }

    #[test]
    fn test_rejects_cyclic_tree() {
        let json = r#"{
            "children_left":  [1, 0, -1],
            "children_right": [2, 2, -1],
            "feature":        [0, 0, -2],
            "threshold":      [1.0, 1.0, -2.0],
            "value":          [0.0, 0.0, 0.0]
        }"#;
        let err = serde_json::from_str::<DecisionTree>(json).unwrap_err();
        assert!(err.to_string().contains("out-of-order child"));
    }

    #[test]
    fn test_rejects_ragged_arrays() {
        let json = r#"{
            "children_left":  [-1],
            "children_right": [-1, -1],
            "feature":        [-2],
            "threshold":      [-2.0],
            "value":          [1.0]
        }"#;
        assert!(serde_json::from_str::<DecisionTree>(json).is_err());
    }

    #[test]
    fn test_rejects_feature_outside_model_width() {
        let err = TreeEnsemble::new(2, vec![DecisionTree::stump(2, 0.0, 0.0, 1.0)], Aggregation::Mean)
            .unwrap_err();
        assert!(err.to_string().contains("splits on feature 2"));
    }

    #[test]
    fn test_rejects_empty_ensemble() {
        assert!(TreeEnsemble::new(1, vec![], Aggregation::Mean).is_err());
    }

    #[test]
    fn test_width_mismatch() {
        let model = TreeEnsemble::new(3, vec![DecisionTree::leaf(1.0)], Aggregation::Mean).unwrap();
        assert!(matches!(
            model.predict(&[0.0]),
            Err(InferenceError::InvalidInputShape { expected: 3, actual: 1 })
        ));
    }

    #[test]
    fn test_json_round_trip_keeps_predictions() {
        let model = TreeEnsemble::new(1, vec![DecisionTree::stump(0, 0.5, 3.0, 7.0)], Aggregation::Mean)
            .unwrap();
        let restored: TreeEnsemble = serde_json::from_str(&serde_json::to_string(&model).unwrap()).unwrap();
        assert_eq!(model, restored);
        assert_eq!(restored.predict(&[1.0]).unwrap(), 7.0);
    }
}
