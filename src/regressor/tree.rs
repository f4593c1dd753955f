//! Fitted regression tree
//!
//! Nodes live in flat parallel arrays indexed by node id, root at 0. A node
//! is a leaf when both children are [`TREE_LEAF`]; `feature` and `threshold`
//! are ignored on leaves, `value` on splits.

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Child id marking a leaf
pub const TREE_LEAF: i64 = -1;

/// Nested form of a tree, used to build one by hand
#[derive(Debug, Clone)]
pub enum TreeNode {
    /// Leaf node with prediction value
    Leaf { value: f64 },
    /// Internal node: go left when `x[feature] <= threshold`
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    pub fn leaf(value: f64) -> Self {
        TreeNode::Leaf { value }
    }

    pub fn split(feature: usize, threshold: f64, left: TreeNode, right: TreeNode) -> Self {
        TreeNode::Split {
            feature,
            threshold,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

/// Regression tree model
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionTree {
    feature: Vec<usize>,
    threshold: Vec<f64>,
    children_left: Vec<i64>,
    children_right: Vec<i64>,
    value: Vec<f64>,
}

impl DecisionTree {
    /// Flatten a nested tree, nodes numbered in pre-order
    pub fn new(root: TreeNode) -> Self {
        let mut tree = Self::default();
        // node to place, and the parent slot (id, is_left) pointing at it
        let mut stack: Vec<(TreeNode, Option<(usize, bool)>)> = vec![(root, None)];

        while let Some((node, parent)) = stack.pop() {
            let id = tree.value.len();
            match parent {
                Some((p, true)) => tree.children_left[p] = id as i64,
                Some((p, false)) => tree.children_right[p] = id as i64,
                None => {}
            }
            match node {
                TreeNode::Leaf { value } => tree.push(0, 0.0, TREE_LEAF, TREE_LEAF, value),
                TreeNode::Split { feature, threshold, left, right } => {
                    // children are patched in once they get an id
                    tree.push(feature, threshold, TREE_LEAF, TREE_LEAF, 0.0);
                    stack.push((*right, Some((id, false))));
                    stack.push((*left, Some((id, true))));
                }
            }
        }
        tree
    }

    /// Build from parallel node arrays, checking the structure
    pub fn from_arrays(
        feature: Vec<usize>,
        threshold: Vec<f64>,
        children_left: Vec<i64>,
        children_right: Vec<i64>,
        value: Vec<f64>,
    ) -> Result<Self> {
        let tree = Self {
            feature,
            threshold,
            children_left,
            children_right,
            value,
        };
        tree.validate()?;
        Ok(tree)
    }

    fn push(&mut self, feature: usize, threshold: f64, left: i64, right: i64, value: f64) {
        self.feature.push(feature);
        self.threshold.push(threshold);
        self.children_left.push(left);
        self.children_right.push(right);
        self.value.push(value);
    }

    pub fn n_nodes(&self) -> usize {
        self.value.len()
    }

    fn is_leaf(&self, node: usize) -> bool {
        self.children_left[node] == TREE_LEAF && self.children_right[node] == TREE_LEAF
    }

    fn child(&self, id: i64) -> Option<usize> {
        usize::try_from(id).ok().filter(|&c| c < self.n_nodes())
    }

    /// Check array lengths, child ids, and that every node is reached exactly once from the root
    pub fn validate(&self) -> Result<()> {
        let n = self.n_nodes();
        if n == 0 {
            return Err(PipelineError::ArtifactError("tree has no nodes".to_string()));
        }
        let lengths = [
            self.feature.len(),
            self.threshold.len(),
            self.children_left.len(),
            self.children_right.len(),
        ];
        if lengths.iter().any(|&len| len != n) {
            return Err(PipelineError::ArtifactError(format!(
                "tree node arrays differ in length: feature {}, threshold {}, children_left {}, children_right {}, value {}",
                lengths[0], lengths[1], lengths[2], lengths[3], n
            )));
        }

        let mut visited = vec![false; n];
        let mut stack = vec![0usize];
        while let Some(node) = stack.pop() {
            if std::mem::replace(&mut visited[node], true) {
                return Err(PipelineError::ArtifactError(format!(
                    "tree node {} is reached more than once",
                    node
                )));
            }
            if self.is_leaf(node) {
                continue;
            }
            for id in [self.children_left[node], self.children_right[node]] {
                let child = self.child(id).ok_or_else(|| {
                    PipelineError::ArtifactError(format!(
                        "tree node {} has child {} outside 0..{}",
                        node, id, n
                    ))
                })?;
                stack.push(child);
            }
        }

        if let Some(node) = visited.iter().position(|v| !v) {
            return Err(PipelineError::ArtifactError(format!(
                "tree node {} is unreachable from the root",
                node
            )));
        }
        Ok(())
    }

    /// Evaluate a single sample
    pub fn predict_sample(&self, sample: ArrayView1<'_, f64>) -> f64 {
        let mut node = 0;
        // a valid tree reaches a leaf in fewer hops than it has nodes
        for _ in 0..self.n_nodes() {
            let (Some(&feature), Some(&threshold), Some(&left), Some(&right)) = (
                self.feature.get(node),
                self.threshold.get(node),
                self.children_left.get(node),
                self.children_right.get(node),
            ) else {
                break;
            };
            if left == TREE_LEAF && right == TREE_LEAF {
                return self.value[node];
            }
            // Out-of-range features compare as NaN and go right
            let x = sample.get(feature).copied().unwrap_or(f64::NAN);
            match self.child(if x <= threshold { left } else { right }) {
                Some(child) => node = child,
                None => break,
            }
        }
        f64::NAN
    }

    /// `(feature, threshold, value, is_leaf)` per node
    fn nodes(&self) -> impl Iterator<Item = (usize, f64, f64, bool)> + '_ {
        self.feature
            .iter()
            .zip(&self.threshold)
            .zip(self.children_left.iter().zip(&self.children_right))
            .zip(&self.value)
            .map(|(((&f, &t), (&l, &r)), &v)| (f, t, v, l == TREE_LEAF && r == TREE_LEAF))
    }

    /// Largest feature index any split reads
    pub fn max_feature_index(&self) -> Option<usize> {
        self.nodes().filter(|n| !n.3).map(|n| n.0).max()
    }

    /// Whether every split threshold and leaf value is finite
    pub fn is_finite(&self) -> bool {
        self.nodes().all(|(_, threshold, value, leaf)| {
            if leaf {
                value.is_finite()
            } else {
                threshold.is_finite()
            }
        })
    }

    /// Get tree depth, a lone leaf counts as 1
    pub fn depth(&self) -> usize {
        if self.n_nodes() == 0 {
            return 0;
        }
        let mut deepest = 0;
        let mut visited = vec![false; self.n_nodes()];
        let mut stack = vec![(0usize, 1usize)];
        while let Some((node, depth)) = stack.pop() {
            if std::mem::replace(&mut visited[node], true) {
                continue;
            }
            deepest = deepest.max(depth);
            let (Some(&left), Some(&right)) = (self.children_left.get(node), self.children_right.get(node)) else {
                continue;
            };
            if left == TREE_LEAF && right == TREE_LEAF {
                continue;
            }
            for id in [left, right] {
                if let Some(child) = self.child(id) {
                    stack.push((child, depth + 1));
                }
            }
        }
        deepest
    }
}
