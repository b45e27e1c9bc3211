use super::*;

/// Kind of values held by a feature column.
///
/// # Variants
///
/// - `Real` - Ordered numeric values, split by a threshold.
/// - `Categorical` - Unordered category codes, split by the subset of categories sent left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureType {
    Real,
    Categorical,
}

impl FromStr for FeatureType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "real" => Ok(FeatureType::Real),
            "categorical" => Ok(FeatureType::Categorical),
            other => Err(ModelError::InvalidConfiguration(format!(
                "unknown feature type \"{}\", expected \"real\" or \"categorical\"",
                other
            ))),
        }
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureType::Real => write!(f, "real"),
            FeatureType::Categorical => write!(f, "categorical"),
        }
    }
}

/// Hyperparameters limiting decision tree growth.
///
/// # Fields
///
/// - `max_depth` - Maximum depth of the tree. If `None`, nodes are expanded until they are pure or no split improves them.
/// - `min_samples_split` - Minimum number of samples required to split an internal node. Must be at least 2.
/// - `min_samples_leaf` - Minimum number of samples required on each side of a split. Splits that leave fewer samples are rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

/// Default hyperparameters for decision tree.
///
/// No depth limit (`max_depth = None`), minimum 2 samples to split (`min_samples_split = 2`)
/// and minimum 1 sample per leaf (`min_samples_leaf = 1`). With these values no limit
/// ever stops the tree before it runs out of improving splits.
impl Default for DecisionTreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

/// Branching rule of a nonterminal node.
///
/// # Variants
///
/// - `Threshold` - Real feature: samples with a value below the threshold go left.
/// - `Categories` - Categorical feature: samples whose category is in the list go left. Unseen categories go right.
#[derive(Debug, Clone, PartialEq)]
pub enum SplitRule {
    Threshold(f64),
    Categories(Vec<f64>),
}

impl SplitRule {
    /// Returns `true` if a sample with feature value `value` belongs to the left child.
    pub fn goes_left(&self, value: f64) -> bool {
        match self {
            SplitRule::Threshold(threshold) => value < *threshold,
            SplitRule::Categories(categories) => {
                let key = category_key(value);
                categories.iter().any(|&category| category_key(category) == key)
            }
        }
    }

    fn matches(&self, feature_type: FeatureType) -> bool {
        matches!(
            (self, feature_type),
            (SplitRule::Threshold(_), FeatureType::Real)
                | (SplitRule::Categories(_), FeatureType::Categorical)
        )
    }
}

/// A node of the fitted decision tree.
///
/// # Variants
///
/// - `Terminal` - A leaf predicting `label`.
/// - `Nonterminal` - A decision on feature `feature_index` using `rule`, owning both children.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Terminal {
        label: f64,
    },
    Nonterminal {
        feature_index: usize,
        rule: SplitRule,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    /// Creates a leaf predicting `label`.
    pub fn new_terminal(label: f64) -> Self {
        Node::Terminal { label }
    }

    /// Creates a decision node from its already built children.
    pub fn new_nonterminal(feature_index: usize, rule: SplitRule, left: Node, right: Node) -> Self {
        Node::Nonterminal {
            feature_index,
            rule,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Returns `true` for leaves.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Node::Terminal { .. })
    }

    /// Number of edges on the longest path from this node down to a leaf.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut pending = vec![(self, 0)];

        while let Some((node, depth)) = pending.pop() {
            match node {
                Node::Terminal { .. } => deepest = deepest.max(depth),
                Node::Nonterminal { left, right, .. } => {
                    pending.push((&**left, depth + 1));
                    pending.push((&**right, depth + 1));
                }
            }
        }

        deepest
    }

    /// Number of leaves below and including this node.
    pub fn n_leaves(&self) -> usize {
        let mut leaves = 0;
        let mut pending = vec![self];

        while let Some(node) = pending.pop() {
            match node {
                Node::Terminal { .. } => leaves += 1,
                Node::Nonterminal { left, right, .. } => {
                    pending.push(&**left);
                    pending.push(&**right);
                }
            }
        }

        leaves
    }
}

// Children are unlinked onto a heap stack, so drop depth does not grow with tree depth.
impl Drop for Node {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        detach_children(self, &mut pending);

        while let Some(mut node) = pending.pop() {
            detach_children(&mut node, &mut pending);
        }
    }
}

fn detach_children(node: &mut Node, pending: &mut Vec<Node>) {
    if let Node::Nonterminal { left, right, .. } = node {
        for child in [left, right] {
            if !child.is_terminal() {
                pending.push(std::mem::replace(&mut **child, Node::Terminal { label: 0.0 }));
            }
        }
    }
}

/// Best split of one feature at one node.
struct CandidateSplit {
    feature_index: usize,
    gini: f64,
    rule: SplitRule,
    goes_left: Vec<bool>,
}

/// Outcome of examining the samples reaching one node.
enum Expansion {
    Leaf(f64),
    Split {
        feature_index: usize,
        rule: SplitRule,
        left: Vec<usize>,
        right: Vec<usize>,
    },
}

/// Work item of the tree construction stack.
enum BuildTask {
    /// Examine the samples in `indices`, found at `depth`.
    Grow { indices: Vec<usize>, depth: usize },
    /// Join the two most recently built subtrees under a decision node.
    Join { feature_index: usize, rule: SplitRule },
}

/// Binary decision tree classifier over mixed real and categorical features.
///
/// Nodes are split greedily on the feature and threshold maximizing the Gini criterion
/// (see [`find_best_split`]). Categorical features are re-encoded at every node by ranking
/// their categories by the rate of label `1` among the samples reaching that node, so a
/// single threshold on ranks selects the best subset of categories.
///
/// Labels must be `0.0` or `1.0`.
///
/// # Fields
///
/// - `feature_types` - Kind of each feature column, fixed at construction.
/// - `params` - Hyperparameters limiting tree growth.
/// - `root` - The root node of the trained tree, or `None` if not yet fitted.
///
/// # Example
/// ```rust
/// use ginitree::machine_learning::{DecisionTree, DecisionTreeParams};
/// use ndarray::array;
///
/// // column 0 is real, column 1 holds category codes
/// let x_train = array![
///     [1.0, 0.0],
///     [2.0, 1.0],
///     [3.0, 0.0],
///     [4.0, 2.0],
///     [5.0, 2.0],
///     [6.0, 1.0],
/// ];
/// let y_train = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
///
/// let mut tree = DecisionTree::new(&["real", "categorical"], None).unwrap();
/// tree.fit(x_train.view(), y_train.view()).unwrap();
///
/// let predictions = tree.predict(x_train.view()).unwrap();
/// assert_eq!(predictions, y_train);
///
/// assert!(DecisionTree::new(&["real", "unknown"], None).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct DecisionTree {
    feature_types: Vec<FeatureType>,
    params: DecisionTreeParams,
    root: Option<Box<Node>>,
}

impl DecisionTree {
    /// Creates a new decision tree from feature type names.
    ///
    /// # Parameters
    ///
    /// - `feature_types` - One name per column, each `"real"` or `"categorical"`.
    /// - `params` - Optional hyperparameters. If `None`, default parameters are used.
    ///
    /// # Returns
    ///
    /// - `Ok(DecisionTree)` - A new untrained tree
    /// - `Err(ModelError::InvalidConfiguration)` - If a name is unknown, no feature is declared or the hyperparameters are out of range
    pub fn new<S: AsRef<str>>(
        feature_types: &[S],
        params: Option<DecisionTreeParams>,
    ) -> Result<Self, ModelError> {
        let feature_types = feature_types
            .iter()
            .map(|name| name.as_ref().parse::<FeatureType>())
            .collect::<Result<Vec<_>, _>>()?;

        Self::with_feature_types(feature_types, params)
    }

    /// Creates a new decision tree from already typed feature kinds.
    ///
    /// # Parameters
    ///
    /// - `feature_types` - Kind of each column.
    /// - `params` - Optional hyperparameters. If `None`, default parameters are used.
    ///
    /// # Returns
    ///
    /// - `Ok(DecisionTree)` - A new untrained tree
    /// - `Err(ModelError::InvalidConfiguration)` - If no feature is declared or the hyperparameters are out of range
    pub fn with_feature_types(
        feature_types: Vec<FeatureType>,
        params: Option<DecisionTreeParams>,
    ) -> Result<Self, ModelError> {
        if feature_types.is_empty() {
            return Err(ModelError::InvalidConfiguration(
                "at least one feature type must be declared".to_string(),
            ));
        }

        let params = params.unwrap_or_default();
        validate_tree_params(&params)?;

        Ok(Self {
            feature_types,
            params,
            root: None,
        })
    }

    // Getters
    get_field_as_ref!(get_feature_types, feature_types, &[FeatureType]);
    get_field_as_ref!(get_parameters, params, &DecisionTreeParams);

    /// Gets the root of the fitted tree, or `None` before `fit`.
    pub fn get_root(&self) -> Option<&Node> {
        self.root.as_deref()
    }

    /// Gets the number of feature columns the tree expects.
    pub fn get_n_features(&self) -> usize {
        self.feature_types.len()
    }

    /// Gets the depth of the fitted tree.
    ///
    /// # Returns
    ///
    /// - `Ok(usize)` - Number of edges on the longest root-to-leaf path
    /// - `Err(ModelError::NotFitted)` - If the tree has not been fitted
    pub fn get_depth(&self) -> Result<usize, ModelError> {
        Ok(self.fitted_root()?.depth())
    }

    /// Gets the number of leaves of the fitted tree.
    ///
    /// # Returns
    ///
    /// - `Ok(usize)` - Number of terminal nodes
    /// - `Err(ModelError::NotFitted)` - If the tree has not been fitted
    pub fn get_n_leaves(&self) -> Result<usize, ModelError> {
        Ok(self.fitted_root()?.n_leaves())
    }

    #[cfg(test)]
    pub(crate) fn from_parts(feature_types: Vec<FeatureType>, root: Node) -> Self {
        Self {
            feature_types,
            params: DecisionTreeParams::default(),
            root: Some(Box::new(root)),
        }
    }

    fn fitted_root(&self) -> Result<&Node, ModelError> {
        self.root.as_deref().ok_or(ModelError::NotFitted)
    }

    /// Trains the decision tree on the provided training data.
    ///
    /// Any previously fitted tree is discarded first, so a failed call leaves the model unfitted.
    ///
    /// # Parameters
    ///
    /// - `x` - Training features as a 2D array with shape (n_samples, n_features). Categorical columns hold category codes.
    /// - `y` - Training labels as a 1D array with shape (n_samples,), each `0.0` or `1.0`.
    ///
    /// # Returns
    ///
    /// * `Result<&mut Self, ModelError>` - A mutable reference to `self` for method chaining, or a `ModelError` if training fails.
    pub fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<&mut Self, ModelError> {
        self.root = None;

        preliminary_check(&x, Some(&y))?;
        validate_binary_labels(&y)?;

        if x.ncols() != self.feature_types.len() {
            return Err(ModelError::InputValidationError(format!(
                "expected {} feature columns, got {}",
                self.feature_types.len(),
                x.ncols()
            )));
        }

        let root = self.build_tree(x, y)?;

        debug!(
            n_samples = x.nrows(),
            n_features = x.ncols(),
            depth = root.depth(),
            n_leaves = root.n_leaves(),
            "fitted decision tree"
        );

        self.root = Some(Box::new(root));
        Ok(self)
    }

    /// Builds the tree for validated training data.
    ///
    /// Nodes are grown depth-first from an explicit task stack. Finished subtrees wait on
    /// `built` until both children of a decision node exist, so every node is assembled
    /// bottom-up and never modified afterwards.
    fn build_tree(&self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<Node, ModelError> {
        let mut tasks = vec![BuildTask::Grow {
            indices: (0..x.nrows()).collect(),
            depth: 0,
        }];
        let mut built: Vec<Node> = Vec::new();

        while let Some(task) = tasks.pop() {
            match task {
                BuildTask::Grow { indices, depth } => match self.expand_node(x, y, &indices, depth)? {
                    Expansion::Leaf(label) => built.push(Node::new_terminal(label)),
                    Expansion::Split {
                        feature_index,
                        rule,
                        left,
                        right,
                    } => {
                        // popped in reverse: left subtree, right subtree, then the join
                        tasks.push(BuildTask::Join {
                            feature_index,
                            rule,
                        });
                        tasks.push(BuildTask::Grow {
                            indices: right,
                            depth: depth + 1,
                        });
                        tasks.push(BuildTask::Grow {
                            indices: left,
                            depth: depth + 1,
                        });
                    }
                },
                BuildTask::Join {
                    feature_index,
                    rule,
                } => {
                    let (Some(right), Some(left)) = (built.pop(), built.pop()) else {
                        return Err(ModelError::InternalInconsistency(
                            "decision node joined before both subtrees were built".to_string(),
                        ));
                    };
                    built.push(Node::new_nonterminal(feature_index, rule, left, right));
                }
            }
        }

        match built.pop() {
            Some(root) if built.is_empty() => Ok(root),
            _ => Err(ModelError::InternalInconsistency(format!(
                "tree construction left {} unattached subtrees",
                built.len()
            ))),
        }
    }

    /// Decides whether the samples in `indices` form a leaf or are split in two.
    fn expand_node(
        &self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        indices: &[usize],
        depth: usize,
    ) -> Result<Expansion, ModelError> {
        let labels = y.select(Axis(0), indices);

        if labels.iter().all(|&label| label == labels[0]) {
            trace!(depth, n_samples = indices.len(), "pure node");
            return Ok(Expansion::Leaf(labels[0]));
        }

        if self.params.max_depth.is_some_and(|max_depth| depth >= max_depth)
            || indices.len() < self.params.min_samples_split
        {
            trace!(depth, n_samples = indices.len(), "growth limit reached");
            return Ok(Expansion::Leaf(majority_label(labels.view())));
        }

        let candidates = (0..self.feature_types.len())
            .into_par_iter()
            .map(|feature_index| self.evaluate_feature(x, labels.view(), indices, feature_index))
            .collect::<Result<Vec<_>, _>>()?;

        // strict comparison in column order: the lowest feature index wins ties
        let best = candidates
            .into_iter()
            .flatten()
            .fold(None, |best: Option<CandidateSplit>, candidate| match best {
                Some(best) if candidate.gini <= best.gini => Some(best),
                _ => Some(candidate),
            });

        let Some(best) = best else {
            trace!(depth, n_samples = indices.len(), "no usable feature");
            return Ok(Expansion::Leaf(majority_label(labels.view())));
        };

        let mut left = Vec::new();
        let mut right = Vec::new();
        for (&index, &goes_left) in indices.iter().zip(&best.goes_left) {
            if goes_left {
                left.push(index);
            } else {
                right.push(index);
            }
        }

        if left.len() < self.params.min_samples_leaf || right.len() < self.params.min_samples_leaf {
            trace!(depth, n_samples = indices.len(), "split rejected by min_samples_leaf");
            return Ok(Expansion::Leaf(majority_label(labels.view())));
        }

        trace!(
            depth,
            feature = best.feature_index,
            gini = best.gini,
            n_left = left.len(),
            n_right = right.len(),
            "split node"
        );

        Ok(Expansion::Split {
            feature_index: best.feature_index,
            rule: best.rule,
            left,
            right,
        })
    }

    /// Finds the best split of one feature over the samples in `indices`.
    fn evaluate_feature(
        &self,
        x: ArrayView2<f64>,
        labels: ArrayView1<f64>,
        indices: &[usize],
        feature_index: usize,
    ) -> Result<Option<CandidateSplit>, ModelError> {
        let column = x.column(feature_index).select(Axis(0), indices);

        let (encoded, ranking) = match self.feature_types[feature_index] {
            FeatureType::Real => (column, None),
            FeatureType::Categorical => {
                let ranking = CategoryRanking::fit_unchecked(column.view(), labels);
                (ranking.encode(column.view())?, Some(ranking))
            }
        };

        let Some(split) = find_best_split_unchecked(encoded.view(), labels) else {
            return Ok(None);
        };

        let threshold = split.get_threshold_best();
        let rule = match ranking {
            None => SplitRule::Threshold(threshold),
            Some(ranking) => SplitRule::Categories(ranking.categories_below(threshold)),
        };

        Ok(Some(CandidateSplit {
            feature_index,
            gini: split.get_gini_best(),
            rule,
            goes_left: encoded.iter().map(|&value| value < threshold).collect(),
        }))
    }

    /// Predicts the label of a single sample.
    ///
    /// # Parameters
    ///
    /// * `x` - Feature vector for a single sample as a slice of length `n_features`.
    ///
    /// # Returns
    ///
    /// * `Result<f64, ModelError>` - The predicted label, or a `ModelError` if prediction fails.
    pub fn predict_one(&self, x: &[f64]) -> Result<f64, ModelError> {
        let root = self.fitted_root()?;

        if x.len() != self.feature_types.len() {
            return Err(ModelError::InputValidationError(format!(
                "expected {} features, got {}",
                self.feature_types.len(),
                x.len()
            )));
        }

        self.traverse_tree(root, ArrayView1::from(x))
    }

    /// Walks from `root` down to a leaf and returns its label for a single sample.
    fn traverse_tree(&self, root: &Node, x: ArrayView1<f64>) -> Result<f64, ModelError> {
        let mut node = root;

        loop {
            match node {
                Node::Terminal { label } => return Ok(*label),
                Node::Nonterminal {
                    feature_index,
                    rule,
                    left,
                    right,
                } => {
                    let feature_type = self.feature_types.get(*feature_index).ok_or_else(|| {
                        ModelError::InternalInconsistency(format!(
                            "node splits on feature {} but only {} are declared",
                            feature_index,
                            self.feature_types.len()
                        ))
                    })?;

                    if !rule.matches(*feature_type) {
                        return Err(ModelError::InternalInconsistency(format!(
                            "feature {} is {} but its node holds {:?}",
                            feature_index, feature_type, rule
                        )));
                    }

                    node = if rule.goes_left(x[*feature_index]) {
                        &**left
                    } else {
                        &**right
                    };
                }
            }
        }
    }

    /// Predicts labels for multiple samples using parallel processing.
    ///
    /// # Parameters
    ///
    /// * `x` - Feature matrix as a 2D array with shape (n_samples, n_features).
    ///
    /// # Returns
    ///
    /// * `Result<Array1<f64>, ModelError>` - A 1D array of predicted labels in input row order, or a `ModelError` if prediction fails.
    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, ModelError> {
        let root = self.fitted_root()?;

        if x.ncols() != self.feature_types.len() {
            return Err(ModelError::InputValidationError(format!(
                "expected {} feature columns, got {}",
                self.feature_types.len(),
                x.ncols()
            )));
        }

        let predictions: Result<Vec<f64>, ModelError> = x
            .axis_iter(Axis(0))
            .into_par_iter()
            .map(|row| self.traverse_tree(root, row))
            .collect();

        Ok(Array1::from_vec(predictions?))
    }

    /// Trains the tree on training data and immediately makes predictions on test data.
    ///
    /// # Parameters
    ///
    /// - `x_train` - Training features as a 2D array with shape (n_train_samples, n_features).
    /// - `y_train` - Training labels as a 1D array with shape (n_train_samples,).
    /// - `x_test` - Test features as a 2D array with shape (n_test_samples, n_features).
    ///
    /// # Returns
    ///
    /// * `Result<Array1<f64>, ModelError>` - A 1D array of predictions for the test data, or a `ModelError` if training or prediction fails.
    pub fn fit_predict(
        &mut self,
        x_train: ArrayView2<f64>,
        y_train: ArrayView1<f64>,
        x_test: ArrayView2<f64>,
    ) -> Result<Array1<f64>, ModelError> {
        self.fit(x_train, y_train)?;
        self.predict(x_test)
    }

    /// Generates a human-readable string representation of the decision tree structure.
    ///
    /// # Returns
    ///
    /// * `Result<String, ModelError>` - A formatted string containing the tree structure, or a `ModelError::NotFitted` if the model hasn't been trained yet.
    pub fn generate_tree_structure(&self) -> Result<String, ModelError> {
        let root = self.fitted_root()?;

        let mut output = String::new();
        output.push_str("Decision Tree Structure:\n");
        print_node(root, &mut output);
        Ok(output)
    }
}

/// Most frequent label, falling back to the first label on a tie.
fn majority_label(labels: ArrayView1<f64>) -> f64 {
    let positives = labels.iter().filter(|&&label| label == 1.0).count();
    let negatives = labels.len() - positives;

    match positives.cmp(&negatives) {
        std::cmp::Ordering::Greater => 1.0,
        std::cmp::Ordering::Less => 0.0,
        std::cmp::Ordering::Equal => labels[0],
    }
}

// Print tree structure, left subtree first
fn print_node(root: &Node, output: &mut String) {
    let mut pending = vec![(root, String::new(), true)];

    while let Some((node, prefix, is_last)) = pending.pop() {
        let connector = if is_last { "└── " } else { "├── " };
        output.push_str(&format!("{}{}", prefix, connector));

        match node {
            Node::Terminal { label } => {
                output.push_str(&format!("Leaf: class={}\n", label));
            }
            Node::Nonterminal {
                feature_index,
                rule,
                left,
                right,
            } => {
                match rule {
                    SplitRule::Threshold(threshold) => output.push_str(&format!(
                        "Split: feature[{}] < {:.4}\n",
                        feature_index, threshold
                    )),
                    SplitRule::Categories(categories) => output.push_str(&format!(
                        "Split: feature[{}] in {:?}\n",
                        feature_index, categories
                    )),
                }

                let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
                pending.push((&**right, child_prefix.clone(), true));
                pending.push((&**left, child_prefix, false));
            }
        }
    }
}
