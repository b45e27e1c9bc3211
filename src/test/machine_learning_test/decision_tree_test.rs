use super::*;

fn fitted(feature_types: &[&str], x: &Array2<f64>, y: &Array1<f64>) -> DecisionTree {
    let mut tree = DecisionTree::new(feature_types, None).unwrap();
    tree.fit(x.view(), y.view()).unwrap();
    tree
}

#[test]
fn test_decision_tree_new() {
    let tree = DecisionTree::new(&["real", "categorical"], None).unwrap();

    assert_eq!(
        tree.get_feature_types(),
        &[FeatureType::Real, FeatureType::Categorical]
    );
    assert_eq!(tree.get_parameters(), &DecisionTreeParams::default());
    assert_eq!(tree.get_n_features(), 2);
    assert!(tree.get_root().is_none());
}

#[test]
fn test_unknown_feature_type_is_rejected() {
    let result = DecisionTree::new(&["real", "unknown"], None);

    assert!(matches!(result, Err(ModelError::InvalidConfiguration(_))));
}

#[test]
fn test_empty_feature_types_are_rejected() {
    let result = DecisionTree::new::<&str>(&[], None);

    assert!(matches!(result, Err(ModelError::InvalidConfiguration(_))));
}

#[test]
fn test_invalid_params_are_rejected() {
    let too_small_split = DecisionTreeParams {
        min_samples_split: 1,
        ..Default::default()
    };
    assert!(matches!(
        DecisionTree::new(&["real"], Some(too_small_split)),
        Err(ModelError::InvalidConfiguration(_))
    ));

    let empty_leaf = DecisionTreeParams {
        min_samples_leaf: 0,
        ..Default::default()
    };
    assert!(matches!(
        DecisionTree::with_feature_types(vec![FeatureType::Real], Some(empty_leaf)),
        Err(ModelError::InvalidConfiguration(_))
    ));
}

#[test]
fn test_feature_type_from_str() {
    assert_eq!("real".parse::<FeatureType>(), Ok(FeatureType::Real));
    assert_eq!(
        "categorical".parse::<FeatureType>(),
        Ok(FeatureType::Categorical)
    );
    assert!(matches!(
        "Categorical".parse::<FeatureType>(),
        Err(ModelError::InvalidConfiguration(_))
    ));
}

#[test]
fn test_predict_before_fit() {
    let tree = DecisionTree::new(&["real"], None).unwrap();

    assert_eq!(tree.predict(array![[1.0]].view()), Err(ModelError::NotFitted));
    assert_eq!(tree.predict_one(&[1.0]), Err(ModelError::NotFitted));
    assert_eq!(tree.get_depth(), Err(ModelError::NotFitted));
    assert_eq!(tree.generate_tree_structure(), Err(ModelError::NotFitted));
}

#[test]
fn test_fit_rejects_bad_input() {
    let mut tree = DecisionTree::new(&["real", "real"], None).unwrap();

    let x = array![[1.0, 2.0], [3.0, 4.0]];
    let non_binary = array![0.0, 2.0];
    assert!(matches!(
        tree.fit(x.view(), non_binary.view()),
        Err(ModelError::InputValidationError(_))
    ));

    let short = array![0.0];
    assert!(matches!(
        tree.fit(x.view(), short.view()),
        Err(ModelError::InputValidationError(_))
    ));

    let one_column = array![[1.0], [2.0]];
    let y = array![0.0, 1.0];
    assert!(matches!(
        tree.fit(one_column.view(), y.view()),
        Err(ModelError::InputValidationError(_))
    ));

    let with_nan = array![[1.0, f64::NAN], [3.0, 4.0]];
    assert!(matches!(
        tree.fit(with_nan.view(), y.view()),
        Err(ModelError::InputValidationError(_))
    ));
}

#[test]
fn test_failed_refit_leaves_model_unfitted() {
    let x = array![[1.0], [2.0]];
    let mut tree = fitted(&["real"], &x, &array![0.0, 1.0]);
    assert!(tree.get_root().is_some());

    assert!(tree.fit(x.view(), array![0.0, 3.0].view()).is_err());
    assert!(tree.get_root().is_none());
    assert_eq!(tree.predict(x.view()), Err(ModelError::NotFitted));
}

#[test]
fn test_perfect_real_separator() {
    // column 1 is noise, column 0 separates at 3.5
    let x = array![
        [1.0, 5.0],
        [2.0, 3.0],
        [3.0, 9.0],
        [4.0, 1.0],
        [5.0, 2.0],
        [6.0, 7.0]
    ];
    let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

    let tree = fitted(&["real", "real"], &x, &y);

    let expected = Node::new_nonterminal(
        0,
        SplitRule::Threshold(3.5),
        Node::new_terminal(0.0),
        Node::new_terminal(1.0),
    );
    assert_eq!(tree.get_root(), Some(&expected));
    assert_eq!(tree.get_depth(), Ok(1));
    assert_eq!(tree.get_n_leaves(), Ok(2));
    assert_eq!(tree.predict(x.view()).unwrap(), y);
}

#[test]
fn test_threshold_boundary_goes_right() {
    let x = array![[1.0], [2.0], [3.0], [4.0]];
    let y = array![0.0, 0.0, 1.0, 1.0];
    let tree = fitted(&["real"], &x, &y);

    assert_eq!(tree.predict_one(&[2.4999]), Ok(0.0));
    assert_eq!(tree.predict_one(&[2.5]), Ok(1.0));
}

#[test]
fn test_xor_needs_two_levels() {
    let x = array![[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
    let y = array![0.0, 1.0, 1.0, 0.0];

    let tree = fitted(&["real", "real"], &x, &y);

    // both features tie at the root, so the first one is used
    match tree.get_root() {
        Some(Node::Nonterminal { feature_index, .. }) => assert_eq!(*feature_index, 0),
        other => panic!("expected a nonterminal root, got {:?}", other),
    }
    assert_eq!(tree.get_depth(), Ok(2));
    assert_eq!(tree.get_n_leaves(), Ok(4));
    assert_eq!(tree.predict(x.view()).unwrap(), y);
}

#[test]
fn test_categorical_split_uses_ranked_categories() {
    // category rates: 10 -> 1.0, 20 -> 0.0, 30 -> 1.0
    let x = array![[10.0], [20.0], [30.0], [10.0], [20.0], [30.0]];
    let y = array![1.0, 0.0, 1.0, 1.0, 0.0, 1.0];

    let tree = fitted(&["categorical"], &x, &y);

    let expected = Node::new_nonterminal(
        0,
        SplitRule::Categories(vec![20.0]),
        Node::new_terminal(0.0),
        Node::new_terminal(1.0),
    );
    assert_eq!(tree.get_root(), Some(&expected));
    assert_eq!(tree.predict(x.view()).unwrap(), y);
}

#[test]
fn test_unseen_category_routes_right() {
    let x = array![[1.0], [2.0], [1.0], [2.0]];
    let y = array![0.0, 1.0, 0.0, 1.0];

    let tree = fitted(&["categorical"], &x, &y);

    assert_eq!(tree.predict_one(&[1.0]), Ok(0.0));
    assert_eq!(tree.predict_one(&[2.0]), Ok(1.0));
    assert_eq!(tree.predict_one(&[42.0]), Ok(1.0));
}

#[test]
fn test_mixed_features() {
    // column 1 (categorical) is the only perfect separator
    let x = array![
        [1.0, 3.0],
        [2.0, 7.0],
        [3.0, 3.0],
        [4.0, 5.0],
        [5.0, 7.0],
        [6.0, 5.0]
    ];
    let y = array![1.0, 0.0, 1.0, 1.0, 0.0, 1.0];

    let tree = fitted(&["real", "categorical"], &x, &y);

    match tree.get_root() {
        Some(Node::Nonterminal {
            feature_index,
            rule: SplitRule::Categories(left),
            ..
        }) => {
            assert_eq!(*feature_index, 1);
            assert_eq!(left, &vec![7.0]);
        }
        other => panic!("expected a categorical root split, got {:?}", other),
    }
    assert_eq!(tree.predict(x.view()).unwrap(), y);
}

#[test]
fn test_pure_labels_give_single_leaf() {
    let x = array![[1.0], [2.0], [3.0]];
    let y = array![1.0, 1.0, 1.0];

    let tree = fitted(&["real"], &x, &y);

    assert_eq!(tree.get_root(), Some(&Node::new_terminal(1.0)));
}

#[test]
fn test_unsplittable_node_takes_majority() {
    let x = array![[1.0], [1.0], [1.0]];
    let tree = fitted(&["real"], &x, &array![0.0, 1.0, 1.0]);
    assert_eq!(tree.get_root(), Some(&Node::new_terminal(1.0)));

    // equal counts fall back to the first label at the node
    let x = array![[1.0], [1.0]];
    let tree = fitted(&["categorical"], &x, &array![1.0, 0.0]);
    assert_eq!(tree.get_root(), Some(&Node::new_terminal(1.0)));
    let tree = fitted(&["categorical"], &x, &array![0.0, 1.0]);
    assert_eq!(tree.get_root(), Some(&Node::new_terminal(0.0)));
}

#[test]
fn test_max_depth_limits_growth() {
    let x = array![[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0], [1.0, 1.0]];
    let y = array![0.0, 1.0, 1.0, 0.0, 0.0];

    let params = DecisionTreeParams {
        max_depth: Some(0),
        ..Default::default()
    };
    let mut tree = DecisionTree::new(&["real", "real"], Some(params)).unwrap();
    tree.fit(x.view(), y.view()).unwrap();
    assert_eq!(tree.get_root(), Some(&Node::new_terminal(0.0)));

    let params = DecisionTreeParams {
        max_depth: Some(1),
        ..Default::default()
    };
    let mut tree = DecisionTree::new(&["real", "real"], Some(params)).unwrap();
    tree.fit(x.view(), y.view()).unwrap();
    assert_eq!(tree.get_depth(), Ok(1));
}

#[test]
fn test_min_samples_limits() {
    let x = array![[1.0], [2.0], [3.0], [4.0]];
    let y = array![0.0, 1.0, 1.0, 1.0];

    // the only improving split leaves a single sample on the left
    let params = DecisionTreeParams {
        min_samples_leaf: 2,
        ..Default::default()
    };
    let mut tree = DecisionTree::new(&["real"], Some(params)).unwrap();
    tree.fit(x.view(), y.view()).unwrap();
    assert_eq!(tree.get_root(), Some(&Node::new_terminal(1.0)));

    let params = DecisionTreeParams {
        min_samples_split: 5,
        ..Default::default()
    };
    let mut tree = DecisionTree::new(&["real"], Some(params)).unwrap();
    tree.fit(x.view(), y.view()).unwrap();
    assert!(tree.get_root().is_some_and(Node::is_terminal));

    let mut tree = DecisionTree::new(&["real"], None).unwrap();
    tree.fit(x.view(), y.view()).unwrap();
    assert_eq!(tree.get_depth(), Ok(1));
}

#[test]
fn test_predict_dimension_mismatch() {
    let x = array![[1.0, 0.0], [2.0, 1.0]];
    let tree = fitted(&["real", "categorical"], &x, &array![0.0, 1.0]);

    assert!(matches!(
        tree.predict(array![[1.0]].view()),
        Err(ModelError::InputValidationError(_))
    ));
    assert!(matches!(
        tree.predict_one(&[1.0, 2.0, 3.0]),
        Err(ModelError::InputValidationError(_))
    ));
}

#[test]
fn test_rule_type_mismatch_is_internal_inconsistency() {
    let root = Node::new_nonterminal(
        0,
        SplitRule::Threshold(0.5),
        Node::new_terminal(0.0),
        Node::new_terminal(1.0),
    );
    let tree = DecisionTree::from_parts(vec![FeatureType::Categorical], root);

    assert!(matches!(
        tree.predict_one(&[1.0]),
        Err(ModelError::InternalInconsistency(_))
    ));

    let root = Node::new_nonterminal(
        3,
        SplitRule::Threshold(0.5),
        Node::new_terminal(0.0),
        Node::new_terminal(1.0),
    );
    let tree = DecisionTree::from_parts(vec![FeatureType::Real], root);

    assert!(matches!(
        tree.predict(array![[1.0]].view()),
        Err(ModelError::InternalInconsistency(_))
    ));
}

#[test]
fn test_fit_predict() {
    let x_train = array![[1.0], [2.0], [3.0], [4.0]];
    let y_train = array![0.0, 0.0, 1.0, 1.0];
    let x_test = array![[0.0], [10.0]];

    let mut tree = DecisionTree::new(&["real"], None).unwrap();
    let predictions = tree
        .fit_predict(x_train.view(), y_train.view(), x_test.view())
        .unwrap();

    assert_eq!(predictions, array![0.0, 1.0]);
}

#[test]
fn test_generate_tree_structure() {
    let x = array![[1.0, 10.0], [2.0, 20.0], [3.0, 10.0], [4.0, 20.0]];
    let y = array![0.0, 1.0, 0.0, 1.0];
    let tree = fitted(&["real", "categorical"], &x, &y);

    let structure = tree.generate_tree_structure().unwrap();

    assert!(structure.starts_with("Decision Tree Structure:\n"));
    assert!(structure.contains("Split: feature[1] in [10.0]"));
    assert!(structure.contains("Leaf: class=0"));
    assert!(structure.contains("Leaf: class=1"));
}

#[test]
fn test_split_scores_are_comparable_across_features() {
    let x = array![[1.0, 1.0], [2.0, 2.0], [3.0, 1.0], [4.0, 2.0], [5.0, 2.0]];
    let y = array![0.0, 0.0, 1.0, 1.0, 0.0];

    let real = find_best_split(x.column(0), y.view()).unwrap().unwrap();
    let other = find_best_split(x.column(1), y.view()).unwrap().unwrap();
    assert!(real.get_gini_best() > other.get_gini_best());

    let tree = fitted(&["real", "real"], &x, &y);
    match tree.get_root() {
        Some(Node::Nonterminal { feature_index, .. }) => assert_eq!(*feature_index, 0),
        other => panic!("expected a nonterminal root, got {:?}", other),
    }
    assert_abs_diff_eq!(
        tree.predict(x.view()).unwrap().sum(),
        y.sum(),
        epsilon = 1e-12
    );
}

fn alternating_chain(n_samples: usize) -> (Array2<f64>, Array1<f64>) {
    let x = Array2::from_shape_fn((n_samples, 1), |(i, _)| i as f64);
    let y = Array1::from_shape_fn(n_samples, |i| (i % 2) as f64);
    (x, y)
}

#[test]
fn test_alternating_labels_grow_a_deep_chain() {
    // every node peels off a single sample, so the tree is a chain of depth n - 1
    let n_samples = 10_000;
    let (x, y) = alternating_chain(n_samples);

    let tree = fitted(&["real"], &x, &y);

    assert_eq!(tree.get_depth(), Ok(n_samples - 1));
    assert_eq!(tree.get_n_leaves(), Ok(n_samples));
    assert_eq!(tree.predict(x.view()).unwrap(), y);
    assert_eq!(tree.predict_one(&[(n_samples - 1) as f64]), Ok(1.0));
}

#[test]
fn test_deep_tree_structure_lists_every_node() {
    let n_samples = 1_500;
    let (x, y) = alternating_chain(n_samples);
    let tree = fitted(&["real"], &x, &y);

    let structure = tree.generate_tree_structure().unwrap();

    // header plus one line per node of a chain with n leaves
    assert_eq!(structure.lines().count(), 1 + 2 * n_samples - 1);
    assert_eq!(structure.matches("Leaf: class=").count(), n_samples);
}

#[test]
fn test_refit_replaces_deep_tree() {
    let (x, y) = alternating_chain(5_000);
    let mut tree = fitted(&["real"], &x, &y);

    let x_small = array![[1.0], [2.0]];
    tree.fit(x_small.view(), array![0.0, 1.0].view()).unwrap();

    assert_eq!(tree.get_depth(), Ok(1));
}
