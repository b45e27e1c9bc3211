use super::*;
use ndarray::Zip;

/// Every admissible split of one feature together with the best one.
///
/// # Fields
///
/// - `thresholds` - Candidate thresholds in strictly ascending order. Each one is the mean of two adjacent distinct sorted feature values.
/// - `ginis` - Gini criterion for each threshold, index-aligned with `thresholds`.
/// - `threshold_best` - The threshold with the highest Gini criterion (the smallest one on ties).
/// - `gini_best` - The Gini criterion of `threshold_best`.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitResult {
    thresholds: Array1<f64>,
    ginis: Array1<f64>,
    threshold_best: f64,
    gini_best: f64,
}

impl SplitResult {
    // Getters
    get_field_as_ref!(get_thresholds, thresholds, &Array1<f64>);
    get_field_as_ref!(get_ginis, ginis, &Array1<f64>);
    get_field!(get_threshold_best, threshold_best, f64);
    get_field!(get_gini_best, gini_best, f64);
}

/// Gini impurity `1 - p1^2 - p0^2` of a binary label set, written in the
/// equivalent form `2 * p1 * (1 - p1)` so that pure sets give exactly zero.
#[inline]
fn binary_impurity(p1: f64) -> f64 {
    2.0 * p1 * (1.0 - p1)
}

/// Finds the threshold of a single feature that maximizes the Gini criterion.
///
/// The criterion of a threshold splitting the set `R` into `R_l` (values below the
/// threshold) and `R_r` (values at or above it) is
///
/// `Q(R) = -|R_l| / |R| * H(R_l) - |R_r| / |R| * H(R_r)`
///
/// where `H(S) = 1 - p1^2 - p0^2`. Scores lie in `[-1, 0]` and higher is better.
///
/// Samples are sorted once by feature value; the scores of all split positions are then
/// derived from cumulative label sums as whole-array expressions. Only the position right
/// before each first occurrence of a distinct value is kept, so both sides of every
/// reported threshold are non-empty.
///
/// # Parameters
///
/// - `feature_vector` - Finite feature values, one per sample
/// - `target_vector` - Binary labels (`0.0` or `1.0`) aligned with `feature_vector`
///
/// # Returns
///
/// - `Ok(Some(SplitResult))` - All admissible thresholds and the best one
/// - `Ok(None)` - The feature has fewer than two distinct values, so no split exists
/// - `Err(ModelError::InputValidationError)` - If the vectors differ in length, contain non-finite values or non-binary labels
///
/// # Examples
/// ```rust
/// use ginitree::machine_learning::find_best_split;
/// use ndarray::array;
///
/// let feature = array![1.0, 2.0, 3.0, 4.0];
/// let target = array![0.0, 0.0, 1.0, 1.0];
/// let split = find_best_split(feature.view(), target.view()).unwrap().unwrap();
/// assert_eq!(split.get_threshold_best(), 2.5);
/// assert_eq!(split.get_gini_best(), 0.0);
/// ```
pub fn find_best_split(
    feature_vector: ArrayView1<f64>,
    target_vector: ArrayView1<f64>,
) -> Result<Option<SplitResult>, ModelError> {
    if feature_vector.len() != target_vector.len() {
        return Err(ModelError::InputValidationError(format!(
            "feature vector and target vector have different lengths, feature: {}, target: {}",
            feature_vector.len(),
            target_vector.len()
        )));
    }

    if let Some(position) = feature_vector.iter().position(|v| !v.is_finite()) {
        return Err(ModelError::InputValidationError(format!(
            "feature vector contains NaN or infinite value at position {}",
            position
        )));
    }
    validate_binary_labels(&target_vector)?;

    Ok(find_best_split_unchecked(feature_vector, target_vector))
}

/// Split search over vectors already known to be aligned, finite and binary.
pub(crate) fn find_best_split_unchecked(
    feature_vector: ArrayView1<f64>,
    target_vector: ArrayView1<f64>,
) -> Option<SplitResult> {
    let n_samples = feature_vector.len();
    if n_samples < 2 {
        return None;
    }

    let mut order: Vec<usize> = (0..n_samples).collect();
    order.sort_by(|&a, &b| feature_vector[a].total_cmp(&feature_vector[b]));
    let sorted_features = feature_vector.select(Axis(0), &order);
    let sorted_targets = target_vector.select(Axis(0), &order);

    let lower = sorted_features.slice(s![..-1]);
    let upper = sorted_features.slice(s![1..]);

    // split position i sits between sorted samples i and i + 1
    let distinct = Zip::from(&lower)
        .and(&upper)
        .map_collect(|&lo, &hi| lo < hi);
    let boundaries: Vec<usize> = distinct
        .indexed_iter()
        .filter(|&(_, &is_boundary)| is_boundary)
        .map(|(i, _)| i)
        .collect();

    if boundaries.is_empty() {
        return None;
    }

    let mut cumulative = sorted_targets;
    cumulative.accumulate_axis_inplace(Axis(0), |&prev, curr| *curr += prev);
    let total_positives = cumulative[n_samples - 1];

    let n = n_samples as f64;
    let left_sizes = Array1::range(1.0, n, 1.0);
    let right_sizes = n - &left_sizes;
    let left_sums = cumulative.slice(s![..-1]);
    let right_sums = total_positives - &left_sums;

    let left_impurity = (&left_sums / &left_sizes).mapv(binary_impurity);
    let right_impurity = (&right_sums / &right_sizes).mapv(binary_impurity);
    let ginis = (-(&left_sizes * &left_impurity) - &right_sizes * &right_impurity) / n;

    let thresholds = ((&lower + &upper) / 2.0).select(Axis(0), &boundaries);
    let ginis = ginis.select(Axis(0), &boundaries);

    // thresholds ascend, so the first maximum is also the smallest threshold
    let (best_index, gini_best) = ginis.iter().copied().enumerate().fold(
        (0, f64::NEG_INFINITY),
        |best, (i, gini)| if gini > best.1 { (i, gini) } else { best },
    );
    let threshold_best = thresholds[best_index];

    Some(SplitResult {
        thresholds,
        ginis,
        threshold_best,
        gini_best,
    })
}
