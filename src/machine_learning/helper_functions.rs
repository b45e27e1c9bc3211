use super::*;

/// Performs validation checks on the input data matrices.
///
/// This function validates that:
/// - The input data matrix is not empty
/// - The input data does not contain NaN or infinite values
/// - When a target vector is provided:
///   - The target vector is not empty
///   - The target vector length matches the number of rows in the input data
///
/// # Parameters
///
/// - `x` - A 2D array of feature values where rows represent samples and columns represent features
/// - `y` - An optional 1D array representing the target variables or labels corresponding to each sample
///
/// # Returns
///
/// - `Ok(())` - If all validation checks pass
/// - `Err(ModelError::InputValidationError)` - If any validation check fails, with an informative error message
pub fn preliminary_check<S, T>(
    x: &ArrayBase<S, Ix2>,
    y: Option<&ArrayBase<T, Ix1>>,
) -> Result<(), ModelError>
where
    S: Data<Elem = f64>,
    T: Data<Elem = f64>,
{
    if x.nrows() == 0 {
        return Err(ModelError::InputValidationError(
            "Input data is empty".to_string(),
        ));
    }

    for (i, row) in x.outer_iter().enumerate() {
        for (j, &val) in row.iter().enumerate() {
            if val.is_nan() || val.is_infinite() {
                return Err(ModelError::InputValidationError(format!(
                    "Input data contains NaN or infinite value at position [{}][{}]",
                    i, j
                )));
            }
        }
    }

    if let Some(y) = y {
        if y.is_empty() {
            return Err(ModelError::InputValidationError(
                "Target vector is empty".to_string(),
            ));
        }

        if y.len() != x.nrows() {
            return Err(ModelError::InputValidationError(format!(
                "Input data and target vector have different lengths, x rows: {}, y length: {}",
                x.nrows(),
                y.len()
            )));
        }
    }
    Ok(())
}

/// Validates that every label is either `0.0` or `1.0`.
///
/// # Parameters
///
/// * `y` - The label vector to validate
///
/// # Returns
///
/// - `Ok(())` - If all labels are binary
/// - `Err(ModelError::InputValidationError)` - If any label is something else, naming the first offending position
pub fn validate_binary_labels<S>(y: &ArrayBase<S, Ix1>) -> Result<(), ModelError>
where
    S: Data<Elem = f64>,
{
    match y.iter().position(|&label| label != 0.0 && label != 1.0) {
        Some(position) => Err(ModelError::InputValidationError(format!(
            "labels must be 0 or 1, got {} at position {}",
            y[position], position
        ))),
        None => Ok(()),
    }
}

/// Validates the growth limits of a decision tree.
///
/// - `min_samples_split` must be at least 2, since a single sample cannot be split
/// - `min_samples_leaf` must be at least 1
/// - A `max_depth` of 0 is accepted but logs a warning, because the tree collapses to one leaf
///
/// # Parameters
///
/// * `params` - The hyperparameters to validate
///
/// # Returns
///
/// - `Ok(())` - If the hyperparameters are usable
/// - `Err(ModelError::InvalidConfiguration)` - If a limit is out of range
pub fn validate_tree_params(params: &DecisionTreeParams) -> Result<(), ModelError> {
    if params.min_samples_split < 2 {
        return Err(ModelError::InvalidConfiguration(format!(
            "min_samples_split must be at least 2, got {}",
            params.min_samples_split
        )));
    }

    if params.min_samples_leaf == 0 {
        return Err(ModelError::InvalidConfiguration(
            "min_samples_leaf must be at least 1".to_string(),
        ));
    }

    if params.max_depth == Some(0) {
        warn!("max_depth is 0, the fitted tree will be a single leaf");
    }

    Ok(())
}
