/// A macro that generates a getter method for any field.
///
/// This macro creates a public getter method that returns the value
/// of the specified field. The generated method includes appropriate documentation
/// describing the field being accessed.
///
/// # Parameters
///
/// - `$method_name` - The name of the getter method (e.g., get_threshold_best)
/// - `$field_name` - The name of the field to access (e.g., threshold_best)
/// - `$return_type` - The return type of the getter method
macro_rules! get_field {
    ($method_name:ident, $field_name:ident, $return_type:ty) => {
        #[doc = concat!("Gets the `", stringify!($field_name), "` field.\n\n")]
        #[doc = "# Returns\n\n"]
        #[doc = concat!("* `", stringify!($return_type), "` - The value of the `", stringify!($field_name), "` field")]
        pub fn $method_name(&self) -> $return_type {
            self.$field_name
        }
    };
}

/// A macro that generates a public getter method returning a reference to a field.
///
/// # Parameters
///
/// - `$method_name` - The identifier for the generated getter method name
/// - `$field_name` - The identifier of the struct field to access
/// - `$return_type` - The reference type returned, e.g. `&[f64]` for a `Vec<f64>` field
macro_rules! get_field_as_ref {
    ($method_name:ident, $field_name:ident, $return_type:ty) => {
        #[doc = concat!("Gets the `", stringify!($field_name), "` field.\n\n")]
        #[doc = "# Returns\n\n"]
        #[doc = concat!("* `", stringify!($return_type), "` - The value of the `", stringify!($field_name), "` field as a reference")]
        pub fn $method_name(&self) -> $return_type {
            &self.$field_name
        }
    };
}

/// Error type shared by every model in the crate.
pub mod error;

pub use error::ModelError;

/// Module `machine_learning` provides a binary decision tree classifier built around a
/// vectorized Gini split search.
///
/// # Components
///
/// - **find_best_split**: Sorts one feature, scores every split position from cumulative
///   label sums and returns all admissible thresholds with their Gini criterion
/// - **CategoryRanking**: Orders the categories of a feature by their rate of label 1, so a
///   categorical feature can be split with a single threshold on ranks
/// - **DecisionTree**: Greedy recursive tree over mixed `real` and `categorical` columns with
///   optional growth limits (`DecisionTreeParams`)
///
/// # Examples
/// ```rust
/// use ginitree::machine_learning::*;
/// use ndarray::array;
///
/// let x = array![[1.0], [2.0], [3.0], [4.0]];
/// let y = array![0.0, 0.0, 1.0, 1.0];
///
/// let mut tree = DecisionTree::new(&["real"], None).unwrap();
/// tree.fit(x.view(), y.view()).unwrap();
/// assert_eq!(tree.predict(x.view()).unwrap(), y);
/// ```
pub mod machine_learning;

/// A convenience module that re-exports the most commonly used types from this crate.
///
/// # Examples
/// ```rust
/// use ginitree::prelude::*;
///
/// let tree = DecisionTree::new(&["real", "categorical"], Some(DecisionTreeParams::default()));
/// assert!(tree.is_ok());
/// ```
pub mod prelude;
