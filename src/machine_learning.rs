pub use crate::error::ModelError;
use ahash::AHashMap;
use ndarray::Data;
use ndarray::prelude::*;
use rayon::prelude::*;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, trace, warn};

/// Per-node ranking of categorical values by their rate of label 1
pub mod category_ranking;
/// Binary decision tree classifier over real and categorical features
pub mod decision_tree;
/// This module provides helper functions for machine learning models
mod helper_functions;
/// Vectorized search for the Gini-optimal threshold of a single feature
pub mod split_finder;

pub use category_ranking::*;
pub use decision_tree::*;
pub use split_finder::*;

use category_ranking::category_key;
use split_finder::find_best_split_unchecked;
use helper_functions::*;
