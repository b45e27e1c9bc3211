pub use crate::ModelError;
pub use crate::machine_learning::{CategoryRanking, SplitResult, find_best_split};
pub use crate::machine_learning::{DecisionTree, DecisionTreeParams, FeatureType, Node, SplitRule};
