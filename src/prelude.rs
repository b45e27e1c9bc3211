/// Prelude module for machine learning functionality.
pub mod machine_learning_prelude;

pub use machine_learning_prelude::*;
