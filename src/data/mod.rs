//! Data structures for count tables, condition labels and CLR results.

mod conditions;
mod count_matrix;
mod count_table;
mod result;

pub use conditions::ConditionLabels;
pub use count_matrix::CountMatrix;
pub use count_table::CountTable;
pub use result::{AldexClr, ClrSummary};
