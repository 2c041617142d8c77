// Submodules for separation of concerns
mod condition;
mod field;
mod operand;

// Public API re-exports
pub use condition::{Clause, Condition, Conjunction, Disjunction, Query};
pub use field::{CmpOp, Field};
pub use operand::{Operand, compare_numbers};
