//! Descriptions of the types rows are materialized into.

mod constructor;
pub use constructor::{Constructor, Param};

mod field;
pub use field::Field;

mod model;
pub use model::{Model, ModelKind};
