//! How rows map onto models.

mod binding;
pub use binding::{Binding, BindingFlags, Composite, FetchType, ResultSetLink};

mod discriminator;
pub use discriminator::Discriminator;

mod result_map;
pub use result_map::{AutoMapping, ResultMap};
