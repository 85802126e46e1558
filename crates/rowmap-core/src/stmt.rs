mod cache_key;
pub use cache_key::{CacheKey, KeyPart};

mod lazy;
pub use lazy::LazyLoad;

mod object;
pub use object::Object;

mod ty;
pub use ty::Type;

mod value;
pub use value::Value;
