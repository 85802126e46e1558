mod config;
pub use config::{AutoMappingBehavior, Config, UnknownColumnBehavior};

pub mod convert;

pub mod driver;

mod error;
pub use error::{Error, IntoError};

pub mod factory;

pub mod property;

pub mod schema;
pub use schema::Schema;

pub mod stmt;

/// A Result type alias that uses rowmap's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;
