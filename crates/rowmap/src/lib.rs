pub mod cursor;
pub use cursor::Cursor;

mod engine;
pub use engine::{Builder, Engine};

pub mod sink;
pub use sink::ResultSink;

mod window;
pub use window::RowWindow;

pub use rowmap_core::{
    bail, convert, driver, err, factory, schema, stmt, AutoMappingBehavior, Config, Error, Result,
    Schema, UnknownColumnBehavior,
};
