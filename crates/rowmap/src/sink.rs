//! Receivers of materialized objects.

use rowmap_core::stmt::Value;

use std::ops::ControlFlow;

/// Receives root objects as they are completed.
///
/// Returning [`ControlFlow::Break`] stops the current result set pass after
/// the object that was just accepted.
pub trait ResultSink {
    fn accept(&mut self, value: Value) -> ControlFlow<()>;
}

impl ResultSink for Vec<Value> {
    fn accept(&mut self, value: Value) -> ControlFlow<()> {
        self.push(value);
        ControlFlow::Continue(())
    }
}

/// Creates a sink from a closure.
///
/// ```
/// use rowmap::sink;
/// use std::ops::ControlFlow;
///
/// let mut seen = 0;
/// let mut first_two = sink::from_fn(|_| {
///     seen += 1;
///     if seen < 2 { ControlFlow::Continue(()) } else { ControlFlow::Break(()) }
/// });
/// # let _ = &mut first_two;
/// ```
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: FnMut(Value) -> ControlFlow<()>,
{
    FromFn(f)
}

/// Sink returned by [`from_fn`].
pub struct FromFn<F>(F);

impl<F> ResultSink for FromFn<F>
where
    F: FnMut(Value) -> ControlFlow<()>,
{
    fn accept(&mut self, value: Value) -> ControlFlow<()> {
        (self.0)(value)
    }
}

/// Keeps the first object and stops the pass.
#[derive(Debug, Default)]
pub(crate) struct First(pub(crate) Option<Value>);

impl ResultSink for First {
    fn accept(&mut self, value: Value) -> ControlFlow<()> {
        self.0 = Some(value);
        ControlFlow::Break(())
    }
}

/// Progress of one result set pass.
#[derive(Debug, Default)]
pub(crate) struct ResultContext {
    /// Objects handed to the sink
    pub(crate) count: usize,

    /// The sink asked to stop
    pub(crate) stopped: bool,
}
