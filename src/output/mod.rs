mod file_sink;

pub use file_sink::FileSink;

use crate::compositor::CompositeResult;
use crate::error::Result;

/// Trait for display destinations
///
/// Receives the finished composite; ownership of the buffer moves to the
/// sink and the pipeline never touches it again.
pub trait DisplaySink: Send {
    fn present(&mut self, result: CompositeResult) -> Result<()>;
}

impl<T: DisplaySink + ?Sized> DisplaySink for Box<T> {
    fn present(&mut self, result: CompositeResult) -> Result<()> {
        (**self).present(result)
    }
}
