mod file_source;

pub use file_source::{FileSource, MemorySource};

use crate::error::Result;

/// Trait for image byte sources
///
/// Anything that can hand over the raw encoded bytes of one photo: a file
/// picked by the user, a captured frame already written to disk, an upload.
pub trait ImageSource: Send {
    /// Read the complete encoded image
    ///
    /// Fails with `SourceUnreadable` when the bytes cannot be obtained.
    fn read_bytes(&mut self) -> Result<Vec<u8>>;

    /// Human readable origin for logs
    fn describe(&self) -> String;
}

impl<T: ImageSource + ?Sized> ImageSource for Box<T> {
    fn read_bytes(&mut self) -> Result<Vec<u8>> {
        (**self).read_bytes()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
