use alloc::vec::Vec;

use crate::error::SinkError;

/// The opaque byte sink consumed by the pipeline.
///
/// The pipeline calls `write` with already-encoded bytes, `flush` when the
/// caller demands delivery, and `close` exactly once at teardown. Blocking
/// behavior is the sink's own; no call is cancellable.
pub trait ByteSink {
    /// Delivers a range of encoded bytes.
    ///
    /// # Errors
    ///
    /// Any failure is propagated to the pipeline caller unchanged.
    fn write(&mut self, bytes: &[u8]) -> Result<(), SinkError>;

    /// Forces delivery of anything the sink itself buffers.
    ///
    /// # Errors
    ///
    /// Any failure is propagated to the pipeline caller unchanged.
    fn flush(&mut self) -> Result<(), SinkError>;

    /// Releases the sink. Called at most once, after the final flush.
    ///
    /// # Errors
    ///
    /// Any failure is propagated to the pipeline caller unchanged.
    fn close(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl ByteSink for Vec<u8> {
    fn write(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
        self.extend_from_slice(bytes);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl<S: ByteSink + ?Sized> ByteSink for &mut S {
    fn write(&mut self, bytes: &[u8]) -> Result<(), SinkError> {
        (**self).write(bytes)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        (**self).flush()
    }

    fn close(&mut self) -> Result<(), SinkError> {
        (**self).close()
    }
}
