//! Single-buffered camera access
//!
//! The camera hands out one frame buffer at a time and reuses it after
//! release. [`FrameSource::acquire`] returns a guard that borrows the source
//! mutably, so a second acquisition while a frame is held does not compile,
//! and dropping the guard returns the buffer on every exit path.

use std::ops::Deref;

use crate::error::CaptureFault;

/// A camera that lends out one encoded (JPEG) frame at a time
pub trait FrameSource {
    /// Borrowed frame; releases the hardware buffer when dropped
    type Frame<'a>: Deref<Target = [u8]>
    where
        Self: 'a;

    fn acquire(&mut self) -> Result<Self::Frame<'_>, CaptureFault>;
}

/// Copy a borrowed frame into an owned buffer
///
/// The frame buffer is invalid once released, so anything that outlives the
/// guard needs its own copy. Allocation failure is reported instead of
/// aborting, since large JPEGs can exhaust the heap on small targets.
pub fn copy_frame(frame: &[u8]) -> Result<Vec<u8>, CaptureFault> {
    if frame.is_empty() {
        return Err(CaptureFault::EmptyFrame);
    }

    let mut buf = Vec::new();
    buf.try_reserve_exact(frame.len())
        .map_err(|_| CaptureFault::Allocation(frame.len()))?;
    buf.extend_from_slice(frame);
    Ok(buf)
}
