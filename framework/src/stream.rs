//! MJPEG multipart framing for `GET /stream`

use crate::error::StreamFault;

pub const STREAM_CONTENT_TYPE: &str = "multipart/x-mixed-replace;boundary=frame";

/// Written before every part, including the first
pub const STREAM_BOUNDARY: &str = "\r\n--frame\r\n";

/// Part header for a JPEG of `len` bytes
pub fn part_header(len: usize) -> String {
    format!("Content-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n", len)
}

/// Chunked response body of one connected client
pub trait FrameSink {
    fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StreamFault>;
}

/// Emit one frame as boundary, part header, then the JPEG bytes
///
/// Stops at the first failed chunk; the caller ends the client loop.
pub fn emit_frame<S: FrameSink>(sink: &mut S, jpeg: &[u8]) -> Result<(), StreamFault> {
    sink.write_chunk(STREAM_BOUNDARY.as_bytes())?;
    sink.write_chunk(part_header(jpeg.len()).as_bytes())?;
    sink.write_chunk(jpeg)
}
