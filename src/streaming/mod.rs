//! Byte-range media streaming.
//!
//! [`parse_range`] implements the `Range` header policy and [`stream_file`]
//! turns a file path plus optional header into a `200` or `206` response.

mod direct;
mod range;

pub use direct::{stream_file, StreamError, DEFAULT_BUFFER_SIZE, VIDEO_CONTENT_TYPE};
pub use range::{parse_range, ByteRange, RangeError};
