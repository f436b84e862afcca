//! Direct streaming with HTTP range requests.

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::Response,
};
use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use super::range::{parse_range, RangeError};

/// Content type sent for every streamed file.
pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Default read buffer size.
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Failure detected before any response headers were sent.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("{source}")]
    Range { source: RangeError, size: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Build a streaming response for `path`, honouring an optional `Range`
/// header value.
///
/// The file is opened, measured, and positioned before the response is
/// built, so failures map to a clean status code. The body reads at most
/// `buffer_size` bytes at a time and never past the requested range; if the
/// client goes away the body is dropped along with the file handle.
pub async fn stream_file(
    path: &Path,
    range_header: Option<&str>,
    buffer_size: usize,
) -> Result<Response, StreamError> {
    let mut file = match File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(StreamError::NotFound(path.to_path_buf()))
        }
        Err(e) => return Err(StreamError::Io(e)),
    };

    let metadata = file.metadata().await?;
    if !metadata.is_file() {
        return Err(StreamError::NotFound(path.to_path_buf()));
    }
    let file_size = metadata.len();

    let range = range_header
        .map(|value| parse_range(value, file_size))
        .transpose()
        .map_err(|source| StreamError::Range {
            source,
            size: file_size,
        })?;

    let buffer_size = buffer_size.max(1);

    let response = match range {
        Some(range) => {
            file.seek(SeekFrom::Start(range.start)).await?;

            let length = range.len();
            let stream = ReaderStream::with_capacity(file.take(length), buffer_size);

            tracing::debug!(
                path = %path.display(),
                start = range.start,
                end = range.end,
                size = file_size,
                "Streaming partial content"
            );

            Response::builder()
                .status(StatusCode::PARTIAL_CONTENT)
                .header(header::CONTENT_TYPE, VIDEO_CONTENT_TYPE)
                .header(header::CONTENT_LENGTH, length.to_string())
                .header(header::CONTENT_RANGE, range.content_range(file_size))
                .header(header::ACCEPT_RANGES, "bytes")
                .body(Body::from_stream(stream))
        }
        None => {
            let stream = ReaderStream::with_capacity(file.take(file_size), buffer_size);

            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, VIDEO_CONTENT_TYPE)
                .header(header::CONTENT_LENGTH, file_size.to_string())
                .header(header::ACCEPT_RANGES, "bytes")
                .body(Body::from_stream(stream))
        }
    };

    response.map_err(|e| StreamError::Io(io::Error::new(io::ErrorKind::Other, e)))
}
